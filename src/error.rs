use core::fmt;

/// Result alias for `slanter`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the ordering, clustering and reordering primitives.
///
/// Every error is deterministic given the input; nothing is retried and no
/// partial result is ever returned alongside one.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Input data violates a precondition (negative weight, non-square
    /// dissimilarity matrix, non-finite entry, invalid permutation).
    InvalidInput(String),

    /// Permutation, tree and matrix sizes disagree.
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// A computation produced a non-finite or otherwise undefined value.
    NumericInstability(String),

    /// Invalid parameter value.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Error::DimensionMismatch { expected, found } => {
                write!(f, "dimension mismatch: expected {expected}, found {found}")
            }
            Error::NumericInstability(msg) => write!(f, "numeric instability: {msg}"),
            Error::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{name}': {message}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
