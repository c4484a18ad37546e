//! Slanted orders: permute rows and columns so mass hugs the diagonal.
//!
//! # The Objective
//!
//! For a nonnegative weight matrix `W`, find row and column permutations that
//! (approximately) minimize the moment of inertia of the mass around the
//! diagonal:
//!
//! ```text
//! J = Σᵣ Σ꜀ W[r,c] × (pos(r) − pos(c))²
//! ```
//!
//! # Alternating Majorization
//!
//! 1. Start from the identity (or a warm start).
//! 2. **Rows**: give each row its *center of mass*, the weighted mean of
//!    the current column positions, and sort rows by it.
//! 3. **Columns**: the same with rows and columns swapped.
//! 4. Repeat until a full pass changes nothing, a pass revisits an earlier
//!    state (a cycle), or the iteration cap is reached.
//!
//! ```text
//!   before          after
//!   . # . .         # # . .
//!   # . . #   ──►   # # . .
//!   . # # .         . . # #
//!   # . . #         . . # #
//! ```
//!
//! This is coordinate descent: no global optimum is promised, but it
//! converges quickly and deterministically in practice.
//!
//! # Ties and Empty Rows
//!
//! Rows are sorted with a stable sort over their *previous* order, so rows
//! with equal centers keep their relative order and equal-cost permutations
//! never oscillate. A row with zero total mass has no center; it keeps its
//! exact slot and the other rows fill the remaining slots.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::permutation::Permutation;
use ndarray::{Array2, ArrayView1, ArrayView2};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Default cap on full passes; normal inputs converge long before it.
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// How the solver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Convergence {
    /// A full pass left both permutations unchanged: a true fixed point.
    Converged,
    /// A pass reproduced the state of an earlier pass; the orders spin with
    /// the given period and will never settle.
    Cycled {
        /// Number of passes in one cycle.
        period: usize,
    },
    /// The iteration cap was reached; the result may not be a fixed point.
    MaxIterations,
}

/// Row and column orders produced by [`SlantedOrder::solve`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SlantedOrders {
    /// Row order: `rows[p]` is the original row shown at position `p`.
    pub rows: Permutation,
    /// Column order.
    pub cols: Permutation,
    /// Full passes performed.
    pub iterations: usize,
    /// Why iteration stopped.
    pub convergence: Convergence,
}

impl SlantedOrders {
    /// Whether the result is a true fixed point.
    pub fn converged(&self) -> bool {
        self.convergence == Convergence::Converged
    }
}

/// Order solver configuration.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SlantedOrder {
    /// Maximum number of full passes.
    max_iterations: usize,
    /// Use squared entries as weights.
    squared: bool,
    /// Share one permutation between rows and columns (square input only).
    same_order: bool,
    /// Whether rows may move.
    order_rows: bool,
    /// Whether columns may move.
    order_cols: bool,
    /// Initial (rows, cols) instead of the identity.
    warm_start: Option<(Permutation, Permutation)>,
}

impl Default for SlantedOrder {
    fn default() -> Self {
        Self::new()
    }
}

impl SlantedOrder {
    /// Create a solver with default settings.
    pub fn new() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            squared: false,
            same_order: false,
            order_rows: true,
            order_cols: true,
            warm_start: None,
        }
    }

    /// Set the maximum number of full passes.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Weigh entries by their square, emphasizing large values.
    pub fn with_squared(mut self, squared: bool) -> Self {
        self.squared = squared;
        self
    }

    /// Use a single order for rows and columns.
    pub fn with_same_order(mut self, same_order: bool) -> Self {
        self.same_order = same_order;
        self
    }

    /// Allow or forbid moving rows.
    pub fn with_order_rows(mut self, order_rows: bool) -> Self {
        self.order_rows = order_rows;
        self
    }

    /// Allow or forbid moving columns.
    pub fn with_order_cols(mut self, order_cols: bool) -> Self {
        self.order_cols = order_cols;
        self
    }

    /// Start from the given orders instead of the identity.
    pub fn with_warm_start(mut self, rows: Permutation, cols: Permutation) -> Self {
        self.warm_start = Some((rows, cols));
        self
    }

    /// Compute slanted row and column orders for `matrix`.
    pub fn solve(&self, matrix: ArrayView2<'_, f64>) -> Result<SlantedOrders> {
        if self.max_iterations == 0 {
            return Err(Error::InvalidParameter {
                name: "max_iterations",
                message: "must be at least 1",
            });
        }
        check_weights(matrix)?;

        let (n_rows, n_cols) = matrix.dim();
        if self.same_order && n_rows != n_cols {
            return Err(Error::InvalidInput(format!(
                "a shared row/column order needs a square matrix, got {n_rows}x{n_cols}"
            )));
        }

        let (mut rows, mut cols) = self.initial_orders(n_rows, n_cols)?;
        let weights = if self.squared {
            matrix.mapv(|w| w * w)
        } else {
            matrix.to_owned()
        };

        // Every visited state, with the pass that produced it.
        let mut seen: HashMap<(Vec<usize>, Vec<usize>), usize> = HashMap::new();
        seen.insert((rows.clone(), cols.clone()), 0);

        let mut convergence = Convergence::MaxIterations;
        let mut iterations = 0;
        while iterations < self.max_iterations {
            iterations += 1;
            let (next_rows, next_cols) = self.pass(&weights, &rows, &cols)?;
            let moved_rows = count_moved(&rows, &next_rows);
            let moved_cols = count_moved(&cols, &next_cols);
            tracing::trace!(iteration = iterations, moved_rows, moved_cols, "slanted pass");

            rows = next_rows;
            cols = next_cols;
            if moved_rows == 0 && moved_cols == 0 {
                convergence = Convergence::Converged;
                break;
            }

            match seen.entry((rows.clone(), cols.clone())) {
                Entry::Occupied(earlier) => {
                    convergence = Convergence::Cycled {
                        period: iterations - *earlier.get(),
                    };
                    break;
                }
                Entry::Vacant(slot) => {
                    slot.insert(iterations);
                }
            }
        }

        if convergence == Convergence::MaxIterations {
            tracing::warn!(
                max_iterations = self.max_iterations,
                "slanted orders did not reach a fixed point"
            );
        }
        tracing::debug!(n_rows, n_cols, iterations, ?convergence, "slanted orders solved");

        Ok(SlantedOrders {
            rows: Permutation::new(rows)?,
            cols: Permutation::new(cols)?,
            iterations,
            convergence,
        })
    }

    fn initial_orders(&self, n_rows: usize, n_cols: usize) -> Result<(Vec<usize>, Vec<usize>)> {
        let Some((rows, cols)) = &self.warm_start else {
            return Ok(((0..n_rows).collect(), (0..n_cols).collect()));
        };
        if rows.len() != n_rows {
            return Err(Error::DimensionMismatch {
                expected: n_rows,
                found: rows.len(),
            });
        }
        if cols.len() != n_cols {
            return Err(Error::DimensionMismatch {
                expected: n_cols,
                found: cols.len(),
            });
        }
        if self.same_order && rows != cols {
            return Err(Error::InvalidInput(
                "a shared row/column order needs identical warm-start orders".into(),
            ));
        }
        Ok((rows.as_slice().to_vec(), cols.as_slice().to_vec()))
    }

    /// One full pass: rows against the current columns, then columns
    /// against the updated rows.
    fn pass(
        &self,
        weights: &Array2<f64>,
        rows: &[usize],
        cols: &[usize],
    ) -> Result<(Vec<usize>, Vec<usize>)> {
        if self.same_order {
            if !(self.order_rows || self.order_cols) {
                return Ok((rows.to_vec(), cols.to_vec()));
            }
            let ranks = ranks_of(rows);
            let centers = collect_centers(weights.nrows(), |i| {
                let row = weighted_positions(weights.row(i), &ranks);
                let col = weighted_positions(weights.column(i), &ranks);
                center((row.0 + col.0, row.1 + col.1), "element", i)
            })?;
            let next = reorder_axis(rows, &centers);
            return Ok((next.clone(), next));
        }

        let next_rows = if self.order_rows {
            let col_ranks = ranks_of(cols);
            let centers = collect_centers(weights.nrows(), |r| {
                center(weighted_positions(weights.row(r), &col_ranks), "row", r)
            })?;
            reorder_axis(rows, &centers)
        } else {
            rows.to_vec()
        };

        let next_cols = if self.order_cols {
            let row_ranks = ranks_of(&next_rows);
            let centers = collect_centers(weights.ncols(), |c| {
                center(weighted_positions(weights.column(c), &row_ranks), "column", c)
            })?;
            reorder_axis(cols, &centers)
        } else {
            cols.to_vec()
        };

        Ok((next_rows, next_cols))
    }
}

/// Compute slanted orders with default settings and the given iteration cap.
pub fn slanted_orders(matrix: ArrayView2<'_, f64>, max_iterations: usize) -> Result<SlantedOrders> {
    SlantedOrder::new()
        .with_max_iterations(max_iterations)
        .solve(matrix)
}

/// Return a copy of `matrix` with rows and columns in slanted order.
pub fn slanted_reorder(matrix: ArrayView2<'_, f64>, orders: &SlantedOrders) -> Result<Array2<f64>> {
    Permutation::apply(&orders.rows, &orders.cols, matrix)
}

fn check_weights(matrix: ArrayView2<'_, f64>) -> Result<()> {
    for ((r, c), &w) in matrix.indexed_iter() {
        if !w.is_finite() {
            return Err(Error::InvalidInput(format!(
                "non-finite weight {w} at ({r}, {c})"
            )));
        }
        if w < 0.0 {
            return Err(Error::InvalidInput(format!(
                "negative weight {w} at ({r}, {c})"
            )));
        }
    }
    Ok(())
}

fn ranks_of(order: &[usize]) -> Vec<usize> {
    let mut ranks = vec![0; order.len()];
    for (position, &index) in order.iter().enumerate() {
        ranks[index] = position;
    }
    ranks
}

/// (Σ w·pos, Σ w) along one row or column.
fn weighted_positions(line: ArrayView1<'_, f64>, ranks: &[usize]) -> (f64, f64) {
    line.iter()
        .zip(ranks)
        .fold((0.0, 0.0), |(moment, mass), (&w, &rank)| {
            (moment + w * rank as f64, mass + w)
        })
}

fn center((moment, mass): (f64, f64), axis: &str, index: usize) -> Result<Option<f64>> {
    if mass == 0.0 {
        return Ok(None);
    }
    let c = moment / mass;
    if !c.is_finite() {
        return Err(Error::NumericInstability(format!(
            "center of mass of {axis} {index} is {c}"
        )));
    }
    Ok(Some(c))
}

#[cfg(feature = "parallel")]
fn collect_centers<F>(n: usize, f: F) -> Result<Vec<Option<f64>>>
where
    F: Fn(usize) -> Result<Option<f64>> + Sync + Send,
{
    (0..n).into_par_iter().map(f).collect()
}

#[cfg(not(feature = "parallel"))]
fn collect_centers<F>(n: usize, f: F) -> Result<Vec<Option<f64>>>
where
    F: Fn(usize) -> Result<Option<f64>>,
{
    (0..n).map(f).collect()
}

/// Stable sort of `order` by center; massless entries keep their slots.
fn reorder_axis(order: &[usize], centers: &[Option<f64>]) -> Vec<usize> {
    let mut movable: Vec<(usize, f64)> = order
        .iter()
        .filter_map(|&i| centers[i].map(|c| (i, c)))
        .collect();
    movable.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut next_movable = 0;
    order
        .iter()
        .map(|&i| {
            if centers[i].is_none() {
                i
            } else {
                let placed = movable[next_movable].0;
                next_movable += 1;
                placed
            }
        })
        .collect()
}

fn count_moved(before: &[usize], after: &[usize]) -> usize {
    before.iter().zip(after).filter(|(a, b)| a != b).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};
    use proptest::prelude::*;

    /// 4x4 with a single 1 per row and column, scrambled off the diagonal.
    fn scrambled_permutation_matrix() -> Array2<f64> {
        let mut m = Array2::zeros((4, 4));
        for (r, c) in [(0, 2), (1, 0), (2, 3), (3, 1)] {
            m[[r, c]] = 1.0;
        }
        m
    }

    fn on_diagonal_or_reverse(m: &Array2<f64>) -> bool {
        let n = m.nrows();
        let diagonal = (0..n).all(|i| m[[i, i]] == 1.0);
        let anti = (0..n).all(|i| m[[i, n - 1 - i]] == 1.0);
        diagonal || anti
    }

    #[test]
    fn test_recovers_diagonal() {
        let m = scrambled_permutation_matrix();
        let orders = slanted_orders(m.view(), 100).unwrap();
        assert!(orders.converged());

        let slanted = slanted_reorder(m.view(), &orders).unwrap();
        assert!(on_diagonal_or_reverse(&slanted), "{slanted:?}");
    }

    #[test]
    fn test_solved_matrix_is_fixed_point() {
        let m = scrambled_permutation_matrix();
        let orders = slanted_orders(m.view(), 100).unwrap();
        let slanted = slanted_reorder(m.view(), &orders).unwrap();

        let again = slanted_orders(slanted.view(), 100).unwrap();
        assert!(again.rows.is_identity());
        assert!(again.cols.is_identity());
        assert_eq!(again.iterations, 1);
        assert!(again.converged());
    }

    #[test]
    fn test_deterministic() {
        let m = array![
            [0.0, 3.0, 1.0, 0.5],
            [2.0, 0.0, 0.0, 4.0],
            [1.0, 1.0, 5.0, 0.0],
        ];
        let a = slanted_orders(m.view(), 50).unwrap();
        let b = slanted_orders(m.view(), 50).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_rows_keep_their_slot() {
        let m = array![
            [0.0, 0.0, 1.0],
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
        ];
        let orders = slanted_orders(m.view(), 50).unwrap();
        assert_eq!(orders.rows.get(1), Some(1));
        assert_eq!(orders.rows.as_slice(), &[2, 1, 0]);
    }

    #[test]
    fn test_equal_centers_keep_previous_order() {
        let m = array![[1.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]];

        let from_identity = slanted_orders(m.view(), 10).unwrap();
        assert!(from_identity.rows.is_identity());

        let warm = Permutation::new(vec![1, 0, 2]).unwrap();
        let orders = SlantedOrder::new()
            .with_warm_start(warm.clone(), Permutation::identity(3))
            .solve(m.view())
            .unwrap();
        assert_eq!(orders.rows, warm);
        assert!(orders.converged());
    }

    #[test]
    fn test_iteration_cap_is_reported() {
        let m = scrambled_permutation_matrix();
        let orders = slanted_orders(m.view(), 1).unwrap();
        assert_eq!(orders.iterations, 1);
        assert_eq!(orders.convergence, Convergence::MaxIterations);
    }

    #[test]
    fn test_rejects_negative_and_non_finite_weights() {
        let negative = array![[1.0, -0.5], [0.0, 1.0]];
        assert!(matches!(
            slanted_orders(negative.view(), 10),
            Err(Error::InvalidInput(_))
        ));

        let nan = array![[1.0, f64::NAN], [0.0, 1.0]];
        assert!(matches!(
            slanted_orders(nan.view(), 10),
            Err(Error::InvalidInput(_))
        ));

        let m = array![[1.0]];
        assert!(matches!(
            slanted_orders(m.view(), 0),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_overflowing_mass_is_numeric_instability() {
        // Finite weights whose moment and mass both overflow: inf / inf.
        let m = array![[f64::MAX, f64::MAX, f64::MAX]];
        assert!(matches!(
            slanted_orders(m.view(), 10),
            Err(Error::NumericInstability(_))
        ));

        // Squaring pushes 1e200 past f64::MAX.
        let m = array![[1e200, 1e200, 1e200], [0.0, 1.0, 0.0]];
        assert!(slanted_orders(m.view(), 10).is_ok());
        assert!(matches!(
            SlantedOrder::new().with_squared(true).solve(m.view()),
            Err(Error::NumericInstability(_))
        ));
    }

    #[test]
    fn test_two_cycle_is_detected() {
        // Element 0 has only column mass; the shared order flips each pass.
        let m = array![[0.0, 0.0], [3.0, 1.0]];
        let orders = SlantedOrder::new()
            .with_same_order(true)
            .solve(m.view())
            .unwrap();
        assert_eq!(orders.convergence, Convergence::Cycled { period: 2 });
        assert_eq!(orders.iterations, 2);
        assert!(orders.rows.is_identity());
        assert!(!orders.converged());
    }

    #[test]
    fn test_warm_start_dimension_mismatch() {
        let m = scrambled_permutation_matrix();
        let result = SlantedOrder::new()
            .with_warm_start(Permutation::identity(3), Permutation::identity(4))
            .solve(m.view());
        assert!(matches!(
            result,
            Err(Error::DimensionMismatch { expected: 4, found: 3 })
        ));
    }

    #[test]
    fn test_same_order_on_symmetric_matrix() {
        // Two blocks {0, 2} and {1, 3} interleaved.
        let m = array![
            [5.0, 0.0, 4.0, 0.0],
            [0.0, 5.0, 0.0, 4.0],
            [4.0, 0.0, 5.0, 0.0],
            [0.0, 4.0, 0.0, 5.0],
        ];
        let orders = SlantedOrder::new()
            .with_same_order(true)
            .solve(m.view())
            .unwrap();
        assert_eq!(orders.rows, orders.cols);

        let ranks = orders.rows.ranks();
        assert_eq!(ranks[0].abs_diff(ranks[2]), 1);
        assert_eq!(ranks[1].abs_diff(ranks[3]), 1);

        let rect = Array2::<f64>::zeros((2, 3));
        assert!(SlantedOrder::new()
            .with_same_order(true)
            .solve(rect.view())
            .is_err());
    }

    #[test]
    fn test_fixed_rows_only_move_columns() {
        let m = scrambled_permutation_matrix();
        let orders = SlantedOrder::new()
            .with_order_rows(false)
            .solve(m.view())
            .unwrap();
        assert!(orders.rows.is_identity());

        let slanted = slanted_reorder(m.view(), &orders).unwrap();
        assert!((0..4).all(|i| slanted[[i, i]] == 1.0));
    }

    #[test]
    fn test_squared_weights_follow_large_values() {
        // Row 0 centers at 2.25 plain but 2.7 squared; row 1 sits at 2.5.
        let m = array![[1.0, 0.0, 0.0, 3.0], [0.0, 0.0, 1.0, 1.0]];
        let plain = SlantedOrder::new()
            .with_order_cols(false)
            .solve(m.view())
            .unwrap();
        let squared = SlantedOrder::new()
            .with_order_cols(false)
            .with_squared(true)
            .solve(m.view())
            .unwrap();
        assert_eq!(plain.rows.as_slice(), &[0, 1]);
        assert_eq!(squared.rows.as_slice(), &[1, 0]);
    }

    proptest! {
        #[test]
        fn converged_orders_are_fixed_points(
            values in proptest::collection::vec(0u8..5, 30),
        ) {
            let m = Array2::from_shape_vec((5, 6), values.into_iter().map(f64::from).collect()).unwrap();
            let orders = slanted_orders(m.view(), 200).unwrap();
            prop_assume!(orders.converged());

            let slanted = slanted_reorder(m.view(), &orders).unwrap();
            let again = slanted_orders(slanted.view(), 200).unwrap();
            prop_assert!(again.rows.is_identity());
            prop_assert!(again.cols.is_identity());
        }
    }
}
