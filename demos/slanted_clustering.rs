//! Slant a block-structured matrix, then cluster it two ways.
//!
//! ```text
//! cargo run --example slanted_clustering
//! ```

use ndarray::Array2;
use slanter::{oclust, reorder_hclust, slanted_reorder, Dendrogram, SlantedOrder, WardMethod};

fn main() -> slanter::Result<()> {
    // Three diagonal blocks of size 3, rows and columns scrambled.
    let scramble = [4usize, 7, 1, 8, 0, 5, 2, 6, 3];
    let n = scramble.len();
    let similarity = Array2::from_shape_fn((n, n), |(i, j)| {
        let (a, b) = (scramble[i], scramble[j]);
        if a / 3 == b / 3 {
            1.0
        } else if (a / 3).abs_diff(b / 3) == 1 {
            0.1
        } else {
            0.0
        }
    });

    let orders = SlantedOrder::new()
        .with_same_order(true)
        .solve(similarity.view())?;
    println!(
        "slanted order: {:?} ({} passes, {:?})",
        orders.rows.as_slice(),
        orders.iterations,
        orders.convergence
    );

    let slanted = slanted_reorder(similarity.view(), &orders)?;
    println!("slanted matrix:");
    for row in slanted.rows() {
        let line: String = row
            .iter()
            .map(|&v| if v >= 1.0 { '#' } else if v > 0.0 { '+' } else { '.' })
            .collect();
        println!("  {line}");
    }

    // Constrained: every cluster is a run of the slanted order.
    let dissimilarity = similarity.mapv(|s| 1.0 - s);
    let tree = oclust(&orders.rows, dissimilarity.view(), WardMethod::WardD2)?;
    println!("oclust heights: {:?}", tree.heights());
    println!("oclust k=3 boundaries: {:?}", tree.cut_boundaries(3)?);

    // Unconstrained: cluster with kodama, then flip merges towards the order.
    let mut condensed = Vec::with_capacity(n * (n - 1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            condensed.push(dissimilarity[[i, j]]);
        }
    }
    let steps = kodama::linkage(&mut condensed, n, kodama::Method::Ward);
    let free = Dendrogram::try_from(&steps)?;
    println!("kodama leaf order:    {:?}", free.leaf_order().as_slice());

    let aligned = reorder_hclust(&free, &orders.rows)?;
    println!("reordered leaf order: {:?}", aligned.leaf_order().as_slice());
    println!("k=3 labels: {:?}", aligned.cut_to_k(3)?);

    let report = aligned.validate();
    println!("validation: {report}");
    Ok(())
}
