//! Medium-range-order aggregation of short-range features over the Voronoi shell.

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::neighbor_graph::NeighborGraph;
use crate::stats::summarize;
use crate::types::FeatureTable;

const STATISTICS: [&str; 5] = ["self", "min", "max", "mean", "std"];

/// What a particle without Voronoi neighbors reports for its shell statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyShellPolicy {
    /// min, max and mean repeat the particle's own value; std is 0
    #[default]
    SelfValue,
    /// min, max, mean and std are all 0
    Zero,
}

/// Expand every SRO column into `[self, min, max, mean, std]` over the neighbor shell.
///
/// Column `k` of `sro` becomes output columns `5k..5k+5`; std is the
/// population std. Columns of `passthrough` are appended unchanged.
///
/// # Panics
/// Panics if `passthrough` has a different row count than `sro`.
#[must_use]
pub fn aggregate_mro(
    sro: &FeatureTable,
    passthrough: Option<&FeatureTable>,
    graph: &NeighborGraph,
    policy: EmptyShellPolicy,
) -> FeatureTable {
    let mut columns: Vec<String> = sro
        .columns()
        .iter()
        .flat_map(|c| STATISTICS.iter().map(move |s| format!("{c}_{s}")))
        .collect();
    if let Some(extra) = passthrough {
        assert_eq!(extra.n_rows(), sro.n_rows(), "passthrough row count mismatch");
        columns.extend(extra.columns().iter().cloned());
    }

    let rows: Vec<Vec<f64>> = (0..sro.n_rows())
        .into_par_iter()
        .map(|i| {
            let neighbors = graph.neighbors(i);
            let mut row = Vec::with_capacity(columns.len());
            let mut shell = Vec::with_capacity(neighbors.len());
            for (k, &own) in sro.row(i).iter().enumerate() {
                row.push(own);
                if neighbors.is_empty() {
                    row.extend(match policy {
                        EmptyShellPolicy::SelfValue => [own, own, own, 0.0],
                        EmptyShellPolicy::Zero => [0.0; 4],
                    });
                } else {
                    shell.clear();
                    shell.extend(neighbors.iter().map(|&j| sro.get(j, k)));
                    row.extend(summarize(&shell, 0));
                }
            }
            if let Some(extra) = passthrough {
                row.extend_from_slice(extra.row(i));
            }
            row
        })
        .collect();

    let empty = (0..graph.len()).filter(|&i| graph.degree(i) == 0).count();
    if empty > 0 {
        debug!("{empty} particles without Voronoi neighbors use the {policy:?} shell policy");
    }

    FeatureTable::from_rows(columns, rows)
}
