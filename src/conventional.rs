//! Conventional short-range features from the Voronoi tessellation.
//!
//! Coordination numbers, Voronoi index, i-fold symmetry (by count and by
//! area), cell fraction and cluster packing efficiency.

use std::f64::consts::PI;

use nalgebra::Point3;
use rayon::prelude::*;

use crate::cell::VoronoiCell;
use crate::geometry::{tetrahedron_sector_volume, tetrahedron_volume};
use crate::neighbor_graph::NeighborGraph;
use crate::types::FeatureTable;
use crate::voronoi::VoronoiTessellation;

/// Face vertex counts tracked by the Voronoi index
const FACE_SIZES: [usize; 5] = [3, 4, 5, 6, 7];

/// Column labels of the 18 conventional features
#[must_use]
pub fn conventional_columns() -> Vec<String> {
    let mut columns = vec!["CN_voronoi".to_string(), "CN_cutoff".to_string()];
    columns.extend(FACE_SIZES.iter().map(|n| format!("vidx{n}")));
    columns.push("cell_fraction".to_string());
    columns.extend(FACE_SIZES.iter().map(|n| format!("ifold{n}")));
    columns.extend(FACE_SIZES.iter().map(|n| format!("area_ifold{n}")));
    columns
}

/// Conventional feature table with 18 columns.
///
/// `cutoff` is the coordination graph (3R); the Voronoi coordination number
/// is the degree in the tessellation's symmetrized graph.
#[must_use]
pub fn compute_conventional(
    tessellation: &VoronoiTessellation,
    cutoff: &NeighborGraph,
    radius: f64,
) -> FeatureTable {
    let ball = 4.0 * PI / 3.0 * radius.powi(3);
    let graph = tessellation.graph();

    let rows: Vec<Vec<f64>> = (0..tessellation.len())
        .into_par_iter()
        .map(|i| {
            let cell = tessellation.cell(i);
            let (counts, areas) = face_histogram(cell);
            #[allow(clippy::cast_precision_loss)]
            let mut row = vec![graph.degree(i) as f64, cutoff.degree(i) as f64];
            row.extend(counts);
            row.push(ball / cell.volume());
            row.extend(normalized(counts));
            row.extend(normalized(areas));
            row
        })
        .collect();

    FeatureTable::from_rows(conventional_columns(), rows)
}

/// Face counts and summed face areas per vertex-count bucket
fn face_histogram(cell: &VoronoiCell) -> ([f64; 5], [f64; 5]) {
    let mut counts = [0.0; 5];
    let mut areas = [0.0; 5];
    for face in cell.faces() {
        if let Some(k) = FACE_SIZES.iter().position(|&n| n == face.vertex_count()) {
            counts[k] += 1.0;
            areas[k] += face.area;
        }
    }
    (counts, areas)
}

fn normalized(values: [f64; 5]) -> [f64; 5] {
    let total: f64 = values.iter().sum();
    if total > 0.0 {
        values.map(|v| v / total)
    } else {
        [0.0; 5]
    }
}

/// Cluster packing efficiency: sphere-sector volume over tetrahedral volume,
/// summed over the shell triangulation before dividing.
///
/// A shell of exactly three neighbors forms a single tetrahedron with the
/// center. Smaller or degenerate shells give 0.
#[must_use]
pub fn compute_cluster_packing_efficiency(
    positions: &[Point3<f64>],
    radius: f64,
    graph: &NeighborGraph,
    shells: &[Option<Vec<[usize; 3]>>],
) -> FeatureTable {
    let values: Vec<Vec<f64>> = (0..positions.len())
        .into_par_iter()
        .map(|i| {
            let neighbors = graph.neighbors(i);
            let value = match (&shells[i], neighbors) {
                (Some(triangles), _) => packing_ratio(&positions[i], positions, radius, triangles),
                (None, &[a, b, c]) => packing_ratio(&positions[i], positions, radius, &[[a, b, c]]),
                _ => 0.0,
            };
            vec![value]
        })
        .collect();
    FeatureTable::from_rows(vec!["cluster_packing_efficiency".to_string()], values)
}

fn packing_ratio(
    center: &Point3<f64>,
    positions: &[Point3<f64>],
    radius: f64,
    triangles: &[[usize; 3]],
) -> f64 {
    let (packed, total) = triangles
        .iter()
        .fold((0.0, 0.0), |(packed, total), &[a, b, c]| {
            let (pa, pb, pc) = (&positions[a], &positions[b], &positions[c]);
            (
                packed + tetrahedron_sector_volume(center, pa, pb, pc, radius),
                total + tetrahedron_volume(pa, pb, pc, center),
            )
        });
    if total > 0.0 { packed / total } else { 0.0 }
}
