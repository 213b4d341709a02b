//! Interstice distance, area and volume over each particle's Voronoi neighbor shell.
//!
//! The three tables are `[min, max, mean, std]` per particle. Shells without a
//! hull (fewer than four neighbors, or coplanar ones) get all zeros.

use std::f64::consts::PI;

use nalgebra::Point3;
use rayon::prelude::*;

use crate::geometry::{tetrahedron_sector_volume, tetrahedron_volume, triangle_area};
use crate::neighbor_graph::NeighborGraph;
use crate::stats::summarize;
use crate::types::FeatureTable;

const SUMMARY: [&str; 4] = ["min", "max", "mean", "std"];

/// Per-particle interstice statistics
#[derive(Debug, Clone)]
pub struct IntersticeTables {
    pub distance: FeatureTable,
    pub area: FeatureTable,
    pub volume: FeatureTable,
}

impl IntersticeTables {
    /// The twelve SRO columns in distance, area, volume order
    #[must_use]
    pub fn combined(&self) -> FeatureTable {
        FeatureTable::hstack(&[&self.distance, &self.area, &self.volume])
    }
}

fn summary_columns(name: &str) -> Vec<String> {
    SUMMARY
        .iter()
        .map(|s| format!("interstice_{name}_{s}"))
        .collect()
}

/// Compute all three interstice tables.
///
/// `shells` holds the hull triangulation of each particle's neighbor shell
/// (global particle ids), `None` where no hull exists.
#[must_use]
pub fn compute_interstice(
    positions: &[Point3<f64>],
    radius: f64,
    graph: &NeighborGraph,
    shells: &[Option<Vec<[usize; 3]>>],
) -> IntersticeTables {
    let rows: Vec<[[f64; 4]; 3]> = (0..positions.len())
        .into_par_iter()
        .map(|i| match &shells[i] {
            Some(triangles) => [
                interstice_distance(i, positions, radius, graph),
                interstice_area(positions, radius, triangles),
                interstice_volume(i, positions, radius, triangles),
            ],
            None => [[0.0; 4]; 3],
        })
        .collect();

    let table = |k: usize, name: &str| {
        FeatureTable::from_rows(summary_columns(name), rows.iter().map(|r| r[k].to_vec()).collect())
    };
    IntersticeTables {
        distance: table(0, "distance"),
        area: table(1, "area"),
        volume: table(2, "volume"),
    }
}

/// Surface gap over center distance, `(d − 2R)/d`, per neighbor (population std)
fn interstice_distance(
    i: usize,
    positions: &[Point3<f64>],
    radius: f64,
    graph: &NeighborGraph,
) -> [f64; 4] {
    let gaps: Vec<f64> = graph
        .neighbors(i)
        .iter()
        .map(|&j| {
            let d = (positions[j] - positions[i]).norm();
            (d - 2.0 * radius) / d
        })
        .collect();
    summarize(&gaps, 0)
}

/// Uncovered fraction of each hull triangle, with `πR²/4` taken as covered (sample std)
fn interstice_area(positions: &[Point3<f64>], radius: f64, triangles: &[[usize; 3]]) -> [f64; 4] {
    let covered = PI * radius * radius / 4.0;
    let ratios: Vec<f64> = triangles
        .iter()
        .map(|&[a, b, c]| {
            let area = triangle_area(&positions[a], &positions[b], &positions[c]);
            (area - covered) / area
        })
        .collect();
    summarize(&ratios, 1)
}

/// Unfilled fraction of each tetrahedron spanned by the center and a hull triangle (sample std)
fn interstice_volume(
    i: usize,
    positions: &[Point3<f64>],
    radius: f64,
    triangles: &[[usize; 3]],
) -> [f64; 4] {
    let center = &positions[i];
    let ratios: Vec<f64> = triangles
        .iter()
        .map(|&[a, b, c]| {
            let (pa, pb, pc) = (&positions[a], &positions[b], &positions[c]);
            let volume = tetrahedron_volume(pa, pb, pc, center);
            if volume == 0.0 {
                return 0.0;
            }
            let packed = tetrahedron_sector_volume(center, pa, pb, pc, radius);
            (volume - packed) / volume
        })
        .collect();
    summarize(&ratios, 1)
}
