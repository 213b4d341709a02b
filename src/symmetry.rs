//! Behler–Parrinello style symmetry functions over the cutoff neighbor graph.
//!
//! Each particle gets 22 angular terms summed over neighbor pairs and 50
//! radial terms forming a Gaussian-smoothed pair-distance histogram.

use nalgebra::Point3;
use rayon::prelude::*;

use crate::geometry::cos_angle;
use crate::neighbor_graph::CutoffGraph;
use crate::types::FeatureTable;

/// One angular basis function `exp(−Σr²/(αR)²)·(1 + β cos θ)^γ`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngularParameter {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: i32,
}

const fn angular(alpha: f64, beta: f64, gamma: i32) -> AngularParameter {
    AngularParameter { alpha, beta, gamma }
}

/// Angular basis set, four decay lengths with symmetric and antisymmetric weighting
pub const ANGULAR_PARAMETERS: [AngularParameter; 22] = [
    angular(14.638, -1.0, 1),
    angular(14.638, 1.0, 1),
    angular(14.638, -1.0, 2),
    angular(14.638, 1.0, 2),
    angular(2.554, -1.0, 1),
    angular(2.554, 1.0, 1),
    angular(2.554, -1.0, 2),
    angular(2.554, 1.0, 2),
    angular(1.648, 1.0, 1),
    angular(1.648, 1.0, 2),
    angular(1.204, 1.0, 1),
    angular(1.204, 1.0, 2),
    angular(1.204, 1.0, 4),
    angular(1.204, 1.0, 16),
    angular(0.933, 1.0, 1),
    angular(0.933, 1.0, 2),
    angular(0.933, 1.0, 4),
    angular(0.933, 1.0, 16),
    angular(0.695, 1.0, 1),
    angular(0.695, 1.0, 2),
    angular(0.695, 1.0, 4),
    angular(0.695, 1.0, 16),
];

pub const N_ANGULAR: usize = ANGULAR_PARAMETERS.len();
pub const N_RADIAL: usize = 50;

const RADIAL_FIRST: f64 = 0.1;
const RADIAL_LAST: f64 = 5.0;
/// Gaussian width of the radial terms, in units of R
const RADIAL_WIDTH: f64 = 0.1;

/// Radial shell positions in units of R, evenly spaced and inclusive of both ends
#[must_use]
pub fn radial_shells() -> [f64; N_RADIAL] {
    #[allow(clippy::cast_precision_loss)]
    let step = (RADIAL_LAST - RADIAL_FIRST) / (N_RADIAL - 1) as f64;
    let mut shells = [0.0; N_RADIAL];
    for (k, shell) in shells.iter_mut().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let offset = k as f64 * step;
        *shell = RADIAL_FIRST + offset;
    }
    shells[N_RADIAL - 1] = RADIAL_LAST;
    shells
}

/// Column labels: `G_angular_00..21` then `G_radial_00..49`
#[must_use]
pub fn symmetry_columns() -> Vec<String> {
    (0..N_ANGULAR)
        .map(|k| format!("G_angular_{k:02}"))
        .chain((0..N_RADIAL).map(|k| format!("G_radial_{k:02}")))
        .collect()
}

/// Symmetry functions for every particle; angular columns first.
///
/// `cutoff` must be built from `positions` with the symmetry cutoff (5R).
/// Particles with fewer than two neighbors have all-zero angular terms, and
/// isolated particles have all-zero radial terms.
#[must_use]
pub fn compute_symmetry_functions(
    positions: &[Point3<f64>],
    radius: f64,
    cutoff: &CutoffGraph,
) -> FeatureTable {
    let shells = radial_shells().map(|s| s * radius);
    let width = RADIAL_WIDTH * radius;
    let decay = ANGULAR_PARAMETERS.map(|p| (p.alpha * radius).powi(2));

    let rows: Vec<Vec<f64>> = (0..positions.len())
        .into_par_iter()
        .map(|i| {
            let mut row = Vec::with_capacity(N_ANGULAR + N_RADIAL);
            row.extend(angular_terms(i, positions, cutoff, &decay));
            row.extend(radial_terms(cutoff.distances(i), &shells, width));
            row
        })
        .collect();

    FeatureTable::from_rows(symmetry_columns(), rows)
}

fn angular_terms(
    i: usize,
    positions: &[Point3<f64>],
    cutoff: &CutoffGraph,
    decay: &[f64; N_ANGULAR],
) -> [f64; N_ANGULAR] {
    let mut values = [0.0; N_ANGULAR];
    let neighbors = cutoff.graph().neighbors(i);
    let distances = cutoff.distances(i);
    let center = &positions[i];

    for (b, &j) in neighbors.iter().enumerate() {
        for (c, &k) in neighbors.iter().enumerate().skip(b + 1) {
            let rjk = (positions[k] - positions[j]).norm();
            let r2 = distances[b].powi(2) + distances[c].powi(2) + rjk * rjk;
            let cos = cos_angle(center, &positions[j], &positions[k]);
            for (value, (p, d)) in values.iter_mut().zip(ANGULAR_PARAMETERS.iter().zip(decay)) {
                *value += (-r2 / d).exp() * p.beta.mul_add(cos, 1.0).powi(p.gamma);
            }
        }
    }
    values
}

fn radial_terms(distances: &[f64], shells: &[f64; N_RADIAL], width: f64) -> [f64; N_RADIAL] {
    shells.map(|shell| {
        distances
            .iter()
            .map(|&d| (-0.5 * ((d - shell) / width).powi(2)).exp())
            .sum()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neighbor_graph::build_cutoff_graph;
    use approx::assert_relative_eq;

    fn argmax(values: &[f64]) -> usize {
        values
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(k, _)| k)
            .unwrap()
    }

    #[test]
    fn test_parameter_table() {
        assert_eq!(ANGULAR_PARAMETERS.len(), 22);
        assert_eq!(ANGULAR_PARAMETERS[13], angular(1.204, 1.0, 16));
        assert_eq!(symmetry_columns().len(), 72);
        let shells = radial_shells();
        assert_relative_eq!(shells[0], 0.1);
        assert_relative_eq!(shells[20], 2.1, epsilon = 1e-12);
        assert_relative_eq!(shells[49], 5.0);
    }

    #[test]
    fn test_line_radial_peak() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.1, 0.0, 0.0),
            Point3::new(4.2, 0.0, 0.0),
        ];
        let cutoff = build_cutoff_graph(&positions, 5.0);
        let table = compute_symmetry_functions(&positions, 1.0, &cutoff);
        assert_eq!(table.n_columns(), 72);

        let middle = &table.row(1)[N_ANGULAR..];
        assert_eq!(argmax(middle), 20);
        assert_relative_eq!(middle[20], 2.0, epsilon = 1e-9);

        let end = &table.row(0)[N_ANGULAR..];
        assert_relative_eq!(end[20], 1.0, epsilon = 1e-9);
        assert!(end.iter().all(|&v| v <= 1.0 + 1e-9));
    }

    #[test]
    fn test_line_angular_terms() {
        // Middle particle sees its two neighbors at 180 degrees
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.1, 0.0, 0.0),
            Point3::new(4.2, 0.0, 0.0),
        ];
        let cutoff = build_cutoff_graph(&positions, 5.0);
        let table = compute_symmetry_functions(&positions, 1.0, &cutoff);
        let r2 = 2.1f64.powi(2) * 2.0 + 4.2f64.powi(2);
        let expected = (-r2 / 14.638f64.powi(2)).exp() * 2.0;
        assert_relative_eq!(table.get(1, 0), expected, epsilon = 1e-12);
        // β = +1 terms vanish for a straight angle
        assert_relative_eq!(table.get(1, 1), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_isolated_particle_is_zero() {
        let positions = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(20.0, 0.0, 0.0)];
        let cutoff = build_cutoff_graph(&positions, 5.0);
        let table = compute_symmetry_functions(&positions, 1.0, &cutoff);
        assert!(table.row(0).iter().all(|&v| v == 0.0));
        assert!(table.row(1).iter().all(|&v| v == 0.0));
    }
}
