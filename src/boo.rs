//! Bond-orientational order: Steinhardt q_l, w_l and their coarse-grained Q_l, W_l.
//!
//! Harmonics follow the Condon–Shortley convention. Only m ≥ 0 components are
//! stored; negative orders are recovered as `q_{l,−m} = (−1)^m conj(q_{lm})`.

use std::f64::consts::PI;

use nalgebra::{Complex, Point3, Vector3};
use rayon::prelude::*;

use crate::neighbor_graph::NeighborGraph;
use crate::types::FeatureTable;

/// Spherical harmonic degrees reported per graph
pub const BOO_DEGREES: [usize; 5] = [2, 4, 6, 8, 10];

/// `q_lm` for m = 0..=l
pub type Harmonics = Vec<Complex<f64>>;

fn factorial(n: usize) -> f64 {
    (1..=n).fold(1.0, |acc, k| {
        #[allow(clippy::cast_precision_loss)]
        let k = k as f64;
        acc * k
    })
}

#[inline]
const fn parity(m: i64) -> f64 {
    if m % 2 == 0 { 1.0 } else { -1.0 }
}

/// Associated Legendre function P_l^m(x), m ≥ 0, with the Condon–Shortley phase
fn associated_legendre(l: usize, m: usize, x: f64) -> f64 {
    let mut pmm = 1.0;
    if m > 0 {
        let somx2 = ((1.0 - x) * (1.0 + x)).sqrt();
        let mut fact = 1.0;
        for _ in 0..m {
            pmm *= -fact * somx2;
            fact += 2.0;
        }
    }
    if l == m {
        return pmm;
    }
    #[allow(clippy::cast_precision_loss)]
    let mut pmmp1 = x * (2 * m + 1) as f64 * pmm;
    if l == m + 1 {
        return pmmp1;
    }
    for ll in (m + 2)..=l {
        #[allow(clippy::cast_precision_loss)]
        let pll = (x * (2 * ll - 1) as f64 * pmmp1 - (ll + m - 1) as f64 * pmm) / (ll - m) as f64;
        pmm = pmmp1;
        pmmp1 = pll;
    }
    pmmp1
}

/// Y_lm of the direction of `bond` for m = 0..=l; a zero vector gives zeros.
#[must_use]
pub fn spherical_harmonics(l: usize, bond: &Vector3<f64>) -> Harmonics {
    let r = bond.norm();
    if r == 0.0 {
        return vec![Complex::new(0.0, 0.0); l + 1];
    }
    let cos_theta = (bond.z / r).clamp(-1.0, 1.0);
    let phi = bond.y.atan2(bond.x);
    #[allow(clippy::cast_precision_loss)]
    let base = (2 * l + 1) as f64 / (4.0 * PI);

    (0..=l)
        .map(|m| {
            let norm = (base * factorial(l - m) / factorial(l + m)).sqrt();
            #[allow(clippy::cast_precision_loss)]
            let phase = Complex::from_polar(1.0, m as f64 * phi);
            phase * (norm * associated_legendre(l, m, cos_theta))
        })
        .collect()
}

/// Mean harmonics over each particle's bonds; both ends of a bond receive the same `Y_lm`.
///
/// Particles without bonds get zeros.
#[must_use]
pub fn bond_harmonics(positions: &[Point3<f64>], graph: &NeighborGraph, l: usize) -> Vec<Harmonics> {
    (0..positions.len())
        .into_par_iter()
        .map(|i| {
            let mut sum = vec![Complex::new(0.0, 0.0); l + 1];
            let neighbors = graph.neighbors(i);
            for &j in neighbors {
                // Orient every bond from its lower-index end so both ends agree for odd l too
                let (a, b) = if i < j { (i, j) } else { (j, i) };
                let y = spherical_harmonics(l, &(positions[b] - positions[a]));
                for (s, v) in sum.iter_mut().zip(y) {
                    *s += v;
                }
            }
            if !neighbors.is_empty() {
                #[allow(clippy::cast_precision_loss)]
                let n = neighbors.len() as f64;
                for s in &mut sum {
                    *s /= n;
                }
            }
            sum
        })
        .collect()
}

/// Neighbor-averaged harmonics `(q_i + Σ_j q_j) / (1 + deg i)`
#[must_use]
pub fn coarse_grain(qlm: &[Harmonics], graph: &NeighborGraph) -> Vec<Harmonics> {
    (0..qlm.len())
        .into_par_iter()
        .map(|i| {
            let mut sum = qlm[i].clone();
            for &j in graph.neighbors(i) {
                for (s, v) in sum.iter_mut().zip(&qlm[j]) {
                    *s += v;
                }
            }
            #[allow(clippy::cast_precision_loss)]
            let n = (1 + graph.degree(i)) as f64;
            for s in &mut sum {
                *s /= n;
            }
            sum
        })
        .collect()
}

/// Rotational invariant `q_l = sqrt(4π/(2l+1) Σ_m |q_lm|²)`
#[must_use]
pub fn ql(qlm: &[Complex<f64>]) -> f64 {
    let l = qlm.len() - 1;
    let power = qlm[0].norm_sqr() + 2.0 * qlm[1..].iter().map(Complex::norm_sqr).sum::<f64>();
    #[allow(clippy::cast_precision_loss)]
    let scale = 4.0 * PI / (2 * l + 1) as f64;
    (scale * power).sqrt()
}

/// Component of order `m` (any sign) from the stored m ≥ 0 half
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
fn component(qlm: &[Complex<f64>], m: i64) -> Complex<f64> {
    if m >= 0 {
        qlm[m as usize]
    } else {
        qlm[(-m) as usize].conj() * parity(m)
    }
}

/// Wigner 3j symbol (j1 j2 j3; m1 m2 m3) by the Racah formula
#[allow(
    clippy::many_single_char_names,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::similar_names
)]
#[must_use]
pub fn wigner_3j(j1: i64, j2: i64, j3: i64, m1: i64, m2: i64, m3: i64) -> f64 {
    if m1 + m2 + m3 != 0
        || m1.abs() > j1
        || m2.abs() > j2
        || m3.abs() > j3
        || j3 < (j1 - j2).abs()
        || j3 > j1 + j2
    {
        return 0.0;
    }
    let f = |n: i64| factorial(n as usize);

    let triangle = (f(j1 + j2 - j3) * f(j1 - j2 + j3) * f(-j1 + j2 + j3) / f(j1 + j2 + j3 + 1)).sqrt();
    let prefactor = (f(j1 + m1) * f(j1 - m1) * f(j2 + m2) * f(j2 - m2) * f(j3 + m3) * f(j3 - m3)).sqrt();

    let k_min = 0.max(j2 - j3 - m1).max(j1 - j3 + m2);
    let k_max = (j1 + j2 - j3).min(j1 - m1).min(j2 + m2);
    let sum: f64 = (k_min..=k_max)
        .map(|k| {
            parity(k)
                / (f(k)
                    * f(j1 + j2 - j3 - k)
                    * f(j1 - m1 - k)
                    * f(j2 + m2 - k)
                    * f(j3 - j2 + m1 + k)
                    * f(j3 - j1 - m2 + k))
        })
        .sum();

    parity(j1 - j2 - m3) * triangle * prefactor * sum
}

/// Nonzero `(m1, m2, (l l l; m1 m2 m3))` entries with `m3 = −m1 − m2`
#[derive(Debug, Clone)]
pub struct WignerTable {
    entries: Vec<(i64, i64, f64)>,
}

impl WignerTable {
    #[allow(clippy::cast_possible_wrap)]
    #[must_use]
    pub fn new(l: usize) -> Self {
        let l = l as i64;
        let mut entries = Vec::new();
        for m1 in -l..=l {
            for m2 in -l..=l {
                let m3 = -m1 - m2;
                if m3.abs() > l {
                    continue;
                }
                let w = wigner_3j(l, l, l, m1, m2, m3);
                if w != 0.0 {
                    entries.push((m1, m2, w));
                }
            }
        }
        Self { entries }
    }
}

/// Third-order invariant `w_l = Σ (l l l; m1 m2 m3) q_lm1 q_lm2 q_lm3` (un-normalized)
#[must_use]
pub fn wl(qlm: &[Complex<f64>], table: &WignerTable) -> f64 {
    table
        .entries
        .iter()
        .map(|&(m1, m2, w)| {
            let product = component(qlm, m1) * component(qlm, m2) * component(qlm, -m1 - m2);
            w * product.re
        })
        .sum()
}

/// Column labels of the 40-column block
#[must_use]
pub fn boo_columns() -> Vec<String> {
    let mut columns = Vec::with_capacity(40);
    for (q, w) in [("q", "w"), ("Q", "W")] {
        for graph in ["voronoi", "cutoff"] {
            for invariant in [q, w] {
                for l in BOO_DEGREES {
                    columns.push(format!("{invariant}{l}_{graph}"));
                }
            }
        }
    }
    columns
}

/// Per particle `[q_l…, w_l…]` and `[Q_l…, W_l…]` over `BOO_DEGREES` on one bond graph
fn invariants_on_graph(positions: &[Point3<f64>], graph: &NeighborGraph) -> Vec<[Vec<f64>; 2]> {
    let n = positions.len();
    let k = BOO_DEGREES.len();
    let mut local = vec![vec![0.0; 2 * k]; n];
    let mut coarse = vec![vec![0.0; 2 * k]; n];

    for (d, &l) in BOO_DEGREES.iter().enumerate() {
        let qlm = bond_harmonics(positions, graph, l);
        let cg = coarse_grain(&qlm, graph);
        let table = WignerTable::new(l);
        for i in 0..n {
            local[i][d] = ql(&qlm[i]);
            local[i][k + d] = wl(&qlm[i], &table);
            coarse[i][d] = ql(&cg[i]);
            coarse[i][k + d] = wl(&cg[i], &table);
        }
    }

    local.into_iter().zip(coarse).map(|(a, b)| [a, b]).collect()
}

/// The 40 BOO columns on the Voronoi and cutoff bond graphs.
#[must_use]
pub fn compute_boo(
    positions: &[Point3<f64>],
    voronoi: &NeighborGraph,
    cutoff: &NeighborGraph,
) -> FeatureTable {
    let by_voronoi = invariants_on_graph(positions, voronoi);
    let by_cutoff = invariants_on_graph(positions, cutoff);

    let rows = by_voronoi
        .into_iter()
        .zip(by_cutoff)
        .map(|([qv, cgv], [qc, cgc])| [qv, qc, cgv, cgc].concat())
        .collect();
    FeatureTable::from_rows(boo_columns(), rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Center particle 0 bonded to 12 icosahedron vertices
    fn icosahedron() -> (Vec<Point3<f64>>, NeighborGraph) {
        let g = (1.0 + 5.0f64.sqrt()) / 2.0;
        let mut positions = vec![Point3::origin()];
        for &a in &[1.0, -1.0] {
            for &b in &[g, -g] {
                positions.push(Point3::new(0.0, a, b));
                positions.push(Point3::new(a, b, 0.0));
                positions.push(Point3::new(b, 0.0, a));
            }
        }
        let graph = NeighborGraph::from_pairs(13, (1..13).map(|j| (0, j)));
        (positions, graph)
    }

    fn fcc_shell() -> (Vec<Point3<f64>>, NeighborGraph) {
        let mut positions = vec![Point3::origin()];
        for &a in &[1.0, -1.0] {
            for &b in &[1.0, -1.0] {
                positions.push(Point3::new(a, b, 0.0));
                positions.push(Point3::new(a, 0.0, b));
                positions.push(Point3::new(0.0, a, b));
            }
        }
        let graph = NeighborGraph::from_pairs(13, (1..13).map(|j| (0, j)));
        (positions, graph)
    }

    #[test]
    fn test_low_order_harmonics() {
        let z = Vector3::new(0.0, 0.0, 2.0);
        let y = spherical_harmonics(2, &z);
        assert_relative_eq!(y[0].re, (5.0 / (4.0 * PI)).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(y[1].norm(), 0.0, epsilon = 1e-12);

        // Y_11(x̂) = −sqrt(3/8π) with the Condon–Shortley phase
        let y = spherical_harmonics(1, &Vector3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(y[1].re, -(3.0 / (8.0 * PI)).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_harmonics_addition_theorem() {
        // Σ_m |Y_lm|² = (2l+1)/4π for any direction
        let v = Vector3::new(0.3, -1.2, 0.7);
        for l in BOO_DEGREES {
            let y = spherical_harmonics(l, &v);
            let total = y[0].norm_sqr() + 2.0 * y[1..].iter().map(Complex::norm_sqr).sum::<f64>();
            #[allow(clippy::cast_precision_loss)]
            let expected = (2 * l + 1) as f64 / (4.0 * PI);
            assert_relative_eq!(total, expected, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_wigner_3j_values() {
        assert_relative_eq!(wigner_3j(1, 1, 0, 0, 0, 0), -(1.0f64 / 3.0).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(wigner_3j(2, 2, 2, 0, 0, 0), -(2.0f64 / 35.0).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(wigner_3j(1, 1, 1, 1, -1, 0), 1.0 / 6.0f64.sqrt(), epsilon = 1e-12);
        assert_eq!(wigner_3j(2, 2, 2, 1, 1, 1), 0.0);
    }

    #[test]
    fn test_single_bond_has_unit_ql() {
        let positions = vec![Point3::origin(), Point3::new(0.4, 1.1, -0.2)];
        let graph = NeighborGraph::from_pairs(2, [(0, 1)]);
        for l in BOO_DEGREES {
            let qlm = bond_harmonics(&positions, &graph, l);
            assert_relative_eq!(ql(&qlm[0]), 1.0, epsilon = 1e-10);
            assert_relative_eq!(ql(&qlm[1]), 1.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_reference_clusters() {
        let (positions, graph) = fcc_shell();
        let q4 = bond_harmonics(&positions, &graph, 4);
        let q6 = bond_harmonics(&positions, &graph, 6);
        assert_relative_eq!(ql(&q4[0]), 0.190_94, epsilon = 1e-4);
        assert_relative_eq!(ql(&q6[0]), 0.574_52, epsilon = 1e-4);

        let (positions, graph) = icosahedron();
        let q6 = bond_harmonics(&positions, &graph, 6);
        assert_relative_eq!(ql(&q6[0]), 0.663_32, epsilon = 1e-4);
        // Normalized ŵ6 of the icosahedron
        let power: f64 = q6[0][0].norm_sqr() + 2.0 * q6[0][1..].iter().map(Complex::norm_sqr).sum::<f64>();
        let w6 = wl(&q6[0], &WignerTable::new(6)) / power.powf(1.5);
        assert_relative_eq!(w6, -0.169_754, epsilon = 1e-5);
    }

    #[test]
    fn test_isolated_particle_is_zero() {
        let positions = vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(9.0, 9.0, 9.0)];
        let graph = NeighborGraph::from_pairs(3, [(0, 1)]);
        let table = compute_boo(&positions, &graph, &graph);
        assert_eq!(table.n_columns(), 40);
        assert!(table.row(2).iter().all(|&v| v == 0.0));
        assert_eq!(table.columns()[0], "q2_voronoi");
        assert_eq!(table.columns()[5], "w2_voronoi");
        assert_eq!(table.columns()[10], "q2_cutoff");
        assert_eq!(table.columns()[20], "Q2_voronoi");
        assert_eq!(table.columns()[39], "W10_cutoff");
    }
}
