//! Bounded, aperiodic Voronoi tessellation and area-pruned Voronoi neighbor graph.
//!
//! Each cell starts as the container box and is clipped by the bisector planes
//! of nearby particles in order of increasing distance. Clipping stops once the
//! next candidate lies farther than twice the cell's largest vertex distance,
//! at which point no remaining particle can cut the cell.

use log::{debug, info};
use nalgebra::Point3;
use rayon::prelude::*;

use crate::cell::{FaceNeighbor, VoronoiCell};
use crate::error::{FeatureError, Result};
use crate::geometry::EPSILON;
use crate::neighbor_graph::NeighborGraph;
use crate::points_searcher::PointsSearcher;
use crate::types::BoundingBox;

/// Voronoi cells of one frame plus the pruned, symmetrized adjacency.
#[derive(Debug, Clone)]
pub struct VoronoiTessellation {
    cells: Vec<VoronoiCell>,
    retained: Vec<Vec<usize>>,
    graph: NeighborGraph,
    pruned_faces: usize,
}

impl VoronoiTessellation {
    #[inline]
    #[must_use]
    pub fn cells(&self) -> &[VoronoiCell] {
        &self.cells
    }

    #[inline]
    #[must_use]
    pub fn cell(&self, i: usize) -> &VoronoiCell {
        &self.cells[i]
    }

    /// Cell volumes in particle order
    #[must_use]
    pub fn volumes(&self) -> Vec<f64> {
        self.cells.iter().map(VoronoiCell::volume).collect()
    }

    /// Neighbors whose shared face survived pruning, as seen from cell `i` only
    #[inline]
    #[must_use]
    pub fn retained_neighbors(&self, i: usize) -> &[usize] {
        &self.retained[i]
    }

    /// Union-symmetrized graph of retained faces
    #[inline]
    #[must_use]
    pub const fn graph(&self) -> &NeighborGraph {
        &self.graph
    }

    /// Number of particle faces dropped for being below the area threshold
    #[inline]
    #[must_use]
    pub const fn pruned_faces(&self) -> usize {
        self.pruned_faces
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Compute the Voronoi tessellation of `positions` inside `bounds`.
///
/// `dispersion` is the initial neighbor search radius; it is widened per cell
/// until the cell is provably complete. Faces with area below
/// `prune_fraction` × (mean face area of that cell, walls included) do not
/// count as adjacency.
///
/// # Errors
/// Returns [`FeatureError::MalformedTessellation`] if a particle lies outside
/// the container, two particles coincide, or a cell degenerates.
pub fn compute_voronoi_tessellation(
    positions: &[Point3<f64>],
    bounds: &BoundingBox,
    dispersion: f64,
    prune_fraction: f64,
) -> Result<VoronoiTessellation> {
    let tolerance = EPSILON * bounds.diagonal().max(1.0);
    let searcher = PointsSearcher::new(positions, dispersion);

    let cells: Vec<VoronoiCell> = (0..positions.len())
        .into_par_iter()
        .map(|id| build_cell(id, &searcher, bounds, dispersion, tolerance))
        .collect::<Result<_>>()?;

    let (retained, pruned): (Vec<Vec<usize>>, Vec<usize>) = cells
        .iter()
        .map(|cell| prune_faces(cell, prune_fraction))
        .unzip();
    let pruned_faces = pruned.iter().sum();
    let graph = NeighborGraph::symmetrized(&retained);

    info!(
        "Tessellated {} cells: {} Voronoi edges, {pruned_faces} small faces pruned",
        cells.len(),
        graph.edge_count()
    );

    Ok(VoronoiTessellation {
        cells,
        retained,
        graph,
        pruned_faces,
    })
}

fn malformed(particle: usize, reason: impl Into<String>) -> FeatureError {
    FeatureError::MalformedTessellation {
        frame: None,
        particle,
        reason: reason.into(),
    }
}

/// Build the cell of particle `id` by successive bisector clipping.
fn build_cell(
    id: usize,
    searcher: &PointsSearcher,
    bounds: &BoundingBox,
    dispersion: f64,
    tolerance: f64,
) -> Result<VoronoiCell> {
    let points = searcher.points();
    let center = points[id];
    if !bounds.contains(&center) {
        return Err(malformed(id, "particle lies outside the container"));
    }

    let mut cell = VoronoiCell::from_box(center, bounds, tolerance);
    let limit = bounds.diagonal();
    let mut searched = 0.0;
    let mut radius = dispersion.max(tolerance);

    loop {
        let mut complete = false;
        for candidate in searcher
            .find_ids_within(&center, radius, Some(id))
            .into_iter()
            .filter(|c| c.value > searched || searched == 0.0)
        {
            if candidate.value >= 2.0 * cell.max_radius() {
                complete = true;
                break;
            }
            if candidate.value <= tolerance {
                return Err(malformed(
                    id,
                    format!("coincides with particle {}", candidate.index),
                ));
            }
            let other = points[candidate.index];
            let normal = (other - center) / candidate.value;
            let midpoint = center + (other - center) * 0.5;
            cell.clip(&midpoint, &normal, FaceNeighbor::Particle(candidate.index));
        }

        if complete || 2.0 * cell.max_radius() <= radius || radius >= limit {
            break;
        }
        searched = radius;
        radius *= 2.0;
        debug!("Cell {id}: widening search radius to {radius:.4}");
    }

    cell.finalize();
    if cell.faces().len() < 4 || cell.volume().is_nan() || cell.volume() <= 0.0 {
        return Err(malformed(
            id,
            format!(
                "degenerate cell with {} faces and volume {}",
                cell.faces().len(),
                cell.volume()
            ),
        ));
    }
    Ok(cell)
}

/// Neighbors of a cell whose face area reaches `fraction` of the cell's mean
/// face area, plus the count of particle faces that did not.
fn prune_faces(cell: &VoronoiCell, fraction: f64) -> (Vec<usize>, usize) {
    let faces = cell.faces();
    #[allow(clippy::cast_precision_loss)]
    let mean = faces.iter().map(|f| f.area).sum::<f64>() / faces.len() as f64;
    let threshold = fraction * mean;

    let mut kept = Vec::new();
    let mut dropped = 0;
    for (neighbor, face) in cell.particle_faces() {
        if face.area >= threshold {
            kept.push(neighbor);
        } else {
            dropped += 1;
        }
    }
    (kept, dropped)
}
