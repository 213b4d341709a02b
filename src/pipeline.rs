//! Feature extraction for one snapshot: neighbor graphs, short-range features
//! and their medium-range aggregates.

use std::time::Instant;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::boo::compute_boo;
use crate::conventional::{compute_cluster_packing_efficiency, compute_conventional};
use crate::error::Result;
use crate::hull::shell_triangulations;
use crate::interstice::compute_interstice;
use crate::mro::{EmptyShellPolicy, aggregate_mro};
use crate::neighbor_graph::build_cutoff_graph;
use crate::symmetry::compute_symmetry_functions;
use crate::types::{FeatureTable, Snapshot};
use crate::voronoi::compute_voronoi_tessellation;

/// Number of BOO columns aggregated over the shell; the rest are already coarse-grained
const AGGREGATED_BOO_COLUMNS: usize = 20;

/// Tunable parameters of the feature pipeline. Distances are in units of the particle radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureSettings {
    /// Neighbor cutoff of the symmetry functions
    pub symmetry_cutoff_factor: f64,
    /// Neighbor cutoff of the cutoff coordination number and cutoff-bond BOO
    pub coordination_cutoff_factor: f64,
    /// Initial neighbor search radius of the tessellation
    pub voronoi_dispersion_factor: f64,
    /// Faces below this fraction of their cell's mean face area are not adjacency
    pub face_prune_fraction: f64,
    /// Smallest neighbor shell that gets a hull triangulation. Values below
    /// [`MIN_HULL_MEMBERS`](crate::hull::MIN_HULL_MEMBERS) behave as that floor.
    pub hull_min_neighbors: usize,
    pub empty_shell_policy: EmptyShellPolicy,
}

impl Default for FeatureSettings {
    fn default() -> Self {
        Self {
            symmetry_cutoff_factor: 5.0,
            coordination_cutoff_factor: 3.0,
            voronoi_dispersion_factor: 5.0,
            face_prune_fraction: 0.05,
            hull_min_neighbors: 4,
            empty_shell_policy: EmptyShellPolicy::SelfValue,
        }
    }
}

/// The three per-frame feature tables, rows in particle order
#[derive(Debug, Clone, Serialize)]
pub struct FrameFeatures {
    /// 22 angular + 50 radial symmetry functions
    pub symmetry: FeatureTable,
    /// Interstice distance, area and volume statistics with MRO expansion (60 columns)
    pub interstice: FeatureTable,
    /// Conventional, packing efficiency and BOO features with MRO expansion (215 columns)
    pub conventional: FeatureTable,
}

/// Compute every feature table for one snapshot.
///
/// # Errors
/// Returns [`crate::FeatureError::MalformedTessellation`] if the Voronoi
/// tessellation fails; the frame id is not known here and can be attached
/// with [`crate::FeatureError::with_frame`].
pub fn compute_frame_features(
    snapshot: &Snapshot,
    settings: &FeatureSettings,
) -> Result<FrameFeatures> {
    let start = Instant::now();
    let positions = snapshot.positions();
    let radius = snapshot.radius();

    let tessellation = compute_voronoi_tessellation(
        positions,
        snapshot.bounds(),
        settings.voronoi_dispersion_factor * radius,
        settings.face_prune_fraction,
    )?;
    let voronoi = tessellation.graph();
    let symmetry_graph = build_cutoff_graph(positions, settings.symmetry_cutoff_factor * radius);
    let coordination_graph =
        build_cutoff_graph(positions, settings.coordination_cutoff_factor * radius);
    let shells = shell_triangulations(positions, voronoi, settings.hull_min_neighbors);
    debug!("Neighbor graphs built in {} ms", start.elapsed().as_millis());

    let symmetry = compute_symmetry_functions(positions, radius, &symmetry_graph);

    let interstice_sro = compute_interstice(positions, radius, voronoi, &shells).combined();
    let interstice = aggregate_mro(&interstice_sro, None, voronoi, settings.empty_shell_policy);

    let conventional_sro = compute_conventional(&tessellation, coordination_graph.graph(), radius);
    let packing = compute_cluster_packing_efficiency(positions, radius, voronoi, &shells);
    let boo = compute_boo(positions, voronoi, coordination_graph.graph());
    let (boo_local, boo_coarse) = boo.split_columns(AGGREGATED_BOO_COLUMNS);
    let conventional = aggregate_mro(
        &FeatureTable::hstack(&[&conventional_sro, &packing, &boo_local]),
        Some(&boo_coarse),
        voronoi,
        settings.empty_shell_policy,
    );

    info!(
        "Computed features for {} particles in {} ms",
        snapshot.len(),
        start.elapsed().as_millis()
    );

    Ok(FrameFeatures {
        symmetry,
        interstice,
        conventional,
    })
}
