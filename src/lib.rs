//! Per-particle structural descriptors for dense, disordered monosize packings.
//!
//! For every particle of a snapshot this library computes three feature tables:
//! radial and angular symmetry functions, interstice statistics of the Voronoi
//! neighbor shell, and conventional Voronoi and bond-orientational order
//! descriptors. The last two are expanded into medium-range order by
//! aggregating each value over the particle's Voronoi neighbors.
//!
//! # Example
//!
//! ```
//! use structure_features::{FeatureSettings, Particle, Snapshot, compute_frame_features};
//!
//! let mut particles = Vec::new();
//! for i in 0..3 {
//!     for j in 0..3 {
//!         for k in 0..3 {
//!             let (x, y, z) = (f64::from(i), f64::from(j), f64::from(k));
//!             particles.push(Particle::new(2.1 * x, 2.1 * y + 0.01 * x, 2.1 * z, 1.0));
//!         }
//!     }
//! }
//!
//! let snapshot = Snapshot::with_padded_bounds(&particles).unwrap();
//! let features = compute_frame_features(&snapshot, &FeatureSettings::default()).unwrap();
//!
//! assert_eq!(features.symmetry.n_rows(), 27);
//! assert_eq!(features.interstice.n_columns(), 60);
//! assert_eq!(features.conventional.columns()[0], "CN_voronoi_self");
//! ```

pub mod boo;
mod cell;
pub mod conventional;
mod error;
mod geometry;
pub mod hull;
pub mod input;
pub mod interstice;
pub mod mro;
pub mod neighbor_graph;
pub mod output;
mod pipeline;
mod points_searcher;
mod stats;
pub mod symmetry;
mod types;
pub mod voronoi;

pub use cell::{CellFace, FaceNeighbor, VoronoiCell, Wall};
pub use error::{FeatureError, Result};
pub use mro::EmptyShellPolicy;
pub use neighbor_graph::{CutoffGraph, NeighborGraph, build_cutoff_graph};
pub use output::write_frame_features;
pub use pipeline::{FeatureSettings, FrameFeatures, compute_frame_features};
pub use types::{BoundingBox, FeatureTable, Particle, Snapshot};
pub use voronoi::{VoronoiTessellation, compute_voronoi_tessellation};
