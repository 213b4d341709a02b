//! Error type shared by the feature pipeline and its collaborators.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by structural feature extraction.
///
/// Per-particle degeneracies (short neighbor shells, flat hulls, zero-volume
/// tetrahedra, empty shells in the aggregator) are not errors; each feature
/// substitutes a documented fallback value instead.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// The snapshot contains no particles.
    #[error("snapshot contains no particles")]
    EmptySnapshot,

    /// A particle has a non-finite coordinate or a non-positive radius.
    #[error("invalid particle at index {index}: {reason}")]
    InvalidParticle {
        /// Index of the invalid particle.
        index: usize,
        /// Description of why the particle is invalid.
        reason: &'static str,
    },

    /// Radii differ across the frame, breaking the monosize assumption.
    #[error("particle {index} has radius {found}, expected uniform radius {expected}")]
    NonUniformRadius {
        index: usize,
        expected: f64,
        found: f64,
    },

    /// The tessellation could not produce a valid cell; fatal for the frame.
    #[error("{}malformed Voronoi cell for particle {particle}: {reason}", frame_prefix(.frame))]
    MalformedTessellation {
        /// Frame being processed, attached once known.
        frame: Option<u64>,
        particle: usize,
        reason: String,
    },

    /// A dump file line could not be interpreted.
    #[error("{}:{line}: {reason}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// The input directory holds no `dump-<frame>.sample` files.
    #[error("no dump files found in {}", .dir.display())]
    NoFrames { dir: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl FeatureError {
    /// Attach a frame identifier to a tessellation failure.
    #[must_use]
    pub fn with_frame(self, frame: u64) -> Self {
        match self {
            Self::MalformedTessellation {
                particle, reason, ..
            } => Self::MalformedTessellation {
                frame: Some(frame),
                particle,
                reason,
            },
            other => other,
        }
    }
}

#[allow(clippy::ref_option)]
fn frame_prefix(frame: &Option<u64>) -> String {
    frame.map_or_else(String::new, |f| format!("frame {f}: "))
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, FeatureError>;
