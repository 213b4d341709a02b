// Copyright (c) 2026 Kliment Olechnovic and Mikael Lund
// Part of the structure-features project, licensed under the MIT License.
// SPDX-License-Identifier: MIT

//! Snapshot input: dump files named `dump-<frame>.sample` in one directory.
//!
//! Provides frame discovery, evenly spaced frame sampling and conversion of a
//! dump into a [`Snapshot`] with its padded container box.

pub mod dump;

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use log::{debug, info};
use nalgebra::Point3;

pub use dump::{DumpRecord, parse_dump};

use crate::error::{FeatureError, Result};
use crate::types::{BoundingBox, Particle, Snapshot};

const FILE_PREFIX: &str = "dump-";
const FILE_SUFFIX: &str = ".sample";

/// Path of the dump file for `frame` inside `dir`
#[must_use]
pub fn dump_path(dir: &Path, frame: u64) -> PathBuf {
    dir.join(format!("{FILE_PREFIX}{frame}{FILE_SUFFIX}"))
}

/// Frame number encoded in a dump file name, if it is one
#[must_use]
pub fn frame_of_file_name(name: &str) -> Option<u64> {
    name.strip_prefix(FILE_PREFIX)?
        .strip_suffix(FILE_SUFFIX)?
        .parse()
        .ok()
}

/// All frame numbers with a dump file in `dir`, ascending.
///
/// # Errors
/// Returns [`FeatureError::NoFrames`] if there is none, or an I/O error if the
/// directory cannot be listed.
pub fn discover_frames(dir: &Path) -> Result<Vec<u64>> {
    let mut frames = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if let Some(frame) = entry.file_name().to_str().and_then(frame_of_file_name) {
            frames.push(frame);
        } else {
            debug!("Ignoring {}", entry.path().display());
        }
    }
    if frames.is_empty() {
        return Err(FeatureError::NoFrames {
            dir: dir.to_path_buf(),
        });
    }
    frames.sort_unstable();
    frames.dedup();
    info!(
        "Found {} frames in {} ({}..={})",
        frames.len(),
        dir.display(),
        frames[0],
        frames[frames.len() - 1]
    );
    Ok(frames)
}

/// Pick `scenario` frames evenly spaced over `[first, last]`, excluding the
/// first frame and always including the last.
///
/// Frame numbers are truncated to integers and duplicates collapsed; the
/// result may name frames that have no dump file.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn sample_frames(frames: &[u64], scenario: usize) -> Vec<u64> {
    let (Some(&start), Some(&end)) = (frames.iter().min(), frames.iter().max()) else {
        return Vec::new();
    };
    if start == end || scenario <= 1 {
        return vec![end];
    }

    let interval = (end - start) as f64 / scenario as f64;
    let mut sampled: Vec<u64> = (1..scenario)
        .map(|k| (start as f64 + k as f64 * interval) as u64)
        .filter(|&f| f < end)
        .collect();
    sampled.push(end);
    sampled.dedup();
    sampled
}

/// Container around `particles`: coordinate extent padded by the first radius.
///
/// All bounds except the upper z bound are rounded to four decimals.
#[must_use]
pub fn padded_bounds(particles: &[Particle]) -> BoundingBox {
    let padding = particles.first().map_or(0.0, |p| p.r);
    let centers: Vec<Point3<f64>> = particles.iter().map(Particle::center).collect();
    let raw = BoundingBox::around(&centers, padding);
    let round = |v: f64| (v * 1e4).round() / 1e4;
    BoundingBox {
        min: raw.min.map(round),
        max: Point3::new(round(raw.max.x), round(raw.max.y), raw.max.z),
    }
}

/// Read one dump file into a validated snapshot.
///
/// # Errors
/// Returns I/O and parse errors, or the snapshot validation error.
pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let reader = BufReader::new(File::open(path)?);
    let records = parse_dump(reader, path)?;
    let particles: Vec<Particle> = records.iter().map(|r| r.particle).collect();
    debug!("Read {} particles from {}", particles.len(), path.display());
    Snapshot::new(&particles, padded_bounds(&particles))
}
