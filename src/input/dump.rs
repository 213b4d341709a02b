// Copyright (c) 2026 Kliment Olechnovic and Mikael Lund
// Part of the structure-features project, licensed under the MIT License.
// SPDX-License-Identifier: MIT

//! Particle dump parser (LIGGGHTS/LAMMPS `dump custom` style).
//!
//! Nine header lines are skipped; each data line starts with
//! `id type radius x y z`, further columns are ignored.

use std::io::BufRead;
use std::path::Path;

use crate::error::{FeatureError, Result};
use crate::types::Particle;

/// Header lines preceding the particle table
pub const HEADER_LINES: usize = 9;

/// One parsed particle line with its dump id. The type column is read but not kept.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DumpRecord {
    pub id: i64,
    pub particle: Particle,
}

#[allow(clippy::cast_possible_truncation)]
fn parse_dump_line(line: &str) -> std::result::Result<DumpRecord, String> {
    let values = line
        .split_whitespace()
        .take(6)
        .map(|token| {
            token
                .parse::<f64>()
                .map_err(|_| format!("invalid number '{token}'"))
        })
        .collect::<std::result::Result<Vec<f64>, String>>()?;
    let &[id, _kind, r, x, y, z] = values.as_slice() else {
        return Err(format!("expected 6 columns, found {}", values.len()));
    };
    Ok(DumpRecord {
        id: id as i64,
        particle: Particle::new(x, y, z, r),
    })
}

/// Parse a dump, returning records sorted by ascending id.
///
/// `path` is only used to label errors.
///
/// # Errors
/// Returns [`FeatureError::Parse`] for a malformed data line and
/// [`FeatureError::Io`] if reading fails.
pub fn parse_dump<R: BufRead>(reader: R, path: &Path) -> Result<Vec<DumpRecord>> {
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate().skip(HEADER_LINES) {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = parse_dump_line(&line).map_err(|reason| FeatureError::Parse {
            path: path.to_path_buf(),
            line: index + 1,
            reason,
        })?;
        records.push(record);
    }
    records.sort_by_key(|r| r.id);
    Ok(records)
}
