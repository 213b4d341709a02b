//! JSON output of per-frame feature tables.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Serialize;

use crate::error::Result;
use crate::pipeline::{FeatureSettings, FrameFeatures};
use crate::types::FeatureTable;

/// On-disk layout of one `feature_all-<frame>.json` file
#[derive(Serialize)]
struct FrameOutput<'a> {
    frame: u64,
    particles: usize,
    settings: &'a FeatureSettings,
    symmetry_feature: &'a FeatureTable,
    interstice_distribution: &'a FeatureTable,
    conventional_feature: &'a FeatureTable,
}

/// Path of the feature file for `frame` inside `dir`
#[must_use]
pub fn feature_path(dir: &Path, frame: u64) -> PathBuf {
    dir.join(format!("feature_all-{frame}.json"))
}

/// Write the three feature tables of `frame` to `dir`, creating it if needed.
///
/// # Errors
/// Returns I/O or serialization errors.
pub fn write_frame_features(
    dir: &Path,
    frame: u64,
    features: &FrameFeatures,
    settings: &FeatureSettings,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = feature_path(dir, frame);
    let output = FrameOutput {
        frame,
        particles: features.symmetry.n_rows(),
        settings,
        symmetry_feature: &features.symmetry,
        interstice_distribution: &features.interstice,
        conventional_feature: &features.conventional,
    };
    let writer = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(writer, &output)?;
    debug!("Wrote {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(label: &str, values: &[f64]) -> FeatureTable {
        FeatureTable::from_rows(
            vec![label.to_string()],
            values.iter().map(|&v| vec![v]).collect(),
        )
    }

    #[test]
    fn writes_all_tables() {
        let dir = std::env::temp_dir().join(format!("structure-features-output-{}", std::process::id()));
        let features = FrameFeatures {
            symmetry: table("G_radial_00", &[1.0, 2.0]),
            interstice: table("interstice_distance_min_self", &[0.1, 0.2]),
            conventional: table("CN_voronoi_self", &[12.0, 11.0]),
        };
        let path = write_frame_features(&dir, 300, &features, &FeatureSettings::default()).unwrap();
        assert_eq!(path, dir.join("feature_all-300.json"));

        let value: serde_json::Value = serde_json::from_reader(File::open(&path).unwrap()).unwrap();
        assert_eq!(value["frame"], 300);
        assert_eq!(value["particles"], 2);
        assert_eq!(value["settings"]["hull_min_neighbors"], 4);
        assert_eq!(value["symmetry_feature"]["columns"][0], "G_radial_00");
        assert_eq!(value["conventional_feature"]["rows"][1][0], 11.0);
        assert_eq!(value["interstice_distribution"]["rows"].as_array().unwrap().len(), 2);

        fs::remove_dir_all(&dir).unwrap();
    }
}
