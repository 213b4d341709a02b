//! CLI for computing structural features of every sampled frame in a dump directory.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Instant;

use clap::{ArgAction, Parser};
use log::{debug, info, warn};
use structure_features::input::{discover_frames, dump_path, read_snapshot, sample_frames};
use structure_features::{
    FeatureError, FeatureSettings, Result, compute_frame_features, write_frame_features,
};

#[derive(Parser)]
#[command(name = "structure-features")]
#[command(about = "Compute per-particle structural features of packing snapshots")]
#[command(
    long_about = "Reads particle dumps named dump-<frame>.sample from the input directory, \
    samples frames evenly between the first and the last, and writes symmetry function, \
    interstice and conventional/bond-orientational order features of each sampled frame \
    to feature_all-<frame>.json in the output directory."
)]
struct Cli {
    /// Number of frames sampled between the first and the last dump
    #[arg(long, default_value_t = 1000)]
    scenario: usize,

    /// Directory holding dump-<frame>.sample files
    #[arg(short, long)]
    input: PathBuf,

    /// Directory receiving feature_all-<frame>.json files
    #[arg(short, long)]
    output: PathBuf,

    /// JSON file overriding feature settings (missing fields keep their defaults)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Increase verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Reduce verbosity to warnings only
    #[arg(short, long)]
    quiet: bool,

    /// Maximum number of threads to use (default: all available)
    #[arg(long)]
    processors: Option<usize>,

    /// Measure and report running time per frame
    #[arg(long)]
    measure_running_time: bool,
}

fn load_settings(cli: &Cli) -> Result<FeatureSettings> {
    let Some(path) = &cli.settings else {
        return Ok(FeatureSettings::default());
    };
    let settings = serde_json::from_reader(BufReader::new(File::open(path)?))?;
    info!("Loaded settings from {}", path.display());
    Ok(settings)
}

fn process_frame(cli: &Cli, frame: u64, settings: &FeatureSettings) -> Result<()> {
    let start = Instant::now();
    let snapshot = read_snapshot(&dump_path(&cli.input, frame))?;
    let features = compute_frame_features(&snapshot, settings)?;
    let path = write_frame_features(&cli.output, frame, &features, settings)?;
    if cli.measure_running_time {
        info!("Frame {frame}: {} ms", start.elapsed().as_millis());
    }
    debug!("Frame {frame} written to {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    if let Some(num_threads) = cli.processors {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .map_err(std::io::Error::other)?;
        info!("Using {num_threads} threads");
    }

    let settings = load_settings(&cli)?;
    let frames = sample_frames(&discover_frames(&cli.input)?, cli.scenario);
    info!("Processing {} sampled frames", frames.len());

    let start = Instant::now();
    let mut written = 0;
    for &frame in &frames {
        if !dump_path(&cli.input, frame).is_file() {
            warn!("Frame {frame} has no dump file, skipping");
            continue;
        }
        match process_frame(&cli, frame, &settings) {
            Ok(()) => written += 1,
            Err(err @ FeatureError::Io(_)) => return Err(err),
            Err(err) => warn!("Skipping frame: {}", err.with_frame(frame)),
        }
    }

    info!("Wrote features for {written} of {} frames", frames.len());
    if cli.measure_running_time {
        info!("Total time: {} ms", start.elapsed().as_millis());
    }
    Ok(())
}
