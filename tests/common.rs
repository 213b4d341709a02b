#![allow(dead_code)]

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use structure_features::Particle;

pub const RADIUS: f64 = 1.0;

pub fn binary_command() -> Command {
    Command::new(env!("CARGO_BIN_EXE_structure-features"))
}

/// Cubic lattice of `n`³ particles with deterministic jitter of at most `amplitude` per axis
pub fn jittered_lattice(n: usize, spacing: f64, amplitude: f64) -> Vec<Particle> {
    let mut particles = Vec::with_capacity(n * n * n);
    let mut seed = 0.0_f64;
    for i in 0..n {
        for j in 0..n {
            for k in 0..n {
                seed += 1.0;
                let jitter = |phase: f64| amplitude * (seed * 12.9898 + phase).sin();
                particles.push(Particle::new(
                    i as f64 * spacing + jitter(0.0),
                    j as f64 * spacing + jitter(1.7),
                    k as f64 * spacing + jitter(3.1),
                    RADIUS,
                ));
            }
        }
    }
    particles
}

/// Regular tetrahedron with edge `2√2·scale` centered on the origin
pub fn regular_tetrahedron(scale: f64) -> Vec<Particle> {
    [(1.0, 1.0, 1.0), (1.0, -1.0, -1.0), (-1.0, 1.0, -1.0), (-1.0, -1.0, 1.0)]
        .iter()
        .map(|&(x, y, z)| Particle::new(x * scale, y * scale, z * scale, RADIUS))
        .collect()
}

/// Dump text with a nine-line header, particles listed in reverse id order
pub fn dump_text(frame: u64, particles: &[Particle]) -> String {
    let mut text = format!(
        "ITEM: TIMESTEP\n{frame}\nITEM: NUMBER OF ATOMS\n{}\n\
         ITEM: BOX BOUNDS ff ff ff\n-10 10\n-10 10\n-10 10\n\
         ITEM: ATOMS id type radius x y z vx vy vz\n",
        particles.len()
    );
    for (id, p) in particles.iter().enumerate().rev() {
        writeln!(text, "{} 1 {} {} {} {} 0 0 0", id + 1, p.r, p.x, p.y, p.z).unwrap();
    }
    text
}

pub fn write_dump(dir: &Path, frame: u64, particles: &[Particle]) -> PathBuf {
    let path = dir.join(format!("dump-{frame}.sample"));
    fs::write(&path, dump_text(frame, particles)).expect("failed to write dump");
    path
}

/// Fresh, empty scratch directory under the system temp dir
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "structure-features-{name}-{}",
        std::process::id()
    ));
    if dir.exists() {
        fs::remove_dir_all(&dir).expect("failed to clear scratch dir");
    }
    fs::create_dir_all(&dir).expect("failed to create scratch dir");
    dir
}
