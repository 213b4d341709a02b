use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use structure_features::{
    FeatureSettings, Particle, Snapshot, compute_frame_features, compute_voronoi_tessellation,
};

/// Jittered simple-cubic packing of `n`³ unit spheres
fn packing(n: usize) -> Snapshot {
    let mut particles = Vec::with_capacity(n * n * n);
    for i in 0..n {
        for j in 0..n {
            for k in 0..n {
                let seed = (particles.len() + 1) as f64;
                let jitter = |phase: f64| 0.2 * (seed * 12.9898 + phase).sin();
                particles.push(Particle::new(
                    i as f64 * 2.05 + jitter(0.0),
                    j as f64 * 2.05 + jitter(1.7),
                    k as f64 * 2.05 + jitter(3.1),
                    1.0,
                ));
            }
        }
    }
    Snapshot::with_padded_bounds(&particles).unwrap()
}

fn bench_tessellation(c: &mut Criterion) {
    let mut group = c.benchmark_group("tessellation");
    for n in [6, 10] {
        let snapshot = packing(n);
        group.throughput(Throughput::Elements(snapshot.len() as u64));
        group.bench_with_input(BenchmarkId::new("voronoi", n), &snapshot, |b, s| {
            b.iter(|| {
                compute_voronoi_tessellation(black_box(s.positions()), s.bounds(), 5.0, 0.05)
            });
        });
    }
    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let settings = FeatureSettings::default();
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(10);
    for n in [6, 10] {
        let snapshot = packing(n);
        group.throughput(Throughput::Elements(snapshot.len() as u64));
        group.bench_with_input(BenchmarkId::new("frame_features", n), &snapshot, |b, s| {
            b.iter(|| compute_frame_features(black_box(s), &settings));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_tessellation, bench_pipeline);
criterion_main!(benches);
