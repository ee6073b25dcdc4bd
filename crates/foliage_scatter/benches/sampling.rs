mod common;

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use foliage_scatter::sampling::{Surface, TriangleSampling};
use foliage_scatter::scene::EntityId;
use glam::Affine3A;
use rand::rngs::StdRng;
use rand::SeedableRng;

const GRID_CELLS: [u32; 4] = [1, 16, 64, 256];
const SAMPLES_PER_ITER: usize = 1_000;

fn sampling_surface_benches(c: &mut Criterion) {
    for sampling in [TriangleSampling::Parallelogram, TriangleSampling::Uniform] {
        let mut group = c.benchmark_group(format!("sampling/surface/{sampling:?}"));
        group.throughput(common::elements_throughput(SAMPLES_PER_ITER));

        for &cells in &GRID_CELLS {
            let mesh = Arc::new(common::grid_mesh(cells, 1.0));
            let surface = Surface::new(EntityId(1), mesh, Affine3A::IDENTITY);
            let mut rng = StdRng::seed_from_u64(0x5EED_u64 ^ u64::from(cells));

            group.bench_with_input(BenchmarkId::from_parameter(cells), &cells, |b, _| {
                b.iter(|| {
                    let mut acc = 0.0f32;
                    for _ in 0..SAMPLES_PER_ITER {
                        if let Ok(p) = surface.sample_point_with(sampling, 0.0, &mut rng) {
                            acc += p.x;
                        }
                    }
                    black_box(acc);
                });
            });
        }

        group.finish();
    }
}

criterion_group! {
    name = benches;
    config = common::default_criterion();
    targets = sampling_surface_benches
}
criterion_main!(benches);
