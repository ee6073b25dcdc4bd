use std::time::Duration;

use criterion::{Criterion, Throughput};
use foliage_scatter::sampling::MeshData;
use glam::Vec3;

pub const SAMPLE_SIZE: usize = 20;
pub const WARM_UP: Duration = Duration::from_secs(1);
pub const MEASUREMENT_TIME: Duration = Duration::from_secs(2);

pub fn default_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .sample_size(SAMPLE_SIZE)
        .warm_up_time(WARM_UP)
        .measurement_time(MEASUREMENT_TIME)
}

pub fn elements_throughput(elements: usize) -> Throughput {
    Throughput::Elements(elements.max(1) as u64)
}

/// Flat `cells x cells` grid centered on the origin, two triangles per cell.
pub fn grid_mesh(cells: u32, cell_size: f32) -> MeshData {
    let n = cells + 1;
    let half = cells as f32 * cell_size * 0.5;
    let vertices = (0..n)
        .flat_map(|z| {
            (0..n).map(move |x| {
                Vec3::new(x as f32 * cell_size - half, 0.0, z as f32 * cell_size - half)
            })
        })
        .collect();
    let mut indices = Vec::with_capacity((cells * cells * 6) as usize);
    for z in 0..cells {
        for x in 0..cells {
            let i = z * n + x;
            indices.extend_from_slice(&[i, i + n, i + 1, i + 1, i + n, i + n + 1]);
        }
    }
    MeshData::try_new(vertices, indices).unwrap_or_default()
}
