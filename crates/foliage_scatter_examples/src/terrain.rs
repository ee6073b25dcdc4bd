use foliage_scatter::sampling::MeshData;
use glam::Vec3;

/// Grid terrain parameters for the demos.
#[derive(Debug, Clone, Copy)]
pub struct TerrainConfig {
    pub cells: u32,
    pub size: f32,
    pub amplitude: f32,
    pub wavelength: f32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            cells: 64,
            size: 100.0,
            amplitude: 4.0,
            wavelength: 30.0,
        }
    }
}

/// Square grid mesh centered on the origin with a smooth sine height field.
pub fn rolling_hills(config: &TerrainConfig) -> anyhow::Result<MeshData> {
    anyhow::ensure!(config.cells > 0, "terrain needs at least one cell");
    let n = config.cells + 1;
    let step = config.size / config.cells as f32;
    let half = config.size * 0.5;
    let k = std::f32::consts::TAU / config.wavelength.max(f32::EPSILON);

    let mut vertices = Vec::with_capacity((n * n) as usize);
    for z in 0..n {
        for x in 0..n {
            let px = x as f32 * step - half;
            let pz = z as f32 * step - half;
            let y = config.amplitude * (px * k).sin() * (pz * k * 0.7).cos();
            vertices.push(Vec3::new(px, y, pz));
        }
    }

    let mut indices = Vec::with_capacity((config.cells * config.cells * 6) as usize);
    for z in 0..config.cells {
        for x in 0..config.cells {
            let i = z * n + x;
            indices.extend_from_slice(&[i, i + n, i + 1, i + 1, i + n, i + n + 1]);
        }
    }

    Ok(MeshData::try_new(vertices, indices)?)
}
