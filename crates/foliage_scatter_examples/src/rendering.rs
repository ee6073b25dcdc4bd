use std::collections::HashMap;
use std::path::Path;

use foliage_scatter::prelude::*;
use glam::{Vec2, Vec3};
use image::{Rgb, RgbImage};
use tracing_subscriber::EnvFilter;

const SHADING_BLOCK: u32 = 8;

/// Install a fmt subscriber honoring `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// How instances of a prefab are drawn.
#[derive(Debug, Clone, Copy)]
pub enum InstanceStyle {
    Circle { color: [u8; 3], radius: i32 },
    Dot { color: [u8; 3] },
}

impl InstanceStyle {
    fn color(&self) -> [u8; 3] {
        match *self {
            InstanceStyle::Circle { color, .. } | InstanceStyle::Dot { color } => color,
        }
    }

    fn radius(&self) -> i32 {
        match *self {
            InstanceStyle::Circle { radius, .. } => radius.max(0),
            InstanceStyle::Dot { .. } => 0,
        }
    }
}

/// Top-down (XZ plane) rendering setup.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub image_size: (u32, u32),
    /// World extent covered by the image.
    pub domain_extent: Vec2,
    pub domain_center: Vec2,
    pub background: [u8; 3],
    pub default_style: InstanceStyle,
    styles: HashMap<PrefabId, InstanceStyle>,
    /// Shade the background by terrain height between `(min, max)`.
    pub height_shading: Option<(f32, f32)>,
}

impl RenderConfig {
    pub fn new(image_size: (u32, u32), domain_extent: Vec2) -> Self {
        Self {
            image_size,
            domain_extent,
            domain_center: Vec2::ZERO,
            background: [235, 235, 225],
            default_style: InstanceStyle::Circle {
                color: [30, 120, 30],
                radius: 3,
            },
            styles: HashMap::new(),
            height_shading: None,
        }
    }

    pub fn with_background(mut self, background: [u8; 3]) -> Self {
        self.background = background;
        self
    }

    pub fn with_domain_center(mut self, center: Vec2) -> Self {
        self.domain_center = center;
        self
    }

    pub fn with_height_shading(mut self, min: f32, max: f32) -> Self {
        self.height_shading = Some((min, max));
        self
    }

    pub fn set_style(&mut self, prefab: PrefabId, style: InstanceStyle) -> &mut Self {
        self.styles.insert(prefab, style);
        self
    }

    fn to_pixel(&self, p: Vec3) -> (i32, i32) {
        let (w, h) = self.image_size;
        let local = Vec2::new(p.x, p.z) - self.domain_center + self.domain_extent * 0.5;
        let u = local.x / self.domain_extent.x;
        let v = local.y / self.domain_extent.y;
        ((u * w as f32) as i32, (v * h as f32) as i32)
    }

    fn to_world(&self, px: u32, py: u32) -> Vec2 {
        let (w, h) = self.image_size;
        let uv = Vec2::new((px as f32 + 0.5) / w as f32, (py as f32 + 0.5) / h as f32);
        uv * self.domain_extent - self.domain_extent * 0.5 + self.domain_center
    }
}

/// Render placements as a top-down PNG.
///
/// `prefab_of` maps an instance to its prefab for styling; unknown instances use the
/// default style.
pub fn render_placements_to_png<Q, F>(
    scene: &Q,
    placements: &[Placement],
    prefab_of: F,
    config: &RenderConfig,
    path: impl AsRef<Path>,
) -> anyhow::Result<()>
where
    Q: SpatialQuery,
    F: Fn(EntityId) -> Option<PrefabId>,
{
    let (w, h) = config.image_size;
    anyhow::ensure!(w > 0 && h > 0, "image size must be non-zero");
    let mut img = RgbImage::from_pixel(w, h, Rgb(config.background));

    if let Some((min, max)) = config.height_shading {
        let span = (max - min).max(f32::EPSILON);
        let [r, g, b] = config.background;
        // One probe per block; the in-memory host raycasts by brute force.
        for by in (0..h).step_by(SHADING_BLOCK as usize) {
            for bx in (0..w).step_by(SHADING_BLOCK as usize) {
                let xz = config.to_world(bx + SHADING_BLOCK / 2, by + SHADING_BLOCK / 2);
                let origin = Vec3::new(xz.x, max + 1.0, xz.y);
                let Some(hit) = scene.raycast_down(origin, f32::INFINITY) else {
                    continue;
                };
                let t = ((hit.point.y - min) / span).clamp(0.0, 1.0);
                let shade = |c: u8| (f32::from(c) * (0.7 + 0.3 * t)) as u8;
                let color = Rgb([shade(r), shade(g), shade(b)]);
                for py in by..(by + SHADING_BLOCK).min(h) {
                    for px in bx..(bx + SHADING_BLOCK).min(w) {
                        img.put_pixel(px, py, color);
                    }
                }
            }
        }
    }

    for placement in placements {
        let style = prefab_of(placement.entity)
            .and_then(|prefab| config.styles.get(&prefab).copied())
            .unwrap_or(config.default_style);
        let (cx, cy) = config.to_pixel(placement.position);
        draw_disc(&mut img, cx, cy, style.radius(), style.color());
    }

    img.save(path.as_ref())?;
    tracing::info!("Wrote {}.", path.as_ref().display());
    Ok(())
}

fn draw_disc(img: &mut RgbImage, cx: i32, cy: i32, radius: i32, color: [u8; 3]) {
    let (w, h) = (img.width() as i32, img.height() as i32);
    let r2 = radius * radius;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > r2 {
                continue;
            }
            let (x, y) = (cx + dx, cy + dy);
            if x >= 0 && y >= 0 && x < w && y < h {
                img.put_pixel(x as u32, y as u32, Rgb(color));
            }
        }
    }
}
