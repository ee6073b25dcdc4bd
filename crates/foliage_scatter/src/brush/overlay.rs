//! Preview geometry for drawing the brush under the cursor.
//!
//! The overlay is pure data: hosts draw each ring as a filled disc in the plane
//! defined by `center` and `normal`, outermost first.
use glam::Vec3;

use crate::brush::{BrushMode, BrushSettings};

/// Number of concentric discs drawn for an advanced brush.
pub const OVERLAY_RING_COUNT: usize = 8;
/// Total alpha budget spread over all rings.
pub const OVERLAY_BASE_ALPHA: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayRing {
    pub radius: f32,
    pub alpha: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrushOverlay {
    pub center: Vec3,
    pub normal: Vec3,
    pub radius: f32,
    /// Radius of the full-strength core; equals `radius` for simple brushes.
    pub hardness_radius: f32,
    /// Discs ordered from outer to inner.
    pub rings: Vec<OverlayRing>,
}

impl BrushOverlay {
    pub fn new(settings: &BrushSettings, center: Vec3, normal: Vec3) -> Self {
        let radius = settings.radius;
        match settings.mode {
            BrushMode::Simple => Self {
                center,
                normal,
                radius,
                hardness_radius: radius,
                rings: vec![OverlayRing {
                    radius,
                    alpha: OVERLAY_BASE_ALPHA,
                }],
            },
            BrushMode::Advanced => {
                let falloff = settings.falloff();
                let n = OVERLAY_RING_COUNT as f32;
                let rings = (0..OVERLAY_RING_COUNT)
                    .map(|i| {
                        let outer = 1.0 - i as f32 / n;
                        let mid = outer - 0.5 / n;
                        OverlayRing {
                            radius: radius * outer,
                            alpha: OVERLAY_BASE_ALPHA * falloff.strength(mid) / n,
                        }
                    })
                    .collect();
                Self {
                    center,
                    normal,
                    radius,
                    hardness_radius: falloff.hardness_radius(radius),
                    rings,
                }
            }
        }
    }

    /// Accumulated alpha at normalized distance `t`, as seen through stacked rings.
    pub fn alpha_at(&self, t: f32) -> f32 {
        let d = t * self.radius;
        self.rings
            .iter()
            .filter(|ring| d <= ring.radius)
            .map(|ring| ring.alpha)
            .sum()
    }
}
