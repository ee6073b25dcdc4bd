//! Interactive brush: settings, falloff curve, preview overlay, stroke throttling and
//! the pointer-driven painter that turns input into [`painter::StrokeEvent`]s.
use crate::error::{Error, Result};

pub mod falloff;
pub mod overlay;
pub mod painter;
pub mod rate_limit;

pub use falloff::Falloff;
pub use overlay::{BrushOverlay, OverlayRing};
pub use painter::{BrushPainter, PointerInput, PointerPhase, StrokeEvent};
pub use rate_limit::{StrokeLimits, StrokeRateLimiter};

pub const MIN_BRUSH_RADIUS: f32 = 0.1;
pub const MAX_BRUSH_RADIUS: f32 = 10.0;
pub const MIN_BRUSH_DENSITY: u32 = 1;
pub const MAX_BRUSH_DENSITY: u32 = 100;

/// Overlap radius used for painted candidates.
pub const PAINT_OVERLAP_RADIUS: f32 = 0.4;
/// Height above the brush-disc offset where the surface probe starts.
pub const PAINT_PROBE_HEIGHT: f32 = 1.0;
/// Maximum length of the surface probe.
pub const PAINT_PROBE_DISTANCE: f32 = 3.0;
/// Paint interval in seconds for [`BrushMode::Simple`].
pub const SIMPLE_PAINT_INTERVAL: f64 = 0.05;

/// Each accepted stroke event may try this many candidates per budgeted instance.
pub const ATTEMPTS_PER_INSTANCE: u32 = 30;
/// Lower bound of the per-event attempt cap.
pub const MIN_ATTEMPT_CAP: u32 = 60;

/// Candidate attempts allowed for an instance budget: `budget × 30`, at least 60.
pub(crate) fn attempt_cap_for(budget: u32) -> u32 {
    budget
        .saturating_mul(ATTEMPTS_PER_INSTANCE)
        .max(MIN_ATTEMPT_CAP)
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Brush behaviour profile.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrushMode {
    /// Fixed paint interval, no spacing requirement, no falloff.
    #[default]
    Simple,
    /// Flow-driven spacing and interval, falloff × intensity acceptance.
    Advanced,
}

/// Configuration for manual painting.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct BrushSettings {
    pub mode: BrushMode,
    /// Brush disc radius in world units.
    pub radius: f32,
    /// Maximum instances per accepted stroke event.
    pub density: u32,
    /// Edge softness in `[0, 1]`.
    pub softness: f32,
    /// Acceptance multiplier in `[0, 1]` (advanced mode).
    pub intensity: f32,
    /// Paint rate in `[0, 1]` (advanced mode).
    pub flow: f32,
    /// Minimum distance between painted instances; 0 disables.
    pub separation: f32,
    pub overlap_radius: f32,
    pub align_to_normal: bool,
    pub random_yaw: bool,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            mode: BrushMode::Simple,
            radius: 1.0,
            density: 10,
            softness: 0.5,
            intensity: 1.0,
            flow: 0.5,
            separation: 0.0,
            overlap_radius: PAINT_OVERLAP_RADIUS,
            align_to_normal: false,
            random_yaw: false,
        }
    }
}

impl BrushSettings {
    pub fn new(radius: f32, density: u32) -> Self {
        Self {
            radius,
            density,
            ..Default::default()
        }
    }

    pub fn with_mode(mut self, mode: BrushMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_density(mut self, density: u32) -> Self {
        self.density = density;
        self
    }

    pub fn with_softness(mut self, softness: f32) -> Self {
        self.softness = softness;
        self
    }

    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    pub fn with_flow(mut self, flow: f32) -> Self {
        self.flow = flow;
        self
    }

    pub fn with_separation(mut self, separation: f32) -> Self {
        self.separation = separation;
        self
    }

    pub fn with_overlap_radius(mut self, overlap_radius: f32) -> Self {
        self.overlap_radius = overlap_radius;
        self
    }

    pub fn with_align_to_normal(mut self, align: bool) -> Self {
        self.align_to_normal = align;
        self
    }

    pub fn with_random_yaw(mut self, random_yaw: bool) -> Self {
        self.random_yaw = random_yaw;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_BRUSH_RADIUS..=MAX_BRUSH_RADIUS).contains(&self.radius) {
            return Err(Error::InvalidConfig(format!(
                "brush radius must be within [{MIN_BRUSH_RADIUS}, {MAX_BRUSH_RADIUS}], got {}",
                self.radius
            )));
        }
        if !(MIN_BRUSH_DENSITY..=MAX_BRUSH_DENSITY).contains(&self.density) {
            return Err(Error::InvalidConfig(format!(
                "brush density must be within [{MIN_BRUSH_DENSITY}, {MAX_BRUSH_DENSITY}], got {}",
                self.density
            )));
        }
        for (name, value) in [
            ("softness", self.softness),
            ("intensity", self.intensity),
            ("flow", self.flow),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidConfig(format!(
                    "brush {name} must be within [0, 1], got {value}"
                )));
            }
        }
        if !self.separation.is_finite() || self.separation < 0.0 {
            return Err(Error::InvalidConfig("brush separation must be >= 0".into()));
        }
        if !self.overlap_radius.is_finite() || self.overlap_radius <= 0.0 {
            return Err(Error::InvalidConfig("brush overlap_radius must be > 0".into()));
        }
        Ok(())
    }

    /// Falloff curve for the current softness.
    pub fn falloff(&self) -> Falloff {
        Falloff::from_softness(self.softness)
    }

    /// Upper bound on candidate attempts for one stroke event.
    pub fn attempt_cap(&self) -> u32 {
        attempt_cap_for(self.density)
    }

    /// Spacing and interval the rate limiter enforces in this mode.
    pub fn limits(&self) -> StrokeLimits {
        match self.mode {
            BrushMode::Simple => StrokeLimits::fixed_interval(SIMPLE_PAINT_INTERVAL),
            BrushMode::Advanced => StrokeLimits::from_flow(self.flow),
        }
    }
}
