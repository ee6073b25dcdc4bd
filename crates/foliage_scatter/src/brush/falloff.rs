//! Radial strength curve controlled by a single softness value.
use crate::brush::lerp;

/// Falloff shape: full strength up to `hardness`, then a power-curve decay to zero.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Falloff {
    /// Normalized radius of the fully-hard core.
    pub hardness: f32,
    pub exponent: f32,
}

impl Falloff {
    /// `hardness = lerp(0.9, 0.15, s)`, `exponent = lerp(8.0, 1.2, s)` with `s` clamped to `[0, 1]`.
    pub fn from_softness(softness: f32) -> Self {
        let s = softness.clamp(0.0, 1.0);
        Self {
            hardness: lerp(0.9, 0.15, s),
            exponent: lerp(8.0, 1.2, s),
        }
    }

    /// Strength at normalized distance `t` from the brush center.
    pub fn strength(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        if t <= self.hardness {
            return 1.0;
        }
        let span = (1.0 - self.hardness).max(f32::EPSILON);
        (1.0 - (t - self.hardness) / span).max(0.0).powf(self.exponent)
    }

    /// World radius of the hard core for a brush of `radius`.
    pub fn hardness_radius(&self, radius: f32) -> f32 {
        radius * self.hardness
    }
}

impl Default for Falloff {
    fn default() -> Self {
        Self::from_softness(0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_strength_inside_core_and_zero_at_edge() {
        for softness in [0.0, 0.25, 0.5, 1.0] {
            let falloff = Falloff::from_softness(softness);
            assert_eq!(falloff.strength(0.0), 1.0);
            assert_eq!(falloff.strength(falloff.hardness), 1.0);
            assert!(falloff.strength(1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn strength_decreases_monotonically() {
        let falloff = Falloff::from_softness(0.6);
        let mut previous = 1.0;
        for i in 0..=20 {
            let s = falloff.strength(i as f32 / 20.0);
            assert!(s <= previous + 1e-6);
            previous = s;
        }
    }

    #[test]
    fn softness_extremes_match_curve_constants() {
        let hard = Falloff::from_softness(0.0);
        assert!((hard.hardness - 0.9).abs() < 1e-6);
        assert!((hard.exponent - 8.0).abs() < 1e-6);

        let soft = Falloff::from_softness(2.0);
        assert!((soft.hardness - 0.15).abs() < 1e-6);
        assert!((soft.exponent - 1.2).abs() < 1e-6);
        assert!((soft.hardness_radius(4.0) - 0.6).abs() < 1e-5);
    }
}
