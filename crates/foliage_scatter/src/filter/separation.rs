//! Minimum-distance enforcement between candidates and placed instances.
use glam::Vec3;

/// True when `candidate` is closer than `min_distance` to any point in either set.
///
/// A non-positive `min_distance` disables the check.
pub fn too_close(candidate: Vec3, existing: &[Vec3], just_placed: &[Vec3], min_distance: f32) -> bool {
    if min_distance <= 0.0 {
        return false;
    }
    let min_sq = min_distance * min_distance;
    existing
        .iter()
        .chain(just_placed)
        .any(|p| p.distance_squared(candidate) < min_sq)
}

/// Separation state for one pass or one stroke event.
///
/// `existing` is captured at the start; `just_placed` grows as candidates commit.
#[derive(Debug, Clone, Default)]
pub struct SeparationGuard {
    min_distance: f32,
    existing: Vec<Vec3>,
    just_placed: Vec<Vec3>,
}

impl SeparationGuard {
    pub fn new(min_distance: f32, existing: Vec<Vec3>) -> Self {
        Self {
            min_distance,
            existing,
            just_placed: Vec::new(),
        }
    }

    /// Guard that accepts every candidate.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.min_distance > 0.0
    }

    pub fn min_distance(&self) -> f32 {
        self.min_distance
    }

    pub fn rejects(&self, candidate: Vec3) -> bool {
        too_close(candidate, &self.existing, &self.just_placed, self.min_distance)
    }

    pub fn record(&mut self, placed: Vec3) {
        if self.is_enabled() {
            self.just_placed.push(placed);
        }
    }

    pub fn just_placed(&self) -> &[Vec3] {
        &self.just_placed
    }
}
