//! Spatial and temporal throttling of stroke events.
use glam::Vec3;

use crate::brush::lerp;

/// Minimum travel and minimum elapsed time between accepted stroke events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeLimits {
    pub min_spacing: f32,
    pub min_interval: f64,
}

impl StrokeLimits {
    /// `spacing = lerp(0.05, 1.0, 1 - flow)`, `interval = lerp(0.03, 0.25, 1 - flow)`.
    pub fn from_flow(flow: f32) -> Self {
        let inv = 1.0 - flow.clamp(0.0, 1.0);
        Self {
            min_spacing: lerp(0.05, 1.0, inv),
            min_interval: f64::from(lerp(0.03, 0.25, inv)),
        }
    }

    /// Time-only throttle with no spacing requirement.
    pub fn fixed_interval(min_interval: f64) -> Self {
        Self {
            min_spacing: 0.0,
            min_interval,
        }
    }
}

/// Remembers the last accepted stroke sample.
#[derive(Debug, Clone, Default)]
pub struct StrokeRateLimiter {
    last_position: Option<Vec3>,
    last_time: Option<f64>,
}

impl StrokeRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a sample iff painting, far enough from the last accepted position and
    /// late enough after the last accepted time. Acceptance updates both.
    pub fn try_accept(&mut self, painting: bool, position: Vec3, now: f64, limits: &StrokeLimits) -> bool {
        if !painting {
            return false;
        }
        let spaced = self.last_position.is_none_or(|last| {
            last.distance_squared(position) >= limits.min_spacing * limits.min_spacing
        });
        let elapsed = self
            .last_time
            .is_none_or(|last| now - last >= limits.min_interval);
        if !(spaced && elapsed) {
            return false;
        }
        self.last_position = Some(position);
        self.last_time = Some(now);
        true
    }

    /// Forget the last position so the next stroke starts fresh. The timestamp is kept.
    pub fn end_stroke(&mut self) {
        self.last_position = None;
    }

    pub fn reset(&mut self) {
        self.last_position = None;
        self.last_time = None;
    }

    pub fn last_position(&self) -> Option<Vec3> {
        self.last_position
    }
}
