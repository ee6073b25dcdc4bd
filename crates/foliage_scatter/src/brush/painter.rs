//! Pointer-driven brush: raycasts the pointer ray onto the scene, throttles the
//! stroke and hands out [`StrokeEvent`]s for the session to fill.
use glam::Vec3;
use tracing::trace;

use crate::brush::overlay::BrushOverlay;
use crate::brush::rate_limit::{StrokeLimits, StrokeRateLimiter};
use crate::brush::{attempt_cap_for, BrushSettings};
use crate::scene::{RayHit, SpatialQuery};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Drag,
    Up,
    /// Pointer moved without a button held.
    Move,
}

/// One pointer sample delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub ray_origin: Vec3,
    pub ray_direction: Vec3,
    pub phase: PointerPhase,
    pub primary_button: bool,
    /// Seconds on a monotonic clock.
    pub time: f64,
}

impl PointerInput {
    pub fn new(ray_origin: Vec3, ray_direction: Vec3, phase: PointerPhase, time: f64) -> Self {
        Self {
            ray_origin,
            ray_direction,
            phase,
            primary_button: matches!(phase, PointerPhase::Down | PointerPhase::Drag),
            time,
        }
    }

    /// Primary button held while pressing or dragging.
    pub fn is_paint_gesture(&self) -> bool {
        self.primary_button && matches!(self.phase, PointerPhase::Down | PointerPhase::Drag)
    }
}

/// An accepted brush application with its remaining budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeEvent {
    pub point: Vec3,
    pub normal: Vec3,
    pub time: f64,
    budget: u32,
    attempts_left: u32,
}

impl StrokeEvent {
    pub fn new(point: Vec3, normal: Vec3, time: f64, settings: &BrushSettings) -> Self {
        Self {
            point,
            normal,
            time,
            budget: settings.density,
            attempts_left: settings.attempt_cap(),
        }
    }

    /// Override the instance budget; the attempt cap follows it.
    pub fn with_budget(mut self, budget: u32) -> Self {
        self.budget = budget;
        self.attempts_left = attempt_cap_for(budget);
        self
    }

    /// Instances still allowed for this event.
    pub fn budget(&self) -> u32 {
        self.budget
    }

    pub fn attempts_left(&self) -> u32 {
        self.attempts_left
    }

    pub fn is_exhausted(&self) -> bool {
        self.budget == 0 || self.attempts_left == 0
    }

    /// Spend one attempt. Returns `false` when none are left.
    pub fn take_attempt(&mut self) -> bool {
        if self.is_exhausted() {
            return false;
        }
        self.attempts_left -= 1;
        true
    }

    pub fn consume_instance(&mut self) {
        self.budget = self.budget.saturating_sub(1);
    }
}

/// Turns a stream of [`PointerInput`]s into rate-limited [`StrokeEvent`]s.
#[derive(Debug, Clone, Default)]
pub struct BrushPainter {
    pub settings: BrushSettings,
    limiter: StrokeRateLimiter,
    hover: Option<RayHit>,
}

impl BrushPainter {
    pub fn new(settings: BrushSettings) -> Self {
        Self {
            settings,
            limiter: StrokeRateLimiter::new(),
            hover: None,
        }
    }

    pub fn limits(&self) -> StrokeLimits {
        self.settings.limits()
    }

    /// Feed one pointer sample. Returns a stroke event when the sample is an
    /// accepted paint step over a surface.
    pub fn update<Q: SpatialQuery + ?Sized>(
        &mut self,
        query: &Q,
        input: &PointerInput,
    ) -> Option<StrokeEvent> {
        if input.phase == PointerPhase::Up {
            self.limiter.end_stroke();
        }

        self.hover = query.raycast(input.ray_origin, input.ray_direction, f32::INFINITY);
        let hit = self.hover?;
        if !input.is_paint_gesture() {
            return None;
        }

        let limits = self.limits();
        if !self
            .limiter
            .try_accept(true, hit.point, input.time, &limits)
        {
            trace!("Stroke sample at {} throttled.", hit.point);
            return None;
        }

        Some(StrokeEvent::new(hit.point, hit.normal, input.time, &self.settings))
    }

    /// Surface point currently under the pointer.
    pub fn hover(&self) -> Option<RayHit> {
        self.hover
    }

    /// Preview for the current hover point.
    pub fn overlay(&self) -> Option<BrushOverlay> {
        self.hover
            .map(|hit| BrushOverlay::new(&self.settings, hit.point, hit.normal))
    }

    pub fn reset(&mut self) {
        self.limiter.reset();
        self.hover = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brush::BrushMode;
    use crate::scene::memory::MemoryScene;

    fn ground() -> MemoryScene {
        let mut scene = MemoryScene::new();
        scene.spawn_plane("ground", 20.0);
        scene
    }

    fn pointer(x: f32, phase: PointerPhase, time: f64) -> PointerInput {
        PointerInput::new(Vec3::new(x, 10.0, 0.0), Vec3::NEG_Y, phase, time)
    }

    #[test]
    fn hover_updates_without_painting() {
        let scene = ground();
        let mut painter = BrushPainter::new(BrushSettings::default());
        assert!(painter
            .update(&scene, &pointer(1.0, PointerPhase::Move, 0.0))
            .is_none());
        let overlay = painter.overlay().expect("hovering the ground");
        assert!((overlay.center - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn drag_emits_throttled_events_with_budget() {
        let scene = ground();
        let settings = BrushSettings::new(1.0, 4).with_mode(BrushMode::Advanced).with_flow(1.0);
        let mut painter = BrushPainter::new(settings);

        let first = painter
            .update(&scene, &pointer(0.0, PointerPhase::Down, 0.0))
            .expect("press paints");
        assert_eq!(first.budget(), 4);
        assert_eq!(first.attempts_left(), 120);

        // too soon
        assert!(painter
            .update(&scene, &pointer(1.0, PointerPhase::Drag, 0.01))
            .is_none());
        assert!(painter
            .update(&scene, &pointer(1.0, PointerPhase::Drag, 0.1))
            .is_some());
    }

    #[test]
    fn release_ends_stroke() {
        let scene = ground();
        let settings = BrushSettings::default().with_mode(BrushMode::Advanced).with_flow(0.0);
        let mut painter = BrushPainter::new(settings);

        assert!(painter
            .update(&scene, &pointer(0.0, PointerPhase::Down, 0.0))
            .is_some());
        assert!(painter
            .update(&scene, &pointer(0.0, PointerPhase::Up, 0.1))
            .is_none());
        // same spot, new stroke: spacing no longer applies
        assert!(painter
            .update(&scene, &pointer(0.0, PointerPhase::Down, 1.0))
            .is_some());
    }

    #[test]
    fn no_event_off_surface() {
        let scene = ground();
        let mut painter = BrushPainter::new(BrushSettings::default());
        assert!(painter
            .update(&scene, &pointer(50.0, PointerPhase::Down, 0.0))
            .is_none());
        assert!(painter.overlay().is_none());
    }

    #[test]
    fn stroke_event_budget_accounting() {
        let settings = BrushSettings::new(1.0, 2);
        let mut event = StrokeEvent::new(Vec3::ZERO, Vec3::Y, 0.0, &settings);
        assert_eq!(event.attempts_left(), 60);
        assert!(event.take_attempt());
        event.consume_instance();
        event.consume_instance();
        assert!(event.is_exhausted());
        assert!(!event.take_attempt());

        let event = event.with_budget(5);
        assert_eq!(event.budget(), 5);
        assert_eq!(event.attempts_left(), 150);
        assert_eq!(
            event.attempts_left(),
            BrushSettings::new(1.0, 5).attempt_cap()
        );
    }
}
