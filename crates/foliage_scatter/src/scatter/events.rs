//! Event types and sinks for observing placement passes.
//!
//! This module defines [`PlacementEvent`] and a set of sinks to emit, collect, or
//! forward events while a [`crate::scatter::session::PlacementSession`] places,
//! paints or undoes instances, or while [`crate::scatter::oneshot::scatter_once`] runs.
use glam::Vec3;

use crate::scatter::{Placement, PlacementMode, PlacementReport, RejectReason, RuleKey};
use crate::scene::EntityId;

/// Describes events emitted by placement operations.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum PlacementEvent {
    /// Emitted when a pass starts for a rule (or a one-shot run when `rule` is `None`).
    PassStarted {
        rule: Option<RuleKey>,
        mode: PlacementMode,
        /// Number of surfaces the pass will visit.
        surface_count: usize,
    },

    /// Emitted when a pass finishes.
    PassFinished {
        rule: Option<RuleKey>,
        report: PlacementReport,
    },

    /// A surface could not be sampled and was skipped.
    SurfaceSkipped {
        rule: Option<RuleKey>,
        surface: EntityId,
        message: String,
    },

    /// A candidate was discarded.
    CandidateRejected {
        rule: Option<RuleKey>,
        position: Vec3,
        reason: RejectReason,
    },

    /// An instance was committed to the scene.
    InstancePlaced { placement: Placement },

    /// A non-empty batch was pushed onto a rule's undo stack.
    BatchCommitted { rule: RuleKey, count: usize },

    /// A stroke event was applied to the manual rules.
    StrokeApplied { point: Vec3, budget: u32 },

    /// Instances of a rule were destroyed by an undo.
    RuleUndone {
        rule: RuleKey,
        destroyed: usize,
        /// Whether the whole rule was cleared, as opposed to its newest batch.
        full: bool,
    },

    /// Non-fatal warning generated during placement.
    Warning {
        /// Context string (e.g. rule key).
        context: String,
        /// Human-readable message.
        message: String,
    },
}

/// Discriminant of [`PlacementEvent`], used for sink filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlacementEventKind {
    PassStarted,
    PassFinished,
    SurfaceSkipped,
    CandidateRejected,
    InstancePlaced,
    BatchCommitted,
    StrokeApplied,
    RuleUndone,
    Warning,
}

impl PlacementEvent {
    pub fn kind(&self) -> PlacementEventKind {
        match self {
            PlacementEvent::PassStarted { .. } => PlacementEventKind::PassStarted,
            PlacementEvent::PassFinished { .. } => PlacementEventKind::PassFinished,
            PlacementEvent::SurfaceSkipped { .. } => PlacementEventKind::SurfaceSkipped,
            PlacementEvent::CandidateRejected { .. } => PlacementEventKind::CandidateRejected,
            PlacementEvent::InstancePlaced { .. } => PlacementEventKind::InstancePlaced,
            PlacementEvent::BatchCommitted { .. } => PlacementEventKind::BatchCommitted,
            PlacementEvent::StrokeApplied { .. } => PlacementEventKind::StrokeApplied,
            PlacementEvent::RuleUndone { .. } => PlacementEventKind::RuleUndone,
            PlacementEvent::Warning { .. } => PlacementEventKind::Warning,
        }
    }
}

/// A generic event sink that accepts [`PlacementEvent`]s.
pub trait EventSink {
    fn send(&mut self, event: PlacementEvent);

    /// Whether events of `kind` should be built at all.
    #[inline]
    fn wants(&self, _kind: PlacementEventKind) -> bool {
        true
    }

    fn send_many<I>(&mut self, events: I)
    where
        Self: Sized,
        I: IntoIterator<Item = PlacementEvent>,
    {
        for e in events {
            self.send(e);
        }
    }
}

/// A no-op event sink.
impl EventSink for () {
    #[inline]
    fn send(&mut self, _event: PlacementEvent) {}

    #[inline]
    fn wants(&self, _kind: PlacementEventKind) -> bool {
        false
    }
}

/// An event sink that forwards to a user-provided closure.
pub struct FnSink<F>
where
    F: FnMut(PlacementEvent),
{
    f: F,
}

impl<F> FnSink<F>
where
    F: FnMut(PlacementEvent),
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EventSink for FnSink<F>
where
    F: FnMut(PlacementEvent),
{
    #[inline]
    fn send(&mut self, event: PlacementEvent) {
        (self.f)(event);
    }
}

/// An event sink that collects events in a `Vec`, optionally filtered by kind.
#[derive(Default)]
pub struct VecSink {
    events: Vec<PlacementEvent>,
    only: Option<Vec<PlacementEventKind>>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            events: Vec::with_capacity(cap),
            only: None,
        }
    }

    /// Collect only events of the given kinds.
    pub fn filtered(kinds: impl IntoIterator<Item = PlacementEventKind>) -> Self {
        Self {
            events: Vec::new(),
            only: Some(kinds.into_iter().collect()),
        }
    }

    pub fn into_inner(self) -> Vec<PlacementEvent> {
        self.events
    }

    pub fn as_slice(&self) -> &[PlacementEvent] {
        &self.events
    }

    pub fn count(&self, kind: PlacementEventKind) -> usize {
        self.events.iter().filter(|e| e.kind() == kind).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for VecSink {
    #[inline]
    fn send(&mut self, event: PlacementEvent) {
        if self.wants(event.kind()) {
            self.events.push(event);
        }
    }

    fn wants(&self, kind: PlacementEventKind) -> bool {
        self.only.as_ref().is_none_or(|kinds| kinds.contains(&kind))
    }
}

/// Fan-out sink that forwards each event to all contained sinks.
pub struct MultiSink<S: EventSink> {
    pub(crate) sinks: Vec<S>,
}

impl<S: EventSink> MultiSink<S> {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn with_sinks(sinks: Vec<S>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: S) {
        self.sinks.push(sink);
    }

    pub fn into_inner(self) -> Vec<S> {
        self.sinks
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }
}

impl<S: EventSink> Default for MultiSink<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: EventSink> EventSink for MultiSink<S> {
    fn send(&mut self, event: PlacementEvent) {
        let Some((last, rest)) = self.sinks.split_last_mut() else {
            return;
        };
        for sink in rest {
            if sink.wants(event.kind()) {
                sink.send(event.clone());
            }
        }
        if last.wants(event.kind()) {
            last.send(event);
        }
    }

    fn wants(&self, kind: PlacementEventKind) -> bool {
        self.sinks.iter().any(|s| s.wants(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warning(context: &str) -> PlacementEvent {
        PlacementEvent::Warning {
            context: context.into(),
            message: "msg".into(),
        }
    }

    #[test]
    fn unit_sink_wants_nothing() {
        let sink = ();
        assert!(!sink.wants(PlacementEventKind::Warning));
    }

    #[test]
    fn vec_sink_collects_events() {
        let mut sink = VecSink::with_capacity(2);
        assert!(sink.is_empty());
        sink.send(warning("a"));
        sink.send(warning("b"));
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.count(PlacementEventKind::Warning), 2);
        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn filtered_vec_sink_drops_other_kinds() {
        let mut sink = VecSink::filtered([PlacementEventKind::BatchCommitted]);
        assert!(!sink.wants(PlacementEventKind::Warning));
        sink.send(warning("a"));
        sink.send(PlacementEvent::BatchCommitted {
            rule: RuleKey(1),
            count: 3,
        });
        assert_eq!(sink.len(), 1);
        assert!(matches!(
            sink.as_slice()[0],
            PlacementEvent::BatchCommitted { count: 3, .. }
        ));
    }

    #[test]
    fn multi_sink_fans_out_events() {
        let mut multi = MultiSink::with_sinks(vec![VecSink::new(), VecSink::new()]);
        multi.send(warning("ctx"));
        assert_eq!(multi.len(), 2);
        assert_eq!(multi.sinks[0].len(), 1);
        assert_eq!(multi.sinks[1].len(), 1);
        assert!(multi.wants(PlacementEventKind::InstancePlaced));
    }

    #[test]
    fn fn_sink_invokes_callback() {
        let mut count = 0;
        let mut sink = FnSink::new(|_event| {
            count += 1;
        });
        sink.send(warning("ctx"));
        sink.send_many([warning("a"), warning("b")]);
        assert_eq!(count, 3);
    }
}
