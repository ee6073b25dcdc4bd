//! Per-rule bookkeeping: registered rules, created instances, undo batches and
//! containers, plus the public placement, painting and undo operations.
use std::collections::BTreeMap;

use glam::Vec3;
use rand::RngCore;
use tracing::{debug, info, warn};

use crate::brush::{BrushSettings, StrokeEvent};
use crate::error::{Error, Result};
use crate::filter::SeparationGuard;
use crate::scatter::events::{EventSink, PlacementEvent, PlacementEventKind};
use crate::scatter::rule::PlacementRule;
use crate::scatter::runner::{
    close_batch, emit_placed, emit_rejection, emit_warning, paint_attempt, place_rule,
    AutomaticPass, PaintContext, PaintTarget,
};
use crate::scatter::{PlacementMode, PlacementReport, RuleKey};
use crate::scene::{EntityId, OverlapBuffer, PrefabId, SceneHost};

/// Instances a rule has created and how to take them back.
#[derive(Debug, Clone, Default)]
pub struct RuleState {
    pub(crate) instances: Vec<EntityId>,
    pub(crate) undo_stack: Vec<Vec<EntityId>>,
    pub(crate) container: Option<EntityId>,
}

impl RuleState {
    /// Every instance created since the last full undo, oldest first.
    pub fn instances(&self) -> &[EntityId] {
        &self.instances
    }

    /// Instance groups in commit order; the last one is undone first.
    pub fn batches(&self) -> &[Vec<EntityId>] {
        &self.undo_stack
    }

    pub fn container(&self) -> Option<EntityId> {
        self.container
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty() && self.undo_stack.is_empty() && self.container.is_none()
    }
}

#[derive(Debug, Clone)]
struct RuleEntry {
    mode: PlacementMode,
    parent: Option<EntityId>,
    rule: PlacementRule,
    state: RuleState,
}

/// Registered placement rules and everything they have created.
///
/// The session never owns scene entities; handles are advisory and entities destroyed
/// outside the session are skipped by filters and undo.
#[derive(Debug, Clone)]
pub struct PlacementSession {
    entries: BTreeMap<RuleKey, RuleEntry>,
    next_key: u32,
    buffer: OverlapBuffer,
}

impl Default for PlacementSession {
    fn default() -> Self {
        Self::new()
    }
}

impl PlacementSession {
    pub fn new() -> Self {
        Self::with_overlap_buffer(OverlapBuffer::new())
    }

    /// Use a custom overlap buffer, e.g. with a larger capacity for dense scenes.
    pub fn with_overlap_buffer(buffer: OverlapBuffer) -> Self {
        Self {
            entries: BTreeMap::new(),
            next_key: 1,
            buffer,
        }
    }

    pub fn add_rule(
        &mut self,
        mode: PlacementMode,
        parent: Option<EntityId>,
        rule: PlacementRule,
    ) -> RuleKey {
        let key = RuleKey(self.next_key);
        self.next_key += 1;
        self.entries.insert(
            key,
            RuleEntry {
                mode,
                parent,
                rule,
                state: RuleState::default(),
            },
        );
        key
    }

    pub fn rule(&self, key: RuleKey) -> Option<&PlacementRule> {
        self.entries.get(&key).map(|e| &e.rule)
    }

    pub fn rule_mut(&mut self, key: RuleKey) -> Option<&mut PlacementRule> {
        self.entries.get_mut(&key).map(|e| &mut e.rule)
    }

    pub fn mode(&self, key: RuleKey) -> Option<PlacementMode> {
        self.entries.get(&key).map(|e| e.mode)
    }

    pub fn parent(&self, key: RuleKey) -> Option<EntityId> {
        self.entries.get(&key).and_then(|e| e.parent)
    }

    /// Rebind a rule to another parent. Returns `false` for unknown keys.
    pub fn set_parent(&mut self, key: RuleKey, parent: Option<EntityId>) -> bool {
        match self.entries.get_mut(&key) {
            Some(entry) => {
                entry.parent = parent;
                true
            }
            None => false,
        }
    }

    pub fn state(&self, key: RuleKey) -> Option<&RuleState> {
        self.entries.get(&key).map(|e| &e.state)
    }

    /// Instances created by a rule; empty for unknown keys.
    pub fn instances(&self, key: RuleKey) -> &[EntityId] {
        self.entries
            .get(&key)
            .map(|e| e.state.instances.as_slice())
            .unwrap_or_default()
    }

    pub fn rule_keys(&self) -> impl Iterator<Item = RuleKey> + '_ {
        self.entries.keys().copied()
    }

    pub fn rule_keys_for(&self, mode: PlacementMode) -> impl Iterator<Item = RuleKey> + '_ {
        self.entries
            .iter()
            .filter(move |(_, e)| e.mode == mode)
            .map(|(k, _)| *k)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Undo a rule and forget it. Returns `false` for unknown keys.
    pub fn remove_rule<H: SceneHost + ?Sized>(&mut self, host: &mut H, key: RuleKey) -> bool {
        if !self.entries.contains_key(&key) {
            return false;
        }
        self.undo(host, key);
        self.entries.remove(&key);
        true
    }

    /// Undo and forget every rule bound to `parent`. Returns the number removed.
    pub fn remove_parent<H: SceneHost + ?Sized>(&mut self, host: &mut H, parent: EntityId) -> usize {
        let keys: Vec<RuleKey> = self
            .entries
            .iter()
            .filter(|(_, e)| e.parent == Some(parent))
            .map(|(k, _)| *k)
            .collect();
        for key in &keys {
            self.remove_rule(host, *key);
        }
        keys.len()
    }

    /// Positions of every live instance the session has created.
    fn committed_positions<H: SceneHost + ?Sized>(&self, host: &H) -> Vec<Vec3> {
        self.entries
            .values()
            .flat_map(|e| e.state.instances.iter())
            .filter_map(|id| host.position(*id))
            .collect()
    }

    /// Check that a rule can run: known key, complete rule, live parent.
    fn runnable<H: SceneHost + ?Sized>(
        &self,
        host: &H,
        key: RuleKey,
    ) -> Result<(EntityId, PrefabId)> {
        let entry = self
            .entries
            .get(&key)
            .ok_or_else(|| Error::Other(format!("unknown {key}")))?;
        entry.rule.validate()?;
        let prefab = entry.rule.prefab.ok_or(Error::MissingPrefab)?;
        let parent = entry
            .parent
            .filter(|p| host.is_alive(*p))
            .ok_or(Error::MissingParent)?;
        Ok((parent, prefab))
    }

    /// Run one automatic pass for a rule.
    ///
    /// An unknown key, incomplete rule or missing parent makes this a no-op with a warning.
    pub fn place_for_rule<H: SceneHost + ?Sized>(
        &mut self,
        host: &mut H,
        key: RuleKey,
        rng: &mut impl RngCore,
    ) -> PlacementReport {
        self.place_for_rule_with_events(host, key, rng, &mut ())
    }

    pub fn place_for_rule_with_events<H: SceneHost + ?Sized>(
        &mut self,
        host: &mut H,
        key: RuleKey,
        rng: &mut impl RngCore,
        sink: &mut dyn EventSink,
    ) -> PlacementReport {
        let (parent, prefab) = match self.runnable(&*host, key) {
            Ok(target) => target,
            Err(e) => {
                warn!("{key}: {e}; skipping placement.");
                emit_warning(sink, key.to_string(), format!("{e}; skipping placement"));
                return PlacementReport::new();
            }
        };

        let existing = self
            .entries
            .get(&key)
            .filter(|e| e.rule.min_separation > 0.0)
            .map(|_| self.committed_positions(&*host))
            .unwrap_or_default();

        let Some(entry) = self.entries.get_mut(&key) else {
            return PlacementReport::new();
        };
        let RuleEntry { rule, state, .. } = entry;
        let pass = AutomaticPass {
            key,
            parent,
            prefab,
            rule: &*rule,
        };
        place_rule(host, &pass, state, existing, &mut self.buffer, rng, sink)
    }

    /// Run an automatic pass for every automatic rule, in registration order.
    pub fn place_all_rules<H: SceneHost + ?Sized>(
        &mut self,
        host: &mut H,
        rng: &mut impl RngCore,
    ) -> PlacementReport {
        self.place_all_rules_with_events(host, rng, &mut ())
    }

    pub fn place_all_rules_with_events<H: SceneHost + ?Sized>(
        &mut self,
        host: &mut H,
        rng: &mut impl RngCore,
        sink: &mut dyn EventSink,
    ) -> PlacementReport {
        let keys: Vec<RuleKey> = self.rule_keys_for(PlacementMode::Automatic).collect();
        let mut report = PlacementReport::new();
        for key in keys {
            report.merge(self.place_for_rule_with_events(host, key, rng, sink));
        }
        info!(
            "Automatic rules placed {} instance(s) in {} attempt(s).",
            report.placed(),
            report.attempts
        );
        report
    }

    /// Apply a stroke event to every runnable manual rule.
    ///
    /// The stroke's budget and attempt cap are shared: attempts go round-robin over
    /// the rules until either runs out.
    pub fn paint<H: SceneHost + ?Sized>(
        &mut self,
        host: &mut H,
        stroke: &mut StrokeEvent,
        brush: &BrushSettings,
        rng: &mut impl RngCore,
    ) -> PlacementReport {
        self.paint_with_events(host, stroke, brush, rng, &mut ())
    }

    pub fn paint_with_events<H: SceneHost + ?Sized>(
        &mut self,
        host: &mut H,
        stroke: &mut StrokeEvent,
        brush: &BrushSettings,
        rng: &mut impl RngCore,
        sink: &mut dyn EventSink,
    ) -> PlacementReport {
        let keys: Vec<RuleKey> = self.rule_keys_for(PlacementMode::Manual).collect();
        self.paint_rules(host, stroke, &keys, brush, rng, sink)
    }

    /// Apply a stroke event to a single rule.
    pub fn paint_stroke<H: SceneHost + ?Sized>(
        &mut self,
        host: &mut H,
        stroke: &mut StrokeEvent,
        key: RuleKey,
        brush: &BrushSettings,
        rng: &mut impl RngCore,
    ) -> PlacementReport {
        self.paint_stroke_with_events(host, stroke, key, brush, rng, &mut ())
    }

    pub fn paint_stroke_with_events<H: SceneHost + ?Sized>(
        &mut self,
        host: &mut H,
        stroke: &mut StrokeEvent,
        key: RuleKey,
        brush: &BrushSettings,
        rng: &mut impl RngCore,
        sink: &mut dyn EventSink,
    ) -> PlacementReport {
        self.paint_rules(host, stroke, &[key], brush, rng, sink)
    }

    fn paint_rules<H: SceneHost + ?Sized>(
        &mut self,
        host: &mut H,
        stroke: &mut StrokeEvent,
        keys: &[RuleKey],
        brush: &BrushSettings,
        rng: &mut dyn RngCore,
        sink: &mut dyn EventSink,
    ) -> PlacementReport {
        let mut report = PlacementReport::new();
        if let Err(e) = brush.validate() {
            warn!("Brush settings rejected: {e}.");
            emit_warning(sink, "brush".into(), e.to_string());
            return report;
        }

        let mut targets: Vec<(RuleKey, EntityId, PrefabId)> = Vec::with_capacity(keys.len());
        for &key in keys {
            match self.runnable(&*host, key) {
                Ok((parent, prefab)) => targets.push((key, parent, prefab)),
                Err(e) => {
                    warn!("{key}: {e}; skipping paint.");
                    emit_warning(sink, key.to_string(), format!("{e}; skipping paint"));
                }
            }
        }
        if targets.is_empty() {
            return report;
        }

        if sink.wants(PlacementEventKind::StrokeApplied) {
            sink.send(PlacementEvent::StrokeApplied {
                point: stroke.point,
                budget: stroke.budget(),
            });
        }

        let existing = if brush.separation > 0.0 {
            self.committed_positions(&*host)
        } else {
            Vec::new()
        };
        let mut guard = SeparationGuard::new(brush.separation, existing);
        let ctx = PaintContext::new(brush, stroke.point);
        let mut batches: Vec<Vec<EntityId>> = vec![Vec::new(); targets.len()];

        'stroke: loop {
            for (i, &(key, parent, prefab)) in targets.iter().enumerate() {
                if !stroke.take_attempt() {
                    break 'stroke;
                }
                report.attempts += 1;

                let Some(entry) = self.entries.get_mut(&key) else {
                    continue;
                };
                let RuleEntry { rule, state, .. } = entry;
                let target = PaintTarget {
                    key,
                    parent,
                    prefab,
                    rule: &*rule,
                };
                match paint_attempt(
                    host,
                    &ctx,
                    &target,
                    state,
                    &mut guard,
                    &mut self.buffer,
                    rng,
                ) {
                    Ok(placement) => {
                        stroke.consume_instance();
                        batches[i].push(placement.entity);
                        emit_placed(&mut report, sink, placement);
                    }
                    Err((reason, position)) => {
                        debug!("{key}: painted candidate at {position} rejected: {reason}.");
                        emit_rejection(&mut report, sink, Some(key), position, reason);
                    }
                }
            }
        }

        for ((key, _, _), batch) in targets.iter().zip(batches) {
            if let Some(entry) = self.entries.get_mut(key) {
                close_batch(*key, &mut entry.state, batch, sink);
            }
        }

        debug!(
            "Stroke at {} placed {} of {} attempt(s).",
            stroke.point,
            report.placed(),
            report.attempts
        );
        report
    }

    /// Destroy every instance and the container of a rule and clear its undo stack.
    ///
    /// Returns the number of live instances destroyed. Repeating is a no-op.
    pub fn undo<H: SceneHost + ?Sized>(&mut self, host: &mut H, key: RuleKey) -> usize {
        self.undo_with_events(host, key, &mut ())
    }

    pub fn undo_with_events<H: SceneHost + ?Sized>(
        &mut self,
        host: &mut H,
        key: RuleKey,
        sink: &mut dyn EventSink,
    ) -> usize {
        let Some(entry) = self.entries.get_mut(&key) else {
            return 0;
        };
        if entry.state.is_empty() {
            return 0;
        }

        let state = std::mem::take(&mut entry.state);
        let mut destroyed = 0;
        for id in state.instances {
            if host.is_alive(id) {
                host.destroy(id);
                destroyed += 1;
            }
        }
        if let Some(container) = state.container {
            host.destroy(container);
        }

        info!("{key}: undo destroyed {destroyed} instance(s).");
        if sink.wants(PlacementEventKind::RuleUndone) {
            sink.send(PlacementEvent::RuleUndone {
                rule: key,
                destroyed,
                full: true,
            });
        }
        destroyed
    }

    /// Destroy the newest batch of a rule. The container is kept.
    pub fn undo_last_batch<H: SceneHost + ?Sized>(&mut self, host: &mut H, key: RuleKey) -> usize {
        self.undo_last_batch_with_events(host, key, &mut ())
    }

    pub fn undo_last_batch_with_events<H: SceneHost + ?Sized>(
        &mut self,
        host: &mut H,
        key: RuleKey,
        sink: &mut dyn EventSink,
    ) -> usize {
        let Some(entry) = self.entries.get_mut(&key) else {
            return 0;
        };
        let Some(batch) = entry.state.undo_stack.pop() else {
            return 0;
        };

        entry.state.instances.retain(|id| !batch.contains(id));
        let mut destroyed = 0;
        for id in batch {
            if host.is_alive(id) {
                host.destroy(id);
                destroyed += 1;
            }
        }

        debug!("{key}: undid last batch, {destroyed} instance(s).");
        if sink.wants(PlacementEventKind::RuleUndone) {
            sink.send(PlacementEvent::RuleUndone {
                rule: key,
                destroyed,
                full: false,
            });
        }
        destroyed
    }

    /// Undo every rule in both modes.
    pub fn undo_all<H: SceneHost + ?Sized>(&mut self, host: &mut H) -> usize {
        self.undo_all_with_events(host, &mut ())
    }

    pub fn undo_all_with_events<H: SceneHost + ?Sized>(
        &mut self,
        host: &mut H,
        sink: &mut dyn EventSink,
    ) -> usize {
        let keys: Vec<RuleKey> = self.rule_keys().collect();
        let mut destroyed = 0;
        for key in keys {
            destroyed += self.undo_with_events(host, key, sink);
        }
        destroyed
    }
}
