//! Candidate generation and commit for automatic passes and brush strokes.
//!
//! These functions operate on one rule's [`RuleState`] at a time; the session owns
//! the states and decides which rules run.
use std::f32::consts::TAU;

use glam::{Quat, Vec3};
use rand::RngCore;
use tracing::{debug, info, warn};

use crate::brush::{BrushMode, BrushSettings, Falloff, PAINT_PROBE_DISTANCE, PAINT_PROBE_HEIGHT};
use crate::error::Result;
use crate::filter::{
    is_grounded, project_to_ground, ExcludeSet, ExclusionScope, OverlapFilter, SeparationGuard,
};
use crate::sampling::{point_in_unit_disc, rand01, rand_range};
use crate::scatter::density::attempts_for_mesh;
use crate::scatter::events::{EventSink, PlacementEvent, PlacementEventKind};
use crate::scatter::rule::PlacementRule;
use crate::scatter::session::RuleState;
use crate::scatter::{Placement, PlacementMode, PlacementReport, RejectReason, RuleKey};
use crate::scene::{EntityId, OverlapBuffer, PrefabId, SceneHost};

pub const MIN_RANDOM_SCALE: f32 = 0.8;
pub const MAX_RANDOM_SCALE: f32 = 1.2;
/// Container name used when the host cannot name the prefab.
pub const FALLBACK_CONTAINER_NAME: &str = "Foliage Group";

/// Uniform scale in `[0.8, 1.2)`.
pub fn random_scale(rng: &mut dyn RngCore) -> f32 {
    rand_range(rng, MIN_RANDOM_SCALE, MAX_RANDOM_SCALE)
}

/// Rotation for a painted instance, or `None` when neither option is enabled.
///
/// Alignment maps local up onto `normal`; the random yaw turns about the aligned up axis.
pub fn paint_rotation(
    normal: Vec3,
    align_to_normal: bool,
    random_yaw: bool,
    rng: &mut dyn RngCore,
) -> Option<Quat> {
    if !align_to_normal && !random_yaw {
        return None;
    }
    let align = if align_to_normal {
        normal
            .try_normalize()
            .map_or(Quat::IDENTITY, |n| Quat::from_rotation_arc(Vec3::Y, n))
    } else {
        Quat::IDENTITY
    };
    let yaw = if random_yaw {
        Quat::from_rotation_y(TAU * rand01(rng))
    } else {
        Quat::IDENTITY
    };
    Some(align * yaw)
}

pub fn container_name<H: SceneHost + ?Sized>(host: &H, prefab: PrefabId) -> String {
    host.prefab_name(prefab)
        .map(|name| format!("{name} Group"))
        .unwrap_or_else(|| FALLBACK_CONTAINER_NAME.to_owned())
}

/// Live container for the rule, created on first use or after external destruction.
fn ensure_container<H: SceneHost + ?Sized>(
    host: &mut H,
    state: &mut RuleState,
    prefab: PrefabId,
) -> EntityId {
    if let Some(container) = state.container.filter(|c| host.is_alive(*c)) {
        return container;
    }
    let name = container_name(&*host, prefab);
    let container = host.create_container(&name);
    debug!("Created container '{name}' ({container}).");
    state.container = Some(container);
    container
}

/// Instantiate `prefab` at `position` and apply the optional transform parts.
///
/// With a rule state the instance is parented under the rule's container and recorded.
pub(crate) fn commit<H: SceneHost + ?Sized>(
    host: &mut H,
    rule: Option<RuleKey>,
    prefab: PrefabId,
    state: Option<&mut RuleState>,
    position: Vec3,
    rotation: Option<Quat>,
    scale: Option<f32>,
) -> Result<Placement> {
    let entity = host.instantiate(prefab)?;
    host.set_position(entity, position);
    if let Some(rotation) = rotation {
        host.set_rotation(entity, rotation);
    }
    if let Some(state) = state {
        let container = ensure_container(host, state, prefab);
        host.set_parent(entity, container);
        state.instances.push(entity);
    }
    if let Some(scale) = scale {
        host.set_scale(entity, Vec3::splat(scale));
    }
    Ok(Placement {
        rule,
        entity,
        position,
        rotation,
        scale,
    })
}

pub(crate) fn emit_rejection(
    report: &mut PlacementReport,
    sink: &mut dyn EventSink,
    rule: Option<RuleKey>,
    position: Vec3,
    reason: RejectReason,
) {
    report.rejections.record(reason);
    if sink.wants(PlacementEventKind::CandidateRejected) {
        sink.send(PlacementEvent::CandidateRejected {
            rule,
            position,
            reason,
        });
    }
}

pub(crate) fn emit_placed(
    report: &mut PlacementReport,
    sink: &mut dyn EventSink,
    placement: Placement,
) {
    if sink.wants(PlacementEventKind::InstancePlaced) {
        sink.send(PlacementEvent::InstancePlaced { placement });
    }
    report.placements.push(placement);
}

pub(crate) fn emit_warning(sink: &mut dyn EventSink, context: String, message: String) {
    if sink.wants(PlacementEventKind::Warning) {
        sink.send(PlacementEvent::Warning { context, message });
    }
}

/// Push a non-empty batch onto the rule's undo stack.
pub(crate) fn close_batch(
    key: RuleKey,
    state: &mut RuleState,
    batch: Vec<EntityId>,
    sink: &mut dyn EventSink,
) {
    if batch.is_empty() {
        return;
    }
    if sink.wants(PlacementEventKind::BatchCommitted) {
        sink.send(PlacementEvent::BatchCommitted {
            rule: key,
            count: batch.len(),
        });
    }
    state.undo_stack.push(batch);
}

/// Inputs of one automatic pass.
pub(crate) struct AutomaticPass<'a> {
    pub key: RuleKey,
    pub parent: EntityId,
    pub prefab: PrefabId,
    pub rule: &'a PlacementRule,
}

/// Run one automatic pass for a rule over every surface below its parent.
///
/// Per candidate: sample, optional ground requirement, projection, overlap filter,
/// separation, commit. Each surface's placements form one undo batch.
pub(crate) fn place_rule<H: SceneHost + ?Sized>(
    host: &mut H,
    pass: &AutomaticPass<'_>,
    state: &mut RuleState,
    existing: Vec<Vec3>,
    buffer: &mut OverlapBuffer,
    rng: &mut dyn RngCore,
    sink: &mut dyn EventSink,
) -> PlacementReport {
    let AutomaticPass {
        key,
        parent,
        prefab,
        rule,
    } = *pass;
    let surfaces = host.surfaces(parent);
    info!(
        "{key}: placing {prefab} over {} surface(s) under {parent}.",
        surfaces.len()
    );
    if sink.wants(PlacementEventKind::PassStarted) {
        sink.send(PlacementEvent::PassStarted {
            rule: Some(key),
            mode: PlacementMode::Automatic,
            surface_count: surfaces.len(),
        });
    }

    let mut report = PlacementReport::new();
    let mut guard = SeparationGuard::new(rule.min_separation, existing);

    for surface in &surfaces {
        if surface.triangle_count() == 0 {
            warn!("{key}: surface {} has no triangles; skipping.", surface.entity);
            report.rejections.record(RejectReason::InvalidSurface);
            if sink.wants(PlacementEventKind::SurfaceSkipped) {
                sink.send(PlacementEvent::SurfaceSkipped {
                    rule: Some(key),
                    surface: surface.entity,
                    message: "mesh has no triangles".into(),
                });
            }
            continue;
        }

        let attempts = attempts_for_mesh(rule.quantity, rng);
        let mut batch = Vec::new();
        for _ in 0..attempts {
            report.attempts += 1;
            let sampled = match surface.sample_point_with(rule.triangle_sampling, rule.depth, rng)
            {
                Ok(p) => p,
                Err(e) => {
                    warn!("{key}: {e}; skipping surface.");
                    report.rejections.record(RejectReason::InvalidSurface);
                    break;
                }
            };

            if rule.require_ground && !is_grounded(&*host, sampled) {
                debug!("{key}: candidate at {sampled} not grounded.");
                emit_rejection(&mut report, sink, Some(key), sampled, RejectReason::NotGrounded);
                continue;
            }
            let point = project_to_ground(&*host, sampled);

            if rule.avoid_overlap {
                let root = match rule.exclusion {
                    ExclusionScope::Parent => parent,
                    ExclusionScope::Mesh => surface.entity,
                };
                let filter = OverlapFilter::new(
                    Some(root),
                    ExcludeSet::new(&state.instances, state.container),
                );
                if let Some(hit) = filter.first_conflict(&*host, buffer, point, rule.overlap_radius)
                {
                    debug!("{key}: candidate at {point} overlaps {hit}.");
                    emit_rejection(&mut report, sink, Some(key), point, RejectReason::Overlap);
                    continue;
                }
            }

            if guard.rejects(point) {
                debug!("{key}: candidate at {point} too close to a placed instance.");
                emit_rejection(&mut report, sink, Some(key), point, RejectReason::TooClose);
                continue;
            }

            let scale = rule.random_size.then(|| random_scale(rng));
            match commit(host, Some(key), prefab, Some(&mut *state), point, None, scale) {
                Ok(placement) => {
                    guard.record(point);
                    batch.push(placement.entity);
                    emit_placed(&mut report, sink, placement);
                }
                Err(e) => {
                    warn!("{key}: failed to instantiate {prefab}: {e}.");
                    emit_rejection(
                        &mut report,
                        sink,
                        Some(key),
                        point,
                        RejectReason::InstantiateFailed,
                    );
                }
            }
        }
        close_batch(key, state, batch, sink);
    }

    info!(
        "{key}: placed {} of {} attempt(s), {} rejected.",
        report.placed(),
        report.attempts,
        report.rejections.total()
    );
    if sink.wants(PlacementEventKind::PassFinished) {
        sink.send(PlacementEvent::PassFinished {
            rule: Some(key),
            report: report.clone(),
        });
    }
    report
}

/// Inputs of one brush attempt for one manual rule.
pub(crate) struct PaintTarget<'a> {
    pub key: RuleKey,
    pub parent: EntityId,
    pub prefab: PrefabId,
    pub rule: &'a PlacementRule,
}

/// Shared brush parameters for one stroke event.
pub(crate) struct PaintContext<'a> {
    pub brush: &'a BrushSettings,
    pub falloff: Falloff,
    pub center: Vec3,
}

impl<'a> PaintContext<'a> {
    pub fn new(brush: &'a BrushSettings, center: Vec3) -> Self {
        Self {
            brush,
            falloff: brush.falloff(),
            center,
        }
    }
}

/// One brush candidate: random offset in the disc, probe down onto the target,
/// overlap and separation checks, then commit with optional alignment.
///
/// Returns the placement, or the rejection reason with the candidate position.
pub(crate) fn paint_attempt<H: SceneHost + ?Sized>(
    host: &mut H,
    ctx: &PaintContext<'_>,
    target: &PaintTarget<'_>,
    state: &mut RuleState,
    guard: &mut SeparationGuard,
    buffer: &mut OverlapBuffer,
    rng: &mut dyn RngCore,
) -> std::result::Result<Placement, (RejectReason, Vec3)> {
    let brush = ctx.brush;
    let offset = point_in_unit_disc(rng) * brush.radius;
    let base = ctx.center + Vec3::new(offset.x, 0.0, offset.y);

    if brush.mode == BrushMode::Advanced {
        let t = offset.length() / brush.radius.max(f32::EPSILON);
        let p = ctx.falloff.strength(t) * brush.intensity;
        if rand01(rng) >= p {
            return Err((RejectReason::Falloff, base));
        }
    }

    let probe = base + Vec3::Y * PAINT_PROBE_HEIGHT;
    let hit = host
        .raycast_down(probe, PAINT_PROBE_DISTANCE)
        .ok_or((RejectReason::NoSurfaceHit, base))?;
    if !host.is_descendant_of(hit.entity, target.parent) {
        return Err((RejectReason::OffTarget, hit.point));
    }
    let point = hit.point - Vec3::new(0.0, target.rule.depth, 0.0);

    if target.rule.avoid_overlap {
        let filter = OverlapFilter::new(
            Some(target.parent),
            ExcludeSet::new(&state.instances, state.container),
        );
        if filter.has_conflict(&*host, buffer, point, brush.overlap_radius) {
            return Err((RejectReason::Overlap, point));
        }
    }

    if guard.rejects(point) {
        return Err((RejectReason::TooClose, point));
    }

    let rotation = paint_rotation(hit.normal, brush.align_to_normal, brush.random_yaw, rng);
    let scale = target.rule.random_size.then(|| random_scale(rng));
    match commit(
        host,
        Some(target.key),
        target.prefab,
        Some(state),
        point,
        rotation,
        scale,
    ) {
        Ok(placement) => {
            guard.record(point);
            Ok(placement)
        }
        Err(e) => {
            warn!("{}: failed to instantiate {}: {e}.", target.key, target.prefab);
            Err((RejectReason::InstantiateFailed, point))
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::sampling::test_rng::{FixedRng, SequenceRng};
    use crate::scene::memory::MemoryScene;
    use crate::scene::SceneGraph;

    #[test]
    fn random_scale_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1000 {
            let s = random_scale(&mut rng);
            assert!((MIN_RANDOM_SCALE..MAX_RANDOM_SCALE).contains(&s));
        }
        assert_eq!(random_scale(&mut FixedRng { value: 0 }), 0.8);
    }

    #[test]
    fn rotation_none_without_options() {
        let mut rng = SequenceRng::from_unit(&[0.3]);
        assert_eq!(paint_rotation(Vec3::X, false, false, &mut rng), None);
        assert_eq!(rng.draws, 0);
    }

    #[test]
    fn alignment_maps_up_onto_normal() {
        let mut rng = SequenceRng::from_unit(&[0.25]);
        let normal = Vec3::new(1.0, 1.0, 0.0).normalize();
        let rot = paint_rotation(normal, true, true, &mut rng).expect("rotation");
        assert!((rot * Vec3::Y - normal).length() < 1e-5);
        assert_eq!(rng.draws, 1);

        let flat = paint_rotation(Vec3::ZERO, true, false, &mut rng).expect("rotation");
        assert!((flat * Vec3::Y - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn container_named_after_prefab_or_fallback() {
        let mut scene = MemoryScene::new();
        let fern = scene.register_prefab("Fern", None);
        assert_eq!(container_name(&scene, fern), "Fern Group");
        assert_eq!(container_name(&scene, PrefabId(77)), FALLBACK_CONTAINER_NAME);
    }

    #[test]
    fn commit_creates_container_lazily_and_recreates_it() {
        let mut scene = MemoryScene::new();
        let fern = scene.register_prefab("Fern", None);
        let mut state = RuleState::default();

        let first = commit(
            &mut scene,
            Some(RuleKey(1)),
            fern,
            Some(&mut state),
            Vec3::ONE,
            None,
            Some(1.1),
        )
        .expect("known prefab");
        let container = state.container.expect("container created");
        assert_eq!(scene.name(container), Some("Fern Group"));
        assert_eq!(scene.parent(first.entity), Some(container));
        assert_eq!(scene.position(first.entity), Some(Vec3::ONE));
        assert_eq!(scene.scale(first.entity), Some(Vec3::splat(1.1)));

        scene.destroy(container);
        let second = commit(
            &mut scene,
            Some(RuleKey(1)),
            fern,
            Some(&mut state),
            Vec3::ZERO,
            None,
            None,
        )
        .expect("known prefab");
        let replacement = state.container.expect("container recreated");
        assert_ne!(replacement, container);
        assert_eq!(scene.parent(second.entity), Some(replacement));
    }

    #[test]
    fn commit_without_state_leaves_instance_unparented() {
        let mut scene = MemoryScene::new();
        let fern = scene.register_prefab("Fern", None);
        let placement = commit(
            &mut scene,
            None,
            fern,
            None,
            Vec3::ZERO,
            Some(Quat::IDENTITY),
            None,
        )
        .expect("known prefab");
        assert_eq!(scene.parent(placement.entity), None);
        assert_eq!(scene.rotation(placement.entity), Some(Quat::IDENTITY));
    }
}
