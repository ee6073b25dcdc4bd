//! One-shot runtime scatter without session bookkeeping.
//!
//! For every target mesh and every prefab a single candidate is drawn. Candidates
//! with no ground below are dropped, the optional overlap check ignores only the
//! target mesh's own subtree, and survivors are instantiated at the sampled point
//! with identity rotation. Nothing is recorded for undo.
use glam::Quat;
use rand::RngCore;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::filter::{is_grounded, ExcludeSet, OverlapFilter};
use crate::sampling::TriangleSampling;
use crate::scatter::events::{EventSink, PlacementEvent, PlacementEventKind};
use crate::scatter::runner::{commit, emit_placed, emit_rejection, emit_warning};
use crate::scatter::{PlacementMode, PlacementReport, RejectReason};
use crate::scene::{EntityId, OverlapBuffer, PrefabId, SceneHost};

pub const ONESHOT_OVERLAP_RADIUS: f32 = 0.5;

/// Configuration for [`scatter_once`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct OneShotConfig {
    pub check_overlap: bool,
    pub overlap_radius: f32,
    pub triangle_sampling: TriangleSampling,
}

impl Default for OneShotConfig {
    fn default() -> Self {
        Self {
            check_overlap: false,
            overlap_radius: ONESHOT_OVERLAP_RADIUS,
            triangle_sampling: TriangleSampling::Parallelogram,
        }
    }
}

impl OneShotConfig {
    pub fn new(check_overlap: bool) -> Self {
        Self {
            check_overlap,
            ..Default::default()
        }
    }

    pub fn with_overlap_radius(mut self, overlap_radius: f32) -> Self {
        self.overlap_radius = overlap_radius;
        self
    }

    pub fn with_triangle_sampling(mut self, sampling: TriangleSampling) -> Self {
        self.triangle_sampling = sampling;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.overlap_radius.is_finite() || self.overlap_radius <= 0.0 {
            return Err(Error::InvalidConfig("overlap_radius must be > 0".into()));
        }
        Ok(())
    }
}

/// Scatter one candidate per (target mesh, prefab) pair.
pub fn scatter_once<H: SceneHost + ?Sized>(
    host: &mut H,
    targets: &[EntityId],
    prefabs: &[PrefabId],
    config: &OneShotConfig,
    rng: &mut impl RngCore,
) -> PlacementReport {
    scatter_once_with_events(host, targets, prefabs, config, rng, &mut ())
}

pub fn scatter_once_with_events<H: SceneHost + ?Sized>(
    host: &mut H,
    targets: &[EntityId],
    prefabs: &[PrefabId],
    config: &OneShotConfig,
    rng: &mut impl RngCore,
    sink: &mut dyn EventSink,
) -> PlacementReport {
    let mut report = PlacementReport::new();
    if let Err(e) = config.validate() {
        warn!("One-shot scatter rejected: {e}.");
        emit_warning(sink, "oneshot".into(), e.to_string());
        return report;
    }

    if sink.wants(PlacementEventKind::PassStarted) {
        sink.send(PlacementEvent::PassStarted {
            rule: None,
            mode: PlacementMode::Automatic,
            surface_count: targets.len(),
        });
    }

    let mut buffer = OverlapBuffer::new();
    for &target in targets {
        let Some(surface) = host
            .surfaces(target)
            .into_iter()
            .find(|s| s.entity == target)
        else {
            warn!("One-shot target {target} has no mesh; skipping.");
            if sink.wants(PlacementEventKind::SurfaceSkipped) {
                sink.send(PlacementEvent::SurfaceSkipped {
                    rule: None,
                    surface: target,
                    message: "target has no mesh".into(),
                });
            }
            continue;
        };

        for &prefab in prefabs {
            report.attempts += 1;
            let point = match surface.sample_point_with(config.triangle_sampling, 0.0, rng) {
                Ok(p) => p,
                Err(e) => {
                    warn!("One-shot target {target}: {e}.");
                    report.rejections.record(RejectReason::InvalidSurface);
                    continue;
                }
            };

            if !is_grounded(&*host, point) {
                emit_rejection(&mut report, sink, None, point, RejectReason::NotGrounded);
                continue;
            }

            if config.check_overlap {
                let filter = OverlapFilter::new(Some(target), ExcludeSet::default());
                if filter.has_conflict(&*host, &mut buffer, point, config.overlap_radius) {
                    emit_rejection(&mut report, sink, None, point, RejectReason::Overlap);
                    continue;
                }
            }

            match commit(host, None, prefab, None, point, Some(Quat::IDENTITY), None) {
                Ok(placement) => emit_placed(&mut report, sink, placement),
                Err(e) => {
                    debug!("One-shot instantiate of {prefab} failed: {e}.");
                    emit_rejection(&mut report, sink, None, point, RejectReason::InstantiateFailed);
                }
            }
        }
    }

    info!(
        "One-shot scatter placed {} of {} candidate(s).",
        report.placed(),
        report.attempts
    );
    if sink.wants(PlacementEventKind::PassFinished) {
        sink.send(PlacementEvent::PassFinished {
            rule: None,
            report: report.clone(),
        });
    }
    report
}

#[cfg(test)]
mod tests {
    use glam::Vec3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::scatter::events::VecSink;
    use crate::scene::memory::MemoryScene;
    use crate::scene::SceneGraph;

    #[test]
    fn one_candidate_per_target_and_prefab() {
        let mut scene = MemoryScene::new();
        let a = scene.spawn_plane("a", 2.0);
        let b = scene.spawn_plane("b", 2.0);
        scene.set_position(b, Vec3::new(10.0, 0.0, 0.0));
        let fern = scene.register_prefab("Fern", None);
        let moss = scene.register_prefab("Moss", None);
        let mut rng = StdRng::seed_from_u64(3);

        let report = scatter_once(
            &mut scene,
            &[a, b],
            &[fern, moss],
            &OneShotConfig::default(),
            &mut rng,
        );
        assert_eq!(report.attempts, 4);
        assert_eq!(report.placed() + report.rejections.total(), 4);
        for p in &report.placements {
            assert_eq!(p.rule, None);
            assert_eq!(scene.rotation(p.entity), Some(Quat::IDENTITY));
            assert_eq!(scene.parent(p.entity), None);
        }
    }

    #[test]
    fn ungrounded_candidates_are_dropped() {
        let mut scene = MemoryScene::new();
        let mesh = crate::sampling::MeshData::from_mint(
            [[0.0_f32, 50.0, 0.0], [1.0, 50.0, 0.0], [0.0, 50.0, 1.0]],
            vec![0, 1, 2],
        )
        .expect("valid mesh");
        let sky = scene.spawn_mesh_shared("sky", std::sync::Arc::new(mesh), false);
        let fern = scene.register_prefab("Fern", None);
        let mut rng = StdRng::seed_from_u64(3);

        let report = scatter_once(&mut scene, &[sky], &[fern], &OneShotConfig::default(), &mut rng);
        assert_eq!(report.placed(), 0);
        assert_eq!(report.rejections.get(RejectReason::NotGrounded), 1);
        assert_eq!(scene.instantiate_calls(), 0);
    }

    #[test]
    fn overlap_ignores_only_the_target_mesh() {
        let mut scene = MemoryScene::new();
        let ground = scene.spawn_plane("ground", 1.0);
        let fern = scene.register_prefab("Fern", None);
        let config = OneShotConfig::new(true).with_triangle_sampling(TriangleSampling::Uniform);
        let mut rng = StdRng::seed_from_u64(8);

        let report = scatter_once(&mut scene, &[ground], &[fern], &config, &mut rng);
        assert_eq!(report.placed(), 1);

        scene.spawn_sphere("rock", Vec3::ZERO, 3.0);
        let mut sink = VecSink::new();
        let report =
            scatter_once_with_events(&mut scene, &[ground], &[fern], &config, &mut rng, &mut sink);
        assert_eq!(report.rejections.get(RejectReason::Overlap), 1);
        assert_eq!(sink.count(PlacementEventKind::CandidateRejected), 1);
        assert_eq!(sink.count(PlacementEventKind::PassFinished), 1);
    }

    #[test]
    fn targets_without_mesh_are_skipped() {
        let mut scene = MemoryScene::new();
        let empty = scene.spawn_empty("empty");
        let fern = scene.register_prefab("Fern", None);
        let mut sink = VecSink::new();
        let mut rng = StdRng::seed_from_u64(1);

        let report = scatter_once_with_events(
            &mut scene,
            &[empty],
            &[fern],
            &OneShotConfig::default(),
            &mut rng,
            &mut sink,
        );
        assert_eq!(report.attempts, 0);
        assert_eq!(sink.count(PlacementEventKind::SurfaceSkipped), 1);
    }
}
