#![forbid(unsafe_code)]
//! foliage_scatter: Mesh-surface foliage placement with overlap filtering, brush painting and undo.
//!
//! Modules:
//! - sampling: random draws and point sampling on triangulated mesh surfaces
//! - scene: host scene traits (hierarchy, lifecycle, spatial queries) and an in-memory host
//! - filter: ground probes, overlap rejection, minimum separation
//! - brush: brush settings, falloff curve, preview overlay, stroke throttling, pointer painter
//! - scatter: rules, placement session with undo, one-shot runtime pass, events
//!
//! For examples and docs, see README and docs.rs.
pub mod brush;
pub mod error;
pub mod filter;
pub mod sampling;
pub mod scatter;
pub mod scene;

/// Convenient re-exports for common types. Import with `use foliage_scatter::prelude::*;`.
pub mod prelude {
    pub use crate::brush::{
        BrushMode, BrushOverlay, BrushPainter, BrushSettings, Falloff, OverlayRing, PointerInput,
        PointerPhase, StrokeEvent, StrokeLimits, StrokeRateLimiter,
    };
    pub use crate::error::{Error, Result};
    pub use crate::filter::{
        is_grounded, project_to_ground, too_close, ExcludeSet, ExclusionScope, OverlapFilter,
        SeparationGuard,
    };
    pub use crate::sampling::{
        point_in_unit_disc, rand01, rand_range, MeshData, Surface, TriangleSampling,
    };
    pub use crate::scatter::events::{
        EventSink, FnSink, MultiSink, PlacementEvent, PlacementEventKind, VecSink,
    };
    pub use crate::scatter::oneshot::{scatter_once, scatter_once_with_events, OneShotConfig};
    pub use crate::scatter::rule::{PlacementRule, QuantityMode};
    pub use crate::scatter::session::{PlacementSession, RuleState};
    pub use crate::scatter::{
        Placement, PlacementMode, PlacementReport, RejectReason, Rejections, RuleKey,
    };
    pub use crate::scene::memory::MemoryScene;
    pub use crate::scene::{
        EntityId, OverlapBuffer, PrefabId, RayHit, SceneGraph, SceneHost, SpatialQuery,
    };
}
