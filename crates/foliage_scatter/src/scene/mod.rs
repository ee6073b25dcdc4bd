//! Narrow interfaces to the host scene.
//!
//! The placement engine never owns scene entities. It reads mesh surfaces and
//! hierarchy through [`SceneGraph`], issues collision probes through
//! [`SpatialQuery`], and asks the host to create, move and destroy instances.
//! [`memory::MemoryScene`] is a self-contained implementation of both traits.
use std::fmt;

use glam::{Quat, Vec3};

use crate::error::Result;
use crate::sampling::Surface;

pub mod memory;

/// Opaque handle to a host-scene entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

/// Opaque handle to a host prefab that can be instantiated.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrefabId(pub u64);

impl fmt::Display for PrefabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "prefab#{}", self.0)
    }
}

/// First surface struck by a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
    pub entity: EntityId,
}

pub const DEFAULT_OVERLAP_CAPACITY: usize = 64;
/// Upper bound [`OverlapBuffer::grow`] will not exceed.
pub const MAX_OVERLAP_CAPACITY: usize = 1 << 16;

/// Capacity-bounded result buffer for sphere overlap queries.
///
/// The buffer is reused between queries so per-frame painting never allocates.
/// Hosts stop writing once it is full; the remaining colliders are not reported.
#[derive(Debug, Clone)]
pub struct OverlapBuffer {
    hits: Vec<EntityId>,
    capacity: usize,
}

impl OverlapBuffer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_OVERLAP_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            hits: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a hit. Returns `false` when the buffer is already full.
    pub fn push(&mut self, entity: EntityId) -> bool {
        if self.hits.len() >= self.capacity {
            return false;
        }
        self.hits.push(entity);
        true
    }

    pub fn clear(&mut self) {
        self.hits.clear();
    }

    pub fn is_full(&self) -> bool {
        self.hits.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Double the capacity, up to [`MAX_OVERLAP_CAPACITY`]. Returns `false` at the limit.
    pub fn grow(&mut self) -> bool {
        if self.capacity >= MAX_OVERLAP_CAPACITY {
            return false;
        }
        self.capacity = self.capacity.saturating_mul(2).clamp(1, MAX_OVERLAP_CAPACITY);
        self.hits.reserve(self.capacity.saturating_sub(self.hits.len()));
        true
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn as_slice(&self) -> &[EntityId] {
        &self.hits
    }
}

impl Default for OverlapBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Hierarchy, mesh and lifecycle access to the host scene.
pub trait SceneGraph {
    /// Mesh surfaces on `root` and all of its descendants.
    fn surfaces(&self, root: EntityId) -> Vec<Surface>;

    /// Spawn an instance of `prefab`. Fails with [`crate::error::Error::MissingPrefab`]
    /// when the host does not know the prefab.
    fn instantiate(&mut self, prefab: PrefabId) -> Result<EntityId>;

    /// Spawn an empty grouping entity.
    fn create_container(&mut self, name: &str) -> EntityId;

    /// Re-parent `entity`, keeping its world transform.
    fn set_parent(&mut self, entity: EntityId, parent: EntityId);

    fn set_position(&mut self, entity: EntityId, position: Vec3);

    fn set_rotation(&mut self, entity: EntityId, rotation: Quat);

    fn set_scale(&mut self, entity: EntityId, scale: Vec3);

    /// Destroy `entity` and its descendants. Unknown entities are ignored.
    fn destroy(&mut self, entity: EntityId);

    fn is_alive(&self, entity: EntityId) -> bool;

    /// World position of a live entity.
    fn position(&self, entity: EntityId) -> Option<Vec3>;

    /// True when `entity` is `ancestor` or lies below it in the hierarchy.
    fn is_descendant_of(&self, entity: EntityId, ancestor: EntityId) -> bool;

    /// Display name of a prefab, used to label containers.
    fn prefab_name(&self, _prefab: PrefabId) -> Option<String> {
        None
    }
}

/// Read-only collision probes against the host scene.
pub trait SpatialQuery {
    /// Collect colliders intersecting the sphere into `out` (cleared first).
    ///
    /// Returns the number of hits written, or
    /// [`crate::error::Error::QueryUnavailable`] when the backend cannot answer.
    fn overlap_sphere(&self, center: Vec3, radius: f32, out: &mut OverlapBuffer)
        -> Result<usize>;

    /// Nearest hit along `direction` within `max_distance` (may be infinite).
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit>;

    fn raycast_down(&self, origin: Vec3, max_distance: f32) -> Option<RayHit> {
        self.raycast(origin, Vec3::NEG_Y, max_distance)
    }
}

/// A host offering both scene access and spatial queries.
pub trait SceneHost: SceneGraph + SpatialQuery {}

impl<T: SceneGraph + SpatialQuery + ?Sized> SceneHost for T {}
