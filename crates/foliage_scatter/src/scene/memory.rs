//! In-memory scene host with triangle-mesh and sphere colliders.
//!
//! Transforms are stored in world space; parenting affects hierarchy queries and
//! cascading destruction only. Entities iterate in creation order, so queries are
//! deterministic.
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use glam::{Affine3A, Quat, Vec3};

use crate::error::{Error, Result};
use crate::sampling::{MeshData, Surface};
use crate::scene::{EntityId, OverlapBuffer, PrefabId, RayHit, SceneGraph, SpatialQuery};

const PARALLEL_EPSILON: f32 = 1e-8;

/// Prefab registered with a [`MemoryScene`].
#[derive(Debug, Clone)]
pub struct PrefabDef {
    pub name: String,
    /// Sphere collider radius given to every instance, if any.
    pub collider_radius: Option<f32>,
}

#[derive(Debug, Clone)]
struct Node {
    name: String,
    parent: Option<EntityId>,
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
    mesh: Option<Arc<MeshData>>,
    mesh_collider: bool,
    sphere_radius: Option<f32>,
    prefab: Option<PrefabId>,
}

impl Node {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            parent: None,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            mesh: None,
            mesh_collider: false,
            sphere_radius: None,
            prefab: None,
        }
    }

    fn transform(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    fn world_sphere_radius(&self) -> Option<f32> {
        self.sphere_radius
            .map(|r| r * self.scale.abs().max_element())
    }

    fn world_triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        let transform = self.transform();
        self.mesh
            .iter()
            .filter(|_| self.mesh_collider)
            .flat_map(|mesh| mesh.triangles())
            .map(move |[a, b, c]| {
                [
                    transform.transform_point3(a),
                    transform.transform_point3(b),
                    transform.transform_point3(c),
                ]
            })
    }
}

/// Self-contained [`SceneGraph`] + [`SpatialQuery`] implementation.
#[derive(Debug, Clone)]
pub struct MemoryScene {
    nodes: BTreeMap<EntityId, Node>,
    prefabs: HashMap<PrefabId, PrefabDef>,
    next_entity: u64,
    next_prefab: u64,
    instantiate_calls: usize,
    queries_available: bool,
}

impl Default for MemoryScene {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryScene {
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            prefabs: HashMap::new(),
            next_entity: 1,
            next_prefab: 1,
            instantiate_calls: 0,
            queries_available: true,
        }
    }

    fn insert(&mut self, node: Node) -> EntityId {
        let id = EntityId(self.next_entity);
        self.next_entity += 1;
        self.nodes.insert(id, node);
        id
    }

    /// Spawn an entity without mesh or collider.
    pub fn spawn_empty(&mut self, name: &str) -> EntityId {
        self.insert(Node::named(name))
    }

    /// Spawn a mesh entity with a matching mesh collider.
    pub fn spawn_mesh(&mut self, name: &str, mesh: MeshData) -> EntityId {
        self.spawn_mesh_shared(name, Arc::new(mesh), true)
    }

    /// Spawn a mesh entity from shared data, optionally without a collider.
    pub fn spawn_mesh_shared(
        &mut self,
        name: &str,
        mesh: Arc<MeshData>,
        with_collider: bool,
    ) -> EntityId {
        let mut node = Node::named(name);
        node.mesh = Some(mesh);
        node.mesh_collider = with_collider;
        self.insert(node)
    }

    /// Spawn a flat square in the XZ plane centered on the origin.
    pub fn spawn_plane(&mut self, name: &str, half_extent: f32) -> EntityId {
        let h = half_extent;
        let mesh = MeshData::try_new(
            vec![
                Vec3::new(-h, 0.0, -h),
                Vec3::new(h, 0.0, -h),
                Vec3::new(h, 0.0, h),
                Vec3::new(-h, 0.0, h),
            ],
            vec![0, 2, 1, 0, 3, 2],
        )
        .unwrap_or_default();
        self.spawn_mesh(name, mesh)
    }

    /// Spawn a static sphere collider, e.g. a rock or a building footprint.
    pub fn spawn_sphere(&mut self, name: &str, center: Vec3, radius: f32) -> EntityId {
        let mut node = Node::named(name);
        node.position = center;
        node.sphere_radius = Some(radius);
        self.insert(node)
    }

    pub fn register_prefab(&mut self, name: &str, collider_radius: Option<f32>) -> PrefabId {
        let id = PrefabId(self.next_prefab);
        self.next_prefab += 1;
        self.prefabs.insert(
            id,
            PrefabDef {
                name: name.to_owned(),
                collider_radius,
            },
        );
        id
    }

    /// Make every overlap query fail with [`Error::QueryUnavailable`].
    pub fn set_queries_available(&mut self, available: bool) {
        self.queries_available = available;
    }

    /// Number of successful [`SceneGraph::instantiate`] calls so far.
    pub fn instantiate_calls(&self) -> usize {
        self.instantiate_calls
    }

    pub fn entity_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn name(&self, entity: EntityId) -> Option<&str> {
        self.nodes.get(&entity).map(|n| n.name.as_str())
    }

    pub fn parent(&self, entity: EntityId) -> Option<EntityId> {
        self.nodes.get(&entity).and_then(|n| n.parent)
    }

    pub fn rotation(&self, entity: EntityId) -> Option<Quat> {
        self.nodes.get(&entity).map(|n| n.rotation)
    }

    pub fn scale(&self, entity: EntityId) -> Option<Vec3> {
        self.nodes.get(&entity).map(|n| n.scale)
    }

    pub fn children(&self, entity: EntityId) -> Vec<EntityId> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.parent == Some(entity))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Live instances spawned from `prefab`.
    pub fn instances_of(&self, prefab: PrefabId) -> Vec<EntityId> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.prefab == Some(prefab))
            .map(|(id, _)| *id)
            .collect()
    }

    fn sphere_overlaps(node: &Node, center: Vec3, radius: f32) -> bool {
        if let Some(r) = node.world_sphere_radius() {
            if node.position.distance_squared(center) <= (r + radius) * (r + radius) {
                return true;
            }
        }
        let r2 = radius * radius;
        node.world_triangles()
            .any(|[a, b, c]| closest_point_on_triangle(center, a, b, c).distance_squared(center) <= r2)
    }
}

impl SceneGraph for MemoryScene {
    fn surfaces(&self, root: EntityId) -> Vec<Surface> {
        self.nodes
            .iter()
            .filter(|(id, _)| self.is_descendant_of(**id, root))
            .filter_map(|(id, node)| {
                node.mesh
                    .as_ref()
                    .map(|mesh| Surface::new(*id, mesh.clone(), node.transform()))
            })
            .collect()
    }

    fn instantiate(&mut self, prefab: PrefabId) -> Result<EntityId> {
        let def = self.prefabs.get(&prefab).ok_or(Error::MissingPrefab)?;
        let mut node = Node::named(&def.name);
        node.sphere_radius = def.collider_radius;
        node.prefab = Some(prefab);
        self.instantiate_calls += 1;
        Ok(self.insert(node))
    }

    fn create_container(&mut self, name: &str) -> EntityId {
        self.spawn_empty(name)
    }

    fn set_parent(&mut self, entity: EntityId, parent: EntityId) {
        if entity == parent || !self.nodes.contains_key(&parent) || self.is_descendant_of(parent, entity)
        {
            return;
        }
        if let Some(node) = self.nodes.get_mut(&entity) {
            node.parent = Some(parent);
        }
    }

    fn set_position(&mut self, entity: EntityId, position: Vec3) {
        if let Some(node) = self.nodes.get_mut(&entity) {
            node.position = position;
        }
    }

    fn set_rotation(&mut self, entity: EntityId, rotation: Quat) {
        if let Some(node) = self.nodes.get_mut(&entity) {
            node.rotation = rotation;
        }
    }

    fn set_scale(&mut self, entity: EntityId, scale: Vec3) {
        if let Some(node) = self.nodes.get_mut(&entity) {
            node.scale = scale;
        }
    }

    fn destroy(&mut self, entity: EntityId) {
        if !self.nodes.contains_key(&entity) {
            return;
        }
        let doomed: Vec<EntityId> = self
            .nodes
            .keys()
            .copied()
            .filter(|id| self.is_descendant_of(*id, entity))
            .collect();
        for id in doomed {
            self.nodes.remove(&id);
        }
    }

    fn is_alive(&self, entity: EntityId) -> bool {
        self.nodes.contains_key(&entity)
    }

    fn position(&self, entity: EntityId) -> Option<Vec3> {
        self.nodes.get(&entity).map(|n| n.position)
    }

    fn is_descendant_of(&self, entity: EntityId, ancestor: EntityId) -> bool {
        let mut current = Some(entity);
        // Parent chains are acyclic; the bound only guards against corrupted input.
        for _ in 0..=self.nodes.len() {
            match current {
                Some(id) if id == ancestor => return self.nodes.contains_key(&id),
                Some(id) => current = self.nodes.get(&id).and_then(|n| n.parent),
                None => return false,
            }
        }
        false
    }

    fn prefab_name(&self, prefab: PrefabId) -> Option<String> {
        self.prefabs.get(&prefab).map(|p| p.name.clone())
    }
}

impl SpatialQuery for MemoryScene {
    fn overlap_sphere(
        &self,
        center: Vec3,
        radius: f32,
        out: &mut OverlapBuffer,
    ) -> Result<usize> {
        if !self.queries_available {
            return Err(Error::QueryUnavailable);
        }
        out.clear();
        for (id, node) in &self.nodes {
            if Self::sphere_overlaps(node, center, radius) && !out.push(*id) {
                break;
            }
        }
        Ok(out.len())
    }

    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        let dir = direction.try_normalize()?;
        let mut best: Option<RayHit> = None;

        for (id, node) in &self.nodes {
            if let Some(radius) = node.world_sphere_radius() {
                if let Some(t) = ray_sphere(origin, dir, node.position, radius) {
                    if t <= max_distance && best.is_none_or(|b| t < b.distance) {
                        let point = origin + dir * t;
                        best = Some(RayHit {
                            point,
                            normal: (point - node.position).normalize_or(Vec3::Y),
                            distance: t,
                            entity: *id,
                        });
                    }
                }
            }

            for [a, b, c] in node.world_triangles() {
                let Some(t) = ray_triangle(origin, dir, a, b, c) else {
                    continue;
                };
                if t > max_distance || best.is_some_and(|hit| t >= hit.distance) {
                    continue;
                }
                let mut normal = (b - a).cross(c - a).normalize_or(Vec3::Y);
                if normal.dot(dir) > 0.0 {
                    normal = -normal;
                }
                best = Some(RayHit {
                    point: origin + dir * t,
                    normal,
                    distance: t,
                    entity: *id,
                });
            }
        }

        best
    }
}

/// Two-sided Möller–Trumbore intersection; returns the ray parameter `t >= 0`.
fn ray_triangle(origin: Vec3, dir: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
    let e1 = b - a;
    let e2 = c - a;
    let p = dir.cross(e2);
    let det = e1.dot(p);
    if det.abs() < PARALLEL_EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(e1);
    let v = dir.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = e2.dot(q) * inv_det;
    (t >= 0.0).then_some(t)
}

/// Entry distance into a sphere. Rays starting inside report no hit.
fn ray_sphere(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = origin - center;
    let c = oc.length_squared() - radius * radius;
    if c < 0.0 {
        return None;
    }
    let b = oc.dot(dir);
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let t = -b - discriminant.sqrt();
    (t >= 0.0).then_some(t)
}

fn closest_point_on_triangle(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;
    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        return a + ab * (d1 / (d1 - d3));
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        return a + ac * (d2 / (d2 - d6));
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        return b + (c - b) * ((d4 - d3) / ((d4 - d3) + (d5 - d6)));
    }

    let denom = 1.0 / (va + vb + vc);
    a + ab * (vb * denom) + ac * (vc * denom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raycast_down_hits_plane() {
        let mut scene = MemoryScene::new();
        let ground = scene.spawn_plane("ground", 5.0);

        let hit = scene
            .raycast_down(Vec3::new(1.0, 3.0, -2.0), f32::INFINITY)
            .expect("plane below");
        assert_eq!(hit.entity, ground);
        assert!((hit.point - Vec3::new(1.0, 0.0, -2.0)).length() < 1e-5);
        assert!((hit.normal - Vec3::Y).length() < 1e-5);
        assert!((hit.distance - 3.0).abs() < 1e-5);
    }

    #[test]
    fn raycast_respects_max_distance_and_misses_outside() {
        let mut scene = MemoryScene::new();
        scene.spawn_plane("ground", 1.0);
        assert!(scene.raycast_down(Vec3::new(0.0, 5.0, 0.0), 2.0).is_none());
        assert!(scene.raycast_down(Vec3::new(3.0, 5.0, 0.0), 10.0).is_none());
    }

    #[test]
    fn raycast_picks_nearest_collider() {
        let mut scene = MemoryScene::new();
        scene.spawn_plane("ground", 5.0);
        let rock = scene.spawn_sphere("rock", Vec3::new(0.0, 1.0, 0.0), 0.5);

        let hit = scene
            .raycast_down(Vec3::new(0.0, 4.0, 0.0), f32::INFINITY)
            .expect("rock above ground");
        assert_eq!(hit.entity, rock);
        assert!((hit.point.y - 1.5).abs() < 1e-5);
    }

    #[test]
    fn overlap_reports_spheres_and_meshes() {
        let mut scene = MemoryScene::new();
        let ground = scene.spawn_plane("ground", 5.0);
        let rock = scene.spawn_sphere("rock", Vec3::new(2.0, 0.0, 0.0), 0.5);
        let mut buffer = OverlapBuffer::new();

        let n = scene
            .overlap_sphere(Vec3::new(1.2, 0.2, 0.0), 0.4, &mut buffer)
            .expect("query available");
        assert_eq!(n, 2);
        assert_eq!(buffer.as_slice(), &[ground, rock]);

        let n = scene
            .overlap_sphere(Vec3::new(0.0, 3.0, 0.0), 0.4, &mut buffer)
            .expect("query available");
        assert_eq!(n, 0);
    }

    #[test]
    fn unavailable_queries_report_error() {
        let mut scene = MemoryScene::new();
        scene.set_queries_available(false);
        let mut buffer = OverlapBuffer::new();
        let err = scene
            .overlap_sphere(Vec3::ZERO, 1.0, &mut buffer)
            .unwrap_err();
        assert!(matches!(err, Error::QueryUnavailable));
    }

    #[test]
    fn destroy_cascades_to_children() {
        let mut scene = MemoryScene::new();
        let prefab = scene.register_prefab("fern", None);
        let group = scene.create_container("fern Group");
        let a = scene.instantiate(prefab).expect("known prefab");
        let b = scene.instantiate(prefab).expect("known prefab");
        scene.set_parent(a, group);
        scene.set_parent(b, group);
        assert_eq!(scene.children(group), vec![a, b]);

        scene.destroy(group);
        assert!(!scene.is_alive(group));
        assert!(!scene.is_alive(a));
        assert!(!scene.is_alive(b));
        assert_eq!(scene.instantiate_calls(), 2);

        // destroying twice is harmless
        scene.destroy(group);
    }

    #[test]
    fn hierarchy_queries_follow_parents() {
        let mut scene = MemoryScene::new();
        let root = scene.spawn_empty("root");
        let child = scene.spawn_plane("child", 1.0);
        let other = scene.spawn_plane("other", 1.0);
        scene.set_parent(child, root);

        assert!(scene.is_descendant_of(root, root));
        assert!(scene.is_descendant_of(child, root));
        assert!(!scene.is_descendant_of(other, root));
        assert!(!scene.is_descendant_of(root, child));

        let surfaces = scene.surfaces(root);
        assert_eq!(surfaces.len(), 1);
        assert_eq!(surfaces[0].entity, child);

        // cycles are refused
        scene.set_parent(root, child);
        assert_eq!(scene.parent(root), None);
    }

    #[test]
    fn unknown_prefab_fails_instantiation() {
        let mut scene = MemoryScene::new();
        let err = scene.instantiate(PrefabId(99)).unwrap_err();
        assert!(matches!(err, Error::MissingPrefab));
        assert_eq!(scene.instantiate_calls(), 0);
    }

    #[test]
    fn closest_point_handles_regions() {
        let a = Vec3::ZERO;
        let b = Vec3::X;
        let c = Vec3::Z;
        assert_eq!(closest_point_on_triangle(Vec3::new(-1.0, 0.0, -1.0), a, b, c), a);
        let inner = closest_point_on_triangle(Vec3::new(0.2, 1.0, 0.2), a, b, c);
        assert!((inner - Vec3::new(0.2, 0.0, 0.2)).length() < 1e-6);
        let edge = closest_point_on_triangle(Vec3::new(1.0, 0.0, 1.0), a, b, c);
        assert!((edge - Vec3::new(0.5, 0.0, 0.5)).length() < 1e-6);
    }
}
