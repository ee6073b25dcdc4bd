//! Triangulated mesh surfaces and the point sampler used by automatic placement.
use std::sync::Arc;

use glam::{Affine3A, Vec3};
use rand::RngCore;

use crate::error::{Error, Result};
use crate::sampling::{rand01, rand_index};
use crate::scene::EntityId;

/// How the two barycentric draws are combined into a point on a triangle.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriangleSampling {
    /// `V0 + u·(V1−V0) + v·(V2−V0)` with independent `u, v ∈ [0, 1)`.
    ///
    /// Covers the parallelogram spanned by the two edges, so roughly half of the
    /// samples land outside the triangle itself.
    #[default]
    Parallelogram,
    /// Same draws, but `u + v > 1` is reflected back into the triangle.
    Uniform,
}

/// Local-space vertex and index data of a triangulated mesh.
///
/// Construction validates that the index list forms whole triangles and that every
/// index addresses an existing vertex.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    vertices: Vec<Vec3>,
    indices: Vec<u32>,
}

impl MeshData {
    pub fn try_new(vertices: Vec<Vec3>, indices: Vec<u32>) -> Result<Self> {
        if indices.len() % 3 != 0 {
            return Err(Error::InvalidSurface(format!(
                "index count {} is not a multiple of 3",
                indices.len()
            )));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(Error::InvalidSurface(format!(
                "index {bad} is out of bounds for {} vertices",
                vertices.len()
            )));
        }
        Ok(Self { vertices, indices })
    }

    /// Build from any vertex type convertible to [`mint::Vector3`], e.g. `[f32; 3]`.
    pub fn from_mint<V>(vertices: impl IntoIterator<Item = V>, indices: Vec<u32>) -> Result<Self>
    where
        V: Into<mint::Vector3<f32>>,
    {
        let vertices = vertices
            .into_iter()
            .map(|v| Vec3::from(v.into()))
            .collect();
        Self::try_new(vertices, indices)
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Local-space corners of triangle `index`.
    pub fn triangle(&self, index: usize) -> Option<[Vec3; 3]> {
        let start = index.checked_mul(3)?;
        let end = start.checked_add(3)?;
        let tri = self.indices.get(start..end)?;
        Some([
            self.vertices[tri[0] as usize],
            self.vertices[tri[1] as usize],
            self.vertices[tri[2] as usize],
        ])
    }

    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                self.vertices[tri[0] as usize],
                self.vertices[tri[1] as usize],
                self.vertices[tri[2] as usize],
            ]
        })
    }
}

/// A mesh instance treated as a placement substrate.
#[derive(Debug, Clone)]
pub struct Surface {
    /// Host entity carrying the mesh.
    pub entity: EntityId,
    /// Shared mesh data in local space.
    pub mesh: Arc<MeshData>,
    /// Transform from mesh-local space to world space.
    pub local_to_world: Affine3A,
}

impl Surface {
    pub fn new(entity: EntityId, mesh: Arc<MeshData>, local_to_world: Affine3A) -> Self {
        Self {
            entity,
            mesh,
            local_to_world,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.mesh.triangle_count()
    }

    pub fn local_to_world(&self, point: Vec3) -> Vec3 {
        self.local_to_world.transform_point3(point)
    }

    /// Draw a world-space point using [`TriangleSampling::Parallelogram`].
    ///
    /// `depth_offset` lowers the point along the mesh's local Y axis before the world
    /// transform is applied.
    pub fn sample_point(&self, depth_offset: f32, rng: &mut dyn RngCore) -> Result<Vec3> {
        self.sample_point_with(TriangleSampling::Parallelogram, depth_offset, rng)
    }

    /// Draw a world-space point with an explicit triangle sampling strategy.
    ///
    /// Consumes three draws: triangle index, `u`, `v`.
    pub fn sample_point_with(
        &self,
        sampling: TriangleSampling,
        depth_offset: f32,
        rng: &mut dyn RngCore,
    ) -> Result<Vec3> {
        let count = self.triangle_count();
        if count == 0 {
            return Err(Error::InvalidSurface(format!(
                "mesh on {} has no triangles",
                self.entity
            )));
        }

        let index = rand_index(rng, count);
        let [v0, v1, v2] = self.mesh.triangle(index).ok_or_else(|| {
            Error::InvalidSurface(format!("triangle {index} missing on {}", self.entity))
        })?;

        let mut u = rand01(rng);
        let mut v = rand01(rng);
        if sampling == TriangleSampling::Uniform && u + v > 1.0 {
            u = 1.0 - u;
            v = 1.0 - v;
        }

        let local = v0 + u * (v1 - v0) + v * (v2 - v0) - Vec3::new(0.0, depth_offset, 0.0);
        Ok(self.local_to_world(local))
    }
}
