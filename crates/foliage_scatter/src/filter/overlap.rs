//! Sphere-overlap rejection with subtree and instance exclusions.
use glam::Vec3;
use tracing::{debug, warn};

use crate::error::Error;
use crate::scene::{EntityId, OverlapBuffer, SceneHost};

/// Which part of the hierarchy an overlap query ignores.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExclusionScope {
    /// Ignore the rule's whole parent subtree (every target mesh under it).
    #[default]
    Parent,
    /// Ignore only the subtree of the mesh the candidate was sampled on.
    Mesh,
}

/// Entities a rule owns that never count as obstacles for its own candidates.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExcludeSet<'a> {
    pub instances: &'a [EntityId],
    pub container: Option<EntityId>,
}

impl<'a> ExcludeSet<'a> {
    pub fn new(instances: &'a [EntityId], container: Option<EntityId>) -> Self {
        Self {
            instances,
            container,
        }
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.container == Some(entity) || self.instances.contains(&entity)
    }
}

/// Overlap test for a single candidate.
///
/// A hit counts as a conflict unless it is the excluded subtree root, lies below it,
/// or belongs to the exclude set.
#[derive(Debug, Clone, Copy)]
pub struct OverlapFilter<'a> {
    pub exclude_subtree: Option<EntityId>,
    pub exclude: ExcludeSet<'a>,
}

impl<'a> OverlapFilter<'a> {
    pub fn new(exclude_subtree: Option<EntityId>, exclude: ExcludeSet<'a>) -> Self {
        Self {
            exclude_subtree,
            exclude,
        }
    }

    /// First conflicting entity within `radius` of `point`, if any.
    ///
    /// A full buffer with no conflict among its hits is grown and queried again, so
    /// excluded entities cannot hide an obstacle. At the capacity limit the candidate
    /// is treated as blocked. An unavailable query backend reports no conflict.
    pub fn first_conflict<H: SceneHost + ?Sized>(
        &self,
        host: &H,
        buffer: &mut OverlapBuffer,
        point: Vec3,
        radius: f32,
    ) -> Option<EntityId> {
        loop {
            match host.overlap_sphere(point, radius, buffer) {
                Ok(_) => {
                    let conflict = buffer.as_slice().iter().copied().find(|&hit| {
                        let in_subtree = self
                            .exclude_subtree
                            .is_some_and(|root| host.is_descendant_of(hit, root));
                        !in_subtree && !self.exclude.contains(hit)
                    });
                    if conflict.is_some() || !buffer.is_full() {
                        return conflict;
                    }
                    if !buffer.grow() {
                        warn!("Overlap buffer saturated at {point}; treating as blocked.");
                        return buffer.as_slice().last().copied();
                    }
                    debug!(
                        "Overlap buffer full at {point}; retrying with capacity {}.",
                        buffer.capacity()
                    );
                }
                Err(Error::QueryUnavailable) => {
                    debug!("Overlap query unavailable at {point}; treating as free.");
                    return None;
                }
                Err(err) => {
                    debug!("Overlap query failed at {point}: {err}; treating as free.");
                    return None;
                }
            }
        }
    }

    pub fn has_conflict<H: SceneHost + ?Sized>(
        &self,
        host: &H,
        buffer: &mut OverlapBuffer,
        point: Vec3,
        radius: f32,
    ) -> bool {
        self.first_conflict(host, buffer, point, radius).is_some()
    }
}
