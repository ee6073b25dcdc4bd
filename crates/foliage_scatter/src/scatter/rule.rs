//! Placement rule configuration.
use crate::error::{Error, Result};
use crate::filter::ExclusionScope;
use crate::sampling::TriangleSampling;
use crate::scene::PrefabId;

pub const DEFAULT_AMOUNT_PER_MESH: u32 = 10;
pub const DEFAULT_PLACEMENT_PROBABILITY: f32 = 0.1;
/// Overlap radius for automatic passes.
pub const AUTOMATIC_OVERLAP_RADIUS: f32 = 0.5;

/// Candidate count policy per mesh.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuantityMode {
    /// Exactly `n` candidates per mesh.
    FixedCount(u32),
    /// One candidate per mesh with probability `p`.
    Probability(f32),
}

impl Default for QuantityMode {
    fn default() -> Self {
        QuantityMode::FixedCount(DEFAULT_AMOUNT_PER_MESH)
    }
}

/// What to place and how to filter candidates.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementRule {
    pub prefab: Option<PrefabId>,
    pub quantity: QuantityMode,
    /// Distance the sampled point is lowered along the mesh's local Y axis.
    pub depth: f32,
    /// Apply a uniform scale in `[0.8, 1.2)` on commit.
    pub random_size: bool,
    pub avoid_overlap: bool,
    pub overlap_radius: f32,
    /// Discard candidates with no ground below before projecting.
    pub require_ground: bool,
    /// Minimum distance between instances of this rule; 0 disables.
    pub min_separation: f32,
    pub triangle_sampling: TriangleSampling,
    pub exclusion: ExclusionScope,
}

impl Default for PlacementRule {
    fn default() -> Self {
        Self {
            prefab: None,
            quantity: QuantityMode::default(),
            depth: 0.0,
            random_size: false,
            avoid_overlap: false,
            overlap_radius: AUTOMATIC_OVERLAP_RADIUS,
            require_ground: false,
            min_separation: 0.0,
            triangle_sampling: TriangleSampling::default(),
            exclusion: ExclusionScope::default(),
        }
    }
}

impl PlacementRule {
    pub fn new(prefab: PrefabId) -> Self {
        Self {
            prefab: Some(prefab),
            ..Default::default()
        }
    }

    pub fn with_prefab(mut self, prefab: PrefabId) -> Self {
        self.prefab = Some(prefab);
        self
    }

    pub fn with_quantity(mut self, quantity: QuantityMode) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_depth(mut self, depth: f32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_random_size(mut self, random_size: bool) -> Self {
        self.random_size = random_size;
        self
    }

    pub fn with_avoid_overlap(mut self, avoid_overlap: bool) -> Self {
        self.avoid_overlap = avoid_overlap;
        self
    }

    pub fn with_overlap_radius(mut self, overlap_radius: f32) -> Self {
        self.overlap_radius = overlap_radius;
        self
    }

    pub fn with_require_ground(mut self, require_ground: bool) -> Self {
        self.require_ground = require_ground;
        self
    }

    pub fn with_min_separation(mut self, min_separation: f32) -> Self {
        self.min_separation = min_separation;
        self
    }

    pub fn with_triangle_sampling(mut self, sampling: TriangleSampling) -> Self {
        self.triangle_sampling = sampling;
        self
    }

    pub fn with_exclusion(mut self, exclusion: ExclusionScope) -> Self {
        self.exclusion = exclusion;
        self
    }

    /// Validates the rule, returning an error if incomplete or out of range.
    pub fn validate(&self) -> Result<()> {
        if self.prefab.is_none() {
            return Err(Error::MissingPrefab);
        }
        if let QuantityMode::Probability(p) = self.quantity {
            if !(0.0..=1.0).contains(&p) {
                return Err(Error::InvalidConfig(format!(
                    "placement probability must be within [0, 1], got {p}"
                )));
            }
        }
        if !self.depth.is_finite() {
            return Err(Error::InvalidConfig("depth must be finite".into()));
        }
        if !self.overlap_radius.is_finite() || self.overlap_radius <= 0.0 {
            return Err(Error::InvalidConfig("overlap_radius must be > 0".into()));
        }
        if !self.min_separation.is_finite() || self.min_separation < 0.0 {
            return Err(Error::InvalidConfig("min_separation must be >= 0".into()));
        }
        Ok(())
    }
}
