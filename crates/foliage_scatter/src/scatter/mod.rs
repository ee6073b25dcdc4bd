//! Placement pipeline: rules, the per-rule session, and the passes that sample,
//! filter and commit foliage instances into the host scene.
use std::fmt;

use glam::{Quat, Vec3};

use crate::scene::EntityId;

pub mod density;
pub mod events;
pub mod oneshot;
pub mod rule;
pub mod runner;
pub mod session;

/// Handle of a rule registered with a [`session::PlacementSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleKey(pub u32);

impl fmt::Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule#{}", self.0)
    }
}

/// How a rule is driven.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlacementMode {
    /// Batch passes over every surface under the parent.
    #[default]
    Automatic,
    /// Brush painting.
    Manual,
}

/// A committed instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Rule that produced it; `None` for one-shot passes.
    pub rule: Option<RuleKey>,
    pub entity: EntityId,
    pub position: Vec3,
    /// Rotation applied on commit, if any.
    pub rotation: Option<Quat>,
    /// Uniform scale applied on commit, if any.
    pub scale: Option<f32>,
}

/// Why a candidate was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    NotGrounded,
    Overlap,
    TooClose,
    /// Paint probe hit something outside the rule's parent subtree.
    OffTarget,
    /// Advanced brush acceptance roll failed.
    Falloff,
    /// Paint probe hit nothing.
    NoSurfaceHit,
    /// Surface could not be sampled.
    InvalidSurface,
    /// The host refused to instantiate the prefab.
    InstantiateFailed,
}

const REASON_COUNT: usize = 8;

impl RejectReason {
    pub const ALL: [RejectReason; REASON_COUNT] = [
        RejectReason::NotGrounded,
        RejectReason::Overlap,
        RejectReason::TooClose,
        RejectReason::OffTarget,
        RejectReason::Falloff,
        RejectReason::NoSurfaceHit,
        RejectReason::InvalidSurface,
        RejectReason::InstantiateFailed,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RejectReason::NotGrounded => "not grounded",
            RejectReason::Overlap => "overlap",
            RejectReason::TooClose => "too close",
            RejectReason::OffTarget => "off target",
            RejectReason::Falloff => "falloff",
            RejectReason::NoSurfaceHit => "no surface hit",
            RejectReason::InvalidSurface => "invalid surface",
            RejectReason::InstantiateFailed => "instantiate failed",
        };
        f.write_str(s)
    }
}

/// Per-reason rejection counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rejections {
    counts: [usize; REASON_COUNT],
}

impl Rejections {
    pub fn record(&mut self, reason: RejectReason) {
        self.counts[reason.index()] += 1;
    }

    pub fn get(&self, reason: RejectReason) -> usize {
        self.counts[reason.index()]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn merge(&mut self, other: &Rejections) {
        for (a, b) in self.counts.iter_mut().zip(other.counts) {
            *a += b;
        }
    }

    /// Non-zero counters in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (RejectReason, usize)> + '_ {
        RejectReason::ALL
            .iter()
            .map(|r| (*r, self.get(*r)))
            .filter(|(_, n)| *n > 0)
    }
}

/// Outcome of a placement pass, paint call or one-shot scatter.
#[non_exhaustive]
#[derive(Debug, Clone, Default)]
pub struct PlacementReport {
    pub placements: Vec<Placement>,
    /// Candidate attempts consumed.
    pub attempts: usize,
    pub rejections: Rejections,
}

impl PlacementReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn placed(&self) -> usize {
        self.placements.len()
    }

    pub fn merge(&mut self, other: PlacementReport) {
        self.placements.extend(other.placements);
        self.attempts += other.attempts;
        self.rejections.merge(&other.rejections);
    }
}
