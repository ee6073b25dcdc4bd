//! Candidate filters applied between sampling and commit.
//!
//! Each filter is a pure query against the host or a point set; none of them mutate
//! the scene. A rejected candidate simply consumes its attempt.
pub mod ground;
pub mod overlap;
pub mod separation;

pub use ground::{is_grounded, project_to_ground};
pub use overlap::{ExcludeSet, ExclusionScope, OverlapFilter};
pub use separation::{too_close, SeparationGuard};
