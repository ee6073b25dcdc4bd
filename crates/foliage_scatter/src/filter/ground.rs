//! Ground probes: a binary "is there ground below" test and a downward snap.
use glam::Vec3;

use crate::scene::SpatialQuery;

/// Height above the candidate where the groundedness probe starts.
pub const GROUND_PROBE_HEIGHT: f32 = 10.0;
/// Maximum length of the groundedness probe.
pub const GROUND_PROBE_DISTANCE: f32 = 20.0;

/// True when a downward probe from `point + up * 10` hits anything within 20 units.
pub fn is_grounded<Q: SpatialQuery + ?Sized>(query: &Q, point: Vec3) -> bool {
    query
        .raycast_down(point + Vec3::Y * GROUND_PROBE_HEIGHT, GROUND_PROBE_DISTANCE)
        .is_some()
}

/// Snap `point` onto the first surface straight below it.
///
/// Returns `point` unchanged when nothing is hit.
pub fn project_to_ground<Q: SpatialQuery + ?Sized>(query: &Q, point: Vec3) -> Vec3 {
    query
        .raycast_down(point, f32::INFINITY)
        .map_or(point, |hit| hit.point)
}
