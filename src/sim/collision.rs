//! Collision detection
//!
//! Everything that can collide in this game is a circle, so the whole module
//! is one overlap test. Comparison is strict: circles that exactly touch
//! (distance == sum of radii) do not count as overlapping.

use glam::Vec2;

/// Check whether two circles overlap.
///
/// Uses squared distances to avoid the square root; the strict `<` keeps
/// the tangent case a miss.
#[inline]
pub fn circles_overlap(pos_a: Vec2, radius_a: f32, pos_b: Vec2, radius_b: f32) -> bool {
    let reach = radius_a + radius_b;
    pos_a.distance_squared(pos_b) < reach * reach
}
