//! Line intersection kernel
//!
//! The one geometric primitive shared by sensing and collision detection:
//! where do the infinite lines through two segments meet, expressed as a
//! parameter along each segment's direction vector.

use glam::Vec2;

/// Solve for the intersection of the lines through segments `a` and `b`.
///
/// Returns `(ta, tb)` such that `a0 + ta * (a1 - a0) == b0 + tb * (b1 - b0)`.
/// Parallel lines (cross product of directions exactly zero) yield
/// `(INFINITY, INFINITY)`; infinity never satisfies a bound test, so callers
/// filter it out with their ordinary range checks.
///
/// Range conventions differ per caller: the segment-segment test needs both
/// parameters in [0, 1]; the ray test needs the source parameter >= 0 and the
/// target parameter in [0, 1].
#[inline]
pub fn intersect_lines(a0: Vec2, a1: Vec2, b0: Vec2, b1: Vec2) -> (f32, f32) {
    let da = a1 - a0;
    let db = b1 - b0;
    let denominator = db.x * da.y - da.x * db.y;
    if denominator == 0.0 {
        return (f32::INFINITY, f32::INFINITY);
    }
    let ta = ((a0.x - b0.x) * db.y + (b0.y - a0.y) * db.x) / denominator;
    let tb = ((a0.x - b0.x) * da.y + (b0.y - a0.y) * da.x) / denominator;
    (ta, tb)
}

/// Point at parameter `t` along the segment `(p0, p1)`
#[inline]
pub fn point_at(p0: Vec2, p1: Vec2, t: f32) -> Vec2 {
    p0 + t * (p1 - p0)
}
