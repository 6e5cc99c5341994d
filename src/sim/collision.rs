//! Collision detection between the vehicle hull and obstacle polygons
//!
//! Discrete per-step check: each of the four boundary edges of the vehicle is
//! tested against every obstacle edge with the bounded segment-segment test.
//! The first match wins; there is no search for the closest or
//! earliest-in-time contact among multiple candidates.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::car::CarFrame;
use super::geometry::{intersect_lines, point_at};
use super::world::Obstacle;

/// A detected contact between the vehicle hull and an obstacle edge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collision {
    /// Intersection point on the obstacle edge
    pub point: Vec2,
}

/// Test the vehicle's boundary edges against all obstacle edges.
///
/// Scan order is front, back, left, right edge, obstacles in insertion
/// order; the first intersection found is returned.
pub fn check_collision(frame: &CarFrame, obstacles: &[Obstacle]) -> Option<Collision> {
    let hull = [
        (frame.front_left, frame.front_right),
        (frame.back_left, frame.back_right),
        (frame.back_left, frame.front_left),
        (frame.back_right, frame.front_right),
    ];
    for (c0, c1) in hull {
        for obstacle in obstacles {
            for (e0, e1) in obstacle.edges() {
                let (t_car, t_edge) = intersect_lines(c0, c1, e0, e1);
                if (0.0..=1.0).contains(&t_car) && (0.0..=1.0).contains(&t_edge) {
                    return Some(Collision {
                        point: point_at(e0, e1, t_edge),
                    });
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CarParams;
    use crate::sim::car::Pose;

    fn frame_at(x: f32, y: f32) -> CarFrame {
        let params = CarParams::default();
        CarFrame::from_pose(&Pose::new(Vec2::new(x, y), 0.0), &params)
    }

    fn block() -> Obstacle {
        Obstacle::rect(Vec2::new(-2.0, 4.0), Vec2::new(2.0, 6.0)).unwrap()
    }

    #[test]
    fn test_clear_of_obstacle() {
        // Car at origin facing +y, front bumper at y ~= 2.2; block starts at y = 4
        let frame = frame_at(0.0, 0.0);
        assert!(check_collision(&frame, &[block()]).is_none());
    }

    #[test]
    fn test_front_edge_overlap_detected() {
        // Pushed forward so the hull overlaps the block's lower face
        let frame = frame_at(0.0, 2.0);
        let hit = check_collision(&frame, &[block()]).expect("collision");
        assert!((hit.point.y - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_fully_inside_polygon_is_missed() {
        // Discrete edge test only: a hull entirely inside an obstacle has no
        // edge crossings. Substepping keeps this from happening in practice.
        let big = Obstacle::rect(Vec2::new(-50.0, -50.0), Vec2::new(50.0, 50.0)).unwrap();
        let frame = frame_at(0.0, 0.0);
        assert!(check_collision(&frame, &[big]).is_none());
    }

    #[test]
    fn test_second_obstacle_checked() {
        let far = Obstacle::rect(Vec2::new(40.0, 40.0), Vec2::new(42.0, 42.0)).unwrap();
        let frame = frame_at(0.0, 2.0);
        assert!(check_collision(&frame, &[far, block()]).is_some());
    }
}
