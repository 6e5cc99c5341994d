//! Ray-cast distance sensors
//!
//! Every sensor origin on the vehicle hull casts a ray from the vehicle
//! center through that origin, out to infinity, against every obstacle edge.
//! The reported value is the distance from the sensor origin (not the vehicle
//! center) to the nearest intersection, defaulting to the configured maximum
//! range when nothing is hit.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::car::SensorOrigins;
use super::geometry::{intersect_lines, point_at};
use super::world::Obstacle;

/// Current distance readings, one slot per sensor origin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorBank {
    pub front: Vec<f32>,
    pub back: Vec<f32>,
    pub left: Vec<f32>,
    pub right: Vec<f32>,
}

impl SensorBank {
    /// All readings start at the maximum range
    pub fn new(n_front: usize, n_back: usize, n_side: usize, max_range: f32) -> Self {
        Self {
            front: vec![max_range; n_front],
            back: vec![max_range; n_back],
            left: vec![max_range; n_side],
            right: vec![max_range; n_side],
        }
    }
}

/// Minimum positive-range hit distance for a single sensor ray.
///
/// The ray runs from `center` through `origin`; a hit counts when it lies on
/// the forward half-line (source parameter >= 0) and within the obstacle edge
/// (target parameter in [0, 1]). Parallel edges fall out naturally via the
/// infinity sentinel.
fn cast_ray(center: Vec2, origin: Vec2, obstacles: &[Obstacle], max_range: f32) -> f32 {
    let mut nearest = max_range;
    for obstacle in obstacles {
        for (e0, e1) in obstacle.edges() {
            let (t_ray, t_edge) = intersect_lines(center, origin, e0, e1);
            if t_ray >= 0.0 && (0.0..=1.0).contains(&t_edge) {
                let hit = point_at(e0, e1, t_edge);
                let value = (hit - origin).length();
                if value < nearest {
                    nearest = value;
                }
            }
        }
    }
    nearest
}

/// Refresh all sensor readings against the current obstacle set
pub fn refresh_sensor_values(
    bank: &mut SensorBank,
    center: Vec2,
    origins: &SensorOrigins,
    obstacles: &[Obstacle],
    max_range: f32,
) {
    let groups = [
        (&origins.front, &mut bank.front),
        (&origins.back, &mut bank.back),
        (&origins.left, &mut bank.left),
        (&origins.right, &mut bank.right),
    ];
    for (points, values) in groups {
        for (value, &origin) in values.iter_mut().zip(points.iter()) {
            *value = cast_ray(center, origin, obstacles, max_range);
        }
    }
}
