//! Static world geometry: the parking spot and obstacle polygons
//!
//! Both are immutable for the lifetime of an episode and may be shared
//! read-only across concurrently running episodes.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::error::SimError;

/// The target parking place.
///
/// Defined by four corners that need not be axis-aligned (any parallelogram
/// works). Center, width, unit axes and the gutter baseline are derived once
/// at construction and immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParkingSpot {
    /// Front-left corner
    pub front_left: Vec2,
    /// Front-right corner
    pub front_right: Vec2,
    /// Back-left corner
    pub back_left: Vec2,
    /// Back-right corner
    pub back_right: Vec2,
    /// Centroid of the four corners
    pub center: Vec2,
    /// Distance between the two front corners
    pub width: f32,
    /// Unit vector from back midpoint toward front midpoint
    pub ahead: Vec2,
    /// Unit vector from left midpoint toward right midpoint
    pub right: Vec2,
    /// Signed baseline of the longitudinal axis line: gutter distance of a
    /// point `p` is `|gutter_offset + right · p|`
    pub gutter_offset: f32,
}

impl ParkingSpot {
    pub fn new(
        front_left: Vec2,
        front_right: Vec2,
        back_left: Vec2,
        back_right: Vec2,
    ) -> Result<Self, SimError> {
        let center = (front_left + front_right + back_left + back_right) / 4.0;
        let width = (front_right - front_left).length();
        let ahead = 0.5 * (front_left + front_right) - 0.5 * (back_left + back_right);
        let right = 0.5 * (front_right + back_right) - 0.5 * (front_left + back_left);
        if ahead.length() == 0.0 {
            return Err(SimError::DegenerateSpot {
                reason: "front and back midpoints coincide",
            });
        }
        if right.length() == 0.0 {
            return Err(SimError::DegenerateSpot {
                reason: "left and right midpoints coincide",
            });
        }
        let ahead = ahead.normalize();
        let right = right.normalize();
        let gutter_offset = -right.dot(center);
        Ok(Self {
            front_left,
            front_right,
            back_left,
            back_right,
            center,
            width,
            ahead,
            right,
            gutter_offset,
        })
    }

    /// Axis-aligned spot with its center at `center`, facing `+y`
    pub fn axis_aligned(center: Vec2, length: f32, width: f32) -> Result<Self, SimError> {
        let half = Vec2::new(width * 0.5, length * 0.5);
        Self::new(
            center + Vec2::new(-half.x, half.y),
            center + Vec2::new(half.x, half.y),
            center + Vec2::new(-half.x, -half.y),
            center + Vec2::new(half.x, -half.y),
        )
    }

    /// Perpendicular deviation of `p` from the spot's longitudinal axis line
    #[inline]
    pub fn gutter_distance(&self, p: Vec2) -> f32 {
        (self.gutter_offset + self.right.dot(p)).abs()
    }
}

/// An ordered, closed obstacle polygon.
///
/// Edges are implicit between consecutive vertices, including the closing
/// edge from last back to first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    vertices: Vec<Vec2>,
}

impl Obstacle {
    /// Fails fast on anything that does not close into at least a triangle.
    pub fn new(vertices: Vec<Vec2>) -> Result<Self, SimError> {
        if vertices.len() < 3 {
            return Err(SimError::DegeneratePolygon {
                count: vertices.len(),
            });
        }
        Ok(Self { vertices })
    }

    /// Axis-aligned rectangular obstacle from min/max corners
    pub fn rect(min: Vec2, max: Vec2) -> Result<Self, SimError> {
        Self::new(vec![
            min,
            Vec2::new(min.x, max.y),
            max,
            Vec2::new(max.x, min.y),
        ])
    }

    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    /// Iterate the polygon's edges, closing edge included
    pub fn edges(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }
}
