//! Autopark - a deterministic 2D self-parking simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (vehicle physics, sensors, collisions,
//!   parking classification, reward)
//! - `config`: Data-driven vehicle and reward parameters
//!
//! The crate owns no rendering or learning logic: an external trainer drives
//! episodes through [`sim::Scene`] and reads back state vectors and rewards.

pub mod config;
pub mod sim;

pub use config::{CarParams, RewardWeights, StateEncoding};
pub use sim::{Car, Obstacle, ParkingSpot, Scene, SimError, StepReport};

use glam::Vec2;

/// Simulation constants (SI units assumed everywhere)
pub mod consts {
    /// Gravitational acceleration [m/s²]
    pub const GRAVITY: f32 = 9.80665;

    /// Parked when center-to-spot distance is within this fraction of spot width
    pub const PARKED_MAX_RELATIVE_DISTANCE: f32 = 0.15;
    /// Parked when the ahead-vector angle difference is within this bound [rad]
    pub const PARKED_MAX_ANGLE: f32 = std::f32::consts::PI / 16.0;

    /// Car defaults (compact-class body)
    pub const CAR_LENGTH: f32 = 4.405;
    pub const CAR_WIDTH: f32 = 1.818;
    pub const CAR_MU_STATIC: f32 = 0.7;
    pub const CAR_MU_KINETIC: f32 = 0.3;
    /// 150 km/h
    pub const CAR_MAX_SPEED: f32 = 150.0 / 3.6;
    /// Turning needs momentum: lateral actions below this speed are ignored [m/s]
    pub const CAR_MIN_SPEED_TO_TURN: f32 = 0.75;

    /// Sensor defaults
    pub const SENSOR_MAX_RANGE: f32 = 8.0;
    pub const SENSORS_FRONT: usize = 3;
    pub const SENSORS_BACK: usize = 3;
    pub const SENSORS_PER_SIDE: usize = 1;

    /// Anti-stuck detection
    pub const ANTISTUCK_RADIUS: f32 = 0.25;
    pub const ANTISTUCK_LOOKBACK_SECS: f32 = 3.0;

    /// Parking spot defaults
    pub const SPOT_LENGTH: f32 = 6.10;
    pub const SPOT_WIDTH: f32 = 2.74;

    /// Reward defaults
    pub const REWARD_PARKED: f32 = 0.0;
    pub const REWARD_COLLIDED: f32 = -1e2;
    pub const REWARD_WEIGHT_DISTANCE: f32 = 1.0;
    pub const REWARD_WEIGHT_ANGLE: f32 = 0.0;
    pub const REWARD_WEIGHT_GUTTER: f32 = 0.0;

    /// Action magnitude grid used by the episode runner [m/s²]
    pub const ACCEL_AHEAD: f32 = 8.0;
    pub const ACCEL_BACK: f32 = 6.0;
    pub const ACCEL_SIDE: f32 = 1.0;
}

/// Normalize an angle to [0, 2π)
#[inline]
pub fn wrap_angle(mut angle: f32) -> f32 {
    use std::f32::consts::TAU;
    while angle < 0.0 {
        angle += TAU;
    }
    while angle >= TAU {
        angle -= TAU;
    }
    angle
}

/// Rotate a vector by -90°: the body "right" axis from the "ahead" axis
#[inline]
pub fn rotate_cw(v: Vec2) -> Vec2 {
    Vec2::new(v.y, -v.x)
}

/// Rotate a vector by an arbitrary angle (counter-clockwise, radians)
#[inline]
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(cos * v.x - sin * v.y, sin * v.x + cos * v.y)
}
