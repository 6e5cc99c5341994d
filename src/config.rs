//! Vehicle and reward parameters
//!
//! Everything the trainer may want to vary between experiments lives here,
//! serializable so a parameter set can be stored alongside trained models.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::SimError;

/// Fixed-length state vector encodings offered to the trainer.
///
/// Each variant is a pure function of vehicle and parking-spot state; the
/// selection is made once per experiment in [`CarParams`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum StateEncoding {
    /// Heading angle, signed speed, front/back midpoint offsets (6 values)
    AngleSpeedFrontBack,
    /// Ahead vector, velocity, front/back midpoint offsets (8 values)
    AheadVelFrontBack,
    /// Ahead vector, velocity, four corner-to-corner offsets (12 values)
    #[default]
    AheadVelCorners,
    /// Ahead vector, velocity, four mid-to-corner offsets (12 values)
    AheadVelMidCorners,
    /// `AheadVelMidCorners` plus center distance (13 values)
    AheadVelMidCornersDist,
    /// `AheadVelMidCorners` plus distance and angle distance (14 values)
    AheadVelMidCornersDistAngle,
    /// `AheadVelMidCorners` plus distance, angle and gutter distance (15 values)
    AheadVelMidCornersDistAngleGutter,
}

impl StateEncoding {
    /// Length of the produced state vector
    pub fn len(&self) -> usize {
        match self {
            StateEncoding::AngleSpeedFrontBack => 6,
            StateEncoding::AheadVelFrontBack => 8,
            StateEncoding::AheadVelCorners | StateEncoding::AheadVelMidCorners => 12,
            StateEncoding::AheadVelMidCornersDist => 13,
            StateEncoding::AheadVelMidCornersDistAngle => 14,
            StateEncoding::AheadVelMidCornersDistAngleGutter => 15,
        }
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Extrinsic vehicle parameters, fixed for an episode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarParams {
    /// Body length [m]
    pub length: f32,
    /// Body width [m]
    pub width: f32,
    /// Static friction coefficient
    pub mu_static: f32,
    /// Kinetic friction coefficient
    pub mu_kinetic: f32,
    /// Speed clamp after integration [m/s]
    pub max_speed: f32,
    /// Lateral actions are ignored below this speed [m/s]
    pub min_speed_to_turn: f32,
    /// Sensor count along the front edge (>= 2, corners included)
    pub sensors_front: usize,
    /// Sensor count along the back edge (>= 2, corners included)
    pub sensors_back: usize,
    /// Sensor count per side edge (>= 1, strictly between corners)
    pub sensors_per_side: usize,
    /// Distance reported when no obstacle is within range [m]
    pub sensor_max_range: f32,
    /// Anti-stuck: displacement radius considered "not moving" [m]
    pub antistuck_radius: f32,
    /// Anti-stuck: how far back in time to compare positions [s]
    pub antistuck_lookback: f32,
    /// State vector encoding handed to the trainer
    pub encoding: StateEncoding,
}

impl Default for CarParams {
    fn default() -> Self {
        Self {
            length: CAR_LENGTH,
            width: CAR_WIDTH,
            mu_static: CAR_MU_STATIC,
            mu_kinetic: CAR_MU_KINETIC,
            max_speed: CAR_MAX_SPEED,
            min_speed_to_turn: CAR_MIN_SPEED_TO_TURN,
            sensors_front: SENSORS_FRONT,
            sensors_back: SENSORS_BACK,
            sensors_per_side: SENSORS_PER_SIDE,
            sensor_max_range: SENSOR_MAX_RANGE,
            antistuck_radius: ANTISTUCK_RADIUS,
            antistuck_lookback: ANTISTUCK_LOOKBACK_SECS,
            encoding: StateEncoding::default(),
        }
    }
}

impl CarParams {
    /// Validate parameter consistency.
    ///
    /// Front/back edges need at least two sensors so their spacing is
    /// well-defined; sides need at least one. Dimensions must be positive.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.length <= 0.0 || self.width <= 0.0 {
            return Err(SimError::InvalidParams {
                reason: "car length and width must be positive",
            });
        }
        if self.sensors_front < 2 || self.sensors_back < 2 {
            return Err(SimError::InvalidParams {
                reason: "front and back edges need at least 2 sensors",
            });
        }
        if self.sensors_per_side < 1 {
            return Err(SimError::InvalidParams {
                reason: "side edges need at least 1 sensor",
            });
        }
        if self.max_speed <= 0.0 || self.sensor_max_range <= 0.0 {
            return Err(SimError::InvalidParams {
                reason: "max speed and sensor range must be positive",
            });
        }
        Ok(())
    }
}

/// Reward shaping weights
///
/// The distance weight can be read as the reciprocal of an assumed average
/// parking speed [m/s]; the angle and gutter weights as time estimates [s]
/// to correct a unit of the respective error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardWeights {
    /// One-off reward once parked (charged for the remaining episode)
    pub parked: f32,
    /// Penalty on collision (charged for the remaining episode)
    pub collided: f32,
    /// Weight on center-to-spot distance
    pub distance: f32,
    /// Weight on angular distance (normalized by π)
    pub angle: f32,
    /// Weight on perpendicular offset from the spot's longitudinal axis
    pub gutter: f32,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            parked: REWARD_PARKED,
            collided: REWARD_COLLIDED,
            distance: REWARD_WEIGHT_DISTANCE,
            angle: REWARD_WEIGHT_ANGLE,
            gutter: REWARD_WEIGHT_GUTTER,
        }
    }
}
