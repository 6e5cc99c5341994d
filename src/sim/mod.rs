//! Deterministic simulation module
//!
//! All physics and perception logic lives here. This module must be pure and
//! deterministic:
//! - Fixed timestep only
//! - No hidden RNG (scenario randomization takes an explicit `Rng`)
//! - No rendering or trainer dependencies
//!
//! One tick is a pure function of (current state, dt, accumulated actions).

pub mod car;
pub mod collision;
pub mod error;
pub mod geometry;
pub mod reward;
pub mod scene;
pub mod sensors;
pub mod world;

pub use car::{Car, CarFrame, Pose, SpotRelation};
pub use collision::{Collision, check_collision};
pub use error::SimError;
pub use geometry::intersect_lines;
pub use reward::evaluate_reward;
pub use scene::{Scene, StepReport};
pub use sensors::{SensorBank, refresh_sensor_values};
pub use world::{Obstacle, ParkingSpot};
