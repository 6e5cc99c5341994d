//! Episode composition and the step API
//!
//! A `Scene` owns exactly one car, one parking spot and zero or more
//! obstacles, and mediates every recomputation of relational state. The
//! external trainer drives it through `apply_action` / `step` and reads back
//! the state vector and reward.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{CarParams, RewardWeights};
use crate::consts::{SPOT_LENGTH, SPOT_WIDTH};

use super::car::{Car, Pose};
use super::error::SimError;
use super::world::{Obstacle, ParkingSpot};

/// Terminal flags and scalars reported after each tick
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StepReport {
    pub collided: bool,
    pub parked: bool,
    pub time_exceeded: bool,
    pub reward: f32,
    /// Center-to-spot distance
    pub distance: f32,
    /// Angle between car and spot ahead vectors, [0, π]
    pub angle_distance: f32,
}

impl StepReport {
    /// Any condition ending the episode
    pub fn terminal(&self) -> bool {
        self.collided || self.parked || self.time_exceeded
    }
}

/// One parking episode: car, spot, obstacles and reward weights
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    dt: f32,
    car: Car,
    spot: ParkingSpot,
    obstacles: Vec<Obstacle>,
    weights: RewardWeights,
}

impl Scene {
    /// Compose an episode and bring all derived state (sensors, spot
    /// relation, reward) up to date for the initial pose.
    pub fn new(
        dt: f32,
        mut car: Car,
        spot: ParkingSpot,
        obstacles: Vec<Obstacle>,
        weights: RewardWeights,
    ) -> Self {
        let lookback_steps = (car.params().antistuck_lookback / dt).ceil() as usize;
        car.set_history_capacity(lookback_steps.max(1));
        car.refresh_perception(&obstacles);
        car.refresh_relation(&spot);
        car.refresh_reward(&weights, dt, 0.0);
        Self {
            dt,
            car,
            spot,
            obstacles,
            weights,
        }
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    pub fn car(&self) -> &Car {
        &self.car
    }

    pub fn spot(&self) -> &ParkingSpot {
        &self.spot
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    // --- actions (pre-tick; contributions sum until the next step) ---

    pub fn accelerate_ahead(&mut self, magnitude: f32) -> Result<(), SimError> {
        self.car.accelerate_ahead(magnitude)
    }

    pub fn accelerate_back(&mut self, magnitude: f32) -> Result<(), SimError> {
        self.car.accelerate_back(magnitude)
    }

    pub fn accelerate_right(&mut self, magnitude: f32) -> Result<(), SimError> {
        self.car.accelerate_right(magnitude)
    }

    pub fn accelerate_left(&mut self, magnitude: f32) -> Result<(), SimError> {
        self.car.accelerate_left(magnitude)
    }

    /// Signed convenience form: positive longitudinal accelerates ahead,
    /// negative back; positive lateral right, negative left.
    pub fn apply_action(&mut self, longitudinal: f32, lateral: f32) -> Result<(), SimError> {
        if longitudinal > 0.0 {
            self.car.accelerate_ahead(longitudinal)?;
        } else if longitudinal < 0.0 {
            self.car.accelerate_back(-longitudinal)?;
        }
        if lateral > 0.0 {
            self.car.accelerate_right(lateral)?;
        } else if lateral < 0.0 {
            self.car.accelerate_left(-lateral)?;
        }
        Ok(())
    }

    /// Advance the episode by one tick.
    pub fn step(&mut self, dt_since_action: f32, time_remaining: f32) -> StepReport {
        self.car.step(
            self.dt,
            dt_since_action,
            time_remaining,
            &self.obstacles,
            &self.spot,
            &self.weights,
        );
        StepReport {
            collided: self.car.collided(),
            parked: self.car.parked(),
            time_exceeded: self.car.time_exceeded(),
            reward: self.car.reward(),
            distance: self.car.relation().distance,
            angle_distance: self.car.relation().angle_distance,
        }
    }

    /// Fixed-length observation for the trainer
    pub fn state_vector(&self) -> Vec<f32> {
        self.car.state_vector()
    }

    /// Anti-stuck query at the scene's own timestep
    pub fn is_stuck(&self) -> bool {
        self.car.is_stuck(self.dt)
    }

    // --- canned scenarios (randomization via an explicit, seeded Rng) ---

    /// Spot to the left of a randomized start pose, approach from one side.
    pub fn one_sided<R: Rng>(dt: f32, rng: &mut R) -> Result<Self, SimError> {
        let front_left = Vec2::new(-10.0 - 0.5 * SPOT_LENGTH, -0.5 * SPOT_WIDTH);
        let spot = spot_facing_x(front_left, SPOT_LENGTH)?;
        let shift = Vec2::new(rng.random_range(-5.0..5.0), rng.random_range(-5.0..5.0));
        let heading = 0.5 * std::f32::consts::PI
            + rng.random_range(-0.25 * std::f32::consts::PI..0.25 * std::f32::consts::PI);
        let car = Car::new(
            Pose::new(Vec2::new(10.0, 0.0) + shift, heading),
            CarParams::default(),
        )?;
        Ok(Self::new(dt, car, spot, Vec::new(), RewardWeights::default()))
    }

    /// Spot on a random side of the start pose.
    pub fn two_sided<R: Rng>(dt: f32, rng: &mut R) -> Result<Self, SimError> {
        if rng.random::<f32>() < 0.5 {
            return Self::one_sided(dt, rng);
        }
        let front_left = Vec2::new(10.0 + 0.5 * SPOT_LENGTH, -0.5 * SPOT_WIDTH);
        let spot = spot_facing_x(front_left, -SPOT_LENGTH)?;
        let shift = Vec2::new(rng.random_range(-5.0..5.0), rng.random_range(-5.0..5.0));
        let heading = -(0.5 * std::f32::consts::PI
            + rng.random_range(-0.25 * std::f32::consts::PI..0.25 * std::f32::consts::PI));
        let car = Car::new(
            Pose::new(Vec2::new(-10.0, 0.0) + shift, heading),
            CarParams::default(),
        )?;
        Ok(Self::new(dt, car, spot, Vec::new(), RewardWeights::default()))
    }

    /// Start anywhere in a wide box with an arbitrary heading.
    pub fn general_hard<R: Rng>(dt: f32, rng: &mut R) -> Result<Self, SimError> {
        let front_left = Vec2::new(-0.5 * SPOT_LENGTH, -0.5 * SPOT_WIDTH);
        let spot = spot_facing_x(front_left, SPOT_LENGTH)?;
        let shift = Vec2::new(rng.random_range(-20.0..20.0), rng.random_range(-20.0..20.0));
        let heading = 0.5 * std::f32::consts::PI
            + rng.random_range(-std::f32::consts::PI..std::f32::consts::PI);
        let car = Car::new(Pose::new(shift, heading), CarParams::default())?;
        Ok(Self::new(dt, car, spot, Vec::new(), RewardWeights::default()))
    }

    /// Fixed start between two obstacle rows flanking the spot.
    pub fn obstacle_corridor(dt: f32) -> Result<Self, SimError> {
        let front_left = Vec2::new(-14.0, -6.0);
        let front_right = front_left + Vec2::new(0.0, SPOT_WIDTH);
        let spot = ParkingSpot::new(
            front_left,
            front_right,
            front_left + Vec2::new(SPOT_LENGTH, 0.0),
            front_right + Vec2::new(SPOT_LENGTH, 0.0),
        )?;
        let obstacles = vec![
            Obstacle::new(vec![
                front_right + Vec2::new(0.0, 4.0),
                front_right + Vec2::new(0.0, 4.0 + 3.0 * SPOT_WIDTH),
                front_right + Vec2::new(SPOT_LENGTH, 4.0 + 3.0 * SPOT_WIDTH),
                front_right + Vec2::new(SPOT_LENGTH, 4.0),
            ])?,
            Obstacle::new(vec![
                front_left + Vec2::new(0.0, -4.0),
                front_left + Vec2::new(0.0, -4.0 - 3.0 * SPOT_WIDTH),
                front_left + Vec2::new(SPOT_LENGTH, -4.0 - 3.0 * SPOT_WIDTH),
                front_left + Vec2::new(SPOT_LENGTH, -4.0),
            ])?,
        ];
        let car = Car::new(
            Pose::new(
                Vec2::new(2.0, -6.0 + 0.5 * SPOT_WIDTH),
                0.5 * std::f32::consts::PI,
            ),
            CarParams::default(),
        )?;
        Ok(Self::new(dt, car, spot, obstacles, RewardWeights::default()))
    }
}

/// Spot whose ahead axis points along +x (negative `length` flips it)
fn spot_facing_x(front_left: Vec2, length: f32) -> Result<ParkingSpot, SimError> {
    let front_right = front_left + Vec2::new(0.0, SPOT_WIDTH);
    ParkingSpot::new(
        front_left,
        front_right,
        front_left + Vec2::new(length, 0.0),
        front_right + Vec2::new(length, 0.0),
    )
}
