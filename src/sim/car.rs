//! Vehicle body: pose, kinematics, derived frame and the friction integrator
//!
//! Ground truth is the pose and kinematic state; corners, edge midpoints,
//! sensor origins and spot-relative vectors are cached projections refreshed
//! whenever the pose changes, never mutated independently.

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::{CarParams, RewardWeights, StateEncoding};
use crate::consts::{GRAVITY, PARKED_MAX_ANGLE, PARKED_MAX_RELATIVE_DISTANCE};
use crate::{rotate, rotate_cw, wrap_angle};

use super::collision::{Collision, check_collision};
use super::error::SimError;
use super::reward::evaluate_reward;
use super::sensors::{SensorBank, refresh_sensor_values};
use super::world::{Obstacle, ParkingSpot};

/// Position plus an orthonormal body basis.
///
/// `ahead` and `right` are always unit length and orthogonal
/// (right = ahead rotated -90°); `angle` is the polar angle of `ahead` in
/// [0, 2π), recomputed from `ahead` and never mutated on its own.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pose {
    /// Body center position
    pub pos: Vec2,
    ahead: Vec2,
    right: Vec2,
    angle: f32,
}

impl Pose {
    /// Heading is measured from the +y base direction, counter-clockwise.
    pub fn new(pos: Vec2, heading: f32) -> Self {
        let ahead = if heading != 0.0 {
            rotate(Vec2::Y, heading)
        } else {
            Vec2::Y
        };
        Self::from_ahead(pos, ahead)
    }

    fn from_ahead(pos: Vec2, ahead: Vec2) -> Self {
        Self {
            pos,
            ahead,
            right: rotate_cw(ahead),
            angle: wrap_angle(ahead.y.atan2(ahead.x)),
        }
    }

    /// Forward-facing unit vector
    #[inline]
    pub fn ahead(&self) -> Vec2 {
        self.ahead
    }

    /// Unit vector pointing out the passenger side
    #[inline]
    pub fn right(&self) -> Vec2 {
        self.right
    }

    /// Polar angle of the ahead vector, [0, 2π)
    #[inline]
    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Replace the heading. `ahead` must be unit length; right and angle are
    /// rederived.
    fn set_ahead(&mut self, ahead: Vec2) {
        self.ahead = ahead;
        self.right = rotate_cw(ahead);
        self.angle = wrap_angle(ahead.y.atan2(ahead.x));
    }
}

/// The four hull corners and edge midpoints, derived from a pose
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CarFrame {
    pub front_left: Vec2,
    pub front_right: Vec2,
    pub back_left: Vec2,
    pub back_right: Vec2,
    pub front: Vec2,
    pub back: Vec2,
    pub left: Vec2,
    pub right: Vec2,
}

impl CarFrame {
    pub fn from_pose(pose: &Pose, params: &CarParams) -> Self {
        let front_left =
            pose.pos + pose.ahead() * 0.5 * params.length - pose.right() * 0.5 * params.width;
        let front_right = front_left + pose.right() * params.width;
        let back_left = front_left - pose.ahead() * params.length;
        let back_right = back_left + pose.right() * params.width;
        Self {
            front_left,
            front_right,
            back_left,
            back_right,
            front: 0.5 * (front_left + front_right),
            back: 0.5 * (back_left + back_right),
            left: 0.5 * (front_left + back_left),
            right: 0.5 * (front_right + back_right),
        }
    }
}

/// Sensor origin points on the hull.
///
/// Front and back rows are spaced corner to corner (hence >= 2 per row);
/// side sensors sit strictly between the corners.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorOrigins {
    pub front: Vec<Vec2>,
    pub back: Vec<Vec2>,
    pub left: Vec<Vec2>,
    pub right: Vec<Vec2>,
}

impl SensorOrigins {
    pub fn from_frame(frame: &CarFrame, pose: &Pose, params: &CarParams) -> Self {
        let front_gap = params.width / (params.sensors_front - 1) as f32;
        let front = (0..params.sensors_front)
            .map(|i| frame.front_left + i as f32 * front_gap * pose.right())
            .collect();
        let back_gap = params.width / (params.sensors_back - 1) as f32;
        let back = (0..params.sensors_back)
            .map(|i| frame.back_left + i as f32 * back_gap * pose.right())
            .collect();
        let side_gap = params.length / (params.sensors_per_side + 1) as f32;
        let left = (0..params.sensors_per_side)
            .map(|i| frame.back_left + (i + 1) as f32 * side_gap * pose.ahead())
            .collect();
        let right = (0..params.sensors_per_side)
            .map(|i| frame.back_right + (i + 1) as f32 * side_gap * pose.ahead())
            .collect();
        Self {
            front,
            back,
            left,
            right,
        }
    }
}

/// Vectors and scalars relating the vehicle to the parking spot.
///
/// The spot-side anchor points use the *vehicle's* length/width placed at the
/// spot center, so a perfectly parked car has all offsets at zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpotRelation {
    /// Front edge midpoint to spot front anchor
    pub to_front: Vec2,
    /// Back edge midpoint to spot back anchor
    pub to_back: Vec2,
    /// Mean of the two, i.e. center to center
    pub to_center: Vec2,
    /// Corner-to-corner offsets
    pub to_front_left: Vec2,
    pub to_front_right: Vec2,
    pub to_back_left: Vec2,
    pub to_back_right: Vec2,
    /// Front/back midpoint to spot corner offsets
    pub mid_to_front_left: Vec2,
    pub mid_to_front_right: Vec2,
    pub mid_to_back_left: Vec2,
    pub mid_to_back_right: Vec2,
    /// Center-to-center distance
    pub distance: f32,
    /// Angle between the ahead vectors, [0, π]
    pub angle_distance: f32,
    /// Perpendicular offset from the spot's longitudinal axis line
    pub gutter_distance: f32,
}

/// Bounded position/corner traces, consumed by anti-stuck detection and
/// external rendering. Capacity 0 means unbounded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraceHistory {
    capacity: usize,
    pub center: VecDeque<Vec2>,
    pub front_left: VecDeque<Vec2>,
    pub front_right: VecDeque<Vec2>,
    pub back_left: VecDeque<Vec2>,
    pub back_right: VecDeque<Vec2>,
}

impl TraceHistory {
    fn push(&mut self, pos: Vec2, frame: &CarFrame) {
        self.center.push_back(pos);
        self.front_left.push_back(frame.front_left);
        self.front_right.push_back(frame.front_right);
        self.back_left.push_back(frame.back_left);
        self.back_right.push_back(frame.back_right);
        if self.capacity > 0 {
            while self.center.len() > self.capacity {
                self.center.pop_front();
                self.front_left.pop_front();
                self.front_right.pop_front();
                self.back_left.pop_front();
                self.back_right.pop_front();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.center.len()
    }

    pub fn is_empty(&self) -> bool {
        self.center.is_empty()
    }
}

/// The rigid vehicle body.
///
/// Created at episode start with a given pose, mutated every tick by the
/// integrator and between ticks by actions; never destroyed mid-episode
/// (terminal states freeze motion but the body persists for reward
/// accounting).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Car {
    params: CarParams,
    pose: Pose,
    vel: Vec2,
    speed: f32,
    accel: Vec2,
    accel_mag: f32,
    /// Acceleration contributions accumulated for the coming tick
    pending: Vec<Vec2>,
    frame: CarFrame,
    sensor_origins: SensorOrigins,
    sensors: SensorBank,
    collided: bool,
    collision: Option<Collision>,
    parked: bool,
    time_exceeded: bool,
    relation: SpotRelation,
    reward: f32,
    history: TraceHistory,
}

impl Car {
    pub fn new(pose: Pose, params: CarParams) -> Result<Self, SimError> {
        params.validate()?;
        let frame = CarFrame::from_pose(&pose, &params);
        let sensor_origins = SensorOrigins::from_frame(&frame, &pose, &params);
        let sensors = SensorBank::new(
            params.sensors_front,
            params.sensors_back,
            params.sensors_per_side,
            params.sensor_max_range,
        );
        Ok(Self {
            params,
            pose,
            vel: Vec2::ZERO,
            speed: 0.0,
            accel: Vec2::ZERO,
            accel_mag: 0.0,
            pending: Vec::new(),
            frame,
            sensor_origins,
            sensors,
            collided: false,
            collision: None,
            parked: false,
            time_exceeded: false,
            relation: SpotRelation::default(),
            reward: 0.0,
            history: TraceHistory::default(),
        })
    }

    // --- read-only accessors (rendering / trainer collaborators) ---

    pub fn params(&self) -> &CarParams {
        &self.params
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn frame(&self) -> &CarFrame {
        &self.frame
    }

    pub fn velocity(&self) -> Vec2 {
        self.vel
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn accel_magnitude(&self) -> f32 {
        self.accel_mag
    }

    pub fn sensors(&self) -> &SensorBank {
        &self.sensors
    }

    pub fn sensor_origins(&self) -> &SensorOrigins {
        &self.sensor_origins
    }

    pub fn collided(&self) -> bool {
        self.collided
    }

    pub fn collision(&self) -> Option<&Collision> {
        self.collision.as_ref()
    }

    pub fn parked(&self) -> bool {
        self.parked
    }

    pub fn time_exceeded(&self) -> bool {
        self.time_exceeded
    }

    pub fn relation(&self) -> &SpotRelation {
        &self.relation
    }

    pub fn reward(&self) -> f32 {
        self.reward
    }

    pub fn history(&self) -> &TraceHistory {
        &self.history
    }

    /// Bound the history ring buffers; called once per episode by the scene.
    pub(crate) fn set_history_capacity(&mut self, capacity: usize) {
        self.history.capacity = capacity;
    }

    // --- actions ---

    /// Queue a forward acceleration for the coming tick.
    ///
    /// Silently ignored in a terminal state (domain policy, not a fault).
    pub fn accelerate_ahead(&mut self, magnitude: f32) -> Result<(), SimError> {
        let ahead = self.pose.ahead();
        self.impose(ahead, magnitude, false)
    }

    /// Queue a backward acceleration for the coming tick.
    pub fn accelerate_back(&mut self, magnitude: f32) -> Result<(), SimError> {
        let back = -self.pose.ahead();
        self.impose(back, magnitude, false)
    }

    /// Queue a rightward acceleration. Ignored below the minimum turning
    /// speed: turning needs momentum.
    pub fn accelerate_right(&mut self, magnitude: f32) -> Result<(), SimError> {
        let right = self.pose.right();
        self.impose(right, magnitude, true)
    }

    /// Queue a leftward acceleration. Same momentum rule as right.
    pub fn accelerate_left(&mut self, magnitude: f32) -> Result<(), SimError> {
        let left = -self.pose.right();
        self.impose(left, magnitude, true)
    }

    fn impose(&mut self, direction: Vec2, magnitude: f32, lateral: bool) -> Result<(), SimError> {
        if magnitude < 0.0 || magnitude.is_nan() {
            return Err(SimError::NegativeMagnitude { magnitude });
        }
        if self.collided || self.parked {
            return Ok(());
        }
        if lateral && self.speed < self.params.min_speed_to_turn {
            return Ok(());
        }
        self.pending.push(direction * magnitude);
        self.accel = self.pending.iter().copied().sum();
        self.accel_mag = self.accel.length();
        Ok(())
    }

    // --- per-tick integration ---

    /// Advance the body by one tick and refresh all derived state.
    ///
    /// `dt_since_action` is the duration since the last externally-applied
    /// action (the steering gap), `time_remaining` the episode time left
    /// before this tick.
    pub fn step(
        &mut self,
        dt: f32,
        dt_since_action: f32,
        time_remaining: f32,
        obstacles: &[Obstacle],
        spot: &ParkingSpot,
        weights: &RewardWeights,
    ) {
        // Static friction cancels drive force up to mu_s * g; only the
        // excess above the limit remains.
        let mu_static_g = self.params.mu_static * GRAVITY;
        if self.speed == 0.0 && self.accel_mag > mu_static_g {
            let factor = mu_static_g / self.accel_mag;
            self.accel -= factor * self.accel;
            self.accel_mag *= 1.0 - factor;
        }

        // Kinetic friction as a fraction of the tick's motion; factor 1
        // cancels the whole tick.
        let mut friction_kinetic = 0.0;
        if self.speed > 0.0 {
            let mu_kinetic_g_dt = self.params.mu_kinetic * GRAVITY * dt;
            let mean_speed = (self.vel + 0.5 * self.accel * dt).length();
            friction_kinetic = (mu_kinetic_g_dt / mean_speed).min(1.0);
        }

        self.pose.pos += (1.0 - friction_kinetic) * (self.vel * dt + 0.5 * self.accel * dt * dt);
        self.vel = (1.0 - friction_kinetic) * (self.vel + self.accel * dt);
        self.speed = self.vel.length();
        if self.speed > self.params.max_speed {
            self.vel = self.params.max_speed * self.vel / self.speed;
            self.speed = self.params.max_speed;
        }

        if self.speed > 0.0 {
            let old_ahead = self.pose.ahead();
            let mut ahead = self.vel / self.speed;
            if ahead.dot(old_ahead) < 0.0 {
                // prevents unrealistic front-back flips
                ahead = -ahead;
            }
            self.pose.set_ahead(ahead);
        }

        // Tick's accelerations are consumed
        self.pending.clear();
        self.accel = Vec2::ZERO;
        self.accel_mag = 0.0;

        self.refresh_frame();
        self.refresh_perception(obstacles);
        if let Some(hit) = check_collision(&self.frame, obstacles) {
            log::debug!("collision at ({:.3}, {:.3})", hit.point.x, hit.point.y);
            self.collided = true;
            self.collision = Some(hit);
            self.vel = Vec2::ZERO;
            self.speed = 0.0;
        }
        if time_remaining - dt <= 0.0 {
            self.time_exceeded = true;
        }
        self.refresh_relation(spot);
        self.refresh_reward(weights, dt_since_action, time_remaining);
        self.history.push(self.pose.pos, &self.frame);
    }

    fn refresh_frame(&mut self) {
        self.frame = CarFrame::from_pose(&self.pose, &self.params);
        self.sensor_origins = SensorOrigins::from_frame(&self.frame, &self.pose, &self.params);
    }

    pub(crate) fn refresh_perception(&mut self, obstacles: &[Obstacle]) {
        refresh_sensor_values(
            &mut self.sensors,
            self.pose.pos,
            &self.sensor_origins,
            obstacles,
            self.params.sensor_max_range,
        );
    }

    /// Recompute spot-relative vectors and run the parking classifier.
    ///
    /// Parked is sticky: the classifier only ever sets the flag.
    pub(crate) fn refresh_relation(&mut self, spot: &ParkingSpot) {
        let half_l = 0.5 * self.params.length;
        let half_w = 0.5 * self.params.width;
        let anchor_front = spot.center + spot.ahead * half_l;
        let anchor_back = spot.center - spot.ahead * half_l;
        let anchor_fr = anchor_front + spot.right * half_w;
        let anchor_fl = anchor_fr - spot.right * self.params.width;
        let anchor_br = anchor_back + spot.right * half_w;
        let anchor_bl = anchor_br - spot.right * self.params.width;

        let to_front = anchor_front - self.frame.front;
        let to_back = anchor_back - self.frame.back;
        let dot = self.pose.ahead().dot(spot.ahead).clamp(-1.0, 1.0);
        self.relation = SpotRelation {
            to_front,
            to_back,
            to_center: 0.5 * (to_front + to_back),
            to_front_left: anchor_fl - self.frame.front_left,
            to_front_right: anchor_fr - self.frame.front_right,
            to_back_left: anchor_bl - self.frame.back_left,
            to_back_right: anchor_br - self.frame.back_right,
            mid_to_front_left: anchor_fl - self.frame.front,
            mid_to_front_right: anchor_fr - self.frame.front,
            mid_to_back_left: anchor_bl - self.frame.back,
            mid_to_back_right: anchor_br - self.frame.back,
            distance: (self.pose.pos - spot.center).length(),
            angle_distance: dot.acos(),
            gutter_distance: spot.gutter_distance(self.pose.pos),
        };

        if self.speed == 0.0
            && self.relation.distance <= PARKED_MAX_RELATIVE_DISTANCE * spot.width
            && self.relation.angle_distance <= PARKED_MAX_ANGLE
        {
            if !self.parked {
                log::debug!(
                    "parked: distance {:.3}, angle {:.4}",
                    self.relation.distance,
                    self.relation.angle_distance
                );
            }
            self.parked = true;
        }
    }

    pub(crate) fn refresh_reward(
        &mut self,
        weights: &RewardWeights,
        dt_since_action: f32,
        time_remaining: f32,
    ) {
        self.reward = evaluate_reward(
            self.collided,
            self.parked,
            &self.relation,
            weights,
            dt_since_action,
            time_remaining,
        );
    }

    // --- anti-stuck ---

    /// Whether the body has effectively not moved over the lookback window.
    ///
    /// With fewer history entries than the window covers, reports not stuck.
    pub fn is_stuck(&self, dt: f32) -> bool {
        let steps_back = (self.params.antistuck_lookback / dt) as usize;
        if steps_back == 0 || self.history.center.len() < steps_back {
            return false;
        }
        let then = self.history.center[self.history.center.len() - steps_back];
        (self.pose.pos - then).length() <= self.params.antistuck_radius
    }

    // --- state encoding ---

    /// Fixed-length state vector in the encoding selected by the params.
    pub fn state_vector(&self) -> Vec<f32> {
        let rel = &self.relation;
        let mut out = Vec::with_capacity(self.params.encoding.len());
        let push_vec = |out: &mut Vec<f32>, v: Vec2| {
            out.push(v.x);
            out.push(v.y);
        };
        match self.params.encoding {
            StateEncoding::AngleSpeedFrontBack => {
                let along = self.pose.ahead().dot(self.vel);
                let signed_speed = if along < 0.0 { -self.speed } else { self.speed };
                out.push(self.pose.angle());
                out.push(signed_speed);
                push_vec(&mut out, rel.to_front);
                push_vec(&mut out, rel.to_back);
            }
            StateEncoding::AheadVelFrontBack => {
                push_vec(&mut out, self.pose.ahead());
                push_vec(&mut out, self.vel);
                push_vec(&mut out, rel.to_front);
                push_vec(&mut out, rel.to_back);
            }
            StateEncoding::AheadVelCorners => {
                push_vec(&mut out, self.pose.ahead());
                push_vec(&mut out, self.vel);
                push_vec(&mut out, rel.to_front_left);
                push_vec(&mut out, rel.to_front_right);
                push_vec(&mut out, rel.to_back_left);
                push_vec(&mut out, rel.to_back_right);
            }
            StateEncoding::AheadVelMidCorners
            | StateEncoding::AheadVelMidCornersDist
            | StateEncoding::AheadVelMidCornersDistAngle
            | StateEncoding::AheadVelMidCornersDistAngleGutter => {
                push_vec(&mut out, self.pose.ahead());
                push_vec(&mut out, self.vel);
                push_vec(&mut out, rel.mid_to_front_left);
                push_vec(&mut out, rel.mid_to_front_right);
                push_vec(&mut out, rel.mid_to_back_left);
                push_vec(&mut out, rel.mid_to_back_right);
                if self.params.encoding != StateEncoding::AheadVelMidCorners {
                    out.push(rel.distance);
                }
                if matches!(
                    self.params.encoding,
                    StateEncoding::AheadVelMidCornersDistAngle
                        | StateEncoding::AheadVelMidCornersDistAngleGutter
                ) {
                    out.push(rel.angle_distance);
                }
                if self.params.encoding == StateEncoding::AheadVelMidCornersDistAngleGutter {
                    out.push(rel.gutter_distance);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    const DT: f32 = 0.025;

    fn spot_far_away() -> ParkingSpot {
        ParkingSpot::axis_aligned(Vec2::new(100.0, 100.0), 6.1, 2.74).unwrap()
    }

    fn car_at(pos: Vec2, heading: f32) -> Car {
        Car::new(Pose::new(pos, heading), CarParams::default()).unwrap()
    }

    fn tick(car: &mut Car, obstacles: &[Obstacle], spot: &ParkingSpot) {
        car.step(DT, DT, 60.0, obstacles, spot, &RewardWeights::default());
    }

    #[test]
    fn test_pose_basis_orthonormal_after_construction() {
        for heading in [0.0, 0.3, FRAC_PI_2, PI, 4.0] {
            let pose = Pose::new(Vec2::ZERO, heading);
            assert!((pose.ahead().length() - 1.0).abs() < 1e-6);
            assert!((pose.right().length() - 1.0).abs() < 1e-6);
            assert!(pose.ahead().dot(pose.right()).abs() < 1e-6);
            assert!(pose.angle() >= 0.0 && pose.angle() < 2.0 * PI);
        }
    }

    #[test]
    fn test_corners_span_length_and_width() {
        let car = car_at(Vec2::new(1.0, 2.0), 0.7);
        let f = car.frame();
        assert!(((f.front_left - f.back_left).length() - CarParams::default().length).abs() < 1e-4);
        assert!(
            ((f.front_right - f.front_left).length() - CarParams::default().width).abs() < 1e-4
        );
        // Edge midpoints sit between their corners
        assert!((f.front - 0.5 * (f.front_left + f.front_right)).length() < 1e-6);
    }

    #[test]
    fn test_front_sensors_span_corners() {
        let car = car_at(Vec2::ZERO, 0.0);
        let origins = car.sensor_origins();
        assert_eq!(origins.front.len(), 3);
        assert!((origins.front[0] - car.frame().front_left).length() < 1e-6);
        assert!((origins.front[2] - car.frame().front_right).length() < 1e-6);
    }

    #[test]
    fn test_side_sensors_between_corners() {
        let car = car_at(Vec2::ZERO, 0.0);
        for &p in car
            .sensor_origins()
            .left
            .iter()
            .chain(car.sensor_origins().right.iter())
        {
            assert!((p - car.frame().front_left).length() > 0.1);
            assert!((p - car.frame().back_left).length() > 0.1);
            assert!((p - car.frame().front_right).length() > 0.1);
            assert!((p - car.frame().back_right).length() > 0.1);
        }
    }

    #[test]
    fn test_at_rest_stays_at_rest() {
        let mut car = car_at(Vec2::new(3.0, -2.0), 1.0);
        let spot = spot_far_away();
        let start = car.pose().pos;
        for _ in 0..50 {
            tick(&mut car, &[], &spot);
        }
        assert_eq!(car.pose().pos, start);
        assert_eq!(car.speed(), 0.0);
    }

    #[test]
    fn test_static_friction_passes_excess_only() {
        let mut car = car_at(Vec2::ZERO, 0.0);
        let spot = spot_far_away();
        car.accelerate_ahead(8.0).unwrap();
        tick(&mut car, &[], &spot);
        // From rest, effective acceleration is 8 - mu_s * g; kinetic friction
        // does not apply on the launching tick.
        let expected = (8.0 - CarParams::default().mu_static * GRAVITY) * DT;
        assert!((car.speed() - expected).abs() < 1e-4);
        assert!(car.velocity().dot(Vec2::Y) > 0.0);
    }

    #[test]
    fn test_weak_drive_force_retained_below_static_limit() {
        // The integrator damps acceleration only above the static limit
        let mut car = car_at(Vec2::ZERO, 0.0);
        let spot = spot_far_away();
        car.accelerate_ahead(1.0).unwrap();
        tick(&mut car, &[], &spot);
        assert!((car.speed() - 1.0 * DT).abs() < 1e-5);
    }

    #[test]
    fn test_kinetic_friction_slows_coasting() {
        let mut car = car_at(Vec2::ZERO, 0.0);
        let spot = spot_far_away();
        car.accelerate_ahead(50.0).unwrap();
        tick(&mut car, &[], &spot);
        let launched = car.speed();
        tick(&mut car, &[], &spot);
        assert!(car.speed() < launched);
    }

    #[test]
    fn test_speed_never_exceeds_max() {
        let mut car = car_at(Vec2::ZERO, 0.0);
        let spot = spot_far_away();
        for _ in 0..2000 {
            car.accelerate_ahead(500.0).unwrap();
            tick(&mut car, &[], &spot);
            assert!(car.speed() <= CarParams::default().max_speed + 1e-4);
        }
    }

    #[test]
    fn test_reversing_keeps_facing() {
        let mut car = car_at(Vec2::ZERO, 0.0);
        let spot = spot_far_away();
        car.accelerate_back(20.0).unwrap();
        tick(&mut car, &[], &spot);
        // Moving backward, still facing +y
        assert!(car.velocity().y < 0.0);
        assert!(car.pose().ahead().dot(Vec2::Y) > 0.99);
    }

    #[test]
    fn test_lateral_action_needs_momentum() {
        let mut car = car_at(Vec2::ZERO, 0.0);
        car.accelerate_right(1.0).unwrap();
        assert_eq!(car.accel_magnitude(), 0.0);
        // Past the threshold it sticks
        let spot = spot_far_away();
        car.accelerate_ahead(60.0).unwrap();
        tick(&mut car, &[], &spot);
        assert!(car.speed() >= CarParams::default().min_speed_to_turn);
        car.accelerate_right(1.0).unwrap();
        assert!(car.accel_magnitude() > 0.0);
    }

    #[test]
    fn test_negative_magnitude_rejected() {
        let mut car = car_at(Vec2::ZERO, 0.0);
        assert_eq!(
            car.accelerate_ahead(-1.0),
            Err(SimError::NegativeMagnitude { magnitude: -1.0 })
        );
        assert!(car.accelerate_left(f32::NAN).is_err());
    }

    #[test]
    fn test_contributions_sum_within_tick() {
        let mut car = car_at(Vec2::ZERO, 0.0);
        car.accelerate_ahead(3.0).unwrap();
        car.accelerate_ahead(4.0).unwrap();
        assert!((car.accel_magnitude() - 7.0).abs() < 1e-5);
        let spot = spot_far_away();
        tick(&mut car, &[], &spot);
        // Pending list is consumed by the tick
        assert_eq!(car.accel_magnitude(), 0.0);
    }

    #[test]
    fn test_drive_into_wall_collides_and_stops() {
        let mut car = car_at(Vec2::ZERO, 0.0);
        let spot = spot_far_away();
        let wall = Obstacle::rect(Vec2::new(-5.0, 4.0), Vec2::new(5.0, 5.0)).unwrap();
        for _ in 0..400 {
            car.accelerate_ahead(20.0).unwrap();
            tick(&mut car, &[wall.clone()], &spot);
            if car.collided() {
                break;
            }
        }
        assert!(car.collided());
        assert_eq!(car.speed(), 0.0);
        assert_eq!(car.velocity(), Vec2::ZERO);
        let hit = car.collision().expect("collision point recorded");
        assert!((hit.point.y - 4.0).abs() < 0.1);
        // Actions are ignored once collided
        car.accelerate_ahead(20.0).unwrap();
        assert_eq!(car.accel_magnitude(), 0.0);
    }

    #[test]
    fn test_time_limit_flag() {
        let mut car = car_at(Vec2::ZERO, 0.0);
        let spot = spot_far_away();
        car.step(DT, DT, DT, &[], &spot, &RewardWeights::default());
        assert!(car.time_exceeded());
    }

    #[test]
    fn test_is_stuck_after_idle_window() {
        let mut car = car_at(Vec2::ZERO, 0.0);
        let spot = spot_far_away();
        let steps = (CarParams::default().antistuck_lookback / DT) as usize;
        assert!(!car.is_stuck(DT));
        for _ in 0..steps {
            tick(&mut car, &[], &spot);
        }
        assert!(car.is_stuck(DT));
    }

    #[test]
    fn test_moving_car_not_stuck() {
        let mut car = car_at(Vec2::ZERO, 0.0);
        let spot = spot_far_away();
        let steps = (CarParams::default().antistuck_lookback / DT) as usize;
        for _ in 0..steps + 5 {
            car.accelerate_ahead(20.0).unwrap();
            tick(&mut car, &[], &spot);
        }
        assert!(!car.is_stuck(DT));
    }

    #[test]
    fn test_history_bounded_by_capacity() {
        let mut car = car_at(Vec2::ZERO, 0.0);
        car.set_history_capacity(10);
        let spot = spot_far_away();
        for _ in 0..50 {
            tick(&mut car, &[], &spot);
        }
        assert_eq!(car.history().len(), 10);
    }

    #[test]
    fn test_state_vector_lengths() {
        let spot = spot_far_away();
        for encoding in [
            StateEncoding::AngleSpeedFrontBack,
            StateEncoding::AheadVelFrontBack,
            StateEncoding::AheadVelCorners,
            StateEncoding::AheadVelMidCorners,
            StateEncoding::AheadVelMidCornersDist,
            StateEncoding::AheadVelMidCornersDistAngle,
            StateEncoding::AheadVelMidCornersDistAngleGutter,
        ] {
            let params = CarParams {
                encoding,
                ..CarParams::default()
            };
            let mut car = Car::new(Pose::new(Vec2::ZERO, 0.0), params).unwrap();
            car.refresh_relation(&spot);
            assert_eq!(car.state_vector().len(), encoding.len());
        }
    }

    #[test]
    fn test_parked_car_offsets_vanish() {
        let spot = ParkingSpot::axis_aligned(Vec2::new(2.0, 1.0), 6.1, 2.74).unwrap();
        let mut car = car_at(Vec2::new(2.0, 1.0), 0.0);
        car.refresh_relation(&spot);
        let rel = car.relation();
        assert!(rel.to_front_left.length() < 1e-5);
        assert!(rel.to_back_right.length() < 1e-5);
        assert!(rel.distance < 1e-6);
        assert!(car.parked());
    }

    proptest! {
        #[test]
        fn prop_basis_stays_orthonormal(
            actions in proptest::collection::vec((0u8..4, 0.0f32..30.0), 1..60)
        ) {
            let mut car = car_at(Vec2::ZERO, 0.4);
            let spot = spot_far_away();
            for (kind, mag) in actions {
                match kind {
                    0 => car.accelerate_ahead(mag).unwrap(),
                    1 => car.accelerate_back(mag).unwrap(),
                    2 => car.accelerate_right(mag).unwrap(),
                    _ => car.accelerate_left(mag).unwrap(),
                }
                tick(&mut car, &[], &spot);
                let pose = car.pose();
                prop_assert!((pose.ahead().length() - 1.0).abs() < 1e-4);
                prop_assert!((pose.right().length() - 1.0).abs() < 1e-4);
                prop_assert!(pose.ahead().dot(pose.right()).abs() < 1e-4);
                prop_assert!(car.speed() <= CarParams::default().max_speed + 1e-3);
            }
        }
    }
}
