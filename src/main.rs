//! Autopark entry point
//!
//! Headless episode runner: drives seeded random-policy parking episodes
//! through the simulation core and logs per-episode outcomes. It stands in
//! for the external trainer at its interface boundary; no learning or
//! rendering happens here.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use autopark::consts::{ACCEL_AHEAD, ACCEL_BACK, ACCEL_SIDE};
use autopark::sim::{Scene, SimError};

/// Fixed simulation timestep [s]
const DT: f32 = 0.025;
/// Episode time limit [s]
const EPISODE_TIME_LIMIT: f32 = 40.0;
/// Ticks between policy decisions
const STEERING_GAP_STEPS: u32 = 8;
/// Steering decisions a corrective nudge stays in force
const NUDGE_STEERING_STEPS: u32 = 4;

struct EpisodeSummary {
    outcome: &'static str,
    frames: u32,
    last_reward: f32,
    mean_reward: f32,
    mean_distance: f32,
}

fn main() -> Result<(), SimError> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(0);
    let episodes: u32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(10);

    log::info!("car parking run: seed={seed}, episodes={episodes}");
    let mut rng = Pcg32::seed_from_u64(seed);
    let mut parked_count = 0u32;
    for epi in 0..episodes {
        let summary = run_episode(&mut rng)?;
        if summary.outcome == "parked" {
            parked_count += 1;
        }
        log::info!(
            "episode {}/{}: outcome={}, frames={}, last reward={:.3}, mean reward={:.3}, mean distance={:.3}",
            epi + 1,
            episodes,
            summary.outcome,
            summary.frames,
            summary.last_reward,
            summary.mean_reward,
            summary.mean_distance,
        );
    }
    log::info!(
        "parked {}/{} ({:.1}%)",
        parked_count,
        episodes,
        100.0 * parked_count as f32 / episodes.max(1) as f32
    );
    Ok(())
}

fn run_episode(rng: &mut Pcg32) -> Result<EpisodeSummary, SimError> {
    let mut scene = Scene::two_sided(DT, rng)?;
    let steering_gap = STEERING_GAP_STEPS as f32 * DT;
    let max_frames = (EPISODE_TIME_LIMIT / DT) as u32;

    let mut action = (0i8, 0i8);
    let mut nudge_steps_left = 0u32;
    let mut frame = 0u32;
    let mut rewards_total = 0.0f32;
    let mut distances_total = 0.0f32;

    loop {
        let time_elapsed = frame as f32 * DT;
        let time_remaining = EPISODE_TIME_LIMIT - time_elapsed;
        if scene.car().parked() || scene.car().collided() || time_elapsed >= EPISODE_TIME_LIMIT {
            break;
        }

        let steering_now = frame % STEERING_GAP_STEPS == 0;
        if steering_now {
            if nudge_steps_left > 0 {
                nudge_steps_left -= 1;
            } else {
                action = (rng.random_range(-1..=1), rng.random_range(-1..=1));
            }
        }

        let longitudinal = match action.0 {
            1 => ACCEL_AHEAD,
            -1 => -ACCEL_BACK,
            _ => 0.0,
        };
        let lateral = action.1 as f32 * ACCEL_SIDE;
        scene.apply_action(longitudinal, lateral)?;

        // Corrective nudge: a short random ahead/back burst when the car has
        // stalled with no drive force, or has not moved over the lookback
        // window.
        if steering_now && nudge_steps_left == 0 {
            let stalled = scene.car().speed() == 0.0 && scene.car().accel_magnitude() == 0.0;
            if stalled || scene.is_stuck() {
                action = (if rng.random::<bool>() { 1 } else { -1 }, 0);
                nudge_steps_left = NUDGE_STEERING_STEPS;
            }
        }

        let report = scene.step(steering_gap, time_remaining);
        rewards_total += report.reward;
        distances_total += report.distance;
        frame += 1;
    }

    let outcome = if scene.car().collided() {
        "collision"
    } else if scene.car().parked() {
        "parked"
    } else {
        "time_exceeded"
    };
    Ok(EpisodeSummary {
        outcome,
        frames: frame,
        last_reward: scene.car().reward(),
        mean_reward: rewards_total / max_frames as f32,
        mean_distance: distances_total / frame.max(1) as f32,
    })
}
