use std::sync::Arc;

use race_core::constants::CHECKPOINT_RADIUS_SQ;
use race_core::{Action, Checkpoint, RaceState, Vehicle};
use serde::Serialize;

use super::{Controller, Decision, TurnStatus};

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SteeringConfig {
    /// Start aiming past the goal once coasting would reach it within this many turns.
    pub arrival_lookahead: u32,
    /// Weight of the current goal when blending toward the next one.
    pub next_gate_blend: f64,
    /// Multiple of the velocity subtracted from the desired direction.
    pub brake_factor: f64,
    /// Below this cosine between facing and desired direction, thrust is cut.
    pub min_thrust_cosine: f64,
}

/// Coasting extrapolation: straight-line drift at the current velocity, without
/// friction. `Some(t)` when the goal is entered `t + 1` turns out; gives up as
/// soon as the vehicle starts drifting away.
pub fn turns_to_reach(vehicle: &Vehicle, goal: Checkpoint, max_turns: u32) -> Option<u32> {
    let center = goal.center.to_vector();
    let velocity = vehicle.velocity();
    let mut pos = vehicle.position.to_vector();
    let mut min_dist2 = 1e9;

    for t in 0..=max_turns {
        pos += velocity;
        let dist2 = (center - pos).norm_squared();
        if dist2 < CHECKPOINT_RADIUS_SQ as f64 {
            return Some(t);
        }
        if dist2 > min_dist2 {
            break;
        }
        min_dist2 = dist2;
    }
    None
}

pub fn steer(config: &SteeringConfig, state: &RaceState, checkpoints: &[Checkpoint]) -> Action {
    let Some(goal) = state.goal(checkpoints) else {
        return Action::IDLE;
    };
    let vehicle = &state.vehicle;
    let facing = vehicle.facing();

    let to_goal = goal.center - vehicle.position;
    let dist = to_goal.norm();
    let mut desired = to_goal;

    if let Some(next) = state.next_goal(checkpoints) {
        // An arrival on the very next turn (t == 0) does not trigger the blend.
        if let Some(1..) = turns_to_reach(vehicle, goal, config.arrival_lookahead) {
            let blend = config.next_gate_blend;
            desired = desired.scale(blend) + (next.center - vehicle.position).scale(1.0 - blend);
        }
    }

    desired -= vehicle.velocity().scale(config.brake_factor);

    let cosine = facing.cos_angle(desired);
    let rotation = facing.angle_to(desired).to_degrees();
    let thrust = if cosine >= config.min_thrust_cosine {
        cosine * dist
    } else {
        0.0
    };

    Action::clamped(
        rotation.round_ties_even() as i32,
        thrust.round_ties_even() as i32,
    )
}

pub struct SteeringController {
    id: &'static str,
    description: &'static str,
    config: SteeringConfig,
    checkpoints: Arc<[Checkpoint]>,
}

impl SteeringController {
    pub fn new(id: &'static str, description: &'static str, config: SteeringConfig) -> Self {
        Self {
            id,
            description,
            config,
            checkpoints: Arc::from(Vec::new()),
        }
    }
}

impl Controller for SteeringController {
    fn id(&self) -> &'static str {
        self.id
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn read_checkpoints(&mut self, checkpoints: Arc<[Checkpoint]>) {
        self.checkpoints = checkpoints;
    }

    fn best_action(&mut self, state: &RaceState) -> Decision {
        Decision::new(
            steer(&self.config, state, &self.checkpoints),
            TurnStatus::Steering,
        )
    }
}
