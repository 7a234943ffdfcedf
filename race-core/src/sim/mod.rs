use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::scenario::Scenario;

mod checkpoint;
mod vehicle;

pub use checkpoint::Checkpoint;
pub use vehicle::Vehicle;

/// The unit the planner searches over. Cheap to copy; the checkpoint list lives
/// outside it and is only ever read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RaceState {
    pub checkpoint_index: usize,
    pub vehicle: Vehicle,
}

impl RaceState {
    pub fn new(vehicle: Vehicle) -> Self {
        Self {
            checkpoint_index: 0,
            vehicle,
        }
    }

    #[inline]
    pub fn goal(&self, checkpoints: &[Checkpoint]) -> Option<Checkpoint> {
        checkpoints.get(self.checkpoint_index).copied()
    }

    #[inline]
    pub fn next_goal(&self, checkpoints: &[Checkpoint]) -> Option<Checkpoint> {
        checkpoints.get(self.checkpoint_index + 1).copied()
    }

    #[inline]
    pub fn is_complete(&self, checkpoints: &[Checkpoint]) -> bool {
        self.checkpoint_index >= checkpoints.len()
    }

    /// Moves the vehicle one step, then tests the current goal only. Returns
    /// whether that goal was reached; at most one checkpoint is taken per step.
    pub fn advance(&mut self, action: Action, checkpoints: &[Checkpoint]) -> bool {
        self.vehicle.apply(action);
        match self.goal(checkpoints) {
            Some(goal) if goal.contains(self.vehicle.position) => {
                self.checkpoint_index += 1;
                true
            }
            _ => false,
        }
    }
}

/// Authoritative race: owns the live state and the turn counter.
#[derive(Clone, Debug)]
pub struct Race {
    checkpoints: Arc<[Checkpoint]>,
    state: RaceState,
    turn: u32,
}

impl Race {
    pub fn new(vehicle: Vehicle, checkpoints: impl Into<Arc<[Checkpoint]>>) -> Self {
        Self {
            checkpoints: checkpoints.into(),
            state: RaceState::new(vehicle),
            turn: 0,
        }
    }

    pub fn from_scenario(scenario: &Scenario) -> Self {
        Self::new(scenario.vehicle, scenario.course())
    }

    /// Applies `action`. The turn counter only runs while the race is live.
    pub fn step(&mut self, action: Action) -> bool {
        if !self.is_complete() {
            self.turn += 1;
        }
        self.state.advance(action, &self.checkpoints)
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.state.is_complete(&self.checkpoints)
    }

    #[inline]
    pub fn current_checkpoint(&self) -> Option<Checkpoint> {
        self.state.goal(&self.checkpoints)
    }

    #[inline]
    pub fn next_checkpoint(&self) -> Option<Checkpoint> {
        self.state.next_goal(&self.checkpoints)
    }

    #[inline]
    pub fn state(&self) -> &RaceState {
        &self.state
    }

    #[inline]
    pub fn vehicle(&self) -> &Vehicle {
        &self.state.vehicle
    }

    #[inline]
    pub fn turn(&self) -> u32 {
        self.turn
    }

    #[inline]
    pub fn checkpoints(&self) -> &Arc<[Checkpoint]> {
        &self.checkpoints
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    pub turns: u32,
    pub checkpoint_index: usize,
    pub course_len: usize,
    pub completed: bool,
    pub vehicle: Vehicle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TurnSample {
    pub turn: u32,
    pub checkpoint_index: usize,
    pub vehicle: Vehicle,
}

/// Re-runs a recorded action list against a scenario. Actions past completion
/// are ignored.
pub fn replay(scenario: &Scenario, actions: &[Action]) -> ReplaySummary {
    let mut race = Race::from_scenario(scenario);
    for action in actions {
        if race.is_complete() {
            break;
        }
        race.step(*action);
    }
    summarize(&race)
}

pub fn replay_with_samples(
    scenario: &Scenario,
    actions: &[Action],
    sample_every: u32,
) -> Vec<TurnSample> {
    let mut race = Race::from_scenario(scenario);
    let stride = if sample_every == 0 { 1 } else { sample_every };
    let total_turns = actions.len() as u32;
    let mut samples = vec![sample(&race)];

    for action in actions {
        if race.is_complete() {
            break;
        }
        race.step(*action);
        if race.turn() % stride == 0 || race.turn() == total_turns || race.is_complete() {
            samples.push(sample(&race));
        }
    }

    samples
}

fn summarize(race: &Race) -> ReplaySummary {
    ReplaySummary {
        turns: race.turn(),
        checkpoint_index: race.state().checkpoint_index,
        course_len: race.checkpoints().len(),
        completed: race.is_complete(),
        vehicle: *race.vehicle(),
    }
}

fn sample(race: &Race) -> TurnSample {
    TurnSample {
        turn: race.turn(),
        checkpoint_index: race.state().checkpoint_index,
        vehicle: *race.vehicle(),
    }
}
