use crate::config::ControllerOptions;
use crate::controllers::{controller_fingerprint, create_controller_with, Controller, TurnStatus};
use anyhow::{anyhow, Context, Result};
use race_core::constants::MAX_TURNS_DEFAULT;
use race_core::sim::replay;
use race_core::{Action, Race, Scenario, Vehicle};
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::time::Instant;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunOutcome {
    Finished { turns: u32 },
    /// The turn budget ran out before the last checkpoint.
    DidNotFinish { turns: u32 },
}

impl RunOutcome {
    pub fn finished(&self) -> bool {
        matches!(self, Self::Finished { .. })
    }

    pub fn turns(&self) -> u32 {
        match *self {
            Self::Finished { turns } | Self::DidNotFinish { turns } => turns,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct RunMetrics {
    pub controller_id: String,
    pub controller_fingerprint: String,
    pub scenario: String,
    pub max_turns: u32,
    pub turns: u32,
    pub finished: bool,
    pub course_len: usize,
    pub checkpoints_reached: usize,
    pub planned_turns: u32,
    pub all_searched_turns: u32,
    pub course_correcting_turns: u32,
    pub steering_turns: u32,
    pub thrust_turns: u32,
    pub rotate_turns: u32,
    pub decision_ms: f64,
    pub final_vehicle: Vehicle,
}

#[derive(Clone, Debug)]
pub struct RunArtifact {
    pub outcome: RunOutcome,
    pub metrics: RunMetrics,
    pub actions: Vec<Action>,
}

pub fn run_controller(
    controller_id: &str,
    options: &ControllerOptions,
    scenario_label: &str,
    scenario: &Scenario,
    max_turns: u32,
) -> Result<RunArtifact> {
    if max_turns == 0 {
        return Err(anyhow!("max_turns must be > 0"));
    }

    let mut controller = create_controller_with(controller_id, options)
        .ok_or_else(|| anyhow!("unknown controller '{controller_id}'"))?;
    run_controller_instance(controller.as_mut(), scenario_label, scenario, max_turns)
}

pub fn run_controller_instance(
    controller: &mut dyn Controller,
    scenario_label: &str,
    scenario: &Scenario,
    max_turns: u32,
) -> Result<RunArtifact> {
    if max_turns == 0 {
        return Err(anyhow!("max_turns must be > 0"));
    }

    let mut race = Race::from_scenario(scenario);
    controller.read_checkpoints(race.checkpoints().clone());

    let mut actions = Vec::with_capacity(max_turns.min(MAX_TURNS_DEFAULT) as usize);
    let mut status_counts = StatusCounts::default();
    let started = Instant::now();

    let outcome = loop {
        if race.is_complete() {
            break RunOutcome::Finished { turns: race.turn() };
        }
        if race.turn() >= max_turns {
            break RunOutcome::DidNotFinish { turns: race.turn() };
        }

        let decision = controller.best_action(race.state());
        status_counts.record(decision.status);
        actions.push(decision.action);
        if race.step(decision.action) {
            tracing::debug!(
                controller = controller.id(),
                turn = race.turn(),
                checkpoint_index = race.state().checkpoint_index,
                "checkpoint reached"
            );
        }
    };
    let decision_ms = started.elapsed().as_secs_f64() * 1_000.0;

    let summary = replay(scenario, &actions);
    if summary.vehicle != *race.vehicle()
        || summary.checkpoint_index != race.state().checkpoint_index
        || summary.turns != outcome.turns()
    {
        return Err(anyhow!(
            "recorded actions failed replay: live {} at checkpoint {}, replayed {} at checkpoint {}",
            race.vehicle(),
            race.state().checkpoint_index,
            summary.vehicle,
            summary.checkpoint_index
        ));
    }

    let thrust_turns = actions.iter().filter(|a| a.thrust() > 0).count() as u32;
    let rotate_turns = actions.iter().filter(|a| a.rotation() != 0).count() as u32;

    tracing::info!(
        controller = controller.id(),
        scenario = scenario_label,
        turns = outcome.turns(),
        finished = outcome.finished(),
        checkpoints = summary.checkpoint_index,
        "run complete"
    );

    Ok(RunArtifact {
        outcome,
        metrics: RunMetrics {
            controller_id: controller.id().to_string(),
            controller_fingerprint: controller_fingerprint(controller.id())
                .unwrap_or_else(|| "unknown".to_string()),
            scenario: scenario_label.to_string(),
            max_turns,
            turns: outcome.turns(),
            finished: outcome.finished(),
            course_len: summary.course_len,
            checkpoints_reached: summary.checkpoint_index,
            planned_turns: status_counts.planned,
            all_searched_turns: status_counts.all_searched,
            course_correcting_turns: status_counts.course_correcting,
            steering_turns: status_counts.steering,
            thrust_turns,
            rotate_turns,
            decision_ms,
            final_vehicle: summary.vehicle,
        },
        actions,
    })
}

/// One `rotation thrust` pair per line.
pub fn write_actions(path: &Path, actions: &[Action]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating directory {}", parent.display()))?;
    }
    let mut text = String::with_capacity(actions.len() * 8);
    for action in actions {
        text.push_str(&format!("{} {}\n", action.rotation(), action.thrust()));
    }
    fs::write(path, text).with_context(|| format!("failed writing {}", path.display()))
}

#[derive(Default)]
struct StatusCounts {
    planned: u32,
    all_searched: u32,
    course_correcting: u32,
    steering: u32,
}

impl StatusCounts {
    fn record(&mut self, status: TurnStatus) {
        match status {
            TurnStatus::Planned => self.planned += 1,
            TurnStatus::AllSearched => self.all_searched += 1,
            TurnStatus::CourseCorrecting => self.course_correcting += 1,
            TurnStatus::Steering => self.steering += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use race_core::parse_scenario;

    const STRAIGHT: &str = "0 0 0 0 0\n1 1\n1000 0\n";

    #[test]
    fn rejects_zero_turn_budget() {
        let scenario = parse_scenario(STRAIGHT).expect("scenario");
        let err = run_controller("steering", &ControllerOptions::default(), "s", &scenario, 0)
            .expect_err("zero budget is invalid");
        assert!(err.to_string().contains("max_turns"));
    }

    #[test]
    fn rejects_unknown_controller() {
        let scenario = parse_scenario(STRAIGHT).expect("scenario");
        let err = run_controller("nope", &ControllerOptions::default(), "s", &scenario, 10)
            .expect_err("unknown controller");
        assert!(err.to_string().contains("unknown controller"));
    }

    #[test]
    fn steering_finishes_a_straight_course() {
        let scenario = parse_scenario(STRAIGHT).expect("scenario");
        let artifact =
            run_controller("steering", &ControllerOptions::default(), "straight", &scenario, 600)
                .expect("run");

        assert_eq!(artifact.outcome, RunOutcome::Finished { turns: 2 });
        assert_eq!(artifact.actions.len(), 2);
        assert_eq!(artifact.metrics.checkpoints_reached, 1);
        assert_eq!(artifact.metrics.steering_turns, 2);
        assert!(artifact.metrics.controller_fingerprint.starts_with("fnv1a:"));
    }

    #[test]
    fn turn_budget_exhaustion_is_reported() {
        let scenario = parse_scenario("0 0 0 0 0\n1 1\n12000 0\n").expect("scenario");
        let artifact =
            run_controller("steering", &ControllerOptions::default(), "far", &scenario, 3)
                .expect("run");

        assert_eq!(artifact.outcome, RunOutcome::DidNotFinish { turns: 3 });
        assert!(!artifact.metrics.finished);
        assert_eq!(artifact.metrics.checkpoints_reached, 0);
        assert_eq!(artifact.actions.len(), 3);
    }

    #[test]
    fn oversized_turn_budget_still_runs() {
        let scenario = parse_scenario(STRAIGHT).expect("scenario");
        let artifact =
            run_controller("steering", &ControllerOptions::default(), "s", &scenario, u32::MAX)
                .expect("run");

        assert_eq!(artifact.outcome, RunOutcome::Finished { turns: 2 });
        assert_eq!(artifact.metrics.max_turns, u32::MAX);
    }

    #[test]
    fn actions_file_lists_one_pair_per_line() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("actions.txt");
        write_actions(&path, &[Action::new(-6, 100), Action::IDLE])?;
        assert_eq!(fs::read_to_string(&path)?, "-6 100\n0 0\n");
        Ok(())
    }
}
