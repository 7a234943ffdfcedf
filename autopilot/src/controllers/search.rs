//! Anytime best-first search over the action catalog.
//!
//! Each call builds a fresh tree rooted at the live state, pops the node closest
//! to the root's goal, expands it by every catalog action, and keeps the single
//! closest node seen. The clock is read before each expansion, so overshoot is
//! bounded by one expansion. The answer is the first action on the path to the
//! best node.

use core::cmp::Ordering;
use core::fmt;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use race_core::geometry::Vector;
use race_core::{Action, Checkpoint, RaceState, ACTION_CATALOG};
use serde::Serialize;

use super::{Controller, Decision, TurnStatus};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SearchConfig {
    pub time_budget_ms: u64,
    pub max_depth: u32,
}

impl SearchConfig {
    pub fn time_budget(&self) -> Duration {
        Duration::from_millis(self.time_budget_ms)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchTermination {
    TimeBudget,
    FrontierExhausted,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct SearchStats {
    pub termination: SearchTermination,
    pub expanded: usize,
    pub generated: usize,
    pub best_depth: u32,
    pub best_cost: f64,
    pub elapsed: Duration,
}

#[derive(Clone, Copy, Debug)]
pub struct Plan {
    pub action: Action,
    pub stats: SearchStats,
}

/// No node beat the root: every explored future is at least as far from the goal
/// as standing still, or the search never got to expand.
#[derive(Clone, Copy, Debug)]
pub struct PlanningExhausted {
    pub stats: SearchStats,
}

impl fmt::Display for PlanningExhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "planning exhausted: no improving action after {} expansion(s) ({:?})",
            self.stats.expanded, self.stats.termination
        )
    }
}

impl std::error::Error for PlanningExhausted {}

type NodeId = usize;

const ROOT: NodeId = 0;

#[derive(Clone, Copy, Debug)]
struct SearchNode {
    state: RaceState,
    parent: Option<NodeId>,
    action: Option<Action>,
    depth: u32,
}

#[derive(Clone, Copy, Debug)]
struct FrontierEntry {
    cost: f64,
    seq: u64,
    node: NodeId,
}

/// `BinaryHeap` pops the greatest entry, so the cheapest entry must compare
/// greatest; equal costs pop oldest first.
fn frontier_order(a: &FrontierEntry, b: &FrontierEntry) -> Ordering {
    b.cost
        .total_cmp(&a.cost)
        .then_with(|| b.seq.cmp(&a.seq))
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        frontier_order(self, other) == Ordering::Equal
    }
}

impl Eq for FrontierEntry {}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        frontier_order(self, other)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SearchPlanner {
    config: SearchConfig,
}

impl SearchPlanner {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn plan(
        &self,
        root: &RaceState,
        checkpoints: &[Checkpoint],
    ) -> Result<Plan, PlanningExhausted> {
        let started = Instant::now();
        let budget = self.config.time_budget();

        let Some(goal) = root.goal(checkpoints) else {
            return Err(PlanningExhausted {
                stats: SearchStats {
                    termination: SearchTermination::FrontierExhausted,
                    expanded: 0,
                    generated: 0,
                    best_depth: 0,
                    best_cost: 0.0,
                    elapsed: started.elapsed(),
                },
            });
        };
        // Proximity to the root's goal only; a node that has already taken that
        // gate is still scored against it.
        let cost_of = |state: &RaceState| state.vehicle.position.distance(goal.center);

        let mut nodes = vec![SearchNode {
            state: *root,
            parent: None,
            action: None,
            depth: 0,
        }];
        let mut frontier = BinaryHeap::new();
        let mut seq = 0u64;
        let root_cost = cost_of(root);
        frontier.push(FrontierEntry {
            cost: root_cost,
            seq,
            node: ROOT,
        });

        let mut best = ROOT;
        let mut best_cost = root_cost;
        let mut expanded = 0usize;
        let mut generated = 0usize;

        let termination = loop {
            if started.elapsed() >= budget {
                break SearchTermination::TimeBudget;
            }
            let Some(entry) = frontier.pop() else {
                break SearchTermination::FrontierExhausted;
            };

            let parent = nodes[entry.node];
            let depth = parent.depth + 1;
            let keep_expanding = depth < self.config.max_depth;
            expanded += 1;

            for action in ACTION_CATALOG {
                let mut state = parent.state;
                state.advance(action, checkpoints);
                let cost = cost_of(&state);
                generated += 1;

                let improves = cost < best_cost;
                if !improves && !keep_expanding {
                    continue;
                }

                let id = nodes.len();
                nodes.push(SearchNode {
                    state,
                    parent: Some(entry.node),
                    action: Some(action),
                    depth,
                });
                if improves {
                    best = id;
                    best_cost = cost;
                }
                if keep_expanding {
                    seq += 1;
                    frontier.push(FrontierEntry {
                        cost,
                        seq,
                        node: id,
                    });
                }
            }
        };

        let stats = SearchStats {
            termination,
            expanded,
            generated,
            best_depth: nodes[best].depth,
            best_cost,
            elapsed: started.elapsed(),
        };

        first_action(&nodes, best)
            .map(|action| Plan { action, stats })
            .ok_or(PlanningExhausted { stats })
    }
}

/// Walks up to the root's direct child. `None` when `id` is the root itself.
fn first_action(nodes: &[SearchNode], mut id: NodeId) -> Option<Action> {
    while nodes[id].depth > 1 {
        id = nodes[id].parent?;
    }
    nodes[id].action
}

/// Turn in place toward the goal center without thrust.
pub fn course_correction(state: &RaceState, checkpoints: &[Checkpoint]) -> Action {
    let Some(goal) = state.goal(checkpoints) else {
        return Action::IDLE;
    };
    let vehicle = &state.vehicle;
    let to_goal: Vector = goal.center - vehicle.position;
    let rotation = vehicle.facing().angle_to(to_goal).to_degrees();
    Action::clamped(rotation.round_ties_even() as i32, 0)
}

pub struct SearchController {
    id: &'static str,
    description: &'static str,
    planner: SearchPlanner,
    checkpoints: Arc<[Checkpoint]>,
}

impl SearchController {
    pub fn new(id: &'static str, description: &'static str, config: SearchConfig) -> Self {
        Self {
            id,
            description,
            planner: SearchPlanner::new(config),
            checkpoints: Arc::from(Vec::new()),
        }
    }
}

impl Controller for SearchController {
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
        match self.planner.plan(state, &self.checkpoints) {
            Ok(plan) => {
                let status = match plan.stats.termination {
                    SearchTermination::FrontierExhausted => TurnStatus::AllSearched,
                    SearchTermination::TimeBudget => TurnStatus::Planned,
                };
                Decision::new(plan.action, status)
            }
            Err(exhausted) => {
                tracing::debug!(
                    controller = self.id,
                    checkpoint_index = state.checkpoint_index,
                    expanded = exhausted.stats.expanded,
                    "{exhausted}; course correcting"
                );
                Decision::new(
                    course_correction(state, &self.checkpoints),
                    TurnStatus::CourseCorrecting,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use race_core::Vehicle;

    fn planner(time_budget_ms: u64, max_depth: u32) -> SearchPlanner {
        SearchPlanner::new(SearchConfig {
            time_budget_ms,
            max_depth,
        })
    }

    fn entry(cost: f64, seq: u64) -> FrontierEntry {
        FrontierEntry {
            cost,
            seq,
            node: seq as usize,
        }
    }

    #[test]
    fn frontier_pops_cheapest_then_oldest() {
        let mut heap = BinaryHeap::new();
        heap.push(entry(5.0, 0));
        heap.push(entry(1.0, 1));
        heap.push(entry(3.0, 2));
        heap.push(entry(1.0, 3));

        let order: Vec<u64> = std::iter::from_fn(|| heap.pop()).map(|e| e.seq).collect();
        assert_eq!(order, vec![1, 3, 2, 0]);
    }

    #[test]
    fn goal_ahead_yields_full_thrust_straight() {
        let checkpoints = [Checkpoint::new(5_000, 0)];
        let state = RaceState::new(Vehicle::new(0, 0, 0, 0, 0));

        let plan = planner(1_000, 3)
            .plan(&state, &checkpoints)
            .expect("a forward action improves distance");

        assert_eq!(plan.action, Action::new(0, 200));
        assert_eq!(plan.stats.termination, SearchTermination::FrontierExhausted);
        assert_eq!(plan.stats.best_depth, 3);
        // Three full-thrust steps from rest end at x = 1084.
        assert_eq!(plan.stats.best_cost, 3_916.0);
        assert_eq!(plan.stats.expanded, 1 + 15 + 225);
        assert_eq!(plan.stats.generated, 15 * (1 + 15 + 225));
    }

    #[test]
    fn goal_behind_is_exhausted_not_defaulted() {
        let checkpoints = [Checkpoint::new(-5_000, 0)];
        let state = RaceState::new(Vehicle::new(0, 0, 0, 0, 0));

        let shallow = planner(1_000, 1).plan(&state, &checkpoints);
        let exhausted = shallow.expect_err("every action moves away or stays put");
        assert_eq!(
            exhausted.stats.termination,
            SearchTermination::FrontierExhausted
        );
        assert_eq!(exhausted.stats.expanded, 1);
        assert_eq!(exhausted.stats.best_depth, 0);

        // Three 18-degree turns still leave the goal more than 90 degrees away.
        assert!(planner(1_000, 3).plan(&state, &checkpoints).is_err());
    }

    #[test]
    fn zero_budget_never_expands() {
        let checkpoints = [Checkpoint::new(5_000, 0)];
        let state = RaceState::new(Vehicle::new(0, 0, 0, 0, 0));

        let exhausted = planner(0, 3)
            .plan(&state, &checkpoints)
            .expect_err("no expansion happened");
        assert_eq!(exhausted.stats.termination, SearchTermination::TimeBudget);
        assert_eq!(exhausted.stats.expanded, 0);
    }

    #[test]
    fn completed_race_has_nothing_to_plan() {
        let checkpoints = [Checkpoint::new(5_000, 0)];
        let mut state = RaceState::new(Vehicle::new(0, 0, 0, 0, 0));
        state.checkpoint_index = 1;

        assert!(planner(1_000, 3).plan(&state, &checkpoints).is_err());
        assert_eq!(course_correction(&state, &checkpoints), Action::IDLE);
    }

    #[test]
    fn returns_within_budget_on_an_unbounded_tree() {
        let checkpoints = [Checkpoint::new(15_000, 8_000)];
        let state = RaceState::new(Vehicle::new(0, 0, 120, -40, 45));
        let budget = Duration::from_millis(20);

        let started = Instant::now();
        let plan = planner(20, 64)
            .plan(&state, &checkpoints)
            .expect("thrusting toward the goal improves distance");
        let elapsed = started.elapsed();

        assert_eq!(plan.stats.termination, SearchTermination::TimeBudget);
        assert!(plan.stats.expanded > 0);
        assert!(
            elapsed < budget + Duration::from_millis(200),
            "planning overshot its budget: {elapsed:?}"
        );
    }

    #[test]
    fn repeated_calls_do_not_share_state() {
        let checkpoints = [Checkpoint::new(2_000, 3_000)];
        let state = RaceState::new(Vehicle::new(100, 100, 10, 0, 30));
        let planner = planner(1_000, 3);

        let a = planner.plan(&state, &checkpoints).expect("plan");
        let b = planner.plan(&state, &checkpoints).expect("plan");
        assert_eq!(a.action, b.action);
        assert_eq!(a.stats.expanded, b.stats.expanded);
        assert_eq!(a.stats.best_cost, b.stats.best_cost);
    }

    #[test]
    fn course_correction_turns_toward_goal_without_thrust() {
        let checkpoints = [Checkpoint::new(-5_000, 10)];
        let state = RaceState::new(Vehicle::new(0, 0, 0, 0, 0));
        let action = course_correction(&state, &checkpoints);
        assert_eq!(action, Action::new(18, 0));

        let checkpoints = [Checkpoint::new(1_000, -50)];
        let action = course_correction(&state, &checkpoints);
        assert_eq!(action, Action::new(-3, 0));
    }

    #[test]
    fn controller_course_corrects_when_planning_is_exhausted() {
        let mut controller = SearchController::new(
            "test",
            "test",
            SearchConfig {
                time_budget_ms: 1_000,
                max_depth: 3,
            },
        );
        controller.read_checkpoints(Arc::from(vec![Checkpoint::new(-5_000, 0)]));
        let decision = controller.best_action(&RaceState::new(Vehicle::new(0, 0, 0, 0, 0)));

        assert_eq!(decision.status, TurnStatus::CourseCorrecting);
        assert_eq!(decision.action.thrust(), 0);
    }
}
