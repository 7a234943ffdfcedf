pub mod search;
pub mod steering;

use race_core::{Action, Checkpoint, RaceState};
use serde::Serialize;
use std::sync::Arc;

use crate::config::{ControllerOptions, DEFAULT_MAX_DEPTH, DEFAULT_TIME_BUDGET_MS};
use search::{SearchConfig, SearchController};
use steering::{SteeringConfig, SteeringController};

/// Anything that can drive the car one turn at a time.
pub trait Controller {
    fn id(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// Called once before a race with the full lap-expanded course.
    fn read_checkpoints(&mut self, checkpoints: Arc<[Checkpoint]>);
    fn best_action(&mut self, state: &RaceState) -> Decision;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub action: Action,
    pub status: TurnStatus,
}

impl Decision {
    pub fn new(action: Action, status: TurnStatus) -> Self {
        Self { action, status }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    /// Search stopped on the clock with a usable first action.
    Planned,
    /// Search expanded every node up to its depth limit.
    AllSearched,
    /// Search found nothing better than standing still; turning toward the goal.
    CourseCorrecting,
    Steering,
}

impl TurnStatus {
    pub fn message(self) -> &'static str {
        match self {
            Self::Planned | Self::Steering => "",
            Self::AllSearched => "ALL SEARCHED",
            Self::CourseCorrecting => "COURSE CORRECTING",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ControllerManifestEntry {
    pub id: String,
    pub family: String,
    pub description: String,
    pub config_hash: String,
    pub config: serde_json::Value,
}

#[derive(Clone, Copy, Serialize)]
pub(crate) struct SearchProfile {
    pub(crate) id: &'static str,
    pub(crate) description: &'static str,
    pub(crate) search: SearchConfig,
}

#[derive(Clone, Copy, Serialize)]
pub(crate) struct SteeringProfile {
    pub(crate) id: &'static str,
    pub(crate) description: &'static str,
    pub(crate) steering: SteeringConfig,
}

pub(crate) fn search_profiles() -> &'static [SearchProfile] {
    &[
        SearchProfile {
            id: "best-first",
            description: "Anytime best-first search, three-step horizon, 50ms per turn.",
            search: SearchConfig {
                time_budget_ms: DEFAULT_TIME_BUDGET_MS,
                max_depth: DEFAULT_MAX_DEPTH,
            },
        },
        SearchProfile {
            id: "best-first-deep",
            description: "Anytime best-first search, five-step horizon, 50ms per turn.",
            search: SearchConfig {
                time_budget_ms: DEFAULT_TIME_BUDGET_MS,
                max_depth: 5,
            },
        },
    ]
}

pub(crate) fn steering_profiles() -> &'static [SteeringProfile] {
    &[SteeringProfile {
        id: "steering",
        description: "Direct steering with velocity braking and next-gate blending.",
        steering: SteeringConfig {
            arrival_lookahead: 3,
            next_gate_blend: 0.80,
            brake_factor: 4.0,
            min_thrust_cosine: 0.6,
        },
    }]
}

pub fn controller_ids() -> Vec<&'static str> {
    search_profiles()
        .iter()
        .map(|p| p.id)
        .chain(steering_profiles().iter().map(|p| p.id))
        .collect()
}

pub fn describe_controllers() -> Vec<(&'static str, &'static str)> {
    search_profiles()
        .iter()
        .map(|p| (p.id, p.description))
        .chain(steering_profiles().iter().map(|p| (p.id, p.description)))
        .collect()
}

pub fn create_controller(id: &str) -> Option<Box<dyn Controller>> {
    create_controller_with(id, &ControllerOptions::default())
}

pub fn create_controller_with(
    id: &str,
    options: &ControllerOptions,
) -> Option<Box<dyn Controller>> {
    if let Some(profile) = search_profiles().iter().find(|p| p.id == id) {
        let mut search = profile.search;
        if let Some(budget) = options.time_budget_ms {
            search.time_budget_ms = budget;
        }
        if let Some(depth) = options.max_depth {
            search.max_depth = depth;
        }
        return Some(Box::new(SearchController::new(
            profile.id,
            profile.description,
            search,
        )));
    }

    steering_profiles()
        .iter()
        .find(|p| p.id == id)
        .map(|profile| {
            Box::new(SteeringController::new(
                profile.id,
                profile.description,
                profile.steering,
            )) as Box<dyn Controller>
        })
}

pub fn controller_manifest_entries() -> Vec<ControllerManifestEntry> {
    let mut out = Vec::new();

    for profile in search_profiles() {
        let config = serde_json::to_value(profile.search)
            .expect("search config should serialize");
        out.push(ControllerManifestEntry {
            id: profile.id.to_string(),
            family: "search".to_string(),
            description: profile.description.to_string(),
            config_hash: hash_json(&config),
            config,
        });
    }

    for profile in steering_profiles() {
        let config = serde_json::to_value(profile.steering)
            .expect("steering config should serialize");
        out.push(ControllerManifestEntry {
            id: profile.id.to_string(),
            family: "steering".to_string(),
            description: profile.description.to_string(),
            config_hash: hash_json(&config),
            config,
        });
    }

    out
}

pub fn controller_fingerprint(id: &str) -> Option<String> {
    controller_manifest_entries()
        .into_iter()
        .find(|entry| entry.id == id)
        .map(|entry| entry.config_hash)
}

fn hash_json(value: &serde_json::Value) -> String {
    let encoded =
        serde_json::to_vec(value).expect("serializing controller config should not fail");
    let digest = encoded.iter().fold(0xCBF2_9CE4_8422_2325u64, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(0x0000_0100_0000_01B3)
    });
    format!("fnv1a:{digest:016x}:len:{}", encoded.len())
}
