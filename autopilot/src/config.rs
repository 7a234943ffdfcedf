use std::env;

use race_core::constants::MAX_TURNS_DEFAULT;
use tracing_subscriber::filter::EnvFilter;

pub const DEFAULT_TIME_BUDGET_MS: u64 = 50;
pub const DEFAULT_MAX_DEPTH: u32 = 3;

pub const ENV_TIME_BUDGET_MS: &str = "AUTOPILOT_TIME_BUDGET_MS";
pub const ENV_MAX_DEPTH: &str = "AUTOPILOT_MAX_DEPTH";
pub const ENV_MAX_TURNS: &str = "AUTOPILOT_MAX_TURNS";

pub const DEFAULT_LOG_FILTER: &str = "info";

/// Overrides applied on top of a roster profile. `None` keeps the profile value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ControllerOptions {
    pub time_budget_ms: Option<u64>,
    pub max_depth: Option<u32>,
}

impl ControllerOptions {
    pub fn from_env() -> Self {
        Self {
            time_budget_ms: read_env_optional_u64(ENV_TIME_BUDGET_MS),
            max_depth: read_env_optional_u32(ENV_MAX_DEPTH),
        }
    }

    /// CLI flags win over the environment.
    pub fn merged(self, time_budget_ms: Option<u64>, max_depth: Option<u32>) -> Self {
        Self {
            time_budget_ms: time_budget_ms.or(self.time_budget_ms),
            max_depth: max_depth.or(self.max_depth),
        }
    }
}

/// `RUST_LOG`-style directives, falling back to `info` when unset or unparsable.
pub fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

pub fn log_filter_from_env() -> EnvFilter {
    log_filter(env::var(EnvFilter::DEFAULT_ENV).ok().as_deref())
}

pub fn default_max_turns() -> u32 {
    read_env_u32(ENV_MAX_TURNS, MAX_TURNS_DEFAULT)
}

pub(crate) fn read_env_u32(name: &str, default: u32) -> u32 {
    read_env_optional_u32(name).unwrap_or(default)
}

pub(crate) fn read_env_optional_u64(name: &str) -> Option<u64> {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
}

pub(crate) fn read_env_optional_u32(name: &str) -> Option<u32> {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|value| *value > 0)
}
