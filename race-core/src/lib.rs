pub mod action;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod scenario;
pub mod sim;

pub use action::{Action, ACTION_CATALOG};
pub use error::{ActionError, ScenarioError};
pub use geometry::{Point, Vector};
pub use scenario::{parse_scenario, Scenario};
pub use sim::{Checkpoint, Race, RaceState, Vehicle};
