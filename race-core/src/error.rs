use std::fmt;

use crate::constants::{MAX_COURSE_LEN, MAX_ROTATION, MAX_THRUST};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionError {
    RotationOutOfRange { rotation: i32 },
    ThrustOutOfRange { thrust: i32 },
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RotationOutOfRange { rotation } => write!(
                f,
                "rotation out of range: {rotation} (allowed -{MAX_ROTATION}..={MAX_ROTATION})"
            ),
            Self::ThrustOutOfRange { thrust } => {
                write!(f, "thrust out of range: {thrust} (allowed 0..={MAX_THRUST})")
            }
        }
    }
}

impl std::error::Error for ActionError {}

/// Scenario text did not match `x y vx vy angle` / `count laps` / `count` x `x y`.
///
/// Line numbers are 1-based.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScenarioError {
    MissingLine { line: usize },
    FieldCount { line: usize, expected: usize, found: usize },
    InvalidInteger { line: usize, token: String },
    InvalidAngle { angle: i32 },
    EmptyCourse { checkpoints: usize, laps: usize },
    CheckpointCountMismatch { declared: usize, actual: usize },
    CourseTooLong { checkpoints: usize, laps: usize },
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingLine { line } => write!(f, "scenario truncated: line {line} missing"),
            Self::FieldCount {
                line,
                expected,
                found,
            } => write!(
                f,
                "line {line}: expected {expected} integer fields, got {found}"
            ),
            Self::InvalidInteger { line, token } => {
                write!(f, "line {line}: invalid integer '{token}'")
            }
            Self::InvalidAngle { angle } => {
                write!(f, "initial angle out of range: {angle} (allowed 0..360)")
            }
            Self::EmptyCourse { checkpoints, laps } => write!(
                f,
                "empty course: {checkpoints} checkpoint(s) x {laps} lap(s)"
            ),
            Self::CheckpointCountMismatch { declared, actual } => write!(
                f,
                "checkpoint count mismatch: declared={declared}, actual={actual}"
            ),
            Self::CourseTooLong { checkpoints, laps } => write!(
                f,
                "course of {checkpoints} checkpoint(s) x {laps} lap(s) exceeds {MAX_COURSE_LEN}"
            ),
        }
    }
}

impl std::error::Error for ScenarioError {}
