//! Line protocol for driving a controller turn by turn over stdin/stdout.
//!
//! ```text
//! n                              once
//! x y                            n times
//! checkpoint_index x y vx vy angle    once per turn
//! ```
//!
//! Each turn gets exactly one reply line, either `EXPERT rotation thrust [message]`
//! or the target form `x y thrust [message]`.

use core::fmt;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use clap::ValueEnum;
use race_core::constants::MAX_TURNS_DEFAULT;
use race_core::{Action, Checkpoint, Point, RaceState, Vector, Vehicle};

use crate::controllers::{Controller, Decision, TurnStatus};

/// How far ahead along the commanded heading a target-mode reply points.
pub const TARGET_DISTANCE: f64 = 10_000.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ReplyMode {
    /// Rotation and thrust directly.
    #[default]
    Expert,
    /// A point to steer toward plus thrust.
    Target,
}

#[derive(Debug)]
pub enum ProtocolError {
    UnexpectedEof {
        expected: &'static str,
    },
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },
    InvalidInteger {
        line: usize,
        token: String,
    },
    EmptyCourse,
    CheckpointIndexOutOfRange {
        index: usize,
        count: usize,
    },
    Io(io::Error),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof { expected } => {
                write!(f, "input ended while waiting for {expected}")
            }
            Self::FieldCount {
                line,
                expected,
                found,
            } => write!(
                f,
                "line {line}: expected {expected} field(s), found {found}"
            ),
            Self::InvalidInteger { line, token } => {
                write!(f, "line {line}: '{token}' is not a valid integer")
            }
            Self::EmptyCourse => write!(f, "checkpoint count must be at least 1"),
            Self::CheckpointIndexOutOfRange { index, count } => write!(
                f,
                "checkpoint index {index} is out of range for {count} checkpoint(s)"
            ),
            Self::Io(err) => write!(f, "protocol i/o failed: {err}"),
        }
    }
}

impl std::error::Error for ProtocolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ProtocolError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaySummary {
    pub turns: u32,
    pub course_correcting_turns: u32,
}

fn parse_ints<const N: usize>(line_no: usize, line: &str) -> Result<[i64; N], ProtocolError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != N {
        return Err(ProtocolError::FieldCount {
            line: line_no,
            expected: N,
            found: tokens.len(),
        });
    }
    let mut out = [0i64; N];
    for (slot, token) in out.iter_mut().zip(tokens) {
        *slot = token.parse().map_err(|_| ProtocolError::InvalidInteger {
            line: line_no,
            token: token.to_string(),
        })?;
    }
    Ok(out)
}

fn to_i32(line_no: usize, value: i64) -> Result<i32, ProtocolError> {
    i32::try_from(value).map_err(|_| ProtocolError::InvalidInteger {
        line: line_no,
        token: value.to_string(),
    })
}

pub fn parse_checkpoint_count(line_no: usize, line: &str) -> Result<usize, ProtocolError> {
    let [count] = parse_ints::<1>(line_no, line)?;
    match usize::try_from(count) {
        Ok(0) => Err(ProtocolError::EmptyCourse),
        Ok(count) => Ok(count),
        Err(_) => Err(ProtocolError::InvalidInteger {
            line: line_no,
            token: count.to_string(),
        }),
    }
}

pub fn parse_checkpoint_line(line_no: usize, line: &str) -> Result<Checkpoint, ProtocolError> {
    let [x, y] = parse_ints::<2>(line_no, line)?;
    Ok(Checkpoint::new(to_i32(line_no, x)?, to_i32(line_no, y)?))
}

/// Reads `checkpoint_index x y vx vy angle`. The index must name a live goal.
pub fn parse_turn_line(
    line_no: usize,
    line: &str,
    checkpoint_count: usize,
) -> Result<RaceState, ProtocolError> {
    let [index, x, y, vx, vy, angle] = parse_ints::<6>(line_no, line)?;
    let index = usize::try_from(index).map_err(|_| ProtocolError::InvalidInteger {
        line: line_no,
        token: index.to_string(),
    })?;
    if index >= checkpoint_count {
        return Err(ProtocolError::CheckpointIndexOutOfRange {
            index,
            count: checkpoint_count,
        });
    }

    let vehicle = Vehicle::new(
        to_i32(line_no, x)?,
        to_i32(line_no, y)?,
        to_i32(line_no, vx)?,
        to_i32(line_no, vy)?,
        to_i32(line_no, angle)?,
    );
    Ok(RaceState {
        checkpoint_index: index,
        vehicle,
    })
}

fn with_message(mut line: String, status: TurnStatus) -> String {
    let message = status.message();
    if !message.is_empty() {
        line.push(' ');
        line.push_str(message);
    }
    line
}

pub fn format_expert_line(action: Action, status: TurnStatus) -> String {
    with_message(
        format!("EXPERT {} {}", action.rotation(), action.thrust()),
        status,
    )
}

pub fn format_target_line(target: Point, thrust: i32, status: TurnStatus) -> String {
    with_message(format!("{} {} {}", target.x, target.y, thrust), status)
}

/// A point far out along the heading the vehicle will have after `action`.
pub fn target_for(vehicle: &Vehicle, action: Action) -> Point {
    let heading = Vector::from_heading(vehicle.angle + action.rotation());
    let target = vehicle.position.to_vector() + heading * TARGET_DISTANCE;
    Point::new(target.x.round() as i32, target.y.round() as i32)
}

/// Course corrections always aim at the goal center with no thrust; everything
/// else follows `mode`.
pub fn format_reply(
    mode: ReplyMode,
    state: &RaceState,
    checkpoints: &[Checkpoint],
    decision: Decision,
) -> String {
    if decision.status == TurnStatus::CourseCorrecting {
        if let Some(goal) = state.goal(checkpoints) {
            return format_target_line(goal.center, 0, decision.status);
        }
    }
    match mode {
        ReplyMode::Expert => format_expert_line(decision.action, decision.status),
        ReplyMode::Target => format_target_line(
            target_for(&state.vehicle, decision.action),
            decision.action.thrust(),
            decision.status,
        ),
    }
}

struct LineReader<R> {
    input: R,
    line_no: usize,
    buf: String,
}

impl<R: BufRead> LineReader<R> {
    fn new(input: R) -> Self {
        Self {
            input,
            line_no: 0,
            buf: String::new(),
        }
    }

    /// Next non-blank line, or `None` at end of input.
    fn next_line(&mut self) -> Result<Option<(usize, &str)>, ProtocolError> {
        loop {
            self.buf.clear();
            if self.input.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            if !self.buf.trim().is_empty() {
                return Ok(Some((self.line_no, self.buf.trim())));
            }
        }
    }

    fn expect_line(&mut self, expected: &'static str) -> Result<(usize, &str), ProtocolError> {
        self.next_line()?
            .ok_or(ProtocolError::UnexpectedEof { expected })
    }
}

/// Reads the course, then answers up to `max_turns` turn lines. End of input
/// between turns ends the game normally.
pub fn play<R: BufRead, W: Write>(
    controller: &mut dyn Controller,
    mode: ReplyMode,
    input: R,
    mut output: W,
    max_turns: u32,
) -> Result<PlaySummary, ProtocolError> {
    let mut reader = LineReader::new(input);

    let (line_no, line) = reader.expect_line("checkpoint count")?;
    let count = parse_checkpoint_count(line_no, line)?;
    let mut checkpoints = Vec::new();
    for _ in 0..count {
        let (line_no, line) = reader.expect_line("checkpoint")?;
        checkpoints.push(parse_checkpoint_line(line_no, line)?);
    }
    let checkpoints: Arc<[Checkpoint]> = checkpoints.into();
    controller.read_checkpoints(Arc::clone(&checkpoints));
    tracing::info!(
        controller = controller.id(),
        checkpoints = count,
        "course received"
    );

    let mut summary = PlaySummary::default();
    while summary.turns < max_turns {
        let Some((line_no, line)) = reader.next_line()? else {
            break;
        };
        let state = parse_turn_line(line_no, line, checkpoints.len())?;

        let decision = controller.best_action(&state);
        let reply = format_reply(mode, &state, &checkpoints, decision);
        writeln!(output, "{reply}")?;
        output.flush()?;

        summary.turns += 1;
        if decision.status == TurnStatus::CourseCorrecting {
            summary.course_correcting_turns += 1;
        }
        tracing::debug!(turn = summary.turns, %reply, "turn answered");
    }

    Ok(summary)
}

/// `play` with the standard game length.
pub fn play_default<R: BufRead, W: Write>(
    controller: &mut dyn Controller,
    mode: ReplyMode,
    input: R,
    output: W,
) -> Result<PlaySummary, ProtocolError> {
    play(controller, mode, input, output, MAX_TURNS_DEFAULT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::create_controller;

    #[test]
    fn parses_turn_lines() {
        let state = parse_turn_line(3, "1 200 -40 17 0 359", 3).expect("valid turn line");
        assert_eq!(state.checkpoint_index, 1);
        assert_eq!(state.vehicle, Vehicle::new(200, -40, 17, 0, 359));
    }

    #[test]
    fn rejects_malformed_turn_lines() {
        assert!(matches!(
            parse_turn_line(4, "1 200 -40 17 0", 3),
            Err(ProtocolError::FieldCount {
                line: 4,
                expected: 6,
                found: 5
            })
        ));
        assert!(matches!(
            parse_turn_line(4, "1 200 -40 17 zero 0", 3),
            Err(ProtocolError::InvalidInteger { line: 4, .. })
        ));
        assert!(matches!(
            parse_turn_line(4, "3 0 0 0 0 0", 3),
            Err(ProtocolError::CheckpointIndexOutOfRange { index: 3, count: 3 })
        ));
        assert!(matches!(
            parse_turn_line(4, "-1 0 0 0 0 0", 3),
            Err(ProtocolError::InvalidInteger { .. })
        ));
        assert!(matches!(
            parse_turn_line(4, "0 99999999999 0 0 0 0", 3),
            Err(ProtocolError::InvalidInteger { .. })
        ));
    }

    #[test]
    fn rejects_empty_course() {
        assert!(matches!(
            parse_checkpoint_count(1, "0"),
            Err(ProtocolError::EmptyCourse)
        ));
        assert_eq!(parse_checkpoint_count(1, " 4 ").expect("count"), 4);
    }

    #[test]
    fn formats_replies() {
        assert_eq!(
            format_expert_line(Action::new(-6, 100), TurnStatus::Planned),
            "EXPERT -6 100"
        );
        assert_eq!(
            format_expert_line(Action::new(0, 200), TurnStatus::AllSearched),
            "EXPERT 0 200 ALL SEARCHED"
        );
        assert_eq!(
            format_target_line(Point::new(8000, 4500), 0, TurnStatus::CourseCorrecting),
            "8000 4500 0 COURSE CORRECTING"
        );
    }

    #[test]
    fn target_points_along_the_commanded_heading() {
        let vehicle = Vehicle::new(100, 200, 0, 0, 72);
        let target = target_for(&vehicle, Action::new(18, 50));
        assert_eq!(target, Point::new(100, 10_200));
    }

    #[test]
    fn course_correction_replies_with_the_goal_center() {
        let checkpoints = [Checkpoint::new(-5_000, 0)];
        let state = RaceState::new(Vehicle::new(0, 0, 0, 0, 0));
        let decision = Decision::new(Action::new(18, 0), TurnStatus::CourseCorrecting);
        assert_eq!(
            format_reply(ReplyMode::Expert, &state, &checkpoints, decision),
            "-5000 0 0 COURSE CORRECTING"
        );
    }

    #[test]
    fn plays_until_input_ends() {
        let input = "2\n1000 0\n5000 0\n0 0 0 0 0 0\n0 200 0 170 0 0\n";
        let mut output = Vec::new();
        let mut controller = create_controller("steering").expect("steering exists");

        let summary = play_default(
            controller.as_mut(),
            ReplyMode::Expert,
            input.as_bytes(),
            &mut output,
        )
        .expect("play succeeds");

        assert_eq!(summary.turns, 2);
        let text = String::from_utf8(output).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "EXPERT 0 200");
        assert!(lines[1].starts_with("EXPERT "));
    }

    #[test]
    fn stops_at_the_turn_limit() {
        let input = "1\n1000 0\n0 0 0 0 0 0\n0 0 0 0 0 0\n0 0 0 0 0 0\n";
        let mut output = Vec::new();
        let mut controller = create_controller("steering").expect("steering exists");

        let summary = play(
            controller.as_mut(),
            ReplyMode::Target,
            input.as_bytes(),
            &mut output,
            2,
        )
        .expect("play succeeds");

        assert_eq!(summary.turns, 2);
        let text = String::from_utf8(output).expect("utf8");
        assert_eq!(text, "10000 0 200\n10000 0 200\n");
    }

    #[test]
    fn truncated_course_is_an_error() {
        let mut output = Vec::new();
        let mut controller = create_controller("steering").expect("steering exists");
        let err = play_default(
            controller.as_mut(),
            ReplyMode::Expert,
            "3\n1 1\n".as_bytes(),
            &mut output,
        )
        .expect_err("course is truncated");
        assert!(matches!(
            err,
            ProtocolError::UnexpectedEof {
                expected: "checkpoint"
            }
        ));
        assert!(output.is_empty());
    }

    #[test]
    fn huge_checkpoint_count_runs_out_of_input() {
        let mut output = Vec::new();
        let mut controller = create_controller("steering").expect("steering exists");
        let input = "9223372036854775807\n1 1\n";
        let err = play_default(
            controller.as_mut(),
            ReplyMode::Expert,
            input.as_bytes(),
            &mut output,
        )
        .expect_err("course is truncated");
        assert!(matches!(
            err,
            ProtocolError::UnexpectedEof {
                expected: "checkpoint"
            }
        ));
    }
}
