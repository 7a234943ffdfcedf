//! Text scenarios:
//!
//! ```text
//! x y vx vy angle
//! checkpoint_count lap_count
//! x y            (checkpoint_count lines)
//! ```

use core::fmt::Write as _;
use core::str::FromStr;

use serde::Serialize;

use crate::constants::{FULL_TURN_DEGREES, MAX_COURSE_LEN};
use crate::error::ScenarioError;
use crate::sim::{Checkpoint, Vehicle};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Scenario {
    pub vehicle: Vehicle,
    /// One lap; see [`Scenario::course`] for the full race.
    pub checkpoints: Vec<Checkpoint>,
    pub laps: usize,
}

impl Scenario {
    pub fn new(
        vehicle: Vehicle,
        checkpoints: Vec<Checkpoint>,
        laps: usize,
    ) -> Result<Self, ScenarioError> {
        if checkpoints.is_empty() || laps == 0 {
            return Err(ScenarioError::EmptyCourse {
                checkpoints: checkpoints.len(),
                laps,
            });
        }
        let too_long = checkpoints
            .len()
            .checked_mul(laps)
            .map_or(true, |len| len > MAX_COURSE_LEN);
        if too_long {
            return Err(ScenarioError::CourseTooLong {
                checkpoints: checkpoints.len(),
                laps,
            });
        }
        Ok(Self {
            vehicle,
            checkpoints,
            laps,
        })
    }

    /// The base checkpoint list repeated once per lap.
    pub fn course(&self) -> Vec<Checkpoint> {
        self.checkpoints.repeat(self.laps)
    }

    pub fn course_len(&self) -> usize {
        self.checkpoints.len() * self.laps
    }

    pub fn to_text(&self) -> String {
        let v = &self.vehicle;
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = writeln!(
            out,
            "{} {} {} {} {}",
            v.position.x, v.position.y, v.vx, v.vy, v.angle
        );
        let _ = writeln!(out, "{} {}", self.checkpoints.len(), self.laps);
        for cp in &self.checkpoints {
            let _ = writeln!(out, "{} {}", cp.center.x, cp.center.y);
        }
        out
    }
}

impl FromStr for Scenario {
    type Err = ScenarioError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        parse_scenario(text)
    }
}

pub fn parse_scenario(text: &str) -> Result<Scenario, ScenarioError> {
    let mut lines = text.trim_end().lines().enumerate().map(|(i, line)| (i + 1, line));

    let (line_no, line) = lines.next().ok_or(ScenarioError::MissingLine { line: 1 })?;
    let [x, y, vx, vy, angle] = parse_fields::<i32, 5>(line_no, line)?;
    if !(0..FULL_TURN_DEGREES).contains(&angle) {
        return Err(ScenarioError::InvalidAngle { angle });
    }
    let vehicle = Vehicle::new(x, y, vx, vy, angle);

    let (line_no, line) = lines.next().ok_or(ScenarioError::MissingLine { line: 2 })?;
    let [declared, laps] = parse_fields::<usize, 2>(line_no, line)?;

    // The declared count is untrusted; the mismatch check below rejects it.
    let mut checkpoints = Vec::new();
    for (line_no, line) in lines {
        let [cx, cy] = parse_fields::<i32, 2>(line_no, line)?;
        checkpoints.push(Checkpoint::new(cx, cy));
    }

    if checkpoints.len() != declared {
        return Err(ScenarioError::CheckpointCountMismatch {
            declared,
            actual: checkpoints.len(),
        });
    }

    Scenario::new(vehicle, checkpoints, laps)
}

fn parse_fields<T: FromStr + Copy + Default, const N: usize>(
    line_no: usize,
    line: &str,
) -> Result<[T; N], ScenarioError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != N {
        return Err(ScenarioError::FieldCount {
            line: line_no,
            expected: N,
            found: tokens.len(),
        });
    }

    let mut out = [T::default(); N];
    for (slot, token) in out.iter_mut().zip(tokens) {
        *slot = token.parse().map_err(|_| ScenarioError::InvalidInteger {
            line: line_no,
            token: token.to_string(),
        })?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    const LOOP: &str = "1000 4000 0 0 0\n3 2\n8000 4500\n12000 1500\n3000 7000\n";

    #[test]
    fn parses_vehicle_and_expands_laps() {
        let scenario = parse_scenario(LOOP).expect("scenario should parse");
        assert_eq!(scenario.vehicle, Vehicle::new(1000, 4000, 0, 0, 0));
        assert_eq!(scenario.laps, 2);
        assert_eq!(scenario.checkpoints.len(), 3);

        let course = scenario.course();
        assert_eq!(course.len(), 6);
        assert_eq!(course.len(), scenario.course_len());
        assert_eq!(course[3].center, Point::new(8000, 4500));
        assert_eq!(course[5].center, Point::new(3000, 7000));
    }

    #[test]
    fn to_text_reproduces_the_input() {
        let scenario: Scenario = LOOP.parse().expect("scenario should parse");
        assert_eq!(scenario.to_text(), LOOP);

        let negative = "-15 20 -300 150 359\n1 1\n-7000 -1\n";
        let scenario = parse_scenario(negative).expect("scenario should parse");
        assert_eq!(scenario.to_text(), negative);
    }

    #[test]
    fn tolerates_crlf_and_trailing_blank_lines() {
        let text = "0 0 0 0 0\r\n1 1\r\n1000 0\r\n\r\n\n";
        let scenario = parse_scenario(text).expect("scenario should parse");
        assert_eq!(scenario.checkpoints, vec![Checkpoint::new(1000, 0)]);
    }

    #[test]
    fn reports_missing_lines() {
        assert_eq!(parse_scenario(""), Err(ScenarioError::MissingLine { line: 1 }));
        assert_eq!(
            parse_scenario("0 0 0 0 0\n"),
            Err(ScenarioError::MissingLine { line: 2 })
        );
    }

    #[test]
    fn reports_field_shape_errors() {
        assert_eq!(
            parse_scenario("0 0 0 0\n1 1\n5 5\n"),
            Err(ScenarioError::FieldCount {
                line: 1,
                expected: 5,
                found: 4
            })
        );
        assert_eq!(
            parse_scenario("0 0 0 0 0\n1 1\n5 5 5\n"),
            Err(ScenarioError::FieldCount {
                line: 3,
                expected: 2,
                found: 3
            })
        );
        assert_eq!(
            parse_scenario("0 0 0 0 0\n1 x\n5 5\n"),
            Err(ScenarioError::InvalidInteger {
                line: 2,
                token: "x".to_string()
            })
        );
        assert_eq!(
            parse_scenario("0 0 0.5 0 0\n1 1\n5 5\n"),
            Err(ScenarioError::InvalidInteger {
                line: 1,
                token: "0.5".to_string()
            })
        );
    }

    #[test]
    fn reports_count_mismatch_both_ways() {
        assert_eq!(
            parse_scenario("0 0 0 0 0\n3 1\n5 5\n6 6\n"),
            Err(ScenarioError::CheckpointCountMismatch {
                declared: 3,
                actual: 2
            })
        );
        assert_eq!(
            parse_scenario("0 0 0 0 0\n1 1\n5 5\n6 6\n"),
            Err(ScenarioError::CheckpointCountMismatch {
                declared: 1,
                actual: 2
            })
        );
    }

    #[test]
    fn rejects_empty_courses_and_bad_headings() {
        assert_eq!(
            parse_scenario("0 0 0 0 0\n1 0\n5 5\n"),
            Err(ScenarioError::EmptyCourse {
                checkpoints: 1,
                laps: 0
            })
        );
        assert_eq!(
            parse_scenario("0 0 0 0 0\n0 3\n"),
            Err(ScenarioError::EmptyCourse {
                checkpoints: 0,
                laps: 3
            })
        );
        assert_eq!(
            parse_scenario("0 0 0 0 360\n1 1\n5 5\n"),
            Err(ScenarioError::InvalidAngle { angle: 360 })
        );
    }

    #[test]
    fn huge_declared_count_is_a_mismatch() {
        assert_eq!(
            parse_scenario("0 0 0 0 0\n18446744073709551615 1\n5 5\n"),
            Err(ScenarioError::CheckpointCountMismatch {
                declared: usize::MAX,
                actual: 1
            })
        );
    }

    #[test]
    fn rejects_courses_that_cannot_be_expanded() {
        assert_eq!(
            parse_scenario("0 0 0 0 0\n2 18446744073709551615\n5 5\n6 6\n"),
            Err(ScenarioError::CourseTooLong {
                checkpoints: 2,
                laps: usize::MAX
            })
        );
        let two = vec![Checkpoint::new(5, 5), Checkpoint::new(6, 6)];
        let vehicle = Vehicle::new(0, 0, 0, 0, 0);
        assert!(Scenario::new(vehicle, two.clone(), MAX_COURSE_LEN / 2).is_ok());
        assert_eq!(
            Scenario::new(vehicle, two, MAX_COURSE_LEN / 2 + 1),
            Err(ScenarioError::CourseTooLong {
                checkpoints: 2,
                laps: MAX_COURSE_LEN / 2 + 1
            })
        );
    }
}
