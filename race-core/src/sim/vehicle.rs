use core::fmt;
use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::constants::{FRICTION, FULL_TURN_DEGREES};
use crate::geometry::{Point, Vector};

/// Kinematic state of the car. Velocity is integral between steps; `angle` is a
/// degree heading in `[0, 360)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vehicle {
    pub position: Point,
    pub vx: i32,
    pub vy: i32,
    pub angle: i32,
}

impl Vehicle {
    pub fn new(x: i32, y: i32, vx: i32, vy: i32, angle: i32) -> Self {
        Self {
            position: Point::new(x, y),
            vx,
            vy,
            angle: angle.rem_euclid(FULL_TURN_DEGREES),
        }
    }

    #[inline]
    pub fn velocity(&self) -> Vector {
        Vector::new(f64::from(self.vx), f64::from(self.vy))
    }

    #[inline]
    pub fn facing(&self) -> Vector {
        Vector::from_heading(self.angle)
    }

    /// State after one step under `action`; `self` is untouched.
    #[inline]
    pub fn advance(&self, action: Action) -> Vehicle {
        let mut next = *self;
        next.apply(action);
        next
    }

    /// One physics step in place: rotate, accelerate, displace, friction.
    ///
    /// Displacement uses the pre-friction velocity. Position and the post-friction
    /// velocity are both truncated toward zero, which is what `as i32` does.
    pub fn apply(&mut self, action: Action) {
        self.angle = (self.angle + action.rotation()).rem_euclid(FULL_TURN_DEGREES);

        let rad = f64::from(self.angle).to_radians();
        let thrust = f64::from(action.thrust());
        let vx = f64::from(self.vx) + rad.cos() * thrust;
        let vy = f64::from(self.vy) + rad.sin() * thrust;

        self.position.x = (f64::from(self.position.x) + vx) as i32;
        self.position.y = (f64::from(self.position.y) + vy) as i32;

        self.vx = (vx * FRICTION) as i32;
        self.vy = (vy * FRICTION) as i32;
    }
}

impl fmt::Display for Vehicle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Vehicle(({}, {}), ({}, {}), {})",
            self.position.x, self.position.y, self.vx, self.vy, self.angle
        )
    }
}
