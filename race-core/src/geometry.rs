//! Integer points and floating-point vectors.
//!
//! Positions stay on the integer grid the physics truncates to; anything derived
//! from them (directions, blended targets, facing) is a `Vector`.

use core::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Exact squared distance; widened so course-scale coordinates cannot overflow.
    #[inline]
    pub fn distance_squared(self, other: Point) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        dx * dx + dy * dy
    }

    #[inline]
    pub fn distance(self, other: Point) -> f64 {
        (self.distance_squared(other) as f64).sqrt()
    }

    #[inline]
    pub fn to_vector(self) -> Vector {
        Vector::new(f64::from(self.x), f64::from(self.y))
    }
}

impl Sub for Point {
    type Output = Vector;

    fn sub(self, rhs: Point) -> Vector {
        Vector::new(
            f64::from(self.x) - f64::from(rhs.x),
            f64::from(self.y) - f64::from(rhs.y),
        )
    }
}

impl Add for Point {
    type Output = Vector;

    fn add(self, rhs: Point) -> Vector {
        Vector::new(
            f64::from(self.x) + f64::from(rhs.x),
            f64::from(self.y) + f64::from(rhs.y),
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
}

impl Vector {
    pub const ZERO: Vector = Vector { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector for an integer degree heading.
    pub fn from_heading(degrees: i32) -> Self {
        let rad = f64::from(degrees).to_radians();
        Self::new(rad.cos(), rad.sin())
    }

    #[inline]
    pub fn scale(self, k: f64) -> Self {
        Self::new(self.x * k, self.y * k)
    }

    #[inline]
    pub fn dot(self, other: Vector) -> f64 {
        self.x * other.x + self.y * other.y
    }

    #[inline]
    pub fn cross(self, other: Vector) -> f64 {
        self.x * other.y - self.y * other.x
    }

    #[inline]
    pub fn norm_squared(self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    #[inline]
    pub fn norm(self) -> f64 {
        self.norm_squared().sqrt()
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// Signed angle in radians from `self` to `other`, in (-pi, pi].
    /// Zero when either vector has no length.
    pub fn angle_to(self, other: Vector) -> f64 {
        if self.is_zero() || other.is_zero() {
            return 0.0;
        }
        self.cross(other).atan2(self.dot(other))
    }

    pub fn cos_angle(self, other: Vector) -> f64 {
        match self.norm_product(other) {
            Some(den) => self.dot(other) / den,
            None => 0.0,
        }
    }

    pub fn sin_angle(self, other: Vector) -> f64 {
        match self.norm_product(other) {
            Some(den) => self.cross(other) / den,
            None => 0.0,
        }
    }

    fn norm_product(self, other: Vector) -> Option<f64> {
        let a2 = self.norm_squared();
        let b2 = other.norm_squared();
        if a2 == 0.0 || b2 == 0.0 {
            return None;
        }
        Some((a2 * b2).sqrt())
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, rhs: Vector) -> Vector {
        Vector::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vector {
    fn add_assign(&mut self, rhs: Vector) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vector {
    type Output = Vector;

    fn sub(self, rhs: Vector) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vector {
    fn sub_assign(&mut self, rhs: Vector) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Neg for Vector {
    type Output = Vector;

    fn neg(self) -> Vector {
        Vector::new(-self.x, -self.y)
    }
}

impl Mul<f64> for Vector {
    type Output = Vector;

    fn mul(self, k: f64) -> Vector {
        self.scale(k)
    }
}

impl Mul<Vector> for f64 {
    type Output = Vector;

    fn mul(self, v: Vector) -> Vector {
        v.scale(self)
    }
}
