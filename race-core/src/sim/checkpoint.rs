use serde::{Deserialize, Serialize};

use crate::constants::CHECKPOINT_RADIUS_SQ;
use crate::geometry::Point;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checkpoint {
    pub center: Point,
}

impl Checkpoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self {
            center: Point::new(x, y),
        }
    }

    /// Strictly inside the goal circle; a point exactly on the rim does not count.
    #[inline]
    pub fn contains(&self, point: Point) -> bool {
        self.center.distance_squared(point) < CHECKPOINT_RADIUS_SQ
    }
}
