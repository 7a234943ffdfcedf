use serde::Serialize;

use crate::constants::{CATALOG_ROTATIONS, CATALOG_THRUSTS, MAX_ROTATION, MAX_THRUST};
use crate::error::ActionError;

/// A steering command: degrees to turn this step, then thrust along the new heading.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Action {
    rotation: i32,
    thrust: i32,
}

impl Action {
    pub const IDLE: Action = Action::raw(0, 0);

    /// # Panics
    ///
    /// Panics when `rotation` or `thrust` is outside the control bounds. Use
    /// [`Action::try_new`] for values that come from outside the program.
    pub fn new(rotation: i32, thrust: i32) -> Self {
        match Self::try_new(rotation, thrust) {
            Ok(action) => action,
            Err(err) => panic!("invalid action: {err}"),
        }
    }

    pub fn try_new(rotation: i32, thrust: i32) -> Result<Self, ActionError> {
        if !(-MAX_ROTATION..=MAX_ROTATION).contains(&rotation) {
            return Err(ActionError::RotationOutOfRange { rotation });
        }
        if !(0..=MAX_THRUST).contains(&thrust) {
            return Err(ActionError::ThrustOutOfRange { thrust });
        }
        Ok(Self::raw(rotation, thrust))
    }

    /// Clamps arbitrary values into the control bounds.
    pub fn clamped(rotation: i32, thrust: i32) -> Self {
        Self::raw(
            rotation.clamp(-MAX_ROTATION, MAX_ROTATION),
            thrust.clamp(0, MAX_THRUST),
        )
    }

    const fn raw(rotation: i32, thrust: i32) -> Self {
        Self { rotation, thrust }
    }

    #[inline]
    pub fn rotation(self) -> i32 {
        self.rotation
    }

    #[inline]
    pub fn thrust(self) -> i32 {
        self.thrust
    }
}

pub const CATALOG_SIZE: usize = CATALOG_ROTATIONS.len() * CATALOG_THRUSTS.len();

/// Every rotation paired with every thrust level, rotation-major.
pub const ACTION_CATALOG: [Action; CATALOG_SIZE] = build_catalog();

const fn build_catalog() -> [Action; CATALOG_SIZE] {
    let mut catalog = [Action::IDLE; CATALOG_SIZE];
    let mut i = 0;
    while i < CATALOG_ROTATIONS.len() {
        let mut j = 0;
        while j < CATALOG_THRUSTS.len() {
            catalog[i * CATALOG_THRUSTS.len() + j] =
                Action::raw(CATALOG_ROTATIONS[i], CATALOG_THRUSTS[j]);
            j += 1;
        }
        i += 1;
    }
    catalog
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_full_cross_product_within_bounds() {
        assert_eq!(ACTION_CATALOG.len(), 15);
        for action in ACTION_CATALOG {
            assert!(Action::try_new(action.rotation(), action.thrust()).is_ok());
        }
        assert_eq!(ACTION_CATALOG[0], Action::new(-18, 0));
        assert_eq!(ACTION_CATALOG[2], Action::new(-18, 200));
        assert_eq!(ACTION_CATALOG[7], Action::new(0, 100));
        assert_eq!(ACTION_CATALOG[14], Action::new(18, 200));
    }

    #[test]
    fn try_new_rejects_out_of_range_values() {
        assert_eq!(
            Action::try_new(19, 0),
            Err(ActionError::RotationOutOfRange { rotation: 19 })
        );
        assert_eq!(
            Action::try_new(-19, 0),
            Err(ActionError::RotationOutOfRange { rotation: -19 })
        );
        assert_eq!(
            Action::try_new(0, 201),
            Err(ActionError::ThrustOutOfRange { thrust: 201 })
        );
        assert_eq!(
            Action::try_new(0, -1),
            Err(ActionError::ThrustOutOfRange { thrust: -1 })
        );
        assert!(Action::try_new(-18, 200).is_ok());
    }

    #[test]
    #[should_panic(expected = "invalid action")]
    fn new_fails_fast_on_bad_rotation() {
        let _ = Action::new(45, 100);
    }

    #[test]
    fn clamped_saturates_both_fields() {
        assert_eq!(Action::clamped(90, 999), Action::new(18, 200));
        assert_eq!(Action::clamped(-90, -5), Action::new(-18, 0));
        assert_eq!(Action::clamped(3, 50), Action::new(3, 50));
    }
}
