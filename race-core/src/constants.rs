// Control bounds accepted by the live controller.
pub const MAX_ROTATION: i32 = 18;
pub const MAX_THRUST: i32 = 200;

// Planner action catalog.
pub const CATALOG_ROTATIONS: [i32; 5] = [-18, -6, 0, 6, 18];
pub const CATALOG_THRUSTS: [i32; 3] = [0, 100, 200];

pub const FRICTION: f64 = 0.85;

pub const CHECKPOINT_RADIUS: i32 = 600;
pub const CHECKPOINT_RADIUS_SQ: i64 = (CHECKPOINT_RADIUS as i64) * (CHECKPOINT_RADIUS as i64);

pub const FULL_TURN_DEGREES: i32 = 360;

pub const MAX_TURNS_DEFAULT: u32 = 600;

// Checkpoints times laps.
pub const MAX_COURSE_LEN: usize = 10_000;
