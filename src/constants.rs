/// Half of the walkable corridor around a road centerline.
pub const ROAD_HALF_WIDTH: f64 = 0.4;

/// Tolerance for boundary comparisons in the movement solver.
pub const COORD_EPSILON: f64 = 1e-6;

/// Diameter of the area in which a dog picks up loot.
pub const DOG_PICKUP_LENGTH: f64 = 0.6;

/// Collision width of an office deposit area.
pub const OFFICE_WIDTH: f64 = 0.5;

pub const DEFAULT_DOG_SPEED: f64 = 1.0;
pub const DEFAULT_BAG_CAPACITY: usize = 3;
pub const DEFAULT_RETIREMENT_TIME_SEC: f64 = 60.0;

pub const DEFAULT_LOOT_PERIOD_SEC: f64 = 5.0;
pub const DEFAULT_LOOT_PROBABILITY: f64 = 0.5;
