use serde::{Deserialize, Serialize};

/// Continuous position on a map, in road-grid units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub vx: f64,
    pub vy: f64,
}

impl Velocity {
    pub const ZERO: Velocity = Velocity { vx: 0.0, vy: 0.0 };

    pub fn is_zero(&self) -> bool {
        self.vx == 0.0 && self.vy == 0.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    South,
    West,
    East,
}

impl Direction {
    /// One-letter code used by the client protocol and the state file.
    pub fn as_code(&self) -> &'static str {
        match self {
            Self::North => "U",
            Self::South => "D",
            Self::West => "L",
            Self::East => "R",
        }
    }

    pub fn parse_code(value: &str) -> Option<Self> {
        match value {
            "U" => Some(Self::North),
            "D" => Some(Self::South),
            "L" => Some(Self::West),
            "R" => Some(Self::East),
            _ => None,
        }
    }

    /// Velocity vector for a dog moving this way at the given speed.
    /// North is negative y, matching the map coordinate system.
    pub fn velocity(&self, speed: f64) -> Velocity {
        match self {
            Self::North => Velocity { vx: 0.0, vy: -speed },
            Self::South => Velocity { vx: 0.0, vy: speed },
            Self::West => Velocity { vx: -speed, vy: 0.0 },
            Self::East => Velocity { vx: speed, vy: 0.0 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_codes_round_trip() {
        for dir in [
            Direction::North,
            Direction::South,
            Direction::West,
            Direction::East,
        ] {
            assert_eq!(Direction::parse_code(dir.as_code()), Some(dir));
        }
        assert_eq!(Direction::parse_code("X"), None);
    }

    #[test]
    fn velocity_follows_screen_axes() {
        let v = Direction::North.velocity(2.0);
        assert_eq!(v, Velocity { vx: 0.0, vy: -2.0 });
        let v = Direction::East.velocity(2.0);
        assert_eq!(v, Velocity { vx: 2.0, vy: 0.0 });
    }
}
