//! Compass directions on the generation grid.
//!
//! Eight directions spaced 45 degrees apart. To keep diagonal passages on
//! the grid, distance along a diagonal is taxicab distance rather than
//! Euclidean: moving 10 feet northeast displaces by (5, 5), so 45-degree
//! geometry always lands on the 5-foot half-grid.

use serde::{Deserialize, Serialize};
use strum::EnumIter;

use crate::geometry::Line;

/// A compass direction (cardinal or diagonal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    Northeast,
    East,
    Southeast,
    South,
    Southwest,
    West,
    Northwest,
}

/// The four axis-aligned directions, counterclockwise from east.
pub const CARDINAL: [Direction; 4] = [
    Direction::East,
    Direction::North,
    Direction::West,
    Direction::South,
];

impl Direction {
    /// Position on the compass in 45-degree steps counterclockwise from
    /// east. Fixes the angular layout used by rotation and junction faces.
    pub(crate) fn index(self) -> i32 {
        match self {
            Direction::East => 0,
            Direction::Northeast => 1,
            Direction::North => 2,
            Direction::Northwest => 3,
            Direction::West => 4,
            Direction::Southwest => 5,
            Direction::South => 6,
            Direction::Southeast => 7,
        }
    }

    pub(crate) fn from_index(index: i32) -> Direction {
        match index.rem_euclid(8) {
            0 => Direction::East,
            1 => Direction::Northeast,
            2 => Direction::North,
            3 => Direction::Northwest,
            4 => Direction::West,
            5 => Direction::Southwest,
            6 => Direction::South,
            _ => Direction::Southeast,
        }
    }

    /// Taxicab unit vector: cardinals are (±1, 0)/(0, ±1), diagonals are
    /// (±0.5, ±0.5) so a 10-foot diagonal move displaces by (5, 5).
    pub fn unit(self) -> (f64, f64) {
        match self {
            Direction::East => (1.0, 0.0),
            Direction::Northeast => (0.5, 0.5),
            Direction::North => (0.0, 1.0),
            Direction::Northwest => (-0.5, 0.5),
            Direction::West => (-1.0, 0.0),
            Direction::Southwest => (-0.5, -0.5),
            Direction::South => (0.0, -1.0),
            Direction::Southeast => (0.5, -0.5),
        }
    }

    /// Displacement after traveling `distance` taxicab feet this way.
    pub fn offset(self, distance: f64) -> (f64, f64) {
        let (ux, uy) = self.unit();
        (ux * distance, uy * distance)
    }

    /// Rotate by a multiple of 45 degrees. Positive is counterclockwise.
    pub fn rotate(self, degrees: i32) -> Direction {
        assert!(
            degrees % 45 == 0,
            "rotation must be a multiple of 45 degrees, got {degrees}"
        );
        Direction::from_index(self.index() + degrees / 45)
    }

    pub fn opposite(self) -> Direction {
        self.rotate(180)
    }

    /// Magnitude of the angle between two directions, in degrees (0..=180).
    pub fn angle_from(self, other: Direction) -> i32 {
        let diff = (self.index() - other.index()).rem_euclid(8);
        diff.min(8 - diff) * 45
    }

    pub fn is_cardinal(self) -> bool {
        matches!(
            self,
            Direction::North | Direction::East | Direction::South | Direction::West
        )
    }

    /// Classify a vector that lies along the compass (axis-aligned or at 45
    /// degrees). Returns None for the zero vector or any other slope.
    pub fn of_vector(dx: f64, dy: f64) -> Option<Direction> {
        if dx == 0.0 && dy == 0.0 {
            return None;
        }
        if dx != 0.0 && dy != 0.0 && dx.abs() != dy.abs() {
            return None;
        }
        let d = match (dx.partial_cmp(&0.0)?, dy.partial_cmp(&0.0)?) {
            (std::cmp::Ordering::Greater, std::cmp::Ordering::Equal) => Direction::East,
            (std::cmp::Ordering::Greater, std::cmp::Ordering::Greater) => Direction::Northeast,
            (std::cmp::Ordering::Equal, std::cmp::Ordering::Greater) => Direction::North,
            (std::cmp::Ordering::Less, std::cmp::Ordering::Greater) => Direction::Northwest,
            (std::cmp::Ordering::Less, std::cmp::Ordering::Equal) => Direction::West,
            (std::cmp::Ordering::Less, std::cmp::Ordering::Less) => Direction::Southwest,
            (std::cmp::Ordering::Equal, std::cmp::Ordering::Less) => Direction::South,
            (std::cmp::Ordering::Greater, std::cmp::Ordering::Less) => Direction::Southeast,
            _ => return None,
        };
        Some(d)
    }

    /// The right-hand normal of a segment: the facing of a wall whose
    /// boundary runs a→b with interior on the left. For counterclockwise
    /// polygon edges this is the outward direction.
    pub fn normal_to(line: &Line) -> Option<Direction> {
        let d = Direction::of_vector(line.b.x - line.a.x, line.b.y - line.a.y)?;
        Some(d.rotate(-90))
    }
}
