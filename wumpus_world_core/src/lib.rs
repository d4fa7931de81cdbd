use std::{fmt, ops::Sub};

use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator};

pub mod agent;
pub mod controller;
pub mod episode;
pub mod maze;
pub mod world;

/// Represents a 2D coordinate in the maze.
///
/// Coordinates are unbounded; the maze frame is drawn with walls rather than
/// by limiting the coordinate range. `y` grows towards the south.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
}

impl Coordinate {
    pub const fn new(x: i32, y: i32) -> Self {
        Coordinate { x, y }
    }

    /// Returns the adjacent coordinate in the given direction.
    #[inline]
    pub fn step(self, direction: Direction) -> Coordinate {
        let (dx, dy) = direction.offset();
        Coordinate {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Returns this coordinate relative to `origin`.
    pub fn minus(self, origin: Coordinate) -> Coordinate {
        self - origin
    }

    /// Returns the four orthogonally adjacent coordinates, in `Direction` order.
    pub fn neighbours(self) -> impl Iterator<Item = Coordinate> {
        Direction::iter().map(move |d| self.step(d))
    }
}

impl Sub for Coordinate {
    type Output = Coordinate;

    fn sub(self, rhs: Coordinate) -> Self::Output {
        Coordinate {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// The direction the agent is facing.
///
/// Variants are declared in clockwise order; `right` and `left` walk this cycle.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    EnumIter,
    strum::Display,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Direction {
    #[default]
    North,
    East,
    South,
    West,
}

impl Direction {
    /// Unit vector for this direction as `(dx, dy)`.
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }

    pub const fn right(self) -> Direction {
        match self {
            Direction::North => Direction::East,
            Direction::East => Direction::South,
            Direction::South => Direction::West,
            Direction::West => Direction::North,
        }
    }

    pub const fn left(self) -> Direction {
        match self {
            Direction::North => Direction::West,
            Direction::West => Direction::South,
            Direction::South => Direction::East,
            Direction::East => Direction::North,
        }
    }

    pub const fn opposite(self) -> Direction {
        self.right().right()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_is_pure_and_follows_unit_vectors() {
        let origin = Coordinate::new(7, 9);
        assert_eq!(origin.step(Direction::North), Coordinate::new(7, 8));
        assert_eq!(origin.step(Direction::East), Coordinate::new(8, 9));
        assert_eq!(origin.step(Direction::South), Coordinate::new(7, 10));
        assert_eq!(origin.step(Direction::West), Coordinate::new(6, 9));
        // receiver is a value, untouched by stepping
        assert_eq!(origin, Coordinate::new(7, 9));
    }

    #[test]
    fn minus_gives_relative_offset() {
        let c = Coordinate::new(1, 0).minus(Coordinate::new(3, 3));
        assert_eq!(c, Coordinate::new(-2, -3));
        assert_eq!(c.to_string(), "-2,-3");
    }

    #[test]
    fn rotation_wraps() {
        assert_eq!(Direction::North.left(), Direction::West);
        assert_eq!(Direction::West.right(), Direction::North);
        assert_eq!(Direction::North.right(), Direction::East);
        assert_eq!(Direction::South.left(), Direction::East);
    }

    #[test]
    fn four_rights_return_to_start() {
        for d in Direction::iter() {
            assert_eq!(d.right().right().right().right(), d);
            assert_ne!(d.right(), d);
        }
    }

    #[test]
    fn neighbours_are_orthogonal() {
        let around: Vec<_> = Coordinate::new(0, 0).neighbours().collect();
        assert_eq!(
            around,
            vec![
                Coordinate::new(0, -1),
                Coordinate::new(1, 0),
                Coordinate::new(0, 1),
                Coordinate::new(-1, 0),
            ]
        );
    }

    #[test]
    fn direction_displays_upper_case() {
        assert_eq!(Direction::South.to_string(), "SOUTH");
    }

    #[test]
    fn default_direction_is_north() {
        assert_eq!(Direction::default(), Direction::North);
    }
}
