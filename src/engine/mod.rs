//! Tile grid, directions and move simulation.
//!
//! The grid is an explicit tile table rather than a packed integer: every
//! tile keeps its position, its value and (for tiles created by a merge) the
//! ids of the two tiles it consumed. Search code never shares a grid between
//! branches; [`simulate`] returns a fresh grid and leaves its input untouched.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

mod grid;
mod moves;

pub use grid::{Grid, GridKey, GridSnapshot, Tile, TileId};
pub use moves::{
    add_random_tile, add_tile, build_traversals, find_farthest_position, moves_available,
    sim_move, simulate, tile_matches_available, FarthestPosition, MoveOutcome, Traversals,
    SENTINEL_SCORE,
};

/// A direction to move/merge tiles.
///
/// The discriminants are the wire indices drivers exchange (0=Up .. 3=Left).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

impl Direction {
    /// Search and iteration order.
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Right, Direction::Down, Direction::Left];

    /// Unit vector pointing in this direction (y grows downwards).
    #[inline]
    pub fn vector(self) -> Vector {
        match self {
            Direction::Up => Vector { x: 0, y: -1 },
            Direction::Right => Vector { x: 1, y: 0 },
            Direction::Down => Vector { x: 0, y: 1 },
            Direction::Left => Vector { x: -1, y: 0 },
        }
    }

    #[inline]
    pub fn index(self) -> u8 { self as u8 }
}

impl TryFrom<u8> for Direction {
    type Error = EngineError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Direction::Up),
            1 => Ok(Direction::Right),
            2 => Ok(Direction::Down),
            3 => Ok(Direction::Left),
            other => Err(EngineError::InvalidDirection(other)),
        }
    }
}

impl From<Direction> for u8 {
    fn from(d: Direction) -> Self { d.index() }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Up => "up",
            Direction::Right => "right",
            Direction::Down => "down",
            Direction::Left => "left",
        };
        f.write_str(name)
    }
}

/// Cell coordinates. Signed so that stepping past an edge is representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self { Position { x, y } }

    /// The neighbouring position one step along `vector`.
    #[inline]
    pub fn step(self, vector: Vector) -> Self {
        Position { x: self.x + vector.x, y: self.y + vector.y }
    }
}

/// Unit step for a [`Direction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vector {
    pub x: i32,
    pub y: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_indices_round_trip_through_u8() {
        for dir in Direction::ALL {
            assert_eq!(Direction::try_from(u8::from(dir)).unwrap(), dir);
        }
        assert_eq!(Direction::Up.index(), 0);
        assert_eq!(Direction::Left.index(), 3);
    }

    #[test]
    fn out_of_range_direction_is_rejected() {
        let err = Direction::try_from(4).unwrap_err();
        assert!(matches!(err, EngineError::InvalidDirection(4)));
    }

    #[test]
    fn vectors_match_screen_coordinates() {
        assert_eq!(Direction::Up.vector(), Vector { x: 0, y: -1 });
        assert_eq!(Direction::Right.vector(), Vector { x: 1, y: 0 });
        assert_eq!(Direction::Down.vector(), Vector { x: 0, y: 1 });
        assert_eq!(Direction::Left.vector(), Vector { x: -1, y: 0 });
        assert_eq!(Position::new(1, 1).step(Direction::Left.vector()), Position::new(0, 1));
    }
}
