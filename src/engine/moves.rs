use rand::Rng;

use super::grid::validate_value;
use super::{Direction, Grid, Position, Tile, TileId, Vector};
use crate::error::EngineError;
use crate::expectimax::heuristic::rate_grid;
use crate::expectimax::SPAWN_TWO_PROBABILITY;

/// Score reported for a move that leaves every tile where it was.
pub const SENTINEL_SCORE: f64 = -100_000.0;

/// Cell visiting order for one move: tiles farthest along the vector go first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Traversals {
    pub x: Vec<i32>,
    pub y: Vec<i32>,
}

/// Result of walking from a cell along a vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FarthestPosition {
    /// Last empty cell reached (or the start cell if the first step is blocked).
    pub farthest: Position,
    /// First blocking cell: occupied or out of bounds. Used for the merge check.
    pub next: Position,
}

/// A simulated move, leaving the input grid untouched.
#[derive(Debug, Clone)]
pub struct MoveOutcome {
    pub grid: Grid,
    /// [`SENTINEL_SCORE`] when nothing moved, the heuristic rating otherwise.
    pub score: f64,
    pub moved: bool,
    /// Sum of the values of tiles created by merges (the game score gained).
    pub merge_points: u64,
}

pub fn build_traversals(size: usize, vector: Vector) -> Traversals {
    let mut x: Vec<i32> = (0..size as i32).collect();
    let mut y: Vec<i32> = (0..size as i32).collect();
    if vector.x == 1 {
        x.reverse();
    }
    if vector.y == 1 {
        y.reverse();
    }
    Traversals { x, y }
}

pub fn find_farthest_position(grid: &Grid, cell: Position, vector: Vector) -> FarthestPosition {
    let mut previous = cell;
    let mut next = cell.step(vector);
    while grid.cell_available(next) {
        previous = next;
        next = next.step(vector);
    }
    FarthestPosition { farthest: previous, next }
}

/// Slide and merge in place. Returns `(moved, merge_points)`.
fn apply_move(grid: &mut Grid, direction: Direction) -> (bool, u64) {
    let vector = direction.vector();
    let traversals = build_traversals(grid.size(), vector);
    let mut moved = false;
    let mut merge_points = 0u64;

    grid.prepare_tiles();

    for &x in &traversals.x {
        for &y in &traversals.y {
            let cell = Position::new(x, y);
            let Some(id) = grid.cell_id(cell) else { continue };
            let value = grid.tile(id).value;
            let positions = find_farthest_position(grid, cell, vector);

            match mergeable(grid, positions.next, value) {
                Some((stationary, merged_value)) => {
                    let mut merged = Tile::new(positions.next, merged_value);
                    merged.merged_from = Some((id, stationary));
                    grid.insert_tile(merged);
                    grid.remove_tile(id);
                    grid.tile_mut(id).update_position(positions.next);
                    merge_points += u64::from(merged.value);
                }
                None => grid.move_tile(id, positions.farthest),
            }

            if grid.tile(id).position != cell {
                moved = true;
            }
        }
    }
    (moved, merge_points)
}

/// Value of the tile two `value` tiles merge into, if it fits in a `u32`.
///
/// Tiles of `1 << 31` never merge.
#[inline]
fn doubled(value: u32) -> Option<u32> { value.checked_mul(2) }

/// The tile at `next` and the merged value, if it can absorb a tile of
/// `value` in this move.
#[inline]
fn mergeable(grid: &Grid, next: Position, value: u32) -> Option<(TileId, u32)> {
    let id = grid.cell_id(next)?;
    let tile = grid.tile(id);
    if tile.value != value || tile.merged_from.is_some() {
        return None;
    }
    Some((id, doubled(value)?))
}

/// Apply `direction` to `grid` in place.
///
/// Returns [`SENTINEL_SCORE`] when no tile changed position, otherwise the
/// heuristic rating of the resulting grid.
///
/// ```
/// use ai_2048_grid::engine::{sim_move, Direction, Grid, SENTINEL_SCORE};
/// let mut grid = Grid::from_rows(&[[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
/// assert!(sim_move(&mut grid, Direction::Left) > SENTINEL_SCORE);
/// assert_eq!(grid.value_at(0, 0), 4);
/// ```
pub fn sim_move(grid: &mut Grid, direction: Direction) -> f64 {
    let (moved, _) = apply_move(grid, direction);
    if moved { rate_grid(grid) } else { SENTINEL_SCORE }
}

/// Pure form of [`sim_move`]: the input grid is cloned, never mutated.
pub fn simulate(grid: &Grid, direction: Direction) -> MoveOutcome {
    let mut next = grid.clone();
    let (moved, merge_points) = apply_move(&mut next, direction);
    let score = if moved { rate_grid(&next) } else { SENTINEL_SCORE };
    MoveOutcome { grid: next, score, moved, merge_points }
}

/// True if two orthogonally adjacent tiles share a value and can merge.
pub fn tile_matches_available(grid: &Grid) -> bool {
    grid.tiles().filter(|tile| doubled(tile.value).is_some()).any(|tile| {
        Direction::ALL.iter().any(|dir| {
            grid.cell_content(tile.position.step(dir.vector()))
                .is_some_and(|other| other.value == tile.value)
        })
    })
}

/// True if at least one direction would change the grid.
pub fn moves_available(grid: &Grid) -> bool {
    grid.cells_available() || tile_matches_available(grid)
}

/// Place a fresh tile of `value` in the empty cell `pos`.
///
/// ```
/// use ai_2048_grid::engine::{add_tile, Grid, Position};
/// let mut grid = Grid::new(2).unwrap();
/// add_tile(&mut grid, Position::new(1, 0), 4).unwrap();
/// assert_eq!(grid.value_at(1, 0), 4);
/// assert!(add_tile(&mut grid, Position::new(1, 0), 2).is_err());
/// assert!(add_tile(&mut grid, Position::new(2, 0), 2).is_err());
/// ```
pub fn add_tile(grid: &mut Grid, pos: Position, value: u32) -> Result<TileId, EngineError> {
    if !grid.within_bounds(pos) {
        return Err(EngineError::OutOfBounds { x: pos.x, y: pos.y, size: grid.size() });
    }
    if !grid.cell_available(pos) {
        return Err(EngineError::CellOccupied { x: pos.x, y: pos.y });
    }
    validate_value(value)?;
    Ok(grid.insert_tile(Tile::new(pos, value)))
}

/// Spawn a 2 (90%) or 4 (10%) in a uniformly chosen empty cell.
///
/// Returns `None` when the grid is full.
pub fn add_random_tile<R: Rng + ?Sized>(grid: &mut Grid, rng: &mut R) -> Option<TileId> {
    let cells = grid.available_cells();
    if cells.is_empty() {
        return None;
    }
    let value = if rng.gen::<f64>() < SPAWN_TWO_PROBABILITY { 2 } else { 4 };
    let cell = cells[rng.gen_range(0..cells.len())];
    Some(grid.insert_tile(Tile::new(cell, value)))
}
