//! Expectimax search policy (single-threaded and parallel).
//!
//! This module provides two policy implementations:
//! - [`Expectimax`]: single-threaded expectimax.
//! - [`ExpectimaxParallel`]: rayon-based, one task per root direction.
//!
//! Both search the same tree and return bit-identical results: for every
//! direction the simulated score is added to the probability-weighted value
//! of every spawn (a 2 with probability 0.9, a 4 with 0.1) in every empty
//! cell, recursing until the depth counter reaches zero.
//!
//! Notes
//! - The search never samples; randomness only occurs in
//!   [`add_random_tile`](crate::engine::add_random_tile).
//! - The transposition cache stores exact values keyed by grid contents and
//!   depth, so enabling it changes cost, not results.
//!
//! Quick start
//! ```
//! use ai_2048_grid::engine::{Direction, Grid};
//! use ai_2048_grid::expectimax::{Expectimax, ExpectimaxConfig};
//!
//! let grid = Grid::from_rows(&[[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
//! let mut ex = Expectimax::with_config(ExpectimaxConfig { depth: 2, ..Default::default() });
//! let dir = ex.best_move(&grid);
//! assert!(Direction::ALL.contains(&dir));
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::{moves_available, Direction, Grid};
use crate::error::EngineError;

pub mod heuristic;
mod search_par;
mod search_seq;
mod tree;

pub use heuristic::{position_weight, rate_grid};
pub use search_par::ExpectimaxParallel;
pub use search_seq::Expectimax;

/// Probability that a spawned tile is a 2.
pub const SPAWN_TWO_PROBABILITY: f64 = 0.9;
/// Probability that a spawned tile is a 4.
pub const SPAWN_FOUR_PROBABILITY: f64 = 0.1;

/// Depth used by the game driver and the CLI.
pub const DEFAULT_DEPTH: u32 = 3;

/// Configurable knobs for Expectimax.
///
/// - `depth`: number of move plies to search (0 scores the root moves only).
/// - `cache_enabled`: enable/disable the per-call transposition table.
/// - `skip_illegal_expansion`: do not expand spawns below moves that change
///   nothing. Off by default, so sentinel moves still collect child values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpectimaxConfig {
    pub depth: u32,
    pub cache_enabled: bool,
    pub skip_illegal_expansion: bool,
}

impl Default for ExpectimaxConfig {
    fn default() -> Self {
        Self { depth: DEFAULT_DEPTH, cache_enabled: true, skip_illegal_expansion: false }
    }
}

impl ExpectimaxConfig {
    /// Parse a JSON config; missing fields keep their defaults.
    pub fn from_json_str(s: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

/// Per-direction total at the root.
///
/// - `ev` is the simulated score plus the weighted spawn values below it.
/// - `legal` is false when the move leaves the grid unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BranchEval {
    pub dir: Direction,
    pub ev: f64,
    pub legal: bool,
}

/// Basic search stats for a single evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    /// Simulated moves (decision-node children) visited.
    pub nodes: u64,
    /// Max-node values served from the transposition table.
    pub cache_hits: u64,
    /// Largest `nodes` seen since the last reset.
    pub peak_nodes: u64,
}

impl SearchStats {
    pub(crate) fn absorb(&mut self, other: SearchStats) {
        self.nodes += other.nodes;
        self.cache_hits += other.cache_hits;
    }
}

/// Weights applied to the 2-spawn and 4-spawn branches of one empty cell
/// when `available` cells are empty. They sum to `1 / available`.
///
/// ```
/// use ai_2048_grid::expectimax::chance_weights;
/// let (two, four) = chance_weights(4);
/// assert!((two + four - 0.25).abs() < 1e-12);
/// ```
#[inline]
pub fn chance_weights(available: usize) -> (f64, f64) {
    let cell_chance = 1.0 / available as f64;
    (SPAWN_TWO_PROBABILITY * cell_chance, SPAWN_FOUR_PROBABILITY * cell_chance)
}

/// Pick the strictly greatest total, keeping the earliest direction on ties.
///
/// The floor is the sentinel score, so if every total sits at or below it the
/// first direction (Up) wins.
pub fn select_best(branches: &[BranchEval]) -> Direction {
    let mut best = Direction::Up;
    let mut best_points = crate::engine::SENTINEL_SCORE;
    for branch in branches {
        if branch.ev > best_points {
            best_points = branch.ev;
            best = branch.dir;
        }
    }
    best
}

/// Something that recommends moves to a game driver.
pub trait MovePolicy {
    /// Recommended direction, or `None` when the grid admits no move.
    fn next_move(&mut self, grid: &Grid) -> Option<Direction>;
}

impl MovePolicy for Expectimax {
    fn next_move(&mut self, grid: &Grid) -> Option<Direction> {
        moves_available(grid).then(|| self.best_move(grid))
    }
}

impl MovePolicy for ExpectimaxParallel {
    fn next_move(&mut self, grid: &Grid) -> Option<Direction> {
        moves_available(grid).then(|| self.best_move(grid))
    }
}

/// Best move for `grid` searched `depth` plies deep with default settings.
///
/// ```
/// use ai_2048_grid::engine::{Direction, Grid};
/// use ai_2048_grid::expectimax::best_move;
/// assert_eq!(best_move(&Grid::new(4).unwrap(), 1), Direction::Up);
/// ```
pub fn best_move(grid: &Grid, depth: u32) -> Direction {
    Expectimax::with_config(ExpectimaxConfig { depth, ..Default::default() }).best_move(grid)
}

/// Expected value of `grid` as a max node `depth` plies deep (0 at depth 0).
pub fn max_points(grid: &Grid, depth: u32) -> f64 {
    Expectimax::with_config(ExpectimaxConfig { depth, ..Default::default() }).state_value(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn chance_weights_split_each_cell_share() {
        for n in 1..=16 {
            let (two, four) = chance_weights(n);
            assert!((two + four - 1.0 / n as f64).abs() < 1e-15);
            assert!(two > four);
        }
    }

    #[test]
    fn select_best_prefers_first_on_ties() {
        let branches = [
            BranchEval { dir: Direction::Up, ev: 10.0, legal: true },
            BranchEval { dir: Direction::Right, ev: 12.0, legal: true },
            BranchEval { dir: Direction::Down, ev: 12.0, legal: true },
            BranchEval { dir: Direction::Left, ev: 1.0, legal: true },
        ];
        assert_eq!(select_best(&branches), Direction::Right);

        let illegal = Direction::ALL.map(|dir| BranchEval { dir, ev: crate::engine::SENTINEL_SCORE, legal: false });
        assert_eq!(select_best(&illegal), Direction::Up);
    }

    #[test]
    fn config_defaults_fill_missing_fields() {
        let cfg = ExpectimaxConfig::from_json_str(r#"{ "depth": 2 }"#).unwrap();
        assert_eq!(cfg, ExpectimaxConfig { depth: 2, ..Default::default() });
        assert!(ExpectimaxConfig::from_json_str("{ depth: }").is_err());
    }

    #[test]
    fn config_loads_from_file() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(tmp, r#"{{ "depth": 1, "cache_enabled": false, "skip_illegal_expansion": true }}"#).unwrap();
        let cfg = ExpectimaxConfig::from_json_file(tmp.path()).unwrap();
        assert_eq!(cfg, ExpectimaxConfig { depth: 1, cache_enabled: false, skip_illegal_expansion: true });
    }

    #[test]
    fn missing_config_file_is_an_io_error() {
        let err = ExpectimaxConfig::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, EngineError::Io(_)));
    }

    #[test]
    fn max_points_at_depth_zero_is_zero() {
        let grid = Grid::from_rows(&[[2, 4, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
        assert_eq!(max_points(&grid, 0), 0.0);
    }
}
