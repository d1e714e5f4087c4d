//! ai-2048-grid: an Expectimax move advisor for 2048-style sliding-tile puzzles
//!
//! This crate provides:
//! - A square [`Grid`](engine::Grid) of tiles with merge bookkeeping, and the
//!   move simulator (`sim_move`, `simulate`, `moves_available`) in [`engine`]
//! - The board heuristic and an Expectimax search (`expectimax` module) with
//!   single-threaded and parallel variants
//! - A small [`Game`](game::Game) driver that plays any [`MovePolicy`](expectimax::MovePolicy)
//!
//! Quick start:
//! ```
//! use ai_2048_grid::engine::{sim_move, Direction, Grid, SENTINEL_SCORE};
//! use ai_2048_grid::expectimax;
//!
//! let grid = Grid::from_rows(&[[2, 2, 0, 0], [0, 4, 0, 0], [0; 4], [0; 4]]).unwrap();
//! let dir = expectimax::best_move(&grid, 2);
//!
//! // The chosen move always changes a grid that has moves left.
//! let mut after = grid.clone();
//! assert!(sim_move(&mut after, dir) > SENTINEL_SCORE);
//! ```
//!
//! Note: the search is deterministic. Randomness only enters through
//! [`engine::add_random_tile`], which takes the RNG explicitly; pass a seeded
//! `StdRng` when you need reproducible games.
//!
pub mod engine;
pub mod error;
pub mod expectimax;
pub mod game;

pub use error::EngineError;
