//! Minimal game driver with explicit state.
//!
//! A [`Game`] owns its grid, score and RNG; callers run the loop themselves by
//! asking a [`MovePolicy`] for a direction and handing it to [`Game::step`].
//!
//! ```
//! use ai_2048_grid::expectimax::{Expectimax, ExpectimaxConfig};
//! use ai_2048_grid::game::{Game, StepResult};
//!
//! let mut game = Game::new(4, 42).unwrap();
//! let mut policy = Expectimax::with_config(ExpectimaxConfig { depth: 1, ..Default::default() });
//! let mut steps = 0;
//! while steps < 4 {
//!     match game.step(&mut policy) {
//!         StepResult::Moved(_) => steps += 1,
//!         StepResult::GameOver | StepResult::Stalled(_) => break,
//!     }
//! }
//! assert!(game.moves() > 0);
//! ```

use rand::{rngs::StdRng, SeedableRng};

use crate::engine::{add_random_tile, moves_available, simulate, Direction, Grid};
use crate::error::EngineError;
use crate::expectimax::MovePolicy;

/// Tiles placed on a fresh grid.
pub const START_TILES: usize = 2;

/// One applied move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepRecord {
    pub direction: Direction,
    pub merge_points: u64,
    pub score: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    Moved(StepRecord),
    /// The policy had no move to offer.
    GameOver,
    /// The policy picked a direction that changes nothing.
    Stalled(Direction),
}

pub struct Game {
    grid: Grid,
    score: u64,
    moves: u64,
    rng: StdRng,
}

impl Game {
    /// A fresh `size`x`size` game with [`START_TILES`] random tiles.
    pub fn new(size: usize, seed: u64) -> Result<Self, EngineError> {
        let mut game = Self::from_grid(Grid::new(size)?, seed);
        for _ in 0..START_TILES {
            add_random_tile(&mut game.grid, &mut game.rng);
        }
        Ok(game)
    }

    /// Continue from an existing position.
    pub fn from_grid(grid: Grid, seed: u64) -> Self {
        Game { grid, score: 0, moves: 0, rng: StdRng::seed_from_u64(seed) }
    }

    #[inline]
    pub fn grid(&self) -> &Grid { &self.grid }

    #[inline]
    pub fn score(&self) -> u64 { self.score }

    #[inline]
    pub fn moves(&self) -> u64 { self.moves }

    #[inline]
    pub fn is_over(&self) -> bool { !moves_available(&self.grid) }

    /// Apply `direction`; on change, add the merge points and spawn a tile.
    ///
    /// Returns `None` (and leaves the game untouched) if nothing moved.
    pub fn apply(&mut self, direction: Direction) -> Option<StepRecord> {
        let outcome = simulate(&self.grid, direction);
        if !outcome.moved {
            return None;
        }
        self.grid = outcome.grid;
        self.score += outcome.merge_points;
        self.moves += 1;
        add_random_tile(&mut self.grid, &mut self.rng);
        Some(StepRecord { direction, merge_points: outcome.merge_points, score: self.score })
    }

    /// Ask `policy` for a move and apply it.
    pub fn step<P: MovePolicy + ?Sized>(&mut self, policy: &mut P) -> StepResult {
        let Some(direction) = policy.next_move(&self.grid) else {
            log::debug!("no moves left after {} moves, score {}", self.moves, self.score);
            return StepResult::GameOver;
        };
        match self.apply(direction) {
            Some(record) => {
                log::trace!("move {} {} -> score {}", self.moves, direction, record.score);
                StepResult::Moved(record)
            }
            None => {
                log::warn!("policy chose {direction}, which does not change the grid");
                StepResult::Stalled(direction)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expectimax::{Expectimax, ExpectimaxConfig};

    struct Fixed(Option<Direction>);

    impl MovePolicy for Fixed {
        fn next_move(&mut self, _grid: &Grid) -> Option<Direction> { self.0 }
    }

    #[test]
    fn new_game_has_start_tiles() {
        let game = Game::new(4, 1).unwrap();
        assert_eq!(game.grid().tiles().count(), START_TILES);
        assert_eq!(game.score(), 0);
        assert!(!game.is_over());
    }

    #[test]
    fn same_seed_same_game() {
        let a = Game::new(4, 99).unwrap();
        let b = Game::new(4, 99).unwrap();
        assert_eq!(a.grid(), b.grid());
    }

    #[test]
    fn apply_adds_merge_points_and_spawns() {
        let grid = Grid::from_rows(&[[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
        let mut game = Game::from_grid(grid, 5);
        let record = game.apply(Direction::Left).unwrap();
        assert_eq!(record.merge_points, 4);
        assert_eq!(game.score(), 4);
        assert_eq!(game.moves(), 1);
        assert_eq!(game.grid().tiles().count(), 2);
        assert_eq!(game.grid().value_at(0, 0), 4);
    }

    #[test]
    fn no_op_direction_stalls() {
        let grid = Grid::from_rows(&[[2, 4, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
        let mut game = Game::from_grid(grid.clone(), 5);
        assert_eq!(game.step(&mut Fixed(Some(Direction::Up))), StepResult::Stalled(Direction::Up));
        assert_eq!(game.grid(), &grid);
        assert_eq!(game.step(&mut Fixed(None)), StepResult::GameOver);
    }

    #[test]
    fn locked_grid_is_over() {
        let grid = Grid::from_rows(&[[2, 4], [4, 2]]).unwrap();
        let mut game = Game::from_grid(grid, 0);
        assert!(game.is_over());
        let mut policy = Expectimax::with_config(ExpectimaxConfig { depth: 1, ..Default::default() });
        assert_eq!(game.step(&mut policy), StepResult::GameOver);
    }

    #[test]
    fn small_game_runs_to_completion() {
        let mut game = Game::new(2, 3).unwrap();
        let mut policy = Expectimax::with_config(ExpectimaxConfig { depth: 1, ..Default::default() });
        let mut guard = 0;
        while let StepResult::Moved(_) = game.step(&mut policy) {
            guard += 1;
            assert!(guard < 10_000);
        }
        assert!(game.is_over() || guard > 0);
    }
}
