use std::collections::HashMap;

use crate::engine::{Direction, Grid};

use super::tree::{CacheKey, Tree};
use super::{select_best, BranchEval, ExpectimaxConfig, SearchStats};

/// Single-threaded Expectimax search.
///
/// Each call builds a fresh transposition table; nothing carries over
/// between calls except [`SearchStats::peak_nodes`].
pub struct Expectimax {
    cfg: ExpectimaxConfig,
    stats: SearchStats,
}

impl Expectimax {
    pub fn new() -> Self { Self::with_config(ExpectimaxConfig::default()) }

    pub fn with_config(cfg: ExpectimaxConfig) -> Self {
        Self { cfg, stats: SearchStats::default() }
    }

    #[inline]
    pub fn config(&self) -> &ExpectimaxConfig { &self.cfg }

    /// Compute the best move using expectimax.
    ///
    /// Always returns a direction; on a grid without legal moves that is Up.
    ///
    /// Example
    /// ```
    /// use ai_2048_grid::engine::{Direction, Grid};
    /// use ai_2048_grid::expectimax::{Expectimax, ExpectimaxConfig};
    /// let grid = Grid::from_rows(&[[0, 0, 0, 0], [0; 4], [0; 4], [2, 0, 0, 2]]).unwrap();
    /// let mut ex = Expectimax::with_config(ExpectimaxConfig { depth: 1, ..Default::default() });
    /// assert_ne!(ex.best_move(&grid), Direction::Down);
    /// ```
    pub fn best_move(&mut self, grid: &Grid) -> Direction {
        let branches = self.branch_evals(grid);
        let best = select_best(&branches);
        log::debug!("best_move depth={} -> {} ({:?})", self.cfg.depth, best, branches.map(|b| b.ev));
        best
    }

    /// Compute the total for each direction in order `[Up, Right, Down, Left]`.
    pub fn branch_evals(&mut self, grid: &Grid) -> [BranchEval; 4] {
        let depth = self.cfg.depth;
        let (out, stats) = {
            let mut tree = Tree::new(&self.cfg, HashMap::<CacheKey, f64>::new());
            let out = Direction::ALL.map(|dir| tree.direction_total(grid, dir, depth));
            (out, tree.stats)
        };
        self.record(stats);
        out
    }

    /// Expected value of `grid` as a max node at the configured depth.
    pub fn state_value(&mut self, grid: &Grid) -> f64 {
        let (value, stats) = {
            let mut tree = Tree::new(&self.cfg, HashMap::<CacheKey, f64>::new());
            (tree.max_points(grid, self.cfg.depth), tree.stats)
        };
        self.record(stats);
        value
    }

    /// Statistics collected from the last call to [`Self::best_move`],
    /// [`Self::branch_evals`] or [`Self::state_value`].
    #[inline]
    pub fn last_stats(&self) -> SearchStats { self.stats }

    /// Reset accumulated stats to zero.
    #[inline]
    pub fn reset_stats(&mut self) { self.stats = SearchStats::default(); }

    fn record(&mut self, run: SearchStats) {
        let peak = self.stats.peak_nodes.max(run.nodes);
        self.stats = SearchStats { peak_nodes: peak, ..run };
        log::trace!("search visited {} nodes ({} cache hits)", run.nodes, run.cache_hits);
    }
}

impl Default for Expectimax { fn default() -> Self { Self::new() } }

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SENTINEL_SCORE;

    fn with_depth(depth: u32) -> Expectimax {
        Expectimax::with_config(ExpectimaxConfig { depth, ..Default::default() })
    }

    #[test]
    fn empty_grid_picks_up() {
        let grid = Grid::new(4).unwrap();
        let mut ex = with_depth(1);
        let branches = ex.branch_evals(&grid);
        assert!(branches.iter().all(|b| !b.legal && b.ev == SENTINEL_SCORE));
        assert_eq!(ex.best_move(&grid), Direction::Up);
    }

    #[test]
    fn only_legal_move_is_chosen() {
        // Left column full of distinct values: only Right moves anything.
        let grid = Grid::from_rows(&[[2, 0, 0, 0], [4, 0, 0, 0], [8, 0, 0, 0], [16, 0, 0, 0]]).unwrap();
        let mut ex = with_depth(2);
        let branches = ex.branch_evals(&grid);
        assert_eq!(branches.iter().filter(|b| b.legal).count(), 1);
        assert!(branches[Direction::Right as usize].legal);
        assert_eq!(ex.best_move(&grid), Direction::Right);
    }

    #[test]
    fn best_move_is_deterministic() {
        let grid = Grid::from_rows(&[[2, 4, 0, 0], [0, 2, 0, 0], [0, 0, 8, 0], [4, 0, 0, 2]]).unwrap();
        let mut a = with_depth(2);
        let mut b = with_depth(2);
        assert_eq!(a.best_move(&grid), b.best_move(&grid));
        assert_eq!(a.branch_evals(&grid), b.branch_evals(&grid));
    }

    #[test]
    fn state_value_is_max_of_branches_floored_at_zero() {
        let grid = Grid::from_rows(&[[2, 2, 0, 0], [0, 4, 0, 0], [0; 4], [0; 4]]).unwrap();
        let mut ex = with_depth(2);
        let best = ex.branch_evals(&grid).iter().fold(0.0f64, |acc, b| acc.max(b.ev));
        assert_eq!(ex.state_value(&grid), best);
    }

    #[test]
    fn stats_track_last_and_peak() {
        let small = Grid::from_rows(&[[2, 4], [0, 0]]).unwrap();
        let large = Grid::new(3).unwrap();
        let mut ex = with_depth(2);
        ex.best_move(&large);
        let first = ex.last_stats();
        assert!(first.nodes > 0);
        ex.best_move(&small);
        let second = ex.last_stats();
        assert_eq!(second.peak_nodes, first.nodes.max(second.nodes));
        ex.reset_stats();
        assert_eq!(ex.last_stats(), SearchStats::default());
    }
}
