use ahash::RandomState as AHasher;
use dashmap::DashMap;
use rayon::prelude::*;

use crate::engine::{Direction, Grid};

use super::tree::{CacheKey, Tree};
use super::{select_best, BranchEval, ExpectimaxConfig, SearchStats};

/// Parallel Expectimax using rayon and a shared `DashMap` transposition table.
///
/// The four root directions run as separate rayon tasks. Every cached value
/// is exact, so the result matches [`super::Expectimax`] bit for bit no
/// matter how the tasks interleave.
pub struct ExpectimaxParallel {
    cfg: ExpectimaxConfig,
    stats: SearchStats,
}

impl ExpectimaxParallel {
    pub fn new() -> Self { Self::with_config(ExpectimaxConfig::default()) }

    pub fn with_config(cfg: ExpectimaxConfig) -> Self {
        Self { cfg, stats: SearchStats::default() }
    }

    #[inline]
    pub fn config(&self) -> &ExpectimaxConfig { &self.cfg }

    /// Compute the best move using parallel expectimax.
    ///
    /// This is a convenience wrapper around `branch_evals` that just picks the best move.
    #[inline]
    pub fn best_move(&mut self, grid: &Grid) -> Direction {
        let (best, _) = self.best_move_with_branches(grid);
        best
    }

    /// Best move together with all root evaluations, from a single search.
    pub fn best_move_with_branches(&mut self, grid: &Grid) -> (Direction, [BranchEval; 4]) {
        let branches = self.branch_evals(grid);
        let best = select_best(&branches);
        log::debug!("best_move (parallel) depth={} -> {}", self.cfg.depth, best);
        (best, branches)
    }

    /// Core function: compute the total for each direction in parallel.
    ///
    /// Returns a fixed array in order `[Up, Right, Down, Left]`.
    pub fn branch_evals(&mut self, grid: &Grid) -> [BranchEval; 4] {
        let map: DashMap<CacheKey, f64, AHasher> = DashMap::with_hasher(AHasher::new());
        let cfg = &self.cfg;
        let depth = cfg.depth;
        let results: Vec<(BranchEval, SearchStats)> = Direction::ALL
            .par_iter()
            .map(|&dir| {
                let mut tree = Tree::new(cfg, &map);
                let branch = tree.direction_total(grid, dir, depth);
                (branch, tree.stats)
            })
            .collect();

        let mut stats = SearchStats::default();
        let mut out = Direction::ALL.map(|dir| BranchEval { dir, ev: 0.0, legal: false });
        for (i, (branch, run)) in results.into_iter().enumerate() {
            out[i] = branch;
            stats.absorb(run);
        }
        self.record(stats);
        out
    }

    /// Expected value at the root (max node), floored at 0 like every max node.
    pub fn state_value(&mut self, grid: &Grid) -> f64 {
        if self.cfg.depth == 0 {
            return 0.0;
        }
        self.branch_evals(grid).iter().fold(0.0, |max, branch| if branch.ev > max { branch.ev } else { max })
    }

    /// Statistics collected from the last call to [`Self::best_move`],
    /// [`Self::branch_evals`] or [`Self::state_value`].
    ///
    /// Node counts can vary between runs with the cache on, since tasks race
    /// to fill shared entries.
    #[inline]
    pub fn last_stats(&self) -> SearchStats { self.stats }

    /// Reset accumulated stats to zero.
    #[inline]
    pub fn reset_stats(&mut self) { self.stats = SearchStats::default(); }

    fn record(&mut self, run: SearchStats) {
        let peak = self.stats.peak_nodes.max(run.nodes);
        self.stats = SearchStats { peak_nodes: peak, ..run };
    }
}

impl Default for ExpectimaxParallel { fn default() -> Self { Self::new() } }
