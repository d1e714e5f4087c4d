use std::collections::HashMap;

use ahash::RandomState as AHasher;
use dashmap::DashMap;

use crate::engine::{simulate, Direction, Grid, GridKey, Tile};

use super::{chance_weights, BranchEval, ExpectimaxConfig, SearchStats};

/// Max-node value keyed by grid contents and remaining depth.
pub(super) type CacheKey = (GridKey, u32);

pub(super) trait ScoreCache {
    fn lookup(&mut self, key: &CacheKey) -> Option<f64>;
    fn store(&mut self, key: CacheKey, score: f64);
}

impl ScoreCache for HashMap<CacheKey, f64> {
    #[inline]
    fn lookup(&mut self, key: &CacheKey) -> Option<f64> { self.get(key).copied() }

    #[inline]
    fn store(&mut self, key: CacheKey, score: f64) { self.insert(key, score); }
}

impl ScoreCache for &DashMap<CacheKey, f64, AHasher> {
    #[inline]
    fn lookup(&mut self, key: &CacheKey) -> Option<f64> { self.get(key).map(|entry| *entry) }

    #[inline]
    fn store(&mut self, key: CacheKey, score: f64) { self.insert(key, score); }
}

/// One walk of the expectimax tree over a cache.
pub(super) struct Tree<'a, C> {
    cfg: &'a ExpectimaxConfig,
    cache: C,
    pub(super) stats: SearchStats,
}

impl<'a, C: ScoreCache> Tree<'a, C> {
    pub(super) fn new(cfg: &'a ExpectimaxConfig, cache: C) -> Self {
        Tree { cfg, cache, stats: SearchStats::default() }
    }

    /// Simulated score of `dir` plus the weighted value of every spawn after it.
    pub(super) fn direction_total(&mut self, grid: &Grid, dir: Direction, depth: u32) -> BranchEval {
        self.stats.nodes += 1;
        let outcome = simulate(grid, dir);
        let legal = outcome.moved;
        let mut points = outcome.score;

        if depth == 0 || (!legal && self.cfg.skip_illegal_expansion) {
            return BranchEval { dir, ev: points, legal };
        }

        // Children only need contents; drop consumed tiles before cloning.
        let mut after = outcome.grid;
        after.compact();
        let cells = after.available_cells();
        if !cells.is_empty() {
            let (two_weight, four_weight) = chance_weights(cells.len());
            for cell in cells {
                let mut with_two = after.clone();
                with_two.insert_tile(Tile::new(cell, 2));
                points += two_weight * self.max_points(&with_two, depth - 1);

                let mut with_four = after.clone();
                with_four.insert_tile(Tile::new(cell, 4));
                points += four_weight * self.max_points(&with_four, depth - 1);
            }
        }
        BranchEval { dir, ev: points, legal }
    }

    /// Best direction total at a max node, floored at 0.
    pub(super) fn max_points(&mut self, grid: &Grid, depth: u32) -> f64 {
        if depth == 0 {
            return 0.0;
        }
        let key = self.cfg.cache_enabled.then(|| (grid.key(), depth));
        if let Some(key) = &key {
            if let Some(score) = self.cache.lookup(key) {
                self.stats.cache_hits += 1;
                return score;
            }
        }

        let mut max = 0.0;
        for dir in Direction::ALL {
            let points = self.direction_total(grid, dir, depth).ev;
            if points > max {
                max = points;
            }
        }

        if let Some(key) = key {
            self.cache.store(key, max);
        }
        max
    }
}
