use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use ai_2048_grid::engine::{moves_available, Grid, GridSnapshot};
use ai_2048_grid::expectimax::{
    select_best, Expectimax, ExpectimaxConfig, ExpectimaxParallel, MovePolicy,
};
use ai_2048_grid::game::{Game, StepResult};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Play { search, size, seed, steps, stop_tile, quiet } => {
            let cfg = search.config()?;
            play(cfg, search.parallel, size, seed, steps, stop_tile, quiet)
        }
        Cmd::Suggest { search, input } => {
            let cfg = search.config()?;
            suggest(cfg, search.parallel, input.as_deref())
        }
    }
}

fn play(
    cfg: ExpectimaxConfig,
    parallel: bool,
    size: usize,
    seed: Option<u64>,
    steps: Option<u64>,
    stop_tile: Option<u32>,
    quiet: bool,
) -> Result<()> {
    let seed = seed.unwrap_or_else(rand::random);
    log::info!("playing {size}x{size} seed={seed} depth={} parallel={parallel}", cfg.depth);
    let mut policy: Box<dyn MovePolicy> = if parallel {
        Box::new(ExpectimaxParallel::with_config(cfg))
    } else {
        Box::new(Expectimax::with_config(cfg))
    };
    let mut game = Game::new(size, seed)?;
    let start = Instant::now();

    let pb = if quiet {
        None
    } else {
        println!("{}", game.grid());
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner} {elapsed_precise} | Moves: {msg}")?
                .tick_chars("⠁⠃⠇⠧⠷⠿⠻⠟⠯⠷⠧⠇⠃"),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    };

    loop {
        match game.step(policy.as_mut()) {
            StepResult::Moved(record) => {
                if let Some(pb) = &pb {
                    let rate = game.moves() as f64 / start.elapsed().as_secs_f64().max(1e-6);
                    pb.set_message(format!("{} | moves/sec: {:.1} | score: {}", game.moves(), rate, record.score));
                }
            }
            StepResult::GameOver => break,
            StepResult::Stalled(dir) => {
                log::warn!("stopping: {dir} leaves the grid unchanged");
                break;
            }
        }
        if steps.is_some_and(|limit| game.moves() >= limit) {
            break;
        }
        if stop_tile.is_some_and(|tile| game.grid().highest_tile() >= tile) {
            break;
        }
    }

    if let Some(pb) = pb {
        pb.finish_and_clear();
        println!("{}", game.grid());
    }
    println!(
        "Moves: {} | score: {} | highest tile: {} | game over: {}",
        game.moves(),
        game.score(),
        game.grid().highest_tile(),
        game.is_over()
    );
    Ok(())
}

fn suggest(cfg: ExpectimaxConfig, parallel: bool, input: Option<&Path>) -> Result<()> {
    let text = match input {
        Some(path) => fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf).context("reading grid from stdin")?;
            buf
        }
    };
    let snapshot: GridSnapshot = serde_json::from_str(&text).context("parsing grid snapshot")?;
    let grid = Grid::try_from(snapshot)?;
    log::debug!("suggesting for\n{grid}");

    let (best, branches) = if parallel {
        ExpectimaxParallel::with_config(cfg).best_move_with_branches(&grid)
    } else {
        let mut ex = Expectimax::with_config(cfg);
        let branches = ex.branch_evals(&grid);
        (select_best(&branches), branches)
    };
    let report = serde_json::json!({
        "direction": best,
        "index": u8::from(best),
        "moves_available": moves_available(&grid),
        "branches": branches,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[derive(Parser, Debug)]
#[command(name = "ai-2048-grid", about = "Expectimax move advisor for 2048-style grids")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Play a full game with the search as the policy
    Play {
        #[command(flatten)]
        search: SearchArgs,
        /// Grid side length
        #[arg(long, default_value_t = 4)]
        size: usize,
        /// RNG seed (random if omitted)
        #[arg(long)]
        seed: Option<u64>,
        /// Stop after this many moves
        #[arg(long)]
        steps: Option<u64>,
        /// Stop once this tile value appears
        #[arg(long)]
        stop_tile: Option<u32>,
        /// Suppress the spinner and board output
        #[arg(long)]
        quiet: bool,
    },
    /// Recommend a move for a grid snapshot (JSON file or stdin)
    Suggest {
        #[command(flatten)]
        search: SearchArgs,
        /// Snapshot path; reads stdin when omitted
        input: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// JSON config file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// Search depth
    #[arg(long)]
    depth: Option<u32>,
    /// Disable the transposition cache
    #[arg(long)]
    no_cache: bool,
    /// Do not expand spawns below moves that change nothing
    #[arg(long)]
    skip_illegal: bool,
    /// Evaluate root directions on the rayon pool
    #[arg(long)]
    parallel: bool,
}

impl SearchArgs {
    fn config(&self) -> Result<ExpectimaxConfig> {
        let mut cfg = match &self.config {
            Some(path) => ExpectimaxConfig::from_json_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => ExpectimaxConfig::default(),
        };
        if let Some(depth) = self.depth {
            cfg.depth = depth;
        }
        if self.no_cache {
            cfg.cache_enabled = false;
        }
        if self.skip_illegal {
            cfg.skip_illegal_expansion = true;
        }
        Ok(cfg)
    }
}
