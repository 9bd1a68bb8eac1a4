use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use plum_mcts::engines::engine_mcts::MctsEngine;
use plum_mcts::engines::engine_trait::Engine;
use plum_mcts::errors::GameError;
use plum_mcts::game_state::chess_rules::STARTING_POSITION_FEN;
use plum_mcts::search::diagnostics::ConsoleSink;
use plum_mcts::search::evaluation::{MaterialEvaluator, MaterialWeights};
use plum_mcts::search::puct_engine::PuctConfig;
use plum_mcts::search::search_config::SearchConfig;
use plum_mcts::utils::game_loop::{play_interactive, self_play, GameConfig, StartPosition};
use plum_mcts::utils::pgn::write_pgn;

/// Rollout count below which interactive games pause before engine moves.
const SLOW_REPLY_ROLLOUTS: u32 = 100;

#[derive(Parser, Debug)]
#[command(name = "plum_mcts", about = "Play chess against a Monte Carlo tree search engine")]
struct Args {
    /// JSON file with evaluator weights; built-in weights when omitted
    model: Option<PathBuf>,

    /// Play against itself
    #[arg(long)]
    selfplay: bool,

    /// Pick moves at random, weighted by visit counts
    #[arg(long)]
    rand: bool,

    /// Print search notices
    #[arg(long)]
    debug: bool,

    /// Rollouts per search batch
    #[arg(
        long,
        value_name = "ROLLS",
        num_args = 0..=1,
        default_value_t = 1,
        default_missing_value = "800"
    )]
    mcts: u32,

    /// Show principal variations while searching
    #[arg(
        long,
        value_name = "N",
        num_args = 0..=1,
        default_value_t = 0,
        default_missing_value = "3"
    )]
    pvs: usize,

    /// Start from the given position
    #[arg(long, default_value = STARTING_POSITION_FEN)]
    fen: String,

    /// Seed for random move picking
    #[arg(long)]
    seed: Option<u64>,

    /// Give up deepening after this many extra batches
    #[arg(long, value_name = "R")]
    max_extension_rounds: Option<u32>,

    /// Stop the game after this many plies
    #[arg(long, value_name = "P")]
    max_plies: Option<u32>,

    /// Write the finished game to this PGN file
    #[arg(long, value_name = "PATH")]
    pgn: Option<PathBuf>,

    /// PUCT exploration constant
    #[arg(long, default_value_t = 1.5)]
    c_puct: f64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);
    install_interrupt_handler();

    let outcome = run(&args);
    println!("\nGoodbye!");
    outcome
}

fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, level),
    )
    .format_timestamp(None)
    .init();
}

#[cfg(unix)]
fn install_interrupt_handler() {
    use signal_hook::consts::signal::SIGINT;
    use signal_hook::iterator::Signals;

    match Signals::new([SIGINT]) {
        Ok(mut signals) => {
            std::thread::spawn(move || {
                if signals.forever().next().is_some() {
                    println!("\u{1b}[0m\nGoodbye!");
                    std::process::exit(0);
                }
            });
        }
        Err(e) => warn!("could not install SIGINT handler: {e}"),
    }
}

#[cfg(not(unix))]
fn install_interrupt_handler() {}

fn run(args: &Args) -> Result<()> {
    let weights = match &args.model {
        Some(path) => {
            if args.debug {
                println!("Loading model...");
            }
            MaterialWeights::load(path)
                .with_context(|| format!("failed to load model {}", path.display()))?
        }
        None => MaterialWeights::default(),
    };

    let config = SearchConfig {
        budget: args.mcts,
        pv_lines: args.pvs,
        max_extension_rounds: args.max_extension_rounds,
        seed: args.seed,
        ..SearchConfig::default()
    };
    let mut engine = MctsEngine::new(
        Box::new(MaterialEvaluator::new(weights)),
        PuctConfig {
            c_puct: args.c_puct,
        },
        config,
    )
    .context("invalid search settings")?;
    if args.pvs > 0 || args.debug {
        engine = engine.with_sink(Box::new(ConsoleSink::stdout()));
    }

    let start = StartPosition::from_fen(&args.fen)?;
    let game_config = GameConfig {
        max_plies: args.max_plies,
        move_delay: if !args.selfplay && args.mcts < SLOW_REPLY_ROLLOUTS {
            Duration::from_millis(300)
        } else {
            Duration::ZERO
        },
        debug: args.debug,
        pick_random: args.rand,
    };
    info!("starting {} with {} rollouts per batch", engine.name(), args.mcts);

    let mut out = io::stdout();
    let played = if args.selfplay {
        self_play(&mut engine, start, &game_config, &mut out)
    } else {
        let mut input = io::stdin().lock();
        play_interactive(&mut engine, start, &game_config, &mut input, &mut out)
    };

    let record = match played {
        Ok(record) => record,
        Err(GameError::InputClosed) => return Ok(()),
        Err(err) => return Err(err.into()),
    };
    info!(
        "game over after {} plies ({}), final position {}",
        record.san_moves.len(),
        record.end_reason,
        record.final_board
    );

    if let Some(path) = &args.pgn {
        let mut headers = BTreeMap::new();
        if args.selfplay {
            headers.insert("White".to_owned(), engine.name().to_owned());
            headers.insert("Black".to_owned(), engine.name().to_owned());
        }
        fs::write(path, write_pgn(&record, &headers))
            .with_context(|| format!("failed to write PGN to {}", path.display()))?;
        info!("saved game to {}", path.display());
    }

    Ok(())
}
