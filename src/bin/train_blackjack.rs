//! Headless Blackjack trainer.
//!
//! Usage:
//!   cargo run --release --bin train_blackjack -- [OPTIONS]
//!
//! Trains the Monte Carlo agent for a number of episodes, reports the greedy
//! policy's results, and optionally writes the learned values to JSON.
//! Set `RUST_LOG=debug` for per-episode logging.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::EnvFilter;

use blackjack_mc::games::blackjack::{BlackjackSession, SessionConfig, TrainingOutput};
use blackjack_mc::mc::ReturnDiscount;

/// Command-line arguments for the trainer.
#[derive(Parser, Debug)]
#[command(name = "train_blackjack", about = "Train a Monte Carlo Blackjack agent")]
struct Cli {
    /// Number of training episodes.
    #[arg(short = 'n', long, default_value_t = 500_000)]
    episodes: u64,

    /// Generate episodes on a thread pool.
    #[arg(short, long)]
    parallel: bool,

    /// Episodes per parallel batch.
    #[arg(long, default_value_t = 4096)]
    batch: usize,

    /// Worker threads for parallel training (default: all cores).
    #[arg(short, long)]
    threads: Option<usize>,

    /// Random seed.
    #[arg(short, long)]
    seed: Option<u64>,

    /// JSON configuration file. Flags below override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Exploration probability.
    #[arg(long)]
    epsilon: Option<f64>,

    /// Step size.
    #[arg(long)]
    alpha: Option<f64>,

    /// Discount factor.
    #[arg(long)]
    gamma: Option<f64>,

    /// Discount the first reward too (`shifted`) or not (`textbook`).
    #[arg(long, value_parser = parse_discount)]
    discount: Option<ReturnDiscount>,

    /// The dealer draws while at or below this total.
    #[arg(long)]
    dealer_limit: Option<u8>,

    /// Greedy evaluation episodes after training.
    #[arg(long, default_value_t = 100_000)]
    eval: u64,

    /// Write Q-values and value surfaces to this JSON file.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn parse_discount(value: &str) -> Result<ReturnDiscount, String> {
    match value {
        "shifted" => Ok(ReturnDiscount::Shifted),
        "textbook" => Ok(ReturnDiscount::Textbook),
        other => Err(format!("unknown discount convention `{}`", other)),
    }
}

impl Cli {
    /// Load the config file, if any, and apply command-line overrides.
    fn session_config(&self) -> Result<SessionConfig> {
        let mut config = match &self.config {
            Some(path) => SessionConfig::from_json_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => SessionConfig::default(),
        };

        if let Some(epsilon) = self.epsilon {
            config.control.epsilon = epsilon;
        }
        if let Some(alpha) = self.alpha {
            config.control.alpha = alpha;
        }
        if let Some(gamma) = self.gamma {
            config.control.gamma = gamma;
        }
        if let Some(discount) = self.discount {
            config.control.return_discount = discount;
        }
        if let Some(limit) = self.dealer_limit {
            config.dealer_limit = limit;
        }
        if let Some(threads) = self.threads {
            config.control.num_threads = Some(threads);
        }
        if let Some(seed) = self.seed {
            config.control.seed = Some(seed);
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

fn progress_bar(episodes: u64) -> ProgressBar {
    let bar = ProgressBar::new(episodes);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} episodes ({per_sec}) {msg}",
    ) {
        bar.set_style(style);
    }
    bar
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.session_config()?;

    info!(
        episodes = cli.episodes,
        parallel = cli.parallel,
        epsilon = config.control.epsilon,
        alpha = config.control.alpha,
        gamma = config.control.gamma,
        dealer_limit = config.dealer_limit,
        seed = ?config.control.seed,
        "starting training"
    );

    let mut session = BlackjackSession::new(config)?;
    let bar = progress_bar(cli.episodes);
    let start_time = Instant::now();

    let start = session.stats().played;
    if cli.parallel {
        session.train_parallel_with_callback(cli.episodes, cli.batch, |stats| {
            bar.set_message(format!("win rate {:.3}", stats.win_rate()));
            bar.set_position(stats.played - start);
        })?;
    } else {
        let interval = (cli.episodes / 100).max(1);
        session.train_with_callback(cli.episodes, interval, |stats| {
            bar.set_message(format!("win rate {:.3}", stats.win_rate()));
            bar.set_position(stats.played - start);
        })?;
    }
    bar.finish_and_clear();

    let stats = session.stats();
    println!("Training complete!");
    println!("Episodes played: {}", stats.played);
    println!(
        "Won / lost / pushed: {} / {} / {}",
        stats.won, stats.lost, stats.drawn
    );
    println!("Win rate while exploring: {:.2}%", stats.win_rate() * 100.0);
    println!("States learned: {}", stats.states);
    println!("Total time: {:.2}s", start_time.elapsed().as_secs_f64());

    if let Some(path) = &cli.output {
        TrainingOutput::from_session(&session)
            .save_json(path)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Results saved to {}", path.display());
    }

    if cli.eval > 0 {
        let greedy = session.evaluate_greedy(cli.eval)?;
        println!();
        println!("=== Greedy Policy ({} episodes) ===", greedy.played);
        println!("Win rate:  {:.2}%", greedy.win_rate() * 100.0);
        println!("Loss rate: {:.2}%", greedy.lost as f64 / greedy.played as f64 * 100.0);
        println!("Push rate: {:.2}%", greedy.drawn as f64 / greedy.played as f64 * 100.0);
    }

    Ok(())
}
