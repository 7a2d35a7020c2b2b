//! Headless skirmish runner.
//!
//! Runs matches without graphics. Status snapshots go to stdout as JSON
//! lines, logs to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Both teams played by the computer
//! cargo run -p skirmish_headless -- run --map maps/valley.json
//!
//! # Leave Red to the player and record its score
//! cargo run -p skirmish_headless -- run --map maps/valley.json --player red \
//!     --record alice --scores scores.json
//!
//! # Show the best scores
//! cargo run -p skirmish_headless -- scores --scores scores.json
//! ```

use std::io;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skirmish_core::config::MatchConfig;
use skirmish_core::factions::Team;
use skirmish_headless::{demo_map, load_map, record_score, MatchRunner, RunConfig, RunError, ScoreBoard};

#[derive(Parser)]
#[command(name = "skirmish_headless")]
#[command(about = "Headless skirmish runner for AI testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Side {
    Red,
    Blue,
}

impl From<Side> for Team {
    fn from(side: Side) -> Self {
        match side {
            Side::Red => Team::Red,
            Side::Blue => Team::Blue,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run a match on a Tiled JSON map
    Run {
        /// Tiled JSON map
        #[arg(short, long)]
        map: PathBuf,

        /// Match tuning (RON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Tick limit
        #[arg(short, long, default_value = "3000")]
        ticks: u64,

        /// RNG seed, overriding the config file
        #[arg(long)]
        seed: Option<u64>,

        /// Team left to the player instead of the AI
        #[arg(long, value_enum)]
        player: Option<Side>,

        /// Ticks between snapshots (0 = final only)
        #[arg(long, default_value = "10")]
        report_every: u64,

        /// Player name to record the final score under
        #[arg(long, requires = "scores")]
        record: Option<String>,

        /// Best-score file
        #[arg(long)]
        scores: Option<PathBuf>,
    },

    /// Print the best-score list
    Scores {
        /// Best-score file
        #[arg(long)]
        scores: PathBuf,
    },

    /// Run on the built-in demo map
    Demo {
        /// Tick limit
        #[arg(short, long, default_value = "600")]
        ticks: u64,

        /// RNG seed
        #[arg(long, default_value = "0")]
        seed: u64,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for snapshots)
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    let result = match cli.command {
        Commands::Run {
            map,
            config,
            ticks,
            seed,
            player,
            report_every,
            record,
            scores,
        } => cmd_run(RunArgs {
            map,
            config,
            ticks,
            seed,
            player: player.map(Team::from),
            report_every,
            record,
            scores,
        }),
        Commands::Scores { scores } => cmd_scores(&scores),
        Commands::Demo { ticks, seed } => cmd_demo(ticks, seed),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

struct RunArgs {
    map: PathBuf,
    config: Option<PathBuf>,
    ticks: u64,
    seed: Option<u64>,
    player: Option<Team>,
    report_every: u64,
    record: Option<String>,
    scores: Option<PathBuf>,
}

/// Run a match on a map file
fn cmd_run(args: RunArgs) -> Result<(), RunError> {
    let map = load_map(&args.map)?;
    let mut match_config = match &args.config {
        Some(path) => MatchConfig::load(path)?,
        None => MatchConfig::default(),
    };
    if let Some(seed) = args.seed {
        match_config.seed = seed;
    }

    tracing::info!(map = %args.map.display(), "starting match");
    let mut runner = MatchRunner::new(
        &map,
        RunConfig {
            match_config,
            max_ticks: args.ticks,
            player: args.player,
            report_every: args.report_every,
        },
    )?;
    let summary = runner.run(&mut io::stdout().lock())?;

    eprintln!("Match finished after {} ticks", summary.ticks);
    match summary.winner {
        Some(team) => eprintln!("  Winner: {}", team.short_name()),
        None => eprintln!("  Undecided"),
    }
    for status in &summary.teams {
        eprintln!(
            "  {:<5} score {:>4}  energy {:>4}/{:<4}  units {}",
            status.team.short_name(),
            status.score,
            status.energy,
            status.max_energy,
            status.units
        );
    }

    if let (Some(name), Some(path)) = (&args.record, &args.scores) {
        let team = args.player.unwrap_or(Team::Red);
        record_score(path, name, summary.score_of(team))?;
        eprintln!("Score recorded in {}", path.display());
    }
    Ok(())
}

/// Print the best-score list
fn cmd_scores(path: &Path) -> Result<(), RunError> {
    let board = ScoreBoard::load(path)?;
    if board.is_empty() {
        eprintln!("No scores recorded yet");
    }
    for (rank, entry) in board.entries().iter().enumerate() {
        println!("{:>3}. {:<20} {}", rank + 1, entry.player, entry.score);
    }
    Ok(())
}

/// Smoke-test run on the built-in map
fn cmd_demo(ticks: u64, seed: u64) -> Result<(), RunError> {
    let config = RunConfig {
        match_config: MatchConfig {
            seed,
            ..MatchConfig::default()
        },
        max_ticks: ticks,
        ..RunConfig::default()
    };
    let mut runner = MatchRunner::new(&demo_map(), config)?;
    let summary = runner.run(&mut io::stdout().lock())?;
    eprintln!(
        "Demo finished after {} ticks (hash {:016x})",
        summary.ticks, summary.state_hash
    );
    Ok(())
}
