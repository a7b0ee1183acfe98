use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use flags::{DifficultyFlag, ModeFlag};
use std::path::PathBuf;
use std::sync::Arc;
use wordplay_engine::{AttemptSink, BroadcastSink, EngineConfig, GameContext, NullSink};
use wordplay_gemini::GeminiClient;

mod commands;
mod flags;
mod play;
mod render;

const DEV_LOG_CAPACITY: usize = 256;

#[derive(Parser)]
#[command(name = "wordplay")]
#[command(about = "Word Shrinker and Word Mashup puzzles backed by Gemini", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Engine config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Stream every generation attempt to stderr as JSON lines
    #[arg(long, global = true)]
    dev_log: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate Word Shrinker puzzles
    Puzzle(PuzzleArgs),

    /// Generate a Word Mashup puzzle with its starter image
    Mashup(MashupArgs),

    /// Check an answer against a saved puzzle
    Check(CheckArgs),

    /// Judge a mashup image against a saved mashup puzzle
    Judge(JudgeArgs),

    /// Play timed rounds in the terminal
    Play(PlayArgs),
}

#[derive(Args)]
struct PuzzleArgs {
    #[arg(long, value_enum, default_value = "easy")]
    difficulty: DifficultyFlag,

    /// Number of puzzles to generate
    #[arg(long, default_value_t = 1)]
    count: u32,

    /// Save a picture of every picturable part into this directory
    #[arg(long)]
    image_dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct MashupArgs {
    /// Write the starter image to this path
    #[arg(long)]
    save_image: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct CheckArgs {
    /// Puzzle JSON as printed by `wordplay puzzle --json`
    #[arg(long)]
    puzzle: PathBuf,

    /// One value per box; `_` leaves a box empty
    #[arg(required = true)]
    parts: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct JudgeArgs {
    /// Mashup puzzle JSON as printed by `wordplay mashup --json`
    #[arg(long)]
    puzzle: PathBuf,

    /// The player's edited image
    #[arg(long)]
    image: PathBuf,

    /// The instruction the player gave
    #[arg(long)]
    prompt: String,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct PlayArgs {
    #[arg(long, value_enum, default_value = "shrinker")]
    mode: ModeFlag,

    #[arg(long, value_enum, default_value = "easy")]
    difficulty: DifficultyFlag,

    /// Stop after this many rounds
    #[arg(long)]
    rounds: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    let json_output = match &cli.command {
        Commands::Puzzle(args) => args.json,
        Commands::Mashup(args) => args.json,
        Commands::Check(args) => args.json,
        Commands::Judge(args) => args.json,
        Commands::Play(_) => false,
    };
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    // HTTP internals only with --verbose
    if !cli.verbose {
        builder.filter_module("reqwest", log::LevelFilter::Warn);
        builder.filter_module("hyper", log::LevelFilter::Warn);
        builder.filter_module("rustls", log::LevelFilter::Warn);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = EngineConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    let client = GeminiClient::from_env().context("Failed to set up the Gemini client")?;

    let sink: Arc<dyn AttemptSink> = if cli.dev_log {
        let sink = BroadcastSink::new(DEV_LOG_CAPACITY);
        commands::spawn_dev_log(&sink);
        Arc::new(sink)
    } else {
        Arc::new(NullSink)
    };
    let ctx = GameContext::with_sink(Arc::new(client), config, sink);

    match cli.command {
        Commands::Puzzle(args) => {
            commands::run_puzzle(
                &ctx,
                args.difficulty.as_domain(),
                args.count,
                args.image_dir.as_deref(),
                args.json,
            )
            .await?
        }
        Commands::Mashup(args) => {
            commands::run_mashup(&ctx, args.save_image.as_deref(), args.json).await?
        }
        Commands::Check(args) => {
            commands::run_check(&ctx, &args.puzzle, &args.parts, args.json).await?
        }
        Commands::Judge(args) => {
            commands::run_judge(&ctx, &args.puzzle, &args.image, &args.prompt, args.json).await?
        }
        Commands::Play(args) => {
            play::run(&ctx, args.mode, args.difficulty.as_domain(), args.rounds).await?
        }
    }

    Ok(())
}
