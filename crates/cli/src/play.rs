//! The interactive game loop.
//!
//! Lines starting with `:` are commands; anything else is an answer. A
//! shrinker answer is one value per box separated by spaces, a mashup
//! answer is the edit instruction for the starter image.

use crate::commands::{build_submission, save_image_to};
use crate::flags::ModeFlag;
use crate::render;
use anyhow::Result;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use wordplay_engine::{
    picturable_parts, reveal_solution, EngineError, GameContext, InlineImage, MashupOutcome,
    RoundClock, Scoreboard,
};
use wordplay_protocol::{Difficulty, Puzzle, SolutionKind, SolutionPart, WordMashupPuzzle};

const HELP: &str = "Commands: :skip  :stats  :words  :new  :help  :quit";

type Input = Lines<BufReader<Stdin>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Directive {
    Quit,
    Skip,
    Stats,
    Words,
    NewSession,
    Help,
}

impl Directive {
    fn parse(line: &str) -> Option<Self> {
        match line.trim().strip_prefix(':')?.trim().to_ascii_lowercase().as_str() {
            "q" | "quit" | "exit" => Some(Self::Quit),
            "s" | "skip" => Some(Self::Skip),
            "stats" => Some(Self::Stats),
            "words" => Some(Self::Words),
            "n" | "new" => Some(Self::NewSession),
            _ => Some(Self::Help),
        }
    }
}

enum Entry {
    Line(String),
    TimedOut,
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoundEnd {
    Played,
    NewSession,
    Quit,
}

pub(crate) async fn run(
    ctx: &GameContext,
    mode: ModeFlag,
    difficulty: Difficulty,
    rounds: Option<u32>,
) -> Result<()> {
    spawn_prefetch(ctx);
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut board = Scoreboard::default();
    let mut played = 0u32;

    println!("{HELP}");
    loop {
        if rounds.is_some_and(|max| played >= max) {
            break;
        }
        let end = match mode {
            ModeFlag::Shrinker => shrinker_round(ctx, difficulty, &mut board, &mut input).await?,
            ModeFlag::Mashup => mashup_round(ctx, &mut board, &mut input).await?,
        };
        match end {
            RoundEnd::Played => {
                played += 1;
                println!("{}", render::scoreboard(&board));
            }
            RoundEnd::NewSession => {
                ctx.new_session();
                board.reset();
                played = 0;
                println!("New session started.");
                spawn_prefetch(ctx);
            }
            RoundEnd::Quit => break,
        }
    }

    println!("Final {}", render::scoreboard(&board));
    Ok(())
}

fn spawn_prefetch(ctx: &GameContext) {
    let ctx = ctx.clone();
    tokio::spawn(async move { ctx.prefetch_all().await });
}

async fn shrinker_round(
    ctx: &GameContext,
    difficulty: Difficulty,
    board: &mut Scoreboard,
    input: &mut Input,
) -> Result<RoundEnd> {
    let puzzle = ctx.take_puzzle(difficulty).await;
    let clock = ctx.round_clock();
    println!("{}", render::board(&puzzle, clock.seconds_left()));

    loop {
        let line = match read_line(input, &clock).await? {
            Entry::Line(line) => line,
            Entry::TimedOut => {
                println!("\nTime's up!");
                board.record_miss();
                reveal(ctx, &puzzle).await;
                return Ok(RoundEnd::Played);
            }
            Entry::Eof => return Ok(RoundEnd::Quit),
        };

        if let Some(directive) = Directive::parse(&line) {
            match directive {
                Directive::Skip => {
                    board.record_miss();
                    reveal(ctx, &puzzle).await;
                    return Ok(RoundEnd::Played);
                }
                other => match handle_common(ctx, other) {
                    Some(end) => return Ok(end),
                    None => continue,
                },
            }
        }

        let values: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        if values.is_empty() {
            continue;
        }
        let seconds_left = clock.seconds_left();
        let submission = build_submission(&puzzle, &values);
        match ctx.submit_answer(&puzzle, &submission).await {
            Ok(outcome) => {
                println!("{}", render::answer_outcome(&outcome));
                let points = board.record_shrinker(outcome.correct, seconds_left);
                if outcome.correct {
                    println!("+{points} points");
                } else {
                    reveal(ctx, &puzzle).await;
                }
                return Ok(RoundEnd::Played);
            }
            Err(EngineError::IncompleteSubmission { missing, total }) => {
                println!("Fill every box first ({missing} of {total} empty).");
            }
            Err(err) => {
                log::warn!("Answer check failed: {err}");
                println!("Could not check that answer, try again.");
            }
        }
    }
}

async fn mashup_round(
    ctx: &GameContext,
    board: &mut Scoreboard,
    input: &mut Input,
) -> Result<RoundEnd> {
    let puzzle = ctx.take_mashup_puzzle().await;
    let clock = ctx.round_clock();
    println!("{}", render::mashup_board(&puzzle, clock.seconds_left()));
    show_starter(&puzzle);

    loop {
        let line = match read_line(input, &clock).await? {
            Entry::Line(line) => line,
            Entry::TimedOut => {
                println!("\nTime's up! It was {}.", puzzle.word);
                board.record_miss();
                return Ok(RoundEnd::Played);
            }
            Entry::Eof => return Ok(RoundEnd::Quit),
        };

        if let Some(directive) = Directive::parse(&line) {
            match directive {
                Directive::Skip => {
                    println!("It was {}.", puzzle.word);
                    board.record_miss();
                    return Ok(RoundEnd::Played);
                }
                other => match handle_common(ctx, other) {
                    Some(end) => return Ok(end),
                    None => continue,
                },
            }
        }

        let instruction = line.trim();
        if instruction.is_empty() {
            continue;
        }
        println!("Painting...");
        match ctx.play_mashup(&puzzle, instruction, &clock).await {
            MashupOutcome::TimedOut => {
                println!("Too late! It was {}.", puzzle.word);
                board.record_miss();
            }
            MashupOutcome::Judged { image, judgment } => {
                if let Some(image) = image {
                    show_image(&format!("{}-mashup", puzzle.word), &image);
                }
                println!("{}", render::judgment(&judgment));
                let points = board.record_mashup(&judgment);
                println!("+{points} points");
            }
        }
        return Ok(RoundEnd::Played);
    }
}

/// Directives that mean the same in every mode. `None` keeps the round going.
fn handle_common(ctx: &GameContext, directive: Directive) -> Option<RoundEnd> {
    match directive {
        Directive::Quit => Some(RoundEnd::Quit),
        Directive::NewSession => Some(RoundEnd::NewSession),
        Directive::Stats => {
            println!("{}", render::stats(&ctx.stats()));
            None
        }
        Directive::Words => {
            let words = ctx.words(None);
            if words.is_empty() {
                println!("No words yet.");
            } else {
                println!("{}", words.join(", "));
            }
            None
        }
        Directive::Help | Directive::Skip => {
            println!("{HELP}");
            None
        }
    }
}

async fn read_line(input: &mut Input, clock: &RoundClock) -> Result<Entry> {
    print!("> ");
    std::io::stdout().flush()?;
    tokio::select! {
        line = input.next_line() => Ok(match line? {
            Some(line) => Entry::Line(line),
            None => Entry::Eof,
        }),
        _ = tokio::time::sleep_until(clock.deadline()) => Ok(Entry::TimedOut),
    }
}

async fn reveal(ctx: &GameContext, puzzle: &Puzzle) {
    let images = ctx.part_images(&picturable_parts(puzzle)).await;
    let solution = reveal_solution(puzzle, &images);
    println!("{}", render::solution(&solution));
    for (part, path) in save_solution_images(&image_dir(), &puzzle.word, &solution) {
        println!("  {part}: {}", path.display());
    }
}

/// Writes every pictured part of a revealed solution under `dir`, in
/// board order. Parts whose picture cannot be decoded or written are
/// logged and left out.
fn save_solution_images(
    dir: &Path,
    word: &str,
    solution: &[SolutionPart],
) -> Vec<(String, PathBuf)> {
    let mut saved = Vec::new();
    for part in solution {
        if part.kind != SolutionKind::Image || part.value.is_empty() {
            continue;
        }
        let image = match InlineImage::from_data_url(&part.value) {
            Ok(image) => image,
            Err(err) => {
                log::warn!("Picture for {} unreadable: {err}", part.part);
                continue;
            }
        };
        let path = image_path(dir, &format!("{word}-{}", part.part), &image);
        match save_image_to(&path, &image) {
            Ok(()) => saved.push((part.part.clone(), path)),
            Err(err) => log::warn!("{err:#}"),
        }
    }
    saved
}

fn show_starter(puzzle: &WordMashupPuzzle) {
    let Some(url) = puzzle.starter_image_url.as_deref() else {
        println!("(starter image unavailable)");
        return;
    };
    match InlineImage::from_data_url(url) {
        Ok(image) => show_image(&format!("{}-starter", puzzle.word), &image),
        Err(err) => log::warn!("Starter image unreadable: {err}"),
    }
}

/// Terminals cannot show the pictures, so they go to the temp directory.
fn show_image(stem: &str, image: &InlineImage) {
    let path = image_path(&image_dir(), stem, image);
    match save_image_to(&path, image) {
        Ok(()) => println!("Image: {}", path.display()),
        Err(err) => log::warn!("{err:#}"),
    }
}

fn image_dir() -> PathBuf {
    std::env::temp_dir().join("wordplay")
}

fn image_path(dir: &Path, stem: &str, image: &InlineImage) -> PathBuf {
    dir.join(format!("{}.{}", stem.to_lowercase(), image.extension()))
}
