use crate::render;
use anyhow::{bail, Context as AnyhowContext, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tokio::sync::broadcast::error::RecvError;
use wordplay_engine::{picturable_parts, BroadcastSink, GameContext, InlineImage};
use wordplay_protocol::{Difficulty, PartKind, Puzzle, SubmissionPart, WordMashupPuzzle};

/// Box value that leaves the box empty.
pub(crate) const EMPTY_BOX: &str = "_";

pub(crate) async fn run_puzzle(
    ctx: &GameContext,
    difficulty: Difficulty,
    count: u32,
    image_dir: Option<&Path>,
    json: bool,
) -> Result<()> {
    let mut puzzles = Vec::with_capacity(count as usize);
    for _ in 0..count.max(1) {
        let puzzle = ctx.generate_puzzle(difficulty).await;
        if let Some(dir) = image_dir {
            save_part_images(ctx, &puzzle, dir).await?;
        }
        puzzles.push(puzzle);
    }

    if json {
        match puzzles.as_slice() {
            [single] => print_json(single)?,
            many => print_json(&many)?,
        }
    } else {
        for puzzle in &puzzles {
            println!("{}", render::puzzle_summary(puzzle));
        }
    }
    Ok(())
}

pub(crate) async fn run_mashup(
    ctx: &GameContext,
    save_image: Option<&Path>,
    json: bool,
) -> Result<()> {
    let puzzle = ctx.generate_mashup_puzzle().await;
    if let Some(path) = save_image {
        match puzzle.starter_image_url.as_deref() {
            Some(url) => {
                let image = InlineImage::from_data_url(url)?;
                save_image_to(path, &image)?;
                log::info!("Starter image saved to {}", path.display());
            }
            None => log::warn!("No starter image to save for {}", puzzle.word),
        }
    }

    if json {
        print_json(&puzzle)?;
    } else {
        println!("{}", render::mashup_summary(&puzzle));
    }
    Ok(())
}

pub(crate) async fn run_check(
    ctx: &GameContext,
    puzzle_path: &Path,
    values: &[String],
    json: bool,
) -> Result<()> {
    let puzzle: Puzzle = read_json(puzzle_path)?;
    let submission = build_submission(&puzzle, values);
    let outcome = ctx.submit_answer(&puzzle, &submission).await?;

    if json {
        print_json(&outcome)?;
    } else {
        println!("{}", render::answer_outcome(&outcome));
    }
    Ok(())
}

pub(crate) async fn run_judge(
    ctx: &GameContext,
    puzzle_path: &Path,
    image_path: &Path,
    prompt: &str,
    json: bool,
) -> Result<()> {
    let puzzle: WordMashupPuzzle = read_json(puzzle_path)?;
    let image = read_image(image_path)?;
    let judgment = ctx.judge_mashup(&puzzle, prompt, &image).await;

    if json {
        print_json(&judgment)?;
    } else {
        println!("{}", render::judgment(&judgment));
    }
    Ok(())
}

/// Streams attempt records to stderr, one JSON object per line.
pub(crate) fn spawn_dev_log(sink: &BroadcastSink) {
    let mut rx = sink.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(record) => match serde_json::to_string(&record) {
                    Ok(line) => eprintln!("{line}"),
                    Err(err) => log::warn!("Unprintable attempt record: {err}"),
                },
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("Dev log skipped {skipped} attempt records");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

/// Lays the player's values over the board. Box kinds follow the board
/// decomposition; values past the board are typed by their length.
/// Missing values and [`EMPTY_BOX`] become empty boxes.
pub(crate) fn build_submission(puzzle: &Puzzle, values: &[String]) -> Vec<SubmissionPart> {
    let board = puzzle.primary_deconstruction();
    let len = board.len().max(values.len());

    (0..len)
        .map(|idx| {
            let value = values
                .get(idx)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty() && *v != EMPTY_BOX);
            let kind = match board.get(idx) {
                Some(part) => part_kind(part),
                None => value.map(part_kind).unwrap_or(PartKind::Letter),
            };
            match value {
                Some(value) => SubmissionPart::filled(kind, value),
                None => SubmissionPart::empty(kind),
            }
        })
        .collect()
}

fn part_kind(part: &str) -> PartKind {
    if part.chars().count() > 1 {
        PartKind::Word
    } else {
        PartKind::Letter
    }
}

async fn save_part_images(ctx: &GameContext, puzzle: &Puzzle, dir: &Path) -> Result<()> {
    let parts = picturable_parts(puzzle);
    let images = ctx.part_images(&parts).await;
    for (part, url) in &images {
        let image = InlineImage::from_data_url(url)?;
        let path = dir.join(format!(
            "{}-{}.{}",
            puzzle.word.to_lowercase(),
            part.to_lowercase(),
            image.extension()
        ));
        save_image_to(&path, &image)?;
    }
    if images.len() < parts.len() {
        log::warn!(
            "Saved {} of {} part images for {}",
            images.len(),
            parts.len(),
            puzzle.word
        );
    }
    Ok(())
}

pub(crate) fn save_image_to(path: &Path, image: &InlineImage) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    fs::write(path, &image.data).with_context(|| format!("Failed to write {}", path.display()))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid puzzle file {}", path.display()))
}

fn read_image(path: &Path) -> Result<InlineImage> {
    let Some(mime_type) = mime_for_path(path) else {
        bail!(
            "Unsupported image type {} (expected png, jpg, webp or gif)",
            path.display()
        );
    };
    let data = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(InlineImage::new(mime_type, data))
}

fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
