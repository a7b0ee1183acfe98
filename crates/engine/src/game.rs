//! Round bookkeeping: the clock, scoring, and the solution reveal.

use crate::backend::InlineImage;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use wordplay_protocol::{MashupJudgment, MashupQuality, Puzzle, SolutionKind, SolutionPart};

pub const SHRINKER_BASE_POINTS: u32 = 5;
/// Judgment score from which a mashup counts as solved.
pub const MASHUP_PASS_SCORE: u8 = 6;
pub const PROCESSING_FAILED_FEEDBACK: &str =
    "Oops! Something went wrong during processing. But your creativity counts!";

/// Counts down one round. Expiry is advisory: nothing in flight is
/// cancelled when it runs out.
#[derive(Debug, Clone, Copy)]
pub struct RoundClock {
    started: Instant,
    duration: Duration,
}

impl RoundClock {
    pub fn start(duration: Duration) -> Self {
        Self {
            started: Instant::now(),
            duration,
        }
    }

    pub fn deadline(&self) -> Instant {
        self.started + self.duration
    }

    pub fn remaining(&self) -> Duration {
        self.duration.saturating_sub(self.started.elapsed())
    }

    pub fn seconds_left(&self) -> u64 {
        self.remaining().as_secs()
    }

    pub fn is_expired(&self) -> bool {
        self.remaining().is_zero()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Scoreboard {
    pub score: u32,
    pub attempted: u32,
    pub correct: u32,
}

impl Scoreboard {
    /// Scores a Word Shrinker answer; returns the points awarded.
    pub fn record_shrinker(&mut self, correct: bool, seconds_left: u64) -> u32 {
        self.attempted += 1;
        if !correct {
            return 0;
        }
        let points =
            SHRINKER_BASE_POINTS.saturating_add(u32::try_from(seconds_left).unwrap_or(u32::MAX));
        self.correct += 1;
        self.score = self.score.saturating_add(points);
        points
    }

    /// Scores a judged mashup; returns the points awarded.
    pub fn record_mashup(&mut self, judgment: &MashupJudgment) -> u32 {
        self.attempted += 1;
        let points = u32::from(judgment.score) * 2;
        if judgment.score >= MASHUP_PASS_SCORE {
            self.correct += 1;
        }
        self.score = self.score.saturating_add(points);
        points
    }

    /// A round that ended without an answer.
    pub fn record_miss(&mut self) {
        self.attempted += 1;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// How a mashup round ended.
#[derive(Debug, Clone, PartialEq)]
pub enum MashupOutcome {
    /// Submitted after the clock ran out; nothing was sent to the backend.
    TimedOut,
    Judged {
        /// `None` when the image edit failed.
        image: Option<InlineImage>,
        judgment: MashupJudgment,
    },
}

/// Judgment shown when the edit or judge step could not run at all.
pub fn processing_failed_judgment() -> MashupJudgment {
    MashupJudgment {
        score: 0,
        feedback: PROCESSING_FAILED_FEEDBACK.to_string(),
        objects_found: Vec::new(),
        mashup_quality: MashupQuality::Low,
    }
}

/// Parts of the board decomposition that are shown as pictures.
pub fn picturable_parts(puzzle: &Puzzle) -> Vec<&str> {
    puzzle
        .primary_deconstruction()
        .iter()
        .filter(|part| part.chars().count() > 1)
        .map(String::as_str)
        .collect()
}

/// Lays out the answer using the board decomposition. `images` maps a part
/// to its image URL; parts without one get an empty value.
pub fn reveal_solution(puzzle: &Puzzle, images: &HashMap<String, String>) -> Vec<SolutionPart> {
    puzzle
        .primary_deconstruction()
        .iter()
        .map(|part| {
            if part.chars().count() > 1 {
                SolutionPart {
                    part: part.clone(),
                    kind: SolutionKind::Image,
                    value: images.get(part).cloned().unwrap_or_default(),
                }
            } else {
                SolutionPart {
                    part: part.clone(),
                    kind: SolutionKind::Letter,
                    value: part.clone(),
                }
            }
        })
        .collect()
}
