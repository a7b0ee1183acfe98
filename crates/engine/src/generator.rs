use crate::attempt_log::{attempt_record, AttemptSink};
use crate::backend::{GenerativeBackend, JsonRequest, Operation};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::images::ImageStudio;
use crate::payload::parse_structured;
use crate::prompts;
use crate::stats::CallCounters;
use crate::validator::{self, Rejection};
use crate::word_tracker::WordTracker;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use wordplay_protocol::{
    response_schema, Difficulty, GameMode, MashupCandidate, Puzzle, PuzzleCandidate,
    SolutionEntry, WordMashupPuzzle,
};

pub const FALLBACK_WORD: &str = "STARFISH";
pub const FALLBACK_STARTER: &str = "STAR";

/// The Word Shrinker puzzle served when every attempt failed.
pub fn fallback_puzzle() -> Puzzle {
    let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    Puzzle {
        word: FALLBACK_WORD.to_string(),
        deconstructions: vec![strings(&["STAR", "F", "I", "S", "H"])],
        solutions: vec![SolutionEntry {
            part: "STAR".to_string(),
            alternatives: strings(&["STAR", "SUN", "CELESTIAL"]),
        }],
    }
}

enum AttemptState<T> {
    Attempting(u32),
    Accepted(T),
    Exhausted,
}

/// Why one attempt produced nothing usable.
struct AttemptFailure {
    reason: String,
    payload: String,
}

impl AttemptFailure {
    fn collaborator(err: EngineError, payload: String) -> Self {
        Self {
            reason: format!("Exception during generation/parsing.\n{err}"),
            payload,
        }
    }

    fn rejected(rejection: Rejection, payload: String) -> Self {
        Self {
            reason: rejection.to_string(),
            payload,
        }
    }
}

/// Bounded-retry puzzle generation.
///
/// Attempts run strictly one after another. Each one is a single backend
/// call whose payload goes through the validator; the first accepted puzzle
/// wins. When every attempt fails the fixed fallback is served instead, so
/// callers always get a playable puzzle. Accepted and fallback words are
/// recorded in the word tracker, and every attempt is written to the sink.
pub struct RetryingGenerator<'a> {
    backend: &'a dyn GenerativeBackend,
    tracker: &'a Mutex<WordTracker>,
    counters: &'a CallCounters,
    sink: &'a dyn AttemptSink,
    config: &'a EngineConfig,
    session: Option<(&'a AtomicU64, u64)>,
}

impl<'a> RetryingGenerator<'a> {
    pub fn new(
        backend: &'a dyn GenerativeBackend,
        tracker: &'a Mutex<WordTracker>,
        counters: &'a CallCounters,
        sink: &'a dyn AttemptSink,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            backend,
            tracker,
            counters,
            sink,
            config,
            session: None,
        }
    }

    /// Ties generation to the session whose counter reads `started` now.
    /// Words produced after the counter moves on are not tracked.
    pub fn for_session(mut self, epoch: &'a AtomicU64, started: u64) -> Self {
        self.session = Some((epoch, started));
        self
    }

    pub async fn generate_puzzle(&self, difficulty: Difficulty) -> Puzzle {
        let excluded = self.tracker().exclusion_list(&[]);
        let request = JsonRequest {
            operation: Operation::GeneratePuzzle,
            model: self.config.text_model.clone(),
            system_instruction: Some(prompts::PUZZLE_SYSTEM_INSTRUCTION.to_string()),
            prompt: prompts::puzzle_prompt(difficulty, &excluded),
            response_schema: response_schema::<PuzzleCandidate>(),
            image: None,
        };
        let request = &request;

        let accepted = self
            .run_attempts(
                request.operation,
                move |_| self.puzzle_attempt(request, difficulty),
                |puzzle: &Puzzle| serde_json::to_string_pretty(puzzle).unwrap_or_default(),
            )
            .await;

        let puzzle = accepted.unwrap_or_else(|| {
            log::warn!("All retries failed for {difficulty} puzzle. Returning fallback puzzle.");
            fallback_puzzle()
        });
        self.record_word(GameMode::WordShrinker, &puzzle.word);
        puzzle
    }

    pub async fn generate_mashup_puzzle(&self) -> WordMashupPuzzle {
        let excluded = self.tracker().exclusion_list(&self.config.overused_words);
        log::info!("Mashup generation - excluding {} words", excluded.len());
        let request = JsonRequest {
            operation: Operation::GenerateMashupPuzzle,
            model: self.config.text_model.clone(),
            system_instruction: None,
            prompt: prompts::mashup_prompt(&excluded),
            response_schema: response_schema::<MashupCandidate>(),
            image: None,
        };
        let request = &request;

        let accepted = self
            .run_attempts(
                request.operation,
                move |_| self.mashup_attempt(request),
                describe_mashup,
            )
            .await;

        let puzzle = match accepted {
            Some(puzzle) => puzzle,
            None => {
                log::warn!("All mashup retries failed. Returning fallback puzzle.");
                self.fallback_mashup().await
            }
        };
        self.record_word(GameMode::WordMashup, &puzzle.word);
        puzzle
    }

    async fn run_attempts<T, F, Fut>(
        &self,
        operation: Operation,
        mut attempt: F,
        describe: impl Fn(&T) -> String,
    ) -> Option<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = std::result::Result<T, AttemptFailure>>,
    {
        let max_attempts = self.config.max_retries.max(1);
        let mut state = AttemptState::Attempting(1);
        loop {
            state = match state {
                AttemptState::Attempting(n) if n > max_attempts => AttemptState::Exhausted,
                AttemptState::Attempting(n) => match attempt(n).await {
                    Ok(value) => {
                        self.sink.record(attempt_record(
                            operation.as_str(),
                            n,
                            true,
                            describe(&value),
                            None,
                        ));
                        AttemptState::Accepted(value)
                    }
                    Err(failure) => {
                        log::warn!("Attempt {n} of {operation} failed: {}", failure.reason);
                        self.sink.record(attempt_record(
                            operation.as_str(),
                            n,
                            false,
                            failure.payload,
                            Some(failure.reason),
                        ));
                        AttemptState::Attempting(n + 1)
                    }
                },
                AttemptState::Accepted(value) => return Some(value),
                AttemptState::Exhausted => return None,
            };
        }
    }

    async fn puzzle_attempt(
        &self,
        request: &JsonRequest,
        difficulty: Difficulty,
    ) -> std::result::Result<Puzzle, AttemptFailure> {
        let raw = self
            .call_json(request)
            .await
            .map_err(|err| AttemptFailure::collaborator(err, "{}".to_string()))?;
        let candidate: PuzzleCandidate = parse_structured(&raw)
            .map_err(|err| AttemptFailure::collaborator(err, raw.clone()))?;
        validator::validate_puzzle(candidate, difficulty)
            .map_err(|rejection| AttemptFailure::rejected(rejection, raw))
    }

    async fn mashup_attempt(
        &self,
        request: &JsonRequest,
    ) -> std::result::Result<WordMashupPuzzle, AttemptFailure> {
        let raw = self
            .call_json(request)
            .await
            .map_err(|err| AttemptFailure::collaborator(err, "{}".to_string()))?;
        let candidate: MashupCandidate = parse_structured(&raw)
            .map_err(|err| AttemptFailure::collaborator(err, raw.clone()))?;
        let mashup = validator::validate_mashup(candidate)
            .map_err(|rejection| AttemptFailure::rejected(rejection, raw.clone()))?;
        let image = self
            .images()
            .generate_starter_image(&mashup.starter_word)
            .await
            .map_err(|err| AttemptFailure::collaborator(err, raw))?;
        Ok(WordMashupPuzzle {
            word: mashup.word,
            starter_word: mashup.starter_word,
            starter_image_url: Some(image.to_data_url()),
            objects: mashup.objects,
        })
    }

    async fn fallback_mashup(&self) -> WordMashupPuzzle {
        let starter_image_url = match self.images().generate_starter_image(FALLBACK_STARTER).await {
            Ok(image) => Some(image.to_data_url()),
            Err(err) => {
                log::warn!("Fallback mashup has no starter image: {err}");
                None
            }
        };
        WordMashupPuzzle {
            word: FALLBACK_WORD.to_string(),
            starter_word: FALLBACK_STARTER.to_string(),
            starter_image_url,
            objects: vec![FALLBACK_STARTER.to_string(), "FISH".to_string()],
        }
    }

    async fn call_json(&self, request: &JsonRequest) -> Result<String> {
        self.counters.record(request.operation, &request.model);
        self.backend.generate_json(request).await
    }

    fn images(&self) -> ImageStudio<'a> {
        ImageStudio::new(self.backend, self.counters, self.config)
    }

    fn tracker(&self) -> MutexGuard<'a, WordTracker> {
        self.tracker
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn record_word(&self, mode: GameMode, word: &str) {
        let mut tracker = self.tracker();
        if !self.session_is_current() {
            log::debug!("Not tracking {mode} word {word} from a previous session");
            return;
        }
        if tracker.record(mode, word) {
            log::info!("Tracked {mode} word {word}");
        }
    }

    fn session_is_current(&self) -> bool {
        self.session
            .map_or(true, |(epoch, started)| epoch.load(Ordering::SeqCst) == started)
    }
}

/// Attempt-log text for a mashup puzzle, with the image payload elided.
fn describe_mashup(puzzle: &WordMashupPuzzle) -> String {
    let mut shown = puzzle.clone();
    shown.starter_image_url = shown
        .starter_image_url
        .map(|url| format!("<image data URL, {} chars>", url.len()));
    serde_json::to_string_pretty(&shown).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_puzzle_is_internally_consistent() {
        let puzzle = fallback_puzzle();
        assert_eq!(puzzle.deconstructions[0].concat(), puzzle.word);
        assert_eq!(
            puzzle.solution_for("STAR").map(|s| s.alternatives.len()),
            Some(3)
        );
    }

    #[test]
    fn mashup_description_elides_image() {
        let puzzle = WordMashupPuzzle {
            word: "SUNFLOWER".to_string(),
            starter_word: "SUN".to_string(),
            starter_image_url: Some("data:image/png;base64,AAAAAAAA".to_string()),
            objects: vec!["SUN".to_string(), "FLOWER".to_string()],
        };
        let text = describe_mashup(&puzzle);
        assert!(text.contains("<image data URL, 30 chars>"));
        assert!(!text.contains("AAAAAAAA"));
    }
}
