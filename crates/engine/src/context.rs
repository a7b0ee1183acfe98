use crate::answer::check_answer;
use crate::attempt_log::{AttemptSink, NullSink};
use crate::backend::{GenerativeBackend, InlineImage};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::game::{processing_failed_judgment, MashupOutcome, RoundClock};
use crate::generator::RetryingGenerator;
use crate::images::ImageStudio;
use crate::single_flight::SingleFlight;
use crate::stats::CallCounters;
use crate::validator::normalize;
use crate::verifier::AnswerVerifier;
use crate::word_tracker::WordTracker;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinSet;
use wordplay_protocol::{
    Difficulty, GameMode, MashupJudgment, Puzzle, SessionStats, SubmissionPart,
    WordMashupPuzzle,
};

/// Single-flight key shared by every mashup generation request of a session.
pub const MASHUP_FLIGHT_KEY: &str = "generate_word_mashup_puzzle";

pub const LOCAL_MATCH_REASONING: &str = "Correct!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckedBy {
    /// Matched a known decomposition; no backend call was made.
    Local,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub reasoning: String,
    pub checked_by: CheckedBy,
}

/// One flight per session and request, so a new session never joins a
/// generation started by the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FlightKey<K> {
    session: u64,
    request: K,
}

impl<K> FlightKey<K> {
    fn new(session: u64, request: K) -> Self {
        Self { session, request }
    }
}

impl<K: fmt::Display> fmt::Display for FlightKey<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (session {})", self.request, self.session)
    }
}

#[derive(Default)]
struct Prefetched {
    puzzles: HashMap<Difficulty, Puzzle>,
    mashup: Option<WordMashupPuzzle>,
    /// Words already handed out this session, so a late prefetch result
    /// cannot serve the same puzzle twice.
    served: HashSet<String>,
}

struct Inner {
    backend: Arc<dyn GenerativeBackend>,
    config: EngineConfig,
    tracker: Mutex<WordTracker>,
    counters: CallCounters,
    sink: Arc<dyn AttemptSink>,
    puzzle_flights: SingleFlight<FlightKey<Difficulty>, Puzzle>,
    mashup_flights: SingleFlight<FlightKey<&'static str>, WordMashupPuzzle>,
    prefetched: Mutex<Prefetched>,
    epoch: AtomicU64,
}

/// One player session.
///
/// Owns every piece of state the pipeline shares between calls: the word
/// tracker, call counters, in-flight registries and prefetched puzzles.
/// Cloning is cheap and yields a handle to the same session.
#[derive(Clone)]
pub struct GameContext {
    inner: Arc<Inner>,
}

impl GameContext {
    pub fn new(backend: Arc<dyn GenerativeBackend>, config: EngineConfig) -> Self {
        Self::with_sink(backend, config, Arc::new(NullSink))
    }

    pub fn with_sink(
        backend: Arc<dyn GenerativeBackend>,
        config: EngineConfig,
        sink: Arc<dyn AttemptSink>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                config,
                tracker: Mutex::new(WordTracker::new()),
                counters: CallCounters::new(),
                sink,
                puzzle_flights: SingleFlight::new(),
                mashup_flights: SingleFlight::new(),
                prefetched: Mutex::new(Prefetched::default()),
                epoch: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn round_clock(&self) -> RoundClock {
        RoundClock::start(self.inner.config.round_duration())
    }

    /// Generates a Word Shrinker puzzle. Concurrent requests for the same
    /// difficulty share one generation.
    pub async fn generate_puzzle(&self, difficulty: Difficulty) -> Puzzle {
        self.generate_puzzle_in(self.epoch(), difficulty).await
    }

    /// Generates a Word Mashup puzzle. Concurrent requests share one
    /// generation.
    pub async fn generate_mashup_puzzle(&self) -> WordMashupPuzzle {
        self.generate_mashup_in(self.epoch()).await
    }

    async fn generate_puzzle_in(&self, epoch: u64, difficulty: Difficulty) -> Puzzle {
        let shared = self
            .inner
            .puzzle_flights
            .run(FlightKey::new(epoch, difficulty), || async {
                Ok(self.generator(epoch).generate_puzzle(difficulty).await)
            })
            .await;
        match shared {
            Ok(puzzle) => puzzle,
            Err(err) => {
                log::warn!("{err}; generating {difficulty} puzzle directly");
                self.generator(epoch).generate_puzzle(difficulty).await
            }
        }
    }

    async fn generate_mashup_in(&self, epoch: u64) -> WordMashupPuzzle {
        let shared = self
            .inner
            .mashup_flights
            .run(FlightKey::new(epoch, MASHUP_FLIGHT_KEY), || async {
                Ok(self.generator(epoch).generate_mashup_puzzle().await)
            })
            .await;
        match shared {
            Ok(puzzle) => puzzle,
            Err(err) => {
                log::warn!("{err}; generating mashup puzzle directly");
                self.generator(epoch).generate_mashup_puzzle().await
            }
        }
    }

    /// Checks an answer locally first and only asks the backend when no
    /// known decomposition matches.
    pub async fn submit_answer(
        &self,
        puzzle: &Puzzle,
        submission: &[SubmissionPart],
    ) -> Result<AnswerOutcome> {
        let values: Vec<String> = submission
            .iter()
            .map(|part| part.value.as_deref().map(normalize).unwrap_or_default())
            .collect();
        if check_answer(puzzle, &values) {
            log::debug!("Answer for {} matched locally", puzzle.word);
            return Ok(AnswerOutcome {
                correct: true,
                reasoning: LOCAL_MATCH_REASONING.to_string(),
                checked_by: CheckedBy::Local,
            });
        }

        let result = self.verifier().verify(puzzle, submission).await?;
        Ok(AnswerOutcome {
            correct: result.correct,
            reasoning: result.reasoning,
            checked_by: CheckedBy::Remote,
        })
    }

    pub async fn generate_part_image(&self, part: &str) -> Result<InlineImage> {
        self.images().generate_part_image(part).await
    }

    /// Fetches pictures for every picturable part of the board
    /// decomposition, keyed by part. Failed parts are left out.
    pub async fn part_images(&self, parts: &[&str]) -> HashMap<String, String> {
        let mut tasks = JoinSet::new();
        for part in parts.iter().copied().collect::<HashSet<_>>() {
            let ctx = self.clone();
            let part = part.to_string();
            tasks.spawn(async move {
                let image = ctx.generate_part_image(&part).await;
                (part, image)
            });
        }

        let mut images = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((part, Ok(image))) => {
                    images.insert(part, image.to_data_url());
                }
                Ok((_, Err(_))) => {}
                Err(err) => log::warn!("Part image task failed: {err}"),
            }
        }
        images
    }

    pub async fn edit_mashup_image(
        &self,
        instruction: &str,
        starter: &InlineImage,
    ) -> Result<InlineImage> {
        self.images().edit_mashup_image(instruction, starter).await
    }

    pub async fn judge_mashup(
        &self,
        puzzle: &WordMashupPuzzle,
        user_prompt: &str,
        image: &InlineImage,
    ) -> MashupJudgment {
        self.verifier()
            .judge_mashup_creation(puzzle, user_prompt, image)
            .await
    }

    /// Runs a mashup submission: edit the starter image, then judge the
    /// result. A submission after the clock ran out makes no call at all.
    pub async fn play_mashup(
        &self,
        puzzle: &WordMashupPuzzle,
        user_prompt: &str,
        clock: &RoundClock,
    ) -> MashupOutcome {
        if clock.is_expired() {
            return MashupOutcome::TimedOut;
        }

        let edited = match puzzle.starter_image_url.as_deref() {
            Some(url) => match InlineImage::from_data_url(url) {
                Ok(starter) => self.edit_mashup_image(user_prompt, &starter).await,
                Err(err) => Err(err),
            },
            None => Err(EngineError::Other(format!(
                "mashup '{}' has no starter image",
                puzzle.word
            ))),
        };

        match edited {
            Ok(image) => {
                let judgment = self.judge_mashup(puzzle, user_prompt, &image).await;
                MashupOutcome::Judged {
                    image: Some(image),
                    judgment,
                }
            }
            Err(err) => {
                log::warn!("Mashup processing failed: {err}");
                MashupOutcome::Judged {
                    image: None,
                    judgment: processing_failed_judgment(),
                }
            }
        }
    }

    /// Requests an Easy, a Hard and a mashup puzzle at once and keeps them
    /// for the next rounds.
    pub async fn prefetch_all(&self) {
        let epoch = self.epoch();
        log::info!("Pre-fetching initial puzzles...");
        let (easy, hard, mashup) = tokio::join!(
            self.generate_puzzle_in(epoch, Difficulty::Easy),
            self.generate_puzzle_in(epoch, Difficulty::Hard),
            self.generate_mashup_in(epoch),
        );
        self.store_puzzle(epoch, Difficulty::Easy, easy);
        self.store_puzzle(epoch, Difficulty::Hard, hard);
        self.store_mashup(epoch, mashup);
    }

    /// Serves the prefetched puzzle for `difficulty` if there is one,
    /// otherwise generates on demand. Either way a refill starts in the
    /// background.
    pub async fn take_puzzle(&self, difficulty: Difficulty) -> Puzzle {
        let prefetched = self.prefetched().puzzles.remove(&difficulty);
        let puzzle = match prefetched {
            Some(puzzle) => {
                log::info!("Starting with prefetched {difficulty} puzzle");
                puzzle
            }
            None => {
                log::info!("No prefetched {difficulty} puzzle, generating on demand");
                self.generate_puzzle(difficulty).await
            }
        };
        self.prefetched().served.insert(puzzle.word.clone());
        self.spawn_puzzle_refill(difficulty);
        puzzle
    }

    pub async fn take_mashup_puzzle(&self) -> WordMashupPuzzle {
        let prefetched = self.prefetched().mashup.take();
        let puzzle = match prefetched {
            Some(puzzle) => {
                log::info!("Starting with prefetched mashup puzzle");
                puzzle
            }
            None => {
                log::info!("No prefetched mashup puzzle, generating on demand");
                self.generate_mashup_puzzle().await
            }
        };
        self.prefetched().served.insert(puzzle.word.clone());
        self.spawn_mashup_refill();
        puzzle
    }

    pub fn has_prefetched(&self, difficulty: Difficulty) -> bool {
        self.prefetched().puzzles.contains_key(&difficulty)
    }

    pub fn has_prefetched_mashup(&self) -> bool {
        self.prefetched().mashup.is_some()
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            words: self.tracker().counts(),
            calls: self.inner.counters.snapshot(),
        }
    }

    pub fn words(&self, mode: Option<GameMode>) -> Vec<String> {
        self.tracker().words(mode)
    }

    pub fn reset_call_counts(&self) {
        self.inner.counters.reset();
    }

    /// Starts a fresh session: forgets generated words and prefetched
    /// puzzles. Results still in flight from the old session are dropped
    /// when they arrive and their words are never tracked.
    pub fn new_session(&self) {
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        self.tracker().clear();
        *self.prefetched() = Prefetched::default();
        log::info!("Started a new session");
    }

    fn spawn_puzzle_refill(&self, difficulty: Difficulty) {
        let ctx = self.clone();
        let epoch = self.epoch();
        tokio::spawn(async move {
            log::debug!("Pre-fetching next {difficulty} puzzle");
            let puzzle = ctx.generate_puzzle_in(epoch, difficulty).await;
            ctx.store_puzzle(epoch, difficulty, puzzle);
        });
    }

    fn spawn_mashup_refill(&self) {
        let ctx = self.clone();
        let epoch = self.epoch();
        tokio::spawn(async move {
            log::debug!("Pre-fetching next mashup puzzle");
            let puzzle = ctx.generate_mashup_in(epoch).await;
            ctx.store_mashup(epoch, puzzle);
        });
    }

    fn store_puzzle(&self, epoch: u64, difficulty: Difficulty, puzzle: Puzzle) {
        if epoch != self.epoch() {
            log::debug!("Discarding {difficulty} puzzle from a previous session");
            return;
        }
        let mut prefetched = self.prefetched();
        if prefetched.served.contains(&puzzle.word) {
            log::debug!("Discarding already served {difficulty} puzzle {}", puzzle.word);
            return;
        }
        prefetched.puzzles.entry(difficulty).or_insert(puzzle);
    }

    fn store_mashup(&self, epoch: u64, puzzle: WordMashupPuzzle) {
        if epoch != self.epoch() {
            log::debug!("Discarding mashup puzzle from a previous session");
            return;
        }
        let mut prefetched = self.prefetched();
        if prefetched.served.contains(&puzzle.word) {
            log::debug!("Discarding already served mashup puzzle {}", puzzle.word);
            return;
        }
        prefetched.mashup.get_or_insert(puzzle);
    }

    fn epoch(&self) -> u64 {
        self.inner.epoch.load(Ordering::SeqCst)
    }

    fn generator(&self, epoch: u64) -> RetryingGenerator<'_> {
        let inner = &*self.inner;
        RetryingGenerator::new(
            inner.backend.as_ref(),
            &inner.tracker,
            &inner.counters,
            inner.sink.as_ref(),
            &inner.config,
        )
        .for_session(&inner.epoch, epoch)
    }

    fn verifier(&self) -> AnswerVerifier<'_> {
        let inner = &*self.inner;
        AnswerVerifier::new(inner.backend.as_ref(), &inner.counters, &inner.config)
    }

    fn images(&self) -> ImageStudio<'_> {
        let inner = &*self.inner;
        ImageStudio::new(inner.backend.as_ref(), &inner.counters, &inner.config)
    }

    fn tracker(&self) -> MutexGuard<'_, WordTracker> {
        self.inner
            .tracker
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn prefetched(&self) -> MutexGuard<'_, Prefetched> {
        self.inner
            .prefetched
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
