//! # Wordplay Engine
//!
//! Puzzle generation and answer checking for the Word Shrinker and Word
//! Mashup games, on top of a pluggable generative backend.
//!
//! ## Features
//!
//! - **Bounded retries** with structural validation and a fixed fallback, so
//!   a puzzle is always produced
//! - **Single-flight** generation: concurrent identical requests share one
//!   backend call
//! - **Local-first answer checking**; the backend is only asked about
//!   answers no known decomposition accepts
//! - **Session state** (word history, call counters, prefetched puzzles) held
//!   in an explicit [`GameContext`]
//!
//! ## Architecture
//!
//! ```text
//! GameContext
//!     │
//!     ├──> SingleFlight (per difficulty / mashup)
//!     │      └─> RetryingGenerator
//!     │             ├─> GenerativeBackend::generate_json
//!     │             ├─> validator (pure)
//!     │             ├─> WordTracker
//!     │             └─> AttemptSink
//!     │
//!     ├──> check_answer (local)
//!     │      └─> AnswerVerifier (remote, on mismatch)
//!     │
//!     └──> ImageStudio
//!            └─> part / starter / edited images
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use wordplay_engine::{EngineConfig, GameContext, GenerativeBackend};
//! use wordplay_protocol::Difficulty;
//!
//! async fn play(backend: Arc<dyn GenerativeBackend>) {
//!     let ctx = GameContext::new(backend, EngineConfig::default());
//!     ctx.prefetch_all().await;
//!
//!     let puzzle = ctx.take_puzzle(Difficulty::Easy).await;
//!     println!("{} boxes for {}", puzzle.box_count(), puzzle.word);
//! }
//! ```

mod answer;
mod attempt_log;
mod backend;
mod config;
mod context;
mod error;
mod game;
mod generator;
mod images;
mod payload;
mod prompts;
mod single_flight;
mod stats;
mod validator;
mod verifier;
mod word_tracker;

pub use answer::check_answer;
pub use attempt_log::{AttemptSink, BroadcastSink, MemorySink, NullSink};
pub use backend::{GenerativeBackend, ImageRequest, InlineImage, JsonRequest, Operation};
pub use config::{EngineConfig, DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL};
pub use context::{AnswerOutcome, CheckedBy, GameContext, MASHUP_FLIGHT_KEY};
pub use error::{EngineError, Result};
pub use game::{
    picturable_parts, processing_failed_judgment, reveal_solution, MashupOutcome, RoundClock,
    Scoreboard,
};
pub use generator::{fallback_puzzle, RetryingGenerator, FALLBACK_WORD};
pub use images::ImageStudio;
pub use payload::parse_structured;
pub use single_flight::SingleFlight;
pub use stats::CallCounters;
pub use validator::{
    normalize, satisfies_hard_rule, validate_mashup, validate_puzzle, Rejection, ValidatedMashup,
};
pub use verifier::{neutral_judgment, AnswerVerifier, VERIFICATION_FAILED};
pub use word_tracker::WordTracker;
