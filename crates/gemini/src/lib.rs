//! # Wordplay Gemini
//!
//! [`wordplay_engine::GenerativeBackend`] implemented against the Gemini
//! `generateContent` REST method: structured JSON output for puzzles,
//! verification and judgments, image output for part pictures, starter
//! stickers and mashup edits.
//!
//! ```no_run
//! use std::sync::Arc;
//! use wordplay_engine::{EngineConfig, GameContext};
//! use wordplay_gemini::GeminiClient;
//!
//! # fn main() -> wordplay_engine::Result<()> {
//! let client = GeminiClient::from_env()?;
//! let ctx = GameContext::new(Arc::new(client), EngineConfig::default());
//! # let _ = ctx;
//! # Ok(())
//! # }
//! ```

mod client;
mod key;
mod wire;

pub use client::{GeminiClient, DEFAULT_BASE_URL};
pub use key::{ApiKey, API_KEY_ENV, FALLBACK_API_KEY_ENV};
