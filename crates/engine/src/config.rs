use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const MAX_RETRIES_LIMIT: u32 = 10;
pub const DEFAULT_ROUND_SECONDS: u64 = 90;
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image-preview";

const MAX_RETRIES_ENV: &str = "WORDPLAY_MAX_RETRIES";
const ROUND_SECONDS_ENV: &str = "WORDPLAY_ROUND_SECONDS";

/// Words the mashup generator is steered away from because the backend
/// produces them far too often.
pub fn default_overused_words() -> Vec<String> {
    ["STARFISH", "FOOTBALL", "BASKETBALL", "BASEBALL"]
        .iter()
        .map(|w| w.to_string())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Generation attempts per puzzle before the fallback is used.
    pub max_retries: u32,
    pub round_seconds: u64,
    pub text_model: String,
    pub image_model: String,
    pub overused_words: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            round_seconds: DEFAULT_ROUND_SECONDS,
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            overused_words: default_overused_words(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(raw)
            .map_err(|err| EngineError::Configuration(format!("invalid config: {err}")))?;
        config.max_retries = config.max_retries.clamp(1, MAX_RETRIES_LIMIT);
        Ok(config)
    }

    /// Reads the optional config file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|err| {
                    EngineError::Configuration(format!("read {}: {err}", path.display()))
                })?;
                Self::from_toml_str(&raw)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        let raw = std::env::var(MAX_RETRIES_ENV).ok();
        self.max_retries = parse_bounded(raw.as_deref(), self.max_retries, 1, MAX_RETRIES_LIMIT);
        let raw = std::env::var(ROUND_SECONDS_ENV).ok();
        self.round_seconds = parse_bounded(raw.as_deref(), self.round_seconds, 10, 600);
    }

    pub fn round_duration(&self) -> Duration {
        Duration::from_secs(self.round_seconds)
    }
}

fn parse_bounded<T>(raw: Option<&str>, default_value: T, min: T, max: T) -> T
where
    T: std::str::FromStr + Ord,
{
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default_value)
        .clamp(min, max)
}
