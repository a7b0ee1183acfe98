use std::fmt;
use wordplay_engine::{EngineError, Result};

pub const API_KEY_ENV: &str = "WORDPLAY_API_KEY";
pub const FALLBACK_API_KEY_ENV: &str = "API_KEY";

/// The credential sent with every request. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EngineError::Configuration("API key is empty".to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Reads `WORDPLAY_API_KEY`, falling back to `API_KEY`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        [API_KEY_ENV, FALLBACK_API_KEY_ENV]
            .into_iter()
            .filter_map(&lookup)
            .find(|value| !value.trim().is_empty())
            .map(Self::new)
            .unwrap_or_else(|| {
                Err(EngineError::Configuration(format!(
                    "API key not set; export {API_KEY_ENV} (or {FALLBACK_API_KEY_ENV})"
                )))
            })
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_variable_wins_over_fallback() {
        let key = ApiKey::from_lookup(|name| match name {
            API_KEY_ENV => Some("primary".to_string()),
            FALLBACK_API_KEY_ENV => Some("fallback".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(key.expose(), "primary");
    }

    #[test]
    fn blank_primary_falls_back() {
        let key = ApiKey::from_lookup(|name| match name {
            API_KEY_ENV => Some("   ".to_string()),
            FALLBACK_API_KEY_ENV => Some(" fallback ".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(key.expose(), "fallback");
    }

    #[test]
    fn missing_key_is_a_configuration_error() {
        let err = ApiKey::from_lookup(|_| None).unwrap_err();
        assert!(matches!(err, EngineError::Configuration(msg) if msg.contains(API_KEY_ENV)));
    }

    #[test]
    fn debug_output_hides_the_key() {
        let key = ApiKey::new("secret-value").unwrap();
        assert_eq!(format!("{key:?}"), "ApiKey(***)");
    }
}
