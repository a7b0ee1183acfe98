use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Failures crossing the engine boundary.
///
/// `Clone` so that one settled single-flight result can be handed to every
/// waiter by value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Not all boxes are filled ({missing} of {total} empty)")]
    IncompleteSubmission { missing: usize, total: usize },

    #[error("In-flight request '{0}' was dropped before it settled")]
    Abandoned(String),

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::MalformedResponse(err.to_string())
    }
}
