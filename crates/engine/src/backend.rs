use crate::error::{EngineError, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::fmt;

/// Every kind of external call the engine makes. Used for call accounting
/// and attempt-log labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    GeneratePuzzle,
    GenerateMashupPuzzle,
    GeneratePartImage,
    GenerateStarterImage,
    EditMashupImage,
    VerifyAnswer,
    JudgeMashup,
}

impl Operation {
    pub const COUNT: usize = 7;

    pub const ALL: [Operation; Operation::COUNT] = [
        Operation::GeneratePuzzle,
        Operation::GenerateMashupPuzzle,
        Operation::GeneratePartImage,
        Operation::GenerateStarterImage,
        Operation::EditMashupImage,
        Operation::VerifyAnswer,
        Operation::JudgeMashup,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Operation::GeneratePuzzle => "generate_puzzle",
            Operation::GenerateMashupPuzzle => "generate_mashup_puzzle",
            Operation::GeneratePartImage => "generate_part_image",
            Operation::GenerateStarterImage => "generate_starter_image",
            Operation::EditMashupImage => "edit_mashup_image",
            Operation::VerifyAnswer => "verify_answer",
            Operation::JudgeMashup => "judge_mashup",
        }
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image bytes as exchanged with the backend.
#[derive(Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl fmt::Debug for InlineImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InlineImage")
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl InlineImage {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, BASE64.encode(&self.data))
    }

    /// Parses a `data:<mime>;base64,<payload>` URL.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let invalid = |why: &str| EngineError::Other(format!("invalid image data URL: {why}"));
        let rest = url.trim().strip_prefix("data:").ok_or_else(|| invalid("missing data: prefix"))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| invalid("missing payload"))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| invalid("payload is not base64"))?;
        if mime_type.is_empty() {
            return Err(invalid("missing mime type"));
        }
        let data = BASE64
            .decode(payload.trim())
            .map_err(|err| invalid(&err.to_string()))?;
        Ok(Self::new(mime_type, data))
    }

    /// Best-effort file extension for saving the image.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "png",
        }
    }
}

/// A structured-output request: the backend must answer with JSON matching
/// `response_schema`. The vision judgment is the same request carrying an
/// image.
#[derive(Debug, Clone)]
pub struct JsonRequest {
    pub operation: Operation,
    pub model: String,
    pub system_instruction: Option<String>,
    pub prompt: String,
    pub response_schema: serde_json::Value,
    pub image: Option<InlineImage>,
}

#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub operation: Operation,
    pub model: String,
    pub prompt: String,
}

/// The external generative service.
///
/// Implementations report transport problems as [`EngineError::Transport`]
/// and undecodable envelopes as [`EngineError::MalformedResponse`]. The text
/// returned by `generate_json` is parsed by the engine, not the backend.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    async fn generate_json(&self, request: &JsonRequest) -> Result<String>;

    async fn generate_image(&self, request: &ImageRequest) -> Result<InlineImage>;

    async fn edit_image(&self, request: &ImageRequest, source: &InlineImage)
        -> Result<InlineImage>;
}
