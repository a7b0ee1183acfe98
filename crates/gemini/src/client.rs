use crate::key::ApiKey;
use crate::wire::{self, ApiErrorEnvelope, GenerateContentRequest, GenerateContentResponse};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use wordplay_engine::{
    EngineError, GenerativeBackend, ImageRequest, InlineImage, JsonRequest, Operation, Result,
};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// [`GenerativeBackend`] over the Gemini REST API.
///
/// Only the connection has a timeout; a request may take as long as the
/// model needs.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: ApiKey,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: ApiKey) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Client reading its key from the environment. Fails before any
    /// request when no key is configured.
    pub fn from_env() -> Result<Self> {
        Self::new(ApiKey::from_env()?)
    }

    pub fn with_base_url(api_key: ApiKey, base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|err| {
                EngineError::Configuration(format!("Failed to build HTTP client: {err}"))
            })?;
        Ok(Self {
            http,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.base_url)
    }

    async fn generate(
        &self,
        operation: Operation,
        model: &str,
        body: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = self.endpoint(model);
        log::debug!("POST {url} ({operation})");
        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, self.api_key.expose())
            .json(body)
            .send()
            .await
            .map_err(|err| EngineError::Transport(format!("{operation}: {err}")))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| EngineError::Transport(format!("{operation}: reading body: {err}")))?;

        if !status.is_success() {
            return Err(EngineError::Transport(format!(
                "{operation}: HTTP {status}: {}",
                error_detail(&bytes)
            )));
        }
        serde_json::from_slice(&bytes).map_err(|err| {
            EngineError::MalformedResponse(format!("{operation}: undecodable envelope: {err}"))
        })
    }
}

/// Best description of an error body: the API's own message if it sent
/// one, otherwise the first bytes of the body.
fn error_detail(body: &[u8]) -> String {
    if let Ok(envelope) = serde_json::from_slice::<ApiErrorEnvelope>(body) {
        return envelope.describe();
    }
    let text = String::from_utf8_lossy(body);
    text.chars().take(200).collect()
}

#[async_trait]
impl GenerativeBackend for GeminiClient {
    async fn generate_json(&self, request: &JsonRequest) -> Result<String> {
        let body = wire::json_body(request);
        self.generate(request.operation, &request.model, &body)
            .await?
            .text()
    }

    async fn generate_image(&self, request: &ImageRequest) -> Result<InlineImage> {
        let body = wire::image_body(request, None);
        self.generate(request.operation, &request.model, &body)
            .await?
            .image()
    }

    async fn edit_image(
        &self,
        request: &ImageRequest,
        source: &InlineImage,
    ) -> Result<InlineImage> {
        let body = wire::image_body(request, Some(source));
        self.generate(request.operation, &request.model, &body)
            .await?
            .image()
    }
}
