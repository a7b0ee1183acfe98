//! Request and response bodies of the `generateContent` REST method.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use wordplay_engine::{EngineError, ImageRequest, InlineImage, JsonRequest, Result};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<Blob>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    /// Base64 payload.
    pub data: String,
}

#[derive(Debug, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_json_schema: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub response_modalities: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorEnvelope {
    pub error: ApiError,
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    fn image(image: &InlineImage) -> Self {
        Self {
            text: None,
            inline_data: Some(Blob {
                mime_type: image.mime_type.clone(),
                data: BASE64.encode(&image.data),
            }),
        }
    }
}

fn user_content(parts: Vec<Part>) -> Content {
    Content {
        role: Some("user".to_string()),
        parts,
    }
}

/// Structured-output request. The image, when present, goes before the
/// text so the rubric reads as a caption of it.
pub fn json_body(request: &JsonRequest) -> GenerateContentRequest {
    let mut parts = Vec::with_capacity(2);
    if let Some(image) = &request.image {
        parts.push(Part::image(image));
    }
    parts.push(Part::text(request.prompt.as_str()));

    GenerateContentRequest {
        contents: vec![user_content(parts)],
        system_instruction: request.system_instruction.as_ref().map(|text| Content {
            role: None,
            parts: vec![Part::text(text.as_str())],
        }),
        generation_config: Some(GenerationConfig {
            response_mime_type: Some("application/json".to_string()),
            response_json_schema: Some(sanitize_schema(request.response_schema.clone())),
            response_modalities: Vec::new(),
        }),
    }
}

/// Image generation, or an edit when `source` is given.
pub fn image_body(request: &ImageRequest, source: Option<&InlineImage>) -> GenerateContentRequest {
    let mut parts = Vec::with_capacity(2);
    if let Some(source) = source {
        parts.push(Part::image(source));
    }
    parts.push(Part::text(request.prompt.as_str()));

    GenerateContentRequest {
        contents: vec![user_content(parts)],
        system_instruction: None,
        generation_config: Some(GenerationConfig {
            response_modalities: vec!["IMAGE".to_string(), "TEXT".to_string()],
            ..GenerationConfig::default()
        }),
    }
}

/// Drops the meta keywords the endpoint does not accept.
fn sanitize_schema(mut schema: Value) -> Value {
    if let Some(object) = schema.as_object_mut() {
        object.remove("$schema");
    }
    schema
}

impl GenerateContentResponse {
    fn parts(&self) -> Result<impl Iterator<Item = &Part>> {
        if self.candidates.is_empty() {
            let reason = self
                .prompt_feedback
                .as_ref()
                .and_then(|feedback| feedback.block_reason.as_deref())
                .unwrap_or("no candidates returned");
            return Err(EngineError::MalformedResponse(format!(
                "empty response: {reason}"
            )));
        }
        Ok(self
            .candidates
            .iter()
            .filter_map(|candidate| candidate.content.as_ref())
            .flat_map(|content| content.parts.iter()))
    }

    /// Concatenated text of every returned part.
    pub fn text(&self) -> Result<String> {
        let text: String = self
            .parts()?
            .filter_map(|part| part.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            let finish = self
                .candidates
                .first()
                .and_then(|candidate| candidate.finish_reason.as_deref())
                .unwrap_or("unknown");
            return Err(EngineError::MalformedResponse(format!(
                "response contained no text (finish reason: {finish})"
            )));
        }
        Ok(text)
    }

    /// First inline image of the response. Other inline data is skipped.
    pub fn image(&self) -> Result<InlineImage> {
        let blob = self
            .parts()?
            .find_map(|part| {
                part.inline_data
                    .as_ref()
                    .filter(|blob| blob.mime_type.starts_with("image/"))
            })
            .ok_or_else(|| {
                EngineError::MalformedResponse("response contained no image".to_string())
            })?;
        let data = BASE64
            .decode(blob.data.trim())
            .map_err(|err| EngineError::MalformedResponse(format!("image payload: {err}")))?;
        Ok(InlineImage::new(blob.mime_type.clone(), data))
    }
}

impl ApiErrorEnvelope {
    pub fn describe(&self) -> String {
        let ApiError {
            code,
            message,
            status,
        } = &self.error;
        format!("{code} {status}: {message}")
    }
}
