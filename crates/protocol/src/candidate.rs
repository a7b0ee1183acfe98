//! Raw shapes the generative backend is asked to produce.
//!
//! These are deliberately loose (no normalization, no invariants). The engine
//! validates and normalizes them before anything reaches a player.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// JSON schema sent alongside a structured-output request.
pub fn response_schema<T: JsonSchema>() -> serde_json::Value {
    schemars::schema_for!(T).to_value()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SolutionCandidate {
    pub part: String,
    #[serde(default)]
    pub alternatives: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PuzzleCandidate {
    pub word: String,
    #[serde(default)]
    pub deconstructions: Vec<Vec<String>>,
    #[serde(default)]
    pub solutions: Vec<SolutionCandidate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MashupCandidate {
    pub word: String,
    #[serde(default)]
    pub objects: Vec<String>,
    pub starter_word: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JudgmentCandidate {
    /// Expected 0-10; clamped by the engine.
    pub score: f64,
    pub feedback: String,
    #[serde(default)]
    pub objects_found: Vec<String>,
    /// One of low, medium, high.
    #[serde(default)]
    pub mashup_quality: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VerificationCandidate {
    pub correct: bool,
    pub reasoning: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn puzzle_schema_lists_required_fields() {
        let schema = response_schema::<PuzzleCandidate>();
        let required = schema["required"].as_array().expect("required array");
        assert!(required.iter().any(|v| v == "word"));
        assert!(schema["properties"]["deconstructions"].is_object());
    }

    #[test]
    fn mashup_candidate_reads_camel_case() {
        let raw = r#"{"word":"Keyboard","objects":["key","board"],"starterWord":"key"}"#;
        let candidate: MashupCandidate = serde_json::from_str(raw).unwrap();
        assert_eq!(candidate.starter_word, "key");
        assert_eq!(candidate.objects.len(), 2);
    }

    #[test]
    fn judgment_candidate_accepts_integer_scores() {
        let raw = r#"{"score":14,"feedback":"wow","objectsFound":["STAR"],"mashupQuality":"high"}"#;
        let candidate: JudgmentCandidate = serde_json::from_str(raw).unwrap();
        assert_eq!(candidate.score, 14.0);
    }
}
