//! # Wordplay Protocol
//!
//! Data shared between the generation pipeline, the generative backend and
//! whatever front end renders the games.
//!
//! - **Word Shrinker**: a target word split into letters and picturable parts
//!   ([`Puzzle`]).
//! - **Word Mashup**: a compound word whose two objects the player blends into
//!   one image ([`WordMashupPuzzle`], [`MashupJudgment`]).
//!
//! Field names serialize in camelCase so that puzzles round-trip through the
//! same JSON the generative backend is asked to produce.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub mod candidate;

pub use candidate::{
    response_schema, JudgmentCandidate, MashupCandidate, PuzzleCandidate, SolutionCandidate,
    VerificationCandidate,
};

/// Parts at least this long are concrete nouns that get an image box.
pub const PICTURABLE_MIN_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 2] = [Difficulty::Easy, Difficulty::Hard];

    pub const fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameMode {
    WordShrinker,
    WordMashup,
}

impl GameMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            GameMode::WordShrinker => "WordShrinker",
            GameMode::WordMashup => "WordMashup",
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepted renderings of one picturable part. The first alternative is the
/// canonical one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionEntry {
    pub part: String,
    pub alternatives: Vec<String>,
}

/// A Word Shrinker challenge. Immutable once accepted by the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Puzzle {
    pub word: String,
    pub deconstructions: Vec<Vec<String>>,
    pub solutions: Vec<SolutionEntry>,
}

impl Puzzle {
    pub fn solution_for(&self, part: &str) -> Option<&SolutionEntry> {
        self.solutions.iter().find(|entry| entry.part == part)
    }

    /// The decomposition used to lay out boxes and to reveal the answer.
    pub fn primary_deconstruction(&self) -> &[String] {
        self.deconstructions
            .first()
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn box_count(&self) -> usize {
        self.primary_deconstruction().len()
    }
}

/// A Word Mashup challenge.
///
/// `starter_image_url` is a `data:` URL. It is only `None` for the fallback
/// puzzle when the image backend was unavailable as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordMashupPuzzle {
    pub word: String,
    pub starter_word: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starter_image_url: Option<String>,
    pub objects: Vec<String>,
}

impl WordMashupPuzzle {
    /// The object the player still has to blend into the starter image.
    pub fn missing_object(&self) -> Option<&str> {
        self.objects
            .iter()
            .find(|object| **object != self.starter_word)
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MashupQuality {
    Low,
    Medium,
    High,
}

impl MashupQuality {
    /// Lenient parse of the backend's free-text quality label.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" | "med" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            MashupQuality::Low => "low",
            MashupQuality::Medium => "medium",
            MashupQuality::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MashupJudgment {
    /// Always within `0..=10`.
    pub score: u8,
    pub feedback: String,
    pub objects_found: Vec<String>,
    pub mashup_quality: MashupQuality,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub correct: bool,
    pub reasoning: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartKind {
    Letter,
    Word,
}

/// One filled (or still empty) answer box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionPart {
    #[serde(rename = "type")]
    pub kind: PartKind,
    pub value: Option<String>,
}

impl SubmissionPart {
    pub fn filled(kind: PartKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: Some(value.into()),
        }
    }

    pub fn empty(kind: PartKind) -> Self {
        Self { kind, value: None }
    }

    pub fn is_filled(&self) -> bool {
        self.value
            .as_deref()
            .is_some_and(|value| !value.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolutionKind {
    Letter,
    Image,
}

/// A revealed box of the correct answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionPart {
    pub part: String,
    #[serde(rename = "type")]
    pub kind: SolutionKind,
    /// The letter itself, or the image URL for picturable parts (empty when
    /// no image was fetched).
    pub value: String,
}

/// One generation attempt, as shown by a diagnostics display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    pub operation: String,
    /// 1-based attempt index within one generation call.
    pub attempt: u32,
    pub success: bool,
    /// Raw payload on failure, the accepted puzzle on success.
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCounts {
    pub total: usize,
    pub mashup: usize,
    pub shrinker: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallCountsSnapshot {
    pub total: u64,
    pub by_operation: BTreeMap<String, u64>,
    pub by_model: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub words: WordCounts,
    pub calls: CallCountsSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn mashup_puzzle_uses_camel_case_fields() {
        let puzzle = WordMashupPuzzle {
            word: "SUNFLOWER".to_string(),
            starter_word: "SUN".to_string(),
            starter_image_url: Some("data:image/png;base64,AAAA".to_string()),
            objects: vec!["SUN".to_string(), "FLOWER".to_string()],
        };
        let value = serde_json::to_value(&puzzle).unwrap();
        assert_eq!(value["starterWord"], "SUN");
        assert_eq!(value["starterImageUrl"], "data:image/png;base64,AAAA");
        assert_eq!(puzzle.missing_object(), Some("FLOWER"));
    }

    #[test]
    fn submission_part_treats_blank_values_as_empty() {
        assert!(SubmissionPart::filled(PartKind::Letter, "G").is_filled());
        assert!(!SubmissionPart::filled(PartKind::Word, "   ").is_filled());
        assert!(!SubmissionPart::empty(PartKind::Word).is_filled());

        let raw = r#"{"type":"word","value":null}"#;
        let part: SubmissionPart = serde_json::from_str(raw).unwrap();
        assert_eq!(part, SubmissionPart::empty(PartKind::Word));
    }

    #[test]
    fn quality_labels_parse_leniently() {
        assert_eq!(MashupQuality::from_label(" High "), Some(MashupQuality::High));
        assert_eq!(MashupQuality::from_label("MEDIUM"), Some(MashupQuality::Medium));
        assert_eq!(MashupQuality::from_label("low/medium/high"), None);
    }

    #[test]
    fn primary_deconstruction_of_empty_puzzle_is_empty() {
        let puzzle = Puzzle {
            word: "STARFISH".to_string(),
            deconstructions: Vec::new(),
            solutions: Vec::new(),
        };
        assert_eq!(puzzle.box_count(), 0);
        assert!(puzzle.solution_for("STAR").is_none());
    }

    #[test]
    fn diagnostics_use_camel_case_fields() {
        let record = AttemptRecord {
            timestamp_ms: 1_700_000_000_000,
            operation: "generate_puzzle".to_string(),
            attempt: 2,
            success: false,
            data: "{}".to_string(),
            error: Some("bad concat".to_string()),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["timestampMs"], 1_700_000_000_000u64);
        assert!(value.get("timestamp_ms").is_none());

        let stats = SessionStats {
            words: WordCounts::default(),
            calls: CallCountsSnapshot {
                total: 1,
                by_operation: BTreeMap::from([("generate_puzzle".to_string(), 1)]),
                by_model: BTreeMap::from([("text".to_string(), 1)]),
            },
        };
        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["calls"]["byOperation"]["generate_puzzle"], 1);
        assert_eq!(value["calls"]["byModel"]["text"], 1);
        assert!(value["calls"].get("by_operation").is_none());
    }
}
