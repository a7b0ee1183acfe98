use crate::backend::{GenerativeBackend, InlineImage, JsonRequest, Operation};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::payload::parse_structured;
use crate::prompts;
use crate::stats::CallCounters;
use crate::validator::normalize;
use wordplay_protocol::{
    response_schema, JudgmentCandidate, MashupJudgment, MashupQuality, Puzzle, SubmissionPart,
    VerificationCandidate, VerificationResult, WordMashupPuzzle,
};

pub const VERIFICATION_FAILED: &str = "Verification failed.";
pub const NEUTRAL_FEEDBACK: &str = "Couldn't judge properly, but nice try! Keep experimenting!";
pub const MAX_SCORE: u8 = 10;

/// Remote judgment for answers the local check could not accept, and for
/// finished mashup images.
///
/// Backend failures never escape: they become a "not correct" verification
/// or a neutral judgment, so a round always reaches an outcome.
pub struct AnswerVerifier<'a> {
    backend: &'a dyn GenerativeBackend,
    counters: &'a CallCounters,
    config: &'a EngineConfig,
}

impl<'a> AnswerVerifier<'a> {
    pub fn new(
        backend: &'a dyn GenerativeBackend,
        counters: &'a CallCounters,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            backend,
            counters,
            config,
        }
    }

    /// Asks the backend whether `submission` is a valid deconstruction of
    /// the puzzle word. Fails with [`EngineError::IncompleteSubmission`] before any
    /// call when a box is empty.
    pub async fn verify(
        &self,
        puzzle: &Puzzle,
        submission: &[SubmissionPart],
    ) -> Result<VerificationResult> {
        let values = filled_values(submission)?;
        let word = &puzzle.word;
        let request = self.json_request(
            Operation::VerifyAnswer,
            prompts::verification_prompt(word, &values),
            response_schema::<VerificationCandidate>(),
            None,
        );

        let verdict = self
            .call(&request)
            .await
            .and_then(|raw| parse_structured::<VerificationCandidate>(&raw));
        Ok(match verdict {
            Ok(candidate) => VerificationResult {
                correct: candidate.correct,
                reasoning: candidate.reasoning,
            },
            Err(err) => {
                log::warn!("Verification of '{word}' failed: {err}");
                VerificationResult {
                    correct: false,
                    reasoning: VERIFICATION_FAILED.to_string(),
                }
            }
        })
    }

    /// Scores the player's final mashup image against the puzzle.
    pub async fn judge_mashup_creation(
        &self,
        puzzle: &WordMashupPuzzle,
        user_prompt: &str,
        image: &InlineImage,
    ) -> MashupJudgment {
        let request = self.json_request(
            Operation::JudgeMashup,
            prompts::judgment_prompt(puzzle, user_prompt),
            response_schema::<JudgmentCandidate>(),
            Some(image.clone()),
        );

        let judged = self
            .call(&request)
            .await
            .and_then(|raw| parse_structured::<JudgmentCandidate>(&raw));
        match judged {
            Ok(candidate) => judgment_from_candidate(candidate),
            Err(err) => {
                log::warn!("Judging mashup '{}' failed: {err}", puzzle.word);
                neutral_judgment(puzzle)
            }
        }
    }

    fn json_request(
        &self,
        operation: Operation,
        prompt: String,
        response_schema: serde_json::Value,
        image: Option<InlineImage>,
    ) -> JsonRequest {
        JsonRequest {
            operation,
            model: self.config.text_model.clone(),
            system_instruction: None,
            prompt,
            response_schema,
            image,
        }
    }

    async fn call(&self, request: &JsonRequest) -> Result<String> {
        self.counters.record(request.operation, &request.model);
        self.backend.generate_json(request).await
    }
}

/// Normalized box values, or the incomplete-submission error.
pub fn filled_values(submission: &[SubmissionPart]) -> Result<Vec<String>> {
    let missing = submission.iter().filter(|part| !part.is_filled()).count();
    if missing > 0 || submission.is_empty() {
        return Err(EngineError::IncompleteSubmission {
            missing,
            total: submission.len(),
        });
    }
    Ok(submission
        .iter()
        .filter_map(|part| part.value.as_deref())
        .map(normalize)
        .collect())
}

pub fn judgment_from_candidate(candidate: JudgmentCandidate) -> MashupJudgment {
    // NaN clamps to NaN and then casts to 0.
    let score = candidate.score.clamp(0.0, f64::from(MAX_SCORE)).round() as u8;
    let mashup_quality = MashupQuality::from_label(&candidate.mashup_quality).unwrap_or_else(|| {
        log::debug!("Unknown mashup quality '{}'", candidate.mashup_quality);
        MashupQuality::Medium
    });
    MashupJudgment {
        score,
        feedback: candidate.feedback,
        objects_found: candidate.objects_found,
        mashup_quality,
    }
}

pub fn neutral_judgment(puzzle: &WordMashupPuzzle) -> MashupJudgment {
    MashupJudgment {
        score: 5,
        feedback: NEUTRAL_FEEDBACK.to_string(),
        objects_found: puzzle.objects.clone(),
        mashup_quality: MashupQuality::Medium,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wordplay_protocol::PartKind;

    fn candidate(score: f64, quality: &str) -> JudgmentCandidate {
        JudgmentCandidate {
            score,
            feedback: "Nice blend".to_string(),
            objects_found: vec!["SUN".to_string()],
            mashup_quality: quality.to_string(),
        }
    }

    #[test]
    fn scores_are_clamped_and_rounded() {
        assert_eq!(judgment_from_candidate(candidate(14.0, "high")).score, 10);
        assert_eq!(judgment_from_candidate(candidate(-3.0, "low")).score, 0);
        assert_eq!(judgment_from_candidate(candidate(6.6, "medium")).score, 7);
        assert_eq!(judgment_from_candidate(candidate(f64::NAN, "medium")).score, 0);
    }

    #[test]
    fn unknown_quality_defaults_to_medium() {
        let judgment = judgment_from_candidate(candidate(8.0, "superb"));
        assert_eq!(judgment.mashup_quality, MashupQuality::Medium);
    }

    #[test]
    fn empty_boxes_are_reported_before_any_call() {
        let submission = vec![
            SubmissionPart::filled(PartKind::Letter, "g"),
            SubmissionPart::empty(PartKind::Word),
            SubmissionPart::filled(PartKind::Word, " "),
        ];
        assert_eq!(
            filled_values(&submission),
            Err(EngineError::IncompleteSubmission {
                missing: 2,
                total: 3
            })
        );

        let complete = vec![
            SubmissionPart::filled(PartKind::Letter, "g"),
            SubmissionPart::filled(PartKind::Word, " old "),
        ];
        assert_eq!(
            filled_values(&complete).unwrap(),
            vec!["G".to_string(), "OLD".to_string()]
        );
    }
}
