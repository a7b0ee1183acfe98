use wordplay_engine::{AnswerOutcome, CheckedBy, Scoreboard};
use wordplay_protocol::{
    MashupJudgment, Puzzle, SessionStats, SolutionKind, SolutionPart, WordMashupPuzzle,
};

pub fn puzzle_summary(puzzle: &Puzzle) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", puzzle.word));
    for (idx, parts) in puzzle.deconstructions.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", idx + 1, parts.join(" + ")));
    }
    for entry in &puzzle.solutions {
        out.push_str(&format!(
            "  {}: {}\n",
            entry.part,
            entry.alternatives.join(", ")
        ));
    }
    out.trim_end().to_string()
}

pub fn mashup_summary(puzzle: &WordMashupPuzzle) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} = {}\n", puzzle.word, puzzle.objects.join(" + ")));
    out.push_str(&format!("  starter: {}", puzzle.starter_word));
    if puzzle.starter_image_url.is_none() {
        out.push_str(" (no image)");
    }
    out
}

/// The board as the player sees it: the word and one slot per box.
pub fn board(puzzle: &Puzzle, seconds_left: u64) -> String {
    let slots: Vec<&str> = puzzle
        .primary_deconstruction()
        .iter()
        .map(|part| {
            if part.chars().count() > 1 {
                "[word]"
            } else {
                "[letter]"
            }
        })
        .collect();
    format!(
        "Shrink {} into {} boxes ({seconds_left}s)\n  {}",
        puzzle.word,
        slots.len(),
        slots.join(" ")
    )
}

pub fn mashup_board(puzzle: &WordMashupPuzzle, seconds_left: u64) -> String {
    let missing = puzzle.missing_object().unwrap_or("the other half");
    format!(
        "Turn the {} into {}: blend in {missing} ({seconds_left}s)",
        puzzle.starter_word, puzzle.word
    )
}

pub fn answer_outcome(outcome: &AnswerOutcome) -> String {
    let verdict = if outcome.correct { "Correct" } else { "Wrong" };
    let source = match outcome.checked_by {
        CheckedBy::Local => "local",
        CheckedBy::Remote => "judge",
    };
    format!("{verdict} ({source}): {}", outcome.reasoning)
}

pub fn solution(parts: &[SolutionPart]) -> String {
    let rendered: Vec<String> = parts
        .iter()
        .map(|part| match part.kind {
            SolutionKind::Letter => part.value.clone(),
            SolutionKind::Image if part.value.is_empty() => format!("{} (no picture)", part.part),
            SolutionKind::Image => format!("{} (picture)", part.part),
        })
        .collect();
    format!("Solution: {}", rendered.join(" + "))
}

pub fn judgment(judgment: &MashupJudgment) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Score {}/10 ({} mashup)\n",
        judgment.score,
        judgment.mashup_quality.as_str()
    ));
    if !judgment.objects_found.is_empty() {
        out.push_str(&format!("Spotted: {}\n", judgment.objects_found.join(", ")));
    }
    out.push_str(&judgment.feedback);
    out
}

pub fn scoreboard(board: &Scoreboard) -> String {
    format!(
        "Score {} | {} of {} correct",
        board.score, board.correct, board.attempted
    )
}

pub fn stats(stats: &SessionStats) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Words: {} total ({} shrinker, {} mashup)\n",
        stats.words.total, stats.words.shrinker, stats.words.mashup
    ));
    out.push_str(&format!("Backend calls: {}\n", stats.calls.total));
    for (operation, count) in &stats.calls.by_operation {
        out.push_str(&format!("  {operation}: {count}\n"));
    }
    for (model, count) in &stats.calls.by_model {
        out.push_str(&format!("  [{model}] {count}\n"));
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wordplay_protocol::MashupQuality;

    fn keyboard() -> Puzzle {
        Puzzle {
            word: "KEYBOARD".to_string(),
            deconstructions: vec![vec![
                "KEY".to_string(),
                "B".to_string(),
                "OAR".to_string(),
                "D".to_string(),
            ]],
            solutions: Vec::new(),
        }
    }

    #[test]
    fn board_marks_letter_and_word_boxes() {
        assert_eq!(
            board(&keyboard(), 42),
            "Shrink KEYBOARD into 4 boxes (42s)\n  [word] [letter] [word] [letter]"
        );
    }

    #[test]
    fn solution_notes_missing_pictures() {
        let parts = vec![
            SolutionPart {
                part: "KEY".to_string(),
                kind: SolutionKind::Image,
                value: "data:image/png;base64,AA==".to_string(),
            },
            SolutionPart {
                part: "B".to_string(),
                kind: SolutionKind::Letter,
                value: "B".to_string(),
            },
            SolutionPart {
                part: "OAR".to_string(),
                kind: SolutionKind::Image,
                value: String::new(),
            },
        ];
        assert_eq!(
            solution(&parts),
            "Solution: KEY (picture) + B + OAR (no picture)"
        );
    }

    #[test]
    fn judgment_lists_spotted_objects() {
        let rendered = judgment(&MashupJudgment {
            score: 8,
            feedback: "Lovely blend".to_string(),
            objects_found: vec!["SUN".to_string(), "FLOWER".to_string()],
            mashup_quality: MashupQuality::High,
        });
        assert_eq!(
            rendered,
            "Score 8/10 (high mashup)\nSpotted: SUN, FLOWER\nLovely blend"
        );
    }
}
