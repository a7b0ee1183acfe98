//! Structural validation of raw generation payloads.
//!
//! Everything here is pure: a candidate goes in, an accepted (normalized)
//! puzzle or a [`Rejection`] comes out. No backend is involved.

use std::collections::HashSet;
use thiserror::Error;
use wordplay_protocol::{
    Difficulty, MashupCandidate, Puzzle, PuzzleCandidate, SolutionEntry, PICTURABLE_MIN_LEN,
};

pub const MIN_WORD_LEN: usize = 6;
pub const MAX_WORD_LEN: usize = 15;

/// Hard puzzles may show at most this many pictures in one decomposition.
pub const HARD_MAX_PICTURABLE: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("word {0:?} is empty or contains non-letters")]
    InvalidWord(String),

    #[error("word {word:?} has {len} letters, expected 6-15")]
    WordLength { word: String, len: usize },

    #[error("no deconstructions provided")]
    NoDeconstructions,

    #[error("deconstruction failed: bad concat or missing solutions for 3+ letter parts")]
    NoValidDeconstruction,

    #[error("hard mode puzzle must contain individual letters, not just whole words")]
    HardModeNeedsLetters,

    #[error("mashup puzzle must have exactly 2 objects, got {0}")]
    ObjectCount(usize),

    #[error("starter word {0:?} is not one of the objects")]
    StarterNotInObjects(String),
}

/// An accepted mashup candidate, before its starter image exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedMashup {
    pub word: String,
    pub objects: Vec<String>,
    pub starter_word: String,
}

pub fn normalize(part: &str) -> String {
    part.trim().to_uppercase()
}

pub fn is_picturable(part: &str) -> bool {
    part.chars().count() >= PICTURABLE_MIN_LEN
}

fn is_single_letter(part: &str) -> bool {
    part.chars().count() == 1
}

/// Validates a Word Shrinker candidate.
///
/// Decompositions that do not spell the word, or that use a picturable part
/// without a solution entry, are dropped individually. For Hard puzzles only
/// decompositions with at least one single letter and at most two pictures
/// are kept, so the decomposition used for the board always obeys the rule.
pub fn validate_puzzle(
    candidate: PuzzleCandidate,
    difficulty: Difficulty,
) -> Result<Puzzle, Rejection> {
    let word = normalize(&candidate.word);
    if word.is_empty() || !word.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(Rejection::InvalidWord(word));
    }
    let len = word.chars().count();
    if !(MIN_WORD_LEN..=MAX_WORD_LEN).contains(&len) {
        return Err(Rejection::WordLength { word, len });
    }
    if candidate.deconstructions.is_empty() {
        return Err(Rejection::NoDeconstructions);
    }

    let solution_parts: HashSet<String> = candidate
        .solutions
        .iter()
        .map(|entry| normalize(&entry.part))
        .collect();

    let mut surviving: Vec<Vec<String>> = Vec::new();
    for deconstruction in &candidate.deconstructions {
        let parts: Vec<String> = deconstruction.iter().map(|p| normalize(p)).collect();
        if !spells_word(&parts, &word) {
            continue;
        }
        let covered = parts
            .iter()
            .filter(|part| is_picturable(part))
            .all(|part| solution_parts.contains(part));
        if covered && !surviving.contains(&parts) {
            surviving.push(parts);
        }
    }
    if surviving.is_empty() {
        return Err(Rejection::NoValidDeconstruction);
    }

    if difficulty == Difficulty::Hard {
        surviving.retain(|parts| satisfies_hard_rule(parts));
        if surviving.is_empty() {
            return Err(Rejection::HardModeNeedsLetters);
        }
    }

    let used: HashSet<&str> = surviving
        .iter()
        .flatten()
        .filter(|part| is_picturable(part))
        .map(String::as_str)
        .collect();

    let mut solutions: Vec<SolutionEntry> = Vec::new();
    for entry in &candidate.solutions {
        let part = normalize(&entry.part);
        if !used.contains(part.as_str()) || solutions.iter().any(|s| s.part == part) {
            continue;
        }
        let mut alternatives: Vec<String> = Vec::new();
        for alt in entry.alternatives.iter().map(|a| normalize(a)) {
            if !alt.is_empty() && !alternatives.contains(&alt) {
                alternatives.push(alt);
            }
        }
        if !alternatives.contains(&part) {
            alternatives.insert(0, part.clone());
        }
        solutions.push(SolutionEntry { part, alternatives });
    }

    Ok(Puzzle {
        word,
        deconstructions: surviving,
        solutions,
    })
}

fn spells_word(parts: &[String], word: &str) -> bool {
    !parts.is_empty() && parts.iter().all(|part| !part.is_empty()) && parts.concat() == word
}

pub fn satisfies_hard_rule(parts: &[String]) -> bool {
    let letters = parts.iter().filter(|part| is_single_letter(part)).count();
    let pictures = parts.iter().filter(|part| is_picturable(part)).count();
    letters > 0 && pictures <= HARD_MAX_PICTURABLE
}

/// Validates a Word Mashup candidate: exactly two objects, one of which is
/// the starter word (compared case-insensitively).
pub fn validate_mashup(candidate: MashupCandidate) -> Result<ValidatedMashup, Rejection> {
    let word = normalize(&candidate.word);
    if word.is_empty() {
        return Err(Rejection::InvalidWord(word));
    }
    if candidate.objects.len() != 2 {
        return Err(Rejection::ObjectCount(candidate.objects.len()));
    }
    let objects: Vec<String> = candidate.objects.iter().map(|o| normalize(o)).collect();
    let starter_word = normalize(&candidate.starter_word);
    if !objects.contains(&starter_word) {
        return Err(Rejection::StarterNotInObjects(starter_word));
    }
    Ok(ValidatedMashup {
        word,
        objects,
        starter_word,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wordplay_protocol::SolutionCandidate;

    fn candidate(word: &str, decons: &[&[&str]], solutions: &[(&str, &[&str])]) -> PuzzleCandidate {
        PuzzleCandidate {
            word: word.to_string(),
            deconstructions: decons
                .iter()
                .map(|d| d.iter().map(|p| p.to_string()).collect())
                .collect(),
            solutions: solutions
                .iter()
                .map(|(part, alts)| SolutionCandidate {
                    part: part.to_string(),
                    alternatives: alts.iter().map(|a| a.to_string()).collect(),
                })
                .collect(),
        }
    }

    fn strings(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn accepts_and_normalizes_easy_puzzle() {
        let raw = candidate(
            "carpenter",
            &[&["car", "p", "e", "n", "t", "e", "r"]],
            &[("Car", &["car", "auto", "Vehicle"]), ("PEN", &["pen"])],
        );
        let puzzle = validate_puzzle(raw, Difficulty::Easy).unwrap();
        assert_eq!(puzzle.word, "CARPENTER");
        assert_eq!(
            puzzle.deconstructions,
            vec![strings(&["CAR", "P", "E", "N", "T", "E", "R"])]
        );
        assert_eq!(
            puzzle.solutions,
            vec![SolutionEntry {
                part: "CAR".to_string(),
                alternatives: strings(&["CAR", "AUTO", "VEHICLE"]),
            }]
        );
    }

    #[test]
    fn drops_bad_concatenations_but_keeps_good_ones() {
        let raw = candidate(
            "GOLDFISH",
            &[&["GO", "OLD", "FISH"], &["G", "O", "L", "D", "FISH"]],
            &[("FISH", &["FISH", "TUNA"])],
        );
        let puzzle = validate_puzzle(raw, Difficulty::Easy).unwrap();
        assert_eq!(puzzle.deconstructions, vec![strings(&["G", "O", "L", "D", "FISH"])]);
    }

    #[test]
    fn drops_deconstructions_missing_solutions() {
        let raw = candidate(
            "BACKPACK",
            &[&["BACK", "PACK"], &["BACK", "P", "A", "C", "K"]],
            &[("BACK", &["BACK", "REAR"])],
        );
        let puzzle = validate_puzzle(raw, Difficulty::Easy).unwrap();
        assert_eq!(puzzle.deconstructions, vec![strings(&["BACK", "P", "A", "C", "K"])]);
        assert_eq!(puzzle.solutions.len(), 1);
    }

    #[test]
    fn two_letter_parts_need_no_solution() {
        let raw = candidate("GOLDFISH", &[&["GO", "L", "D", "FISH"]], &[("FISH", &["FISH"])]);
        let puzzle = validate_puzzle(raw, Difficulty::Easy).unwrap();
        assert_eq!(puzzle.deconstructions[0][0], "GO");
        assert!(puzzle.solution_for("GO").is_none());
    }

    #[test]
    fn rejects_empty_and_fully_invalid_lists() {
        let empty = candidate("GOLDFISH", &[], &[]);
        assert_eq!(
            validate_puzzle(empty, Difficulty::Easy),
            Err(Rejection::NoDeconstructions)
        );

        let broken = candidate("GOLDFISH", &[&["GOLD", "FIS"]], &[("GOLD", &["GOLD"])]);
        assert_eq!(
            validate_puzzle(broken, Difficulty::Easy),
            Err(Rejection::NoValidDeconstruction)
        );
    }

    #[test]
    fn rejects_bad_words() {
        let short = candidate("CAT", &[&["CAT"]], &[("CAT", &["CAT"])]);
        assert!(matches!(
            validate_puzzle(short, Difficulty::Easy),
            Err(Rejection::WordLength { len: 3, .. })
        ));
        let hyphen = candidate("ICE-CREAM", &[&["ICE", "-", "CREAM"]], &[]);
        assert!(matches!(
            validate_puzzle(hyphen, Difficulty::Easy),
            Err(Rejection::InvalidWord(_))
        ));
    }

    #[test]
    fn hard_mode_rejects_whole_word_pairs() {
        let raw = candidate(
            "BACKGROUND",
            &[&["BACK", "GROUND"]],
            &[("BACK", &["BACK"]), ("GROUND", &["GROUND"])],
        );
        assert_eq!(
            validate_puzzle(raw.clone(), Difficulty::Hard),
            Err(Rejection::HardModeNeedsLetters)
        );
        assert!(validate_puzzle(raw, Difficulty::Easy).is_ok());
    }

    #[test]
    fn hard_mode_keeps_only_qualifying_deconstructions() {
        let raw = candidate(
            "BACKGROUND",
            &[&["BACK", "GROUND"], &["B", "A", "C", "K", "GROUND"]],
            &[("BACK", &["BACK", "REAR"]), ("GROUND", &["GROUND", "EARTH"])],
        );
        let puzzle = validate_puzzle(raw, Difficulty::Hard).unwrap();
        assert_eq!(
            puzzle.deconstructions,
            vec![strings(&["B", "A", "C", "K", "GROUND"])]
        );
        let parts: Vec<&str> = puzzle.solutions.iter().map(|s| s.part.as_str()).collect();
        assert_eq!(parts, vec!["GROUND"]);
    }

    #[test]
    fn hard_mode_rejects_three_pictures() {
        let parts = strings(&["CAR", "PET", "S", "HOE"]);
        assert!(!satisfies_hard_rule(&parts));
        assert!(satisfies_hard_rule(&strings(&["K", "E", "Y", "BOARD"])));
    }

    #[test]
    fn canonical_part_is_inserted_when_missing_from_alternatives() {
        let raw = candidate("STARFISH", &[&["STAR", "F", "I", "S", "H"]], &[("star", &["sun", "sun"])]);
        let puzzle = validate_puzzle(raw, Difficulty::Easy).unwrap();
        assert_eq!(puzzle.solutions[0].alternatives, strings(&["STAR", "SUN"]));
    }

    #[test]
    fn mashup_requires_two_objects_including_starter() {
        let ok = MashupCandidate {
            word: "sunflower".to_string(),
            objects: strings(&["sun", "Flower"]),
            starter_word: "Sun".to_string(),
        };
        assert_eq!(
            validate_mashup(ok),
            Ok(ValidatedMashup {
                word: "SUNFLOWER".to_string(),
                objects: strings(&["SUN", "FLOWER"]),
                starter_word: "SUN".to_string(),
            })
        );

        let three = MashupCandidate {
            word: "X".to_string(),
            objects: strings(&["A", "B", "C"]),
            starter_word: "A".to_string(),
        };
        assert_eq!(validate_mashup(three), Err(Rejection::ObjectCount(3)));

        let stray = MashupCandidate {
            word: "KEYBOARD".to_string(),
            objects: strings(&["KEY", "BOARD"]),
            starter_word: "LOCK".to_string(),
        };
        assert_eq!(
            validate_mashup(stray),
            Err(Rejection::StarterNotInObjects("LOCK".to_string()))
        );
    }

    #[test]
    fn mashup_objects_need_not_spell_the_word() {
        let plural = MashupCandidate {
            word: "PANCAKES".to_string(),
            objects: strings(&["PAN", "CAKE"]),
            starter_word: "PAN".to_string(),
        };
        let accepted = validate_mashup(plural).unwrap();
        assert_eq!(accepted.word, "PANCAKES");
        assert_eq!(accepted.objects, strings(&["PAN", "CAKE"]));
    }
}
