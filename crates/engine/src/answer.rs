use crate::validator::normalize;
use wordplay_protocol::Puzzle;

/// Accepts a submission that matches one of the puzzle's decompositions
/// position by position. Single letters must match exactly; longer parts
/// match any listed alternative. Runs entirely offline.
pub fn check_answer(puzzle: &Puzzle, submitted: &[String]) -> bool {
    let submitted: Vec<String> = submitted.iter().map(|part| normalize(part)).collect();
    puzzle
        .deconstructions
        .iter()
        .filter(|parts| parts.len() == submitted.len())
        .any(|parts| {
            parts
                .iter()
                .zip(&submitted)
                .all(|(expected, given)| part_matches(puzzle, expected, given))
        })
}

fn part_matches(puzzle: &Puzzle, expected: &str, given: &str) -> bool {
    if expected.chars().count() == 1 {
        return normalize(expected) == given;
    }
    puzzle.solution_for(expected).is_some_and(|entry| {
        entry
            .alternatives
            .iter()
            .any(|alternative| normalize(alternative) == given)
    })
}
