use std::collections::BTreeSet;
use wordplay_protocol::{GameMode, WordCounts};

/// Words already produced in this session, split by game mode.
///
/// A word belongs to at most one mode: whichever mode produced it first keeps
/// it, later productions in the other mode only land in the overall set.
/// This keeps `shrinker ∩ mashup = ∅` even though both fallbacks share a word.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordTracker {
    all: BTreeSet<String>,
    mashup: BTreeSet<String>,
    shrinker: BTreeSet<String>,
}

impl WordTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `word` (uppercased) for `mode`. Returns `true` when the mode
    /// set gained the word.
    pub fn record(&mut self, mode: GameMode, word: &str) -> bool {
        let word = word.trim().to_uppercase();
        if word.is_empty() {
            return false;
        }
        self.all.insert(word.clone());
        let (own, other) = match mode {
            GameMode::WordShrinker => (&mut self.shrinker, &self.mashup),
            GameMode::WordMashup => (&mut self.mashup, &self.shrinker),
        };
        if other.contains(&word) {
            return false;
        }
        own.insert(word)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.all.contains(&word.trim().to_uppercase())
    }

    pub fn counts(&self) -> WordCounts {
        WordCounts {
            total: self.all.len(),
            mashup: self.mashup.len(),
            shrinker: self.shrinker.len(),
        }
    }

    /// Sorted words for one mode, or every word when `mode` is `None`.
    pub fn words(&self, mode: Option<GameMode>) -> Vec<String> {
        let set = match mode {
            None => &self.all,
            Some(GameMode::WordShrinker) => &self.shrinker,
            Some(GameMode::WordMashup) => &self.mashup,
        };
        set.iter().cloned().collect()
    }

    /// Every generated word plus `extra`, uppercased, sorted, without repeats.
    pub fn exclusion_list(&self, extra: &[String]) -> Vec<String> {
        let mut words = self.all.clone();
        words.extend(
            extra
                .iter()
                .map(|word| word.trim().to_uppercase())
                .filter(|word| !word.is_empty()),
        );
        words.into_iter().collect()
    }

    pub fn clear(&mut self) {
        self.all.clear();
        self.mashup.clear();
        self.shrinker.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn record_normalizes_and_splits_by_mode() {
        let mut tracker = WordTracker::new();
        assert!(tracker.record(GameMode::WordShrinker, "goldfish"));
        assert!(tracker.record(GameMode::WordMashup, " Sunflower "));
        assert!(!tracker.record(GameMode::WordShrinker, "GOLDFISH"));

        assert_eq!(
            tracker.counts(),
            WordCounts {
                total: 2,
                mashup: 1,
                shrinker: 1
            }
        );
        assert_eq!(tracker.words(None), vec!["GOLDFISH", "SUNFLOWER"]);
        assert!(tracker.contains("sunflower"));
    }

    #[test]
    fn modes_stay_disjoint_when_a_word_repeats_across_modes() {
        let mut tracker = WordTracker::new();
        tracker.record(GameMode::WordShrinker, "STARFISH");
        assert!(!tracker.record(GameMode::WordMashup, "STARFISH"));

        let shrinker = tracker.words(Some(GameMode::WordShrinker));
        let mashup = tracker.words(Some(GameMode::WordMashup));
        assert_eq!(shrinker, vec!["STARFISH"]);
        assert!(mashup.is_empty());
        assert_eq!(tracker.counts().total, 1);
    }

    #[test]
    fn exclusion_list_merges_extra_words() {
        let mut tracker = WordTracker::new();
        tracker.record(GameMode::WordShrinker, "KEYBOARD");
        let excluded = tracker.exclusion_list(&["football".to_string(), "KEYBOARD".to_string()]);
        assert_eq!(excluded, vec!["FOOTBALL", "KEYBOARD"]);
    }

    #[test]
    fn blank_words_are_ignored_and_clear_resets() {
        let mut tracker = WordTracker::new();
        assert!(!tracker.record(GameMode::WordMashup, "  "));
        tracker.record(GameMode::WordMashup, "DOGHOUSE");
        tracker.clear();
        assert_eq!(tracker.counts(), WordCounts::default());
    }
}
