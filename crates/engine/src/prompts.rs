//! Prompt text for every backend call.

use wordplay_protocol::{Difficulty, WordMashupPuzzle};

pub const PUZZLE_SYSTEM_INSTRUCTION: &str =
    "You are a creative puzzle generator. Output ONLY a single, valid JSON object. Follow instructions EXACTLY.";

fn exclusion_block(excluded: &[String], label: &str) -> String {
    if excluded.is_empty() {
        return String::new();
    }
    format!(
        "\n\nIMPORTANT: DO NOT use these {label} words: {}",
        excluded.join(", ")
    )
}

pub fn puzzle_prompt(difficulty: Difficulty, excluded: &[String]) -> String {
    let exclusions = exclusion_block(excluded, "already generated");
    match difficulty {
        Difficulty::Easy => format!(
            r#"Generate an EASY puzzle.
RULES:
1. Pick a common word of 6-12 letters.
2. Give 1-2 deconstructions of it.
   - Exactly ONE part is picturable: 3+ letters and a concrete noun such as "CAR" or "SUN".
   - Every other part is a SINGLE LETTER ("T", "E", "R"). Never use two-letter groups like "ER", "IN" or "AS".
   - Good: "CARPENTER" -> ["CAR", "P", "E", "N", "T", "E", "R"]
   - Bad: ["CAR", "PEN", "T", "ER"] because "ER" is not allowed.
3. For the picturable part list at least 3 alternatives, the part itself first.
4. Check before answering: the parts joined together spell the word, and only the picturable part has a solution entry.{exclusions}

Example:
{{
  "word": "BACKPACK",
  "deconstructions": [["BACK", "P", "A", "C", "K"]],
  "solutions": [{{"part": "BACK", "alternatives": ["BACK", "REAR", "SPINE"]}}]
}}

Generate a new EASY puzzle."#
        ),
        Difficulty::Hard => format!(
            r#"Generate a HARD puzzle.
RULES:
1. Pick a common word of 8-15 letters.
2. Give 1-2 deconstructions of it.
   - At most TWO parts are picturable: 3+ letters and a concrete noun such as "KEY" or "BOARD".
   - Every other part is a SINGLE LETTER ("T", "E", "R"). Never use two-letter groups like "ER", "IN" or "AS".
   - A deconstruction must never be just whole words like ["BACK", "GROUND"]; it has to include single letters.
   - Good: "BACKGROUND" -> ["B", "A", "C", "K", "GROUND"] or ["BACK", "G", "R", "O", "U", "N", "D"]
   - Bad: ["BACK", "GROUND"] (no single letters), ["CAR", "PEN", "TER"] ("TER" is not a noun).
3. For EACH picturable part list at least 3 alternatives, the part itself first.
4. Check before answering: the parts joined together spell the word, and only picturable parts have solution entries.{exclusions}

Example:
{{
  "word": "KEYBOARD",
  "deconstructions": [["K", "E", "Y", "BOARD"]],
  "solutions": [{{"part": "BOARD", "alternatives": ["BOARD", "PLANK", "PANEL"]}}]
}}

Generate a new HARD puzzle."#
        ),
    }
}

pub fn mashup_prompt(excluded: &[String]) -> String {
    let exclusions = exclusion_block(excluded, "already generated or overused");
    format!(
        r#"Generate a WORD MASHUP puzzle.

RULES:
1. Pick a compound word (6-12 letters) made of TWO picturable objects.
2. The word must split into exactly TWO concrete nouns.
3. Choose one of the two objects as the "starter"; the player starts with a picture of it.
4. The player has to blend the other object into that picture.

EXAMPLES:
- "SUNFLOWER": objects ["SUN", "FLOWER"], starter "SUN"
- "KEYBOARD": objects ["KEY", "BOARD"], starter "KEY"
- "DOGHOUSE": objects ["DOG", "HOUSE"], starter "DOG"
- "SNOWMAN": objects ["SNOW", "MAN"], starter "SNOW"
- "BUTTERFLY": objects ["BUTTER", "FLY"], starter "BUTTER"{exclusions}

Respond with JSON:
{{
  "word": "SUNFLOWER",
  "objects": ["SUN", "FLOWER"],
  "starterWord": "SUN"
}}

Generate a new mashup puzzle."#
    )
}

fn quoted_list(values: &[String]) -> String {
    values
        .iter()
        .map(|value| format!("\"{value}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn verification_prompt(word: &str, submission: &[String]) -> String {
    let parts = quoted_list(submission);
    let count = submission.len();
    format!(
        r#"You judge a creative word puzzle game. The target word is "{word}".
The player had {count} boxes to fill and submitted this deconstruction: [{parts}].

Decide whether the submission is a valid deconstruction of the target word.

Rules:
1. Concatenation is mandatory. The parts joined in order must spell the target word exactly, otherwise the answer is wrong. For "GOLDFISH", ["G", "O", "L", "D", "FISH"] is correct because G+O+L+D+FISH = GOLDFISH.
2. Every part longer than one letter must be a real, meaningful English word.
3. Reward clever, creative interpretations as long as rules 1 and 2 hold.

Examples:
- "GOLDFISH", ["GOLD", "F", "I", "S", "H"]: correct, "GOLD" is a word.
- "KEYBOARD", ["KEY", "B", "OAR", "D"]: correct, unusual but "KEY" and "OAR" are words.
- "GOLDFISH", ["GO", "OLD", "FISH"]: incorrect, GO+OLD+FISH does not spell GOLDFISH.

Now judge "{word}": [{parts}].

Respond ONLY with JSON {{"correct": boolean, "reasoning": "a short, encouraging explanation; praise creativity when correct, name the broken rule when not"}}."#
    )
}

pub fn judgment_prompt(puzzle: &WordMashupPuzzle, user_prompt: &str) -> String {
    let word = &puzzle.word;
    let objects = puzzle.objects.join(" + ");
    format!(
        r#"You are a fun, creative judge for a word mashup game.

Rate the player's image mashup by looking at the ATTACHED IMAGE.

Game context:
- Target word: "{word}"
- Required objects: {objects}
- Player's edit prompt: "{user_prompt}"

Judging rules (judge what you SEE, not the prompt text):
1. Both objects from the word must be clearly visible.
2. The objects must be visually blended, not just placed side by side.
3. Creativity, humor and surprise earn bonus points.

Scoring:
- 8-10: amazing, creative and well integrated
- 6-7: good, clear objects with decent integration
- 4-5: objects present, basic integration
- 1-3: weak, unclear objects or poor integration
- 0: no mashup or objects missing

Respond with JSON:
{{
  "score": 0-10,
  "feedback": "short, fun feedback",
  "objectsFound": ["OBJECT", "OBJECT"],
  "mashupQuality": "low|medium|high"
}}

Keep the feedback encouraging."#
    )
}

pub fn part_image_prompt(part: &str) -> String {
    format!(
        "Create a clean, simple, icon-style image representing \"{part}\", minimalist vector art, transparent background."
    )
}

pub fn starter_image_prompt(object: &str) -> String {
    format!(
        "A kawaii-style sticker of a {}. Bold, clean outlines, simple cel-shading and a vibrant color palette. The background must be white.",
        object.to_lowercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclusions_only_appear_when_present() {
        let none = puzzle_prompt(Difficulty::Easy, &[]);
        assert!(!none.contains("DO NOT use"));

        let some = puzzle_prompt(Difficulty::Hard, &["GOLDFISH".to_string(), "KEYBOARD".to_string()]);
        assert!(some.contains("DO NOT use these already generated words: GOLDFISH, KEYBOARD"));
        assert!(some.contains("HARD puzzle"));
    }

    #[test]
    fn verification_prompt_quotes_each_part() {
        let prompt = verification_prompt("GOLDFISH", &["GO".into(), "OLD".into(), "FISH".into()]);
        assert!(prompt.contains(r#"["GO", "OLD", "FISH"]"#));
        assert!(prompt.contains("3 boxes"));
    }

    #[test]
    fn starter_prompt_lowercases_object() {
        assert!(starter_image_prompt("STAR").contains("sticker of a star."));
    }
}
