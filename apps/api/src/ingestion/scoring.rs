//! Match Scoring: relevance of a posting's text to a user's declared skill.
//!
//! Pure-Rust, deterministic, no I/O. Scores are in `[0, 100]`.
//!
//! Algorithm:
//! 1. Lower-case both inputs; a blank skill scores 0.
//! 2. Skill is a substring of text → fraction 1.0. Otherwise split the skill
//!    on whitespace/commas and count words longer than 3 chars found in the
//!    text, divided by the word count.
//! 3. base = fraction × 100
//! 4. If the skill names a tech keyword, add 5 per tech keyword in the text.
//! 5. Clamp to 100.

/// Tech keywords that earn a bonus when the skill is tech-related.
pub const TECH_KEYWORDS: &[&str] = &[
    "javascript",
    "python",
    "react",
    "node",
    "java",
    "typescript",
    "html",
    "css",
];

const KEYWORD_BONUS: f64 = 5.0;
const MAX_SCORE: f64 = 100.0;
/// Skill words must be longer than this to count as a partial match.
const MIN_WORD_LEN: usize = 3;

/// Relevance of `text` to `skill`, in `[0, 100]`.
pub fn score(text: &str, skill: &str) -> f64 {
    let skill = skill.trim().to_lowercase();
    if skill.is_empty() {
        return 0.0;
    }
    let text = text.to_lowercase();

    let base = skill_match_fraction(&text, &skill) * 100.0;

    let bonus = if TECH_KEYWORDS.iter().any(|k| skill.contains(k)) {
        TECH_KEYWORDS.iter().filter(|k| text.contains(*k)).count() as f64 * KEYWORD_BONUS
    } else {
        0.0
    };

    (base + bonus).min(MAX_SCORE)
}

/// Fraction of the skill found in the text. Both inputs must be lower-case.
fn skill_match_fraction(text: &str, skill: &str) -> f64 {
    if text.contains(skill) {
        return 1.0;
    }

    let words: Vec<&str> = skill
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|w| !w.is_empty())
        .collect();
    if words.is_empty() {
        return 0.0;
    }

    let matches = words
        .iter()
        .filter(|w| w.chars().count() > MIN_WORD_LEN && text.contains(**w))
        .count();
    matches as f64 / words.len() as f64
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
