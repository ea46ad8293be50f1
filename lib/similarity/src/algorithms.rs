//! String similarity primitives
//!
//! Each primitive compares two strings and returns a similarity normalized into
//! [0.0, 1.0] by its own rule. Edit-count algorithms (Levenshtein, Hamming) go
//! through [`normalize_edit_count`]; ratio algorithms are percentages rounded to
//! whole points, then scaled down.

use matchx_core::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A single string comparison algorithm used by the text ensemble
pub trait SimilarityPrimitive: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Normalized similarity in [0.0, 1.0]
    fn similarity(&self, a: &str, b: &str) -> f64;
}

/// The built-in algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlgorithm {
    SimpleRatio,
    PartialRatio,
    TokenSortRatio,
    TokenSetRatio,
    StringScore,
    Jaro,
    Levenshtein,
    Hamming,
}

impl TextAlgorithm {
    /// Every built-in algorithm, in ensemble order
    pub const ALL: [TextAlgorithm; 8] = [
        TextAlgorithm::SimpleRatio,
        TextAlgorithm::PartialRatio,
        TextAlgorithm::TokenSortRatio,
        TextAlgorithm::TokenSetRatio,
        TextAlgorithm::StringScore,
        TextAlgorithm::Jaro,
        TextAlgorithm::Levenshtein,
        TextAlgorithm::Hamming,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TextAlgorithm::SimpleRatio => "simple_ratio",
            TextAlgorithm::PartialRatio => "partial_ratio",
            TextAlgorithm::TokenSortRatio => "token_sort_ratio",
            TextAlgorithm::TokenSetRatio => "token_set_ratio",
            TextAlgorithm::StringScore => "string_score",
            TextAlgorithm::Jaro => "jaro",
            TextAlgorithm::Levenshtein => "levenshtein",
            TextAlgorithm::Hamming => "hamming",
        }
    }

    /// Normalized similarity of `a` and `b` in [0.0, 1.0]
    pub fn compare(&self, a: &str, b: &str) -> f64 {
        match self {
            TextAlgorithm::SimpleRatio => simple_ratio(a, b),
            TextAlgorithm::PartialRatio => partial_ratio(a, b),
            TextAlgorithm::TokenSortRatio => token_sort_ratio(a, b),
            TextAlgorithm::TokenSetRatio => token_set_ratio(a, b),
            TextAlgorithm::StringScore => {
                // The heuristic is asymmetric; the larger string is the haystack
                if a >= b {
                    string_score(a, b)
                } else {
                    string_score(b, a)
                }
            }
            TextAlgorithm::Jaro => strsim::jaro(a, b),
            TextAlgorithm::Levenshtein => normalize_edit_count(strsim::levenshtein(a, b)),
            TextAlgorithm::Hamming => normalize_edit_count(hamming_distance(a, b)),
        }
    }
}

impl SimilarityPrimitive for TextAlgorithm {
    fn name(&self) -> &str {
        self.as_str()
    }

    fn similarity(&self, a: &str, b: &str) -> f64 {
        self.compare(a, b)
    }
}

impl fmt::Display for TextAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextAlgorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TextAlgorithm::ALL
            .iter()
            .copied()
            .find(|algorithm| algorithm.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownAlgorithm(s.to_string()))
    }
}

/// Map an edit count to a ratio.
///
/// 0 edits is 1.0, 1-9 edits fall by tenths, 10-99 edits land below 0.1 and
/// 100 or more is 0.0. The drop between 9 and 10 edits is intentional.
pub fn normalize_edit_count(edits: usize) -> f64 {
    match edits {
        0 => 1.0,
        1..=9 => 1.0 - edits as f64 / 10.0,
        10..=99 => (1.0 - edits as f64 / 100.0) / 10.0,
        _ => 0.0,
    }
}

/// Hamming distance that counts any length difference as mismatches
pub fn hamming_distance(a: &str, b: &str) -> usize {
    strsim::hamming(a, b).unwrap_or_else(|_| {
        let mismatches = a.chars().zip(b.chars()).filter(|(x, y)| x != y).count();
        mismatches + a.chars().count().abs_diff(b.chars().count())
    })
}

/// Indel similarity `2 * LCS / (|a| + |b|)`, rounded to whole percentage points
pub fn simple_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    round_percent(indel_ratio(&a, &b))
}

/// Best simple ratio of the shorter string against every same-length window of the longer one
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if shorter.is_empty() {
        return 0.0;
    }

    let mut best = 0.0f64;
    for window in longer.windows(shorter.len()) {
        let ratio = indel_ratio(&shorter, window);
        if ratio > best {
            best = ratio;
            if best >= 0.995 {
                return 1.0;
            }
        }
    }
    round_percent(best)
}

/// Simple ratio after sorting the normalized tokens of both strings
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    let mut tokens_a = tokenize(a);
    let mut tokens_b = tokenize(b);
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }
    tokens_a.sort_unstable();
    tokens_b.sort_unstable();
    simple_ratio(&tokens_a.join(" "), &tokens_b.join(" "))
}

/// Token set comparison: shared tokens against shared tokens plus each remainder
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let tokens_a: BTreeSet<String> = tokenize(a).into_iter().collect();
    let tokens_b: BTreeSet<String> = tokenize(b).into_iter().collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let join = |tokens: Vec<&String>| -> String {
        tokens.into_iter().map(String::as_str).collect::<Vec<_>>().join(" ")
    };
    let sorted_sect = join(tokens_a.intersection(&tokens_b).collect());
    let diff_ab = join(tokens_a.difference(&tokens_b).collect());
    let diff_ba = join(tokens_b.difference(&tokens_a).collect());

    let combined_ab = format!("{} {}", sorted_sect, diff_ab).trim().to_string();
    let combined_ba = format!("{} {}", sorted_sect, diff_ba).trim().to_string();

    [
        simple_ratio(&sorted_sect, &combined_ab),
        simple_ratio(&sorted_sect, &combined_ba),
        simple_ratio(&combined_ab, &combined_ba),
    ]
    .into_iter()
    .fold(0.0, f64::max)
}

/// Abbreviation-friendly score of `word` inside `string`.
///
/// Consecutive characters earn 0.7, a character right after a space 0.9,
/// anything else 0.1, plus 0.1 when the case matches exactly. A character of
/// `word` not found in order makes the whole score 0.
pub fn string_score(string: &str, word: &str) -> f64 {
    if string == word {
        return 1.0;
    }
    if string.is_empty() || word.is_empty() {
        return 0.0;
    }

    let chars: Vec<char> = string.chars().collect();
    let lowered: Vec<char> = chars.iter().map(|c| fold_case(*c)).collect();
    let word_chars: Vec<char> = word.chars().collect();

    let mut running = 0.0;
    let mut start = 0usize;
    for &wc in &word_chars {
        let target = fold_case(wc);
        let idx = match lowered[start..].iter().position(|&c| c == target) {
            Some(offset) => start + offset,
            None => return 0.0,
        };

        let mut char_score = if idx == start {
            0.7
        } else if idx > 0 && chars[idx - 1] == ' ' {
            0.9
        } else {
            0.1
        };
        if chars[idx] == wc {
            char_score += 0.1;
        }

        running += char_score;
        start = idx + 1;
    }

    let mut score = 0.5 * (running / chars.len() as f64 + running / word_chars.len() as f64);
    if lowered[0] == fold_case(word_chars[0]) && score < 0.85 {
        score += 0.15;
    }
    score.clamp(0.0, 1.0)
}

fn fold_case(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Lower-case, replace anything that is not alphanumeric with a space, split
fn tokenize(s: &str) -> Vec<String> {
    let cleaned: String = s
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase();
    cleaned.split_whitespace().map(str::to_string).collect()
}

fn indel_ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 || a.is_empty() || b.is_empty() {
        return 0.0;
    }
    2.0 * lcs_len(a, b) as f64 / total as f64
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

fn round_percent(ratio: f64) -> f64 {
    (ratio * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_edit_count_bands() {
        assert_eq!(normalize_edit_count(0), 1.0);
        assert!((normalize_edit_count(1) - 0.9).abs() < 1e-12);
        assert!((normalize_edit_count(9) - 0.1).abs() < 1e-12);
        assert!((normalize_edit_count(10) - 0.09).abs() < 1e-12);
        assert!((normalize_edit_count(99) - 0.001).abs() < 1e-12);
        assert_eq!(normalize_edit_count(100), 0.0);
        assert_eq!(normalize_edit_count(5000), 0.0);
    }

    #[test]
    fn test_edit_count_drop_between_nine_and_ten() {
        assert!(normalize_edit_count(9) > normalize_edit_count(10));
    }

    #[test]
    fn test_simple_ratio() {
        assert_eq!(simple_ratio("Camp Nou", "Camp Nou"), 1.0);
        assert_eq!(simple_ratio("kitten", "sitting"), 0.62);
        assert_eq!(simple_ratio("abc", ""), 0.0);
    }

    #[test]
    fn test_partial_ratio_finds_substring() {
        assert_eq!(partial_ratio("Camp Nou", "Estadi Camp Nou"), 1.0);
        assert!(partial_ratio("Camp Nou", "Plaza Mayor") < 0.5);
    }

    #[test]
    fn test_token_sort_ratio_ignores_order_and_case() {
        assert_eq!(token_sort_ratio("Nou Camp", "camp nou"), 1.0);
        assert_eq!(token_sort_ratio("!!!", "camp"), 0.0);
    }

    #[test]
    fn test_token_set_ratio_ignores_extra_tokens() {
        assert_eq!(token_set_ratio("Santiago Bernabeu", "Estadio Santiago Bernabeu"), 1.0);
        assert!(token_set_ratio("Camp Nou", "Plaza Mayor") < 0.5);
    }

    #[test]
    fn test_string_score() {
        assert_eq!(string_score("Camp Nou", "Camp Nou"), 1.0);
        assert!((string_score("hello world", "hw") - 0.681818).abs() < 1e-4);
        assert_eq!(string_score("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_hamming_unequal_lengths() {
        assert_eq!(hamming_distance("abc", "abd"), 1);
        assert_eq!(hamming_distance("abc", "abcde"), 2);
        assert!((TextAlgorithm::Hamming.compare("abc", "abcde") - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_every_algorithm_scores_identical_strings_as_one() {
        for algorithm in TextAlgorithm::ALL {
            let ratio = algorithm.compare("Santiago Bernabeu", "Santiago Bernabeu");
            assert!((ratio - 1.0).abs() < 1e-12, "{algorithm} gave {ratio}");
        }
    }

    #[test]
    fn test_every_algorithm_stays_in_unit_range() {
        let pairs = [
            ("Camp Nou", "Hotel NH Rallye"),
            ("Plaza Mayor - Madrid", "Plaza Catalunya - BCN"),
            ("a", "a much longer string with many words"),
        ];
        for algorithm in TextAlgorithm::ALL {
            for (a, b) in pairs {
                let ratio = algorithm.compare(a, b);
                assert!((0.0..=1.0).contains(&ratio), "{algorithm} gave {ratio} for {a:?} / {b:?}");
            }
        }
    }

    #[test]
    fn test_algorithm_names_round_trip() {
        for algorithm in TextAlgorithm::ALL {
            assert_eq!(algorithm.as_str().parse::<TextAlgorithm>().unwrap(), algorithm);
        }
        assert!(matches!(
            "soundex".parse::<TextAlgorithm>(),
            Err(ConfigError::UnknownAlgorithm(name)) if name == "soundex"
        ));
    }
}
