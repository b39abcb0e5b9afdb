//! Title similarity scoring used by the deduplicator.

use std::collections::BTreeSet;

/// Scores how alike two titles are, from 0 (unrelated) to 100 (same).
///
/// Implementations must be symmetric: `score(a, b) == score(b, a)`.
pub trait TitleSimilarity {
    fn score(&self, a: &str, b: &str) -> f64;
}

impl<F> TitleSimilarity for F
where
    F: Fn(&str, &str) -> f64,
{
    fn score(&self, a: &str, b: &str) -> f64 {
        self(a, b)
    }
}

/// Token-set ratio: insensitive to word order and repeated words.
///
/// Both titles are split on whitespace into sets. The shared words and each
/// side's leftovers are sorted and joined; if one side has no leftovers the
/// titles score 100, otherwise the best indel ratio among
/// `shared` vs `shared + left`, `shared` vs `shared + right` and
/// `shared + left` vs `shared + right` wins. Case and punctuation count.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenSetRatio;

impl TitleSimilarity for TokenSetRatio {
    fn score(&self, a: &str, b: &str) -> f64 {
        token_set_ratio(a, b)
    }
}

/// See [`TokenSetRatio`].
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let left: BTreeSet<&str> = a.split_whitespace().collect();
    let right: BTreeSet<&str> = b.split_whitespace().collect();
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let shared: Vec<&str> = left.intersection(&right).copied().collect();
    let only_left: Vec<&str> = left.difference(&right).copied().collect();
    let only_right: Vec<&str> = right.difference(&left).copied().collect();

    if !shared.is_empty() && (only_left.is_empty() || only_right.is_empty()) {
        return 100.0;
    }

    let shared = shared.join(" ");
    let combined_left = join_nonempty(&shared, &only_left.join(" "));
    let combined_right = join_nonempty(&shared, &only_right.join(" "));

    [
        ratio(&shared, &combined_left),
        ratio(&shared, &combined_right),
        ratio(&combined_left, &combined_right),
    ]
    .into_iter()
    .fold(0.0, f64::max)
}

fn join_nonempty(head: &str, tail: &str) -> String {
    match (head.is_empty(), tail.is_empty()) {
        (true, _) => tail.to_string(),
        (_, true) => head.to_string(),
        _ => format!("{head} {tail}"),
    }
}

/// Indel similarity: `100 * (1 - (insertions + deletions) / (len_a + len_b))`,
/// which is `200 * lcs / (len_a + len_b)`. Lengths count chars.
fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let total = (a.len() + b.len()) as f64;
    200.0 * longest_common_subsequence(&a, &b) as f64 / total
}

fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    let mut row = vec![0usize; b.len() + 1];
    for &ca in a {
        let mut diagonal = 0;
        for (j, &cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diagonal + 1
            } else {
                above.max(row[j])
            };
            diagonal = above;
        }
    }
    row[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_titles_score_100() {
        assert_eq!(token_set_ratio("Ruck March", "Ruck March"), 100.0);
    }

    #[test]
    fn word_order_and_repeats_do_not_matter() {
        assert_eq!(
            token_set_ratio("Coffee Veterans Meetup", "Meetup Veterans Coffee Coffee"),
            100.0
        );
    }

    #[test]
    fn subset_scores_100() {
        assert_eq!(
            token_set_ratio("Veterans Coffee", "Veterans Coffee at the Legion"),
            100.0
        );
    }

    #[test]
    fn punctuation_variant_stays_above_90() {
        let score = token_set_ratio("Veterans Coffee Meetup", "Veterans Coffee  Meetup!!");
        assert!(score >= 90.0, "score {score}");
        assert!(score < 100.0, "score {score}");
    }

    #[test]
    fn trailing_punctuation_on_short_titles_stays_above_90() {
        let ruck = token_set_ratio("Ruck March", "Ruck March!!");
        assert!((ruck - 100.0 * 20.0 / 22.0).abs() < 1e-9, "score {ruck}");

        let parade = token_set_ratio("Veterans Day Parade", "Veterans Day Parade!!!");
        assert!((parade - 100.0 * 38.0 / 41.0).abs() < 1e-9, "score {parade}");
    }

    #[test]
    fn ratio_counts_insertions_and_deletions() {
        assert_eq!(ratio("abc", "abc"), 100.0);
        // "ab" -> "abcd": two insertions over six chars.
        assert!((ratio("ab", "abcd") - 100.0 * 4.0 / 6.0).abs() < 1e-9);
        // A substitution costs a deletion plus an insertion.
        assert_eq!(ratio("abcd", "abxd"), 75.0);
        assert_eq!(ratio("", "abc"), 0.0);
    }

    #[test]
    fn different_events_score_low() {
        let score = token_set_ratio("Women Veterans Retreat", "PTSD Support Group");
        assert!(score < 50.0, "score {score}");
    }

    #[test]
    fn case_is_significant() {
        assert!(token_set_ratio("RUCK MARCH", "ruck march") < 90.0);
    }

    #[test]
    fn empty_titles_score_zero() {
        assert_eq!(token_set_ratio("", "Ruck March"), 0.0);
        assert_eq!(token_set_ratio("   ", "   "), 0.0);
    }

    #[test]
    fn symmetric() {
        let pairs = [
            ("Veterans Day Parade", "Veterans Day Parade 2025"),
            ("Job Fair", "Hiring Fair for Vets"),
            ("A B C", "C D E"),
        ];
        for (a, b) in pairs {
            assert_eq!(token_set_ratio(a, b), token_set_ratio(b, a));
        }
    }

    #[test]
    fn closures_are_scorers() {
        let fixed = |_: &str, _: &str| 42.0;
        assert_eq!(fixed.score("a", "b"), 42.0);
    }
}
