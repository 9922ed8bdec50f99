//! String similarity metrics used for topic matching and title dedup.
//!
//! Both callers lower-case their inputs before comparing; the metrics
//! themselves are case-sensitive.

/// A symmetric similarity score in `[0, 1]`, where `1.0` means identical.
pub trait TextSimilarity: Send + Sync {
    fn similarity(&self, a: &str, b: &str) -> f64;
}

/// Ratcliff/Obershelp "gestalt" ratio: twice the number of characters in
/// matching blocks over the combined length.
///
/// Matching blocks are found by taking the longest common substring and
/// recursing on the pieces to its left and right.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceRatio;

impl TextSimilarity for SequenceRatio {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        let total = a.len() + b.len();
        if total == 0 {
            return 1.0;
        }
        2.0 * matching_chars(&a, &b) as f64 / total as f64
    }
}

/// Levenshtein distance normalized by the longer input, via `strsim`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedLevenshtein;

impl TextSimilarity for NormalizedLevenshtein {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        strsim::normalized_levenshtein(a, b)
    }
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (i, j, len) = longest_common_block(a, b);
    if len == 0 {
        return 0;
    }
    len + matching_chars(&a[..i], &b[..j]) + matching_chars(&a[i + len..], &b[j + len..])
}

/// Longest common substring as `(start_in_a, start_in_b, len)`, earliest
/// block wins ties.
fn longest_common_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    // prev[j + 1] = length of the common suffix of a[..i] and b[..=j]
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb { prev[j] + 1 } else { 0 };
            let len = curr[j + 1];
            if len > best.2 {
                best = (i + 1 - len, j + 1 - len, len);
            }
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_score_one() {
        assert_eq!(SequenceRatio.similarity("gaming news", "gaming news"), 1.0);
        assert_eq!(SequenceRatio.similarity("", ""), 1.0);
    }

    #[test]
    fn disjoint_strings_score_zero() {
        assert_eq!(SequenceRatio.similarity("abc", "xyz"), 0.0);
        assert_eq!(SequenceRatio.similarity("abc", ""), 0.0);
    }

    #[test]
    fn ratio_matches_gestalt_definition() {
        // "bcd" is the only matching block: 2 * 3 / 8
        assert!((SequenceRatio.similarity("abcd", "bcde") - 0.75).abs() < 1e-9);
        // "ab" and "d" match around the differing middle: 2 * 3 / 8
        assert!((SequenceRatio.similarity("abxd", "abyd") - 0.75).abs() < 1e-9);
    }

    #[test]
    fn near_duplicate_titles_score_high() {
        let score = SequenceRatio.similarity("ai breakthrough in 2024", "ai breakthroughs in 2024");
        assert!(score >= 0.8, "{score}");
        let score = SequenceRatio.similarity(
            "ai breakthrough in 2024",
            "new esports league announced",
        );
        assert!(score < 0.8, "{score}");
    }

    #[test]
    fn ratio_is_symmetric_for_titles() {
        let a = "top 10 esports tournaments 2024";
        let b = "top esports tournaments of 2024";
        let ab = SequenceRatio.similarity(a, b);
        let ba = SequenceRatio.similarity(b, a);
        assert!((ab - ba).abs() < 0.05, "{ab} vs {ba}");
    }

    #[test]
    fn levenshtein_metric() {
        assert_eq!(NormalizedLevenshtein.similarity("gaming", "gaming"), 1.0);
        let score = NormalizedLevenshtein.similarity("gaming_news", "gaming_new");
        assert!(score > 0.9, "{score}");
    }
}
