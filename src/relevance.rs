//! Keyword relevance scoring.
//!
//! A candidate's text is scored against a topic's keywords:
//!
//! - Any exclusion keyword present (case-insensitive substring) vetoes the
//!   candidate with a score of exactly `0.0`.
//! - Each keyword found contributes `occurrences * chars(keyword) / 10`,
//!   capped at `1.0`, so longer and more frequent keywords weigh more.
//! - The sum is averaged over all keywords and then multiplied by the
//!   fraction of keywords that matched at all, rewarding breadth as well as
//!   depth.
//!
//! The function is pure; identical inputs always produce identical scores.

/// Scores `text` against a topic's keyword profile.
///
/// # Arguments
///
/// * `text` - Title and body of the candidate, already stripped of markup
/// * `keywords` - Terms that make the text relevant
/// * `exclude_keywords` - Terms that veto the text outright
///
/// # Returns
///
/// A score in `[0, 1]`. Exactly `0.0` when any exclusion keyword appears,
/// whatever else matched.
pub fn relevance_score<K, E>(text: &str, keywords: &[K], exclude_keywords: &[E]) -> f64
where
    K: AsRef<str>,
    E: AsRef<str>,
{
    let text = text.to_lowercase();

    let vetoed = exclude_keywords
        .iter()
        .map(|k| k.as_ref().trim().to_lowercase())
        .any(|k| !k.is_empty() && text.contains(&k));
    if vetoed || keywords.is_empty() {
        return 0.0;
    }

    let mut total = 0.0;
    let mut matched = 0usize;
    for keyword in keywords {
        let keyword = keyword.as_ref().to_lowercase();
        if keyword.is_empty() {
            continue;
        }
        let count = text.matches(keyword.as_str()).count();
        if count > 0 {
            matched += 1;
            let weight = count as f64 * (keyword.chars().count() as f64 / 10.0);
            total += weight.min(1.0);
        }
    }

    let n = keywords.len() as f64;
    ((total / n) * (matched as f64 / n)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GAMING: [&str; 2] = ["gaming", "esports"];
    const EXCLUDE: [&str; 2] = ["gambling", "casino"];

    fn esports_article() -> String {
        let body = "The esports scene is booming. Fans of esports watched esports finals, \
                    esports analysts praised the esports organisers, and gaming brands \
                    sponsored it. Mobile gaming joined too.";
        format!("Top 10 Esports Tournaments 2024 {body}")
    }

    #[test]
    fn strong_match_passes_thresholds() {
        let score = relevance_score(&esports_article(), &GAMING, &EXCLUDE);
        assert!(score > 0.3, "{score}");
        assert!(score <= 1.0);
    }

    #[test]
    fn exclusion_keyword_vetoes_everything() {
        let text = format!("{} casino {}", esports_article(), "gaming ".repeat(20));
        assert_eq!(relevance_score(&text, &GAMING, &EXCLUDE), 0.0);
    }

    #[test]
    fn exclusion_is_case_insensitive() {
        let text = "GAMING news from the CASINO floor";
        assert_eq!(relevance_score(text, &GAMING, &EXCLUDE), 0.0);
    }

    #[test]
    fn empty_keywords_score_zero() {
        let none: [&str; 0] = [];
        assert_eq!(relevance_score("gaming esports", &none, &EXCLUDE), 0.0);
    }

    #[test]
    fn no_matches_score_zero() {
        assert_eq!(relevance_score("cooking and gardening", &GAMING, &EXCLUDE), 0.0);
    }

    #[test]
    fn breadth_and_depth_are_both_rewarded() {
        // "gaming" once: 0.6 capped per keyword, one of two matched:
        // (0.6 / 2) * (1 / 2)
        let one = relevance_score("gaming", &GAMING, &EXCLUDE);
        assert!((one - 0.15).abs() < 1e-9, "{one}");

        // both keywords, each capped at 1.0
        let both = relevance_score("gaming gaming esports esports", &GAMING, &EXCLUDE);
        assert!((both - 1.0).abs() < 1e-9, "{both}");
    }

    #[test]
    fn per_keyword_contribution_is_capped() {
        let many = relevance_score(&"gaming ".repeat(50), &GAMING, &EXCLUDE);
        let two = relevance_score("gaming gaming", &GAMING, &EXCLUDE);
        assert_eq!(many, two);
    }

    #[test]
    fn scoring_is_deterministic() {
        let text = esports_article();
        let first = relevance_score(&text, &GAMING, &EXCLUDE);
        let second = relevance_score(&text, &GAMING, &EXCLUDE);
        assert_eq!(first, second);
    }

    #[test]
    fn score_stays_in_unit_interval() {
        let keywords = ["a", "ab", "abc"];
        let score = relevance_score(&"abc ".repeat(100), &keywords, &EXCLUDE);
        assert!((0.0..=1.0).contains(&score), "{score}");
    }
}
