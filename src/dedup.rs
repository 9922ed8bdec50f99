//! Near-duplicate removal over an already ranked candidate list.

use crate::models::CrawledContent;
use crate::similarity::TextSimilarity;
use tracing::debug;

/// Drops every item whose lower-cased title is at least `threshold` similar
/// to the title of an item kept earlier.
///
/// This is a single greedy pass: each title is compared only with titles
/// already accepted, so the first of a group of near-duplicates survives and
/// the relative order of survivors is unchanged.
pub fn deduplicate(
    items: Vec<CrawledContent>,
    metric: &dyn TextSimilarity,
    threshold: f64,
) -> Vec<CrawledContent> {
    let mut seen_titles: Vec<String> = Vec::with_capacity(items.len());
    let mut unique = Vec::with_capacity(items.len());

    for item in items {
        let title = item.title.to_lowercase();
        let duplicate_of = seen_titles
            .iter()
            .find(|seen| metric.similarity(&title, seen) >= threshold);
        if let Some(seen) = duplicate_of {
            debug!(title = %item.title, duplicate_of = %seen, source = %item.source, "Dropping near-duplicate");
            continue;
        }
        seen_titles.push(title);
        unique.push(item);
    }

    unique
}
