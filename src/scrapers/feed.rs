//! RSS and Atom strategy.
//!
//! One request per source. The document is read as RSS (0.9x, 1.0 or 2.0)
//! with the `rss` crate, falling back to Atom with `atom_syndication`.
//! Namespaced extensions (`media:*`, `atom:link`, `dc:*`) are kept out of
//! the core fields; `dc:date` stands in for a missing `pubDate`. Both
//! dialects are flattened into [`FeedEntry`] values.

use super::{CrawlContext, Draft, polite_get};
use crate::error::FetchError;
use crate::http::HttpFetch;
use crate::models::CrawledContent;
use crate::relevance::relevance_score;
use crate::utils::{
    extractive_summary, html_to_text, normalize_whitespace, parse_date, truncate_for_log,
};
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};
use url::Url;
use uuid::Uuid;

/// A feed item with the fields every dialect shares.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub title: String,
    pub link: Option<String>,
    /// Raw description, summary or content; may contain markup.
    pub summary: String,
    pub published: Option<DateTime<Utc>>,
}

fn non_empty(link: &str) -> Option<String> {
    let link = link.trim();
    (!link.is_empty()).then(|| link.to_string())
}

impl From<&rss::Item> for FeedEntry {
    fn from(item: &rss::Item) -> Self {
        let published = item
            .pub_date()
            .and_then(parse_date)
            .or_else(|| {
                item.dublin_core_ext()
                    .and_then(|dc| dc.dates().iter().find_map(|d| parse_date(d)))
            });
        Self {
            title: normalize_whitespace(item.title().unwrap_or_default()),
            link: item.link().and_then(non_empty),
            summary: item
                .description()
                .or_else(|| item.content())
                .unwrap_or_default()
                .to_string(),
            published,
        }
    }
}

impl From<&atom_syndication::Entry> for FeedEntry {
    fn from(entry: &atom_syndication::Entry) -> Self {
        // The `alternate` link, or the first link with an address.
        let link = entry
            .links()
            .iter()
            .find(|l| l.rel() == "alternate" && !l.href().trim().is_empty())
            .or_else(|| entry.links().iter().find(|l| !l.href().trim().is_empty()))
            .and_then(|l| non_empty(l.href()));
        let summary = entry
            .summary()
            .map(|s| s.as_str())
            .or_else(|| entry.content().and_then(|c| c.value()))
            .unwrap_or_default()
            .to_string();
        // A missing <updated> reads back as the Unix epoch.
        let published = entry
            .published()
            .or(Some(entry.updated()))
            .filter(|d| d.timestamp() > 0)
            .map(|d| d.with_timezone(&Utc));
        Self {
            title: normalize_whitespace(entry.title().as_str()),
            link,
            summary,
            published,
        }
    }
}

/// Parse an RSS or Atom document into entries, in document order.
///
/// # Arguments
///
/// * `xml` - The raw feed document
///
/// # Returns
///
/// Every item or entry, or [`FetchError::Payload`] naming why the document
/// is neither RSS nor Atom.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>, FetchError> {
    let rss_err = match rss::Channel::read_from(xml.as_bytes()) {
        Ok(channel) => return Ok(channel.items().iter().map(FeedEntry::from).collect()),
        Err(e) => e,
    };
    match atom_syndication::Feed::read_from(xml.as_bytes()) {
        Ok(feed) => Ok(feed.entries().iter().map(FeedEntry::from).collect()),
        Err(atom_err) => Err(FetchError::Payload(format!(
            "not RSS ({rss_err}) or Atom ({atom_err})"
        ))),
    }
}

/// Crawl a feed, keeping at most `max_items` of its leading entries.
#[instrument(level = "info", skip_all, fields(source = %ctx.source.name))]
pub async fn crawl<F: HttpFetch>(
    http: &F,
    ctx: CrawlContext<'_>,
) -> Result<Vec<CrawledContent>, FetchError> {
    let feed_url = &ctx.source.base_url;
    let xml = polite_get(http, ctx.source, feed_url).await?;
    let entries = parse_feed(&xml).inspect_err(|e| {
        warn!(error = %e, preview = %truncate_for_log(&xml, 200), "Feed did not parse");
    })?;
    info!(count = entries.len(), "Parsed feed");

    let items: Vec<CrawledContent> = entries
        .into_iter()
        .take(ctx.max_items)
        .filter_map(|entry| accept_entry(entry, feed_url, &ctx))
        .collect();
    info!(count = items.len(), "Accepted feed entries");
    Ok(items)
}

fn accept_entry(entry: FeedEntry, feed_url: &Url, ctx: &CrawlContext<'_>) -> Option<CrawledContent> {
    let Some(url) = entry.link.as_deref().and_then(|l| feed_url.join(l).ok()) else {
        debug!(title = %entry.title, "Entry without a usable link; skipping");
        return None;
    };

    let content = html_to_text(&entry.summary);
    let relevance_score = relevance_score(
        &format!("{} {}", entry.title, content),
        &ctx.topic.keywords,
        &ctx.topic.exclude_keywords,
    );
    if relevance_score < ctx.settings.thresholds.feed {
        debug!(%url, relevance_score, "Below feed threshold; skipping");
        return None;
    }

    let summary = extractive_summary(&content, ctx.settings.summary_chars);
    Some(ctx.accept(Draft {
        id: Uuid::new_v4().to_string(),
        title: entry.title,
        content,
        summary,
        url,
        published_at: entry.published,
        relevance_score,
        license: None,
    }))
}
