//! Fetch strategies that turn a configured source into candidates.
//!
//! Every source carries an [`ExtractionRule`] that selects one strategy:
//!
//! | Rule | Module | Method | Threshold |
//! |------|--------|--------|-----------|
//! | `web` | [`web`] | Listing page link discovery + CSS selectors | `article` |
//! | `feed` | [`feed`] | RSS 2.0 / RSS 1.0 / Atom parsing | `feed` |
//! | `paper_api` | [`papers`] | Paginated JSON API + license gate | `paper` |
//!
//! # Common Patterns
//!
//! Each strategy:
//! - Waits the source's `rate_limit` before every request ([`polite_get`])
//! - Issues its requests sequentially, so a slow source only slows itself
//! - Scores candidates with [`relevance_score`](crate::relevance::relevance_score)
//!   and silently drops those under its threshold
//! - Returns `Err` only when the source as a whole cannot be read; failures
//!   of single items are logged and skipped

pub mod feed;
pub mod papers;
pub mod web;

use crate::config::CrawlerSettings;
use crate::error::FetchError;
use crate::http::HttpFetch;
use crate::models::{CrawledContent, CrawlerSource, ExtractionRule, LicenseInfo, TopicCrawlerConfig};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Everything a strategy needs besides the HTTP client.
#[derive(Debug, Clone, Copy)]
pub struct CrawlContext<'a> {
    pub source: &'a CrawlerSource,
    pub topic: &'a TopicCrawlerConfig,
    pub settings: &'a CrawlerSettings,
    /// Local cap on items this source may contribute.
    pub max_items: usize,
}

impl CrawlContext<'_> {
    /// Stamps an accepted candidate with its source, topic and crawl time.
    pub fn accept(&self, draft: Draft) -> CrawledContent {
        CrawledContent {
            id: draft.id,
            title: draft.title,
            content: draft.content,
            summary: draft.summary,
            url: draft.url,
            source: self.source.name.clone(),
            published_at: draft.published_at,
            crawled_at: Utc::now(),
            content_type: self.source.content_type,
            topic: self.topic.topic.clone(),
            keywords: self.topic.keywords.clone(),
            relevance_score: draft.relevance_score,
            license: draft.license,
        }
    }
}

/// The strategy-specific part of a [`CrawledContent`].
#[derive(Debug)]
pub struct Draft {
    pub id: String,
    pub title: String,
    pub content: String,
    pub summary: String,
    pub url: Url,
    pub published_at: Option<DateTime<Utc>>,
    pub relevance_score: f64,
    pub license: Option<LicenseInfo>,
}

/// Crawl one source with the strategy its rule names.
///
/// # Arguments
///
/// * `http` - Fetcher every request goes through
/// * `ctx` - The source, its topic, the settings and this source's item cap
///
/// # Returns
///
/// The accepted candidates, at most `ctx.max_items` of them, or the error
/// that stopped the source. Rejected candidates are dropped silently.
#[instrument(level = "info", skip_all, fields(source = %ctx.source.name, strategy = %ctx.source.strategy(), max_items = ctx.max_items))]
pub async fn fetch_source<F: HttpFetch>(
    http: &F,
    ctx: CrawlContext<'_>,
) -> Result<Vec<CrawledContent>, FetchError> {
    if ctx.max_items == 0 {
        return Ok(Vec::new());
    }
    match &ctx.source.extraction {
        ExtractionRule::Web(selectors) => web::crawl(http, ctx, selectors).await,
        ExtractionRule::Feed => feed::crawl(http, ctx).await,
        ExtractionRule::PaperApi(rule) => papers::crawl(http, ctx, rule).await,
    }
}

/// GET `url` with the source's headers after waiting its configured delay.
pub async fn polite_get<F: HttpFetch>(
    http: &F,
    source: &CrawlerSource,
    url: &Url,
) -> Result<String, FetchError> {
    pace(source.delay()).await;
    debug!(source = %source.name, %url, "GET");
    http.get_text(url, &source.headers).await
}

async fn pace(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
