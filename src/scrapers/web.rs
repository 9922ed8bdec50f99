//! Generic web-page strategy.
//!
//! Reads a source's listing page, discovers article links with a
//! prioritized list of structural patterns, then fetches each article and
//! extracts title, body and publish time with the source's selectors.
//!
//! # Link Discovery
//!
//! Patterns are tried in order and their hits concatenated, so links found
//! by an earlier pattern rank first:
//!
//! 1. `href` containing `/article`, `/story`, `/news`, `/post`
//! 2. `.article-link a`, `.news-item a`
//! 3. `h2 a`, `h3 a`, `.headline a`
//!
//! Category, tag, author, search, pagination and account pages are skipped,
//! as are media files. Duplicates are removed keeping the first occurrence.

use super::{CrawlContext, Draft, polite_get};
use crate::error::FetchError;
use crate::http::HttpFetch;
use crate::models::{CrawledContent, WebSelectors};
use crate::relevance::relevance_score;
use crate::utils::{extractive_summary, normalize_whitespace, parse_date};
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;
use uuid::Uuid;

static LINK_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        r#"a[href*="/article"]"#,
        r#"a[href*="/story"]"#,
        r#"a[href*="/news"]"#,
        r#"a[href*="/post"]"#,
        ".article-link a",
        ".news-item a",
        "h2 a",
        "h3 a",
        ".headline a",
    ]
    .iter()
    .map(|s| Selector::parse(s).unwrap())
    .collect()
});

const SKIP_PATTERNS: [&str; 18] = [
    "/category/",
    "/tag/",
    "/author/",
    "/search/",
    "/page/",
    "/login",
    "/register",
    "/subscribe",
    "/contact",
    ".jpg",
    ".jpeg",
    ".png",
    ".gif",
    ".webp",
    ".svg",
    ".pdf",
    ".mp4",
    ".mp3",
];

/// Crawl a listing page and the articles it links to.
#[instrument(level = "info", skip_all, fields(source = %ctx.source.name))]
pub async fn crawl<F: HttpFetch>(
    http: &F,
    ctx: CrawlContext<'_>,
    selectors: &WebSelectors,
) -> Result<Vec<CrawledContent>, FetchError> {
    let base_url = &ctx.source.base_url;
    let listing = polite_get(http, ctx.source, base_url).await?;

    let limit = ctx.max_items.min(ctx.source.max_pages);
    let links = discover_links(&listing, base_url, limit);
    info!(count = links.len(), limit, "Discovered article links");

    let mut items = Vec::new();
    for link in links {
        let html = match polite_get(http, ctx.source, &link).await {
            Ok(html) => html,
            Err(e) => {
                warn!(url = %link, error = %e, "Article fetch failed; skipping");
                continue;
            }
        };
        if let Some(item) = extract_article(&html, &link, &ctx, selectors) {
            items.push(item);
        }
    }

    info!(count = items.len(), "Accepted articles");
    Ok(items)
}

/// Candidate article links on a listing page, in discovery order.
///
/// # Arguments
///
/// * `html` - The listing page
/// * `base_url` - Address the page was fetched from; relative links resolve against it
/// * `limit` - Maximum number of links to return
///
/// # Returns
///
/// Absolute, de-duplicated links that look like articles. Category, tag,
/// author, search and pagination paths and media files are left out.
pub fn discover_links(html: &str, base_url: &Url, limit: usize) -> Vec<Url> {
    let document = Html::parse_document(html);
    LINK_SELECTORS
        .iter()
        .flat_map(|selector| document.select(selector))
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| base_url.join(href.trim()).ok())
        .map(|mut url| {
            url.set_fragment(None);
            url
        })
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .filter(|url| url != base_url)
        .filter(|url| is_article_url(url))
        .unique()
        .take(limit)
        .collect()
}

/// False for listing, account and media URLs.
pub fn is_article_url(url: &Url) -> bool {
    let path = url.path().to_lowercase();
    !SKIP_PATTERNS.iter().any(|pattern| path.contains(pattern))
}

/// Turn one article page into an accepted item, or `None` when it is too
/// short or not relevant enough.
pub fn extract_article(
    html: &str,
    url: &Url,
    ctx: &CrawlContext<'_>,
    selectors: &WebSelectors,
) -> Option<CrawledContent> {
    let document = Html::parse_document(html);
    let title = select_text(&document, selectors.title.selector());
    let content = select_text(&document, selectors.content.selector());

    if title.is_empty() || content.chars().count() < ctx.settings.min_article_chars {
        debug!(%url, content_chars = content.chars().count(), "Too little content; skipping");
        return None;
    }

    let published_at = selectors
        .published
        .as_ref()
        .and_then(|sel| published_time(&document, sel.selector()));

    let relevance_score = relevance_score(
        &format!("{title} {content}"),
        &ctx.topic.keywords,
        &ctx.topic.exclude_keywords,
    );
    if relevance_score < ctx.settings.thresholds.article {
        debug!(%url, relevance_score, "Below article threshold; skipping");
        return None;
    }

    let summary = extractive_summary(&content, ctx.settings.summary_chars);
    Some(ctx.accept(Draft {
        id: Uuid::new_v4().to_string(),
        title,
        content,
        summary,
        url: url.clone(),
        published_at,
        relevance_score,
        license: None,
    }))
}

/// Text of every element matching `selector`, joined and whitespace-normalized.
fn select_text(document: &Html, selector: &Selector) -> String {
    let text = document
        .select(selector)
        .map(|element| element.text().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join(" ");
    normalize_whitespace(&text)
}

/// Publish time from the first matching element, preferring its
/// `datetime` attribute over its text.
fn published_time(document: &Html, selector: &Selector) -> Option<chrono::DateTime<chrono::Utc>> {
    let element = document.select(selector).next()?;
    element
        .value()
        .attr("datetime")
        .and_then(parse_date)
        .or_else(|| parse_date(&element.text().collect::<String>()))
}
