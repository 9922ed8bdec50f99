//! Paginated paper-API strategy.
//!
//! Pages through a trending-papers JSON endpoint, then checks each paper's
//! license on its abstract page before scoring it. Only Creative Commons
//! licenses that allow derivative works pass; everything else is dropped
//! silently, as is a paper whose license page cannot be read.
//!
//! Expected payload:
//!
//! ```json
//! {"data": {"trending_papers": [{
//!     "universal_paper_id": "2401.00001",
//!     "title": "...",
//!     "abstract": "...",
//!     "paper_summary": {"summary": "..."},
//!     "first_publication_date": "2024-01-02T00:00:00.000Z"
//! }]}}
//! ```

use super::{CrawlContext, Draft, polite_get};
use crate::error::FetchError;
use crate::http::HttpFetch;
use crate::models::{CrawledContent, LicenseInfo, PaperApiRule};
use crate::relevance::relevance_score;
use crate::utils::{
    extractive_summary, normalize_whitespace, parse_date, strip_markdown_links, truncate_chars,
};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

static LICENSE_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        r#"a[rel="license"]"#,
        ".abs-license a",
        r#"a[href*="creativecommons.org/licenses"]"#,
    ]
    .iter()
    .map(|s| Selector::parse(s).unwrap())
    .collect()
});

#[derive(Debug, Default, Deserialize)]
struct TrendingResponse {
    #[serde(default)]
    data: TrendingData,
}

#[derive(Debug, Default, Deserialize)]
struct TrendingData {
    #[serde(default)]
    trending_papers: Vec<Paper>,
}

#[derive(Debug, Deserialize)]
struct Paper {
    universal_paper_id: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(rename = "abstract", default)]
    abstract_text: String,
    paper_summary: Option<PaperSummary>,
    first_publication_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PaperSummary {
    summary: Option<String>,
}

/// The listing URL for one page of the trending-papers API.
///
/// # Arguments
///
/// * `base` - The source's configured API address
/// * `rule` - Names of the paging parameters and the page size
/// * `page` - 1-based page number
///
/// # Returns
///
/// `base` with any paging parameters already present replaced and the rest
/// of its query kept in order.
pub fn page_url(base: &Url, rule: &PaperApiRule, page: usize) -> Url {
    let kept: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(k, _)| k != rule.page_param.as_str() && k != rule.page_size_param.as_str())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut url = base.clone();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(&rule.page_param, &page.to_string())
        .append_pair(&rule.page_size_param, &rule.page_size.to_string());
    url
}

/// The first license link on a paper's abstract page.
pub fn find_license_url(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    LICENSE_SELECTORS
        .iter()
        .flat_map(|selector| document.select(selector))
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .find(|href| !href.is_empty())
        .map(str::to_string)
}

fn parse_page(body: &str) -> Result<Vec<Paper>, FetchError> {
    let response: TrendingResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Payload(e.to_string()))?;
    Ok(response.data.trending_papers)
}

/// Crawl up to `max_pages` listing pages, stopping early on an empty page
/// or once `max_items` papers have been accepted.
#[instrument(level = "info", skip_all, fields(source = %ctx.source.name))]
pub async fn crawl<F: HttpFetch>(
    http: &F,
    ctx: CrawlContext<'_>,
    rule: &PaperApiRule,
) -> Result<Vec<CrawledContent>, FetchError> {
    let mut items = Vec::new();

    'pages: for page in 1..=ctx.source.max_pages {
        let url = page_url(&ctx.source.base_url, rule, page);
        let papers = match polite_get(http, ctx.source, &url).await.and_then(|b| parse_page(&b)) {
            Ok(papers) => papers,
            // A broken first page fails the source; later pages only end it early.
            Err(e) if page == 1 => return Err(e),
            Err(e) => {
                warn!(page, error = %e, "Listing page failed; keeping earlier pages");
                break;
            }
        };
        debug!(page, count = papers.len(), "Listing page");
        if papers.is_empty() {
            break;
        }

        for paper in papers {
            if items.len() >= ctx.max_items {
                break 'pages;
            }
            if let Some(item) = accept_paper(http, &ctx, rule, paper).await {
                items.push(item);
            }
        }
        if items.len() >= ctx.max_items {
            break;
        }
    }

    info!(count = items.len(), "Accepted papers");
    Ok(items)
}

async fn accept_paper<F: HttpFetch>(
    http: &F,
    ctx: &CrawlContext<'_>,
    rule: &PaperApiRule,
    paper: Paper,
) -> Option<CrawledContent> {
    let id = paper
        .universal_paper_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())?;

    let license = match lookup_license(http, ctx, rule, id).await {
        Ok(Some(license)) if license.license_type.is_usable() => license,
        Ok(Some(license)) => {
            debug!(paper = id, license = %license.license_type, "License not usable; skipping");
            return None;
        }
        Ok(None) => {
            debug!(paper = id, "No license found; skipping");
            return None;
        }
        Err(e) => {
            warn!(paper = id, error = %e, "License lookup failed; skipping");
            return None;
        }
    };

    let title = normalize_whitespace(&paper.title);
    let content = normalize_whitespace(&paper.abstract_text);
    let relevance_score = relevance_score(
        &format!("{title} {content}"),
        &ctx.topic.keywords,
        &ctx.topic.exclude_keywords,
    );
    if relevance_score < ctx.settings.thresholds.paper {
        debug!(paper = id, relevance_score, "Below paper threshold; skipping");
        return None;
    }

    let url = match Url::parse(&format!("{}{id}", rule.paper_url_prefix)) {
        Ok(url) => url,
        Err(e) => {
            warn!(paper = id, error = %e, "Unusable paper id; skipping");
            return None;
        }
    };

    let summary = paper
        .paper_summary
        .and_then(|s| s.summary)
        .map(|s| strip_markdown_links(&s))
        .map(|s| truncate_chars(s.trim(), ctx.settings.summary_chars).to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| extractive_summary(&content, ctx.settings.summary_chars));

    Some(ctx.accept(Draft {
        id: url.to_string(),
        title,
        content,
        summary,
        url,
        published_at: paper.first_publication_date.as_deref().and_then(parse_date),
        relevance_score,
        license: Some(license),
    }))
}

async fn lookup_license<F: HttpFetch>(
    http: &F,
    ctx: &CrawlContext<'_>,
    rule: &PaperApiRule,
    id: &str,
) -> Result<Option<LicenseInfo>, FetchError> {
    let url = Url::parse(&format!("{}{id}", rule.license_lookup_prefix))?;
    let html = polite_get(http, ctx.source, &url).await?;
    Ok(find_license_url(&html).map(LicenseInfo::from_url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrawlerSettings;
    use crate::models::{CrawlerSource, ExtractionRule, LicenseType};
    use crate::testing::{StubFetcher, source, topic};
    use serde_json::json;

    const API: &str = "https://api.papers.test/v2/trending?sort_by=Hot&page_num=9";

    fn rule() -> PaperApiRule {
        PaperApiRule {
            page_param: "page_num".to_string(),
            page_size_param: "page_size".to_string(),
            page_size: 3,
            paper_url_prefix: Url::parse("https://papers.test/paper/").unwrap(),
            license_lookup_prefix: Url::parse("https://abs.test/abs/").unwrap(),
        }
    }

    fn paper_source() -> CrawlerSource {
        source("Papers", API, ExtractionRule::PaperApi(rule()))
    }

    fn abs_page(license_href: &str) -> String {
        format!(
            "<html><body><div class=\"abs-license\">\
             <a href=\"{license_href}\" title=\"Rights to this article\">license</a></div></body></html>"
        )
    }

    fn paper(id: &str, title: &str) -> serde_json::Value {
        json!({
            "universal_paper_id": id,
            "title": title,
            "abstract": "We train a transformer whose neural attention layers outperform neural baselines.",
            "paper_summary": {"summary": "Key idea: see [the code](https://code.test/x).\n\n* \nBetter transformers."},
            "first_publication_date": "2024-01-02T00:00:00.000Z"
        })
    }

    fn page(papers: Vec<serde_json::Value>) -> String {
        json!({"data": {"trending_papers": papers}}).to_string()
    }

    #[test]
    fn test_page_url_replaces_paging_params() {
        let url = page_url(&Url::parse(API).unwrap(), &rule(), 2);
        assert_eq!(
            url.as_str(),
            "https://api.papers.test/v2/trending?sort_by=Hot&page_num=2&page_size=3"
        );
    }

    #[test]
    fn test_find_license_url() {
        assert_eq!(
            find_license_url(&abs_page("http://creativecommons.org/licenses/by/4.0/")).as_deref(),
            Some("http://creativecommons.org/licenses/by/4.0/")
        );
        let rel = r#"<a rel="license" href="https://creativecommons.org/licenses/by-sa/4.0/">cc</a>"#;
        assert_eq!(
            find_license_url(rel).as_deref(),
            Some("https://creativecommons.org/licenses/by-sa/4.0/")
        );
        assert!(find_license_url("<p>no license here</p>").is_none());
    }

    #[tokio::test]
    async fn test_crawl_keeps_only_usable_licenses() {
        let base = Url::parse(API).unwrap();
        let http = StubFetcher::new()
            .page(
                page_url(&base, &rule(), 1).as_str(),
                page(vec![
                    paper("2401.00001", "Open transformer"),
                    paper("2401.00002", "No derivatives transformer"),
                    paper("2401.00003", "Arxiv licensed transformer"),
                    paper("2401.00004", "Unreachable transformer"),
                ]),
            )
            .page(page_url(&base, &rule(), 2).as_str(), page(vec![]))
            .page(
                "https://abs.test/abs/2401.00001",
                abs_page("http://creativecommons.org/licenses/by/4.0/"),
            )
            .page(
                "https://abs.test/abs/2401.00002",
                abs_page("http://creativecommons.org/licenses/by-nc-nd/4.0/"),
            )
            .page(
                "https://abs.test/abs/2401.00003",
                abs_page("http://arxiv.org/licenses/nonexclusive-distrib/1.0/"),
            );
        let settings = CrawlerSettings::default();
        let source = paper_source();
        let topic = topic("research_deep_learning", &["neural", "transformer"], &[], vec![source.clone()]);
        let ctx = CrawlContext { source: &source, topic: &topic, settings: &settings, max_items: 10 };

        let items = crawl(&http, ctx, &rule()).await.unwrap();
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.id, "https://papers.test/paper/2401.00001");
        assert_eq!(item.url.as_str(), item.id);
        assert_eq!(item.summary, "Key idea: see .\nBetter transformers.");
        assert!(item.relevance_score >= settings.thresholds.paper);
        let license = item.license.as_ref().unwrap();
        assert_eq!(license.license_type, LicenseType::CcBy);
        assert!(http.calls().iter().any(|c| c.contains("page_num=2")));
    }

    #[tokio::test]
    async fn test_crawl_stops_at_max_items() {
        let base = Url::parse(API).unwrap();
        let cc_by = abs_page("http://creativecommons.org/licenses/by/4.0/");
        let http = StubFetcher::new()
            .page(
                page_url(&base, &rule(), 1).as_str(),
                page(vec![paper("a1", "Alpha transformer"), paper("a2", "Beta transformer")]),
            )
            .page("https://abs.test/abs/a1", cc_by.clone())
            .page("https://abs.test/abs/a2", cc_by);
        let settings = CrawlerSettings::default();
        let source = paper_source();
        let topic = topic("research_deep_learning", &["neural", "transformer"], &[], vec![source.clone()]);
        let ctx = CrawlContext { source: &source, topic: &topic, settings: &settings, max_items: 1 };

        let items = crawl(&http, ctx, &rule()).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(http.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_later_page_failure_ends_paging_quietly() {
        let base = Url::parse(API).unwrap();
        let http = StubFetcher::new()
            .page(
                page_url(&base, &rule(), 1).as_str(),
                page(vec![paper("2401.00002", "No derivatives transformer")]),
            )
            .page(
                "https://abs.test/abs/2401.00002",
                abs_page("http://creativecommons.org/licenses/by-nd/4.0/"),
            )
            .status(page_url(&base, &rule(), 2).as_str(), 503);
        let settings = CrawlerSettings::default();
        let source = paper_source();
        let topic = topic("research_deep_learning", &["neural", "transformer"], &[], vec![source.clone()]);
        let ctx = CrawlContext { source: &source, topic: &topic, settings: &settings, max_items: 5 };

        let items = crawl(&http, ctx, &rule()).await.unwrap();
        assert!(items.is_empty());
        assert!(http.calls().iter().any(|c| c.contains("page_num=2")));
        assert!(!http.calls().iter().any(|c| c.contains("page_num=3")));
    }

    #[tokio::test]
    async fn test_crawl_fails_on_malformed_first_page() {
        let base = Url::parse(API).unwrap();
        let http = StubFetcher::new().page(page_url(&base, &rule(), 1).as_str(), "<html>maintenance</html>");
        let settings = CrawlerSettings::default();
        let source = paper_source();
        let topic = topic("research_deep_learning", &["neural"], &[], vec![source.clone()]);
        let ctx = CrawlContext { source: &source, topic: &topic, settings: &settings, max_items: 5 };

        let err = crawl(&http, ctx, &rule()).await.unwrap_err();
        assert!(matches!(err, FetchError::Payload(_)));
    }
}
