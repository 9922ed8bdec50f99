//! Data models for crawl configuration and crawl output.
//!
//! This module defines the core data structures used throughout the crawler:
//! - [`CrawlerSource`]: One site, feed or API configured for a topic
//! - [`ExtractionRule`]: How a source's bytes become candidates
//! - [`TopicCrawlerConfig`]: Keywords, exclusions and sources for one topic
//! - [`CrawledContent`]: One accepted article, feed entry or paper
//! - [`CrawlerResult`]: The ranked, deduplicated output of one crawl
//!
//! Configuration types are deserialized from YAML and validated on the way
//! in, so a bad selector or URL fails at load time rather than mid-crawl.

use crate::error::ConfigError;
use chrono::{DateTime, Utc};
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use url::Url;

/// The kind of content a source publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    News,
    Research,
    Blog,
    Social,
    Video,
}

/// A CSS selector that has already been parsed.
///
/// Keeps the source text around so configs can be summarized and
/// re-serialized.
#[derive(Debug, Clone)]
pub struct CssSelector {
    raw: String,
    parsed: Selector,
}

impl CssSelector {
    pub fn parse(raw: impl Into<String>) -> Result<Self, ConfigError> {
        let raw = raw.into();
        let parsed = Selector::parse(&raw).map_err(|e| ConfigError::InvalidSelector {
            selector: raw.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self { raw, parsed })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn selector(&self) -> &Selector {
        &self.parsed
    }
}

impl Serialize for CssSelector {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for CssSelector {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        CssSelector::parse(raw).map_err(serde::de::Error::custom)
    }
}

/// Selectors used to pull an article out of a web page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSelectors {
    #[serde(default = "WebSelectors::default_title")]
    pub title: CssSelector,
    #[serde(default = "WebSelectors::default_content")]
    pub content: CssSelector,
    #[serde(default = "WebSelectors::default_published")]
    pub published: Option<CssSelector>,
}

impl WebSelectors {
    // The defaults are static, valid selectors.
    fn default_title() -> CssSelector {
        CssSelector::parse("h1").expect("static selector")
    }

    fn default_content() -> CssSelector {
        CssSelector::parse("article, .content, .post-content").expect("static selector")
    }

    fn default_published() -> Option<CssSelector> {
        CssSelector::parse("time").ok()
    }
}

impl Default for WebSelectors {
    fn default() -> Self {
        Self {
            title: Self::default_title(),
            content: Self::default_content(),
            published: Self::default_published(),
        }
    }
}

/// Parameters for a paginated paper-search API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperApiRule {
    /// Query parameter carrying the 1-based page number.
    #[serde(default = "PaperApiRule::default_page_param")]
    pub page_param: String,
    /// Query parameter carrying the page size.
    #[serde(default = "PaperApiRule::default_page_size_param")]
    pub page_size_param: String,
    #[serde(default = "PaperApiRule::default_page_size")]
    pub page_size: u32,
    /// Public paper URL is this prefix followed by the paper identifier.
    pub paper_url_prefix: Url,
    /// License metadata page is this prefix followed by the paper identifier.
    pub license_lookup_prefix: Url,
}

impl PaperApiRule {
    fn default_page_param() -> String {
        "page_num".to_string()
    }

    fn default_page_size_param() -> String {
        "page_size".to_string()
    }

    fn default_page_size() -> u32 {
        5
    }
}

/// Strategy used to turn a source into candidates, with the settings that
/// strategy needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionRule {
    Web(WebSelectors),
    Feed,
    PaperApi(PaperApiRule),
}

impl ExtractionRule {
    /// Picks a rule from the address alone: feeds by their URL shape, web
    /// pages with default selectors otherwise.
    pub fn infer(url: &Url) -> Self {
        if looks_like_feed(url) {
            Self::Feed
        } else {
            Self::Web(WebSelectors::default())
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Web(_) => StrategyKind::Web,
            Self::Feed => StrategyKind::Feed,
            Self::PaperApi(_) => StrategyKind::PaperApi,
        }
    }
}

/// Tag of an [`ExtractionRule`], used in summaries and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Web,
    Feed,
    PaperApi,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Web => f.write_str("web"),
            Self::Feed => f.write_str("feed"),
            Self::PaperApi => f.write_str("paper_api"),
        }
    }
}

/// True when the address points at an RSS or Atom document.
pub fn looks_like_feed(url: &Url) -> bool {
    let full = url.as_str().to_lowercase();
    let path = url.path().to_lowercase();
    full.contains("rss")
        || path.ends_with(".xml")
        || path.ends_with(".atom")
        || path.ends_with("/feed")
        || path.ends_with("/feed/")
}

/// One site, feed or API configured to be crawled for a topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawSource")]
pub struct CrawlerSource {
    pub name: String,
    pub base_url: Url,
    pub content_type: ContentType,
    pub extraction: ExtractionRule,
    pub headers: BTreeMap<String, String>,
    /// Minimum delay before each request, in seconds.
    pub rate_limit: f64,
    pub max_pages: usize,
    pub keywords: Vec<String>,
}

/// Longest per-request delay a source may ask for, in seconds.
pub const MAX_RATE_LIMIT_SECS: f64 = 3600.0;

impl CrawlerSource {
    /// The pause before each request. Values outside
    /// `0..=MAX_RATE_LIMIT_SECS` are rejected at load; a hand-built source
    /// with one is held to the maximum rather than left unpaced.
    pub fn delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.rate_limit.min(MAX_RATE_LIMIT_SECS))
            .unwrap_or(Duration::from_secs_f64(MAX_RATE_LIMIT_SECS))
    }

    pub fn strategy(&self) -> StrategyKind {
        self.extraction.kind()
    }
}

/// Wire form of [`CrawlerSource`]; `extraction` may be left out and inferred.
#[derive(Debug, Deserialize)]
struct RawSource {
    name: String,
    base_url: Url,
    content_type: ContentType,
    #[serde(default)]
    extraction: Option<ExtractionRule>,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    #[serde(default = "default_rate_limit")]
    rate_limit: f64,
    #[serde(default = "default_max_pages")]
    max_pages: usize,
    #[serde(default)]
    keywords: Vec<String>,
}

fn default_rate_limit() -> f64 {
    1.0
}

fn default_max_pages() -> usize {
    5
}

impl TryFrom<RawSource> for CrawlerSource {
    type Error = ConfigError;

    fn try_from(raw: RawSource) -> Result<Self, Self::Error> {
        let invalid = |reason: &str| ConfigError::InvalidSource {
            source_name: raw.name.clone(),
            reason: reason.to_string(),
        };
        if raw.name.trim().is_empty() {
            return Err(invalid("name must not be empty"));
        }
        if !matches!(raw.base_url.scheme(), "http" | "https") {
            return Err(invalid("base_url must be http or https"));
        }
        if !(0.0..=MAX_RATE_LIMIT_SECS).contains(&raw.rate_limit) {
            return Err(invalid("rate_limit must be between 0 and 3600 seconds"));
        }
        if raw.max_pages == 0 {
            return Err(invalid("max_pages must be at least 1"));
        }
        let extraction = raw
            .extraction
            .unwrap_or_else(|| ExtractionRule::infer(&raw.base_url));
        if let ExtractionRule::PaperApi(rule) = &extraction {
            if rule.page_size == 0 {
                return Err(invalid("page_size must be at least 1"));
            }
        }
        Ok(Self {
            name: raw.name,
            base_url: raw.base_url,
            content_type: raw.content_type,
            extraction,
            headers: raw.headers,
            rate_limit: raw.rate_limit,
            max_pages: raw.max_pages,
            keywords: raw.keywords,
        })
    }
}

/// Keywords, exclusions and sources for one supported topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicCrawlerConfig {
    pub topic: String,
    pub keywords: Vec<String>,
    #[serde(default)]
    pub exclude_keywords: Vec<String>,
    pub sources: Vec<CrawlerSource>,
    #[serde(default = "default_max_articles")]
    pub max_articles: usize,
    #[serde(default = "default_freshness_hours")]
    pub freshness_hours: u32,
}

fn default_max_articles() -> usize {
    10
}

fn default_freshness_hours() -> u32 {
    24
}

/// License class parsed from a Creative Commons license URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LicenseType {
    #[serde(rename = "CC BY")]
    CcBy,
    #[serde(rename = "CC BY-SA")]
    CcBySa,
    #[serde(rename = "CC BY-NC")]
    CcByNc,
    #[serde(rename = "CC BY-NC-SA")]
    CcByNcSa,
    #[serde(rename = "CC BY-ND")]
    CcByNd,
    #[serde(rename = "CC BY-NC-ND")]
    CcByNcNd,
    #[serde(rename = "Other")]
    Other,
}

impl LicenseType {
    /// Classifies a license URL such as
    /// `http://creativecommons.org/licenses/by-nc-sa/4.0/`.
    pub fn from_url(url: &str) -> Self {
        let lower = url.to_lowercase();
        let Some((_, rest)) = lower.split_once("creativecommons.org/licenses/") else {
            return Self::Other;
        };
        match rest.split('/').next().unwrap_or_default() {
            "by" => Self::CcBy,
            "by-sa" => Self::CcBySa,
            "by-nc" => Self::CcByNc,
            "by-nc-sa" => Self::CcByNcSa,
            "by-nd" => Self::CcByNd,
            "by-nc-nd" => Self::CcByNcNd,
            _ => Self::Other,
        }
    }

    /// Creative Commons variants that allow derivative works.
    pub fn is_usable(self) -> bool {
        matches!(
            self,
            Self::CcBy | Self::CcBySa | Self::CcByNc | Self::CcByNcSa
        )
    }
}

impl fmt::Display for LicenseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::CcBy => "CC BY",
            Self::CcBySa => "CC BY-SA",
            Self::CcByNc => "CC BY-NC",
            Self::CcByNcSa => "CC BY-NC-SA",
            Self::CcByNd => "CC BY-ND",
            Self::CcByNcNd => "CC BY-NC-ND",
            Self::Other => "Other",
        };
        f.write_str(label)
    }
}

/// License metadata attached to papers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseInfo {
    pub license_url: String,
    pub license_type: LicenseType,
}

impl LicenseInfo {
    pub fn from_url(url: impl Into<String>) -> Self {
        let license_url = url.into();
        let license_type = LicenseType::from_url(&license_url);
        Self {
            license_url,
            license_type,
        }
    }
}

/// One accepted article, feed entry or paper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawledContent {
    pub id: String,
    pub title: String,
    pub content: String,
    pub summary: String,
    pub url: Url,
    pub source: String,
    pub published_at: Option<DateTime<Utc>>,
    pub crawled_at: DateTime<Utc>,
    pub content_type: ContentType,
    pub topic: String,
    pub keywords: Vec<String>,
    pub relevance_score: f64,
    #[serde(flatten, default, skip_serializing_if = "Option::is_none")]
    pub license: Option<LicenseInfo>,
}

/// The output of one top-level crawl.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerResult {
    pub topic: String,
    pub total_found: usize,
    pub content_items: Vec<CrawledContent>,
    /// Wall-clock duration in seconds.
    pub crawl_duration: f64,
    pub sources_used: Vec<String>,
    pub error_count: usize,
    pub errors: Vec<String>,
}

impl CrawlerResult {
    /// An empty result carrying a single error, used when the topic could
    /// not be resolved.
    pub fn failed(topic: impl Into<String>, error: impl Into<String>, crawl_duration: f64) -> Self {
        Self {
            topic: topic.into(),
            total_found: 0,
            content_items: Vec::new(),
            crawl_duration,
            sources_used: Vec::new(),
            error_count: 1,
            errors: vec![error.into()],
        }
    }
}

/// Outcome of crawling a single named source in isolation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceTestReport {
    pub source: String,
    pub success: bool,
    pub articles_found: usize,
    pub errors: Vec<String>,
    pub sample_titles: Vec<String>,
}
