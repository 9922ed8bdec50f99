//! In-memory fixtures shared by the unit tests.

use crate::error::FetchError;
use crate::http::HttpFetch;
use crate::models::{
    ContentType, CrawledContent, CrawlerSource, ExtractionRule, TopicCrawlerConfig, WebSelectors,
};
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use url::Url;

enum Reply {
    Body(String),
    Status(u16),
    Timeout,
}

/// Serves canned bodies by URL; unknown URLs are 404s.
#[derive(Default)]
pub struct StubFetcher {
    replies: HashMap<String, Reply>,
    calls: Mutex<Vec<String>>,
}

fn key(url: &str) -> String {
    Url::parse(url).expect("fixture url").to_string()
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, body: impl Into<String>) -> Self {
        self.replies.insert(key(url), Reply::Body(body.into()));
        self
    }

    pub fn status(mut self, url: &str, status: u16) -> Self {
        self.replies.insert(key(url), Reply::Status(status));
        self
    }

    pub fn timeout(mut self, url: &str) -> Self {
        self.replies.insert(key(url), Reply::Timeout);
        self
    }

    /// URLs requested so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl HttpFetch for StubFetcher {
    async fn get_text(
        &self,
        url: &Url,
        _headers: &BTreeMap<String, String>,
    ) -> Result<String, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.replies.get(url.as_str()) {
            Some(Reply::Body(body)) => Ok(body.clone()),
            Some(Reply::Status(status)) => Err(FetchError::Http {
                status: *status,
                url: url.to_string(),
            }),
            Some(Reply::Timeout) => Err(FetchError::Timeout),
            None => Err(FetchError::Http {
                status: 404,
                url: url.to_string(),
            }),
        }
    }
}

pub fn source(name: &str, base_url: &str, extraction: ExtractionRule) -> CrawlerSource {
    CrawlerSource {
        name: name.to_string(),
        base_url: Url::parse(base_url).expect("fixture url"),
        content_type: ContentType::News,
        extraction,
        headers: BTreeMap::new(),
        rate_limit: 0.0,
        max_pages: 5,
        keywords: vec![],
    }
}

pub fn web_source(name: &str, base_url: &str) -> CrawlerSource {
    source(name, base_url, ExtractionRule::Web(WebSelectors::default()))
}

pub fn feed_source(name: &str, base_url: &str) -> CrawlerSource {
    source(name, base_url, ExtractionRule::Feed)
}

pub fn topic(
    name: &str,
    keywords: &[&str],
    exclude: &[&str],
    sources: Vec<CrawlerSource>,
) -> TopicCrawlerConfig {
    TopicCrawlerConfig {
        topic: name.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        exclude_keywords: exclude.iter().map(|k| k.to_string()).collect(),
        sources,
        max_articles: 10,
        freshness_hours: 24,
    }
}

/// A gaming topic with two keywords so strong matches score highly.
pub fn gaming_topic(sources: Vec<CrawlerSource>) -> TopicCrawlerConfig {
    topic("gaming_news", &["gaming", "esports"], &["gambling", "casino"], sources)
}

/// A body long enough to count as an article, mentioning both gaming
/// keywords several times.
pub fn esports_body() -> String {
    "The esports season opened with record crowds. Esports teams from five regions \
     travelled to compete, and esports analysts expect viewership to grow. Gaming \
     publishers sponsored the esports finals while gaming hardware makers showed \
     new esports gear."
        .to_string()
}

pub fn article_page(title: &str, body: &str, published: &str) -> String {
    format!(
        "<html><head><title>{title}</title></head><body>\
         <h1>{title}</h1>\
         <time datetime=\"{published}\">{published}</time>\
         <article><p>{body}</p></article>\
         </body></html>"
    )
}

pub fn listing_page(links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!("<h2><a href=\"{href}\">story</a></h2>"))
        .collect();
    format!("<html><body><main>{anchors}</main></body></html>")
}

/// An RSS 2.0 document from `(title, link, description, pub_date)` tuples.
pub fn rss(items: &[(&str, &str, &str, &str)]) -> String {
    let items: String = items
        .iter()
        .map(|(title, link, description, pub_date)| {
            format!(
                "<item><title>{title}</title><link>{link}</link>\
                 <description><![CDATA[{description}]]></description>\
                 <pubDate>{pub_date}</pubDate></item>"
            )
        })
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <rss version=\"2.0\"><channel><title>Fixture</title>\
         <link>https://feed.test/</link><description>Fixture feed</description>\
         {items}</channel></rss>"
    )
}

/// A bare accepted item for ranking and dedup tests.
pub fn content_item(title: &str, source: &str) -> CrawledContent {
    CrawledContent {
        id: title.to_string(),
        title: title.to_string(),
        content: String::new(),
        summary: String::new(),
        url: Url::parse("https://news.test/a").expect("fixture url"),
        source: source.to_string(),
        published_at: None,
        crawled_at: Utc::now(),
        content_type: ContentType::News,
        topic: "technology_news".to_string(),
        keywords: vec![],
        relevance_score: 0.5,
        license: None,
    }
}
