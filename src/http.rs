//! HTTP access for the fetch strategies.
//!
//! Strategies talk to the network only through [`HttpFetch`], so the whole
//! engine can be driven by an in-memory fetcher in tests. [`ReqwestFetcher`]
//! is the real implementation: one pooled client per crawl invocation,
//! released when the fetcher is dropped.

use crate::config::CrawlerSettings;
use crate::error::FetchError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, instrument, warn};
use url::Url;

/// Fetches a URL and returns its body as text.
pub trait HttpFetch {
    async fn get_text(
        &self,
        url: &Url,
        headers: &BTreeMap<String, String>,
    ) -> Result<String, FetchError>;
}

/// [`HttpFetch`] over a `reqwest` connection pool.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    /// Builds a client with the crawler's user agent, total request timeout
    /// and an idle pool sized to the concurrency limit.
    pub fn new(settings: &CrawlerSettings) -> Result<Self, FetchError> {
        let client = ClientBuilder::new()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.request_timeout())
            .pool_max_idle_per_host(settings.max_concurrent_sources)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(FetchError::from_reqwest_error)?;
        Ok(Self { client })
    }
}

impl HttpFetch for ReqwestFetcher {
    #[instrument(level = "debug", skip_all, fields(url = %url))]
    async fn get_text(
        &self,
        url: &Url,
        headers: &BTreeMap<String, String>,
    ) -> Result<String, FetchError> {
        let t0 = Instant::now();
        let response = self
            .client
            .get(url.clone())
            .headers(to_header_map(headers))
            .send()
            .await
            .map_err(FetchError::from_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Non-success response");
            return Err(FetchError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(FetchError::from_reqwest_error)?;
        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched"
        );
        Ok(body)
    }
}

/// Per-source headers; entries that are not valid HTTP headers are skipped.
fn to_header_map(headers: &BTreeMap<String, String>) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                map.insert(name, value);
            }
            _ => warn!(header = %name, "Skipping invalid header"),
        }
    }
    map
}
