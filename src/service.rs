//! The crawl orchestrator.
//!
//! [`CrawlerService::crawl`] resolves a topic, fans out one task per source
//! through a bounded stream, and folds the per-source outcomes into a single
//! [`CrawlerResult`]:
//!
//! 1. **Resolve** the topic (exact, keyword, fuzzy). Failure yields an empty
//!    result carrying one error.
//! 2. **Fan out** with `buffer_unordered(max_concurrent_sources)`, so a slot
//!    frees as soon as any source finishes. Each source gets
//!    `ceil(max_articles / sources)` as its local cap. A source that fails or
//!    panics becomes a [`SourceOutcome::Failed`] and its siblings carry on.
//!    Outcomes are put back in configuration order before merging.
//! 3. **Rank** by relevance, then newest first (undated last).
//! 4. **Deduplicate** titles, then **truncate** to `max_articles`.
//!
//! `crawl` never returns an error; degraded coverage shows up in
//! `error_count` / `errors`.

use crate::config::CrawlerSettings;
use crate::dedup::deduplicate;
use crate::error::ConfigError;
use crate::http::{HttpFetch, ReqwestFetcher};
use crate::models::{CrawledContent, CrawlerResult, CrawlerSource, SourceTestReport, TopicCrawlerConfig};
use crate::registry::TopicRegistry;
use crate::scrapers::{CrawlContext, fetch_source};
use crate::similarity::{SequenceRatio, TextSimilarity};
use chrono::{Duration as ChronoDuration, Utc};
use futures::FutureExt;
use futures::stream::{self, StreamExt};
use std::any::Any;
use std::cmp::Ordering;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// Item cap used when a single source is crawled on its own.
pub const TEST_SOURCE_LIMIT: usize = 5;

const SAMPLE_TITLES: usize = 3;

/// What one source task produced.
#[derive(Debug)]
pub enum SourceOutcome {
    Crawled {
        source: String,
        items: Vec<CrawledContent>,
    },
    Failed {
        source: String,
        error: String,
    },
}

pub struct CrawlerService<F: HttpFetch = ReqwestFetcher> {
    registry: TopicRegistry,
    fetcher: F,
    settings: CrawlerSettings,
    similarity: Arc<dyn TextSimilarity>,
}

impl<F: HttpFetch> CrawlerService<F> {
    /// A service using [`SequenceRatio`] for topic matching and title dedup.
    pub fn new(registry: TopicRegistry, fetcher: F, settings: CrawlerSettings) -> Self {
        Self {
            registry,
            fetcher,
            settings,
            similarity: Arc::new(SequenceRatio),
        }
    }

    pub fn with_similarity(mut self, similarity: Arc<dyn TextSimilarity>) -> Self {
        self.similarity = similarity;
        self
    }

    pub fn settings(&self) -> &CrawlerSettings {
        &self.settings
    }

    /// Crawl every source of `topic` and return at most `max_articles`
    /// ranked, deduplicated items.
    #[instrument(level = "info", skip(self))]
    pub async fn crawl(&self, topic: &str, max_articles: usize) -> CrawlerResult {
        let started = Instant::now();

        let config = match self.registry.resolve(topic, self.similarity.as_ref()) {
            Ok(resolution) => resolution.config,
            Err(e) => {
                warn!(error = %e, "Topic could not be resolved");
                return CrawlerResult::failed(topic, e.to_string(), started.elapsed().as_secs_f64());
            }
        };

        let per_source = max_articles.div_ceil(config.sources.len().max(1));
        info!(
            resolved = %config.topic,
            sources = config.sources.len(),
            per_source,
            max_concurrent = self.settings.max_concurrent_sources,
            "Crawling topic"
        );

        let mut outcomes: Vec<(usize, SourceOutcome)> = stream::iter(config.sources.iter().enumerate())
            .map(|(idx, source)| async move { (idx, self.crawl_source(config, source, per_source).await) })
            .buffer_unordered(self.settings.max_concurrent_sources)
            .collect()
            .await;
        outcomes.sort_by_key(|(idx, _)| *idx);

        let mut items = Vec::new();
        let mut errors = Vec::new();
        for (_, outcome) in outcomes {
            match outcome {
                SourceOutcome::Crawled { source, items: found } => {
                    debug!(%source, count = found.len(), "Source finished");
                    items.extend(found);
                }
                SourceOutcome::Failed { source, error } => {
                    let message = format!("error crawling {source}: {error}");
                    error!(%source, %error, "Source failed");
                    errors.push(message);
                }
            }
        }

        if self.settings.enforce_freshness {
            items = retain_fresh(items, config.freshness_hours);
        }

        let candidates = items.len();
        rank(&mut items);
        let mut items = deduplicate(items, self.similarity.as_ref(), self.settings.duplicate_threshold);
        items.truncate(max_articles);

        let sources_used = config
            .sources
            .iter()
            .filter(|s| items.iter().any(|i| i.source == s.name))
            .map(|s| s.name.clone())
            .collect();

        let crawl_duration = started.elapsed().as_secs_f64();
        info!(
            candidates,
            returned = items.len(),
            errors = errors.len(),
            crawl_duration,
            "Crawl complete"
        );

        CrawlerResult {
            topic: topic.to_string(),
            total_found: items.len(),
            content_items: items,
            crawl_duration,
            sources_used,
            error_count: errors.len(),
            errors,
        }
    }

    /// Crawl one named source on its own, capped at [`TEST_SOURCE_LIMIT`]
    /// items.
    #[instrument(level = "info", skip(self))]
    pub async fn test_source(&self, name: &str) -> Result<SourceTestReport, ConfigError> {
        let (topic, source) = self.registry.find_source(name)?;
        let report = match self.crawl_source(topic, source, TEST_SOURCE_LIMIT).await {
            SourceOutcome::Crawled { source, items } => SourceTestReport {
                source,
                success: true,
                articles_found: items.len(),
                errors: Vec::new(),
                sample_titles: items.iter().take(SAMPLE_TITLES).map(|i| i.title.clone()).collect(),
            },
            SourceOutcome::Failed { source, error } => SourceTestReport {
                errors: vec![format!("error crawling {source}: {error}")],
                source,
                success: false,
                articles_found: 0,
                sample_titles: Vec::new(),
            },
        };
        Ok(report)
    }

    /// Run one source's strategy, turning errors and panics into a
    /// [`SourceOutcome::Failed`].
    async fn crawl_source(
        &self,
        topic: &TopicCrawlerConfig,
        source: &CrawlerSource,
        max_items: usize,
    ) -> SourceOutcome {
        let ctx = CrawlContext {
            source,
            topic,
            settings: &self.settings,
            max_items,
        };
        match AssertUnwindSafe(fetch_source(&self.fetcher, ctx)).catch_unwind().await {
            Ok(Ok(items)) => SourceOutcome::Crawled {
                source: source.name.clone(),
                items,
            },
            Ok(Err(e)) => SourceOutcome::Failed {
                source: source.name.clone(),
                error: e.to_string(),
            },
            Err(payload) => SourceOutcome::Failed {
                source: source.name.clone(),
                error: format!("task panicked: {}", panic_message(payload.as_ref())),
            },
        }
    }
}

/// Highest relevance first; ties go to the newer item, undated items last.
/// The sort is stable, so full ties keep source order.
fn rank(items: &mut [CrawledContent]) {
    items.sort_by(|a, b| {
        b.relevance_score
            .total_cmp(&a.relevance_score)
            .then_with(|| match (a.published_at, b.published_at) {
                (Some(a), Some(b)) => b.cmp(&a),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
    });
}

/// Drops items published more than `hours` ago. Undated items are kept.
fn retain_fresh(items: Vec<CrawledContent>, hours: u32) -> Vec<CrawledContent> {
    let cutoff = Utc::now() - ChronoDuration::hours(i64::from(hours));
    let before = items.len();
    let fresh: Vec<CrawledContent> = items
        .into_iter()
        .filter(|i| i.published_at.is_none_or(|p| p >= cutoff))
        .collect();
    debug!(dropped = before - fresh.len(), %cutoff, "Applied freshness window");
    fresh
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
