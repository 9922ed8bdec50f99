//! JSON output of crawl results.
//!
//! Results are grouped by the local date of the crawl and named after the
//! requested topic, so a free-text search lands in its own file:
//! `{json_output_dir}/{date}/{topic-slug}.json`. A later crawl of the same
//! topic on the same day overwrites the earlier file.

use crate::models::CrawlerResult;
use crate::utils::slugify;
use chrono::Local;
use std::error::Error;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write a [`CrawlerResult`] under a dated directory and return the path of
/// the written file.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir, topic = %result.topic))]
pub async fn write_result(
    result: &CrawlerResult,
    json_output_dir: &str,
) -> Result<String, Box<dyn Error>> {
    let json = serde_json::to_string(result)?;

    let full_json_dir = format!(
        "{}/{}",
        json_output_dir.trim_end_matches('/'),
        Local::now().date_naive()
    );
    if let Err(e) = fs::create_dir_all(&full_json_dir).await {
        error!(%full_json_dir, error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let mut slug = slugify(&result.topic);
    if slug.is_empty() {
        slug = "untitled".to_string();
    }
    let output_json_filename = format!("{full_json_dir}/{slug}.json");

    fs::write(&output_json_filename, json).await?;
    info!(path = %output_json_filename, items = result.content_items.len(), "Wrote crawl result");
    Ok(output_json_filename)
}
