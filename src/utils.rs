//! Utility functions for text cleanup, date parsing and file system checks.
//!
//! This module provides helper functions used throughout the crawler:
//! - Whitespace normalization and HTML/markdown stripping
//! - Extractive summaries
//! - Publish-date parsing across the formats news sites use
//! - String truncation and slugification for logging and file names
//! - File system validation for output directories

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static MARKDOWN_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]*\]\([^)]*\)").unwrap());
static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").unwrap());

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%SZ"];
const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%d %b %Y"];

/// Collapse every run of whitespace into a single space and trim.
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Text content of an HTML fragment, whitespace-normalized.
///
/// Feed summaries routinely carry markup; this keeps only the words.
pub fn html_to_text(fragment: &str) -> String {
    let html = Html::parse_fragment(fragment);
    let text = html.root_element().text().collect::<Vec<_>>().join(" ");
    normalize_whitespace(&text)
}

/// Remove `[label](target)` markdown links and blank or bullet-only lines.
pub fn strip_markdown_links(markdown: &str) -> String {
    let text = MARKDOWN_LINK.replace_all(markdown, "");
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.chars().all(|c| c == '*' || c.is_whitespace()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// First `max` characters of `s`, never splitting a character.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Simple extractive summary: leading sentences up to `max_chars`.
///
/// Sentences are accumulated while their combined length stays within
/// `max_chars` and joined with `". "`. An ellipsis marks a summary shorter
/// than the text. When not even the first sentence fits, the first
/// `max_chars` characters are used instead.
///
/// # Examples
///
/// ```
/// use topic_crawler::utils::extractive_summary;
/// assert_eq!(extractive_summary("One. Two.", 300), "One. Two...");
/// ```
pub fn extractive_summary(content: &str, max_chars: usize) -> String {
    let mut picked: Vec<&str> = Vec::new();
    let mut length = 0;
    for sentence in SENTENCE_END.split(content) {
        let sentence = sentence.trim();
        if sentence.is_empty() {
            continue;
        }
        let n = sentence.chars().count();
        if length + n > max_chars {
            break;
        }
        picked.push(sentence);
        length += n;
    }

    let mut summary = picked.join(". ");
    if summary.is_empty() {
        summary = truncate_chars(content.trim(), max_chars).to_string();
    }
    if summary.chars().count() < content.trim().chars().count() {
        summary.push_str("...");
    }
    summary
}

/// Parse a publish date in any of the formats seen on news sites and feeds.
///
/// Tries RFC 3339 (Atom, `datetime` attributes), RFC 2822 (RSS `pubDate`),
/// then a list of naive date-time and date-only patterns, interpreted as UTC.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    None
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and a byte
/// count indicator appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let head = truncate_chars(s, max);
    if head.len() == s.len() {
        s.to_string()
    } else {
        format!("{}…(+{} bytes)", head, s.len() - head.len())
    }
}

/// Convert a title or topic to a file-name friendly slug.
///
/// Lowercases, drops punctuation, and turns spaces and underscores into
/// hyphens.
pub fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .replace(|c: char| !c.is_alphanumeric() && c != ' ' && c != '-' && c != '_', "")
        .replace([' ', '_'], "-")
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then writes and removes a
/// probe file.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}
