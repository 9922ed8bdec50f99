//! Crawl result persistence.
//!
//! # Submodules
//!
//! - [`json`]: Writes a [`CrawlerResult`](crate::models::CrawlerResult) to a
//!   dated JSON file
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! ├── 2025-05-06/
//! │   ├── gaming-news.json
//! │   └── research-deep-learning.json
//! └── 2025-05-07/
//!     └── video-games.json
//! ```

pub mod json;
