//! # sakamichi-blog - Incremental Blog Crawler for Sakamichi Idol Groups
//!
//! This crate crawls the official member blogs of Sakurazaka46 and
//! Hinatazaka46, keeps a deduplicated per-member record of every post and
//! its images, and exports those images into per-member folders or archive
//! entries.
//!
//! ## Features
//!
//! - Parallel pagination lanes that stop early once known posts are reached
//! - Site adapters with exact class filters for each group's markup
//! - A merge store keyed by blog ID, persisted as per-member JSON
//! - Relay-post routing for shared blog accounts
//! - Date normalisation to a fixed `+08:00` display offset
//! - Hinatazaka46 history photo columns
//! - Image export with bounded concurrency and retries
//!
//! ## Example
//!
//! ```rust,no_run
//! use sakamichi_blog::crawler::{CrawlerConfig, crawl_group};
//! use sakamichi_blog::export::{ExportCollector, ExportConfig};
//! use sakamichi_blog::http::FetchClient;
//! use sakamichi_blog::models::IdolGroup;
//! use sakamichi_blog::store::Storage;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CrawlerConfig::default();
//!     let storage = Storage::new();
//!
//!     let report = crawl_group(IdolGroup::Sakurazaka46, &config, &storage).await?;
//!     println!("{} new blogs", report.new_blogs);
//!
//!     let collector = ExportCollector::new(FetchClient::new(&config)?, ExportConfig::default());
//!     let members = storage.load_members(IdolGroup::Sakurazaka46).await?;
//!     collector.export_members(&members, None).await?;
//!     Ok(())
//! }
//! ```

mod error;

pub mod crawler;
pub mod date;
pub mod export;
pub mod http;
pub mod models;
pub mod store;

pub use error::{Error, Result};

/// Re-export of types module for public use
pub mod prelude {
    pub use crate::crawler::{CrawlReport, CrawlerConfig, crawl_group, crawl_history};
    pub use crate::error::Error;
    pub use crate::error::Result;
    pub use crate::export::{ExportCollector, ExportConfig};
    pub use crate::models::{BlogRecord, IdolGroup, MemberRecord};
    pub use crate::store::Storage;
}
