//! # Blog Crawler Module
//!
//! Fetches blog listing pages, extracts posts with group-specific adapters
//! and merges them into the persisted blog store.
//!
//! ## Key Components
//!
//! - `CrawlerConfig`: lane count, page ceiling, duplicate policy and HTTP settings
//! - `SiteAdapter`: per-site parsing, implemented by `SakurazakaAdapter` and
//!   `HinatazakaAdapter`
//! - `PaginationScanner`: runs the parallel page lanes against a `BlogStore`
//! - `crawl_group`: load, scan, finalize and persist one group
//! - `crawl_history`: the Hinatazaka46 history photo columns
//!
//! ## Usage
//!
//! ```no_run
//! # async fn run() -> sakamichi_blog::Result<()> {
//! use sakamichi_blog::crawler::{CrawlerConfig, crawl_group};
//! use sakamichi_blog::models::IdolGroup;
//! use sakamichi_blog::store::Storage;
//!
//! let config = CrawlerConfig::builder().lane_count(4).build();
//! let report = crawl_group(IdolGroup::Hinatazaka46, &config, &Storage::new()).await?;
//! println!("{} new blogs", report.new_blogs);
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod hinatazaka;
mod history;
mod sakurazaka;
mod scanner;
mod site;

pub use config::{
    CrawlerConfig, CrawlerConfigBuilder, DEFAULT_MAX_PAGE, DuplicatePolicy, default_lane_count,
};
pub use error::CrawlError;
pub use hinatazaka::{DEFAULT_IMAGE_THRESHOLD, HinatazakaAdapter};
pub use history::{LOOKAHEAD_COLUMNS, column_code, crawl_history};
pub use sakurazaka::SakurazakaAdapter;
pub use scanner::{CrawlReport, LaneReport, LaneStop, PaginationScanner, crawl_group, crawl_with};
pub use site::{BlogDraft, ListingEntry, SiteAdapter, UNKNOWN, build_adapter};
