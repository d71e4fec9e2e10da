//! # Image Export Module
//!
//! Downloads the images of finalized member records, either into a folder
//! tree on disk or into in-memory entries for an archive writer.
//!
//! ## Key Components
//!
//! - `ExportConfig`: target folder, download concurrency and retry count
//! - `ExportCollector`: filesystem export and archive collection
//! - `ExportReport`: per-member counts, including blogs exported only partially
//!
//! Folders follow `<export_dir>/<group folder>/<member>/<file>`, where the
//! group folder is `◢櫻坂46` or `◢日向坂46`. Image downloads share one
//! limiter, so at most `concurrency` requests are in flight per collector.

mod collector;
mod config;
mod error;

pub use collector::{
    ArchiveEntry, ArchiveExport, ExportCollector, ExportReport, filter_blogs, image_file_name,
    image_url, select_members,
};
pub use config::{DEFAULT_RETRIES, ExportConfig, ExportConfigBuilder};
pub use error::ExportError;
