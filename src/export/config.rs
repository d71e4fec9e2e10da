//! # Export Configuration Module
//!
//! Where exported images land and how hard the collector pushes the image
//! hosts.

use std::path::PathBuf;

use crate::crawler::default_lane_count;

/// Download attempts per image
pub const DEFAULT_RETRIES: u32 = 3;

/// Configuration for the export collector
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Root of the exported folder tree
    pub export_dir: PathBuf,

    /// Maximum simultaneous image downloads
    pub concurrency: usize,

    /// Attempts per image before it is dropped
    pub retries: u32,

    /// Overrides the group home page used to resolve relative image paths
    pub home_page: Option<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            export_dir: PathBuf::from("./Export"),
            concurrency: default_lane_count() as usize,
            retries: DEFAULT_RETRIES,
            home_page: None,
        }
    }
}

/// Builder for ExportConfig
#[derive(Debug, Default)]
pub struct ExportConfigBuilder {
    config: ExportConfig,
}

impl ExportConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            config: ExportConfig::default(),
        }
    }

    /// Set the export folder
    pub fn export_dir(mut self, export_dir: impl Into<PathBuf>) -> Self {
        self.config.export_dir = export_dir.into();
        self
    }

    /// Set the download concurrency, at least one
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency.max(1);
        self
    }

    /// Set the attempts per image, at least one
    pub fn retries(mut self, retries: u32) -> Self {
        self.config.retries = retries.max(1);
        self
    }

    /// Resolve relative image paths against another home page
    pub fn home_page(mut self, home_page: impl Into<String>) -> Self {
        self.config.home_page = Some(home_page.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> ExportConfig {
        self.config
    }
}

impl ExportConfig {
    /// Create a new builder
    pub fn builder() -> ExportConfigBuilder {
        ExportConfigBuilder::new()
    }
}
