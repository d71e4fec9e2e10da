//! # Crawler Configuration Module
//!
//! Controls for the pagination scanner: how many lanes run in parallel, the
//! page ceiling per lane, what a lane does when it meets an already-known
//! blog, and the HTTP client identity. Built with a builder like the other
//! configuration types in this crate.

use std::time::Duration;

/// Hard ceiling on the page number any lane visits
pub const DEFAULT_MAX_PAGE: u32 = 1000;

/// What a lane does when it meets a blog that is already in the store
///
/// The listing pages are reverse-chronological, so by default a lane stops at
/// the first known blog and presumes everything behind it was captured by an
/// earlier run. A new post appearing behind an old one in the same lane stride
/// is missed under that policy; `Continue` trades the early stop for a full
/// scan of the lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Terminate the lane on the first known blog
    #[default]
    StopLane,
    /// Skip known blogs and keep scanning
    Continue,
}

impl DuplicatePolicy {
    /// Whether a lane stops after meeting a known blog
    pub fn stops_lane(self) -> bool {
        matches!(self, DuplicatePolicy::StopLane)
    }
}

/// Configuration for the crawler
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Number of concurrent pagination lanes
    pub lane_count: u32,

    /// Highest page number a lane visits
    pub max_page: u32,

    /// User agent to use for requests
    pub user_agent: String,

    /// Request timeout, client default when unset
    pub timeout: Option<Duration>,

    /// Lane behaviour on already-known blogs
    pub duplicate_policy: DuplicatePolicy,

    /// Overrides the group home page, e.g. to point at a mirror
    pub home_page: Option<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            lane_count: default_lane_count(),
            max_page: DEFAULT_MAX_PAGE,
            user_agent: format!("sakamichi-blog/{}", env!("CARGO_PKG_VERSION")),
            timeout: None,
            duplicate_policy: DuplicatePolicy::default(),
            home_page: None,
        }
    }
}

/// One lane per available CPU
pub fn default_lane_count() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(1)
}

/// Builder for CrawlerConfig
#[derive(Debug, Default)]
pub struct CrawlerConfigBuilder {
    config: CrawlerConfig,
}

impl CrawlerConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: CrawlerConfig::default(),
        }
    }

    /// Set the number of lanes; zero is raised to one
    pub fn lane_count(mut self, lane_count: u32) -> Self {
        self.config.lane_count = lane_count.max(1);
        self
    }

    /// Set the page ceiling
    pub fn max_page(mut self, max_page: u32) -> Self {
        self.config.max_page = max_page;
        self
    }

    /// Set the user agent to use for requests
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set a request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Set the duplicate policy
    pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.config.duplicate_policy = policy;
        self
    }

    /// Point the adapters at another home page
    pub fn home_page(mut self, home_page: impl Into<String>) -> Self {
        self.config.home_page = Some(home_page.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> CrawlerConfig {
        self.config
    }
}

impl CrawlerConfig {
    /// Create a new builder
    pub fn builder() -> CrawlerConfigBuilder {
        CrawlerConfigBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CrawlerConfig::default();
        assert!(config.lane_count >= 1);
        assert_eq!(config.max_page, 1000);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::StopLane);
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_builder() {
        let config = CrawlerConfig::builder()
            .lane_count(0)
            .max_page(10)
            .duplicate_policy(DuplicatePolicy::Continue)
            .home_page("http://127.0.0.1:1234")
            .build();

        assert_eq!(config.lane_count, 1);
        assert_eq!(config.max_page, 10);
        assert!(!config.duplicate_policy.stops_lane());
        assert_eq!(config.home_page.as_deref(), Some("http://127.0.0.1:1234"));
    }
}
