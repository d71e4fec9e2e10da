//! Pagination scanner: parallel lanes over the listing pages of one site
//!
//! Lane `L` of `N` visits pages `L, L+N, L+2N, ...` up to the page ceiling.
//! A lane ends on its own when a page has no blog elements, when a listing
//! fetch fails, or (under `DuplicatePolicy::StopLane`) at the first blog
//! already in the store. Listing fetches are never retried here.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use futures::future;
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::crawler::site::{ListingEntry, SiteAdapter, build_adapter};
use crate::crawler::{CrawlerConfig, DuplicatePolicy};
use crate::http::FetchClient;
use crate::models::{BlogRecord, IdolGroup};
use crate::store::{BlogStore, Storage, finalize};

/// Why a lane stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LaneStop {
    /// A listing page had no blog elements
    EmptyPage,
    /// A listing page could not be fetched
    FetchError,
    /// A known blog was reached
    Duplicate,
    /// An article page was missing its content
    MissingArticle,
    /// The page ceiling was reached
    Ceiling,
}

/// Summary of one lane
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaneReport {
    /// Lane index
    pub lane: u32,
    /// Listing pages requested
    pub pages: u32,
    /// Blogs inserted into the store
    pub inserted: usize,
    /// Last page visited
    pub last_page: Option<u32>,
    /// Termination reason
    pub stop: LaneStop,
}

/// Result of handling one listing entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryOutcome {
    Inserted,
    Duplicate,
    Missing,
    Skipped,
}

/// Drives the lanes of one crawl run
pub struct PaginationScanner {
    adapter: Arc<dyn SiteAdapter>,
    client: FetchClient,
    store: Arc<BlogStore>,
    lane_count: u32,
    max_page: u32,
    duplicate_policy: DuplicatePolicy,
}

impl PaginationScanner {
    /// Create a scanner writing into `store`
    pub fn new(
        adapter: Arc<dyn SiteAdapter>,
        client: FetchClient,
        store: Arc<BlogStore>,
        config: &CrawlerConfig,
    ) -> Self {
        Self {
            adapter,
            client,
            store,
            lane_count: config.lane_count.max(1),
            max_page: config.max_page,
            duplicate_policy: config.duplicate_policy,
        }
    }

    /// Run every lane in parallel and wait for all of them
    pub async fn run(self: Arc<Self>) -> Vec<LaneReport> {
        let tasks = (0..self.lane_count)
            .map(|lane| {
                let scanner = self.clone();
                tokio::spawn(async move { scanner.scan_lane(lane).await })
            })
            .collect::<Vec<_>>();

        let results = future::join_all(tasks).await;

        let mut reports = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Ok(report) => reports.push(report),
                Err(e) => error!("Lane task failed: {}", e),
            }
        }
        reports
    }

    /// Scan the pages of a single lane
    #[instrument(skip(self), fields(group = %self.adapter.group()))]
    pub async fn scan_lane(&self, lane: u32) -> LaneReport {
        let mut report = LaneReport {
            lane,
            pages: 0,
            inserted: 0,
            last_page: None,
            stop: LaneStop::Ceiling,
        };

        for page in (lane..=self.max_page).step_by(self.lane_count as usize) {
            report.pages += 1;
            report.last_page = Some(page);
            debug!("Lane [{}] processing page {}", lane, page);

            let url = self.adapter.list_url(page);
            let entries = match self.client.fetch_document(&url).await {
                Ok(document) => self.adapter.extract_entries(&document),
                Err(e) => {
                    warn!("Error on page {}: {}", page, e);
                    report.stop = LaneStop::FetchError;
                    return report;
                }
            };

            if entries.is_empty() {
                debug!("Not found in page {}", page);
                report.stop = LaneStop::EmptyPage;
                return report;
            }

            for entry in entries {
                match self.handle_entry(entry, page).await {
                    EntryOutcome::Inserted => report.inserted += 1,
                    EntryOutcome::Skipped => {}
                    EntryOutcome::Duplicate if !self.duplicate_policy.stops_lane() => {}
                    EntryOutcome::Duplicate => {
                        report.stop = LaneStop::Duplicate;
                        return report;
                    }
                    EntryOutcome::Missing => {
                        report.stop = LaneStop::MissingArticle;
                        return report;
                    }
                }
            }
        }

        report
    }

    async fn handle_entry(&self, entry: ListingEntry, page: u32) -> EntryOutcome {
        let Some(id) = entry.id.clone() else {
            debug!("Skipping element without link on page {}", page);
            return EntryOutcome::Skipped;
        };
        let member = entry.member.clone();

        // Peek only to spare the article fetch; `insert` below is the real gate.
        if self.store.contains(&id) {
            debug!(
                "Duplicate Blog Id {} for Member {} found on page {}",
                id, member, page
            );
            return EntryOutcome::Duplicate;
        }

        let started = Instant::now();
        let detail_url = self.adapter.detail_url(&entry).map(str::to_owned);
        let draft = match detail_url {
            Some(url) => match self.client.fetch_document(&url).await {
                Ok(document) => self.adapter.parse_blog(entry, Some(&document)),
                Err(e) => {
                    warn!("Failed to fetch article {}: {}", url, e);
                    self.adapter.parse_blog(entry, None)
                }
            },
            None => self.adapter.parse_blog(entry, None),
        };

        let Some(draft) = draft else {
            warn!("Not found on Blog Id {} for Member {}", id, member);
            return EntryOutcome::Missing;
        };

        let record = draft.into_record(self.adapter.date_format(), self.adapter.japan_time());
        let date = record.date_time.clone().unwrap_or_default();
        let image_count = record.image_list.len();

        if !self.store.insert(record) {
            debug!("Blog Id {} was inserted by another lane", id);
            return EntryOutcome::Duplicate;
        }

        info!(
            "Blog ID:[{}][{}] Date:[{}] ImgCount:[{}] Page:[{}] ProcessingTime:[{:.3}s]",
            id,
            member,
            date,
            image_count,
            page,
            started.elapsed().as_secs_f64()
        );
        EntryOutcome::Inserted
    }
}

/// Outcome of one `crawl_group` run
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub group: IdolGroup,
    pub lanes: Vec<LaneReport>,
    /// Blogs added to the store during this run
    pub new_blogs: usize,
    /// Whether the finalized store was written back
    pub persisted: bool,
    /// Every known blog by ID, including those loaded from disk
    pub blogs: BTreeMap<String, BlogRecord>,
}

impl CrawlReport {
    /// The ID to record mapping as a JSON object
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(&self.blogs)?)
    }
}

/// Crawl one group's blog and merge new posts into its persisted store
#[instrument(skip(config, storage))]
pub async fn crawl_group(
    group: IdolGroup,
    config: &CrawlerConfig,
    storage: &Storage,
) -> crate::Result<CrawlReport> {
    let adapter = build_adapter(group, config.home_page.as_deref())?;
    let client = FetchClient::new(config)?;
    crawl_with(adapter, client, config, storage).await
}

/// Crawl with an explicit adapter and client
pub async fn crawl_with(
    adapter: Arc<dyn SiteAdapter>,
    client: FetchClient,
    config: &CrawlerConfig,
    storage: &Storage,
) -> crate::Result<CrawlReport> {
    let group = adapter.group();
    let started = Instant::now();
    let store = Arc::new(storage.load_store(group).await?);
    let initial = store.len();
    info!("{} blogs known for {}", initial, group);

    let scanner = Arc::new(PaginationScanner::new(
        adapter.clone(),
        client,
        store.clone(),
        config,
    ));
    let lanes = scanner.run().await;

    let new_blogs = store.len().saturating_sub(initial);
    let persisted = new_blogs > 0;
    if persisted {
        let members = finalize(store.records(), group, adapter.alias_policy());
        storage.save_members(group, &members).await?;
        info!(
            "Saved {} members with {} new blogs to {}",
            members.len(),
            new_blogs,
            storage.blog_status_path(group).display()
        );
    } else {
        info!("No new blogs for {}", group);
    }
    info!(
        "Crawl of {} finished in {:.3}s",
        group,
        started.elapsed().as_secs_f64()
    );

    Ok(CrawlReport {
        group,
        lanes,
        new_blogs,
        persisted,
        blogs: store.snapshot(),
    })
}
