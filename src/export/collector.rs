use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use chrono::{DateTime, NaiveDateTime};
use futures::future;
use percent_encoding::percent_decode_str;
use serde::Serialize;
use tokio::fs;
use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};
use url::Url;

use super::{ExportConfig, ExportError};
use crate::date;
use crate::http::FetchClient;
use crate::models::{BlogRecord, IdolGroup, MemberRecord};

type Result<T> = std::result::Result<T, ExportError>;

/// Extensions that are exported; anything else is skipped
const IMAGE_EXTENSIONS: [&str; 4] = [".jpeg", ".jpg", ".png", ".gif"];

/// Base names the sites reuse across posts
const GENERIC_NAMES: [&str; 10] = [
    "0000", "0001", "0002", "0003", "0004", "0005", "0006", "0007", "0008", "0009",
];

/// Longest base name kept in a file name
const MAX_BASE_LEN: usize = 52;

/// One downloaded image destined for an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub data: Vec<u8>,
    /// `<group folder>/<member>/<file>`
    pub path: PathBuf,
    /// Wall-clock time of the blog at the fixed offset
    pub modified: Option<NaiveDateTime>,
}

/// Per-member export summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    pub member: String,
    /// Blogs that passed the cutoff
    pub blogs: usize,
    /// Images written or collected
    pub saved: usize,
    /// Images dropped after all retries
    pub failed: usize,
    /// IDs of blogs with at least one dropped image
    pub partial_blogs: Vec<String>,
}

impl ExportReport {
    fn new(member: &str, blogs: usize) -> Self {
        Self {
            member: member.to_string(),
            blogs,
            ..Self::default()
        }
    }

    /// Whether any image was dropped
    pub fn is_partial(&self) -> bool {
        !self.partial_blogs.is_empty()
    }
}

/// Archive entries of one member with their summary
#[derive(Debug, Clone)]
pub struct ArchiveExport {
    pub entries: Vec<ArchiveEntry>,
    pub report: ExportReport,
}

/// An image to fetch, tied to its blog by position in the filtered list
struct ImageJob {
    blog: usize,
    url: String,
    file_name: String,
    date_time: Option<String>,
}

/// Blogs at or after `cutoff`, in their stored order.
///
/// Blogs without a parseable date never pass a cutoff.
pub fn filter_blogs(blogs: &[BlogRecord], cutoff: Option<NaiveDateTime>) -> Vec<&BlogRecord> {
    blogs
        .iter()
        .filter(|blog| match cutoff {
            None => true,
            Some(cutoff) => blog
                .date_time
                .as_deref()
                .and_then(date::parse_canonical)
                .is_some_and(|at| at >= cutoff),
        })
        .collect()
}

/// Absolute URL of an image source; relative paths hang off the home page
pub fn image_url(home: &Url, src: &str) -> Option<String> {
    home.join(src).ok().map(String::from)
}

/// Local file name of an image URL, `None` for non-image extensions
pub fn image_file_name(url: &str, blog_id: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.next_back()?;
    let last = percent_decode_str(segment).decode_utf8_lossy();
    let dot = last.rfind('.')?;
    let base = &last[..dot];
    let extension = last[dot..].to_lowercase();
    if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        return None;
    }

    Some(if GENERIC_NAMES.contains(&base) {
        format!("{blog_id}_{base}{extension}")
    } else if base.chars().count() > MAX_BASE_LEN {
        format!("{}{extension}", base.chars().take(MAX_BASE_LEN).collect::<String>())
    } else {
        format!("{base}{extension}")
    })
}

/// Member records whose name is in `names`, in `names` order
pub fn select_members(all: &[MemberRecord], names: &[String]) -> Vec<MemberRecord> {
    names
        .iter()
        .flat_map(|name| all.iter().filter(move |member| &member.name == name))
        .cloned()
        .collect()
}

/// Instant of a canonical timestamp, honouring its offset
fn instant(date_time: &str) -> Option<SystemTime> {
    DateTime::parse_from_rfc3339(date_time.trim())
        .ok()
        .map(SystemTime::from)
}

async fn stamp(path: &Path, modified: Option<SystemTime>) {
    let Some(modified) = modified else {
        return;
    };
    let target = path.to_path_buf();
    let result = tokio::task::spawn_blocking(move || {
        std::fs::File::options()
            .write(true)
            .open(&target)?
            .set_modified(modified)
    })
    .await;

    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Failed to set mtime of {}: {}", path.display(), e),
        Err(e) => warn!("Failed to set mtime of {}: {}", path.display(), e),
    }
}

async fn save_image(client: &FetchClient, job: &ImageJob, path: &Path, retries: u32) -> bool {
    let modified = job.date_time.as_deref().and_then(instant);

    if fs::try_exists(path).await.unwrap_or(false) {
        stamp(path, modified).await;
        return true;
    }

    let data = match client.fetch_bytes(&job.url, retries).await {
        Ok(data) => data,
        Err(e) => {
            warn!("Dropping image {}: {}", job.url, e);
            return false;
        }
    };
    if let Err(e) = fs::write(path, &data).await {
        warn!("Failed to write {}: {}", path.display(), e);
        return false;
    }
    stamp(path, modified).await;
    true
}

/// Downloads member images with bounded concurrency
pub struct ExportCollector {
    client: FetchClient,
    config: ExportConfig,
    limiter: Arc<Semaphore>,
}

impl ExportCollector {
    /// Create a collector sharing `client`
    pub fn new(client: FetchClient, config: ExportConfig) -> Self {
        let limiter = Arc::new(Semaphore::new(config.concurrency.max(1)));
        Self {
            client,
            config,
            limiter,
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    fn home(&self, group: IdolGroup) -> Result<Url> {
        let home = self.config.home_page.as_deref().unwrap_or(group.home_page());
        Ok(Url::parse(home)?)
    }

    fn jobs(&self, group: IdolGroup, blogs: &[&BlogRecord]) -> Result<Vec<ImageJob>> {
        let home = self.home(group)?;
        let mut jobs = Vec::new();
        for (index, blog) in blogs.iter().enumerate() {
            for src in &blog.image_list {
                let Some(url) = image_url(&home, src) else {
                    warn!("Skipping invalid image source {}", src);
                    continue;
                };
                let Some(file_name) = image_file_name(&url, &blog.id) else {
                    continue;
                };
                jobs.push(ImageJob {
                    blog: index,
                    url,
                    file_name,
                    date_time: blog.date_time.clone(),
                });
            }
        }
        Ok(jobs)
    }

    /// Run one task per image under the shared limiter, in job order
    async fn run_jobs<T, F, Fut>(
        &self,
        jobs: Vec<ImageJob>,
        work: F,
    ) -> Result<Vec<(usize, Option<T>)>>
    where
        F: Fn(FetchClient, ImageJob) -> Fut,
        Fut: Future<Output = Option<T>> + Send + 'static,
        T: Send + 'static,
    {
        let tasks = jobs
            .into_iter()
            .map(|job| {
                let permit = self.limiter.clone().acquire_owned();
                let blog = job.blog;
                let task = work(self.client.clone(), job);
                tokio::spawn(async move {
                    let _permit = permit.await?;
                    Ok::<_, ExportError>((blog, task.await))
                })
            })
            .collect::<Vec<_>>();

        let mut outcomes = Vec::with_capacity(tasks.len());
        for result in future::join_all(tasks).await {
            outcomes.push(result??);
        }
        Ok(outcomes)
    }

    /// Count outcomes into the report and log fully exported blogs
    fn tally<T>(
        report: &mut ExportReport,
        blogs: &[&BlogRecord],
        outcomes: &[(usize, Option<T>)],
    ) {
        let mut failed = vec![false; blogs.len()];
        for (blog, outcome) in outcomes {
            if outcome.is_some() {
                report.saved += 1;
            } else {
                report.failed += 1;
                failed[*blog] = true;
            }
        }

        for (blog, failed) in blogs.iter().zip(failed) {
            if failed {
                report.partial_blogs.push(blog.id.clone());
            } else if !blog.image_list.is_empty() {
                info!(
                    "Saved {} blog [{}] {} ImageCount:{}",
                    blog.name,
                    blog.title,
                    blog.date_time.as_deref().unwrap_or_default(),
                    blog.image_list.len()
                );
            }
        }
    }

    /// Export a member's images into `<export_dir>/<group folder>/<member>`.
    ///
    /// Files that already exist are only re-stamped with the blog time.
    #[instrument(skip(self, member), fields(member = %member.name))]
    pub async fn export_to_dir(
        &self,
        member: &MemberRecord,
        cutoff: Option<NaiveDateTime>,
    ) -> Result<ExportReport> {
        let blogs = filter_blogs(&member.blog_list, cutoff);
        let mut report = ExportReport::new(&member.name, blogs.len());
        if blogs.is_empty() {
            return Ok(report);
        }

        let folder = self
            .config
            .export_dir
            .join(member.group.folder_name())
            .join(&member.name);
        fs::create_dir_all(&folder).await?;

        let retries = self.config.retries;
        let jobs = self.jobs(member.group, &blogs)?;
        let outcomes = self
            .run_jobs(jobs, move |client, job| {
                let path = folder.join(&job.file_name);
                async move { save_image(&client, &job, &path, retries).await.then_some(()) }
            })
            .await?;

        Self::tally(&mut report, &blogs, &outcomes);
        info!("Export Result: {} Success", member.name);
        Ok(report)
    }

    /// Download a member's images into memory for an archive writer
    #[instrument(skip(self, member), fields(member = %member.name))]
    pub async fn collect_archive(
        &self,
        member: &MemberRecord,
        cutoff: Option<NaiveDateTime>,
    ) -> Result<ArchiveExport> {
        let blogs = filter_blogs(&member.blog_list, cutoff);
        let mut report = ExportReport::new(&member.name, blogs.len());
        if blogs.is_empty() {
            return Ok(ArchiveExport {
                entries: Vec::new(),
                report,
            });
        }

        let folder = Path::new(member.group.folder_name()).join(&member.name);
        let retries = self.config.retries;
        let jobs = self.jobs(member.group, &blogs)?;
        let outcomes = self
            .run_jobs(jobs, move |client, job| {
                let path = folder.join(&job.file_name);
                async move {
                    match client.fetch_bytes(&job.url, retries).await {
                        Ok(data) => Some(ArchiveEntry {
                            data,
                            path,
                            modified: job.date_time.as_deref().and_then(date::parse_canonical),
                        }),
                        Err(e) => {
                            warn!("Dropping image {}: {}", job.url, e);
                            None
                        }
                    }
                }
            })
            .await?;

        Self::tally(&mut report, &blogs, &outcomes);
        let entries: Vec<_> = outcomes.into_iter().filter_map(|(_, entry)| entry).collect();
        if !entries.is_empty() {
            info!("Export Result: {} Success", member.name);
        }
        Ok(ArchiveExport { entries, report })
    }

    /// Export several members one after another
    pub async fn export_members(
        &self,
        members: &[MemberRecord],
        cutoff: Option<NaiveDateTime>,
    ) -> Result<Vec<ExportReport>> {
        let mut reports = Vec::with_capacity(members.len());
        for member in members {
            reports.push(self.export_to_dir(member, cutoff).await?);
        }
        Ok(reports)
    }
}
