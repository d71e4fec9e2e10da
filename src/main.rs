//! # sakamichi-blog CLI
//!
//! Thin command-line front end over the library.
//!
//! - `crawl <group>`: fetch new blogs of a group and update its store
//! - `history`: fetch new Hinatazaka46 history photo columns
//! - `export`: download member images into the export folder
//! - `members list|add|remove`: manage the desired-member list

mod telemetry;

use std::path::PathBuf;

use anyhow::bail;
use chrono::{Duration, Local, NaiveDateTime};
use clap::{Args, Parser, Subcommand};
use sakamichi_blog::crawler::{CrawlerConfig, DuplicatePolicy, crawl_group, crawl_history};
use sakamichi_blog::date::{self, DateFormat};
use sakamichi_blog::export::{ExportCollector, ExportConfig, select_members};
use sakamichi_blog::http::FetchClient;
use sakamichi_blog::models::IdolGroup;
use sakamichi_blog::store::Storage;
use tracing::{info, instrument, warn};

#[derive(Parser)]
#[command(author, version, about = "Incremental crawler and image exporter for Sakamichi blogs", long_about = None)]
struct Cli {
    /// Folder holding the blog stores and the desired-member list
    #[arg(long, global = true, default_value = ".")]
    data_dir: PathBuf,

    /// Also write daily rolling log files to this folder
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Crawl a group's blog and merge new posts into its store
    Crawl(CrawlArgs),

    /// Fetch new Hinatazaka46 history photo columns
    History,

    /// Export member images
    Export(ExportArgs),

    /// Manage the desired-member list
    #[command(subcommand)]
    Members(MembersCommand),
}

#[derive(Args, Debug)]
struct CrawlArgs {
    /// Group to crawl (sakurazaka46 or hinatazaka46)
    #[arg(required = true)]
    group: IdolGroup,

    /// Number of parallel page lanes (default: CPU count)
    #[arg(short, long)]
    lanes: Option<u32>,

    /// Keep scanning past already-known blogs
    #[arg(long)]
    full: bool,

    /// Write the ID to blog mapping as JSON to this file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Members to export (default: the desired-member list)
    #[arg(short, long)]
    member: Vec<String>,

    /// Only blogs on or after this date, as yyyyMMdd
    #[arg(short, long)]
    since: Option<String>,

    /// Export folder (default: <data-dir>/Export)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum MembersCommand {
    /// Show the desired-member list
    List,

    /// Add a member to the desired list
    Add { name: String },

    /// Remove a member from the desired list
    Remove { name: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing(cli.log_dir.as_deref())?;

    let storage = Storage::at(&cli.data_dir);

    match cli.command {
        Commands::Crawl(args) => crawl_command(args, &storage).await?,
        Commands::History => history_command(&storage).await?,
        Commands::Export(args) => export_command(args, &storage).await?,
        Commands::Members(command) => members_command(command, &storage).await?,
    }

    Ok(())
}

#[instrument(skip(storage))]
async fn crawl_command(args: CrawlArgs, storage: &Storage) -> anyhow::Result<()> {
    let mut builder = CrawlerConfig::builder();
    if let Some(lanes) = args.lanes {
        builder = builder.lane_count(lanes);
    }
    if args.full {
        builder = builder.duplicate_policy(DuplicatePolicy::Continue);
    }
    let config = builder.build();

    let report = crawl_group(args.group, &config, storage).await?;
    println!(
        "{}: {} new blogs, {} total",
        report.group,
        report.new_blogs,
        report.blogs.len()
    );

    if let Some(output_file) = args.output {
        tokio::fs::write(&output_file, report.to_json()?).await?;
        println!("Saved crawl result to {}", output_file.display());
    }

    Ok(())
}

async fn history_command(storage: &Storage) -> anyhow::Result<()> {
    let columns = crawl_history(&CrawlerConfig::default(), storage).await?;
    println!("{} history columns", columns.len());
    Ok(())
}

/// Cutoff for `--since`; unparseable input falls back to seven days ago
fn resolve_cutoff(since: Option<&str>, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let since = since?;
    match date::parse_naive(since, DateFormat::Compact) {
        Some(cutoff) => Some(cutoff),
        None => {
            warn!("Cannot parse '{}' as yyyyMMdd, using the last seven days", since);
            Some(now - Duration::days(7))
        }
    }
}

#[instrument(skip(storage))]
async fn export_command(args: ExportArgs, storage: &Storage) -> anyhow::Result<()> {
    let names = if args.member.is_empty() {
        storage.load_desired_members().await?
    } else {
        args.member
    };
    if names.is_empty() {
        bail!("No members given and the desired-member list is empty");
    }

    let members = select_members(&storage.all_members().await?, &names);
    for name in &names {
        if !members.iter().any(|m| &m.name == name) {
            warn!("Member {} not found in any blog store", name);
        }
    }

    let cutoff = resolve_cutoff(args.since.as_deref(), Local::now().naive_local());
    let crawler_config = CrawlerConfig::default();
    let export_config = ExportConfig::builder()
        .export_dir(
            args.out
                .unwrap_or_else(|| storage.base_path().join("Export")),
        )
        .concurrency(crawler_config.lane_count as usize)
        .build();

    let collector = ExportCollector::new(FetchClient::new(&crawler_config)?, export_config);
    for report in collector.export_members(&members, cutoff).await? {
        info!(
            "{}: {} blogs, {} images saved, {} failed",
            report.member, report.blogs, report.saved, report.failed
        );
        if report.is_partial() {
            println!(
                "{}: partial export, blogs {}",
                report.member,
                report.partial_blogs.join(", ")
            );
        } else {
            println!("{}: {} images", report.member, report.saved);
        }
    }

    Ok(())
}

async fn members_command(command: MembersCommand, storage: &Storage) -> anyhow::Result<()> {
    match command {
        MembersCommand::List => {
            for name in storage.load_desired_members().await? {
                println!("{}", name);
            }
        }
        MembersCommand::Add { name } => {
            if storage.add_desired_member(&name).await? {
                println!("Added {}", name);
            } else {
                println!("{} is already listed", name);
            }
        }
        MembersCommand::Remove { name } => {
            if storage.remove_desired_member(&name).await? {
                println!("Removed {}", name);
            } else {
                println!("{} is not listed", name);
            }
        }
    }
    Ok(())
}
