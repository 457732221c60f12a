//! sck-cu - Stash curation tool
//!
//! Rates the catalog from engagement counters, proposes space-constrained
//! selections, reorganizes the library on disk and reports on it.
//!
//! **Usage:**
//! ```bash
//! sck-cu rate --top 20 --write-back
//! sck-cu fill --budget "500 GB" --tags 12,40 --smart-fill --copy-to /mnt/usb
//! sck-cu organize --structure nested --template "{studio} - {date} - {title}" --dry-run
//! sck-cu clean-folders /mnt/library --delete
//! sck-cu report studios
//! sck-cu init --url http://localhost:9999 --api-key KEY
//! ```

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{anyhow, bail, Context, Result};
use bytesize::ByteSize;
use clap::{Parser, Subcommand, ValueEnum};
use sck_common::config::{ConfigResolver, LoggingConfig, TomlConfig};
use sck_common::{Gender, RatingTarget, SceneFilter};
use sck_cu::display;
use sck_cu::organizer::{organize_library, FilenameTemplate, FolderStructure, OrganizeOptions};
use sck_cu::rating::{rate_catalog, RatingWriter};
use sck_cu::selection::{copy_scenes, fill_space, plan_copy, CopyOutcome};
use sck_cu::services::{
    delete_folders, find_empty_folders, load_performer_report, load_studio_report, StashClient,
};
use sck_cu::PathMapper;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_STRUCTURE: &str = "nested";
const DEFAULT_TEMPLATE: &str = "{studio} - {title} - {id}";

#[derive(Parser, Debug)]
#[command(name = "sck-cu", version)]
#[command(about = "Rate, select and reorganize a Stash library")]
struct Cli {
    /// Config file (default: $SCK_CONFIG, then ~/.config/sck/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute ratings for studios, tags, performers and scenes
    Rate {
        /// Rows shown per table
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Store the computed ratings in the catalog
        #[arg(long)]
        write_back: bool,

        /// Which ratings to write back
        #[arg(
            long,
            value_enum,
            value_delimiter = ',',
            default_values_t = [TargetArg::Studios, TargetArg::Performers, TargetArg::Scenes]
        )]
        targets: Vec<TargetArg>,
    },

    /// Pick scenes that fit in a size budget
    Fill {
        /// Size budget, e.g. "500 GB" or "1.5 TiB"
        #[arg(long, value_parser = parse_size)]
        budget: u64,

        /// Tag ids forming the base selection
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,

        /// Top up the base selection with favorites
        #[arg(long)]
        smart_fill: bool,

        /// Copy the selection into this directory
        #[arg(long, value_name = "DIR")]
        copy_to: Option<PathBuf>,
    },

    /// Move scene files to paths derived from their metadata
    Organize {
        /// flat, nested, performer-male or performer-female
        #[arg(long)]
        structure: Option<String>,

        /// File name template, e.g. "{studio} - {date} - {title}.{ext}"
        #[arg(long)]
        template: Option<String>,

        /// Only scenes with at least one male performer
        #[arg(long)]
        require_male: bool,

        /// Only scenes with at least one female performer
        #[arg(long)]
        require_female: bool,

        /// Only scenes with a date
        #[arg(long)]
        has_date: bool,

        /// Only scenes with a description
        #[arg(long)]
        has_details: bool,

        /// Only scenes with tags
        #[arg(long)]
        has_tags: bool,

        /// Only scenes with performers
        #[arg(long)]
        has_performers: bool,

        /// Only scenes marked as organized in the catalog
        #[arg(long)]
        organized: bool,

        /// Log what would happen without touching files
        #[arg(long)]
        dry_run: bool,
    },

    /// Find folders without any video file
    CleanFolders {
        path: PathBuf,

        /// Delete the folders found
        #[arg(long)]
        delete: bool,

        /// Also delete folders whose names look like system folders
        #[arg(long, requires = "delete")]
        include_important: bool,
    },

    /// Engagement reports
    Report {
        #[command(subcommand)]
        kind: ReportKind,
    },

    /// Write a config file with the catalog connection
    Init {
        #[arg(long)]
        url: String,

        #[arg(long)]
        api_key: String,

        /// Local directory mirroring the catalog's /data
        #[arg(long)]
        data_root: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum ReportKind {
    /// Studio engagement and cleanup candidates
    Studios {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Performer engagement share
    Performers {
        #[arg(long, value_enum, default_value_t = GenderArg::Female)]
        gender: GenderArg,

        #[arg(long, default_value_t = 1)]
        min_scenes: u32,

        #[arg(long, default_value_t = 20)]
        top: usize,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum TargetArg {
    Studios,
    Performers,
    Scenes,
}

impl From<TargetArg> for RatingTarget {
    fn from(arg: TargetArg) -> Self {
        match arg {
            TargetArg::Studios => RatingTarget::Studio,
            TargetArg::Performers => RatingTarget::Performer,
            TargetArg::Scenes => RatingTarget::Scene,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum GenderArg {
    Female,
    Male,
}

impl From<GenderArg> for Gender {
    fn from(arg: GenderArg) -> Self {
        match arg {
            GenderArg::Female => Gender::Female,
            GenderArg::Male => Gender::Male,
        }
    }
}

fn parse_size(s: &str) -> std::result::Result<u64, String> {
    s.parse::<ByteSize>()
        .map(|b| b.as_u64())
        .map_err(|e| format!("invalid size '{}': {}", s, e))
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn connect(config: &TomlConfig) -> Result<StashClient> {
    let catalog = config.require_catalog()?;
    let client = StashClient::new(&catalog.url, &catalog.api_key)
        .context("Failed to create catalog client")?;
    info!("Catalog: {}", client.endpoint());
    Ok(client)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let resolver = ConfigResolver::new(cli.config.clone());
    let loaded = resolver.load().context("Failed to load configuration")?;
    init_tracing(&loaded.config.logging)?;

    info!(
        "sck-cu {} ({}, built {}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    loaded.log();
    let config = loaded.config;

    match cli.command {
        Command::Rate {
            top,
            write_back,
            targets,
        } => {
            let client = connect(&config)?;
            let ratings = rate_catalog(&client).await.context("Rating failed")?;

            println!("Studios\n{}", display::artifact_ratings_table(&ratings.studios, top));
            println!("Tags\n{}", display::artifact_ratings_table(&ratings.tags, top));
            println!(
                "Male performers\n{}",
                display::artifact_ratings_table(&ratings.male_performers, top)
            );
            println!(
                "Female performers\n{}",
                display::artifact_ratings_table(&ratings.female_performers, top)
            );
            println!("Scenes\n{}", display::scene_ratings_table(&ratings.scenes, top));

            if write_back {
                let targets: Vec<RatingTarget> = targets.into_iter().map(Into::into).collect();
                let writer = RatingWriter::new(&client, config.write_back.delay_ms).with_progress(true);
                let summary = ratings.write_back(&writer, &targets).await;
                println!(
                    "Ratings written: {} updated, {} failed",
                    summary.updated, summary.failed
                );
            }
        }

        Command::Fill {
            budget,
            tags,
            smart_fill,
            copy_to,
        } => {
            let client = connect(&config)?;
            let scenes = if tags.is_empty() {
                let selection = fill_space(&client, budget, &[]).await.context("Fill failed")?;
                println!(
                    "Candidate pool: {} scenes, {}",
                    selection.pool_size,
                    display::format_size(selection.pool_bytes)
                );
                selection.scenes
            } else {
                let plan = plan_copy(&client, &tags, budget, smart_fill)
                    .await
                    .context("Copy planning failed")?;
                println!(
                    "Base selection: {} scenes, {} left of {}",
                    plan.base.len(),
                    display::format_size(plan.remaining),
                    display::format_size(plan.budget)
                );
                plan.scenes().cloned().collect()
            };

            println!("{}", display::scene_list_table(&scenes));

            if let Some(dest) = copy_to {
                let mapper = PathMapper::from_config(&config)?;
                let outcomes = copy_scenes(&scenes, &dest, &mapper);
                let failed = outcomes
                    .iter()
                    .filter(|o| matches!(o, CopyOutcome::Failed { .. }))
                    .count();
                println!(
                    "Copied to {}: {} scenes, {} failed",
                    dest.display(),
                    outcomes.len() - failed,
                    failed
                );
            }
        }

        Command::Organize {
            structure,
            template,
            require_male,
            require_female,
            has_date,
            has_details,
            has_tags,
            has_performers,
            organized,
            dry_run,
        } => {
            let defaults = config.organize.clone().unwrap_or_default();
            let structure = structure
                .or(defaults.structure)
                .unwrap_or_else(|| DEFAULT_STRUCTURE.to_string());
            let template = template
                .or(defaults.template)
                .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string());

            let structure: FolderStructure = structure.parse().map_err(|e: String| anyhow!(e))?;
            let template = FilenameTemplate::parse(&template)
                .with_context(|| format!("Invalid template '{}'", template))?;

            let mut options = OrganizeOptions::new(structure, template);
            options.require_male = require_male;
            options.require_female = require_female;
            options.dry_run = dry_run;
            options.scene_filter = SceneFilter {
                has_date,
                has_details,
                has_tags,
                has_performers,
                organized_only: organized,
                ..SceneFilter::all()
            };

            let mapper = PathMapper::from_config(&config)?;
            let client = connect(&config)?;
            let report = organize_library(&client, &options, &mapper)
                .await
                .context("Organize failed")?;

            println!("{}", display::organize_table(&report));
            let s = report.summary;
            println!(
                "{}{} moved, {} already in place, {} failed, {} duplicates",
                if dry_run { "[dry run] " } else { "" },
                s.moved,
                s.skipped,
                s.failed,
                s.duplicates
            );
        }

        Command::CleanFolders {
            path,
            delete,
            include_important,
        } => {
            let folders = find_empty_folders(&path)?;
            if folders.is_empty() {
                println!("No empty folders under {}", path.display());
                return Ok(());
            }
            println!("{}", display::empty_folders_table(&folders));

            if delete {
                let summary = delete_folders(&folders, include_important);
                println!(
                    "Deleted {}, kept {}, failed {}",
                    summary.deleted, summary.skipped, summary.failed
                );
            } else {
                println!("{} empty folders found; rerun with --delete to remove them", folders.len());
            }
        }

        Command::Report { kind } => {
            let client = connect(&config)?;
            match kind {
                ReportKind::Studios { limit } => {
                    let report = load_studio_report(&client, limit).await?;
                    println!("By total engagement\n{}", display::studio_stats_table(&report.by_total));
                    println!("By engagement percent\n{}", display::studio_stats_table(&report.by_percent));
                    println!(
                        "Cleanup candidates\n{}",
                        display::studio_stats_table(&report.cleanup_candidates)
                    );
                }
                ReportKind::Performers {
                    gender,
                    min_scenes,
                    top,
                } => {
                    let report = load_performer_report(&client, gender.into(), min_scenes, top).await?;
                    println!(
                        "{} of {} performers engaged ({:.1}%)",
                        report.engaged, report.total, report.engaged_percent
                    );
                    println!("{}", display::performer_report_table(&report));
                }
            }
        }

        Command::Init {
            url,
            api_key,
            data_root,
        } => {
            let path = resolver
                .resolve()
                .ok_or_else(|| anyhow!("Could not determine config path; pass --config"))?;
            if path.exists() {
                warn!("Overwriting existing config {}", path.display());
            }

            let mut new_config = config.clone();
            new_config.catalog.url = url;
            new_config.catalog.api_key = api_key;
            if data_root.is_some() {
                new_config.library.data_root = data_root;
            }
            if new_config.catalog.url.trim().is_empty() {
                bail!("Catalog URL must not be empty");
            }

            sck_common::config::write_toml_config(&new_config, &path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Config written to {}", path.display());
        }
    }

    Ok(())
}
