use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

mod aggregate;
mod catalog;
mod config;
mod db;
mod error;
mod filter;
mod models;
mod provider;
mod report;
mod stats;
mod tier;

use crate::config::Settings;
use crate::filter::{ResponseFilter, RoleSet};
use crate::models::{LeaderAverage, ResponseRecord};
use crate::provider::{MemoryRowProvider, PgRowProvider, RowProvider};
use crate::tier::{Tier, TierSummary};

#[derive(Parser)]
#[command(name = "leadership-pulse")]
#[command(about = "Leadership pulse survey analytics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct SourceArgs {
    /// Read responses from a CSV export instead of Postgres
    #[arg(long, value_name = "FILE")]
    csv: Option<PathBuf>,
}

#[derive(Args, Clone)]
struct FilterArgs {
    /// Survey period, e.g. 2025-Q2
    #[arg(long)]
    period: Option<String>,
    /// Id of the rated leader
    #[arg(long)]
    target: Option<String>,
}

impl FilterArgs {
    fn to_filter(&self) -> ResponseFilter {
        ResponseFilter::new(self.period.clone(), self.target.clone())
    }
}

#[derive(Args, Clone)]
struct ViewArgs {
    #[command(flatten)]
    source: SourceArgs,
    #[command(flatten)]
    filter: FilterArgs,
    /// Print JSON instead of a text table
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import responses from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Average score per survey period
    Trend {
        #[command(flatten)]
        view: ViewArgs,
        /// Comma-separated rater roles: self, manager, peer, others or all
        #[arg(long, default_value = "others")]
        roles: RoleSet,
    },
    /// Average score per question
    Questions {
        #[command(flatten)]
        view: ViewArgs,
        /// Comma-separated rater roles: self, manager, peer, others or all
        #[arg(long, default_value = "others")]
        roles: RoleSet,
    },
    /// Histogram of answered scores
    Distribution {
        #[command(flatten)]
        view: ViewArgs,
        /// Comma-separated rater roles: self, manager, peer, others or all
        #[arg(long, default_value = "others")]
        roles: RoleSet,
    },
    /// Self, manager and peer averages per question
    Compare {
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Leader performance tiers per period
    Tiers {
        #[command(flatten)]
        view: ViewArgs,
        /// Comma-separated rater roles: self, manager, peer, others or all
        #[arg(long, default_value = "others")]
        roles: RoleSet,
        /// List the leaders in one tier (top, high, mid, low)
        #[arg(long)]
        tier: Option<Tier>,
    },
    /// Headline figures per period
    Summary {
        #[command(flatten)]
        view: ViewArgs,
        /// Comma-separated rater roles: self, manager, peer, others or all
        #[arg(long, default_value = "others")]
        roles: RoleSet,
    },
    /// List the survey periods on record
    Periods {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long)]
        json: bool,
    },
    /// List the rated leaders on record
    Targets {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        filter: FilterArgs,
        /// Comma-separated rater roles: self, manager, peer, others or all
        #[arg(long, default_value = "others")]
        roles: RoleSet,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[derive(Serialize)]
struct TierPeriodView<'a> {
    period: String,
    tiers: Vec<TierSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    members: Option<&'a [LeaderAverage]>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let settings = Settings::from_env()?;
    let _log_guard = init_tracing(&settings);

    match cli.command {
        Commands::InitDb => {
            let pool = connect(&settings).await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect(&settings).await?;
            let inserted = db::seed(&pool).await?;
            println!("Seed data inserted ({inserted} new responses).");
        }
        Commands::Import { csv } => {
            let pool = connect(&settings).await?;
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} responses from {}.", csv.display());
        }
        Commands::Trend { view, roles } => {
            let (rows, filter) = load(&settings, &view.source, &view.filter).await?;
            let series = aggregate::time_series(&rows, &filter, roles);
            if view.json {
                print_json(&series)?;
            } else if series.is_empty() {
                println!("No responses found for {}.", filter.describe());
            } else {
                for point in &series {
                    println!("{}  {:.2}", point.period, point.average_score);
                }
            }
        }
        Commands::Questions { view, roles } => {
            let (rows, filter) = load(&settings, &view.source, &view.filter).await?;
            let scores = aggregate::question_scores(&rows, &filter, roles);
            if view.json {
                print_json(&scores)?;
            } else if scores.is_empty() {
                println!("No responses found for {}.", filter.describe());
            } else {
                for score in &scores {
                    println!(
                        "Q{:<3} {:.2}  {}",
                        score.question_no, score.average_score, score.question_text
                    );
                }
            }
        }
        Commands::Distribution { view, roles } => {
            let (rows, filter) = load(&settings, &view.source, &view.filter).await?;
            let buckets = aggregate::distribution(&rows, &filter, roles);
            if view.json {
                print_json(&buckets)?;
            } else {
                for bucket in &buckets {
                    println!("{:<16} {}", bucket.label, bucket.count);
                }
            }
        }
        Commands::Compare { view } => {
            let (rows, filter) = load(&settings, &view.source, &view.filter).await?;
            let table = aggregate::comparison(&rows, &filter);
            if view.json {
                print_json(&table)?;
            } else if table.is_empty() {
                println!("No responses found for {}.", filter.describe());
            } else {
                println!("{:<5} {:>6} {:>8} {:>6}", "Q", "self", "manager", "peers");
                for row in &table {
                    println!(
                        "Q{:<4} {:>6.2} {:>8.2} {:>6.2}  {}",
                        row.question_no,
                        row.self_avg,
                        row.manager_avg,
                        row.peer_avg,
                        row.question_text
                    );
                }
            }
        }
        Commands::Tiers {
            view,
            roles,
            tier: drill_down,
        } => {
            let (rows, filter) = load(&settings, &view.source, &view.filter).await?;
            let by_period = tier::classify_by_period(&rows, &filter, roles);

            if view.json {
                let views: Vec<TierPeriodView> = by_period
                    .iter()
                    .map(|(period, classification)| TierPeriodView {
                        period: period.to_string(),
                        tiers: classification.summary(),
                        members: drill_down.map(|t| classification.members_of(t)),
                    })
                    .collect();
                print_json(&views)?;
            } else if by_period.is_empty() {
                println!("No leaders rated for {}.", filter.describe());
            } else {
                for (period, classification) in &by_period {
                    println!("{period} ({} leaders)", classification.total());
                    for row in classification.summary() {
                        println!("  {:<14} {:>3} ({})", row.label, row.count, row.percent);
                    }
                    if let Some(t) = drill_down {
                        for member in classification.members_of(t) {
                            println!(
                                "    - {} ({}) {:.2}",
                                member.target_name, member.target_id, member.average_score
                            );
                        }
                    }
                }
            }
        }
        Commands::Summary { view, roles } => {
            let (rows, filter) = load(&settings, &view.source, &view.filter).await?;
            let summaries = aggregate::period_summaries(&rows, &filter, roles);
            if view.json {
                print_json(&summaries)?;
            } else if summaries.is_empty() {
                println!("No responses found for {}.", filter.describe());
            } else {
                for summary in &summaries {
                    println!(
                        "{}  avg {:.2}  leaders {}  respondents {}  responses {}",
                        summary.period,
                        summary.average_score,
                        summary.leader_count,
                        summary.respondent_count,
                        summary.response_count
                    );
                }
            }
        }
        Commands::Periods { source, json } => {
            let rows = fetch(&settings, &source, &ResponseFilter::all()).await?;
            let periods: Vec<String> = catalog::distinct_periods(&rows)
                .iter()
                .map(ToString::to_string)
                .collect();
            if json {
                print_json(&periods)?;
            } else {
                for period in &periods {
                    println!("{period}");
                }
            }
        }
        Commands::Targets { source, json } => {
            let rows = fetch(&settings, &source, &ResponseFilter::all()).await?;
            let targets = catalog::distinct_targets(&rows);
            if json {
                print_json(&targets)?;
            } else {
                for target in &targets {
                    println!("{}  {}", target.target_id, target.target_name);
                }
            }
        }
        Commands::Report {
            source,
            filter,
            roles,
            out,
        } => {
            let (rows, filter) = load(&settings, &source, &filter).await?;
            let report = report::build_report(&rows, &filter, roles, chrono::Utc::now());
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

/// Colored stderr output plus a daily-rolling JSON log file.
fn init_tracing(settings: &Settings) -> WorkerGuard {
    let log_path = Path::new(&settings.log_file_path);
    let log_dir = log_path.parent().unwrap_or(Path::new("logs"));
    let log_file_name = log_path
        .file_name()
        .unwrap_or(OsStr::new("leadership_pulse.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        );

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(
            EnvFilter::try_from_env("RUST_LOG_JSON").unwrap_or_else(|_| EnvFilter::new("debug")),
        );

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    guard
}

async fn connect(settings: &Settings) -> anyhow::Result<PgPool> {
    let database_url = settings.require_database_url()?;
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")
}

async fn open_provider(
    settings: &Settings,
    source: &SourceArgs,
) -> anyhow::Result<Box<dyn RowProvider>> {
    match &source.csv {
        Some(path) => {
            info!(path = %path.display(), "Reading responses from CSV");
            Ok(Box::new(MemoryRowProvider::from_csv(path)?))
        }
        None => Ok(Box::new(PgRowProvider::new(connect(settings).await?))),
    }
}

#[tracing::instrument(skip(settings, source, filter), fields(period = ?filter.period, target = ?filter.target_id))]
async fn fetch(
    settings: &Settings,
    source: &SourceArgs,
    filter: &ResponseFilter,
) -> anyhow::Result<Vec<ResponseRecord>> {
    let provider = open_provider(settings, source).await?;
    let rows = provider
        .fetch_rows(filter)
        .await
        .context("failed to load survey responses")?;
    if rows.is_empty() {
        warn!("No responses matched the selection");
    }
    Ok(rows)
}

async fn load(
    settings: &Settings,
    source: &SourceArgs,
    filter: &FilterArgs,
) -> anyhow::Result<(Vec<ResponseRecord>, ResponseFilter)> {
    let filter = filter.to_filter();
    let rows = fetch(settings, source, &filter).await?;
    Ok((rows, filter))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
