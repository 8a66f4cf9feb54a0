use std::path::PathBuf;

use anyhow::Context;
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod cache;
mod columns;
mod config;
mod filter;
mod leaderboard;
mod metrics;
mod models;
mod names;
mod report;
mod rolling;
mod source;
mod status;
mod table;
mod units;

use cache::{unique_offices, OfficeCache, DEFAULT_TTL_SECS};
use config::Settings;
use leaderboard::Ranking;
use models::OfficeScope;
use rolling::{DEFAULT_WINDOW, WEEK_TABS};
use source::Source;
use table::{DisplayTable, SortDirection, NO_OFFICE_DATA};

#[derive(Parser)]
#[command(name = "apex-metrics")]
#[command(about = "Sales status and rep metrics from the Apex tracking sheets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    settings: Settings,
}

#[derive(Subcommand)]
enum Commands {
    /// Unit counts and percentages per sale status
    Summary {
        #[arg(long, default_value = WEEK_TABS[0])]
        tab: String,
        /// Compare against this tab as the previous period
        #[arg(long)]
        previous: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Rank sales reps
    Leaderboard {
        #[arg(long, default_value = WEEK_TABS[0])]
        tab: String,
        #[arg(long, value_enum, default_value_t = Ranking::TotalSales)]
        ranking: Ranking,
        #[arg(long, default_value_t = report::TOP_REPS)]
        limit: usize,
        #[arg(long)]
        json: bool,
    },
    /// Print the office-scoped tracker table with a Units column
    Table {
        #[arg(long, default_value = WEEK_TABS[0])]
        tab: String,
        #[arg(long)]
        search: Option<String>,
        /// Header text of the column to sort by
        #[arg(long)]
        sort: Option<String>,
        #[arg(long, value_enum, default_value_t = SortDirection::Asc)]
        direction: SortDirection,
        #[arg(long)]
        csv: bool,
    },
    /// Average several weekly tabs, then summarize
    Rolling {
        #[arg(long, default_value = WEEK_TABS[0])]
        tab: String,
        #[arg(long, default_value_t = DEFAULT_WINDOW)]
        window: usize,
        #[arg(long)]
        json: bool,
    },
    /// List known offices
    Offices,
    /// Generate a markdown report
    Report {
        #[arg(long, default_value = WEEK_TABS[0])]
        tab: String,
        #[arg(long)]
        previous: Option<String>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Verify the configured spreadsheet is readable
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = cli.settings;
    let source = settings.source()?;
    let scope = settings.scope.clone();
    info!(source = %source.describe(), scope = %scope, "starting");

    match cli.command {
        Commands::Summary { tab, previous, json } => {
            check_scope(&settings, &source).await;
            let metrics = load_metrics(&source, &tab, &scope).await?;
            let baseline = match previous {
                Some(previous) => Some(load_metrics(&source, &previous, &scope).await?.breakdown),
                None => None,
            };
            let summary = metrics.breakdown.summary(baseline.as_ref());

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("Status mix for {} ({}):", tab, scope);
                print!("{}", report::render_summary(&summary));
            }
        }
        Commands::Leaderboard {
            tab,
            ranking,
            limit,
            json,
        } => {
            check_scope(&settings, &source).await;
            let metrics = load_metrics(&source, &tab, &scope).await?;
            let board = &metrics.leaderboard;

            if json {
                let body = serde_json::json!({
                    "ranking": ranking,
                    "rep_count": board.rep_count(),
                    "reps": board.top(ranking, limit),
                    "all_reps": board.reps(),
                    "highlight": board.highlight(ranking),
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                println!("Top reps by {} for {} ({}):", ranking.label(), tab, scope);
                print!("{}", report::render_leaderboard(board, ranking, limit));
            }
        }
        Commands::Table {
            tab,
            search,
            sort,
            direction,
            csv,
        } => {
            check_scope(&settings, &source).await;
            let sheet = source.fetch(&tab).await?;
            let columns = columns::ColumnIndex::resolve(sheet.headers());
            let mut view = DisplayTable::build(&sheet, &columns, &scope);
            if let Some(term) = search.as_deref() {
                view = view.search(term);
            }
            if let Some(name) = sort.as_deref() {
                let column = view
                    .column(name)
                    .with_context(|| format!("no column matching {name:?}"))?;
                view.sort_by(column, direction);
            }

            if view.is_empty() {
                println!("{NO_OFFICE_DATA}");
            } else if csv {
                view.write_csv(std::io::stdout().lock())?;
            } else {
                println!("{}", view.headers.join(" | "));
                for row in &view.rows {
                    println!("{}", row.join(" | "));
                }
                println!("Showing {} rows", view.rows.len());
            }
        }
        Commands::Rolling { tab, window, json } => {
            check_scope(&settings, &source).await;
            let averaged = rolling::rolling_average(&source, &tab, window).await?;
            let metrics = metrics::compute(&averaged, &scope);
            let summary = metrics.breakdown.summary(None);

            if json {
                let body = serde_json::json!({
                    "tabs": rolling::window_for(&tab, window),
                    "summary": summary,
                    "values": averaged.values,
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                println!(
                    "Rolling average over {} ({}):",
                    rolling::window_for(&tab, window).join(", "),
                    scope
                );
                print!("{}", report::render_summary(&summary));
            }
        }
        Commands::Offices => {
            let offices = cached_offices(&settings, &source).await?;
            if offices.is_empty() {
                println!("No offices found.");
            }
            for office in offices {
                println!("{office}");
            }
        }
        Commands::Report { tab, previous, out } => {
            check_scope(&settings, &source).await;
            let metrics = load_metrics(&source, &tab, &scope).await?;
            let baseline = match previous {
                Some(previous) => Some(load_metrics(&source, &previous, &scope).await?.breakdown),
                None => None,
            };
            let report = report::build_report(&tab, &metrics, baseline.as_ref(), Utc::now());
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Check => match &source {
            Source::Api(client) => {
                let rows = client
                    .check_access()
                    .await
                    .context("spreadsheet is not readable with the configured key")?;
                println!("Spreadsheet reachable ({rows} rows in A1:B2).");
            }
            Source::Directory(dir) => {
                let sheet = dir.fetch(WEEK_TABS[0])?;
                println!("{} readable ({} rows).", source.describe(), sheet.values.len());
            }
        },
    }

    Ok(())
}

async fn load_metrics(
    source: &Source,
    tab: &str,
    scope: &OfficeScope,
) -> anyhow::Result<metrics::SalesMetrics> {
    let sheet = source
        .fetch(tab)
        .await
        .with_context(|| format!("failed to load {tab}"))?;
    if sheet.is_empty() {
        warn!(tab, "sheet has no data rows");
    }
    Ok(metrics::compute(&sheet, scope))
}

async fn cached_offices(settings: &Settings, source: &Source) -> anyhow::Result<Vec<String>> {
    let path = settings.office_cache_path();
    let mut cache = OfficeCache::load(&path, Duration::seconds(DEFAULT_TTL_SECS));
    let offices = cache
        .get_or_refresh(Utc::now(), || async {
            let sheet = source.fetch(WEEK_TABS[0]).await?;
            Ok(unique_offices(&sheet))
        })
        .await
        .context("failed to load office list")?;

    if let Err(e) = cache.save(&path) {
        warn!(path = %path.display(), error = %e, "could not persist office cache");
    }
    Ok(offices)
}

/// Warns when a scoped office is not one the sheet knows about.
async fn check_scope(settings: &Settings, source: &Source) {
    let OfficeScope::Office(office) = &settings.scope else {
        return;
    };

    match cached_offices(settings, source).await {
        Ok(offices) if !offices.iter().any(|known| known == office) => {
            warn!(
                office = %office,
                known = offices.len(),
                "office scope matches no office in the sheet"
            );
        }
        Ok(_) => {}
        Err(e) => warn!(error = %e, "skipping office validation"),
    }
}
