use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod access;
mod api;
mod config;
mod db;
mod metrics;
mod models;
mod report;
mod source;

use access::UserType;
use config::AppConfig;
use models::Snapshot;
use report::ReportFormat;
use source::SourceKind;

#[derive(Parser)]
#[command(name = "recruiter-dashboard")]
#[command(about = "Recruiter analytics dashboard for the job portal", long_about = None)]
struct Cli {
    /// Role of the caller; overrides PORTAL_USER_TYPE
    #[arg(long, global = true)]
    user_type: Option<UserType>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load demo jobs, applicants and applications
    Seed,
    /// Import jobs, applicants or applications from a CSV file
    Import {
        #[arg(long, value_enum)]
        kind: db::ImportKind,
        #[arg(long)]
        csv: PathBuf,
    },
    /// Print dashboard stats and chart series
    Summary {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Write the dashboard as a markdown or JSON report
    Report {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long, value_enum, default_value_t = ReportFormat::Markdown)]
        format: ReportFormat,
        #[arg(long, default_value = "dashboard.md")]
        out: PathBuf,
    },
}

#[derive(Args)]
struct SourceArgs {
    #[arg(long, value_enum, default_value_t = SourceKind::Api)]
    source: SourceKind,
    /// Snapshot JSON for `--source file`
    #[arg(long, required_if_eq("source", "file"))]
    snapshot: Option<PathBuf>,
    /// Reference instant for the time buckets (defaults to now)
    #[arg(long, value_parser = parse_now)]
    now: Option<DateTime<Utc>>,
}

fn parse_now(raw: &str) -> Result<DateTime<Utc>, String> {
    models::parse_timestamp(raw)
        .ok_or_else(|| format!("expected an RFC 3339 timestamp or YYYY-MM-DD date, got {raw:?}"))
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

async fn load_snapshot(config: &AppConfig, args: &SourceArgs) -> anyhow::Result<Snapshot> {
    match args.source {
        SourceKind::Api => {
            let client = api::ApiClient::new(
                &config.api_url,
                config.api_token.clone(),
                config.request_timeout(),
            )?;
            Ok(source::from_api(&client).await)
        }
        SourceKind::Db => {
            let pool = db::connect(config).await?;
            Ok(source::from_db(&pool).await)
        }
        SourceKind::File => {
            let path = args
                .snapshot
                .as_deref()
                .context("--snapshot is required with --source file")?;
            source::from_file(path)
        }
    }
}

async fn dashboard(
    config: &AppConfig,
    user_type: UserType,
    args: &SourceArgs,
) -> anyhow::Result<(models::DashboardMetrics, DateTime<Utc>)> {
    access::ensure_recruiter(user_type).context("Access Denied")?;

    let snapshot = load_snapshot(config, args).await?;
    let now = args.now.unwrap_or_else(Utc::now);
    debug!(%now, "aggregating dashboard metrics");

    let metrics = metrics::aggregate(
        &snapshot.jobs,
        &snapshot.applicants,
        &snapshot.applications,
        now,
    );
    Ok((metrics, now))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = config::load_app_config(cli.user_type).context("invalid configuration")?;
    init_logging(&config.log_level);
    debug!(?config, "configuration loaded");

    let user_type = config.user_type;

    match cli.command {
        Commands::InitDb => {
            let pool = db::connect(&config).await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = db::connect(&config).await?;
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { kind, csv } => {
            let pool = db::connect(&config).await?;
            let inserted = db::import_csv(&pool, kind, &csv).await?;
            println!("Inserted {inserted} rows from {}.", csv.display());
        }
        Commands::Summary { source } => {
            let (metrics, _) = dashboard(&config, user_type, &source).await?;
            print!("{}", report::render_summary(&metrics));
        }
        Commands::Report {
            source,
            format,
            out,
        } => {
            let (metrics, now) = dashboard(&config, user_type, &source).await?;
            let rendered = match format {
                ReportFormat::Markdown => {
                    report::build_report(&metrics, now, source.source.name())
                }
                ReportFormat::Json => report::to_json(&metrics)?,
            };
            std::fs::write(&out, rendered)
                .with_context(|| format!("failed to write {}", out.display()))?;
            info!(path = %out.display(), "report written");
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
