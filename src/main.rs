use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;
use tracing_subscriber::EnvFilter;

use cohort_progress::checkins::checkin_heatmap;
use cohort_progress::config::{DEFAULT_CONTAINER_DEPTH, DEFAULT_ROW_DEPTH};
use cohort_progress::dates::today_local;
use cohort_progress::export::{self, ExportKind};
use cohort_progress::ingest::resolve_format;
use cohort_progress::payload::{payload_metadata, PayloadMetadata};
use cohort_progress::{db, report, stats};
use cohort_progress::{parse_input, ExtractionConfig, InputFormat, ParseOutcome, Student};

#[derive(Parser)]
#[command(name = "cohort-progress")]
#[command(about = "Coding camp cohort progress extraction and analytics", long_about = None)]
struct Cli {
    /// Levels to climb from a student name to its card container
    #[arg(long, global = true, env = "COHORT_CONTAINER_DEPTH", default_value_t = DEFAULT_CONTAINER_DEPTH)]
    container_depth: usize,
    /// Levels to climb from a progress bar to its course row
    #[arg(long, global = true, env = "COHORT_ROW_DEPTH", default_value_t = DEFAULT_ROW_DEPTH)]
    row_depth: usize,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Scraped page or JSON export
    #[arg(long)]
    input: PathBuf,
    #[arg(long, value_enum, default_value_t = InputFormat::Auto)]
    format: InputFormat,
    /// Reference date for relative dates and the heatmap window (defaults to today)
    #[arg(long)]
    today: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize an input into the student envelope
    Parse {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print cohort statistics as JSON
    Stats {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Print the check-in heatmap as JSON
    Heatmap {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Export one aggregate as CSV
    Export {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, value_enum)]
        kind: ExportKind,
        #[arg(long)]
        out: PathBuf,
    },
    /// Create or upgrade the database schema
    InitDb,
    /// Store a normalized snapshot
    Store {
        #[command(flatten)]
        input: InputArgs,
        /// Group or class the snapshot belongs to
        #[arg(long)]
        label: Option<String>,
    },
    /// Print the most recent stored snapshot as the student envelope
    Latest {
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List stored snapshots
    History {
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },
}

struct Loaded {
    students: Vec<Student>,
    metadata: Option<PayloadMetadata>,
    format: InputFormat,
    today: NaiveDate,
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn load(args: &InputArgs, config: &ExtractionConfig) -> anyhow::Result<Loaded> {
    let text = read_input(&args.input)?;
    let format = resolve_format(&text, args.format);
    let students = parse_input(&text, format, config)
        .with_context(|| format!("failed to parse {}", args.input.display()))?;
    let metadata = match format {
        InputFormat::Json => serde_json::from_str(&text).ok().map(|v| payload_metadata(&v)),
        _ => None,
    };
    info!(
        students = students.len(),
        format = format.as_str(),
        "loaded snapshot"
    );
    Ok(Loaded {
        students,
        metadata,
        format,
        today: args.today.unwrap_or_else(today_local),
    })
}

fn write_output(out: Option<&Path>, body: &str) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, body)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Written to {}.", path.display());
        }
        None => println!("{body}"),
    }
    Ok(())
}

async fn connect() -> anyhow::Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;
    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ExtractionConfig {
        container_depth: cli.container_depth,
        row_depth: cli.row_depth,
    };

    match cli.command {
        Commands::Parse { input, out } => {
            let text = read_input(&input.input)?;
            let outcome = ParseOutcome::from(parse_input(&text, input.format, &config));
            let body = serde_json::to_string_pretty(&outcome)?;
            write_output(out.as_deref(), &body)?;
            if !outcome.is_success() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Stats { input } => {
            let loaded = load(&input, &config)?;
            let cohort = stats::cohort_stats(&loaded.students, loaded.today);
            println!("{}", serde_json::to_string_pretty(&cohort)?);
        }
        Commands::Heatmap { input } => {
            let loaded = load(&input, &config)?;
            let heatmap = checkin_heatmap(&loaded.students, loaded.today);
            println!("{}", serde_json::to_string_pretty(&heatmap)?);
        }
        Commands::Report { input, out, limit } => {
            let loaded = load(&input, &config)?;
            let report = report::build_report(
                &loaded.students,
                loaded.metadata.as_ref(),
                loaded.today,
                limit,
            );
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export { input, kind, out } => {
            let loaded = load(&input, &config)?;
            let rows = export::export_to_path(&out, kind, &loaded.students, loaded.today)?;
            println!("Exported {rows} rows to {}.", out.display());
        }
        Commands::InitDb => {
            let pool = connect().await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Store { input, label } => {
            let loaded = load(&input, &config)?;
            let label = label.or_else(|| {
                loaded
                    .metadata
                    .as_ref()
                    .and_then(|meta| meta.mentor_group.clone())
            });
            let pool = connect().await?;
            let id = db::save_snapshot(
                &pool,
                loaded.format.as_str(),
                label.as_deref(),
                &loaded.students,
            )
            .await?;
            println!("Stored snapshot {id} with {} students.", loaded.students.len());
        }
        Commands::Latest { label, out } => {
            let pool = connect().await?;
            match db::latest_snapshot(&pool, label.as_deref()).await? {
                Some((summary, students)) => {
                    info!(id = %summary.id, captured_at = %summary.captured_at, "loaded stored snapshot");
                    let outcome = ParseOutcome::from(Ok(students));
                    write_output(out.as_deref(), &serde_json::to_string_pretty(&outcome)?)?;
                }
                None => {
                    println!("No snapshots stored yet.");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Commands::History { limit } => {
            let pool = connect().await?;
            let snapshots = db::list_snapshots(&pool, limit).await?;
            if snapshots.is_empty() {
                println!("No snapshots stored yet.");
                return Ok(ExitCode::SUCCESS);
            }
            for snapshot in snapshots {
                println!(
                    "- {} {} ({}, {}) {} students",
                    snapshot.captured_at.format("%Y-%m-%d %H:%M"),
                    snapshot.id,
                    snapshot.label.as_deref().unwrap_or("unlabelled"),
                    snapshot.source_kind,
                    snapshot.student_count
                );
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
