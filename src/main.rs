use clap::{Args, Parser, ValueEnum};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use opsboard::config::{DashboardConfig, SourceConfig};
use opsboard::dashboard::{run_dashboard, DashboardState};
use opsboard::jobs::{aggregate_by_status, Facet, FacetSelection, JobStatus};
use opsboard::shutdown::install_shutdown_handler;
use opsboard::source::JobSource;
use opsboard::view::{ChartView, FacetOptions};

#[derive(Parser, Debug)]
#[command(name = "opsboard")]
#[command(version)]
#[command(about = "Operations dashboard for cluster job queues")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Serve the web dashboard
    Serve(ServeArgs),

    /// Inspect the job table from the terminal
    Jobs {
        #[command(flatten)]
        source: SourceArgs,

        /// Output format
        #[arg(long, short = 'o', default_value = "table", global = true)]
        output: OutputFormat,

        #[command(subcommand)]
        command: JobCommands,
    },
}

// =============================================================================
// Shared Arguments
// =============================================================================

#[derive(Args, Debug)]
struct SourceArgs {
    /// JSON file holding an array of job rows
    #[arg(long, conflicts_with = "url", required_unless_present = "url")]
    file: Option<PathBuf>,

    /// HTTP endpoint returning an array of job rows
    #[arg(long)]
    url: Option<String>,

    /// Request timeout for --url, in seconds
    #[arg(long, default_value = "30")]
    timeout_secs: u64,
}

impl SourceArgs {
    fn config(&self) -> SourceConfig {
        match (&self.file, &self.url) {
            (Some(path), _) => SourceConfig::file(path.clone()),
            (None, Some(url)) => SourceConfig::Http {
                url: url.clone(),
                timeout: Duration::from_secs(self.timeout_secs),
            },
            // clap enforces one of the two
            (None, None) => SourceConfig::file("jobs.json"),
        }
    }
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// Only jobs of this project (repeat for several)
    #[arg(long)]
    project: Vec<String>,

    /// Only jobs of this processing type (repeat for several)
    #[arg(long)]
    proctype: Vec<String>,

    /// Only jobs of this user (repeat for several)
    #[arg(long)]
    user: Vec<String>,
}

impl FilterArgs {
    fn selection(&self) -> FacetSelection {
        FacetSelection::new()
            .with_projects(self.project.iter().cloned())
            .with_proctypes(self.proctype.iter().cloned())
            .with_users(self.user.iter().cloned())
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port for the web dashboard
    #[arg(long, default_value = "8050")]
    port: u16,

    #[command(flatten)]
    source: SourceArgs,

    /// Re-fetch cached job data older than this many seconds
    #[arg(long)]
    max_age_secs: Option<u64>,
}

// =============================================================================
// Job Commands
// =============================================================================

#[derive(clap::Subcommand, Debug)]
enum JobCommands {
    /// List job rows
    List {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Status counts grouped by a facet
    Summary {
        /// Facet to group by (project, proctype, user)
        #[arg(long, default_value = "project")]
        by: Facet,

        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Distinct values of every facet
    Options,
}

#[derive(Serialize)]
struct JobListOutput<'a> {
    jobs: Vec<&'a opsboard::jobs::JobRecord>,
    total_count: usize,
}

// =============================================================================
// Server Implementation
// =============================================================================

async fn run_server(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let listen_addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let mut config = DashboardConfig::new(listen_addr, args.source.config());
    if let Some(secs) = args.max_age_secs {
        config = config.with_cache_max_age(Duration::from_secs(secs));
    }

    tracing::info!(
        listen_addr = %config.listen_addr,
        source = ?config.source,
        cache_max_age = ?config.cache_max_age,
        "Starting opsboard"
    );

    let source = config.build_source()?;

    // Warm the cache so a broken source shows up at startup, not on first page load.
    if let Err(e) = source.load().await {
        tracing::warn!(error = %e, "Initial job data load failed");
    }

    let shutdown = install_shutdown_handler();
    run_dashboard(config.listen_addr, DashboardState::new(source), shutdown).await?;
    Ok(())
}

// =============================================================================
// Client Command Handlers
// =============================================================================

fn handle_list(
    source_table: &opsboard::jobs::JobTable,
    filters: &FilterArgs,
    output_format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let filtered = source_table.filter(&filters.selection());

    match output_format {
        OutputFormat::Json => {
            let output = JobListOutput {
                jobs: filtered.iter().collect(),
                total_count: source_table.len(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Table => {
            if filtered.is_empty() {
                println!("No jobs found.");
                return Ok(());
            }
            println!(
                "{:<40} {:<10} {:<20} {:<10} JOBID",
                "LABEL", "STATUS", "LASTMOD", "WALLTIME"
            );
            println!("{}", "-".repeat(92));
            for job in &filtered {
                println!(
                    "{:<40} {:<10} {:<20} {:<10} {}",
                    fit_label(&job.label, 40),
                    job.status.map(|s| s.as_str()).unwrap_or("-"),
                    job.lastmod,
                    job.walltime,
                    job.jobid
                );
            }
            println!();
            println!("Showing {} of {} jobs", filtered.len(), source_table.len());
        }
    }
    Ok(())
}

fn handle_summary(
    source_table: &opsboard::jobs::JobTable,
    facet: Facet,
    filters: &FilterArgs,
    output_format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let filtered = source_table.filter(&filters.selection());
    let breakdown = aggregate_by_status(&filtered, facet);

    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&ChartView::from(&breakdown))?
            );
        }
        OutputFormat::Table => {
            print!("{:<24}", facet.column());
            for status in JobStatus::ALL {
                print!(" {:>9}", status.as_str());
            }
            println!(" {:>9}", "NONE");
            println!("{}", "-".repeat(24 + 10 * (JobStatus::ALL.len() + 1)));

            for group in &breakdown.groups {
                print!("{:<24}", truncate(&group.group, 24));
                for (_, count) in group.counts.iter() {
                    print!(" {:>9}", count);
                }
                println!(" {:>9}", group.counts.unset());
            }

            println!();
            for status in JobStatus::ALL {
                print!("{}  ", breakdown.legend_label(status));
            }
            println!();
        }
    }
    Ok(())
}

fn handle_options(
    source_table: &opsboard::jobs::JobTable,
    output_format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = FacetOptions::from_table(source_table);

    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&options)?);
        }
        OutputFormat::Table => {
            println!("Projects:         {}", options.projects.join(", "));
            println!("Processing Types: {}", options.proctypes.join(", "));
            println!("Users:            {}", options.users.join(", "));
        }
    }
    Ok(())
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// Shorten `label` to `width` characters, marking the cut with `...`.
fn fit_label(label: &str, width: usize) -> String {
    if label.chars().count() > width {
        format!("{}...", truncate(label, width.saturating_sub(3)))
    } else {
        label.to_string()
    }
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Serve(serve_args) => {
            run_server(serve_args).await?;
        }
        Commands::Jobs {
            source,
            output,
            command,
        } => {
            let source: Arc<dyn JobSource> = source.config().build(None)?;
            let snapshot = source.load().await?;

            match command {
                JobCommands::List { filters } => {
                    handle_list(&snapshot.table, &filters, &output)?;
                }
                JobCommands::Summary { by, filters } => {
                    handle_summary(&snapshot.table, by, &filters, &output)?;
                }
                JobCommands::Options => {
                    handle_options(&snapshot.table, &output)?;
                }
            }
        }
    }

    Ok(())
}
