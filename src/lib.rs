pub mod backend;
pub mod config;
pub mod model;
pub mod paginate;
pub mod render;
pub mod search;
pub mod shell;
pub mod store;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;

use backend::BackendClient;
use config::ShellConfig;
use model::ExportFormat;

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(
    name = "ecart",
    version,
    about = "Desktop shell for spreadsheet comparison reports"
)]
pub struct Cli {
    /// Attach to an already-running backend instead of launching one
    #[arg(long, env = "ECART_BACKEND_URL")]
    pub backend_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the backend and keep the session up until interrupted
    Shell,
    /// Probe a running backend once and report its status
    Health,
    /// Download a saved comparison report (or the schedule analysis)
    Export {
        /// Output format
        #[arg(long, default_value = "excel")]
        format: ExportFormat,

        /// Output directory (defaults to the platform download dir)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Export the schedule analysis instead of a comparison report
        #[arg(long, default_value_t = false)]
        analysis: bool,

        /// Saved report id to export (defaults to the most recent)
        #[arg(long)]
        report: Option<String>,
    },
    /// List previously saved reports
    Reports,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ShellConfig::from_env();
    if cli.backend_url.is_some() {
        config.backend_url = cli
            .backend_url
            .map(|url| url.trim_end_matches('/').to_string());
    }

    match cli.command {
        Commands::Shell => run_shell(config).await,
        Commands::Health => run_health(&config).await,
        Commands::Export {
            format,
            out,
            analysis,
            report,
        } => run_export(&config, format, out, analysis, report).await,
        Commands::Reports => run_reports(&config).await,
    }
}

async fn run_shell(config: ShellConfig) -> Result<()> {
    let mut shell = shell::Shell::new(config);
    shell.start().await.context("starting backend session")?;
    info!("session ready; press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    shell.shutdown().await;
    Ok(())
}

async fn run_health(config: &ShellConfig) -> Result<()> {
    let client = attached_client(config)?;
    client.health().await.context("backend health probe")?;
    println!("backend at {} is healthy", client.base_url());
    Ok(())
}

async fn run_export(
    config: &ShellConfig,
    format: ExportFormat,
    out: Option<PathBuf>,
    analysis: bool,
    report: Option<String>,
) -> Result<()> {
    let client = attached_client(config)?;
    let kind = if analysis { "analyse" } else { "rapport" };
    let stem = format!(
        "ecart_{kind}_{}",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );

    let bytes = if analysis {
        client
            .export_analysis(format, &stem, &serde_json::json!({}))
            .await?
    } else {
        let report_id = match report {
            Some(id) => id,
            None => client
                .reports()
                .await?
                .last()
                .map(|r| r.id.clone())
                .context("no saved reports to export")?,
        };
        client.export_report(&report_id, format, &stem).await?
    };

    let dir = out.or_else(download_dir).unwrap_or_else(|| PathBuf::from("."));
    let path = shell::write_export(&dir, &stem, format, &bytes).await?;
    println!("{}", path.display());
    Ok(())
}

async fn run_reports(config: &ShellConfig) -> Result<()> {
    let client = attached_client(config)?;
    let reports = client.reports().await?;
    if reports.is_empty() {
        println!("no saved reports");
        return Ok(());
    }
    for report in reports {
        println!(
            "{}  {}  {} vs {} fichier(s)  {} différence(s)  {}",
            report.id,
            report.date,
            report.base_file,
            report.comparison_files.len(),
            report.differences,
            report.match_rate
        );
    }
    Ok(())
}

/// Client for subcommands that require an already-running backend.
fn attached_client(config: &ShellConfig) -> Result<BackendClient> {
    let Some(url) = config.backend_url.as_deref() else {
        bail!("no backend URL configured; set ECART_BACKEND_URL or pass --backend-url");
    };
    Ok(BackendClient::new(url)?)
}

fn download_dir() -> Option<PathBuf> {
    directories::UserDirs::new()
        .and_then(|dirs| dirs.download_dir().map(|d| d.to_path_buf()))
}
