//! Job board watcher: command-line entrypoint.
//! Runs the fetch → diff → notify → persist pipeline once, or one of the
//! baseline maintenance commands, or the REST wrapper.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use job_board_watcher::api::{self, AppState};
use job_board_watcher::baseline::BaselineStore;
use job_board_watcher::config::RunSettings;
use job_board_watcher::ingest::config::{load_sources_default, load_sources_from, SourcesConfig};
use job_board_watcher::ingest::providers::{adapters_for, build_http_client};
use job_board_watcher::notify::notifier_from_env;
use job_board_watcher::pipeline::run_pipeline;

#[derive(Debug, Parser)]
#[command(name = "job-board-watcher", version, about = "Watch job boards for new postings")]
#[command(group(
    ArgGroup::new("op")
        .args(["company", "clear", "clear_company", "list_companies", "serve"])
        .multiple(false)
))]
struct Cli {
    /// Only report and email new postings matching this company
    #[arg(long, value_name = "NAME")]
    company: Option<String>,

    /// Reset the stored baseline to empty
    #[arg(long)]
    clear: bool,

    /// Drop one company's postings from the stored baseline
    #[arg(long, value_name = "NAME")]
    clear_company: Option<String>,

    /// List configured companies grouped by board type
    #[arg(long)]
    list_companies: bool,

    /// Serve the REST API on this address instead of running once
    #[arg(long, value_name = "ADDR")]
    serve: Option<SocketAddr>,

    /// Job sources document (JSON or TOML)
    #[arg(long, value_name = "PATH")]
    sources: Option<PathBuf>,

    /// Baseline file; overrides JOBS_DATA_FILE
    #[arg(long, value_name = "PATH")]
    data_file: Option<PathBuf>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("job_board_watcher=info,warn"));

    // LOG_FORMAT=json for CI log collectors; compact text otherwise.
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

fn load_sources(cli: &Cli) -> Result<SourcesConfig> {
    match &cli.sources {
        Some(p) => load_sources_from(p),
        None => load_sources_default(),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = RunSettings::from_env();
    let store = BaselineStore::new(cli.data_file.clone().unwrap_or(settings.data_file.clone()));

    if cli.clear {
        store.clear().await?;
        println!("Cleared all jobs from {}.", store.path().display());
        return Ok(());
    }
    if let Some(company) = &cli.clear_company {
        let removed = store.clear_for_company(company).await?;
        println!(
            "Cleared {removed} jobs for company '{company}' from {}.",
            store.path().display()
        );
        return Ok(());
    }

    let sources = load_sources(&cli).context("loading job sources")?;
    if sources.is_empty() {
        tracing::warn!("job sources document lists no sources");
    }

    if cli.list_companies {
        for line in sources.companies()?.lines() {
            println!("{line}");
        }
        return Ok(());
    }

    let client = build_http_client()?;
    let adapters = adapters_for(sources.sources()?, &client);
    let notifier = notifier_from_env();
    let opts = settings.fetch_options();

    if let Some(addr) = cli.serve {
        let state = AppState::new(sources.companies()?, adapters, store, notifier, opts);
        return api::serve(addr, state).await;
    }

    let report = run_pipeline(&adapters, &store, notifier.as_ref(), &opts, cli.company.as_deref()).await;
    for line in report.summary_lines() {
        println!("{line}");
    }
    for failed in report.failed_sources() {
        println!("! {} ({}) contributed nothing: {}", failed.name, failed.kind, failed.status);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env locally; CI provides the secrets directly.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
