//! Resolve URLs to structured page records from the command line.
//!
//! Prints one JSON document per URL on stdout, in argument order. Logs go to
//! stderr (filter with `RUST_LOG`).

mod config;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use futures::future::join_all;
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use web_intel::{
    CacheStore, FetchConfig, MemoryStore, ModelCredentials, OpenAiModel, PageRecord, Pipeline,
    PipelineConfig, ResolveError, SqliteStore, SynthesisConfig,
};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "web-intel")]
#[command(about = "Fetch, summarize, and cache what a web page is about")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve one or more URLs, computing any that are not cached yet
    Resolve(ResolveArgs),
}

#[derive(Args)]
struct ResolveArgs {
    /// URLs to resolve
    #[arg(required = true)]
    urls: Vec<String>,

    /// Persist records in this SQLite file (created if missing)
    #[arg(long, value_name = "PATH")]
    sqlite: Option<PathBuf>,

    /// Model identifier [env: WEB_INTEL_MODEL]
    #[arg(long)]
    model: Option<String>,

    /// Fetch timeout in seconds [env: WEB_INTEL_FETCH_TIMEOUT_SECS]
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    fetch_timeout: Option<u64>,

    /// User-Agent header for page fetches
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Redirect hops to follow per fetch
    #[arg(long, value_name = "N")]
    max_redirects: Option<usize>,

    /// Model call timeout in seconds [env: WEB_INTEL_SYNTHESIS_TIMEOUT_SECS]
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    synthesis_timeout: Option<u64>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,web_intel=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve(args) => resolve(args).await,
    }
}

/// Merge flags over environment settings.
fn pipeline_config(args: &ResolveArgs, config: &Config) -> PipelineConfig {
    let mut fetch = FetchConfig::default();
    if let Some(timeout) = args.fetch_timeout.map(Duration::from_secs).or(config.fetch_timeout) {
        fetch = fetch.with_timeout(timeout);
    }
    if let Some(user_agent) = &args.user_agent {
        fetch = fetch.with_user_agent(user_agent.as_str());
    }
    if let Some(max) = args.max_redirects {
        fetch = fetch.with_max_redirects(max);
    }

    let mut synthesis = SynthesisConfig::default();
    if let Some(model) = args.model.clone().or_else(|| config.model.clone()) {
        synthesis = synthesis.with_model(model);
    }
    if let Some(timeout) = args
        .synthesis_timeout
        .map(Duration::from_secs)
        .or(config.synthesis_timeout)
    {
        synthesis = synthesis.with_timeout(timeout);
    }

    PipelineConfig::new().with_fetch(fetch).with_synthesis(synthesis)
}

async fn resolve(args: ResolveArgs) -> Result<ExitCode> {
    let config = Config::from_env()?;
    let pipeline_config = pipeline_config(&args, &config);

    let mut credentials = ModelCredentials::new(config.openai_api_key.clone())?;
    if let Some(url) = &config.openai_base_url {
        credentials = credentials.with_base_url(url);
    }
    let model = OpenAiModel::new(credentials).with_timeout(pipeline_config.synthesis.timeout);

    tracing::info!(
        urls = args.urls.len(),
        model = %pipeline_config.synthesis.params.model,
        "Resolving"
    );

    let sqlite = match (&args.sqlite, &config.database_url) {
        (Some(path), _) => Some(
            SqliteStore::open(path)
                .await
                .with_context(|| format!("Failed to open SQLite cache at {}", path.display()))?,
        ),
        (None, Some(url)) => Some(
            SqliteStore::new(url)
                .await
                .context("Failed to connect to WEB_INTEL_DATABASE_URL")?,
        ),
        (None, None) => None,
    };

    let all_ok = match sqlite {
        Some(store) => {
            let pipeline = Pipeline::from_config(store, model, pipeline_config)?;
            let ok = resolve_all(&pipeline, &args.urls, args.pretty).await;
            pipeline.store().close().await;
            ok
        }
        None => {
            let pipeline = Pipeline::from_config(MemoryStore::new(), model, pipeline_config)?;
            resolve_all(&pipeline, &args.urls, args.pretty).await
        }
    };

    Ok(if all_ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Resolve every URL concurrently and print results in input order.
///
/// Returns false if any resolution failed.
async fn resolve_all<S>(
    pipeline: &Pipeline<S, web_intel::HttpFetcher, OpenAiModel>,
    urls: &[String],
    pretty: bool,
) -> bool
where
    S: CacheStore + 'static,
{
    let results = join_all(urls.iter().map(|url| pipeline.resolve(url))).await;

    let mut all_ok = true;
    for (url, result) in urls.iter().zip(results) {
        all_ok &= result.is_ok();
        let output = render(url, result);
        let line = if pretty {
            serde_json::to_string_pretty(&output)
        } else {
            serde_json::to_string(&output)
        };
        match line {
            Ok(line) => println!("{}", line),
            Err(e) => {
                tracing::error!(url = %url, error = %e, "Failed to serialize output");
                all_ok = false;
            }
        }
    }
    all_ok
}

fn render(input: &str, result: Result<PageRecord, ResolveError>) -> serde_json::Value {
    match result {
        Ok(record) => json!(record),
        Err(e) => json!({
            "url": input,
            "error": e.to_string(),
            "kind": e.kind(),
            "stage": e.stage(),
        }),
    }
}
