//! persona-probe runner.
//!
//! Profiles an already-extracted corpus against an OpenAI-compatible
//! endpoint and prints the report as JSON on stdout.
//!
//! # Environment Variables
//!
//! - `PROBE_CORPUS`: path to a JSON array of text units (required)
//! - `PROBE_CONFIG`: path to a YAML configuration file (optional)
//! - `PROBE_MODEL`: model override
//! - `OPENAI_API_KEY`: API key for the provider
//! - `OPENAI_BASE_URL`: API root override
//! - `RUST_LOG`: Tracing filter (default: "info,persona_probe=debug")
//!
//! # Usage
//!
//! ```bash
//! PROBE_CORPUS=corpus.json cargo run --bin probe > report.json
//! ```
//!
//! Ctrl-C cancels at the next batch boundary.

use std::sync::Arc;

use anyhow::Context;
use persona_probe::context::ProbeContext;
use persona_probe::llms::OpenAICompletion;
use persona_probe::pipeline::{group_by_channel, ProfilePipeline};
use persona_probe::types::TextUnit;
use persona_probe::utilities::config::ProbeConfig;
use persona_probe::utilities::rpm_controller::RPMController;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,persona_probe=debug".into()),
        )
        .init();

    let config = match std::env::var("PROBE_CONFIG") {
        Ok(path) => ProbeConfig::from_file(&path)
            .with_context(|| format!("loading configuration from {}", path))?,
        Err(_) => ProbeConfig::default(),
    }
    .with_env_overrides();

    let corpus_path = std::env::var("PROBE_CORPUS").context("PROBE_CORPUS is not set")?;
    let raw = std::fs::read_to_string(&corpus_path)
        .with_context(|| format!("reading corpus {}", corpus_path))?;
    let units: Vec<TextUnit> =
        serde_json::from_str(&raw).with_context(|| format!("parsing corpus {}", corpus_path))?;
    let corpora = group_by_channel(units);
    tracing::info!(
        channels = corpora.len(),
        model = %config.reasoning.model,
        "starting profile run"
    );

    let llm = Arc::new(OpenAICompletion::new(
        config.reasoning.model.clone(),
        None,
        Some(config.reasoning.base_url.clone()),
    ));
    let pipeline = ProfilePipeline::from_config(&config, llm)?;
    let ctx = ProbeContext::new(Arc::new(RPMController::new(
        config.reasoning.max_concurrency,
        config.reasoning.max_rpm,
    )));

    let cancel = ctx.cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, stopping at the next batch boundary");
            cancel.cancel();
        }
    });

    let report = pipeline.run(&corpora, &ctx).await?;
    tracing::info!(
        requests = report.usage.successful_requests,
        retries = report.usage.retried_requests,
        defaulted = report.usage.defaulted_answers,
        "profile complete"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
