//! `bom-risk`: enrich a bill of materials with distributor data and score supply-chain risk.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]).
//! 2. Load config and credentials ([`config::load_config`]), start logging ([`logging`]).
//! 3. Pick one distributor ([`distributor::SelectionStrategy`]) and build its client.
//! 4. Spawn the [`pipeline`] worker: read the BOM ([`bom`]), look up each part,
//!    classify it ([`risk`]), search replacements for risky parts ([`replacement`]).
//! 5. Render progress events on the main task ([`progress`]).
//! 6. Publish the report through the requested sink ([`report`]).
//! 7. Exit `0`, `1` (fatal error or `--fail-on` threshold reached) or `130` (cancelled).

mod bom;
mod cli;
mod config;
mod distributor;
mod error;
mod logging;
mod models;
mod pipeline;
mod progress;
mod replacement;
mod report;
mod risk;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::task::JoinHandle;

use cli::{Cli, ReportFormat};
use config::{load_config, Config, MAX_CONCURRENCY};
use distributor::{connect, Distributor, FirstConfigured, Preferred, SelectionStrategy};
use error::Error;
use pipeline::{CancelToken, Pipeline};
use progress::{ProgressEvent, ProgressSender, Severity};
use report::html::HtmlSink;
use report::json::JsonSink;
use report::terminal::TerminalSink;
use report::ReportSink;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let cwd = std::env::current_dir()?;
    let mut config = load_config(&cwd, cli.config.as_deref())?;
    logging::init_logging(&config.logging)?;

    for name in config.credentials.unknown_names() {
        tracing::warn!(name, "ignoring credentials for unknown distributor");
    }
    if let Some(concurrency) = cli.concurrency {
        config.pipeline.concurrency = concurrency.clamp(1, MAX_CONCURRENCY);
    }

    let (progress_tx, progress_rx) = progress::channel();
    let renderer = tokio::spawn(progress::render(progress_rx, cli.quiet));

    // Configuration problems abort before the BOM is even opened
    let distributor = match select_distributor(&cli, &config) {
        Ok(distributor) => distributor,
        Err(err) => {
            report_fatal(progress_tx, renderer, err).await;
            std::process::exit(1);
        }
    };

    let bom = match tokio::fs::read(&cli.bom).await {
        Ok(bytes) => bytes,
        Err(err) => {
            report_fatal(progress_tx, renderer, Error::Io(err)).await;
            std::process::exit(1);
        }
    };

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    let sink = build_sink(&cli);
    let source_name = cli.bom.display().to_string();
    let pipeline = Pipeline::new(distributor, progress_tx)
        .with_concurrency(config.pipeline.concurrency)
        .with_cancel_token(cancel);
    let run_state = pipeline.subscribe();

    let worker = tokio::spawn(async move {
        pipeline
            .run(&source_name, bom.as_slice(), sink.as_ref())
            .await
    });

    let result = worker.await?;
    renderer.await?;
    tracing::debug!(state = ?*run_state.borrow(), "run finished");

    match result {
        Ok(report) => {
            if report.lines.iter().any(|l| cli.fail_on.trips(l.risk)) {
                std::process::exit(1);
            }
            Ok(())
        }
        Err(Error::Cancelled { .. }) => std::process::exit(130),
        Err(_) => std::process::exit(1),
    }
}

fn select_distributor(cli: &Cli, config: &Config) -> Result<Arc<dyn Distributor>, Error> {
    let strategy: Box<dyn SelectionStrategy> = match &cli.distributor {
        Some(arg) => Box::new(Preferred(arg.into())),
        None => Box::new(FirstConfigured),
    };

    let (kind, api_key) = strategy.select(&config.credentials)?;
    tracing::info!(distributor = %kind, "selected distributor");
    connect(kind, api_key, &config.client)
}

fn build_sink(cli: &Cli) -> Box<dyn ReportSink> {
    match cli.report {
        ReportFormat::Terminal => Box::new(TerminalSink {
            verbose: cli.verbose,
            quiet: cli.quiet,
        }),
        ReportFormat::Json => Box::new(JsonSink {
            output: cli.output.clone(),
        }),
        ReportFormat::Html => Box::new(HtmlSink {
            output: cli
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(report::html::DEFAULT_OUTPUT)),
        }),
    }
}

/// Report a fatal error on the progress stream and let the renderer flush.
async fn report_fatal(progress: ProgressSender, renderer: JoinHandle<()>, err: Error) {
    tracing::debug!(error = %err, "aborting");
    progress.send(ProgressEvent::new(Severity::Error, err.to_string()));
    drop(progress);
    let _ = renderer.await;
}
