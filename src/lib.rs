//! # guild-export
//!
//! Concurrent exporter for the message history of a Discord guild.
//!
//! Every text and announcement channel of the guild is walked page by page,
//! newest message first, by a fixed pool of workers. Each exported message
//! becomes one line of a delimited file with the columns `author`,
//! `textContent` and `id`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use guild_export::{Config, DiscordClient, Exporter, ProgressReporter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config.json")?;
//!     let client = DiscordClient::new(&config.token, &config.api)?;
//!     let reporter = Arc::new(ProgressReporter::stdout(config.concurrent_channels));
//!
//!     let exporter = Exporter::with_client(config, client);
//!     let summary = exporter.run(reporter).await?;
//!     println!("exported {} messages", summary.totals.exported);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Discord REST API client
pub mod client;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Queue, paginator and worker pool
pub mod export;
/// Terminal progress display
pub mod progress;
/// Retry logic with exponential backoff
pub mod retry;
/// Delimited output writer
pub mod sink;
/// Core domain types
pub mod types;

use std::sync::Arc;

// Re-export commonly used types
pub use client::{DiscordClient, MessageSource, MetadataSource};
pub use config::{ApiConfig, Config, RetryConfig};
pub use error::{Error, Result};
pub use export::{ExportOptions, Exporter};
pub use progress::{ProgressReporter, RenderMode};
pub use sink::Sink;
pub use types::{
    Author, Channel, ChannelKind, ChannelStats, ExportRecord, ExportSummary, Guild, Message,
};

/// How an export run ended
#[derive(Debug)]
pub enum RunOutcome {
    /// Every channel was exported
    Completed(ExportSummary),
    /// A termination signal arrived first; in-flight workers were cancelled
    Interrupted,
}

/// Run an export, cancelling it when a termination signal arrives.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// Records already written stay in the output file; the sink flushes every
/// record as it is written.
pub async fn run_with_shutdown(
    exporter: &Exporter,
    reporter: Arc<ProgressReporter>,
) -> Result<RunOutcome> {
    tokio::select! {
        result = exporter.run(reporter) => result.map(RunOutcome::Completed),
        _ = wait_for_signal() => {
            tracing::warn!("Export interrupted, cancelling workers");
            Ok(RunOutcome::Interrupted)
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Received SIGINT signal (Ctrl+C)");
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
            std::future::pending::<()>().await;
        }
    }
}
