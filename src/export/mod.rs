//! Concurrent export engine.
//!
//! - [`queue`] - Work queue construction and distribution
//! - [`paginator`] - Per-channel history walk
//! - [`pool`] - Worker pool draining the queue
//!
//! [`Exporter`] wires these together with the API collaborators, the sink and
//! the progress reporter.

pub mod paginator;
pub mod pool;
pub mod queue;


use std::sync::Arc;

use crate::client::{DiscordClient, MessageSource, MetadataSource};
use crate::config::Config;
use crate::error::Result;
use crate::progress::ProgressReporter;
use crate::sink::Sink;
use crate::types::ExportSummary;

pub use paginator::ChannelPaginator;
pub use pool::WorkerPool;
pub use queue::WorkQueue;

/// Per-run export behaviour
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    /// Skip messages with empty text content
    pub omit_empty: bool,
}

impl From<&Config> for ExportOptions {
    fn from(config: &Config) -> Self {
        Self {
            omit_empty: config.omit_empty,
        }
    }
}

/// Shared, read-only state handed to every worker
pub struct ExportContext {
    /// Message history collaborator
    pub messages: Arc<dyn MessageSource>,
    /// Output sink
    pub sink: Arc<Sink>,
    /// Progress display
    pub reporter: Arc<ProgressReporter>,
    /// Run options
    pub options: ExportOptions,
}

/// Dispatcher: resolves the guild's channels, builds the queue and runs the pool
pub struct Exporter {
    config: Arc<Config>,
    metadata: Arc<dyn MetadataSource>,
    messages: Arc<dyn MessageSource>,
}

impl Exporter {
    /// Exporter with explicit collaborators
    pub fn new(
        config: Config,
        metadata: Arc<dyn MetadataSource>,
        messages: Arc<dyn MessageSource>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            metadata,
            messages,
        }
    }

    /// Exporter using one HTTP client for both metadata and message history
    pub fn with_client(config: Config, client: DiscordClient) -> Self {
        let client = Arc::new(client);
        Self::new(config, client.clone(), client)
    }

    /// Export every eligible channel of the configured guild.
    ///
    /// Setup failures (invalid config, metadata errors, output file creation)
    /// are returned before any worker starts. After that only a fatal sink
    /// error can end the run early.
    pub async fn run(&self, reporter: Arc<ProgressReporter>) -> Result<ExportSummary> {
        let config = &self.config;
        config.validate()?;

        let guild = self.metadata.guild(&config.guild_id).await?;
        let listing = self.metadata.list_channels(&config.guild_id).await?;
        reporter.log(format!(
            "Targeting guild: {} ({} channels)",
            guild.name,
            listing.len()
        ));

        let queue = Arc::new(WorkQueue::from_listing(
            listing,
            &config.excluded_channels(),
        ));
        reporter.log(format!("{} text channels", queue.capacity()));
        tracing::info!(
            guild_id = %guild.id,
            guild = %guild.name,
            channels = queue.capacity(),
            output = %config.output_path.display(),
            "Export queue ready"
        );

        let sink = Arc::new(Sink::create(&config.output_path)?);
        let ctx = Arc::new(ExportContext {
            messages: Arc::clone(&self.messages),
            sink: Arc::clone(&sink),
            reporter,
            options: ExportOptions::from(&**config),
        });

        let summary = WorkerPool::new(config.concurrent_channels)
            .run(queue, ctx)
            .await?;
        sink.flush()?;

        Ok(summary)
    }
}
