//! Per-channel history walk.

use std::sync::Arc;

use crate::client::MAX_PAGE_SIZE;
use crate::error::Result;
use crate::types::{Channel, ChannelStats, ExportRecord, Message};

use super::ExportContext;

/// Where the history walk of one channel stands
#[derive(Debug, Clone, PartialEq, Eq)]
enum PageState {
    /// Another page may exist older than `before` (`None` = start from the newest message)
    Continuing { before: Option<String> },
    /// The last page was empty or short; nothing older is left
    Exhausted,
}

impl PageState {
    /// State after a page of `len` messages whose oldest message is `last_id`
    fn after_page(len: usize, last_id: Option<&str>) -> Self {
        match last_id {
            Some(id) if len == MAX_PAGE_SIZE => PageState::Continuing {
                before: Some(id.to_string()),
            },
            _ => PageState::Exhausted,
        }
    }
}

/// Exports the full history of one channel to the sink, newest page first
pub struct ChannelPaginator<'a> {
    worker_id: usize,
    ctx: &'a ExportContext,
}

impl<'a> ChannelPaginator<'a> {
    /// Paginator reporting progress to `worker_id`'s status slot
    pub fn new(worker_id: usize, ctx: &'a ExportContext) -> Self {
        Self { worker_id, ctx }
    }

    /// Walk the channel's history until a short or empty page.
    ///
    /// Fetch errors are reported and treated as an empty page. The only error
    /// returned is a sink failure, which must abort the export.
    pub async fn export(&self, channel: &Channel) -> Result<ChannelStats> {
        let id = self.worker_id;
        let mut stats = ChannelStats::default();
        let mut state = PageState::Continuing { before: None };

        self.ctx.reporter.log(format!(
            "[Worker {id}] Starting download for channel {channel}"
        ));
        tracing::info!(worker_id = id, channel_id = %channel.id, "Starting channel export");

        while let PageState::Continuing { before } = state {
            stats.pages += 1;
            let page = match self
                .ctx
                .messages
                .fetch_messages_before(&channel.id, MAX_PAGE_SIZE, before.as_deref())
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    stats.fetch_errors += 1;
                    tracing::warn!(
                        worker_id = id,
                        channel_id = %channel.id,
                        before = before.as_deref().unwrap_or(""),
                        error = %e,
                        "Failed to fetch message page"
                    );
                    self.ctx.reporter.log(format!(
                        "[Worker {id}] Error while downloading channel {channel}: {e}"
                    ));
                    Vec::new()
                }
            };

            stats.exported += self.write_page(&page).await?;
            stats.fetched += page.len() as u64;

            let last_id = page.last().map(|m| m.id.as_str());
            if let Some(last_id) = last_id {
                self.ctx.reporter.update(
                    id,
                    format!(
                        "> [Worker {id}] Downloaded {} messages (total: {}) from {channel} Last message ID: {last_id}",
                        page.len(),
                        stats.fetched
                    ),
                );
            }
            state = PageState::after_page(page.len(), last_id);
        }

        self.ctx.reporter.log(format!(
            "[Worker {id}] Downloaded {} messages from {channel} ({} exported, {} failed fetches)",
            stats.fetched, stats.exported, stats.fetch_errors
        ));
        tracing::info!(
            worker_id = id,
            channel_id = %channel.id,
            pages = stats.pages,
            fetched = stats.fetched,
            exported = stats.exported,
            fetch_errors = stats.fetch_errors,
            "Finished channel export"
        );

        Ok(stats)
    }

    /// Write every message of a page, skipping empty ones when configured
    async fn write_page(&self, page: &[Message]) -> Result<u64> {
        let records: Vec<ExportRecord> = page
            .iter()
            .filter(|m| !(self.ctx.options.omit_empty && m.content.is_empty()))
            .map(ExportRecord::from)
            .collect();
        Arc::clone(&self.ctx.sink).write_batch(records).await
    }
}
