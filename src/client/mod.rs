//! Remote API collaborators
//!
//! The exporter only talks to the chat service through two seams:
//! [`MetadataSource`] for the guild and its channel listing, and
//! [`MessageSource`] for paged message history. [`DiscordClient`] implements
//! both over HTTP; tests substitute scripted implementations.

mod discord;


pub use discord::DiscordClient;

use crate::error::Result;
use crate::types::{Channel, Guild, Message};

/// Maximum number of messages a single history request may return
pub const MAX_PAGE_SIZE: usize = 100;

/// Guild and channel metadata, queried once before the export starts
#[async_trait::async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetch guild metadata
    async fn guild(&self, guild_id: &str) -> Result<Guild>;

    /// List every channel of the guild, in the API's listing order
    async fn list_channels(&self, guild_id: &str) -> Result<Vec<Channel>>;
}

/// Paged access to a channel's message history, newest first
#[async_trait::async_trait]
pub trait MessageSource: Send + Sync {
    /// Fetch up to `limit` messages strictly older than `before`.
    ///
    /// `before = None` starts from the most recent message.
    async fn fetch_messages_before(
        &self,
        channel_id: &str,
        limit: usize,
        before: Option<&str>,
    ) -> Result<Vec<Message>>;
}
