//! Core types for guild-export

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Kind of a guild channel, decoded from the API's numeric `type` field
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum ChannelKind {
    /// Regular text channel (type 0)
    Text,
    /// Announcement channel (type 5)
    Announcement,
    /// Any other kind (voice, category, forum, ...)
    Other(u8),
}

impl ChannelKind {
    /// Whether channels of this kind have a message history worth exporting
    pub fn is_exportable(&self) -> bool {
        matches!(self, ChannelKind::Text | ChannelKind::Announcement)
    }
}

impl From<u8> for ChannelKind {
    fn from(value: u8) -> Self {
        match value {
            0 => ChannelKind::Text,
            5 => ChannelKind::Announcement,
            other => ChannelKind::Other(other),
        }
    }
}

impl From<ChannelKind> for u8 {
    fn from(kind: ChannelKind) -> Self {
        match kind {
            ChannelKind::Text => 0,
            ChannelKind::Announcement => 5,
            ChannelKind::Other(other) => other,
        }
    }
}

/// A guild channel as listed by the API
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Channel identifier
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Channel kind
    #[serde(rename = "type")]
    pub kind: ChannelKind,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Author of a message; only the identifier is exported
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// User identifier
    pub id: String,
}

/// A single message from a channel's history
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message identifier (snowflake, ordered by creation time)
    pub id: String,
    /// Message author
    pub author: Author,
    /// Text content, empty for attachment-only or embed-only messages
    #[serde(default)]
    pub content: String,
}

/// Guild (server) metadata
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    /// Guild identifier
    pub id: String,
    /// Guild name
    pub name: String,
}

/// One row of the output file: `(author id, text content, message id)`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportRecord {
    /// Author identifier
    pub author: String,
    /// Text content, passed through verbatim
    pub content: String,
    /// Message identifier
    pub id: String,
}

impl ExportRecord {
    /// The header row written before any message
    pub fn header() -> Self {
        Self {
            author: "author".to_string(),
            content: "textContent".to_string(),
            id: "id".to_string(),
        }
    }
}

impl From<&Message> for ExportRecord {
    fn from(message: &Message) -> Self {
        Self {
            author: message.author.id.clone(),
            content: message.content.clone(),
            id: message.id.clone(),
        }
    }
}

/// Counters for one channel's export
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChannelStats {
    /// Number of fetch calls issued
    pub pages: u64,
    /// Messages received from the API
    pub fetched: u64,
    /// Records written to the sink
    pub exported: u64,
    /// Fetch calls that failed
    pub fetch_errors: u64,
}

impl std::ops::AddAssign for ChannelStats {
    fn add_assign(&mut self, rhs: Self) {
        self.pages += rhs.pages;
        self.fetched += rhs.fetched;
        self.exported += rhs.exported;
        self.fetch_errors += rhs.fetch_errors;
    }
}

/// Result of a complete export run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// Number of workers that ran
    pub workers: usize,
    /// Number of channels exported
    pub channels: usize,
    /// Aggregated message counters across all channels
    pub totals: ChannelStats,
    /// Wall-clock duration of the pool
    pub elapsed: Duration,
}
