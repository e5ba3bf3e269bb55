//! HTTP implementation of the API seams against the Discord REST API.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, RETRY_AFTER};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::{MessageSource, MetadataSource};
use crate::config::{ApiConfig, RetryConfig};
use crate::error::{Error, Result};
use crate::retry::with_retry;
use crate::types::{Channel, Guild, Message};

const USER_AGENT: &str = concat!(
    "DiscordBot (https://crates.io/crates/guild-export, ",
    env!("CARGO_PKG_VERSION"),
    ")"
);

/// Longest retry-after hint honoured; larger hints are clamped
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60 * 60);

/// Characters of a raw error body kept in [`Error::Api`] messages
const MAX_BODY_CHARS: usize = 200;

/// REST client authenticated with a bot token
///
/// Rate limits (HTTP 429), server errors and transport timeouts are retried
/// according to the configured [`RetryConfig`]; any error that survives the
/// retry budget is returned to the caller.
#[derive(Clone)]
pub struct DiscordClient {
    http: reqwest::Client,
    base_url: Url,
    authorization: String,
    retry: RetryConfig,
}

impl std::fmt::Debug for DiscordClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl DiscordClient {
    /// Build a client for the given bot token
    pub fn new(token: &str, api: &ApiConfig) -> Result<Self> {
        if token.is_empty() {
            return Err(Error::config(
                "Config token is empty! Please provide a token!",
                "token",
            ));
        }

        let mut base_url = Url::parse(&api.base_url)?;
        // Url::join replaces the last path segment unless the base ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .timeout(api.request_timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            base_url,
            authorization: format!("Bot {token}"),
            retry: api.retry.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    async fn get_json<T>(&self, url: Url) -> Result<T>
    where
        T: DeserializeOwned + Send,
    {
        with_retry(&self.retry, || self.get_once(url.clone())).await
    }

    async fn get_once<T>(&self, url: Url) -> Result<T>
    where
        T: DeserializeOwned + Send,
    {
        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, &self.authorization)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(response.json::<T>().await?);
        }
        Err(api_error(response).await)
    }
}

/// First non-blank line of a non-JSON error body (an HTML error page, say), shortened
fn summarize_body(body: &str) -> Option<String> {
    let line = body.lines().map(str::trim).find(|l| !l.is_empty())?;
    match line.char_indices().nth(MAX_BODY_CHARS) {
        Some((end, _)) => Some(format!("{}...", &line[..end])),
        None => Some(line.to_string()),
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    retry_after: Option<f64>,
}

/// Convert a non-success response into [`Error::Api`], keeping any retry-after hint
async fn api_error(response: reqwest::Response) -> Error {
    let status = response.status();
    let header_hint = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<f64>().ok());

    let body = response.text().await.unwrap_or_default();
    let parsed = serde_json::from_str::<ErrorBody>(&body).ok();

    let retry_after = if status.as_u16() == 429 {
        parsed
            .as_ref()
            .and_then(|b| b.retry_after)
            .or(header_hint)
            .filter(|secs| *secs >= 0.0)
            .map(|secs| {
                Duration::try_from_secs_f64(secs)
                    .map_or(MAX_RETRY_AFTER, |hint| hint.min(MAX_RETRY_AFTER))
            })
    } else {
        None
    };

    let message = parsed
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            summarize_body(&body).unwrap_or_else(|| {
                status.canonical_reason().unwrap_or("unknown error").to_string()
            })
        });

    Error::Api {
        status: status.as_u16(),
        message,
        retry_after,
    }
}

#[async_trait::async_trait]
impl MetadataSource for DiscordClient {
    async fn guild(&self, guild_id: &str) -> Result<Guild> {
        let url = self.endpoint(&format!("guilds/{guild_id}"))?;
        self.get_json(url).await
    }

    async fn list_channels(&self, guild_id: &str) -> Result<Vec<Channel>> {
        let url = self.endpoint(&format!("guilds/{guild_id}/channels"))?;
        let channels: Vec<Channel> = self.get_json(url).await?;
        tracing::debug!(guild_id, count = channels.len(), "Listed guild channels");
        Ok(channels)
    }
}

#[async_trait::async_trait]
impl MessageSource for DiscordClient {
    async fn fetch_messages_before(
        &self,
        channel_id: &str,
        limit: usize,
        before: Option<&str>,
    ) -> Result<Vec<Message>> {
        let mut url = self.endpoint(&format!("channels/{channel_id}/messages"))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &limit.to_string());
            if let Some(before) = before {
                query.append_pair("before", before);
            }
        }

        let messages: Vec<Message> = self.get_json(url).await?;
        tracing::trace!(
            channel_id,
            before = before.unwrap_or(""),
            count = messages.len(),
            "Fetched message page"
        );
        Ok(messages)
    }
}
