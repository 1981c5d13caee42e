//! Channel directory and the post-message seam.
//!
//! The directory is the bot session's in-memory channel cache: request
//! handlers resolve a numeric id to an entry here, the session fills the
//! map at startup. Lookup is the only operation on the request path.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::gateway::Embed;

/// Discord encodes ids ("snowflakes") as JSON strings; accept both string
/// and number forms.
pub(crate) mod snowflake {
    use serde::de::{Deserializer, Error, Unexpected};
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<u64, D::Error> {
        match Raw::deserialize(de)? {
            Raw::Num(n) => Ok(n),
            Raw::Text(s) => s.parse().map_err(|_| {
                D::Error::invalid_value(Unexpected::Str(&s), &"a decimal id string")
            }),
        }
    }
}

/// Failure reported by the platform client.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The platform's API rejected the call; status and message are the
    /// platform's own.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Transport-level failure before any API response was read.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// The platform answered with a body this client could not interpret.
    #[error("unexpected platform response: {0}")]
    Payload(String),
}

/// Message echo returned by the platform after a successful post.
#[derive(Debug, Clone, Deserialize)]
pub struct PostedMessage {
    #[serde(deserialize_with = "snowflake::deserialize")]
    pub id: u64,
    #[serde(deserialize_with = "snowflake::deserialize")]
    pub channel_id: u64,
    #[serde(default)]
    pub content: String,
}

/// Post-message capability of the connected bot session. Exactly one
/// outbound message per successful call; no retries at this seam.
#[async_trait]
pub trait MessagePoster: Send + Sync {
    async fn create_message(
        &self,
        channel_id: u64,
        content: &str,
        embeds: &[Embed],
    ) -> Result<PostedMessage, PlatformError>;
}

/// Directory entry for a channel the bot can post to.
#[derive(Debug, Clone)]
pub struct ChannelInfo {
    pub id: u64,
    pub guild_id: u64,
    pub name: String,
}

/// Map of channel id to live entry. Shared across the gateway; handlers
/// read, only the session writes.
pub struct ChannelDirectory {
    inner: Arc<RwLock<HashMap<u64, ChannelInfo>>>,
}

impl Default for ChannelDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelDirectory {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn insert(&self, channel: ChannelInfo) {
        let mut g = self.inner.write().await;
        g.insert(channel.id, channel);
    }

    pub async fn get(&self, id: u64) -> Option<ChannelInfo> {
        let g = self.inner.read().await;
        g.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        let g = self.inner.read().await;
        g.len()
    }
}
