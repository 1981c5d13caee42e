//! Discord REST client: create messages and list the bot's channels.

use crate::channels::directory::{
    snowflake, ChannelDirectory, ChannelInfo, MessagePoster, PlatformError, PostedMessage,
};
use crate::gateway::Embed;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const DISCORD_API_BASE: &str = "https://discord.com/api/v10";

/// Channel types the gateway posts to: guild text (0) and announcement (5).
const TEXT_CHANNEL_TYPES: [u8; 2] = [0, 5];

/// REST client for the Discord API, authenticated as a bot.
#[derive(Clone)]
pub struct DiscordApi {
    token: String,
    base: String,
    client: reqwest::Client,
}

/// `POST /channels/{id}/messages` body. `embeds` is omitted entirely when
/// empty so content-only sends keep the minimal shape.
#[derive(Serialize)]
struct CreateMessageBody<'a> {
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    embeds: Option<&'a [Embed]>,
}

/// Guild as returned by `GET /users/@me/guilds`.
#[derive(Debug, Clone, Deserialize)]
pub struct Guild {
    #[serde(deserialize_with = "snowflake::deserialize")]
    pub id: u64,
    pub name: String,
}

/// Channel as returned by the guild channel listing. The owning guild is
/// supplied by the caller; the listing itself may omit `guild_id`.
#[derive(Debug, Clone, Deserialize)]
pub struct GuildChannel {
    #[serde(deserialize_with = "snowflake::deserialize")]
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub name: Option<String>,
}

impl DiscordApi {
    pub fn new(token: String, api_base: Option<String>) -> Self {
        Self {
            token,
            base: api_base.unwrap_or_else(|| DISCORD_API_BASE.to_string()),
            client: reqwest::Client::new(),
        }
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token)
    }

    /// Guilds the bot user is a member of.
    pub async fn current_user_guilds(&self) -> Result<Vec<Guild>, PlatformError> {
        let url = format!("{}/users/@me/guilds", self.base);
        let res = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;
        read_json(res).await
    }

    /// All channels of a guild, every type; callers filter.
    pub async fn guild_channels(&self, guild_id: u64) -> Result<Vec<GuildChannel>, PlatformError> {
        let url = format!("{}/guilds/{}/channels", self.base, guild_id);
        let res = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;
        read_json(res).await
    }
}

#[async_trait]
impl MessagePoster for DiscordApi {
    async fn create_message(
        &self,
        channel_id: u64,
        content: &str,
        embeds: &[Embed],
    ) -> Result<PostedMessage, PlatformError> {
        let url = format!("{}/channels/{}/messages", self.base, channel_id);
        let body = CreateMessageBody {
            content,
            embeds: if embeds.is_empty() { None } else { Some(embeds) },
        };
        let res = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(&body)
            .send()
            .await?;
        read_json(res).await
    }
}

/// Fill the directory with every text-capable channel the bot can see.
/// A guild whose channel listing fails is skipped with a warning so one
/// misconfigured guild does not block startup. Returns the number of
/// channels registered.
pub async fn sync_directory(
    api: &DiscordApi,
    directory: &ChannelDirectory,
) -> Result<usize, PlatformError> {
    let mut count = 0;
    for guild in api.current_user_guilds().await? {
        let channels = match api.guild_channels(guild.id).await {
            Ok(list) => list,
            Err(e) => {
                log::warn!("listing channels for guild {} failed: {}", guild.id, e);
                continue;
            }
        };
        for channel in channels {
            if !TEXT_CHANNEL_TYPES.contains(&channel.kind) {
                continue;
            }
            log::debug!(
                "registering channel {} ({}) in guild {}",
                channel.id,
                channel.name.as_deref().unwrap_or("?"),
                guild.name
            );
            directory
                .insert(ChannelInfo {
                    id: channel.id,
                    guild_id: guild.id,
                    name: channel.name.unwrap_or_default(),
                })
                .await;
            count += 1;
        }
    }
    Ok(count)
}

/// Parse a 2xx response body as JSON, or classify the failure.
async fn read_json<T: serde::de::DeserializeOwned>(
    res: reqwest::Response,
) -> Result<T, PlatformError> {
    let status = res.status();
    let body = res.text().await?;
    if !status.is_success() {
        return Err(classify_response(status.as_u16(), &body));
    }
    serde_json::from_str(&body).map_err(|e| PlatformError::Payload(e.to_string()))
}

/// Map a non-2xx platform response to an error carrying the platform's own
/// message when the body is a well-formed Discord error document.
fn classify_response(status: u16, body: &str) -> PlatformError {
    #[derive(Deserialize)]
    struct ApiErrorBody {
        message: String,
    }

    let message = match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) if !parsed.message.is_empty() => parsed.message,
        _ if !body.trim().is_empty() => body.trim().to_string(),
        _ => format!("request failed with status {}", status),
    };
    PlatformError::Api { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classify_uses_discord_error_message() {
        let err = classify_response(403, r#"{"message": "Missing Permissions", "code": 50013}"#);
        match err {
            PlatformError::Api { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "Missing Permissions");
            }
            other => panic!("unexpected classification: {:?}", other),
        }
    }

    #[test]
    fn classify_falls_back_to_raw_body() {
        let err = classify_response(502, "bad gateway\n");
        match err {
            PlatformError::Api { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "bad gateway");
            }
            other => panic!("unexpected classification: {:?}", other),
        }
    }

    #[test]
    fn classify_empty_body_names_the_status() {
        let err = classify_response(429, "");
        match err {
            PlatformError::Api { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "request failed with status 429");
            }
            other => panic!("unexpected classification: {:?}", other),
        }
    }

    #[test]
    fn create_message_body_omits_empty_embeds() {
        let body = CreateMessageBody {
            content: "hi",
            embeds: None,
        };
        let value = serde_json::to_value(&body).expect("serialize");
        assert_eq!(value, json!({"content": "hi"}));
    }

    #[test]
    fn guild_channel_parses_discord_listing() {
        let listing = r#"[
            {"id": "100", "type": 0, "name": "general"},
            {"id": "101", "type": 2, "name": "voice"}
        ]"#;
        let channels: Vec<GuildChannel> = serde_json::from_str(listing).expect("parse listing");
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].id, 100);
        assert_eq!(channels[0].kind, 0);
        assert!(TEXT_CHANNEL_TYPES.contains(&channels[0].kind));
        assert!(!TEXT_CHANNEL_TYPES.contains(&channels[1].kind));
    }
}
