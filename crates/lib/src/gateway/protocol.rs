//! Gateway wire types: the canonical send request and the HTTP bodies the
//! routes accept and produce.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::channels::{ChannelInfo, PostedMessage};
use crate::gateway::error::ApiError;
use crate::gateway::markup::{self, ParseMode};

/// Opaque embed document. The gateway checks only that each embed is a
/// JSON object; field semantics belong to the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embed(pub Map<String, Value>);

impl Embed {
    /// Accept any JSON object; reject every other value shape.
    pub fn from_value(value: Value) -> Result<Self, ApiError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ApiError::Validation(format!(
                "embed must be a JSON object, got {}",
                json_type_name(&other)
            ))),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Canonical send operation every wire format normalizes into. Built once
/// per request; the dispatcher never sees the originating format.
#[derive(Debug, Clone)]
pub struct SendRequest {
    pub channel_id: u64,
    pub content: String,
    pub embeds: Vec<Embed>,
}

impl SendRequest {
    /// Raw-text normalizer: the body is markup (see `markup`); the channel
    /// comes from the URL path.
    pub fn from_text(channel_id: u64, body: &str, mode: ParseMode) -> Result<Self, ApiError> {
        let parsed = markup::parse(body, mode)?;
        Ok(Self {
            channel_id,
            content: parsed.content,
            embeds: parsed.embed.into_iter().collect(),
        })
    }

    /// Form normalizer: requires `content` and a numeric `channel_id`.
    pub fn from_form(form: SendMessageForm) -> Result<Self, ApiError> {
        let (content, channel_id) = match (form.content, form.channel_id) {
            (Some(content), Some(id)) => (content, id),
            _ => return Err(ApiError::bad_form()),
        };
        let channel_id = channel_id.parse().map_err(|_| ApiError::bad_form())?;
        Ok(Self {
            channel_id,
            content,
            embeds: Vec::new(),
        })
    }

    /// JSON-webhook normalizer: Discord webhook payload shape; the channel
    /// comes from the URL path. One malformed embed fails the whole request.
    pub fn from_webhook(channel_id: u64, payload: WebhookPayload) -> Result<Self, ApiError> {
        let embeds = payload
            .embeds
            .into_iter()
            .map(Embed::from_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            channel_id,
            content: payload.content,
            embeds,
        })
    }
}

/// `POST /api/send_message` form fields. Both are optional at the
/// extractor so that a missing field surfaces as the gateway's own 400,
/// not the framework's rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendMessageForm {
    pub content: Option<String>,
    pub channel_id: Option<String>,
}

/// `POST /api/webhooks/{channel_id}` JSON body, shaped like a Discord
/// webhook execution payload. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub embeds: Vec<Value>,
}

/// Success body for dispatch routes: `{"message": {...}}`, echoing what
/// the backend confirmed rather than a locally reconstructed value.
#[derive(Debug, Serialize)]
pub struct MessageCreated {
    pub message: MessageEcho,
}

#[derive(Debug, Serialize)]
pub struct MessageEcho {
    pub id: u64,
    pub channel_id: u64,
    pub content: String,
}

impl From<PostedMessage> for MessageCreated {
    fn from(posted: PostedMessage) -> Self {
        Self {
            message: MessageEcho {
                id: posted.id,
                channel_id: posted.channel_id,
                content: posted.content,
            },
        }
    }
}

/// Synthetic webhook registration record for compatibility probing; never
/// persisted. `application_id` and `avatar` serialize as explicit nulls.
#[derive(Debug, Serialize)]
pub struct WebhookDescriptor {
    #[serde(rename = "type")]
    pub kind: u8,
    pub id: String,
    pub channel_id: String,
    pub guild_id: String,
    pub application_id: Option<String>,
    pub avatar: Option<String>,
}

impl WebhookDescriptor {
    pub fn for_channel(channel: &ChannelInfo) -> Self {
        Self {
            kind: 1,
            id: channel.id.to_string(),
            channel_id: channel.id.to_string(),
            guild_id: channel.guild_id.to_string(),
            application_id: None,
            avatar: None,
        }
    }
}
