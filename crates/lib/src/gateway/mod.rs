//! Message dispatch gateway: HTTP surface over the bot's channels.
//!
//! Every inbound wire format normalizes into one canonical send request;
//! resolution and dispatch are shared by all routes, so error-to-status
//! mapping is defined exactly once (see `error`).

mod error;
mod markup;
mod protocol;
mod server;

pub use error::ApiError;
pub use markup::{parse as parse_markup, ParseMode, ParsedMessage};
pub use protocol::{
    Embed, MessageCreated, SendMessageForm, SendRequest, WebhookDescriptor, WebhookPayload,
};
pub use server::{run, ApiServer, GatewayState};
