//! Discord channel session: the directory of postable channels and the
//! REST client that seeds it and posts messages.
//!
//! The gateway resolves channel ids against the directory and dispatches
//! through the `MessagePoster` trait, so handlers never see the platform
//! client directly.

mod directory;
mod discord;

pub use directory::{ChannelDirectory, ChannelInfo, MessagePoster, PlatformError, PostedMessage};
pub use discord::{sync_directory, DiscordApi, Guild, GuildChannel};
