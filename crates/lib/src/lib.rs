//! Courier core library — configuration, the Discord channel session, and
//! the message dispatch gateway used by the CLI.

pub mod channels;
pub mod config;
pub mod gateway;
pub mod init;
