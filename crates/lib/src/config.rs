//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.courier/config.json`) and
//! environment. A missing file means defaults, so the gateway can run with
//! nothing but `DISCORD_BOT_TOKEN` set.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// HTTP API server settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Discord session settings.
    #[serde(default)]
    pub discord: DiscordConfig,
}

/// API server bind, port, and parsing options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    /// Bind address (default "127.0.0.1"). Callers are pre-trusted; keep
    /// this loopback unless a fronting layer handles auth.
    #[serde(default = "default_api_listen")]
    pub listen: String,

    /// Port for the HTTP API (default 8080).
    #[serde(default = "default_api_port")]
    pub port: u16,

    /// When true, malformed markup on the raw-text route is rejected with
    /// 400 instead of degrading to plain content.
    #[serde(default)]
    pub strict_markup: bool,
}

fn default_api_listen() -> String {
    "127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
    8080
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen: default_api_listen(),
            port: default_api_port(),
            strict_markup: false,
        }
    }
}

/// Discord session config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscordConfig {
    /// Bot token. Overridden by DISCORD_BOT_TOKEN env when set.
    pub bot_token: Option<String>,

    /// Discord API base URL override (default https://discord.com/api/v10).
    /// Point this at a stub server for local testing.
    pub api_base: Option<String>,
}

/// Resolve the bot token: env DISCORD_BOT_TOKEN overrides config.
pub fn resolve_bot_token(config: &Config) -> Option<String> {
    std::env::var("DISCORD_BOT_TOKEN")
        .ok()
        .and_then(|s| {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        })
        .or_else(|| {
            config
                .discord
                .bot_token
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("COURIER_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".courier").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the default path (or COURIER_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_api_port_and_listen() {
        let a = ApiConfig::default();
        assert_eq!(a.port, 8080);
        assert_eq!(a.listen, "127.0.0.1");
        assert!(!a.strict_markup);
    }

    #[test]
    fn parse_camel_case_fields() {
        let config: Config = serde_json::from_str(
            r#"{"api": {"port": 9000, "strictMarkup": true}, "discord": {"botToken": "t"}}"#,
        )
        .expect("parse config");
        assert_eq!(config.api.port, 9000);
        assert!(config.api.strict_markup);
        assert_eq!(config.api.listen, "127.0.0.1");
        assert_eq!(config.discord.bot_token.as_deref(), Some("t"));
    }

    #[test]
    fn resolve_bot_token_from_config() {
        let mut config = Config::default();
        config.discord.bot_token = Some("  abc  ".to_string());
        assert_eq!(resolve_bot_token(&config), Some("abc".to_string()));
    }

    #[test]
    fn resolve_bot_token_empty_is_none() {
        let mut config = Config::default();
        config.discord.bot_token = Some("   ".to_string());
        assert_eq!(resolve_bot_token(&config), None);
    }
}
