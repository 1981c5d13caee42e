//! Message markup accepted by the raw-text route.
//!
//! A body whose first line is `---` opens an embed header: `key: value`
//! lines up to the next `---` set embed fields, the remainder is the
//! message content. Any other body is plain content.
//!
//! ```text
//! ---
//! title: Deploy finished
//! color: #2ecc71
//! ---
//! all services healthy
//! ```
//!
//! Tolerant mode turns any malformed header into plain content instead of
//! failing the request.

use serde_json::{Map, Value};

use crate::gateway::error::ApiError;
use crate::gateway::protocol::Embed;

const DELIMITER: &str = "---";
const EMBED_KEYS: [&str; 4] = ["title", "description", "url", "color"];

/// Strict surfaces malformed markup as a validation error; Tolerant
/// degrades the whole body to plain content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Strict,
    Tolerant,
}

/// Parse result: message content plus at most one embed.
#[derive(Debug, Clone, Default)]
pub struct ParsedMessage {
    pub content: String,
    pub embed: Option<Embed>,
}

pub fn parse(body: &str, mode: ParseMode) -> Result<ParsedMessage, ApiError> {
    match parse_strict(body) {
        Ok(parsed) => Ok(parsed),
        Err(_) if mode == ParseMode::Tolerant => Ok(plain(body)),
        Err(e) => Err(e),
    }
}

fn plain(body: &str) -> ParsedMessage {
    ParsedMessage {
        content: body.to_string(),
        embed: None,
    }
}

fn parse_strict(body: &str) -> Result<ParsedMessage, ApiError> {
    let mut lines = body.lines();
    match lines.next() {
        Some(first) if first.trim_end() == DELIMITER => {}
        _ => return Ok(plain(body)),
    }

    let mut fields = Map::new();
    loop {
        let line = lines
            .next()
            .ok_or_else(|| ApiError::Validation("unterminated embed header".to_string()))?;
        if line.trim_end() == DELIMITER {
            break;
        }
        let (key, value) = line.split_once(':').ok_or_else(|| {
            ApiError::Validation(format!("malformed embed header line: {:?}", line))
        })?;
        let key = key.trim();
        let value = value.trim();
        if !EMBED_KEYS.contains(&key) {
            return Err(ApiError::Validation(format!("unknown embed field: {}", key)));
        }
        if key == "color" {
            fields.insert(key.to_string(), Value::from(parse_color(value)?));
        } else {
            fields.insert(key.to_string(), Value::from(value));
        }
    }

    let content = lines.collect::<Vec<_>>().join("\n");
    let embed = if fields.is_empty() {
        None
    } else {
        Some(Embed(fields))
    };
    Ok(ParsedMessage { content, embed })
}

/// `#rrggbb` hex or a decimal integer, as Discord's embed color field.
fn parse_color(value: &str) -> Result<u32, ApiError> {
    let parsed = if let Some(hex) = value.strip_prefix('#') {
        u32::from_str_radix(hex, 16)
    } else {
        value.parse()
    };
    parsed.map_err(|_| ApiError::Validation(format!("invalid embed color: {:?}", value)))
}
