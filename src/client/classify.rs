use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use thiserror::Error;

use crate::command::Command;
use crate::utils;

pub const RAW_BODY_LIMIT: usize = 220;

const LIFETIME_HINT: &str = " This endpoint may require a lifetime API key.";
const RATE_LIMIT_HINT: &str = " Rate limit hit. Wait and retry.";

pub const DIRECT_NETWORK_HINT: &str = "Direct requests can be blocked or unreachable from here. Start a relay with `omarlens serve` and pass its address with --relay.";
pub const RELAY_NETWORK_HINT: &str = "Network issue reaching the relay. Make sure `omarlens serve` is running so `/api-proxy` can relay requests.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Invalid JSON response from API (status {status}).")]
    InvalidJson { status: u16 },

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("API returned an empty response.")]
    Empty,

    #[error("{hint}")]
    Network { hint: &'static str },

    #[error("{0}")]
    Other(String),
}

impl FetchError {
    /// The status line shown for this failure.
    pub fn status_message(&self) -> String {
        format!("Fetch failed: {self}")
    }
}

fn lifetime_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)lifetime").expect("static regex"))
}

fn network_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)failed to fetch|network ?error").expect("static regex"))
}

pub fn is_network_message(message: &str) -> bool {
    network_re().is_match(message)
}

pub fn network_hint(via_relay: bool) -> &'static str {
    if via_relay {
        RELAY_NETWORK_HINT
    } else {
        DIRECT_NETWORK_HINT
    }
}

/// Builds the message for a rejected request from whatever the body offers.
pub fn compose_error_message(
    status: u16,
    payload: Option<&Value>,
    raw_text: &str,
    command: Command,
) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(Value::Object(map)) = payload {
        if utils::is_truthy(map.get("error")) {
            parts.push(utils::display_value(&map["error"]));
        } else if utils::is_truthy(map.get("message")) {
            parts.push(utils::display_value(&map["message"]));
        }
        if utils::is_truthy(map.get("note")) {
            parts.push(utils::display_value(&map["note"]));
        }
    }

    let mut message = parts.join(" - ").trim().to_string();
    if message.is_empty() {
        message = raw_text.trim().chars().take(RAW_BODY_LIMIT).collect();
    }
    if message.is_empty() {
        message = format!("Request failed with status {status}");
    }

    if status == 403 && command.is_lifetime_restricted() && !lifetime_re().is_match(&message) {
        message.push_str(LIFETIME_HINT);
    }
    if status == 429 {
        message.push_str(RATE_LIMIT_HINT);
    }
    message
}

/// Decides whether a completed response is a usable payload.
pub fn classify_response(status: u16, raw_text: &str, command: Command) -> Result<Value, FetchError> {
    let data = if raw_text.trim().is_empty() {
        None
    } else {
        Some(
            serde_json::from_str::<Value>(raw_text)
                .map_err(|_| FetchError::InvalidJson { status })?,
        )
    };

    if !(200..300).contains(&status) {
        return Err(FetchError::Api {
            status,
            message: compose_error_message(status, data.as_ref(), raw_text, command),
        });
    }
    if let Some(Value::Object(map)) = data.as_ref() {
        if utils::is_truthy(map.get("error")) {
            return Err(FetchError::Api {
                status,
                message: compose_error_message(status, data.as_ref(), raw_text, command),
            });
        }
    }
    match data {
        Some(value @ (Value::Object(_) | Value::Array(_))) => Ok(value),
        _ => Err(FetchError::Empty),
    }
}
