use thiserror::Error;

use crate::command::Command;

pub const DEFAULT_API_BASE: &str = "https://api.omar-thing.site/";
pub const PROXY_PATH: &str = "/api-proxy";

/// Raw user input for a single query. Values are trimmed before use.
#[derive(Clone, Debug, Default)]
pub struct QueryInput {
    pub username: String,
    pub api_key: String,
    pub command: String,
    pub extra_value: String,
}

/// Where requests are sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiTarget {
    /// Straight to the upstream API.
    Direct { base: String },
    /// Through a relay serving `/api-proxy`.
    Relay { origin: String },
}

impl Default for ApiTarget {
    fn default() -> Self {
        Self::Direct {
            base: DEFAULT_API_BASE.to_string(),
        }
    }
}

impl ApiTarget {
    pub fn endpoint(&self) -> Result<reqwest::Url, QueryError> {
        match self {
            Self::Direct { base } => {
                reqwest::Url::parse(base).map_err(|_| QueryError::InvalidBase { url: base.clone() })
            }
            Self::Relay { origin } => reqwest::Url::parse(origin)
                .and_then(|u| u.join(PROXY_PATH))
                .map_err(|_| QueryError::InvalidBase {
                    url: origin.clone(),
                }),
        }
    }

    pub fn is_relay(&self) -> bool {
        matches!(self, Self::Relay { .. })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("Please enter a username first.")]
    MissingUsername,

    #[error("Please provide your API key.")]
    MissingApiKey,

    #[error("Please select a command.")]
    MissingCommand,

    #[error("Unknown command '{command}'.")]
    UnknownCommand { command: String },

    #[error("Please provide a {label} for {command}.")]
    MissingExtra {
        label: &'static str,
        command: Command,
    },

    #[error("invalid API base URL: {url}")]
    InvalidBase { url: String },
}

/// Checks username, API key and command, in that order.
pub fn validate(input: &QueryInput) -> Result<Command, QueryError> {
    let username = input.username.trim();
    let command = input.command.trim();

    if username.is_empty() && command != Command::Comments.as_str() {
        return Err(QueryError::MissingUsername);
    }
    if input.api_key.trim().is_empty() {
        return Err(QueryError::MissingApiKey);
    }
    if command.is_empty() {
        return Err(QueryError::MissingCommand);
    }
    Command::parse(command).ok_or_else(|| QueryError::UnknownCommand {
        command: command.to_string(),
    })
}

/// Builds the request URL for an already validated command.
pub fn build_url(
    input: &QueryInput,
    command: Command,
    target: &ApiTarget,
) -> Result<reqwest::Url, QueryError> {
    let extra_value = input.extra_value.trim();
    let extra = command.extra_param();
    if let Some(extra) = extra {
        if extra.required && extra_value.is_empty() {
            return Err(QueryError::MissingExtra {
                label: extra.label,
                command,
            });
        }
    }

    let mut url = target.endpoint()?;
    let username = input.username.trim();
    let mut owned = vec!["key"];
    if command != Command::Profile {
        owned.push("type");
    }
    if !username.is_empty() {
        owned.push("username");
    }
    if let Some(extra) = extra.filter(|_| !extra_value.is_empty()) {
        owned.push(extra.param_name);
    }
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(name, _)| !owned.contains(&&**name))
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();
    url.set_query(None);
    {
        let mut query = url.query_pairs_mut();
        query.extend_pairs(kept);
        query.append_pair("key", input.api_key.trim());
        if command != Command::Profile {
            query.append_pair("type", command.as_str());
        }
        if !username.is_empty() {
            query.append_pair("username", username);
        }
        if let Some(extra) = extra {
            if !extra_value.is_empty() {
                query.append_pair(extra.param_name, extra_value);
            }
        }
    }
    Ok(url)
}
