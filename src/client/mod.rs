pub mod classify;

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

pub use classify::{classify_response, compose_error_message, FetchError};

use crate::command::Command;
use crate::request::ApiTarget;

pub const ACCEPT: &str = "application/json, text/plain, */*";

/// Performs the single outbound GET for a query.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    target: ApiTarget,
}

impl ApiClient {
    pub fn new(target: ApiTarget, timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            target,
        })
    }

    pub fn target(&self) -> &ApiTarget {
        &self.target
    }

    fn transport_error(&self, err: reqwest::Error) -> FetchError {
        let message = err.to_string();
        if err.is_connect()
            || err.is_timeout()
            || err.is_request()
            || classify::is_network_message(&message)
        {
            warn!(error = %message, "request did not reach the API");
            FetchError::Network {
                hint: classify::network_hint(self.target.is_relay()),
            }
        } else {
            FetchError::Other(message)
        }
    }

    pub async fn fetch(&self, url: reqwest::Url, command: Command) -> Result<Value, FetchError> {
        debug!(command = %command, relay = self.target.is_relay(), "fetching");
        let resp = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .header(reqwest::header::CACHE_CONTROL, "no-store")
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let status = resp.status().as_u16();
        let raw_text = resp.text().await.map_err(|e| self.transport_error(e))?;
        debug!(status, bytes = raw_text.len(), "response received");
        classify_response(status, &raw_text, command)
    }
}
