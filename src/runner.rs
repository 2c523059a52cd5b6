use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::client::ApiClient;
use crate::keystore::KeyStore;
use crate::request::{self, ApiTarget, QueryInput};
use crate::session::Session;
use crate::status::Status;
use crate::view::ViewState;

#[derive(Clone, Debug, Default)]
pub struct Options {
    pub target: ApiTarget,
    pub timeout: Option<Duration>,
    pub credentials: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("invalid API target: {url}")]
    InvalidTarget { url: String },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },
}

/// Drives fetches and imports against a session owned by the caller.
#[derive(Clone, Debug)]
pub struct Runner {
    client: ApiClient,
    keystore: Option<KeyStore>,
}

impl Runner {
    pub fn new(options: Options) -> Result<Self, RunnerError> {
        if options.target.endpoint().is_err() {
            let url = match &options.target {
                ApiTarget::Direct { base } => base.clone(),
                ApiTarget::Relay { origin } => origin.clone(),
            };
            return Err(RunnerError::InvalidTarget { url });
        }
        let client = ApiClient::new(options.target, options.timeout)
            .map_err(|source| RunnerError::HttpClientBuild { source })?;
        Ok(Self {
            client,
            keystore: options.credentials.map(KeyStore::new),
        })
    }

    /// Fills a blank API key from the key store.
    pub fn resolve_api_key(&self, input: &mut QueryInput) {
        if !input.api_key.trim().is_empty() {
            return;
        }
        let Some(store) = self.keystore.as_ref() else {
            return;
        };
        match store.load() {
            Ok(Some(key)) => input.api_key = key,
            Ok(None) => {}
            Err(e) => warn!(error = %e, "could not read stored API key"),
        }
    }

    fn remember_key(&self, api_key: &str) {
        if let Some(store) = self.keystore.as_ref() {
            if let Err(e) = store.save(api_key.trim()) {
                warn!(error = %e, "could not store API key");
            }
        }
    }

    /// Validates the input, performs one request and, on success, replaces the
    /// session and resets the view.
    pub async fn fetch(
        &self,
        input: &QueryInput,
        session: &mut Session,
        view: &mut ViewState,
    ) -> Status {
        let command = match request::validate(input) {
            Ok(command) => command,
            Err(e) => return Status::error(e.to_string()),
        };
        self.remember_key(&input.api_key);

        let url = match request::build_url(input, command, self.client.target()) {
            Ok(url) => url,
            Err(e) => return Status::error(e.to_string()),
        };

        match self.client.fetch(url, command).await {
            Ok(data) => {
                session.replace(data);
                *view = ViewState::for_session(session);
                info!(
                    command = %command,
                    records = session.record_count(),
                    "fetch complete"
                );
                Status::success("Data fetched successfully.")
            }
            Err(e) => Status::error(e.status_message()),
        }
    }
}

pub fn import_file(path: &Path, session: &mut Session, view: &mut ViewState) -> Status {
    match session.import_file(path) {
        Ok(()) => {
            *view = ViewState::for_session(session);
            info!(path = %path.display(), records = session.record_count(), "import complete");
            Status::success("Import complete.")
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "import failed");
            Status::error(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::Tone;
    use serde_json::json;

    fn input(username: &str, key: &str, command: &str, extra: &str) -> QueryInput {
        QueryInput {
            username: username.to_string(),
            api_key: key.to_string(),
            command: command.to_string(),
            extra_value: extra.to_string(),
        }
    }

    fn runner(base: String, credentials: Option<PathBuf>) -> Runner {
        Runner::new(Options {
            target: ApiTarget::Direct { base },
            timeout: None,
            credentials,
        })
        .unwrap()
    }

    #[test]
    fn invalid_target_is_rejected() {
        let err = Runner::new(Options {
            target: ApiTarget::Direct {
                base: "not a url".to_string(),
            },
            ..Options::default()
        })
        .unwrap_err();
        assert!(matches!(err, RunnerError::InvalidTarget { .. }));
    }

    #[tokio::test]
    async fn validation_failure_makes_no_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let runner = runner(format!("{}/", server.url()), None);
        let mut session = Session::new();
        let mut view = ViewState::default();

        let status = runner
            .fetch(&input("", "k", "profile", ""), &mut session, &mut view)
            .await;
        assert_eq!(status, Status::error("Please enter a username first."));
        assert!(session.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn success_replaces_session_and_resets_view() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("key".into(), "k".into()),
                mockito::Matcher::UrlEncoded("type".into(), "following".into()),
                mockito::Matcher::UrlEncoded("username".into(), "bob".into()),
                mockito::Matcher::UrlEncoded("limit".into(), "5".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"followings":[{"username":"a"}]}"#)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let creds = dir.path().join("credentials.yml");
        let runner = runner(format!("{}/", server.url()), Some(creds.clone()));

        let mut session = Session::new();
        session.replace(json!({"old": true}));
        let mut view = ViewState::for_session(&session);

        let status = runner
            .fetch(&input("bob", "k", "following", "5"), &mut session, &mut view)
            .await;
        assert_eq!(status.tone, Tone::Success);
        assert!(view.list_available());
        assert!(!view.details_expanded());
        assert_eq!(session.data(), Some(&json!({"followings": [{"username": "a"}]})));
        assert_eq!(KeyStore::new(creds).load().unwrap().as_deref(), Some("k"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn failure_keeps_previous_session() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/")
            .match_query(mockito::Matcher::Any)
            .with_status(403)
            .with_body(r#"{"error":"Forbidden"}"#)
            .create_async()
            .await;
        let runner = runner(format!("{}/", server.url()), None);
        let mut session = Session::new();
        session.replace(json!({"old": true}));
        let before = session.clone();
        let mut view = ViewState::for_session(&session);

        let status = runner
            .fetch(&input("bob", "k", "stories", ""), &mut session, &mut view)
            .await;
        assert_eq!(
            status,
            Status::error("Fetch failed: Forbidden This endpoint may require a lifetime API key.")
        );
        assert_eq!(session, before);
    }

    #[tokio::test]
    async fn key_is_stored_before_extra_check() {
        let dir = tempfile::tempdir().unwrap();
        let creds = dir.path().join("credentials.yml");
        let runner = runner("http://127.0.0.1:9/".to_string(), Some(creds.clone()));
        let mut session = Session::new();
        let mut view = ViewState::default();

        let status = runner
            .fetch(&input("", "secret", "comments", ""), &mut session, &mut view)
            .await;
        assert_eq!(status, Status::error("Please provide a Video URL for comments."));
        assert_eq!(KeyStore::new(creds).load().unwrap().as_deref(), Some("secret"));
    }

    #[test]
    fn blank_key_is_filled_from_store() {
        let dir = tempfile::tempdir().unwrap();
        let creds = dir.path().join("credentials.yml");
        KeyStore::new(&creds).save("stored").unwrap();
        let runner = runner("http://127.0.0.1:9/".to_string(), Some(creds));

        let mut query = input("bob", "", "profile", "");
        runner.resolve_api_key(&mut query);
        assert_eq!(query.api_key, "stored");

        let mut query = input("bob", "given", "profile", "");
        runner.resolve_api_key(&mut query);
        assert_eq!(query.api_key, "given");
    }

    #[test]
    fn import_reports_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{").unwrap();
        let mut session = Session::new();
        let mut view = ViewState::default();
        let status = import_file(&path, &mut session, &mut view);
        assert_eq!(status, Status::error("Import failed. Please upload valid JSON."));
        assert!(session.is_empty());
    }

    #[test]
    fn import_reports_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let mut session = Session::new();
        session.replace(json!({"kept": true}));
        let mut view = ViewState::for_session(&session);
        let status = import_file(&path, &mut session, &mut view);
        assert!(status.is_error());
        assert!(status.message.starts_with("failed to read import file"));
        assert!(status.message.contains("missing.json"));
        assert_eq!(session.data(), Some(&json!({"kept": true})));
    }
}
