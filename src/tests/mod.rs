use serde_json::json;

use crate::command::Command;
use crate::request::{ApiTarget, QueryInput};
use crate::session::Session;
use crate::status::{Status, Tone};
use crate::view::{ViewMode, ViewState};

fn unescape_html(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&amp;", "&")
}

fn query(username: &str, command: &str, extra: &str) -> QueryInput {
    QueryInput {
        username: username.to_string(),
        api_key: "k".to_string(),
        command: command.to_string(),
        extra_value: extra.to_string(),
    }
}

#[test]
fn escaped_text_has_no_markup_and_reads_back() {
    for input in ["&<>\"'", "Tom & \"Jerry\" <b>'hi'</b>", "&amp;", "plain"] {
        let escaped = crate::utils::escape_html(input);
        assert!(!escaped.contains('<'));
        assert!(!escaped.contains('>'));
        assert!(!escaped.contains('"'));
        assert!(!escaped.contains('\''));
        assert_eq!(unescape_html(&escaped), input);
    }
}

#[test]
fn sanitizer_drops_script_urls() {
    assert_eq!(crate::utils::sanitize_url("javascript:alert(1)"), "");
    assert_eq!(crate::utils::sanitize_url("data:text/html,hi"), "");
    assert_eq!(
        crate::utils::sanitize_url("https://example.com/u/a?x=1"),
        "https://example.com/u/a?x=1"
    );
}

#[test]
fn flag_needs_exactly_two_letters() {
    assert_eq!(crate::utils::country_flag("US"), "\u{1F1FA}\u{1F1F8}");
    assert_eq!(crate::utils::country_flag("USA"), "");
    assert_eq!(crate::utils::country_flag(""), "");
}

#[test]
fn export_then_import_keeps_structure() {
    let mut original = Session::new();
    original.replace(json!({
        "followings": [{"username": "a", "follower_count": 1500}],
        "total": 1,
        "cursor": null
    }));
    let text = original.export_json().unwrap();

    let mut restored = Session::new();
    restored.import_str(&text).unwrap();
    assert_eq!(restored.data(), original.data());
    assert_eq!(restored.record_count(), original.record_count());
}

#[test]
fn lifetime_and_rate_limit_hints() {
    let err = crate::client::classify_response(403, "{}", Command::Stories).unwrap_err();
    assert!(err.to_string().contains("lifetime API key"));

    let err = crate::client::classify_response(429, "{}", Command::Profile).unwrap_err();
    assert!(err.to_string().contains("Rate limit hit"));
}

#[test]
fn server_error_surfaces_api_message() {
    let err =
        crate::client::classify_response(500, r#"{"error":"bad key"}"#, Command::Profile).unwrap_err();
    assert!(err.status_message().contains("bad key"));
}

#[test]
fn csv_line_for_single_following() {
    let mut session = Session::new();
    session.replace(json!({"followings":[{"username":"a","follower_count":1500}]}));
    let csv = crate::output::render_csv(&session).unwrap();
    let lines: Vec<_> = csv.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("\"username\",\"nickname\","));
    assert_eq!(lines[1], r#""a","",1500,"","","","No","","","""#);
}

#[test]
fn list_toggle_without_followings_reports_error() {
    let mut session = Session::new();
    session.replace(json!({"profile": {"username": "a"}}));
    let mut view = ViewState::for_session(&session);
    let status = view.toggle_view(&session).unwrap_err();
    assert_eq!(status.tone, Tone::Error);
    assert_eq!(view.mode(), ViewMode::Json);
}

#[tokio::test]
async fn fetch_through_relay_reaches_upstream() {
    let mut upstream = mockito::Server::new_async().await;
    let mock = upstream
        .mock("GET", "/")
        .match_query(mockito::Matcher::AllOf(vec![
            mockito::Matcher::UrlEncoded("key".into(), "k".into()),
            mockito::Matcher::UrlEncoded("type".into(), "following".into()),
            mockito::Matcher::UrlEncoded("username".into(), "bob".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"followings":[{"username":"a"},{"username":"b"}]}"#)
        .create_async()
        .await;

    let state = crate::relay::RelayState::new(&format!("{}/", upstream.url())).unwrap();
    let app = crate::relay::router(state, None);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let runner = crate::runner::Runner::new(crate::runner::Options {
        target: ApiTarget::Relay {
            origin: format!("http://{addr}"),
        },
        ..crate::runner::Options::default()
    })
    .unwrap();
    let mut session = Session::new();
    let mut view = ViewState::default();
    let status = runner
        .fetch(&query("bob", "following", ""), &mut session, &mut view)
        .await;

    assert_eq!(status, Status::success("Data fetched successfully."));
    assert!(view.list_available());
    assert_eq!(session.followings().map(|f| f.len()), Some(2));
    mock.assert_async().await;
    server.abort();
}

#[tokio::test]
async fn relay_passes_upstream_errors_through() {
    let mut upstream = mockito::Server::new_async().await;
    let _mock = upstream
        .mock("GET", "/")
        .match_query(mockito::Matcher::Any)
        .with_status(500)
        .with_body(r#"{"error":"bad key"}"#)
        .create_async()
        .await;

    let state = crate::relay::RelayState::new(&format!("{}/", upstream.url())).unwrap();
    let app = crate::relay::router(state, None);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let runner = crate::runner::Runner::new(crate::runner::Options {
        target: ApiTarget::Relay {
            origin: format!("http://{addr}"),
        },
        ..crate::runner::Options::default()
    })
    .unwrap();
    let mut session = Session::new();
    session.replace(json!({"kept": true}));
    let mut view = ViewState::for_session(&session);
    let status = runner
        .fetch(&query("bob", "profile", ""), &mut session, &mut view)
        .await;

    assert!(status.is_error());
    assert!(status.message.contains("bad key"));
    assert_eq!(session.data(), Some(&json!({"kept": true})));
    server.abort();
}
