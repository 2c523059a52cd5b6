use serde_json::{Map, Value};

use crate::utils;

pub const HEADER: [&str; 10] = [
    "username",
    "nickname",
    "follower_count",
    "following_count",
    "total_likes",
    "region",
    "verified",
    "signature",
    "avatar_thumb",
    "profile_link",
];

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// JSON numbers are written bare, everything else quoted.
fn cell(value: Option<&Value>) -> String {
    match value {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Null) | None => quote(""),
        Some(v) => quote(&utils::display_value(v)),
    }
}

fn text_cell(record: &Map<String, Value>, keys: &[&str]) -> String {
    quote(&utils::first_truthy(record, keys))
}

fn row(value: &Value) -> String {
    let empty = Map::new();
    let record = value.as_object().unwrap_or(&empty);
    let verified = if utils::is_truthy(record.get("verified")) {
        "Yes"
    } else {
        "No"
    };
    let signature = utils::first_truthy(record, &["signature"])
        .replace("\r\n", " ")
        .replace('\n', " ");
    [
        text_cell(record, &["username", "uid"]),
        text_cell(record, &["nickname"]),
        cell(record.get("follower_count")),
        cell(record.get("following_count")),
        cell(record.get("total_favorited")),
        text_cell(record, &["region"]),
        quote(verified),
        quote(&signature),
        text_cell(record, &["avatar_thumb", "avatar_larger"]),
        text_cell(record, &["profile_deep_link"]),
    ]
    .join(",")
}

pub fn render_followings(followings: &[Value]) -> String {
    let mut lines = Vec::with_capacity(followings.len() + 1);
    lines.push(HEADER.iter().map(|h| quote(h)).collect::<Vec<_>>().join(","));
    lines.extend(followings.iter().map(row));
    lines.join("\n")
}
