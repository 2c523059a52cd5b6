use serde::Serialize;
use serde_json::{Map, Value};

use crate::utils;

/// Fields already shown in the summary and left out of the detail dump.
pub const SUMMARY_ONLY_KEYS: [&str; 3] = ["avatar_thumb", "avatar_larger", "profile_deep_link"];

/// Opaque tokens shown in monospace.
pub const MONOSPACE_KEYS: [&str; 6] = [
    "aweme_count",
    "commerce_user_level",
    "enterprise_verify_reason",
    "sec_uid",
    "uid",
    "secret",
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DetailLine {
    pub key: String,
    pub value: String,
    pub monospace: bool,
}

/// Display-ready fields of one follower record. Nothing here is escaped yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FollowerView {
    pub avatar: String,
    pub user_name: String,
    pub nick_name: String,
    pub region: String,
    pub flag: String,
    pub follower_count: String,
    pub following_count: String,
    pub favorites_count: String,
    pub edited_at: String,
    pub is_private: bool,
    pub profile_link: String,
    pub signature: String,
    pub details: Vec<DetailLine>,
}

impl FollowerView {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(record) => Self::from_record(record),
            _ => Self::from_record(&Map::new()),
        }
    }

    pub fn from_record(record: &Map<String, Value>) -> Self {
        let avatar = utils::sanitize_url(&utils::first_truthy(
            record,
            &["avatar_thumb", "avatar_larger"],
        ));
        let user_name = utils::first_truthy(record, &["username", "uid"]);
        let nick_name = match utils::first_truthy(record, &["nickname"]) {
            n if n.is_empty() => user_name.clone(),
            n => n,
        };
        let region = utils::first_truthy(record, &["region"]);
        let flag = utils::country_flag(&region);
        let edited_at = if utils::is_truthy(record.get("unique_id_modify_time")) {
            utils::format_timestamp(record.get("unique_id_modify_time"))
        } else {
            String::new()
        };

        Self {
            avatar,
            nick_name,
            flag,
            region,
            follower_count: utils::format_count(record.get("follower_count")),
            following_count: utils::format_count(record.get("following_count")),
            favorites_count: utils::format_count(record.get("total_favorited")),
            edited_at,
            is_private: utils::is_truthy(record.get("is_private")),
            profile_link: utils::sanitize_url(&utils::first_truthy(
                record,
                &["profile_deep_link"],
            )),
            signature: utils::first_truthy(record, &["signature"]),
            details: detail_lines(record),
            user_name,
        }
    }
}

pub fn detail_lines(record: &Map<String, Value>) -> Vec<DetailLine> {
    record
        .iter()
        .filter(|(key, _)| !SUMMARY_ONLY_KEYS.contains(&key.as_str()))
        .map(|(key, value)| DetailLine {
            key: key.clone(),
            value: utils::display_value(value),
            monospace: MONOSPACE_KEYS.contains(&key.as_str()),
        })
        .collect()
}

pub fn build_views(followings: &[Value]) -> Vec<FollowerView> {
    followings.iter().map(FollowerView::from_value).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_record_renders_without_fields() {
        let view = FollowerView::from_value(&json!({}));
        assert_eq!(view.user_name, "");
        assert_eq!(view.nick_name, "");
        assert_eq!(view.avatar, "");
        assert_eq!(view.flag, "");
        assert_eq!(view.edited_at, "");
        assert!(!view.is_private);
        assert!(view.details.is_empty());
    }

    #[test]
    fn non_object_entries_are_empty_records() {
        let view = FollowerView::from_value(&json!("oops"));
        assert_eq!(view, FollowerView::from_value(&json!({})));
    }

    #[test]
    fn nickname_falls_back_to_username_then_uid() {
        let view = FollowerView::from_value(&json!({"uid": "123"}));
        assert_eq!(view.user_name, "123");
        assert_eq!(view.nick_name, "123");

        let view = FollowerView::from_value(&json!({"username": "bob", "nickname": ""}));
        assert_eq!(view.nick_name, "bob");
    }

    #[test]
    fn unsafe_urls_are_dropped() {
        let view = FollowerView::from_value(&json!({
            "avatar_thumb": "javascript:alert(1)",
            "profile_deep_link": "https://example.com/@bob"
        }));
        assert_eq!(view.avatar, "");
        assert_eq!(view.profile_link, "https://example.com/@bob");
    }

    #[test]
    fn avatar_falls_back_to_larger() {
        let view = FollowerView::from_value(&json!({
            "avatar_thumb": "",
            "avatar_larger": "https://cdn.example/a.jpg"
        }));
        assert_eq!(view.avatar, "https://cdn.example/a.jpg");
    }

    #[test]
    fn details_skip_summary_fields_and_flag_tokens() {
        let view = FollowerView::from_value(&json!({
            "username": "bob",
            "avatar_thumb": "https://cdn.example/a.jpg",
            "sec_uid": "MS4w",
            "extra": {"a": [1, 2]},
            "gone": null
        }));
        let keys: Vec<_> = view.details.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys, ["username", "sec_uid", "extra", "gone"]);
        assert!(view.details[1].monospace);
        assert!(!view.details[0].monospace);
        assert_eq!(view.details[2].value, r#"{"a":[1,2]}"#);
        assert_eq!(view.details[3].value, "");
    }

    #[test]
    fn counts_region_and_privacy() {
        let view = FollowerView::from_value(&json!({
            "follower_count": 1500,
            "following_count": "n/a",
            "total_favorited": 2_000_000,
            "region": "US",
            "is_private": true,
            "unique_id_modify_time": 1_700_000_000
        }));
        assert_eq!(view.follower_count, "1,500");
        assert_eq!(view.following_count, "n/a");
        assert_eq!(view.favorites_count, "2,000,000");
        assert_eq!(view.flag, "\u{1F1FA}\u{1F1F8}");
        assert!(view.is_private);
        assert_eq!(view.edited_at, "2023-11-14 22:13:20");
    }
}
