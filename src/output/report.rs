use super::follower::{DetailLine, FollowerView};
use crate::utils::escape_html;

fn render_detail_line(line: &DetailLine) -> String {
    let value = if line.monospace {
        format!("<code>{}</code>", escape_html(&line.value))
    } else {
        escape_html(&line.value)
    };
    format!(
        "<p><strong>{}:</strong> {}</p>",
        escape_html(&line.key),
        value
    )
}

fn render_stat(label: &str, value: &str) -> String {
    format!(
        r#"<div class="stat">
              <span class="stat-label">{}</span>
              <span class="stat-value">{}</span>
            </div>"#,
        escape_html(label),
        escape_html(value)
    )
}

pub fn render_follower(view: &FollowerView, open: bool) -> String {
    let region_html = if view.region.is_empty() {
        String::new()
    } else {
        let flag = if view.flag.is_empty() {
            String::new()
        } else {
            format!("{} ", view.flag)
        };
        format!(
            r#"<span class="region">{}{}</span>"#,
            flag,
            escape_html(&view.region)
        )
    };
    let private_html = if view.is_private {
        r#"<span class="private-tag">PRIVATE</span>"#
    } else {
        ""
    };
    let profile_link = if view.profile_link.is_empty() {
        "#"
    } else {
        view.profile_link.as_str()
    };
    let details: String = view.details.iter().map(render_detail_line).collect();
    let stats = [
        render_stat("Followers", &view.follower_count),
        render_stat("Following", &view.following_count),
        render_stat("Favorites", &view.favorites_count),
        render_stat("Username edited", &view.edited_at),
    ]
    .join("\n            ");

    format!(
        r#"<details class="follower-item"{open}>
      <summary>
        <img src="{avatar}" alt="{nick}" class="avatar" />
        <div class="summary-content">
          <div class="summary-top">
            <span class="nickname">{nick}</span>
            {private_html}
          </div>
          <div class="summary-second">
            <a href="{link}" class="username-link" target="_blank" rel="noopener">@{user}</a>
            {region_html}
          </div>
          <div class="summary-stats">
            {stats}
          </div>
          <div class="summary-bio">{bio}</div>
        </div>
      </summary>
      <div class="details">
        {details}
      </div>
    </details>"#,
        open = if open { " open" } else { "" },
        avatar = escape_html(&view.avatar),
        nick = escape_html(&view.nick_name),
        link = escape_html(profile_link),
        user = escape_html(&view.user_name),
        bio = escape_html(&view.signature),
    )
}

/// The follower list fragment, every entry open or closed together.
pub fn render_follower_list(views: &[FollowerView], open: bool) -> String {
    let items: Vec<String> = views.iter().map(|v| render_follower(v, open)).collect();
    format!(
        "<div class=\"follower-list\">{}</div>",
        items.join("\n")
    )
}

pub fn render_json_block(pretty: &str) -> String {
    format!(
        "<pre id=\"data-preview\">{}</pre>",
        escape_html(pretty)
    )
}

pub fn render_document(title: &str, summary: &[String], body: &str) -> String {
    let summary: String = summary
        .iter()
        .filter(|line| !line.is_empty())
        .map(|line| format!("<span>{}</span>", escape_html(line)))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        r####"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8"/>
  <meta content="width=device-width, initial-scale=1.0" name="viewport"/>
  <title>{title}</title>
  <style>
    body {{ font-family: Inter, sans-serif; background: #f8fafc; color: #0f172a; margin: 0; padding: 2rem; }}
    .meta {{ color: #64748b; font-size: 0.875rem; display: flex; gap: 1rem; margin-bottom: 1rem; }}
    pre {{ background: #0f172a; color: #e2e8f0; padding: 1rem; border-radius: 0.5rem; overflow-x: auto; }}
    .follower-list {{ display: flex; flex-direction: column; gap: 0.75rem; }}
    .follower-item {{ background: #fff; border: 1px solid #e2e8f0; border-radius: 0.75rem; padding: 0.75rem 1rem; }}
    .follower-item summary {{ display: flex; gap: 1rem; cursor: pointer; list-style: none; }}
    .avatar {{ width: 56px; height: 56px; border-radius: 9999px; object-fit: cover; background: #e2e8f0; }}
    .nickname {{ font-weight: 700; }}
    .private-tag {{ margin-left: 0.5rem; font-size: 0.7rem; color: #be123c; font-weight: 700; }}
    .region {{ margin-left: 0.5rem; color: #475569; }}
    .summary-stats {{ display: flex; gap: 1.25rem; margin-top: 0.25rem; }}
    .stat-label {{ display: block; font-size: 0.7rem; color: #64748b; text-transform: uppercase; }}
    .summary-bio {{ margin-top: 0.25rem; color: #334155; white-space: pre-wrap; }}
    .details p {{ margin: 0.2rem 0; font-size: 0.85rem; word-break: break-all; }}
    code {{ background: #f1f5f9; padding: 0 0.25rem; border-radius: 0.25rem; }}
  </style>
</head>
<body>
  <h1>{title}</h1>
  <div class="meta">{summary}</div>
  {body}
</body>
</html>
"####,
        title = escape_html(title),
        summary = summary,
        body = body,
    )
}
