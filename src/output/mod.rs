pub mod csv;
pub mod follower;
pub mod report;

use crate::session::{ExportError, Session};
use crate::view::{ViewMode, ViewState};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Html,
    Csv,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "html" | "htm" => Some(Self::Html),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        return Some(OutputFormat::Html);
    }
    if lower.ends_with(".csv") {
        return Some(OutputFormat::Csv);
    }
    None
}

/// Raw view: the whole payload pretty-printed.
pub fn render_json(session: &Session) -> Result<String, ExportError> {
    session.export_json()
}

pub fn render_csv(session: &Session) -> Result<String, ExportError> {
    let followings = session.followings().ok_or(ExportError::NoFollowings)?;
    Ok(csv::render_followings(followings))
}

/// The active view as a standalone HTML document.
pub fn render_html(session: &Session, view: &ViewState) -> Result<String, ExportError> {
    let summary = [
        view.record_count_label(session),
        session.last_updated_label(),
    ];
    match view.mode() {
        ViewMode::Json => {
            let pretty = session.export_json()?;
            Ok(report::render_document(
                "API Data",
                &summary,
                &report::render_json_block(&pretty),
            ))
        }
        ViewMode::List => {
            let followings = session.followings().ok_or(ExportError::NoFollowings)?;
            let views = follower::build_views(followings);
            Ok(report::render_document(
                "Following List",
                &summary,
                &report::render_follower_list(&views, view.details_expanded()),
            ))
        }
    }
}

/// Terminal rendering of the active view.
pub fn render_text(session: &Session, view: &ViewState) -> Result<String, ExportError> {
    if view.mode() == ViewMode::Json {
        return session.export_json();
    }
    let followings = session.followings().ok_or(ExportError::NoFollowings)?;
    let mut out = String::new();
    for v in follower::build_views(followings) {
        out.push_str(&v.nick_name);
        if !v.user_name.is_empty() {
            out.push_str(&format!(" @{}", v.user_name));
        }
        if v.is_private {
            out.push_str(" [PRIVATE]");
        }
        if !v.region.is_empty() {
            out.push_str(&format!(" {} {}", v.flag, v.region).replace("  ", " "));
        }
        out.push('\n');
        out.push_str(&format!(
            "  followers {} :: following {} :: favorites {}",
            v.follower_count, v.following_count, v.favorites_count
        ));
        if !v.edited_at.is_empty() {
            out.push_str(&format!(" :: username edited {}", v.edited_at));
        }
        out.push('\n');
        if !v.signature.is_empty() {
            out.push_str(&format!("  {}\n", v.signature.replace('\n', " ")));
        }
        if view.details_expanded() {
            for line in &v.details {
                out.push_str(&format!("    {}: {}\n", line.key, line.value));
            }
        }
    }
    Ok(out)
}

pub fn render(
    format: OutputFormat,
    session: &Session,
    view: &ViewState,
) -> Result<String, ExportError> {
    match format {
        OutputFormat::Json => render_json(session),
        OutputFormat::Html => render_html(session, view),
        OutputFormat::Csv => render_csv(session),
    }
}
