//! Which rendering of the session is active, and whether the follower details
//! are expanded.

use crate::session::Session;
use crate::status::Status;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Json,
    List,
}

impl ViewMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "json" | "raw" => Some(Self::Json),
            "list" | "table" | "followings" => Some(Self::List),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewState {
    mode: ViewMode,
    details_expanded: bool,
    list_available: bool,
}

impl ViewState {
    /// Fresh state after a fetch or import: JSON view, details collapsed.
    pub fn for_session(session: &Session) -> Self {
        Self {
            mode: ViewMode::Json,
            details_expanded: false,
            list_available: session.has_followings(),
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn details_expanded(&self) -> bool {
        self.details_expanded
    }

    pub fn list_available(&self) -> bool {
        self.list_available
    }

    pub fn toggle_view(&mut self, session: &Session) -> Result<ViewMode, Status> {
        match self.mode {
            ViewMode::Json => {
                if !session.has_followings() {
                    return Err(Status::error(
                        "No following data to display. Try fetching the following list first.",
                    ));
                }
                self.mode = ViewMode::List;
            }
            ViewMode::List => self.mode = ViewMode::Json,
        }
        Ok(self.mode)
    }

    /// Flips every detail entry open or closed. Does nothing without a list.
    pub fn toggle_details(&mut self) -> bool {
        if self.mode == ViewMode::List && self.list_available {
            self.details_expanded = !self.details_expanded;
        }
        self.details_expanded
    }

    pub fn toggle_view_label(&self) -> &'static str {
        match self.mode {
            ViewMode::Json => "Show Following List",
            ViewMode::List => "Back to JSON View",
        }
    }

    pub fn toggle_details_label(&self) -> &'static str {
        if self.details_expanded {
            "Collapse All"
        } else {
            "Expand All"
        }
    }

    pub fn record_count_label(&self, session: &Session) -> String {
        if session.is_empty() {
            return "No data loaded.".to_string();
        }
        let count = match self.mode {
            ViewMode::Json => session.record_count(),
            ViewMode::List => session.followings().map(|f| f.len()).unwrap_or(0),
        };
        format!("Records: {count}")
    }
}
