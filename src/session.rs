use std::path::Path;

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::utils;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read import file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Import failed. Please upload valid JSON.")]
    InvalidJson(#[source] serde_json::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExportError {
    #[error("No data to export.")]
    Empty,

    #[error("No following data to export.")]
    NoFollowings,
}

/// The most recently fetched or imported payload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
    data: Option<Value>,
    updated_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_none()
    }

    pub fn replace(&mut self, data: Value) {
        self.replace_at(data, Utc::now());
    }

    pub fn replace_at(&mut self, data: Value, at: DateTime<Utc>) {
        self.data = Some(data);
        self.updated_at = Some(at);
    }

    pub fn clear(&mut self) {
        self.data = None;
        self.updated_at = None;
    }

    /// Array length, or the number of top-level keys for an object.
    pub fn record_count(&self) -> usize {
        match &self.data {
            Some(Value::Array(items)) => items.len(),
            Some(Value::Object(map)) => map.len(),
            _ => 0,
        }
    }

    /// The `followings` list when present and non-empty.
    pub fn followings(&self) -> Option<&[Value]> {
        match self.data.as_ref()?.get("followings")? {
            Value::Array(items) if !items.is_empty() => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn has_followings(&self) -> bool {
        self.followings().is_some()
    }

    pub fn last_updated_label(&self) -> String {
        self.updated_at
            .map(|at| format!("Last updated: {}", utils::format_datetime(&at)))
            .unwrap_or_default()
    }

    /// Replaces the session with the parsed text. On failure nothing changes.
    pub fn import_str(&mut self, text: &str) -> Result<(), ImportError> {
        let parsed: Value = serde_json::from_str(text).map_err(ImportError::InvalidJson)?;
        self.replace(parsed);
        Ok(())
    }

    pub fn import_file(&mut self, path: &Path) -> Result<(), ImportError> {
        let text = std::fs::read_to_string(path).map_err(|source| ImportError::Read {
            path: path.display().to_string(),
            source,
        })?;
        self.import_str(&text)
    }

    pub fn export_json(&self) -> Result<String, ExportError> {
        let data = self.data.as_ref().ok_or(ExportError::Empty)?;
        serde_json::to_string_pretty(data).map_err(|_| ExportError::Empty)
    }
}
