use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::roles::FillRole;

/// Outcome of filling one placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillStatus {
    Filled,
    Skipped,
    NoData,
    Failed,
}

/// Log entry for one placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceholderLog {
    pub id: u32,
    pub role: FillRole,
    pub status: FillStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PlaceholderLog {
    pub fn filled(id: u32, role: FillRole, content: Value) -> Self {
        Self {
            id,
            role,
            status: FillStatus::Filled,
            content: Some(content),
            error: None,
        }
    }

    pub fn status(id: u32, role: FillRole, status: FillStatus) -> Self {
        Self {
            id,
            role,
            status,
            content: None,
            error: None,
        }
    }

    pub fn failed(id: u32, role: FillRole, error: impl ToString) -> Self {
        Self {
            id,
            role,
            status: FillStatus::Failed,
            content: None,
            error: Some(error.to_string()),
        }
    }
}

/// Log entry for one content slide, written to `{stem}.execution.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideLog {
    /// 1-based section number.
    pub slide: usize,
    pub title: String,
    pub layout_idx: usize,
    pub layout_type: String,
    #[serde(default)]
    pub placeholders_found: usize,
    #[serde(default)]
    pub placeholders: Vec<PlaceholderLog>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SlideLog {
    pub fn is_failed(&self) -> bool {
        self.status.as_deref() == Some("failed")
    }

    pub fn filled_count(&self) -> usize {
        self.placeholders
            .iter()
            .filter(|p| p.status == FillStatus::Filled)
            .count()
    }
}
