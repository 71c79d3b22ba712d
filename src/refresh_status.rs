//! Progress marker written by the external ingester.
//!
//! The ingester rewrites `refresh_status.json` as it works through the
//! competitor list. This side only reads it; a missing or unreadable marker
//! means no refresh is running.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum RefreshState {
    #[default]
    Idle,
    Running,
    Completed,
    Error,
}

impl From<String> for RefreshState {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "running" => Self::Running,
            "completed" => Self::Completed,
            "error" => Self::Error,
            _ => Self::Idle,
        }
    }
}

impl fmt::Display for RefreshState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RefreshStatus {
    #[serde(default)]
    pub status: RefreshState,
    #[serde(default)]
    pub current_competitor: Option<String>,
    #[serde(default)]
    pub processed: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub percent_complete: u64,
    #[serde(default)]
    pub estimated_seconds_remaining: u64,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl RefreshStatus {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.status == RefreshState::Running
    }
}

/// Read the marker at `path`, falling back to idle
pub async fn read_status(path: &Path) -> RefreshStatus {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return RefreshStatus::idle(),
        Err(e) => {
            tracing::warn!("Failed to read refresh status {}: {}", path.display(), e);
            return RefreshStatus::idle();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(status) => status,
        Err(e) => {
            // The ingester may be mid-write
            tracing::warn!("Malformed refresh status {}: {}", path.display(), e);
            RefreshStatus::idle()
        }
    }
}
