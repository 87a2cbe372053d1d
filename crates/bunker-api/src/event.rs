//! Change events pushed by the inventory backend.
//!
//! One JSON object per WebSocket text frame. Two producer shapes exist in
//! the wild and both are accepted:
//!
//! ```json
//! { "type": "DELETE", "resourceType": "food", "resourceId": 1, "timestamp": 1718000000000 }
//! { "action": "DELETE", "resourceType": "Food", "resourceId": 1, "message": "Food deleted: Rice" }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::kind::ResourceKind;
use crate::models::RecordId;

/// What happened to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "created",
            Self::Update => "updated",
            Self::Delete => "deleted",
        })
    }
}

/// Event timestamp as sent by the server: epoch millis or a date-time string.
///
/// Informational only; delivery order is not derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Millis(i64),
    Text(String),
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Millis(ms) => match chrono::DateTime::<chrono::Utc>::from_timestamp_millis(*ms) {
                Some(dt) => write!(f, "{}", dt.to_rfc3339()),
                None => write!(f, "{ms}"),
            },
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// One server-side mutation. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    #[serde(rename = "type", alias = "action")]
    pub kind: ChangeKind,

    /// Raw resource type string; see [`resource_kind`](Self::resource_kind).
    pub resource_type: String,

    /// Affected record. `None` means "something of this kind changed".
    #[serde(default)]
    pub resource_id: Option<RecordId>,

    #[serde(default)]
    pub timestamp: Option<Timestamp>,

    /// Human-readable summary from the backend, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ChangeEvent {
    /// Parse a single text frame.
    pub fn parse(text: &str) -> Result<Self, Error> {
        serde_json::from_str(text).map_err(|e| Error::EventParse {
            message: e.to_string(),
            payload: text.chars().take(200).collect(),
        })
    }

    /// Resolve `resource_type` to a known kind, if it names one.
    pub fn resource_kind(&self) -> Option<ResourceKind> {
        ResourceKind::from_wire(&self.resource_type)
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.resource_id {
            Some(id) => write!(f, "{} #{id} {}", self.resource_type, self.kind),
            None => write!(f, "{} {}", self.resource_type, self.kind),
        }
    }
}
