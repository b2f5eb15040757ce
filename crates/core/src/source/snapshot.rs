//! Dehydrated source snapshots
//!
//! A snapshot is the persisted, JSON-compatible form of a source. Credential
//! fields are always encrypted secure-strings and the recorded status is
//! always `locked`, regardless of the live source's state at dehydration
//! time.

use serde::{Deserialize, Serialize};

use super::credentials::SecureString;
use super::source::Status;

/// Colour applied when a snapshot carries none
pub const DEFAULT_COLOUR: &str = "#000000";
/// Order applied when a snapshot carries none
pub const DEFAULT_ORDER: u64 = 1000;

/// Persisted form of an [`ArchiveSource`](super::ArchiveSource)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSnapshot {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colour: Option<String>,
    /// `Some(0)` is a legal explicit order, distinct from `None` (unset);
    /// unset falls back to [`DEFAULT_ORDER`] on rehydration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u64>,
    pub source_credentials: SecureString,
    pub archive_credentials: SecureString,
    pub status: Status,
}

impl SourceSnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
