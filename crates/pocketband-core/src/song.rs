//! Persisted songs

use serde::{Deserialize, Serialize};

use crate::track::Track;

/// A named, saved collection of tracks. Immutable after creation except
/// for deletion from the library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: String,
    pub title: String,
    /// Unix epoch seconds at creation time.
    #[serde(rename = "createdAt")]
    pub created_at: u64,
    pub tracks: Vec<Track>,
}

impl Song {
    pub fn new(id: impl Into<String>, title: impl Into<String>, created_at: u64, tracks: Vec<Track>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            created_at,
            tracks,
        }
    }
}
