//! Track representation

use serde::{Deserialize, Serialize};

use crate::event::Event;

/// One recording pass: an ordered list of events. Events are appended in
/// capture order, so timestamps are non-decreasing. After commit the only
/// permitted mutation is the mute flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    pub events: Vec<Event>,
    #[serde(default)]
    pub muted: bool,
}

impl Track {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, events: Vec<Event>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            events,
            muted: false,
        }
    }

    /// Copy for a merged song: fresh id, name qualified with the source
    /// song's title.
    pub fn cloned_for_merge(&self, fresh_id: impl Into<String>, source_title: &str) -> Self {
        Self {
            id: fresh_id.into(),
            display_name: format!("{} - {}", source_title, self.display_name),
            events: self.events.clone(),
            muted: self.muted,
        }
    }
}
