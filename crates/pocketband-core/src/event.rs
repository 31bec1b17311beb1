//! Timestamped performance events

use serde::{Deserialize, Serialize};

use crate::voice::EventKind;

/// One captured performance action. Timestamps are seconds relative to the
/// start of the recording pass that produced the event. Field names follow
/// the persisted JSON contract shared with other frontends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Seconds from the recording origin, never negative.
    #[serde(rename = "timestampSeconds")]
    pub timestamp: f64,
    /// Melodic preset id for notes ("piano", "guitar", ...); the triggering
    /// surface's id for percussion ("drums").
    #[serde(rename = "voiceOrInstrument")]
    pub instrument: String,
    /// Note name ("A4") for notes, percussion id ("KICK") for hits.
    #[serde(rename = "noteOrVoiceId")]
    pub note: String,
    pub kind: EventKind,
}

impl Event {
    pub fn new(timestamp: f64, instrument: impl Into<String>, note: impl Into<String>, kind: EventKind) -> Self {
        Self {
            timestamp,
            instrument: instrument.into(),
            note: note.into(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_field_names() {
        let event = Event::new(0.5, "drums", "KICK", EventKind::Percussion);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["timestampSeconds"], 0.5);
        assert_eq!(json["voiceOrInstrument"], "drums");
        assert_eq!(json["noteOrVoiceId"], "KICK");
        assert_eq!(json["kind"], "percussion");
    }

    #[test]
    fn test_event_kind_json() {
        let event = Event::new(0.0, "piano", "C4", EventKind::Note);
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
        assert!(json.contains("\"kind\":\"note\""));
    }
}
