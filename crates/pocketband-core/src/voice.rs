//! Voice identifiers: percussion kinds and melodic timbre presets

use serde::{Deserialize, Serialize};

/// The nine fixed percussion voices. String ids are part of the persisted
/// event format and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PercussionKind {
    Kick,
    Snare,
    HihatClosed,
    HihatOpen,
    TomLow,
    TomMid,
    Clap,
    Crash,
    Ride,
}

impl PercussionKind {
    pub const ALL: [PercussionKind; 9] = [
        Self::Kick,
        Self::Snare,
        Self::HihatClosed,
        Self::HihatOpen,
        Self::TomLow,
        Self::TomMid,
        Self::Clap,
        Self::Crash,
        Self::Ride,
    ];

    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "KICK" => Some(Self::Kick),
            "SNARE" => Some(Self::Snare),
            "HIHAT_CLOSED" => Some(Self::HihatClosed),
            "HIHAT_OPEN" => Some(Self::HihatOpen),
            "TOM_LOW" => Some(Self::TomLow),
            "TOM_MID" => Some(Self::TomMid),
            "CLAP" => Some(Self::Clap),
            "CRASH" => Some(Self::Crash),
            "RIDE" => Some(Self::Ride),
            _ => None,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::Kick => "KICK",
            Self::Snare => "SNARE",
            Self::HihatClosed => "HIHAT_CLOSED",
            Self::HihatOpen => "HIHAT_OPEN",
            Self::TomLow => "TOM_LOW",
            Self::TomMid => "TOM_MID",
            Self::Clap => "CLAP",
            Self::Crash => "CRASH",
            Self::Ride => "RIDE",
        }
    }
}

/// Melodic timbre presets. The four raw waveforms double as presets so the
/// synth keyboard can expose them directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MelodicPreset {
    Piano,
    Pad,
    EightBit,
    Sax,
    Flute,
    Guitar,
    Bass,
    Violin,
    Cello,
    Ukulele,
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl MelodicPreset {
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "piano" => Some(Self::Piano),
            "pad" => Some(Self::Pad),
            "8bit" => Some(Self::EightBit),
            "sax" => Some(Self::Sax),
            "flute" => Some(Self::Flute),
            "guitar" => Some(Self::Guitar),
            "bass" => Some(Self::Bass),
            "violin" => Some(Self::Violin),
            "cello" => Some(Self::Cello),
            "ukulele" => Some(Self::Ukulele),
            "sine" => Some(Self::Sine),
            "square" => Some(Self::Square),
            "sawtooth" => Some(Self::Sawtooth),
            "triangle" => Some(Self::Triangle),
            _ => None,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::Piano => "piano",
            Self::Pad => "pad",
            Self::EightBit => "8bit",
            Self::Sax => "sax",
            Self::Flute => "flute",
            Self::Guitar => "guitar",
            Self::Bass => "bass",
            Self::Violin => "violin",
            Self::Cello => "cello",
            Self::Ukulele => "ukulele",
            Self::Sine => "sine",
            Self::Square => "square",
            Self::Sawtooth => "sawtooth",
            Self::Triangle => "triangle",
        }
    }
}

/// Whether an event is a pitched note or a percussion hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Note,
    Percussion,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percussion_id_roundtrip() {
        for kind in PercussionKind::ALL {
            assert_eq!(PercussionKind::from_id(kind.id()), Some(kind));
        }
        assert_eq!(PercussionKind::from_id("COWBELL"), None);
    }

    #[test]
    fn test_preset_id_roundtrip() {
        for id in [
            "piano", "pad", "8bit", "sax", "flute", "guitar", "bass", "violin", "cello",
            "ukulele", "sine", "square", "sawtooth", "triangle",
        ] {
            let preset = MelodicPreset::from_id(id).unwrap();
            assert_eq!(preset.id(), id);
        }
        assert_eq!(MelodicPreset::from_id("theremin"), None);
    }
}
