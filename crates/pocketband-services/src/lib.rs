//! pocketband-services: Audio synthesis and persistence services for the
//! pocketband virtual-instrument studio

pub mod audio_io;
pub mod engine;
pub mod store;
pub mod voices;

pub use audio_io::{AudioOutputError, RealtimeOutputStream};
pub use engine::SynthEngine;
pub use store::{FileKeyValueStore, JsonSongStore, KeyValueStore, StoreError};
pub use voices::{Recipe, Voice, VoiceBank, Waveform};
