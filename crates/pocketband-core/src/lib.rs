//! pocketband-core: Domain types and transport logic for the pocketband
//! virtual-instrument studio

pub mod backend;
mod error;
mod event;
pub mod notes;
mod sequencer;
mod song;
pub mod store;
mod track;
pub mod voice;

pub use backend::{AudioBackend, STALE_EVENT_TOLERANCE};
pub use error::{Result, StudioError};
pub use event::Event;
pub use notes::{note_frequency, transpose};
pub use sequencer::{ListenerId, Sequencer, TransportState};
pub use song::Song;
pub use store::{MemorySongStore, SongStore};
pub use track::Track;
pub use voice::{EventKind, MelodicPreset, PercussionKind};
