//! Song persistence seam

use crate::song::Song;

/// Injected persistence for the song library. Implementations must never
/// panic on corrupt or missing data: `load` falls back to an empty list and
/// `store` reports failure as `false`.
pub trait SongStore {
    /// Read every persisted song. Corrupt data resets to empty.
    fn load(&mut self) -> Vec<Song>;

    /// Replace the persisted song list. Returns false on write failure;
    /// callers keep their in-memory state either way.
    fn store(&mut self, songs: &[Song]) -> bool;
}

/// In-memory store for tests and demos.
#[derive(Debug, Default)]
pub struct MemorySongStore {
    songs: Vec<Song>,
}

impl MemorySongStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }
}

impl SongStore for MemorySongStore {
    fn load(&mut self) -> Vec<Song> {
        self.songs.clone()
    }

    fn store(&mut self, songs: &[Song]) -> bool {
        self.songs = songs.to_vec();
        true
    }
}
