//! Song persistence over an injected key-value interface

use std::fs;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, warn};

use pocketband_core::{Song, SongStore};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Corrupt song data: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// String key-value storage, the narrow interface every host platform can
/// provide (cloud bridge, browser storage, plain files).
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> bool;
}

/// Key-value store backed by one file per key under a directory. The local
/// store that works everywhere.
#[derive(Debug)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&mut self, key: &str, value: &str) -> bool {
        if let Err(e) = fs::create_dir_all(&self.dir) {
            warn!("Failed to create store directory: {e}");
            return false;
        }
        match fs::write(self.path_for(key), value) {
            Ok(()) => true,
            Err(e) => {
                warn!(key, "Failed to write store entry: {e}");
                false
            }
        }
    }
}

const SONGS_KEY: &str = "pocketband_songs";

/// Song library serialized as JSON under a fixed key. Corrupt or missing
/// data resets to an empty library; write failures are reported, never
/// raised.
pub struct JsonSongStore<S: KeyValueStore> {
    backend: S,
}

impl<S: KeyValueStore> JsonSongStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    fn read(&self) -> Result<Vec<Song>, StoreError> {
        match self.backend.get(SONGS_KEY) {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }
}

impl<S: KeyValueStore> SongStore for JsonSongStore<S> {
    fn load(&mut self) -> Vec<Song> {
        match self.read() {
            Ok(songs) => {
                debug!(count = songs.len(), "Loaded song library");
                songs
            }
            Err(e) => {
                warn!("Resetting corrupt song library: {e}");
                Vec::new()
            }
        }
    }

    fn store(&mut self, songs: &[Song]) -> bool {
        let json = match serde_json::to_string(songs) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize song library: {e}");
                return false;
            }
        };
        self.backend.set(SONGS_KEY, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use pocketband_core::{Event, EventKind, Track};

    #[derive(Default)]
    struct MemoryKv(HashMap<String, String>);

    impl KeyValueStore for MemoryKv {
        fn get(&self, key: &str) -> Option<String> {
            self.0.get(key).cloned()
        }

        fn set(&mut self, key: &str, value: &str) -> bool {
            self.0.insert(key.to_string(), value.to_string());
            true
        }
    }

    struct FailingKv;

    impl KeyValueStore for FailingKv {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }

        fn set(&mut self, _key: &str, _value: &str) -> bool {
            false
        }
    }

    fn sample_song() -> Song {
        Song::new(
            "1",
            "Jam",
            1_700_000_000,
            vec![Track::new(
                "t1",
                "Track 1",
                vec![Event::new(0.0, "drums", "KICK", EventKind::Percussion)],
            )],
        )
    }

    #[test]
    fn test_roundtrip() {
        let mut store = JsonSongStore::new(MemoryKv::default());
        assert!(store.store(&[sample_song()]));
        let songs = store.load();
        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].title, "Jam");
        assert_eq!(songs[0].tracks[0].events[0].note, "KICK");
    }

    #[test]
    fn test_missing_data_loads_empty() {
        let mut store = JsonSongStore::new(MemoryKv::default());
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_corrupt_data_resets_to_empty() {
        let mut kv = MemoryKv::default();
        kv.set(SONGS_KEY, "{not json!");
        let mut store = JsonSongStore::new(kv);
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_write_failure_is_reported_not_raised() {
        let mut store = JsonSongStore::new(FailingKv);
        assert!(!store.store(&[sample_song()]));
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = std::env::temp_dir().join(format!("pocketband-test-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);

        let mut store = JsonSongStore::new(FileKeyValueStore::new(&dir));
        assert!(store.store(&[sample_song()]));
        assert_eq!(store.load().len(), 1);

        let _ = fs::remove_dir_all(&dir);
    }
}
