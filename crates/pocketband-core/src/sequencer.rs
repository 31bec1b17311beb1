//! Transport state machine, recording, playback and the song library

use std::time::{SystemTime, UNIX_EPOCH};

use crate::backend::AudioBackend;
use crate::error::{Result, StudioError};
use crate::event::Event;
use crate::song::Song;
use crate::store::SongStore;
use crate::track::Track;
use crate::voice::EventKind;

/// Transport state. Recording and Playing are mutually exclusive; invalid
/// transitions are rejected without touching state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Idle,
    Recording,
    Playing,
}

/// Handle returned by [`Sequencer::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut()>;

/// Owns the live session: transport state, the in-progress event log, the
/// committed track list and the song library cache. All sound goes through
/// the injected [`AudioBackend`]; all persistence through the injected
/// [`SongStore`].
pub struct Sequencer<B: AudioBackend, S: SongStore> {
    backend: B,
    store: S,
    state: TransportState,
    record_origin: f64,
    pending: Vec<Event>,
    tracks: Vec<Track>,
    songs: Vec<Song>,
    previewing: Option<String>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener_id: u64,
    session_epoch_ms: u128,
    next_id: u64,
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn epoch_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// Schedule every event of every non-muted track against one shared origin.
/// A single pass with no polling, so scheduling cost cannot drift into
/// playback timing.
fn schedule_tracks<B: AudioBackend>(backend: &mut B, tracks: &[Track], origin: f64) {
    for track in tracks.iter().filter(|t| !t.muted) {
        for event in &track.events {
            backend.schedule_event(event, origin);
        }
    }
}

impl<B: AudioBackend, S: SongStore> Sequencer<B, S> {
    pub fn new(backend: B, mut store: S) -> Self {
        let songs = store.load();
        Self {
            backend,
            store,
            state: TransportState::Idle,
            record_origin: 0.0,
            pending: Vec::new(),
            tracks: Vec::new(),
            songs,
            previewing: None,
            listeners: Vec::new(),
            next_listener_id: 0,
            session_epoch_ms: epoch_millis(),
            next_id: 0,
        }
    }

    // --- State accessors ---

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == TransportState::Recording
    }

    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }

    pub fn has_tracks(&self) -> bool {
        !self.tracks.is_empty()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn previewing(&self) -> Option<&str> {
        self.previewing.as_deref()
    }

    // --- Sound passthrough ---

    /// Forward to the backend for first-gesture initialization.
    pub fn ensure_ready(&mut self) {
        self.backend.ensure_ready();
    }

    /// Immediate audible feedback for instrument widgets. Does not log;
    /// capture goes through [`Sequencer::log_event`].
    pub fn trigger(&mut self, instrument: &str, note: &str, kind: EventKind) {
        self.backend.ensure_ready();
        self.backend.trigger(instrument, note, kind, None);
    }

    // --- Transport ---

    /// Begin a recording pass. If tracks are already committed they start
    /// playing from the same origin as backing, so the new pass is
    /// time-aligned with them (overdub). Rejected unless Idle.
    pub fn start_recording(&mut self) -> bool {
        if self.state != TransportState::Idle {
            return false;
        }
        self.backend.ensure_ready();
        self.state = TransportState::Recording;
        self.record_origin = self.backend.now();
        self.pending.clear();
        if !self.tracks.is_empty() {
            schedule_tracks(&mut self.backend, &self.tracks, self.record_origin);
        }
        self.notify();
        true
    }

    /// End the recording pass. Commits a track only when at least one event
    /// was captured.
    pub fn stop_recording(&mut self) {
        if self.state != TransportState::Recording {
            return;
        }
        self.state = TransportState::Idle;
        self.backend.stop_all();
        if !self.pending.is_empty() {
            let id = self.fresh_id();
            let name = format!("Track {}", self.tracks.len() + 1);
            let events = std::mem::take(&mut self.pending);
            self.tracks.push(Track::new(id, name, events));
        }
        self.notify();
    }

    /// Start or stop multitrack playback. Rejected while Recording, and
    /// when starting with no committed tracks.
    pub fn toggle_playback(&mut self) -> bool {
        match self.state {
            TransportState::Recording => false,
            TransportState::Playing => {
                self.state = TransportState::Idle;
                self.backend.stop_all();
                self.notify();
                true
            }
            TransportState::Idle => {
                if self.tracks.is_empty() {
                    return false;
                }
                self.backend.ensure_ready();
                self.backend.stop_all();
                self.previewing = None;
                let origin = self.backend.now();
                schedule_tracks(&mut self.backend, &self.tracks, origin);
                self.state = TransportState::Playing;
                self.notify();
                true
            }
        }
    }

    /// Capture one performance event. No-op unless Recording.
    pub fn log_event(&mut self, instrument: &str, note: &str, kind: EventKind) {
        if self.state != TransportState::Recording {
            return;
        }
        let timestamp = (self.backend.now() - self.record_origin).max(0.0);
        self.pending.push(Event::new(timestamp, instrument, note, kind));
    }

    // --- Session ---

    /// Discard the live session and silence everything.
    pub fn clear_session(&mut self) {
        self.tracks.clear();
        self.pending.clear();
        self.state = TransportState::Idle;
        self.backend.stop_all();
        self.notify();
    }

    /// Remove a live track by position.
    pub fn delete_track(&mut self, index: usize) -> Result<Track> {
        if index >= self.tracks.len() {
            return Err(StudioError::TrackNotFound(index));
        }
        let track = self.tracks.remove(index);
        self.notify();
        Ok(track)
    }

    /// Mute or unmute a live track. The only mutation tracks allow.
    pub fn set_track_muted(&mut self, index: usize, muted: bool) -> Result<()> {
        let track = self
            .tracks
            .get_mut(index)
            .ok_or(StudioError::TrackNotFound(index))?;
        track.muted = muted;
        self.notify();
        Ok(())
    }

    // --- Library ---

    /// Save the live tracks as a new song. The song gets its own deep copy
    /// of the tracks, so later session edits never touch it. The store sync
    /// result is logged by the store implementation; the song stays in the
    /// in-memory library either way.
    pub fn save(&mut self, title: &str) -> String {
        let id = self.fresh_id();
        let song = Song::new(id.clone(), title, epoch_secs(), self.tracks.clone());
        self.songs.push(song);
        self.sync_store();
        self.notify();
        id
    }

    /// Build a new song from deep copies of every track of every named
    /// song. Copies get fresh ids and names qualified with the source
    /// title; the sources are left untouched. A missing id fails the whole
    /// merge without changing anything.
    pub fn merge(&mut self, ids: &[&str], title: &str) -> Result<String> {
        let mut sources = Vec::with_capacity(ids.len());
        for id in ids {
            let idx = self
                .songs
                .iter()
                .position(|s| s.id == *id)
                .ok_or_else(|| StudioError::SongNotFound((*id).to_string()))?;
            sources.push(idx);
        }

        let mut merged_tracks = Vec::new();
        for idx in sources {
            let source_title = self.songs[idx].title.clone();
            for track_idx in 0..self.songs[idx].tracks.len() {
                let fresh = self.fresh_id();
                merged_tracks.push(self.songs[idx].tracks[track_idx].cloned_for_merge(fresh, &source_title));
            }
        }

        let id = self.fresh_id();
        let song = Song::new(id.clone(), title, epoch_secs(), merged_tracks);
        self.songs.push(song);
        self.sync_store();
        self.notify();
        Ok(id)
    }

    /// Replace the live session with deep copies of a stored song's tracks.
    pub fn load(&mut self, id: &str) -> Result<()> {
        let tracks = self
            .songs
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| StudioError::SongNotFound(id.to_string()))?
            .tracks
            .clone();
        self.clear_session();
        self.tracks = tracks;
        self.notify();
        Ok(())
    }

    pub fn delete_song(&mut self, id: &str) {
        let before = self.songs.len();
        self.songs.retain(|s| s.id != id);
        if self.songs.len() != before {
            self.sync_store();
            self.notify();
        }
    }

    /// Audition a stored song without touching transport state. Calling it
    /// again for the same song toggles the preview off; any other preview
    /// or main playback is stopped first. No-op while Recording.
    pub fn preview_song(&mut self, id: &str) -> Result<()> {
        if self.state == TransportState::Recording {
            return Ok(());
        }
        self.backend.stop_all();
        if self.state == TransportState::Playing {
            self.state = TransportState::Idle;
        }
        if self.previewing.as_deref() == Some(id) {
            self.previewing = None;
            self.notify();
            return Ok(());
        }

        let Self { backend, songs, .. } = self;
        let song = songs
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| StudioError::SongNotFound(id.to_string()))?;
        backend.ensure_ready();
        let origin = backend.now();
        schedule_tracks(backend, &song.tracks, origin);
        self.previewing = Some(id.to_string());
        self.notify();
        Ok(())
    }

    pub fn stop_preview(&mut self) {
        self.backend.stop_all();
        if self.previewing.take().is_some() {
            self.notify();
        }
    }

    // --- Observers ---

    /// Register a listener called synchronously after every state change.
    /// No payload; listeners re-read current state.
    pub fn subscribe(&mut self, listener: impl FnMut() + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) {
        self.listeners.retain(|(lid, _)| *lid != id);
    }

    fn notify(&mut self) {
        for (_, listener) in &mut self.listeners {
            listener();
        }
    }

    fn fresh_id(&mut self) -> String {
        self.next_id += 1;
        format!("{}-{}", self.session_epoch_ms, self.next_id)
    }

    fn sync_store(&mut self) -> bool {
        self.store.store(&self.songs)
    }
}
