//! Error types for pocketband

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("Song not found: {0}")]
    SongNotFound(String),
    #[error("Track not found at index {0}")]
    TrackNotFound(usize),
}

pub type Result<T> = std::result::Result<T, StudioError>;
