//! pocketband-demo: record a short beat and play it back
//!
//! Opens the default output device, records a two-bar drum-and-bass
//! pattern through the transport, plays it back and saves it to the
//! library under the platform temp directory.

use std::thread::sleep;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pocketband_core::{EventKind, Sequencer};
use pocketband_services::{FileKeyValueStore, JsonSongStore, SynthEngine};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pocketband=debug".parse()?),
        )
        .init();

    tracing::info!("Starting pocketband demo");

    let library_dir = std::env::temp_dir().join("pocketband-demo");
    let store = JsonSongStore::new(FileKeyValueStore::new(library_dir));
    let mut studio = Sequencer::new(SynthEngine::new(), store);
    studio.ensure_ready();

    let step = Duration::from_millis(250);
    let beat: &[&[(&str, &str, EventKind)]] = &[
        &[("drums", "KICK", EventKind::Percussion), ("bass", "E2", EventKind::Note)],
        &[("drums", "HIHAT_CLOSED", EventKind::Percussion)],
        &[("drums", "SNARE", EventKind::Percussion)],
        &[("drums", "HIHAT_CLOSED", EventKind::Percussion), ("bass", "G2", EventKind::Note)],
        &[("drums", "KICK", EventKind::Percussion)],
        &[("drums", "HIHAT_CLOSED", EventKind::Percussion), ("bass", "A2", EventKind::Note)],
        &[("drums", "SNARE", EventKind::Percussion)],
        &[("drums", "HIHAT_OPEN", EventKind::Percussion), ("bass", "E2", EventKind::Note)],
    ];

    tracing::info!("Recording pattern");
    studio.start_recording();
    for steps in beat {
        for (instrument, note, kind) in *steps {
            studio.trigger(instrument, note, *kind);
            studio.log_event(instrument, note, *kind);
        }
        sleep(step);
    }
    sleep(step);
    studio.stop_recording();

    tracing::info!(tracks = studio.tracks().len(), "Playing back");
    studio.toggle_playback();
    sleep(step * 10);
    if studio.is_playing() {
        studio.toggle_playback();
    }

    let id = studio.save("Demo Jam");
    tracing::info!(id, songs = studio.songs().len(), "Saved to library");

    Ok(())
}
