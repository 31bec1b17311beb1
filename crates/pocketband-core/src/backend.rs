//! Seam between the sequencer and the synthesis engine

use crate::event::Event;
use crate::voice::EventKind;

/// Events whose absolute time is further than this in the past are dropped
/// rather than played in a late burst.
pub const STALE_EVENT_TOLERANCE: f64 = 0.1;

/// Sound backend driven by the sequencer. Implemented by the cpal synthesis
/// engine in pocketband-services and by mocks in tests.
///
/// Implementations never fail on unknown voice or note ids; such triggers
/// are silently skipped.
pub trait AudioBackend {
    /// Idempotently initialize the backend and resume it if the host
    /// suspended it. Safe to call before every sound-producing operation.
    fn ensure_ready(&mut self);

    /// Monotonic reference clock in seconds. All event timestamps and
    /// playback origins are measured against this clock.
    fn now(&self) -> f64;

    /// Schedule one sound. `at` is an absolute reference-clock time;
    /// `None` plays now. For `EventKind::Note`, `instrument` names the
    /// melodic preset and `note` the pitch; for `EventKind::Percussion`,
    /// `note` carries the percussion id.
    fn trigger(&mut self, instrument: &str, note: &str, kind: EventKind, at: Option<f64>);

    /// Cut every in-flight sound, including ones scheduled for the future.
    /// Idempotent; tolerates sounds that already finished.
    fn stop_all(&mut self);

    /// Schedule a recorded event relative to a playback origin. Events more
    /// than [`STALE_EVENT_TOLERANCE`] seconds overdue are dropped so a
    /// delayed scheduling pass cannot emit a burst of late sounds.
    fn schedule_event(&mut self, event: &Event, origin: f64) {
        let at = origin + event.timestamp;
        if at < self.now() - STALE_EVENT_TOLERANCE {
            return;
        }
        self.trigger(&event.instrument, &event.note, event.kind, Some(at));
    }
}
