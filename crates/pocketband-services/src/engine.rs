//! Synthesis engine: reference clock, scheduling and the audio callback

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{Receiver, Sender, unbounded};
use tracing::{debug, warn};

use pocketband_core::{AudioBackend, EventKind, MelodicPreset, PercussionKind, note_frequency};

use crate::audio_io::RealtimeOutputStream;
use crate::voices::{Voice, VoiceBank};

const MASTER_GAIN: f32 = 0.5;
const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Commands crossing from the control thread into the audio callback.
enum EngineCommand {
    Trigger(Voice),
    StopAll,
}

/// State shared with the audio callback. The clock counts rendered samples
/// and is the reference for every scheduled time.
struct EngineShared {
    clock: AtomicU64,
}

/// Procedural synthesis engine over the default output device.
///
/// The stream is opened lazily on the first [`SynthEngine::ensure_ready`]
/// (typically the first user gesture). The voice bank lives inside the
/// audio callback; the control side only sends commands over a channel, so
/// triggering never blocks on the audio thread.
pub struct SynthEngine {
    shared: Arc<EngineShared>,
    commands: Option<Sender<EngineCommand>>,
    stream: Option<RealtimeOutputStream>,
    sample_rate: u32,
    init_failed: bool,
}

impl Default for SynthEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SynthEngine {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(EngineShared {
                clock: AtomicU64::new(0),
            }),
            commands: None,
            stream: None,
            sample_rate: DEFAULT_SAMPLE_RATE,
            init_failed: false,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.stream.is_some()
    }

    /// Build a voice for a trigger request. Unknown ids and unresolvable
    /// notes yield None; the sound is skipped without error.
    fn voice_for(instrument: &str, note: &str, kind: EventKind, start_sample: u64) -> Option<Voice> {
        match kind {
            EventKind::Percussion => {
                let Some(kind) = PercussionKind::from_id(note) else {
                    debug!(note, "Dropping unknown percussion id");
                    return None;
                };
                Some(Voice::percussion(kind, start_sample))
            }
            EventKind::Note => {
                let Some(preset) = MelodicPreset::from_id(instrument) else {
                    debug!(instrument, "Dropping unknown melodic preset");
                    return None;
                };
                let Some(freq) = note_frequency(note) else {
                    debug!(note, "Dropping unresolvable note");
                    return None;
                };
                Some(Voice::melodic(preset, freq, start_sample))
            }
        }
    }

    fn send(&self, command: EngineCommand) {
        if let Some(commands) = &self.commands {
            if commands.send(command).is_err() {
                warn!("Audio thread is gone; command dropped");
            }
        }
    }

    /// Render callback body. Drains pending commands, then mixes the voice
    /// bank frame by frame and advances the reference clock.
    fn render(
        shared: &EngineShared,
        bank: &mut VoiceBank,
        commands: &Receiver<EngineCommand>,
        buffer: &mut [f32],
        sample_rate: u32,
        channels: u16,
    ) {
        while let Ok(command) = commands.try_recv() {
            match command {
                EngineCommand::Trigger(voice) => bank.add(voice),
                EngineCommand::StopAll => bank.stop_all(),
            }
        }

        let channels = channels as usize;
        let sample_rate = sample_rate as f64;
        let mut clock = shared.clock.load(Ordering::Relaxed);
        for frame in buffer.chunks_mut(channels.max(1)) {
            let mix = (bank.tick(clock, sample_rate) * MASTER_GAIN).tanh();
            for sample in frame {
                *sample = mix;
            }
            clock += 1;
        }
        shared.clock.store(clock, Ordering::Relaxed);
    }
}

impl AudioBackend for SynthEngine {
    fn ensure_ready(&mut self) {
        if let Some(stream) = &self.stream {
            // Already initialized; nudge the host in case it suspended us.
            stream.resume();
            return;
        }
        if self.init_failed {
            return;
        }

        let (tx, rx) = unbounded();
        let shared = self.shared.clone();
        let mut bank = VoiceBank::new();
        match RealtimeOutputStream::start(move |buffer, sample_rate, channels| {
            SynthEngine::render(&shared, &mut bank, &rx, buffer, sample_rate, channels);
        }) {
            Ok(stream) => {
                self.sample_rate = stream.sample_rate();
                self.commands = Some(tx);
                self.stream = Some(stream);
            }
            Err(e) => {
                // Stay silent but functional; every operation still works.
                warn!("Audio backend unavailable: {e}");
                self.init_failed = true;
            }
        }
    }

    fn now(&self) -> f64 {
        self.shared.clock.load(Ordering::Relaxed) as f64 / self.sample_rate as f64
    }

    fn trigger(&mut self, instrument: &str, note: &str, kind: EventKind, at: Option<f64>) {
        self.ensure_ready();
        if self.commands.is_none() {
            return;
        }
        let start_sample = match at {
            Some(at) if at > 0.0 => (at * self.sample_rate as f64) as u64,
            _ => self.shared.clock.load(Ordering::Relaxed),
        };
        if let Some(voice) = Self::voice_for(instrument, note, kind, start_sample) {
            self.send(EngineCommand::Trigger(voice));
        }
    }

    fn stop_all(&mut self) {
        self.send(EngineCommand::StopAll);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pocketband_core::{Event, STALE_EVENT_TOLERANCE};

    const SR: u32 = 44100;

    fn harness() -> (Arc<EngineShared>, VoiceBank) {
        let shared = Arc::new(EngineShared {
            clock: AtomicU64::new(0),
        });
        (shared, VoiceBank::new())
    }

    #[test]
    fn test_voice_for_known_ids() {
        assert!(SynthEngine::voice_for("drums", "KICK", EventKind::Percussion, 0).is_some());
        assert!(SynthEngine::voice_for("piano", "A4", EventKind::Note, 0).is_some());
        assert!(SynthEngine::voice_for("guitar", "E2", EventKind::Note, 0).is_some());
    }

    #[test]
    fn test_voice_for_unknown_ids_is_silent_skip() {
        assert!(SynthEngine::voice_for("drums", "GONG", EventKind::Percussion, 0).is_none());
        assert!(SynthEngine::voice_for("theremin", "A4", EventKind::Note, 0).is_none());
        assert!(SynthEngine::voice_for("piano", "A9", EventKind::Note, 0).is_none());
        assert!(SynthEngine::voice_for("piano", "", EventKind::Note, 0).is_none());
    }

    #[test]
    fn test_render_advances_clock_and_mixes() {
        let (shared, mut bank) = harness();
        let (tx, rx) = unbounded();
        tx.send(EngineCommand::Trigger(Voice::percussion(
            PercussionKind::Kick,
            0,
        )))
        .unwrap();

        let mut buffer = vec![0.0f32; 512 * 2];
        SynthEngine::render(&shared, &mut bank, &rx, &mut buffer, SR, 2);

        assert_eq!(shared.clock.load(Ordering::Relaxed), 512);
        assert!(buffer.iter().any(|s| s.abs() > 0.01));
        // Stereo frames carry the same mono mix.
        assert_eq!(buffer[0], buffer[1]);
    }

    #[test]
    fn test_render_stop_all_silences() {
        let (shared, mut bank) = harness();
        let (tx, rx) = unbounded();
        tx.send(EngineCommand::Trigger(Voice::percussion(
            PercussionKind::Crash,
            0,
        )))
        .unwrap();
        let mut buffer = vec![0.0f32; 256];
        SynthEngine::render(&shared, &mut bank, &rx, &mut buffer, SR, 1);
        assert!(buffer.iter().any(|s| s.abs() > 0.001));

        tx.send(EngineCommand::StopAll).unwrap();
        SynthEngine::render(&shared, &mut bank, &rx, &mut buffer, SR, 1);
        assert!(buffer.iter().all(|s| *s == 0.0));
        assert!(bank.is_empty());
    }

    #[test]
    fn test_render_output_is_bounded() {
        let (shared, mut bank) = harness();
        let (tx, rx) = unbounded();
        // Pile up a worst-case chord plus cymbals.
        for _ in 0..8 {
            tx.send(EngineCommand::Trigger(Voice::percussion(
                PercussionKind::Crash,
                0,
            )))
            .unwrap();
            tx.send(EngineCommand::Trigger(Voice::melodic(
                MelodicPreset::Pad,
                440.0,
                0,
            )))
            .unwrap();
        }
        let mut buffer = vec![0.0f32; 4096];
        SynthEngine::render(&shared, &mut bank, &rx, &mut buffer, SR, 1);
        assert!(buffer.iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn test_engine_without_device_still_answers() {
        // No stream has been opened; the engine must behave, just silently.
        let mut engine = SynthEngine::new();
        assert_eq!(engine.now(), 0.0);
        engine.trigger("drums", "KICK", EventKind::Percussion, None);
        engine.stop_all();
        engine.stop_all();

        let event = Event::new(0.0, "drums", "KICK", EventKind::Percussion);
        engine.schedule_event(&event, -STALE_EVENT_TOLERANCE * 2.0);
    }
}
