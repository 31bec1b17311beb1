//! Procedural synthesis voices
//!
//! Every sound is rendered sample-by-sample from oscillators, filtered
//! noise and ramp envelopes. No sample playback anywhere.

use std::f64::consts::{PI, TAU};

use pocketband_core::{MelodicPreset, PercussionKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

fn wave(phase: f64, waveform: Waveform) -> f64 {
    let p = phase.fract();
    match waveform {
        Waveform::Sine => (p * TAU).sin(),
        Waveform::Square => {
            if p < 0.5 {
                1.0
            } else {
                -1.0
            }
        }
        Waveform::Sawtooth => 2.0 * p - 1.0,
        Waveform::Triangle => {
            if p < 0.5 {
                4.0 * p - 1.0
            } else {
                3.0 - 4.0 * p
            }
        }
    }
}

fn noise() -> f64 {
    fastrand::f64() * 2.0 - 1.0
}

/// Linear ramp from v0 at t0 to v1 at t1, clamped outside the interval.
fn lin_ramp(t: f64, t0: f64, t1: f64, v0: f64, v1: f64) -> f64 {
    if t <= t0 {
        v0
    } else if t >= t1 {
        v1
    } else {
        v0 + (v1 - v0) * (t - t0) / (t1 - t0)
    }
}

/// Exponential ramp from v0 at t0 to v1 at t1, clamped outside the
/// interval. Both endpoints must be positive.
fn exp_ramp(t: f64, t0: f64, t1: f64, v0: f64, v1: f64) -> f64 {
    if t <= t0 {
        v0
    } else if t >= t1 {
        v1
    } else {
        v0 * (v1 / v0).powf((t - t0) / (t1 - t0))
    }
}

/// Inharmonic partial ratios for crash/ride, over a 40 Hz fundamental.
const CYMBAL_RATIOS: [f64; 6] = [2.0, 3.0, 4.16, 5.43, 6.79, 8.21];
const CYMBAL_FUNDAMENTAL: f64 = 40.0;

/// Synthesis recipe selected per voice id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Recipe {
    Kick,
    Snare,
    Hihat { duration: f64 },
    Tom { base_freq: f64 },
    Clap,
    Cymbal { duration: f64 },
    SimpleWave { waveform: Waveform },
    Pad,
    EightBit,
    Sax,
    Flute,
    Guitar,
    Bass,
    Violin,
    Cello,
    Ukulele,
}

impl Recipe {
    pub fn for_percussion(kind: PercussionKind) -> Self {
        match kind {
            PercussionKind::Kick => Self::Kick,
            PercussionKind::Snare => Self::Snare,
            PercussionKind::HihatClosed => Self::Hihat { duration: 0.05 },
            PercussionKind::HihatOpen => Self::Hihat { duration: 0.4 },
            PercussionKind::TomLow => Self::Tom { base_freq: 100.0 },
            PercussionKind::TomMid => Self::Tom { base_freq: 150.0 },
            PercussionKind::Clap => Self::Clap,
            PercussionKind::Crash => Self::Cymbal { duration: 1.5 },
            PercussionKind::Ride => Self::Cymbal { duration: 1.0 },
        }
    }

    pub fn for_preset(preset: MelodicPreset) -> Self {
        match preset {
            MelodicPreset::Piano | MelodicPreset::Sine => Self::SimpleWave {
                waveform: Waveform::Sine,
            },
            MelodicPreset::Square => Self::SimpleWave {
                waveform: Waveform::Square,
            },
            MelodicPreset::Sawtooth => Self::SimpleWave {
                waveform: Waveform::Sawtooth,
            },
            MelodicPreset::Triangle => Self::SimpleWave {
                waveform: Waveform::Triangle,
            },
            MelodicPreset::Pad => Self::Pad,
            MelodicPreset::EightBit => Self::EightBit,
            MelodicPreset::Sax => Self::Sax,
            MelodicPreset::Flute => Self::Flute,
            MelodicPreset::Guitar => Self::Guitar,
            MelodicPreset::Bass => Self::Bass,
            MelodicPreset::Violin => Self::Violin,
            MelodicPreset::Cello => Self::Cello,
            MelodicPreset::Ukulele => Self::Ukulele,
        }
    }

    /// Total sounding time; the voice is dropped once it elapses.
    fn duration(&self) -> f64 {
        match self {
            Self::Kick => 0.5,
            Self::Snare => 0.2,
            Self::Hihat { duration } => *duration,
            Self::Tom { .. } => 0.4,
            Self::Clap => 0.2,
            Self::Cymbal { duration } => *duration,
            Self::SimpleWave { .. } => 1.2,
            Self::Pad => 2.5,
            Self::EightBit => 0.3,
            Self::Sax => 0.8,
            Self::Flute => 1.0,
            Self::Guitar => 1.5,
            Self::Bass => 1.0,
            Self::Violin => 1.5,
            Self::Cello => 2.0,
            Self::Ukulele => 0.8,
        }
    }
}

/// One sounding (or future-scheduled) signal graph.
#[derive(Debug, Clone)]
pub struct Voice {
    recipe: Recipe,
    /// Fundamental in Hz; unused by percussion recipes.
    freq: f64,
    /// Reference-clock sample at which the voice starts sounding.
    start_sample: u64,
    /// Samples rendered so far.
    age: u64,
    done: bool,

    // Oscillator phases (cycles)
    phase: f64,
    phase2: f64,
    phase3: f64,
    lfo_phase: f64,

    // Filter state (one-pole pairs / state-variable)
    filter_state: f64,
    filter_state2: f64,
}

impl Voice {
    pub fn percussion(kind: PercussionKind, start_sample: u64) -> Self {
        Self::new(Recipe::for_percussion(kind), 0.0, start_sample)
    }

    pub fn melodic(preset: MelodicPreset, freq: f32, start_sample: u64) -> Self {
        Self::new(Recipe::for_preset(preset), freq as f64, start_sample)
    }

    fn new(recipe: Recipe, freq: f64, start_sample: u64) -> Self {
        Self {
            recipe,
            freq,
            start_sample,
            age: 0,
            done: false,
            phase: 0.0,
            phase2: 0.0,
            phase3: 0.0,
            lfo_phase: 0.0,
            filter_state: 0.0,
            filter_state2: 0.0,
        }
    }

    pub fn start_sample(&self) -> u64 {
        self.start_sample
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Render one sample. Returns 0.0 once the recipe's duration elapses
    /// and marks the voice done.
    pub fn tick(&mut self, sample_rate: f64) -> f32 {
        if self.done {
            return 0.0;
        }
        let dt = 1.0 / sample_rate;
        let t = self.age as f64 * dt;
        self.age += 1;
        if t >= self.recipe.duration() {
            self.done = true;
            return 0.0;
        }

        let sample = match self.recipe {
            Recipe::Kick => self.tick_kick(t, dt),
            Recipe::Snare => self.tick_snare(t, dt),
            Recipe::Hihat { duration } => self.tick_hihat(t, dt, duration),
            Recipe::Tom { base_freq } => self.tick_tom(t, dt, base_freq),
            Recipe::Clap => self.tick_clap(t, dt),
            Recipe::Cymbal { duration } => self.tick_cymbal(t, dt, duration),
            Recipe::SimpleWave { waveform } => self.tick_simple(t, dt, waveform),
            Recipe::Pad => self.tick_pad(t, dt),
            Recipe::EightBit => self.tick_eight_bit(t, dt),
            Recipe::Sax => self.tick_sax(t, dt),
            Recipe::Flute => self.tick_flute(t, dt),
            Recipe::Guitar => self.tick_guitar(t, dt),
            Recipe::Bass => self.tick_bass(t, dt),
            Recipe::Violin => self.tick_violin(t, dt),
            Recipe::Cello => self.tick_cello(t, dt),
            Recipe::Ukulele => self.tick_ukulele(t, dt),
        };

        sample as f32
    }

    // --- Filters (one-pole building blocks) ---

    fn lowpass(&mut self, x: f64, cutoff_hz: f64, dt: f64) -> f64 {
        let a = 1.0 - (-TAU * cutoff_hz * dt).exp();
        self.filter_state += a * (x - self.filter_state);
        self.filter_state
    }

    fn highpass(&mut self, x: f64, cutoff_hz: f64, dt: f64) -> f64 {
        x - self.lowpass(x, cutoff_hz, dt)
    }

    /// Two-pole bandpass built from cascaded one-poles.
    fn bandpass(&mut self, x: f64, center_hz: f64, dt: f64) -> f64 {
        let a = 1.0 - (-TAU * center_hz * dt).exp();
        self.filter_state += a * (x - self.filter_state);
        self.filter_state2 += a * (self.filter_state - self.filter_state2);
        self.filter_state - self.filter_state2
    }

    /// State-variable lowpass with resonance (Chamberlin form).
    fn resonant_lowpass(&mut self, x: f64, cutoff_hz: f64, q: f64, dt: f64) -> f64 {
        // Clamped well inside the stable region for any catalog pitch.
        let f = (2.0 * (PI * cutoff_hz * dt).sin()).min(0.5);
        // filter_state = band, filter_state2 = low
        self.filter_state2 += f * self.filter_state;
        let high = x - self.filter_state2 - self.filter_state / q;
        self.filter_state += f * high;
        self.filter_state2
    }

    // --- Percussion ---

    fn tick_kick(&mut self, t: f64, dt: f64) -> f64 {
        // Pitch falls exponentially from 150 Hz toward silence.
        let freq = exp_ramp(t, 0.0, 0.5, 150.0, 0.01);
        self.phase += freq * dt;
        let osc = wave(self.phase, Waveform::Sine);
        osc * exp_ramp(t, 0.0, 0.5, 1.0, 0.01)
    }

    fn tick_snare(&mut self, t: f64, dt: f64) -> f64 {
        let rattle = self.highpass(noise(), 1000.0, dt) * exp_ramp(t, 0.0, 0.2, 1.0, 0.01);
        self.phase += 100.0 * dt;
        let body = wave(self.phase, Waveform::Triangle) * exp_ramp(t, 0.0, 0.1, 0.7, 0.01);
        rattle + body
    }

    fn tick_hihat(&mut self, t: f64, dt: f64, duration: f64) -> f64 {
        self.highpass(noise(), 5000.0, dt) * exp_ramp(t, 0.0, duration, 0.6, 0.01)
    }

    fn tick_tom(&mut self, t: f64, dt: f64, base_freq: f64) -> f64 {
        let freq = exp_ramp(t, 0.0, 0.4, base_freq, base_freq * 0.5);
        self.phase += freq * dt;
        wave(self.phase, Waveform::Sine) * exp_ramp(t, 0.0, 0.4, 1.0, 0.01)
    }

    fn tick_clap(&mut self, t: f64, dt: f64) -> f64 {
        let burst = self.bandpass(noise(), 900.0, dt);
        let amp = if t < 0.01 {
            lin_ramp(t, 0.0, 0.01, 0.0, 1.0)
        } else {
            exp_ramp(t, 0.01, 0.2, 1.0, 0.01)
        };
        burst * amp
    }

    fn tick_cymbal(&mut self, t: f64, dt: f64, duration: f64) -> f64 {
        self.phase += CYMBAL_FUNDAMENTAL * dt;
        let mut partials = 0.0;
        for ratio in CYMBAL_RATIOS {
            partials += wave(self.phase * ratio, Waveform::Square);
        }
        let sizzle = self.highpass(noise(), 5000.0, dt);
        (partials + sizzle) * exp_ramp(t, 0.0, duration, 0.3, 0.001)
    }

    // --- Melodic ---

    fn tick_simple(&mut self, t: f64, dt: f64, waveform: Waveform) -> f64 {
        self.phase += self.freq * dt;
        // Fast attack, two-stage decay: the piano-ish envelope.
        let amp = if t < 0.02 {
            lin_ramp(t, 0.0, 0.02, 0.0, 0.6)
        } else if t < 0.1 {
            exp_ramp(t, 0.02, 0.1, 0.6, 0.4)
        } else {
            exp_ramp(t, 0.1, 1.2, 0.4, 0.001)
        };
        wave(self.phase, waveform) * amp
    }

    fn tick_pad(&mut self, t: f64, dt: f64) -> f64 {
        // Three sawtooths detuned +/- 5 cents for breadth.
        let detune = 2f64.powf(5.0 / 1200.0);
        self.phase += self.freq * dt;
        self.phase2 += self.freq * detune * dt;
        self.phase3 += self.freq / detune * dt;
        let sum = wave(self.phase, Waveform::Sawtooth)
            + wave(self.phase2, Waveform::Sawtooth)
            + wave(self.phase3, Waveform::Sawtooth);

        let cutoff = lin_ramp(t, 0.0, 1.0, 200.0, 2000.0);
        let filtered = self.lowpass(sum, cutoff, dt);

        let amp = if t < 1.0 {
            lin_ramp(t, 0.0, 1.0, 0.0, 0.3)
        } else {
            lin_ramp(t, 1.0, 2.5, 0.3, 0.0)
        };
        filtered * amp
    }

    fn tick_eight_bit(&mut self, t: f64, dt: f64) -> f64 {
        self.phase += self.freq * dt;
        wave(self.phase, Waveform::Square) * exp_ramp(t, 0.0, 0.3, 0.5, 0.01)
    }

    fn tick_sax(&mut self, t: f64, dt: f64) -> f64 {
        self.lfo_phase += 5.0 * dt;
        let vibrato = 10.0 * wave(self.lfo_phase, Waveform::Sine);
        self.phase += (self.freq + vibrato) * dt;
        let reed = wave(self.phase, Waveform::Sawtooth);

        // Resonant cutoff swells over the first part of the note.
        let cutoff = lin_ramp(t, 0.0, 0.2, self.freq * 2.0, self.freq * 4.0);
        let filtered = self.resonant_lowpass(reed, cutoff, 4.0, dt);

        let amp = if t < 0.05 {
            lin_ramp(t, 0.0, 0.05, 0.0, 0.6)
        } else if t < 0.3 {
            lin_ramp(t, 0.05, 0.3, 0.6, 0.4)
        } else {
            lin_ramp(t, 0.3, 0.8, 0.4, 0.0)
        };
        filtered * amp
    }

    fn tick_flute(&mut self, t: f64, dt: f64) -> f64 {
        self.phase += self.freq * dt;
        let tone_amp = if t < 0.05 {
            lin_ramp(t, 0.0, 0.05, 0.0, 0.5)
        } else {
            lin_ramp(t, 0.05, 1.0, 0.5, 0.0)
        };
        let tone = wave(self.phase, Waveform::Sine) * tone_amp;

        // Short breath burst centered above the fundamental.
        let breath = if t < 0.3 {
            let breath_amp = if t < 0.02 {
                lin_ramp(t, 0.0, 0.02, 0.0, 0.1)
            } else {
                lin_ramp(t, 0.02, 0.3, 0.1, 0.0)
            };
            self.bandpass(noise(), self.freq * 1.5, dt) * breath_amp
        } else {
            0.0
        };
        tone + breath
    }

    fn tick_guitar(&mut self, t: f64, dt: f64) -> f64 {
        self.phase += self.freq * dt;
        // Cutoff drops fast: the pluck.
        let cutoff = exp_ramp(t, 0.0, 0.3, 3000.0, 500.0);
        let plucked = self.lowpass(wave(self.phase, Waveform::Sawtooth), cutoff, dt);
        let amp = if t < 0.01 {
            lin_ramp(t, 0.0, 0.01, 0.0, 0.5)
        } else {
            exp_ramp(t, 0.01, 1.5, 0.5, 0.001)
        };
        plucked * amp
    }

    fn tick_bass(&mut self, t: f64, dt: f64) -> f64 {
        self.phase += self.freq * dt;
        self.phase2 += self.freq * 0.5 * dt;
        let body = wave(self.phase, Waveform::Triangle) + wave(self.phase2, Waveform::Sine);
        let cutoff = exp_ramp(t, 0.0, 0.3, 800.0, 200.0);
        let filtered = self.lowpass(body, cutoff, dt);
        let amp = if t < 0.02 {
            lin_ramp(t, 0.0, 0.02, 0.0, 0.8)
        } else {
            exp_ramp(t, 0.02, 1.0, 0.8, 0.001)
        };
        filtered * amp
    }

    fn tick_violin(&mut self, t: f64, dt: f64) -> f64 {
        self.lfo_phase += 6.0 * dt;
        let vibrato = 3.0 * wave(self.lfo_phase, Waveform::Sine);
        self.phase += (self.freq + vibrato) * dt;
        // Bandpass approximates the body resonance.
        let bowed = self.bandpass(wave(self.phase, Waveform::Sawtooth), 2000.0, dt);
        let amp = if t < 0.1 {
            lin_ramp(t, 0.0, 0.1, 0.0, 0.6)
        } else {
            lin_ramp(t, 0.1, 1.5, 0.6, 0.0)
        };
        bowed * amp
    }

    fn tick_cello(&mut self, t: f64, dt: f64) -> f64 {
        self.phase += self.freq * dt;
        let mellow = self.lowpass(wave(self.phase, Waveform::Sawtooth), 800.0, dt);
        let amp = if t < 0.2 {
            lin_ramp(t, 0.0, 0.2, 0.0, 0.7)
        } else {
            lin_ramp(t, 0.2, 2.0, 0.7, 0.0)
        };
        mellow * amp
    }

    fn tick_ukulele(&mut self, t: f64, dt: f64) -> f64 {
        self.phase += self.freq * dt;
        let cutoff = exp_ramp(t, 0.0, 0.2, 2000.0, 500.0);
        let plucked = self.lowpass(wave(self.phase, Waveform::Triangle), cutoff, dt);
        let amp = if t < 0.01 {
            lin_ramp(t, 0.0, 0.01, 0.0, 0.5)
        } else {
            exp_ramp(t, 0.01, 0.8, 0.5, 0.001)
        };
        plucked * amp
    }
}

/// All in-flight and future-scheduled voices. Owned by the audio callback.
#[derive(Debug, Default)]
pub struct VoiceBank {
    voices: Vec<Voice>,
}

impl VoiceBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, voice: Voice) {
        self.voices.push(voice);
    }

    /// Drop everything, including voices that have not started yet.
    pub fn stop_all(&mut self) {
        self.voices.clear();
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Mix one sample at the given reference-clock position. Voices whose
    /// start lies in the future stay silent until the clock reaches them;
    /// finished voices are removed.
    pub fn tick(&mut self, clock: u64, sample_rate: f64) -> f32 {
        let mut mix = 0.0f32;
        for voice in &mut self.voices {
            if voice.start_sample > clock {
                continue;
            }
            mix += voice.tick(sample_rate);
        }
        self.voices.retain(|v| !v.is_done());
        mix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 44100.0;

    fn run_to_completion(voice: &mut Voice) -> (f32, usize) {
        let mut peak = 0.0f32;
        let mut samples = 0;
        // Bounded at 5 s; every recipe is shorter.
        for _ in 0..(5.0 * SR) as usize {
            let s = voice.tick(SR);
            if voice.is_done() {
                break;
            }
            peak = peak.max(s.abs());
            samples += 1;
        }
        (peak, samples)
    }

    #[test]
    fn test_kick_sounds_then_finishes() {
        let mut voice = Voice::percussion(PercussionKind::Kick, 0);
        let (peak, samples) = run_to_completion(&mut voice);
        assert!(peak > 0.1, "kick should be audible, peak {peak}");
        assert!(voice.is_done());
        // Duration 0.5 s.
        assert!((samples as f64 / SR - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_closed_hat_shorter_than_open() {
        let mut closed = Voice::percussion(PercussionKind::HihatClosed, 0);
        let mut open = Voice::percussion(PercussionKind::HihatOpen, 0);
        let (_, closed_len) = run_to_completion(&mut closed);
        let (_, open_len) = run_to_completion(&mut open);
        assert!(closed_len < open_len);
    }

    #[test]
    fn test_ride_shorter_than_crash() {
        let mut ride = Voice::percussion(PercussionKind::Ride, 0);
        let mut crash = Voice::percussion(PercussionKind::Crash, 0);
        let (_, ride_len) = run_to_completion(&mut ride);
        let (_, crash_len) = run_to_completion(&mut crash);
        assert!(ride_len < crash_len);
    }

    #[test]
    fn test_every_percussion_recipe_is_finite_and_audible() {
        for kind in PercussionKind::ALL {
            let mut voice = Voice::percussion(kind, 0);
            let (peak, _) = run_to_completion(&mut voice);
            assert!(peak.is_finite(), "{:?} produced non-finite output", kind);
            assert!(peak > 0.01, "{:?} was silent", kind);
            assert!(voice.is_done(), "{:?} never finished", kind);
        }
    }

    #[test]
    fn test_every_melodic_recipe_is_finite_and_audible() {
        let presets = [
            MelodicPreset::Piano,
            MelodicPreset::Pad,
            MelodicPreset::EightBit,
            MelodicPreset::Sax,
            MelodicPreset::Flute,
            MelodicPreset::Guitar,
            MelodicPreset::Bass,
            MelodicPreset::Violin,
            MelodicPreset::Cello,
            MelodicPreset::Ukulele,
            MelodicPreset::Sine,
            MelodicPreset::Square,
            MelodicPreset::Sawtooth,
            MelodicPreset::Triangle,
        ];
        for preset in presets {
            let mut voice = Voice::melodic(preset, 440.0, 0);
            let (peak, _) = run_to_completion(&mut voice);
            assert!(peak.is_finite(), "{:?} produced non-finite output", preset);
            assert!(peak > 0.01, "{:?} was silent", preset);
            assert!(voice.is_done(), "{:?} never finished", preset);
        }
    }

    #[test]
    fn test_envelopes_decay_to_silence() {
        let mut voice = Voice::percussion(PercussionKind::Snare, 0);
        let mut tail = 0.0f32;
        let total = (0.2 * SR) as usize;
        for i in 0..total {
            let s = voice.tick(SR).abs();
            if i > total * 9 / 10 {
                tail = tail.max(s);
            }
        }
        assert!(tail < 0.1, "snare tail should be quiet, got {tail}");
    }

    #[test]
    fn test_bank_respects_future_start() {
        let mut bank = VoiceBank::new();
        bank.add(Voice::percussion(PercussionKind::Kick, 1000));

        for clock in 0..1000 {
            assert_eq!(bank.tick(clock, SR), 0.0);
        }
        assert_eq!(bank.len(), 1);

        let mut heard = false;
        for clock in 1000..2000 {
            if bank.tick(clock, SR).abs() > 0.01 {
                heard = true;
            }
        }
        assert!(heard);
    }

    #[test]
    fn test_bank_removes_finished_voices() {
        let mut bank = VoiceBank::new();
        bank.add(Voice::percussion(PercussionKind::HihatClosed, 0));
        for clock in 0..(0.1 * SR) as u64 {
            bank.tick(clock, SR);
        }
        assert!(bank.is_empty());
    }

    #[test]
    fn test_stop_all_clears_future_voices_and_is_idempotent() {
        let mut bank = VoiceBank::new();
        bank.add(Voice::percussion(PercussionKind::Kick, 0));
        bank.add(Voice::percussion(PercussionKind::Crash, 1_000_000));
        bank.stop_all();
        assert!(bank.is_empty());
        bank.stop_all();
        assert!(bank.is_empty());
        assert_eq!(bank.tick(0, SR), 0.0);
    }
}
