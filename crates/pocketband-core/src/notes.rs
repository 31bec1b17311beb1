//! Chromatic note catalog and transposition

/// Equal-temperament catalog from bass low E up to C6, A4 = 440 Hz.
/// Ordered chromatically so transposition is an index shift.
pub const NOTES: &[(&str, f32)] = &[
    // Octave 1 (bass)
    ("E1", 41.20),
    ("F1", 43.65),
    ("F#1", 46.25),
    ("G1", 49.00),
    ("G#1", 51.91),
    ("A1", 55.00),
    ("A#1", 58.27),
    ("B1", 61.74),
    // Octave 2 (bass/guitar/cello)
    ("C2", 65.41),
    ("C#2", 69.30),
    ("D2", 73.42),
    ("D#2", 77.78),
    ("E2", 82.41),
    ("F2", 87.31),
    ("F#2", 92.50),
    ("G2", 98.00),
    ("G#2", 103.83),
    ("A2", 110.00),
    ("A#2", 116.54),
    ("B2", 123.47),
    // Octave 3 (guitar/cello)
    ("C3", 130.81),
    ("C#3", 138.59),
    ("D3", 146.83),
    ("D#3", 155.56),
    ("E3", 164.81),
    ("F3", 174.61),
    ("F#3", 185.00),
    ("G3", 196.00),
    ("G#3", 207.65),
    ("A3", 220.00),
    ("A#3", 233.08),
    ("B3", 246.94),
    // Octave 4 (guitar/piano/ukulele)
    ("C4", 261.63),
    ("C#4", 277.18),
    ("D4", 293.66),
    ("D#4", 311.13),
    ("E4", 329.63),
    ("F4", 349.23),
    ("F#4", 369.99),
    ("G4", 392.00),
    ("G#4", 415.30),
    ("A4", 440.00),
    ("A#4", 466.16),
    ("B4", 493.88),
    // Octave 5 (high range/violin)
    ("C5", 523.25),
    ("C#5", 554.37),
    ("D5", 587.33),
    ("D#5", 622.25),
    ("E5", 659.25),
    ("F5", 698.46),
    ("F#5", 739.99),
    ("G5", 783.99),
    ("G#5", 830.61),
    ("A5", 880.00),
    ("A#5", 932.33),
    ("B5", 987.77),
    ("C6", 1046.50),
];

/// Chromatic index of a note name within the catalog, or None if unknown.
pub fn note_index(name: &str) -> Option<usize> {
    NOTES.iter().position(|(n, _)| *n == name)
}

/// Frequency in Hz for a note name. Unknown names resolve to None and the
/// caller is expected to skip the sound silently.
pub fn note_frequency(name: &str) -> Option<f32> {
    NOTES.iter().find(|(n, _)| *n == name).map(|(_, f)| *f)
}

/// Shift a note by a number of semitones within the catalog range.
pub fn transpose(name: &str, semitones: i32) -> Option<&'static str> {
    let idx = note_index(name)? as i32 + semitones;
    if idx < 0 {
        return None;
    }
    NOTES.get(idx as usize).map(|(n, _)| *n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_frequency() {
        assert_eq!(note_frequency("A4"), Some(440.00));
        assert_eq!(note_frequency("E1"), Some(41.20));
        assert_eq!(note_frequency("C6"), Some(1046.50));
        assert_eq!(note_frequency("H9"), None);
        assert_eq!(note_frequency(""), None);
    }

    #[test]
    fn test_transpose_identity() {
        for (name, _) in NOTES {
            assert_eq!(transpose(name, 0), Some(*name));
        }
    }

    #[test]
    fn test_transpose_octave() {
        assert_eq!(transpose("A2", 12), Some("A3"));
        assert_eq!(transpose("C4", -12), Some("C3"));
        assert_eq!(transpose("E4", 1), Some("F4"));
    }

    #[test]
    fn test_transpose_roundtrip() {
        for (name, _) in NOTES {
            for k in -12..=12 {
                if let Some(up) = transpose(name, k) {
                    assert_eq!(transpose(up, -k), Some(*name));
                }
            }
        }
    }

    #[test]
    fn test_transpose_out_of_range() {
        assert_eq!(transpose("E1", -1), None);
        assert_eq!(transpose("C6", 1), None);
        assert_eq!(transpose("X0", 3), None);
    }

    #[test]
    fn test_catalog_is_chromatic() {
        // Each step should be one equal-temperament semitone (ratio 2^(1/12)).
        let semitone = 2f32.powf(1.0 / 12.0);
        for pair in NOTES.windows(2) {
            let ratio = pair[1].1 / pair[0].1;
            assert!(
                (ratio - semitone).abs() < 0.001,
                "bad step {} -> {}",
                pair[0].0,
                pair[1].0
            );
        }
    }
}
