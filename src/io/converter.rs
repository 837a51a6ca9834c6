/// Convert MIDI note number to frequency in Hz.
/// A4 = 440 Hz = MIDI note 69
#[inline]
pub fn midi_note_to_freq(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}

/// Frequency ratio for a 14-bit pitch-bend value, `range` semitones each way.
#[inline]
pub fn pitch_bend_ratio(value: i16, range: f32) -> f32 {
    let semitones = (value as f32 / 8192.0) * range;
    2.0_f32.powf(semitones / 12.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a4_is_440() {
        assert!((midi_note_to_freq(69) - 440.0).abs() < 1e-3);
        assert!((midi_note_to_freq(81) - 880.0).abs() < 1e-2);
    }

    #[test]
    fn test_centered_bend_is_unity() {
        assert_eq!(pitch_bend_ratio(0, 2.0), 1.0);
        assert!((pitch_bend_ratio(8191, 12.0) - 2.0).abs() < 1e-2);
    }
}
