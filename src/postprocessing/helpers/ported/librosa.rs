/* PORTED LIBROSA FUNCTIONS */

/// Converts a frequency in Hz to the corresponding (fractional) MIDI pitch.
pub fn hz_to_midi(hz: f32) -> f32 {
    12.0 * (hz.log2() - 440.0f32.log2()) + 69.0
}

/// Converts a MIDI pitch to the corresponding frequency in Hz.
///
/// # Arguments
///
/// * `midi` - A MIDI pitch.
///
/// # Returns
///
/// * The corresponding frequency in Hz.
pub fn midi_to_hz(midi: f32) -> f32 {
    440.0 * 2.0f32.powf((midi - 69.0) / 12.0)
}
