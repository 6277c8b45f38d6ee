use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_TICKS_PER_QUARTER, ENERGY_TOL, FRAME_THRESHOLD, MIN_NOTE_LEN, N_FREQ_BINS_CONTOURS,
    ONSET_THRESHOLD, PITCH_BEND_SIGMA, PITCH_BEND_TOLERANCE,
};
use crate::error::{ConversionError, Result};

/// Parameters for turning model activations into a MIDI file.
///
/// Every field has a default, so a partial document deserializes into a
/// usable configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Minimum onset activation for a frame to start a note.
    pub onset_threshold: f32,

    /// Minimum note activation for a note to remain "on".
    pub frame_threshold: f32,

    /// Notes must be strictly longer than this many frames.
    pub min_note_length: usize,

    /// Consecutive sub-threshold frames tolerated before a note ends.
    pub energy_tolerance: usize,

    /// Recover additional notes from energy left unclaimed by onsets.
    pub use_melodia_trick: bool,

    /// Track sub-semitone pitch movement from the contour matrix.
    pub include_pitch_bends: bool,

    /// Half-width, in contour bins, of the pitch bend search window.
    pub pitch_bend_tolerance: usize,

    /// Standard deviation, in contour bins, of the pitch bend weighting.
    pub pitch_bend_sigma: f32,

    pub ticks_per_quarter: u16,

    /// Add onsets where the note activation rises sharply.
    pub infer_onsets: bool,

    /// Lowest frequency, in Hz, allowed to produce notes.
    pub min_frequency: Option<f32>,

    /// Highest frequency, in Hz, allowed to produce notes.
    pub max_frequency: Option<f32>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            onset_threshold: ONSET_THRESHOLD,
            frame_threshold: FRAME_THRESHOLD,
            min_note_length: MIN_NOTE_LEN,
            energy_tolerance: ENERGY_TOL,
            use_melodia_trick: true,
            include_pitch_bends: true,
            pitch_bend_tolerance: PITCH_BEND_TOLERANCE,
            pitch_bend_sigma: PITCH_BEND_SIGMA,
            ticks_per_quarter: DEFAULT_TICKS_PER_QUARTER,
            infer_onsets: false,
            min_frequency: None,
            max_frequency: None,
        }
    }
}

impl ConversionConfig {
    pub fn validate(&self) -> Result<()> {
        check_unit_interval("onset_threshold", self.onset_threshold)?;
        check_unit_interval("frame_threshold", self.frame_threshold)?;

        if self.energy_tolerance == 0 {
            return Err(invalid("energy_tolerance must be at least 1"));
        }
        if self.pitch_bend_tolerance > N_FREQ_BINS_CONTOURS {
            return Err(invalid(format!(
                "pitch_bend_tolerance must be at most {N_FREQ_BINS_CONTOURS} bins, got {}",
                self.pitch_bend_tolerance
            )));
        }
        if !self.pitch_bend_sigma.is_finite() || self.pitch_bend_sigma <= 0.0 {
            return Err(invalid(format!(
                "pitch_bend_sigma must be positive, got {}",
                self.pitch_bend_sigma
            )));
        }
        // Metrical timing is a 15-bit field.
        if self.ticks_per_quarter == 0 || self.ticks_per_quarter > 0x7FFF {
            return Err(invalid(format!(
                "ticks_per_quarter must be in 1..=32767, got {}",
                self.ticks_per_quarter
            )));
        }

        for (name, bound) in [
            ("min_frequency", self.min_frequency),
            ("max_frequency", self.max_frequency),
        ] {
            if let Some(hz) = bound {
                if !hz.is_finite() || hz <= 0.0 {
                    return Err(invalid(format!("{name} must be a positive frequency, got {hz}")));
                }
            }
        }
        if let (Some(min), Some(max)) = (self.min_frequency, self.max_frequency) {
            if min >= max {
                return Err(invalid(format!(
                    "min_frequency ({min} Hz) must be below max_frequency ({max} Hz)"
                )));
            }
        }

        Ok(())
    }
}

fn check_unit_interval(name: &str, value: f32) -> Result<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be within [0, 1], got {value}")))
    }
}

fn invalid(msg: impl Into<String>) -> ConversionError {
    ConversionError::InvalidConfig(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ConversionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ticks_per_quarter, 220);
        assert_eq!(config.energy_tolerance, 11);
        assert!(config.use_melodia_trick);
        assert!(config.include_pitch_bends);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: ConversionConfig =
            serde_json::from_str(r#"{ "include_pitch_bends": false, "ticks_per_quarter": 480 }"#).unwrap();

        assert!(!config.include_pitch_bends);
        assert_eq!(config.ticks_per_quarter, 480);
        assert_eq!(config.onset_threshold, 0.5);
        assert_eq!(config.min_note_length, 11);
        assert_eq!(config.max_frequency, None);
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        let config = ConversionConfig { frame_threshold: 1.5, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConversionError::InvalidConfig(_))));

        let config = ConversionConfig { onset_threshold: f32::NAN, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_timing_and_kernel() {
        let config = ConversionConfig { ticks_per_quarter: 0, ..Default::default() };
        assert!(config.validate().is_err());

        let config = ConversionConfig { ticks_per_quarter: 0x8000, ..Default::default() };
        assert!(config.validate().is_err());

        let config = ConversionConfig { pitch_bend_sigma: 0.0, ..Default::default() };
        assert!(config.validate().is_err());

        let config = ConversionConfig { energy_tolerance: 0, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pitch_bend_tolerance_is_bounded_by_the_contour_bins() {
        let config = ConversionConfig { pitch_bend_tolerance: 264, ..Default::default() };
        assert!(config.validate().is_ok());

        let config = ConversionConfig { pitch_bend_tolerance: 265, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConversionError::InvalidConfig(_))));

        let config: ConversionConfig =
            serde_json::from_str(r#"{ "pitch_bend_tolerance": 9223372036854775807 }"#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_frequency_range() {
        let config = ConversionConfig {
            min_frequency: Some(1000.0),
            max_frequency: Some(200.0),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ConversionConfig {
            min_frequency: Some(100.0),
            max_frequency: Some(2000.0),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
