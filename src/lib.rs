//! Turn the frame-level activations of a polyphonic pitch model into a MIDI
//! file: onset-driven note segmentation, residual energy recovery, pitch bend
//! tracking and a deterministic event encoder.

use log::debug;

pub mod activations;
pub mod config;
pub mod constants;
pub mod error;
#[cfg(feature = "inference")]
pub mod inference;
#[cfg(feature = "inference")]
pub mod preprocessing {
    pub mod load_audio;
    pub mod windowed_audio;
}
pub mod postprocessing {
    pub mod helpers {
        pub mod ported {
            pub mod librosa;
            pub mod numpy;
        }
        #[allow(clippy::module_inception)]
        pub mod helpers;
    }
    pub mod midi;
    pub mod note_event_frames;
    pub mod note_event_times;
    pub mod peaks;
    pub mod pitch_bends;
}

pub use activations::Activations;
pub use config::ConversionConfig;
pub use error::{ConversionError, Result};
pub use postprocessing::note_event_frames::NoteEventFrame;

use postprocessing::{
    midi::generate_midi_file_data,
    note_event_frames::output_to_notes_poly,
    note_event_times::note_frames_to_time,
    pitch_bends::{add_pitch_bends_to_note_events, drop_overlapping_pitch_bends},
};

/// Extract note events, with pitch bends when enabled, from model activations.
pub fn transcribe(activations: &Activations, config: &ConversionConfig) -> Result<Vec<NoteEventFrame>> {
    config.validate()?;

    let mut note_events = output_to_notes_poly(activations, config);

    if config.include_pitch_bends {
        add_pitch_bends_to_note_events(
            activations.contours(),
            &mut note_events,
            config.pitch_bend_tolerance,
            config.pitch_bend_sigma,
        );
        drop_overlapping_pitch_bends(&mut note_events);
    }

    Ok(note_events)
}

/// Convert model activations to the bytes of a standard MIDI file.
pub fn convert(activations: &Activations, config: &ConversionConfig) -> Result<Vec<u8>> {
    let note_events = transcribe(activations, config)?;
    debug!("transcribed {} notes", note_events.len());

    let midi = generate_midi_file_data(&note_frames_to_time(&note_events), config.ticks_per_quarter)?;
    debug!("wrote {} bytes of MIDI", midi.len());

    Ok(midi)
}
