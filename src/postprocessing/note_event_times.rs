use crate::constants::{ANNOTATIONS_FPS, ANNOT_N_FRAMES, AUDIO_SAMPLE_RATE, FFT_HOP, WINDOW_OFFSET};

use super::note_event_frames::NoteEventFrame;

#[derive(Debug, Clone, PartialEq)]
pub struct NoteEventTime {
    pub start_time_seconds: f32,
    pub end_time_seconds: f32,
    pub pitch_midi: u8,
    pub amplitude: f32,
    pub pitch_bends: Option<Vec<i32>>,
}

impl NoteEventTime {
    pub fn duration_seconds(&self) -> f32 {
        self.end_time_seconds - self.start_time_seconds
    }
}

/// Converts from the model's "frame" time to seconds.
///
/// The hop-based time is pulled back by [`WINDOW_OFFSET`] for every analysis
/// window the frame lies in, spread evenly over the window.
///
/// # Arguments
///
/// * `frame` - The model's "frame".
///
/// # Returns
///
/// * The time the frame maps to in seconds.
pub fn model_frame_to_time(frame: usize) -> f32 {
    let frame = frame as f32;
    let original_time = frame * FFT_HOP as f32 / AUDIO_SAMPLE_RATE as f32;
    let window_number = frame / ANNOT_N_FRAMES as f32;
    original_time - WINDOW_OFFSET * window_number
}

/// Number of model frames covering `n_samples` of audio at the model's sample rate.
pub fn n_frames_for_samples(n_samples: usize) -> usize {
    (n_samples as f64 * ANNOTATIONS_FPS as f64 / AUDIO_SAMPLE_RATE as f64).floor() as usize
}

/// Convert note frames to time-based note events.
///
/// # Arguments
///
/// * `notes` - List of note events.
///
/// # Returns
///
/// * List of time-based note events.
pub fn note_frames_to_time(notes: &[NoteEventFrame]) -> Vec<NoteEventTime> {
    notes
        .iter()
        .map(|note| NoteEventTime {
            start_time_seconds: model_frame_to_time(note.start_frame),
            end_time_seconds: model_frame_to_time(note.end_frame),
            pitch_midi: note.pitch_midi,
            amplitude: note.amplitude,
            pitch_bends: note.pitch_bends.clone(),
        })
        .collect()
}
