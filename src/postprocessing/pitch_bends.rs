use log::debug;
use ndarray::ArrayView2;

use super::helpers::{
    helpers::{gaussian, midi_pitch_to_contour_bin},
    ported::numpy::arg_max,
};
use super::note_event_frames::NoteEventFrame;

/// Add pitch bends to note events based on the contours.
///
/// For every frame of a note, the contour row is searched within
/// `n_bins_tolerance` bins of the note's nominal contour bin, weighted by a
/// gaussian centred on that bin. The bend is the winning bin's offset from
/// the nominal bin; the search window is clipped at the matrix edges.
///
/// # Arguments
///
/// * `contours` - Contour activations (n_frames, n_contour_bins).
/// * `notes` - Note events; their `pitch_bends` are overwritten.
/// * `n_bins_tolerance` - Half-width of the search window, in contour bins.
/// * `sigma` - Standard deviation of the gaussian weighting, in contour bins.
pub fn add_pitch_bends_to_note_events(
    contours: ArrayView2<'_, f32>,
    notes: &mut [NoteEventFrame],
    n_bins_tolerance: usize,
    sigma: f32,
) {
    let n_freqs = contours.ncols();
    let window_length = n_bins_tolerance * 2 + 1;
    let freq_gaussian = gaussian(window_length, sigma);

    for note in notes.iter_mut() {
        let freq_idx = midi_pitch_to_contour_bin(note.pitch_midi as f32).round().max(0.0) as usize;
        let freq_start_idx = freq_idx.saturating_sub(n_bins_tolerance);
        let freq_end_idx = (freq_idx + n_bins_tolerance + 1).min(n_freqs);

        // gaussian index of freq_start_idx
        let gaussian_start = freq_start_idx + n_bins_tolerance - freq_idx;

        let bends = (note.start_frame..note.end_frame)
            .map(|t| {
                let weighted: Vec<f32> = (freq_start_idx..freq_end_idx)
                    .zip(&freq_gaussian[gaussian_start..])
                    .map(|(f, &g)| contours[[t, f]] * g)
                    .collect();
                let peak = arg_max(&weighted).map_or(freq_idx, |i| freq_start_idx + i);
                peak as i32 - freq_idx as i32
            })
            .collect();

        note.pitch_bends = Some(bends);
    }
}

/// Drop pitch bends from every note whose `[start, end)` span intersects
/// another note's, regardless of pitch or overlap length.
///
/// Notes are left sorted by start frame.
pub fn drop_overlapping_pitch_bends(notes: &mut [NoteEventFrame]) {
    notes.sort_by(|a, b| {
        a.start_frame
            .cmp(&b.start_frame)
            .then(a.end_frame.cmp(&b.end_frame))
            .then(a.pitch_midi.cmp(&b.pitch_midi))
            .then(a.amplitude.total_cmp(&b.amplitude))
    });

    let mut dropped = 0;
    for i in 0..notes.len() {
        for j in i + 1..notes.len() {
            if notes[j].start_frame >= notes[i].end_frame {
                break;
            }
            for idx in [i, j] {
                if notes[idx].pitch_bends.take().is_some() {
                    dropped += 1;
                }
            }
        }
    }

    debug!("dropped pitch bends from {dropped} overlapping notes");
}
