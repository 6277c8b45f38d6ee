use std::ops::Range;

use log::{debug, trace};
use ndarray::{s, Array2, ArrayView2};

use crate::activations::Activations;
use crate::config::ConversionConfig;
use crate::constants::MIDI_OFFSET;

use super::helpers::{
    helpers::{constrain_frequency, get_inferred_onsets},
    ported::numpy::arg_max_2d,
};
use super::peaks::find_peaks;

#[derive(Debug, Clone, PartialEq)]
pub struct NoteEventFrame {
    pub start_frame: usize,
    /// Exclusive.
    pub end_frame: usize,
    pub pitch_midi: u8,
    pub amplitude: f32,
    /// Per-frame offsets, in contour bins, from the nominal pitch.
    pub pitch_bends: Option<Vec<i32>>,
}

impl NoteEventFrame {
    pub fn duration_frames(&self) -> usize {
        self.end_frame - self.start_frame
    }

    /// Whether the `[start, end)` frame spans of both notes intersect.
    pub fn overlaps(&self, other: &NoteEventFrame) -> bool {
        self.start_frame < other.end_frame && other.start_frame < self.end_frame
    }
}

/// Decode model activations to polyphonic note events.
///
/// Onset peaks are consumed latest first, each claiming the note energy that
/// follows it. With `use_melodia_trick`, notes are then pulled out of whatever
/// energy the onsets left behind. Neither pass touches `activations`; both
/// work on a private copy of the note matrix.
///
/// # Returns
///
/// * Onset-driven notes followed by recovered notes, without pitch bends.
pub fn output_to_notes_poly(activations: &Activations, config: &ConversionConfig) -> Vec<NoteEventFrame> {
    let mut frames = activations.notes().to_owned();
    let mut onsets = activations.onsets().to_owned();

    constrain_frequency(onsets.view_mut(), frames.view_mut(), config.max_frequency, config.min_frequency);

    if config.infer_onsets {
        onsets = get_inferred_onsets(onsets.view(), frames.view(), 2);
    }

    let mut peaks = find_peaks(onsets.view(), config.onset_threshold);
    peaks.reverse();
    debug!("found {} onset peaks over {} frames", peaks.len(), frames.nrows());

    let mut remaining_energy = frames.clone();

    let mut note_events = segment_notes(&peaks, frames.view(), &mut remaining_energy, config);
    debug!("segmented {} notes from onset peaks", note_events.len());

    if config.use_melodia_trick {
        let recovered = apply_melodia_trick(frames.view(), &mut remaining_energy, config);
        debug!("recovered {} notes from residual energy", recovered.len());
        note_events.extend(recovered);
    }

    note_events
}

/// Grow a note forward from each peak until the energy at its bin stays
/// below `frame_threshold` for `energy_tolerance` frames.
///
/// Accepted notes zero their span (and the adjacent bins) in
/// `remaining_energy`, so later peaks and the melodia pass cannot claim the
/// same energy again. Peaks are processed in the order given.
///
/// # Arguments
///
/// * `peaks` - `(frame, bin)` onset peaks, in processing order.
/// * `frames` - Note activations, used for amplitudes.
/// * `remaining_energy` - Working copy of the note activations, used for scanning.
/// * `config` - Thresholds and lengths.
pub fn segment_notes(
    peaks: &[(usize, usize)],
    frames: ArrayView2<'_, f32>,
    remaining_energy: &mut Array2<f32>,
    config: &ConversionConfig,
) -> Vec<NoteEventFrame> {
    let n_frames = frames.nrows();

    peaks
        .iter()
        .filter_map(|&(note_start_idx, freq_idx)| {
            // find time index at this frequency band where the frames drop below an energy threshold
            let mut i = note_start_idx + 1;
            let mut k = 0; // number of frames since energy dropped below threshold
            while i + 1 < n_frames && k < config.energy_tolerance {
                if remaining_energy[[i, freq_idx]] < config.frame_threshold {
                    k += 1;
                } else {
                    k = 0;
                }
                i += 1;
            }

            i -= k; // go back to frame above threshold

            if i - note_start_idx <= config.min_note_length {
                return None;
            }

            for t in note_start_idx..i {
                clear_energy(remaining_energy, t, freq_idx);
            }

            let note = NoteEventFrame {
                start_frame: note_start_idx,
                end_frame: i,
                pitch_midi: (freq_idx + MIDI_OFFSET) as u8,
                amplitude: mean_activation(frames, freq_idx, note_start_idx..i),
                pitch_bends: None,
            };
            trace!("onset note {note:?}");
            Some(note)
        })
        .collect()
}

/// Repeatedly take the strongest remaining cell and grow a note around it in
/// both directions, zeroing every visited cell and its adjacent bins.
///
/// Stops once nothing in `remaining_energy` exceeds `frame_threshold`. Every
/// iteration zeroes the current maximum, so the loop always terminates.
/// Amplitudes come from `frames`, never from the residual.
pub fn apply_melodia_trick(
    frames: ArrayView2<'_, f32>,
    remaining_energy: &mut Array2<f32>,
    config: &ConversionConfig,
) -> Vec<NoteEventFrame> {
    let n_frames = remaining_energy.nrows();
    let frame_thresh = config.frame_threshold;
    let energy_tol = config.energy_tolerance;

    let mut note_events = vec![];

    while let Some(((i_mid, freq_idx), max_energy)) = arg_max_2d(remaining_energy.view()) {
        if max_energy <= frame_thresh {
            break;
        }

        remaining_energy[[i_mid, freq_idx]] = 0.0;

        // forward pass
        let mut i = i_mid + 1;
        let mut k = 0;
        while i + 1 < n_frames && k < energy_tol {
            if remaining_energy[[i, freq_idx]] < frame_thresh {
                k += 1;
            } else {
                k = 0;
            }
            clear_energy(remaining_energy, i, freq_idx);
            i += 1;
        }
        let i_end = i - 1 - k;

        // backwards pass
        let mut i = i_mid as isize - 1;
        let mut k = 0;
        while i > 0 && k < energy_tol {
            let t = i as usize;
            if remaining_energy[[t, freq_idx]] < frame_thresh {
                k += 1;
            } else {
                k = 0;
            }
            clear_energy(remaining_energy, t, freq_idx);
            i -= 1;
        }
        let i_start = (i + 1) as usize + k;

        if i_end - i_start <= config.min_note_length {
            // too short; the energy stays removed
            continue;
        }

        let note = NoteEventFrame {
            start_frame: i_start,
            end_frame: i_end,
            pitch_midi: (freq_idx + MIDI_OFFSET) as u8,
            amplitude: mean_activation(frames, freq_idx, i_start..i_end),
            pitch_bends: None,
        };
        trace!("recovered note {note:?}");
        note_events.push(note);
    }

    note_events
}

/// Zero a cell and its neighbouring bins.
fn clear_energy(remaining_energy: &mut Array2<f32>, t: usize, freq_idx: usize) {
    let max_freq_idx = remaining_energy.ncols() - 1;

    remaining_energy[[t, freq_idx]] = 0.0;
    if freq_idx < max_freq_idx {
        remaining_energy[[t, freq_idx + 1]] = 0.0;
    }
    if freq_idx > 0 {
        remaining_energy[[t, freq_idx - 1]] = 0.0;
    }
}

fn mean_activation(frames: ArrayView2<'_, f32>, freq_idx: usize, span: Range<usize>) -> f32 {
    frames.slice(s![span, freq_idx]).mean().unwrap_or(0.0)
}
