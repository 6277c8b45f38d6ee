use ndarray::{s, Array2, ArrayView2, ArrayViewMut2, Zip};

use crate::constants::{ANNOTATIONS_BASE_FREQUENCY, CONTOURS_BINS_PER_SEMITONE, MIDI_OFFSET};

use super::ported::{
    librosa::{hz_to_midi, midi_to_hz},
    numpy::global_max,
};

/// Mutate onsets and frames to have 0s outside of the frequency bounds.
///
/// # Arguments
///
/// * `onsets` - Onset activations (n_frames, n_bins).
/// * `frames` - Note activations (n_frames, n_bins).
/// * `max_freq` - Maximum non-0 frequency in Hz.
/// * `min_freq` - Minimum non-0 frequency in Hz.
pub fn constrain_frequency(
    mut onsets: ArrayViewMut2<'_, f32>,
    mut frames: ArrayViewMut2<'_, f32>,
    max_freq: Option<f32>,
    min_freq: Option<f32>,
) {
    let n_bins = frames.ncols();
    let to_bin = |hz: f32| {
        let bin = (hz_to_midi(hz) - MIDI_OFFSET as f32).round().max(0.0) as usize;
        bin.min(n_bins)
    };

    if let Some(max_freq) = max_freq {
        let max_freq_idx = to_bin(max_freq);
        onsets.slice_mut(s![.., max_freq_idx..]).fill(0.0);
        frames.slice_mut(s![.., max_freq_idx..]).fill(0.0);
    }

    if let Some(min_freq) = min_freq {
        let min_freq_idx = to_bin(min_freq);
        onsets.slice_mut(s![.., ..min_freq_idx]).fill(0.0);
        frames.slice_mut(s![.., ..min_freq_idx]).fill(0.0);
    }
}

/// Infer onsets from large changes in frame amplitudes.
///
/// # Arguments
///
/// * `onsets` - Onset activations (n_frames, n_bins).
/// * `frames` - Note activations (n_frames, n_bins).
/// * `n_diff` - Number of differences to compute.
///
/// # Returns
///
/// * The element-wise max of the onsets and the rescaled frame differences.
pub fn get_inferred_onsets(onsets: ArrayView2<'_, f32>, frames: ArrayView2<'_, f32>, n_diff: usize) -> Array2<f32> {
    if n_diff == 0 {
        return onsets.to_owned();
    }

    // min over n of frames[t] - frames[t - n], with zeros before the first frame
    let mut frame_diff = Array2::from_elem(frames.dim(), f32::INFINITY);
    for n in 1..=n_diff {
        Zip::indexed(&mut frame_diff).for_each(|(t, f), diff| {
            let previous = if t >= n { frames[[t - n, f]] } else { 0.0 };
            *diff = diff.min(frames[[t, f]] - previous);
        });
    }

    frame_diff.mapv_inplace(|v| v.max(0.0));

    let n_leading = n_diff.min(frame_diff.nrows());
    frame_diff.slice_mut(s![..n_leading, ..]).fill(0.0);

    // rescale to have the same max as onsets
    let onset_max = global_max(onsets);
    let frame_diff_max = global_max(frame_diff.view());
    if frame_diff_max > 0.0 {
        frame_diff.mapv_inplace(|v| onset_max * v / frame_diff_max);
    }

    Zip::from(&mut frame_diff).and(&onsets).for_each(|diff, &onset| *diff = diff.max(onset));
    frame_diff
}

/// Return a symmetric gaussian window.
///
/// The gaussian window is defined as:
///   w(n) = exp(-1/2 * (n / sigma)^2)
///
/// # Arguments
///
/// * `m` - Number of points in the output window. If zero, an empty window is returned.
/// * `std` - The standard deviation, sigma.
///
/// # Returns
///
/// * The window, with the maximum value normalized to 1.
pub fn gaussian(m: usize, std: f32) -> Vec<f32> {
    if m == 0 {
        return vec![];
    }

    let midpoint = (m - 1) as f32 / 2.0;
    (0..m)
        .map(|n| (-(n as f32 - midpoint).powi(2) / (2.0 * std.powi(2))).exp())
        .collect()
}

/// Converts a MIDI pitch to a (fractional) contour bin.
pub fn midi_pitch_to_contour_bin(pitch_midi: f32) -> f32 {
    12.0 * CONTOURS_BINS_PER_SEMITONE as f32 * (midi_to_hz(pitch_midi) / ANNOTATIONS_BASE_FREQUENCY).log2()
}
