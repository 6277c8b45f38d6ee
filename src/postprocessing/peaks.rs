use ndarray::ArrayView2;

/// Find onset peaks: cells above `threshold` that are strictly greater than
/// both their temporal neighbours. The first and last frames never peak.
///
/// # Arguments
///
/// * `onsets` - Onset activation matrix (n_frames, n_bins).
/// * `threshold` - Minimum onset activation.
///
/// # Returns
///
/// * `(frame, bin)` pairs ordered by frame, then bin.
pub fn find_peaks(onsets: ArrayView2<'_, f32>, threshold: f32) -> Vec<(usize, usize)> {
    let (n_frames, n_bins) = onsets.dim();
    let mut peaks = vec![];

    for t in 1..n_frames.saturating_sub(1) {
        for f in 0..n_bins {
            let value = onsets[[t, f]];
            if value > threshold && value > onsets[[t - 1, f]] && value > onsets[[t + 1, f]] {
                peaks.push((t, f));
            }
        }
    }

    peaks
}

#[cfg(test)]
mod tests {
    use ndarray::Array2;

    use super::*;

    #[test]
    fn test_finds_strict_local_maxima_above_threshold() {
        let mut onsets = Array2::<f32>::zeros((10, 4));
        onsets[[3, 1]] = 0.9;
        onsets[[6, 2]] = 0.6;
        onsets[[6, 0]] = 0.4; // below threshold

        assert_eq!(find_peaks(onsets.view(), 0.5), vec![(3, 1), (6, 2)]);
    }

    #[test]
    fn test_plateaus_and_edges_are_not_peaks() {
        let mut onsets = Array2::<f32>::zeros((6, 2));
        onsets[[2, 0]] = 0.8;
        onsets[[3, 0]] = 0.8;
        onsets[[0, 1]] = 0.9;
        onsets[[5, 1]] = 0.9;

        assert!(find_peaks(onsets.view(), 0.5).is_empty());
    }

    #[test]
    fn test_ordered_by_frame_then_bin() {
        let mut onsets = Array2::<f32>::zeros((6, 3));
        onsets[[4, 0]] = 0.7;
        onsets[[2, 2]] = 0.7;
        onsets[[2, 1]] = 0.7;

        assert_eq!(find_peaks(onsets.view(), 0.5), vec![(2, 1), (2, 2), (4, 0)]);
    }

    #[test]
    fn test_short_inputs_have_no_peaks() {
        let onsets = Array2::<f32>::from_elem((2, 3), 1.0);
        assert!(find_peaks(onsets.view(), 0.5).is_empty());
        let onsets = Array2::<f32>::zeros((0, 3));
        assert!(find_peaks(onsets.view(), 0.5).is_empty());
    }
}
