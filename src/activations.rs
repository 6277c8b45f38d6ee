use ndarray::{Array2, ArrayView2};

use crate::constants::{N_FREQ_BINS_CONTOURS, N_FREQ_BINS_NOTES};
use crate::error::{ConversionError, Result};

/// The three frame-level matrices produced by the pitch model, indexed
/// `[frame, bin]` and sharing one time axis.
#[derive(Debug, Clone)]
pub struct Activations {
    notes: Array2<f32>,
    onsets: Array2<f32>,
    contours: Array2<f32>,
}

impl Activations {
    /// Validate and wrap model output.
    ///
    /// # Arguments
    ///
    /// * `notes` - Note activations, `(n_frames, 88)`.
    /// * `onsets` - Onset activations, `(n_frames, 88)`.
    /// * `contours` - Pitch contour activations, `(n_frames, 264)`.
    pub fn new(notes: Array2<f32>, onsets: Array2<f32>, contours: Array2<f32>) -> Result<Self> {
        let n_frames = notes.nrows();
        if n_frames == 0 {
            return Err(ConversionError::EmptyActivations);
        }

        check_shape("notes", &notes, (n_frames, N_FREQ_BINS_NOTES))?;
        check_shape("onsets", &onsets, (n_frames, N_FREQ_BINS_NOTES))?;
        check_shape("contours", &contours, (n_frames, N_FREQ_BINS_CONTOURS))?;

        check_finite("notes", notes.view())?;
        check_finite("onsets", onsets.view())?;
        check_finite("contours", contours.view())?;

        Ok(Self { notes, onsets, contours })
    }

    pub fn n_frames(&self) -> usize {
        self.notes.nrows()
    }

    pub fn notes(&self) -> ArrayView2<'_, f32> {
        self.notes.view()
    }

    pub fn onsets(&self) -> ArrayView2<'_, f32> {
        self.onsets.view()
    }

    pub fn contours(&self) -> ArrayView2<'_, f32> {
        self.contours.view()
    }
}

fn check_shape(name: &'static str, matrix: &Array2<f32>, expected: (usize, usize)) -> Result<()> {
    let found = matrix.dim();
    if found != expected {
        return Err(ConversionError::ShapeMismatch { name, expected, found });
    }
    Ok(())
}

fn check_finite(name: &'static str, matrix: ArrayView2<'_, f32>) -> Result<()> {
    match matrix.indexed_iter().find(|(_, v)| !v.is_finite()) {
        Some(((frame, bin), _)) => Err(ConversionError::NonFiniteActivation { name, frame, bin }),
        None => Ok(()),
    }
}
