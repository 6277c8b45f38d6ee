use std::path::Path;

use log::debug;
use ndarray::{concatenate, s, Array2, ArrayView2, Axis, Ix2};
use ort::{GraphOptimizationLevel, Session, Tensor};
use thiserror::Error;

use crate::activations::Activations;
use crate::constants::{AUDIO_N_SAMPLES, FFT_HOP, N_OVERLAPPING_FRAMES};
use crate::error::ConversionError;
use crate::postprocessing::note_event_times::n_frames_for_samples;
use crate::preprocessing::windowed_audio::window_audio_file;

const CONTOURS_OUTPUT: &str = "StatefulPartitionedCall:0";
const NOTES_OUTPUT: &str = "StatefulPartitionedCall:1";
const ONSETS_OUTPUT: &str = "StatefulPartitionedCall:2";

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("failed to read WAV file: {0}")]
    Wav(#[from] hound::Error),

    #[error("failed to set up resampler: {0}")]
    ResamplerConstruction(#[from] rubato::ResamplerConstructionError),

    #[error("failed to resample audio: {0}")]
    Resample(#[from] rubato::ResampleError),

    #[error("model error: {0}")]
    Model(#[from] ort::Error),

    #[error("unexpected model output shape: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("model produced no `{0}` output")]
    MissingOutput(&'static str),

    #[error("audio is empty")]
    EmptyAudio,

    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

/// The note, onset and contour model, loaded from an ONNX file.
pub struct BasicPitchModel {
    session: Session,
}

impl BasicPitchModel {
    pub fn load<P: AsRef<Path>>(model_path: P) -> Result<Self, InferenceError> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(model_path)?;

        Ok(Self { session })
    }

    /// Run the model over mono audio sampled at 22050 Hz.
    ///
    /// The audio is cut into overlapping windows, front padded by half the
    /// overlap. Each window's outputs lose their overlapping frames before
    /// being stitched back together and trimmed to the audio's length.
    pub fn infer(&self, audio: &[f32]) -> Result<Activations, InferenceError> {
        if audio.is_empty() {
            return Err(InferenceError::EmptyAudio);
        }

        let overlap_len = N_OVERLAPPING_FRAMES * FFT_HOP;
        let hop_size = AUDIO_N_SAMPLES - overlap_len;

        let mut padded = vec![0.0; overlap_len / 2];
        padded.extend_from_slice(audio);

        let mut contours = vec![];
        let mut notes = vec![];
        let mut onsets = vec![];

        for window in window_audio_file(&padded, hop_size) {
            let input_tensor = Tensor::from_array((vec![1i64, AUDIO_N_SAMPLES as i64, 1], window))?;
            let outputs = self.session.run(ort::inputs![input_tensor]?)?;

            for (&k, v) in outputs.iter() {
                let value = v
                    .try_extract_tensor::<f32>()?
                    .index_axis(Axis(0), 0)
                    .into_dimensionality::<Ix2>()?
                    .to_owned();

                match k {
                    CONTOURS_OUTPUT => contours.push(value),
                    NOTES_OUTPUT => notes.push(value),
                    ONSETS_OUTPUT => onsets.push(value),
                    _ => {}
                }
            }
        }
        debug!("ran the model over {} windows", notes.len());

        let n_frames = n_frames_for_samples(audio.len());
        let notes = unwrap_output("notes", &notes, n_frames, N_OVERLAPPING_FRAMES)?;
        let onsets = unwrap_output("onsets", &onsets, n_frames, N_OVERLAPPING_FRAMES)?;
        let contours = unwrap_output("contours", &contours, n_frames, N_OVERLAPPING_FRAMES)?;

        Ok(Activations::new(notes, onsets, contours)?)
    }
}

/// Drop the overlapping frames from each window's output, concatenate the
/// windows and keep the first `n_output_frames` frames.
pub fn unwrap_output(
    name: &'static str,
    windows: &[Array2<f32>],
    n_output_frames: usize,
    n_overlapping_frames: usize,
) -> Result<Array2<f32>, InferenceError> {
    if windows.is_empty() {
        return Err(InferenceError::MissingOutput(name));
    }

    let n_olap = n_overlapping_frames / 2;
    let trimmed: Vec<ArrayView2<f32>> = windows
        .iter()
        .map(|w| {
            let start = n_olap.min(w.nrows());
            let end = w.nrows().saturating_sub(n_olap).max(start);
            w.slice(s![start..end, ..])
        })
        .collect();

    let unwrapped = concatenate(Axis(0), &trimmed)?;
    let n = n_output_frames.min(unwrapped.nrows());

    Ok(unwrapped.slice(s![..n, ..]).to_owned())
}
