use std::path::Path;

use hound::{SampleFormat, WavReader};
use log::debug;
use rubato::{Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction};

use crate::constants::AUDIO_SAMPLE_RATE;
use crate::inference::InferenceError;

/// Decode a WAV file to mono samples at the model's sample rate.
pub fn load_audio<P: AsRef<Path>>(path: P) -> Result<Vec<f32>, InferenceError> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.into_samples::<f32>().collect::<Result<Vec<f32>, _>>()?,
        SampleFormat::Int => {
            let max_sample_value = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max_sample_value))
                .collect::<Result<Vec<f32>, _>>()?
        }
    };

    let mono = downmix(&samples, spec.channels.max(1) as usize);
    debug!(
        "decoded {} frames at {} Hz from {} channel(s)",
        mono.len(),
        spec.sample_rate,
        spec.channels
    );

    resample(mono, spec.sample_rate, AUDIO_SAMPLE_RATE as u32)
}

/// Average interleaved channels into one.
pub fn downmix(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }

    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

fn resample(samples: Vec<f32>, from_rate: u32, to_rate: u32) -> Result<Vec<f32>, InferenceError> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples);
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let resample_ratio = to_rate as f64 / from_rate as f64;
    let mut resampler = SincFixedIn::<f64>::new(resample_ratio, 2.0, params, samples.len(), 1)?;

    let channel_data = vec![samples.iter().map(|&s| s as f64).collect::<Vec<f64>>()];
    let resampled = resampler.process(&channel_data, None)?;

    let expected_len = (samples.len() as f64 * resample_ratio).round() as usize;
    debug!("resampled {} Hz -> {} Hz", from_rate, to_rate);

    Ok(resampled
        .first()
        .map(|channel| channel.iter().take(expected_len).map(|&s| s as f32).collect())
        .unwrap_or_default())
}
