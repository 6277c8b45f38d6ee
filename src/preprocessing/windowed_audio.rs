use crate::constants::AUDIO_N_SAMPLES;

/// Fixed-length windows over an audio buffer, `hop_size` samples apart. The
/// last window is zero padded.
pub struct WindowedAudio<'a> {
    audio: &'a [f32],
    hop_size: usize,
    index: usize,
}

impl Iterator for WindowedAudio<'_> {
    type Item = Vec<f32>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.audio.len() {
            return None;
        }

        let end_index = (self.index + AUDIO_N_SAMPLES).min(self.audio.len());
        let mut window = self.audio[self.index..end_index].to_vec();
        window.resize(AUDIO_N_SAMPLES, 0.0);

        self.index += self.hop_size;
        Some(window)
    }
}

pub fn window_audio_file(audio: &[f32], hop_size: usize) -> WindowedAudio<'_> {
    WindowedAudio {
        audio,
        hop_size: hop_size.max(1),
        index: 0,
    }
}
