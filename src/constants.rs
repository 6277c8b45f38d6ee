// Inference
pub const AUDIO_SAMPLE_RATE: usize = 22050;
pub const FFT_HOP: usize = 256;
pub const ANNOTATIONS_FPS: usize = AUDIO_SAMPLE_RATE / FFT_HOP;
pub const AUDIO_WINDOW_LENGTH: usize = 2;
pub const AUDIO_N_SAMPLES: usize = AUDIO_SAMPLE_RATE * AUDIO_WINDOW_LENGTH - FFT_HOP;
pub const ANNOT_N_FRAMES: usize = ANNOTATIONS_FPS * AUDIO_WINDOW_LENGTH;
pub const N_OVERLAPPING_FRAMES: usize = 30;
pub const MODEL_PATH: &str = "./model/icassp_2022_nmp.onnx";

// Model output layout
pub const N_FREQ_BINS_NOTES: usize = 88;
pub const CONTOURS_BINS_PER_SEMITONE: usize = 3;
pub const N_FREQ_BINS_CONTOURS: usize = N_FREQ_BINS_NOTES * CONTOURS_BINS_PER_SEMITONE;
pub const MAX_FREQ_IDX: usize = N_FREQ_BINS_NOTES - 1;
/// Lowest key on a piano, in Hz.
pub const ANNOTATIONS_BASE_FREQUENCY: f32 = 27.5;

/// Seconds lost per analysis window to the model's frame centering.
pub const WINDOW_OFFSET: f32 = (FFT_HOP as f32 / AUDIO_SAMPLE_RATE as f32)
    * (ANNOT_N_FRAMES as f32 - AUDIO_N_SAMPLES as f32 / FFT_HOP as f32)
    + 0.0018;

// Note extraction
pub const ONSET_THRESHOLD: f32 = 0.5;
pub const FRAME_THRESHOLD: f32 = 0.3;
pub const MIN_NOTE_LEN: usize = 11;
pub const ENERGY_TOL: usize = 11;
pub const PITCH_BEND_TOLERANCE: usize = 25;
pub const PITCH_BEND_SIGMA: f32 = 5.0;

// MIDI Conversion
pub const MIDI_OFFSET: usize = 21;
pub const MIDI_TEMPO_US: u32 = 500_000;
pub const TIME_SIGNATURE_NUMERATOR: u8 = 4;
/// Denominator as a power of two (4 = 2^2).
pub const TIME_SIGNATURE_DENOMINATOR_POW2: u8 = 2;
pub const DEFAULT_TICKS_PER_QUARTER: u16 = 220;
pub const MIDI_CHANNEL: u8 = 0;
/// General MIDI electric piano.
pub const MIDI_PROGRAM: u8 = 4;
pub const PITCH_BEND_CENTER: i32 = 8192;
pub const PITCH_BEND_MAX: i32 = 16383;
pub const PITCH_BEND_PER_CONTOUR_BIN: i32 = 4096 / CONTOURS_BINS_PER_SEMITONE as i32;
