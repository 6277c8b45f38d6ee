use std::{error::Error, fs, path::PathBuf};

use basic_pitch_midi::{
    constants::MODEL_PATH, convert, inference::BasicPitchModel, preprocessing::load_audio::load_audio,
    ConversionConfig,
};
use clap::Parser;
use log::info;

/// Transcribe a WAV recording to a MIDI file
#[derive(Parser, Debug)]
#[command(name = "basic-pitch-midi")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Input audio file (WAV)
    audio: PathBuf,

    /// Output MIDI file
    output: PathBuf,

    /// ONNX model file
    #[arg(long, default_value = MODEL_PATH)]
    model: PathBuf,

    /// Minimum onset activation for a note to start
    #[arg(long)]
    onset_threshold: Option<f32>,

    /// Minimum note activation for a note to continue
    #[arg(long)]
    frame_threshold: Option<f32>,

    /// Skip recovering notes that have no onset
    #[arg(long)]
    no_melodia_trick: bool,

    /// Write notes without pitch bends
    #[arg(long)]
    no_pitch_bends: bool,
}

impl Args {
    fn conversion_config(&self) -> ConversionConfig {
        let defaults = ConversionConfig::default();
        ConversionConfig {
            onset_threshold: self.onset_threshold.unwrap_or(defaults.onset_threshold),
            frame_threshold: self.frame_threshold.unwrap_or(defaults.frame_threshold),
            use_melodia_trick: !self.no_melodia_trick,
            include_pitch_bends: !self.no_pitch_bends,
            ..defaults
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let config = args.conversion_config();
    config.validate()?;

    let audio = load_audio(&args.audio)?;
    info!("loaded {} samples from {}", audio.len(), args.audio.display());

    let model = BasicPitchModel::load(&args.model)?;
    let activations = model.infer(&audio)?;
    info!("model produced {} frames", activations.n_frames());

    let midi_buffer = convert(&activations, &config)?;
    fs::write(&args.output, &midi_buffer)?;
    info!("wrote {}", args.output.display());

    Ok(())
}
