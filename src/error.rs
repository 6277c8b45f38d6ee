use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("activation matrices have an empty time axis")]
    EmptyActivations,

    #[error("activation matrix `{name}` has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        name: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("activation matrix `{name}` holds a non-finite value at frame {frame}, bin {bin}")]
    NonFiniteActivation {
        name: &'static str,
        frame: usize,
        bin: usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to write MIDI data: {0}")]
    MidiWrite(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConversionError>;
