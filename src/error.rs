use thiserror::Error;

#[derive(Error, Debug)]
pub enum PulseError {
    #[error("Degenerate window: need {needed} samples, have {available}")]
    DegenerateWindow { needed: usize, available: usize },

    #[error("Length mismatch: time has {time} samples, current has {current}")]
    LengthMismatch { time: usize, current: usize },

    #[error("Peak index {index} out of range for trace of {len} samples")]
    PeakOutOfRange { index: usize, len: usize },

    #[error("Manifest line {line}: {reason}")]
    Manifest { line: usize, reason: String },

    #[error("Waveform error: {0}")]
    Waveform(String),

    #[error("Plot error: {0}")]
    Plot(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PulseError>;
