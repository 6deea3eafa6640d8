pub mod approximator;
pub mod batch;
pub mod config;
pub mod constants;
pub mod error;
pub mod fit;
pub mod manifest;
pub mod output;
pub mod signal_processing;
pub mod waveform;

#[cfg(feature = "plot")]
pub mod plot;

#[cfg(feature = "simulation")]
pub mod simulation;

pub use approximator::{Approximation, PulseApproximator};
pub use batch::{BatchProcessor, BatchSummary, PulseRecord, PulseStatus};
pub use config::RecoverConfig;
pub use error::{PulseError, Result};
pub use fit::{FitFailure, FitOutcome, ModelParameters};
pub use manifest::{PeakEntry, read_manifest};
pub use waveform::Waveform;
