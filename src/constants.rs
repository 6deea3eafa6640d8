//! Numeric constants for pulse reconstruction
//!
//! These constants define the tolerances and fixed heuristics used by the
//! preprocessing and fitting stages.

/// Absolute floor for the plateau tolerance.
/// Samples within `max(PLATEAU_ABS_TOLERANCE, PLATEAU_REL_TOLERANCE * |peak|)`
/// of the peak value are considered part of a saturation plateau.
pub const PLATEAU_ABS_TOLERANCE: f64 = 1e-6;

/// Plateau tolerance relative to the peak magnitude.
pub const PLATEAU_REL_TOLERANCE: f64 = 1e-3;

/// Height of the synthetic tent placed on a flattened plateau, as a
/// fraction of the peak value.
pub const PLATEAU_EXCESS_FRACTION: f64 = 0.01;

/// Floor applied to tail samples before taking the logarithm for detrending.
pub const LOG_FLOOR: f64 = 1e-10;

/// The tail after the peak must be strictly longer than this to be
/// detrended and smoothed.
pub const MIN_TAIL_SAMPLES: usize = 5;

/// Smoothing windows at or below this length are skipped.
pub const MIN_SMOOTHING_WINDOW: usize = 2;

/// Fallback start position as a fraction of the peak index when no
/// derivative sample exceeds the onset threshold.
pub const START_FALLBACK_FRACTION: f64 = 0.9;

/// Fallback end offset as a fraction of the post-peak length when no
/// derivative sample falls below the offset threshold.
pub const END_FALLBACK_FRACTION: f64 = 0.1;

/// Initial rise-rate guess for both model components.
pub const INITIAL_RISE_RATE: f64 = 5.0;

/// Initial decay-rate guess for both model components.
pub const INITIAL_DECAY_RATE: f64 = 1.0;

/// Number of free parameters in the double-pulse model.
pub const MODEL_FREE_PARAMETERS: usize = 6;

/// Minimum number of samples in a window the core will process.
pub const MIN_WINDOW_SAMPLES: usize = 3;
