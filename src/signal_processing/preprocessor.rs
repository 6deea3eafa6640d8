use std::ops::Range;

use crate::config::ApproximatorConfig;
use crate::constants::MIN_WINDOW_SAMPLES;
use crate::error::{PulseError, Result};

use super::detrend::detrend_and_smooth;
use super::event_window::find_event_start;
use super::math::argmax;
use super::plateau::{flatten_plateau, plateau_run};
use super::savitzky_golay::{SavitzkyGolaySmoother, Smoother};

/// A pulse window cleaned up for fitting
///
/// `time` and `current` start at `trim_offset` in the original window.
#[derive(Debug, Clone)]
pub struct PreprocessedPulse {
    /// Time axis of the trimmed window
    pub time: Vec<f64>,
    /// Flattened and smoothed current of the trimmed window
    pub current: Vec<f64>,
    /// Unmodified peak current of the original window
    pub peak_value: f64,
    /// Time of the peak sample, held fixed during fitting
    pub t_peak: f64,
    /// Number of leading samples dropped before the rising edge
    pub trim_offset: usize,
    /// Peak index within the trimmed window
    pub peak_index: usize,
    /// Plateau run within the trimmed window (length 1 when not clipped)
    pub plateau: Range<usize>,
    /// Whether the post-peak tail was detrended and smoothed
    pub tail_smoothed: bool,
}

impl PreprocessedPulse {
    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }
}

/// Signal preprocessor
///
/// Trims the leading baseline, flattens a saturation plateau into a shallow
/// tent and detrends-and-smooths the decay tail.
#[derive(Debug, Clone)]
pub struct SignalPreprocessor<S = SavitzkyGolaySmoother> {
    window_length: usize,
    poly_order: usize,
    threshold_factor: f64,
    smoother: S,
}

impl SignalPreprocessor {
    pub fn new(config: &ApproximatorConfig) -> Self {
        Self::with_smoother(config, SavitzkyGolaySmoother)
    }
}

impl<S: Smoother> SignalPreprocessor<S> {
    /// Create a preprocessor with a custom smoothing implementation
    pub fn with_smoother(config: &ApproximatorConfig, smoother: S) -> Self {
        Self {
            window_length: config.window_length,
            poly_order: config.poly_order,
            threshold_factor: config.threshold_factor,
            smoother,
        }
    }

    /// Clean a pulse window for fitting
    ///
    /// # Errors
    /// `LengthMismatch` when `time` and `current` differ in length, and
    /// `DegenerateWindow` for windows of fewer than three samples.
    pub fn preprocess(&self, time: &[f64], current: &[f64]) -> Result<PreprocessedPulse> {
        validate_window(time, current)?;

        let peak = argmax(current).ok_or(PulseError::DegenerateWindow {
            needed: MIN_WINDOW_SAMPLES,
            available: 0,
        })?;
        let peak_value = current[peak];
        let trim_offset = find_event_start(current, peak, self.threshold_factor)?;

        let mut zoomed = current[trim_offset..].to_vec();
        let zoomed_time = time[trim_offset..].to_vec();
        let peak_index = peak - trim_offset;

        let plateau = plateau_run(&zoomed, peak_index, peak_value);
        flatten_plateau(&mut zoomed, plateau.clone(), peak_value);

        let tail_smoothed = detrend_and_smooth(
            &mut zoomed[peak_index + 1..],
            self.window_length,
            self.poly_order,
            &self.smoother,
        );

        log::debug!(
            "Preprocessed pulse: peak {:.4} at {}, trimmed {}, plateau {} samples, tail smoothed: {}",
            peak_value,
            peak,
            trim_offset,
            plateau.len(),
            tail_smoothed
        );

        Ok(PreprocessedPulse {
            t_peak: zoomed_time[peak_index],
            time: zoomed_time,
            current: zoomed,
            peak_value,
            trim_offset,
            peak_index,
            plateau,
            tail_smoothed,
        })
    }
}

/// Check that a window has matching axes and enough samples to process
pub fn validate_window(time: &[f64], current: &[f64]) -> Result<()> {
    if time.len() != current.len() {
        return Err(PulseError::LengthMismatch {
            time: time.len(),
            current: current.len(),
        });
    }
    if current.len() < MIN_WINDOW_SAMPLES {
        return Err(PulseError::DegenerateWindow {
            needed: MIN_WINDOW_SAMPLES,
            available: current.len(),
        });
    }
    Ok(())
}
