//! Configuration for pulse amplitude recovery.
//!
//! All sections deserialize from TOML with per-field defaults, so a config
//! file only needs to name the values it changes:
//!
//! ```toml
//! [approximator]
//! window_length = 21
//!
//! [window]
//! post_peak_samples = 200
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{PulseError, Result};
use crate::signal_processing::event_window::{DEFAULT_EXTRA_POINTS, DEFAULT_THRESHOLD_FACTOR};

/// System-wide recovery configuration
///
/// Use `RecoverConfig::default()` for the batch defaults.
///
/// # Example
/// ```
/// use pulse_recover::config::RecoverConfig;
///
/// let mut config = RecoverConfig::default();
/// config.approximator.window_length = 21;
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecoverConfig {
    /// Preprocessing and fitting parameters
    pub approximator: ApproximatorConfig,
    /// Pulse windowing around manifest peaks
    pub window: WindowConfig,
    /// Batch classification and reporting
    pub batch: BatchConfig,
}

impl Default for RecoverConfig {
    fn default() -> Self {
        Self {
            // Batch runs smooth slightly tighter than the library default
            approximator: ApproximatorConfig {
                window_length: 15,
                ..ApproximatorConfig::default()
            },
            window: WindowConfig::default(),
            batch: BatchConfig::default(),
        }
    }
}

impl RecoverConfig {
    /// Load a configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| PulseError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.approximator.validate()?;
        self.window.validate()
    }
}

/// Preprocessing and model fitting configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApproximatorConfig {
    /// Savitzky-Golay window for tail smoothing.
    /// Controls tail-smoothing locality; larger is smoother but less
    /// responsive to rapid decay curvature. Clamped to the tail length and
    /// forced odd at use.
    pub window_length: usize,
    /// Savitzky-Golay polynomial degree
    pub poly_order: usize,
    /// Fraction of the peak first difference marking event onset
    pub threshold_factor: f64,
    /// Evaluation budget for the least-squares solver
    pub max_evaluations: usize,
}

impl Default for ApproximatorConfig {
    fn default() -> Self {
        Self {
            window_length: 20,
            poly_order: 2,
            threshold_factor: DEFAULT_THRESHOLD_FACTOR,
            max_evaluations: 50_000,
        }
    }
}

impl ApproximatorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.window_length == 0 {
            return Err(PulseError::Config(
                "window_length must be positive".to_string(),
            ));
        }
        if self.poly_order >= self.window_length {
            return Err(PulseError::Config(format!(
                "poly_order {} must be less than window_length {}",
                self.poly_order, self.window_length
            )));
        }
        if !(self.threshold_factor > 0.0 && self.threshold_factor.is_finite()) {
            return Err(PulseError::Config(format!(
                "threshold_factor must be positive, got {}",
                self.threshold_factor
            )));
        }
        if self.max_evaluations == 0 {
            return Err(PulseError::Config(
                "max_evaluations must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Pulse windowing configuration
///
/// The batch runner cuts `[peak - pre_peak_samples, peak + post_peak_samples)`
/// out of each recording before handing it to the approximator.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Samples kept before the manifest peak
    pub pre_peak_samples: usize,
    /// Samples kept after the manifest peak
    pub post_peak_samples: usize,
    /// Minimum requested span; shorter windows are rejected
    pub min_span: usize,
    /// Minimum samples actually available after slicing
    pub min_samples: usize,
    /// Padding added past the detected decay edge
    pub extra_points: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            pre_peak_samples: 30,
            post_peak_samples: 150,
            min_span: 5,
            min_samples: 3,
            extra_points: DEFAULT_EXTRA_POINTS,
        }
    }
}

impl WindowConfig {
    pub fn validate(&self) -> Result<()> {
        if self.pre_peak_samples + self.post_peak_samples < self.min_span {
            return Err(PulseError::Config(format!(
                "window span {} is shorter than min_span {}",
                self.pre_peak_samples + self.post_peak_samples,
                self.min_span
            )));
        }
        Ok(())
    }
}

/// Batch classification and reporting configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Absolute amplitude tolerance for the restored classification
    pub restore_tolerance: f64,
    /// Path fragments removed from manifest filenames before resolving
    pub strip_prefixes: Vec<String>,
    /// Summary report file name, written inside the plots directory
    pub stats_filename: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            restore_tolerance: 0.01,
            strip_prefixes: vec!["../".to_string(), "data_01_11_2017/".to_string()],
            stats_filename: "stats.txt".to_string(),
        }
    }
}
