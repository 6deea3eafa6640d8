//! Pulse approximator
//!
//! Composes the preprocessor and the model fitter into one call that maps a
//! raw pulse window onto a fitted curve of the same length.

use crate::config::ApproximatorConfig;
use crate::error::Result;
use crate::fit::{CurveSolver, FitOutcome, LevenbergMarquardtSolver, ModelFitter};
use crate::signal_processing::math::max_value;
use crate::signal_processing::{
    PreprocessedPulse, SavitzkyGolaySmoother, SignalPreprocessor, Smoother,
};

/// Full result of approximating one pulse window
#[derive(Debug, Clone)]
pub struct Approximation {
    /// Fitted curve, same length as the input window
    pub fitted: Vec<f64>,
    /// Preprocessing summary over the trimmed window
    pub preprocessed: PreprocessedPulse,
    pub outcome: FitOutcome,
}

impl Approximation {
    /// Maximum of the fitted curve
    pub fn fitted_peak(&self) -> f64 {
        max_value(&self.fitted).unwrap_or(f64::NEG_INFINITY)
    }

    pub fn is_model(&self) -> bool {
        self.outcome.is_success()
    }
}

/// Pulse approximator
///
/// Stateless between calls; a single instance can be shared across threads.
///
/// # Example
/// ```
/// use pulse_recover::PulseApproximator;
///
/// let time: Vec<f64> = (0..10).map(|i| i as f64).collect();
/// let current = [1.0, 2.0, 5.0, 10.0, 10.0, 10.0, 6.0, 3.0, 1.0, 0.5];
/// let fitted = PulseApproximator::default().approximate(&time, &current).unwrap();
/// assert_eq!(fitted.len(), time.len());
/// ```
#[derive(Debug, Clone)]
pub struct PulseApproximator<S = SavitzkyGolaySmoother, V = LevenbergMarquardtSolver> {
    preprocessor: SignalPreprocessor<S>,
    fitter: ModelFitter<V>,
}

impl PulseApproximator {
    pub fn new(config: &ApproximatorConfig) -> Self {
        Self::from_parts(SignalPreprocessor::new(config), ModelFitter::new(config))
    }
}

impl Default for PulseApproximator {
    fn default() -> Self {
        Self::new(&ApproximatorConfig::default())
    }
}

impl<S: Smoother, V: CurveSolver> PulseApproximator<S, V> {
    /// Assemble an approximator from explicit stages
    pub fn from_parts(preprocessor: SignalPreprocessor<S>, fitter: ModelFitter<V>) -> Self {
        Self {
            preprocessor,
            fitter,
        }
    }

    /// Fitted curve over the same time axis as the input window
    ///
    /// # Errors
    /// Fails only when the window itself cannot be processed (see
    /// `SignalPreprocessor::preprocess`); fit failures fall back to the
    /// preprocessed trace.
    pub fn approximate(&self, time: &[f64], current: &[f64]) -> Result<Vec<f64>> {
        Ok(self.approximate_detailed(time, current)?.fitted)
    }

    /// Like `approximate`, but also returns the preprocessing summary and
    /// the fit outcome
    pub fn approximate_detailed(&self, time: &[f64], current: &[f64]) -> Result<Approximation> {
        let preprocessed = self.preprocessor.preprocess(time, current)?;
        let curve = self.fitter.fit(
            &preprocessed.time,
            &preprocessed.current,
            preprocessed.peak_value,
            preprocessed.t_peak,
        );
        let fitted = reassemble(current, preprocessed.trim_offset, &curve.values);

        Ok(Approximation {
            fitted,
            preprocessed,
            outcome: curve.outcome,
        })
    }
}

/// Put the untouched leading samples back in front of `segment` and make
/// the result exactly as long as `raw`
///
/// A short segment is padded with the matching tail of `raw`; a long one is
/// truncated.
fn reassemble(raw: &[f64], trim_offset: usize, segment: &[f64]) -> Vec<f64> {
    let lead = trim_offset.min(raw.len());
    let mut out = Vec::with_capacity(raw.len());
    out.extend_from_slice(&raw[..lead]);
    out.extend_from_slice(segment);
    if out.len() < raw.len() {
        let filled = out.len();
        out.extend_from_slice(&raw[filled..]);
    }
    out.truncate(raw.len());
    out
}
