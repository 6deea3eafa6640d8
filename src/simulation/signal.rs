use crate::fit::ModelParameters;

/// Synthetic double-pulse shape
///
/// The model parameters describe the pulse itself; `baseline` is a constant
/// offset added to every sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseShape {
    pub parameters: ModelParameters,
    pub baseline: f64,
}

impl PulseShape {
    /// Unimodal discharge pulse with a fast and a slow component
    ///
    /// Rises to `amplitude` at `t_peak` and decays with rates 4 and 1 per
    /// time unit.
    pub fn discharge(amplitude: f64, t_peak: f64) -> Self {
        Self {
            parameters: ModelParameters {
                a1: 0.6 * amplitude,
                a2: 0.4 * amplitude,
                k1: -8.0,
                k2: -3.0,
                lambda1: 12.0,
                lambda2: 4.0,
                t_peak,
            },
            baseline: 0.0,
        }
    }

    pub fn with_baseline(mut self, baseline: f64) -> Self {
        self.baseline = baseline;
        self
    }

    /// Amplitude above the baseline at `t_peak`
    pub fn amplitude(&self) -> f64 {
        self.parameters.peak_amplitude()
    }
}

/// Evaluate `shape` over a time axis
pub fn generate_pulse(shape: &PulseShape, time: &[f64]) -> Vec<f64> {
    time.iter()
        .map(|&t| shape.parameters.evaluate(t) + shape.baseline)
        .collect()
}

/// `n` samples starting at 0 with spacing `dt`
pub fn uniform_time_axis(n: usize, dt: f64) -> Vec<f64> {
    (0..n).map(|i| i as f64 * dt).collect()
}
