use serde::Serialize;

use crate::constants::{INITIAL_DECAY_RATE, INITIAL_RISE_RATE, MODEL_FREE_PARAMETERS};

/// Single asymmetric pulse
///
/// `A * exp(-k * (t - t_peak))`, multiplied by `exp(-lambda * (t - t_peak))`
/// after the peak only. With `k < 0` the pre-peak part rises towards the
/// peak; after the peak the net decay rate is `k + lambda`.
pub fn pulse(t: f64, amplitude: f64, rise: f64, decay: f64, t_peak: f64) -> f64 {
    let dt = t - t_peak;
    let envelope = (-rise * dt).exp();
    if dt > 0.0 {
        amplitude * envelope * (-decay * dt).exp()
    } else {
        amplitude * envelope
    }
}

/// Partial derivatives of `pulse` with respect to `(amplitude, rise, decay)`
pub fn pulse_gradient(t: f64, amplitude: f64, rise: f64, decay: f64, t_peak: f64) -> [f64; 3] {
    let dt = t - t_peak;
    let shape = pulse(t, 1.0, rise, decay, t_peak);
    let value = amplitude * shape;
    let d_decay = if dt > 0.0 { -dt * value } else { 0.0 };
    [shape, -dt * value, d_decay]
}

/// Double-pulse model parameters
///
/// Two pulses sharing a fixed `t_peak`. Only the first six fields are
/// fitted; no sign constraint is placed on any of them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelParameters {
    pub a1: f64,
    pub a2: f64,
    pub k1: f64,
    pub k2: f64,
    pub lambda1: f64,
    pub lambda2: f64,
    pub t_peak: f64,
}

impl ModelParameters {
    /// Heuristic starting point for a pulse peaking at `peak_value`
    pub fn initial_guess(peak_value: f64, t_peak: f64) -> Self {
        let root = peak_value.sqrt();
        Self {
            a1: root,
            a2: root / 2.0,
            k1: INITIAL_RISE_RATE,
            k2: INITIAL_RISE_RATE,
            lambda1: INITIAL_DECAY_RATE,
            lambda2: INITIAL_DECAY_RATE,
            t_peak,
        }
    }

    /// Build from the free parameters `(A1, A2, k1, k2, lambda1, lambda2)`
    pub fn from_free(free: [f64; MODEL_FREE_PARAMETERS], t_peak: f64) -> Self {
        let [a1, a2, k1, k2, lambda1, lambda2] = free;
        Self {
            a1,
            a2,
            k1,
            k2,
            lambda1,
            lambda2,
            t_peak,
        }
    }

    pub fn free(&self) -> [f64; MODEL_FREE_PARAMETERS] {
        [
            self.a1,
            self.a2,
            self.k1,
            self.k2,
            self.lambda1,
            self.lambda2,
        ]
    }

    pub fn is_finite(&self) -> bool {
        self.free().iter().all(|p| p.is_finite()) && self.t_peak.is_finite()
    }

    /// Model value at `t`
    pub fn evaluate(&self, t: f64) -> f64 {
        pulse(t, self.a1, self.k1, self.lambda1, self.t_peak)
            + pulse(t, self.a2, self.k2, self.lambda2, self.t_peak)
    }

    /// Partial derivatives at `t` in free-parameter order
    pub fn gradient(&self, t: f64) -> [f64; MODEL_FREE_PARAMETERS] {
        let [da1, dk1, dl1] = pulse_gradient(t, self.a1, self.k1, self.lambda1, self.t_peak);
        let [da2, dk2, dl2] = pulse_gradient(t, self.a2, self.k2, self.lambda2, self.t_peak);
        [da1, da2, dk1, dk2, dl1, dl2]
    }

    /// Model evaluated over a time axis
    pub fn curve(&self, time: &[f64]) -> Vec<f64> {
        time.iter().map(|&t| self.evaluate(t)).collect()
    }

    /// Model value at the peak, `A1 + A2`
    pub fn peak_amplitude(&self) -> f64 {
        self.a1 + self.a2
    }
}
