//! Tail detrend-and-smooth
//!
//! The decay after the peak is close to exponential, so a straight line is
//! fitted to the log of the tail and exponentiated back into a multiplicative
//! envelope. Only the residual around that envelope is smoothed, which keeps
//! the decay shape intact while removing high-frequency noise.

use crate::constants::{LOG_FLOOR, MIN_SMOOTHING_WINDOW, MIN_TAIL_SAMPLES};

use super::math::fit_line;
use super::savitzky_golay::Smoother;

/// Exponential envelope fitted to `tail` in log space
///
/// Samples are floored at `LOG_FLOOR` before the logarithm.
pub fn exponential_trend(tail: &[f64]) -> Vec<f64> {
    let log_tail: Vec<f64> = tail.iter().map(|&v| v.max(LOG_FLOOR).ln()).collect();
    let (slope, intercept) = fit_line(&log_tail);
    (0..tail.len())
        .map(|i| (intercept + slope * i as f64).exp())
        .collect()
}

/// Odd smoothing window that fits in `len` samples, or `None` if too small
pub fn effective_window(window_length: usize, len: usize) -> Option<usize> {
    let mut window = window_length.min(len);
    if window % 2 == 0 {
        window = window.saturating_sub(1);
    }
    (window > MIN_SMOOTHING_WINDOW).then_some(window)
}

/// Detrend `tail` against its exponential envelope, smooth the residual and
/// restore the envelope in place
///
/// Tails of `MIN_TAIL_SAMPLES` or fewer, and tails whose effective window
/// is too small, are left unchanged. Returns whether the tail was modified.
pub fn detrend_and_smooth(
    tail: &mut [f64],
    window_length: usize,
    poly_order: usize,
    smoother: &dyn Smoother,
) -> bool {
    if tail.len() <= MIN_TAIL_SAMPLES {
        return false;
    }

    let trend = exponential_trend(tail);
    let detrended: Vec<f64> = tail.iter().zip(&trend).map(|(v, t)| v - t).collect();

    let Some(window) = effective_window(window_length, detrended.len()) else {
        return false;
    };

    let smoothed = smoother.smooth(&detrended, window, poly_order);
    for ((sample, s), t) in tail.iter_mut().zip(&smoothed).zip(&trend) {
        *sample = s + t;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal_processing::savitzky_golay::SavitzkyGolaySmoother;
    use approx::assert_relative_eq;

    fn decay_with_rate(n: usize, rate: f64) -> Vec<f64> {
        (0..n).map(|i| 8.0 * (-rate * i as f64).exp()).collect()
    }

    fn decay(n: usize) -> Vec<f64> {
        decay_with_rate(n, 0.2)
    }

    #[test]
    fn test_trend_of_pure_exponential() {
        let tail = decay(30);
        for (t, v) in exponential_trend(&tail).iter().zip(&tail) {
            assert_relative_eq!(*t, *v, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_pure_exponential_survives_smoothing() {
        let original = decay(40);
        let mut tail = original.clone();
        assert!(detrend_and_smooth(&mut tail, 15, 2, &SavitzkyGolaySmoother));
        for (a, b) in tail.iter().zip(&original) {
            assert_relative_eq!(*a, *b, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_noise_reduced_around_envelope() {
        let clean = decay_with_rate(60, 0.05);
        let noisy: Vec<f64> = clean
            .iter()
            .enumerate()
            .map(|(i, v)| v + if i % 2 == 0 { 0.05 } else { -0.05 })
            .collect();

        let mut tail = noisy.clone();
        assert!(detrend_and_smooth(&mut tail, 15, 2, &SavitzkyGolaySmoother));

        let error = |a: &[f64]| -> f64 {
            a[7..53]
                .iter()
                .zip(&clean[7..53])
                .map(|(x, c)| (x - c).powi(2))
                .sum::<f64>()
        };
        assert!(error(&tail) < 0.25 * error(&noisy));
    }

    #[test]
    fn test_short_tail_untouched() {
        let mut tail = vec![5.0, 4.0, 3.5, 2.0, 1.0];
        assert!(!detrend_and_smooth(&mut tail, 15, 2, &SavitzkyGolaySmoother));
        assert_eq!(tail, vec![5.0, 4.0, 3.5, 2.0, 1.0]);
    }

    #[test]
    fn test_effective_window() {
        assert_eq!(effective_window(20, 100), Some(19));
        assert_eq!(effective_window(15, 100), Some(15));
        assert_eq!(effective_window(15, 6), Some(5));
        assert_eq!(effective_window(4, 10), Some(3));
        assert_eq!(effective_window(2, 10), None);
        assert_eq!(effective_window(3, 2), None);

        let mut tail = decay(10);
        let before = tail.clone();
        assert!(!detrend_and_smooth(&mut tail, 2, 2, &SavitzkyGolaySmoother));
        assert_eq!(tail, before);
    }
}
