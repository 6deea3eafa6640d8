//! Savitzky-Golay local polynomial smoothing
//!
//! Fits a polynomial of degree `p` to every window of `2m+1` samples by
//! least squares and replaces the centre sample with the fitted value.
//! Near the edges, where a centred window does not fit, the polynomial
//! fitted to the first (or last) full window is evaluated at the edge
//! positions instead, so the output has the same length as the input.

use nalgebra::{DMatrix, DVector};

use crate::error::{PulseError, Result};

/// Local polynomial smoothing capability
///
/// Implementations return a sequence of the same length as `data`.
pub trait Smoother {
    fn smooth(&self, data: &[f64], window_length: usize, poly_order: usize) -> Vec<f64>;
}

/// Savitzky-Golay filter with a precomputed least-squares projection
#[derive(Debug, Clone)]
pub struct SavitzkyGolay {
    window_length: usize,
    /// Maps the samples of one window to polynomial coefficients in
    /// window-centred coordinates, shape `(poly_order + 1) x window_length`
    projection: DMatrix<f64>,
}

impl SavitzkyGolay {
    /// Create a filter
    ///
    /// # Arguments
    /// * `window_length` - Odd number of samples per window
    /// * `poly_order` - Polynomial degree, must be below `window_length`
    pub fn new(window_length: usize, poly_order: usize) -> Result<Self> {
        if window_length % 2 == 0 {
            return Err(PulseError::Config(format!(
                "Savitzky-Golay window must be odd, got {}",
                window_length
            )));
        }
        if poly_order >= window_length {
            return Err(PulseError::Config(format!(
                "polynomial order {} must be below window length {}",
                poly_order, window_length
            )));
        }

        let half = (window_length / 2) as f64;
        let terms = poly_order + 1;
        let vandermonde =
            DMatrix::from_fn(window_length, terms, |r, c| (r as f64 - half).powi(c as i32));

        let normal = vandermonde.transpose() * &vandermonde;
        let inverse = normal.try_inverse().ok_or_else(|| {
            PulseError::Config("singular Savitzky-Golay normal matrix".to_string())
        })?;

        Ok(Self {
            window_length,
            projection: inverse * vandermonde.transpose(),
        })
    }

    /// Convolution weights producing the smoothed centre sample
    pub fn centre_weights(&self) -> Vec<f64> {
        self.projection.row(0).iter().copied().collect()
    }

    /// Fit the window polynomial to `window` and evaluate it at centred positions
    fn evaluate_fit(&self, window: &[f64], positions: impl Iterator<Item = f64>) -> Vec<f64> {
        let coeffs = &self.projection * DVector::from_column_slice(window);
        positions
            .map(|x| coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c))
            .collect()
    }

    /// Smooth a sequence
    ///
    /// Sequences shorter than the window are returned unchanged.
    pub fn apply(&self, data: &[f64]) -> Vec<f64> {
        let n = data.len();
        let wl = self.window_length;
        if n < wl {
            return data.to_vec();
        }

        let m = wl / 2;
        let weights = self.centre_weights();
        let mut output = Vec::with_capacity(n);

        let half = m as f64;
        output.extend(self.evaluate_fit(&data[..wl], (0..m).map(|i| i as f64 - half)));

        for window in data.windows(wl) {
            output.push(window.iter().zip(&weights).map(|(x, w)| x * w).sum());
        }

        output.extend(
            self.evaluate_fit(&data[n - wl..], (wl - m..wl).map(|i| i as f64 - half)),
        );

        output
    }
}

/// `Smoother` backed by a freshly built Savitzky-Golay filter per call
#[derive(Debug, Clone, Copy, Default)]
pub struct SavitzkyGolaySmoother;

impl Smoother for SavitzkyGolaySmoother {
    fn smooth(&self, data: &[f64], window_length: usize, poly_order: usize) -> Vec<f64> {
        match SavitzkyGolay::new(window_length, poly_order) {
            Ok(filter) => filter.apply(data),
            Err(e) => {
                log::debug!("Smoothing skipped: {}", e);
                data.to_vec()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_classic_five_point_quadratic_weights() {
        let sg = SavitzkyGolay::new(5, 2).unwrap();
        let expected = [-3.0, 12.0, 17.0, 12.0, -3.0];
        for (w, e) in sg.centre_weights().iter().zip(expected) {
            assert_abs_diff_eq!(*w, e / 35.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_preserves_quadratic_including_edges() {
        let data: Vec<f64> = (0..20)
            .map(|i| {
                let x = i as f64;
                3.0 - 0.5 * x + 0.1 * x * x
            })
            .collect();
        let sg = SavitzkyGolay::new(7, 2).unwrap();
        let smoothed = sg.apply(&data);

        assert_eq!(smoothed.len(), data.len());
        for (s, d) in smoothed.iter().zip(&data) {
            assert_abs_diff_eq!(*s, *d, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_attenuates_alternating_noise() {
        let data: Vec<f64> = (0..30)
            .map(|i| 5.0 + if i % 2 == 0 { 1.0 } else { -1.0 })
            .collect();
        let smoothed = SavitzkyGolay::new(9, 2).unwrap().apply(&data);

        for &s in &smoothed[4..26] {
            assert!((s - 5.0).abs() < 0.5, "interior sample {} not smoothed", s);
        }
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(SavitzkyGolay::new(4, 2).is_err());
        assert!(SavitzkyGolay::new(3, 3).is_err());
        assert!(SavitzkyGolay::new(1, 0).is_ok());
    }

    #[test]
    fn test_short_input_unchanged() {
        let data = [1.0, 2.0, 3.0];
        assert_eq!(SavitzkyGolay::new(5, 2).unwrap().apply(&data), data.to_vec());
        assert_eq!(SavitzkyGolaySmoother.smooth(&[1.0, 4.0], 4, 2), vec![1.0, 4.0]);
    }
}
