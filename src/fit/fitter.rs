use crate::config::ApproximatorConfig;

use super::model::ModelParameters;
use super::solver::{CurveSolver, FitFailure, FitOutcome, LevenbergMarquardtSolver};

/// Curve produced by the fitter
#[derive(Debug, Clone)]
pub struct FittedCurve {
    /// Model evaluated over the time axis, or the input data on fallback
    pub values: Vec<f64>,
    pub outcome: FitOutcome,
}

impl FittedCurve {
    /// Whether `values` come from the fitted model
    pub fn is_model(&self) -> bool {
        self.outcome.is_success()
    }
}

/// Model fitter
///
/// Fits the double-pulse model to a preprocessed trace with `t_peak` held
/// fixed. A failed fit is not an error: `fit` hands the input data back.
#[derive(Debug, Clone)]
pub struct ModelFitter<V = LevenbergMarquardtSolver> {
    solver: V,
}

impl ModelFitter {
    pub fn new(config: &ApproximatorConfig) -> Self {
        Self::with_solver(LevenbergMarquardtSolver::new(config.max_evaluations))
    }
}

impl<V: CurveSolver> ModelFitter<V> {
    /// Create a fitter backed by a custom solver
    pub fn with_solver(solver: V) -> Self {
        Self { solver }
    }

    /// Run the solver from the heuristic initial guess
    pub fn fit_parameters(
        &self,
        time: &[f64],
        current: &[f64],
        peak_value: f64,
        t_peak: f64,
    ) -> FitOutcome {
        let initial = ModelParameters::initial_guess(peak_value, t_peak);
        self.solver.solve(time, current, initial)
    }

    /// Fit and evaluate the model over `time`
    ///
    /// Falls back to `current` when the solver fails or the fitted curve is
    /// not finite everywhere.
    pub fn fit(&self, time: &[f64], current: &[f64], peak_value: f64, t_peak: f64) -> FittedCurve {
        let outcome = match self.fit_parameters(time, current, peak_value, t_peak) {
            FitOutcome::Success(params) => {
                let values = params.curve(time);
                if values.iter().all(|v| v.is_finite()) {
                    log::debug!(
                        "Fitted A1={:.4} A2={:.4} k1={:.4} k2={:.4} l1={:.4} l2={:.4}",
                        params.a1,
                        params.a2,
                        params.k1,
                        params.k2,
                        params.lambda1,
                        params.lambda2
                    );
                    return FittedCurve {
                        values,
                        outcome: FitOutcome::Success(params),
                    };
                }
                FitOutcome::Failure(FitFailure::NonFiniteResult)
            }
            failure => failure,
        };

        if let FitOutcome::Failure(reason) = &outcome {
            log::warn!("Fit failed ({}), using preprocessed trace", reason);
        }
        FittedCurve {
            values: current.to_vec(),
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    struct Failing;

    impl CurveSolver for Failing {
        fn solve(&self, _time: &[f64], _data: &[f64], _initial: ModelParameters) -> FitOutcome {
            FitOutcome::Failure(FitFailure::NonConvergence("forced".to_string()))
        }
    }

    struct Fixed(ModelParameters);

    impl CurveSolver for Fixed {
        fn solve(&self, _time: &[f64], _data: &[f64], _initial: ModelParameters) -> FitOutcome {
            FitOutcome::Success(self.0)
        }
    }

    fn axis() -> Vec<f64> {
        (0..80).map(|i| 0.5 + i as f64 * 0.025).collect()
    }

    #[test]
    fn test_fit_reproduces_model_data() {
        let time = axis();
        let data = ModelParameters::initial_guess(9.0, 1.0).curve(&time);

        let fitted = ModelFitter::new(&ApproximatorConfig::default()).fit(&time, &data, 9.0, 1.0);
        assert!(fitted.is_model());
        assert_eq!(fitted.values.len(), time.len());
        for (f, d) in fitted.values.iter().zip(&data) {
            assert_abs_diff_eq!(*f, *d, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_failure_falls_back_to_input() {
        let time = axis();
        let data: Vec<f64> = time.iter().map(|t| (-t).exp()).collect();

        let fitted = ModelFitter::with_solver(Failing).fit(&time, &data, 1.0, 0.5);
        assert!(!fitted.is_model());
        assert_eq!(fitted.values, data);
        assert!(matches!(
            fitted.outcome,
            FitOutcome::Failure(FitFailure::NonConvergence(_))
        ));
    }

    #[test]
    fn test_non_finite_curve_falls_back() {
        let time = axis();
        let data = vec![1.0; time.len()];
        let exploding = ModelParameters {
            k1: -1e6,
            ..ModelParameters::initial_guess(1.0, 0.5)
        };

        let fitted = ModelFitter::with_solver(Fixed(exploding)).fit(&time, &data, 1.0, 0.5);
        assert_eq!(fitted.values, data);
        assert_eq!(
            fitted.outcome,
            FitOutcome::Failure(FitFailure::NonFiniteResult)
        );
    }

    #[test]
    fn test_too_few_samples_falls_back() {
        let time = [0.0, 1.0, 2.0, 3.0];
        let data = [1.0, 4.0, 2.0, 1.0];
        let fitted =
            ModelFitter::new(&ApproximatorConfig::default()).fit(&time, &data, 4.0, 1.0);
        assert_eq!(fitted.values, data.to_vec());
        assert!(matches!(
            fitted.outcome,
            FitOutcome::Failure(FitFailure::InsufficientData { .. })
        ));
    }
}
