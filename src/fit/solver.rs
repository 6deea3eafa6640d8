use levenberg_marquardt::{LeastSquaresProblem, LevenbergMarquardt};
use nalgebra::{DVector, Dyn, OMatrix, Owned, U6, Vector6};
use thiserror::Error;

use crate::constants::MODEL_FREE_PARAMETERS;

use super::model::ModelParameters;

/// Residuals and derivatives beyond this magnitude are clamped so an
/// overflowing trial step is rejected instead of aborting the fit.
const RESIDUAL_LIMIT: f64 = 1e100;

/// Why a fit did not produce usable parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitFailure {
    #[error("solver did not converge: {0}")]
    NonConvergence(String),

    #[error("fit produced non-finite values")]
    NonFiniteResult,

    #[error("need at least {needed} samples to fit, have {available}")]
    InsufficientData { needed: usize, available: usize },
}

/// Result of a nonlinear least-squares fit
#[derive(Debug, Clone, PartialEq)]
pub enum FitOutcome {
    Success(ModelParameters),
    Failure(FitFailure),
}

impl FitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn parameters(&self) -> Option<&ModelParameters> {
        match self {
            Self::Success(params) => Some(params),
            Self::Failure(_) => None,
        }
    }
}

/// Nonlinear least-squares capability for the double-pulse model
///
/// Implementations fit the six free parameters of `initial` to `data`
/// sampled at `time`, keeping `initial.t_peak` fixed.
pub trait CurveSolver {
    fn solve(&self, time: &[f64], data: &[f64], initial: ModelParameters) -> FitOutcome;
}

struct DoublePulseProblem<'a> {
    time: &'a [f64],
    data: &'a [f64],
    params: Vector6<f64>,
    t_peak: f64,
}

impl DoublePulseProblem<'_> {
    fn model(&self) -> ModelParameters {
        let free: [f64; MODEL_FREE_PARAMETERS] = self.params.into();
        ModelParameters::from_free(free, self.t_peak)
    }
}

fn clamp_finite(v: f64) -> f64 {
    if v.is_nan() {
        RESIDUAL_LIMIT
    } else {
        v.clamp(-RESIDUAL_LIMIT, RESIDUAL_LIMIT)
    }
}

impl LeastSquaresProblem<f64, Dyn, U6> for DoublePulseProblem<'_> {
    type ParameterStorage = Owned<f64, U6>;
    type ResidualStorage = Owned<f64, Dyn>;
    type JacobianStorage = Owned<f64, Dyn, U6>;

    fn set_params(&mut self, p: &Vector6<f64>) {
        self.params.copy_from(p);
    }

    fn params(&self) -> Vector6<f64> {
        self.params
    }

    fn residuals(&self) -> Option<DVector<f64>> {
        let model = self.model();
        Some(DVector::from_iterator(
            self.time.len(),
            self.time
                .iter()
                .zip(self.data)
                .map(|(&t, &y)| clamp_finite(model.evaluate(t) - y)),
        ))
    }

    fn jacobian(&self) -> Option<OMatrix<f64, Dyn, U6>> {
        let model = self.model();
        let mut jac = OMatrix::<f64, Dyn, U6>::zeros_generic(Dyn(self.time.len()), U6);
        for (row, &t) in self.time.iter().enumerate() {
            for (col, d) in model.gradient(t).into_iter().enumerate() {
                jac[(row, col)] = clamp_finite(d);
            }
        }
        Some(jac)
    }
}

/// Levenberg-Marquardt solver with an evaluation budget
#[derive(Debug, Clone, Copy)]
pub struct LevenbergMarquardtSolver {
    max_evaluations: usize,
}

impl LevenbergMarquardtSolver {
    pub fn new(max_evaluations: usize) -> Self {
        Self { max_evaluations }
    }
}

impl CurveSolver for LevenbergMarquardtSolver {
    fn solve(&self, time: &[f64], data: &[f64], initial: ModelParameters) -> FitOutcome {
        let available = time.len().min(data.len());
        if available < MODEL_FREE_PARAMETERS {
            return FitOutcome::Failure(FitFailure::InsufficientData {
                needed: MODEL_FREE_PARAMETERS,
                available,
            });
        }
        if !initial.is_finite() {
            return FitOutcome::Failure(FitFailure::NonFiniteResult);
        }

        let problem = DoublePulseProblem {
            time: &time[..available],
            data: &data[..available],
            params: Vector6::from(initial.free()),
            t_peak: initial.t_peak,
        };

        // Patience is counted in units of (parameters + 1) evaluations
        let patience = (self.max_evaluations / (MODEL_FREE_PARAMETERS + 1)).max(1);
        let (problem, report) = LevenbergMarquardt::new()
            .with_patience(patience)
            .minimize(problem);

        log::debug!(
            "Levenberg-Marquardt finished after {} evaluations: {:?}, objective {:.6e}",
            report.number_of_evaluations,
            report.termination,
            report.objective_function
        );

        if !report.termination.was_successful() {
            return FitOutcome::Failure(FitFailure::NonConvergence(format!(
                "{:?}",
                report.termination
            )));
        }

        let fitted = problem.model();
        if !fitted.is_finite() || !report.objective_function.is_finite() {
            return FitOutcome::Failure(FitFailure::NonFiniteResult);
        }
        FitOutcome::Success(fitted)
    }
}
