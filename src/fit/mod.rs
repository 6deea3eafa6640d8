pub mod fitter;
pub mod model;
pub mod solver;

pub use fitter::{FittedCurve, ModelFitter};
pub use model::ModelParameters;
pub use solver::{CurveSolver, FitFailure, FitOutcome, LevenbergMarquardtSolver};
