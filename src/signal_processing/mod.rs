pub mod detrend;
pub mod event_window;
pub mod math;
pub mod plateau;
pub mod preprocessor;
pub mod savitzky_golay;

pub use event_window::{find_event_end, find_event_start};
pub use preprocessor::{PreprocessedPulse, SignalPreprocessor};
pub use savitzky_golay::{SavitzkyGolay, SavitzkyGolaySmoother, Smoother};
