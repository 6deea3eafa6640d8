mod noise;
mod signal;

pub use noise::{AdditiveNoiseConfig, ImpulseNoiseConfig, NoiseConfig, apply_noise, clip};
pub use signal::{PulseShape, generate_pulse, uniform_time_axis};
