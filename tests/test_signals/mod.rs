use pulse_recover::simulation::{
    NoiseConfig, PulseShape, apply_noise, clip, generate_pulse, uniform_time_axis,
};

pub const WINDOW_SAMPLES: usize = 180;
pub const PRE_PEAK_SAMPLES: usize = 30;
pub const SAMPLE_SPACING: f64 = 0.01;

/// Discharge pulse window peaking at `PRE_PEAK_SAMPLES`, noisy and clipped
/// at `clip_fraction` of `amplitude`
pub fn clipped_pulse(
    amplitude: f64,
    clip_fraction: f64,
    noise: f64,
    seed: u64,
) -> (Vec<f64>, Vec<f64>) {
    let time = uniform_time_axis(WINDOW_SAMPLES, SAMPLE_SPACING);
    let shape = PulseShape::discharge(amplitude, time[PRE_PEAK_SAMPLES]);
    let mut current = generate_pulse(&shape, &time);
    apply_noise(
        &mut current,
        &NoiseConfig::default().with_seed(seed).with_gaussian(noise),
    );
    clip(&mut current, clip_fraction * amplitude);
    (time, current)
}

/// Same pulse preceded by `lead` flat baseline samples
pub fn pulse_with_baseline(lead: usize) -> (Vec<f64>, Vec<f64>) {
    let (time, current) = clipped_pulse(10.0, 0.95, 0.0, 0);
    let time = uniform_time_axis(time.len() + lead, SAMPLE_SPACING);
    let mut padded = vec![0.0; lead];
    padded.extend(current);
    (time, padded)
}
