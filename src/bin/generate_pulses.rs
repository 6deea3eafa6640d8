use anyhow::{Context, Result};
use clap::Parser;
use pulse_recover::simulation::{
    NoiseConfig, PulseShape, apply_noise, clip, generate_pulse, uniform_time_axis,
};
use pulse_recover::waveform::Waveform;
use rand::{RngExt, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "generate_pulses")]
#[command(about = "Generate synthetic clipped discharge recordings and a peak manifest")]
struct Args {
    /// Output directory
    #[arg(short, long, default_value = "data/synthetic")]
    output_dir: PathBuf,

    /// Number of recordings
    #[arg(short = 'n', long, default_value_t = 20)]
    count: usize,

    /// Samples per recording
    #[arg(long, default_value_t = 2000)]
    samples: usize,

    /// Sample spacing
    #[arg(long, default_value_t = 0.05)]
    dt: f64,

    /// Smallest true pulse amplitude
    #[arg(long, default_value_t = 5.0)]
    amplitude_min: f64,

    /// Largest true pulse amplitude
    #[arg(long, default_value_t = 20.0)]
    amplitude_max: f64,

    /// Saturation level as a fraction of the smallest amplitude
    #[arg(long, default_value_t = 0.9)]
    clip_fraction: f64,

    /// Gaussian noise standard deviation
    #[arg(long, default_value_t = 0.02)]
    noise: f64,

    /// Probability of a single-sample spike per sample
    #[arg(long, default_value_t = 0.0)]
    impulse_probability: f64,

    /// Spike amplitude (random sign)
    #[arg(long, default_value_t = 0.0)]
    impulse_amplitude: f64,

    /// Constant baseline offset added to the current
    #[arg(long, default_value_t = 0.0)]
    baseline: f64,

    /// Constant applied voltage stored in the voltage row
    #[arg(long, default_value_t = 1.0)]
    voltage: f64,

    /// Base seed for reproducibility
    #[arg(short, long)]
    seed: Option<u64>,

    /// Output filename prefix
    #[arg(long, default_value = "pulse")]
    prefix: String,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Margin kept between a pulse peak and either end of the recording
const EDGE_MARGIN: usize = 200;

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    if args.samples <= 2 * EDGE_MARGIN {
        anyhow::bail!("need more than {} samples per recording", 2 * EDGE_MARGIN);
    }
    if args.amplitude_min <= 0.0 || args.amplitude_max < args.amplitude_min {
        anyhow::bail!("invalid amplitude range");
    }

    fs::create_dir_all(&args.output_dir).context("Failed to create output directory")?;

    let base_seed = args.seed.unwrap_or(0);
    let mut rng = ChaCha8Rng::seed_from_u64(base_seed);
    let time = uniform_time_axis(args.samples, args.dt);
    let clip_level = args.baseline + args.clip_fraction * args.amplitude_min;

    let mut manifest = String::from("filename, peak_index, plateau_length\n");
    for index in 0..args.count {
        let peak_index = rng.random_range(EDGE_MARGIN..args.samples - EDGE_MARGIN);
        let amplitude = if args.amplitude_max > args.amplitude_min {
            rng.random_range(args.amplitude_min..args.amplitude_max)
        } else {
            args.amplitude_min
        };

        let shape =
            PulseShape::discharge(amplitude, time[peak_index]).with_baseline(args.baseline);
        let mut current = generate_pulse(&shape, &time);
        let mut noise = NoiseConfig::default()
            .with_seed(base_seed.wrapping_add(index as u64 + 1))
            .with_gaussian(args.noise);
        if args.impulse_probability > 0.0 {
            noise = noise.with_impulse(args.impulse_probability, args.impulse_amplitude);
        }
        apply_noise(&mut current, &noise);
        let plateau_length = clip(&mut current, clip_level);

        let waveform = Waveform::new(time.clone(), vec![args.voltage; args.samples], current)?;
        let filename = format!("{}_{:03}.npz", args.prefix, index);
        waveform
            .save_npz(&args.output_dir.join(&filename))
            .with_context(|| format!("Failed to write {}", filename))?;

        log::info!(
            "{}: amplitude {:.3} at {}, {} clipped samples",
            filename,
            amplitude,
            peak_index,
            plateau_length
        );
        writeln!(manifest, "{}, {}, {}", filename, peak_index, plateau_length)?;
        eprint!("\rGenerating: {}/{}", index + 1, args.count);
    }
    eprintln!();

    let manifest_path = args.output_dir.join("peaks.txt");
    fs::write(&manifest_path, manifest).context("Failed to write manifest")?;
    eprintln!(
        "Generated {} recordings in {}, manifest: {}",
        args.count,
        args.output_dir.display(),
        manifest_path.display()
    );
    Ok(())
}
