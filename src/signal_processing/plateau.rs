//! Saturation plateau flattening
//!
//! A clipped pulse shows up as several consecutive samples pinned at the
//! peak value. The run containing the peak is replaced with a shallow tent
//! (at most 1% above the peak) so the fit sees a single maximum.

use std::ops::Range;

use crate::constants::{PLATEAU_ABS_TOLERANCE, PLATEAU_EXCESS_FRACTION, PLATEAU_REL_TOLERANCE};

/// Absolute tolerance for plateau membership around `peak_value`
pub fn plateau_tolerance(peak_value: f64) -> f64 {
    PLATEAU_ABS_TOLERANCE.max(PLATEAU_REL_TOLERANCE * peak_value.abs())
}

/// Contiguous run of near-peak samples containing `peak_index`
///
/// If the peak sample itself is not within tolerance (only possible with
/// non-finite data) the run is the peak alone.
pub fn plateau_run(values: &[f64], peak_index: usize, peak_value: f64) -> Range<usize> {
    let tolerance = plateau_tolerance(peak_value);
    let near = |v: f64| (v - peak_value).abs() <= tolerance;

    if values.get(peak_index).is_none_or(|&v| !near(v)) {
        return peak_index..peak_index + 1;
    }

    let mut start = peak_index;
    while start > 0 && near(values[start - 1]) {
        start -= 1;
    }
    let mut end = peak_index + 1;
    while end < values.len() && near(values[end]) {
        end += 1;
    }

    start..end
}

/// Unit tent peaking at `relpos = 0.5`
fn triangle(relpos: f64) -> f64 {
    1.0 - 2.0 * (relpos - 0.5).abs()
}

/// Replace a plateau run with a tent rising to `1.01 * peak_value`
///
/// Odd runs are symmetric with both ends at `peak_value`. Even runs are
/// laid out as if one more sample followed, which keeps the profile strictly
/// unimodal instead of leaving two equal samples at the apex.
/// Runs of one sample are left untouched.
pub fn flatten_plateau(values: &mut [f64], run: Range<usize>, peak_value: f64) {
    let n = run.len();
    if n <= 1 {
        return;
    }

    let span = if n % 2 == 1 { n - 1 } else { n } as f64;
    let excess = PLATEAU_EXCESS_FRACTION * peak_value;

    for (i, idx) in run.enumerate() {
        let relpos = i as f64 / span;
        values[idx] = peak_value + triangle(relpos) * excess;
    }
}
