//! Event window location
//!
//! Finds the rising and decaying edges of a pulse from its first differences.
//! The threshold is a fixed fraction of the largest first difference on the
//! relevant side of the peak, so no amplitude calibration is needed. Both
//! functions always return an index: when no difference crosses the
//! threshold they fall back to a fixed fraction of the available span.

use crate::constants::{END_FALLBACK_FRACTION, START_FALLBACK_FRACTION};
use crate::error::{PulseError, Result};

use super::math::{first_differences, max_value};

/// Default fraction of the peak first difference marking an edge
pub const DEFAULT_THRESHOLD_FACTOR: f64 = 0.1;

/// Default padding added past the detected decay edge
pub const DEFAULT_EXTRA_POINTS: usize = 20;

fn check_peak(trace: &[f64], peak_index: usize) -> Result<()> {
    if peak_index >= trace.len() {
        return Err(PulseError::PeakOutOfRange {
            index: peak_index,
            len: trace.len(),
        });
    }
    Ok(())
}

/// Find the first sample of the rising edge before `peak_index`
///
/// Returns the first index whose forward difference exceeds
/// `threshold_factor * max(differences)`, or `0.9 * peak_index` (rounded
/// down) when none does. Returns 0 when there are no pre-peak differences.
///
/// # Arguments
/// * `trace` - Current samples
/// * `peak_index` - Index of the pulse maximum
/// * `threshold_factor` - Onset threshold relative to the steepest rise
pub fn find_event_start(trace: &[f64], peak_index: usize, threshold_factor: f64) -> Result<usize> {
    check_peak(trace, peak_index)?;

    let derivative = first_differences(&trace[..peak_index]);
    let Some(max_derivative) = max_value(&derivative) else {
        return Ok(0);
    };

    let threshold = threshold_factor * max_derivative;
    let start = derivative
        .iter()
        .position(|&d| d > threshold)
        .unwrap_or_else(|| (peak_index as f64 * START_FALLBACK_FRACTION) as usize);

    Ok(start)
}

/// Find the end of the decaying edge after `peak_index`
///
/// Returns `peak_index` plus the offset of the first forward difference
/// below `-threshold_factor * max(differences)`, falling back to 10% of the
/// post-peak length. `extra_points` of padding are added and the result is
/// capped at the last valid index. Returns the last index when there are no
/// post-peak differences.
///
/// # Arguments
/// * `trace` - Current samples
/// * `peak_index` - Index of the pulse maximum
/// * `threshold_factor` - Offset threshold relative to the largest difference
/// * `extra_points` - Padding appended after the detected edge
pub fn find_event_end(
    trace: &[f64],
    peak_index: usize,
    threshold_factor: f64,
    extra_points: usize,
) -> Result<usize> {
    check_peak(trace, peak_index)?;
    let last = trace.len() - 1;

    let derivative = first_differences(&trace[peak_index..]);
    let Some(max_derivative) = max_value(&derivative) else {
        return Ok(last);
    };

    let threshold = threshold_factor * max_derivative;
    let end = match derivative.iter().position(|&d| d < -threshold) {
        Some(offset) => peak_index + offset,
        None => {
            let remaining = (trace.len() - peak_index) as f64;
            let fallback = (peak_index as f64 + remaining * END_FALLBACK_FRACTION) as usize;
            fallback.min(last)
        }
    };

    Ok((end + extra_points).min(last))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_on_rising_edge() {
        let trace = [0.0, 0.0, 0.0, 1.0, 3.0, 7.0, 10.0];
        // differences 0,0,1,2,4 (peak excluded), threshold 0.4
        assert_eq!(find_event_start(&trace, 6, 0.1).unwrap(), 2);
    }

    #[test]
    fn test_start_peak_at_zero_or_one() {
        let trace = [10.0, 5.0, 1.0];
        assert_eq!(find_event_start(&trace, 0, 0.1).unwrap(), 0);

        let trace = [1.0, 10.0, 5.0];
        assert_eq!(find_event_start(&trace, 1, 0.1).unwrap(), 0);
    }

    #[test]
    fn test_start_fallback_on_flat_baseline() {
        let trace = [5.0, 5.0, 5.0, 5.0, 10.0];
        // No difference exceeds 0.1 * 0, fall back to floor(0.9 * 4)
        assert_eq!(find_event_start(&trace, 4, 0.1).unwrap(), 3);

        let trace = [9.0, 8.0, 7.0, 6.0, 10.0];
        assert_eq!(find_event_start(&trace, 4, 0.1).unwrap(), 3);
    }

    #[test]
    fn test_start_peak_out_of_range() {
        let trace = [1.0, 2.0];
        assert!(matches!(
            find_event_start(&trace, 2, 0.1),
            Err(PulseError::PeakOutOfRange { index: 2, len: 2 })
        ));
        assert!(find_event_start(&[], 0, 0.1).is_err());
    }

    #[test]
    fn test_end_on_decay() {
        let trace = [0.0, 5.0, 10.0, 8.0, 6.0, 4.0, 2.0, 1.0, 0.5, 0.2];
        assert_eq!(find_event_end(&trace, 2, 0.1, 0).unwrap(), 2);
        assert_eq!(find_event_end(&trace, 2, 0.1, 3).unwrap(), 5);
        assert_eq!(find_event_end(&trace, 2, 0.1, 20).unwrap(), 9);
    }

    #[test]
    fn test_end_peak_at_last_index() {
        let trace = [1.0, 2.0, 3.0, 10.0];
        assert_eq!(find_event_end(&trace, 3, 0.1, DEFAULT_EXTRA_POINTS).unwrap(), 3);
    }

    #[test]
    fn test_end_fallback_on_flat_tail() {
        let trace = [0.0, 10.0, 10.0, 10.0, 10.0];
        // floor(1 + 4 * 0.1) = 1, plus two points of padding
        assert_eq!(find_event_end(&trace, 1, 0.1, 2).unwrap(), 3);
    }
}
