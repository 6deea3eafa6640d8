//! Batch recovery over a peak manifest
//!
//! Each manifest entry is loaded, windowed around its peak, approximated and
//! classified as restored or not. Entries are independent, so they are
//! processed in parallel and collected back in manifest order.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use rolling_stats::Stats;
use serde::Serialize;

use crate::approximator::PulseApproximator;
use crate::config::RecoverConfig;
use crate::error::Result;
use crate::manifest::PeakEntry;
use crate::signal_processing::find_event_end;
use crate::signal_processing::math::{argmax, max_value};
use crate::waveform::Waveform;

/// Whether a fitted amplitude recovers the raw one
///
/// Restored when the two agree within `tolerance` or the fit reaches at
/// least the raw amplitude.
pub fn is_restored(raw_amplitude: f64, fitted_amplitude: f64, tolerance: f64) -> bool {
    (fitted_amplitude - raw_amplitude).abs() <= tolerance || fitted_amplitude >= raw_amplitude
}

/// Per-entry result classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PulseStatus {
    Restored,
    NotRestored,
    /// Recording file does not exist; not counted
    Missing,
    /// Recording could not be read
    LoadFailed,
    /// Window too short to process
    TooShort,
}

impl PulseStatus {
    pub fn is_restored(self) -> bool {
        self == Self::Restored
    }

    /// Counted in the non-restored total
    pub fn is_non_restored(self) -> bool {
        matches!(self, Self::NotRestored | Self::LoadFailed | Self::TooShort)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Restored => "restored",
            Self::NotRestored => "not_restored",
            Self::Missing => "missing",
            Self::LoadFailed => "load_failed",
            Self::TooShort => "too_short",
        }
    }
}

/// Window samples kept for plotting
#[derive(Debug, Clone)]
pub struct PulseTrace {
    pub time: Vec<f64>,
    pub raw: Vec<f64>,
    pub fitted: Vec<f64>,
}

/// Result of processing one manifest entry
#[derive(Debug, Clone, Serialize)]
pub struct PulseRecord {
    pub filename: String,
    pub path: PathBuf,
    pub peak_index: usize,
    pub plateau_length: usize,
    pub status: PulseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_amplitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fitted_amplitude: Option<f64>,
    /// The model fit succeeded (otherwise the preprocessed trace was used)
    pub model_fit: bool,
    /// Decay edge within the window
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_end: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip)]
    pub trace: Option<PulseTrace>,
}

impl PulseRecord {
    fn unprocessed(entry: &PeakEntry, path: PathBuf, status: PulseStatus) -> Self {
        Self {
            filename: entry.filename.clone(),
            path,
            peak_index: entry.peak_index,
            plateau_length: entry.plateau_length,
            status,
            raw_amplitude: None,
            fitted_amplitude: None,
            model_fit: false,
            event_end: None,
            detail: None,
            trace: None,
        }
    }

    fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Plot file name, `<stem>_<restored|not_restored>.svg`
    ///
    /// `None` for entries that were never approximated.
    pub fn plot_file_name(&self) -> Option<String> {
        if !matches!(self.status, PulseStatus::Restored | PulseStatus::NotRestored) {
            return None;
        }
        let stem = self.path.file_stem()?.to_string_lossy();
        Some(format!("{}_{}.svg", stem, self.status.label()))
    }
}

/// Aggregate counts over a batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub restored: usize,
    pub non_restored: usize,
    pub missing: usize,
    /// Mean manifest plateau length over approximated, non-restored pulses
    pub average_plateau_length: Option<f64>,
}

impl BatchSummary {
    pub fn from_records(records: &[PulseRecord]) -> Self {
        let mut plateau_stats: Stats<f64> = Stats::new();
        let mut summary = Self {
            restored: 0,
            non_restored: 0,
            missing: 0,
            average_plateau_length: None,
        };

        for record in records {
            match record.status {
                PulseStatus::Restored => summary.restored += 1,
                PulseStatus::Missing => summary.missing += 1,
                PulseStatus::NotRestored => {
                    summary.non_restored += 1;
                    plateau_stats.update(record.plateau_length as f64);
                }
                PulseStatus::LoadFailed | PulseStatus::TooShort => summary.non_restored += 1,
            }
        }

        if plateau_stats.count > 0 {
            summary.average_plateau_length = Some(plateau_stats.mean);
        }
        summary
    }

    /// Plain-text report
    pub fn report(&self) -> String {
        let average = self
            .average_plateau_length
            .map_or("n/a".to_string(), |v| v.to_string());
        format!(
            "Non-restored peaks: {}\nRestored peaks: {}\nAverage Plateau Length in Non-restored: {}\n",
            self.non_restored, self.restored, average
        )
    }

    pub fn write_summary(&self, path: &Path) -> Result<()> {
        let mut file = fs::File::create(path)?;
        file.write_all(self.report().as_bytes())?;
        Ok(())
    }
}

/// Records in manifest order plus their summary
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub records: Vec<PulseRecord>,
    pub summary: BatchSummary,
}

/// Runs the approximator over every entry of a manifest
pub struct BatchProcessor {
    config: RecoverConfig,
    approximator: PulseApproximator,
}

impl BatchProcessor {
    pub fn new(config: RecoverConfig) -> Self {
        let approximator = PulseApproximator::new(&config.approximator);
        Self {
            config,
            approximator,
        }
    }

    pub fn config(&self) -> &RecoverConfig {
        &self.config
    }

    pub fn process(&self, entries: &[PeakEntry], data_dir: &Path) -> BatchReport {
        log::info!("Processing {} manifest entries", entries.len());
        let records: Vec<PulseRecord> = entries
            .par_iter()
            .map(|entry| self.process_entry(entry, data_dir))
            .collect();
        let summary = BatchSummary::from_records(&records);
        log::info!(
            "Batch finished: {} restored, {} non-restored, {} missing",
            summary.restored,
            summary.non_restored,
            summary.missing
        );
        BatchReport { records, summary }
    }

    pub fn process_entry(&self, entry: &PeakEntry, data_dir: &Path) -> PulseRecord {
        let path = entry.resolve_path(data_dir, &self.config.batch.strip_prefixes);
        if !path.exists() {
            log::warn!("File not found: {}", path.display());
            return PulseRecord::unprocessed(entry, path, PulseStatus::Missing);
        }

        let waveform = match Waveform::load_npz(&path) {
            Ok(waveform) => waveform,
            Err(e) => {
                log::warn!("Failed to load {}: {}", path.display(), e);
                return PulseRecord::unprocessed(entry, path, PulseStatus::LoadFailed)
                    .with_detail(e.to_string());
            }
        };

        let window = &self.config.window;
        if window.pre_peak_samples + window.post_peak_samples < window.min_span {
            log::warn!("Event too short for {}", path.display());
            return PulseRecord::unprocessed(entry, path, PulseStatus::TooShort)
                .with_detail("event span below minimum");
        }

        let (time, current) = waveform.window(
            entry.peak_index,
            window.pre_peak_samples,
            window.post_peak_samples,
        );
        if time.len() < window.min_samples {
            log::warn!("Pulse window too short in {}", path.display());
            return PulseRecord::unprocessed(entry, path, PulseStatus::TooShort)
                .with_detail(format!("{} samples in window", time.len()));
        }

        let approximation = match self.approximator.approximate_detailed(&time, &current) {
            Ok(approximation) => approximation,
            Err(e) => {
                log::warn!("Skipping {}: {}", path.display(), e);
                return PulseRecord::unprocessed(entry, path, PulseStatus::TooShort)
                    .with_detail(e.to_string());
            }
        };

        let raw_amplitude = max_value(&current).unwrap_or(f64::NEG_INFINITY);
        let fitted_amplitude = approximation.fitted_peak();
        let status = if is_restored(
            raw_amplitude,
            fitted_amplitude,
            self.config.batch.restore_tolerance,
        ) {
            PulseStatus::Restored
        } else {
            PulseStatus::NotRestored
        };

        let event_end = argmax(&current).and_then(|peak| {
            find_event_end(
                &current,
                peak,
                self.config.approximator.threshold_factor,
                window.extra_points,
            )
            .ok()
        });

        log::debug!(
            "{}: raw {:.4}, fitted {:.4}, {}",
            entry.filename,
            raw_amplitude,
            fitted_amplitude,
            status.label()
        );

        PulseRecord {
            filename: entry.filename.clone(),
            path,
            peak_index: entry.peak_index,
            plateau_length: entry.plateau_length,
            status,
            raw_amplitude: Some(raw_amplitude),
            fitted_amplitude: Some(fitted_amplitude),
            model_fit: approximation.is_model(),
            event_end,
            detail: None,
            trace: Some(PulseTrace {
                time,
                raw: current,
                fitted: approximation.fitted,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: PulseStatus, plateau_length: usize) -> PulseRecord {
        let entry = PeakEntry {
            filename: "run/shot_07.npz".to_string(),
            peak_index: 40,
            plateau_length,
        };
        PulseRecord::unprocessed(&entry, PathBuf::from("/data/run/shot_07.npz"), status)
    }

    #[test]
    fn test_is_restored() {
        assert!(is_restored(10.0, 10.0, 0.01));
        assert!(is_restored(10.0, 9.995, 0.01));
        assert!(is_restored(10.0, 12.0, 0.01));
        assert!(!is_restored(10.0, 9.9, 0.01));
    }

    #[test]
    fn test_summary_counts() {
        let records = vec![
            record(PulseStatus::Restored, 1),
            record(PulseStatus::NotRestored, 3),
            record(PulseStatus::NotRestored, 6),
            record(PulseStatus::Missing, 9),
            record(PulseStatus::LoadFailed, 9),
            record(PulseStatus::TooShort, 9),
        ];
        let summary = BatchSummary::from_records(&records);
        assert_eq!(summary.restored, 1);
        assert_eq!(summary.non_restored, 4);
        assert_eq!(summary.missing, 1);
        assert_eq!(summary.average_plateau_length, Some(4.5));
        assert_eq!(
            summary.report(),
            "Non-restored peaks: 4\nRestored peaks: 1\nAverage Plateau Length in Non-restored: 4.5\n"
        );
    }

    #[test]
    fn test_summary_without_non_restored() {
        let summary = BatchSummary::from_records(&[record(PulseStatus::Restored, 2)]);
        assert_eq!(summary.average_plateau_length, None);
        assert!(
            summary
                .report()
                .ends_with("Average Plateau Length in Non-restored: n/a\n")
        );
    }

    #[test]
    fn test_plot_file_name() {
        assert_eq!(
            record(PulseStatus::NotRestored, 0).plot_file_name().as_deref(),
            Some("shot_07_not_restored.svg")
        );
        assert_eq!(
            record(PulseStatus::Restored, 0).plot_file_name().as_deref(),
            Some("shot_07_restored.svg")
        );
        assert_eq!(record(PulseStatus::Missing, 0).plot_file_name(), None);
    }
}
