mod csv;
mod json;
mod text;

use chrono::Utc;

use crate::batch::PulseRecord;

pub use self::csv::CsvFormatter;
pub use self::json::JsonFormatter;
pub use self::text::TextFormatter;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

pub trait Formatter: Send {
    fn format(&self, record: &PulseRecord) -> String;

    fn header(&self) -> Option<&'static str> {
        None
    }
}

pub fn create_formatter(format: OutputFormat, verbose: bool) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter::new(verbose)),
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Csv => Box::new(CsvFormatter),
    }
}

pub fn iso8601_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

fn amplitude(value: Option<f64>, missing: &str) -> String {
    value.map_or(missing.to_string(), |v| format!("{:.4}", v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{PulseRecord, PulseStatus};
    use std::path::PathBuf;

    pub(super) fn restored_record() -> PulseRecord {
        PulseRecord {
            filename: "run/shot_07.npz".to_string(),
            path: PathBuf::from("/data/run/shot_07.npz"),
            peak_index: 1200,
            plateau_length: 4,
            status: PulseStatus::Restored,
            raw_amplitude: Some(9.5),
            fitted_amplitude: Some(10.25),
            model_fit: true,
            event_end: Some(71),
            detail: None,
            trace: None,
        }
    }

    #[test]
    fn test_formats_share_fields() {
        let record = restored_record();
        for format in [OutputFormat::Text, OutputFormat::Json, OutputFormat::Csv] {
            let line = create_formatter(format, true).format(&record);
            assert!(line.contains("run/shot_07.npz"), "{line}");
            assert!(line.contains("10.25"), "{line}");
        }
    }

    #[test]
    fn test_amplitude_placeholder() {
        assert_eq!(amplitude(None, "-"), "-");
        assert_eq!(amplitude(Some(1.5), "-"), "1.5000");
    }
}
