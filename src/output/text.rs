use crate::batch::PulseRecord;

use super::{Formatter, amplitude};

pub struct TextFormatter {
    verbose: bool,
}

impl TextFormatter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Formatter for TextFormatter {
    fn format(&self, record: &PulseRecord) -> String {
        if self.verbose {
            let end = record
                .event_end
                .map_or("-".to_string(), |e| e.to_string());
            let mut line = format!(
                "{} @ {}: {} (raw: {}, fitted: {}) [plateau: {}, model: {}, end: {}]",
                record.filename,
                record.peak_index,
                record.status.label(),
                amplitude(record.raw_amplitude, "-"),
                amplitude(record.fitted_amplitude, "-"),
                record.plateau_length,
                if record.model_fit { "yes" } else { "no" },
                end
            );
            if let Some(detail) = &record.detail {
                line.push_str(&format!(" ({})", detail));
            }
            line
        } else {
            format!(
                "{} @ {}: {} fitted: {}",
                record.filename,
                record.peak_index,
                record.status.label(),
                amplitude(record.fitted_amplitude, "-")
            )
        }
    }
}
