use crate::batch::PulseRecord;

use super::{Formatter, amplitude, iso8601_timestamp};

pub struct CsvFormatter;

impl Formatter for CsvFormatter {
    fn format(&self, record: &PulseRecord) -> String {
        let end = record
            .event_end
            .map_or(String::new(), |e| e.to_string());
        format!(
            "{},{},{},{},{},{},{},{},{}",
            iso8601_timestamp(),
            record.filename,
            record.peak_index,
            record.plateau_length,
            record.status.label(),
            amplitude(record.raw_amplitude, ""),
            amplitude(record.fitted_amplitude, ""),
            record.model_fit,
            end
        )
    }

    fn header(&self) -> Option<&'static str> {
        Some("ts,filename,peak_index,plateau_length,status,raw_amplitude,fitted_amplitude,model_fit,event_end")
    }
}
