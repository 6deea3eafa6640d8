use serde_json::json;

use crate::batch::PulseRecord;

use super::{Formatter, iso8601_timestamp};

pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format(&self, record: &PulseRecord) -> String {
        json!({
            "ts": iso8601_timestamp(),
            "filename": record.filename,
            "peak_index": record.peak_index,
            "plateau_length": record.plateau_length,
            "status": record.status,
            "raw_amplitude": record.raw_amplitude,
            "fitted_amplitude": record.fitted_amplitude,
            "model_fit": record.model_fit,
            "event_end": record.event_end,
            "detail": record.detail,
        })
        .to_string()
    }
}
