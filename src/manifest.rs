//! Peak manifest parsing
//!
//! A manifest lists one candidate pulse per line as
//! `filename, peak_index, plateau_length`. An optional header line starting
//! with `filename` (any case) is skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{PulseError, Result};

/// One manifest line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeakEntry {
    /// Recording file as written in the manifest
    pub filename: String,
    /// Sample index of the peak within the recording
    pub peak_index: usize,
    /// Number of saturated samples at the peak
    pub plateau_length: usize,
}

impl PeakEntry {
    /// Resolve the recording path against `data_dir`
    ///
    /// Every occurrence of each prefix in `strip_prefixes` is removed from
    /// the filename first; absolute paths are not joined.
    pub fn resolve_path(&self, data_dir: &Path, strip_prefixes: &[String]) -> PathBuf {
        let cleaned = strip_prefixes
            .iter()
            .filter(|p| !p.is_empty())
            .fold(self.filename.clone(), |name, prefix| {
                name.replace(prefix.as_str(), "")
            });
        let path = PathBuf::from(cleaned);
        if path.is_absolute() {
            path
        } else {
            data_dir.join(path)
        }
    }
}

/// Parse manifest lines from any buffered reader
pub fn parse_manifest<R: BufRead>(reader: R) -> Result<Vec<PeakEntry>> {
    let mut entries = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.to_lowercase().starts_with("filename") {
            continue;
        }
        entries.push(parse_line(line, i + 1)?);
    }
    Ok(entries)
}

/// Read and parse a manifest file
pub fn read_manifest(path: &Path) -> Result<Vec<PeakEntry>> {
    let file = File::open(path)?;
    parse_manifest(BufReader::new(file))
}

fn parse_line(line: &str, line_no: usize) -> Result<PeakEntry> {
    let manifest_error = |reason: String| PulseError::Manifest {
        line: line_no,
        reason,
    };

    let fields: Vec<&str> = line.split(',').collect();
    let [filename, peak_index, plateau_length] = fields.as_slice() else {
        return Err(manifest_error(format!(
            "expected 3 comma-separated fields, found {}",
            fields.len()
        )));
    };

    let parse_index = |name: &str, value: &str| {
        value
            .trim()
            .parse::<usize>()
            .map_err(|e| manifest_error(format!("invalid {} '{}': {}", name, value.trim(), e)))
    };

    Ok(PeakEntry {
        filename: filename.trim().to_string(),
        peak_index: parse_index("peak_index", *peak_index)?,
        plateau_length: parse_index("plateau_length", *plateau_length)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_header_and_blank_lines() {
        let text = "Filename, peak_index, plateau_length\n\
                    ../data_01_11_2017/a.npz, 1200, 4\n\
                    \n\
                    b.npz,35,0\n";
        let entries = parse_manifest(text.as_bytes()).unwrap();
        assert_eq!(
            entries,
            vec![
                PeakEntry {
                    filename: "../data_01_11_2017/a.npz".to_string(),
                    peak_index: 1200,
                    plateau_length: 4,
                },
                PeakEntry {
                    filename: "b.npz".to_string(),
                    peak_index: 35,
                    plateau_length: 0,
                },
            ]
        );
    }

    #[test]
    fn test_malformed_lines_report_line_number() {
        let err = parse_manifest("a.npz, 10, 2\nb.npz, 10\n".as_bytes()).unwrap_err();
        assert!(matches!(err, PulseError::Manifest { line: 2, .. }));

        let err = parse_manifest("a.npz, ten, 2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, PulseError::Manifest { line: 1, .. }));

        let err = parse_manifest("a.npz, -5, 2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, PulseError::Manifest { line: 1, .. }));
    }

    #[test]
    fn test_resolve_path_strips_prefixes() {
        let entry = PeakEntry {
            filename: "../data_01_11_2017/run3/shot.npz".to_string(),
            peak_index: 0,
            plateau_length: 0,
        };
        let prefixes = vec!["../".to_string(), "data_01_11_2017/".to_string()];
        assert_eq!(
            entry.resolve_path(Path::new("/data"), &prefixes),
            PathBuf::from("/data/run3/shot.npz")
        );
        assert_eq!(
            entry.resolve_path(Path::new("/data"), &[]),
            PathBuf::from("/data/../data_01_11_2017/run3/shot.npz")
        );
    }

    #[test]
    fn test_resolve_absolute_path() {
        let entry = PeakEntry {
            filename: "/archive/shot.npz".to_string(),
            peak_index: 0,
            plateau_length: 0,
        };
        assert_eq!(
            entry.resolve_path(Path::new("/data"), &["../".to_string()]),
            PathBuf::from("/archive/shot.npz")
        );
    }
}
