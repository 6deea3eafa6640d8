//! Recorded waveform storage
//!
//! Recordings are `.npz` archives holding one 2-D `data` array whose rows
//! are time, voltage and current.

use std::fs::File;
use std::path::Path;

use ndarray::Array2;
use ndarray_npy::{NpzReader, NpzWriter};

use crate::error::{PulseError, Result};

const DATA_ARRAY: &str = "data";
const WAVEFORM_ROWS: usize = 3;

/// One recorded discharge waveform
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub time: Vec<f64>,
    pub voltage: Vec<f64>,
    pub current: Vec<f64>,
}

impl Waveform {
    pub fn new(time: Vec<f64>, voltage: Vec<f64>, current: Vec<f64>) -> Result<Self> {
        if time.len() != voltage.len() || time.len() != current.len() {
            return Err(PulseError::Waveform(format!(
                "row lengths differ: time {}, voltage {}, current {}",
                time.len(),
                voltage.len(),
                current.len()
            )));
        }
        Ok(Self {
            time,
            voltage,
            current,
        })
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Build from a `data` array with at least three rows
    pub fn from_array(data: &Array2<f64>) -> Result<Self> {
        if data.nrows() < WAVEFORM_ROWS {
            return Err(PulseError::Waveform(format!(
                "expected at least {} rows, found {}",
                WAVEFORM_ROWS,
                data.nrows()
            )));
        }
        Self::new(
            data.row(0).to_vec(),
            data.row(1).to_vec(),
            data.row(2).to_vec(),
        )
    }

    /// Stack the three rows into a `data` array
    pub fn to_array(&self) -> Result<Array2<f64>> {
        let flat: Vec<f64> = self
            .time
            .iter()
            .chain(&self.voltage)
            .chain(&self.current)
            .copied()
            .collect();
        Array2::from_shape_vec((WAVEFORM_ROWS, self.len()), flat)
            .map_err(|e| PulseError::Waveform(e.to_string()))
    }

    /// Load a recording from an `.npz` archive
    pub fn load_npz(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut npz = NpzReader::new(file).map_err(|e| PulseError::Waveform(e.to_string()))?;
        let names = npz
            .names()
            .map_err(|e| PulseError::Waveform(e.to_string()))?;
        let name = names
            .into_iter()
            .find(|n| n.trim_end_matches(".npy") == DATA_ARRAY)
            .ok_or_else(|| {
                PulseError::Waveform(format!("no '{}' array in {}", DATA_ARRAY, path.display()))
            })?;
        let data: Array2<f64> = npz
            .by_name(&name)
            .map_err(|e| PulseError::Waveform(e.to_string()))?;
        Self::from_array(&data)
    }

    /// Write the recording as an `.npz` archive with a single `data` array
    pub fn save_npz(&self, path: &Path) -> Result<()> {
        let data = self.to_array()?;
        let file = File::create(path)?;
        let mut npz = NpzWriter::new(file);
        npz.add_array(DATA_ARRAY, &data)
            .map_err(|e| PulseError::Waveform(e.to_string()))?;
        npz.finish()
            .map_err(|e| PulseError::Waveform(e.to_string()))?;
        Ok(())
    }

    /// Time and current samples in `[peak - pre, peak + post)`
    ///
    /// The range is clamped to the recording; a start before the first
    /// sample is clamped to 0.
    pub fn window(&self, peak_index: usize, pre: usize, post: usize) -> (Vec<f64>, Vec<f64>) {
        let start = peak_index.saturating_sub(pre).min(self.len());
        let end = peak_index.saturating_add(post).min(self.len()).max(start);
        (
            self.time[start..end].to_vec(),
            self.current[start..end].to_vec(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample() -> Waveform {
        Waveform::new(
            (0..10).map(|i| i as f64 * 1e-9).collect(),
            vec![1.0; 10],
            (0..10).map(|i| i as f64).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_from_array_rows() {
        let data = array![[0.0, 1.0], [5.0, 5.0], [0.1, 0.2], [9.0, 9.0]];
        let w = Waveform::from_array(&data).unwrap();
        assert_eq!(w.time, vec![0.0, 1.0]);
        assert_eq!(w.voltage, vec![5.0, 5.0]);
        assert_eq!(w.current, vec![0.1, 0.2]);
    }

    #[test]
    fn test_too_few_rows() {
        let data = array![[0.0, 1.0], [5.0, 5.0]];
        assert!(matches!(
            Waveform::from_array(&data),
            Err(PulseError::Waveform(_))
        ));
    }

    #[test]
    fn test_mismatched_rows() {
        assert!(Waveform::new(vec![0.0, 1.0], vec![0.0], vec![0.0, 1.0]).is_err());
    }

    #[test]
    fn test_window_clamping() {
        let w = sample();
        let (time, current) = w.window(5, 2, 3);
        assert_eq!(current, vec![3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(time.len(), 5);

        let (_, current) = w.window(1, 30, 3);
        assert_eq!(current, vec![0.0, 1.0, 2.0, 3.0]);

        let (_, current) = w.window(8, 2, 150);
        assert_eq!(current, vec![6.0, 7.0, 8.0, 9.0]);

        let (_, current) = w.window(40, 2, 5);
        assert!(current.is_empty());
    }

    #[test]
    fn test_to_array_layout() {
        let data = sample().to_array().unwrap();
        assert_eq!(data.dim(), (3, 10));
        assert_eq!(data[[2, 4]], 4.0);
        assert_eq!(data[[1, 0]], 1.0);
    }
}
