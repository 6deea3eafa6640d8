//! Diagnostic plots of raw and fitted pulses

use std::path::{Path, PathBuf};

use plotters::{
    chart::ChartBuilder,
    prelude::{IntoDrawingArea, PathElement, SVGBackend},
    series::LineSeries,
    style::{BLUE, IntoFont, RED, ShapeStyle, WHITE},
};

use crate::batch::{PulseRecord, PulseStatus};
use crate::error::{PulseError, Result};
use crate::signal_processing::math::max_value;

const PLOT_SIZE: (u32, u32) = (800, 600);

fn plot_error(e: impl std::fmt::Display) -> PulseError {
    PulseError::Plot(e.to_string())
}

fn axis_range(values: &[f64]) -> (f64, f64) {
    let lo = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f64::INFINITY, f64::min);
    let hi = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if hi - lo <= f64::EPSILON {
        return (lo - 0.5, hi + 0.5);
    }
    let pad = 0.05 * (hi - lo);
    (lo - pad, hi + pad)
}

/// Render raw (blue) and fitted (red) current over `time` as an SVG
pub fn plot_restore(
    time: &[f64],
    raw: &[f64],
    fitted: &[f64],
    title: &str,
    out_path: &Path,
) -> Result<()> {
    let (x_min, x_max) = axis_range(time);
    let (y_min, y_max) = axis_range(&[raw, fitted].concat());

    let root = SVGBackend::new(out_path, PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;

    let mut chart = ChartBuilder::on(&root)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .margin(10)
        .caption(title, ("sans-serif", 24.0).into_font())
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(plot_error)?;

    chart
        .configure_mesh()
        .x_desc("Time")
        .y_desc("Current")
        .y_label_formatter(&|y| format!("{:.3}", y))
        .draw()
        .map_err(plot_error)?;

    chart
        .draw_series(LineSeries::new(
            time.iter().copied().zip(raw.iter().copied()),
            &BLUE,
        ))
        .map_err(plot_error)?
        .label("Original current")
        .legend(|(x, y)| PathElement::new(vec![(x - 10, y), (x + 10, y)], BLUE));

    chart
        .draw_series(LineSeries::new(
            time.iter()
                .copied()
                .zip(fitted.iter().copied())
                .filter(|(_, y)| y.is_finite()),
            ShapeStyle::from(&RED).stroke_width(2),
        ))
        .map_err(plot_error)?
        .label("Fitted pulse")
        .legend(|(x, y)| PathElement::new(vec![(x - 10, y), (x + 10, y)], RED));

    chart
        .configure_series_labels()
        .background_style(WHITE)
        .border_style(BLUE)
        .draw()
        .map_err(plot_error)?;

    root.present().map_err(plot_error)?;
    Ok(())
}

/// Plot an approximated batch record into `plots_dir`
///
/// Returns the written path, or `None` when the record carries no window.
pub fn plot_record(record: &PulseRecord, plots_dir: &Path) -> Result<Option<PathBuf>> {
    let (Some(trace), Some(name)) = (&record.trace, record.plot_file_name()) else {
        return Ok(None);
    };
    let label = match record.status {
        PulseStatus::Restored => "Restored",
        _ => "Not restored",
    };
    let base = record
        .path
        .file_name()
        .map_or(record.filename.clone(), |n| n.to_string_lossy().into_owned());
    let title = format!(
        "{} - {} (raw {:.3}, fitted {:.3})",
        base,
        label,
        max_value(&trace.raw).unwrap_or(f64::NAN),
        max_value(&trace.fitted).unwrap_or(f64::NAN)
    );

    let out_path = plots_dir.join(name);
    plot_restore(&trace.time, &trace.raw, &trace.fitted, &title, &out_path)?;
    log::debug!("Wrote {}", out_path.display());
    Ok(Some(out_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_range_pads() {
        let (lo, hi) = axis_range(&[0.0, 10.0]);
        assert!((lo + 0.5).abs() < 1e-12);
        assert!((hi - 10.5).abs() < 1e-12);
    }

    #[test]
    fn test_axis_range_degenerate() {
        assert_eq!(axis_range(&[]), (0.0, 1.0));
        assert_eq!(axis_range(&[2.0, 2.0]), (1.5, 2.5));
        assert_eq!(axis_range(&[f64::NAN]), (0.0, 1.0));
    }
}
