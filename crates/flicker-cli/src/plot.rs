//! Result plotting.
//!
//! Log axes are drawn by plotting `log10` of the data on a linear
//! coordinate and labelling tick `t` with the quantity `10^t`.

use std::ops::Range;
use std::path::Path;
use std::process::Command;

use anyhow::{anyhow, bail, Result};
use flicker_core::{format_value, Notation};
use flicker_sim::AxisScale;
use plotters::coord::Shift;
use plotters::prelude::*;

/// One curve of a chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    pub label: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// Everything needed to draw one chart.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSpec {
    pub title: String,
    pub x_name: String,
    pub x_units: String,
    pub x_scale: AxisScale,
    pub y_name: String,
    pub y_units: String,
    pub y_scale: AxisScale,
    pub curves: Vec<Curve>,
    pub notation: Notation,
    pub width: u32,
    pub height: u32,
}

/// Units of the amplitude density matching a power density, if `units` is one.
///
/// `V**2/Hz`, `V^2/Hz` and `V2/Hz` all become `V/√Hz`.
pub fn amplitude_units(units: &str) -> Option<String> {
    let numerator = units.trim().strip_suffix("/Hz")?;
    let base = ["**2", "^2", "2"]
        .iter()
        .find_map(|square| numerator.strip_suffix(square))?;
    if base.is_empty() {
        return None;
    }
    Some(format!("{}/√Hz", base))
}

/// Convert a power spectral density to an amplitude spectral density.
///
/// Negative and NaN powers have no amplitude and become NaN, which the
/// plot drops. Returns `None` when `units` is not a power density.
pub fn to_amplitude(values: &[f64], units: &str) -> Option<(Vec<f64>, String)> {
    let units = amplitude_units(units)?;
    let values = values
        .iter()
        .map(|&v| if v >= 0.0 { v.sqrt() } else { f64::NAN })
        .collect();
    Some((values, units))
}

/// Render a chart to `path`. A `.svg` extension selects SVG output.
pub fn render(spec: &PlotSpec, path: &Path) -> Result<()> {
    if spec.curves.is_empty() {
        bail!("nothing to plot");
    }

    let size = (spec.width, spec.height);
    let is_svg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"));
    let drawn = if is_svg {
        draw(SVGBackend::new(path, size).into_drawing_area(), spec)
    } else {
        draw(BitMapBackend::new(path, size).into_drawing_area(), spec)
    };
    drawn?;

    log::debug!("wrote chart to {}", path.display());
    Ok(())
}

/// Open a rendered chart with an external viewer without waiting for it.
pub fn open_viewer(viewer: &str, path: &Path) {
    match Command::new(viewer).arg(path).spawn() {
        Ok(_) => log::info!("opened {} with {}", path.display(), viewer),
        Err(e) => log::warn!("could not start viewer {}: {}", viewer, e),
    }
}

fn draw<DB: DrawingBackend>(root: DrawingArea<DB, Shift>, spec: &PlotSpec) -> Result<()> {
    let curves: Vec<(&str, Vec<(f64, f64)>)> = spec
        .curves
        .iter()
        .map(|c| (c.label.as_str(), plot_points(c, spec.x_scale, spec.y_scale)))
        .collect();

    let x_range = axis_range(curves.iter().flat_map(|(_, p)| p.iter().map(|(x, _)| *x)))
        .ok_or_else(|| anyhow!("no plottable points on the {} axis", spec.x_name))?;
    let y_range = axis_range(curves.iter().flat_map(|(_, p)| p.iter().map(|(_, y)| *y)))
        .ok_or_else(|| anyhow!("no plottable points on the {} axis", spec.y_name))?;

    root.fill(&WHITE).map_err(render_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&spec.title, ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(90)
        .build_cartesian_2d(x_range, y_range)
        .map_err(render_err)?;

    let x_label = |v: &f64| tick_label(*v, spec.x_scale, &spec.x_units, spec.notation);
    let y_label = |v: &f64| tick_label(*v, spec.y_scale, &spec.y_units, spec.notation);
    chart
        .configure_mesh()
        .x_desc(axis_desc(&spec.x_name, &spec.x_units))
        .y_desc(axis_desc(&spec.y_name, &spec.y_units))
        .x_label_formatter(&x_label)
        .y_label_formatter(&y_label)
        .draw()
        .map_err(render_err)?;

    for (index, (label, points)) in curves.into_iter().enumerate() {
        let style = Palette99::pick(index).mix(0.9).stroke_width(2);
        chart
            .draw_series(LineSeries::new(points, style))
            .map_err(render_err)?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}

/// Points in plot coordinates. Non-finite points, and non-positive ones on a
/// log axis, are dropped.
fn plot_points(curve: &Curve, x_scale: AxisScale, y_scale: AxisScale) -> Vec<(f64, f64)> {
    let mut dropped = 0;
    let points: Vec<(f64, f64)> = curve
        .x
        .iter()
        .zip(&curve.y)
        .filter_map(|(&x, &y)| {
            let point = to_axis(x, x_scale).zip(to_axis(y, y_scale));
            if point.is_none() {
                dropped += 1;
            }
            point
        })
        .collect();

    if dropped > 0 {
        log::warn!(
            "{}: dropped {} points that are not finite or not positive on a log axis",
            curve.label,
            dropped
        );
    }
    points
}

fn to_axis(value: f64, scale: AxisScale) -> Option<f64> {
    match scale {
        _ if !value.is_finite() => None,
        AxisScale::Log if value <= 0.0 => None,
        AxisScale::Log => Some(value.log10()),
        AxisScale::Linear => Some(value),
    }
}

fn axis_range(values: impl Iterator<Item = f64>) -> Option<Range<f64>> {
    let (lo, hi) = values.fold(None, |acc: Option<(f64, f64)>, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })?;

    if lo == hi {
        let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.1 };
        return Some(lo - pad..hi + pad);
    }
    Some(lo..hi)
}

fn tick_label(value: f64, scale: AxisScale, units: &str, notation: Notation) -> String {
    let value = match scale {
        AxisScale::Log => 10f64.powf(value),
        AxisScale::Linear => value,
    };
    format_value(value, units, notation, 2)
}

fn axis_desc(name: &str, units: &str) -> String {
    if units.is_empty() {
        name.to_string()
    } else {
        format!("{} [{}]", name, units)
    }
}

fn render_err<E: std::fmt::Debug>(e: E) -> anyhow::Error {
    anyhow!("plot rendering failed: {:?}", e)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amplitude_units() {
        assert_eq!(amplitude_units("V**2/Hz").as_deref(), Some("V/√Hz"));
        assert_eq!(amplitude_units("A^2/Hz").as_deref(), Some("A/√Hz"));
        assert_eq!(amplitude_units("V2/Hz").as_deref(), Some("V/√Hz"));
        assert_eq!(amplitude_units("V/sqrt(Hz)"), None);
        assert_eq!(amplitude_units("V"), None);
        assert_eq!(amplitude_units("2/Hz"), None);
    }

    #[test]
    fn test_to_amplitude_is_elementwise_sqrt() {
        let power = [0.0625, 9.0, 0.0, 2.25];
        let (amplitude, units) = to_amplitude(&power, "V**2/Hz").unwrap();
        assert_eq!(units, "V/√Hz");
        assert_eq!(amplitude, vec![0.25, 3.0, 0.0, 1.5]);
        assert!(to_amplitude(&power, "V").is_none());
    }

    #[test]
    fn test_to_amplitude_keeps_invalid_power_out_of_the_plot() {
        let power = [f64::NAN, -4.0, 4.0];
        let (amplitude, _) = to_amplitude(&power, "V**2/Hz").unwrap();
        assert!(amplitude[0].is_nan());
        assert!(amplitude[1].is_nan());
        assert_eq!(amplitude[2], 2.0);

        let curve = Curve {
            label: "out".to_string(),
            x: vec![1.0, 2.0, 3.0],
            y: amplitude,
        };
        assert_eq!(
            plot_points(&curve, AxisScale::Linear, AxisScale::Linear),
            vec![(3.0, 2.0)]
        );
    }

    #[test]
    fn test_log_axis_drops_non_positive() {
        let curve = Curve {
            label: "out".to_string(),
            x: vec![0.0, 1.0, 10.0, 100.0],
            y: vec![1.0, -1.0, 100.0, 1000.0],
        };
        let points = plot_points(&curve, AxisScale::Log, AxisScale::Log);
        assert_eq!(points, vec![(1.0, 2.0), (2.0, 3.0)]);

        let linear = plot_points(&curve, AxisScale::Linear, AxisScale::Linear);
        assert_eq!(linear.len(), 4);
    }

    #[test]
    fn test_axis_range() {
        assert_eq!(axis_range([3.0, -1.0, 2.0].into_iter()), Some(-1.0..3.0));
        assert_eq!(axis_range([5.0].into_iter()), Some(4.5..5.5));
        assert_eq!(axis_range([0.0].into_iter()), Some(-1.0..1.0));
        assert_eq!(axis_range(std::iter::empty()), None);
    }

    #[test]
    fn test_tick_labels() {
        assert_eq!(
            tick_label(3.0, AxisScale::Log, "Hz", Notation::Si),
            format_value(1000.0, "Hz", Notation::Si, 2)
        );
        assert_eq!(
            tick_label(0.5, AxisScale::Linear, "V", Notation::Si),
            format_value(0.5, "V", Notation::Si, 2)
        );
        assert_eq!(axis_desc("freq", "Hz"), "freq [Hz]");
        assert_eq!(axis_desc("out", ""), "out");
    }

    #[test]
    fn test_render_rejects_empty() {
        let spec = PlotSpec {
            title: String::new(),
            x_name: String::new(),
            x_units: String::new(),
            x_scale: AxisScale::Linear,
            y_name: String::new(),
            y_units: String::new(),
            y_scale: AxisScale::Linear,
            curves: Vec::new(),
            notation: Notation::Si,
            width: 10,
            height: 10,
        };
        assert!(render(&spec, Path::new("unused.svg")).is_err());
    }
}
