//! Drawing chart models with `plotters`.

use std::ops::Range;
use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use super::{Chart, LineChart, PlotError, Rgb, ScatterChart, GREY, HEIGHT, WIDTH};

fn color(rgb: Rgb) -> RGBColor {
    RGBColor(rgb.0, rgb.1, rgb.2)
}

fn render_err(e: impl std::fmt::Display) -> PlotError {
    PlotError::Render(e.to_string())
}

/// Axis range covering `values`, padded by 5% (or ±1 when flat).
fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    if min == max {
        return (min - 1.0)..(max + 1.0);
    }
    let pad = (max - min) * 0.05;
    (min - pad)..(max + pad)
}

/// Write `chart` to `path`; the backend is chosen from the extension.
pub fn render_to_file(chart: &Chart, path: &Path) -> Result<(), PlotError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(render_err)?;
        }
    }

    match path.extension().and_then(|e| e.to_str()) {
        Some("svg") => {
            let root = SVGBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
            draw(&root, chart)?;
            root.present().map_err(render_err)
        }
        Some("png") => {
            let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
            draw(&root, chart)?;
            root.present().map_err(render_err)
        }
        _ => Err(PlotError::UnsupportedFormat(path.display().to_string())),
    }
}

pub fn draw<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, chart: &Chart) -> Result<(), PlotError> {
    root.fill(&WHITE).map_err(render_err)?;
    match chart {
        Chart::Line(line) => draw_line_chart(root, line),
        Chart::Scatter(scatter) => draw_scatter_chart(root, scatter),
    }
}

fn draw_line_chart<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, chart: &LineChart) -> Result<(), PlotError> {
    let x_range = padded_range(chart.series.iter().flat_map(|s| s.points.iter().map(|p| p.0)));
    let y_range = match chart.y_range {
        Some((lo, hi)) => lo..hi,
        None => padded_range(chart.series.iter().flat_map(|s| s.points.iter().map(|p| p.1))),
    };

    let mut builder = ChartBuilder::on(root);
    builder.margin(15).x_label_area_size(35).y_label_area_size(55);
    if let Some(title) = &chart.title {
        builder.caption(title, ("sans-serif", 20));
    }
    let mut ctx = builder.build_cartesian_2d(x_range, y_range).map_err(render_err)?;

    let year_label = |v: &f64| format!("{:.0}", v);
    let percent_label = |v: &f64| format!("{:.0}%", v);
    let mut mesh = ctx.configure_mesh();
    mesh.disable_x_mesh()
        .disable_y_mesh()
        .x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str())
        .x_label_formatter(&year_label);
    if chart.percent_axis {
        mesh.y_label_formatter(&percent_label);
    }
    mesh.draw().map_err(render_err)?;

    for series in &chart.series {
        let style = color(series.color).mix(series.alpha).stroke_width(series.width);
        ctx.draw_series(LineSeries::new(series.points.iter().copied(), style))
            .map_err(render_err)?;
    }

    for note in &chart.annotations {
        ctx.draw_series(std::iter::once(Text::new(
            note.text.clone(),
            (note.x, note.y),
            ("sans-serif", 12).into_font(),
        )))
        .map_err(render_err)?;
    }

    Ok(())
}

fn draw_scatter_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    chart: &ScatterChart,
) -> Result<(), PlotError> {
    let x_range = padded_range(chart.points.iter().map(|p| p.0));
    let y_range = padded_range(chart.points.iter().map(|p| p.1));

    let mut builder = ChartBuilder::on(root);
    builder.margin(15).x_label_area_size(40).y_label_area_size(55);
    if let Some(title) = &chart.title {
        builder.caption(title, ("sans-serif", 20));
    }
    let mut ctx = builder.build_cartesian_2d(x_range, y_range).map_err(render_err)?;

    let percent_label = |v: &f64| format!("{:.0}%", v);
    let mut mesh = ctx.configure_mesh();
    mesh.disable_x_mesh()
        .disable_y_mesh()
        .x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str());
    if chart.percent_x {
        mesh.x_label_formatter(&percent_label);
    }
    mesh.draw().map_err(render_err)?;

    let point_color = color(GREY);
    ctx.draw_series(
        chart
            .points
            .iter()
            .map(|&(x, y)| Circle::new((x, y), 3, point_color.filled())),
    )
    .map_err(render_err)?;

    Ok(())
}
