//! Drawing of chart geometry onto any plotters backend

use std::ops::Range;

use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::{
    BarGeometry, BoxGeometry, ChartFrame, CurveGeometry, HeatmapGeometry, HistogramGeometry,
    Plot, PointsGeometry, RenderedChart, ViolinGeometry, ViolinInner,
};

type Chart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Draw a chart on `root`; `scale` is dpi / 100 and multiplies fonts and markers
pub(crate) fn draw<DB: DrawingBackend>(
    chart: &RenderedChart,
    root: &DrawingArea<DB, Shift>,
    scale: f64,
) -> crate::Result<()> {
    root.fill(&WHITE)?;
    match &chart.plot {
        Plot::Bars(bars) => draw_bars(root, &chart.frame, bars, scale),
        Plot::Boxes(boxes) => draw_boxes(root, &chart.frame, boxes, scale),
        Plot::Violins(violins) => draw_violins(root, &chart.frame, violins, scale),
        Plot::Points(points) => draw_points(root, &chart.frame, points, scale),
        Plot::Cells(cells) => draw_cells(root, &chart.frame, cells, scale),
        Plot::Histogram(histogram) => draw_histogram(root, &chart.frame, histogram, scale),
        Plot::Curves(curves) => draw_curves(root, &chart.frame, curves, scale),
    }
}

fn build_chart<'a, DB: DrawingBackend>(
    root: &'a DrawingArea<DB, Shift>,
    frame: &ChartFrame,
    x: Range<f64>,
    y: Range<f64>,
    scale: f64,
) -> crate::Result<Chart<'a, DB>> {
    let x_area = if frame.rotate_x_labels { 120.0 } else { 60.0 };
    let chart = ChartBuilder::on(root)
        .caption(&frame.title, ("sans-serif", 30.0 * scale))
        .margin((15.0 * scale) as u32)
        .x_label_area_size((x_area * scale) as u32)
        .y_label_area_size((70.0 * scale) as u32)
        .build_cartesian_2d(x, y)?;
    Ok(chart)
}

/// Axis descriptions and tick labels; categorical axes label integer positions
fn configure_axes<DB: DrawingBackend>(
    chart: &mut Chart<'_, DB>,
    frame: &ChartFrame,
    x_categories: Option<&[String]>,
    y_categories: Option<&[String]>,
    scale: f64,
) -> crate::Result<()> {
    let tick_font = ("sans-serif", 13.0 * scale).into_font();
    let x_style: TextStyle = if frame.rotate_x_labels {
        tick_font.clone().transform(FontTransform::Rotate90).into()
    } else {
        tick_font.clone().into()
    };

    let format_x = |v: &f64| match x_categories {
        Some(labels) => category_label(labels, *v),
        None => format_number(*v),
    };
    let format_y = |v: &f64| match y_categories {
        Some(labels) => category_label(labels, *v),
        None => format_number(*v),
    };

    let mut mesh = chart.configure_mesh();
    mesh.x_desc(frame.x_label.as_str())
        .y_desc(frame.y_label.as_str())
        .axis_desc_style(("sans-serif", 16.0 * scale))
        .x_label_style(x_style)
        .y_label_style(tick_font)
        .x_label_formatter(&format_x)
        .y_label_formatter(&format_y)
        .light_line_style(WHITE);
    if let Some(labels) = x_categories {
        mesh.x_labels(labels.len().max(1)).disable_x_mesh();
    }
    if let Some(labels) = y_categories {
        mesh.y_labels(labels.len().max(1)).disable_y_mesh();
    }
    mesh.draw()?;
    Ok(())
}

fn draw_legend<'a, DB: DrawingBackend + 'a>(chart: &mut Chart<'a, DB>, scale: f64) -> crate::Result<()> {
    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .label_font(("sans-serif", 13.0 * scale))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

fn category_label(labels: &[String], value: f64) -> String {
    let idx = value.round();
    if (value - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

fn format_number(value: f64) -> String {
    if value.fract().abs() < 1e-9 {
        format!("{:.0}", value)
    } else {
        let text = format!("{:.2}", value);
        text.trim_end_matches('0').to_string()
    }
}

fn categorical_x(categories: usize) -> Range<f64> {
    -0.5..(categories.max(1) as f64 - 0.5)
}

fn y_span(low: f64, high: f64) -> Range<f64> {
    let (low, high) = super::padded_range(low, high, 0.05);
    low..high
}

fn draw_bars<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    frame: &ChartFrame,
    bars: &BarGeometry,
    scale: f64,
) -> crate::Result<()> {
    let top = bars
        .series
        .iter()
        .flat_map(|s| s.values.iter().copied())
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);
    let top = if top > 0.0 { top * 1.1 } else { 1.0 };

    let mut chart = build_chart(root, frame, categorical_x(bars.categories.len()), 0.0..top, scale)?;
    configure_axes(&mut chart, frame, Some(&bars.categories), None, scale)?;

    let width = 0.8 / bars.series.len().max(1) as f64;
    for (j, series) in bars.series.iter().enumerate() {
        let offset = -0.4 + width * j as f64;
        let rects = series
            .values
            .iter()
            .zip(series.colors.iter())
            .enumerate()
            .filter(|(_, (v, _))| v.is_finite())
            .map(|(i, (v, color))| {
                let x0 = i as f64 + offset;
                Rectangle::new([(x0, 0.0), (x0 + width, *v)], color.filled())
            });
        let anno = chart.draw_series(rects)?;
        if bars.legend {
            let color = series.colors.first().copied().unwrap_or(BLACK);
            anno.label(series.name.clone())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }
    }

    if bars.legend {
        draw_legend(&mut chart, scale)?;
    }
    Ok(())
}

fn draw_boxes<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    frame: &ChartFrame,
    boxes: &BoxGeometry,
    scale: f64,
) -> crate::Result<()> {
    let low = boxes
        .boxes
        .iter()
        .flat_map(|q| q.outliers.iter().copied().chain([q.lower_whisker]))
        .fold(f64::INFINITY, f64::min);
    let high = boxes
        .boxes
        .iter()
        .flat_map(|q| q.outliers.iter().copied().chain([q.upper_whisker]))
        .fold(f64::NEG_INFINITY, f64::max);

    let mut chart = build_chart(root, frame, categorical_x(boxes.categories.len()), y_span(low, high), scale)?;
    configure_axes(&mut chart, frame, Some(&boxes.categories), None, scale)?;

    let outline = BLACK.stroke_width(1);
    let radius = (3.0 * scale).round() as i32;
    for (i, (q, color)) in boxes.boxes.iter().zip(boxes.colors.iter()).enumerate() {
        let x = i as f64;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - 0.3, q.q1), (x + 0.3, q.q3)],
            color.filled(),
        )))?;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - 0.3, q.q1), (x + 0.3, q.q3)],
            outline,
        )))?;
        chart.draw_series(
            [
                vec![(x - 0.3, q.median), (x + 0.3, q.median)],
                vec![(x, q.q3), (x, q.upper_whisker)],
                vec![(x, q.q1), (x, q.lower_whisker)],
                vec![(x - 0.15, q.upper_whisker), (x + 0.15, q.upper_whisker)],
                vec![(x - 0.15, q.lower_whisker), (x + 0.15, q.lower_whisker)],
            ]
            .into_iter()
            .map(|path| PathElement::new(path, outline)),
        )?;
        chart.draw_series(
            q.outliers
                .iter()
                .map(|y| Circle::new((x, *y), radius, BLACK.stroke_width(1))),
        )?;
    }
    Ok(())
}

fn draw_violins<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    frame: &ChartFrame,
    violins: &ViolinGeometry,
    scale: f64,
) -> crate::Result<()> {
    let ys = violins
        .violins
        .iter()
        .flat_map(|v| v.outline.iter().map(|(y, _)| *y).chain([v.quartiles.lower_whisker, v.quartiles.upper_whisker]));
    let (low, high) = ys.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| (lo.min(y), hi.max(y)));

    let mut chart = build_chart(root, frame, categorical_x(violins.categories.len()), y_span(low, high), scale)?;
    configure_axes(&mut chart, frame, Some(&violins.categories), None, scale)?;

    for (i, (violin, color)) in violins.violins.iter().zip(violins.colors.iter()).enumerate() {
        let x = i as f64;
        let mut shape: Vec<(f64, f64)> = violin.outline.iter().map(|(y, w)| (x + w, *y)).collect();
        shape.extend(violin.outline.iter().rev().map(|(y, w)| (x - w, *y)));

        if shape.len() > 2 {
            chart.draw_series(std::iter::once(Polygon::new(shape.clone(), color.mix(0.8).filled())))?;
            let start = shape[0];
            let mut closed = shape;
            closed.push(start);
            chart.draw_series(std::iter::once(PathElement::new(closed, BLACK.stroke_width(1))))?;
        }

        let q = &violin.quartiles;
        match violins.inner {
            ViolinInner::Box => {
                chart.draw_series(std::iter::once(PathElement::new(
                    vec![(x, q.lower_whisker), (x, q.upper_whisker)],
                    BLACK.stroke_width(1),
                )))?;
                chart.draw_series(std::iter::once(Rectangle::new(
                    [(x - 0.03, q.q1), (x + 0.03, q.q3)],
                    BLACK.filled(),
                )))?;
                chart.draw_series(std::iter::once(Circle::new(
                    (x, q.median),
                    (3.0 * scale).round() as i32,
                    WHITE.filled(),
                )))?;
            }
            ViolinInner::Quartile => {
                chart.draw_series(violin.quartile_lines.iter().enumerate().map(|(k, (y, w))| {
                    let weight = if k == 1 { 2 } else { 1 };
                    PathElement::new(vec![(x - w, *y), (x + w, *y)], BLACK.stroke_width(weight))
                }))?;
            }
            ViolinInner::None => {}
        }
    }
    Ok(())
}

fn draw_points<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    frame: &ChartFrame,
    points: &PointsGeometry,
    scale: f64,
) -> crate::Result<()> {
    let (x0, x1) = points.x_range;
    let (y0, y1) = points.y_range;
    let mut chart = build_chart(root, frame, x0..x1, y0..y1, scale)?;
    configure_axes(&mut chart, frame, None, None, scale)?;

    let mut legend = false;
    for group in &points.groups {
        let color = group.color;
        let style = color.mix(group.alpha).filled();
        let anno = chart.draw_series(group.points.iter().map(|p| {
            Circle::new((p.x, p.y), (p.radius * scale).round().max(1.0) as i32, style)
        }))?;
        if let Some(name) = &group.name {
            legend = true;
            anno.label(name.clone())
                .legend(move |(x, y)| Circle::new((x + 5, y), 4, color.filled()));
        }
        if group.outlined {
            chart.draw_series(group.points.iter().map(|p| {
                Circle::new((p.x, p.y), (p.radius * scale).round().max(1.0) as i32, BLACK.stroke_width(1))
            }))?;
        }
    }

    for line in &points.lines {
        let color = line.color;
        let style = color.mix(line.alpha).stroke_width(line.width);
        let anno = chart.draw_series(LineSeries::new(line.points.iter().copied(), style))?;
        if let Some(name) = &line.name {
            legend = true;
            anno.label(name.clone())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 15, y)], color.stroke_width(2)));
        }
    }

    if legend {
        draw_legend(&mut chart, scale)?;
    }
    Ok(())
}

fn draw_cells<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    frame: &ChartFrame,
    cells: &HeatmapGeometry,
    scale: f64,
) -> crate::Result<()> {
    let mut chart = build_chart(
        root,
        frame,
        categorical_x(cells.x_labels.len()),
        categorical_x(cells.y_labels.len()),
        scale,
    )?;
    configure_axes(&mut chart, frame, Some(&cells.x_labels), Some(&cells.y_labels), scale)?;

    let (low, high) = cells.value_range;
    let span = if high > low { high - low } else { 1.0 };
    let annotation = ("sans-serif", 13.0 * scale)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));

    for (row, values) in cells.cells.iter().enumerate() {
        for (col, value) in values.iter().enumerate() {
            let Some(value) = value else { continue };
            let (x, y) = (col as f64, row as f64);
            let color = cells.palette.sample((value - low) / span);
            chart.draw_series(std::iter::once(Rectangle::new(
                [(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)],
                color.filled(),
            )))?;
            if cells.annotate {
                chart.draw_series(std::iter::once(Text::new(
                    format!("{:.2}", value),
                    (x, y),
                    annotation.clone(),
                )))?;
            }
        }
    }
    Ok(())
}

fn draw_histogram<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    frame: &ChartFrame,
    histogram: &HistogramGeometry,
    scale: f64,
) -> crate::Result<()> {
    let first = histogram.edges.first().copied().unwrap_or(0.0);
    let last = histogram.edges.last().copied().unwrap_or(1.0);
    let top = histogram
        .counts
        .iter()
        .map(|c| *c as f64)
        .chain(histogram.density.iter().flatten().map(|(_, d)| *d))
        .fold(0.0_f64, f64::max);
    let top = if top > 0.0 { top * 1.1 } else { 1.0 };

    let mut chart = build_chart(root, frame, first..last, 0.0..top, scale)?;
    configure_axes(&mut chart, frame, None, None, scale)?;

    let bars: Vec<[(f64, f64); 2]> = histogram
        .edges
        .windows(2)
        .zip(histogram.counts.iter())
        .map(|(pair, count)| [(pair[0], 0.0), (pair[1], *count as f64)])
        .collect();
    chart.draw_series(
        bars.iter()
            .map(|corners| Rectangle::new(*corners, histogram.color.filled())),
    )?;
    chart.draw_series(
        bars.iter()
            .map(|corners| Rectangle::new(*corners, BLACK.stroke_width(1))),
    )?;

    if let Some(density) = &histogram.density {
        let color = histogram.color;
        chart.draw_series(LineSeries::new(
            density.iter().copied(),
            RGBColor(color.0 / 2, color.1 / 2, color.2 / 2).stroke_width(2),
        ))?;
    }
    Ok(())
}

fn draw_curves<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    frame: &ChartFrame,
    curves: &CurveGeometry,
    scale: f64,
) -> crate::Result<()> {
    let (x0, x1) = curves
        .curves
        .iter()
        .flat_map(|c| c.points.iter().map(|(x, _)| *x))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| (lo.min(x), hi.max(x)));
    let (x0, x1) = super::padded_range(x0, x1, 0.0);
    let top = curves
        .curves
        .iter()
        .flat_map(|c| c.points.iter().map(|(_, y)| *y))
        .fold(0.0_f64, f64::max);
    let top = if top > 0.0 { top * 1.1 } else { 1.0 };

    let mut chart = build_chart(root, frame, x0..x1, 0.0..top, scale)?;
    configure_axes(&mut chart, frame, None, None, scale)?;

    for curve in &curves.curves {
        let color = curve.color;
        let anno = if curve.shade {
            chart.draw_series(
                AreaSeries::new(curve.points.iter().copied(), 0.0, color.mix(0.3))
                    .border_style(color.stroke_width(2)),
            )?
        } else {
            chart.draw_series(LineSeries::new(curve.points.iter().copied(), color.stroke_width(2)))?
        };
        anno.label(curve.name.clone())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    if !curves.curves.is_empty() {
        draw_legend(&mut chart, scale)?;
    }
    Ok(())
}
