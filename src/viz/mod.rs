//! Chart strategies sharing a create / export / present contract
//!
//! Each strategy turns its input into a [`RenderedChart`]: backend-independent
//! geometry that is drawn with plotters only when exported or presented.

use std::fs;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::config::VISUALIZATION_DEFAULTS;
use crate::error::AnalysisError;
use crate::stats::Quartiles;

pub mod bar;
pub mod boxplot;
pub mod cluster;
pub mod heatmap;
pub mod histogram;
pub mod kde;
pub mod palette;
mod render;
pub mod scatter;
pub mod violin;

pub use bar::{BarChart, BarEncoding};
pub use boxplot::{BoxPlot, CategoricalEncoding};
pub use cluster::{ClusterEncoding, ClusterPlot};
pub use heatmap::{BinnedFrame, Heatmap, HeatmapEncoding};
pub use histogram::{HistogramEncoding, HistogramPlot};
pub use kde::{KdeEncoding, KdePlot};
pub use palette::Palette;
pub use scatter::{Highlight, ScatterEncoding, ScatterPlot, ThresholdLines};
pub use violin::{ViolinEncoding, ViolinInner, ViolinPlot};

/// Chart strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    Box,
    Violin,
    Scatter,
    Heatmap,
    Histogram,
    Kde,
    Cluster,
}

/// Caption and axis descriptions
#[derive(Debug, Clone, PartialEq)]
pub struct ChartFrame {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Tick labels on a crowded categorical axis are drawn vertically
    pub rotate_x_labels: bool,
}

impl ChartFrame {
    pub fn new(title: impl Into<String>, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            rotate_x_labels: false,
        }
    }

    /// Rotate only when a rotation was requested and there are more than five categories
    pub fn with_rotation(mut self, rotation: u32, categories: usize) -> Self {
        self.rotate_x_labels = rotation > 0 && categories > 5;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    pub name: String,
    /// One value per category, NaN where the group has none
    pub values: Vec<f64>,
    /// One color per bar
    pub colors: Vec<RGBColor>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarGeometry {
    pub categories: Vec<String>,
    pub series: Vec<BarSeries>,
    pub legend: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxGeometry {
    pub categories: Vec<String>,
    pub boxes: Vec<Quartiles>,
    pub colors: Vec<RGBColor>,
}

/// Mirrored density outline of one category
#[derive(Debug, Clone, PartialEq)]
pub struct ViolinShape {
    /// (y, half width) pairs from bottom to top
    pub outline: Vec<(f64, f64)>,
    pub quartiles: Quartiles,
    /// (y, half width) of the quartile lines: q1, median, q3
    pub quartile_lines: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViolinGeometry {
    pub categories: Vec<String>,
    pub violins: Vec<ViolinShape>,
    pub colors: Vec<RGBColor>,
    pub inner: ViolinInner,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    /// Marker radius in pixels at 100 dpi
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointGroup {
    /// Legend entry, `None` keeps the group out of the legend
    pub name: Option<String>,
    pub color: RGBColor,
    pub alpha: f64,
    /// Outline markers in black
    pub outlined: bool,
    pub points: Vec<ScatterPoint>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineOverlay {
    pub name: Option<String>,
    pub color: RGBColor,
    pub alpha: f64,
    pub width: u32,
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointsGeometry {
    pub groups: Vec<PointGroup>,
    pub lines: Vec<LineOverlay>,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
}

impl PointsGeometry {
    pub fn point_count(&self) -> usize {
        self.groups.iter().map(|g| g.points.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapGeometry {
    pub x_labels: Vec<String>,
    pub y_labels: Vec<String>,
    /// Row per y label, column per x label
    pub cells: Vec<Vec<Option<f64>>>,
    pub palette: Palette,
    pub value_range: (f64, f64),
    pub annotate: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramGeometry {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
    pub color: RGBColor,
    /// Density curve scaled to counts
    pub density: Option<Vec<(f64, f64)>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    pub name: String,
    pub color: RGBColor,
    pub points: Vec<(f64, f64)>,
    pub shade: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurveGeometry {
    pub curves: Vec<Curve>,
}

/// Drawable content of a chart
#[derive(Debug, Clone, PartialEq)]
pub enum Plot {
    Bars(BarGeometry),
    Boxes(BoxGeometry),
    Violins(ViolinGeometry),
    Points(PointsGeometry),
    Cells(HeatmapGeometry),
    Histogram(HistogramGeometry),
    Curves(CurveGeometry),
}

/// A created chart, ready to be exported or presented
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedChart {
    pub kind: ChartKind,
    pub frame: ChartFrame,
    pub plot: Plot,
    /// Figure size in inches
    pub figure_size: (u32, u32),
    pub dpi: u32,
}

impl RenderedChart {
    pub fn new(kind: ChartKind, frame: ChartFrame, plot: Plot) -> Self {
        Self {
            kind,
            frame,
            plot,
            figure_size: VISUALIZATION_DEFAULTS.figure_size,
            dpi: VISUALIZATION_DEFAULTS.dpi,
        }
    }

    /// Pixel dimensions at the given resolution
    pub fn pixel_size(&self, dpi: u32) -> (u32, u32) {
        (self.figure_size.0 * dpi, self.figure_size.1 * dpi)
    }

    /// Write the chart as PNG, or SVG when the path ends in `.svg`
    ///
    /// Parent directories are created as needed.
    pub fn export(&self, path: impl AsRef<Path>, resolution: Option<u32>) -> crate::Result<PathBuf> {
        let path = path.as_ref();
        let dpi = resolution.unwrap_or(self.dpi).max(1);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let size = self.pixel_size(dpi);
        let scale = f64::from(dpi) / 100.0;
        let is_svg = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));

        if is_svg {
            let root = SVGBackend::new(path, size).into_drawing_area();
            render::draw(self, &root, scale)?;
            root.present()?;
        } else {
            let root = BitMapBackend::new(path, size).into_drawing_area();
            render::draw(self, &root, scale)?;
            root.present()?;
        }

        info!(path = %path.display(), dpi, kind = ?self.kind, "chart exported");
        Ok(path.to_path_buf())
    }

    /// SVG document of the chart at its own resolution
    pub fn to_svg(&self) -> crate::Result<String> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, self.pixel_size(self.dpi)).into_drawing_area();
            render::draw(self, &root, f64::from(self.dpi) / 100.0)?;
            root.present()?;
        }
        Ok(svg)
    }
}

/// Shared contract of every chart strategy
pub trait Visualizer {
    type Encoding;

    /// Build the chart from the strategy's data and the given encoding
    fn create(&mut self, encoding: Self::Encoding) -> crate::Result<&RenderedChart>;

    /// The last created chart, if any
    fn chart(&self) -> Option<&RenderedChart>;

    /// Save the chart; `resolution` overrides the default dpi
    fn export(&self, path: impl AsRef<Path>, resolution: Option<u32>) -> crate::Result<PathBuf> {
        self.chart()
            .ok_or_else(AnalysisError::no_chart)?
            .export(path, resolution)
    }

    /// SVG markup for embedding in a host page
    fn present(&self) -> crate::Result<String> {
        self.chart().ok_or_else(AnalysisError::no_chart)?.to_svg()
    }
}

/// Requested categories first, then any others in their natural order
pub(crate) fn ordered_categories(natural: Vec<String>, order: &[String]) -> Vec<String> {
    let mut ordered: Vec<String> = order
        .iter()
        .filter(|label| natural.contains(label))
        .cloned()
        .collect();
    ordered.extend(natural.into_iter().filter(|label| !order.contains(label)));
    ordered
}

/// Range with `frac` padding on both sides; degenerate ranges widen by 0.5
pub(crate) fn padded_range(low: f64, high: f64, frac: f64) -> (f64, f64) {
    if !low.is_finite() || !high.is_finite() {
        return (0.0, 1.0);
    }
    if high - low < f64::EPSILON {
        return (low - 0.5, high + 0.5);
    }
    let pad = (high - low) * frac;
    (low - pad, high + pad)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_categories() {
        let natural = vec!["high".to_string(), "low".to_string(), "medium".to_string()];
        let order = vec!["low".to_string(), "medium".to_string(), "high".to_string()];
        assert_eq!(ordered_categories(natural.clone(), &order), order);

        let partial = vec!["medium".to_string(), "missing".to_string()];
        assert_eq!(
            ordered_categories(natural, &partial),
            vec!["medium", "high", "low"]
        );
    }

    #[test]
    fn test_rotation_needs_crowded_axis() {
        let frame = ChartFrame::new("t", "x", "y");
        assert!(!frame.clone().with_rotation(45, 5).rotate_x_labels);
        assert!(frame.clone().with_rotation(45, 10).rotate_x_labels);
        assert!(!frame.with_rotation(0, 10).rotate_x_labels);
    }

    #[test]
    fn test_padded_range() {
        assert_eq!(padded_range(0.0, 10.0, 0.1), (-1.0, 11.0));
        assert_eq!(padded_range(2.0, 2.0, 0.1), (1.5, 2.5));
        assert_eq!(padded_range(f64::NAN, 1.0, 0.1), (0.0, 1.0));
    }
}
