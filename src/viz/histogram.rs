//! Histograms with an optional density overlay

use plotters::style::RGBColor;

use super::palette::SKY_BLUE;
use super::{ChartFrame, ChartKind, HistogramGeometry, Plot, RenderedChart, Visualizer};
use crate::data::{Column, Table};
use crate::error::AnalysisError;
use crate::stats::{self, EqualWidthBins, GaussianKde};

const DENSITY_POINTS: usize = 200;

#[derive(Debug, Clone)]
pub struct HistogramEncoding {
    pub column: Column,
    pub title: String,
    pub bins: usize,
    /// Overlay a kernel density estimate scaled to the bar heights
    pub kde: bool,
    pub color: RGBColor,
}

impl HistogramEncoding {
    pub fn new(column: Column, title: impl Into<String>) -> Self {
        Self {
            column,
            title: title.into(),
            bins: 20,
            kde: false,
            color: SKY_BLUE,
        }
    }
}

/// Histogram strategy
#[derive(Debug)]
pub struct HistogramPlot<'a> {
    data: &'a Table,
    chart: Option<RenderedChart>,
}

impl<'a> HistogramPlot<'a> {
    pub fn new(data: &'a Table) -> Self {
        Self { data, chart: None }
    }
}

impl Visualizer for HistogramPlot<'_> {
    type Encoding = HistogramEncoding;

    fn create(&mut self, encoding: HistogramEncoding) -> crate::Result<&RenderedChart> {
        let values = self.data.numeric_values(encoding.column)?;
        let (min, max) = stats::min_max(&values).ok_or_else(|| {
            AnalysisError::Validation(format!("no values of '{}' to plot", encoding.column))
        })?;
        let bins = EqualWidthBins::new(min, max, encoding.bins.max(1));
        let counts = bins.counts(&values);

        // counts per unit x: n * bin width times the density
        let density = if encoding.kde {
            GaussianKde::fit(&values).map(|kde| {
                let scale = values.len() as f64 * bins.width();
                let edges = bins.edges();
                let grid = stats::linspace(edges[0], edges[edges.len() - 1], DENSITY_POINTS);
                grid.iter().map(|x| (*x, kde.density(*x) * scale)).collect()
            })
        } else {
            None
        };

        let frame = ChartFrame::new(encoding.title, encoding.column.label(), "Frequency");
        let plot = Plot::Histogram(HistogramGeometry {
            edges: bins.edges().to_vec(),
            counts,
            color: encoding.color,
            density,
        });
        Ok(&*self.chart.insert(RenderedChart::new(ChartKind::Histogram, frame, plot)))
    }

    fn chart(&self) -> Option<&RenderedChart> {
        self.chart.as_ref()
    }
}
