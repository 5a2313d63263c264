//! Violin plots; a numeric x column is cut into equal-width bins first

use std::collections::BTreeMap;

use super::boxplot::values_by_key;
use super::{ordered_categories, ChartFrame, ChartKind, Palette, Plot, RenderedChart, ViolinGeometry, ViolinShape, Visualizer};
use crate::config::VISUALIZATION_DEFAULTS;
use crate::data::{Column, Table};
use crate::error::AnalysisError;
use crate::stats::{self, EqualWidthBins, GaussianKde, Quartiles};

const MAX_HALF_WIDTH: f64 = 0.4;
const OUTLINE_POINTS: usize = 60;

/// What is drawn inside each violin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViolinInner {
    #[default]
    Box,
    Quartile,
    None,
}

#[derive(Debug, Clone)]
pub struct ViolinEncoding {
    pub x: Column,
    pub y: Column,
    pub title: String,
    pub palette: Palette,
    pub order: Vec<String>,
    pub rotation: u32,
    pub inner: ViolinInner,
    /// Bin count used when x is numeric
    pub bins: usize,
}

impl ViolinEncoding {
    pub fn new(x: Column, y: Column, title: impl Into<String>) -> Self {
        Self {
            x,
            y,
            title: title.into(),
            palette: Palette::default(),
            order: Vec::new(),
            rotation: VISUALIZATION_DEFAULTS.rotation,
            inner: ViolinInner::default(),
            bins: 5,
        }
    }
}

/// Violin plot strategy
#[derive(Debug)]
pub struct ViolinPlot<'a> {
    data: &'a Table,
    chart: Option<RenderedChart>,
}

impl<'a> ViolinPlot<'a> {
    pub fn new(data: &'a Table) -> Self {
        Self { data, chart: None }
    }

    /// Values of `y` per bin of `x`, bins labeled "1".."N"
    fn binned_groups(&self, x: Column, y: Column, bins: usize) -> crate::Result<Vec<(String, Vec<f64>)>> {
        let x_values = self.data.numeric_values(x)?;
        self.data.require(&[y])?;
        if !y.is_numeric() {
            return Err(AnalysisError::Validation(format!("column '{}' is not numeric", y)));
        }
        let Some(edges) = EqualWidthBins::from_values(&x_values, bins) else {
            return Ok(Vec::new());
        };

        let mut groups: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
        for record in self.data.iter() {
            let (Some(xv), Some(yv)) = (record.value(x), record.value(y)) else {
                continue;
            };
            if let Some(idx) = edges.index_of(xv) {
                groups.entry(idx).or_default().push(yv);
            }
        }
        Ok(groups
            .into_iter()
            .map(|(idx, values)| ((idx + 1).to_string(), values))
            .collect())
    }
}

fn violin_shape(values: &[f64]) -> Option<ViolinShape> {
    let quartiles = Quartiles::from_values(values)?;
    let marks = [quartiles.q1, quartiles.median, quartiles.q3];

    let Some(kde) = GaussianKde::fit(values) else {
        return Some(ViolinShape {
            outline: Vec::new(),
            quartile_lines: marks.iter().map(|y| (*y, MAX_HALF_WIDTH / 2.0)).collect(),
            quartiles,
        });
    };

    let (min, max) = stats::min_max(values)?;
    let bandwidth = kde.bandwidth();
    let grid = stats::linspace(min - 2.0 * bandwidth, max + 2.0 * bandwidth, OUTLINE_POINTS);
    let densities = kde.evaluate(&grid);
    let peak = densities.iter().copied().fold(0.0_f64, f64::max);
    let width = |density: f64| {
        if peak > 0.0 {
            MAX_HALF_WIDTH * density / peak
        } else {
            0.0
        }
    };

    Some(ViolinShape {
        outline: grid
            .iter()
            .zip(densities.iter())
            .map(|(y, d)| (*y, width(*d)))
            .collect(),
        quartile_lines: marks.iter().map(|y| (*y, width(kde.density(*y)))).collect(),
        quartiles,
    })
}

impl Visualizer for ViolinPlot<'_> {
    type Encoding = ViolinEncoding;

    fn create(&mut self, encoding: ViolinEncoding) -> crate::Result<&RenderedChart> {
        let (groups, x_label) = if encoding.x.is_numeric() {
            (
                self.binned_groups(encoding.x, encoding.y, encoding.bins.max(1))?,
                format!("{} Bins", encoding.x.label()),
            )
        } else {
            let groups = values_by_key(self.data, encoding.x, encoding.y)?
                .into_iter()
                .map(|(key, values)| (key.to_string(), values))
                .collect();
            (groups, encoding.x.label())
        };

        let shapes: Vec<(String, ViolinShape)> = groups
            .into_iter()
            .filter_map(|(label, values)| violin_shape(&values).map(|shape| (label, shape)))
            .collect();
        let natural = shapes.iter().map(|(label, _)| label.clone()).collect();
        let categories = ordered_categories(natural, &encoding.order);
        if categories.is_empty() {
            return Err(AnalysisError::Validation(format!(
                "no values of '{}' to plot",
                encoding.y
            )));
        }

        let violins: Vec<ViolinShape> = categories
            .iter()
            .filter_map(|label| {
                shapes
                    .iter()
                    .find(|(group, _)| group == label)
                    .map(|(_, shape)| shape.clone())
            })
            .collect();
        let colors = encoding.palette.colors(categories.len());
        let frame = ChartFrame::new(encoding.title, x_label, encoding.y.label())
            .with_rotation(encoding.rotation, categories.len());

        let plot = Plot::Violins(ViolinGeometry {
            categories,
            violins,
            colors,
            inner: encoding.inner,
        });
        Ok(&*self.chart.insert(RenderedChart::new(ChartKind::Violin, frame, plot)))
    }

    fn chart(&self) -> Option<&RenderedChart> {
        self.chart.as_ref()
    }
}
