//! Kernel density curves, one per hue group

use std::collections::BTreeMap;

use tracing::warn;

use super::{ChartFrame, ChartKind, Curve, CurveGeometry, Palette, Plot, RenderedChart, Visualizer};
use crate::data::{Column, GroupKey, Table};
use crate::error::AnalysisError;
use crate::stats::{self, GaussianKde};

const GRID_POINTS: usize = 200;

#[derive(Debug, Clone)]
pub struct KdeEncoding {
    pub x: Column,
    pub hue: Option<Column>,
    pub title: String,
    pub palette: Palette,
    /// Fill the area under each curve
    pub shade: bool,
}

impl KdeEncoding {
    pub fn new(x: Column, title: impl Into<String>) -> Self {
        Self {
            x,
            hue: None,
            title: title.into(),
            palette: Palette::default(),
            shade: false,
        }
    }
}

/// Density plot strategy
#[derive(Debug)]
pub struct KdePlot<'a> {
    data: &'a Table,
    chart: Option<RenderedChart>,
}

impl<'a> KdePlot<'a> {
    pub fn new(data: &'a Table) -> Self {
        Self { data, chart: None }
    }
}

impl Visualizer for KdePlot<'_> {
    type Encoding = KdeEncoding;

    fn create(&mut self, encoding: KdeEncoding) -> crate::Result<&RenderedChart> {
        let mut required = vec![encoding.x];
        required.extend(encoding.hue);
        self.data.require(&required)?;
        if !encoding.x.is_numeric() {
            return Err(AnalysisError::Validation(format!(
                "column '{}' is not numeric",
                encoding.x
            )));
        }

        let mut groups: BTreeMap<Option<GroupKey>, Vec<f64>> = BTreeMap::new();
        for record in self.data.iter() {
            let Some(value) = record.value(encoding.x) else {
                continue;
            };
            match encoding.hue {
                Some(hue) => {
                    if let Some(key) = record.key(hue) {
                        groups.entry(Some(key)).or_default().push(value);
                    }
                }
                None => groups.entry(None).or_default().push(value),
            }
        }

        let total: usize = groups.values().map(Vec::len).sum();
        let colors = encoding.palette.colors(groups.len());
        let fitted: Vec<(String, GaussianKde, f64, _)> = groups
            .into_iter()
            .zip(colors)
            .filter_map(|((key, values), color)| {
                let name = match (&key, encoding.hue) {
                    (Some(key), Some(hue)) => format!("{}: {}", hue.label(), key),
                    _ => encoding.x.label(),
                };
                match GaussianKde::fit(&values) {
                    Some(kde) => Some((name, kde, values.len() as f64 / total as f64, color)),
                    None => {
                        warn!(group = %name, "too few distinct values for a density estimate");
                        None
                    }
                }
            })
            .collect();
        if fitted.is_empty() {
            return Err(AnalysisError::Validation(format!(
                "not enough distinct values of '{}' for a density estimate",
                encoding.x
            )));
        }

        let (low, high) = fitted
            .iter()
            .map(|(_, kde, _, _)| kde.support(None))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (a, b)| (lo.min(a), hi.max(b)));
        let grid = stats::linspace(low, high, GRID_POINTS);

        // each curve is weighted by its share of the rows so the areas sum to one
        let curves = fitted
            .into_iter()
            .map(|(name, kde, weight, color)| Curve {
                name,
                color,
                points: grid.iter().map(|x| (*x, kde.density(*x) * weight)).collect(),
                shade: encoding.shade,
            })
            .collect();

        let frame = ChartFrame::new(encoding.title, encoding.x.label(), "Density");
        let plot = Plot::Curves(CurveGeometry { curves });
        Ok(&*self.chart.insert(RenderedChart::new(ChartKind::Kde, frame, plot)))
    }

    fn chart(&self) -> Option<&RenderedChart> {
        self.chart.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::EmployeeRecord;
    use approx::assert_relative_eq;

    fn table() -> Table {
        Table::from_records(
            (0..30)
                .map(|i| EmployeeRecord {
                    last_evaluation: Some(0.4 + f64::from(i % 10) * 0.06),
                    left: i % 3 == 0,
                    ..EmployeeRecord::default()
                })
                .collect(),
        )
    }

    #[test]
    fn test_curves_per_hue_share_total_area() {
        let table = table();
        let mut plot = KdePlot::new(&table);
        let mut encoding = KdeEncoding::new(Column::LastEvaluation, "Last Evaluation Distribution");
        encoding.hue = Some(Column::Left);
        encoding.palette = Palette::Coolwarm;
        encoding.shade = true;

        let rendered = plot.create(encoding).unwrap();
        assert_eq!(rendered.frame.y_label, "Density");
        let Plot::Curves(curves) = &rendered.plot else {
            panic!("expected curves");
        };
        assert_eq!(curves.curves.len(), 2);
        assert_eq!(curves.curves[1].name, "Left: 1");
        assert!(curves.curves.iter().all(|c| c.shade && c.points.len() == GRID_POINTS));

        let step = curves.curves[0].points[1].0 - curves.curves[0].points[0].0;
        let area: f64 = curves
            .curves
            .iter()
            .flat_map(|c| c.points.iter().map(|(_, y)| *y))
            .sum::<f64>()
            * step;
        assert_relative_eq!(area, 1.0, epsilon = 2e-2);
    }

    #[test]
    fn test_constant_values_are_rejected() {
        let table = Table::from_records(vec![
            EmployeeRecord {
                last_evaluation: Some(0.5),
                ..EmployeeRecord::default()
            };
            3
        ]);
        let mut plot = KdePlot::new(&table);
        assert!(matches!(
            plot.create(KdeEncoding::new(Column::LastEvaluation, "t")),
            Err(AnalysisError::Validation(_))
        ));
    }
}
