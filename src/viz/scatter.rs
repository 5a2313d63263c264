//! Scatter plots with optional hue, marker size, trend line, threshold lines
//! and a highlighted subset

use std::collections::BTreeMap;

use super::palette::HIGHLIGHT_RED;
use super::{padded_range, ChartFrame, ChartKind, LineOverlay, Palette, Plot, PointGroup, PointsGeometry, RenderedChart, ScatterPoint, Visualizer};
use crate::config::VISUALIZATION_DEFAULTS;
use crate::data::{Column, EmployeeRecord, GroupKey, Table};
use crate::error::AnalysisError;
use crate::stats::{self, LineFit};

const MIN_RADIUS: f64 = 2.0;
const MAX_RADIUS: f64 = 9.0;
const DEFAULT_RADIUS: f64 = 4.0;

/// Reference lines drawn across the whole plot
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ThresholdLines {
    pub horizontal: Option<f64>,
    pub vertical: Option<f64>,
}

/// Subset drawn on top in red with its own legend entry
#[derive(Debug, Clone)]
pub struct Highlight {
    pub label: String,
    pub records: Table,
}

#[derive(Debug, Clone)]
pub struct ScatterEncoding {
    pub x: Column,
    pub y: Column,
    pub title: String,
    pub hue: Option<Column>,
    pub size: Option<Column>,
    pub alpha: f64,
    pub palette: Palette,
    /// Least-squares trend line over every plotted point
    pub regression: bool,
    pub thresholds: ThresholdLines,
    pub highlight: Option<Highlight>,
}

impl ScatterEncoding {
    pub fn new(x: Column, y: Column, title: impl Into<String>) -> Self {
        Self {
            x,
            y,
            title: title.into(),
            hue: None,
            size: None,
            alpha: VISUALIZATION_DEFAULTS.alpha,
            palette: Palette::default(),
            regression: false,
            thresholds: ThresholdLines::default(),
            highlight: None,
        }
    }
}

/// Maps a size column onto marker radii
struct SizeScale {
    column: Option<Column>,
    range: Option<(f64, f64)>,
}

impl SizeScale {
    fn new(table: &Table, column: Option<Column>) -> Self {
        let range = column.and_then(|c| {
            let values: Vec<f64> = table.iter().filter_map(|r| r.value(c)).collect();
            stats::min_max(&values)
        });
        Self { column, range }
    }

    fn radius(&self, record: &EmployeeRecord) -> f64 {
        match (self.column.and_then(|c| record.value(c)), self.range) {
            (Some(v), Some((lo, hi))) if hi > lo => {
                MIN_RADIUS + (MAX_RADIUS - MIN_RADIUS) * (v - lo) / (hi - lo)
            }
            _ => DEFAULT_RADIUS,
        }
    }
}

/// Scatter plot strategy
#[derive(Debug)]
pub struct ScatterPlot<'a> {
    data: &'a Table,
    chart: Option<RenderedChart>,
}

impl<'a> ScatterPlot<'a> {
    pub fn new(data: &'a Table) -> Self {
        Self { data, chart: None }
    }
}

fn points_of<'r>(
    records: impl Iterator<Item = &'r EmployeeRecord>,
    x: Column,
    y: Column,
    sizes: &SizeScale,
) -> Vec<ScatterPoint> {
    records
        .filter_map(|record| {
            Some(ScatterPoint {
                x: record.value(x)?,
                y: record.value(y)?,
                radius: sizes.radius(record),
            })
        })
        .collect()
}

impl Visualizer for ScatterPlot<'_> {
    type Encoding = ScatterEncoding;

    fn create(&mut self, encoding: ScatterEncoding) -> crate::Result<&RenderedChart> {
        let mut required = vec![encoding.x, encoding.y];
        required.extend(encoding.hue);
        required.extend(encoding.size);
        self.data.require(&required)?;
        if let Some(bad) = [Some(encoding.x), Some(encoding.y), encoding.size]
            .into_iter()
            .flatten()
            .find(|c| !c.is_numeric())
        {
            return Err(AnalysisError::Validation(format!(
                "column '{}' is not numeric",
                bad
            )));
        }

        let sizes = SizeScale::new(self.data, encoding.size);
        let mut groups = match encoding.hue {
            Some(hue) => {
                let mut by_key: BTreeMap<GroupKey, Vec<&EmployeeRecord>> = BTreeMap::new();
                for record in self.data.iter() {
                    if let Some(key) = record.key(hue) {
                        by_key.entry(key).or_default().push(record);
                    }
                }
                let colors = encoding.palette.colors(by_key.len());
                by_key
                    .into_iter()
                    .zip(colors)
                    .map(|((key, records), color)| PointGroup {
                        name: Some(format!("{}: {}", hue.label(), key)),
                        color,
                        alpha: encoding.alpha,
                        outlined: false,
                        points: points_of(records.into_iter(), encoding.x, encoding.y, &sizes),
                    })
                    .collect::<Vec<_>>()
            }
            None => vec![PointGroup {
                name: None,
                color: encoding.palette.colors(1)[0],
                alpha: encoding.alpha,
                outlined: false,
                points: points_of(self.data.iter(), encoding.x, encoding.y, &sizes),
            }],
        };

        if let Some(highlight) = &encoding.highlight {
            let points = points_of(highlight.records.iter(), encoding.x, encoding.y, &sizes);
            if !points.is_empty() {
                groups.push(PointGroup {
                    name: Some(highlight.label.clone()),
                    color: HIGHLIGHT_RED,
                    alpha: 1.0,
                    outlined: true,
                    points,
                });
            }
        }

        let all_points: Vec<(f64, f64)> = groups
            .iter()
            .flat_map(|g| g.points.iter().map(|p| (p.x, p.y)))
            .collect();
        if all_points.is_empty() {
            return Err(AnalysisError::Validation(format!(
                "no rows with both '{}' and '{}' to plot",
                encoding.x, encoding.y
            )));
        }

        let xs: Vec<f64> = all_points.iter().map(|p| p.0).chain(encoding.thresholds.vertical).collect();
        let ys: Vec<f64> = all_points.iter().map(|p| p.1).chain(encoding.thresholds.horizontal).collect();
        let (x_min, x_max) = stats::min_max(&xs).unwrap_or((0.0, 1.0));
        let (y_min, y_max) = stats::min_max(&ys).unwrap_or((0.0, 1.0));
        let x_range = padded_range(x_min, x_max, 0.05);
        let y_range = padded_range(y_min, y_max, 0.05);

        let mut lines = Vec::new();
        if encoding.regression {
            if let Some(fit) = LineFit::fit(&all_points) {
                lines.push(LineOverlay {
                    name: Some("Trend".to_string()),
                    color: HIGHLIGHT_RED,
                    alpha: 1.0,
                    width: 2,
                    points: vec![(x_min, fit.at(x_min)), (x_max, fit.at(x_max))],
                });
            }
        }
        if let Some(y) = encoding.thresholds.horizontal {
            lines.push(threshold_line(vec![(x_range.0, y), (x_range.1, y)]));
        }
        if let Some(x) = encoding.thresholds.vertical {
            lines.push(threshold_line(vec![(x, y_range.0), (x, y_range.1)]));
        }

        let frame = ChartFrame::new(encoding.title, encoding.x.label(), encoding.y.label());
        let plot = Plot::Points(PointsGeometry {
            groups,
            lines,
            x_range,
            y_range,
        });
        Ok(&*self.chart.insert(RenderedChart::new(ChartKind::Scatter, frame, plot)))
    }

    fn chart(&self) -> Option<&RenderedChart> {
        self.chart.as_ref()
    }
}

fn threshold_line(points: Vec<(f64, f64)>) -> LineOverlay {
    LineOverlay {
        name: None,
        color: HIGHLIGHT_RED,
        alpha: 0.7,
        width: 1,
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::high_risk_employees;
    use approx::assert_relative_eq;

    fn record(satisfaction: f64, evaluation: f64, projects: u32, hours: u32, left: bool) -> EmployeeRecord {
        EmployeeRecord {
            satisfaction_level: Some(satisfaction),
            last_evaluation: Some(evaluation),
            number_project: Some(projects),
            average_monthly_hours: Some(hours),
            left,
            ..EmployeeRecord::default()
        }
    }

    fn table() -> Table {
        Table::from_records(vec![
            record(0.2, 0.9, 6, 280, true),
            record(0.8, 0.6, 3, 150, false),
            record(0.5, 0.7, 4, 200, false),
            record(0.1, 0.85, 7, 300, true),
        ])
    }

    #[test]
    fn test_hue_groups_and_regression() {
        let table = table();
        let mut plot = ScatterPlot::new(&table);
        let mut encoding = ScatterEncoding::new(Column::NumberProject, Column::SatisfactionLevel, "t");
        encoding.hue = Some(Column::Left);
        encoding.palette = Palette::Coolwarm;
        encoding.regression = true;

        let rendered = plot.create(encoding).unwrap();
        assert_eq!(rendered.frame.x_label, "Number Project");
        let Plot::Points(points) = &rendered.plot else {
            panic!("expected points");
        };
        assert_eq!(points.groups.len(), 2);
        assert_eq!(points.groups[0].name.as_deref(), Some("Left: 0"));
        assert_eq!(points.groups[1].points.len(), 2);
        assert_eq!(points.point_count(), 4);
        assert_eq!(points.lines.len(), 1);
        assert!(points.lines[0].points[0].1 > points.lines[0].points[1].1);
    }

    #[test]
    fn test_size_maps_to_radius_bounds() {
        let table = table();
        let mut plot = ScatterPlot::new(&table);
        let mut encoding = ScatterEncoding::new(Column::LastEvaluation, Column::NumberProject, "t");
        encoding.size = Some(Column::AverageMonthlyHours);

        let rendered = plot.create(encoding).unwrap();
        let Plot::Points(points) = &rendered.plot else {
            panic!("expected points");
        };
        let radii: Vec<f64> = points.groups[0].points.iter().map(|p| p.radius).collect();
        assert_relative_eq!(radii[1], MIN_RADIUS);
        assert_relative_eq!(radii[3], MAX_RADIUS);
    }

    #[test]
    fn test_thresholds_and_highlight() {
        let table = table();
        let mut plot = ScatterPlot::new(&table);
        let mut encoding = ScatterEncoding::new(Column::LastEvaluation, Column::SatisfactionLevel, "t");
        encoding.thresholds = ThresholdLines {
            horizontal: Some(0.4),
            vertical: Some(6.0),
        };
        encoding.highlight = Some(Highlight {
            label: "High Risk".to_string(),
            records: high_risk_employees(&table),
        });

        let rendered = plot.create(encoding).unwrap();
        let Plot::Points(points) = &rendered.plot else {
            panic!("expected points");
        };
        assert_eq!(points.lines.len(), 2);
        assert_eq!(points.lines[0].points[0].1, 0.4);
        assert!(points.x_range.1 > 6.0);

        let highlighted = points.groups.last().unwrap();
        assert_eq!(highlighted.name.as_deref(), Some("High Risk"));
        assert_eq!(highlighted.points.len(), 2);
        assert!(highlighted.outlined);
    }

    #[test]
    fn test_missing_hue_column() {
        let table = Table::new(table().records().to_vec(), [Column::SatisfactionLevel, Column::LastEvaluation], crate::data::LabelSource::Supplied);
        let mut plot = ScatterPlot::new(&table);
        let mut encoding = ScatterEncoding::new(Column::LastEvaluation, Column::SatisfactionLevel, "t");
        encoding.hue = Some(Column::Dept);
        assert!(matches!(plot.create(encoding), Err(AnalysisError::Validation(_))));
    }
}
