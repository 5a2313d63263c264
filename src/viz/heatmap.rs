//! Annotated heatmaps over two binned continuous columns

use super::{ChartFrame, ChartKind, HeatmapGeometry, Palette, Plot, RenderedChart, Visualizer};
use crate::data::{Column, Table};
use crate::error::AnalysisError;
use crate::stats::EqualWidthBins;

/// Mean of a value column per (x bin, y bin) cell
///
/// Bins span each column's observed range; rows and columns without any
/// values are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct BinnedFrame {
    pub x: Column,
    pub y: Column,
    pub value: Column,
    pub x_labels: Vec<String>,
    pub y_labels: Vec<String>,
    /// Row per y bin, column per x bin
    pub cells: Vec<Vec<Option<f64>>>,
}

impl BinnedFrame {
    pub fn from_table(table: &Table, x: Column, y: Column, value: Column, bins: usize) -> crate::Result<Self> {
        table.require(&[x, y, value])?;
        let x_values = table.numeric_values(x)?;
        let y_values = table.numeric_values(y)?;
        if !value.is_numeric() {
            return Err(AnalysisError::Validation(format!(
                "column '{}' is not numeric",
                value
            )));
        }

        let (Some(x_bins), Some(y_bins)) = (
            EqualWidthBins::from_values(&x_values, bins),
            EqualWidthBins::from_values(&y_values, bins),
        ) else {
            return Err(AnalysisError::Validation(format!(
                "no values of '{}' and '{}' to bin",
                x, y
            )));
        };

        let mut sums = vec![vec![(0.0, 0usize); x_bins.len()]; y_bins.len()];
        for record in table.iter() {
            let (Some(xv), Some(yv), Some(v)) = (record.value(x), record.value(y), record.value(value)) else {
                continue;
            };
            if let (Some(col), Some(row)) = (x_bins.index_of(xv), y_bins.index_of(yv)) {
                sums[row][col].0 += v;
                sums[row][col].1 += 1;
            }
        }

        let keep_rows: Vec<usize> = (0..y_bins.len())
            .filter(|row| sums[*row].iter().any(|(_, n)| *n > 0))
            .collect();
        let keep_cols: Vec<usize> = (0..x_bins.len())
            .filter(|col| sums.iter().any(|cells| cells[*col].1 > 0))
            .collect();

        let x_intervals = x_bins.intervals();
        let y_intervals = y_bins.intervals();
        Ok(Self {
            x,
            y,
            value,
            x_labels: keep_cols.iter().map(|c| x_intervals[*c].to_string()).collect(),
            y_labels: keep_rows.iter().map(|r| y_intervals[*r].to_string()).collect(),
            cells: keep_rows
                .iter()
                .map(|row| {
                    keep_cols
                        .iter()
                        .map(|col| {
                            let (sum, n) = sums[*row][*col];
                            (n > 0).then(|| sum / n as f64)
                        })
                        .collect()
                })
                .collect(),
        })
    }

    pub fn get(&self, x_label: &str, y_label: &str) -> Option<f64> {
        let col = self.x_labels.iter().position(|l| l == x_label)?;
        let row = self.y_labels.iter().position(|l| l == y_label)?;
        self.cells[row][col]
    }
}

#[derive(Debug, Clone)]
pub struct HeatmapEncoding {
    pub title: String,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub palette: Palette,
    /// Print each cell's value with two decimals
    pub annotate: bool,
}

impl HeatmapEncoding {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            x_label: None,
            y_label: None,
            palette: Palette::YlOrRd,
            annotate: true,
        }
    }
}

/// Heatmap strategy
#[derive(Debug)]
pub struct Heatmap<'a> {
    data: &'a BinnedFrame,
    chart: Option<RenderedChart>,
}

impl<'a> Heatmap<'a> {
    pub fn new(data: &'a BinnedFrame) -> Self {
        Self { data, chart: None }
    }
}

impl Visualizer for Heatmap<'_> {
    type Encoding = HeatmapEncoding;

    fn create(&mut self, encoding: HeatmapEncoding) -> crate::Result<&RenderedChart> {
        let values: Vec<f64> = self.data.cells.iter().flatten().flatten().copied().collect();
        let value_range = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
        if values.is_empty() {
            return Err(AnalysisError::Validation(
                "heatmap has no populated cells".to_string(),
            ));
        }

        let frame = ChartFrame::new(
            encoding.title,
            encoding.x_label.unwrap_or_else(|| self.data.x.label()),
            encoding.y_label.unwrap_or_else(|| self.data.y.label()),
        );
        let plot = Plot::Cells(HeatmapGeometry {
            x_labels: self.data.x_labels.clone(),
            y_labels: self.data.y_labels.clone(),
            cells: self.data.cells.clone(),
            palette: encoding.palette,
            value_range,
            annotate: encoding.annotate,
        });
        Ok(&*self.chart.insert(RenderedChart::new(ChartKind::Heatmap, frame, plot)))
    }

    fn chart(&self) -> Option<&RenderedChart> {
        self.chart.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::EmployeeRecord;

    fn record(satisfaction: f64, evaluation: f64, left: bool) -> EmployeeRecord {
        EmployeeRecord {
            satisfaction_level: Some(satisfaction),
            last_evaluation: Some(evaluation),
            average_monthly_hours: Some(200),
            left,
            ..EmployeeRecord::default()
        }
    }

    fn frame() -> BinnedFrame {
        let table = Table::from_records(vec![
            record(0.1, 0.9, true),
            record(0.1, 0.9, true),
            record(0.1, 0.5, false),
            record(0.9, 0.9, false),
            record(0.9, 0.5, false),
            record(0.9, 0.5, true),
        ]);
        BinnedFrame::from_table(&table, Column::SatisfactionLevel, Column::LastEvaluation, Column::Left, 2)
            .unwrap()
    }

    #[test]
    fn test_cells_hold_group_means() {
        let frame = frame();
        assert_eq!(frame.x_labels, vec!["0.1-0.5", "0.5-0.9"]);
        assert_eq!(frame.y_labels, vec!["0.5-0.7", "0.7-0.9"]);
        assert_eq!(frame.get("0.1-0.5", "0.7-0.9"), Some(1.0));
        assert_eq!(frame.get("0.5-0.9", "0.7-0.9"), Some(0.0));
        assert_eq!(frame.get("0.5-0.9", "0.5-0.7"), Some(0.5));
    }

    #[test]
    fn test_empty_bins_are_dropped() {
        let table = Table::from_records(vec![record(0.1, 0.5, true), record(0.9, 0.9, false)]);
        let frame =
            BinnedFrame::from_table(&table, Column::SatisfactionLevel, Column::LastEvaluation, Column::Left, 5)
                .unwrap();
        assert_eq!(frame.x_labels.len(), 2);
        assert_eq!(frame.y_labels.len(), 2);
        assert_eq!(frame.cells[0][1], None);
    }

    #[test]
    fn test_chart_geometry() {
        let frame = frame();
        let mut heatmap = Heatmap::new(&frame);
        let rendered = heatmap
            .create(HeatmapEncoding::new("Attrition Rate by Satisfaction and Evaluation"))
            .unwrap();
        assert_eq!(rendered.kind, ChartKind::Heatmap);
        assert_eq!(rendered.frame.x_label, "Satisfaction Level");
        let Plot::Cells(cells) = &rendered.plot else {
            panic!("expected cells");
        };
        assert_eq!(cells.value_range, (0.0, 1.0));
        assert_eq!(cells.palette, Palette::YlOrRd);
        assert!(cells.annotate);
    }
}
