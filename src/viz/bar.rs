//! Bar charts over grouped tables

use tracing::debug;

use super::{ordered_categories, BarGeometry, BarSeries, ChartFrame, ChartKind, Palette, Plot, RenderedChart, Visualizer};
use crate::config::VISUALIZATION_DEFAULTS;
use crate::data::title_case;
use crate::error::AnalysisError;
use crate::metrics::GroupedTable;

#[derive(Debug, Clone)]
pub struct BarEncoding {
    /// Value columns of the grouped table; more than one draws grouped bars with a legend
    pub values: Vec<String>,
    pub title: String,
    /// Defaults to the title-cased group column
    pub x_label: Option<String>,
    /// Defaults to the title-cased value column
    pub y_label: Option<String>,
    pub palette: Palette,
    pub order: Vec<String>,
    pub rotation: u32,
}

impl BarEncoding {
    pub fn new(value: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            values: vec![value.into()],
            title: title.into(),
            x_label: None,
            y_label: None,
            palette: Palette::default(),
            order: Vec::new(),
            rotation: VISUALIZATION_DEFAULTS.rotation,
        }
    }
}

/// Bar chart strategy
#[derive(Debug)]
pub struct BarChart<'a> {
    data: &'a GroupedTable,
    chart: Option<RenderedChart>,
}

impl<'a> BarChart<'a> {
    pub fn new(data: &'a GroupedTable) -> Self {
        Self { data, chart: None }
    }
}

impl Visualizer for BarChart<'_> {
    type Encoding = BarEncoding;

    fn create(&mut self, encoding: BarEncoding) -> crate::Result<&RenderedChart> {
        if encoding.values.is_empty() {
            return Err(AnalysisError::Validation(
                "bar chart needs at least one value column".to_string(),
            ));
        }

        let categories = ordered_categories(self.data.labels(), &encoding.order);
        let positions: Vec<usize> = categories
            .iter()
            .filter_map(|label| self.data.rows.iter().position(|row| &row.key.to_string() == label))
            .collect();

        let grouped = encoding.values.len() > 1;
        let palette_colors = encoding
            .palette
            .colors(if grouped { encoding.values.len() } else { categories.len() });

        let mut series = Vec::with_capacity(encoding.values.len());
        for (j, name) in encoding.values.iter().enumerate() {
            let column = self.data.column_values(name)?;
            let values: Vec<f64> = positions.iter().map(|p| column[*p]).collect();
            let colors = if grouped {
                vec![palette_colors[j]; values.len()]
            } else {
                palette_colors.clone()
            };
            series.push(BarSeries {
                name: title_case(name),
                values,
                colors,
            });
        }

        let y_label = encoding.y_label.unwrap_or_else(|| {
            if grouped {
                "Average Value".to_string()
            } else {
                title_case(&encoding.values[0])
            }
        });
        let frame = ChartFrame::new(
            encoding.title,
            encoding
                .x_label
                .unwrap_or_else(|| title_case(&self.data.group_column)),
            y_label,
        )
        .with_rotation(encoding.rotation, categories.len());

        debug!(
            categories = categories.len(),
            series = series.len(),
            "bar chart created"
        );

        let plot = Plot::Bars(BarGeometry {
            categories,
            series,
            legend: grouped,
        });
        Ok(&*self.chart.insert(RenderedChart::new(ChartKind::Bar, frame, plot)))
    }

    fn chart(&self) -> Option<&RenderedChart> {
        self.chart.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Column, EmployeeRecord, SalaryLevel, Table};
    use crate::metrics;

    fn table() -> Table {
        let record = |dept: &str, salary: SalaryLevel, satisfaction: f64, left: bool| EmployeeRecord {
            satisfaction_level: Some(satisfaction),
            last_evaluation: Some(0.7),
            number_project: Some(4),
            average_monthly_hours: Some(200),
            dept: Some(dept.to_string()),
            salary: Some(salary),
            left,
            ..EmployeeRecord::default()
        };
        Table::from_records(vec![
            record("sales", SalaryLevel::High, 0.9, false),
            record("sales", SalaryLevel::Low, 0.2, true),
            record("hr", SalaryLevel::Medium, 0.5, true),
            record("it", SalaryLevel::Low, 0.6, false),
        ])
    }

    #[test]
    fn test_export_before_create_is_state_error() {
        let grouped = metrics::attrition_by_group(&table(), Column::Dept).unwrap();
        let chart = BarChart::new(&grouped);
        assert!(matches!(
            chart.export("unused.png", None),
            Err(AnalysisError::State(_))
        ));
        assert!(matches!(chart.present(), Err(AnalysisError::State(_))));
    }

    #[test]
    fn test_single_series_follows_order() {
        let grouped = metrics::attrition_by_group(&table(), Column::Salary).unwrap();
        let mut chart = BarChart::new(&grouped);
        let mut encoding = BarEncoding::new("left", "Attrition Rate by Salary Level");
        encoding.order = vec!["high".to_string(), "medium".to_string(), "low".to_string()];
        encoding.palette = Palette::Set3;

        let rendered = chart.create(encoding).unwrap();
        assert_eq!(rendered.kind, ChartKind::Bar);
        assert_eq!(rendered.frame.x_label, "Salary");
        let Plot::Bars(bars) = &rendered.plot else {
            panic!("expected bars");
        };
        assert_eq!(bars.categories, vec!["high", "medium", "low"]);
        assert_eq!(bars.series[0].values, vec![0.0, 1.0, 0.5]);
        assert_eq!(bars.series[0].colors.len(), 3);
        assert!(!bars.legend);
    }

    #[test]
    fn test_grouped_series_have_legend() {
        let grouped = metrics::mean_metrics_by_group(
            &table(),
            Column::Salary,
            &[Column::NumberProject, Column::LastEvaluation, Column::SatisfactionLevel],
        )
        .unwrap();
        let mut chart = BarChart::new(&grouped);
        let mut encoding = BarEncoding::new("number_project", "Average Metrics by Salary Level");
        encoding.values = grouped.value_columns.clone();

        let rendered = chart.create(encoding).unwrap();
        let Plot::Bars(bars) = &rendered.plot else {
            panic!("expected bars");
        };
        assert_eq!(bars.series.len(), 3);
        assert!(bars.legend);
        assert_eq!(bars.series[2].name, "Satisfaction Level");
        assert_eq!(rendered.frame.y_label, "Average Value");
    }

    #[test]
    fn test_unknown_value_column() {
        let grouped = metrics::attrition_by_group(&table(), Column::Dept).unwrap();
        let mut chart = BarChart::new(&grouped);
        let result = chart.create(BarEncoding::new("bonus", "x"));
        assert!(matches!(result, Err(AnalysisError::Validation(_))));
        assert!(chart.chart().is_none());
    }
}
