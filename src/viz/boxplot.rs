//! Box plots of a numeric column per category

use std::collections::BTreeMap;

use super::{ordered_categories, BoxGeometry, ChartFrame, ChartKind, Palette, Plot, RenderedChart, Visualizer};
use crate::config::VISUALIZATION_DEFAULTS;
use crate::data::{Column, ColumnKind, GroupKey, Table};
use crate::error::AnalysisError;
use crate::stats::Quartiles;

/// Category on x, numeric distribution on y
#[derive(Debug, Clone)]
pub struct CategoricalEncoding {
    pub x: Column,
    pub y: Column,
    pub title: String,
    pub palette: Palette,
    pub order: Vec<String>,
    pub rotation: u32,
}

impl CategoricalEncoding {
    pub fn new(x: Column, y: Column, title: impl Into<String>) -> Self {
        Self {
            x,
            y,
            title: title.into(),
            palette: Palette::default(),
            order: Vec::new(),
            rotation: VISUALIZATION_DEFAULTS.rotation,
        }
    }
}

/// Values of `y` per key of `x`, missing cells skipped
pub(crate) fn values_by_key(table: &Table, x: Column, y: Column) -> crate::Result<BTreeMap<GroupKey, Vec<f64>>> {
    table.require(&[x, y])?;
    if !y.is_numeric() {
        return Err(AnalysisError::Validation(format!(
            "column '{}' is not numeric",
            y
        )));
    }

    let mut groups: BTreeMap<GroupKey, Vec<f64>> = BTreeMap::new();
    for record in table.iter() {
        if let (Some(key), Some(value)) = (record.key(x), record.value(y)) {
            groups.entry(key).or_default().push(value);
        }
    }
    Ok(groups)
}

/// Box plot strategy
#[derive(Debug)]
pub struct BoxPlot<'a> {
    data: &'a Table,
    chart: Option<RenderedChart>,
}

impl<'a> BoxPlot<'a> {
    pub fn new(data: &'a Table) -> Self {
        Self { data, chart: None }
    }
}

impl Visualizer for BoxPlot<'_> {
    type Encoding = CategoricalEncoding;

    fn create(&mut self, encoding: CategoricalEncoding) -> crate::Result<&RenderedChart> {
        if encoding.x.kind() == ColumnKind::Continuous {
            return Err(AnalysisError::Validation(format!(
                "cannot use continuous column '{}' as box plot categories",
                encoding.x
            )));
        }

        // key order, so "10" projects sorts after "2"
        let groups: Vec<(String, Quartiles)> = values_by_key(self.data, encoding.x, encoding.y)?
            .into_iter()
            .filter_map(|(key, values)| Quartiles::from_values(&values).map(|q| (key.to_string(), q)))
            .collect();
        let natural = groups.iter().map(|(label, _)| label.clone()).collect();
        let categories = ordered_categories(natural, &encoding.order);
        if categories.is_empty() {
            return Err(AnalysisError::Validation(format!(
                "no values of '{}' to plot",
                encoding.y
            )));
        }

        let boxes: Vec<Quartiles> = categories
            .iter()
            .filter_map(|label| {
                groups
                    .iter()
                    .find(|(group, _)| group == label)
                    .map(|(_, q)| q.clone())
            })
            .collect();
        let colors = encoding.palette.colors(categories.len());
        let frame = ChartFrame::new(encoding.title, encoding.x.label(), encoding.y.label())
            .with_rotation(encoding.rotation, categories.len());

        let plot = Plot::Boxes(BoxGeometry {
            categories,
            boxes,
            colors,
        });
        Ok(&*self.chart.insert(RenderedChart::new(ChartKind::Box, frame, plot)))
    }

    fn chart(&self) -> Option<&RenderedChart> {
        self.chart.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{EmployeeRecord, LabelSource};

    fn record(dept: &str, projects: u32, satisfaction: f64) -> EmployeeRecord {
        EmployeeRecord {
            satisfaction_level: Some(satisfaction),
            last_evaluation: Some(0.7),
            number_project: Some(projects),
            average_monthly_hours: Some(200),
            dept: Some(dept.to_string()),
            ..EmployeeRecord::default()
        }
    }

    #[test]
    fn test_boxes_per_category() {
        let table = Table::from_records(vec![
            record("sales", 2, 0.1),
            record("sales", 3, 0.5),
            record("sales", 10, 0.9),
            record("hr", 2, 0.4),
            record("hr", 10, 0.6),
        ]);
        let mut plot = BoxPlot::new(&table);
        let rendered = plot
            .create(CategoricalEncoding::new(
                Column::Dept,
                Column::SatisfactionLevel,
                "Employee Satisfaction Level by Department",
            ))
            .unwrap();

        assert_eq!(rendered.frame.x_label, "Dept");
        assert_eq!(rendered.frame.y_label, "Satisfaction Level");
        let Plot::Boxes(boxes) = &rendered.plot else {
            panic!("expected boxes");
        };
        assert_eq!(boxes.categories, vec!["hr", "sales"]);
        assert_eq!(boxes.boxes[1].median, 0.5);
        assert_eq!(boxes.boxes[0].median, 0.5);

        let mut by_projects = BoxPlot::new(&table);
        let rendered = by_projects
            .create(CategoricalEncoding::new(Column::NumberProject, Column::SatisfactionLevel, "p"))
            .unwrap();
        let Plot::Boxes(boxes) = &rendered.plot else {
            panic!("expected boxes");
        };
        assert_eq!(boxes.categories, vec!["2", "3", "10"]);
    }

    #[test]
    fn test_rejects_missing_or_continuous_columns() {
        let table = Table::new(vec![record("sales", 2, 0.5)], [Column::SatisfactionLevel], LabelSource::Supplied);
        let mut plot = BoxPlot::new(&table);
        let err = plot
            .create(CategoricalEncoding::new(Column::Dept, Column::SatisfactionLevel, "t"))
            .unwrap_err();
        assert!(err.to_string().contains("dept"));

        let full = Table::from_records(vec![record("sales", 2, 0.5)]);
        let mut plot = BoxPlot::new(&full);
        assert!(plot
            .create(CategoricalEncoding::new(Column::LastEvaluation, Column::SatisfactionLevel, "t"))
            .is_err());
    }
}
