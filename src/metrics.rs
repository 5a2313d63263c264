//! Stateless HR metrics over the working table

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::THRESHOLDS;
use crate::data::{Column, ColumnKind, EmployeeRecord, GroupKey, Table};
use crate::error::AnalysisError;
use crate::stats::{self, EqualWidthBins};

/// One group of a grouped aggregation
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRow {
    pub key: GroupKey,
    /// Records in the group
    pub count: usize,
    /// One mean per value column, NaN when the group has no values for it
    pub values: Vec<f64>,
}

/// Result of a group-by: one row per distinct key, sorted by key
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedTable {
    pub group_column: String,
    pub value_columns: Vec<String>,
    pub rows: Vec<GroupRow>,
}

impl GroupedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.rows.iter().map(|row| row.key.to_string()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.value_columns.iter().position(|c| c == name)
    }

    /// Values of one value column, in row order
    pub fn column_values(&self, name: &str) -> crate::Result<Vec<f64>> {
        let idx = self.column_index(name).ok_or_else(|| {
            AnalysisError::Validation(format!(
                "grouped table has no column '{}' (available: {})",
                name,
                self.value_columns.join(", ")
            ))
        })?;
        Ok(self.rows.iter().map(|row| row.values[idx]).collect())
    }

    /// Value for a given group key and column
    pub fn get(&self, key: &GroupKey, name: &str) -> Option<f64> {
        let idx = self.column_index(name)?;
        self.rows
            .iter()
            .find(|row| &row.key == key)
            .map(|row| row.values[idx])
    }
}

/// Group `(key, values)` rows and average each value slot, skipping missing cells
pub(crate) fn aggregate<I>(
    group_column: impl Into<String>,
    value_columns: Vec<String>,
    rows: I,
) -> GroupedTable
where
    I: IntoIterator<Item = (GroupKey, Vec<Option<f64>>)>,
{
    let width = value_columns.len();
    let mut groups: BTreeMap<GroupKey, (usize, Vec<f64>, Vec<usize>)> = BTreeMap::new();

    for (key, values) in rows {
        let entry = groups
            .entry(key)
            .or_insert_with(|| (0, vec![0.0; width], vec![0; width]));
        entry.0 += 1;
        for (slot, value) in values.into_iter().enumerate().take(width) {
            if let Some(v) = value {
                entry.1[slot] += v;
                entry.2[slot] += 1;
            }
        }
    }

    let rows = groups
        .into_iter()
        .map(|(key, (count, sums, counts))| GroupRow {
            key,
            count,
            values: sums
                .iter()
                .zip(counts.iter())
                .map(|(sum, n)| if *n == 0 { f64::NAN } else { sum / *n as f64 })
                .collect(),
        })
        .collect();

    GroupedTable {
        group_column: group_column.into(),
        value_columns,
        rows,
    }
}

/// Overall attrition rate: mean of `left`, 0.0 for an empty table
pub fn attrition_rate(table: &Table) -> f64 {
    if table.is_empty() {
        return 0.0;
    }
    table.iter().filter(|r| r.left).count() as f64 / table.len() as f64
}

/// Attrition rate per distinct value of `column`
pub fn attrition_by_group(table: &Table, column: Column) -> crate::Result<GroupedTable> {
    mean_metrics_by_group(table, column, &[Column::Left])
}

/// Mean of each metric column per distinct value of `column`
pub fn mean_metrics_by_group(
    table: &Table,
    column: Column,
    metrics: &[Column],
) -> crate::Result<GroupedTable> {
    debug!(group_by = %column, ?metrics, "calculating mean metrics by group");

    let mut required = vec![column];
    required.extend_from_slice(metrics);
    table.require(&required)?;

    if column.kind() == ColumnKind::Continuous {
        return Err(AnalysisError::Validation(format!(
            "cannot group by continuous column '{}'",
            column
        )));
    }
    if let Some(bad) = metrics.iter().find(|m| !m.is_numeric()) {
        return Err(AnalysisError::Validation(format!(
            "cannot average categorical column '{}'",
            bad
        )));
    }

    let rows = table.iter().filter_map(|record| {
        record
            .key(column)
            .map(|key| (key, metrics.iter().map(|m| record.value(*m)).collect()))
    });

    Ok(aggregate(
        column.name(),
        metrics.iter().map(|m| m.name().to_string()).collect(),
        rows,
    ))
}

/// Low satisfaction AND high evaluation AND excessive hours, all three required
pub fn is_high_risk(record: &EmployeeRecord) -> bool {
    matches!(
        (
            record.satisfaction_level,
            record.last_evaluation,
            record.average_monthly_hours,
        ),
        (Some(s), Some(e), Some(h))
            if s < THRESHOLDS.low_satisfaction
                && e > THRESHOLDS.high_evaluation
                && f64::from(h) > THRESHOLDS.high_hours
    )
}

/// Employees meeting every high-risk threshold
pub fn high_risk_employees(table: &Table) -> Table {
    let high_risk = table.filter(is_high_risk);
    info!(
        count = high_risk.len(),
        total = table.len(),
        "identified high-risk employees"
    );
    high_risk
}

/// Counts over fixed equal-width bins
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub bins: EqualWidthBins,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

pub const SATISFACTION_BINS: usize = 10;

/// Satisfaction level counted into ten bins over [0, 1]
pub fn satisfaction_distribution(table: &Table) -> Histogram {
    let bins = EqualWidthBins::new(0.0, 1.0, SATISFACTION_BINS);
    let values: Vec<f64> = table.iter().filter_map(|r| r.satisfaction_level).collect();
    let counts = bins.counts(&values);
    Histogram { bins, counts }
}

/// Headline numbers shown next to every analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyMetrics {
    pub total_employees: usize,
    pub attrition_rate: f64,
    pub high_risk_count: usize,
    /// Share of employees that are high risk, 0.0 for an empty table
    pub high_risk_share: f64,
}

pub fn key_metrics(table: &Table) -> KeyMetrics {
    let high_risk_count = table.iter().filter(|r| is_high_risk(r)).count();
    KeyMetrics {
        total_employees: table.len(),
        attrition_rate: attrition_rate(table),
        high_risk_count,
        high_risk_share: if table.is_empty() {
            0.0
        } else {
            high_risk_count as f64 / table.len() as f64
        },
    }
}

/// Descriptive statistics of one numeric column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: Column,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Summary of every numeric column present; columns without values are skipped
pub fn describe(table: &Table) -> Vec<ColumnSummary> {
    table
        .columns()
        .filter(|c| c.is_numeric())
        .filter_map(|column| {
            let values: Vec<f64> = table.iter().filter_map(|r| r.value(column)).collect();
            let sorted = stats::sorted_finite(&values);
            Some(ColumnSummary {
                column,
                count: sorted.len(),
                mean: stats::mean(&sorted)?,
                std: stats::std_dev(&sorted).unwrap_or(f64::NAN),
                min: *sorted.first()?,
                q25: stats::quantile_sorted(&sorted, 0.25)?,
                median: stats::quantile_sorted(&sorted, 0.5)?,
                q75: stats::quantile_sorted(&sorted, 0.75)?,
                max: *sorted.last()?,
            })
        })
        .collect()
}
