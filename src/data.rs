//! Employee data loading, column catalogue and the process-wide table cache

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use once_cell::sync::OnceCell;
use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::THRESHOLDS;
use crate::error::AnalysisError;

/// Columns of the employee dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Column {
    SatisfactionLevel,
    LastEvaluation,
    NumberProject,
    AverageMonthlyHours,
    TimeSpendCompany,
    WorkAccident,
    Left,
    PromotionLast5Years,
    Dept,
    Salary,
}

/// How a column's values behave for aggregation and plotting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Real-valued, cannot be grouped on directly
    Continuous,
    /// Integer counts
    Discrete,
    /// 0/1 indicator
    Flag,
    Categorical,
}

impl Column {
    pub const ALL: [Column; 10] = [
        Column::SatisfactionLevel,
        Column::LastEvaluation,
        Column::NumberProject,
        Column::AverageMonthlyHours,
        Column::TimeSpendCompany,
        Column::WorkAccident,
        Column::Left,
        Column::PromotionLast5Years,
        Column::Dept,
        Column::Salary,
    ];

    /// Columns the loader refuses to work without
    pub const REQUIRED: [Column; 3] = [
        Column::SatisfactionLevel,
        Column::LastEvaluation,
        Column::AverageMonthlyHours,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::SatisfactionLevel => "satisfaction_level",
            Column::LastEvaluation => "last_evaluation",
            Column::NumberProject => "number_project",
            Column::AverageMonthlyHours => "average_monthly_hours",
            Column::TimeSpendCompany => "time_spend_company",
            Column::WorkAccident => "work_accident",
            Column::Left => "left",
            Column::PromotionLast5Years => "promotion_last_5years",
            Column::Dept => "dept",
            Column::Salary => "salary",
        }
    }

    /// Header spellings accepted in source files, canonical name first
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Column::AverageMonthlyHours => &["average_monthly_hours", "average_montly_hours"],
            Column::WorkAccident => &["work_accident", "Work_accident"],
            Column::Dept => &["dept", "Department", "department", "sales"],
            Column::TimeSpendCompany => &["time_spend_company", "time_spent_company"],
            Column::SatisfactionLevel => &["satisfaction_level"],
            Column::LastEvaluation => &["last_evaluation"],
            Column::NumberProject => &["number_project"],
            Column::Left => &["left"],
            Column::PromotionLast5Years => &["promotion_last_5years"],
            Column::Salary => &["salary"],
        }
    }

    pub fn kind(self) -> ColumnKind {
        match self {
            Column::SatisfactionLevel | Column::LastEvaluation => ColumnKind::Continuous,
            Column::NumberProject | Column::AverageMonthlyHours | Column::TimeSpendCompany => {
                ColumnKind::Discrete
            }
            Column::WorkAccident | Column::Left | Column::PromotionLast5Years => ColumnKind::Flag,
            Column::Dept | Column::Salary => ColumnKind::Categorical,
        }
    }

    pub fn is_numeric(self) -> bool {
        self.kind() != ColumnKind::Categorical
    }

    /// Human-readable axis label, e.g. "Satisfaction Level"
    pub fn label(self) -> String {
        title_case(self.name())
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Column {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Column::ALL
            .iter()
            .copied()
            .find(|column| column.aliases().iter().any(|alias| *alias == s))
            .ok_or_else(|| AnalysisError::Validation(format!("unknown column '{}'", s)))
    }
}

/// Turn a snake_case identifier into title case words
pub fn title_case(identifier: &str) -> String {
    identifier
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Ordered salary band
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SalaryLevel {
    Low,
    Medium,
    High,
}

impl SalaryLevel {
    pub const ALL: [SalaryLevel; 3] = [SalaryLevel::Low, SalaryLevel::Medium, SalaryLevel::High];

    pub fn as_str(self) -> &'static str {
        match self {
            SalaryLevel::Low => "low",
            SalaryLevel::Medium => "medium",
            SalaryLevel::High => "high",
        }
    }
}

impl fmt::Display for SalaryLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SalaryLevel {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(SalaryLevel::Low),
            "medium" => Ok(SalaryLevel::Medium),
            "high" => Ok(SalaryLevel::High),
            other => Err(AnalysisError::Validation(format!(
                "unknown salary level '{}' (expected low, medium or high)",
                other
            ))),
        }
    }
}

/// Distinct value of a groupable column
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKey {
    Number(i64),
    Flag(bool),
    Salary(SalaryLevel),
    Text(String),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Number(n) => write!(f, "{}", n),
            GroupKey::Flag(flag) => f.write_str(if *flag { "1" } else { "0" }),
            GroupKey::Salary(level) => write!(f, "{}", level),
            GroupKey::Text(text) => f.write_str(text),
        }
    }
}

/// One employee row of the working table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmployeeRecord {
    pub satisfaction_level: Option<f64>,
    pub last_evaluation: Option<f64>,
    pub number_project: Option<u32>,
    pub average_monthly_hours: Option<u32>,
    pub time_spend_company: Option<u32>,
    pub work_accident: Option<bool>,
    /// Attrition flag
    pub left: bool,
    pub promotion_last_5years: Option<bool>,
    pub dept: Option<String>,
    pub salary: Option<SalaryLevel>,
}

impl EmployeeRecord {
    /// Numeric value of a column; flags read as 0/1, categorical columns as `None`
    pub fn value(&self, column: Column) -> Option<f64> {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        match column {
            Column::SatisfactionLevel => self.satisfaction_level,
            Column::LastEvaluation => self.last_evaluation,
            Column::NumberProject => self.number_project.map(f64::from),
            Column::AverageMonthlyHours => self.average_monthly_hours.map(f64::from),
            Column::TimeSpendCompany => self.time_spend_company.map(f64::from),
            Column::WorkAccident => self.work_accident.map(flag),
            Column::Left => Some(flag(self.left)),
            Column::PromotionLast5Years => self.promotion_last_5years.map(flag),
            Column::Dept | Column::Salary => None,
        }
    }

    /// Group key of a column; continuous columns have none
    pub fn key(&self, column: Column) -> Option<GroupKey> {
        match column {
            Column::SatisfactionLevel | Column::LastEvaluation => None,
            Column::NumberProject => self.number_project.map(|v| GroupKey::Number(v.into())),
            Column::AverageMonthlyHours => {
                self.average_monthly_hours.map(|v| GroupKey::Number(v.into()))
            }
            Column::TimeSpendCompany => self.time_spend_company.map(|v| GroupKey::Number(v.into())),
            Column::WorkAccident => self.work_accident.map(GroupKey::Flag),
            Column::Left => Some(GroupKey::Flag(self.left)),
            Column::PromotionLast5Years => self.promotion_last_5years.map(GroupKey::Flag),
            Column::Dept => self.dept.clone().map(GroupKey::Text),
            Column::Salary => self.salary.map(GroupKey::Salary),
        }
    }

    fn hash_into<H: Hasher>(&self, state: &mut H) {
        self.satisfaction_level.map(f64::to_bits).hash(state);
        self.last_evaluation.map(f64::to_bits).hash(state);
        self.number_project.hash(state);
        self.average_monthly_hours.hash(state);
        self.time_spend_company.hash(state);
        self.work_accident.hash(state);
        self.left.hash(state);
        self.promotion_last_5years.hash(state);
        self.dept.hash(state);
        self.salary.hash(state);
    }
}

/// Where the `left` labels came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelSource {
    /// Read from the source file
    #[default]
    Supplied,
    /// Derived by the low-satisfaction / long-hours rule
    Simulated,
}

/// Working table of employee records
#[derive(Debug, Clone, Default)]
pub struct Table {
    records: Vec<EmployeeRecord>,
    columns: BTreeSet<Column>,
    label_source: LabelSource,
}

impl Table {
    /// Build a table carrying the given columns; `left` is always present
    pub fn new(
        records: Vec<EmployeeRecord>,
        columns: impl IntoIterator<Item = Column>,
        label_source: LabelSource,
    ) -> Self {
        let mut columns: BTreeSet<Column> = columns.into_iter().collect();
        columns.insert(Column::Left);
        Self {
            records,
            columns,
            label_source,
        }
    }

    /// Table with every column present and supplied labels
    pub fn from_records(records: Vec<EmployeeRecord>) -> Self {
        Self::new(records, Column::ALL, LabelSource::Supplied)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[EmployeeRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EmployeeRecord> {
        self.records.iter()
    }

    pub fn columns(&self) -> impl Iterator<Item = Column> + '_ {
        self.columns.iter().copied()
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    pub fn label_source(&self) -> LabelSource {
        self.label_source
    }

    /// Fail with a validation error naming every absent column
    pub fn require(&self, columns: &[Column]) -> crate::Result<()> {
        let missing: Vec<&str> = columns
            .iter()
            .filter(|column| !self.has_column(**column))
            .map(|column| column.name())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AnalysisError::Validation(format!(
                "missing columns: {}",
                missing.join(", ")
            )))
        }
    }

    /// Copy of the rows matching `predicate`, same columns and label source
    pub fn filter<F>(&self, predicate: F) -> Table
    where
        F: Fn(&EmployeeRecord) -> bool,
    {
        Table {
            records: self.records.iter().filter(|r| predicate(*r)).cloned().collect(),
            columns: self.columns.clone(),
            label_source: self.label_source,
        }
    }

    /// Non-missing values of a numeric column
    pub fn numeric_values(&self, column: Column) -> crate::Result<Vec<f64>> {
        self.require(&[column])?;
        if !column.is_numeric() {
            return Err(AnalysisError::Validation(format!(
                "column '{}' is not numeric",
                column
            )));
        }
        Ok(self.records.iter().filter_map(|r| r.value(column)).collect())
    }

    /// Distinct departments, sorted
    pub fn departments(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.records.iter().filter_map(|r| r.dept.as_deref()).collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// Distinct salary levels in band order
    pub fn salaries(&self) -> Vec<SalaryLevel> {
        let set: BTreeSet<SalaryLevel> = self.records.iter().filter_map(|r| r.salary).collect();
        set.into_iter().collect()
    }

    /// Content hash used to memoize per-table computations
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.columns.hash(&mut hasher);
        self.records.len().hash(&mut hasher);
        for record in &self.records {
            record.hash_into(&mut hasher);
        }
        hasher.finish()
    }
}

/// Department / salary selection applied by the host before dispatching a question
///
/// The selection only narrows the table when both lists are non-empty; an
/// empty list on either side leaves every row in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableFilter {
    pub departments: Vec<String>,
    pub salaries: Vec<SalaryLevel>,
}

impl TableFilter {
    pub fn is_empty(&self) -> bool {
        self.departments.is_empty() && self.salaries.is_empty()
    }

    /// Whether `apply` will drop any rows at all
    pub fn is_active(&self) -> bool {
        !self.departments.is_empty() && !self.salaries.is_empty()
    }

    pub fn apply(&self, table: &Table) -> Table {
        if !self.is_active() {
            if !self.is_empty() {
                debug!("department or salary selection is empty, keeping every row");
            }
            return table.clone();
        }

        let filtered = table.filter(|record| {
            let dept_ok = record
                .dept
                .as_ref()
                .is_some_and(|dept| self.departments.contains(dept));
            let salary_ok = record.salary.is_some_and(|s| self.salaries.contains(&s));
            dept_ok && salary_ok
        });
        debug!(
            before = table.len(),
            after = filtered.len(),
            "applied department/salary filter"
        );
        filtered
    }
}

/// Process-wide cache: the dataset is read once, every caller gets its own copy
#[derive(Debug)]
pub struct DataCache {
    source: PathBuf,
    table: OnceCell<Table>,
}

impl DataCache {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            table: OnceCell::new(),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn is_loaded(&self) -> bool {
        self.table.get().is_some()
    }

    /// Load on first call, then hand out clones of the cached table
    pub fn load(&self) -> crate::Result<Table> {
        if self.is_loaded() {
            debug!("returning cached employee table");
        }
        let table = self
            .table
            .get_or_try_init(|| load_employee_data(&self.source))?;
        Ok(table.clone())
    }
}

/// Read the dataset, derive missing labels and normalize column types
///
/// # Arguments
/// * `path` - Path to the delimited employee file
///
/// # Returns
/// * `Table` with every record validated and `left` always populated
pub fn load_employee_data(path: impl AsRef<Path>) -> crate::Result<Table> {
    let path = path.as_ref();
    info!(path = %path.display(), "loading employee data");

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .map_err(|e| AnalysisError::Load(format!("failed to read {}: {}", path.display(), e)))?;

    info!(
        records = df.height(),
        columns = df.width(),
        "loaded raw employee data"
    );

    let mut names = resolve_columns(&df);
    let missing: Vec<&str> = Column::REQUIRED
        .iter()
        .filter(|column| !names.contains_key(column))
        .map(|column| column.name())
        .collect();
    if !missing.is_empty() {
        return Err(AnalysisError::Load(format!(
            "missing required columns: {}",
            missing.join(", ")
        )));
    }

    let (df, label_source) = if names.contains_key(&Column::Left) {
        (df, LabelSource::Supplied)
    } else {
        warn!("'left' column not found - simulating attrition from business rules");
        let df = simulate_attrition(
            df,
            &names[&Column::SatisfactionLevel],
            &names[&Column::AverageMonthlyHours],
        )
        .map_err(|e| AnalysisError::Load(format!("failed to derive attrition labels: {}", e)))?;
        names.insert(Column::Left, Column::Left.name().to_string());
        (df, LabelSource::Simulated)
    };

    let records = build_records(&df, &names)?;
    let table = Table::new(records, names.keys().copied(), label_source);

    info!(
        records = table.len(),
        labels = ?table.label_source(),
        "employee data preprocessing completed"
    );
    Ok(table)
}

/// Map each known column to the header it appears under
fn resolve_columns(df: &DataFrame) -> BTreeMap<Column, String> {
    Column::ALL
        .iter()
        .filter_map(|column| {
            column
                .aliases()
                .iter()
                .find(|alias| df.get_column_index(alias).is_some())
                .map(|alias| (*column, alias.to_string()))
        })
        .collect()
}

/// Add `left` = 1 when satisfaction is low and hours are excessive
fn simulate_attrition(df: DataFrame, satisfaction: &str, hours: &str) -> PolarsResult<DataFrame> {
    df.lazy()
        .with_column(
            when(
                col(satisfaction)
                    .lt(lit(THRESHOLDS.low_satisfaction))
                    .and(col(hours).gt(lit(THRESHOLDS.high_hours))),
            )
            .then(lit(1i32))
            .otherwise(lit(0i32))
            .alias(Column::Left.name()),
        )
        .collect()
}

fn float_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    let values = series.f64()?.into_iter().collect();
    Ok(values)
}

fn text_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    let values = series
        .str()?
        .into_iter()
        .map(|value| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        })
        .collect();
    Ok(values)
}

fn build_records(df: &DataFrame, names: &BTreeMap<Column, String>) -> crate::Result<Vec<EmployeeRecord>> {
    let height = df.height();
    let load_err = |column: Column, e: PolarsError| {
        AnalysisError::Load(format!("column '{}' could not be read: {}", column, e))
    };
    let numeric = |column: Column| -> crate::Result<Vec<Option<f64>>> {
        match names.get(&column) {
            Some(name) => float_values(df, name).map_err(|e| load_err(column, e)),
            None => Ok(vec![None; height]),
        }
    };
    let text = |column: Column| -> crate::Result<Vec<Option<String>>> {
        match names.get(&column) {
            Some(name) => text_values(df, name).map_err(|e| load_err(column, e)),
            None => Ok(vec![None; height]),
        }
    };

    let satisfaction = numeric(Column::SatisfactionLevel)?;
    let evaluation = numeric(Column::LastEvaluation)?;
    let projects = numeric(Column::NumberProject)?;
    let hours = numeric(Column::AverageMonthlyHours)?;
    let tenure = numeric(Column::TimeSpendCompany)?;
    let accident = numeric(Column::WorkAccident)?;
    let left = numeric(Column::Left)?;
    let promotion = numeric(Column::PromotionLast5Years)?;
    let dept = text(Column::Dept)?;
    let salary = text(Column::Salary)?;

    let mut records = Vec::with_capacity(height);
    for row in 0..height {
        let salary = salary[row]
            .as_deref()
            .map(SalaryLevel::from_str)
            .transpose()
            .map_err(|e| AnalysisError::Load(format!("row {}: {}", row + 1, e)))?;

        records.push(EmployeeRecord {
            satisfaction_level: unit_interval(Column::SatisfactionLevel, row, satisfaction[row])?,
            last_evaluation: unit_interval(Column::LastEvaluation, row, evaluation[row])?,
            number_project: count(Column::NumberProject, row, projects[row])?,
            average_monthly_hours: count(Column::AverageMonthlyHours, row, hours[row])?,
            time_spend_company: count(Column::TimeSpendCompany, row, tenure[row])?,
            work_accident: flag(Column::WorkAccident, row, accident[row])?,
            left: flag(Column::Left, row, left[row])?.ok_or_else(|| {
                AnalysisError::Load(format!("row {}: missing attrition label", row + 1))
            })?,
            promotion_last_5years: flag(Column::PromotionLast5Years, row, promotion[row])?,
            dept: dept[row].clone(),
            salary,
        });
    }

    Ok(records)
}

fn unit_interval(column: Column, row: usize, value: Option<f64>) -> crate::Result<Option<f64>> {
    match value {
        Some(v) if v.is_nan() => Ok(None),
        Some(v) if !(0.0..=1.0).contains(&v) => Err(AnalysisError::Load(format!(
            "row {}: {} = {} outside [0, 1]",
            row + 1,
            column,
            v
        ))),
        other => Ok(other),
    }
}

fn count(column: Column, row: usize, value: Option<f64>) -> crate::Result<Option<u32>> {
    match value {
        Some(v) if v.is_nan() => Ok(None),
        Some(v) if v < 0.0 || v.fract() != 0.0 || v > f64::from(u32::MAX) => Err(
            AnalysisError::Load(format!(
                "row {}: {} = {} is not a non-negative integer",
                row + 1,
                column,
                v
            )),
        ),
        Some(v) => Ok(Some(v as u32)),
        None => Ok(None),
    }
}

fn flag(column: Column, row: usize, value: Option<f64>) -> crate::Result<Option<bool>> {
    match value {
        Some(v) if v == 0.0 => Ok(Some(false)),
        Some(v) if v == 1.0 => Ok(Some(true)),
        Some(v) if v.is_nan() => Ok(None),
        Some(v) => Err(AnalysisError::Load(format!(
            "row {}: {} = {} is not binary",
            row + 1,
            column,
            v
        ))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    fn labelled_csv() -> NamedTempFile {
        write_csv(&[
            "satisfaction_level,last_evaluation,number_project,average_monthly_hours,time_spend_company,Work_accident,left,promotion_last_5years,dept,salary",
            "0.38,0.53,2,157,3,0,1,0,sales,low",
            "0.80,0.86,5,262,6,0,1,0,sales,medium",
            "0.72,0.87,5,223,5,0,0,1,technical,high",
            "0.11,0.88,7,272,4,0,1,0,support,Low",
        ])
    }

    #[test]
    fn test_load_with_supplied_labels() {
        let file = labelled_csv();
        let table = load_employee_data(file.path()).unwrap();

        assert_eq!(table.len(), 4);
        assert_eq!(table.label_source(), LabelSource::Supplied);
        assert!(table.has_column(Column::WorkAccident));

        let first = &table.records()[0];
        assert_eq!(first.satisfaction_level, Some(0.38));
        assert_eq!(first.average_monthly_hours, Some(157));
        assert!(first.left);
        assert_eq!(first.dept.as_deref(), Some("sales"));
        assert_eq!(table.records()[3].salary, Some(SalaryLevel::Low));
        assert_eq!(table.records()[2].promotion_last_5years, Some(true));
    }

    #[test]
    fn test_left_is_simulated_when_absent() {
        let file = write_csv(&[
            "satisfaction_level,last_evaluation,number_project,average_montly_hours,time_spend_company,promotion_last_5years,dept,salary",
            "0.39,0.50,3,251,3,0,sales,low",
            "0.39,0.50,3,250,3,0,sales,low",
            "0.40,0.50,3,300,3,0,sales,low",
            "0.10,0.95,6,280,4,0,hr,medium",
            "0.90,0.95,6,280,4,0,hr,high",
        ]);
        let table = load_employee_data(file.path()).unwrap();

        assert_eq!(table.label_source(), LabelSource::Simulated);
        let left: Vec<bool> = table.iter().map(|r| r.left).collect();
        assert_eq!(left, vec![true, false, false, true, false]);
        assert_eq!(table.records()[0].average_monthly_hours, Some(251));
    }

    #[test]
    fn test_missing_required_columns() {
        let file = write_csv(&["satisfaction_level,dept,salary", "0.5,sales,low"]);
        let err = load_employee_data(file.path()).unwrap_err();

        assert!(matches!(err, AnalysisError::Load(_)));
        let message = err.to_string();
        assert!(message.contains("last_evaluation"));
        assert!(message.contains("average_monthly_hours"));
    }

    #[test]
    fn test_unreadable_source() {
        let err = load_employee_data("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, AnalysisError::Load(_)));
    }

    #[test]
    fn test_rejects_unknown_salary_and_out_of_range_values() {
        let bad_salary = write_csv(&[
            "satisfaction_level,last_evaluation,average_monthly_hours,salary",
            "0.5,0.5,200,enormous",
        ]);
        assert!(matches!(
            load_employee_data(bad_salary.path()),
            Err(AnalysisError::Load(_))
        ));

        let out_of_range = write_csv(&[
            "satisfaction_level,last_evaluation,average_monthly_hours",
            "1.5,0.5,200",
        ]);
        assert!(matches!(
            load_employee_data(out_of_range.path()),
            Err(AnalysisError::Load(_))
        ));
    }

    #[test]
    fn test_cache_hands_out_copies() {
        let file = labelled_csv();
        let cache = DataCache::new(file.path());
        assert!(!cache.is_loaded());

        let first = cache.load().unwrap();
        assert!(cache.is_loaded());
        let trimmed = first.filter(|r| r.left);
        assert_eq!(trimmed.len(), 3);

        let second = cache.load().unwrap();
        assert_eq!(second.len(), 4);
        assert_eq!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn test_filter_by_department_and_salary() {
        let file = labelled_csv();
        let table = load_employee_data(file.path()).unwrap();

        let filter = TableFilter {
            departments: vec!["sales".to_string()],
            salaries: SalaryLevel::ALL.to_vec(),
        };
        assert_eq!(filter.apply(&table).len(), 2);

        // one side left empty selects nothing to filter on
        let filter = TableFilter {
            departments: vec!["sales".to_string()],
            salaries: vec![],
        };
        assert!(!filter.is_active());
        assert_eq!(filter.apply(&table).len(), 4);
        let filter = TableFilter {
            departments: vec![],
            salaries: vec![SalaryLevel::High],
        };
        assert_eq!(filter.apply(&table).len(), 4);

        let filter = TableFilter {
            departments: vec!["sales".to_string(), "support".to_string()],
            salaries: vec![SalaryLevel::Low],
        };
        assert_eq!(filter.apply(&table).len(), 2);

        assert_eq!(TableFilter::default().apply(&table).len(), 4);
        assert_eq!(table.departments(), vec!["sales", "support", "technical"]);
        assert_eq!(
            table.salaries(),
            vec![SalaryLevel::Low, SalaryLevel::Medium, SalaryLevel::High]
        );
    }

    #[test]
    fn test_require_lists_every_missing_column() {
        let table = Table::new(
            vec![EmployeeRecord::default()],
            [Column::SatisfactionLevel],
            LabelSource::Supplied,
        );
        let err = table
            .require(&[Column::SatisfactionLevel, Column::LastEvaluation, Column::Dept])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: missing columns: last_evaluation, dept"
        );
    }

    #[test]
    fn test_column_parsing_and_labels() {
        assert_eq!(
            "average_montly_hours".parse::<Column>().unwrap(),
            Column::AverageMonthlyHours
        );
        assert_eq!("left".parse::<Column>().unwrap(), Column::Left);
        assert!("bonus".parse::<Column>().is_err());
        assert_eq!(Column::SatisfactionLevel.label(), "Satisfaction Level");
        assert_eq!(Column::SatisfactionLevel.kind(), ColumnKind::Continuous);
        assert!(SalaryLevel::Low < SalaryLevel::High);
    }
}
