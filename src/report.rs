//! Plain-text analysis report for the selected question and filters

use chrono::{Local, NaiveDateTime};

use crate::data::{Column, EmployeeRecord, Table, TableFilter};
use crate::metrics::KeyMetrics;
use crate::questions::QuestionResult;

/// Rows shown in the data sample section
pub const SAMPLE_ROWS: usize = 5;

/// Render the report stamped with the current local time
pub fn build_report(filter: &TableFilter, metrics: &KeyMetrics, result: &QuestionResult, sample: &Table) -> String {
    build_report_at(filter, metrics, result, sample, Local::now().naive_local())
}

pub fn build_report_at(
    filter: &TableFilter,
    metrics: &KeyMetrics,
    result: &QuestionResult,
    sample: &Table,
    generated: NaiveDateTime,
) -> String {
    let (departments, salaries) = if filter.is_active() {
        (
            filter.departments.join(", "),
            filter
                .salaries
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        )
    } else {
        ("All".to_string(), "All".to_string())
    };

    let mut report = format!(
        "EMPLOYEE SATISFACTION ANALYSIS REPORT\n\
         Generated: {generated}\n\
         \n\
         FILTERS APPLIED:\n\
         - Departments: {departments}\n\
         - Salary Levels: {salaries}\n\
         \n\
         KEY METRICS:\n\
         - Total Employees: {total}\n\
         - Attrition Rate: {rate:.1}%\n\
         - High-Risk Employees: {high_risk} ({share:.1}%)\n\
         \n\
         SELECTED ANALYSIS: {title}\n\
         {interpretation}\n",
        generated = generated.format("%Y-%m-%d %H:%M:%S"),
        total = metrics.total_employees,
        rate = metrics.attrition_rate * 100.0,
        high_risk = metrics.high_risk_count,
        share = metrics.high_risk_share * 100.0,
        title = result.metadata.title,
        interpretation = result.interpretation,
    );

    if let Some(count) = result.high_risk_count {
        report.push_str(&format!("High-risk employees in view: {}\n", count));
    }
    if let Some(summary) = &result.cluster_summary {
        report.push_str("\nCLUSTER SUMMARY:\n");
        for row in summary {
            report.push_str(&format!(
                "- Cluster {}: {} employees, satisfaction {:.2}, evaluation {:.2}, hours {:.1}, projects {:.1}, attrition {:.1}%\n",
                row.cluster_id,
                row.size,
                row.avg_satisfaction,
                row.avg_evaluation,
                row.avg_hours,
                row.avg_projects,
                row.attrition_rate * 100.0
            ));
        }
    }
    report.push_str("\nDATA SAMPLE:\n");
    report.push_str(&markdown_sample(sample, SAMPLE_ROWS));
    report
}

/// Suggested file name for a report generated at `generated`
pub fn report_file_name(generated: NaiveDateTime) -> String {
    format!("employee_analysis_{}.txt", generated.format("%Y%m%d_%H%M%S"))
}

/// First `rows` records as a markdown table over the columns the table carries
pub fn markdown_sample(table: &Table, rows: usize) -> String {
    let columns: Vec<Column> = table.columns().collect();
    let header: Vec<&str> = columns.iter().map(|c| c.name()).collect();

    let mut lines = vec![
        format!("| {} |", header.join(" | ")),
        format!("|{}", "---|".repeat(columns.len())),
    ];
    lines.extend(table.iter().take(rows).map(|record| {
        let cells: Vec<String> = columns.iter().map(|c| cell(record, *c)).collect();
        format!("| {} |", cells.join(" | "))
    }));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn cell(record: &EmployeeRecord, column: Column) -> String {
    let text = match column {
        Column::SatisfactionLevel | Column::LastEvaluation => record.value(column).map(|v| format!("{}", v)),
        _ => record.key(column).map(|k| k.to_string()),
    };
    text.unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SalaryLevel;
    use crate::metrics;
    use crate::questions::QuestionBank;
    use chrono::NaiveDate;

    fn table() -> Table {
        Table::from_records(
            (0..8u32)
                .map(|i| EmployeeRecord {
                    satisfaction_level: Some(0.1 + f64::from(i) * 0.1),
                    last_evaluation: Some(0.5 + f64::from(i) * 0.05),
                    number_project: Some(2 + i % 4),
                    average_monthly_hours: Some(150 + i * 20),
                    time_spend_company: Some(3),
                    work_accident: Some(false),
                    left: i < 2,
                    promotion_last_5years: Some(false),
                    dept: Some(if i % 2 == 0 { "sales" } else { "hr" }.to_string()),
                    salary: Some(SalaryLevel::ALL[i as usize % 3]),
                })
                .collect(),
        )
    }

    fn generated() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .and_then(|d| d.and_hms_opt(14, 7, 9))
            .unwrap()
    }

    #[test]
    fn test_report_sections() {
        let table = table();
        let filter = TableFilter {
            departments: vec!["sales".to_string(), "hr".to_string()],
            salaries: vec![SalaryLevel::Low, SalaryLevel::High],
        };
        let result = QuestionBank::new().run("q07_attrition_by_dept", &table).unwrap();
        let report = build_report_at(&filter, &metrics::key_metrics(&table), &result, &table, generated());

        assert!(report.starts_with("EMPLOYEE SATISFACTION ANALYSIS REPORT\nGenerated: 2024-03-05 14:07:09\n"));
        assert!(report.contains("- Departments: sales, hr\n"));
        assert!(report.contains("- Salary Levels: low, high\n"));
        assert!(report.contains("- Total Employees: 8\n"));
        assert!(report.contains("- Attrition Rate: 25.0%\n"));
        assert!(report.contains("SELECTED ANALYSIS: Attrition Rate by Department\n"));
        assert!(report.contains(&result.interpretation));
        assert!(!report.contains("CLUSTER SUMMARY"));
    }

    #[test]
    fn test_half_selection_reports_all() {
        let table = table();
        let filter = TableFilter {
            departments: vec!["sales".to_string()],
            salaries: Vec::new(),
        };
        let result = QuestionBank::new().run("q19_satisfaction_distribution", &table).unwrap();
        let report = build_report_at(&filter, &metrics::key_metrics(&table), &result, &table, generated());

        assert!(report.contains("- Departments: All\n- Salary Levels: All\n"));
        assert!(report.ends_with("|\n"));
    }

    #[test]
    fn test_sample_is_limited_markdown() {
        let sample = markdown_sample(&table(), SAMPLE_ROWS);
        let lines: Vec<&str> = sample.lines().collect();
        assert_eq!(lines.len(), 2 + SAMPLE_ROWS);
        assert!(lines[0].starts_with("| satisfaction_level | last_evaluation |"));
        assert!(lines[2].starts_with("| 0.1 | 0.5 | 2 | 150 |"));
        assert!(lines[2].ends_with("| sales | low |"));
    }

    #[test]
    fn test_file_name_uses_timestamp() {
        assert_eq!(report_file_name(generated()), "employee_analysis_20240305_140709.txt");
    }
}
