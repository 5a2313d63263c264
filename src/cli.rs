//! Command-line interface definitions and argument parsing

use std::path::PathBuf;

use clap::Parser;

use crate::config::DEFAULT_DATA_PATH;
use crate::data::{SalaryLevel, TableFilter};

/// Employee satisfaction and attrition analysis over a CSV export
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the employee CSV file
    #[arg(short, long, env = "ATTRITION_DATA", default_value = DEFAULT_DATA_PATH)]
    pub data: PathBuf,

    /// Question id to answer, e.g. q07_attrition_by_dept (defaults to the first question)
    #[arg(short, long)]
    pub question: Option<String>,

    /// List the available questions and exit
    #[arg(short, long)]
    pub list: bool,

    /// Keep only these departments (repeatable)
    #[arg(long = "dept")]
    pub departments: Vec<String>,

    /// Keep only these salary bands: low, medium, high (repeatable)
    #[arg(long = "salary")]
    pub salaries: Vec<String>,

    /// Directory for exported charts and reports
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// Export resolution in dots per inch
    #[arg(long)]
    pub dpi: Option<u32>,

    /// Also write a plain-text report next to the chart
    #[arg(short, long)]
    pub report: bool,

    /// Export the chart as SVG instead of PNG
    #[arg(long)]
    pub svg: bool,

    /// Print the K-Means cluster summary for the filtered data
    #[arg(short, long)]
    pub clusters: bool,

    /// Print the result as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Build the department / salary filter from the repeated flags
    pub fn table_filter(&self) -> anyhow::Result<TableFilter> {
        let salaries = self
            .salaries
            .iter()
            .map(|s| {
                s.parse::<SalaryLevel>()
                    .map_err(|_| anyhow::anyhow!("Invalid salary level: {} (expected low, medium or high)", s))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(TableFilter {
            departments: self.departments.iter().map(|d| d.trim().to_string()).collect(),
            salaries,
        })
    }

    /// Export target for a question's chart
    pub fn chart_path(&self, question: &str) -> PathBuf {
        let extension = if self.svg { "svg" } else { "png" };
        self.output.join(format!("{}.{}", question, extension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["attrition-analyzer", "--data", "employees.csv"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_table_filter() {
        let mut args = args(&["--dept", "sales", "--dept", "IT", "--salary", "High", "--salary", "low"]);
        let filter = args.table_filter().unwrap();
        assert_eq!(filter.departments, vec!["sales", "IT"]);
        assert_eq!(filter.salaries, vec![SalaryLevel::High, SalaryLevel::Low]);

        args.salaries = vec!["enormous".to_string()];
        assert!(args.table_filter().is_err());

        args.departments.clear();
        args.salaries.clear();
        assert!(args.table_filter().unwrap().is_empty());
    }

    #[test]
    fn test_chart_path_extension() {
        let png = args(&["--output", "charts"]);
        assert_eq!(png.chart_path("q05_salary_vs_satisfaction"), PathBuf::from("charts/q05_salary_vs_satisfaction.png"));

        let svg = args(&["--svg"]);
        assert_eq!(svg.chart_path("q05_salary_vs_satisfaction"), PathBuf::from("output/q05_salary_vs_satisfaction.svg"));
    }

    #[test]
    fn test_defaults() {
        let args = args(&[]);
        assert_eq!(args.data, PathBuf::from("employees.csv"));
        assert!(args.question.is_none());
        assert!(args.dpi.is_none());
        assert!(!args.list && !args.report && !args.clusters && !args.json);
    }
}
