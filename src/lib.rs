//! Attrition Analyzer: employee satisfaction and attrition analysis
//!
//! This library loads an employee CSV export, computes attrition metrics,
//! segments employees with K-Means and answers 22 predefined questions,
//! each with one chart and a written interpretation.

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod model;
pub mod questions;
pub mod report;
pub mod stats;
pub mod viz;

// Re-export public items for easier access
pub use cli::Args;
pub use config::{QuestionMetadata, QUESTION_METADATA, THRESHOLDS, VISUALIZATION_DEFAULTS};
pub use data::{load_employee_data, Column, DataCache, EmployeeRecord, LabelSource, SalaryLevel, Table, TableFilter};
pub use error::AnalysisError;
pub use metrics::{attrition_by_group, attrition_rate, high_risk_employees, key_metrics, GroupedTable, KeyMetrics};
pub use model::{cluster_summary, ClusterMemo, ClusterSummary, ClusteredTable, EmployeeClusterer};
pub use questions::{QuestionBank, QuestionResult};
pub use report::build_report;
pub use viz::{RenderedChart, Visualizer};

/// Common result type used throughout the library
pub type Result<T> = error::Result<T>;
