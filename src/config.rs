//! Static configuration: business thresholds, visualization defaults and question metadata

use serde::Serialize;

/// Default location of the dataset, relative to the working directory
pub const DEFAULT_DATA_PATH: &str = "data/Employee Attrition.csv";

/// Business thresholds shared by the metrics and the question handlers
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdSet {
    pub low_satisfaction: f64,
    pub high_evaluation: f64,
    pub high_hours: f64,
    pub high_projects: f64,
}

pub const THRESHOLDS: ThresholdSet = ThresholdSet {
    low_satisfaction: 0.4,
    high_evaluation: 0.8,
    high_hours: 250.0,
    high_projects: 6.0,
};

/// Defaults applied by every visualizer unless an encoding overrides them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualizationDefaults {
    /// Figure size in inches (width, height)
    pub figure_size: (u32, u32),
    pub palette: &'static str,
    /// Requested tick label rotation in degrees
    pub rotation: u32,
    pub alpha: f64,
    pub dpi: u32,
}

pub const VISUALIZATION_DEFAULTS: VisualizationDefaults = VisualizationDefaults {
    figure_size: (10, 6),
    palette: "Set2",
    rotation: 45,
    alpha: 0.7,
    dpi: 100,
};

/// Title and description of one analysis question
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionMetadata {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

const fn question(
    id: &'static str,
    title: &'static str,
    description: &'static str,
) -> QuestionMetadata {
    QuestionMetadata {
        id,
        title,
        description,
    }
}

/// Metadata for all 22 questions, in definition order
pub static QUESTION_METADATA: [QuestionMetadata; 22] = [
    question(
        "q01_dept_satisfaction",
        "Employee Satisfaction Level by Department",
        "Box plot showing satisfaction distribution across departments",
    ),
    question(
        "q02_eval_vs_satisfaction",
        "Satisfaction Level vs Last Evaluation Score",
        "Scatter plot with trendline showing correlation between satisfaction and evaluation",
    ),
    question(
        "q03_projects_vs_satisfaction",
        "Satisfaction Level by Number of Projects",
        "Violin plot showing satisfaction distribution across project counts",
    ),
    question(
        "q04_hours_vs_satisfaction",
        "Satisfaction Level vs Average Monthly Hours",
        "Scatter plot with density highlighting concentration areas",
    ),
    question(
        "q05_salary_vs_satisfaction",
        "Satisfaction Level by Salary Level",
        "Box plot comparing satisfaction across salary categories",
    ),
    question(
        "q06_left_vs_stayed",
        "Average Satisfaction: Employees Who Left vs Stayed",
        "Bar chart comparing mean satisfaction for attrition status",
    ),
    question(
        "q07_attrition_by_dept",
        "Attrition Rate by Department",
        "Bar chart showing proportion of employees who left per department",
    ),
    question(
        "q08_eval_vs_attrition",
        "Last Evaluation Distribution: Left vs Stayed",
        "Histogram overlay showing evaluation scores for attrition status",
    ),
    question(
        "q09_salary_vs_attrition",
        "Attrition Rate by Salary Level",
        "Bar chart showing attrition rates across salary bands",
    ),
    question(
        "q10_satisfaction_evaluation_heatmap",
        "Attrition Rate by Satisfaction and Evaluation",
        "2D heatmap revealing high-risk employee segments",
    ),
    question(
        "q11_projects_vs_attrition",
        "Projects vs Satisfaction by Attrition Status",
        "Scatter plot colored by attrition status",
    ),
    question(
        "q12_time_vs_satisfaction",
        "Satisfaction Level by Time Spent at Company",
        "Box plot showing satisfaction by tenure",
    ),
    question(
        "q13_time_vs_attrition",
        "Attrition Rate by Time Spent at Company",
        "Bar chart showing attrition by tenure",
    ),
    question(
        "q14_promotion_vs_satisfaction",
        "Satisfaction Level by Promotion Status",
        "Box plot comparing satisfaction for promoted vs non-promoted",
    ),
    question(
        "q15_promotion_vs_attrition",
        "Attrition Rate by Promotion Status",
        "Bar chart showing attrition rates by promotion status",
    ),
    question(
        "q16_evaluation_vs_projects",
        "Evaluation vs Projects, Sized by Hours",
        "Scatter plot showing relationship between evaluation, projects, and hours",
    ),
    question(
        "q17_employee_clusters",
        "Employee Clusters (Satisfaction, Evaluation, Hours)",
        "PCA scatter plot showing distinct employee segments",
    ),
    question(
        "q18_cluster_vs_attrition",
        "Attrition Rate by Employee Cluster",
        "Bar chart showing attrition risk by cluster",
    ),
    question(
        "q19_satisfaction_distribution",
        "Distribution of Satisfaction Levels",
        "Histogram with KDE showing overall satisfaction distribution",
    ),
    question(
        "q20_salary_vs_metrics",
        "Average Metrics by Salary Level",
        "Grouped bar chart showing project load, performance, and satisfaction by salary",
    ),
    question(
        "q21_extreme_projects",
        "Projects vs Satisfaction with Outliers",
        "Scatter plot highlighting employees with extreme project loads",
    ),
    question(
        "q22_high_risk_employees",
        "High-Risk Employees",
        "Scatter plot highlighting valuable but at-risk employees",
    ),
];
