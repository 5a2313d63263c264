//! Registry of the 22 analysis questions
//!
//! Each handler receives the already filtered table, computes whatever metric
//! or clustering it needs, builds exactly one chart and pairs it with a fixed
//! interpretation.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::{QuestionMetadata, QUESTION_METADATA, THRESHOLDS};
use crate::data::{Column, SalaryLevel, Table};
use crate::error::AnalysisError;
use crate::metrics;
use crate::model::{cluster_summary, ClusterMemo, ClusterSummary, EmployeeClusterer};
use crate::viz::{
    BarChart, BarEncoding, BinnedFrame, BoxPlot, CategoricalEncoding, ClusterEncoding, ClusterPlot, Heatmap,
    HeatmapEncoding, Highlight, HistogramEncoding, HistogramPlot, KdeEncoding, KdePlot, Palette, RenderedChart,
    ScatterEncoding, ScatterPlot, ThresholdLines, ViolinEncoding, ViolinInner, ViolinPlot, Visualizer,
};

/// Everything a host needs to show one answered question
#[derive(Debug, Clone)]
pub struct QuestionResult {
    pub metadata: &'static QuestionMetadata,
    pub chart: RenderedChart,
    pub interpretation: String,
    /// Set by the high-risk question
    pub high_risk_count: Option<usize>,
    /// Set by the cluster questions
    pub cluster_summary: Option<Vec<ClusterSummary>>,
}

impl QuestionResult {
    pub fn export(&self, path: impl AsRef<Path>, resolution: Option<u32>) -> crate::Result<PathBuf> {
        self.chart.export(path, resolution)
    }

    pub fn present(&self) -> crate::Result<String> {
        self.chart.to_svg()
    }
}

/// Handler output before the registry attaches metadata
struct Answer {
    chart: RenderedChart,
    interpretation: String,
    high_risk_count: Option<usize>,
    cluster_summary: Option<Vec<ClusterSummary>>,
}

impl Answer {
    fn new(chart: &RenderedChart, interpretation: &str) -> Self {
        Self {
            chart: chart.clone(),
            interpretation: interpretation.to_string(),
            high_risk_count: None,
            cluster_summary: None,
        }
    }
}

type Handler = fn(&QuestionMetadata, &Table, &ClusterMemo) -> crate::Result<Answer>;

const HANDLERS: [(&str, Handler); 22] = [
    ("q01_dept_satisfaction", dept_satisfaction),
    ("q02_eval_vs_satisfaction", eval_vs_satisfaction),
    ("q03_projects_vs_satisfaction", projects_vs_satisfaction),
    ("q04_hours_vs_satisfaction", hours_vs_satisfaction),
    ("q05_salary_vs_satisfaction", salary_vs_satisfaction),
    ("q06_left_vs_stayed", left_vs_stayed),
    ("q07_attrition_by_dept", attrition_by_dept),
    ("q08_eval_vs_attrition", eval_vs_attrition),
    ("q09_salary_vs_attrition", salary_vs_attrition),
    ("q10_satisfaction_evaluation_heatmap", satisfaction_evaluation_heatmap),
    ("q11_projects_vs_attrition", projects_vs_attrition),
    ("q12_time_vs_satisfaction", time_vs_satisfaction),
    ("q13_time_vs_attrition", time_vs_attrition),
    ("q14_promotion_vs_satisfaction", promotion_vs_satisfaction),
    ("q15_promotion_vs_attrition", promotion_vs_attrition),
    ("q16_evaluation_vs_projects", evaluation_vs_projects),
    ("q17_employee_clusters", employee_clusters),
    ("q18_cluster_vs_attrition", cluster_vs_attrition),
    ("q19_satisfaction_distribution", satisfaction_distribution),
    ("q20_salary_vs_metrics", salary_vs_metrics),
    ("q21_extreme_projects", extreme_projects),
    ("q22_high_risk_employees", high_risk_employees),
];

struct Entry {
    metadata: &'static QuestionMetadata,
    handler: Handler,
}

/// Question identifiers mapped to handlers, in definition order
pub struct QuestionBank {
    entries: Vec<Entry>,
    clusters: ClusterMemo,
}

impl Default for QuestionBank {
    fn default() -> Self {
        Self::new()
    }
}

impl QuestionBank {
    pub fn new() -> Self {
        Self::with_clusterer(EmployeeClusterer::default())
    }

    /// Registry whose cluster questions use the given clusterer
    pub fn with_clusterer(clusterer: EmployeeClusterer) -> Self {
        let entries = HANDLERS
            .iter()
            .filter_map(|(id, handler)| {
                QUESTION_METADATA
                    .iter()
                    .find(|meta| meta.id == *id)
                    .map(|metadata| Entry {
                        metadata,
                        handler: *handler,
                    })
            })
            .collect();
        Self {
            entries,
            clusters: ClusterMemo::new(clusterer),
        }
    }

    /// All question ids in definition order
    pub fn list_questions(&self) -> Vec<&'static str> {
        self.entries.iter().map(|entry| entry.metadata.id).collect()
    }

    pub fn questions(&self) -> impl Iterator<Item = &'static QuestionMetadata> + '_ {
        self.entries.iter().map(|entry| entry.metadata)
    }

    pub fn metadata(&self, id: &str) -> crate::Result<&'static QuestionMetadata> {
        self.entry(id).map(|entry| entry.metadata)
    }

    pub fn clusters(&self) -> &ClusterMemo {
        &self.clusters
    }

    /// Answer one question over `table`; the table is left untouched
    pub fn run(&self, id: &str, table: &Table) -> crate::Result<QuestionResult> {
        let entry = self.entry(id)?;
        info!(question = id, rows = table.len(), "running analysis");

        let answer = (entry.handler)(entry.metadata, table, &self.clusters)?;
        debug!(question = id, kind = ?answer.chart.kind, "analysis completed");

        Ok(QuestionResult {
            metadata: entry.metadata,
            chart: answer.chart,
            interpretation: answer.interpretation,
            high_risk_count: answer.high_risk_count,
            cluster_summary: answer.cluster_summary,
        })
    }

    fn entry(&self, id: &str) -> crate::Result<&Entry> {
        self.entries
            .iter()
            .find(|entry| entry.metadata.id == id)
            .ok_or_else(|| AnalysisError::NotFound(id.to_string()))
    }
}

fn salary_order() -> Vec<String> {
    SalaryLevel::ALL.iter().map(|s| s.to_string()).collect()
}

fn boxes(
    meta: &QuestionMetadata,
    table: &Table,
    x: Column,
    palette: Palette,
    order: Vec<String>,
    interpretation: &str,
) -> crate::Result<Answer> {
    let mut encoding = CategoricalEncoding::new(x, Column::SatisfactionLevel, meta.title);
    encoding.palette = palette;
    encoding.order = order;
    let mut plot = BoxPlot::new(table);
    Ok(Answer::new(plot.create(encoding)?, interpretation))
}

fn attrition_bars(
    meta: &QuestionMetadata,
    grouped: &metrics::GroupedTable,
    x_label: Option<String>,
    palette: Palette,
    order: Vec<String>,
    interpretation: &str,
) -> crate::Result<Answer> {
    let mut encoding = BarEncoding::new(Column::Left.name(), meta.title);
    encoding.x_label = x_label;
    encoding.y_label = Some("Attrition Rate".to_string());
    encoding.palette = palette;
    encoding.order = order;
    let mut chart = BarChart::new(grouped);
    Ok(Answer::new(chart.create(encoding)?, interpretation))
}

fn dept_satisfaction(meta: &QuestionMetadata, table: &Table, _: &ClusterMemo) -> crate::Result<Answer> {
    boxes(
        meta,
        table,
        Column::Dept,
        Palette::Set3,
        Vec::new(),
        "Departments show varying satisfaction levels with different distributions. \
         Sales and technical departments have the widest satisfaction ranges, indicating \
         potential department-specific issues. Management shows the highest median satisfaction. \
         HR and accounting show relatively consistent satisfaction levels across employees.",
    )
}

fn eval_vs_satisfaction(meta: &QuestionMetadata, table: &Table, _: &ClusterMemo) -> crate::Result<Answer> {
    let mut encoding = ScatterEncoding::new(Column::LastEvaluation, Column::SatisfactionLevel, meta.title);
    encoding.regression = true;
    let mut plot = ScatterPlot::new(table);
    Ok(Answer::new(
        plot.create(encoding)?,
        "There is a positive correlation between evaluation scores and satisfaction levels. \
         Most employees with high evaluations report high satisfaction. However, there's a \
         notable cluster of high performers (evaluation > 0.8) with low satisfaction (< 0.3), \
         indicating potential burnout or recognition issues among top performers.",
    ))
}

fn projects_vs_satisfaction(meta: &QuestionMetadata, table: &Table, _: &ClusterMemo) -> crate::Result<Answer> {
    boxes(
        meta,
        table,
        Column::NumberProject,
        Palette::Pastel1,
        Vec::new(),
        "Employees with 4-5 projects report the highest satisfaction levels. \
         Those with 2 or fewer projects show lower satisfaction, possibly due to underutilization. \
         Employees with 6+ projects show declining satisfaction, indicating potential burnout from \
         excessive workload. The optimal project load appears to be 4-5 projects.",
    )
}

fn hours_vs_satisfaction(meta: &QuestionMetadata, table: &Table, _: &ClusterMemo) -> crate::Result<Answer> {
    let mut encoding = ViolinEncoding::new(Column::AverageMonthlyHours, Column::SatisfactionLevel, meta.title);
    encoding.palette = Palette::Viridis;
    encoding.bins = 6;
    encoding.inner = ViolinInner::Quartile;
    let mut plot = ViolinPlot::new(table);
    Ok(Answer::new(
        plot.create(encoding)?,
        "The violin plot reveals a clear pattern in how satisfaction varies with working hours. \
         Employees working 150-180 hours monthly show the highest satisfaction with a tight distribution. \
         Those working 180-220 hours show moderate satisfaction with more variation. \
         Employees working 220-250+ hours show the lowest satisfaction with a bimodal distribution - \
         indicating some cope well with long hours while others struggle significantly. \
         This provides more insight than a simple scatter plot by showing the full distribution \
         of satisfaction at each hour level, revealing patterns that correlation alone would miss.",
    ))
}

fn salary_vs_satisfaction(meta: &QuestionMetadata, table: &Table, _: &ClusterMemo) -> crate::Result<Answer> {
    boxes(
        meta,
        table,
        Column::Salary,
        Palette::Set2,
        salary_order(),
        "Salary level shows a clear positive relationship with satisfaction. \
         Employees with high salaries report the highest satisfaction levels, \
         while those with low salaries show the lowest satisfaction and greatest \
         variance. However, even high-salary employees have some low-satisfaction outliers, \
         suggesting salary alone doesn't guarantee satisfaction.",
    )
}

fn left_vs_stayed(meta: &QuestionMetadata, table: &Table, _: &ClusterMemo) -> crate::Result<Answer> {
    let grouped = metrics::mean_metrics_by_group(table, Column::Left, &[Column::SatisfactionLevel])?;
    let mut encoding = BarEncoding::new(Column::SatisfactionLevel.name(), meta.title);
    encoding.palette = Palette::Set1;
    let mut chart = BarChart::new(&grouped);
    Ok(Answer::new(
        chart.create(encoding)?,
        "Employees who left the company had significantly lower satisfaction (avg ~0.35) \
         compared to those who stayed (avg ~0.67). This confirms satisfaction is a major \
         driver of attrition. The large difference suggests improving satisfaction could \
         substantially reduce turnover.",
    ))
}

fn attrition_by_dept(meta: &QuestionMetadata, table: &Table, _: &ClusterMemo) -> crate::Result<Answer> {
    let grouped = metrics::attrition_by_group(table, Column::Dept)?;
    attrition_bars(
        meta,
        &grouped,
        None,
        Palette::Set2,
        Vec::new(),
        "Sales, technical, and support departments have the highest attrition rates (18-20%). \
         Management and product departments show the lowest attrition (8-10%). This suggests \
         department-specific factors significantly impact retention, with customer-facing roles \
         being particularly vulnerable to turnover.",
    )
}

fn eval_vs_attrition(meta: &QuestionMetadata, table: &Table, _: &ClusterMemo) -> crate::Result<Answer> {
    let mut encoding = KdeEncoding::new(Column::LastEvaluation, meta.title);
    encoding.hue = Some(Column::Left);
    encoding.palette = Palette::Coolwarm;
    encoding.shade = true;
    let mut plot = KdePlot::new(table);
    Ok(Answer::new(
        plot.create(encoding)?,
        "High performers (evaluation > 0.8) have a bimodal distribution: many stay (satisfied high performers), \
         but a significant group leaves (dissatisfied high performers). This 'high performer attrition' is \
         particularly concerning as these employees represent valuable talent. Low performers (evaluation < 0.6) \
         are more likely to stay, possibly due to fewer job opportunities.",
    ))
}

fn salary_vs_attrition(meta: &QuestionMetadata, table: &Table, _: &ClusterMemo) -> crate::Result<Answer> {
    let grouped = metrics::attrition_by_group(table, Column::Salary)?;
    attrition_bars(
        meta,
        &grouped,
        None,
        Palette::Set3,
        salary_order(),
        "Attrition rate is dramatically higher for low-salary employees (25%) compared to \
         medium (13%) and high (5%) salary bands. This confirms compensation is a major \
         driver of retention. Even small salary increases could potentially reduce turnover \
         significantly among low-salary employees.",
    )
}

fn satisfaction_evaluation_heatmap(meta: &QuestionMetadata, table: &Table, _: &ClusterMemo) -> crate::Result<Answer> {
    let frame = BinnedFrame::from_table(table, Column::SatisfactionLevel, Column::LastEvaluation, Column::Left, 5)?;
    let mut encoding = HeatmapEncoding::new(meta.title);
    encoding.x_label = Some("Satisfaction Bin".to_string());
    encoding.y_label = Some("Evaluation Bin".to_string());
    let mut heatmap = Heatmap::new(&frame);
    Ok(Answer::new(
        heatmap.create(encoding)?,
        "The highest attrition occurs among employees with LOW satisfaction (0.1-0.3) and HIGH evaluation scores (0.8-1.0) (bottom-left cell). \
         This represents the most critical risk group: high performers who are dissatisfied. \
         Employees with high satisfaction (0.7-0.9) show low attrition regardless of evaluation score. \
         Low performers with low satisfaction also show high attrition, but they represent less business risk.",
    ))
}

fn projects_vs_attrition(meta: &QuestionMetadata, table: &Table, _: &ClusterMemo) -> crate::Result<Answer> {
    let mut encoding = ScatterEncoding::new(Column::NumberProject, Column::SatisfactionLevel, meta.title);
    encoding.hue = Some(Column::Left);
    encoding.palette = Palette::Coolwarm;
    encoding.alpha = 0.7;
    let mut plot = ScatterPlot::new(table);
    Ok(Answer::new(
        plot.create(encoding)?,
        "Employees who left fall into two distinct patterns: those with very few projects (1-2) \
         and low satisfaction (possibly underutilized), and those with many projects (6+) and \
         low satisfaction (overworked). The optimal zone appears to be 3-5 projects with \
         satisfaction > 0.5, where very few employees leave.",
    ))
}

fn time_vs_satisfaction(meta: &QuestionMetadata, table: &Table, _: &ClusterMemo) -> crate::Result<Answer> {
    boxes(
        meta,
        table,
        Column::TimeSpendCompany,
        Palette::Set1,
        Vec::new(),
        "Satisfaction follows a U-shaped pattern over time. New employees (1-2 years) show \
         moderate satisfaction, which dips at 3-5 years (potential stagnation period), then \
         recovers for long-tenured employees (6+ years). The lowest satisfaction is among \
         employees with 3-4 years of tenure, suggesting this is a critical retention period.",
    )
}

fn time_vs_attrition(meta: &QuestionMetadata, table: &Table, _: &ClusterMemo) -> crate::Result<Answer> {
    let grouped = metrics::attrition_by_group(table, Column::TimeSpendCompany)?;
    attrition_bars(
        meta,
        &grouped,
        None,
        Palette::Set2,
        Vec::new(),
        "Attrition follows a similar U-shaped pattern to satisfaction. The highest attrition \
         rates occur at 3 years (peak turnover) and then again after 6 years. New employees \
         (1 year) show moderate attrition, possibly due to poor fit, while very long-tenured \
         employees (7-10 years) may leave for career advancement or retirement.",
    )
}

fn promotion_vs_satisfaction(meta: &QuestionMetadata, table: &Table, _: &ClusterMemo) -> crate::Result<Answer> {
    boxes(
        meta,
        table,
        Column::PromotionLast5Years,
        Palette::Set2,
        Vec::new(),
        "Promoted employees show significantly higher satisfaction levels than non-promoted employees. \
         The median satisfaction for promoted employees is approximately 0.75, compared to 0.65 for \
         non-promoted. This highlights career growth as a key driver of employee satisfaction. \
         Note that very few employees received promotions (only ~5%), making this a high-impact factor.",
    )
}

fn promotion_vs_attrition(meta: &QuestionMetadata, table: &Table, _: &ClusterMemo) -> crate::Result<Answer> {
    let grouped = metrics::attrition_by_group(table, Column::PromotionLast5Years)?;
    attrition_bars(
        meta,
        &grouped,
        None,
        Palette::Set3,
        Vec::new(),
        "Promotion is strongly associated with retention. Only about 5% of promoted employees left, \
         compared to approximately 25% of non-promoted employees. This represents a 5x difference in \
         attrition rates. Given that promotions are rare (only ~5% of employees received one), \
         increasing promotion opportunities could be a highly effective retention strategy.",
    )
}

fn evaluation_vs_projects(meta: &QuestionMetadata, table: &Table, _: &ClusterMemo) -> crate::Result<Answer> {
    let mut encoding = ScatterEncoding::new(Column::LastEvaluation, Column::NumberProject, meta.title);
    encoding.size = Some(Column::AverageMonthlyHours);
    encoding.alpha = 0.6;
    let mut plot = ScatterPlot::new(table);
    Ok(Answer::new(
        plot.create(encoding)?,
        "High performers (evaluation > 0.8) typically handle 4-6 projects. Those with the highest \
         project loads (6+) often work the most hours (larger points), suggesting potential burnout. \
         A concerning pattern is high performers with low project counts (1-2 projects) - these \
         employees may be underutilized despite their capabilities. The ideal pattern appears to be \
         4-5 projects with evaluation scores of 0.7-0.9.",
    ))
}

fn employee_clusters(meta: &QuestionMetadata, table: &Table, clusters: &ClusterMemo) -> crate::Result<Answer> {
    let clustered = clusters.fit(table)?;
    let mut plot = ClusterPlot::new(&clustered);
    let mut answer = Answer::new(
        plot.create(ClusterEncoding::new(meta.title))?,
        "K-means clustering identified 3 distinct employee segments:\n\n\
         1. **Satisfied & Balanced** (Cluster 0): High satisfaction (0.7+), moderate evaluation (0.6-0.7), \
         and reasonable workload (180-220 hours/month)\n\n\
         2. **Overworked & Dissatisfied** (Cluster 1): Low satisfaction (<0.4), high evaluation (>0.8), \
         and excessive hours (>250/month) - highest attrition risk\n\n\
         3. **High-Performing & Busy** (Cluster 2): Moderate satisfaction (0.4-0.6), highest evaluation (>0.8), \
         and high workload (220-250 hours/month)",
    );
    answer.cluster_summary = Some(cluster_summary(&clustered));
    Ok(answer)
}

fn cluster_vs_attrition(meta: &QuestionMetadata, table: &Table, clusters: &ClusterMemo) -> crate::Result<Answer> {
    let clustered = clusters.fit(table)?;
    let grouped = clustered.attrition_by_cluster();
    let mut answer = attrition_bars(
        meta,
        &grouped,
        Some("Cluster".to_string()),
        Palette::Set3,
        Vec::new(),
        "Cluster 1 (Overworked & Dissatisfied) shows dramatically higher attrition (45%) \
         compared to Cluster 0 (Satisfied & Balanced, 5%) and Cluster 2 (High-Performing & Busy, 20%). \
         This confirms that the combination of high performance with low satisfaction is the \
         most dangerous pattern for retention. Targeted interventions for Cluster 1 employees \
         should be the highest priority for reducing overall attrition.",
    )?;
    answer.cluster_summary = Some(cluster_summary(&clustered));
    Ok(answer)
}

fn satisfaction_distribution(meta: &QuestionMetadata, table: &Table, _: &ClusterMemo) -> crate::Result<Answer> {
    let mut encoding = HistogramEncoding::new(Column::SatisfactionLevel, meta.title);
    encoding.bins = 20;
    encoding.kde = true;
    let mut plot = HistogramPlot::new(table);
    Ok(Answer::new(
        plot.create(encoding)?,
        "Satisfaction follows a bimodal distribution with peaks at low (~0.1) and moderate-high (~0.7) levels. \
         Approximately 20% of employees report very low satisfaction (<0.2), representing a high-risk group. \
         The majority (60%) report satisfaction between 0.4-0.8, while only 20% report very high satisfaction (>0.9). \
         This distribution suggests two distinct employee experiences within the organization.",
    ))
}

fn salary_vs_metrics(meta: &QuestionMetadata, table: &Table, _: &ClusterMemo) -> crate::Result<Answer> {
    let metrics = [Column::NumberProject, Column::LastEvaluation, Column::SatisfactionLevel];
    let grouped = metrics::mean_metrics_by_group(table, Column::Salary, &metrics)?;
    let mut encoding = BarEncoding::new(Column::NumberProject.name(), meta.title);
    encoding.values = grouped.value_columns.clone();
    encoding.y_label = Some("Value".to_string());
    encoding.palette = Palette::Set2;
    encoding.order = salary_order();
    let mut chart = BarChart::new(&grouped);
    Ok(Answer::new(
        chart.create(encoding)?,
        "Higher salary levels correlate with higher project loads, better evaluation scores, \
         and greater satisfaction. High-salary employees handle the most projects (avg 4.5) \
         while maintaining high performance (0.85) and satisfaction (0.75). Low-salary employees \
         have fewer projects (avg 3.5) but lower performance (0.70) and satisfaction (0.55). \
         This suggests higher performers are appropriately compensated, but there's room to \
         improve satisfaction for lower-salary employees.",
    ))
}

fn extreme_projects(meta: &QuestionMetadata, table: &Table, _: &ClusterMemo) -> crate::Result<Answer> {
    let mut encoding = ScatterEncoding::new(Column::NumberProject, Column::SatisfactionLevel, meta.title);
    encoding.alpha = 0.7;
    encoding.thresholds = ThresholdLines {
        horizontal: Some(THRESHOLDS.low_satisfaction),
        vertical: Some(THRESHOLDS.high_projects),
    };
    let mut plot = ScatterPlot::new(table);
    Ok(Answer::new(
        plot.create(encoding)?,
        "Employees with extreme project loads face significant satisfaction challenges. \
         Those with 1-2 projects show lower satisfaction, possibly due to underutilization. \
         Employees with 6+ projects and satisfaction below 0.4 (red zone) are at particularly \
         high risk of leaving. The data suggests an optimal range of 3-5 projects for maintaining \
         employee satisfaction and reducing attrition risk.",
    ))
}

fn high_risk_employees(meta: &QuestionMetadata, table: &Table, _: &ClusterMemo) -> crate::Result<Answer> {
    let high_risk = metrics::high_risk_employees(table);
    let count = high_risk.len();

    let mut encoding = ScatterEncoding::new(Column::LastEvaluation, Column::SatisfactionLevel, meta.title);
    encoding.size = Some(Column::AverageMonthlyHours);
    encoding.alpha = 0.5;
    encoding.highlight = Some(Highlight {
        label: "High Risk".to_string(),
        records: high_risk,
    });
    let mut plot = ScatterPlot::new(table);

    let interpretation = format!(
        "We've identified {} high-risk employees who combine high performance \
         (evaluation > {}), excessive workload (>{} hours/month), and low satisfaction (<{}). \
         These valuable employees are at imminent risk of leaving. They represent the highest \
         priority for retention efforts as their departure would cause significant business impact. \
         Targeted interventions should focus on workload redistribution, recognition, and career pathing.",
        count, THRESHOLDS.high_evaluation, THRESHOLDS.high_hours, THRESHOLDS.low_satisfaction
    );
    let mut answer = Answer::new(plot.create(encoding)?, &interpretation);
    answer.high_risk_count = Some(count);
    Ok(answer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::EmployeeRecord;
    use crate::viz::{ChartKind, Plot};

    const DEPARTMENTS: [&str; 7] = ["sales", "technical", "support", "hr", "management", "IT", "product"];

    fn workforce() -> Table {
        let mut records: Vec<EmployeeRecord> = (0..60usize)
            .map(|i| {
                let satisfaction = 0.09 + ((i * 37) % 91) as f64 / 100.0;
                EmployeeRecord {
                    satisfaction_level: Some(satisfaction),
                    last_evaluation: Some(0.36 + ((i * 53) % 64) as f64 / 100.0),
                    number_project: Some(2 + (i % 6) as u32),
                    average_monthly_hours: Some(96 + ((i * 71) % 215) as u32),
                    time_spend_company: Some(2 + (i % 9) as u32),
                    work_accident: Some(i % 7 == 0),
                    left: satisfaction < 0.4 || i % 5 == 0,
                    promotion_last_5years: Some(i % 8 == 0),
                    dept: Some(DEPARTMENTS[i % DEPARTMENTS.len()].to_string()),
                    salary: Some(SalaryLevel::ALL[i % 3]),
                }
            })
            .collect();
        for (satisfaction, evaluation, hours) in [(0.15, 0.92, 280), (0.3, 0.85, 265), (0.11, 0.97, 301)] {
            records.push(EmployeeRecord {
                satisfaction_level: Some(satisfaction),
                last_evaluation: Some(evaluation),
                number_project: Some(6),
                average_monthly_hours: Some(hours),
                time_spend_company: Some(4),
                work_accident: Some(false),
                left: true,
                promotion_last_5years: Some(false),
                dept: Some("sales".to_string()),
                salary: Some(SalaryLevel::Low),
            });
        }
        Table::from_records(records)
    }

    #[test]
    fn test_lists_all_questions_in_order() {
        let bank = QuestionBank::new();
        let ids = bank.list_questions();
        assert_eq!(ids.len(), 22);
        assert_eq!(ids[0], "q01_dept_satisfaction");
        assert_eq!(ids[21], "q22_high_risk_employees");
        let configured: Vec<&str> = QUESTION_METADATA.iter().map(|m| m.id).collect();
        assert_eq!(ids, configured);
    }

    #[test]
    fn test_unknown_question_is_not_found() {
        let bank = QuestionBank::new();
        assert!(matches!(
            bank.metadata("q23_nonexistent"),
            Err(AnalysisError::NotFound(_))
        ));
        assert!(matches!(
            bank.run("q23_nonexistent", &workforce()),
            Err(AnalysisError::NotFound(_))
        ));
        assert_eq!(
            bank.metadata("q07_attrition_by_dept").unwrap().title,
            "Attrition Rate by Department"
        );
    }

    #[test]
    fn test_every_question_answers_without_touching_input() {
        let bank = QuestionBank::new();
        let table = workforce();
        let before = table.fingerprint();

        for id in bank.list_questions() {
            let result = bank
                .run(id, &table)
                .unwrap_or_else(|e| panic!("{} failed: {}", id, e));
            assert_eq!(result.metadata.id, id);
            assert_eq!(result.chart.frame.title, result.metadata.title);
            assert!(!result.interpretation.is_empty());
        }
        assert_eq!(table.fingerprint(), before);
    }

    #[test]
    fn test_chart_kinds_per_question() {
        let bank = QuestionBank::new();
        let table = workforce();
        let kind = |id: &str| bank.run(id, &table).unwrap().chart.kind;

        assert_eq!(kind("q01_dept_satisfaction"), ChartKind::Box);
        assert_eq!(kind("q04_hours_vs_satisfaction"), ChartKind::Violin);
        assert_eq!(kind("q08_eval_vs_attrition"), ChartKind::Kde);
        assert_eq!(kind("q10_satisfaction_evaluation_heatmap"), ChartKind::Heatmap);
        assert_eq!(kind("q17_employee_clusters"), ChartKind::Cluster);
        assert_eq!(kind("q19_satisfaction_distribution"), ChartKind::Histogram);
        assert_eq!(kind("q20_salary_vs_metrics"), ChartKind::Bar);
    }

    #[test]
    fn test_high_risk_count_is_reported() {
        let bank = QuestionBank::new();
        let table = workforce();
        let result = bank.run("q22_high_risk_employees", &table).unwrap();

        let expected = metrics::high_risk_employees(&table).len();
        assert!(expected >= 3);
        assert_eq!(result.high_risk_count, Some(expected));
        assert!(result
            .interpretation
            .starts_with(&format!("We've identified {} high-risk employees", expected)));
    }

    #[test]
    fn test_cluster_questions_share_one_fit() {
        let bank = QuestionBank::new();
        let table = workforce();

        let clusters = bank.run("q17_employee_clusters", &table).unwrap();
        let attrition = bank.run("q18_cluster_vs_attrition", &table).unwrap();
        assert_eq!(bank.clusters().len(), 1);

        let summary = clusters.cluster_summary.unwrap();
        assert_eq!(summary.len(), 3);
        assert_eq!(attrition.cluster_summary.unwrap(), summary);

        let Plot::Bars(bars) = &attrition.chart.plot else {
            panic!("expected bars");
        };
        assert_eq!(attrition.chart.frame.x_label, "Cluster");
        assert!(bars.series[0].values.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_cluster_question_on_uniform_rows() {
        let record = EmployeeRecord {
            satisfaction_level: Some(0.5),
            last_evaluation: Some(0.5),
            average_monthly_hours: Some(200),
            ..EmployeeRecord::default()
        };
        let table = Table::from_records(vec![record; 5]);
        let bank = QuestionBank::new();

        let result = bank.run("q17_employee_clusters", &table).unwrap();
        let summary = result.cluster_summary.unwrap();
        assert_eq!(summary.len(), 3);
        assert_eq!(summary.iter().map(|s| s.size).sum::<usize>(), 5);
        assert!(bank.run("q18_cluster_vs_attrition", &table).is_ok());
    }

    #[test]
    fn test_salary_questions_use_band_order() {
        let bank = QuestionBank::new();
        let result = bank.run("q20_salary_vs_metrics", &workforce()).unwrap();
        let Plot::Bars(bars) = &result.chart.plot else {
            panic!("expected bars");
        };
        assert_eq!(bars.categories, vec!["low", "medium", "high"]);
        assert_eq!(bars.series.len(), 3);
        assert!(bars.legend);
    }
}
