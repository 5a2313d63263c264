//! Attrition Analyzer: answers one of the predefined employee attrition questions
//!
//! This is the main entrypoint that orchestrates data loading, filtering,
//! question dispatch, chart export and the optional report.

use std::fs;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use attrition_analyzer::metrics::describe;
use attrition_analyzer::{
    build_report, key_metrics, report::report_file_name, Args, ClusterSummary, DataCache, KeyMetrics,
    QuestionBank, QuestionResult,
};

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "attrition_analyzer=debug" } else { "attrition_analyzer=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let bank = QuestionBank::new();
    if args.list {
        list_questions(&bank, args.json)?;
        return Ok(());
    }

    run_question(&args, &bank)
}

/// Print every question id with its title
fn list_questions(bank: &QuestionBank, json: bool) -> Result<()> {
    if json {
        let metadata: Vec<_> = bank.questions().collect();
        println!("{}", serde_json::to_string_pretty(&metadata)?);
        return Ok(());
    }

    println!("=== Available Questions ===\n");
    for meta in bank.questions() {
        println!("{:<38} {}", meta.id, meta.title);
    }
    Ok(())
}

/// Load, filter, answer one question and export its chart
fn run_question(args: &Args, bank: &QuestionBank) -> Result<()> {
    let start_time = Instant::now();

    let question = match &args.question {
        Some(id) => id.clone(),
        None => bank
            .list_questions()
            .first()
            .map(|id| id.to_string())
            .context("no questions registered")?,
    };
    // fail on a bad id before paying for the load
    bank.metadata(&question)?;

    let cache = DataCache::new(&args.data);
    let table = cache
        .load()
        .with_context(|| format!("failed to load employee data from {}", args.data.display()))?;
    if args.verbose {
        println!("Loaded {} employees from {}", table.len(), args.data.display());
        print_column_summary(&table);
    }

    let filter = args.table_filter()?;
    if !filter.is_empty() && !filter.is_active() {
        warn!("both --dept and --salary are needed to filter; using every row");
    }
    let filtered = filter.apply(&table);
    if filtered.is_empty() {
        warn!("filters removed every row");
        anyhow::bail!("No data available for the selected filters. Please adjust your selections.");
    }

    let metrics = key_metrics(&filtered);
    let result = bank
        .run(&question, &filtered)
        .with_context(|| format!("analysis {} failed", question))?;

    let chart_path = result
        .export(args.chart_path(&question), args.dpi)
        .context("failed to export chart")?;

    let cluster_summary = if args.clusters {
        Some(cluster_details(args, bank, &filtered)?)
    } else {
        None
    };

    let report_path = if args.report {
        let report = build_report(&filter, &metrics, &result, &filtered);
        let path = args.output.join(report_file_name(Local::now().naive_local()));
        fs::write(&path, report).with_context(|| format!("failed to write report to {}", path.display()))?;
        Some(path)
    } else {
        None
    };

    if args.json {
        let output = serde_json::json!({
            "metadata": result.metadata,
            "interpretation": result.interpretation,
            "key_metrics": metrics,
            "chart": { "kind": result.chart.kind, "path": chart_path },
            "high_risk_count": result.high_risk_count,
            "cluster_summary": result.cluster_summary.as_ref().or(cluster_summary.as_ref()),
            "report": report_path,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_result(&result, &metrics);
    if let Some(summary) = &cluster_summary {
        print_cluster_summary(summary);
    }

    println!("\nChart saved to: {}", chart_path.display());
    if let Some(path) = report_path {
        println!("Report saved to: {}", path.display());
    }
    if args.verbose {
        println!("Total processing time: {:.2}s", start_time.elapsed().as_secs_f64());
    }

    Ok(())
}

fn print_result(result: &QuestionResult, metrics: &KeyMetrics) {
    println!("=== {} ===", result.metadata.title);
    println!("{}\n", result.metadata.description);

    println!("Key Metrics");
    println!("  Total Employees: {}", metrics.total_employees);
    println!("  Attrition Rate: {:.1}%", metrics.attrition_rate * 100.0);
    println!(
        "  High-Risk Employees: {} ({:.1}%)",
        metrics.high_risk_count,
        metrics.high_risk_share * 100.0
    );

    println!("\nInterpretation");
    println!("{}", result.interpretation);
}

/// Fit (or reuse) the clustering and report its quality
fn cluster_details(
    args: &Args,
    bank: &QuestionBank,
    table: &attrition_analyzer::Table,
) -> Result<Vec<ClusterSummary>> {
    let clustered = bank.clusters().fit(table).context("clustering failed")?;
    if args.verbose {
        println!(
            "Silhouette score (sample): {:.3}",
            clustered.silhouette_sample(100.min(clustered.len()))
        );
        println!("Within-cluster sum of squares: {:.2}", clustered.inertia);
    }
    Ok(attrition_analyzer::cluster_summary(&clustered))
}

fn print_column_summary(table: &attrition_analyzer::Table) {
    println!(
        "{:<22} {:>6} {:>9} {:>9} {:>8} {:>8} {:>8}",
        "Column", "Count", "Mean", "Std", "Min", "Median", "Max"
    );
    for summary in describe(table) {
        println!(
            "{:<22} {:>6} {:>9.3} {:>9.3} {:>8.2} {:>8.2} {:>8.2}",
            summary.column.name(),
            summary.count,
            summary.mean,
            summary.std,
            summary.min,
            summary.median,
            summary.max
        );
    }
    println!();
}

fn print_cluster_summary(summary: &[ClusterSummary]) {
    println!("\n=== Employee Clusters ===");
    println!(
        "{:>7} {:>6} {:>13} {:>11} {:>9} {:>9} {:>10}",
        "Cluster", "Size", "Satisfaction", "Evaluation", "Hours", "Projects", "Attrition"
    );
    for row in summary {
        println!(
            "{:>7} {:>6} {:>13.2} {:>11.2} {:>9.1} {:>9.1} {:>9.1}%",
            row.cluster_id,
            row.size,
            row.avg_satisfaction,
            row.avg_evaluation,
            row.avg_hours,
            row.avg_projects,
            row.attrition_rate * 100.0
        );
    }
}
