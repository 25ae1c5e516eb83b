//! Report rendering (tables on stdout)

use cnfsweep_core::application::{CheckpointStats, ReportRow, SweepSummary};
use colored::Colorize;
use std::path::Path;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct Line {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Value")]
    value: usize,
}

#[derive(Tabled)]
struct ResultLine {
    filename: String,
    seconds: String,
    sat: String,
    nof_vars: String,
    nof_clauses: String,
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

impl From<&ReportRow> for ResultLine {
    fn from(row: &ReportRow) -> Self {
        let sat = match row.sat {
            Some(true) => "SAT".green().to_string(),
            Some(false) => "UNSAT".blue().to_string(),
            None => "unknown".yellow().to_string(),
        };
        Self {
            filename: row.filename.clone(),
            seconds: format!("{:.3}", row.seconds),
            sat,
            nof_vars: optional(row.nof_vars),
            nof_clauses: optional(row.nof_clauses),
        }
    }
}

pub fn summary_table(summary: &SweepSummary) -> String {
    let lines = vec![
        Line { metric: "Scanned", value: summary.scanned },
        Line { metric: "Skipped (done)", value: summary.skipped_done },
        Line { metric: "Skipped (exhausted)", value: summary.skipped_exhausted },
        Line { metric: "Retried", value: summary.retried },
        Line { metric: "Attempted", value: summary.attempted },
        Line { metric: "Completed", value: summary.completed },
        Line { metric: "Satisfiable", value: summary.satisfiable },
        Line { metric: "Unsatisfiable", value: summary.unsatisfiable },
        Line { metric: "Timed out", value: summary.timed_out },
        Line { metric: "Failed", value: summary.failed },
        Line { metric: "Cancelled", value: summary.cancelled },
        Line { metric: "Still unresolved", value: summary.unresolved },
        Line { metric: "New records", value: summary.new_records },
        Line { metric: "Total records", value: summary.total_records },
    ];
    Table::new(lines).to_string()
}

pub fn stats_table(stats: &CheckpointStats) -> String {
    let lines = vec![
        Line { metric: "Total", value: stats.total },
        Line { metric: "Satisfiable", value: stats.satisfiable },
        Line { metric: "Unsatisfiable", value: stats.unsatisfiable },
        Line { metric: "Retryable", value: stats.retryable },
        Line { metric: "Exhausted", value: stats.exhausted },
    ];
    Table::new(lines).to_string()
}

pub fn results_table(rows: &[ReportRow]) -> String {
    Table::new(rows.iter().map(ResultLine::from)).to_string()
}

pub fn print_summary(summary: &SweepSummary, checkpoint: &Path) {
    if summary.attempted == 0 {
        println!("{}", "Nothing to do".yellow().bold());
    } else if summary.cancelled > 0 {
        println!("{}", "Sweep interrupted".yellow().bold());
    } else {
        println!("{}", "✓ Sweep finished".green().bold());
    }
    println!();
    println!("{}", summary_table(summary));
    println!();
    println!("  {} {}", "Checkpoint:".bold(), checkpoint.display());
}

pub fn print_results(rows: &[ReportRow]) {
    println!();
    println!("{}", "Results of this run".cyan().bold());
    println!("{}", results_table(rows));
}

pub fn print_stats(stats: &CheckpointStats, checkpoint: &Path, threshold_seconds: f64) {
    println!("{}", "Checkpoint Status".cyan().bold());
    println!();
    println!("  {} {}", "File:".bold(), checkpoint.display());
    println!("  {} {}s", "Retry threshold:".bold(), threshold_seconds);
    println!();
    println!("{}", stats_table(stats));
}
