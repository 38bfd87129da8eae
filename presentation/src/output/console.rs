//! Console output formatter for runs, metrics and config issues

use colored::Colorize;
use conformity_application::{BackfillReport, ProtocolRun};
use conformity_domain::{ConfigIssue, MetricsSummary, Model, OutputFormat, Rate};

/// Formats results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format a metrics summary in the requested format
    pub fn format_summary(summary: &MetricsSummary, format: OutputFormat) -> String {
        match format {
            OutputFormat::Table => Self::format_table(summary),
            OutputFormat::Json => Self::format_json(summary),
        }
    }

    /// One row per protocol, in canonical protocol order
    pub fn format_table(summary: &MetricsSummary) -> String {
        let mut output = String::new();

        output.push_str(&Self::header(&format!(
            "{} ({})",
            summary.model, summary.method
        )));
        output.push_str(&format!(
            "{:<18} {:>7} {:>8} {:>9} {:>11} {:>13}\n",
            "Protocol", "Total", "Correct", "Accuracy", "Conformity", "Independence"
        ));

        for metrics in summary.protocols.values() {
            output.push_str(&format!(
                "{:<18} {:>7} {:>8} {:>9} {:>11} {:>13}\n",
                metrics.protocol.as_str(),
                metrics.total_questions,
                metrics.correct_predictions,
                format!("{:.1}%", metrics.accuracy),
                Self::rate(metrics.conformity_rate),
                Self::rate(metrics.independence_rate),
            ));
        }

        output
    }

    /// Pretty-printed summary JSON
    pub fn format_json(summary: &MetricsSummary) -> String {
        serde_json::to_string_pretty(summary)
            .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }

    /// Short report after protocols finish
    pub fn format_runs(model: &Model, runs: &[ProtocolRun]) -> String {
        let mut output = Self::header(&format!("Runs for {}", model));

        for run in runs {
            let total = run.entries.len();
            let line = format!(
                "{:<18} {}/{} correct",
                run.protocol.as_str(),
                run.correct(),
                total
            );
            if run.failures.is_empty() {
                output.push_str(&format!("  {} {}\n", "v".green(), line));
            } else {
                output.push_str(&format!(
                    "  {} {} ({} failed)\n",
                    "!".yellow(),
                    line,
                    run.failures.len()
                ));
                for failure in run.failures.iter().take(5) {
                    output.push_str(&format!("      {}\n", failure.to_string().dimmed()));
                }
                if run.failures.len() > 5 {
                    output.push_str(&format!(
                        "      {}\n",
                        format!("... and {} more", run.failures.len() - 5).dimmed()
                    ));
                }
            }
            if let Some(path) = &run.saved_to {
                output.push_str(&format!("      {} {}\n", "->".cyan(), path.display()));
            }
        }

        output
    }

    pub fn format_backfill(model: &Model, report: &BackfillReport) -> String {
        if report.total() == 0 {
            return format!("{} {}: nothing to fill\n", "-".dimmed(), model);
        }

        let mut output = format!(
            "{} {}: filled {} answers\n",
            "v".green(),
            model,
            report.total()
        );
        for (protocol, filled) in report.filled.iter().filter(|(_, n)| **n > 0) {
            output.push_str(&format!("    {:<18} {}\n", protocol.as_str(), filled));
        }
        output
    }

    pub fn format_issues(issues: &[ConfigIssue]) -> String {
        issues
            .iter()
            .map(|issue| {
                let label = if issue.is_error() {
                    "error".red().bold()
                } else {
                    "warning".yellow().bold()
                };
                format!("{}: {}\n", label, issue.message)
            })
            .collect()
    }

    fn rate(rate: Rate) -> String {
        rate.to_string()
    }

    fn header(title: &str) -> String {
        format!("\n{}\n{}\n", title.bold(), "=".repeat(title.chars().count()))
    }
}
