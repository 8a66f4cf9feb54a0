use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::leaderboard::{Leaderboard, Ranking};
use crate::metrics::SalesMetrics;
use crate::status::{StatusBreakdown, StatusSummary, Trend};

pub const TOP_REPS: usize = 3;

pub fn render_summary(summary: &StatusSummary) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Total units: {}", summary.total_units);

    if summary.buckets.is_empty() {
        let _ = writeln!(output, "No sales recorded for this view.");
        return output;
    }

    for bucket in &summary.buckets {
        let _ = writeln!(
            output,
            "- {}: {} units ({:.1}%)",
            bucket.status, bucket.units, bucket.percentage
        );
    }

    let simplified = &summary.simplified;
    let _ = writeln!(
        output,
        "Approved {:.1}% / Cancelled {:.1}% / Pending {:.1}%",
        simplified.approved.percentage,
        simplified.cancelled.percentage,
        simplified.pending.percentage
    );

    for delta in &summary.deltas {
        let arrow = match delta.trend {
            Trend::Up => "+",
            Trend::Down => "-",
            Trend::Flat => "=",
        };
        let _ = writeln!(
            output,
            "{} {}: {} ({:.1}%) from previous period{}",
            arrow,
            delta.metric.label(),
            delta.difference.abs(),
            delta.percent_change.abs(),
            if delta.favorable { "" } else { " (needs attention)" }
        );
    }

    output
}

pub fn render_leaderboard(board: &Leaderboard, ranking: Ranking, limit: usize) -> String {
    let mut output = String::new();
    let ranked = board.top(ranking, limit);

    if ranked.is_empty() {
        let _ = writeln!(output, "No reps with sales in this view.");
        return output;
    }

    for (position, rep) in ranked.iter().enumerate() {
        let _ = writeln!(
            output,
            "{}. {}: {} units, {} approved, {} cancelled",
            position + 1,
            rep.name,
            rep.total_sales,
            rep.approved,
            rep.cancelled
        );
    }

    if let Some(highlight) = board.highlight(ranking) {
        let suffix = if ranking.is_rate() { "%" } else { "" };
        let _ = writeln!(
            output,
            "{}: highest {} ({}{}), lowest {} ({}{})",
            ranking.label(),
            highlight.best.name,
            highlight.best.value,
            suffix,
            highlight.worst.name,
            highlight.worst.value,
            suffix
        );
    }

    output
}

pub fn build_report(
    tab: &str,
    metrics: &SalesMetrics,
    previous: Option<&StatusBreakdown>,
    generated_at: DateTime<Utc>,
) -> String {
    let summary = metrics.breakdown.summary(previous);
    let mut output = String::new();

    let _ = writeln!(output, "# Apex Sales Metrics Report");
    let _ = writeln!(
        output,
        "Generated for {} from {} ({})",
        metrics.scope,
        tab,
        generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Status Mix");
    output.push_str(&render_summary(&summary));

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Reps");
    output.push_str(&render_leaderboard(
        &metrics.leaderboard,
        Ranking::TotalSales,
        TOP_REPS,
    ));

    let rates = if metrics.leaderboard.is_empty() {
        Vec::new()
    } else {
        vec![Ranking::ApprovalRate, Ranking::CancellationRate]
    };
    for ranking in rates {
        if let Some(highlight) = metrics.leaderboard.highlight(ranking) {
            let _ = writeln!(output);
            let _ = writeln!(output, "## {}", ranking.label());
            let _ = writeln!(
                output,
                "- Best: {} ({}%)",
                highlight.best.name, highlight.best.value
            );
            let _ = writeln!(
                output,
                "- Worst: {} ({}%)",
                highlight.worst.name, highlight.worst.value
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "{} reps across {} rows.",
        metrics.leaderboard.rep_count(),
        metrics.rows.len()
    );

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::compute;
    use crate::models::{table, OfficeScope};

    fn metrics(scope: &str) -> SalesMetrics {
        let sheet = table(&[
            &["Office", "SalesAgent", "Status", "C", "D", "E", "F", "H", "I"],
            &["OfficeA", "Smith, John", "Approved", "", "", "", "", "x", ""],
            &["OfficeA", "Doe, Jane", "Cancelled", "", "", "", "", "", "y"],
        ]);
        compute(&sheet, &OfficeScope::parse(scope))
    }

    #[test]
    fn summary_lists_buckets_with_percentages() {
        let text = render_summary(&metrics("OfficeA").breakdown.summary(None));
        assert!(text.contains("Total units: 2"));
        assert!(text.contains("- Approved: 1 units (50.0%)"));
        assert!(text.contains("- Cancelled: 1 units (50.0%)"));
    }

    #[test]
    fn empty_view_says_so() {
        let metrics = metrics("OfficeB");
        assert!(render_summary(&metrics.breakdown.summary(None)).contains("No sales recorded"));
        assert!(render_leaderboard(&metrics.leaderboard, Ranking::TotalSales, 3)
            .contains("No reps with sales"));
    }

    #[test]
    fn report_has_every_section() {
        let metrics = metrics("OfficeA");
        let mut previous = StatusBreakdown::default();
        previous.add(crate::status::NormalizedStatus::Approved, 2);

        let generated_at = DateTime::from_timestamp(1_760_000_000, 0).unwrap();
        let report = build_report("Current Week", &metrics, Some(&previous), generated_at);

        assert!(report.starts_with("# Apex Sales Metrics Report"));
        assert!(report.contains("Generated for OfficeA from Current Week"));
        assert!(report.contains("1. John Smith: 1 units, 1 approved, 0 cancelled"));
        assert!(report.contains("## Approval Rate"));
        assert!(report.contains("- Best: John Smith (100%)"));
        assert!(report.contains("- Approved: 1 (50.0%) from previous period (needs attention)"));
        assert!(report.contains("2 reps across 2 rows."));
    }
}
