use std::fmt::Write;

use crate::distribution;
use crate::facade::DashboardMetrics;
use crate::models::{DistributionItem, RankedUser};
use crate::source::RecordSource;

/// Render every dashboard metric to a markdown report through the public
/// facade surface.
pub async fn build_report<S: RecordSource>(metrics: &DashboardMetrics<S>) -> String {
    let mut output = String::new();

    let summary = metrics.summary().await;
    let _ = writeln!(output, "# CareerLab Insights Report");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overview");
    let _ = writeln!(output, "- Users: {}", summary.total_users);
    let _ = writeln!(output, "- CV evaluations: {}", summary.total_cv_evaluations);
    let _ = writeln!(
        output,
        "- Interview sessions: {}",
        summary.total_interview_sessions
    );
    let _ = writeln!(output, "- Applications: {}", summary.total_applications);

    let _ = writeln!(output);
    let _ = writeln!(output, "## CV Aspects to Improve");
    let cv_aspects = metrics.cv_aspects_to_improve().await;
    if cv_aspects.is_empty() {
        let _ = writeln!(output, "No recurring aspects above the cutoff.");
    } else {
        for item in &cv_aspects {
            let _ = writeln!(output, "- {}: {:.0}%", item.label, item.percentage);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Interview Aspects to Improve");
    let interview_aspects = metrics.interview_aspects_to_improve().await;
    if interview_aspects.is_empty() {
        let _ = writeln!(output, "No recurring aspects above the cutoff.");
    } else {
        for item in &interview_aspects {
            let _ = writeln!(output, "- {}: {:.0}%", item.label, item.percentage);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Performers");
    write_ranking(&mut output, &metrics.top_performers().await);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Bottom Performers");
    write_ranking(&mut output, &metrics.bottom_performers().await);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Interview Score Trend");
    let points = metrics.trend_series().await;
    if points.is_empty() {
        let _ = writeln!(output, "No completed sessions yet.");
    } else {
        for point in &points {
            let _ = writeln!(
                output,
                "- Trial {}: avg {:.1} over {} sessions (min {:.1}, max {:.1})",
                point.trial_index,
                point.average_score,
                point.sample_count,
                point.min_score,
                point.max_score
            );
        }
        let stats = metrics.trend_stats().await;
        let _ = writeln!(
            output,
            "Improvement since first trial: {:+.1} across {} users.",
            stats.improvement, stats.total_users
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Tool Impact");
    let impact = metrics.tool_impact_stats().await;
    if impact.total_eligible == 0 {
        let _ = writeln!(output, "No applications reached an interview yet.");
    } else {
        for slice in metrics.tool_impact_chart().await {
            let _ = writeln!(
                output,
                "- {}: {} applications ({:.0}%)",
                slice.label, slice.count, slice.percentage
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Career Distribution");
    let careers = metrics
        .career_distribution(distribution::CAREER_MIN_PERCENTAGE)
        .await;
    write_distribution(&mut output, &careers);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Cycle Distribution");
    let cycles = metrics
        .cycle_distribution(distribution::CYCLE_MIN_PERCENTAGE)
        .await;
    write_distribution(&mut output, &cycles);

    output
}

fn write_ranking(output: &mut String, users: &[RankedUser]) {
    if users.is_empty() {
        let _ = writeln!(output, "No users with scored evaluations.");
        return;
    }
    for user in users {
        let _ = writeln!(
            output,
            "- {} ({}, cycle {}) avg {:.1} across {} analyses",
            user.name,
            user.career.as_deref().unwrap_or("unknown career"),
            user.cycle.as_deref().unwrap_or("unknown"),
            user.average_score,
            user.analysis_count
        );
    }
}

fn write_distribution(output: &mut String, items: &[DistributionItem]) {
    if items.is_empty() {
        let _ = writeln!(output, "No categories above the threshold.");
        return;
    }
    for item in items {
        let _ = writeln!(
            output,
            "- {}: {} users ({:.1}%)",
            item.label, item.count, item.percentage
        );
    }
}
