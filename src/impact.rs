use crate::models::{
    whole_percentage, ApplicationTrackingRecord, DistributionItem, ToolImpactStats,
};

/// Chart label for the group that used at least one preparation tool.
pub const WITH_TOOLS_LABEL: &str = "Used tools";
/// Chart label for the group that used none.
pub const WITHOUT_TOOLS_LABEL: &str = "No tools";

/// Split applications that reached an interview by whether any preparation
/// tool was actually used. An application whose tool map only carries zero
/// counts belongs to the "used none" group.
pub fn tool_impact(records: &[ApplicationTrackingRecord]) -> ToolImpactStats {
    let eligible: Vec<&ApplicationTrackingRecord> = records
        .iter()
        .filter(|record| record.status.reached_interview())
        .collect();

    let total_eligible = eligible.len();
    if total_eligible == 0 {
        return ToolImpactStats::default();
    }

    let with_tools_count = eligible.iter().filter(|record| used_any_tool(record)).count();
    let without_tools_count = total_eligible - with_tools_count;

    ToolImpactStats {
        with_tools_count,
        without_tools_count,
        total_eligible,
        with_tools_percentage: whole_percentage(with_tools_count, total_eligible),
        without_tools_percentage: whole_percentage(without_tools_count, total_eligible),
    }
}

fn used_any_tool(record: &ApplicationTrackingRecord) -> bool {
    record.tools_used.values().any(|&uses| uses > 0)
}

/// The same split as a two-item list ready for a comparison chart.
pub fn impact_chart(stats: &ToolImpactStats) -> Vec<DistributionItem> {
    vec![
        DistributionItem {
            label: WITH_TOOLS_LABEL.to_string(),
            count: stats.with_tools_count,
            percentage: stats.with_tools_percentage,
        },
        DistributionItem {
            label: WITHOUT_TOOLS_LABEL.to_string(),
            count: stats.without_tools_count,
            percentage: stats.without_tools_percentage,
        },
    ]
}
