use std::collections::HashMap;

use crate::models::{round1, DistributionItem};

/// Careers below this share of the valid population are noise in the chart.
pub const CAREER_MIN_PERCENTAGE: f64 = 0.5;
/// Cycles are fewer and coarser, so the bar is higher.
pub const CYCLE_MIN_PERCENTAGE: f64 = 2.0;

/// Share of each label among `labels`, keeping labels whose unrounded share
/// is at or above `min_percentage`. Sorted by count descending, ties by label.
pub fn categorical_distribution(labels: &[String], min_percentage: f64) -> Vec<DistributionItem> {
    let total = labels.len();
    if total == 0 {
        return Vec::new();
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for label in labels {
        *counts.entry(label.as_str()).or_insert(0) += 1;
    }

    let mut items: Vec<DistributionItem> = counts
        .into_iter()
        .filter_map(|(label, count)| {
            let share = count as f64 / total as f64 * 100.0;
            if share >= min_percentage {
                Some(DistributionItem {
                    label: label.to_string(),
                    count,
                    percentage: round1(share),
                })
            } else {
                None
            }
        })
        .collect();

    items.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(groups: &[(&str, usize)]) -> Vec<String> {
        groups.iter()
            .flat_map(|(label, count)| std::iter::repeat(label.to_string()).take(*count))
            .collect()
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(categorical_distribution(&[], CAREER_MIN_PERCENTAGE).is_empty());
    }

    #[test]
    fn one_percent_career_survives_the_career_threshold() {
        let labels = labels(&[("Software Engineering", 99), ("Astronomy", 1)]);
        let items = categorical_distribution(&labels, CAREER_MIN_PERCENTAGE);
        assert!(items.iter().any(|item| item.label == "Astronomy"));
    }

    #[test]
    fn one_percent_cycle_is_dropped_by_the_cycle_threshold() {
        let labels = labels(&[("3", 99), ("11", 1)]);
        let items = categorical_distribution(&labels, CYCLE_MIN_PERCENTAGE);
        assert!(items.iter().all(|item| item.label != "11"));
    }

    #[test]
    fn threshold_is_inclusive_at_the_boundary() {
        // 1 of 200 is exactly 0.5%.
        let labels = labels(&[("Software Engineering", 199), ("Astronomy", 1)]);
        let items = categorical_distribution(&labels, 0.5);
        assert!(items.iter().any(|item| item.label == "Astronomy"));
    }

    #[test]
    fn sorts_by_count_descending() {
        let labels = labels(&[("Data Science", 2), ("Software Engineering", 5), ("Design", 3)]);
        let items = categorical_distribution(&labels, 0.0);

        let ordered: Vec<&str> = items.iter().map(|item| item.label.as_str()).collect();
        assert_eq!(ordered, vec!["Software Engineering", "Design", "Data Science"]);
    }

    #[test]
    fn percentages_report_one_decimal() {
        let labels = labels(&[("Software Engineering", 1), ("Data Science", 2)]);
        let items = categorical_distribution(&labels, 0.0);

        let software = items
            .iter()
            .find(|item| item.label == "Software Engineering")
            .unwrap();
        assert_eq!(software.percentage, 33.3);
        assert_eq!(software.count, 1);
    }
}
