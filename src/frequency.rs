use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::models::{
    whole_percentage, CvEvaluationRecord, EvaluationStatus, FrequencyItem, InterviewSessionRecord,
};

/// Percentage share of each label across a set of eligible records.
///
/// Each element of `label_sets` is the label set one eligible record
/// contributed. A record with no labels still counts toward the denominator;
/// duplicate labels within one record count once; blank labels are dropped.
pub fn label_frequencies(label_sets: &[Vec<String>]) -> Vec<FrequencyItem> {
    let total = label_sets.len();
    if total == 0 {
        return Vec::new();
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for labels in label_sets {
        let distinct: HashSet<&str> = labels
            .iter()
            .map(|label| label.trim())
            .filter(|label| !label.is_empty())
            .collect();
        for label in distinct {
            *counts.entry(label).or_insert(0) += 1;
        }
    }

    let mut items: Vec<FrequencyItem> = counts
        .into_iter()
        .map(|(label, count)| FrequencyItem {
            label: label.to_string(),
            percentage: whole_percentage(count, total),
        })
        .collect();

    items.sort_by(|a, b| {
        b.percentage
            .partial_cmp(&a.percentage)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.label.cmp(&b.label))
    });
    items
}

/// Label sets for the CV aspect metric: one entry per completed evaluation,
/// empty when the evaluation carries no result payload.
pub fn cv_label_sets(records: &[CvEvaluationRecord]) -> Vec<Vec<String>> {
    records
        .iter()
        .filter(|record| record.status == EvaluationStatus::Completed)
        .map(|record| {
            record
                .result
                .as_ref()
                .map(|result| result.aspects_to_improve.clone())
                .unwrap_or_default()
        })
        .collect()
}

/// Label sets for the interview aspect metric: one entry per completed
/// session, pooling the aspects flagged across all of its questions.
pub fn interview_label_sets(sessions: &[InterviewSessionRecord]) -> Vec<Vec<String>> {
    sessions
        .iter()
        .filter(|session| session.status == EvaluationStatus::Completed)
        .map(|session| {
            session
                .questions
                .iter()
                .filter_map(|question| question.evaluation.as_ref())
                .flat_map(|evaluation| evaluation.aspects_to_improve.iter().cloned())
                .collect()
        })
        .collect()
}
