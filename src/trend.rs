use std::collections::{BTreeMap, HashMap, HashSet};

use uuid::Uuid;

use crate::models::{round1, TrendPoint, TrendStats};
use crate::validate::ScoredSession;

/// Pool scores by trial index across users.
///
/// Each user's sessions are ordered chronologically and numbered from 1, then
/// every user's nth session lands in the nth pool. Because every user starts
/// at index 1, the resulting index sequence is contiguous from 1.
pub fn trend_points(sessions: &[ScoredSession]) -> Vec<TrendPoint> {
    let mut per_user: HashMap<Uuid, Vec<&ScoredSession>> = HashMap::new();
    for session in sessions {
        per_user.entry(session.user_id).or_default().push(session);
    }

    let mut pooled: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
    for user_sessions in per_user.values_mut() {
        user_sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        for (position, session) in user_sessions.iter().enumerate() {
            pooled.entry(position + 1).or_default().push(session.score);
        }
    }

    pooled
        .into_iter()
        .map(|(trial_index, scores)| {
            let sum: f64 = scores.iter().sum();
            let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
            let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            TrendPoint {
                trial_index,
                average_score: round1(sum / scores.len() as f64),
                sample_count: scores.len(),
                min_score: min,
                max_score: max,
            }
        })
        .collect()
}

/// Headline numbers over the pooled trend.
///
/// Improvement is the last point's average minus the first trial's average,
/// 0 when no first trial exists. The y-axis range pads the observed averages
/// by 5 points and clamps to the score scale [0, 100].
pub fn trend_stats(sessions: &[ScoredSession]) -> TrendStats {
    let points = trend_points(sessions);
    if points.is_empty() {
        return TrendStats::default();
    }

    let total_samples = points.iter().map(|point| point.sample_count).sum();
    let distinct_users: HashSet<Uuid> = sessions.iter().map(|session| session.user_id).collect();
    let max_trial_index = points.last().map(|point| point.trial_index).unwrap_or(0);

    let first = &points[0];
    let last = &points[points.len() - 1];
    let improvement = if first.trial_index == 1 {
        round1(last.average_score - first.average_score)
    } else {
        0.0
    };

    let min_average = points
        .iter()
        .map(|point| point.average_score)
        .fold(f64::INFINITY, f64::min);
    let max_average = points
        .iter()
        .map(|point| point.average_score)
        .fold(f64::NEG_INFINITY, f64::max);

    TrendStats {
        total_samples,
        total_users: distinct_users.len(),
        max_trial_index,
        improvement,
        y_axis_min: (min_average - 5.0).floor().max(0.0),
        y_axis_max: (max_average + 5.0).ceil().min(100.0),
    }
}
