use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::{round1, RankedUser};
use crate::validate::ScoredEvaluation;

/// How many users a top or bottom ranking shows.
pub const RANKING_SIZE: usize = 5;

struct UserAccum {
    career: Option<String>,
    cycle: Option<String>,
    total: f64,
    count: usize,
}

/// Average each user's valid scores and sort descending.
///
/// A computed average of exactly 0 is treated as missing data and the user is
/// dropped. This conflates a genuine all-zero scorer with "no valid data";
/// the behavior is kept for compatibility with the system of record.
pub fn rank_by_average(evaluations: &[ScoredEvaluation]) -> Vec<RankedUser> {
    let mut groups: HashMap<&str, UserAccum> = HashMap::new();

    for evaluation in evaluations {
        let entry = groups
            .entry(evaluation.name.as_str())
            .or_insert_with(|| UserAccum {
                career: evaluation.career.clone(),
                cycle: evaluation.cycle.clone(),
                total: 0.0,
                count: 0,
            });
        entry.total += evaluation.score;
        entry.count += 1;
    }

    let mut ranked: Vec<RankedUser> = groups
        .into_iter()
        .map(|(name, accum)| RankedUser {
            name: name.to_string(),
            career: accum.career,
            cycle: accum.cycle,
            average_score: round1(accum.total / accum.count as f64),
            analysis_count: accum.count,
        })
        .filter(|user| user.average_score.is_finite() && user.average_score > 0.0)
        .collect();

    ranked.sort_by(|a, b| {
        b.average_score
            .partial_cmp(&a.average_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    ranked
}

/// First `RANKING_SIZE` of the descending ranking.
pub fn top_performers(ranked: &[RankedUser]) -> Vec<RankedUser> {
    ranked.iter().take(RANKING_SIZE).cloned().collect()
}

/// Last `RANKING_SIZE` of the descending ranking, reversed so the worst
/// average comes first.
pub fn bottom_performers(ranked: &[RankedUser]) -> Vec<RankedUser> {
    let start = ranked.len().saturating_sub(RANKING_SIZE);
    let mut bottom: Vec<RankedUser> = ranked[start..].to_vec();
    bottom.reverse();
    bottom
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(name: &str, score: f64) -> ScoredEvaluation {
        ScoredEvaluation {
            name: name.to_string(),
            career: Some("Software Engineering".to_string()),
            cycle: Some("3".to_string()),
            score,
        }
    }

    #[test]
    fn averages_round_to_one_decimal() {
        let ranked = rank_by_average(&[
            scored("Avery", 85.0),
            scored("Avery", 90.0),
            scored("Avery", 78.0),
        ]);

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].average_score, 84.3);
        assert_eq!(ranked[0].analysis_count, 3);
    }

    #[test]
    fn zero_average_users_are_dropped() {
        let ranked = rank_by_average(&[scored("Avery", 0.0), scored("Jules", 55.0)]);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].name, "Jules");
    }

    #[test]
    fn ranking_sorts_descending() {
        let ranked = rank_by_average(&[
            scored("Avery", 60.0),
            scored("Jules", 90.0),
            scored("Kiara", 75.0),
        ]);

        let names: Vec<&str> = ranked.iter().map(|user| user.name.as_str()).collect();
        assert_eq!(names, vec!["Jules", "Kiara", "Avery"]);
    }

    #[test]
    fn top_and_bottom_are_disjoint_with_ten_users() {
        let evaluations: Vec<ScoredEvaluation> = (0..10)
            .map(|i| scored(&format!("user-{i}"), 50.0 + i as f64))
            .collect();

        let ranked = rank_by_average(&evaluations);
        let top = top_performers(&ranked);
        let bottom = bottom_performers(&ranked);

        assert_eq!(top.len(), 5);
        assert_eq!(bottom.len(), 5);
        for user in &top {
            assert!(bottom.iter().all(|other| other.name != user.name));
        }
    }

    #[test]
    fn top_and_bottom_share_membership_with_five_users() {
        let evaluations: Vec<ScoredEvaluation> = (0..5)
            .map(|i| scored(&format!("user-{i}"), 50.0 + i as f64))
            .collect();

        let ranked = rank_by_average(&evaluations);
        let top = top_performers(&ranked);
        let bottom = bottom_performers(&ranked);

        let mut top_names: Vec<&str> = top.iter().map(|user| user.name.as_str()).collect();
        let mut bottom_names: Vec<&str> = bottom.iter().map(|user| user.name.as_str()).collect();
        top_names.sort_unstable();
        bottom_names.sort_unstable();
        assert_eq!(top_names, bottom_names);
    }

    #[test]
    fn bottom_reads_worst_first() {
        let evaluations: Vec<ScoredEvaluation> = (0..7)
            .map(|i| scored(&format!("user-{i}"), 50.0 + i as f64))
            .collect();

        let ranked = rank_by_average(&evaluations);
        let bottom = bottom_performers(&ranked);

        assert_eq!(bottom[0].name, "user-0");
        assert_eq!(bottom[0].average_score, 50.0);
        for pair in bottom.windows(2) {
            assert!(pair[0].average_score <= pair[1].average_score);
        }
    }
}
