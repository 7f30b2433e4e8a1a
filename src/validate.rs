use std::fmt;

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::models::{CvEvaluationRecord, EvaluationStatus, InterviewSessionRecord, UserProfileRecord};

/// Cycle value marking a user who already graduated.
pub const GRADUATE_CYCLE: &str = "graduate";

/// Why a raw record was left out of an aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordIssue {
    MissingUser,
    BlankDisplayName,
    MissingResult,
    MissingScore,
    NonFiniteScore,
    MissingCategory { field: &'static str },
    InvalidCycle { raw: String },
}

impl fmt::Display for RecordIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingUser => write!(f, "record has no user reference"),
            Self::BlankDisplayName => write!(f, "user display name is blank"),
            Self::MissingResult => write!(f, "completed evaluation has no result"),
            Self::MissingScore => write!(f, "completed session has no score"),
            Self::NonFiniteScore => write!(f, "score is not a finite number"),
            Self::MissingCategory { field } => write!(f, "{field} is missing or blank"),
            Self::InvalidCycle { raw } => write!(f, "cycle value {raw:?} is invalid"),
        }
    }
}

/// Outcome of screening one raw batch: the values that survived plus one
/// issue per skipped record. Screening never aborts the batch.
#[derive(Debug)]
pub struct Screened<T> {
    pub valid: Vec<T>,
    pub issues: Vec<RecordIssue>,
}

impl<T> Default for Screened<T> {
    fn default() -> Self {
        Self {
            valid: Vec::new(),
            issues: Vec::new(),
        }
    }
}

impl<T> Screened<T> {
    pub fn log_issues(&self, metric: &'static str) {
        for issue in &self.issues {
            debug!(metric, %issue, "skipping record");
        }
    }
}

/// A completed CV evaluation reduced to what ranking needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredEvaluation {
    pub name: String,
    pub career: Option<String>,
    pub cycle: Option<String>,
    pub score: f64,
}

/// A completed interview session reduced to what trend analysis needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSession {
    pub user_id: Uuid,
    pub score: f64,
    pub created_at: DateTime<Utc>,
}

/// Keep completed evaluations with an attributable user and a finite score.
/// Pending and otherwise unfinished records are not issues, they are simply
/// not in scope for score-based metrics.
pub fn screen_scored_evaluations(records: &[CvEvaluationRecord]) -> Screened<ScoredEvaluation> {
    let mut screened = Screened::default();

    for record in records {
        if record.status != EvaluationStatus::Completed {
            continue;
        }
        let Some(user) = &record.user else {
            screened.issues.push(RecordIssue::MissingUser);
            continue;
        };
        if user.display_name.trim().is_empty() {
            screened.issues.push(RecordIssue::BlankDisplayName);
            continue;
        }
        let Some(result) = &record.result else {
            screened.issues.push(RecordIssue::MissingResult);
            continue;
        };
        if !result.score.is_finite() {
            screened.issues.push(RecordIssue::NonFiniteScore);
            continue;
        }
        screened.valid.push(ScoredEvaluation {
            name: user.display_name.trim().to_string(),
            career: user.career.clone(),
            cycle: user.cycle.clone(),
            score: result.score,
        });
    }

    screened
}

/// Keep completed sessions carrying a finite overall score.
pub fn screen_scored_sessions(sessions: &[InterviewSessionRecord]) -> Screened<ScoredSession> {
    let mut screened = Screened::default();

    for session in sessions {
        if session.status != EvaluationStatus::Completed {
            continue;
        }
        let Some(score) = session.score else {
            screened.issues.push(RecordIssue::MissingScore);
            continue;
        };
        if !score.is_finite() {
            screened.issues.push(RecordIssue::NonFiniteScore);
            continue;
        }
        screened.valid.push(ScoredSession {
            user_id: session.user_id,
            score,
            created_at: session.created_at,
        });
    }

    screened
}

/// Non-blank career labels, trimmed.
pub fn screen_careers(users: &[UserProfileRecord]) -> Screened<String> {
    let mut screened = Screened::default();

    for user in users {
        match &user.career {
            Some(career) if !career.trim().is_empty() => {
                screened.valid.push(career.trim().to_string());
            }
            _ => screened.issues.push(RecordIssue::MissingCategory { field: "career" }),
        }
    }

    screened
}

/// A cycle is either the literal graduate marker or a positive term number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleValue {
    Graduate,
    Term(u32),
}

impl CycleValue {
    /// Accepts the exact graduate marker, or a string of ASCII digits that
    /// parses to a positive integer. Anything else (signs, whitespace inside,
    /// trailing characters, zero) is invalid.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed == GRADUATE_CYCLE {
            return Some(Self::Graduate);
        }
        if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        match trimmed.parse::<u32>() {
            Ok(term) if term > 0 => Some(Self::Term(term)),
            _ => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Graduate => GRADUATE_CYCLE.to_string(),
            Self::Term(term) => term.to_string(),
        }
    }
}

/// Valid cycle labels; missing and malformed cycles are tagged separately.
pub fn screen_cycles(users: &[UserProfileRecord]) -> Screened<String> {
    let mut screened = Screened::default();

    for user in users {
        match &user.cycle {
            None => screened.issues.push(RecordIssue::MissingCategory { field: "cycle" }),
            Some(raw) if raw.trim().is_empty() => {
                screened.issues.push(RecordIssue::MissingCategory { field: "cycle" });
            }
            Some(raw) => match CycleValue::parse(raw) {
                Some(cycle) => screened.valid.push(cycle.label()),
                None => screened.issues.push(RecordIssue::InvalidCycle { raw: raw.clone() }),
            },
        }
    }

    screened
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CvResult, UserRef};

    fn evaluation(
        status: EvaluationStatus,
        name: Option<&str>,
        score: Option<f64>,
    ) -> CvEvaluationRecord {
        CvEvaluationRecord {
            status,
            user: name.map(|name| UserRef {
                display_name: name.to_string(),
                career: Some("Software Engineering".to_string()),
                cycle: Some("3".to_string()),
            }),
            result: score.map(|score| CvResult {
                score,
                aspects_to_improve: vec![],
            }),
        }
    }

    #[test]
    fn screening_tags_each_skip_reason() {
        let records = vec![
            evaluation(EvaluationStatus::Completed, Some("Avery"), Some(82.0)),
            evaluation(EvaluationStatus::Completed, None, Some(70.0)),
            evaluation(EvaluationStatus::Completed, Some("   "), Some(70.0)),
            evaluation(EvaluationStatus::Completed, Some("Jules"), None),
            evaluation(EvaluationStatus::Completed, Some("Kiara"), Some(f64::NAN)),
        ];

        let screened = screen_scored_evaluations(&records);
        assert_eq!(screened.valid.len(), 1);
        assert_eq!(screened.valid[0].name, "Avery");
        assert_eq!(
            screened.issues,
            vec![
                RecordIssue::MissingUser,
                RecordIssue::BlankDisplayName,
                RecordIssue::MissingResult,
                RecordIssue::NonFiniteScore,
            ]
        );
    }

    #[test]
    fn pending_evaluations_are_out_of_scope_not_issues() {
        let records = vec![evaluation(EvaluationStatus::Pending, Some("Avery"), None)];
        let screened = screen_scored_evaluations(&records);
        assert!(screened.valid.is_empty());
        assert!(screened.issues.is_empty());
    }

    #[test]
    fn session_screening_requires_a_finite_score() {
        use chrono::TimeZone;
        use crate::models::InterviewSessionRecord;

        let base = |status, score| InterviewSessionRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            status,
            score,
            created_at: Utc.with_ymd_and_hms(2026, 2, 1, 10, 0, 0).unwrap(),
            questions: vec![],
        };

        let sessions = vec![
            base(EvaluationStatus::Completed, Some(74.0)),
            base(EvaluationStatus::Completed, None),
            base(EvaluationStatus::Completed, Some(f64::INFINITY)),
            base(EvaluationStatus::Pending, Some(50.0)),
        ];

        let screened = screen_scored_sessions(&sessions);
        assert_eq!(screened.valid.len(), 1);
        assert_eq!(screened.valid[0].score, 74.0);
        assert_eq!(
            screened.issues,
            vec![RecordIssue::MissingScore, RecordIssue::NonFiniteScore]
        );
    }

    #[test]
    fn cycle_parsing_is_strict() {
        assert_eq!(CycleValue::parse("graduate"), Some(CycleValue::Graduate));
        assert_eq!(CycleValue::parse(" 5 "), Some(CycleValue::Term(5)));
        assert_eq!(CycleValue::parse("0"), None);
        assert_eq!(CycleValue::parse("+5"), None);
        assert_eq!(CycleValue::parse("5a"), None);
        assert_eq!(CycleValue::parse("Graduate"), None);
        assert_eq!(CycleValue::parse(""), None);
    }

    #[test]
    fn career_screening_drops_blank_values() {
        let users = vec![
            UserProfileRecord {
                career: Some("Data Science".to_string()),
                cycle: None,
            },
            UserProfileRecord {
                career: Some("  ".to_string()),
                cycle: None,
            },
            UserProfileRecord {
                career: None,
                cycle: None,
            },
        ];

        let screened = screen_careers(&users);
        assert_eq!(screened.valid, vec!["Data Science".to_string()]);
        assert_eq!(screened.issues.len(), 2);
    }

    #[test]
    fn cycle_screening_separates_missing_from_invalid() {
        let users = vec![
            UserProfileRecord {
                career: None,
                cycle: Some("graduate".to_string()),
            },
            UserProfileRecord {
                career: None,
                cycle: Some("7".to_string()),
            },
            UserProfileRecord {
                career: None,
                cycle: Some("next year".to_string()),
            },
            UserProfileRecord {
                career: None,
                cycle: None,
            },
        ];

        let screened = screen_cycles(&users);
        assert_eq!(screened.valid, vec!["graduate".to_string(), "7".to_string()]);
        assert_eq!(
            screened.issues,
            vec![
                RecordIssue::InvalidCycle {
                    raw: "next year".to_string()
                },
                RecordIssue::MissingCategory { field: "cycle" },
            ]
        );
    }
}
