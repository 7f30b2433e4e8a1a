use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Lifecycle state shared by CV evaluations and interview sessions.
/// Anything the system of record reports outside the known states maps
/// to `Other` instead of failing the fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationStatus {
    Pending,
    Completed,
    Other,
}

impl EvaluationStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Self::Pending,
            "completed" => Self::Completed,
            _ => Self::Other,
        }
    }
}

/// Where a tracked job application currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationStatus {
    Applied,
    Interviewed,
    Hired,
    Rejected,
    Other,
}

impl ApplicationStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "applied" => Self::Applied,
            "interviewed" => Self::Interviewed,
            "hired" => Self::Hired,
            "rejected" => Self::Rejected,
            _ => Self::Other,
        }
    }

    /// Applications that made it to at least an interview qualify for the
    /// tool-impact comparison.
    pub fn reached_interview(&self) -> bool {
        matches!(self, Self::Interviewed | Self::Hired)
    }
}

/// The user a CV evaluation belongs to, as embedded in the evaluation record.
#[derive(Debug, Clone)]
pub struct UserRef {
    pub display_name: String,
    pub career: Option<String>,
    pub cycle: Option<String>,
}

/// Scoring payload of a finished CV evaluation.
#[derive(Debug, Clone)]
pub struct CvResult {
    pub score: f64,
    pub aspects_to_improve: Vec<String>,
}

/// One CV evaluation as stored by the system of record. `user` and `result`
/// are absent when the upstream row is incomplete; screening decides what
/// that absence means per metric.
#[derive(Debug, Clone)]
pub struct CvEvaluationRecord {
    pub status: EvaluationStatus,
    pub user: Option<UserRef>,
    pub result: Option<CvResult>,
}

/// Per-question evaluation inside an interview session.
#[derive(Debug, Clone)]
pub struct QuestionEvaluation {
    pub aspects_to_improve: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct QuestionRecord {
    pub evaluation: Option<QuestionEvaluation>,
}

/// One interview-simulation session with its ordered questions.
#[derive(Debug, Clone)]
pub struct InterviewSessionRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: EvaluationStatus,
    pub score: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub questions: Vec<QuestionRecord>,
}

/// One tracked job application and the preparation tools used for it.
#[derive(Debug, Clone)]
pub struct ApplicationTrackingRecord {
    pub status: ApplicationStatus,
    pub tools_used: HashMap<String, u32>,
}

#[derive(Debug, Clone)]
pub struct UserProfileRecord {
    pub career: Option<String>,
    pub cycle: Option<String>,
}

/// Share of eligible records carrying one label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyItem {
    pub label: String,
    pub percentage: f64,
}

/// One user's position in a top/bottom ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedUser {
    pub name: String,
    pub career: Option<String>,
    pub cycle: Option<String>,
    pub average_score: f64,
    pub analysis_count: usize,
}

/// Pooled statistics for one trial index across all users.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub trial_index: usize,
    pub average_score: f64,
    pub sample_count: usize,
    pub min_score: f64,
    pub max_score: f64,
}

/// Headline numbers for the trend chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendStats {
    pub total_samples: usize,
    pub total_users: usize,
    pub max_trial_index: usize,
    pub improvement: f64,
    pub y_axis_min: f64,
    pub y_axis_max: f64,
}

impl Default for TrendStats {
    /// Zero counts with a full [0, 100] display range, so an empty chart
    /// still renders with sane axes.
    fn default() -> Self {
        Self {
            total_samples: 0,
            total_users: 0,
            max_trial_index: 0,
            improvement: 0.0,
            y_axis_min: 0.0,
            y_axis_max: 100.0,
        }
    }
}

/// Tool usage split among applications that reached an interview.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ToolImpactStats {
    pub with_tools_count: usize,
    pub without_tools_count: usize,
    pub total_eligible: usize,
    pub with_tools_percentage: f64,
    pub without_tools_percentage: f64,
}

/// One category's share of the valid population.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionItem {
    pub label: String,
    pub count: usize,
    pub percentage: f64,
}

/// Raw record counts across every category.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct DashboardSummary {
    pub total_users: usize,
    pub total_cv_evaluations: usize,
    pub total_interview_sessions: usize,
    pub total_applications: usize,
}

/// Every score-bearing metric reports one decimal place.
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Whole-number percentage of `part` in `total`; 0 when the denominator is 0.
pub(crate) fn whole_percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 / total as f64 * 100.0).round()
}
