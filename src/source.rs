use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::models::{
    ApplicationStatus, ApplicationTrackingRecord, CvEvaluationRecord, CvResult, EvaluationStatus,
    InterviewSessionRecord, QuestionEvaluation, QuestionRecord, UserProfileRecord, UserRef,
};

/// Supplier of raw records, one call per category.
///
/// Implementations wrap the external system of record. The metrics layer
/// treats the returned arrays as read-only and never calls back into the
/// source outside a cache miss.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn cv_evaluations(&self) -> anyhow::Result<Vec<CvEvaluationRecord>>;
    async fn interview_sessions(&self) -> anyhow::Result<Vec<InterviewSessionRecord>>;
    async fn application_events(&self) -> anyhow::Result<Vec<ApplicationTrackingRecord>>;
    async fn user_profiles(&self) -> anyhow::Result<Vec<UserProfileRecord>>;
}

/// Reads each record category from a CSV snapshot directory.
///
/// Layout: `users.csv`, `cv_evaluations.csv`, `interview_sessions.csv`,
/// `interview_questions.csv`, `applications.csv`. Multi-valued cells use
/// `|` between entries; tool usage cells use `name:count` pairs.
pub struct CsvRecordSource {
    dir: PathBuf,
}

impl CsvRecordSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn reader(&self, file: &str) -> anyhow::Result<csv::Reader<std::fs::File>> {
        let path = self.dir.join(file);
        csv::Reader::from_path(&path)
            .with_context(|| format!("failed to open {}", path.display()))
    }
}

#[async_trait]
impl RecordSource for CsvRecordSource {
    async fn cv_evaluations(&self) -> anyhow::Result<Vec<CvEvaluationRecord>> {
        parse_cv_evaluations(self.reader("cv_evaluations.csv")?)
    }

    async fn interview_sessions(&self) -> anyhow::Result<Vec<InterviewSessionRecord>> {
        let sessions = self.reader("interview_sessions.csv")?;
        let questions = self.reader("interview_questions.csv")?;
        parse_interview_sessions(sessions, questions)
    }

    async fn application_events(&self) -> anyhow::Result<Vec<ApplicationTrackingRecord>> {
        parse_applications(self.reader("applications.csv")?)
    }

    async fn user_profiles(&self) -> anyhow::Result<Vec<UserProfileRecord>> {
        parse_user_profiles(self.reader("users.csv")?)
    }
}

#[derive(serde::Deserialize)]
struct CvEvaluationRow {
    status: String,
    user_name: Option<String>,
    user_career: Option<String>,
    user_cycle: Option<String>,
    score: Option<f64>,
    aspects: Option<String>,
}

#[derive(serde::Deserialize)]
struct InterviewSessionRow {
    id: Uuid,
    user_id: Uuid,
    status: String,
    score: Option<f64>,
    created_at: DateTime<Utc>,
}

#[derive(serde::Deserialize)]
struct InterviewQuestionRow {
    session_id: Uuid,
    aspects: Option<String>,
}

#[derive(serde::Deserialize)]
struct ApplicationRow {
    status: String,
    tools: Option<String>,
}

#[derive(serde::Deserialize)]
struct UserProfileRow {
    career: Option<String>,
    cycle: Option<String>,
}

fn parse_cv_evaluations<R: Read>(
    mut reader: csv::Reader<R>,
) -> anyhow::Result<Vec<CvEvaluationRecord>> {
    let mut records = Vec::new();
    for row in reader.deserialize::<CvEvaluationRow>() {
        let row = row.context("malformed cv evaluation row")?;
        let user = row.user_name.map(|display_name| UserRef {
            display_name,
            career: row.user_career,
            cycle: row.user_cycle,
        });
        let result = row.score.map(|score| CvResult {
            score,
            aspects_to_improve: split_labels(row.aspects.as_deref()),
        });
        records.push(CvEvaluationRecord {
            status: EvaluationStatus::parse(&row.status),
            user,
            result,
        });
    }
    Ok(records)
}

fn parse_interview_sessions<R: Read>(
    mut sessions: csv::Reader<R>,
    mut questions: csv::Reader<R>,
) -> anyhow::Result<Vec<InterviewSessionRecord>> {
    let mut by_session: HashMap<Uuid, Vec<QuestionRecord>> = HashMap::new();
    for row in questions.deserialize::<InterviewQuestionRow>() {
        let row = row.context("malformed interview question row")?;
        let evaluation = row.aspects.as_deref().map(|aspects| QuestionEvaluation {
            aspects_to_improve: split_labels(Some(aspects)),
        });
        by_session
            .entry(row.session_id)
            .or_default()
            .push(QuestionRecord { evaluation });
    }

    let mut records = Vec::new();
    for row in sessions.deserialize::<InterviewSessionRow>() {
        let row = row.context("malformed interview session row")?;
        records.push(InterviewSessionRecord {
            id: row.id,
            user_id: row.user_id,
            status: EvaluationStatus::parse(&row.status),
            score: row.score,
            created_at: row.created_at,
            questions: by_session.remove(&row.id).unwrap_or_default(),
        });
    }
    Ok(records)
}

fn parse_applications<R: Read>(
    mut reader: csv::Reader<R>,
) -> anyhow::Result<Vec<ApplicationTrackingRecord>> {
    let mut records = Vec::new();
    for row in reader.deserialize::<ApplicationRow>() {
        let row = row.context("malformed application row")?;
        records.push(ApplicationTrackingRecord {
            status: ApplicationStatus::parse(&row.status),
            tools_used: parse_tool_usage(row.tools.as_deref()),
        });
    }
    Ok(records)
}

fn parse_user_profiles<R: Read>(
    mut reader: csv::Reader<R>,
) -> anyhow::Result<Vec<UserProfileRecord>> {
    let mut records = Vec::new();
    for row in reader.deserialize::<UserProfileRow>() {
        let row = row.context("malformed user profile row")?;
        records.push(UserProfileRecord {
            career: row.career,
            cycle: row.cycle,
        });
    }
    Ok(records)
}

/// Split a `|`-separated cell into trimmed, non-empty labels.
fn split_labels(raw: Option<&str>) -> Vec<String> {
    raw.map(|cell| {
        cell.split('|')
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Parse a `name:count|name:count` cell; malformed pairs are skipped.
fn parse_tool_usage(raw: Option<&str>) -> HashMap<String, u32> {
    let mut tools = HashMap::new();
    let Some(raw) = raw else {
        return tools;
    };

    for pair in raw.split('|').map(str::trim).filter(|pair| !pair.is_empty()) {
        match pair.split_once(':') {
            Some((name, uses)) if !name.trim().is_empty() => match uses.trim().parse::<u32>() {
                Ok(uses) => {
                    tools.insert(name.trim().to_string(), uses);
                }
                Err(_) => debug!(pair, "ignoring malformed tool usage entry"),
            },
            _ => debug!(pair, "ignoring malformed tool usage entry"),
        }
    }
    tools
}
