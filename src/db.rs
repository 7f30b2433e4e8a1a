use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use crate::models::{
    ApplicationStatus, ApplicationTrackingRecord, CvEvaluationRecord, CvResult, EvaluationStatus,
    InterviewSessionRecord, QuestionEvaluation, QuestionRecord, UserProfileRecord, UserRef,
};
use crate::source::RecordSource;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Record source backed by the production Postgres system of record.
pub struct PgRecordSource {
    pool: PgPool,
}

impl PgRecordSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordSource for PgRecordSource {
    async fn cv_evaluations(&self) -> anyhow::Result<Vec<CvEvaluationRecord>> {
        let rows = sqlx::query(
            "SELECT e.status, e.score, e.aspects, u.display_name, u.career, u.cycle \
             FROM careerlab.cv_evaluations e \
             LEFT JOIN careerlab.users u ON u.id = e.user_id",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to fetch cv evaluations")?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let status: String = row.get("status");
            let display_name: Option<String> = row.get("display_name");
            let score: Option<f64> = row.get("score");
            let aspects: Option<Vec<String>> = row.get("aspects");

            let user = display_name.map(|display_name| UserRef {
                display_name,
                career: row.get("career"),
                cycle: row.get("cycle"),
            });
            let result = score.map(|score| CvResult {
                score,
                aspects_to_improve: aspects.unwrap_or_default(),
            });
            records.push(CvEvaluationRecord {
                status: EvaluationStatus::parse(&status),
                user,
                result,
            });
        }

        Ok(records)
    }

    async fn interview_sessions(&self) -> anyhow::Result<Vec<InterviewSessionRecord>> {
        let question_rows = sqlx::query(
            "SELECT q.session_id, q.aspects \
             FROM careerlab.interview_questions q \
             ORDER BY q.session_id, q.position",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to fetch interview questions")?;

        let mut by_session: HashMap<Uuid, Vec<QuestionRecord>> = HashMap::new();
        for row in question_rows {
            let session_id: Uuid = row.get("session_id");
            let aspects: Option<Vec<String>> = row.get("aspects");
            by_session.entry(session_id).or_default().push(QuestionRecord {
                evaluation: aspects.map(|aspects_to_improve| QuestionEvaluation {
                    aspects_to_improve,
                }),
            });
        }

        let session_rows = sqlx::query(
            "SELECT s.id, s.user_id, s.status, s.score, s.created_at \
             FROM careerlab.interview_sessions s",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to fetch interview sessions")?;

        let mut records = Vec::with_capacity(session_rows.len());
        for row in session_rows {
            let id: Uuid = row.get("id");
            let status: String = row.get("status");
            records.push(InterviewSessionRecord {
                id,
                user_id: row.get("user_id"),
                status: EvaluationStatus::parse(&status),
                score: row.get("score"),
                created_at: row.get("created_at"),
                questions: by_session.remove(&id).unwrap_or_default(),
            });
        }

        Ok(records)
    }

    async fn application_events(&self) -> anyhow::Result<Vec<ApplicationTrackingRecord>> {
        let tool_rows = sqlx::query(
            "SELECT t.application_id, t.tool_name, t.uses \
             FROM careerlab.application_tools t",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to fetch application tools")?;

        let mut tools_by_application: HashMap<Uuid, HashMap<String, u32>> = HashMap::new();
        for row in tool_rows {
            let application_id: Uuid = row.get("application_id");
            let tool_name: String = row.get("tool_name");
            let uses: i32 = row.get("uses");
            match u32::try_from(uses) {
                Ok(uses) => {
                    tools_by_application
                        .entry(application_id)
                        .or_default()
                        .insert(tool_name, uses);
                }
                Err(_) => debug!(%application_id, tool_name, uses, "ignoring negative tool usage"),
            }
        }

        let rows = sqlx::query("SELECT a.id, a.status FROM careerlab.applications a")
            .fetch_all(&self.pool)
            .await
            .context("failed to fetch applications")?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let id: Uuid = row.get("id");
            let status: String = row.get("status");
            records.push(ApplicationTrackingRecord {
                status: ApplicationStatus::parse(&status),
                tools_used: tools_by_application.remove(&id).unwrap_or_default(),
            });
        }

        Ok(records)
    }

    async fn user_profiles(&self) -> anyhow::Result<Vec<UserProfileRecord>> {
        let rows = sqlx::query("SELECT u.career, u.cycle FROM careerlab.users u")
            .fetch_all(&self.pool)
            .await
            .context("failed to fetch user profiles")?;

        Ok(rows
            .into_iter()
            .map(|row| UserProfileRecord {
                career: row.get("career"),
                cycle: row.get("cycle"),
            })
            .collect())
    }
}

/// Insert a small, realistic data set for local development.
pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let users = vec![
        (
            Uuid::parse_str("3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2")?,
            "Avery Lee",
            Some("Software Engineering"),
            Some("3"),
        ),
        (
            Uuid::parse_str("0c22f1f1-9184-4fd4-9b21-28c68a6a89dc")?,
            "Jules Moreno",
            Some("Data Science"),
            Some("graduate"),
        ),
        (
            Uuid::parse_str("d5a0a1a2-2a3c-44c2-8f73-60b7897a9dd2")?,
            "Kiara Patel",
            Some("Software Engineering"),
            Some("6"),
        ),
    ];

    for (id, display_name, career, cycle) in &users {
        sqlx::query(
            r#"
            INSERT INTO careerlab.users (id, display_name, career, cycle)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET display_name = EXCLUDED.display_name,
                career = EXCLUDED.career,
                cycle = EXCLUDED.cycle
            "#,
        )
        .bind(id)
        .bind(display_name)
        .bind(career)
        .bind(cycle)
        .execute(pool)
        .await?;
    }

    let evaluations = vec![
        (
            "11111111-0000-4000-8000-000000000001",
            users[0].0,
            "completed",
            Some(82.0),
            vec!["Quantified impact", "Action verbs"],
        ),
        (
            "11111111-0000-4000-8000-000000000002",
            users[0].0,
            "completed",
            Some(88.5),
            vec!["Quantified impact"],
        ),
        (
            "11111111-0000-4000-8000-000000000003",
            users[1].0,
            "completed",
            Some(74.0),
            vec!["Formatting", "Quantified impact"],
        ),
        (
            "11111111-0000-4000-8000-000000000004",
            users[2].0,
            "completed",
            Some(91.0),
            vec![],
        ),
        (
            "11111111-0000-4000-8000-000000000005",
            users[2].0,
            "pending",
            None,
            vec![],
        ),
    ];

    for (id, user_id, status, score, aspects) in evaluations {
        let aspects: Vec<String> = aspects.into_iter().map(str::to_string).collect();
        sqlx::query(
            r#"
            INSERT INTO careerlab.cv_evaluations (id, user_id, status, score, aspects)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(Uuid::parse_str(id)?)
        .bind(user_id)
        .bind(status)
        .bind(score)
        .bind(&aspects)
        .execute(pool)
        .await?;
    }

    let sessions = vec![
        (
            "22222222-0000-4000-8000-000000000001",
            users[0].0,
            Some(61.0),
            Utc.with_ymd_and_hms(2026, 1, 12, 10, 0, 0)
                .single()
                .context("invalid timestamp")?,
            vec![Some(vec!["STAR structure", "Conciseness"]), None],
        ),
        (
            "22222222-0000-4000-8000-000000000002",
            users[0].0,
            Some(72.5),
            Utc.with_ymd_and_hms(2026, 1, 26, 10, 0, 0)
                .single()
                .context("invalid timestamp")?,
            vec![Some(vec!["Conciseness"])],
        ),
        (
            "22222222-0000-4000-8000-000000000003",
            users[1].0,
            Some(68.0),
            Utc.with_ymd_and_hms(2026, 1, 19, 15, 30, 0)
                .single()
                .context("invalid timestamp")?,
            vec![Some(vec!["STAR structure"]), Some(vec!["Eye contact"])],
        ),
    ];

    for (id, user_id, score, created_at, question_aspects) in sessions {
        let session_id = Uuid::parse_str(id)?;
        sqlx::query(
            r#"
            INSERT INTO careerlab.interview_sessions (id, user_id, status, score, created_at)
            VALUES ($1, $2, 'completed', $3, $4)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .bind(score)
        .bind(created_at)
        .execute(pool)
        .await?;

        for (position, aspects) in question_aspects.into_iter().enumerate() {
            let aspects: Option<Vec<String>> =
                aspects.map(|aspects| aspects.into_iter().map(str::to_string).collect());
            sqlx::query(
                r#"
                INSERT INTO careerlab.interview_questions (id, session_id, position, aspects)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(session_id)
            .bind(position as i32)
            .bind(&aspects)
            .execute(pool)
            .await?;
        }
    }

    let applications = vec![
        (
            "33333333-0000-4000-8000-000000000001",
            users[0].0,
            "interviewed",
            vec![("resume-builder", 3), ("job-tracker", 5)],
        ),
        (
            "33333333-0000-4000-8000-000000000002",
            users[1].0,
            "hired",
            vec![("interview-sim", 2)],
        ),
        (
            "33333333-0000-4000-8000-000000000003",
            users[2].0,
            "interviewed",
            vec![],
        ),
        (
            "33333333-0000-4000-8000-000000000004",
            users[2].0,
            "applied",
            vec![("job-tracker", 1)],
        ),
    ];

    for (id, user_id, status, tools) in applications {
        let application_id = Uuid::parse_str(id)?;
        sqlx::query(
            r#"
            INSERT INTO careerlab.applications (id, user_id, status)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(application_id)
        .bind(user_id)
        .bind(status)
        .execute(pool)
        .await?;

        for (tool_name, uses) in tools {
            sqlx::query(
                r#"
                INSERT INTO careerlab.application_tools (application_id, tool_name, uses)
                VALUES ($1, $2, $3)
                ON CONFLICT (application_id, tool_name) DO UPDATE
                SET uses = EXCLUDED.uses
                "#,
            )
            .bind(application_id)
            .bind(tool_name)
            .bind(uses)
            .execute(pool)
            .await?;
        }
    }

    Ok(())
}
