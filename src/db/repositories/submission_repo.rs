//! Submission repository

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{NewSubmission, Submission},
};

/// Submission history storage
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Insert one graded submission
    async fn create(&self, submission: NewSubmission) -> AppResult<Submission>;

    /// A user's submissions for one problem, newest first
    async fn list_for_user_problem(
        &self,
        user_id: Uuid,
        problem_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Submission>>;

    async fn count_for_user_problem(&self, user_id: Uuid, problem_id: Uuid) -> AppResult<i64>;
}

/// Postgres-backed submission store
#[derive(Clone)]
pub struct SubmissionRepository {
    pool: PgPool,
}

impl SubmissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionStore for SubmissionRepository {
    async fn create(&self, submission: NewSubmission) -> AppResult<Submission> {
        let submission = sqlx::query_as::<_, Submission>(
            r#"
            INSERT INTO submissions (
                user_id, problem_id, language, code, status,
                passed_test_cases, total_test_cases
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(submission.user_id)
        .bind(submission.problem_id)
        .bind(&submission.language)
        .bind(&submission.code)
        .bind(submission.status.as_str())
        .bind(submission.passed_test_cases)
        .bind(submission.total_test_cases)
        .fetch_one(&self.pool)
        .await?;

        Ok(submission)
    }

    async fn list_for_user_problem(
        &self,
        user_id: Uuid,
        problem_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Submission>> {
        let submissions = sqlx::query_as::<_, Submission>(
            r#"
            SELECT * FROM submissions
            WHERE user_id = $1 AND problem_id = $2
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(problem_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(submissions)
    }

    async fn count_for_user_problem(&self, user_id: Uuid, problem_id: Uuid) -> AppResult<i64> {
        let count: (i64,) = sqlx::query_as(
            r#"SELECT COUNT(*) FROM submissions WHERE user_id = $1 AND problem_id = $2"#,
        )
        .bind(user_id)
        .bind(problem_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }
}
