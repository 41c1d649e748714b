//! Problem repository

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Example, Problem, TestCase},
};

/// Read access to problems and their cases
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProblemStore: Send + Sync {
    /// Find problem by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Problem>>;

    /// Visible examples, ordered by position
    async fn list_examples(&self, problem_id: Uuid) -> AppResult<Vec<Example>>;

    /// Hidden test cases, ordered by position
    async fn list_test_cases(&self, problem_id: Uuid) -> AppResult<Vec<TestCase>>;
}

/// Postgres-backed problem store
#[derive(Clone)]
pub struct ProblemRepository {
    pool: PgPool,
}

impl ProblemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProblemStore for ProblemRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Problem>> {
        let problem = sqlx::query_as::<_, Problem>(r#"SELECT * FROM problems WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(problem)
    }

    async fn list_examples(&self, problem_id: Uuid) -> AppResult<Vec<Example>> {
        let examples = sqlx::query_as::<_, Example>(
            r#"
            SELECT id, problem_id, position, inputs, output, explanation
            FROM problem_examples
            WHERE problem_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(problem_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(examples)
    }

    async fn list_test_cases(&self, problem_id: Uuid) -> AppResult<Vec<TestCase>> {
        let test_cases = sqlx::query_as::<_, TestCase>(
            r#"
            SELECT id, problem_id, position, inputs, output
            FROM test_cases
            WHERE problem_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(problem_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(test_cases)
    }
}
