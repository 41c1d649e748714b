//! Problem response DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Example, Language, NamedInput, Problem, Submission};

/// Problem detail view, including the caller's history
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetailResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// Function the user must implement
    pub function_name: String,
    pub time_limit_ms: u64,
    pub memory_limit_mb: u64,
    pub supported_languages: Vec<Language>,
    pub examples: Vec<ExampleResponse>,
    pub submissions: Vec<SubmissionSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleResponse {
    pub inputs: Vec<NamedInput>,
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl From<Example> for ExampleResponse {
    fn from(example: Example) -> Self {
        Self {
            inputs: example.inputs.0,
            output: example.output,
            explanation: example.explanation,
        }
    }
}

/// One past submission
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionSummary {
    pub id: Uuid,
    pub language: String,
    pub code: String,
    pub status: String,
    pub passed_test_cases: i32,
    pub total_test_cases: i32,
    pub created_at: DateTime<Utc>,
}

impl From<Submission> for SubmissionSummary {
    fn from(submission: Submission) -> Self {
        Self {
            id: submission.id,
            language: submission.language,
            code: submission.code,
            status: submission.status,
            passed_test_cases: submission.passed_test_cases,
            total_test_cases: submission.total_test_cases,
            created_at: submission.created_at,
        }
    }
}

/// Paginated submission history
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionsListResponse {
    pub submissions: Vec<SubmissionSummary>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

impl ProblemDetailResponse {
    pub fn build(
        problem: &Problem,
        time_limit_ms: u64,
        memory_limit_mb: u64,
        supported_languages: Vec<Language>,
        examples: Vec<Example>,
        submissions: Vec<Submission>,
    ) -> Self {
        let mut examples = examples;
        examples.sort_by_key(|e| e.position);

        Self {
            id: problem.id,
            title: problem.title.clone(),
            description: problem.description.clone(),
            function_name: problem.entry_point.clone(),
            time_limit_ms,
            memory_limit_mb,
            supported_languages,
            examples: examples.into_iter().map(ExampleResponse::from).collect(),
            submissions: submissions.into_iter().map(SubmissionSummary::from).collect(),
        }
    }
}
