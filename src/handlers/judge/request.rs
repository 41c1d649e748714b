//! Run/submit request DTOs

use serde::Deserialize;
use validator::Validate;

use crate::utils::validation::validate_source_code;

/// Run code against a problem's visible examples
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RunCodeRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_source_code"))]
    pub code: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Language is required"))]
    pub language: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "problemId is required"))]
    pub problem_id: String,
}

/// Grade code against a problem's hidden test cases and record it
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitCodeRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_source_code"))]
    pub code: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Language is required"))]
    pub language: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "problemId is required"))]
    pub problem_id: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "userId is required"))]
    pub user_id: String,
}

impl SubmitCodeRequest {
    pub fn as_run(&self) -> RunCodeRequest {
        RunCodeRequest {
            code: self.code.clone(),
            language: self.language.clone(),
            problem_id: self.problem_id.clone(),
        }
    }
}
