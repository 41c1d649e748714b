//! Submission model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::constants::statuses;

/// Submission database model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub problem_id: Uuid,
    pub language: String,
    pub code: String,
    pub status: String,
    pub passed_test_cases: i32,
    pub total_test_cases: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values for inserting a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubmission {
    pub user_id: Uuid,
    pub problem_id: Uuid,
    pub language: String,
    pub code: String,
    pub status: SubmissionStatus,
    pub passed_test_cases: i32,
    pub total_test_cases: i32,
}

/// Grading status of a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionStatus {
    Accepted,
    WrongAnswer,
}

impl SubmissionStatus {
    /// `Accepted` iff every case passed
    pub fn from_counts(passed: usize, total: usize) -> Self {
        if passed == total {
            Self::Accepted
        } else {
            Self::WrongAnswer
        }
    }

    /// Get status as string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => statuses::ACCEPTED,
            Self::WrongAnswer => statuses::WRONG_ANSWER,
        }
    }

    /// Parse status from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            statuses::ACCEPTED => Some(Self::Accepted),
            statuses::WRONG_ANSWER => Some(Self::WrongAnswer),
            _ => None,
        }
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_counts() {
        assert_eq!(SubmissionStatus::from_counts(3, 3), SubmissionStatus::Accepted);
        assert_eq!(SubmissionStatus::from_counts(2, 3), SubmissionStatus::WrongAnswer);
        assert_eq!(SubmissionStatus::from_counts(0, 3), SubmissionStatus::WrongAnswer);
    }

    #[test]
    fn test_status_string_round_trip() {
        for status in [SubmissionStatus::Accepted, SubmissionStatus::WrongAnswer] {
            assert_eq!(SubmissionStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(SubmissionStatus::from_str("accepted"), None);
    }
}
