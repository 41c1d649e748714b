//! Run and submit result shapes returned to the client

use serde::Serialize;
use uuid::Uuid;

use crate::judge::CaseReport;

use super::{GradingCase, SubmissionStatus};

/// One visible example's outcome for "Run"
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResultEntry {
    pub passed: bool,
    pub logs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
}

impl RunResultEntry {
    pub fn from_report(case: &GradingCase, report: &CaseReport) -> Self {
        Self {
            passed: report.passed(),
            logs: report.logs_with_diagnostic(),
            expected_output: Some(case.expected_output.clone()),
        }
    }
}

/// Build the run result, one entry per example in stored order
pub fn run_results(cases: &[GradingCase], reports: &[CaseReport]) -> Vec<RunResultEntry> {
    cases
        .iter()
        .zip(reports)
        .map(|(case, report)| RunResultEntry::from_report(case, report))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionMeta {
    pub passed_test_cases: usize,
    pub total_test_cases: usize,
}

/// One hidden case's outcome for "Submit". Only the first failing case
/// carries its input and outputs; the others report `passed` and `exitError`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResultEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
    pub passed: bool,
    /// `timeout`, `memory_limit_exceeded` or a compile/runtime diagnostic
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_error: Option<String>,
}

impl SubmissionResultEntry {
    pub fn from_report(case: &GradingCase, report: &CaseReport, surfaced: bool) -> Self {
        Self {
            input: surfaced.then(|| case.describe_inputs()),
            actual_output: surfaced.then(|| report.actual_output.clone()),
            expected_output: surfaced.then(|| case.expected_output.clone()),
            passed: report.passed(),
            exit_error: report.exit_error.clone(),
        }
    }
}

/// Aggregated submit outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResult {
    pub meta: SubmissionMeta,
    pub results: Vec<SubmissionResultEntry>,
    /// Index of the first failing case in stored order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_failing_test_case: Option<usize>,
    pub status: SubmissionStatus,
    /// Set once the submission record is written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<Uuid>,
}

impl SubmissionResult {
    pub fn from_reports(cases: &[GradingCase], reports: &[CaseReport]) -> Self {
        let first_failing = reports.iter().position(|r| !r.passed());

        let results: Vec<SubmissionResultEntry> = cases
            .iter()
            .zip(reports)
            .enumerate()
            .map(|(i, (case, report))| {
                SubmissionResultEntry::from_report(case, report, first_failing == Some(i))
            })
            .collect();

        let passed = results.iter().filter(|r| r.passed).count();
        let total = results.len();

        Self {
            meta: SubmissionMeta {
                passed_test_cases: passed,
                total_test_cases: total,
            },
            first_failing_test_case: first_failing,
            status: SubmissionStatus::from_counts(passed, total),
            results,
            submission_id: None,
        }
    }
}
