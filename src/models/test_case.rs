//! Example and hidden test case models

use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

/// One named argument passed to the user's entry point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedInput {
    pub name: String,
    pub value: String,
}

impl NamedInput {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Illustrative case shown to the user; backs the "Run" action
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Example {
    pub id: Uuid,
    pub problem_id: Uuid,
    pub position: i32,
    pub inputs: Json<Vec<NamedInput>>,
    pub output: String,
    pub explanation: Option<String>,
}

/// Hidden grading case; backs the "Submit" action
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TestCase {
    pub id: Uuid,
    pub problem_id: Uuid,
    pub position: i32,
    pub inputs: Json<Vec<NamedInput>>,
    pub output: String,
}

/// Case handed to the judge engine, indexed by its stable position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradingCase {
    pub index: usize,
    pub inputs: Vec<NamedInput>,
    pub expected_output: String,
}

impl GradingCase {
    /// Build grading cases from examples, in stored order
    pub fn from_examples(examples: &[Example]) -> Vec<Self> {
        let mut sorted: Vec<&Example> = examples.iter().collect();
        sorted.sort_by_key(|e| e.position);
        sorted
            .into_iter()
            .enumerate()
            .map(|(index, e)| Self {
                index,
                inputs: e.inputs.0.clone(),
                expected_output: e.output.clone(),
            })
            .collect()
    }

    /// Build grading cases from hidden test cases, in stored order
    pub fn from_test_cases(test_cases: &[TestCase]) -> Vec<Self> {
        let mut sorted: Vec<&TestCase> = test_cases.iter().collect();
        sorted.sort_by_key(|t| t.position);
        sorted
            .into_iter()
            .enumerate()
            .map(|(index, t)| Self {
                index,
                inputs: t.inputs.0.clone(),
                expected_output: t.output.clone(),
            })
            .collect()
    }

    /// Human-readable rendering of the inputs (`name = value` per line)
    pub fn describe_inputs(&self) -> String {
        self.inputs
            .iter()
            .map(|i| format!("{} = {}", i.name, i.value))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
