//! Generated drivers run through real runtimes
//!
//! Each test is skipped when its runtime is not installed.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    judge::{
        sandbox::ProcessSandbox, CaseReport, CaseState, GradeRequest, JudgeEngine, JudgeSettings,
    },
    models::{GradingCase, Language, NamedInput},
};

const PYTHON: &str = r#"
def solution(kind, n):
    if kind == "scalar":
        return n * n
    if kind == "string":
        return "hello"
    if kind == "array":
        return [3, 9]
    if kind == "bool":
        return True
    if kind == "log":
        print("debug line")
        return 1
    raise ValueError("boom")
"#;

const JAVASCRIPT: &str = r#"
function solution(kind, n) {
  switch (kind) {
    case "scalar":
      return n * n;
    case "string":
      return "hello";
    case "array":
      return [3, 9];
    case "bool":
      return true;
    case "log":
      console.log("debug line");
      return 1;
    default:
      throw new Error("boom");
  }
}
"#;

const JAVA: &str = r#"
public class Solution {
    public static Object solution(String[] args) {
        int n = Integer.parseInt(args[1]);
        switch (args[0]) {
            case "scalar": return n * n;
            case "string": return "hello";
            case "array": return new int[] {3, 9};
            case "bool": return true;
            case "log":
                System.out.println("debug line");
                return 1;
            default: throw new IllegalStateException("boom");
        }
    }
}
"#;

const CSHARP: &str = r#"
public class Solution
{
    public static object solution(string[] args)
    {
        int n = int.Parse(args[1]);
        switch (args[0])
        {
            case "scalar": return n * n;
            case "string": return "hello";
            case "array": return new int[] { 3, 9 };
            case "bool": return true;
            case "log":
                Console.WriteLine("debug line");
                return 1;
            default: throw new InvalidOperationException("boom");
        }
    }
}
"#;

const PHP: &str = r#"<?php
function solution($kind, $n) {
    switch ($kind) {
        case "scalar": return $n * $n;
        case "string": return "hello";
        case "array": return [3, 9];
        case "bool": return true;
        case "log":
            echo "debug line\n";
            return 1;
        default: throw new Exception("boom");
    }
}
"#;

/// (kind, expected output); the last kind throws
const KINDS: &[(&str, &str)] = &[
    ("scalar", "16"),
    ("string", "hello"),
    ("array", "[3,9]"),
    ("bool", "true"),
    ("log", "1"),
    ("throw", ""),
];

fn installed(binaries: &[&str]) -> bool {
    let path = std::env::var_os("PATH").unwrap_or_default();
    binaries.iter().all(|binary| {
        std::env::split_paths(&path).any(|dir| Path::new(&dir).join(binary).is_file())
    })
}

fn local_engine() -> JudgeEngine {
    JudgeEngine::new(
        Arc::new(ProcessSandbox::new(None)),
        JudgeSettings {
            max_parallel_cases: 2,
            request_timeout: Duration::from_secs(120),
            compile_time_limit_ms: 30_000,
            output_limit_bytes: 64 * 1024,
        },
    )
}

fn request(
    language: Language,
    code: &str,
    memory_limit_mb: u64,
    cases: Vec<GradingCase>,
) -> GradeRequest {
    GradeRequest {
        code: code.to_string(),
        language,
        entry_point: "solution".to_string(),
        time_limit_ms: 10_000,
        memory_limit_mb,
        cases,
    }
}

fn kind_cases() -> Vec<GradingCase> {
    KINDS
        .iter()
        .enumerate()
        .map(|(index, (kind, expected))| GradingCase {
            index,
            inputs: vec![NamedInput::new("kind", *kind), NamedInput::new("n", "4")],
            expected_output: expected.to_string(),
        })
        .collect()
}

async fn grade_kinds(language: Language, code: &str) -> Vec<CaseReport> {
    local_engine()
        .grade(&request(language, code, 256, kind_cases()))
        .await
}

fn assert_driver_contract(language: Language, reports: &[CaseReport]) {
    assert_eq!(reports.len(), KINDS.len());

    for (report, (kind, expected)) in reports.iter().zip(KINDS).take(KINDS.len() - 1) {
        assert_eq!(
            report.state,
            CaseState::Passed,
            "{} {}: got {:?} ({:?})",
            language,
            kind,
            report.actual_output,
            report.exit_error
        );
        assert_eq!(report.actual_output.trim(), *expected);
    }

    let log = &reports[4];
    assert_eq!(log.logs, vec!["debug line".to_string()]);
    assert!(reports[0].logs.is_empty());

    let thrown = &reports[5];
    assert_eq!(thrown.state, CaseState::Errored, "{} throw", language);
    assert!(thrown.actual_output.is_empty());
    assert!(thrown.exit_error.is_some());
}

#[tokio::test]
async fn test_python_driver() {
    if !installed(&["python3"]) {
        eprintln!("python3 not installed, skipping");
        return;
    }
    let reports = grade_kinds(Language::Python, PYTHON).await;
    assert_driver_contract(Language::Python, &reports);
}

#[tokio::test]
async fn test_javascript_driver() {
    if !installed(&["node"]) {
        eprintln!("node not installed, skipping");
        return;
    }
    let reports = grade_kinds(Language::JavaScript, JAVASCRIPT).await;
    assert_driver_contract(Language::JavaScript, &reports);
}

#[tokio::test]
async fn test_java_driver() {
    if !installed(&["javac", "java"]) {
        eprintln!("javac/java not installed, skipping");
        return;
    }
    let reports = grade_kinds(Language::Java, JAVA).await;
    assert_driver_contract(Language::Java, &reports);
}

#[tokio::test]
async fn test_csharp_driver() {
    if !installed(&["mcs", "mono"]) {
        eprintln!("mcs/mono not installed, skipping");
        return;
    }
    let reports = grade_kinds(Language::CSharp, CSHARP).await;
    assert_driver_contract(Language::CSharp, &reports);
}

#[tokio::test]
async fn test_php_driver() {
    if !installed(&["php"]) {
        eprintln!("php not installed, skipping");
        return;
    }
    let reports = grade_kinds(Language::Php, PHP).await;
    assert_driver_contract(Language::Php, &reports);
}

#[tokio::test]
async fn test_javascript_buffer_outside_heap_hits_memory_limit() {
    if !installed(&["node"]) {
        eprintln!("node not installed, skipping");
        return;
    }
    let code = "function solution() { return Buffer.alloc(600 * 1024 * 1024).length; }";
    let cases = vec![GradingCase {
        index: 0,
        inputs: Vec::new(),
        expected_output: "629145600".to_string(),
    }];

    let reports = local_engine()
        .grade(&request(Language::JavaScript, code, 64, cases))
        .await;

    assert_eq!(reports[0].state, CaseState::Errored);
    assert_eq!(reports[0].exit_error.as_deref(), Some("memory_limit_exceeded"));
}
