//! Execution harness: turns user code plus one case's inputs into a runnable
//! program, and splits the program's stdout back into logs and result.
//!
//! Stdin carries a per-execution marker on its first line, then one
//! base64-encoded value per line in declared order. The driver reads the
//! marker before user code gets control and prints it right before the entry
//! point's return value, so anything the user printed earlier is a log. The
//! marker never appears in the source file.

use base64::Engine;
use uuid::Uuid;

use crate::models::{Language, NamedInput};

use super::languages::LanguageHandler;

/// Prefix of the result marker line
pub const MARKER_PREFIX: &str = "__codejudge_result_";

/// A ready-to-run program for one test case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub language: Language,
    pub source_file: String,
    pub source: String,
    pub stdin: String,
    pub marker: String,
}

/// Generate a fresh result marker
pub fn new_marker() -> String {
    format!("{}{}", MARKER_PREFIX, Uuid::new_v4().simple())
}

/// Build the program for one case
pub fn build_program(
    language: Language,
    code: &str,
    entry_point: &str,
    inputs: &[NamedInput],
) -> Program {
    let handler = LanguageHandler::for_language(language);
    let marker = new_marker();

    Program {
        language,
        source_file: handler.source_file().to_string(),
        source: handler.wrap(code, entry_point),
        stdin: encode_stdin(&marker, inputs),
        marker,
    }
}

/// The marker line followed by inputs as base64 lines, in declared order
pub fn encode_stdin(marker: &str, inputs: &[NamedInput]) -> String {
    let engine = base64::engine::general_purpose::STANDARD;
    let mut stdin = format!("{}\n", marker);
    for input in inputs {
        stdin.push_str(&engine.encode(input.value.as_bytes()));
        stdin.push('\n');
    }
    stdin
}

/// Program stdout split at the result marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOutput {
    pub logs: Vec<String>,
    /// `None` when the entry point never returned
    pub result: Option<String>,
}

/// Split stdout into user logs and the returned value. The driver prints the
/// marker last, so an earlier copy of it is a log line.
pub fn split_output(stdout: &str, marker: &str) -> ParsedOutput {
    match stdout.rfind(marker) {
        Some(idx) => {
            let (before, rest) = stdout.split_at(idx);
            let after = &rest[marker.len()..];
            let after = after
                .strip_prefix("\r\n")
                .or_else(|| after.strip_prefix('\n'))
                .unwrap_or(after);
            let result = after
                .strip_suffix("\r\n")
                .or_else(|| after.strip_suffix('\n'))
                .unwrap_or(after);

            ParsedOutput {
                logs: log_lines(before),
                result: Some(result.to_string()),
            }
        }
        None => ParsedOutput {
            logs: log_lines(stdout),
            result: None,
        },
    }
}

fn log_lines(text: &str) -> Vec<String> {
    text.lines().map(|l| l.trim_end_matches('\r').to_string()).collect()
}
