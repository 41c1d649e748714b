//! Input validation utilities

use std::borrow::Cow;

use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::{
    config::JudgeConfig,
    constants::MAX_SOURCE_CODE_SIZE,
    error::{AppError, AppResult},
    models::Language,
};

/// Validate source code size (validator custom rule)
pub fn validate_source_code(code: &str) -> Result<(), ValidationError> {
    if code.trim().is_empty() {
        return Err(rule("code_empty", "Code must not be empty"));
    }
    if code.len() > MAX_SOURCE_CODE_SIZE {
        return Err(rule("code_too_large", "Code exceeds the maximum size of 1 MB"));
    }
    Ok(())
}

/// Resolve a language identifier against the enabled set
pub fn parse_language(raw: &str, config: &JudgeConfig) -> AppResult<Language> {
    match Language::parse(raw) {
        Some(language) if config.is_enabled(language) => Ok(language),
        _ => {
            let supported: Vec<&str> = config.enabled_languages.iter().map(|l| l.as_str()).collect();
            Err(AppError::Validation(format!(
                "Unsupported language '{}'. Supported: {}",
                raw.trim(),
                supported.join(", ")
            )))
        }
    }
}

/// Parse an ID field, naming the field on failure
pub fn parse_id(raw: &str, field: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::Validation(format!("{} is not a valid id", field)))
}

/// First failing rule of each field, as one sentence
pub fn describe_errors(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let messages: Vec<String> = fields
        .into_iter()
        .filter_map(|(field, errs)| {
            errs.first().map(|e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("{} is invalid", field),
            })
        })
        .collect();

    if messages.is_empty() {
        "Invalid request".to_string()
    } else {
        messages.join("; ")
    }
}

fn rule(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_config;

    #[test]
    fn test_validate_source_code() {
        assert!(validate_source_code("print(1)").is_ok());
        assert!(validate_source_code("").is_err());
        assert!(validate_source_code(" \n\t").is_err());
        assert!(validate_source_code(&"x".repeat(MAX_SOURCE_CODE_SIZE + 1)).is_err());
    }

    #[test]
    fn test_parse_language() {
        let config = test_config();
        assert_eq!(parse_language("Python", &config.judge).unwrap(), Language::Python);

        let err = parse_language("cobol", &config.judge).unwrap_err();
        match err {
            AppError::Validation(message) => {
                assert!(message.contains("cobol"));
                assert!(message.contains("javascript"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_disabled_language_rejected() {
        let mut config = test_config();
        config.judge.enabled_languages = vec![Language::Python];
        assert!(parse_language("java", &config.judge).is_err());
    }

    #[test]
    fn test_parse_id() {
        assert!(parse_id("6f1c3c1e-2f4b-4c4e-9d0a-6a9d2f0e8b11", "problemId").is_ok());
        let err = parse_id("42", "problemId").unwrap_err();
        assert_eq!(err.to_string(), "problemId is not a valid id");
    }
}
