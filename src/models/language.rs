//! Supported submission languages

use serde::{Deserialize, Serialize};

/// Language a submission is written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    JavaScript,
    Python,
    Java,
    CSharp,
    Php,
}

impl Language {
    /// Every language the judge knows how to run
    pub const ALL: [Language; 5] = [
        Language::JavaScript,
        Language::Python,
        Language::Java,
        Language::CSharp,
        Language::Php,
    ];

    /// Wire identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JavaScript => "javascript",
            Self::Python => "python",
            Self::Java => "java",
            Self::CSharp => "csharp",
            Self::Php => "php",
        }
    }

    /// Parse a wire identifier (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "javascript" => Some(Self::JavaScript),
            "python" => Some(Self::Python),
            "java" => Some(Self::Java),
            "csharp" => Some(Self::CSharp),
            "php" => Some(Self::Php),
            _ => None,
        }
    }

    /// Whether the program must be compiled before it runs
    pub fn is_compiled(&self) -> bool {
        matches!(self, Self::Java | Self::CSharp)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
