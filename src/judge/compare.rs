//! Output normalization and comparison
//!
//! Both sides are normalized the same way before a byte-exact comparison:
//!
//! 1. `\r\n` and lone `\r` become `\n`
//! 2. trailing whitespace is stripped from every line
//! 3. leading and trailing blank lines are dropped
//!
//! Internal whitespace, letter case and number formatting stay significant.

/// Normalize program output for comparison
pub fn normalize(output: &str) -> String {
    let unified = output.replace("\r\n", "\n").replace('\r', "\n");

    let lines: Vec<&str> = unified.lines().map(str::trim_end).collect();

    let first = lines.iter().position(|l| !l.is_empty());
    let last = lines.iter().rposition(|l| !l.is_empty());

    match (first, last) {
        (Some(first), Some(last)) => lines[first..=last].join("\n"),
        _ => String::new(),
    }
}

/// Whether the actual output matches the expected output
pub fn outputs_match(actual: &str, expected: &str) -> bool {
    normalize(actual) == normalize(expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(outputs_match("16", "16"));
        assert!(!outputs_match("15", "16"));
    }

    #[test]
    fn test_trailing_newline_ignored() {
        assert!(outputs_match("16\n", "16"));
        assert!(outputs_match("16", "16\n\n\n"));
    }

    #[test]
    fn test_trailing_spaces_per_line_ignored() {
        assert!(outputs_match("1 2 3   \n4 5 6\t", "1 2 3\n4 5 6"));
    }

    #[test]
    fn test_leading_whitespace_on_line_is_significant() {
        assert!(!outputs_match("  16", "16"));
        assert!(!outputs_match("a\n b", "a\nb"));
    }

    #[test]
    fn test_internal_whitespace_is_significant() {
        assert!(!outputs_match("1  2", "1 2"));
        assert!(!outputs_match("[1, 2]", "[1,2]"));
    }

    #[test]
    fn test_windows_and_old_mac_line_endings() {
        assert!(outputs_match("a\r\nb\r\n", "a\nb"));
        assert!(outputs_match("a\rb", "a\nb"));
    }

    #[test]
    fn test_leading_and_trailing_blank_lines_dropped() {
        assert!(outputs_match("\n\n  \nresult\n \n", "result"));
    }

    #[test]
    fn test_interior_blank_lines_are_significant() {
        assert!(outputs_match("a\n\nb", "a\n\nb"));
        assert!(!outputs_match("a\n\nb", "a\nb"));
    }

    #[test]
    fn test_case_is_significant() {
        assert!(!outputs_match("True", "true"));
    }

    #[test]
    fn test_numbers_compared_textually() {
        assert!(!outputs_match("4.0", "4"));
        assert!(!outputs_match("04", "4"));
    }

    #[test]
    fn test_empty_and_whitespace_only() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \n\t\n"), "");
        assert!(outputs_match("", "\n"));
        assert!(!outputs_match("", "0"));
    }

    #[test]
    fn test_normalize_output_shape() {
        assert_eq!(normalize("x  \r\ny\t\r\n\r\n"), "x\ny");
    }
}
