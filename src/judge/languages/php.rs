//! PHP language handler

use super::LanguageHandler;
use crate::{constants::container_images, models::Language};

const DRIVER: &str = r#"<?php
{CODE}

(function () {
    $lines = explode("\n", stream_get_contents(STDIN));
    $marker = array_shift($lines);
    $args = [];
    foreach ($lines as $line) {
        if ($line === '') {
            continue;
        }
        $raw = base64_decode($line);
        $value = json_decode($raw, true);
        $args[] = (json_last_error() === JSON_ERROR_NONE) ? $value : $raw;
    }
    $result = {ENTRY}(...$args);
    echo $marker, "\n";
    echo is_string($result) ? $result : json_encode($result);
    echo "\n";
})();
"#;

/// Get handler for PHP
pub fn handler() -> LanguageHandler {
    LanguageHandler::new(
        Language::Php,
        "solution.php",
        &["php", "-d", "memory_limit={memory_mb}M", "solution.php"],
    )
    .with_image(container_images::PHP)
    .with_memory_markers(&["Allowed memory size", "Out of memory"])
}

/// Wrap user code in the PHP driver
pub fn driver(code: &str, entry_point: &str) -> String {
    DRIVER
        .replace("{ENTRY}", entry_point)
        .replace("{CODE}", strip_php_tags(code))
}

/// The driver opens its own `<?php` block
fn strip_php_tags(code: &str) -> &str {
    let code = code.trim();
    let code = code.strip_prefix("<?php").unwrap_or(code);
    code.strip_suffix("?>").unwrap_or(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_php_tags() {
        assert_eq!(strip_php_tags("<?php\nfunction f() {}\n?>").trim(), "function f() {}");
        assert_eq!(strip_php_tags("function f() {}"), "function f() {}");
    }

    #[test]
    fn test_driver_has_single_open_tag() {
        let source = driver("<?php function solution($n) { return $n; }", "solution");
        assert_eq!(source.matches("<?php").count(), 1);
    }
}
