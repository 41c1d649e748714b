//! Python language handler

use super::LanguageHandler;
use crate::{constants::container_images, models::Language};

const DRIVER: &str = r#"{CODE}


if __name__ == "__main__":
    def _judge_main():
        import base64
        import json
        import sys

        def decode(line):
            raw = base64.b64decode(line).decode("utf-8")
            try:
                return json.loads(raw)
            except ValueError:
                return raw

        lines = sys.stdin.read().split("\n")
        marker = lines[0]
        args = [decode(l) for l in lines[1:] if l]
        result = {ENTRY}(*args)
        sys.stdout.write(marker + "\n")
        if isinstance(result, str):
            sys.stdout.write(result)
        else:
            sys.stdout.write(json.dumps(result, separators=(",", ":")))
        sys.stdout.write("\n")

    _judge_main()
"#;

/// Get handler for Python
pub fn handler() -> LanguageHandler {
    LanguageHandler::new(Language::Python, "solution.py", &["python3", "-u", "solution.py"])
        .with_image(container_images::PYTHON)
        .with_memory_markers(&["MemoryError"])
}

/// Wrap user code in the Python driver
pub fn driver(code: &str, entry_point: &str) -> String {
    DRIVER
        .replace("{ENTRY}", entry_point)
        .replace("{CODE}", code)
}
