//! JavaScript (Node.js) language handler

use super::LanguageHandler;
use crate::{constants::container_images, models::Language};

/// Thread stacks, code space and buffers the V8 heap flag does not cover
const RUNTIME_HEADROOM_MB: u64 = 256;

const DRIVER: &str = r#"{CODE}

;(() => {
  const [marker, ...lines] = require("fs").readFileSync(0, "utf8").split("\n");
  const args = lines
    .filter((line) => line.length > 0)
    .map((line) => {
      const raw = Buffer.from(line, "base64").toString("utf8");
      try {
        return JSON.parse(raw);
      } catch (_) {
        return raw;
      }
    });
  Promise.resolve()
    .then(() => {ENTRY}(...args))
    .then((result) => {
      const rendered = typeof result === "string" ? result : JSON.stringify(result);
      process.stdout.write(marker + "\n" + String(rendered) + "\n");
    })
    .catch((err) => {
      console.error(err && err.stack ? err.stack : String(err));
      process.exitCode = 1;
    });
})();
"#;

/// Get handler for JavaScript
pub fn handler() -> LanguageHandler {
    LanguageHandler::new(
        Language::JavaScript,
        "solution.js",
        &["node", "--max-old-space-size={memory_mb}", "solution.js"],
    )
    .with_image(container_images::JAVASCRIPT)
    .with_runtime_heap(RUNTIME_HEADROOM_MB)
    .with_memory_markers(&[
        "heap out of memory",
        "Allocation failed",
        "allocation failed",
        "ERR_MEMORY_ALLOCATION_FAILED",
    ])
}

/// Wrap user code in the Node.js driver
pub fn driver(code: &str, entry_point: &str) -> String {
    DRIVER
        .replace("{ENTRY}", entry_point)
        .replace("{CODE}", code)
}
