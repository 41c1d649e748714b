//! Java language handler

use super::LanguageHandler;
use crate::{constants::container_images, models::Language};

/// Metaspace, code cache and GC structures, plus a 64 MiB stack for every
/// Java thread the VM starts
const RUNTIME_HEADROOM_MB: u64 = 1024;

const DRIVER: &str = r#"import java.io.BufferedReader;
import java.io.InputStreamReader;
import java.nio.charset.StandardCharsets;
import java.util.ArrayList;
import java.util.Base64;
import java.util.List;

{CODE}

public class Main {
    public static void main(String[] args) throws Exception {
        BufferedReader reader = new BufferedReader(new InputStreamReader(System.in, StandardCharsets.UTF_8));
        String marker = reader.readLine();
        List<String> inputs = new ArrayList<>();
        String line;
        while ((line = reader.readLine()) != null) {
            if (line.isEmpty()) {
                continue;
            }
            inputs.add(new String(Base64.getDecoder().decode(line), StandardCharsets.UTF_8));
        }
        Object result = Solution.{ENTRY}(inputs.toArray(new String[0]));
        String rendered = render(result);
        System.out.flush();
        System.out.println(marker);
        System.out.println(rendered);
    }

    private static String render(Object value) {
        if (value instanceof String || value instanceof Character) {
            return value.toString();
        }
        StringBuilder out = new StringBuilder();
        writeJson(out, value);
        return out.toString();
    }

    private static void writeJson(StringBuilder out, Object value) {
        if (value == null) {
            out.append("null");
        } else if (value instanceof String || value instanceof Character) {
            writeString(out, value.toString());
        } else if (value instanceof Boolean) {
            out.append(value.toString());
        } else if (value instanceof Number) {
            double d = ((Number) value).doubleValue();
            out.append(Double.isNaN(d) || Double.isInfinite(d) ? "null" : value.toString());
        } else if (value.getClass().isArray()) {
            int length = java.lang.reflect.Array.getLength(value);
            out.append('[');
            for (int i = 0; i < length; i++) {
                if (i > 0) {
                    out.append(',');
                }
                writeJson(out, java.lang.reflect.Array.get(value, i));
            }
            out.append(']');
        } else if (value instanceof java.util.Map) {
            out.append('{');
            boolean first = true;
            for (java.util.Map.Entry<?, ?> entry : ((java.util.Map<?, ?>) value).entrySet()) {
                if (!first) {
                    out.append(',');
                }
                first = false;
                writeString(out, String.valueOf(entry.getKey()));
                out.append(':');
                writeJson(out, entry.getValue());
            }
            out.append('}');
        } else if (value instanceof Iterable) {
            out.append('[');
            boolean first = true;
            for (Object item : (Iterable<?>) value) {
                if (!first) {
                    out.append(',');
                }
                first = false;
                writeJson(out, item);
            }
            out.append(']');
        } else {
            writeString(out, value.toString());
        }
    }

    private static void writeString(StringBuilder out, String text) {
        out.append('"');
        for (int i = 0; i < text.length(); i++) {
            char c = text.charAt(i);
            switch (c) {
                case '"': out.append("\\\""); break;
                case '\\': out.append("\\\\"); break;
                case '\n': out.append("\\n"); break;
                case '\r': out.append("\\r"); break;
                case '\t': out.append("\\t"); break;
                default:
                    if (c < 0x20) {
                        out.append(String.format("\\u%04x", (int) c));
                    } else {
                        out.append(c);
                    }
            }
        }
        out.append('"');
    }
}
"#;

/// Get handler for Java
pub fn handler() -> LanguageHandler {
    LanguageHandler::new(
        Language::Java,
        "Main.java",
        &[
            "java",
            "-XX:+UseSerialGC",
            "-Xmx{memory_mb}m",
            "-XX:MaxDirectMemorySize={memory_mb}m",
            "-Xss64m",
            "-cp",
            ".",
            "Main",
        ],
    )
    .with_compile_command(&["javac", "-encoding", "UTF-8", "Main.java"])
    .with_image(container_images::JAVA)
    .with_runtime_heap(RUNTIME_HEADROOM_MB)
    .with_memory_markers(&["java.lang.OutOfMemoryError"])
}

/// Wrap user code in the Java driver
///
/// Only `Main` may be public in `Main.java`, so a public `Solution` class is
/// demoted to package visibility.
pub fn driver(code: &str, entry_point: &str) -> String {
    let code = code.replace("public class Solution", "class Solution");
    DRIVER
        .replace("{ENTRY}", entry_point)
        .replace("{CODE}", &code)
}
