//! C# (Mono) language handler

use super::LanguageHandler;
use crate::{constants::container_images, models::Language};

/// Runtime, JIT and thread stacks outside the SGen heap
const RUNTIME_HEADROOM_MB: u64 = 256;

const DRIVER: &str = r#"using System;
using System.Collections;
using System.Collections.Generic;
using System.Globalization;
using System.Text;

{CODE}

public static class JudgeDriver
{
    public static void Main()
    {
        string marker = Console.In.ReadLine();
        var inputs = new List<string>();
        string line;
        while ((line = Console.In.ReadLine()) != null)
        {
            if (line.Length == 0)
            {
                continue;
            }
            inputs.Add(Encoding.UTF8.GetString(Convert.FromBase64String(line)));
        }
        object result = Solution.{ENTRY}(inputs.ToArray());
        string rendered = Render(result);
        Console.Out.Flush();
        Console.WriteLine(marker);
        Console.WriteLine(rendered);
    }

    static string Render(object value)
    {
        if (value is string || value is char)
        {
            return value.ToString();
        }
        var output = new StringBuilder();
        WriteJson(output, value);
        return output.ToString();
    }

    static void WriteJson(StringBuilder output, object value)
    {
        if (value == null)
        {
            output.Append("null");
        }
        else if (value is string || value is char)
        {
            WriteString(output, value.ToString());
        }
        else if (value is bool)
        {
            output.Append((bool)value ? "true" : "false");
        }
        else if (value is double || value is float)
        {
            double d = Convert.ToDouble(value, CultureInfo.InvariantCulture);
            output.Append(double.IsNaN(d) || double.IsInfinity(d)
                ? "null"
                : ((IFormattable)value).ToString("R", CultureInfo.InvariantCulture));
        }
        else if (value is IFormattable)
        {
            output.Append(((IFormattable)value).ToString(null, CultureInfo.InvariantCulture));
        }
        else if (value is IDictionary)
        {
            output.Append('{');
            bool first = true;
            foreach (DictionaryEntry entry in (IDictionary)value)
            {
                if (!first)
                {
                    output.Append(',');
                }
                first = false;
                WriteString(output, Convert.ToString(entry.Key, CultureInfo.InvariantCulture));
                output.Append(':');
                WriteJson(output, entry.Value);
            }
            output.Append('}');
        }
        else if (value is IEnumerable)
        {
            output.Append('[');
            bool first = true;
            foreach (object item in (IEnumerable)value)
            {
                if (!first)
                {
                    output.Append(',');
                }
                first = false;
                WriteJson(output, item);
            }
            output.Append(']');
        }
        else
        {
            WriteString(output, value.ToString());
        }
    }

    static void WriteString(StringBuilder output, string text)
    {
        output.Append('"');
        foreach (char c in text)
        {
            switch (c)
            {
                case '"': output.Append("\\\""); break;
                case '\\': output.Append("\\\\"); break;
                case '\n': output.Append("\\n"); break;
                case '\r': output.Append("\\r"); break;
                case '\t': output.Append("\\t"); break;
                default:
                    if (c < ' ')
                    {
                        output.Append("\\u").Append(((int)c).ToString("x4"));
                    }
                    else
                    {
                        output.Append(c);
                    }
                    break;
            }
        }
        output.Append('"');
    }
}
"#;

/// Get handler for C#
pub fn handler() -> LanguageHandler {
    LanguageHandler::new(
        Language::CSharp,
        "Main.cs",
        &["env", "MONO_GC_PARAMS=max-heap-size={memory_mb}m", "mono", "main.exe"],
    )
    .with_compile_command(&["mcs", "-out:main.exe", "Main.cs"])
    .with_image(container_images::CSHARP)
    .with_runtime_heap(RUNTIME_HEADROOM_MB)
    .with_memory_markers(&["System.OutOfMemoryException"])
}

/// Wrap user code in the C# driver
pub fn driver(code: &str, entry_point: &str) -> String {
    DRIVER
        .replace("{ENTRY}", entry_point)
        .replace("{CODE}", code)
}
