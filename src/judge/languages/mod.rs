//! Language-specific handlers for compilation, execution and the call driver

pub mod csharp;
pub mod java;
pub mod javascript;
pub mod php;
pub mod python;

#[cfg(test)]
mod driver_tests;

use crate::models::Language;

/// Placeholder in run commands replaced by the memory limit in MiB
pub const MEMORY_MB_PLACEHOLDER: &str = "{memory_mb}";

/// How a language's memory ceiling is enforced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryCeiling {
    /// RLIMIT_AS at the limit
    AddressSpace,
    /// The run command caps the runtime's heap at the limit; RLIMIT_DATA
    /// allows `headroom_mb` more for the VM itself
    RuntimeHeap { headroom_mb: u64 },
}

/// How one language is compiled and run inside a sandbox
#[derive(Debug, Clone)]
pub struct LanguageHandler {
    language: Language,
    source_file: String,
    compile_command: Option<Vec<String>>,
    run_command: Vec<String>,
    image: String,
    memory_ceiling: MemoryCeiling,
    memory_markers: Vec<String>,
}

impl LanguageHandler {
    /// Handler with a source file and run command; everything else defaulted.
    /// `{memory_mb}` in the run command is replaced by the memory limit.
    pub fn new(language: Language, source_file: &str, run_command: &[&str]) -> Self {
        Self {
            language,
            source_file: source_file.to_string(),
            compile_command: None,
            run_command: run_command.iter().map(|s| s.to_string()).collect(),
            image: String::new(),
            memory_ceiling: MemoryCeiling::AddressSpace,
            memory_markers: Vec::new(),
        }
    }

    /// Get handler for a specific language
    pub fn for_language(language: Language) -> Self {
        match language {
            Language::JavaScript => javascript::handler(),
            Language::Python => python::handler(),
            Language::Java => java::handler(),
            Language::CSharp => csharp::handler(),
            Language::Php => php::handler(),
        }
    }

    pub fn with_compile_command(mut self, command: &[&str]) -> Self {
        self.compile_command = Some(command.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_image(mut self, image: &str) -> Self {
        self.image = image.to_string();
        self
    }

    /// For VMs that reserve large address ranges up front, where RLIMIT_AS
    /// would stop them from starting
    pub fn with_runtime_heap(mut self, headroom_mb: u64) -> Self {
        self.memory_ceiling = MemoryCeiling::RuntimeHeap { headroom_mb };
        self
    }

    /// Stderr fragments that mean the program ran out of memory
    pub fn with_memory_markers(mut self, markers: &[&str]) -> Self {
        self.memory_markers = markers.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Get the source file name
    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    /// Get the compile command (if needed)
    pub fn compile_command(&self) -> Option<&[String]> {
        self.compile_command.as_deref()
    }

    /// Run command for a memory limit
    pub fn run_command(&self, memory_limit_mb: u64) -> Vec<String> {
        let mb = memory_limit_mb.to_string();
        self.run_command
            .iter()
            .map(|arg| arg.replace(MEMORY_MB_PLACEHOLDER, &mb))
            .collect()
    }

    /// Container image used by the Docker backend
    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn memory_ceiling(&self) -> MemoryCeiling {
        self.memory_ceiling
    }

    /// Whether stderr reports an out-of-memory condition
    pub fn reports_out_of_memory(&self, stderr: &str) -> bool {
        self.memory_markers.iter().any(|m| stderr.contains(m.as_str()))
    }

    /// Wrap user code with the driver. The driver takes the result marker
    /// from the first stdin line, so the source never contains it.
    pub fn wrap(&self, code: &str, entry_point: &str) -> String {
        match self.language {
            Language::JavaScript => javascript::driver(code, entry_point),
            Language::Python => python::driver(code, entry_point),
            Language::Java => java::driver(code, entry_point),
            Language::CSharp => csharp::driver(code, entry_point),
            Language::Php => php::driver(code, entry_point),
        }
    }
}

/// Join an argv into a shell command line
pub fn shell_join(argv: &[String]) -> String {
    argv.iter()
        .map(|arg| {
            if arg
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || "-_./=:+".contains(c))
            {
                arg.clone()
            } else {
                format!("'{}'", arg.replace('\'', "'\\''"))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
