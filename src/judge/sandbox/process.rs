//! Subprocess-per-run sandbox (`unsafe-local`)
//!
//! Each execution gets its own temporary workspace and process group. The
//! program runs with a scrubbed environment, a wall-clock timeout, a CPU-time
//! rlimit and a memory rlimit. The whole process group is killed when the run
//! ends or its future is dropped.
//!
//! This is not a jail: the program runs as the server's user and can read the
//! host filesystem and `/proc`. It is only selectable with
//! `SANDBOX_BACKEND=unsafe-local`.

use std::io;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use nix::sys::resource::{setrlimit, Resource};
use nix::sys::signal::{killpg, Signal};
use nix::unistd::{setpgid, Pid};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

use super::{
    truncate_output, ExecutionRequest, HandlerTable, RawExecution, Sandbox, SandboxError,
    Termination,
};
use crate::judge::languages::{LanguageHandler, MemoryCeiling};

const MIB: u64 = 1024 * 1024;

/// Memory rlimit for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemoryRlimit {
    AddressSpace(u64),
    Data(u64),
}

impl MemoryRlimit {
    fn for_handler(handler: &LanguageHandler, memory_limit_mb: u64) -> Self {
        match handler.memory_ceiling() {
            MemoryCeiling::AddressSpace => Self::AddressSpace(memory_limit_mb * MIB),
            MemoryCeiling::RuntimeHeap { headroom_mb } => {
                Self::Data((memory_limit_mb + headroom_mb) * MIB)
            }
        }
    }

    fn apply(self) -> nix::Result<()> {
        match self {
            Self::AddressSpace(bytes) => setrlimit(Resource::RLIMIT_AS, bytes, bytes),
            Self::Data(bytes) => setrlimit(Resource::RLIMIT_DATA, bytes, bytes),
        }
    }
}

/// Resource limits applied in the child before exec
#[derive(Debug, Clone, Copy)]
struct Rlimits {
    memory: MemoryRlimit,
    cpu_seconds: u64,
}

/// SIGKILLs the child's process group when dropped
struct GroupGuard(Option<u32>);

impl Drop for GroupGuard {
    fn drop(&mut self) {
        kill_group(self.0);
    }
}

/// Captured result of one child process
#[derive(Debug)]
struct ProcessOutput {
    stdout: String,
    stderr: String,
    status: Option<ExitStatus>,
    timed_out: bool,
    elapsed_ms: u64,
}

impl ProcessOutput {
    fn success(&self) -> bool {
        !self.timed_out && self.status.map(|s| s.success()).unwrap_or(false)
    }
}

/// Sandbox running each program as a local subprocess
pub struct ProcessSandbox {
    workspace_root: Option<PathBuf>,
    handlers: HandlerTable,
    path_env: String,
}

impl ProcessSandbox {
    /// Create a process sandbox; workspaces go under `workspace_root` or the
    /// system temp directory
    pub fn new(workspace_root: Option<PathBuf>) -> Self {
        Self {
            workspace_root,
            handlers: HandlerTable::default(),
            path_env: std::env::var("PATH")
                .unwrap_or_else(|_| "/usr/local/bin:/usr/bin:/bin".to_string()),
        }
    }

    /// Replace the language handler table
    pub fn with_handlers(mut self, handlers: HandlerTable) -> Self {
        self.handlers = handlers;
        self
    }

    fn create_workspace(&self) -> io::Result<tempfile::TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("codejudge-");
        match &self.workspace_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
    }

    async fn compile_and_run(
        &self,
        handler: &LanguageHandler,
        dir: &Path,
        request: &ExecutionRequest,
    ) -> Result<RawExecution, SandboxError> {
        let limits = request.limits;

        if let Some(compile) = handler.compile_command() {
            let output = self
                .run_process(
                    compile,
                    dir,
                    "",
                    Duration::from_millis(limits.compile_time_limit_ms),
                    None,
                    limits.output_limit_bytes,
                )
                .await?;

            if !output.success() {
                let diagnostic = if output.timed_out {
                    "compilation timed out".to_string()
                } else if output.stderr.trim().is_empty() {
                    output.stdout
                } else {
                    output.stderr
                };

                return Ok(RawExecution {
                    stdout: String::new(),
                    stderr: diagnostic,
                    termination: Termination::CompileFailed,
                    elapsed_ms: output.elapsed_ms,
                });
            }
        }

        let rlimits = Rlimits {
            memory: MemoryRlimit::for_handler(handler, limits.memory_limit_mb),
            cpu_seconds: limits.time_limit_ms.div_ceil(1000) + 1,
        };

        let output = self
            .run_process(
                &handler.run_command(limits.memory_limit_mb),
                dir,
                &request.program.stdin,
                Duration::from_millis(limits.time_limit_ms),
                Some(rlimits),
                limits.output_limit_bytes,
            )
            .await?;

        let address_space_limited = matches!(rlimits.memory, MemoryRlimit::AddressSpace(_));
        let termination = classify(&output, handler, address_space_limited);

        Ok(RawExecution {
            stdout: output.stdout,
            stderr: output.stderr,
            termination,
            elapsed_ms: output.elapsed_ms,
        })
    }

    async fn run_process(
        &self,
        argv: &[String],
        dir: &Path,
        stdin: &str,
        time_limit: Duration,
        rlimits: Option<Rlimits>,
        output_limit: usize,
    ) -> io::Result<ProcessOutput> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command"))?;

        let mut command = Command::new(program);
        command
            .args(args)
            .current_dir(dir)
            .env_clear()
            .env("PATH", &self.path_env)
            .env("LANG", "C.UTF-8")
            .env("HOME", dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // SAFETY: only async-signal-safe syscalls run between fork and exec.
        unsafe {
            command.pre_exec(move || {
                setpgid(Pid::from_raw(0), Pid::from_raw(0)).map_err(io::Error::from)?;
                if let Some(limits) = rlimits {
                    limits.memory.apply().map_err(io::Error::from)?;
                    setrlimit(Resource::RLIMIT_CPU, limits.cpu_seconds, limits.cpu_seconds + 1)
                        .map_err(io::Error::from)?;
                }
                Ok(())
            });
        }

        let start = Instant::now();
        let mut child = command.spawn()?;
        let pid = child.id();
        let group = GroupGuard(pid);

        if let Some(mut pipe) = child.stdin.take() {
            let input = stdin.to_owned();
            tokio::spawn(async move {
                // The program may exit without reading its input
                let _ = pipe.write_all(input.as_bytes()).await;
                let _ = pipe.shutdown().await;
            });
        }

        let stdout_task = child
            .stdout
            .take()
            .map(|pipe| tokio::spawn(read_capped(pipe, output_limit)));
        let stderr_task = child
            .stderr
            .take()
            .map(|pipe| tokio::spawn(read_capped(pipe, output_limit)));

        let (status, timed_out) = match tokio::time::timeout(time_limit, child.wait()).await {
            Ok(status) => (Some(status?), false),
            Err(_) => {
                kill_group(pid);
                if let Err(e) = child.kill().await {
                    tracing::debug!(error = %e, "Child already gone after timeout");
                }
                (None, true)
            }
        };
        let elapsed_ms = start.elapsed().as_millis() as u64;

        // Reap anything the program left behind holding our pipes
        drop(group);

        let stdout = join_output(stdout_task).await;
        let stderr = join_output(stderr_task).await;

        Ok(ProcessOutput {
            stdout,
            stderr,
            status,
            timed_out,
            elapsed_ms,
        })
    }
}

#[async_trait]
impl Sandbox for ProcessSandbox {
    fn name(&self) -> &'static str {
        "unsafe-local"
    }

    async fn execute(&self, request: ExecutionRequest) -> Result<RawExecution, SandboxError> {
        let handler = self.handlers.get(request.language());
        let workspace = self.create_workspace()?;
        let dir = workspace.path().to_path_buf();

        tokio::fs::write(dir.join(&request.program.source_file), &request.program.source).await?;

        let result = self.compile_and_run(&handler, &dir, &request).await;

        match tokio::task::spawn_blocking(move || workspace.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(path = %dir.display(), error = %e, "Failed to remove workspace"),
            Err(e) => tracing::warn!(error = %e, "Workspace cleanup task failed"),
        }

        result
    }
}

/// Map a finished child to a termination reason
fn classify(output: &ProcessOutput, handler: &LanguageHandler, memory_limited: bool) -> Termination {
    let Some(status) = output.status.filter(|_| !output.timed_out) else {
        return Termination::TimedOut;
    };

    if let Some(code) = status.code() {
        if code != 0 && handler.reports_out_of_memory(&output.stderr) {
            return Termination::MemoryLimitExceeded;
        }
        return Termination::Exited(code);
    }

    match status.signal() {
        Some(sig) if sig == Signal::SIGXCPU as i32 => Termination::TimedOut,
        Some(sig) => {
            let limit_signal = sig == Signal::SIGKILL as i32
                || sig == Signal::SIGSEGV as i32
                || sig == Signal::SIGABRT as i32;
            if handler.reports_out_of_memory(&output.stderr) || (memory_limited && limit_signal) {
                Termination::MemoryLimitExceeded
            } else {
                Termination::Signaled(sig)
            }
        }
        None => Termination::Exited(-1),
    }
}

fn kill_group(pid: Option<u32>) {
    if let Some(pid) = pid {
        // ESRCH once the group is empty
        let _ = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL);
    }
}

async fn join_output(task: Option<tokio::task::JoinHandle<String>>) -> String {
    match task {
        Some(handle) => handle.await.unwrap_or_default(),
        None => String::new(),
    }
}

/// Drain a pipe, keeping at most `limit` bytes
async fn read_capped<R: AsyncRead + Unpin>(mut reader: R, limit: usize) -> String {
    let mut kept = Vec::new();
    let mut buf = [0u8; 8192];

    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let room = limit.saturating_sub(kept.len());
                kept.extend_from_slice(&buf[..n.min(room)]);
            }
        }
    }

    truncate_output(String::from_utf8_lossy(&kept).into_owned(), limit)
}
