//! Container-per-run sandbox on the Docker daemon

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine;
use bollard::{
    container::LogOutput,
    exec::{CreateExecOptions, StartExecResults},
    models::{ContainerCreateBody, HostConfig},
    query_parameters::{
        CreateContainerOptionsBuilder, InspectContainerOptions, RemoveContainerOptionsBuilder,
        StartContainerOptions,
    },
    Docker,
};
use futures::StreamExt;
use uuid::Uuid;

use super::{
    truncate_output, ExecutionLimits, ExecutionRequest, HandlerTable, RawExecution, Sandbox,
    SandboxError, Termination,
};
use crate::{constants, judge::languages::{shell_join, LanguageHandler}};

const WORKDIR: &str = "/workspace";

/// Raw bytes per file-write exec; a multiple of 3 so chunks encode independently
const WRITE_CHUNK_BYTES: usize = 48 * 1024;

/// Allowance for exec round-trips on top of the time limit
const EXEC_GRACE_MS: u64 = 500;

/// Exit codes from `timeout` and SIGKILL
const EXIT_TIMEOUT: i32 = 124;
const EXIT_KILLED: i32 = 137;

#[derive(Debug, Default)]
struct ExecOutput {
    stdout: String,
    stderr: String,
    exit_code: i32,
}

/// A started container, force-removed when dropped without `remove`
struct ContainerGuard {
    docker: Docker,
    id: Option<String>,
}

impl ContainerGuard {
    fn id(&self) -> &str {
        self.id.as_deref().unwrap_or_default()
    }

    async fn remove(mut self) {
        if let Some(id) = self.id.take() {
            remove_container(&self.docker, &id).await;
        }
    }
}

impl Drop for ContainerGuard {
    fn drop(&mut self) {
        let Some(id) = self.id.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let docker = self.docker.clone();
                runtime.spawn(async move { remove_container(&docker, &id).await });
            }
            Err(_) => tracing::warn!(container_id = %id, "No runtime left to remove abandoned container"),
        }
    }
}

async fn remove_container(docker: &Docker, container_id: &str) {
    let options = RemoveContainerOptionsBuilder::default().force(true).build();
    if let Err(e) = docker.remove_container(container_id, Some(options)).await {
        tracing::warn!(container_id = %container_id, error = %e, "Failed to remove container");
    }
}

/// Sandbox creating one throwaway container per execution
pub struct DockerSandbox {
    docker: Docker,
    handlers: HandlerTable,
}

impl DockerSandbox {
    pub fn new(docker: Docker) -> Self {
        Self {
            docker,
            handlers: HandlerTable::default(),
        }
    }

    pub fn with_handlers(mut self, handlers: HandlerTable) -> Self {
        self.handlers = handlers;
        self
    }

    async fn create_container(
        &self,
        handler: &LanguageHandler,
        memory_limit_mb: u64,
    ) -> Result<ContainerGuard, SandboxError> {
        let name = format!("codejudge-{}", Uuid::new_v4());
        let options = CreateContainerOptionsBuilder::default().name(&name).build();

        let memory_bytes = (memory_limit_mb * 1024 * 1024) as i64;
        let host_config = HostConfig {
            memory: Some(memory_bytes),
            memory_swap: Some(memory_bytes),
            cpu_period: Some(100_000),
            cpu_quota: Some(100_000),
            network_mode: Some("none".to_string()),
            pids_limit: Some(64),
            ..Default::default()
        };

        let body = ContainerCreateBody {
            image: Some(handler.image().to_string()),
            cmd: Some(vec!["tail".to_string(), "-f".to_string(), "/dev/null".to_string()]),
            tty: Some(false),
            host_config: Some(host_config),
            working_dir: Some(WORKDIR.to_string()),
            env: Some(vec!["LANG=C.UTF-8".to_string()]),
            labels: Some(HashMap::from([(
                constants::CONTAINER_LABEL.to_string(),
                handler.language().to_string(),
            )])),
            ..Default::default()
        };

        let container = self.docker.create_container(Some(options), body).await?;
        let guard = ContainerGuard {
            docker: self.docker.clone(),
            id: Some(container.id),
        };

        if let Err(e) = self
            .docker
            .start_container(guard.id(), None::<StartContainerOptions>)
            .await
        {
            guard.remove().await;
            return Err(e.into());
        }

        Ok(guard)
    }

    /// Write a file through base64 `echo` execs, chunked to stay under argv limits
    async fn write_file(
        &self,
        container_id: &str,
        path: &str,
        content: &str,
    ) -> Result<(), SandboxError> {
        let engine = base64::engine::general_purpose::STANDARD;
        let bytes = content.as_bytes();

        let chunks: Vec<&[u8]> = if bytes.is_empty() {
            vec![&bytes[..0]]
        } else {
            bytes.chunks(WRITE_CHUNK_BYTES).collect()
        };

        for (i, chunk) in chunks.into_iter().enumerate() {
            let redirect = if i == 0 { ">" } else { ">>" };
            let cmd = format!("echo '{}' | base64 -d {} {}", engine.encode(chunk), redirect, path);
            let out = self.exec(container_id, &cmd, usize::MAX).await?;
            if out.exit_code != 0 {
                return Err(SandboxError::Docker(format!(
                    "failed to write {}: {}",
                    path,
                    out.stderr.trim()
                )));
            }
        }

        Ok(())
    }

    /// Run a shell command in the container, keeping at most `output_limit`
    /// bytes of each stream
    async fn exec(
        &self,
        container_id: &str,
        cmd: &str,
        output_limit: usize,
    ) -> Result<ExecOutput, SandboxError> {
        let exec = self
            .docker
            .create_exec(
                container_id,
                CreateExecOptions {
                    cmd: Some(vec!["/bin/sh", "-c", cmd]),
                    attach_stdout: Some(true),
                    attach_stderr: Some(true),
                    working_dir: Some(WORKDIR),
                    ..Default::default()
                },
            )
            .await?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        if let StartExecResults::Attached { mut output, .. } =
            self.docker.start_exec(&exec.id, None).await?
        {
            while let Some(msg) = output.next().await {
                match msg? {
                    LogOutput::StdOut { message } => append_capped(&mut stdout, &message, output_limit),
                    LogOutput::StdErr { message } => append_capped(&mut stderr, &message, output_limit),
                    _ => {}
                }
            }
        }

        let inspect = self.docker.inspect_exec(&exec.id).await?;

        Ok(ExecOutput {
            stdout: truncate_output(String::from_utf8_lossy(&stdout).into_owned(), output_limit),
            stderr: truncate_output(String::from_utf8_lossy(&stderr).into_owned(), output_limit),
            exit_code: inspect.exit_code.unwrap_or(-1) as i32,
        })
    }

    async fn oom_killed(&self, container_id: &str) -> bool {
        let inspect = self
            .docker
            .inspect_container(container_id, None::<InspectContainerOptions>)
            .await;

        match inspect {
            Ok(info) => info.state.and_then(|s| s.oom_killed).unwrap_or(false),
            Err(e) => {
                tracing::debug!(container_id = %container_id, error = %e, "Container inspect failed");
                false
            }
        }
    }

    async fn compile_and_run(
        &self,
        container_id: &str,
        handler: &LanguageHandler,
        request: &ExecutionRequest,
    ) -> Result<RawExecution, SandboxError> {
        let limits = request.limits;
        let program = &request.program;

        self.write_file(container_id, &format!("{}/{}", WORKDIR, program.source_file), &program.source)
            .await?;
        self.write_file(container_id, &format!("{}/input.txt", WORKDIR), &program.stdin)
            .await?;

        let start = Instant::now();

        if let Some(compile) = handler.compile_command() {
            let cmd = format!(
                "timeout -s KILL {} {}",
                limits.compile_time_limit_ms.div_ceil(1000),
                shell_join(compile)
            );
            let out = self.exec(container_id, &cmd, limits.output_limit_bytes).await?;

            if out.exit_code != 0 {
                let diagnostic = if out.exit_code == EXIT_TIMEOUT || out.exit_code == EXIT_KILLED {
                    "compilation timed out".to_string()
                } else if out.stderr.trim().is_empty() {
                    out.stdout
                } else {
                    out.stderr
                };

                return Ok(RawExecution {
                    stdout: String::new(),
                    stderr: diagnostic,
                    termination: Termination::CompileFailed,
                    elapsed_ms: start.elapsed().as_millis() as u64,
                });
            }
        }

        let cmd = run_script(handler, &limits);

        let backstop = Duration::from_millis(limits.time_limit_ms + 5_000);
        let start = Instant::now();
        let out = match tokio::time::timeout(
            backstop,
            self.exec(container_id, &cmd, limits.output_limit_bytes),
        )
        .await
        {
            Ok(out) => out?,
            Err(_) => {
                return Ok(RawExecution {
                    stdout: String::new(),
                    stderr: String::new(),
                    termination: Termination::TimedOut,
                    elapsed_ms: start.elapsed().as_millis() as u64,
                });
            }
        };
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let termination = if elapsed_ms > limits.time_limit_ms + EXEC_GRACE_MS
            || ((out.exit_code == EXIT_TIMEOUT || out.exit_code == EXIT_KILLED)
                && elapsed_ms >= limits.time_limit_ms)
        {
            Termination::TimedOut
        } else if out.exit_code == EXIT_KILLED
            || (out.exit_code != 0 && handler.reports_out_of_memory(&out.stderr))
            || self.oom_killed(container_id).await
        {
            Termination::MemoryLimitExceeded
        } else {
            Termination::Exited(out.exit_code)
        };

        Ok(RawExecution {
            stdout: out.stdout,
            stderr: out.stderr,
            termination,
            elapsed_ms,
        })
    }
}

#[async_trait]
impl Sandbox for DockerSandbox {
    fn name(&self) -> &'static str {
        "docker"
    }

    async fn execute(&self, request: ExecutionRequest) -> Result<RawExecution, SandboxError> {
        let handler = self.handlers.get(request.language());
        let container = self
            .create_container(&handler, request.limits.memory_limit_mb)
            .await?;

        tracing::debug!(
            container_id = %container.id(),
            language = %handler.language(),
            "Container started"
        );

        let result = self.compile_and_run(container.id(), &handler, &request).await;

        container.remove().await;

        result
    }
}

/// Run step: stdin comes from input.txt, which is unlinked before user code
/// starts so the program cannot reopen it
fn run_script(handler: &LanguageHandler, limits: &ExecutionLimits) -> String {
    let run = format!(
        "exec 0< input.txt; rm -f input.txt; exec {}",
        shell_join(&handler.run_command(limits.memory_limit_mb))
    );
    format!(
        "timeout -s KILL {} sh -c {}",
        limits.time_limit_ms.div_ceil(1000),
        shell_join(&[run])
    )
}

fn append_capped(buf: &mut Vec<u8>, message: &[u8], limit: usize) {
    let room = limit.saturating_sub(buf.len());
    buf.extend_from_slice(&message[..message.len().min(room)]);
}
