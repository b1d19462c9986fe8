//! Converter invocation: run the external renderer under a wall-clock budget.
//!
//! The converter is started as `<program> <args…> <input> <output>` with its
//! stdout and stderr drained by background tasks. Only the process exit is
//! wrapped in [`tokio::time::timeout`]; its result is matched exactly once, so
//! the natural-exit outcome and the timeout outcome can never both be
//! reported for the same invocation. On timeout the child is killed and the
//! call fails with [`ConvertError::Timeout`] whatever the process does
//! afterwards.
//!
//! Once the converter has exited, its pipes get [`PIPE_DRAIN_GRACE`] to reach
//! end-of-file. A background process the converter left behind may keep them
//! open; its output is then dropped and the exit status alone decides.
//!
//! Children are spawned with `kill_on_drop`, so a request that is cancelled
//! mid-conversion (client hung up) also takes its converter down.

use crate::config::ConverterCommand;
use crate::error::ConvertError;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How long captured output may keep flowing after the converter exits.
pub const PIPE_DRAIN_GRACE: Duration = Duration::from_secs(1);

/// Outcome of a converter run that exited with status zero.
#[derive(Debug, Clone)]
pub struct InvocationReport {
    pub duration: Duration,
    /// Whatever the converter printed, stderr preferred.
    pub diagnostics: String,
}

/// Runs a [`ConverterCommand`] with a timeout.
#[derive(Debug, Clone)]
pub struct ConverterInvoker {
    command: ConverterCommand,
    timeout: Duration,
}

impl ConverterInvoker {
    pub fn new(command: ConverterCommand, timeout: Duration) -> Self {
        Self { command, timeout }
    }

    /// Convert `input` into `output`.
    ///
    /// # Errors
    /// * [`ConvertError::Spawn`] — the program could not be started
    /// * [`ConvertError::Wait`] — the exit status could not be collected
    /// * [`ConvertError::Failed`] — non-zero exit, carrying the diagnostics
    /// * [`ConvertError::Timeout`] — the budget elapsed; the child was killed
    pub async fn run(&self, input: &Path, output: &Path) -> Result<InvocationReport, ConvertError> {
        let started = Instant::now();

        let mut child = Command::new(&self.command.program)
            .args(&self.command.args)
            .arg(input)
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ConvertError::Spawn {
                program: self.command.program.clone(),
                source,
            })?;

        debug!(
            pid = child.id(),
            program = %self.command.program,
            input = %input.display(),
            output = %output.display(),
            "Converter started"
        );

        let stdout = tokio::spawn(drain(child.stdout.take()));
        let stderr = tokio::spawn(drain(child.stderr.take()));

        let outcome = tokio::time::timeout(self.timeout, child.wait()).await;
        let status = match outcome {
            Ok(finished) => finished,
            Err(_elapsed) => {
                warn!(
                    pid = child.id(),
                    limit_ms = self.timeout.as_millis() as u64,
                    "Converter timed out, killing process"
                );
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill timed-out converter: {}", e);
                }
                stdout.abort();
                stderr.abort();
                return Err(ConvertError::Timeout {
                    limit: self.timeout,
                });
            }
        };

        let duration = started.elapsed();
        let (out, err) = tokio::join!(collect(stdout), collect(stderr));
        let status = status.map_err(|source| ConvertError::Wait {
            program: self.command.program.clone(),
            source,
        })?;
        let diagnostics = pick_diagnostics(&err, &out);

        if status.success() {
            info!(
                duration_ms = duration.as_millis() as u64,
                "Converter finished: {}",
                output.display()
            );
            Ok(InvocationReport {
                duration,
                diagnostics,
            })
        } else {
            Err(ConvertError::Failed {
                code: status.code(),
                diagnostics: if diagnostics.is_empty() {
                    generic_failure(status)
                } else {
                    diagnostics
                },
            })
        }
    }
}

/// Read a captured pipe to the end; a missing pipe or read error yields
/// whatever was read so far.
async fn drain<R: AsyncRead + Unpin + Send + 'static>(pipe: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        if let Err(e) = pipe.read_to_end(&mut buf).await {
            debug!("Converter pipe read failed: {}", e);
        }
    }
    buf
}

/// Wait up to [`PIPE_DRAIN_GRACE`] for a drain task; a pipe still held open
/// by a leftover process yields nothing.
async fn collect(task: JoinHandle<Vec<u8>>) -> Vec<u8> {
    let abort = task.abort_handle();
    match tokio::time::timeout(PIPE_DRAIN_GRACE, task).await {
        Ok(Ok(buf)) => buf,
        Ok(Err(e)) => {
            debug!("Converter pipe task failed: {}", e);
            Vec::new()
        }
        Err(_elapsed) => {
            abort.abort();
            debug!("Converter pipe still open after exit, discarding its output");
            Vec::new()
        }
    }
}

fn pick_diagnostics(stderr: &[u8], stdout: &[u8]) -> String {
    let err = String::from_utf8_lossy(stderr);
    let err = err.trim();
    if !err.is_empty() {
        return err.to_string();
    }
    String::from_utf8_lossy(stdout).trim().to_string()
}

fn generic_failure(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("converter exited with status {code}"),
        None => "converter was terminated by a signal".to_string(),
    }
}
