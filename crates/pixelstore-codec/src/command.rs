//! Builder for executing external codec tools with timeout support.
//!
//! Codec tools are driven either as filters (image bytes on stdin, compressed
//! bytes on stdout) or against files in a [`crate::Workspace`]. Both modes go
//! through [`ToolCommand`].

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::{Error, Result};

/// Default command timeout: 5 minutes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Spawn attempts made while the executable is still open for writing.
const SPAWN_ATTEMPTS: u32 = 5;

/// Output captured from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Process exit status.
    pub status: ExitStatus,
    /// Raw standard output (image bytes for filter-style tools).
    pub stdout: Vec<u8>,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

/// A builder for constructing and executing external tool invocations.
///
/// # Example
///
/// ```no_run
/// use pixelstore_codec::ToolCommand;
/// use std::path::PathBuf;
///
/// # async fn example(jpeg: Vec<u8>) -> pixelstore_codec::Result<()> {
/// let output = ToolCommand::new(PathBuf::from("jpegtran"))
///     .args(["-copy", "none", "-optimize"])
///     .stdin(jpeg)
///     .execute()
///     .await?;
/// println!("{} bytes", output.stdout.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
    stdin_data: Option<Vec<u8>>,
    accepted_codes: Vec<i32>,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            stdin_data: None,
            accepted_codes: Vec::new(),
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append a path argument.
    pub fn path_arg(&mut self, p: &Path) -> &mut Self {
        self.args.push(p.to_string_lossy().into_owned());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Set the maximum execution time.
    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = d;
        self
    }

    /// Provide data to be written to the process's stdin.
    pub fn stdin(&mut self, data: Vec<u8>) -> &mut Self {
        self.stdin_data = Some(data);
        self
    }

    /// Treat a non-zero exit code as a non-error outcome.
    ///
    /// The caller inspects [`ToolOutput::status`] to tell it apart from success.
    pub fn accept_exit_code(&mut self, code: i32) -> &mut Self {
        self.accepted_codes.push(code);
        self
    }

    /// The arguments collected so far.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Execute the command, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// - [`Error::ToolNotFound`] if the program cannot be spawned because it
    ///   does not exist.
    /// - [`Error::ToolFailed`] if spawning fails otherwise, if the process
    ///   exits with a status that was not accepted (message includes stderr),
    ///   or if it times out.
    pub async fn execute(&self) -> Result<ToolOutput> {
        let program_name = self.program_name();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.stdin(if self.stdin_data.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        tracing::trace!(tool = %program_name, args = ?self.args, "spawning codec tool");

        let mut child = spawn(&mut cmd).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::tool_not_found(&program_name)
            } else {
                Error::tool_failed(&program_name, format!("failed to spawn: {e}"))
            }
        })?;

        // Feed stdin from a separate task so a tool that starts writing
        // stdout before draining stdin cannot deadlock us.
        let writer = match (child.stdin.take(), self.stdin_data.clone()) {
            (Some(mut stdin), Some(data)) => Some(tokio::spawn(async move {
                let result = stdin.write_all(&data).await;
                drop(stdin);
                result
            })),
            _ => None,
        };

        let result = tokio::time::timeout(self.timeout, child.wait_with_output()).await;

        if let Some(writer) = writer {
            match writer.await {
                Ok(Ok(())) => {}
                // The tool may legitimately close stdin early (e.g. it rejected
                // the input); its exit status tells the real story.
                Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                Ok(Err(e)) => {
                    return Err(Error::tool_failed(
                        &program_name,
                        format!("failed to write stdin: {e}"),
                    ))
                }
                Err(e) => {
                    return Err(Error::tool_failed(
                        &program_name,
                        format!("stdin writer panicked: {e}"),
                    ))
                }
            }
        }

        match result {
            Ok(Ok(output)) => {
                let tool_output = ToolOutput {
                    status: output.status,
                    stdout: output.stdout,
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                };

                let accepted = output
                    .status
                    .code()
                    .is_some_and(|code| self.accepted_codes.contains(&code));

                if !output.status.success() && !accepted {
                    return Err(Error::tool_failed(
                        program_name,
                        format!(
                            "exited with status {}: {}",
                            output.status,
                            tool_output.stderr.trim()
                        ),
                    ));
                }

                Ok(tool_output)
            }
            Ok(Err(e)) => Err(Error::tool_failed(
                program_name,
                format!("I/O error waiting for process: {e}"),
            )),
            Err(_elapsed) => Err(Error::tool_failed(
                program_name,
                format!("timed out after {:?}", self.timeout),
            )),
        }
    }
}

/// Spawn `cmd`, retrying briefly while the kernel reports the executable as
/// busy. A freshly written script can still be held open by a process forked
/// concurrently elsewhere in this program.
async fn spawn(cmd: &mut Command) -> std::io::Result<tokio::process::Child> {
    let mut attempt = 1;
    loop {
        match cmd.spawn() {
            Err(e) if is_text_busy(&e) && attempt < SPAWN_ATTEMPTS => {
                tracing::debug!(attempt, "executable busy, retrying spawn");
                tokio::time::sleep(Duration::from_millis(10 * u64::from(attempt))).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}

#[cfg(unix)]
fn is_text_busy(e: &std::io::Error) -> bool {
    e.raw_os_error() == Some(libc::ETXTBSY)
}

#[cfg(not(unix))]
fn is_text_busy(_e: &std::io::Error) -> bool {
    false
}
