use std::ffi::OsString;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::Duration;

use thiserror::Error;
use wait_timeout::ChildExt;


#[derive(Debug, Error)]
pub enum ExecError {
    #[error("required tool not found: {tool}")]
    ToolMissing { tool: String },
    #[error("{tool} failed: {diagnostics}")]
    ToolExecutionFailed { tool: String, diagnostics: String },
    #[error("{tool} timed out after {seconds} seconds")]
    Timeout { tool: String, seconds: u64 },
    #[error("failed launching {tool}: {source}")]
    Spawn {
        tool: String,
        source: std::io::Error,
    },
}

impl ExecError {
    pub fn tool(&self) -> &str {
        match self {
            Self::ToolMissing { tool }
            | Self::ToolExecutionFailed { tool, .. }
            | Self::Timeout { tool, .. }
            | Self::Spawn { tool, .. } => tool,
        }
    }
}

#[derive(Debug)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: ExitStatus,
}

impl CapturedOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    // Enumeration payloads sometimes arrive on stderr when the shell is
    // misconfigured; prefer stdout but fall back rather than dropping data.
    pub fn combined_text(&self) -> &str {
        if self.stdout.trim().is_empty() {
            &self.stderr
        } else {
            &self.stdout
        }
    }

    pub fn diagnostics(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }
}

pub fn capture(
    command: &mut Command,
    timeout: Option<Duration>,
) -> Result<CapturedOutput, ExecError> {
    let tool = program_label(command);
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = command.spawn().map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ExecError::ToolMissing { tool: tool.clone() }
        } else {
            ExecError::Spawn {
                tool: tool.clone(),
                source,
            }
        }
    })?;

    let stdout = drain_handle(child.stdout.take());
    let stderr = drain_handle(child.stderr.take());

    let status = wait_with_deadline(&mut child, timeout, &tool)?;
    Ok(CapturedOutput {
        stdout: join_drained(stdout),
        stderr: join_drained(stderr),
        status,
    })
}

pub fn run_tool(tool: &Path, args: &[OsString], cwd: Option<&Path>) -> Result<String, ExecError> {
    if !tool.exists() {
        return Err(ExecError::ToolMissing {
            tool: tool_label(tool),
        });
    }
    let mut command = Command::new(tool);
    command.args(args);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }
    let output = capture(&mut command, None)?;
    if !output.success() {
        return Err(ExecError::ToolExecutionFailed {
            tool: tool_label(tool),
            diagnostics: output.diagnostics().to_string(),
        });
    }
    Ok(output.stdout)
}

pub fn tool_label(tool: &Path) -> String {
    tool.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| tool.display().to_string())
}

fn program_label(command: &Command) -> String {
    Path::new(command.get_program())
        .file_name()
        .unwrap_or(command.get_program())
        .to_string_lossy()
        .into_owned()
}

fn wait_with_deadline(
    child: &mut Child,
    timeout: Option<Duration>,
    tool: &str,
) -> Result<ExitStatus, ExecError> {
    let wait_error = |source| ExecError::Spawn {
        tool: tool.to_string(),
        source,
    };
    match timeout {
        None => child.wait().map_err(wait_error),
        Some(limit) => match child.wait_timeout(limit).map_err(wait_error)? {
            Some(status) => Ok(status),
            None => {
                let _ = child.kill();
                let _ = child.wait();
                Err(ExecError::Timeout {
                    tool: tool.to_string(),
                    seconds: limit.as_secs(),
                })
            }
        },
    }
}

fn drain_handle<R: Read + Send + 'static>(
    handle: Option<R>,
) -> Option<std::thread::JoinHandle<Vec<u8>>> {
    handle.map(|mut reader| {
        std::thread::spawn(move || {
            let mut buffer = Vec::new();
            let _ = reader.read_to_end(&mut buffer);
            buffer
        })
    })
}

fn join_drained(handle: Option<std::thread::JoinHandle<Vec<u8>>>) -> String {
    let bytes = handle
        .and_then(|thread| thread.join().ok())
        .unwrap_or_default();
    String::from_utf8_lossy(&bytes).into_owned()
}
