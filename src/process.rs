//! # Process Invocation Module
//!
//! Runs one external tool to completion and captures everything it prints.
//!
//! ## Responsibilities:
//! - Spawn the executable with stdin closed and stdout/stderr piped
//! - Drain both pipes concurrently while waiting for exit, so a child that
//!   fills one pipe buffer never blocks on a parent stuck reading the other
//! - Return a tagged `ProcessResult` instead of failing on non-zero exit
//!
//! A non-zero exit is data, not an error: each wrapper decides whether it is
//! fatal. Only a failed spawn is an `Err`, and "executable not found" is
//! reported as `MissingDependency`.
//!
//! There is no timeout. A tool that hangs hangs the caller.

use crate::error::{Result, ToolkitError};
use crate::utils::display_command;
use serde::Serialize;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::debug;

/// Captured output of a finished process
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, or -1 when the process was terminated by a signal
    pub exit_code: i32,
}

/// Outcome of a process run, tagged by exit status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "output", rename_all = "lowercase")]
pub enum ProcessResult {
    Success(ProcessOutput),
    Failure(ProcessOutput),
}

impl ProcessResult {
    fn from_output(output: ProcessOutput) -> Self {
        if output.exit_code == 0 {
            Self::Success(output)
        } else {
            Self::Failure(output)
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn output(&self) -> &ProcessOutput {
        match self {
            Self::Success(output) | Self::Failure(output) => output,
        }
    }

    pub fn into_output(self) -> ProcessOutput {
        match self {
            Self::Success(output) | Self::Failure(output) => output,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.output().exit_code
    }

    /// Treat a non-zero exit as fatal, keeping the raw stderr in the error
    pub fn into_result(self, tool: &str) -> Result<ProcessOutput> {
        match self {
            Self::Success(output) => Ok(output),
            Self::Failure(output) => Err(ToolkitError::ToolFailed {
                tool: tool.to_string(),
                exit_code: output.exit_code,
                stderr: output.stderr.trim_end().to_string(),
            }),
        }
    }
}

/// Run `program` with `args` and wait for it to exit.
pub async fn run_process(program: &Path, args: &[OsString]) -> Result<ProcessResult> {
    debug!("Running: {}", display_command(program, args));

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ToolkitError::MissingDependency(program.display().to_string())
            } else {
                ToolkitError::Io(e)
            }
        })?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| std::io::Error::other("child stdout was not captured"))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| std::io::Error::other("child stderr was not captured"))?;

    let mut stdout_buf = Vec::new();
    let mut stderr_buf = Vec::new();

    // All three are polled together; reading one pipe to EOF first can deadlock.
    let (_, _, status) = tokio::try_join!(
        stdout.read_to_end(&mut stdout_buf),
        stderr.read_to_end(&mut stderr_buf),
        child.wait(),
    )?;

    let output = ProcessOutput {
        stdout: String::from_utf8_lossy(&stdout_buf).into_owned(),
        stderr: String::from_utf8_lossy(&stderr_buf).into_owned(),
        exit_code: status.code().unwrap_or(-1),
    };

    debug!(
        "{} exited with code {} ({} bytes stdout, {} bytes stderr)",
        program.display(),
        output.exit_code,
        stdout_buf.len(),
        stderr_buf.len()
    );

    Ok(ProcessResult::from_output(output))
}
