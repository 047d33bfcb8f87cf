//! Command execution.
//!
//! `Session` is the seam between the dispatcher and the outside world: run
//! one shell command to completion with its output redirected to a log
//! file, and hand back the exit status. The real implementation spawns the
//! command through `sh -c`; tests substitute mocks.

use std::fs::File;
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;

use crate::error::LaunchError;

#[async_trait]
pub trait Session {
    /// Runs `command` to completion, combined stdout/stderr going to `log`.
    async fn run(&self, command: &str, log: File) -> Result<ExitStatus, LaunchError>;
}

/// Runs commands through the local shell. The ssh/scp prefixes baked into
/// the command text are what make them remote.
pub struct ShellSession;

#[async_trait]
impl Session for ShellSession {
    async fn run(&self, command: &str, log: File) -> Result<ExitStatus, LaunchError> {
        let stderr_log = log.try_clone()?;
        let status = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(stderr_log))
            .status()
            .await?;
        Ok(status)
    }
}
