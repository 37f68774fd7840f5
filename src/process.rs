//! Bounded subprocess execution shared by every external tool call.
//!
//! All tools are launched through `tokio::process`, so a slow engine never
//! parks a runtime worker. Children are spawned with `kill_on_drop`, which is
//! what terminates them when the timeout future wins.

use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::ProcessError;

/// Captured result of a finished subprocess
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub success: bool,
    pub status: String,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

/// A command line split into program and leading arguments, as configured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
}

impl CommandLine {
    pub fn from_parts(parts: &[String]) -> Result<Self, ProcessError> {
        let (program, args) = parts.split_first().ok_or(ProcessError::EmptyCommand)?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run with extra arguments appended, bounded by `limit`
    pub async fn run<I, S>(&self, extra: I, limit: Duration) -> Result<ProcessOutput, ProcessError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        self.run_in(extra, None, &[], limit).await
    }

    /// Run with extra arguments, an optional working directory and extra environment
    pub async fn run_in<I, S>(
        &self,
        extra: I,
        cwd: Option<&Path>,
        envs: &[(&str, &str)],
        limit: Duration,
    ) -> Result<ProcessOutput, ProcessError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .args(extra)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = cwd {
            command.current_dir(dir);
        }
        for (key, value) in envs {
            command.env(key, value);
        }

        run_bounded(&self.program, command, limit).await
    }
}

async fn run_bounded(
    program: &str,
    mut command: Command,
    limit: Duration,
) -> Result<ProcessOutput, ProcessError> {
    let start = Instant::now();

    let child = command.spawn().map_err(|source| ProcessError::Launch {
        program: program.to_string(),
        source,
    })?;

    // Dropping `wait_with_output` on timeout drops the child, which kills it
    let output = match tokio::time::timeout(limit, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(source)) => {
            return Err(ProcessError::Launch {
                program: program.to_string(),
                source,
            });
        }
        Err(_) => {
            warn!("⏰ '{}' exceeded {:?}, terminated", program, limit);
            return Err(ProcessError::Timeout(limit));
        }
    };

    let elapsed = start.elapsed();
    debug!(
        program = program,
        status = %output.status,
        elapsed_ms = elapsed.as_millis() as u64,
        "subprocess finished"
    );

    Ok(ProcessOutput {
        success: output.status.success(),
        status: output.status.to_string(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        elapsed,
    })
}
