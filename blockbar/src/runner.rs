//! Process runner
//!
//! Spawns exactly one child per call, waits for it up to a deadline and
//! returns its trimmed standard output. Extra environment is handed to the
//! child directly; the environment of this process is never touched.

use crate::error::{BarError, Result};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Default deadline for block programs and click handlers
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(10);

/// What to execute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation<'a> {
    /// `interpreter` (launcher plus fixed arguments) with `script` appended
    /// as the final argument
    Script {
        interpreter: &'a str,
        script: &'a str,
    },
    /// A command line executed directly
    Command(&'a str),
}

impl Invocation<'_> {
    /// Program and arguments for this invocation
    pub fn argv(&self) -> Result<(String, Vec<String>)> {
        match *self {
            Invocation::Script {
                interpreter,
                script,
            } => {
                let mut parts = split(interpreter)?;
                if parts.is_empty() {
                    return Err(BarError::InterpreterMissing);
                }
                let program = parts.remove(0);
                parts.push(script.to_string());
                Ok((program, parts))
            }
            Invocation::Command(line) => {
                let mut parts = split(line)?;
                if parts.is_empty() {
                    return Err(BarError::EmptyCommand);
                }
                let program = parts.remove(0);
                Ok((program, parts))
            }
        }
    }
}

fn split(line: &str) -> Result<Vec<String>> {
    shell_words::split(line).map_err(|source| BarError::InvalidCommandLine {
        line: line.to_string(),
        source,
    })
}

/// Run `invocation` with `env` added to the child's environment.
pub async fn run(
    deadline: Duration,
    invocation: Invocation<'_>,
    env: &[(&str, String)],
) -> Result<String> {
    let (program, args) = invocation.argv()?;
    let path =
        which::which(&program).map_err(|_| BarError::InterpreterNotFound(program.clone()))?;

    log::debug!("Spawning {} {:?}", path.display(), args);

    let child = Command::new(&path)
        .args(&args)
        .envs(env.iter().map(|(key, value)| (*key, value.as_str())))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| BarError::ExecutionFailed {
            program: program.clone(),
            source,
        })?;

    // Dropping the wait future on timeout drops the child, which kills it.
    let output = match tokio::time::timeout(deadline, child.wait_with_output()).await {
        Ok(output) => output.map_err(|source| BarError::ExecutionFailed {
            program: program.clone(),
            source,
        })?,
        Err(_) => return Err(BarError::Timeout { program, deadline }),
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(BarError::ExecutionFailed {
            program,
            source: std::io::Error::other(format!("{}: {}", output.status, stderr.trim())),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
