//! External process execution with a bounded wait
//!
//! Spawning goes through the [`ProcessSpawner`] seam so the fetcher can be
//! driven by scripted processes in tests. [`run_with_timeout`] owns the
//! timeout policy: the wait is a cancellable future, so the caller is
//! never stalled past the deadline.

use crate::error::{Error, Result};
use crate::platform::{Platform, Termination};
use std::collections::HashMap;
use std::fmt;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};

/// Exit code reported when a process has no code (killed by a signal)
pub const SIGNALED_EXIT_CODE: i32 = -1;

/// Description of a process to start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Extra environment on top of the inherited one
    pub env: HashMap<String, String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: HashMap::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// What a finished process left behind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOutput {
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Outcome of one bounded process run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    exit_code: i32,
    stdout: String,
    stderr: String,
    timed_out: bool,
}

impl ProcessResult {
    pub fn completed(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
            timed_out: false,
        }
    }

    pub fn timed_out() -> Self {
        Self {
            exit_code: SIGNALED_EXIT_CODE,
            stdout: String::new(),
            stderr: String::new(),
            timed_out: true,
        }
    }

    fn from_raw(raw: RawOutput) -> Self {
        Self::completed(
            raw.exit_code,
            String::from_utf8_lossy(&raw.stdout),
            String::from_utf8_lossy(&raw.stderr),
        )
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    pub fn is_timed_out(&self) -> bool {
        self.timed_out
    }

    pub fn is_success(&self) -> bool {
        !self.timed_out && self.exit_code == 0
    }
}

/// A running process
#[async_trait::async_trait]
pub trait ProcessHandle: Send {
    /// OS process id, if still known
    fn id(&self) -> Option<u32>;

    /// Wait for exit while draining stdout and stderr
    async fn wait_with_output(&mut self) -> Result<RawOutput>;

    /// Terminate the process and anything it started
    async fn kill(&mut self) -> Result<()>;
}

/// Starts processes
pub trait ProcessSpawner: Send + Sync {
    /// Start `spec`; failure here is [`Error::ProcessCreationFailed`]
    fn spawn(&self, spec: &CommandSpec) -> Result<Box<dyn ProcessHandle>>;
}

/// Run `spec` and wait at most `timeout` for it.
///
/// Only a failure to start the process is returned as `Err`. A process
/// still running at the deadline yields [`ProcessResult::timed_out`] and,
/// when `kill_on_timeout` is set, is killed along with its descendants.
/// Otherwise it is abandoned: a detached task keeps draining its output
/// and reaps it when it exits. Abandoned processes are only killed if the
/// runtime shuts down first.
pub async fn run_with_timeout(
    spawner: &dyn ProcessSpawner,
    spec: &CommandSpec,
    timeout: Duration,
    kill_on_timeout: bool,
) -> Result<ProcessResult> {
    let mut handle = spawner.spawn(spec)?;
    debug!("Spawned '{}' (pid {:?})", spec, handle.id());

    let waited = tokio::time::timeout(timeout, handle.wait_with_output()).await;
    match waited {
        Ok(Ok(raw)) => {
            debug!("'{}' exited with code {}", spec, raw.exit_code);
            Ok(ProcessResult::from_raw(raw))
        }
        Ok(Err(e)) => {
            warn!("Failed to collect output of '{}': {}", spec, e);
            Ok(ProcessResult::completed(
                SIGNALED_EXIT_CODE,
                "",
                format!("Failed to read process output: {}", e),
            ))
        }
        Err(_) => {
            warn!("'{}' did not finish within {:?}", spec, timeout);
            if kill_on_timeout {
                if let Err(e) = handle.kill().await {
                    warn!("Failed to kill timed-out '{}': {}", spec, e);
                }
            } else {
                abandon(handle, spec.to_string());
            }
            Ok(ProcessResult::timed_out())
        }
    }
}

/// Let a timed-out process finish on its own, reaping it in the background
fn abandon(mut handle: Box<dyn ProcessHandle>, command: String) {
    debug!("Abandoning '{}' (pid {:?})", command, handle.id());
    tokio::spawn(async move {
        match handle.wait_with_output().await {
            Ok(raw) => debug!("Abandoned '{}' exited with code {}", command, raw.exit_code),
            Err(e) => debug!("Abandoned '{}' could not be reaped: {}", command, e),
        }
    });
}

/// Spawns real OS processes through `tokio::process`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSpawner;

impl SystemSpawner {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessSpawner for SystemSpawner {
    fn spawn(&self, spec: &CommandSpec) -> Result<Box<dyn ProcessHandle>> {
        let mut child = Command::new(&spec.program)
            .args(&spec.args)
            .envs(&spec.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::ProcessCreationFailed {
                command: spec.to_string(),
                reason: e.to_string(),
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        Ok(Box::new(SystemProcess {
            child,
            stdout,
            stderr,
        }))
    }
}

// Pipes live outside `child` so a wait cut short by the timeout can be
// resumed without closing them
struct SystemProcess {
    child: Child,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
}

#[async_trait::async_trait]
impl ProcessHandle for SystemProcess {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    async fn wait_with_output(&mut self) -> Result<RawOutput> {
        let stdout_pipe = &mut self.stdout;
        let stderr_pipe = &mut self.stderr;

        // Both pipes must drain while waiting or a chatty child blocks on a full pipe
        let stdout = async {
            let mut buf = Vec::new();
            if let Some(pipe) = stdout_pipe.as_mut() {
                pipe.read_to_end(&mut buf).await?;
            }
            Ok::<_, std::io::Error>(buf)
        };
        let stderr = async {
            let mut buf = Vec::new();
            if let Some(pipe) = stderr_pipe.as_mut() {
                pipe.read_to_end(&mut buf).await?;
            }
            Ok::<_, std::io::Error>(buf)
        };

        let (status, stdout, stderr) = tokio::try_join!(self.child.wait(), stdout, stderr)?;

        Ok(RawOutput {
            exit_code: status.code().unwrap_or(SIGNALED_EXIT_CODE),
            stdout,
            stderr,
        })
    }

    async fn kill(&mut self) -> Result<()> {
        if let Some(pid) = self.child.id() {
            let tree = tokio::task::spawn_blocking(move || {
                Platform::process_tree().terminate_tree(pid, Termination::Graceful)
            })
            .await
            .map_err(|e| Error::Other(format!("Process tree walk failed: {}", e)))?;

            if let Err(e) = tree {
                warn!("Failed to terminate process tree of {}: {}", pid, e);
            }
        }

        // SIGKILL the root and reap it
        self.child.kill().await?;
        Ok(())
    }
}
