//! Bounded process runner
//!
//! Launches `interpreter script_path` as a child process, captures stdout and
//! stderr into separate buffers, and races the child against a deadline.
//! Whichever finishes first decides the [`ExitState`]. On expiry, or when the
//! call itself is dropped, the child (and on unix its whole process group) is
//! killed, so no process outlives the call.

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// Wall-clock limit for a single script
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything needed to launch one script
#[derive(Debug, Clone)]
pub struct RunSpec {
    /// Interpreter executable
    pub interpreter: String,
    /// Script handed to the interpreter as its only argument
    pub script: PathBuf,
    /// Child's current directory; `None` inherits ours
    pub working_dir: Option<PathBuf>,
    /// Complete environment for the child
    pub env: Vec<(OsString, OsString)>,
}

impl RunSpec {
    /// Spec that inherits this process's full environment
    pub fn inherit_env(interpreter: impl Into<String>, script: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            script: script.into(),
            working_dir: None,
            env: std::env::vars_os().collect(),
        }
    }

    /// Set the working directory
    pub fn with_working_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.working_dir = dir;
        self
    }
}

/// How a run ended
#[derive(Debug)]
pub enum ExitState {
    /// Exited with status zero
    Success,
    /// Ran to completion and exited non-zero or by signal
    NonZero(ExitStatus),
    /// Killed at the deadline
    TimedOut {
        /// The deadline that expired
        after: Duration,
        /// Set when killing the child failed
        kill_error: Option<io::Error>,
    },
    /// The interpreter could not be started
    LaunchFailed(io::Error),
    /// Started, but waiting on it or reading its output failed
    Faulted(io::Error),
}

/// Captured result of a run
#[derive(Debug)]
pub struct ExecutionOutcome {
    /// Everything written to stdout
    pub stdout: Vec<u8>,
    /// Everything written to stderr
    pub stderr: Vec<u8>,
    /// Terminal state
    pub state: ExitState,
}

impl ExecutionOutcome {
    fn without_output(state: ExitState) -> Self {
        Self {
            stdout: Vec::new(),
            stderr: Vec::new(),
            state,
        }
    }

    /// True only for a clean zero exit
    pub fn success(&self) -> bool {
        matches!(self.state, ExitState::Success)
    }

    /// True when the deadline fired
    pub fn timed_out(&self) -> bool {
        matches!(self.state, ExitState::TimedOut { .. })
    }
}

/// Runs scripts under a fixed deadline
#[derive(Debug, Clone, Copy)]
pub struct ProcessRunner {
    timeout: Duration,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl ProcessRunner {
    /// Create a runner with the given deadline
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// The deadline applied to every run
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run the script and wait for it to finish or hit the deadline
    pub async fn run(&self, spec: &RunSpec) -> ExecutionOutcome {
        let mut child = match spawn(spec) {
            Ok(child) => child,
            Err(e) => {
                let e = launch_error(spec, e);
                warn!(error = %e, "Failed to launch script");
                return ExecutionOutcome::without_output(ExitState::LaunchFailed(e));
            }
        };
        // Taken now: `id()` goes to `None` once the child is reaped, but the
        // process group can outlive its leader.
        let pid = child.id();
        let mut group = ProcessGroupGuard::new(pid);
        debug!(pid = ?pid, interpreter = %spec.interpreter, "Spawned script");

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let finished = tokio::time::timeout(self.timeout, async {
            tokio::join!(child.wait(), read_pipe(stdout), read_pipe(stderr))
        })
        .await;

        match finished {
            Ok((status, out, err)) => {
                group.disarm();
                let mut fault = None;
                let stdout = out.unwrap_or_else(|e| {
                    fault.get_or_insert(e);
                    Vec::new()
                });
                let stderr = err.unwrap_or_else(|e| {
                    fault.get_or_insert(e);
                    Vec::new()
                });
                let state = match (status, fault) {
                    (Err(e), _) | (Ok(_), Some(e)) => ExitState::Faulted(e),
                    (Ok(status), None) if status.success() => ExitState::Success,
                    (Ok(status), None) => ExitState::NonZero(status),
                };
                info!(?state, "Script finished");
                ExecutionOutcome {
                    stdout,
                    stderr,
                    state,
                }
            }
            Err(_) => {
                let kill_error = terminate(&mut child, &mut group).await.err();
                warn!(timeout = ?self.timeout, kill_error = ?kill_error, "Script timed out");
                ExecutionOutcome::without_output(ExitState::TimedOut {
                    after: self.timeout,
                    kill_error,
                })
            }
        }
    }
}

fn spawn(spec: &RunSpec) -> io::Result<Child> {
    let mut cmd = Command::new(&spec.interpreter);
    cmd.arg(&spec.script)
        .env_clear()
        .envs(spec.env.iter().map(|(k, v)| (k, v)))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(dir) = spec.working_dir.as_deref().filter(|d| !d.as_os_str().is_empty()) {
        cmd.current_dir(dir);
    }

    #[cfg(unix)]
    cmd.process_group(0);

    cmd.spawn()
}

/// Attach the offending path to a spawn error, keeping its kind.
fn launch_error(spec: &RunSpec, err: io::Error) -> io::Error {
    let bad_dir = spec
        .working_dir
        .as_deref()
        .filter(|d| !d.as_os_str().is_empty() && !d.is_dir());
    let context = match bad_dir {
        Some(dir) => format!("working directory {}", dir.display()),
        None => format!("interpreter {}", spec.interpreter),
    };
    io::Error::new(err.kind(), format!("{context}: {err}"))
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

/// Kills the script's process group when dropped while still armed.
///
/// `kill_on_drop` only reaches the group leader; this covers background jobs
/// the script started when the call is cancelled mid-run.
#[derive(Debug)]
struct ProcessGroupGuard {
    pgid: Option<u32>,
}

impl ProcessGroupGuard {
    fn new(pgid: Option<u32>) -> Self {
        Self { pgid }
    }

    /// The leader was reaped normally; leave the group alone.
    fn disarm(&mut self) {
        self.pgid = None;
    }

    fn kill(&mut self) -> io::Result<()> {
        self.pgid.take().map_or(Ok(()), kill_process_group)
    }
}

impl Drop for ProcessGroupGuard {
    fn drop(&mut self) {
        if let Some(pgid) = self.pgid {
            debug!(pgid, "Killing process group of abandoned script");
        }
        if let Err(e) = self.kill() {
            warn!(error = %e, "Failed to kill script process group");
        }
    }
}

/// Kill the child's process group and the child itself, then reap it.
async fn terminate(child: &mut Child, group: &mut ProcessGroupGuard) -> io::Result<()> {
    let grouped = group.kill();
    let direct = if child.id().is_some() {
        child.kill().await
    } else {
        Ok(())
    };
    grouped.and(direct)
}

#[cfg(unix)]
#[allow(unsafe_code)]
fn kill_process_group(pid: u32) -> io::Result<()> {
    // SAFETY: killpg has no memory-safety preconditions. The child was put in
    // its own group at spawn, so its pid is the group id.
    let rc = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) };
    if rc == 0 {
        return Ok(());
    }
    let err = io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::ESRCH) {
        Ok(())
    } else {
        Err(err)
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pgid: u32) -> io::Result<()> {
    // No process groups; `kill_on_drop` and `Child::kill` cover the child.
    Ok(())
}
