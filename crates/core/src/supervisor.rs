//! Process lifecycle supervision
//!
//! Starts the managed server process and observes its lifecycle through the
//! only signals the server exposes: fixed textual markers on its log
//! stream. The supervisor walks the state machine
//!
//! `NotStarted -> Starting -> Ready -> ShuttingDown -> Terminated`
//!
//! with a terminal `Failed` state reachable from `Starting` or
//! `ShuttingDown` when a marker does not appear within the allotted wait or
//! the process exits prematurely. Shutdown can be triggered by delivering
//! SIGTERM to the process or by invoking an explicit shutdown command; both
//! paths converge on the same termination marker and are indistinguishable
//! once shutdown has begun.
//!
//! Log watching is the single suspension point: each newly available line
//! is evaluated against a pattern, and the wait resolves on first match or
//! timeout, whichever is first. Every wait is bounded by
//! `tokio::time::timeout` and is cancel-safe; the stream handle is owned by
//! the supervisor and released when it is dropped.

use crate::errors::SupervisorError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

/// Log line marking successful server startup
pub const READY_PATTERN: &str = r"org\.apache\.catalina\.startup\.Catalina\.start Server startup";

/// Log line marking protocol handler teardown during shutdown
pub const TERMINATED_PATTERN: &str =
    r"org\.apache\.coyote\.AbstractProtocol\.destroy Destroying ProtocolHandler";

static READY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(READY_PATTERN).expect("Valid regex pattern"));
static TERMINATED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(TERMINATED_PATTERN).expect("Valid regex pattern"));

/// Readiness and termination markers watched on the process log stream
///
/// These textual markers are the only observable start/stop signal the
/// managed process provides; changing them requires a coordinated update of
/// every consumer of the log stream.
#[derive(Debug, Clone)]
pub struct LogPatterns {
    pub ready: Regex,
    pub terminated: Regex,
}

impl Default for LogPatterns {
    fn default() -> Self {
        Self {
            ready: READY_RE.clone(),
            terminated: TERMINATED_RE.clone(),
        }
    }
}

/// Observable lifecycle states of the managed process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupervisorState {
    NotStarted,
    Starting,
    Ready,
    ShuttingDown,
    Terminated,
    Failed,
}

impl SupervisorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupervisorState::NotStarted => "notStarted",
            SupervisorState::Starting => "starting",
            SupervisorState::Ready => "ready",
            SupervisorState::ShuttingDown => "shuttingDown",
            SupervisorState::Terminated => "terminated",
            SupervisorState::Failed => "failed",
        }
    }

    /// Whether no further transitions are possible from this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, SupervisorState::Terminated | SupervisorState::Failed)
    }
}

/// How shutdown of the managed process is initiated
#[derive(Debug, Clone)]
pub enum ShutdownTrigger {
    /// SIGTERM delivered out-of-band to the process
    Signal,
    /// An explicit shutdown command invocation (argv form)
    Command(Vec<String>),
}

/// Cloneable read-only view of the supervisor state
///
/// Safe to query from another task while a wait is in progress.
#[derive(Debug, Clone)]
pub struct StateProbe {
    state: Arc<Mutex<SupervisorState>>,
}

impl StateProbe {
    pub fn current(&self) -> SupervisorState {
        *self.state.lock().unwrap()
    }
}

/// Marker wait phases; each maps a pattern to the state it proves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WaitPhase {
    Startup,
    Shutdown,
}

impl WaitPhase {
    fn as_str(self) -> &'static str {
        match self {
            WaitPhase::Startup => "startup",
            WaitPhase::Shutdown => "shutdown",
        }
    }

    fn reached_state(self) -> SupervisorState {
        match self {
            WaitPhase::Startup => SupervisorState::Ready,
            WaitPhase::Shutdown => SupervisorState::Terminated,
        }
    }
}

/// Why a log watch ended without a match
enum WatchEnd {
    /// Stream EOF: the process exited before the marker appeared
    Eof,
    Io(std::io::Error),
}

/// Supervises one managed server process
pub struct Supervisor {
    child: Child,
    lines: Lines<BufReader<ChildStdout>>,
    patterns: LogPatterns,
    state: Arc<Mutex<SupervisorState>>,
}

impl Supervisor {
    /// Spawn the managed process with piped stdout and begin supervision
    ///
    /// The child's stderr is passed through unchanged; stdout is consumed
    /// line by line during marker waits and re-emitted on the supervisor's
    /// own stdout so downstream log consumers still see it.
    #[instrument(skip_all, fields(program = %program))]
    pub fn spawn(program: &str, args: &[String]) -> std::result::Result<Self, SupervisorError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SupervisorError::Process {
                action: "spawn",
                source,
            })?;

        let stdout = child.stdout.take().ok_or_else(|| SupervisorError::Process {
            action: "capture output of",
            source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdout was not piped"),
        })?;

        info!(program, pid = child.id(), "Started managed process");

        Ok(Self {
            child,
            lines: BufReader::new(stdout).lines(),
            patterns: LogPatterns::default(),
            state: Arc::new(Mutex::new(SupervisorState::Starting)),
        })
    }

    /// Replace the watched log patterns
    pub fn with_patterns(mut self, patterns: LogPatterns) -> Self {
        self.patterns = patterns;
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> SupervisorState {
        *self.state.lock().unwrap()
    }

    /// A cloneable probe for querying the state from other tasks
    pub fn state_probe(&self) -> StateProbe {
        StateProbe {
            state: Arc::clone(&self.state),
        }
    }

    /// OS process id of the managed process, if it is still running
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    fn set_state(&self, next: SupervisorState) {
        let mut state = self.state.lock().unwrap();
        if *state != next {
            debug!(from = state.as_str(), to = next.as_str(), "Lifecycle transition");
            *state = next;
        }
    }

    /// Wait for the startup marker on the log stream
    ///
    /// Transitions to `Ready` when the marker appears. Exceeding `wait`
    /// transitions to `Failed` and reports a timeout; stream EOF before the
    /// marker (a crash) transitions to `Failed` and reports an unexpected
    /// exit.
    pub async fn wait_until_ready(
        &mut self,
        wait: Duration,
    ) -> std::result::Result<(), SupervisorError> {
        self.wait_for_marker(WaitPhase::Startup, wait).await
    }

    /// Wait for the termination marker on the log stream
    ///
    /// Usable for shutdowns initiated by this supervisor and for shutdowns
    /// initiated elsewhere (a signal from the outside, a shutdown script run
    /// in the container); the wait does not distinguish how shutdown began.
    pub async fn wait_until_terminated(
        &mut self,
        wait: Duration,
    ) -> std::result::Result<(), SupervisorError> {
        if self.state() == SupervisorState::Ready {
            self.set_state(SupervisorState::ShuttingDown);
        }
        self.wait_for_marker(WaitPhase::Shutdown, wait).await
    }

    /// Deliver SIGTERM to the managed process
    ///
    /// Delivered via the `kill` utility rather than a raw syscall, keeping
    /// the crate free of unsafe code.
    pub async fn signal_terminate(&mut self) -> std::result::Result<(), SupervisorError> {
        let pid = self
            .child
            .id()
            .ok_or(SupervisorError::UnexpectedExit { phase: "shutdown" })?;

        debug!(pid, "Delivering SIGTERM to managed process");
        let status = Command::new("kill")
            .args(["-TERM", &pid.to_string()])
            .status()
            .await
            .map_err(|source| SupervisorError::Process {
                action: "signal",
                source,
            })?;
        if !status.success() {
            return Err(SupervisorError::Process {
                action: "signal",
                source: std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("kill exited with {status}"),
                ),
            });
        }

        self.set_state(SupervisorState::ShuttingDown);
        Ok(())
    }

    /// Invoke an explicit shutdown command (e.g. the install tree's
    /// shutdown script)
    pub async fn run_shutdown_command(
        &mut self,
        command: &[String],
    ) -> std::result::Result<(), SupervisorError> {
        let (program, args) = command.split_first().ok_or(SupervisorError::Process {
            action: "run shutdown command for",
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
        })?;

        debug!(program, "Invoking shutdown command");
        let status = Command::new(program)
            .args(args)
            .status()
            .await
            .map_err(|source| SupervisorError::Process {
                action: "run shutdown command for",
                source,
            })?;
        if !status.success() {
            warn!(%status, "Shutdown command reported failure");
        }

        self.set_state(SupervisorState::ShuttingDown);
        Ok(())
    }

    /// Relay log lines until the stream ends
    ///
    /// Keeps the pipe drained between lifecycle waits so the managed
    /// process never blocks writing to a full pipe. The stream ending here
    /// means the process exited while it was supposed to be running, which
    /// is reported as an unexpected exit. Cancel-safe; intended for use in
    /// a `select!` against a shutdown trigger.
    pub async fn drain_logs(&mut self) -> std::result::Result<(), SupervisorError> {
        loop {
            match self.lines.next_line().await {
                Ok(Some(line)) => println!("{line}"),
                Ok(None) => {
                    warn!("Process exited without a shutdown request");
                    self.set_state(SupervisorState::Failed);
                    return Err(SupervisorError::UnexpectedExit { phase: "shutdown" });
                }
                Err(source) => {
                    self.set_state(SupervisorState::Failed);
                    return Err(SupervisorError::Stream(source));
                }
            }
        }
    }

    /// Initiate shutdown and wait for the termination marker
    pub async fn shutdown(
        &mut self,
        trigger: ShutdownTrigger,
        wait: Duration,
    ) -> std::result::Result<(), SupervisorError> {
        match trigger {
            ShutdownTrigger::Signal => self.signal_terminate().await?,
            ShutdownTrigger::Command(command) => self.run_shutdown_command(&command).await?,
        }
        self.wait_until_terminated(wait).await
    }

    /// Wait for the managed process to exit and return its status
    pub async fn wait_exit(
        &mut self,
    ) -> std::result::Result<std::process::ExitStatus, SupervisorError> {
        self.child
            .wait()
            .await
            .map_err(|source| SupervisorError::Process {
                action: "wait for",
                source,
            })
    }

    async fn wait_for_marker(
        &mut self,
        phase: WaitPhase,
        wait: Duration,
    ) -> std::result::Result<(), SupervisorError> {
        let pattern = match phase {
            WaitPhase::Startup => self.patterns.ready.clone(),
            WaitPhase::Shutdown => self.patterns.terminated.clone(),
        };

        match timeout(wait, watch_for(&mut self.lines, &pattern)).await {
            Ok(Ok(())) => {
                info!(phase = phase.as_str(), "Observed lifecycle marker");
                self.set_state(phase.reached_state());
                Ok(())
            }
            Ok(Err(WatchEnd::Eof)) => {
                warn!(phase = phase.as_str(), "Process exited before marker appeared");
                self.set_state(SupervisorState::Failed);
                Err(SupervisorError::UnexpectedExit {
                    phase: phase.as_str(),
                })
            }
            Ok(Err(WatchEnd::Io(source))) => {
                self.set_state(SupervisorState::Failed);
                Err(SupervisorError::Stream(source))
            }
            Err(_elapsed) => {
                warn!(phase = phase.as_str(), ?wait, "Timed out waiting for marker");
                self.set_state(SupervisorState::Failed);
                Err(SupervisorError::Timeout {
                    phase: phase.as_str(),
                    waited: wait,
                })
            }
        }
    }
}

/// Consume log lines until one matches the pattern
///
/// Lines are re-emitted on stdout so the process log remains observable to
/// downstream consumers. Unrelated lines cause no transition.
async fn watch_for(
    lines: &mut Lines<BufReader<ChildStdout>>,
    pattern: &Regex,
) -> std::result::Result<(), WatchEnd> {
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                println!("{line}");
                if pattern.is_match(&line) {
                    return Ok(());
                }
            }
            Ok(None) => return Err(WatchEnd::Eof),
            Err(source) => return Err(WatchEnd::Io(source)),
        }
    }
}
