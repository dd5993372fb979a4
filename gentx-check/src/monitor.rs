//! Supervision of a throwaway node booted from the collected genesis.
//!
//! The node runs as a separate OS process writing into the shared log. A
//! polling loop re-scans the log for the fatal-panic signature and checks
//! whether the process died, until a fixed deadline. Surviving the whole
//! window is the success signal.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Child;
use tokio::time::{interval_at, sleep, timeout, Instant, MissedTickBehavior};

use crate::config::MonitorConfig;
use crate::daemon::DaemonCommand;
use crate::error::CheckError;
use crate::log_sink::LogSink;

/// Lifecycle of a supervised node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Starting,
    Running,
    TimedOut,
    PanicDetected,
    ProcessExited,
    Terminated,
}

/// The panic line plus what the node logged after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanicReport {
    pub line: String,
    /// 1-based position of `line` in the log.
    pub line_number: usize,
    /// The panic line followed by at most the configured number of lines.
    pub context: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorOutcome {
    /// The node survived the whole observation window.
    TimedOut { checks: u64 },
    PanicDetected(PanicReport),
    /// The node exited on its own during the window.
    ProcessExited { status: String },
}

impl MonitorOutcome {
    pub fn state(&self) -> MonitorState {
        match self {
            MonitorOutcome::TimedOut { .. } => MonitorState::TimedOut,
            MonitorOutcome::PanicDetected(_) => MonitorState::PanicDetected,
            MonitorOutcome::ProcessExited { .. } => MonitorState::ProcessExited,
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, MonitorOutcome::TimedOut { .. })
    }

    /// Number of completed health checks on success, an error otherwise.
    pub fn into_result(self) -> Result<u64, CheckError> {
        match self {
            MonitorOutcome::TimedOut { checks } => Ok(checks),
            MonitorOutcome::PanicDetected(report) => Err(CheckError::Panic {
                line: report.line,
                line_number: report.line_number,
                context: report.context,
            }),
            MonitorOutcome::ProcessExited { status } => Err(CheckError::ProcessExited { status }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MonitorReport {
    pub outcome: MonitorOutcome,
    pub pid: Option<u32>,
    pub elapsed: Duration,
}

pub struct NodeHealthMonitor {
    config: MonitorConfig,
    sink: LogSink,
}

impl NodeHealthMonitor {
    pub fn new(config: MonitorConfig, sink: LogSink) -> Self {
        Self { config, sink }
    }

    /// Start the node and watch it until it panics, exits, or the deadline
    /// passes. The process is not running anymore when this returns.
    pub async fn supervise(&self, command: &DaemonCommand) -> Result<MonitorReport, CheckError> {
        let started = Instant::now();
        tracing::debug!(state = ?MonitorState::Starting, command = %command, "starting node");

        // Earlier cycles share the log; only this node's output counts.
        let first_line = self.sink.line_count()?;
        let (stdout, stderr) = self.sink.begin_command(command)?;

        let mut child = command
            .to_command()
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CheckError::Spawn {
                command: command.to_string(),
                source,
            })?;
        let pid = child.id();
        tracing::info!(pid, state = ?MonitorState::Running, "node started");

        let outcome = self.watch(&mut child, first_line).await;
        tracing::debug!(state = ?outcome.state(), "leaving observation window");

        self.terminate(&mut child).await;
        tracing::debug!(state = ?MonitorState::Terminated, "node terminated");

        Ok(MonitorReport {
            outcome,
            pid,
            elapsed: started.elapsed(),
        })
    }

    async fn watch(&self, child: &mut Child, first_line: usize) -> MonitorOutcome {
        let poll = self.config.poll_interval();
        let deadline = sleep(self.config.timeout());
        tokio::pin!(deadline);

        let mut ticker = interval_at(Instant::now() + poll, poll);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let expected = self.config.expected_checks();
        let mut checks = 0u64;

        loop {
            tokio::select! {
                biased;
                _ = &mut deadline => {
                    tracing::info!(
                        timeout_ms = self.config.timeout_ms,
                        checks,
                        "timeout reached, node stayed up"
                    );
                    return MonitorOutcome::TimedOut { checks };
                }
                _ = ticker.tick() => {
                    checks += 1;
                    tracing::info!("health check {}/{}", checks, expected);

                    if let Some(report) = self.check_for_panic(first_line).await {
                        return MonitorOutcome::PanicDetected(report);
                    }

                    match child.try_wait() {
                        Ok(Some(status)) => {
                            tracing::error!(%status, "node process exited unexpectedly");
                            return MonitorOutcome::ProcessExited {
                                status: status.to_string(),
                            };
                        }
                        Ok(None) => {}
                        Err(e) => tracing::warn!("failed to poll node process: {}", e),
                    }
                }
            }
        }
    }

    /// Scan everything this node logged, starting at `first_line`, for the
    /// panic signature. On a hit, wait out the grace window and capture what
    /// followed the panic line.
    async fn check_for_panic(&self, first_line: usize) -> Option<PanicReport> {
        let hit = match self.sink.find_panic_from(first_line) {
            Ok(Some(hit)) => hit,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("could not scan log for panics: {}", e);
                return None;
            }
        };

        tracing::error!(line_number = hit.line_number(), "panic detected: {}", hit.line);
        tracing::info!(
            grace_ms = self.config.panic_grace_ms,
            "waiting for additional log output after panic"
        );
        sleep(self.config.panic_grace()).await;

        let context = match self.sink.read_lines() {
            Ok(lines) if hit.index < lines.len() => {
                let end = (hit.index + 1 + self.config.panic_context_lines).min(lines.len());
                lines[hit.index..end].to_vec()
            }
            Ok(_) => vec![hit.line.clone()],
            Err(e) => {
                tracing::warn!("could not re-read log after panic: {}", e);
                vec![hit.line.clone()]
            }
        };

        Some(PanicReport {
            line_number: hit.line_number(),
            line: hit.line,
            context,
        })
    }

    /// Stop the node: cooperative stop first, kill if that cannot be sent or
    /// the node does not exit within the settle window.
    async fn terminate(&self, child: &mut Child) {
        if let Ok(Some(status)) = child.try_wait() {
            tracing::debug!(%status, "node already exited");
            return;
        }

        let settle = self.config.settle();
        match request_stop(child) {
            Ok(()) => match timeout(settle, child.wait()).await {
                Ok(Ok(status)) => {
                    tracing::info!(%status, "node stopped");
                    return;
                }
                Ok(Err(e)) => tracing::warn!("failed to await node exit: {}", e),
                Err(_) => tracing::warn!(
                    settle_ms = self.config.settle_ms,
                    "node ignored stop request, killing"
                ),
            },
            Err(e) => tracing::warn!("failed to request node stop, killing: {}", e),
        }

        if let Err(e) = child.start_kill() {
            tracing::warn!("failed to kill node: {}", e);
        }
        match timeout(settle, child.wait()).await {
            Ok(Ok(status)) => tracing::info!(%status, "node killed"),
            Ok(Err(e)) => tracing::warn!("failed to await killed node: {}", e),
            Err(_) => tracing::warn!("node still running after kill"),
        }
    }
}

#[cfg(unix)]
fn request_stop(child: &Child) -> std::io::Result<()> {
    let pid = child
        .id()
        .ok_or_else(|| std::io::Error::other("node process already reaped"))?;
    // SAFETY: plain syscall on a pid we spawned and have not reaped yet.
    let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn request_stop(_child: &Child) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "cooperative stop is not available on this platform",
    ))
}
