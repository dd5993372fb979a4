use std::process::Stdio;

use crate::daemon::DaemonCommand;
use crate::error::CheckError;
use crate::log_sink::LogSink;

/// Runs daemon subcommands to completion with their output in the log sink.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    sink: LogSink,
}

impl ProcessRunner {
    pub fn new(sink: LogSink) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &LogSink {
        &self.sink
    }

    /// Run a command and wait for it.
    ///
    /// On a non-zero exit the log is scanned from the start for the first
    /// line that looks like an error, which is attached as the diagnostic.
    pub async fn run(&self, command: &DaemonCommand) -> Result<(), CheckError> {
        tracing::debug!(command = %command, "executing");

        let (stdout, stderr) = self.sink.begin_command(command)?;

        let status = command
            .to_command()
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|source| CheckError::Spawn {
                command: command.to_string(),
                source,
            })?;

        if status.success() {
            self.sink.append_line("=== Command completed successfully ===")?;
            tracing::debug!(command = %command, "command completed successfully");
            return Ok(());
        }

        self.sink
            .append_line(&format!("=== Command failed with error: {} ===", status))?;
        tracing::error!(command = %command, %status, "command failed");

        let diagnostic = match self.sink.find_error() {
            Ok(hit) => hit.map(|m| m.line),
            Err(e) => {
                tracing::warn!("could not scan log for failure details: {}", e);
                None
            }
        };

        Err(CheckError::Process {
            command: command.to_string(),
            status: status.to_string(),
            diagnostic,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn shell(script: &str) -> DaemonCommand {
        DaemonCommand::new("sh").arg("-c").arg(script)
    }

    fn runner() -> (tempfile::TempDir, ProcessRunner) {
        let tmp = tempfile::tempdir().unwrap();
        let sink = LogSink::new(tmp.path().join("logs.txt"));
        (tmp, ProcessRunner::new(sink))
    }

    #[tokio::test]
    async fn test_success_logs_header_output_and_trailer() {
        let (_tmp, runner) = runner();
        runner.run(&shell("echo hello; echo world >&2")).await.unwrap();

        let lines = runner.sink().read_lines().unwrap();
        assert_eq!(lines[0], "");
        assert!(lines[1].starts_with("=== Executing: sh -c"));
        assert!(lines.contains(&"hello".to_string()));
        assert!(lines.contains(&"world".to_string()));
        assert_eq!(
            lines.last().unwrap(),
            "=== Command completed successfully ==="
        );
    }

    #[tokio::test]
    async fn test_failure_attaches_first_error_line() {
        let (_tmp, runner) = runner();
        let err = runner
            .run(&shell(
                "echo loading; echo 'Error: invalid validator set' >&2; echo 'fatal: second'; exit 3",
            ))
            .await
            .unwrap_err();

        match err {
            CheckError::Process {
                status, diagnostic, ..
            } => {
                assert!(status.contains('3'));
                assert_eq!(diagnostic.as_deref(), Some("Error: invalid validator set"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let lines = runner.sink().read_lines().unwrap();
        assert!(lines
            .last()
            .unwrap()
            .starts_with("=== Command failed with error:"));
    }

    #[tokio::test]
    async fn test_failure_scans_from_beginning_of_log() {
        let (_tmp, runner) = runner();
        runner.sink().append_line("earlier stage: unable to dial peer").unwrap();
        let err = runner.run(&shell("echo 'Error: late'; exit 1")).await.unwrap_err();
        match err {
            CheckError::Process { diagnostic, .. } => {
                assert_eq!(
                    diagnostic.as_deref(),
                    Some("earlier stage: unable to dial peer")
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failure_without_matching_line() {
        let (_tmp, runner) = runner();
        let err = runner.run(&shell("echo quiet; exit 2")).await.unwrap_err();
        assert!(matches!(
            err,
            CheckError::Process {
                diagnostic: None,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let (_tmp, runner) = runner();
        let cmd = DaemonCommand::new("/nonexistent/bin/wardend").arg("start");
        let err = runner.run(&cmd).await.unwrap_err();
        assert!(matches!(err, CheckError::Spawn { .. }));
    }
}
