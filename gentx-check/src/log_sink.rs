//! Append-only log shared by every subprocess of a run.
//!
//! Subprocesses write into the sink through inherited file handles; the tool
//! re-opens and re-scans it for diagnostics. Writers run one at a time, so no
//! locking is done. Pattern matching here is a best-effort heuristic over the
//! daemon's unstructured text output.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use gentx_types::constants::{ERROR_PATTERNS, PANIC_SIGNATURE};

use crate::error::CheckError;

/// Prefix of the marker lines the tool itself writes around each command.
pub const MARKER_PREFIX: &str = "=== ";

/// A line found by a scan, with its 0-based position in the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMatch {
    pub index: usize,
    pub line: String,
}

impl LogMatch {
    /// 1-based line number.
    pub fn line_number(&self) -> usize {
        self.index + 1
    }
}

/// Whether a line contains the fatal-panic signature.
pub fn contains_panic(line: &str) -> bool {
    line.contains(PANIC_SIGNATURE)
}

/// Whether a line looks like a failure diagnostic (case-insensitive).
pub fn matches_error_pattern(line: &str) -> bool {
    let lower = line.to_lowercase();
    ERROR_PATTERNS.iter().any(|p| lower.contains(p))
}

fn is_marker(line: &str) -> bool {
    line.starts_with(MARKER_PREFIX)
}

/// The final slice of the log shown to the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogTail {
    pub lines: Vec<String>,
    pub panic_observed: bool,
}

#[derive(Debug, Clone)]
pub struct LogSink {
    path: PathBuf,
}

impl LogSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_append(&self) -> Result<File, CheckError> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| CheckError::io(format!("open log file {}", self.path.display()), e))
    }

    /// Append one line written by the tool itself.
    pub fn append_line(&self, line: &str) -> Result<(), CheckError> {
        let mut file = self.open_append()?;
        writeln!(file, "{}", line)
            .map_err(|e| CheckError::io(format!("write log file {}", self.path.display()), e))
    }

    /// Write the header marker for `command` and return handles for its
    /// stdout and stderr.
    pub fn begin_command(
        &self,
        command: &impl fmt::Display,
    ) -> Result<(Stdio, Stdio), CheckError> {
        self.append_line("")?;
        self.append_line(&format!("=== Executing: {} ===", command))?;
        self.child_stdio()
    }

    /// Append-mode handles for a child's stdout and stderr.
    pub fn child_stdio(&self) -> Result<(Stdio, Stdio), CheckError> {
        let stdout = self.open_append()?;
        let stderr = stdout
            .try_clone()
            .map_err(|e| CheckError::io(format!("clone log handle {}", self.path.display()), e))?;
        Ok((Stdio::from(stdout), Stdio::from(stderr)))
    }

    /// Read the whole log. Invalid UTF-8 is replaced rather than rejected.
    pub fn read_lines(&self) -> Result<Vec<String>, CheckError> {
        let bytes = std::fs::read(&self.path)
            .map_err(|e| CheckError::io(format!("read log file {}", self.path.display()), e))?;
        Ok(String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_string)
            .collect())
    }

    /// Number of lines in the log so far; zero before anything was written.
    pub fn line_count(&self) -> Result<usize, CheckError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).lines().count()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(CheckError::io(
                format!("read log file {}", self.path.display()),
                e,
            )),
        }
    }

    /// First line at or after index `start` that satisfies `pred`. The
    /// returned index is relative to the whole log.
    pub fn find_first_from(
        &self,
        start: usize,
        pred: impl Fn(&str) -> bool,
    ) -> Result<Option<LogMatch>, CheckError> {
        Ok(self
            .read_lines()?
            .into_iter()
            .enumerate()
            .skip(start)
            .find(|(_, line)| pred(line))
            .map(|(index, line)| LogMatch { index, line }))
    }

    /// First line, scanning from the start, that satisfies `pred`.
    pub fn find_first(
        &self,
        pred: impl Fn(&str) -> bool,
    ) -> Result<Option<LogMatch>, CheckError> {
        self.find_first_from(0, pred)
    }

    /// First line carrying the fatal-panic signature.
    pub fn find_panic(&self) -> Result<Option<LogMatch>, CheckError> {
        self.find_panic_from(0)
    }

    /// First panic line at or after index `start`.
    pub fn find_panic_from(&self, start: usize) -> Result<Option<LogMatch>, CheckError> {
        self.find_first_from(start, contains_panic)
    }

    /// First daemon output line that looks like an error. The tool's own
    /// marker lines are not considered.
    pub fn find_error(&self) -> Result<Option<LogMatch>, CheckError> {
        self.find_first(|line| !is_marker(line) && matches_error_pattern(line))
    }

    /// Last lines of the log; more of them when a panic was ever logged.
    pub fn tail(&self, lines: usize, panic_lines: usize) -> Result<LogTail, CheckError> {
        let all = self.read_lines()?;
        let panic_observed = all.iter().any(|l| contains_panic(l));
        let count = if panic_observed { panic_lines } else { lines };
        let start = all.len().saturating_sub(count);
        Ok(LogTail {
            lines: all[start..].to_vec(),
            panic_observed,
        })
    }
}
