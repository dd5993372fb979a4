use std::fmt;

use serde::{Deserialize, Serialize};

/// Verdict for a single gentx file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Passed,
    Failed,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Passed => "passed",
            FileStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overall verdict for a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunStatus {
    Passed,
    Failed,
    NoFiles,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Passed => "passed",
            RunStatus::Failed => "failed",
            RunStatus::NoFiles => "no-files",
        }
    }

    /// Whether the run should end with a zero exit code.
    pub fn is_success(&self) -> bool {
        !matches!(self, RunStatus::Failed)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of validating one gentx file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileValidationResult {
    pub file: String,
    pub status: FileStatus,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl FileValidationResult {
    pub fn passed(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            status: FileStatus::Passed,
            message: message.into(),
        }
    }

    pub fn failed(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            status: FileStatus::Failed,
            message: message.into(),
        }
    }

    pub fn is_passed(&self) -> bool {
        self.status == FileStatus::Passed
    }
}

/// Aggregate result of a validation run, consumed by CI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub status: RunStatus,
    pub message: String,
    /// Number of files that passed.
    pub files_validated: usize,
    pub network_validated: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<FileValidationResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_files: Vec<String>,
}

impl RunResult {
    /// Result for a run that found nothing to validate.
    pub fn no_files(network: &str) -> Self {
        Self {
            status: RunStatus::NoFiles,
            message: format!("No {} GenTx files found to validate", network),
            files_validated: 0,
            network_validated: network.to_string(),
            results: Vec::new(),
            failed_files: Vec::new(),
        }
    }

    /// Aggregate per-file results. The run fails if any file failed.
    pub fn aggregate(network: &str, results: Vec<FileValidationResult>) -> Self {
        let passed = results.iter().filter(|r| r.is_passed()).count();
        let failed_files: Vec<String> = results
            .iter()
            .filter(|r| !r.is_passed())
            .map(|r| r.file.clone())
            .collect();

        let (status, message) = if failed_files.is_empty() {
            (RunStatus::Passed, format!("Validated {} files", passed))
        } else {
            (
                RunStatus::Failed,
                format!(
                    "Validation failed. {} passed, {} failed",
                    passed,
                    failed_files.len()
                ),
            )
        };

        Self {
            status,
            message,
            files_validated: passed,
            network_validated: network.to_string(),
            results,
            failed_files,
        }
    }

    /// One-line summary for CI logs.
    pub fn summary_line(&self) -> String {
        format!(
            "Status: {}, Network: {}, Files: {}, Message: {}",
            self.status, self.network_validated, self.files_validated, self.message
        )
    }
}
