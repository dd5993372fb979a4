use std::fmt;

use thiserror::Error;

/// Pipeline stage an error occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    SetupDirectories,
    ClientConfig,
    InitialGenesis,
    ResetWorkspace,
    FeeCheck,
    StageGentx,
    CollectGentxs,
    ValidateGenesis,
    NodeStart,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::SetupDirectories => "setup directories",
            Stage::ClientConfig => "update client config",
            Stage::InitialGenesis => "copy initial genesis",
            Stage::ResetWorkspace => "reset workspace",
            Stage::FeeCheck => "fee check",
            Stage::StageGentx => "stage gentx",
            Stage::CollectGentxs => "collect gentxs",
            Stage::ValidateGenesis => "validate genesis",
            Stage::NodeStart => "node start",
        }
    }

    /// Shared preconditions of a run. Failing one aborts the whole run.
    pub fn is_setup(&self) -> bool {
        matches!(
            self,
            Stage::SetupDirectories
                | Stage::ClientConfig
                | Stage::InitialGenesis
                | Stage::ResetWorkspace
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while validating gentx files.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("io error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("{path}: {source}")]
    Fee {
        path: String,
        #[source]
        source: gentx_types::error::FeeError,
    },

    #[error("command `{command}` failed with {status}{}", diagnostic_suffix(.diagnostic))]
    Process {
        command: String,
        status: String,
        diagnostic: Option<String>,
    },

    #[error("panic found in log: {line}")]
    Panic {
        line: String,
        line_number: usize,
        context: Vec<String>,
    },

    #[error("node process exited unexpectedly ({status})")]
    ProcessExited { status: String },

    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {reason}")]
    Config { reason: String },

    #[error("discovery error: {reason}")]
    Discovery { reason: String },

    #[error("{stage}: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<CheckError>,
    },
}

fn diagnostic_suffix(diagnostic: &Option<String>) -> String {
    match diagnostic {
        Some(line) => format!(", details: error detected in log: {}", line),
        None => String::new(),
    }
}

impl CheckError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        CheckError::Io {
            context: context.into(),
            source,
        }
    }

    /// Attach the stage the error surfaced in.
    pub fn in_stage(self, stage: Stage) -> Self {
        CheckError::Stage {
            stage,
            source: Box::new(self),
        }
    }

    pub fn stage(&self) -> Option<Stage> {
        match self {
            CheckError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Innermost error, with stage wrappers peeled off.
    pub fn root(&self) -> &CheckError {
        match self {
            CheckError::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether this error must abort the whole run rather than fail one file.
    pub fn is_setup_failure(&self) -> bool {
        self.stage().is_some_and(|s| s.is_setup())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_wrapping_display() {
        let err = CheckError::Process {
            command: "wardend genesis collect-gentxs --home .warden".to_string(),
            status: "exit status: 1".to_string(),
            diagnostic: None,
        }
        .in_stage(Stage::CollectGentxs);
        let msg = err.to_string();
        assert!(msg.starts_with("collect gentxs: command `wardend genesis collect-gentxs"));
        assert!(msg.ends_with("failed with exit status: 1"));
        assert_eq!(err.stage(), Some(Stage::CollectGentxs));
        assert!(!err.is_setup_failure());
    }

    #[test]
    fn test_process_error_with_diagnostic() {
        let err = CheckError::Process {
            command: "wardend start".to_string(),
            status: "exit status: 2".to_string(),
            diagnostic: Some("Error: invalid genesis".to_string()),
        };
        assert!(err
            .to_string()
            .ends_with("details: error detected in log: Error: invalid genesis"));
    }

    #[test]
    fn test_setup_failure_classification() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err =
            CheckError::io("create .warden/config/gentx", io).in_stage(Stage::SetupDirectories);
        assert!(err.is_setup_failure());
        assert!(matches!(err.root(), CheckError::Io { .. }));
    }

    #[test]
    fn test_panic_display() {
        let err = CheckError::Panic {
            line: "panic: runtime error".to_string(),
            line_number: 12,
            context: vec!["panic: runtime error".to_string()],
        };
        assert_eq!(err.to_string(), "panic found in log: panic: runtime error");
    }
}
