use std::path::{Path, PathBuf};
use std::time::Duration;

use gentx_types::constants;
use gentx_types::fee::MinimumFee;
use serde::{Deserialize, Serialize};

use crate::error::CheckError;

/// How candidate files are driven through the daemon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationMode {
    /// Fee-check everything, then one collect/validate/start cycle over all files.
    #[default]
    Batch,
    /// One full collect/validate/start cycle per file.
    PerFile,
}

impl ValidationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationMode::Batch => "batch",
            ValidationMode::PerFile => "per-file",
        }
    }
}

/// Immutable settings for a validation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Network label reported in results, e.g. "mainnet".
    #[serde(default = "default_network")]
    pub network: String,
    /// Chain identifier written into the client configuration.
    #[serde(default = "default_chain_id")]
    pub chain_id: String,
    #[serde(default)]
    pub mode: ValidationMode,
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub fee: FeeConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_network() -> String {
    constants::DEFAULT_NETWORK.to_string()
}

fn default_chain_id() -> String {
    constants::DEFAULT_CHAIN_ID.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Daemon executable, looked up on PATH when not absolute.
    pub binary: PathBuf,
    /// Daemon home directory; this is the validation workspace.
    pub home: PathBuf,
    /// Moniker for `init` when no client config exists yet.
    pub moniker: String,
    /// Parent subcommand of `collect-gentxs` / `validate-genesis`.
    /// Empty for daemons that expose them at the top level.
    pub genesis_subcommand: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(constants::DEFAULT_DAEMON_BINARY),
            home: PathBuf::from(constants::DEFAULT_DAEMON_HOME),
            moniker: constants::DEFAULT_MONIKER.to_string(),
            genesis_subcommand: constants::DEFAULT_GENESIS_SUBCOMMAND.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// Seed genesis copied into the workspace.
    pub seed_genesis: PathBuf,
    /// Append-only log of all daemon output.
    pub log_file: PathBuf,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            seed_genesis: PathBuf::from(constants::DEFAULT_SEED_GENESIS),
            log_file: PathBuf::from(constants::DEFAULT_LOG_FILE),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeConfig {
    /// Minimum fee amount as a decimal string.
    pub min_amount: MinimumFee,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub poll_interval_ms: u64,
    pub timeout_ms: u64,
    pub panic_grace_ms: u64,
    pub settle_ms: u64,
    pub panic_context_lines: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: constants::DEFAULT_POLL_INTERVAL_MS,
            timeout_ms: constants::DEFAULT_TIMEOUT_MS,
            panic_grace_ms: constants::DEFAULT_PANIC_GRACE_MS,
            settle_ms: constants::DEFAULT_SETTLE_MS,
            panic_context_lines: constants::DEFAULT_PANIC_CONTEXT_LINES,
        }
    }
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn panic_grace(&self) -> Duration {
        Duration::from_millis(self.panic_grace_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Number of health checks expected over the full window.
    pub fn expected_checks(&self) -> u64 {
        self.timeout_ms / self.poll_interval_ms.max(1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub tail_lines: usize,
    pub panic_tail_lines: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            tail_lines: constants::DEFAULT_TAIL_LINES,
            panic_tail_lines: constants::DEFAULT_PANIC_TAIL_LINES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            chain_id: default_chain_id(),
            mode: ValidationMode::default(),
            daemon: DaemonConfig::default(),
            files: FilesConfig::default(),
            fee: FeeConfig::default(),
            monitor: MonitorConfig::default(),
            report: ReportConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl CheckConfig {
    /// Load configuration from a TOML file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self, CheckError> {
        let contents = std::fs::read_to_string(path).map_err(|e| CheckError::Config {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        let config: CheckConfig = toml::from_str(&contents).map_err(|e| CheckError::Config {
            reason: format!("failed to parse config file '{}': {}", path.display(), e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), CheckError> {
        if self.monitor.poll_interval_ms == 0 {
            return Err(CheckError::Config {
                reason: "monitor.poll_interval_ms must be greater than zero".to_string(),
            });
        }
        if self.chain_id.trim().is_empty() {
            return Err(CheckError::Config {
                reason: "chain_id must not be empty".to_string(),
            });
        }
        if self.daemon.binary.as_os_str().is_empty() {
            return Err(CheckError::Config {
                reason: "daemon.binary must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
