use std::path::PathBuf;

use clap::Parser;
use gentx_types::result::RunStatus;

use crate::config::{CheckConfig, ValidationMode};
use crate::error::CheckError;
use crate::log_sink::LogTail;
use crate::pipeline::ValidationPipeline;
use crate::report;

#[derive(Parser, Debug)]
#[command(
    name = "check-genesis",
    about = "Validate gentx submissions against the chain daemon before they are merged into genesis",
    version
)]
pub struct Cli {
    /// A gentx file or a directory of gentx files
    pub path: PathBuf,
    /// Path to a TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Validate all files in one daemon cycle, or each file on its own
    #[arg(long, value_enum)]
    pub mode: Option<ValidationMode>,
    /// Network label reported in the results
    #[arg(long)]
    pub network: Option<String>,
    /// Chain ID written into the client config
    #[arg(long)]
    pub chain_id: Option<String>,
    /// Chain daemon executable
    #[arg(long)]
    pub daemon: Option<PathBuf>,
    /// Daemon home directory used as the validation workspace
    #[arg(long)]
    pub home: Option<PathBuf>,
    /// Seed genesis copied into the workspace
    #[arg(long)]
    pub genesis: Option<PathBuf>,
    /// File that collects all daemon output
    #[arg(long)]
    pub log_file: Option<PathBuf>,
    /// How long the node must stay up, in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,
    /// Print the run result as JSON instead of the report
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Config file (or defaults) with command-line overrides applied.
    pub fn load_config(&self) -> Result<CheckConfig, CheckError> {
        let mut config = match &self.config {
            Some(path) => CheckConfig::load(path)?,
            None => CheckConfig::default(),
        };

        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(network) = &self.network {
            config.network = network.clone();
        }
        if let Some(chain_id) = &self.chain_id {
            config.chain_id = chain_id.clone();
        }
        if let Some(daemon) = &self.daemon {
            config.daemon.binary = daemon.clone();
        }
        if let Some(home) = &self.home {
            config.daemon.home = home.clone();
        }
        if let Some(genesis) = &self.genesis {
            config.files.seed_genesis = genesis.clone();
        }
        if let Some(log_file) = &self.log_file {
            config.files.log_file = log_file.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.monitor.timeout_ms = secs.saturating_mul(1_000);
        }

        config.validate()?;
        Ok(config)
    }
}

/// Run the validation and render the outcome. The returned status decides
/// the exit code.
///
/// The log tail is always shown when a log exists: after the report, or on
/// stderr when stdout carries JSON.
pub async fn run(cli: Cli, config: CheckConfig) -> Result<RunStatus, CheckError> {
    report::configure_colors();
    if !cli.json {
        report::print_header(&config);
    }

    let pipeline = ValidationPipeline::new(config)?;
    let outcome = pipeline.run(&cli.path).await;

    match (&outcome, cli.json) {
        (Ok(result), true) => {
            let json = serde_json::to_string_pretty(result)
                .map_err(|e| CheckError::io("serialize run result", e.into()))?;
            println!("{}", json);
        }
        (Ok(result), false) => report::print_result(result),
        (Err(e), false) => report::print_fatal(&e.to_string()),
        (Err(_), true) => {}
    }

    if let Some(tail) = log_tail(&pipeline) {
        if cli.json {
            report::eprint_log_tail(&tail);
        } else {
            report::print_log_tail(&tail);
        }
    }

    outcome.map(|result| result.status)
}

fn log_tail(pipeline: &ValidationPipeline) -> Option<LogTail> {
    if !pipeline.sink().path().exists() {
        return None;
    }
    match pipeline.log_tail() {
        Ok(tail) => Some(tail),
        Err(e) => {
            tracing::warn!("could not read log tail: {}", e);
            None
        }
    }
}
