//! Multi-stage validation of gentx files against the chain daemon.
//!
//! Setup runs once per run. After that each mode walks the same stage order:
//! fee check, staging, `collect-gentxs`, `validate-genesis`, then a supervised
//! node start. Batch mode does this once for all files, per-file mode once
//! per file with a workspace reset in between.

use std::path::{Path, PathBuf};

use gentx_types::fee::{CheckedFee, FeeValidator};
use gentx_types::gentx::GentxDocument;
use gentx_types::result::{FileValidationResult, RunResult};

use crate::config::{CheckConfig, ValidationMode};
use crate::daemon::Daemon;
use crate::discovery::discover;
use crate::error::{CheckError, Stage};
use crate::log_sink::{LogSink, LogTail};
use crate::monitor::NodeHealthMonitor;
use crate::runner::ProcessRunner;
use crate::workspace::Workspace;

const SUCCESS_MESSAGE: &str = "Validation successful";

/// Display name of a gentx file in results.
pub fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub struct ValidationPipeline {
    config: CheckConfig,
    daemon: Daemon,
    workspace: Workspace,
    sink: LogSink,
    runner: ProcessRunner,
    fees: FeeValidator,
}

impl ValidationPipeline {
    pub fn new(config: CheckConfig) -> Result<Self, CheckError> {
        config.validate()?;
        let daemon = Daemon::new(&config.daemon);
        let workspace = Workspace::new(&config.daemon.home);
        let sink = LogSink::new(&config.files.log_file);
        let runner = ProcessRunner::new(sink.clone());
        let fees = FeeValidator::new(config.fee.min_amount.clone());
        Ok(Self {
            config,
            daemon,
            workspace,
            sink,
            runner,
            fees,
        })
    }

    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    pub fn sink(&self) -> &LogSink {
        &self.sink
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Validate the gentx file or directory of gentx files at `path`.
    ///
    /// Per-file failures are reported in the result. `Err` means the run could
    /// not proceed at all: nothing to discover, or a setup stage failed.
    pub async fn run(&self, path: &Path) -> Result<RunResult, CheckError> {
        let files = discover(path)?;
        self.run_files(&files).await
    }

    pub async fn run_files(&self, files: &[PathBuf]) -> Result<RunResult, CheckError> {
        let network = self.config.network.as_str();
        if files.is_empty() {
            tracing::info!(network, "no gentx files found to validate");
            return Ok(RunResult::no_files(network));
        }

        tracing::info!(
            network,
            chain_id = %self.config.chain_id,
            mode = ?self.config.mode,
            files = files.len(),
            "starting gentx validation"
        );

        self.setup().await?;

        let results = match self.config.mode {
            ValidationMode::Batch => self.run_batch(files).await,
            ValidationMode::PerFile => self.run_per_file(files).await?,
        };

        let result = RunResult::aggregate(network, results);
        tracing::info!(status = %result.status, "{}", result.message);
        Ok(result)
    }

    /// Last lines of the shared log for the final report.
    pub fn log_tail(&self) -> Result<LogTail, CheckError> {
        self.sink.tail(
            self.config.report.tail_lines,
            self.config.report.panic_tail_lines,
        )
    }

    async fn setup(&self) -> Result<(), CheckError> {
        tracing::info!(home = %self.workspace.home().display(), "preparing validation workspace");
        let init = self
            .daemon
            .init(&self.config.daemon.moniker, &self.config.chain_id);
        self.workspace
            .prepare(
                &self.config.files.seed_genesis,
                &self.config.chain_id,
                &init,
                &self.runner,
            )
            .await
    }

    async fn run_batch(&self, files: &[PathBuf]) -> Vec<FileValidationResult> {
        tracing::info!("step 1/5: checking fees for {} files", files.len());
        let checks: Vec<(String, Result<CheckedFee, CheckError>)> = files
            .iter()
            .map(|file| (file_label(file), self.check_fee(file)))
            .collect();

        let offenders = checks.iter().filter(|(_, r)| r.is_err()).count();
        if offenders > 0 {
            tracing::error!(offenders, "fee check failed, aborting batch");
            let aborted = format!("batch aborted: fee check failed for {} file(s)", offenders);
            return checks
                .into_iter()
                .map(|(label, check)| match check {
                    Ok(_) => FileValidationResult::failed(label, aborted.clone()),
                    Err(e) => FileValidationResult::failed(label, e.to_string()),
                })
                .collect();
        }

        tracing::info!("step 2/5: staging {} gentx files", files.len());
        let outcome = match self.stage_all(files) {
            Ok(()) => self.daemon_cycle().await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => checks
                .into_iter()
                .map(|(label, _)| FileValidationResult::passed(label, SUCCESS_MESSAGE))
                .collect(),
            Err(e) => {
                tracing::error!("batch validation failed: {}", e);
                let message = e.to_string();
                checks
                    .into_iter()
                    .map(|(label, _)| FileValidationResult::failed(label, message.clone()))
                    .collect()
            }
        }
    }

    async fn run_per_file(
        &self,
        files: &[PathBuf],
    ) -> Result<Vec<FileValidationResult>, CheckError> {
        let mut results = Vec::with_capacity(files.len());
        for (i, file) in files.iter().enumerate() {
            let label = file_label(file);
            tracing::info!(file = %label, "validating file {}/{}", i + 1, files.len());

            if i > 0 {
                self.workspace
                    .reset_for_next_file(&self.config.files.seed_genesis)
                    .map_err(|e| e.in_stage(Stage::ResetWorkspace))?;
            }

            let result = match self.validate_one(file).await {
                Ok(()) => {
                    tracing::info!(file = %label, "gentx passed");
                    FileValidationResult::passed(label, SUCCESS_MESSAGE)
                }
                Err(e) => {
                    tracing::error!(file = %label, "gentx failed: {}", e);
                    FileValidationResult::failed(label, e.to_string())
                }
            };
            results.push(result);
        }
        Ok(results)
    }

    async fn validate_one(&self, file: &Path) -> Result<(), CheckError> {
        tracing::info!("step 1/5: checking fee");
        self.check_fee(file)?;
        tracing::info!("step 2/5: staging gentx");
        self.workspace
            .stage_gentx(file)
            .map_err(|e| e.in_stage(Stage::StageGentx))?;
        self.daemon_cycle().await
    }

    fn check_fee(&self, file: &Path) -> Result<CheckedFee, CheckError> {
        let label = file_label(file);
        let check = || -> Result<CheckedFee, CheckError> {
            let bytes = std::fs::read(file)
                .map_err(|e| CheckError::io(format!("read {}", file.display()), e))?;
            let document = GentxDocument::from_slice(&bytes).map_err(|e| CheckError::Parse {
                path: label.clone(),
                reason: e.to_string(),
            })?;
            self.fees.validate(&document).map_err(|source| CheckError::Fee {
                path: label.clone(),
                source,
            })
        };

        let checked = check().map_err(|e| e.in_stage(Stage::FeeCheck))?;
        tracing::debug!(
            file = %label,
            amount = %checked.amount,
            denom = %checked.denom,
            minimum = %self.fees.minimum(),
            "fee check passed"
        );
        Ok(checked)
    }

    fn stage_all(&self, files: &[PathBuf]) -> Result<(), CheckError> {
        for file in files {
            self.workspace
                .stage_gentx(file)
                .map_err(|e| e.in_stage(Stage::StageGentx))?;
        }
        Ok(())
    }

    /// collect-gentxs, validate-genesis, then supervise a node start.
    async fn daemon_cycle(&self) -> Result<(), CheckError> {
        tracing::info!("step 3/5: collecting gentxs");
        self.runner
            .run(&self.daemon.collect_gentxs())
            .await
            .map_err(|e| e.in_stage(Stage::CollectGentxs))?;

        tracing::info!("step 4/5: validating genesis");
        self.runner
            .run(&self.daemon.validate_genesis())
            .await
            .map_err(|e| e.in_stage(Stage::ValidateGenesis))?;

        tracing::info!(
            "step 5/5: starting node for {}s",
            self.config.monitor.timeout().as_secs()
        );
        let monitor = NodeHealthMonitor::new(self.config.monitor.clone(), self.sink.clone());
        let report = monitor
            .supervise(&self.daemon.start())
            .await
            .map_err(|e| e.in_stage(Stage::NodeStart))?;
        let checks = report
            .outcome
            .into_result()
            .map_err(|e| e.in_stage(Stage::NodeStart))?;
        tracing::info!(checks, elapsed_ms = report.elapsed.as_millis() as u64, "node stayed healthy");
        Ok(())
    }
}
