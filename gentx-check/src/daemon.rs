use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::DaemonConfig;

/// A fully specified invocation of an external program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl DaemonCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn to_command(&self) -> tokio::process::Command {
        let mut command = tokio::process::Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

impl fmt::Display for DaemonCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Command-line surface of the chain daemon. Every subcommand is scoped to
/// the workspace home directory.
#[derive(Debug, Clone)]
pub struct Daemon {
    binary: PathBuf,
    home: PathBuf,
    genesis_subcommand: String,
}

impl Daemon {
    pub fn new(config: &DaemonConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            home: config.home.clone(),
            genesis_subcommand: config.genesis_subcommand.clone(),
        }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    fn command(&self) -> DaemonCommand {
        DaemonCommand::new(&self.binary)
    }

    fn genesis_command(&self, name: &str) -> DaemonCommand {
        let mut cmd = self.command();
        if !self.genesis_subcommand.is_empty() {
            cmd = cmd.arg(&self.genesis_subcommand);
        }
        cmd.arg(name).arg("--home").arg(&self.home)
    }

    /// `init <moniker> --home <home> --chain-id <chain-id>`
    pub fn init(&self, moniker: &str, chain_id: &str) -> DaemonCommand {
        self.command()
            .arg("init")
            .arg(moniker)
            .arg("--home")
            .arg(&self.home)
            .arg("--chain-id")
            .arg(chain_id)
    }

    pub fn collect_gentxs(&self) -> DaemonCommand {
        self.genesis_command("collect-gentxs")
    }

    pub fn validate_genesis(&self) -> DaemonCommand {
        self.genesis_command("validate-genesis")
    }

    pub fn start(&self) -> DaemonCommand {
        self.command().arg("start").arg("--home").arg(&self.home)
    }
}
