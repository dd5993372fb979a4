use std::path::{Path, PathBuf};

use crate::daemon::DaemonCommand;
use crate::error::{CheckError, Stage};
use crate::runner::ProcessRunner;

/// Key rewritten in the client configuration.
pub const CHAIN_ID_KEY: &str = "chain-id";

const PRIV_VALIDATOR_STATE: &str = "priv_validator_state.json";

const INITIAL_PRIV_VALIDATOR_STATE: &str = "{\n  \"height\": \"0\",\n  \"round\": 0,\n  \"step\": 0\n}\n";

/// Point the client configuration at `chain_id`.
///
/// The first line whose trimmed form starts with the key and contains `=` is
/// replaced. Without one, the key is inserted at the first blank line, or at
/// the top when there is no blank line. Every other line keeps its content and
/// position.
pub fn rewrite_chain_id(content: &str, chain_id: &str) -> String {
    let new_line = format!("{} = \"{}\"", CHAIN_ID_KEY, chain_id);
    let mut lines: Vec<&str> = content.split('\n').collect();

    let existing = lines.iter().position(|line| {
        let trimmed = line.trim();
        trimmed.starts_with(CHAIN_ID_KEY) && trimmed.contains('=')
    });

    match existing {
        Some(i) => lines[i] = &new_line,
        None => {
            let at = lines
                .iter()
                .position(|line| line.trim().is_empty())
                .unwrap_or(0);
            lines.insert(at, &new_line);
        }
    }

    lines.join("\n")
}

/// The daemon home directory a run validates in.
#[derive(Debug, Clone)]
pub struct Workspace {
    home: PathBuf,
}

impl Workspace {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn config_dir(&self) -> PathBuf {
        self.home.join("config")
    }

    pub fn gentx_dir(&self) -> PathBuf {
        self.config_dir().join("gentx")
    }

    pub fn client_config_path(&self) -> PathBuf {
        self.config_dir().join("client.toml")
    }

    pub fn genesis_path(&self) -> PathBuf {
        self.config_dir().join("genesis.json")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.home.join("data")
    }

    /// Create the gentx staging directory and its parents. Idempotent.
    pub fn create_dirs(&self) -> Result<(), CheckError> {
        let dir = self.gentx_dir();
        tracing::debug!(dir = %dir.display(), "creating directory");
        std::fs::create_dir_all(&dir)
            .map_err(|e| CheckError::io(format!("create {}", dir.display()), e))
    }

    /// Make sure a client configuration exists and carries `chain_id`.
    ///
    /// A missing file is synthesized by running the daemon's `init`.
    pub async fn configure_client(
        &self,
        chain_id: &str,
        init: &DaemonCommand,
        runner: &ProcessRunner,
    ) -> Result<(), CheckError> {
        let path = self.client_config_path();
        if !path.exists() {
            tracing::info!(
                path = %path.display(),
                "client.toml does not exist, initializing daemon configuration"
            );
            runner.run(init).await?;
            if !path.exists() {
                return Err(CheckError::io(
                    format!("daemon init did not create {}", path.display()),
                    std::io::Error::from(std::io::ErrorKind::NotFound),
                ));
            }
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| CheckError::io(format!("read {}", path.display()), e))?;
        let updated = rewrite_chain_id(&content, chain_id);
        std::fs::write(&path, updated)
            .map_err(|e| CheckError::io(format!("write {}", path.display()), e))?;

        tracing::info!(chain_id, path = %path.display(), "updated client config");
        Ok(())
    }

    /// Copy the seed genesis into the workspace byte-for-byte.
    pub fn install_genesis(&self, seed: &Path) -> Result<u64, CheckError> {
        let dst = self.genesis_path();
        tracing::debug!(src = %seed.display(), dst = %dst.display(), "copying initial genesis");
        std::fs::copy(seed, &dst).map_err(|e| {
            CheckError::io(format!("copy {} to {}", seed.display(), dst.display()), e)
        })
    }

    /// Copy a gentx into the staging directory under its own file name.
    /// An existing file of the same name is overwritten.
    pub fn stage_gentx(&self, file: &Path) -> Result<PathBuf, CheckError> {
        let name = file.file_name().ok_or_else(|| CheckError::Discovery {
            reason: format!("not a file path: {}", file.display()),
        })?;
        let dst = self.gentx_dir().join(name);
        std::fs::copy(file, &dst).map_err(|e| {
            CheckError::io(format!("copy {} to {}", file.display(), dst.display()), e)
        })?;
        tracing::debug!(dst = %dst.display(), "staged gentx");
        Ok(dst)
    }

    /// Remove every staged gentx.
    pub fn clear_staged(&self) -> Result<usize, CheckError> {
        let dir = self.gentx_dir();
        let entries = std::fs::read_dir(&dir)
            .map_err(|e| CheckError::io(format!("read {}", dir.display()), e))?;
        let mut removed = 0;
        for entry in entries {
            let path = entry
                .map_err(|e| CheckError::io(format!("read {}", dir.display()), e))?
                .path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                std::fs::remove_file(&path)
                    .map_err(|e| CheckError::io(format!("remove {}", path.display()), e))?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Drop node state left by a previous start so the next genesis boots
    /// from height zero. The validator signing state is kept but zeroed.
    pub fn reset_node_data(&self) -> Result<(), CheckError> {
        let dir = self.data_dir();
        if !dir.exists() {
            return Ok(());
        }
        let entries = std::fs::read_dir(&dir)
            .map_err(|e| CheckError::io(format!("read {}", dir.display()), e))?;
        for entry in entries {
            let path = entry
                .map_err(|e| CheckError::io(format!("read {}", dir.display()), e))?
                .path();
            let result = if path.file_name().is_some_and(|n| n == PRIV_VALIDATOR_STATE) {
                std::fs::write(&path, INITIAL_PRIV_VALIDATOR_STATE)
            } else if path.is_dir() {
                std::fs::remove_dir_all(&path)
            } else {
                std::fs::remove_file(&path)
            };
            result.map_err(|e| CheckError::io(format!("reset {}", path.display()), e))?;
        }
        Ok(())
    }

    /// Shared preconditions of a run: directories, client config, seed genesis.
    pub async fn prepare(
        &self,
        seed_genesis: &Path,
        chain_id: &str,
        init: &DaemonCommand,
        runner: &ProcessRunner,
    ) -> Result<(), CheckError> {
        self.create_dirs()
            .map_err(|e| e.in_stage(Stage::SetupDirectories))?;
        self.configure_client(chain_id, init, runner)
            .await
            .map_err(|e| e.in_stage(Stage::ClientConfig))?;
        self.install_genesis(seed_genesis)
            .map_err(|e| e.in_stage(Stage::InitialGenesis))?;
        Ok(())
    }

    /// Return the workspace to its prepared state before validating another
    /// file in the same run.
    pub fn reset_for_next_file(&self, seed_genesis: &Path) -> Result<(), CheckError> {
        self.clear_staged()?;
        self.install_genesis(seed_genesis)?;
        self.reset_node_data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_sink::LogSink;

    const CLIENT_TOML: &str = "# This is a TOML config file.\n\
        \n\
        ###############################################################################\n\
        ###                           Client Configuration                            ###\n\
        ###############################################################################\n\
        \n\
        # The network chain ID\n\
        chain-id = \"\"\n\
        # The keyring's backend\n\
        keyring-backend = \"os\"\n\
        output = \"text\"\n";

    #[test]
    fn test_rewrite_existing_chain_id() {
        let out = rewrite_chain_id(CLIENT_TOML, "barra_9191-1");
        let before: Vec<&str> = CLIENT_TOML.split('\n').collect();
        let after: Vec<&str> = out.split('\n').collect();
        assert_eq!(before.len(), after.len());

        let chain_lines: Vec<&&str> = after.iter().filter(|l| l.starts_with("chain-id")).collect();
        assert_eq!(chain_lines, vec![&"chain-id = \"barra_9191-1\""]);

        for (b, a) in before.iter().zip(after.iter()) {
            if !b.starts_with("chain-id") {
                assert_eq!(b, a);
            }
        }
        assert!(out.ends_with('\n'));
    }

    #[test]
    fn test_rewrite_indented_key() {
        let out = rewrite_chain_id("a = 1\n   chain-id=\"old\"\nb = 2", "new");
        assert_eq!(out, "a = 1\nchain-id = \"new\"\nb = 2");
    }

    #[test]
    fn test_rewrite_only_first_match() {
        let out = rewrite_chain_id("chain-id = \"x\"\nchain-id = \"y\"", "z");
        assert_eq!(out, "chain-id = \"z\"\nchain-id = \"y\"");
    }

    #[test]
    fn test_key_without_assignment_is_not_a_match() {
        let out = rewrite_chain_id("# chain-id notes\nchain-id\n\nrest = 1", "z");
        assert_eq!(out, "# chain-id notes\nchain-id\nchain-id = \"z\"\n\nrest = 1");
    }

    #[test]
    fn test_insert_at_first_blank_line() {
        let out = rewrite_chain_id("# header\n\nkeyring-backend = \"os\"", "z");
        assert_eq!(out, "# header\nchain-id = \"z\"\n\nkeyring-backend = \"os\"");
    }

    #[test]
    fn test_insert_at_top_without_blank_line() {
        let out = rewrite_chain_id("a = 1\nb = 2", "z");
        assert_eq!(out, "chain-id = \"z\"\na = 1\nb = 2");
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let once = rewrite_chain_id(CLIENT_TOML, "barra_9191-1");
        let twice = rewrite_chain_id(&once, "barra_9191-1");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_paths() {
        let ws = Workspace::new("/tmp/.warden");
        assert_eq!(ws.gentx_dir(), PathBuf::from("/tmp/.warden/config/gentx"));
        assert_eq!(
            ws.client_config_path(),
            PathBuf::from("/tmp/.warden/config/client.toml")
        );
        assert_eq!(
            ws.genesis_path(),
            PathBuf::from("/tmp/.warden/config/genesis.json")
        );
    }

    #[tokio::test]
    async fn test_prepare_twice_is_byte_identical() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = Workspace::new(tmp.path().join(".warden"));
        let seed = tmp.path().join("init_genesis.json");
        std::fs::write(&seed, b"{\"chain_id\":\"barra_9191-1\",\"app_state\":{}}\n").unwrap();
        ws.create_dirs().unwrap();
        std::fs::write(ws.client_config_path(), CLIENT_TOML).unwrap();

        let runner = ProcessRunner::new(LogSink::new(tmp.path().join("logs.txt")));
        // Never run: the client config already exists.
        let init = DaemonCommand::new("/nonexistent/wardend").arg("init");

        ws.prepare(&seed, "barra_9191-1", &init, &runner).await.unwrap();
        let genesis_1 = std::fs::read(ws.genesis_path()).unwrap();
        let client_1 = std::fs::read(ws.client_config_path()).unwrap();

        ws.prepare(&seed, "barra_9191-1", &init, &runner).await.unwrap();
        let genesis_2 = std::fs::read(ws.genesis_path()).unwrap();
        let client_2 = std::fs::read(ws.client_config_path()).unwrap();

        assert_eq!(genesis_1, std::fs::read(&seed).unwrap());
        assert_eq!(genesis_1, genesis_2);
        assert_eq!(client_1, client_2);
    }

    #[tokio::test]
    async fn test_prepare_missing_seed_is_setup_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = Workspace::new(tmp.path().join(".warden"));
        ws.create_dirs().unwrap();
        std::fs::write(ws.client_config_path(), CLIENT_TOML).unwrap();
        let runner = ProcessRunner::new(LogSink::new(tmp.path().join("logs.txt")));
        let init = DaemonCommand::new("/nonexistent/wardend");

        let err = ws
            .prepare(&tmp.path().join("missing.json"), "x", &init, &runner)
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Some(Stage::InitialGenesis));
        assert!(err.is_setup_failure());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_missing_client_config_runs_init() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = Workspace::new(tmp.path().join(".warden"));
        ws.create_dirs().unwrap();
        let runner = ProcessRunner::new(LogSink::new(tmp.path().join("logs.txt")));
        let script = format!(
            "printf '# client\\n\\nkeyring-backend = \"os\"\\n' > '{}'",
            ws.client_config_path().display()
        );
        let init = DaemonCommand::new("sh").arg("-c").arg(script);

        ws.configure_client("barra_9191-1", &init, &runner)
            .await
            .unwrap();
        let content = std::fs::read_to_string(ws.client_config_path()).unwrap();
        assert_eq!(
            content,
            "# client\nchain-id = \"barra_9191-1\"\n\nkeyring-backend = \"os\"\n"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_init_that_creates_nothing_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = Workspace::new(tmp.path().join(".warden"));
        ws.create_dirs().unwrap();
        let runner = ProcessRunner::new(LogSink::new(tmp.path().join("logs.txt")));
        let init = DaemonCommand::new("sh").arg("-c").arg("true");
        let err = ws.configure_client("x", &init, &runner).await.unwrap_err();
        assert!(matches!(err, CheckError::Io { .. }));
    }

    #[test]
    fn test_stage_overwrites_same_name() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = Workspace::new(tmp.path().join(".warden"));
        ws.create_dirs().unwrap();

        let a = tmp.path().join("a");
        let b = tmp.path().join("b");
        std::fs::create_dir_all(&a).unwrap();
        std::fs::create_dir_all(&b).unwrap();
        std::fs::write(a.join("gentx-v1.json"), "first").unwrap();
        std::fs::write(b.join("gentx-v1.json"), "second").unwrap();

        ws.stage_gentx(&a.join("gentx-v1.json")).unwrap();
        let dst = ws.stage_gentx(&b.join("gentx-v1.json")).unwrap();
        assert_eq!(std::fs::read_to_string(dst).unwrap(), "second");
        assert_eq!(std::fs::read_dir(ws.gentx_dir()).unwrap().count(), 1);
    }

    #[test]
    fn test_reset_for_next_file() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = Workspace::new(tmp.path().join(".warden"));
        ws.create_dirs().unwrap();
        let seed = tmp.path().join("init_genesis.json");
        std::fs::write(&seed, "seed").unwrap();

        std::fs::write(ws.gentx_dir().join("one.json"), "{}").unwrap();
        std::fs::write(ws.gentx_dir().join("notes.txt"), "keep").unwrap();
        std::fs::write(ws.genesis_path(), "collected").unwrap();
        let data = ws.data_dir();
        std::fs::create_dir_all(data.join("blockstore.db")).unwrap();
        std::fs::write(data.join(PRIV_VALIDATOR_STATE), "{\"height\":\"12\"}").unwrap();

        ws.reset_for_next_file(&seed).unwrap();

        assert!(!ws.gentx_dir().join("one.json").exists());
        assert!(ws.gentx_dir().join("notes.txt").exists());
        assert_eq!(std::fs::read_to_string(ws.genesis_path()).unwrap(), "seed");
        assert!(!data.join("blockstore.db").exists());
        let state = std::fs::read_to_string(data.join(PRIV_VALIDATOR_STATE)).unwrap();
        assert!(state.contains("\"height\": \"0\""));
    }
}
