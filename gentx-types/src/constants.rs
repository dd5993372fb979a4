// ─── Network ─────────────────────────────────────────────────────────────────

/// Network label reported in run results.
pub const DEFAULT_NETWORK: &str = "mainnet";

/// Chain identifier written into the client configuration.
pub const DEFAULT_CHAIN_ID: &str = "barra_9191-1";

// ─── Daemon ──────────────────────────────────────────────────────────────────

/// Chain daemon executable.
pub const DEFAULT_DAEMON_BINARY: &str = "wardend";

/// Daemon home directory used as the validation workspace.
pub const DEFAULT_DAEMON_HOME: &str = ".warden";

/// Moniker passed to the daemon's `init` subcommand.
pub const DEFAULT_MONIKER: &str = "temp-node";

/// Parent subcommand of `collect-gentxs` and `validate-genesis`.
pub const DEFAULT_GENESIS_SUBCOMMAND: &str = "genesis";

// ─── Files ───────────────────────────────────────────────────────────────────

/// Append-only log accumulating every subprocess' output.
pub const DEFAULT_LOG_FILE: &str = "logs.txt";

/// Seed genesis copied into the workspace before collection.
pub const DEFAULT_SEED_GENESIS: &str = "./init_genesis.json";

/// Extension a gentx candidate must carry.
pub const GENTX_EXTENSION: &str = "json";

// ─── Fees ────────────────────────────────────────────────────────────────────

/// Minimum fee a gentx must carry, in base units of the fee denomination.
pub const DEFAULT_MIN_FEE: &str = "180000000000000000";

// ─── Node Monitor ────────────────────────────────────────────────────────────

/// Interval between health checks of the started node (milliseconds).
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;

/// Observation window a node must survive (milliseconds).
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Wait after a panic is seen so trailing output reaches the log (milliseconds).
pub const DEFAULT_PANIC_GRACE_MS: u64 = 5_000;

/// Wait for the node to exit after a stop request (milliseconds).
pub const DEFAULT_SETTLE_MS: u64 = 1_000;

/// Lines reported after the panic line.
pub const DEFAULT_PANIC_CONTEXT_LINES: usize = 50;

/// Substring marking a fatal runtime panic in daemon output. Case-sensitive.
pub const PANIC_SIGNATURE: &str = "panic:";

/// Lower-case substrings that mark a line as a failure diagnostic.
pub const ERROR_PATTERNS: &[&str] = &[
    "error",
    "failed",
    "fail:",
    "panic:",
    "fatal",
    "invalid",
    "cannot",
    "unable to",
    "permission denied",
    "no such file",
    "connection refused",
];

// ─── Report ──────────────────────────────────────────────────────────────────

/// Log lines shown in the final report.
pub const DEFAULT_TAIL_LINES: usize = 5;

/// Log lines shown in the final report when a panic was observed.
pub const DEFAULT_PANIC_TAIL_LINES: usize = 15;
