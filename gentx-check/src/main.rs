use clap::Parser;
use gentx_check::cli;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = cli::Cli::parse();

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // RUST_LOG wins over the configured level. Logs go to stderr so stdout
    // carries only the report.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create Tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    let code = rt.block_on(async {
        match cli::run(cli, config).await {
            Ok(status) if status.is_success() => 0,
            Ok(_) => 1,
            Err(e) => {
                tracing::error!("Fatal error: {}", e);
                1
            }
        }
    });
    std::process::exit(code);
}
