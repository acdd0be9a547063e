#![cfg_attr(not(test), deny(clippy::unwrap_used))]

use std::io::{self, BufWriter};
use std::process::ExitCode;

use toydb::Table;
use toydb::config::ShellConfig;
use toydb::shell::Shell;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "toydb=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = match ShellConfig::from_args_and_env(std::env::args()) {
        Ok(config) => config,
        Err(e) => {
            println!("{e}");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        "Loaded configuration: database_path={}, max_pages={}",
        config.database_path.display(),
        config.table.max_pages
    );

    let table = match Table::open_with_config(&config.database_path, &config.table) {
        Ok(table) => table,
        Err(e) => {
            tracing::error!("Failed to open table: {e}");
            println!("Unable to open file: {e}");
            return ExitCode::FAILURE;
        }
    };

    let stdin = io::stdin();
    let stdout = BufWriter::new(io::stdout());
    if let Err(e) = Shell::new(table).run(stdin.lock(), stdout) {
        tracing::error!("Shell error: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
