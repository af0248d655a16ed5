use std::{io, process::ExitCode};

use clap::Parser;
use scripts::{cli::Cli, commands::exit_status};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr, stdout only carries the deployed addresses
    tracing_subscriber::fmt()
        .pretty()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(io::stderr)
        .init();

    let result = cli.run(&mut io::stdout()).await;
    ExitCode::from(exit_status(&result, &mut io::stderr()))
}
