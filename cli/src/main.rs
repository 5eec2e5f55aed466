//! # Modhost Main Entry Point
//!
//! File: cli/src/main.rs
//!
//! ## Overview
//!
//! The `modhost` binary: sets up logging, boots an `AppHost` over the default
//! config locations and runs the process arguments against it.
//!
//! ## Examples
//!
//! ```bash
//! # Logo and usage hint
//! modhost
//!
//! # Get help, for the host or any command
//! modhost --help
//! modhost module --help
//!
//! # Persist a module and inspect the result
//! modhost module --add ./my-module
//! RUST_LOG=debug modhost who
//! ```
//!
//! Config locations, highest priority first: `$MODHOST_CONFIG`, the current
//! directory, the user config directory. The file name is `.modhostrc`.
//!
use modhost::core::app::{AppHost, HostOptions, RunStatus};
use modhost::core::config::{default_locations, CONFIG_FILE_NAME};
use modhost::core::module::EntryCatalog;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let args: Vec<String> = std::env::args_os()
        .skip(1)
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    tracing::debug!("Process arguments: {:?}", args);

    let cwd = std::env::current_dir()?;
    let options = HostOptions {
        app_name: Some(clap::crate_name!().to_string()),
        app_version: Some(clap::crate_version!().to_string()),
        ..HostOptions::default()
    };

    let mut host = match AppHost::new(default_locations(&cwd), CONFIG_FILE_NAME, options, EntryCatalog::new()) {
        Ok(host) => host,
        Err(e) => {
            tracing::error!("Host failed to start: {:?}", e);
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    if host.run(&args)? == RunStatus::Failed {
        std::process::exit(RunStatus::Failed.exit_code());
    }

    Ok(())
}
