//! Run command implementation
//!
//! The main container entrypoint path: render and write the config files,
//! start the server, wait for the readiness marker, then hold while
//! relaying the server log until a termination signal arrives, and finally
//! supervise the shutdown until the termination marker appears.

use anyhow::{bail, Context, Result};
use crowd_entrypoint_core::errors::EntrypointError;
use crowd_entrypoint_core::paths::InstallLayout;
use crowd_entrypoint_core::render::render;
use crowd_entrypoint_core::resolver::{EnvSnapshot, ResolvedConfig};
use crowd_entrypoint_core::supervisor::{ShutdownTrigger, Supervisor};
use crowd_entrypoint_core::writer::write_rendered;
use std::path::PathBuf;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

/// Run command arguments
#[derive(Debug, Clone)]
pub struct RunArgs {
    pub install_dir: Option<PathBuf>,
    pub command: Option<String>,
    pub startup_timeout: u64,
    pub shutdown_timeout: u64,
}

/// Execute the run command
pub async fn execute_run(args: RunArgs) -> Result<()> {
    let layout = args
        .install_dir
        .map(InstallLayout::new)
        .unwrap_or_default();

    // Resolution failures abort startup before any file is written and
    // before any supervision is attempted.
    let env = EnvSnapshot::from_process();
    let config = ResolvedConfig::resolve(&env).map_err(EntrypointError::from)?;
    let rendered = render(&config);
    write_rendered(&layout, &rendered).map_err(EntrypointError::from)?;
    info!(install_dir = %layout.install_dir().display(), "Config files written");

    let command_line = args
        .command
        .unwrap_or_else(|| layout.default_start_command());
    let argv = shell_words::split(&command_line).context("Invalid server command")?;
    let Some((program, program_args)) = argv.split_first() else {
        bail!("Server command is empty");
    };

    let mut supervisor =
        Supervisor::spawn(program, program_args).map_err(EntrypointError::from)?;
    supervisor
        .wait_until_ready(Duration::from_secs(args.startup_timeout))
        .await
        .map_err(EntrypointError::from)?;
    info!("Server startup complete");

    let mut sigterm = signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?;

    tokio::select! {
        _ = sigterm.recv() => info!("SIGTERM received, shutting down"),
        _ = sigint.recv() => info!("SIGINT received, shutting down"),
        result = supervisor.drain_logs() => result.map_err(EntrypointError::from)?,
    }

    supervisor
        .shutdown(
            ShutdownTrigger::Signal,
            Duration::from_secs(args.shutdown_timeout),
        )
        .await
        .map_err(EntrypointError::from)?;

    let status = supervisor.wait_exit().await.map_err(EntrypointError::from)?;
    info!(%status, "Server process exited");

    Ok(())
}
