//! CLI argument parsing and dispatch

use crate::commands;
use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format options
#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    Text,
    /// JSON structured format
    Json,
}

/// Log format options
#[derive(Debug, Clone, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    Text,
    /// JSON structured format
    Json,
}

impl LogFormat {
    fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
        }
    }
}

/// Container entrypoint for a Crowd server: resolves the runtime
/// configuration from the environment, renders the server's config files,
/// and supervises the server process
#[derive(Debug, Parser)]
#[command(name = "crowd-entrypoint", version)]
pub struct Cli {
    /// Log format (text or json, can be set via CROWD_ENTRYPOINT_LOG_FORMAT)
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Entrypoint subcommands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Resolve the runtime configuration from the environment and print it
    Resolve {
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Render server.xml and crowd-init.properties into the install tree
    Render {
        /// Install root to write into
        #[arg(long, value_name = "PATH")]
        install_dir: Option<PathBuf>,

        /// Print the rendered documents instead of writing them
        #[arg(long)]
        dry_run: bool,
    },

    /// Render the configuration, start the server, and supervise it
    Run {
        /// Install root to write into
        #[arg(long, value_name = "PATH")]
        install_dir: Option<PathBuf>,

        /// Server start command (defaults to catalina.sh run under the
        /// install root)
        #[arg(long, value_name = "CMD")]
        command: Option<String>,

        /// Maximum seconds to wait for the startup marker
        #[arg(long, default_value_t = 300)]
        startup_timeout: u64,

        /// Maximum seconds to wait for the termination marker once shutdown
        /// has begun
        #[arg(long, default_value_t = 60)]
        shutdown_timeout: u64,
    },
}

impl Cli {
    pub async fn dispatch(self) -> Result<()> {
        crowd_entrypoint_core::logging::init(self.log_format.as_ref().map(LogFormat::as_str))?;

        match self.command {
            Commands::Resolve { output } => commands::execute_resolve(output),
            Commands::Render {
                install_dir,
                dry_run,
            } => commands::execute_render(commands::RenderArgs {
                install_dir,
                dry_run,
            }),
            Commands::Run {
                install_dir,
                command,
                startup_timeout,
                shutdown_timeout,
            } => {
                commands::execute_run(commands::RunArgs {
                    install_dir,
                    command,
                    startup_timeout,
                    shutdown_timeout,
                })
                .await
            }
        }
    }
}
