use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let parsed = cli::Cli::parse();

    // Dispatch to CLI handler and handle special exit codes
    match parsed.dispatch().await {
        Ok(()) => Ok(()),
        Err(err) => {
            // A malformed environment variable aborts startup before any
            // config file is written; exit code 2 distinguishes it from
            // runtime failures.
            if let Some(entrypoint_error) =
                err.downcast_ref::<crowd_entrypoint_core::errors::EntrypointError>()
            {
                if matches!(
                    entrypoint_error,
                    crowd_entrypoint_core::errors::EntrypointError::Config(_)
                ) {
                    eprintln!("Error: {}", entrypoint_error);
                    std::process::exit(2);
                }
            }

            // For all other errors, return them normally
            Err(err)
        }
    }
}
