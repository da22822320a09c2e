//! Resolve command implementation
//!
//! Prints the configuration that would govern a server start, resolved
//! from the current process environment. Useful for inspecting a
//! container's variable layering without starting anything.

use crate::cli::OutputFormat;
use anyhow::Result;
use crowd_entrypoint_core::errors::EntrypointError;
use crowd_entrypoint_core::resolver::{EnvSnapshot, ResolvedConfig};

/// Execute the resolve command
pub fn execute_resolve(output: OutputFormat) -> Result<()> {
    let env = EnvSnapshot::from_process();
    let config = ResolvedConfig::resolve(&env).map_err(EntrypointError::from)?;

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
        OutputFormat::Text => print_text(&config),
    }

    Ok(())
}

fn print_text(config: &ResolvedConfig) {
    println!("Management port:     {}", config.mgmt_port);
    println!("Connector port:      {}", config.connector_port);
    println!("Max threads:         {}", config.max_threads);
    println!("Min spare threads:   {}", config.min_spare_threads);
    println!("Connection timeout:  {}", config.connection_timeout_ms);
    println!("Enable lookups:      {}", config.enable_lookups);
    println!("Protocol:            {}", config.protocol);
    println!("Accept count:        {}", config.accept_count);
    println!("Secure:              {}", config.secure);
    println!("Scheme:              {}", config.scheme);
    println!("Proxy name:          {}", config.proxy_name);
    println!("Proxy port:          {}", config.proxy_port);
    println!("Max HTTP header:     {}", config.max_http_header_size);
    println!("Context path:        {}", config.context_path);
    println!("Access log:          {}", config.access_log_enabled);
    println!("Access log max days: {}", config.access_log_max_days);
    println!("Internal proxies:    {}", config.internal_proxies);
    println!("Home directory:      {}", config.home_directory);
}
