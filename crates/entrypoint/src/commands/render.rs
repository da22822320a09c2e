//! Render command implementation
//!
//! Resolves the configuration and writes both rendered documents into the
//! install tree, or prints them with `--dry-run`. A resolution failure
//! aborts before any file is touched.

use anyhow::Result;
use crowd_entrypoint_core::errors::EntrypointError;
use crowd_entrypoint_core::paths::InstallLayout;
use crowd_entrypoint_core::render::render;
use crowd_entrypoint_core::resolver::{EnvSnapshot, ResolvedConfig};
use crowd_entrypoint_core::writer::write_rendered;
use std::path::PathBuf;
use tracing::info;

/// Render command arguments
#[derive(Debug, Clone)]
pub struct RenderArgs {
    pub install_dir: Option<PathBuf>,
    pub dry_run: bool,
}

/// Execute the render command
pub fn execute_render(args: RenderArgs) -> Result<()> {
    let layout = args
        .install_dir
        .map(InstallLayout::new)
        .unwrap_or_default();

    let env = EnvSnapshot::from_process();
    let config = ResolvedConfig::resolve(&env).map_err(EntrypointError::from)?;
    let rendered = render(&config);

    if args.dry_run {
        println!("# {}", layout.server_xml_path().display());
        print!("{}", rendered.server_xml);
        println!("# {}", layout.init_properties_path().display());
        print!("{}", rendered.init_properties);
        return Ok(());
    }

    write_rendered(&layout, &rendered).map_err(EntrypointError::from)?;
    info!(install_dir = %layout.install_dir().display(), "Config files written");

    Ok(())
}
