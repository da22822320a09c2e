//! Atomic config file writing
//!
//! Writes rendered config documents into the install tree. Content is
//! staged in a temp file in the destination directory and renamed over the
//! target, so the destination is overwritten atomically from the caller's
//! perspective: on any failure it is left either absent or at its prior
//! content, never truncated. The temp file handle is released (and the
//! temp file removed) on every exit path.

use crate::errors::WriteError;
use crate::paths::InstallLayout;
use crate::render::RenderedConfig;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, instrument};

/// Write one config file atomically
#[instrument(skip(content), fields(path = %path.display()))]
pub fn write_config_file(path: &Path, content: &str) -> std::result::Result<(), WriteError> {
    let io_error = |source| WriteError::Io {
        path: path.display().to_string(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(io_error)?;

    // Stage in the destination directory so the final rename never crosses
    // a filesystem boundary.
    let mut temp = NamedTempFile::new_in(dir).map_err(io_error)?;
    temp.write_all(content.as_bytes()).map_err(io_error)?;
    temp.persist(path).map_err(|e| WriteError::Persist {
        path: path.display().to_string(),
        source: e.error,
    })?;

    debug!(bytes = content.len(), "Wrote config file");
    Ok(())
}

/// Write both rendered documents into the install tree
pub fn write_rendered(
    layout: &InstallLayout,
    rendered: &RenderedConfig,
) -> std::result::Result<(), WriteError> {
    write_config_file(&layout.server_xml_path(), &rendered.server_xml)?;
    write_config_file(&layout.init_properties_path(), &rendered.init_properties)?;
    Ok(())
}
