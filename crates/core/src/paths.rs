//! Install tree layout
//!
//! The entrypoint writes its rendered config files into a fixed layout under
//! a single install root. This module keeps all of those path conventions in
//! one place, together with the application-standard data home used when no
//! home directory is configured.

use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Default install root inside the container image
pub const DEFAULT_INSTALL_DIR: &str = "/opt/atlassian/crowd";

/// Application-standard data directory used when `CROWD_HOME` is unset
pub const DEFAULT_HOME_DIR: &str = "/var/atlassian/application-data/crowd";

/// Fixed file-name prefix of the Tomcat access log
pub const ACCESS_LOG_PREFIX: &str = "crowd_access";

/// File locations under one install root
#[derive(Debug, Clone)]
pub struct InstallLayout {
    install_dir: PathBuf,
}

impl InstallLayout {
    pub fn new(install_dir: impl Into<PathBuf>) -> Self {
        Self {
            install_dir: install_dir.into(),
        }
    }

    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    /// Destination of the rendered server configuration document
    pub fn server_xml_path(&self) -> PathBuf {
        self.install_dir.join("apache-tomcat/conf/server.xml")
    }

    /// Destination of the rendered init properties document
    pub fn init_properties_path(&self) -> PathBuf {
        self.install_dir
            .join("crowd-webapp/WEB-INF/classes/crowd-init.properties")
    }

    /// Directory where the server writes its logs
    pub fn log_dir(&self) -> PathBuf {
        self.install_dir.join("apache-tomcat/logs")
    }

    /// Access log file for a given date
    ///
    /// The server rotates its access log daily and embeds the date in the
    /// file name, e.g. `crowd_access.2026-08-07.log`.
    pub fn access_log_path(&self, date: NaiveDate) -> PathBuf {
        self.log_dir()
            .join(format!("{}.{}.log", ACCESS_LOG_PREFIX, date.format("%Y-%m-%d")))
    }

    /// Command line that starts the server in the foreground
    pub fn default_start_command(&self) -> String {
        self.install_dir
            .join("apache-tomcat/bin/catalina.sh")
            .display()
            .to_string()
            + " run"
    }
}

impl Default for InstallLayout {
    fn default() -> Self {
        Self::new(DEFAULT_INSTALL_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_paths() {
        let layout = InstallLayout::default();
        assert_eq!(
            layout.server_xml_path(),
            PathBuf::from("/opt/atlassian/crowd/apache-tomcat/conf/server.xml")
        );
        assert_eq!(
            layout.init_properties_path(),
            PathBuf::from("/opt/atlassian/crowd/crowd-webapp/WEB-INF/classes/crowd-init.properties")
        );
    }

    #[test]
    fn test_access_log_path_embeds_date() {
        let layout = InstallLayout::new("/opt/app");
        let date = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        assert_eq!(
            layout.access_log_path(date),
            PathBuf::from("/opt/app/apache-tomcat/logs/crowd_access.2026-08-07.log")
        );
    }

    #[test]
    fn test_default_start_command() {
        let layout = InstallLayout::new("/opt/app");
        assert_eq!(
            layout.default_start_command(),
            "/opt/app/apache-tomcat/bin/catalina.sh run"
        );
    }
}
