//! Environment-driven configuration resolution
//!
//! This module resolves the server's runtime configuration from the process
//! environment. Two variable namespaces are supported simultaneously: the
//! current `ATL_*` names and the legacy `CATALINA_*` names kept for
//! backward compatibility with the older configuration convention. Each
//! setting declares an ordered candidate list of variable names (current
//! namespace first) followed by a static default; the first candidate
//! present in the environment wins.
//!
//! Resolution is total: every field of [`ResolvedConfig`] has a value after
//! [`ResolvedConfig::resolve`] returns. Malformed numeric or boolean values
//! fail fast with a [`ConfigError`] naming the offending variable, before
//! any config file is rendered or written.

use crate::errors::ConfigError;
use crate::paths::DEFAULT_HOME_DIR;
use serde::Serialize;
use std::collections::HashMap;
use std::env;
use tracing::{debug, instrument};

/// Ordered candidate sources per setting, current namespace first.
///
/// Kept as one declarative table so precedence is auditable and testable
/// independent of rendering.
pub mod sources {
    pub const MGMT_PORT: &[&str] = &["ATL_TOMCAT_MGMT_PORT"];
    pub const CONNECTOR_PORT: &[&str] = &["ATL_TOMCAT_PORT"];
    pub const MAX_THREADS: &[&str] = &["ATL_TOMCAT_MAXTHREADS"];
    pub const MIN_SPARE_THREADS: &[&str] = &["ATL_TOMCAT_MINSPARETHREADS"];
    pub const CONNECTION_TIMEOUT: &[&str] = &["ATL_TOMCAT_CONNECTIONTIMEOUT"];
    pub const ENABLE_LOOKUPS: &[&str] = &["ATL_TOMCAT_ENABLELOOKUPS"];
    pub const PROTOCOL: &[&str] = &["ATL_TOMCAT_PROTOCOL"];
    pub const ACCEPT_COUNT: &[&str] = &["ATL_TOMCAT_ACCEPTCOUNT"];
    pub const SECURE: &[&str] = &["ATL_TOMCAT_SECURE", "CATALINA_CONNECTOR_SECURE"];
    pub const SCHEME: &[&str] = &["ATL_TOMCAT_SCHEME", "CATALINA_CONNECTOR_SCHEME"];
    pub const PROXY_NAME: &[&str] = &["ATL_PROXY_NAME", "CATALINA_CONNECTOR_PROXYNAME"];
    pub const PROXY_PORT: &[&str] = &["ATL_PROXY_PORT", "CATALINA_CONNECTOR_PROXYPORT"];
    pub const MAX_HTTP_HEADER_SIZE: &[&str] = &["ATL_TOMCAT_MAXHTTPHEADERSIZE"];
    pub const CONTEXT_PATH: &[&str] = &["ATL_TOMCAT_CONTEXTPATH", "CATALINA_CONTEXT_PATH"];
    pub const ACCESS_LOG: &[&str] = &["ATL_TOMCAT_ACCESS_LOG"];
    pub const ACCESS_LOG_MAX_DAYS: &[&str] = &["ATL_TOMCAT_ACCESS_LOGS_MAXDAYS"];
    pub const INTERNAL_PROXIES: &[&str] = &["ATL_TOMCAT_PROXY_INTERNAL_IPS"];
    pub const HOME_DIRECTORY: &[&str] = &["CROWD_HOME"];
}

/// Tomcat's documented default for the RemoteIpValve `internalProxies`
/// attribute (the RFC 1918 private ranges plus loopback and link-local).
const DEFAULT_INTERNAL_PROXIES: &str = "10\\.\\d{1,3}\\.\\d{1,3}\\.\\d{1,3}|\
192\\.168\\.\\d{1,3}\\.\\d{1,3}|\
169\\.254\\.\\d{1,3}\\.\\d{1,3}|\
127\\.\\d{1,3}\\.\\d{1,3}\\.\\d{1,3}|\
172\\.1[6-9]{1}\\.\\d{1,3}\\.\\d{1,3}|\
172\\.2[0-9]{1}\\.\\d{1,3}\\.\\d{1,3}|\
172\\.3[0-1]{1}\\.\\d{1,3}\\.\\d{1,3}";

/// Immutable snapshot of the process environment
///
/// Resolution reads only the snapshot, never the live process environment,
/// which keeps [`ResolvedConfig::resolve`] a pure function of its input.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the current process environment
    pub fn from_process() -> Self {
        Self {
            vars: env::vars().collect(),
        }
    }

    /// Build a snapshot from explicit key/value pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// First candidate present in the snapshot, with the variable that
    /// supplied it. Unset variables fall through; an empty value counts as
    /// present.
    fn first_of(&self, candidates: &'static [&'static str]) -> Option<(&'static str, &str)> {
        candidates
            .iter()
            .find_map(|key| self.get(key).map(|value| (*key, value)))
    }
}

/// Fully resolved server configuration
///
/// Constructed once per process start and immutable afterwards. Every field
/// carries a concrete value; defaulting is total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedConfig {
    /// Management (shutdown) port on the root server element
    pub mgmt_port: u16,
    /// Network listener port of the main connector
    pub connector_port: u16,
    pub max_threads: u32,
    pub min_spare_threads: u32,
    pub connection_timeout_ms: u32,
    pub enable_lookups: bool,
    /// Fully-qualified protocol handler identifier
    pub protocol: String,
    pub accept_count: u32,
    pub secure: bool,
    pub scheme: String,
    /// Proxy host name; the empty string is a valid value distinct from an
    /// omitted attribute
    pub proxy_name: String,
    pub proxy_port: String,
    pub max_http_header_size: u32,
    pub context_path: String,
    pub access_log_enabled: bool,
    pub access_log_max_days: i32,
    pub internal_proxies: String,
    pub home_directory: String,
}

impl ResolvedConfig {
    /// Resolve the configuration from an environment snapshot
    ///
    /// Never fails for well-formed input; a malformed numeric or boolean
    /// value is a [`ConfigError::InvalidValue`] naming the offending
    /// variable.
    #[instrument(skip_all)]
    pub fn resolve(env: &EnvSnapshot) -> std::result::Result<Self, ConfigError> {
        let config = Self {
            mgmt_port: int_setting(env, sources::MGMT_PORT, 8080u16)?,
            connector_port: int_setting(env, sources::CONNECTOR_PORT, 8095u16)?,
            max_threads: int_setting(env, sources::MAX_THREADS, 150u32)?,
            min_spare_threads: int_setting(env, sources::MIN_SPARE_THREADS, 25u32)?,
            connection_timeout_ms: int_setting(env, sources::CONNECTION_TIMEOUT, 20_000u32)?,
            enable_lookups: bool_setting(env, sources::ENABLE_LOOKUPS, false)?,
            protocol: string_setting(env, sources::PROTOCOL, "HTTP/1.1"),
            accept_count: int_setting(env, sources::ACCEPT_COUNT, 100u32)?,
            secure: bool_setting(env, sources::SECURE, false)?,
            scheme: string_setting(env, sources::SCHEME, "http"),
            proxy_name: string_setting(env, sources::PROXY_NAME, ""),
            proxy_port: string_setting(env, sources::PROXY_PORT, ""),
            max_http_header_size: int_setting(env, sources::MAX_HTTP_HEADER_SIZE, 8192u32)?,
            context_path: string_setting(env, sources::CONTEXT_PATH, ""),
            access_log_enabled: bool_setting(env, sources::ACCESS_LOG, false)?,
            access_log_max_days: int_setting(env, sources::ACCESS_LOG_MAX_DAYS, -1i32)?,
            internal_proxies: string_setting(env, sources::INTERNAL_PROXIES, DEFAULT_INTERNAL_PROXIES),
            home_directory: string_setting(env, sources::HOME_DIRECTORY, DEFAULT_HOME_DIR),
        };

        debug!(
            connector_port = config.connector_port,
            scheme = %config.scheme,
            home_directory = %config.home_directory,
            "Resolved server configuration"
        );

        Ok(config)
    }
}

/// Resolve a string-typed setting
fn string_setting(env: &EnvSnapshot, candidates: &'static [&'static str], default: &str) -> String {
    match env.first_of(candidates) {
        Some((key, value)) => {
            debug!(key, value, "Setting resolved from environment");
            value.to_string()
        }
        None => default.to_string(),
    }
}

/// Resolve a boolean-typed setting
///
/// Accepts exactly the literal strings `true` and `false`, case-sensitively.
fn bool_setting(
    env: &EnvSnapshot,
    candidates: &'static [&'static str],
    default: bool,
) -> std::result::Result<bool, ConfigError> {
    match env.first_of(candidates) {
        Some((_, "true")) => Ok(true),
        Some((_, "false")) => Ok(false),
        Some((key, value)) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            expected: "'true' or 'false'",
        }),
        None => Ok(default),
    }
}

/// Resolve an integer-typed setting
///
/// Values must parse as base-10 integers within the field's range; a
/// leading `-` is accepted only where the field type is signed.
fn int_setting<T>(
    env: &EnvSnapshot,
    candidates: &'static [&'static str],
    default: T,
) -> std::result::Result<T, ConfigError>
where
    T: std::str::FromStr + Copy,
{
    match env.first_of(candidates) {
        Some((key, value)) => {
            let invalid = || ConfigError::InvalidValue {
                key: key.to_string(),
                value: value.to_string(),
                expected: "a base-10 integer",
            };
            // std's parser would also accept a leading `+`; only `-` is valid
            if value.starts_with('+') {
                return Err(invalid());
            }
            value.parse::<T>().map_err(|_| invalid())
        }
        None => Ok(default),
    }
}
