//! Config file rendering
//!
//! Renders a [`ResolvedConfig`] into the two documents the server consumes
//! at its own startup: the `server.xml` document and the flat
//! `crowd-init.properties` document. Rendering is a pure function of the
//! resolved record with no I/O; the document shape is fixed and only
//! attribute values vary. Booleans render as the literal lowercase strings
//! `true`/`false`, integers as base-10 decimal text, and the empty string
//! as an empty attribute value rather than an omitted attribute.

use crate::paths::ACCESS_LOG_PREFIX;
use crate::resolver::ResolvedConfig;
use tracing::debug;

/// Rendered config file contents, ready for the writer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedConfig {
    /// The server configuration document (`server.xml`)
    pub server_xml: String,
    /// The init properties document (`crowd-init.properties`)
    pub init_properties: String,
}

/// Render both config documents from a resolved configuration
pub fn render(config: &ResolvedConfig) -> RenderedConfig {
    let rendered = RenderedConfig {
        server_xml: render_server_xml(config),
        init_properties: render_init_properties(config),
    };
    debug!(
        server_xml_bytes = rendered.server_xml.len(),
        init_properties_bytes = rendered.init_properties.len(),
        "Rendered config documents"
    );
    rendered
}

fn render_server_xml(config: &ResolvedConfig) -> String {
    let mut xml = String::with_capacity(2048);

    xml.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    xml.push_str(&format!(
        "<Server port=\"{}\" shutdown=\"SHUTDOWN\">\n",
        config.mgmt_port
    ));
    xml.push_str("  <Listener className=\"org.apache.catalina.startup.VersionLoggerListener\"/>\n");
    xml.push_str("  <Service name=\"Catalina\">\n");

    xml.push_str(&format!(
        "    <Connector port=\"{port}\"\n\
         \x20              maxThreads=\"{max_threads}\"\n\
         \x20              minSpareThreads=\"{min_spare_threads}\"\n\
         \x20              connectionTimeout=\"{connection_timeout}\"\n\
         \x20              enableLookups=\"{enable_lookups}\"\n\
         \x20              protocol=\"{protocol}\"\n\
         \x20              acceptCount=\"{accept_count}\"\n\
         \x20              secure=\"{secure}\"\n\
         \x20              scheme=\"{scheme}\"\n\
         \x20              proxyName=\"{proxy_name}\"\n\
         \x20              proxyPort=\"{proxy_port}\"\n\
         \x20              maxHttpHeaderSize=\"{max_http_header_size}\"/>\n",
        port = config.connector_port,
        max_threads = config.max_threads,
        min_spare_threads = config.min_spare_threads,
        connection_timeout = config.connection_timeout_ms,
        enable_lookups = config.enable_lookups,
        protocol = escape_attr(&config.protocol),
        accept_count = config.accept_count,
        secure = config.secure,
        scheme = escape_attr(&config.scheme),
        proxy_name = escape_attr(&config.proxy_name),
        proxy_port = escape_attr(&config.proxy_port),
        max_http_header_size = config.max_http_header_size,
    ));

    xml.push_str("    <Engine name=\"Catalina\" defaultHost=\"localhost\">\n");
    xml.push_str("      <Host name=\"localhost\" appBase=\"webapps\" unpackWARs=\"true\" autoDeploy=\"false\">\n");
    // The effective context-path mechanism is unverified upstream; the
    // attribute is rendered best-effort.
    xml.push_str(&format!(
        "        <Context path=\"{}\" docBase=\"../../crowd-webapp\" debug=\"0\" useHttpOnly=\"true\"/>\n",
        escape_attr(&config.context_path)
    ));
    xml.push_str("      </Host>\n");

    if config.access_log_enabled {
        xml.push_str(&format!(
            "      <Valve className=\"org.apache.catalina.valves.AccessLogValve\"\n\
             \x20            directory=\"logs\"\n\
             \x20            prefix=\"{prefix}\"\n\
             \x20            suffix=\".log\"\n\
             \x20            pattern=\"%h %l %u %t &quot;%r&quot; %s %b\"\n\
             \x20            maxDays=\"{max_days}\"/>\n",
            prefix = ACCESS_LOG_PREFIX,
            max_days = config.access_log_max_days,
        ));
    }

    xml.push_str(&format!(
        "      <Valve className=\"org.apache.catalina.valves.RemoteIpValve\"\n\
         \x20            internalProxies=\"{}\"/>\n",
        escape_attr(&config.internal_proxies)
    ));

    xml.push_str("    </Engine>\n");
    xml.push_str("  </Service>\n");
    xml.push_str("</Server>\n");

    xml
}

fn render_init_properties(config: &ResolvedConfig) -> String {
    format!("crowd.home={}\n", config.home_directory)
}

/// Escape a value for use inside a double-quoted XML attribute
fn escape_attr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
