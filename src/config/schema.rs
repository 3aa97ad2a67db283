//! KDL schema for config.kdl.
//!
//! ```kdl
//! host "127.0.0.1"
//! port 3030
//! data-dir "/var/lib/clarity"
//! server-url "http://127.0.0.1:3030"
//! log-level "info"
//! ```
//!
//! Every node is optional. Unknown nodes are ignored.

use std::path::{Path, PathBuf};

use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};

use crate::{Error, Result};

/// Log levels accepted by `log-level`.
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Settings stored in config.kdl.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClarityConfig {
    /// Address the server binds to
    pub host: Option<String>,

    /// Port the server listens on
    pub port: Option<u16>,

    /// Directory holding board.db
    pub data_dir: Option<PathBuf>,

    /// Server the CLI talks to
    pub server_url: Option<String>,

    /// Log filter used when `RUST_LOG` is unset
    pub log_level: Option<String>,
}

fn first_string<'a>(doc: &'a KdlDocument, name: &str) -> Option<&'a str> {
    doc.get(name)?.entries().first()?.value().as_string()
}

fn string_node(name: &str, value: &str) -> KdlNode {
    let mut node = KdlNode::new(name);
    node.push(KdlEntry::new(KdlValue::String(value.to_string())));
    node
}

impl ClarityConfig {
    /// Create an empty config with no values set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the config values.
    ///
    /// Returns an error message if any value is invalid.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.port == Some(0) {
            return Err("port must be 1-65535, got 0".to_string());
        }
        if let Some(ref url) = self.server_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(format!(
                    "server-url must start with http:// or https://, got {}",
                    url
                ));
            }
        }
        if let Some(ref level) = self.log_level {
            if !LOG_LEVELS.contains(&level.as_str()) {
                return Err(format!(
                    "log-level must be one of {}, got {}",
                    LOG_LEVELS.join(", "),
                    level
                ));
            }
        }
        Ok(())
    }

    /// Parse config from a KDL document.
    pub fn from_kdl(doc: &KdlDocument) -> Self {
        let mut config = Self::new();

        config.host = first_string(doc, "host").map(str::to_string);

        if let Some(node) = doc.get("port") {
            if let Some(entry) = node.entries().first() {
                if let Some(i) = entry.value().as_integer() {
                    config.port = u16::try_from(i).ok();
                }
            }
        }

        config.data_dir = first_string(doc, "data-dir").map(PathBuf::from);
        config.server_url = first_string(doc, "server-url").map(str::to_string);
        config.log_level = first_string(doc, "log-level").map(|s| s.to_lowercase());

        config
    }

    /// Convert config to a KDL document.
    pub fn to_kdl(&self) -> KdlDocument {
        let mut doc = KdlDocument::new();

        if let Some(ref host) = self.host {
            doc.nodes_mut().push(string_node("host", host));
        }

        if let Some(port) = self.port {
            let mut node = KdlNode::new("port");
            node.push(KdlEntry::new(KdlValue::Integer(port as i128)));
            doc.nodes_mut().push(node);
        }

        if let Some(ref dir) = self.data_dir {
            doc.nodes_mut()
                .push(string_node("data-dir", &dir.display().to_string()));
        }

        if let Some(ref url) = self.server_url {
            doc.nodes_mut().push(string_node("server-url", url));
        }

        if let Some(ref level) = self.log_level {
            doc.nodes_mut().push(string_node("log-level", level));
        }

        doc
    }

    /// Load and validate config.kdl. A missing file is an empty config.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = std::fs::read_to_string(path)?;
        let doc: KdlDocument = content
            .parse()
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

        let config = Self::from_kdl(&doc);
        config
            .validate()
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }
}
