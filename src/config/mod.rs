//! Configuration for Clarity.
//!
//! ## config.kdl
//!
//! Located at `~/.config/clarity/config.kdl` unless `CLARITY_CONFIG`
//! names another file. Contains:
//! - `host` / `port` - Server listen address
//! - `data-dir` - Directory holding `board.db`
//! - `server-url` - Server the CLI talks to
//! - `log-level` - Log filter used when `RUST_LOG` is unset
//!
//! Use the [`resolver`] module for precedence resolution.

pub mod resolver;
pub mod schema;

pub use resolver::{
    ConfigOverrides, DEFAULT_LOG_LEVEL, HOST_ENV, LOG_ENV, PORT_ENV, Resolved, ResolvedConfig,
    SERVER_ENV, ValueSource, load_config, resolve_config,
};
pub use schema::{ClarityConfig, LOG_LEVELS};

use std::path::PathBuf;

use crate::{Error, Result};

/// Environment variable naming an alternate config file.
pub const CONFIG_ENV: &str = "CLARITY_CONFIG";

/// Path of config.kdl: `CLARITY_CONFIG`, else `<config_dir>/clarity/config.kdl`.
pub fn config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;

    Ok(config_dir.join("clarity").join("config.kdl"))
}
