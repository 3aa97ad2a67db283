//! Precedence resolution for configuration.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI flags
//! 2. Environment: `CLARITY_HOST`, `CLARITY_PORT`, `CLARITY_DATA_DIR`,
//!    `CLARITY_SERVER`, `RUST_LOG`
//! 3. config.kdl
//! 4. Built-in defaults

use std::path::{Path, PathBuf};

use crate::{Error, Result};
use crate::client::DEFAULT_SERVER_URL;
use crate::config::ClarityConfig;
use crate::server::{DEFAULT_HOST, DEFAULT_PORT};
use crate::storage::{DATA_DIR_ENV, DB_FILE, data_dir_from_env, default_data_dir};

/// Default log filter.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable overriding the server bind address.
pub const HOST_ENV: &str = "CLARITY_HOST";

/// Environment variable overriding the server port.
pub const PORT_ENV: &str = "CLARITY_PORT";

/// Environment variable overriding the server URL the CLI talks to.
pub const SERVER_ENV: &str = "CLARITY_SERVER";

/// Environment variable holding the tracing filter.
pub const LOG_ENV: &str = "RUST_LOG";

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from environment variable
    EnvVar(String),
    /// Value from config.kdl
    ConfigFile,
    /// Value from CLI flag
    CliFlag,
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::EnvVar(name) => write!(f, "env:{}", name),
            ValueSource::ConfigFile => write!(f, "config"),
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    /// The resolved value
    pub value: T,
    /// Where the value came from
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    /// Create a new resolved value.
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// First present value wins, tagged with its source.
fn pick<T, const N: usize>(layers: [(Option<T>, ValueSource); N], default: T) -> Resolved<T> {
    for (value, source) in layers {
        if let Some(value) = value {
            return Resolved::new(value, source);
        }
    }
    Resolved::new(default, ValueSource::Default)
}

/// Fully resolved configuration with source tracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub host: Resolved<String>,
    pub port: Resolved<u16>,
    pub data_dir: Resolved<PathBuf>,
    pub server_url: Resolved<String>,
    pub log_level: Resolved<String>,
}

impl ResolvedConfig {
    /// Path of the board database.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.value.join(DB_FILE)
    }
}

/// CLI overrides for configuration resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub data_dir: Option<PathBuf>,
    pub server_url: Option<String>,
}

impl ConfigOverrides {
    /// Create empty overrides.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = Some(url.into());
        self
    }
}

/// Non-blank value of an environment variable.
fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_source(name: &str) -> ValueSource {
    ValueSource::EnvVar(name.to_string())
}

/// Resolve configuration against an already loaded config file.
pub fn resolve_config(file: &ClarityConfig, overrides: &ConfigOverrides) -> Result<ResolvedConfig> {
    let env_port = match env_value(PORT_ENV) {
        Some(raw) => match raw.trim().parse::<u16>() {
            Ok(port) if port > 0 => Some(port),
            _ => {
                return Err(Error::Config(format!(
                    "{} must be a port number 1-65535, got {}",
                    PORT_ENV, raw
                )));
            }
        },
        None => None,
    };

    let data_dir = if let Some(ref dir) = overrides.data_dir {
        Resolved::new(dir.clone(), ValueSource::CliFlag)
    } else if let Some(dir) = data_dir_from_env() {
        Resolved::new(dir, ValueSource::EnvVar(DATA_DIR_ENV.to_string()))
    } else if let Some(ref dir) = file.data_dir {
        Resolved::new(dir.clone(), ValueSource::ConfigFile)
    } else {
        Resolved::new(default_data_dir()?, ValueSource::Default)
    };

    Ok(ResolvedConfig {
        host: pick(
            [
                (overrides.host.clone(), ValueSource::CliFlag),
                (env_value(HOST_ENV), env_source(HOST_ENV)),
                (file.host.clone(), ValueSource::ConfigFile),
            ],
            DEFAULT_HOST.to_string(),
        ),
        port: pick(
            [
                (overrides.port, ValueSource::CliFlag),
                (env_port, env_source(PORT_ENV)),
                (file.port, ValueSource::ConfigFile),
            ],
            DEFAULT_PORT,
        ),
        data_dir,
        server_url: pick(
            [
                (overrides.server_url.clone(), ValueSource::CliFlag),
                (env_value(SERVER_ENV), env_source(SERVER_ENV)),
                (file.server_url.clone(), ValueSource::ConfigFile),
            ],
            DEFAULT_SERVER_URL.to_string(),
        ),
        log_level: pick(
            [
                (env_value(LOG_ENV), env_source(LOG_ENV)),
                (file.log_level.clone(), ValueSource::ConfigFile),
            ],
            DEFAULT_LOG_LEVEL.to_string(),
        ),
    })
}

/// Load config.kdl from `path` and resolve it.
pub fn load_config(path: &Path, overrides: &ConfigOverrides) -> Result<ResolvedConfig> {
    let file = ClarityConfig::load(path)?;
    resolve_config(&file, overrides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        // SAFETY: callers are #[serial]
        unsafe {
            for name in [DATA_DIR_ENV, HOST_ENV, PORT_ENV, SERVER_ENV, LOG_ENV] {
                std::env::remove_var(name);
            }
        }
    }

    #[test]
    fn test_value_source_display() {
        assert_eq!(ValueSource::CliFlag.to_string(), "cli");
        assert_eq!(ValueSource::ConfigFile.to_string(), "config");
        assert_eq!(ValueSource::Default.to_string(), "default");
        assert_eq!(
            ValueSource::EnvVar("CLARITY_DATA_DIR".into()).to_string(),
            "env:CLARITY_DATA_DIR"
        );
    }

    #[test]
    #[serial]
    fn test_resolve_config_defaults() {
        clear_env();
        let resolved = resolve_config(&ClarityConfig::default(), &ConfigOverrides::new()).unwrap();

        assert_eq!(resolved.host, Resolved::new("127.0.0.1".to_string(), ValueSource::Default));
        assert_eq!(resolved.port.value, 3030);
        assert_eq!(resolved.server_url.value, DEFAULT_SERVER_URL);
        assert_eq!(resolved.log_level.value, "info");
        assert_eq!(resolved.data_dir.source, ValueSource::Default);
        assert!(resolved.db_path().ends_with("clarity/board.db"));
    }

    #[test]
    #[serial]
    fn test_resolve_config_file_beats_defaults() {
        clear_env();
        let file = ClarityConfig {
            port: Some(4000),
            data_dir: Some(PathBuf::from("/srv/board")),
            log_level: Some("debug".into()),
            ..Default::default()
        };
        let resolved = resolve_config(&file, &ConfigOverrides::new()).unwrap();

        assert_eq!(resolved.port, Resolved::new(4000, ValueSource::ConfigFile));
        assert_eq!(resolved.db_path(), PathBuf::from("/srv/board/board.db"));
        assert_eq!(resolved.log_level.source, ValueSource::ConfigFile);
        assert_eq!(resolved.host.source, ValueSource::Default);
    }

    #[test]
    #[serial]
    fn test_resolve_config_cli_beats_file() {
        clear_env();
        let file = ClarityConfig {
            port: Some(4000),
            server_url: Some("http://file:4000".into()),
            ..Default::default()
        };
        let overrides = ConfigOverrides::new()
            .with_port(5000)
            .with_server_url("http://cli:5000")
            .with_data_dir("/cli/dir");
        let resolved = resolve_config(&file, &overrides).unwrap();

        assert_eq!(resolved.port, Resolved::new(5000, ValueSource::CliFlag));
        assert_eq!(resolved.server_url.value, "http://cli:5000");
        assert_eq!(resolved.data_dir.source, ValueSource::CliFlag);
    }

    #[test]
    #[serial]
    fn test_data_dir_env_beats_file() {
        // SAFETY: serialised with every other test touching the environment
        unsafe { std::env::set_var(DATA_DIR_ENV, "/env/dir") };
        let file = ClarityConfig {
            data_dir: Some(PathBuf::from("/file/dir")),
            ..Default::default()
        };
        let resolved = resolve_config(&file, &ConfigOverrides::new()).unwrap();
        clear_env();

        assert_eq!(resolved.data_dir.value, PathBuf::from("/env/dir"));
        assert_eq!(
            resolved.data_dir.source,
            ValueSource::EnvVar(DATA_DIR_ENV.to_string())
        );
    }

    #[test]
    #[serial]
    fn test_env_vars_are_reported_as_env() {
        clear_env();
        // SAFETY: serialised with every other test touching the environment
        unsafe {
            std::env::set_var(HOST_ENV, "0.0.0.0");
            std::env::set_var(PORT_ENV, "4100");
            std::env::set_var(SERVER_ENV, "http://env:4100");
            std::env::set_var(LOG_ENV, "clarity=trace");
        }
        let file = ClarityConfig {
            port: Some(4000),
            log_level: Some("warn".into()),
            ..Default::default()
        };
        let resolved = resolve_config(&file, &ConfigOverrides::new().with_host("10.0.0.1"));
        clear_env();
        let resolved = resolved.unwrap();

        assert_eq!(resolved.host, Resolved::new("10.0.0.1".to_string(), ValueSource::CliFlag));
        assert_eq!(resolved.port, Resolved::new(4100, env_source(PORT_ENV)));
        assert_eq!(
            resolved.server_url,
            Resolved::new("http://env:4100".to_string(), env_source(SERVER_ENV))
        );
        assert_eq!(
            resolved.log_level,
            Resolved::new("clarity=trace".to_string(), env_source(LOG_ENV))
        );
    }

    #[test]
    #[serial]
    fn test_bad_port_env_is_config_error() {
        clear_env();
        // SAFETY: serialised with every other test touching the environment
        unsafe { std::env::set_var(PORT_ENV, "http") };
        let result = resolve_config(&ClarityConfig::default(), &ConfigOverrides::new());
        clear_env();

        assert!(matches!(result, Err(Error::Config(m)) if m.contains(PORT_ENV)));
    }

    #[test]
    #[serial]
    fn test_load_config_reads_file() {
        clear_env();
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.kdl");
        std::fs::write(&path, "host \"0.0.0.0\"\nport 8081\n").unwrap();

        let resolved = load_config(&path, &ConfigOverrides::new()).unwrap();
        assert_eq!(resolved.host.value, "0.0.0.0");
        assert_eq!(resolved.port.value, 8081);
    }
}
