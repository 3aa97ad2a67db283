//! Common test utilities for clarity integration tests.
//!
//! Provides `TestServer`, a board server on an ephemeral port backed by a
//! throwaway database, and `TestEnv` for CLI runs that don't touch the
//! user's `~/.config/clarity/` or `~/.local/share/clarity/` directories.

#![allow(dead_code)]

use assert_cmd::Command;
use clarity::server::{self, AppState};
use clarity::storage::Storage;
pub use tempfile::TempDir;
use tokio::sync::oneshot;

/// A board server running on its own thread and runtime.
///
/// Usable from both `#[test]` and `#[tokio::test]`. Dropping it signals
/// shutdown.
pub struct TestServer {
    pub url: String,
    pub data_dir: TempDir,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    /// Start a server with an empty database.
    pub fn start() -> Self {
        let data_dir = TempDir::new().unwrap();
        let storage = Storage::open(&data_dir.path().join("board.db")).unwrap();

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let (tx, rx) = oneshot::channel::<()>();
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).unwrap();
                let shutdown = async {
                    let _ = rx.await;
                };
                server::serve(listener, AppState::new(storage), shutdown)
                    .await
                    .unwrap();
            });
        });

        Self {
            url,
            data_dir,
            shutdown: Some(tx),
        }
    }

    /// Full URL for an API path.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// A test environment for running the `clarity` binary.
///
/// `clarity()` sets `CLARITY_CONFIG` and `CLARITY_DATA_DIR` per command, so
/// tests stay parallel-safe.
pub struct TestEnv {
    pub config_dir: TempDir,
    pub data_dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with isolated directories.
    pub fn new() -> Self {
        Self {
            config_dir: TempDir::new().unwrap(),
            data_dir: TempDir::new().unwrap(),
        }
    }

    /// Path config.kdl would live at (absent unless a test writes it).
    pub fn config_path(&self) -> std::path::PathBuf {
        self.config_dir.path().join("config.kdl")
    }

    /// Get a Command for the clarity binary with isolated config and data.
    pub fn clarity(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_clarity"));
        cmd.env("CLARITY_CONFIG", self.config_path());
        cmd.env("CLARITY_DATA_DIR", self.data_dir.path());
        cmd.env_remove("CLARITY_SERVER");
        cmd.env_remove("CLARITY_HOST");
        cmd.env_remove("CLARITY_PORT");
        cmd.env_remove("RUST_LOG");
        cmd
    }

    /// Like [`clarity`](Self::clarity), pointed at `server`.
    pub fn clarity_for(&self, server: &TestServer) -> Command {
        let mut cmd = self.clarity();
        cmd.env("CLARITY_SERVER", &server.url);
        cmd
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a command's stdout as JSON.
pub fn parse_json(stdout: &[u8]) -> serde_json::Value {
    serde_json::from_slice(stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({}): {}",
            e,
            String::from_utf8_lossy(stdout)
        )
    })
}
