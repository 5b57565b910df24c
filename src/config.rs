//! Runtime configuration read from `BOARDGATE_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BoardError, Result};
use crate::gateway::Timeouts;

/// Where the backend lives and how long each operation class may take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Project directory containing the issue store.
    pub workspace: PathBuf,
    /// Store directory name, relative to `workspace`.
    pub store_dir: String,
    /// Backend program spawned per call.
    pub backend_program: PathBuf,
    /// Daemon socket; when set, the daemon transport is used.
    pub socket: Option<PathBuf>,
    /// Budget for single-record mutations.
    pub write_timeout_ms: u64,
    /// Budget for single-record and aggregate reads.
    pub read_timeout_ms: u64,
    /// Budget for board and column-page reads.
    pub bulk_timeout_ms: u64,
    /// Directory to write a backend cassette into.
    pub record_dir: Option<PathBuf>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            workspace: PathBuf::from("."),
            store_dir: ".beads".to_string(),
            backend_program: PathBuf::from("bd"),
            socket: None,
            write_timeout_ms: 10_000,
            read_timeout_ms: 30_000,
            bulk_timeout_ms: 120_000,
            record_dir: None,
        }
    }
}

impl GatewayConfig {
    /// Reads the process environment.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if a timeout variable is not a whole number.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup, starting
    /// from the defaults.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if a timeout variable is not a whole number.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        let text = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = text("BOARDGATE_WORKSPACE") {
            config.workspace = PathBuf::from(v);
        }
        if let Some(v) = text("BOARDGATE_STORE_DIR") {
            config.store_dir = v;
        }
        if let Some(v) = text("BOARDGATE_BACKEND") {
            config.backend_program = PathBuf::from(v);
        }
        config.socket = text("BOARDGATE_SOCKET").map(PathBuf::from);
        config.record_dir = text("BOARDGATE_RECORD").map(PathBuf::from);

        for (key, slot) in [
            ("BOARDGATE_WRITE_TIMEOUT_MS", &mut config.write_timeout_ms),
            ("BOARDGATE_READ_TIMEOUT_MS", &mut config.read_timeout_ms),
            ("BOARDGATE_BULK_TIMEOUT_MS", &mut config.bulk_timeout_ms),
        ] {
            if let Some(v) = text(key) {
                *slot = v.trim().parse().map_err(|_| {
                    BoardError::invalid_input(format!("{key} must be a whole number of milliseconds"))
                })?;
            }
        }
        Ok(config)
    }

    /// Per-class timeouts.
    #[must_use]
    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            write: Duration::from_millis(self.write_timeout_ms),
            read: Duration::from_millis(self.read_timeout_ms),
            bulk: Duration::from_millis(self.bulk_timeout_ms),
        }
    }
}
