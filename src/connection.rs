//! Locates the backend's issue store and daemon endpoint.
//!
//! `ensure_connected` is cheap after the first success: the resolved
//! location is cached. A failed probe is not cached, so a store created
//! after startup is picked up on the next call.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::{BoardError, ErrorKind, Result};

/// Where the backend was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendLocation {
    /// An on-disk store driven by spawning the backend per call.
    Directory(PathBuf),
    /// A daemon listening on a Unix socket, serving the given store.
    Socket {
        /// The store directory.
        store: PathBuf,
        /// The daemon's socket.
        socket: PathBuf,
    },
    /// An in-process backend; always present.
    InProcess,
}

impl BackendLocation {
    /// The filesystem path callers would act on, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Directory(path) | Self::Socket { store: path, .. } => Some(path),
            Self::InProcess => None,
        }
    }
}

#[derive(Debug, Clone)]
enum Target {
    Store { store: PathBuf, socket: Option<PathBuf> },
    InProcess,
}

/// Resolves and caches the backend location.
#[derive(Debug)]
pub struct ConnectionManager {
    target: Target,
    connected: OnceLock<BackendLocation>,
}

impl ConnectionManager {
    /// Expects a store at `workspace/store_dir`, optionally served by a daemon
    /// listening on `socket`.
    #[must_use]
    pub fn new(workspace: &Path, store_dir: &str, socket: Option<PathBuf>) -> Self {
        Self {
            target: Target::Store { store: workspace.join(store_dir), socket },
            connected: OnceLock::new(),
        }
    }

    /// A manager for an in-process backend.
    #[must_use]
    pub fn in_process() -> Self {
        Self { target: Target::InProcess, connected: OnceLock::new() }
    }

    /// Verifies the backend location is reachable; idempotent.
    ///
    /// # Errors
    ///
    /// - `NotInitialized` if no issue store exists where one is expected
    /// - `BackendUnavailable` if the store exists but the daemon socket does not
    pub fn ensure_connected(&self) -> Result<&BackendLocation> {
        if let Some(location) = self.connected.get() {
            return Ok(location);
        }
        let location = self.probe()?;
        tracing::info!(location = ?location.path(), "issue backend located");
        Ok(self.connected.get_or_init(|| location))
    }

    /// The resolved store path; `None` before the first successful connect.
    #[must_use]
    pub fn connected_path(&self) -> Option<&Path> {
        self.connected.get().and_then(BackendLocation::path)
    }

    fn probe(&self) -> Result<BackendLocation> {
        let (store, socket) = match &self.target {
            Target::InProcess => return Ok(BackendLocation::InProcess),
            Target::Store { store, socket } => (store, socket),
        };
        if !store.is_dir() {
            tracing::debug!(store = %store.display(), "no issue store found");
            return Err(BoardError::new(
                ErrorKind::NotInitialized,
                "no issue store found in this workspace",
            ));
        }
        match socket {
            None => Ok(BackendLocation::Directory(store.clone())),
            Some(socket) if socket.exists() => {
                Ok(BackendLocation::Socket { store: store.clone(), socket: socket.clone() })
            }
            Some(socket) => {
                tracing::debug!(socket = %socket.display(), "daemon socket missing");
                Err(BoardError::new(
                    ErrorKind::BackendUnavailable,
                    "issue daemon is not running",
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("boardgate_conn_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_store_is_not_initialized() {
        let dir = scratch("missing");
        let manager = ConnectionManager::new(&dir, ".beads", None);
        let err = manager.ensure_connected().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotInitialized);
        assert!(err.is_recoverable());
        assert!(!err.message().contains(&*dir.to_string_lossy()));
        assert_eq!(manager.connected_path(), None);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn existing_store_connects_and_caches() {
        let dir = scratch("present");
        std::fs::create_dir_all(dir.join(".beads")).unwrap();
        let manager = ConnectionManager::new(&dir, ".beads", None);
        let first = manager.ensure_connected().unwrap().clone();
        assert_eq!(first, BackendLocation::Directory(dir.join(".beads")));
        assert_eq!(manager.connected_path(), Some(dir.join(".beads").as_path()));

        // Cached: removing the store does not un-connect.
        std::fs::remove_dir_all(dir.join(".beads")).unwrap();
        assert_eq!(manager.ensure_connected().unwrap(), &first);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn store_created_later_is_picked_up() {
        let dir = scratch("later");
        let manager = ConnectionManager::new(&dir, ".beads", None);
        assert!(manager.ensure_connected().is_err());
        std::fs::create_dir_all(dir.join(".beads")).unwrap();
        assert!(manager.ensure_connected().is_ok());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_socket_is_backend_unavailable() {
        let dir = scratch("socket");
        std::fs::create_dir_all(dir.join(".beads")).unwrap();
        let socket = dir.join(".beads").join("bd.sock");
        let manager = ConnectionManager::new(&dir, ".beads", Some(socket.clone()));
        let err = manager.ensure_connected().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BackendUnavailable);
        assert!(!err.is_recoverable());

        std::fs::write(&socket, b"").unwrap();
        let location = manager.ensure_connected().unwrap();
        assert!(matches!(location, BackendLocation::Socket { .. }));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn in_process_is_always_connected_without_a_path() {
        let manager = ConnectionManager::in_process();
        assert_eq!(manager.ensure_connected().unwrap(), &BackendLocation::InProcess);
        assert_eq!(manager.connected_path(), None);
    }
}
