//! Replaying adapter for the `Dispatcher` port.

use std::path::Path;
use std::sync::{Mutex, PoisonError};

use super::replay_result;
use crate::adapters::recording::dispatcher::BACKEND_PORT;
use crate::cassette::format::Cassette;
use crate::cassette::replayer::CassetteReplayer;
use crate::error::DispatchError;
use crate::ports::{DispatchFuture, Dispatcher};
use crate::protocol::Operation;

/// Serves recorded backend responses from a cassette, in order per
/// operation name.
pub struct ReplayingDispatcher {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingDispatcher {
    /// Creates a dispatcher from a loaded cassette.
    #[must_use]
    pub fn new(cassette: &Cassette) -> Self {
        Self { replayer: Mutex::new(CassetteReplayer::new(cassette)) }
    }

    /// Loads a YAML cassette file.
    ///
    /// # Errors
    ///
    /// Returns an error string if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read cassette file {}: {e}", path.display()))?;
        let cassette: Cassette = serde_yaml::from_str(&content)
            .map_err(|e| format!("Failed to parse cassette file {}: {e}", path.display()))?;
        Ok(Self::new(&cassette))
    }

    /// Recorded interactions not yet served.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.replayer.lock().unwrap_or_else(PoisonError::into_inner).remaining()
    }
}

impl Dispatcher for ReplayingDispatcher {
    fn send(&self, operation: &Operation) -> DispatchFuture<'_> {
        let method = operation.name();
        let output = self
            .replayer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .next_interaction(BACKEND_PORT, method)
            .map(|interaction| interaction.output.clone());
        Box::pin(async move {
            let output = output.ok_or_else(|| {
                DispatchError::Cassette(format!("no recorded interaction left for {method}"))
            })?;
            replay_result(output)
        })
    }

    fn transport(&self) -> &'static str {
        "replay"
    }
}
