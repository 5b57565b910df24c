//! Replaying adapters that serve recorded interactions.

pub mod dispatcher;

use serde::de::DeserializeOwned;

use crate::error::DispatchError;

pub use dispatcher::ReplayingDispatcher;

/// Decode a recorded `{"Ok": v}` / `{"Err": msg}` output.
pub(crate) fn replay_result<T: DeserializeOwned>(
    output: serde_json::Value,
) -> Result<T, DispatchError> {
    if let Some(err) = output.get("Err") {
        let msg = err.as_str().unwrap_or("unknown error").to_string();
        return Err(DispatchError::Cassette(msg));
    }
    let value = output.get("Ok").cloned().unwrap_or(output);
    serde_json::from_value(value).map_err(|e| DispatchError::Malformed(e.to_string()))
}
