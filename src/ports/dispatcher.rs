//! Dispatcher port: one round trip to the issue backend.

use std::future::Future;
use std::pin::Pin;

use crate::error::DispatchError;
use crate::protocol::{Operation, Response};

/// Boxed future type alias used by [`Dispatcher`] to keep the trait dyn-compatible.
pub type DispatchFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Response, DispatchError>> + Send + 'a>>;

/// Sends a single operation to the backend and returns its response.
///
/// Spawning a process per call and talking to a long-lived daemon are both
/// implementations of this one capability; the gateway does not know which
/// one it holds. Implementations must not retry and must release any
/// process, pipe or socket they acquire when the returned future is dropped
/// before completion.
pub trait Dispatcher: Send + Sync {
    /// Performs the round trip.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] when the backend cannot be reached, exits
    /// unsuccessfully, or answers with something that is not a [`Response`].
    /// A backend that answers with [`Response::Failure`] is a successful
    /// dispatch.
    fn send(&self, operation: &Operation) -> DispatchFuture<'_>;

    /// Short transport name for logs.
    fn transport(&self) -> &'static str;
}
