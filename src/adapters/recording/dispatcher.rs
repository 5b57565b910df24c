//! Recording adapter for the `Dispatcher` port.

use std::sync::{Arc, Mutex};

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::{DispatchFuture, Dispatcher};
use crate::protocol::Operation;

/// Cassette port name for backend traffic.
pub const BACKEND_PORT: &str = "backend";

/// Records every round trip while delegating to an inner dispatcher.
pub struct RecordingDispatcher {
    inner: Arc<dyn Dispatcher>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingDispatcher {
    /// Creates a new recording dispatcher wrapping the given implementation.
    pub fn new(inner: Arc<dyn Dispatcher>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl Dispatcher for RecordingDispatcher {
    fn send(&self, operation: &Operation) -> DispatchFuture<'_> {
        let operation = operation.clone();
        Box::pin(async move {
            let result = self.inner.send(&operation).await;
            record_result(&self.recorder, BACKEND_PORT, operation.name(), &operation, &result);
            result
        })
    }

    fn transport(&self) -> &'static str {
        self.inner.transport()
    }
}
