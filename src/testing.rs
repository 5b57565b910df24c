//! Test doubles for the ports.
//!
//! Public so integration tests and downstream crates can drive the gateway
//! deterministically: a settable clock, predictable identifiers, and a
//! dispatcher that plays back a script.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, TimeDelta, TimeZone, Utc};

use crate::error::DispatchError;
use crate::ports::{Clock, DispatchFuture, Dispatcher, IdGenerator};
use crate::protocol::{Operation, Response};

/// A clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    #[must_use]
    pub fn at(start: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(start) }
    }

    /// Moves the clock forward by `ms` milliseconds.
    pub fn advance_ms(&self, ms: i64) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += TimeDelta::milliseconds(ms);
    }

    /// Sets the clock to an absolute time.
    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::at(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().unwrap_or_default())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Yields `<prefix>-1`, `<prefix>-2`, ...
pub struct SequentialIdGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIdGenerator {
    /// Creates a generator with the given prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), next: AtomicU64::new(1) }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{n}", self.prefix)
    }
}

/// One scripted dispatch outcome.
#[derive(Debug)]
pub enum Scripted {
    /// Answer with this response.
    Respond(Response),
    /// Fail with this transport error.
    Fail(DispatchError),
    /// Never answer.
    Hang,
}

/// Plays back queued outcomes in order. An empty script answers `Ack`.
#[derive(Default)]
pub struct ScriptedDispatcher {
    script: Mutex<VecDeque<Scripted>>,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl ScriptedDispatcher {
    /// Creates a dispatcher with the given script.
    #[must_use]
    pub fn new(script: impl IntoIterator<Item = Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Appends an outcome to the script.
    pub fn push(&self, step: Scripted) {
        self.script.lock().unwrap_or_else(PoisonError::into_inner).push_back(step);
    }

    /// How many operations reached this dispatcher.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Names of the operations received, in order.
    #[must_use]
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Dispatcher for ScriptedDispatcher {
    fn send(&self, operation: &Operation) -> DispatchFuture<'_> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(operation.name().to_string());
        let step = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(Scripted::Respond(Response::Ack));
        Box::pin(async move {
            match step {
                Scripted::Respond(response) => Ok(response),
                Scripted::Fail(err) => Err(err),
                Scripted::Hang => std::future::pending().await,
            }
        })
    }

    fn transport(&self) -> &'static str {
        "scripted"
    }
}
