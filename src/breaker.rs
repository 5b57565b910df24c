//! Circuit breaker guarding the backend.
//!
//! # States
//! - Closed: calls pass through
//! - Open: backend assumed down, calls fail fast
//! - Half-Open: cooldown elapsed, calls are let through as probes
//!
//! # Transitions
//! ```text
//! Closed    → Open:      FAILURE_THRESHOLD consecutive failures
//! Open      → Half-Open: RESET_TIMEOUT elapsed, observed by is_open()
//! Half-Open → Closed:    a success
//! Half-Open → Open:      a failure (no threshold)
//! ```
//!
//! The breaker is a plain value; the gateway owns it behind a mutex.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::ports::Clock;

/// Consecutive failures that open the circuit.
pub const FAILURE_THRESHOLD: u32 = 5;

/// Cooldown before an open circuit admits a probe, in milliseconds.
pub const RESET_TIMEOUT_MS: i64 = 60_000;

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation.
    Closed,
    /// Failing fast.
    Open,
    /// Probing after the cooldown.
    HalfOpen,
}

/// Point-in-time view of a breaker, for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BreakerSnapshot {
    /// Current state.
    pub state: CircuitState,
    /// Failures since the last success.
    pub consecutive_failures: u32,
    /// When the circuit last opened.
    pub opened_at: Option<DateTime<Utc>>,
}

/// Consecutive-failure circuit breaker.
pub struct CircuitBreaker {
    clock: Arc<dyn Clock>,
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<DateTime<Utc>>,
}

impl CircuitBreaker {
    /// Creates a closed breaker with no recorded failures.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock, state: CircuitState::Closed, consecutive_failures: 0, opened_at: None }
    }

    /// Whether calls must fail fast right now.
    ///
    /// An open circuit whose cooldown has elapsed moves to half-open here and
    /// reports `false`, letting the caller probe the backend.
    pub fn is_open(&mut self) -> bool {
        if self.state != CircuitState::Open {
            return false;
        }
        let cooled_down = self.opened_at.is_none_or(|opened_at| {
            self.clock.now() - opened_at >= TimeDelta::milliseconds(RESET_TIMEOUT_MS)
        });
        if cooled_down {
            self.state = CircuitState::HalfOpen;
            tracing::info!("circuit half-open, probing backend");
            return false;
        }
        true
    }

    /// Records a failed call.
    pub fn record_failure(&mut self) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        let trip = match self.state {
            CircuitState::HalfOpen => true,
            CircuitState::Closed => self.consecutive_failures >= FAILURE_THRESHOLD,
            CircuitState::Open => false,
        };
        if trip {
            self.state = CircuitState::Open;
            self.opened_at = Some(self.clock.now());
            tracing::warn!(
                consecutive_failures = self.consecutive_failures,
                "circuit opened, failing fast"
            );
        }
    }

    /// Records a successful call.
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        if self.state == CircuitState::HalfOpen {
            self.state = CircuitState::Closed;
            tracing::info!("circuit closed, backend recovered");
        }
    }

    /// Current state, without triggering the cooldown check.
    #[must_use]
    pub fn state(&self) -> CircuitState {
        self.state
    }

    /// Failures since the last success.
    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// When the circuit last opened.
    #[must_use]
    pub fn opened_at(&self) -> Option<DateTime<Utc>> {
        self.opened_at
    }

    /// Copies out the current bookkeeping.
    #[must_use]
    pub fn snapshot(&self) -> BreakerSnapshot {
        BreakerSnapshot {
            state: self.state,
            consecutive_failures: self.consecutive_failures,
            opened_at: self.opened_at,
        }
    }
}
