//! Command gateway: one admitted, time-bounded backend call.
//!
//! # Data Flow
//! ```text
//! execute(op)
//!     → breaker.is_open()?        yes → CircuitOpen, nothing recorded
//!     → timeout(dispatcher.send)  backend round trip, no retries
//!     → breaker.record_*()        exactly one per admitted call
//!     → typed result
//! ```
//!
//! The breaker lock is held only for the admission check and for the
//! outcome record, never across the dispatch, so unrelated calls run
//! concurrently while every failure is still counted.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::breaker::{BreakerSnapshot, CircuitBreaker};
use crate::error::{BoardError, ErrorKind, Result};
use crate::ports::{Clock, Dispatcher};
use crate::protocol::{Operation, OperationClass, Response};

/// Per-class time budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Single-record mutations.
    pub write: Duration,
    /// Single-record and aggregate reads.
    pub read: Duration,
    /// Whole-board and column-page reads.
    pub bulk: Duration,
}

impl Timeouts {
    /// Budget for an operation class.
    #[must_use]
    pub fn for_class(&self, class: OperationClass) -> Duration {
        match class {
            OperationClass::Write => self.write,
            OperationClass::Read => self.read,
            OperationClass::Bulk => self.bulk,
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            write: Duration::from_secs(10),
            read: Duration::from_secs(30),
            bulk: Duration::from_secs(120),
        }
    }
}

/// Executes backend operations behind a circuit breaker.
pub struct Gateway {
    dispatcher: Arc<dyn Dispatcher>,
    breaker: Mutex<CircuitBreaker>,
    timeouts: Timeouts,
}

impl Gateway {
    /// Creates a gateway with a fresh, closed breaker.
    #[must_use]
    pub fn new(dispatcher: Arc<dyn Dispatcher>, clock: Arc<dyn Clock>, timeouts: Timeouts) -> Self {
        Self { dispatcher, breaker: Mutex::new(CircuitBreaker::new(clock)), timeouts }
    }

    /// Runs one operation and returns the raw response.
    ///
    /// # Errors
    ///
    /// See [`Gateway::call`].
    pub async fn execute(&self, operation: &Operation) -> Result<Response> {
        self.call(operation, Some).await
    }

    /// Runs one operation and extracts the expected response shape.
    ///
    /// A response that `expect` rejects is treated as malformed: it counts as
    /// a backend failure.
    ///
    /// # Errors
    ///
    /// - `CircuitOpen` if the breaker refuses admission (the backend is not
    ///   contacted and no outcome is recorded)
    /// - `Timeout` if the operation exceeds its class budget
    /// - `BackendUnavailable` / `Internal` for transport or decoding failures
    /// - whatever kind the backend reported in a [`Response::Failure`]
    pub async fn call<T>(
        &self,
        operation: &Operation,
        expect: impl FnOnce(Response) -> Option<T>,
    ) -> Result<T> {
        let name = operation.name();
        if self.breaker().is_open() {
            tracing::debug!(operation = name, "circuit open, rejecting call");
            return Err(BoardError::new(
                ErrorKind::CircuitOpen,
                "issue backend is temporarily disabled after repeated failures",
            ));
        }

        let budget = self.timeouts.for_class(operation.class());
        let started = Instant::now();
        let outcome = tokio::time::timeout(budget, self.dispatcher.send(operation)).await;
        let elapsed_ms = started.elapsed().as_millis();

        let result = match outcome {
            Err(_elapsed) => {
                tracing::warn!(operation = name, budget_ms = budget.as_millis(), "backend timed out");
                Err(BoardError::new(
                    ErrorKind::Timeout,
                    format!("issue backend did not answer within {}ms", budget.as_millis()),
                ))
            }
            Ok(Err(err)) => {
                tracing::warn!(operation = name, elapsed_ms, "dispatch failed");
                tracing::debug!(operation = name, error = %err, "dispatch failure detail");
                Err(err.into_board_error())
            }
            Ok(Ok(Response::Failure { kind, message })) => {
                tracing::debug!(operation = name, elapsed_ms, %kind, "backend refused request");
                Err(BoardError::new(kind, message))
            }
            Ok(Ok(response)) => {
                tracing::debug!(operation = name, elapsed_ms, "dispatch succeeded");
                expect(response).ok_or_else(|| {
                    tracing::warn!(operation = name, "unexpected response shape");
                    BoardError::internal("issue backend returned an unexpected response")
                })
            }
        };

        let mut breaker = self.breaker();
        match &result {
            Ok(_) => breaker.record_success(),
            Err(err) if err.kind().is_caller_error() => breaker.record_success(),
            Err(_) => breaker.record_failure(),
        }
        result
    }

    /// Current breaker bookkeeping.
    #[must_use]
    pub fn breaker_snapshot(&self) -> BreakerSnapshot {
        self.breaker().snapshot()
    }

    /// Transport name of the wired dispatcher.
    #[must_use]
    pub fn transport(&self) -> &'static str {
        self.dispatcher.transport()
    }

    fn breaker(&self) -> MutexGuard<'_, CircuitBreaker> {
        self.breaker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breaker::{CircuitState, FAILURE_THRESHOLD, RESET_TIMEOUT_MS};
    use crate::error::DispatchError;
    use crate::testing::{ManualClock, Scripted, ScriptedDispatcher};

    fn gateway(script: Vec<Scripted>) -> (Arc<ScriptedDispatcher>, Arc<ManualClock>, Gateway) {
        let dispatcher = Arc::new(ScriptedDispatcher::new(script));
        let clock = Arc::new(ManualClock::default());
        let gateway = Gateway::new(dispatcher.clone(), clock.clone(), Timeouts::default());
        (dispatcher, clock, gateway)
    }

    fn unavailable() -> Scripted {
        Scripted::Fail(DispatchError::Unavailable("connection refused".into()))
    }

    #[tokio::test]
    async fn success_is_recorded_and_returned() {
        let (_, _, gateway) = gateway(vec![Scripted::Respond(Response::Count { count: 7 })]);
        let count = gateway.call(&Operation::Ping, Response::into_count).await.unwrap();
        assert_eq!(count, 7);
        assert_eq!(gateway.breaker_snapshot().consecutive_failures, 0);
    }

    #[tokio::test]
    async fn transport_failures_are_counted_and_translated() {
        let (_, _, gateway) = gateway(vec![unavailable()]);
        let err = gateway.execute(&Operation::ListBoard).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BackendUnavailable);
        assert!(!err.message().contains("refused"));
        assert_eq!(gateway.breaker_snapshot().consecutive_failures, 1);
    }

    #[tokio::test]
    async fn open_circuit_fails_fast_without_dispatch() {
        let (dispatcher, _, gateway) =
            gateway((0..FAILURE_THRESHOLD).map(|_| unavailable()).collect());
        for _ in 0..FAILURE_THRESHOLD {
            let _ = gateway.execute(&Operation::Ping).await;
        }
        assert_eq!(gateway.breaker_snapshot().state, CircuitState::Open);
        let calls = dispatcher.calls();

        let err = gateway.execute(&Operation::Ping).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CircuitOpen);
        assert!(err.is_recoverable());
        assert_eq!(dispatcher.calls(), calls);
        assert_eq!(gateway.breaker_snapshot().consecutive_failures, FAILURE_THRESHOLD);
    }

    #[tokio::test]
    async fn probe_after_cooldown_closes_the_circuit() {
        let (dispatcher, clock, gateway) =
            gateway((0..FAILURE_THRESHOLD).map(|_| unavailable()).collect());
        for _ in 0..FAILURE_THRESHOLD {
            let _ = gateway.execute(&Operation::Ping).await;
        }
        clock.advance_ms(RESET_TIMEOUT_MS);
        dispatcher.push(Scripted::Respond(Response::Pong));
        assert_eq!(gateway.execute(&Operation::Ping).await.unwrap(), Response::Pong);
        let snapshot = gateway.breaker_snapshot();
        assert_eq!(snapshot.state, CircuitState::Closed);
        assert_eq!(snapshot.consecutive_failures, 0);
    }

    #[tokio::test]
    async fn caller_errors_do_not_trip_the_breaker() {
        let not_found = || {
            Scripted::Respond(Response::Failure {
                kind: ErrorKind::NotFound,
                message: "issue bd-9 not found".into(),
            })
        };
        let (_, _, gateway) = gateway((0..10).map(|_| not_found()).collect());
        for _ in 0..10 {
            let err = gateway.execute(&Operation::GetIssue { id: "bd-9".into() }).await;
            assert_eq!(err.unwrap_err().kind(), ErrorKind::NotFound);
        }
        assert_eq!(gateway.breaker_snapshot().state, CircuitState::Closed);
    }

    #[tokio::test]
    async fn backend_internal_failures_count_against_the_breaker() {
        let (_, _, gateway) = gateway(vec![Scripted::Respond(Response::Failure {
            kind: ErrorKind::Internal,
            message: "database is locked".into(),
        })]);
        let err = gateway.execute(&Operation::ListMinimal).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(gateway.breaker_snapshot().consecutive_failures, 1);
    }

    #[tokio::test]
    async fn unexpected_shape_is_a_failure() {
        let (_, _, gateway) = gateway(vec![Scripted::Respond(Response::Ack)]);
        let err = gateway
            .call(&Operation::ColumnCount { column: crate::model::BoardColumn::Ready }, Response::into_count)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(gateway.breaker_snapshot().consecutive_failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_backend_times_out_and_counts_as_failure() {
        let (dispatcher, _, gateway) = gateway(vec![Scripted::Hang]);
        let err = gateway.execute(&Operation::CloseIssue { id: "bd-1".into() }).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert_eq!(dispatcher.calls(), 1);
        assert_eq!(gateway.breaker_snapshot().consecutive_failures, 1);
    }

    #[tokio::test]
    async fn still_serves_after_a_run_of_failures() {
        let mut script: Vec<Scripted> = (0..FAILURE_THRESHOLD - 1).map(|_| unavailable()).collect();
        script.push(Scripted::Respond(Response::Count { count: 1 }));
        let (_, _, gateway) = gateway(script);
        for _ in 0..FAILURE_THRESHOLD - 1 {
            assert!(gateway.execute(&Operation::Ping).await.is_err());
        }
        let count = gateway.call(&Operation::Ping, Response::into_count).await.unwrap();
        assert_eq!(count, 1);
        assert_eq!(gateway.breaker_snapshot().state, CircuitState::Closed);
    }

    #[test]
    fn bulk_budget_exceeds_write_budget() {
        let timeouts = Timeouts::default();
        assert!(timeouts.for_class(OperationClass::Bulk) > timeouts.for_class(OperationClass::Write));
    }
}
