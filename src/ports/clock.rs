//! Clock port for obtaining the current time.

use chrono::{DateTime, Utc};

/// Provides the current time.
///
/// The circuit breaker measures its cooldown against this clock and the
/// in-memory backend stamps records with it, so tests can drive both with a
/// manual clock instead of sleeping.
pub trait Clock: Send + Sync {
    /// Returns the current UTC time.
    fn now(&self) -> DateTime<Utc>;
}
