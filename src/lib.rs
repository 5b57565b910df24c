//! Resilient access layer to an issue-tracking backend.
//!
//! A [`BoardAccessor`] resolves the backend through a [`ConnectionManager`]
//! and sends every operation through a [`Gateway`], which applies per-class
//! timeouts, trips a [`CircuitBreaker`] on repeated failure, and translates
//! transport errors into caller-safe [`BoardError`]s.

pub mod adapters;
pub mod board;
pub mod breaker;
pub mod cassette;
pub mod cli;
pub mod commands;
pub mod config;
pub mod connection;
pub mod error;
pub mod gateway;
pub mod model;
pub mod ports;
pub mod protocol;
pub mod testing;

pub use board::BoardAccessor;
pub use breaker::{CircuitBreaker, CircuitState, FAILURE_THRESHOLD, RESET_TIMEOUT_MS};
pub use config::GatewayConfig;
pub use connection::{BackendLocation, ConnectionManager};
pub use error::{BoardError, DispatchError, ErrorKind, Result};
pub use gateway::{Gateway, Timeouts};

use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> std::result::Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = cli::Cli::try_parse_from(args).map_err(|err| err.to_string())?;
    commands::dispatch(&cli)
}
