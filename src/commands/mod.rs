//! Command dispatch and handlers.

pub mod read;
pub mod write;

use std::sync::Arc;

use serde::Serialize;

use crate::adapters::live::{SystemClock, UuidIdGenerator};
use crate::adapters::MemoryBackend;
use crate::board::BoardAccessor;
use crate::cli::{Cli, Command};
use crate::config::GatewayConfig;
use crate::error::{BoardError, ErrorKind};
use crate::ports::Clock;

/// Dispatch a parsed command to its handler.
///
/// When `BOARDGATE_RECORD` is set to a directory path, every backend round
/// trip is recorded to a cassette in that directory.
///
/// # Errors
///
/// Returns the caller-safe error message if the command fails. A workspace
/// without an issue store is not an error: a notice goes to stderr instead.
pub fn dispatch(cli: &Cli) -> Result<(), String> {
    let config = GatewayConfig::from_env().map_err(|e| e.to_string())?;
    let accessor = accessor_for(cli.memory, &config);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start runtime: {e}"))?;
    let result = runtime.block_on(dispatch_with_accessor(&cli.command, &accessor));

    // Finish recording after the command completes, even on error.
    if let Some(path) = accessor.finish_recording()? {
        eprintln!("Recording saved to: {}", path.display());
    }

    match result {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotInitialized => {
            eprintln!("{}; nothing to do.", err.message());
            Ok(())
        }
        Err(err) => Err(err.to_string()),
    }
}

fn accessor_for(memory: bool, config: &GatewayConfig) -> BoardAccessor {
    if memory {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let backend = MemoryBackend::new(Arc::clone(&clock), Arc::new(UuidIdGenerator));
        BoardAccessor::with_dispatcher_and_config(Arc::new(backend), clock, config)
    } else {
        BoardAccessor::from_config(config)
    }
}

/// Dispatch a command against the given accessor.
async fn dispatch_with_accessor(
    command: &Command,
    accessor: &BoardAccessor,
) -> Result<(), BoardError> {
    match command {
        Command::Board => read::board(accessor).await,
        Command::Minimal => read::minimal(accessor).await,
        Command::Count { column } => read::count(accessor, *column).await,
        Command::Column { column, offset, limit } => {
            read::column(accessor, *column, *offset, *limit).await
        }
        Command::Show { id } => read::show(accessor, id).await,
        Command::Create(args) => write::create(accessor, args).await,
        Command::Status { id, status } => write::status(accessor, id, status).await,
        Command::Close { id } => write::close(accessor, id).await,
        Command::Delete { id } => write::delete(accessor, id).await,
        Command::Label { action } => write::label(accessor, action).await,
        Command::Dep { action } => write::dep(accessor, action).await,
        Command::Comment { id, text, author } => write::comment(accessor, id, text, author).await,
    }
}

/// Pretty-prints `value` as JSON on stdout.
fn print_json<T: Serialize>(value: &T) -> Result<(), BoardError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| BoardError::internal(format!("failed to encode output: {e}")))?;
    println!("{text}");
    Ok(())
}
