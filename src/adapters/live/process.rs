//! Spawn-per-call transport.
//!
//! Each operation starts the backend program with a fixed argument list, in
//! the workspace directory, without a shell. The JSON-encoded operation is
//! written to stdin; stdout must hold exactly one JSON response.

use std::io;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::DispatchError;
use crate::ports::{DispatchFuture, Dispatcher};
use crate::protocol::{Operation, Response};

/// Argument list passed to the backend program by default.
pub const RPC_ARGS: &[&str] = &["rpc"];

/// Runs the backend as a child process per operation.
#[derive(Debug, Clone)]
pub struct ProcessDispatcher {
    program: PathBuf,
    args: Vec<String>,
    workspace: PathBuf,
}

impl ProcessDispatcher {
    /// Runs `program rpc` in `workspace`.
    pub fn new(program: impl Into<PathBuf>, workspace: impl Into<PathBuf>) -> Self {
        Self::with_args(program, RPC_ARGS.iter().map(ToString::to_string), workspace)
    }

    /// Runs `program` with an explicit argument list.
    pub fn with_args(
        program: impl Into<PathBuf>,
        args: impl IntoIterator<Item = String>,
        workspace: impl Into<PathBuf>,
    ) -> Self {
        Self { program: program.into(), args: args.into_iter().collect(), workspace: workspace.into() }
    }

    async fn round_trip(&self, payload: Vec<u8>) -> Result<Response, DispatchError> {
        // kill_on_drop reaps the child if the caller's timeout drops this future.
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.workspace)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(DispatchError::Spawn)?;

        // Feed stdin while draining stdout/stderr so neither side fills a pipe
        // and waits on the other. Dropping stdin at the end signals EOF.
        let stdin = child.stdin.take();
        let feed = async move {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            match stdin.write_all(&payload).await {
                // The backend may answer without reading its input.
                Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
                other => other,
            }
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        fed?;
        let output = output?;
        if !output.status.success() {
            return Err(DispatchError::Exit {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        serde_json::from_slice(&output.stdout).map_err(|e| DispatchError::Malformed(e.to_string()))
    }
}

impl Dispatcher for ProcessDispatcher {
    fn send(&self, operation: &Operation) -> DispatchFuture<'_> {
        let payload = serde_json::to_vec(operation);
        Box::pin(async move {
            let payload = payload.map_err(|e| DispatchError::Malformed(e.to_string()))?;
            self.round_trip(payload).await
        })
    }

    fn transport(&self) -> &'static str {
        "process"
    }
}
