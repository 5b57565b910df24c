//! Daemon transport over a Unix socket.
//!
//! One connection per operation: the request is a single JSON line, the
//! response is a single JSON line. The stream is dropped on every exit path,
//! including when the caller's timeout abandons the future.

use std::io;
use std::path::PathBuf;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

use crate::error::DispatchError;
use crate::ports::{DispatchFuture, Dispatcher};
use crate::protocol::{Operation, Response};

/// Sends operations to a long-lived backend daemon.
#[derive(Debug, Clone)]
pub struct DaemonDispatcher {
    socket: PathBuf,
}

impl DaemonDispatcher {
    /// Talks to the daemon listening on `socket`.
    pub fn new(socket: impl Into<PathBuf>) -> Self {
        Self { socket: socket.into() }
    }

    async fn round_trip(&self, mut line: Vec<u8>) -> Result<Response, DispatchError> {
        let stream = UnixStream::connect(&self.socket).await.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::ConnectionRefused => {
                DispatchError::Unavailable(e.to_string())
            }
            _ => DispatchError::Io(e),
        })?;
        let (reader, mut writer) = stream.into_split();

        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;

        let mut reply = String::new();
        let read = BufReader::new(reader).read_line(&mut reply).await?;
        if read == 0 {
            return Err(DispatchError::Unavailable("daemon closed the connection".into()));
        }
        serde_json::from_str(reply.trim_end()).map_err(|e| DispatchError::Malformed(e.to_string()))
    }
}

impl Dispatcher for DaemonDispatcher {
    fn send(&self, operation: &Operation) -> DispatchFuture<'_> {
        let line = serde_json::to_vec(operation);
        Box::pin(async move {
            let line = line.map_err(|e| DispatchError::Malformed(e.to_string()))?;
            self.round_trip(line).await
        })
    }

    fn transport(&self) -> &'static str {
        "daemon"
    }
}
