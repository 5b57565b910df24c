//! Board accessor: issue CRUD, relationships, and paginated column reads.
//!
//! Every call resolves the backend lazily through the
//! [`ConnectionManager`], then goes through the [`Gateway`]. Derived fields
//! arrive from the backend already computed.

use std::sync::{Arc, Mutex};

use crate::adapters::live::{ProcessDispatcher, SystemClock};
use crate::adapters::{MemoryBackend, RecordingDispatcher};
use crate::breaker::BreakerSnapshot;
use crate::cassette::recorder::CassetteRecorder;
use crate::config::GatewayConfig;
use crate::connection::ConnectionManager;
use crate::error::{BoardError, Result};
use crate::gateway::{Gateway, Timeouts};
use crate::model::{
    BoardColumn, BoardSnapshot, DependencyKind, FullCard, IssueUpdate, MinimalCard, NewIssue,
    Page, Status,
};
use crate::ports::{Clock, Dispatcher, IdGenerator};
use crate::protocol::{Operation, Response};

/// Cassette file written when recording is enabled.
pub const CASSETTE_FILE: &str = "backend.cassette.yaml";

/// The access layer a UI talks to.
pub struct BoardAccessor {
    connection: ConnectionManager,
    gateway: Gateway,
    recorder: Option<Arc<Mutex<CassetteRecorder>>>,
}

impl BoardAccessor {
    /// Wires an accessor from its parts.
    #[must_use]
    pub fn new(connection: ConnectionManager, gateway: Gateway) -> Self {
        Self { connection, gateway, recorder: None }
    }

    /// Wires the live transport described by `config`: the daemon when a
    /// socket is configured, otherwise a process per call. When
    /// `record_dir` is set, every round trip is also recorded.
    #[must_use]
    pub fn from_config(config: &GatewayConfig) -> Self {
        let dispatcher = live_dispatcher(config);
        let connection =
            ConnectionManager::new(&config.workspace, &config.store_dir, config.socket.clone());
        Self::assemble(connection, dispatcher, Arc::new(SystemClock), config.timeouts(), config)
    }

    /// An accessor over a fresh in-memory backend.
    #[must_use]
    pub fn in_memory(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        let backend = MemoryBackend::new(clock.clone(), ids);
        Self::with_dispatcher(Arc::new(backend), clock, Timeouts::default())
    }

    /// An accessor over an in-process dispatcher, with no location checks.
    #[must_use]
    pub fn with_dispatcher(
        dispatcher: Arc<dyn Dispatcher>,
        clock: Arc<dyn Clock>,
        timeouts: Timeouts,
    ) -> Self {
        Self::new(ConnectionManager::in_process(), Gateway::new(dispatcher, clock, timeouts))
    }

    /// Same as [`BoardAccessor::with_dispatcher`], honouring `record_dir`.
    #[must_use]
    pub fn with_dispatcher_and_config(
        dispatcher: Arc<dyn Dispatcher>,
        clock: Arc<dyn Clock>,
        config: &GatewayConfig,
    ) -> Self {
        Self::assemble(ConnectionManager::in_process(), dispatcher, clock, config.timeouts(), config)
    }

    fn assemble(
        connection: ConnectionManager,
        dispatcher: Arc<dyn Dispatcher>,
        clock: Arc<dyn Clock>,
        timeouts: Timeouts,
        config: &GatewayConfig,
    ) -> Self {
        let recorder = config.record_dir.as_ref().map(|dir| {
            Arc::new(Mutex::new(CassetteRecorder::new(
                dir.join(CASSETTE_FILE),
                "boardgate-session",
                dispatcher.transport(),
            )))
        });
        let dispatcher: Arc<dyn Dispatcher> = match &recorder {
            Some(recorder) => Arc::new(RecordingDispatcher::new(dispatcher, Arc::clone(recorder))),
            None => dispatcher,
        };
        Self { connection, gateway: Gateway::new(dispatcher, clock, timeouts), recorder }
    }

    /// Writes the session cassette, if recording.
    ///
    /// # Errors
    ///
    /// Returns an error string if the cassette cannot be written.
    pub fn finish_recording(&self) -> std::result::Result<Option<std::path::PathBuf>, String> {
        let Some(recorder) = &self.recorder else {
            return Ok(None);
        };
        let recorder = recorder.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        recorder.write().map(Some).map_err(|e| format!("Failed to write cassette: {e}"))
    }

    /// The connection manager, for readiness probes.
    #[must_use]
    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    /// Current circuit-breaker bookkeeping.
    #[must_use]
    pub fn breaker(&self) -> BreakerSnapshot {
        self.gateway.breaker_snapshot()
    }

    async fn call<T>(
        &self,
        operation: Operation,
        expect: impl FnOnce(Response) -> Option<T>,
    ) -> Result<T> {
        self.connection.ensure_connected()?;
        self.gateway.call(&operation, expect).await
    }

    /// Checks the backend answers.
    ///
    /// # Errors
    ///
    /// Any [`BoardError`] the gateway reports.
    pub async fn ping(&self) -> Result<()> {
        self.call(Operation::Ping, Response::into_pong).await
    }

    /// Creates an issue and returns its backend-assigned identifier.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a blank title or out-of-range priority; otherwise
    /// any gateway error.
    pub async fn create_issue(&self, issue: NewIssue) -> Result<String> {
        issue.validate()?;
        self.call(Operation::CreateIssue { issue }, Response::into_created).await
    }

    /// Merges the provided fields into an existing issue.
    ///
    /// # Errors
    ///
    /// `NotFound` if `id` does not exist; `InvalidInput` for invalid fields.
    pub async fn update_issue(&self, id: &str, update: IssueUpdate) -> Result<()> {
        require_id(id)?;
        update.validate()?;
        self.call(Operation::UpdateIssue { id: id.to_string(), update }, Response::into_ack).await
    }

    /// Moves an issue to `status`. Closing stamps `closed_at`; reopening
    /// clears it.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `status` is not one of `open`, `in_progress`,
    /// `blocked`, `closed`; `NotFound` if `id` does not exist.
    pub async fn set_issue_status(&self, id: &str, status: &str) -> Result<()> {
        require_id(id)?;
        let status: Status = status.parse()?;
        self.call(Operation::SetStatus { id: id.to_string(), status }, Response::into_ack).await
    }

    /// Closes an issue.
    ///
    /// # Errors
    ///
    /// `NotFound` if `id` does not exist.
    pub async fn close_issue(&self, id: &str) -> Result<()> {
        require_id(id)?;
        self.call(Operation::CloseIssue { id: id.to_string() }, Response::into_ack).await
    }

    /// Deletes an issue along with every relationship that mentions it.
    ///
    /// # Errors
    ///
    /// `NotFound` if `id` does not exist.
    pub async fn delete_issue(&self, id: &str) -> Result<()> {
        require_id(id)?;
        self.call(Operation::DeleteIssue { id: id.to_string() }, Response::into_ack).await
    }

    /// Adds a label; adding an existing label is a no-op.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a blank label; `NotFound` if `id` does not exist.
    pub async fn add_label(&self, id: &str, label: &str) -> Result<()> {
        require_id(id)?;
        if label.trim().is_empty() {
            return Err(BoardError::invalid_input("label must not be empty"));
        }
        let op = Operation::AddLabel { id: id.to_string(), label: label.to_string() };
        self.call(op, Response::into_ack).await
    }

    /// Removes a label; removing an absent label is a no-op.
    ///
    /// # Errors
    ///
    /// `NotFound` if `id` does not exist.
    pub async fn remove_label(&self, id: &str, label: &str) -> Result<()> {
        require_id(id)?;
        let op = Operation::RemoveLabel { id: id.to_string(), label: label.to_string() };
        self.call(op, Response::into_ack).await
    }

    /// Adds an edge `from -> to`. For [`DependencyKind::Blocks`], `from`
    /// blocks `to`; for [`DependencyKind::ParentChild`], `from` is the parent.
    ///
    /// # Errors
    ///
    /// `NotFound` if either issue is missing; `InvalidInput` for a
    /// self-dependency or a blocking cycle.
    pub async fn add_dependency(&self, from: &str, to: &str, kind: DependencyKind) -> Result<()> {
        require_id(from)?;
        require_id(to)?;
        let op = Operation::AddDependency { from: from.to_string(), to: to.to_string(), kind };
        self.call(op, Response::into_ack).await
    }

    /// Removes an edge; removing an absent edge is a no-op.
    ///
    /// # Errors
    ///
    /// `NotFound` if either issue is missing.
    pub async fn remove_dependency(
        &self,
        from: &str,
        to: &str,
        kind: DependencyKind,
    ) -> Result<()> {
        require_id(from)?;
        require_id(to)?;
        let op = Operation::RemoveDependency { from: from.to_string(), to: to.to_string(), kind };
        self.call(op, Response::into_ack).await
    }

    /// Appends a comment.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for blank text or author; `NotFound` if `id` does not exist.
    pub async fn add_comment(&self, id: &str, text: &str, author: &str) -> Result<()> {
        require_id(id)?;
        if text.trim().is_empty() {
            return Err(BoardError::invalid_input("comment must not be empty"));
        }
        if author.trim().is_empty() {
            return Err(BoardError::invalid_input("comment author must not be empty"));
        }
        let op = Operation::AddComment {
            id: id.to_string(),
            text: text.to_string(),
            author: author.to_string(),
        };
        self.call(op, Response::into_ack).await
    }

    /// Every column with every card, fully hydrated. Not paginated.
    ///
    /// # Errors
    ///
    /// Any gateway error.
    pub async fn get_board(&self) -> Result<BoardSnapshot> {
        let issues = self.call(Operation::ListBoard, Response::into_board).await?;
        Ok(BoardSnapshot::from_cards(issues))
    }

    /// Number of issues in `column`.
    ///
    /// # Errors
    ///
    /// Any gateway error.
    pub async fn get_column_count(&self, column: BoardColumn) -> Result<usize> {
        self.call(Operation::ColumnCount { column }, Response::into_count).await
    }

    /// At most `limit` minimal cards from `column`, starting at `offset`,
    /// in the backend's order.
    ///
    /// # Errors
    ///
    /// Any gateway error, or `Internal` if the backend returns more than
    /// `limit` cards.
    pub async fn get_column_data(
        &self,
        column: BoardColumn,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<MinimalCard>> {
        if limit == 0 {
            self.connection.ensure_connected()?;
            return Ok(Vec::new());
        }
        let page = Page::new(offset, limit);
        // An oversized page is a malformed response and counts against the breaker.
        self.call(Operation::ListColumn { column, page }, move |response| {
            response.into_cards().filter(|cards| cards.len() <= limit)
        })
        .await
    }

    /// Every issue, minimal tier.
    ///
    /// # Errors
    ///
    /// Any gateway error.
    pub async fn get_board_minimal(&self) -> Result<Vec<MinimalCard>> {
        self.call(Operation::ListMinimal, Response::into_cards).await
    }

    /// One issue, full tier.
    ///
    /// # Errors
    ///
    /// `NotFound` if `id` does not exist.
    pub async fn get_issue_full(&self, id: &str) -> Result<FullCard> {
        require_id(id)?;
        self.call(Operation::GetIssue { id: id.to_string() }, Response::into_issue).await
    }
}

fn require_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(BoardError::invalid_input("issue id must not be empty"));
    }
    Ok(())
}

#[cfg(unix)]
fn live_dispatcher(config: &GatewayConfig) -> Arc<dyn Dispatcher> {
    match &config.socket {
        Some(socket) => Arc::new(crate::adapters::live::DaemonDispatcher::new(socket)),
        None => Arc::new(ProcessDispatcher::new(&config.backend_program, &config.workspace)),
    }
}

#[cfg(not(unix))]
fn live_dispatcher(config: &GatewayConfig) -> Arc<dyn Dispatcher> {
    Arc::new(ProcessDispatcher::new(&config.backend_program, &config.workspace))
}
