//! In-process backend serving the full operation set from memory.
//!
//! # Derived fields
//! This backend owns `blocked_by_count` and `is_ready`; the accessor never
//! recomputes them. Both are derived at read time from the `blocks` edges:
//! a blocker counts while its status is anything but `closed`. Closing a
//! blocker therefore frees its dependents on the very next read.
//!
//! Records keep insertion order, which is the order of every listing.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{BoardError, ErrorKind, Result};
use crate::model::{
    BoardColumn, Comment, DependencyKind, FullCard, IssueRecord, IssueRef, IssueUpdate,
    MinimalCard, NewIssue, Page, Status, DEFAULT_PRIORITY,
};
use crate::ports::{Clock, DispatchFuture, Dispatcher, IdGenerator};
use crate::protocol::{Operation, Response};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Edge {
    from: String,
    to: String,
    kind: DependencyKind,
}

/// Dependency counters for every issue, computed in one pass over the edges.
#[derive(Default)]
struct Counters<'a> {
    blocked_by: HashMap<&'a str, u32>,
    blocks: HashMap<&'a str, u32>,
}

impl Counters<'_> {
    fn blocked_by(&self, id: &str) -> u32 {
        self.blocked_by.get(id).copied().unwrap_or(0)
    }

    fn blocks(&self, id: &str) -> u32 {
        self.blocks.get(id).copied().unwrap_or(0)
    }
}

#[derive(Default)]
struct Store {
    issues: Vec<IssueRecord>,
    index: HashMap<String, usize>,
    edges: Vec<Edge>,
}

impl Store {
    fn get(&self, id: &str) -> Result<&IssueRecord> {
        self.index.get(id).map(|&i| &self.issues[i]).ok_or_else(|| BoardError::issue_not_found(id))
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut IssueRecord> {
        match self.index.get(id) {
            Some(&i) => Ok(&mut self.issues[i]),
            None => Err(BoardError::issue_not_found(id)),
        }
    }

    fn insert(&mut self, record: IssueRecord) -> Result<()> {
        if self.index.contains_key(&record.id) {
            return Err(BoardError::internal("identifier collision"));
        }
        self.index.insert(record.id.clone(), self.issues.len());
        self.issues.push(record);
        Ok(())
    }

    fn remove(&mut self, id: &str) -> Result<()> {
        let position = *self.index.get(id).ok_or_else(|| BoardError::issue_not_found(id))?;
        self.issues.remove(position);
        self.edges.retain(|edge| edge.from != id && edge.to != id);
        self.index =
            self.issues.iter().enumerate().map(|(i, issue)| (issue.id.clone(), i)).collect();
        Ok(())
    }

    fn status_of(&self, id: &str) -> Option<Status> {
        self.index.get(id).map(|&i| self.issues[i].status)
    }

    fn counters(&self) -> Counters<'_> {
        let mut counters = Counters::default();
        for edge in self.edges.iter().filter(|e| e.kind == DependencyKind::Blocks) {
            *counters.blocks.entry(edge.from.as_str()).or_default() += 1;
            if self.status_of(&edge.from).is_some_and(|s| s != Status::Closed) {
                *counters.blocked_by.entry(edge.to.as_str()).or_default() += 1;
            }
        }
        counters
    }

    /// Whether `target` is reachable from `start` along `blocks` edges.
    fn blocks_transitively(&self, start: &str, target: &str) -> bool {
        let mut stack = vec![start];
        let mut visited = BTreeSet::new();
        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            stack.extend(
                self.edges
                    .iter()
                    .filter(|e| e.kind == DependencyKind::Blocks && e.from == current)
                    .map(|e| e.to.as_str()),
            );
        }
        false
    }

    fn reference(&self, id: &str) -> IssueRef {
        let title = self.get(id).map(|issue| issue.title.clone()).unwrap_or_default();
        IssueRef { id: id.to_string(), title }
    }

    fn minimal(record: &IssueRecord, counters: &Counters<'_>) -> MinimalCard {
        let blocked_by_count = counters.blocked_by(&record.id);
        MinimalCard {
            id: record.id.clone(),
            title: record.title.clone(),
            status: record.status,
            priority: record.priority,
            issue_type: record.issue_type,
            assignee: record.assignee.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
            closed_at: record.closed_at,
            is_ready: record.status == Status::Open && blocked_by_count == 0,
            blocked_by_count,
            blocks_count: counters.blocks(&record.id),
        }
    }

    fn full(&self, record: &IssueRecord, counters: &Counters<'_>) -> FullCard {
        let related = |kind: DependencyKind, outgoing: bool| -> Vec<IssueRef> {
            self.edges
                .iter()
                .filter(|e| e.kind == kind)
                .filter_map(|e| match outgoing {
                    true if e.from == record.id => Some(self.reference(&e.to)),
                    false if e.to == record.id => Some(self.reference(&e.from)),
                    _ => None,
                })
                .collect()
        };
        FullCard {
            card: Self::minimal(record, counters),
            description: record.description.clone(),
            acceptance_criteria: record.acceptance_criteria.clone(),
            design: record.design.clone(),
            notes: record.notes.clone(),
            external_ref: record.external_ref.clone(),
            due_at: record.due_at,
            defer_until: record.defer_until,
            estimated_minutes: record.estimated_minutes,
            labels: record.labels.iter().cloned().collect(),
            parent: related(DependencyKind::ParentChild, false).into_iter().next(),
            children: related(DependencyKind::ParentChild, true),
            blocks: related(DependencyKind::Blocks, true),
            blocked_by: related(DependencyKind::Blocks, false),
            comments: record.comments.clone(),
        }
    }

    fn in_column<'a>(
        &'a self,
        column: BoardColumn,
        counters: &'a Counters<'a>,
    ) -> impl Iterator<Item = &'a IssueRecord> + 'a {
        self.issues
            .iter()
            .filter(move |issue| column.contains(issue.status, counters.blocked_by(&issue.id)))
    }
}

/// An issue backend held entirely in memory.
pub struct MemoryBackend {
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    store: Mutex<Store>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { clock, ids, store: Mutex::new(Store::default()) }
    }

    /// Number of stored issues.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store().issues.len()
    }

    /// Whether no issues are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Applies one operation, reporting refusals as [`Response::Failure`].
    #[must_use]
    pub fn handle(&self, operation: &Operation) -> Response {
        self.apply(operation).unwrap_or_else(|err| Response::failure(&err))
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(&self, operation: &Operation) -> Result<Response> {
        let mut store = self.store();
        match operation {
            Operation::Ping => Ok(Response::Pong),
            Operation::CreateIssue { issue } => {
                let id = self.create(&mut store, issue)?;
                Ok(Response::Created { id })
            }
            Operation::UpdateIssue { id, update } => {
                self.update(&mut store, id, update)?;
                Ok(Response::Ack)
            }
            Operation::SetStatus { id, status } => {
                self.set_status(&mut store, id, *status)?;
                Ok(Response::Ack)
            }
            Operation::CloseIssue { id } => {
                self.set_status(&mut store, id, Status::Closed)?;
                Ok(Response::Ack)
            }
            Operation::DeleteIssue { id } => {
                store.remove(id)?;
                Ok(Response::Ack)
            }
            Operation::AddLabel { id, label } => {
                if label.trim().is_empty() {
                    return Err(BoardError::invalid_input("label must not be empty"));
                }
                let now = self.clock.now();
                let issue = store.get_mut(id)?;
                if issue.labels.insert(label.clone()) {
                    issue.updated_at = now;
                }
                Ok(Response::Ack)
            }
            Operation::RemoveLabel { id, label } => {
                let now = self.clock.now();
                let issue = store.get_mut(id)?;
                if issue.labels.remove(label) {
                    issue.updated_at = now;
                }
                Ok(Response::Ack)
            }
            Operation::AddDependency { from, to, kind } => {
                Self::add_dependency(&mut store, from, to, *kind)?;
                Ok(Response::Ack)
            }
            Operation::RemoveDependency { from, to, kind } => {
                store.get(from)?;
                store.get(to)?;
                store.edges.retain(|e| !(e.from == *from && e.to == *to && e.kind == *kind));
                Ok(Response::Ack)
            }
            Operation::AddComment { id, text, author } => {
                if text.trim().is_empty() {
                    return Err(BoardError::invalid_input("comment must not be empty"));
                }
                let comment = Comment {
                    id: self.ids.generate_id(),
                    author: author.clone(),
                    text: text.clone(),
                    created_at: self.clock.now(),
                };
                let issue = store.get_mut(id)?;
                issue.updated_at = comment.created_at;
                issue.comments.push(comment);
                Ok(Response::Ack)
            }
            Operation::ListBoard => {
                let counters = store.counters();
                let issues = store.issues.iter().map(|i| store.full(i, &counters)).collect();
                Ok(Response::Board { issues })
            }
            Operation::ListMinimal => {
                let counters = store.counters();
                let cards = store.issues.iter().map(|i| Store::minimal(i, &counters)).collect();
                Ok(Response::Cards { cards })
            }
            Operation::ListColumn { column, page } => {
                let counters = store.counters();
                let cards = Page::slice(*page, store.in_column(*column, &counters))
                    .map(|i| Store::minimal(i, &counters))
                    .collect();
                Ok(Response::Cards { cards })
            }
            Operation::GetIssue { id } => {
                let counters = store.counters();
                let issue = store.full(store.get(id)?, &counters);
                Ok(Response::Issue { issue: Box::new(issue) })
            }
            Operation::ColumnCount { column } => {
                let counters = store.counters();
                let count = store.in_column(*column, &counters).count();
                Ok(Response::Count { count })
            }
        }
    }

    fn create(&self, store: &mut Store, issue: &NewIssue) -> Result<String> {
        issue.validate()?;
        let now = self.clock.now();
        let id = self.ids.generate_id();
        store.insert(IssueRecord {
            id: id.clone(),
            title: issue.title.clone(),
            description: issue.description.clone(),
            status: issue.status,
            priority: issue.priority.unwrap_or(DEFAULT_PRIORITY),
            issue_type: issue.issue_type,
            assignee: issue.assignee.clone(),
            created_at: now,
            updated_at: now,
            closed_at: (issue.status == Status::Closed).then_some(now),
            acceptance_criteria: issue.acceptance_criteria.clone(),
            design: issue.design.clone(),
            notes: issue.notes.clone(),
            external_ref: issue.external_ref.clone(),
            due_at: issue.due_at,
            defer_until: issue.defer_until,
            estimated_minutes: issue.estimated_minutes,
            labels: issue.labels.iter().filter(|l| !l.trim().is_empty()).cloned().collect(),
            comments: Vec::new(),
        })?;
        Ok(id)
    }

    fn update(&self, store: &mut Store, id: &str, update: &IssueUpdate) -> Result<()> {
        update.validate()?;
        let now = self.clock.now();
        let issue = store.get_mut(id)?;
        let IssueUpdate {
            title,
            description,
            priority,
            issue_type,
            assignee,
            acceptance_criteria,
            design,
            notes,
            external_ref,
            due_at,
            defer_until,
            estimated_minutes,
        } = update.clone();
        if let Some(v) = title {
            issue.title = v;
        }
        if let Some(v) = description {
            issue.description = v;
        }
        if let Some(v) = priority {
            issue.priority = v;
        }
        if let Some(v) = issue_type {
            issue.issue_type = v;
        }
        if let Some(v) = assignee {
            issue.assignee = v;
        }
        if let Some(v) = acceptance_criteria {
            issue.acceptance_criteria = v;
        }
        if let Some(v) = design {
            issue.design = v;
        }
        if let Some(v) = notes {
            issue.notes = v;
        }
        if let Some(v) = external_ref {
            issue.external_ref = v;
        }
        if let Some(v) = due_at {
            issue.due_at = v;
        }
        if let Some(v) = defer_until {
            issue.defer_until = v;
        }
        if let Some(v) = estimated_minutes {
            issue.estimated_minutes = v;
        }
        issue.updated_at = now;
        Ok(())
    }

    fn set_status(&self, store: &mut Store, id: &str, status: Status) -> Result<()> {
        let now = self.clock.now();
        let issue = store.get_mut(id)?;
        issue.closed_at = match status {
            Status::Closed => issue.closed_at.filter(|_| issue.status == Status::Closed).or(Some(now)),
            _ => None,
        };
        issue.status = status;
        issue.updated_at = now;
        Ok(())
    }

    fn add_dependency(store: &mut Store, from: &str, to: &str, kind: DependencyKind) -> Result<()> {
        store.get(from)?;
        store.get(to)?;
        if from == to {
            return Err(BoardError::invalid_input("an issue cannot depend on itself"));
        }
        let edge = Edge { from: from.to_string(), to: to.to_string(), kind };
        if store.edges.contains(&edge) {
            return Ok(());
        }
        match kind {
            DependencyKind::Blocks if store.blocks_transitively(to, from) => {
                return Err(BoardError::new(
                    ErrorKind::InvalidInput,
                    "dependency would create a cycle",
                ));
            }
            DependencyKind::Blocks => {}
            // A child has one parent; re-parenting replaces the old edge.
            DependencyKind::ParentChild => store
                .edges
                .retain(|e| !(e.kind == DependencyKind::ParentChild && e.to == to)),
        }
        store.edges.push(edge);
        Ok(())
    }
}

impl Dispatcher for MemoryBackend {
    fn send(&self, operation: &Operation) -> DispatchFuture<'_> {
        let response = self.handle(operation);
        Box::pin(async move { Ok(response) })
    }

    fn transport(&self) -> &'static str {
        "memory"
    }
}
