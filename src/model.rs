//! Issue records, board columns and the two card tiers.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{BoardError, Result};

/// Lowest (most urgent) priority value.
pub const MIN_PRIORITY: u8 = 0;
/// Highest (least urgent) priority value.
pub const MAX_PRIORITY: u8 = 4;
/// Priority assigned when a new issue does not specify one.
pub const DEFAULT_PRIORITY: u8 = 2;

/// Workflow status of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Not started.
    #[default]
    Open,
    /// Being worked on.
    InProgress,
    /// Explicitly marked as blocked.
    Blocked,
    /// Done.
    Closed,
}

impl Status {
    /// All statuses, in workflow order.
    pub const ALL: [Self; 4] = [Self::Open, Self::InProgress, Self::Blocked, Self::Closed];

    /// Wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Blocked => "blocked",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| BoardError::invalid_input(format!("unknown status '{s}'")))
    }
}

/// Kind of work an issue represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    /// Something broken.
    Bug,
    /// New functionality.
    Feature,
    /// A unit of work.
    #[default]
    Task,
    /// A container for related issues.
    Epic,
    /// Maintenance.
    Chore,
}

impl IssueType {
    /// All issue types.
    pub const ALL: [Self; 5] = [Self::Bug, Self::Feature, Self::Task, Self::Epic, Self::Chore];

    /// Wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bug => "bug",
            Self::Feature => "feature",
            Self::Task => "task",
            Self::Epic => "epic",
            Self::Chore => "chore",
        }
    }
}

impl FromStr for IssueType {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| BoardError::invalid_input(format!("unknown issue type '{s}'")))
    }
}

/// Kind of edge between two issues.
///
/// Edges are directed `from -> to`: for `Blocks`, `from` blocks `to`; for
/// `ParentChild`, `from` is the parent of `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DependencyKind {
    /// `from` must close before `to` is ready.
    #[default]
    #[serde(rename = "blocks")]
    Blocks,
    /// `from` is the parent of `to`.
    #[serde(rename = "parent-child")]
    ParentChild,
}

impl FromStr for DependencyKind {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "blocks" => Ok(Self::Blocks),
            "parent-child" => Ok(Self::ParentChild),
            other => Err(BoardError::invalid_input(format!("unknown dependency kind '{other}'"))),
        }
    }
}

/// The four fixed board columns, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardColumn {
    /// Open with nothing unresolved blocking it.
    Ready,
    /// Being worked on.
    InProgress,
    /// Marked blocked, or open with an unresolved blocker.
    Blocked,
    /// Done.
    Closed,
}

impl BoardColumn {
    /// All columns in display order.
    pub const ALL: [Self; 4] = [Self::Ready, Self::InProgress, Self::Blocked, Self::Closed];

    /// Column key as used by the UI.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::InProgress => "in_progress",
            Self::Blocked => "blocked",
            Self::Closed => "closed",
        }
    }

    /// Filter predicate for this column.
    ///
    /// Every issue matches exactly one column.
    #[must_use]
    pub fn contains(self, status: Status, blocked_by_count: u32) -> bool {
        match self {
            Self::Ready => status == Status::Open && blocked_by_count == 0,
            Self::InProgress => status == Status::InProgress,
            Self::Blocked => {
                status == Status::Blocked || (status == Status::Open && blocked_by_count > 0)
            }
            Self::Closed => status == Status::Closed,
        }
    }

    /// The column a card belongs in.
    #[must_use]
    pub fn of(status: Status, blocked_by_count: u32) -> Self {
        match status {
            Status::Open if blocked_by_count == 0 => Self::Ready,
            Status::Open | Status::Blocked => Self::Blocked,
            Status::InProgress => Self::InProgress,
            Status::Closed => Self::Closed,
        }
    }
}

impl fmt::Display for BoardColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoardColumn {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|column| column.as_str() == s)
            .ok_or_else(|| BoardError::invalid_input(format!("unknown column '{s}'")))
    }
}

/// An offset/limit window into a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Page {
    /// Number of matching records to skip.
    pub offset: usize,
    /// Maximum number of records to return.
    pub limit: usize,
}

impl Page {
    /// Creates a page window.
    #[must_use]
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    /// Applies the window to an ordered iterator.
    pub fn slice<I: Iterator>(self, items: I) -> impl Iterator<Item = I::Item> {
        items.skip(self.offset).take(self.limit)
    }
}

/// A comment on an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Backend-assigned identifier.
    pub id: String,
    /// Who wrote it.
    pub author: String,
    /// Body text, stored verbatim.
    pub text: String,
    /// When it was added.
    pub created_at: DateTime<Utc>,
}

/// Lightweight reference to a related issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRef {
    /// Identifier of the related issue.
    pub id: String,
    /// Its title at read time.
    pub title: String,
}

/// The canonical stored row of an issue.
///
/// Relationships and derived fields (`is_ready`, `blocked_by_count`) are not
/// stored here; the backend computes them when projecting to a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    /// Backend-assigned identifier.
    pub id: String,
    /// Short summary.
    pub title: String,
    /// Long-form description.
    pub description: String,
    /// Workflow status.
    pub status: Status,
    /// Priority, 0 (highest) to 4.
    pub priority: u8,
    /// Kind of work.
    pub issue_type: IssueType,
    /// Who is working on it, if anyone.
    pub assignee: Option<String>,
    /// When it was created.
    pub created_at: DateTime<Utc>,
    /// When it last changed.
    pub updated_at: DateTime<Utc>,
    /// When it was closed; unset while not closed.
    pub closed_at: Option<DateTime<Utc>>,
    /// Conditions for calling it done.
    pub acceptance_criteria: String,
    /// Design notes.
    pub design: String,
    /// Free-form notes.
    pub notes: String,
    /// Reference into another tracker.
    pub external_ref: Option<String>,
    /// Deadline.
    pub due_at: Option<DateTime<Utc>>,
    /// Hidden from work queues until then.
    pub defer_until: Option<DateTime<Utc>>,
    /// Effort estimate.
    pub estimated_minutes: Option<u32>,
    /// Labels, kept sorted and unique.
    pub labels: BTreeSet<String>,
    /// Comments, oldest first.
    pub comments: Vec<Comment>,
}

/// Fields needed to render a board tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinimalCard {
    /// Backend-assigned identifier.
    pub id: String,
    /// Short summary.
    pub title: String,
    /// Workflow status.
    pub status: Status,
    /// Priority, 0 (highest) to 4.
    pub priority: u8,
    /// Kind of work.
    pub issue_type: IssueType,
    /// Who is working on it, if anyone.
    pub assignee: Option<String>,
    /// When it was created.
    pub created_at: DateTime<Utc>,
    /// When it last changed.
    pub updated_at: DateTime<Utc>,
    /// When it was closed; unset while not closed.
    pub closed_at: Option<DateTime<Utc>>,
    /// Open and not blocked by any unresolved issue.
    pub is_ready: bool,
    /// Number of unresolved issues blocking this one.
    pub blocked_by_count: u32,
    /// Number of issues this one blocks.
    pub blocks_count: u32,
}

impl MinimalCard {
    /// The column this card is displayed in.
    #[must_use]
    pub fn column(&self) -> BoardColumn {
        BoardColumn::of(self.status, self.blocked_by_count)
    }
}

/// A fully hydrated issue: the minimal card plus free text, relationships
/// and comments. Serializes as a flat superset of [`MinimalCard`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullCard {
    /// The minimal tier.
    #[serde(flatten)]
    pub card: MinimalCard,
    /// Long-form description.
    pub description: String,
    /// Conditions for calling it done.
    pub acceptance_criteria: String,
    /// Design notes.
    pub design: String,
    /// Free-form notes.
    pub notes: String,
    /// Reference into another tracker.
    pub external_ref: Option<String>,
    /// Deadline.
    pub due_at: Option<DateTime<Utc>>,
    /// Hidden from work queues until then.
    pub defer_until: Option<DateTime<Utc>>,
    /// Effort estimate.
    pub estimated_minutes: Option<u32>,
    /// Labels, in sorted order.
    pub labels: Vec<String>,
    /// Parent issue, if any.
    pub parent: Option<IssueRef>,
    /// Child issues.
    pub children: Vec<IssueRef>,
    /// Issues this one blocks.
    pub blocks: Vec<IssueRef>,
    /// Issues blocking this one, resolved or not.
    pub blocked_by: Vec<IssueRef>,
    /// Comments, oldest first.
    pub comments: Vec<Comment>,
}

/// One column of a full board snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnCards {
    /// Which column.
    pub column: BoardColumn,
    /// Cards in backend order.
    pub cards: Vec<FullCard>,
}

/// Every column with every card, fully hydrated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    /// The four columns, in display order.
    pub columns: Vec<ColumnCards>,
}

impl BoardSnapshot {
    /// Groups cards into the four columns, preserving their order.
    #[must_use]
    pub fn from_cards(cards: Vec<FullCard>) -> Self {
        let mut columns: Vec<ColumnCards> = BoardColumn::ALL
            .into_iter()
            .map(|column| ColumnCards { column, cards: Vec::new() })
            .collect();
        for card in cards {
            let column = card.card.column();
            if let Some(slot) = columns.iter_mut().find(|c| c.column == column) {
                slot.cards.push(card);
            }
        }
        Self { columns }
    }

    /// Cards in the given column.
    #[must_use]
    pub fn column(&self, column: BoardColumn) -> &[FullCard] {
        self.columns.iter().find(|c| c.column == column).map_or(&[], |c| c.cards.as_slice())
    }
}

/// Fields for a new issue.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewIssue {
    /// Short summary.
    pub title: String,
    /// Long-form description.
    pub description: String,
    /// Initial status.
    pub status: Status,
    /// Priority, 0 (highest) to 4; the backend default when unset.
    pub priority: Option<u8>,
    /// Kind of work.
    pub issue_type: IssueType,
    /// Who is working on it, if anyone.
    pub assignee: Option<String>,
    /// Conditions for calling it done.
    pub acceptance_criteria: String,
    /// Design notes.
    pub design: String,
    /// Free-form notes.
    pub notes: String,
    /// Reference into another tracker.
    pub external_ref: Option<String>,
    /// Deadline.
    pub due_at: Option<DateTime<Utc>>,
    /// Hidden from work queues until then.
    pub defer_until: Option<DateTime<Utc>>,
    /// Effort estimate.
    pub estimated_minutes: Option<u32>,
    /// Initial labels.
    pub labels: Vec<String>,
}

impl NewIssue {
    /// A new open task with the given title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self { title: title.into(), ..Self::default() }
    }

    /// Checks the documented constraints.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a blank title or an out-of-range priority.
    pub fn validate(&self) -> Result<()> {
        validate_title(&self.title)?;
        if let Some(priority) = self.priority {
            validate_priority(priority)?;
        }
        Ok(())
    }
}

/// A partial update; `None` leaves the field untouched.
///
/// Nullable fields use a nested option: `Some(None)` clears the value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueUpdate {
    /// New title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New priority.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    /// New kind of work.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<IssueType>,
    /// New assignee; `Some(None)` unassigns.
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "present")]
    pub assignee: Option<Option<String>>,
    /// New acceptance criteria.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acceptance_criteria: Option<String>,
    /// New design notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub design: Option<String>,
    /// New notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// New external reference; `Some(None)` clears it.
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "present")]
    pub external_ref: Option<Option<String>>,
    /// New deadline; `Some(None)` clears it.
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "present")]
    pub due_at: Option<Option<DateTime<Utc>>>,
    /// New deferral; `Some(None)` clears it.
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "present")]
    pub defer_until: Option<Option<DateTime<Utc>>>,
    /// New estimate; `Some(None)` clears it.
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "present")]
    pub estimated_minutes: Option<Option<u32>>,
}

impl IssueUpdate {
    /// Checks the documented constraints on the fields that are present.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a blank title or an out-of-range priority.
    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(priority) = self.priority {
            validate_priority(priority)?;
        }
        Ok(())
    }
}

/// Distinguishes an explicit `null` (clear) from an absent key (keep).
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub(crate) fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(BoardError::invalid_input("title must not be empty"));
    }
    Ok(())
}

pub(crate) fn validate_priority(priority: u8) -> Result<()> {
    if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&priority) {
        return Err(BoardError::invalid_input(format!(
            "priority must be between {MIN_PRIORITY} and {MAX_PRIORITY}"
        )));
    }
    Ok(())
}
