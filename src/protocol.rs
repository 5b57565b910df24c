//! Structured request/response records exchanged with the backend.
//!
//! Every operation is a typed record serialized as JSON. Free text travels
//! as JSON string values and is never spliced into a query or command line.

use serde::{Deserialize, Serialize};

use crate::error::{BoardError, ErrorKind};
use crate::model::{
    BoardColumn, DependencyKind, FullCard, IssueUpdate, MinimalCard, NewIssue, Page, Status,
};

/// Time-budget class of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationClass {
    /// Single-record mutation.
    Write,
    /// Single-record or aggregate read.
    Read,
    /// Large-dataset read.
    Bulk,
}

/// One logical backend call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Liveness probe.
    Ping,
    /// Create an issue; answered with [`Response::Created`].
    CreateIssue {
        /// Fields of the new issue.
        issue: NewIssue,
    },
    /// Merge the present fields into an existing issue.
    UpdateIssue {
        /// Issue to update.
        id: String,
        /// Fields to change.
        update: IssueUpdate,
    },
    /// Move an issue to a new status.
    SetStatus {
        /// Issue to move.
        id: String,
        /// Target status.
        status: Status,
    },
    /// Close an issue.
    CloseIssue {
        /// Issue to close.
        id: String,
    },
    /// Delete an issue and every edge that mentions it.
    DeleteIssue {
        /// Issue to delete.
        id: String,
    },
    /// Attach a label.
    AddLabel {
        /// Issue to label.
        id: String,
        /// Label text.
        label: String,
    },
    /// Detach a label.
    RemoveLabel {
        /// Issue to unlabel.
        id: String,
        /// Label text.
        label: String,
    },
    /// Add an edge `from -> to`.
    AddDependency {
        /// Blocker, or parent.
        from: String,
        /// Blocked issue, or child.
        to: String,
        /// Edge kind.
        kind: DependencyKind,
    },
    /// Remove an edge `from -> to`.
    RemoveDependency {
        /// Blocker, or parent.
        from: String,
        /// Blocked issue, or child.
        to: String,
        /// Edge kind.
        kind: DependencyKind,
    },
    /// Append a comment.
    AddComment {
        /// Issue to comment on.
        id: String,
        /// Comment body.
        text: String,
        /// Comment author.
        author: String,
    },
    /// Every issue, fully hydrated.
    ListBoard,
    /// Every issue, minimal tier.
    ListMinimal,
    /// One window of a column, minimal tier.
    ListColumn {
        /// Column to read.
        column: BoardColumn,
        /// Window into the column.
        page: Page,
    },
    /// One issue, full tier.
    GetIssue {
        /// Issue to fetch.
        id: String,
    },
    /// Number of issues in a column.
    ColumnCount {
        /// Column to count.
        column: BoardColumn,
    },
}

impl Operation {
    /// Stable name used in logs and cassettes.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::CreateIssue { .. } => "create_issue",
            Self::UpdateIssue { .. } => "update_issue",
            Self::SetStatus { .. } => "set_status",
            Self::CloseIssue { .. } => "close_issue",
            Self::DeleteIssue { .. } => "delete_issue",
            Self::AddLabel { .. } => "add_label",
            Self::RemoveLabel { .. } => "remove_label",
            Self::AddDependency { .. } => "add_dependency",
            Self::RemoveDependency { .. } => "remove_dependency",
            Self::AddComment { .. } => "add_comment",
            Self::ListBoard => "list_board",
            Self::ListMinimal => "list_minimal",
            Self::ListColumn { .. } => "list_column",
            Self::GetIssue { .. } => "get_issue",
            Self::ColumnCount { .. } => "column_count",
        }
    }

    /// Which timeout budget applies.
    #[must_use]
    pub fn class(&self) -> OperationClass {
        match self {
            Self::ListBoard | Self::ListMinimal | Self::ListColumn { .. } => OperationClass::Bulk,
            Self::Ping | Self::GetIssue { .. } | Self::ColumnCount { .. } => OperationClass::Read,
            _ => OperationClass::Write,
        }
    }
}

/// The backend's answer to one [`Operation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Reply to [`Operation::Ping`].
    Pong,
    /// The mutation was applied.
    Ack,
    /// An issue was created.
    Created {
        /// Backend-assigned identifier.
        id: String,
    },
    /// One fully hydrated issue.
    Issue {
        /// The issue.
        issue: Box<FullCard>,
    },
    /// Minimal cards, in backend order.
    Cards {
        /// The cards.
        cards: Vec<MinimalCard>,
    },
    /// Every issue, fully hydrated.
    Board {
        /// The issues.
        issues: Vec<FullCard>,
    },
    /// A column count.
    Count {
        /// Number of issues.
        count: usize,
    },
    /// The backend handled the request and refused it.
    Failure {
        /// Why the request was refused.
        kind: ErrorKind,
        /// Caller-safe description.
        message: String,
    },
}

impl Response {
    /// Builds a failure response from a typed error.
    #[must_use]
    pub fn failure(err: &BoardError) -> Self {
        Self::Failure { kind: err.kind(), message: err.message().to_string() }
    }

    pub(crate) fn into_ack(self) -> Option<()> {
        matches!(self, Self::Ack).then_some(())
    }

    pub(crate) fn into_created(self) -> Option<String> {
        match self {
            Self::Created { id } => Some(id),
            _ => None,
        }
    }

    pub(crate) fn into_issue(self) -> Option<FullCard> {
        match self {
            Self::Issue { issue } => Some(*issue),
            _ => None,
        }
    }

    pub(crate) fn into_cards(self) -> Option<Vec<MinimalCard>> {
        match self {
            Self::Cards { cards } => Some(cards),
            _ => None,
        }
    }

    pub(crate) fn into_board(self) -> Option<Vec<FullCard>> {
        match self {
            Self::Board { issues } => Some(issues),
            _ => None,
        }
    }

    pub(crate) fn into_count(self) -> Option<usize> {
        match self {
            Self::Count { count } => Some(count),
            _ => None,
        }
    }

    pub(crate) fn into_pong(self) -> Option<()> {
        matches!(self, Self::Pong).then_some(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn operations_are_tagged_records() {
        let op = Operation::AddComment {
            id: "bd-1".into(),
            text: "'; DROP TABLE issues; --".into(),
            author: "ana".into(),
        };
        let value = serde_json::to_value(&op).unwrap();
        assert_eq!(value["op"], "add_comment");
        assert_eq!(value["text"], "'; DROP TABLE issues; --");
        let back: Operation = serde_json::from_value(value).unwrap();
        assert_eq!(back, op);
    }

    #[test]
    fn bulk_reads_get_the_bulk_class() {
        assert_eq!(Operation::ListBoard.class(), OperationClass::Bulk);
        let page = Operation::ListColumn { column: BoardColumn::Ready, page: Page::new(0, 50) };
        assert_eq!(page.class(), OperationClass::Bulk);
        assert_eq!(Operation::GetIssue { id: "x".into() }.class(), OperationClass::Read);
        assert_eq!(Operation::CloseIssue { id: "x".into() }.class(), OperationClass::Write);
    }

    #[test]
    fn dependency_kind_uses_hyphenated_wire_name() {
        let op = Operation::AddDependency {
            from: "a".into(),
            to: "b".into(),
            kind: DependencyKind::ParentChild,
        };
        assert_eq!(serde_json::to_value(&op).unwrap()["kind"], "parent-child");
    }

    #[test]
    fn failure_response_decodes() {
        let response: Response = serde_json::from_value(json!({
            "type": "failure",
            "kind": "not_found",
            "message": "issue bd-9 not found"
        }))
        .unwrap();
        assert_eq!(
            response,
            Response::Failure { kind: ErrorKind::NotFound, message: "issue bd-9 not found".into() }
        );
    }

    #[test]
    fn shape_accessors_reject_other_variants() {
        assert_eq!(Response::Count { count: 3 }.into_count(), Some(3));
        assert_eq!(Response::Ack.into_count(), None);
        assert_eq!(Response::Pong.into_ack(), None);
    }
}
