//! Mutating commands. Each prints a small JSON acknowledgement.

use serde_json::json;

use super::print_json;
use crate::board::BoardAccessor;
use crate::cli::{CreateArgs, DepAction, LabelAction};
use crate::error::BoardError;
use crate::model::NewIssue;

/// Creates an issue and prints `{"id": ...}`.
///
/// # Errors
///
/// Returns the accessor's error.
pub async fn create(accessor: &BoardAccessor, args: &CreateArgs) -> Result<(), BoardError> {
    let mut issue = NewIssue::titled(&args.title);
    if let Some(description) = &args.description {
        issue.description.clone_from(description);
    }
    issue.priority = args.priority;
    if let Some(issue_type) = args.issue_type {
        issue.issue_type = issue_type;
    }
    let id = accessor.create_issue(issue).await?;
    print_json(&json!({ "id": id }))
}

/// Sets an issue's status.
///
/// # Errors
///
/// Returns the accessor's error.
pub async fn status(accessor: &BoardAccessor, id: &str, status: &str) -> Result<(), BoardError> {
    accessor.set_issue_status(id, status).await?;
    print_json(&json!({ "id": id, "status": status }))
}

/// Closes an issue.
///
/// # Errors
///
/// Returns the accessor's error.
pub async fn close(accessor: &BoardAccessor, id: &str) -> Result<(), BoardError> {
    accessor.close_issue(id).await?;
    print_json(&json!({ "id": id, "status": "closed" }))
}

/// Deletes an issue.
///
/// # Errors
///
/// Returns the accessor's error.
pub async fn delete(accessor: &BoardAccessor, id: &str) -> Result<(), BoardError> {
    accessor.delete_issue(id).await?;
    print_json(&json!({ "id": id, "deleted": true }))
}

/// Adds or removes a label.
///
/// # Errors
///
/// Returns the accessor's error.
pub async fn label(accessor: &BoardAccessor, action: &LabelAction) -> Result<(), BoardError> {
    match action {
        LabelAction::Add { id, label } => {
            accessor.add_label(id, label).await?;
            print_json(&json!({ "id": id, "added": label }))
        }
        LabelAction::Remove { id, label } => {
            accessor.remove_label(id, label).await?;
            print_json(&json!({ "id": id, "removed": label }))
        }
    }
}

/// Adds or removes a dependency edge.
///
/// # Errors
///
/// Returns the accessor's error.
pub async fn dep(accessor: &BoardAccessor, action: &DepAction) -> Result<(), BoardError> {
    match action {
        DepAction::Add(edge) => {
            accessor.add_dependency(&edge.from, &edge.to, edge.kind).await?;
            print_json(&json!({ "from": edge.from, "to": edge.to, "kind": edge.kind, "added": true }))
        }
        DepAction::Remove(edge) => {
            accessor.remove_dependency(&edge.from, &edge.to, edge.kind).await?;
            print_json(&json!({ "from": edge.from, "to": edge.to, "kind": edge.kind, "removed": true }))
        }
    }
}

/// Appends a comment.
///
/// # Errors
///
/// Returns the accessor's error.
pub async fn comment(
    accessor: &BoardAccessor,
    id: &str,
    text: &str,
    author: &str,
) -> Result<(), BoardError> {
    accessor.add_comment(id, text, author).await?;
    print_json(&json!({ "id": id, "commented": true }))
}
