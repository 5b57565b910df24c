//! Read-only commands: `board`, `minimal`, `count`, `column`, `show`.

use serde_json::json;

use super::print_json;
use crate::board::BoardAccessor;
use crate::error::BoardError;
use crate::model::BoardColumn;

/// Prints every column with fully hydrated cards.
///
/// # Errors
///
/// Returns the accessor's error.
pub async fn board(accessor: &BoardAccessor) -> Result<(), BoardError> {
    print_json(&accessor.get_board().await?)
}

/// Prints every issue as a minimal card.
///
/// # Errors
///
/// Returns the accessor's error.
pub async fn minimal(accessor: &BoardAccessor) -> Result<(), BoardError> {
    print_json(&accessor.get_board_minimal().await?)
}

/// Prints `{"column": ..., "count": N}`.
///
/// # Errors
///
/// Returns the accessor's error.
pub async fn count(accessor: &BoardAccessor, column: BoardColumn) -> Result<(), BoardError> {
    let count = accessor.get_column_count(column).await?;
    print_json(&json!({ "column": column, "count": count }))
}

/// Prints one page of minimal cards.
///
/// # Errors
///
/// Returns the accessor's error.
pub async fn column(
    accessor: &BoardAccessor,
    column: BoardColumn,
    offset: usize,
    limit: usize,
) -> Result<(), BoardError> {
    print_json(&accessor.get_column_data(column, offset, limit).await?)
}

/// Prints one issue, full tier.
///
/// # Errors
///
/// Returns the accessor's error.
pub async fn show(accessor: &BoardAccessor, id: &str) -> Result<(), BoardError> {
    print_json(&accessor.get_issue_full(id).await?)
}
