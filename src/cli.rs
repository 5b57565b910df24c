//! CLI argument definitions.

use clap::{Args, Parser, Subcommand};

use crate::model::{BoardColumn, DependencyKind, IssueType};

/// Top-level CLI parser for `boardgate`.
#[derive(Debug, Parser)]
#[command(name = "boardgate", version, about = "Resilient access to an issue board")]
pub struct Cli {
    /// Run against an empty in-memory backend instead of the workspace store.
    #[arg(long, global = true)]
    pub memory: bool,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print every column with fully hydrated cards.
    Board,
    /// Print every issue as a minimal card.
    Minimal,
    /// Print the number of issues in a column.
    Count {
        /// Column name: ready, in_progress, blocked or closed.
        #[arg(value_parser = parse_column)]
        column: BoardColumn,
    },
    /// Print one page of a column.
    Column {
        /// Column name: ready, in_progress, blocked or closed.
        #[arg(value_parser = parse_column)]
        column: BoardColumn,
        /// Cards to skip.
        #[arg(long, default_value_t = 0)]
        offset: usize,
        /// Maximum cards to return.
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Print one issue with all relationships.
    Show {
        /// Issue identifier.
        id: String,
    },
    /// Create an issue and print its identifier.
    Create(CreateArgs),
    /// Set an issue's status.
    Status {
        /// Issue identifier.
        id: String,
        /// New status: open, in_progress, blocked or closed.
        status: String,
    },
    /// Close an issue.
    Close {
        /// Issue identifier.
        id: String,
    },
    /// Delete an issue and its relationships.
    Delete {
        /// Issue identifier.
        id: String,
    },
    /// Add or remove a label.
    Label {
        /// Whether to add or remove.
        #[command(subcommand)]
        action: LabelAction,
    },
    /// Add or remove a dependency edge.
    Dep {
        /// Whether to add or remove.
        #[command(subcommand)]
        action: DepAction,
    },
    /// Append a comment to an issue.
    Comment {
        /// Issue identifier.
        id: String,
        /// Comment body.
        text: String,
        /// Comment author.
        #[arg(long, default_value = "boardgate")]
        author: String,
    },
}

/// Fields for `boardgate create`.
#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Issue title.
    #[arg(long)]
    pub title: String,
    /// Issue description.
    #[arg(long)]
    pub description: Option<String>,
    /// Priority, 0 (highest) to 4.
    #[arg(long)]
    pub priority: Option<u8>,
    /// Issue type: bug, feature, task, epic or chore.
    #[arg(long = "type", value_parser = parse_issue_type)]
    pub issue_type: Option<IssueType>,
}

/// `boardgate label` actions.
#[derive(Debug, Subcommand)]
pub enum LabelAction {
    /// Add a label.
    Add {
        /// Issue identifier.
        id: String,
        /// Label text.
        label: String,
    },
    /// Remove a label.
    Remove {
        /// Issue identifier.
        id: String,
        /// Label text.
        label: String,
    },
}

/// `boardgate dep` actions.
#[derive(Debug, Subcommand)]
pub enum DepAction {
    /// Add an edge `from -> to`.
    Add(EdgeArgs),
    /// Remove an edge `from -> to`.
    Remove(EdgeArgs),
}

/// Endpoints and kind of a dependency edge.
#[derive(Debug, Args)]
pub struct EdgeArgs {
    /// Blocking issue, or parent for parent-child.
    pub from: String,
    /// Blocked issue, or child for parent-child.
    pub to: String,
    /// Edge kind: blocks or parent-child.
    #[arg(long, default_value = "blocks", value_parser = parse_kind)]
    pub kind: DependencyKind,
}

fn parse_column(s: &str) -> Result<BoardColumn, String> {
    s.parse().map_err(|e: crate::error::BoardError| e.message().to_string())
}

fn parse_issue_type(s: &str) -> Result<IssueType, String> {
    s.parse().map_err(|e: crate::error::BoardError| e.message().to_string())
}

fn parse_kind(s: &str) -> Result<DependencyKind, String> {
    s.parse().map_err(|e: crate::error::BoardError| e.message().to_string())
}
