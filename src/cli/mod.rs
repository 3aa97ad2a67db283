//! CLI argument definitions for Clarity.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Clarity - A kanban task board.
///
/// Run `clarity serve` once, then drive the board from any terminal.
#[derive(Parser, Debug)]
#[command(name = "clarity")]
#[command(author, version, about = "A kanban task board with drag-and-drop reordering", long_about = None)]
#[command(long_version = concat!(
    env!("CARGO_PKG_VERSION"),
    " (", env!("CLARITY_GIT_COMMIT"), ", built ", env!("CLARITY_BUILD_TIMESTAMP"), ")"
))]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Board server URL (e.g. http://127.0.0.1:3030) [env: CLARITY_SERVER]
    #[arg(long = "server", global = true)]
    pub server_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the board HTTP server
    Serve(ServeArgs),

    /// Show the board, one column per category
    Show,

    /// Add a task at the end of a category
    Add {
        /// Task text
        content: String,

        /// Category ID (defaults to the first category)
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Mark a task as done
    Done {
        /// Task ID
        id: String,
    },

    /// Mark a task as not done
    Undone {
        /// Task ID
        id: String,
    },

    /// Delete a task
    Rm {
        /// Task ID
        id: String,
    },

    /// Drag a task onto another task or onto a category
    Mv {
        /// ID of the task being moved
        id: String,

        #[command(flatten)]
        target: MoveTarget,
    },

    /// Category management commands
    Category {
        #[command(subcommand)]
        command: CategoryCommands,
    },

    /// Show the resolved configuration and where each value came from
    Config,
}

/// Options for `clarity serve`
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Address to bind [env: CLARITY_HOST]
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on [env: CLARITY_PORT]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory holding board.db [env: CLARITY_DATA_DIR]
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

/// Where `clarity mv` drops the task. Exactly one is required.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct MoveTarget {
    /// Drop next to this task (below it when moving down, else above)
    #[arg(long = "over-task", value_name = "ID")]
    pub over_task: Option<String>,

    /// Drop onto this category's surface (appends to its end)
    #[arg(long = "over-category", value_name = "ID")]
    pub over_category: Option<String>,
}

/// Category subcommands
#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    /// Add a category
    Add {
        /// Category name
        name: String,
    },
}
