//! # tdt - hierarchical to-do list manager
//!
//! A terminal to-do manager where tasks form a forest: any task can own
//! child tasks, recursively. The status machinery is tree-aware — starting
//! a child flags every ancestor, completing a task completes its whole
//! subtree in one step, and deleting a task removes the subtree with it.
//!
//! ## Key Features
//!
//! - **Task trees**: unlimited nesting, with per-task collapse for list views
//! - **Tree-aware status**: backlog / in progress / child active / completed,
//!   derived upwards automatically; only leaf tasks can be started
//! - **Cascading completion**: one command completes a whole subtree and
//!   records an achievement note with a shared completion time
//! - **Multiple Interfaces**: full CLI for automation + a kanban board TUI
//! - **Local File Storage**: one simple JSON file, written atomically
//!
//! ## Quick Start
//!
//! ```bash
//! # Add a root task, then a child under it
//! tdt add "Ship the release"
//! tdt add "Write changelog" --parent "Ship the release" --due tomorrow
//!
//! # Work the child; the parent is flagged automatically
//! tdt start "Write changelog"
//! tdt complete "Write changelog" --achievement "covers 0.6"
//!
//! # See the tree, or the board
//! tdt list
//! tdt board
//! ```
//!
//! ## Key Commands
//!
//! - `tdt add <title>` - create a task, optionally under `--parent`
//! - `tdt list` - tree view; `--status` / `--due` switch to a flat table
//! - `tdt start | complete | revert | reopen <task>` - move a task through
//!   its lifecycle (the store enforces the legal transitions)
//! - `tdt delete <task> --cascade` - remove a whole subtree
//! - `tdt board` - three-column kanban board TUI
//!
//! Data is stored locally in `~/.todotree/tasks.json` (override with `--db`).
//! We recommend you source control this folder via `git init` and back it up
//! periodically.

use std::path::PathBuf;

use clap::Parser;

pub mod cli;
pub mod cmd;
pub mod fields;
pub mod storage;
pub mod store;
pub mod task;
pub mod tui {
    pub mod board;
    pub mod colors;
    pub mod run;
}

use cli::Cli;
use cmd::*;
use storage::JsonFile;
use store::TaskStore;

fn main() {
    let cli = Cli::parse();

    let db_path = match cli.db {
        Some(path) => path,
        None => {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            let dir = PathBuf::from(home).join(".todotree");
            if let Err(e) = std::fs::create_dir_all(&dir) {
                eprintln!("Failed to create data directory {}: {}", dir.display(), e);
                std::process::exit(1);
            }
            dir.join("tasks.json")
        }
    };

    let mut store = TaskStore::open(Box::new(JsonFile::new(db_path)));

    match cli.command {
        Commands::Board => cmd_board(store),

        Commands::Add { title, desc, size, importance, due, parent } =>
            cmd_add(&mut store, title, desc, size, importance, due, parent),

        Commands::List { all, status, due, expand } =>
            cmd_list(&store, all, status, due, expand),

        Commands::View { id, children, parents } => cmd_view(&store, id, children, parents),

        Commands::Update {
            id, title, desc, size, importance, due, clear_due, clear_size, clear_importance,
        } => cmd_update(
            &mut store, id, title, desc, size, importance, due,
            clear_due, clear_size, clear_importance,
        ),

        Commands::Start { id } => cmd_start(&mut store, id),

        Commands::Complete { id, achievement } => cmd_complete(&mut store, id, achievement),

        Commands::Revert { id } => cmd_revert(&mut store, id),

        Commands::Reopen { id } => cmd_reopen(&mut store, id),

        Commands::Collapse { id } => cmd_collapse(&mut store, id),

        Commands::Delete { id, cascade } => cmd_delete(&mut store, id, cascade),

        Commands::Completions { shell } => cmd_completions(shell),
    }
}
