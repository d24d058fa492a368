//! Command implementations for the CLI interface.
//!
//! Handlers resolve user input, call the store and render the result;
//! every status and tree rule stays inside `TaskStore`, so a rejected
//! operation surfaces here only as a printed error.

use clap::Subcommand;
use clap_complete::{generate, Shell};

use std::collections::HashSet;

use chrono::{Datelike, Duration, Local, NaiveDate, TimeZone, Utc};

use crate::fields::*;
use crate::store::TaskStore;
use crate::task::{Task, TaskDraft};
use crate::tui::run::run_board_tui;

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the kanban board interface.
    Board,

    /// Add a new task.
    Add {
        /// Short title for the task.
        title: String,
        /// Optional longer description.
        #[arg(long)]
        desc: Option<String>,
        /// Effort estimate: small | medium | large.
        #[arg(long, value_enum)]
        size: Option<Size>,
        /// Importance: low | medium | high.
        #[arg(long, value_enum)]
        importance: Option<Importance>,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", or "in Nd".
        #[arg(long)]
        due: Option<String>,
        /// Parent task ID or title.
        #[arg(long)]
        parent: Option<String>,
    },

    /// List tasks as a tree, or as a flat table when filtering.
    List {
        /// Include completed tasks.
        #[arg(long)]
        all: bool,
        /// Filter by status (switches to a flat table).
        #[arg(long, value_enum)]
        status: Option<Status>,
        /// Due filter: today | this-week | overdue | none (flat table).
        #[arg(long, value_enum)]
        due: Option<DueFilter>,
        /// Ignore collapse flags and show every subtree.
        #[arg(long)]
        expand: bool,
    },

    /// View a single task by ID or title.
    View {
        /// Task ID or title to view
        id: String,
        /// Show child subtree.
        #[arg(long)]
        children: bool,
        /// Show ancestor chain.
        #[arg(long)]
        parents: bool,
    },

    /// Update fields on a task.
    Update {
        /// Task ID or title to update
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long, value_enum)]
        size: Option<Size>,
        #[arg(long, value_enum)]
        importance: Option<Importance>,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", or "in Nd".
        #[arg(long)]
        due: Option<String>,
        /// Clear the due date.
        #[arg(long)]
        clear_due: bool,
        /// Clear the size.
        #[arg(long)]
        clear_size: bool,
        /// Clear the importance.
        #[arg(long)]
        clear_importance: bool,
    },

    /// Start working on a task (backlog -> in progress; leaf tasks only).
    Start {
        /// Task ID or title to start
        id: String,
    },

    /// Complete a task together with its whole subtree.
    Complete {
        /// Task ID or title to complete
        id: String,
        /// Achievement note recorded with the completion.
        #[arg(long)]
        achievement: Option<String>,
    },

    /// Put an in-progress task back into the backlog.
    Revert {
        /// Task ID or title to revert
        id: String,
    },

    /// Reopen a completed task (its children stay completed).
    Reopen {
        /// Task ID or title to reopen
        id: String,
    },

    /// Collapse or expand a task's subtree in list output.
    Collapse {
        /// Task ID or title to toggle
        id: String,
    },

    /// Delete a task by ID or title.
    Delete {
        /// Task ID or title to delete
        id: String,
        /// Cascade into all descendants.
        #[arg(long)]
        cascade: bool,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Resolve a task identifier (either ID or title) to a task ID.
/// Returns an error if the title has multiple matches and suggests using the ID instead.
pub fn resolve_task(identifier: &str, store: &TaskStore) -> Result<u64, String> {
    // Try parsing as ID first
    if let Ok(id) = identifier.parse::<u64>() {
        if store.get(id).is_some() {
            return Ok(id);
        }
        return Err(format!("Task with ID {} not found", id));
    }

    // Search by title (case-insensitive)
    let matches: Vec<&Task> = store
        .tasks()
        .iter()
        .filter(|t| t.title.to_lowercase() == identifier.to_lowercase())
        .collect();

    match matches.len() {
        0 => Err(format!("No task found with title '{}'", identifier)),
        1 => Ok(matches[0].id),
        _ => {
            let mut msg = format!("Multiple tasks found with title '{}':\n", identifier);
            for t in matches {
                msg.push_str(&format!("  ID {}: {} [{}]\n", t.id, t.title, t.status.label()));
            }
            msg.push_str("Please use the specific ID instead.");
            Err(msg)
        }
    }
}

fn resolve_or_exit(identifier: &str, store: &TaskStore) -> u64 {
    match resolve_task(identifier, store) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("Error resolving task: {}", e);
            std::process::exit(1);
        }
    }
}

/// Launch the kanban board.
pub fn cmd_board(store: TaskStore) {
    if let Err(e) = run_board_tui(store) {
        eprintln!("Board error: {e}");
        std::process::exit(1);
    }
}

/// Add a new task, optionally under a parent.
pub fn cmd_add(
    store: &mut TaskStore,
    title: String,
    desc: Option<String>,
    size: Option<Size>,
    importance: Option<Importance>,
    due: Option<String>,
    parent: Option<String>,
) {
    let parent_id = match parent {
        Some(ref p) => match resolve_task(p, store) {
            Ok(pid) => Some(pid),
            Err(e) => {
                eprintln!("Error resolving parent: {}", e);
                std::process::exit(1);
            }
        },
        None => None,
    };
    let due = match due {
        Some(ref s) => match parse_due_input(s) {
            Some(d) => Some(d),
            None => {
                eprintln!("Unrecognised due date. Use YYYY-MM-DD, 'today', 'tomorrow', or 'in Nd'.");
                std::process::exit(1);
            }
        },
        None => None,
    };
    let draft = TaskDraft {
        title,
        size,
        importance,
        due,
        description: desc.unwrap_or_default(),
    };
    match store.add_task(draft, parent_id) {
        Ok(id) => println!("Added task {}", id),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// List tasks: an indented tree by default, a flat table when filtering.
pub fn cmd_list(
    store: &TaskStore,
    all: bool,
    status: Option<Status>,
    due: Option<DueFilter>,
    expand: bool,
) {
    if status.is_some() || due.is_some() {
        list_flat(store, all, status, due);
    } else {
        list_tree(store, all, expand);
    }
}

fn list_flat(store: &TaskStore, all: bool, status: Option<Status>, due: Option<DueFilter>) {
    let today = Local::now().date_naive();
    let (week_start, week_end) = start_end_of_this_week(today);
    let filtered: Vec<&Task> = store
        .tasks()
        .iter()
        .filter(|t| {
            // An explicit status filter overrides the completed-hiding default.
            if !all && status.is_none() && t.status == Status::Completed {
                return false;
            }
            if let Some(s) = status {
                if t.status != s {
                    return false;
                }
            }
            if let Some(df) = due {
                match df {
                    DueFilter::Today => {
                        if t.due != Some(today) {
                            return false;
                        }
                    }
                    DueFilter::ThisWeek => match t.due {
                        Some(d) if d >= week_start && d <= week_end => {}
                        _ => return false,
                    },
                    DueFilter::Overdue => match t.due {
                        Some(d) if d < today => {}
                        _ => return false,
                    },
                    DueFilter::None => {
                        if t.due.is_some() {
                            return false;
                        }
                    }
                }
            }
            true
        })
        .collect();
    if filtered.is_empty() {
        println!("No tasks.");
        return;
    }
    print_header();
    for t in filtered {
        print_row(t, 0, today, "");
    }
}

fn list_tree(store: &TaskStore, all: bool, expand: bool) {
    let today = Local::now().date_naive();
    let roots: Vec<&Task> = store.tasks().iter().filter(|t| t.parent.is_none()).collect();
    if !roots.iter().any(|r| visible_in_tree(r, all)) {
        println!("No tasks.");
        return;
    }
    print_header();
    for r in roots {
        print_subtree(store, r, 0, all, expand, today);
    }
}

fn visible_in_tree(t: &Task, all: bool) -> bool {
    all || t.status != Status::Completed
}

fn print_subtree(
    store: &TaskStore,
    t: &Task,
    depth: usize,
    all: bool,
    expand: bool,
    today: NaiveDate,
) {
    if !visible_in_tree(t, all) {
        return;
    }
    let folded = t.collapsed && !expand && !t.children.is_empty();
    let marker = if folded {
        let mut hidden = HashSet::new();
        store.collect_descendants(t.id, None, &mut hidden);
        format!(" [+{} hidden]", hidden.len())
    } else {
        String::new()
    };
    print_row(t, depth, today, &marker);
    if folded {
        return;
    }
    for &c in &t.children {
        if let Some(child) = store.get(c) {
            print_subtree(store, child, depth + 1, all, expand, today);
        }
    }
}

fn print_header() {
    println!(
        "{:<5} {:<13} {:<7} {:<7} {:<10} {}",
        "ID", "Status", "Size", "Imp", "Due", "Title"
    );
}

fn print_row(t: &Task, depth: usize, today: NaiveDate, marker: &str) {
    println!(
        "{:<5} {:<13} {:<7} {:<7} {:<10} {}{}{}",
        t.id,
        t.status.label(),
        t.size.map(Size::label).unwrap_or("-"),
        t.importance.map(Importance::label).unwrap_or("-"),
        format_due_relative(t.due, today),
        "  ".repeat(depth),
        t.title,
        marker
    );
}

/// Print a single task's fields, optionally with its subtree and ancestors.
pub fn cmd_view(store: &TaskStore, id: String, children: bool, parents: bool) {
    let task_id = resolve_or_exit(&id, store);
    let Some(task) = store.get(task_id) else {
        eprintln!("Task {} not found.", task_id);
        std::process::exit(1);
    };
    let today = Local::now().date_naive();
    println!("ID:           {}", task.id);
    println!("Title:        {}", task.title);
    println!("Status:       {}", task.status.label());
    println!("Size:         {}", task.size.map(Size::label).unwrap_or("-"));
    println!("Importance:   {}", task.importance.map(Importance::label).unwrap_or("-"));
    println!(
        "Due:          {}",
        match task.due {
            Some(d) => format!("{d} ({})", format_due_relative(Some(d), today)),
            None => "-".into(),
        }
    );
    println!(
        "Parent:       {}",
        task.parent.map(|p| p.to_string()).unwrap_or_else(|| "-".into())
    );
    println!("Collapsed:    {}", if task.collapsed { "yes" } else { "no" });
    println!(
        "Created UTC:  {}",
        Utc.timestamp_opt(task.created_at_utc, 0).single().unwrap().to_rfc3339()
    );
    println!(
        "Updated UTC:  {}",
        Utc.timestamp_opt(task.updated_at_utc, 0).single().unwrap().to_rfc3339()
    );
    if let Some(ts) = task.completed_at_utc {
        println!(
            "Completed:    {}",
            Utc.timestamp_opt(ts, 0).single().unwrap().to_rfc3339()
        );
        println!("Achievement:  {}", task.achievement);
    }
    println!(
        "Description:\n{}\n",
        if task.description.is_empty() {
            "-"
        } else {
            task.description.as_str()
        }
    );

    if parents {
        let mut chain = Vec::new();
        let mut cur = task.parent;
        while let Some(p) = cur {
            chain.push(p);
            cur = store.get(p).and_then(|t| t.parent);
        }
        if chain.is_empty() {
            println!("Ancestors: -");
        } else {
            println!(
                "Ancestors (closest first): {}",
                chain.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(" -> ")
            );
        }
    }

    if children {
        println!("Children:");
        if task.children.is_empty() {
            println!("  -");
        } else {
            print_child_tree(store, task_id, 1);
        }
    }
}

fn print_child_tree(store: &TaskStore, id: u64, depth: usize) {
    if let Some(t) = store.get(id) {
        for &c in &t.children {
            if let Some(child) = store.get(c) {
                println!(
                    "{}- {} [{}] (#{})",
                    "  ".repeat(depth),
                    child.title,
                    child.status.label(),
                    child.id
                );
                print_child_tree(store, c, depth + 1);
            }
        }
    }
}

/// Update fields on an existing task.
pub fn cmd_update(
    store: &mut TaskStore,
    id: String,
    title: Option<String>,
    desc: Option<String>,
    size: Option<Size>,
    importance: Option<Importance>,
    due: Option<String>,
    clear_due: bool,
    clear_size: bool,
    clear_importance: bool,
) {
    let task_id = resolve_or_exit(&id, store);
    let Some(current) = store.get(task_id) else {
        eprintln!("Task {} not found.", task_id);
        std::process::exit(1);
    };
    // The store overwrites the whole draft, so start from the current values.
    let mut draft = TaskDraft {
        title: current.title.clone(),
        size: current.size,
        importance: current.importance,
        due: current.due,
        description: current.description.clone(),
    };
    if let Some(s) = title {
        draft.title = s;
    }
    if let Some(d) = desc {
        draft.description = d;
    }
    if clear_size {
        draft.size = None;
    }
    if let Some(s) = size {
        draft.size = Some(s);
    }
    if clear_importance {
        draft.importance = None;
    }
    if let Some(i) = importance {
        draft.importance = Some(i);
    }
    if clear_due {
        draft.due = None;
    }
    if let Some(ds) = due {
        match parse_due_input(&ds) {
            Some(d) => draft.due = Some(d),
            None => {
                eprintln!("Unrecognised due date. Use YYYY-MM-DD, 'today', 'tomorrow', or 'in Nd'.");
                std::process::exit(1);
            }
        }
    }
    match store.update_task(task_id, draft) {
        Ok(()) => println!("Updated task {}", task_id),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Move a backlog task to in progress.
pub fn cmd_start(store: &mut TaskStore, id: String) {
    let task_id = resolve_or_exit(&id, store);
    if let Some(t) = store.get(task_id) {
        if t.status != Status::Backlog {
            eprintln!("Task {} is not in the backlog ({}).", task_id, t.status.label());
            std::process::exit(1);
        }
    }
    match store.set_status(task_id, Status::InProgress, None) {
        Ok(()) => println!("Started task {}", task_id),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Complete a task; the store cascades through its subtree.
pub fn cmd_complete(store: &mut TaskStore, id: String, achievement: Option<String>) {
    let task_id = resolve_or_exit(&id, store);
    let mut subtree = HashSet::new();
    store.collect_descendants(task_id, None, &mut subtree);
    match store.set_status(task_id, Status::Completed, achievement.as_deref()) {
        Ok(()) => {
            if subtree.is_empty() {
                println!("Completed task {}", task_id);
            } else {
                println!("Completed task {} and {} descendant(s)", task_id, subtree.len());
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Put an in-progress task back into the backlog.
pub fn cmd_revert(store: &mut TaskStore, id: String) {
    let task_id = resolve_or_exit(&id, store);
    match store.set_status(task_id, Status::Backlog, None) {
        Ok(()) => println!("Reverted task {} to backlog", task_id),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Reopen a completed task without touching its children.
pub fn cmd_reopen(store: &mut TaskStore, id: String) {
    let task_id = resolve_or_exit(&id, store);
    if let Some(t) = store.get(task_id) {
        if t.status != Status::Completed {
            eprintln!("Task {} is not completed ({}).", task_id, t.status.label());
            std::process::exit(1);
        }
    }
    match store.set_status(task_id, Status::InProgress, None) {
        Ok(()) => println!("Reopened task {}", task_id),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Toggle the collapse display flag on a task.
pub fn cmd_collapse(store: &mut TaskStore, id: String) {
    let task_id = resolve_or_exit(&id, store);
    match store.toggle_collapse(task_id) {
        Ok(()) => {
            let collapsed = store.get(task_id).map(|t| t.collapsed).unwrap_or(false);
            if collapsed {
                println!("Collapsed task {}", task_id);
            } else {
                println!("Expanded task {}", task_id);
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Delete a task, cascading to all descendants.
pub fn cmd_delete(store: &mut TaskStore, id: String, cascade: bool) {
    let task_id = resolve_or_exit(&id, store);
    let mut descendants = HashSet::new();
    store.collect_descendants(task_id, None, &mut descendants);
    if !descendants.is_empty() && !cascade {
        eprintln!(
            "Task {} has {} descendant(s). Use --cascade to delete all.",
            task_id,
            descendants.len()
        );
        std::process::exit(1);
    }
    match store.delete_task(task_id) {
        Ok(()) => {
            if descendants.is_empty() {
                println!("Deleted task {}", task_id);
            } else {
                println!("Deleted task {} and {} descendant(s)", task_id, descendants.len());
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

/// Parse human-readable due date input.
///
/// Supports:
/// - "today", "tomorrow", "yesterday"
/// - "end of week" / "eow", "end of month" / "eom"
/// - "in 3d", "in 2w"
/// - "YYYY-MM-DD" format
pub fn parse_due_input(s: &str) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();
    let today = Local::now().date_naive();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "yesterday" => return Some(today - Duration::days(1)),
        "end of week" | "eow" => {
            let (_, end) = start_end_of_this_week(today);
            return Some(end);
        }
        "end of month" | "eom" => {
            // Last day of current month
            let year = today.year();
            let month = today.month();
            let next_month = if month == 12 { 1 } else { month + 1 };
            let next_year = if month == 12 { year + 1 } else { year };
            let first_of_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)?;
            return Some(first_of_next - Duration::days(1));
        }
        _ => {}
    }

    // "in X" patterns
    if let Some(rest) = s.strip_prefix("in ") {
        if let Some(nd) = rest.strip_suffix("d") {
            if let Ok(days) = nd.trim().parse::<i64>() {
                return Some(today + Duration::days(days));
            }
        }
        if let Some(nw) = rest.strip_suffix("w") {
            if let Ok(weeks) = nw.trim().parse::<i64>() {
                return Some(today + Duration::weeks(weeks));
            }
        }
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// Calculate the start and end dates of the current ISO week (Monday to Sunday).
pub fn start_end_of_this_week(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    // ISO week: Monday start.
    let weekday = today.weekday().num_days_from_monday() as i64;
    let start = today - Duration::days(weekday);
    let end = start + Duration::days(6);
    (start, end)
}

/// Format a due date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: Option<NaiveDate>, today: NaiveDate) -> String {
    match due {
        None => "-".into(),
        Some(d) => {
            let delta = d - today;
            if delta.num_days() == 0 {
                "today".into()
            } else if delta.num_days() == 1 {
                "tomorrow".into()
            } else if delta.num_days() > 1 {
                format!("in {}d", delta.num_days())
            } else {
                format!("{}d late", -delta.num_days())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_parse_due_input() {
        let today = Local::now().date_naive();
        assert_eq!(parse_due_input("today"), Some(today));
        assert_eq!(parse_due_input("Tomorrow"), Some(today + Duration::days(1)));
        assert_eq!(parse_due_input("in 3d"), Some(today + Duration::days(3)));
        assert_eq!(parse_due_input("in 2w"), Some(today + Duration::weeks(2)));
        assert_eq!(
            parse_due_input("2026-09-15"),
            NaiveDate::from_ymd_opt(2026, 9, 15)
        );
        assert_eq!(parse_due_input("next lifetime"), None);
    }

    #[test]
    fn test_end_of_month_is_last_day() {
        let eom = parse_due_input("eom").unwrap();
        assert_eq!((eom + Duration::days(1)).day(), 1);
    }

    #[test]
    fn test_week_bounds_monday_to_sunday() {
        let wednesday = NaiveDate::from_ymd_opt(2026, 8, 26).unwrap();
        let (start, end) = start_end_of_this_week(wednesday);
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 8, 24).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2026, 8, 30).unwrap());
    }

    #[test]
    fn test_format_due_relative() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 25).unwrap();
        assert_eq!(format_due_relative(None, today), "-");
        assert_eq!(format_due_relative(Some(today), today), "today");
        assert_eq!(
            format_due_relative(Some(today + Duration::days(1)), today),
            "tomorrow"
        );
        assert_eq!(
            format_due_relative(Some(today + Duration::days(5)), today),
            "in 5d"
        );
        assert_eq!(
            format_due_relative(Some(today - Duration::days(2)), today),
            "2d late"
        );
    }

    #[test]
    fn test_resolve_task_by_id_and_title() {
        let mut s = TaskStore::open(Box::new(MemoryStorage::default()));
        let a = s
            .add_task(
                TaskDraft {
                    title: "Write docs".to_string(),
                    ..TaskDraft::default()
                },
                None,
            )
            .unwrap();
        assert_eq!(resolve_task(&a.to_string(), &s), Ok(a));
        assert_eq!(resolve_task("write docs", &s), Ok(a));
        assert!(resolve_task("99", &s).is_err());
        assert!(resolve_task("no such task", &s).is_err());
    }

    #[test]
    fn test_resolve_ambiguous_title_is_error() {
        let mut s = TaskStore::open(Box::new(MemoryStorage::default()));
        for _ in 0..2 {
            s.add_task(
                TaskDraft {
                    title: "dup".to_string(),
                    ..TaskDraft::default()
                },
                None,
            )
            .unwrap();
        }
        let err = resolve_task("dup", &s).unwrap_err();
        assert!(err.contains("Multiple tasks"));
    }
}
