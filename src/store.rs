//! The task tree store: status state machine and tree maintenance.
//!
//! `TaskStore` owns the in-memory collection and is the only place that
//! mutates it. Status propagation between parents and children, completion
//! cascades and delete cascades all live here; the CLI and the board only
//! call these operations and render the result. After every successful
//! mutation the full collection is handed to the storage backend.

use std::collections::HashSet;

use chrono::Utc;
use thiserror::Error;

use crate::fields::Status;
use crate::storage::Storage;
use crate::task::{Task, TaskDraft};

/// Completion note used when the caller does not supply one.
pub const DEFAULT_ACHIEVEMENT: &str = "done";
/// Note attached to descendants completed by a parent's cascade.
pub const AUTO_ACHIEVEMENT: &str = "auto-completed because parent completed";

/// Errors surfaced by store operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("task {0} not found")]
    NotFound(u64),
    #[error("cannot change status from {from} to {to}")]
    InvalidTransition { from: Status, to: Status },
    #[error("parent task {0} does not exist")]
    InvalidReference(u64),
    #[error("task title must not be empty")]
    EmptyTitle,
}

/// In-memory store for the task forest, persisted through a `Storage`
/// backend after each mutation.
pub struct TaskStore {
    tasks: Vec<Task>,
    storage: Box<dyn Storage>,
}

impl TaskStore {
    /// Open a store over the given backend, loading whatever it holds.
    pub fn open(mut storage: Box<dyn Storage>) -> Self {
        let tasks = storage.load();
        TaskStore { tasks, storage }
    }

    /// All tasks, newest first.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Get a task by ID.
    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn get_mut(&mut self, id: u64) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Generate the next available task ID.
    pub fn next_id(&self) -> u64 {
        self.tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1
    }

    fn persist(&mut self) {
        self.storage.save(&self.tasks);
    }

    /// Create a task from the draft, optionally under a parent.
    ///
    /// The title is trimmed and must be non-empty; the parent, if given,
    /// must exist (no orphan is created otherwise). New tasks start in
    /// backlog at the front of the collection. An in-progress parent is no
    /// longer a leaf, so it is flagged as having an active child right away.
    pub fn add_task(&mut self, draft: TaskDraft, parent: Option<u64>) -> Result<u64, StoreError> {
        let title = draft.title.trim().to_string();
        if title.is_empty() {
            return Err(StoreError::EmptyTitle);
        }
        if let Some(p) = parent {
            if self.get(p).is_none() {
                return Err(StoreError::InvalidReference(p));
            }
        }
        let id = self.next_id();
        let now = Utc::now().timestamp();
        let task = Task {
            id,
            title,
            size: draft.size,
            importance: draft.importance,
            due: draft.due,
            description: draft.description,
            status: Status::Backlog,
            completed_at_utc: None,
            achievement: String::new(),
            parent,
            children: Vec::new(),
            collapsed: false,
            created_at_utc: now,
            updated_at_utc: now,
        };
        self.tasks.insert(0, task);
        if let Some(p) = parent {
            if let Some(pt) = self.get_mut(p) {
                pt.children.push(id);
                if pt.status == Status::InProgress {
                    pt.status = Status::HasInProgressChild;
                }
                pt.updated_at_utc = now;
            }
        }
        self.persist();
        Ok(id)
    }

    /// Overwrite the editable fields (title, size, importance, due,
    /// description). Status and tree links are untouched.
    pub fn update_task(&mut self, id: u64, draft: TaskDraft) -> Result<(), StoreError> {
        let title = draft.title.trim().to_string();
        if title.is_empty() {
            return Err(StoreError::EmptyTitle);
        }
        let now = Utc::now().timestamp();
        let t = self.get_mut(id).ok_or(StoreError::NotFound(id))?;
        t.title = title;
        t.size = draft.size;
        t.importance = draft.importance;
        t.due = draft.due;
        t.description = draft.description;
        t.updated_at_utc = now;
        self.persist();
        Ok(())
    }

    /// Flip the collapse display flag. No effect on any status.
    pub fn toggle_collapse(&mut self, id: u64) -> Result<(), StoreError> {
        let now = Utc::now().timestamp();
        let t = self.get_mut(id).ok_or(StoreError::NotFound(id))?;
        t.collapsed = !t.collapsed;
        t.updated_at_utc = now;
        self.persist();
        Ok(())
    }

    /// A task counts as a leaf when no child still needs work; completed
    /// children do not block it. Unknown ids are not leaves.
    pub fn is_leaf(&self, id: u64) -> bool {
        match self.get(id) {
            Some(t) => t
                .children
                .iter()
                .filter_map(|&c| self.get(c))
                .all(|c| c.status == Status::Completed),
            None => false,
        }
    }

    /// Recursively collect all descendant IDs below `root`, skipping the
    /// subtree rooted at `exclude`.
    pub fn collect_descendants(&self, root: u64, exclude: Option<u64>, out: &mut HashSet<u64>) {
        if let Some(t) = self.get(root) {
            for &c in &t.children {
                if Some(c) == exclude {
                    continue;
                }
                if out.insert(c) {
                    self.collect_descendants(c, exclude, out);
                }
            }
        }
    }

    /// True if any descendant outside the `exclude` subtree is in progress
    /// or has an in-progress child of its own.
    pub fn has_active_descendant(&self, id: u64, exclude: Option<u64>) -> bool {
        let mut ids = HashSet::new();
        self.collect_descendants(id, exclude, &mut ids);
        ids.iter().filter_map(|&d| self.get(d)).any(|t| t.status.is_active())
    }

    /// Apply a status change, enforcing the transition rules and keeping
    /// ancestor statuses derived.
    ///
    /// Legal transitions:
    /// - backlog -> in_progress: start, leaf tasks only
    /// - in_progress -> backlog: revert
    /// - backlog / in_progress / has_in_progress_child -> completed:
    ///   complete, cascading through the whole subtree
    /// - completed -> in_progress: reopen, no cascade
    ///
    /// `has_in_progress_child` is derived and never a valid target.
    pub fn set_status(
        &mut self,
        id: u64,
        new_status: Status,
        achievement: Option<&str>,
    ) -> Result<(), StoreError> {
        let current = self.get(id).ok_or(StoreError::NotFound(id))?.status;
        match (current, new_status) {
            (Status::Backlog, Status::InProgress) => {
                if !self.is_leaf(id) {
                    return Err(StoreError::InvalidTransition { from: current, to: new_status });
                }
                self.start(id);
            }
            (Status::InProgress, Status::Backlog) => self.revert(id),
            (
                Status::Backlog | Status::InProgress | Status::HasInProgressChild,
                Status::Completed,
            ) => self.complete(id, achievement),
            (Status::Completed, Status::InProgress) => self.reopen(id),
            _ => return Err(StoreError::InvalidTransition { from: current, to: new_status }),
        }
        self.persist();
        Ok(())
    }

    /// Remove a task and its entire subtree, then re-derive the ancestors
    /// it hung from so a chain whose only active branch disappeared falls
    /// back to backlog.
    pub fn delete_task(&mut self, id: u64) -> Result<(), StoreError> {
        let parent = match self.get(id) {
            Some(t) => t.parent,
            None => return Err(StoreError::NotFound(id)),
        };
        let now = Utc::now().timestamp();
        let mut doomed = HashSet::new();
        doomed.insert(id);
        self.collect_descendants(id, None, &mut doomed);
        self.tasks.retain(|t| !doomed.contains(&t.id));
        // Also drop any surviving link into the removed set.
        for t in self.tasks.iter_mut() {
            t.children.retain(|c| !doomed.contains(c));
            if let Some(p) = t.parent {
                if doomed.contains(&p) {
                    t.parent = None;
                }
            }
        }
        self.refresh_ancestors(parent, id, now);
        self.persist();
        Ok(())
    }

    fn start(&mut self, id: u64) {
        let now = Utc::now().timestamp();
        let mut parent = None;
        if let Some(t) = self.get_mut(id) {
            t.status = Status::InProgress;
            t.updated_at_utc = now;
            parent = t.parent;
        }
        self.mark_ancestors_active(parent, now);
    }

    fn revert(&mut self, id: u64) {
        let now = Utc::now().timestamp();
        let mut parent = None;
        if let Some(t) = self.get_mut(id) {
            t.status = Status::Backlog;
            t.completed_at_utc = None;
            t.achievement.clear();
            t.updated_at_utc = now;
            parent = t.parent;
        }
        self.refresh_ancestors(parent, id, now);
    }

    fn complete(&mut self, id: u64, achievement: Option<&str>) {
        let now = Utc::now().timestamp();
        let note = match achievement.map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => DEFAULT_ACHIEVEMENT.to_string(),
        };
        let mut subtree = HashSet::new();
        self.collect_descendants(id, None, &mut subtree);
        let mut parent = None;
        if let Some(t) = self.get_mut(id) {
            t.status = Status::Completed;
            t.completed_at_utc = Some(now);
            t.achievement = note;
            t.updated_at_utc = now;
            parent = t.parent;
        }
        // The whole subtree completes atomically with the root's timestamp;
        // a descendant keeps its own note if it already earned one.
        let ids: Vec<u64> = subtree.into_iter().collect();
        for d in ids {
            if let Some(t) = self.get_mut(d) {
                t.status = Status::Completed;
                t.completed_at_utc = Some(now);
                if t.achievement.is_empty() {
                    t.achievement = AUTO_ACHIEVEMENT.to_string();
                }
                t.updated_at_utc = now;
            }
        }
        self.refresh_ancestors(parent, id, now);
    }

    fn reopen(&mut self, id: u64) {
        let now = Utc::now().timestamp();
        let mut parent = None;
        if let Some(t) = self.get_mut(id) {
            t.status = Status::InProgress;
            t.completed_at_utc = None;
            t.achievement.clear();
            t.updated_at_utc = now;
            parent = t.parent;
        }
        self.mark_ancestors_active(parent, now);
    }

    /// Walk up from `parent`, flagging each ancestor as having an active
    /// descendant. A completed ancestor dragged back this way loses its
    /// completion stamp and note, keeping the stamp tied to completed.
    fn mark_ancestors_active(&mut self, mut parent: Option<u64>, now: i64) {
        while let Some(pid) = parent {
            match self.get_mut(pid) {
                Some(t) => {
                    if t.status == Status::Completed {
                        t.completed_at_utc = None;
                        t.achievement.clear();
                    }
                    t.status = Status::HasInProgressChild;
                    t.updated_at_utc = now;
                    parent = t.parent;
                }
                None => break,
            }
        }
    }

    /// Walk up from `parent`, re-deriving the child-activity flag against
    /// the live tree. Only a stale `HasInProgressChild` is demoted; backlog
    /// and completed ancestors keep their status. `exclude` carves out the
    /// subtree the caller just changed.
    fn refresh_ancestors(&mut self, mut parent: Option<u64>, exclude: u64, now: i64) {
        while let Some(pid) = parent {
            let active = self.has_active_descendant(pid, Some(exclude));
            match self.get_mut(pid) {
                Some(t) => {
                    if active {
                        if t.status == Status::Completed {
                            t.completed_at_utc = None;
                            t.achievement.clear();
                        }
                        t.status = Status::HasInProgressChild;
                        t.updated_at_utc = now;
                    } else if t.status == Status::HasInProgressChild {
                        t.status = Status::Backlog;
                        t.updated_at_utc = now;
                    }
                    parent = t.parent;
                }
                None => break,
            }
        }
    }
}
