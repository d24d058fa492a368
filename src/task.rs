//! Task data structure and the draft used to create or edit one.
//!
//! This module defines the core `Task` struct that represents a single to-do
//! item with its metadata, tree links and completion bookkeeping.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::fields::*;

/// A to-do item in the task forest.
///
/// `parent` and `children` are kept mutually consistent by the store;
/// `children` holds direct child ids in creation order. Everything except
/// `id` and `title` defaults when absent from a stored record, so files
/// written by older versions keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub size: Option<Size>,
    #[serde(default)]
    pub importance: Option<Importance>,
    #[serde(default)]
    pub due: Option<NaiveDate>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: Status,
    /// Unix seconds; set iff the task is completed.
    #[serde(default)]
    pub completed_at_utc: Option<i64>,
    /// Note captured at completion, empty otherwise.
    #[serde(default)]
    pub achievement: String,
    #[serde(default)]
    pub parent: Option<u64>,
    #[serde(default)]
    pub children: Vec<u64>,
    /// Display hint only; never affects status logic.
    #[serde(default)]
    pub collapsed: bool,
    #[serde(default)]
    pub created_at_utc: i64,
    #[serde(default)]
    pub updated_at_utc: i64,
}

/// The caller-editable field set, shared by add and update.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub size: Option<Size>,
    pub importance: Option<Importance>,
    pub due: Option<NaiveDate>,
    pub description: String,
}
