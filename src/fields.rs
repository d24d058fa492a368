//! Enumerations and field types for the task tree.
//!
//! This module defines the structured data types used to classify tasks:
//! lifecycle status plus the optional size and importance ratings.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Task lifecycle status.
///
/// `HasInProgressChild` is derived from the tree and is never a valid
/// target for a status change; the store recomputes it whenever a
/// descendant starts, stops or disappears.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Backlog,
    InProgress,
    HasInProgressChild,
    Completed,
}

impl Status {
    /// True for the statuses that make a subtree "active": the task is
    /// being worked on, or something below it is.
    pub fn is_active(self) -> bool {
        matches!(self, Status::InProgress | Status::HasInProgressChild)
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::Backlog => "backlog",
            Status::InProgress => "in progress",
            Status::HasInProgressChild => "child active",
            Status::Completed => "completed",
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::Backlog
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rough effort estimate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Size {
    Small,
    Medium,
    Large,
}

impl Size {
    pub fn label(self) -> &'static str {
        match self {
            Size::Small => "small",
            Size::Medium => "medium",
            Size::Large => "large",
        }
    }
}

/// Importance rating, independent of effort.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Importance {
    Low,
    Medium,
    High,
}

impl Importance {
    pub fn label(self) -> &'static str {
        match self {
            Importance::Low => "low",
            Importance::Medium => "medium",
            Importance::High => "high",
        }
    }
}

/// Filtering options for tasks based on due dates.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DueFilter {
    Today,
    ThisWeek,
    Overdue,
    None,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&Status::HasInProgressChild).unwrap(),
            "\"has_in_progress_child\""
        );
        assert_eq!(serde_json::to_string(&Status::InProgress).unwrap(), "\"in_progress\"");
        let parsed: Status = serde_json::from_str("\"backlog\"").unwrap();
        assert_eq!(parsed, Status::Backlog);
    }

    #[test]
    fn test_status_activity() {
        assert!(Status::InProgress.is_active());
        assert!(Status::HasInProgressChild.is_active());
        assert!(!Status::Backlog.is_active());
        assert!(!Status::Completed.is_active());
    }

    #[test]
    fn test_default_status_is_backlog() {
        assert_eq!(Status::default(), Status::Backlog);
    }
}
