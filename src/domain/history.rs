//! Bounded undo history
//!
//! Each entry is a full, independent copy of the task list taken before a
//! mutation. Pops are most-recent-first; when the history grows past its
//! depth the oldest entry is dropped.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::error::TaskError;
use super::task::Task;

pub const DEFAULT_DEPTH: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndoHistory {
    depth: usize,
    snapshots: VecDeque<Vec<Task>>,
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::new(DEFAULT_DEPTH)
    }
}

impl UndoHistory {
    /// Creates an empty history holding at most `depth` snapshots (minimum 1)
    pub fn new(depth: usize) -> Self {
        Self {
            depth: depth.max(1),
            snapshots: VecDeque::new(),
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Changes the depth, evicting the oldest snapshots if needed
    pub fn set_depth(&mut self, depth: usize) {
        self.depth = depth.max(1);
        self.evict();
    }

    /// Stores a detached snapshot of the task list
    pub fn push(&mut self, snapshot: Vec<Task>) {
        self.snapshots.push_back(snapshot);
        self.evict();
    }

    /// Removes and returns the most recent snapshot
    pub fn pop(&mut self) -> Result<Vec<Task>, TaskError> {
        self.snapshots.pop_back().ok_or(TaskError::HistoryEmpty)
    }

    fn evict(&mut self) {
        while self.snapshots.len() > self.depth {
            self.snapshots.pop_front();
        }
    }
}
