//! Task model and the collaborators that own it
//!
//! Tasks belong to the surrounding task-management feature. The voice core
//! reads fresh snapshots through [`TaskSnapshotProvider`] and requests every
//! change through [`TaskMutator`]; it never stores tasks itself. Retry and
//! rollback policy for mutations belong to the mutator implementation.

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use memory::InMemoryTaskStore;

/// Task priority level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Normal,
    High,
}

/// Read-only view of a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
}

impl Task {
    /// Creates a pending, normal-priority task with a fresh id
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            completed: false,
            priority: Priority::Normal,
        }
    }

    /// Builder-style completion flag
    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    /// Builder-style priority
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

/// Errors reported by the task collaborators
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    /// The collaborator refused the change; the message is shown verbatim
    #[error("{0}")]
    Rejected(String),

    #[error("Task {0} not found")]
    NotFound(Uuid),

    #[error("Task service unavailable: {0}")]
    Unavailable(String),
}

/// Source of task snapshots
///
/// Called before every resolution. Implementations must not hand back a
/// snapshot cached from a previous session.
#[async_trait]
pub trait TaskSnapshotProvider: Send + Sync {
    async fn get_tasks(&self) -> Result<Vec<Task>, TaskError>;
}

/// Capability set for changing tasks
#[async_trait]
pub trait TaskMutator: Send + Sync {
    /// Create a task with the given title
    async fn create(&self, title: &str) -> Result<Task, TaskError>;

    /// Set or clear the completed flag
    async fn set_completed(&self, id: Uuid, completed: bool) -> Result<Task, TaskError>;

    /// Change the priority level
    async fn set_priority(&self, id: Uuid, priority: Priority) -> Result<Task, TaskError>;

    /// Delete a task
    async fn delete(&self, id: Uuid) -> Result<(), TaskError>;
}

/// Order tasks the way the task list shows them
///
/// High priority first, then pending before completed. The sort is stable so
/// the collaborator's own ordering (newest first) is kept within each group.
pub fn sort_for_display(tasks: &mut [Task]) {
    tasks.sort_by_key(|t| (t.priority != Priority::High, t.completed));
}
