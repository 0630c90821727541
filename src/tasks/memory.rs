//! In-memory task collaborator
//!
//! Implements both collaborator traits over a `Vec<Task>`. Used by the
//! typed-input demo host and by tests; it can inject rejections and latency
//! and counts every mutation call it receives.

use super::{Priority, Task, TaskError, TaskMutator, TaskSnapshotProvider};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use uuid::Uuid;

/// Per-method mutation call counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationCounts {
    pub create: usize,
    pub set_completed: usize,
    pub set_priority: usize,
    pub delete: usize,
}

impl MutationCounts {
    pub fn total(&self) -> usize {
        self.create + self.set_completed + self.set_priority + self.delete
    }
}

/// Task store backed by memory
#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    tasks: Mutex<Vec<Task>>,
    counts: Mutex<MutationCounts>,
    /// Next mutation is rejected with this message
    reject_next: Mutex<Option<String>>,
    /// Artificial round-trip delay for every mutation
    latency_ms: AtomicUsize,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the given tasks
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let store = Self::default();
        *store.tasks.lock() = tasks;
        store
    }

    /// Store seeded with pending, normal-priority tasks
    pub fn with_titles(titles: &[&str]) -> Self {
        Self::with_tasks(titles.iter().map(|t| Task::new(*t)).collect())
    }

    /// Current tasks (clone)
    pub fn tasks(&self) -> Vec<Task> {
        self.tasks.lock().clone()
    }

    /// Find a task by exact title
    pub fn find(&self, title: &str) -> Option<Task> {
        self.tasks.lock().iter().find(|t| t.title == title).cloned()
    }

    /// Mutation calls received so far
    pub fn counts(&self) -> MutationCounts {
        *self.counts.lock()
    }

    /// Reject the next mutation with `message`
    pub fn reject_next(&self, message: impl Into<String>) {
        *self.reject_next.lock() = Some(message.into());
    }

    /// Delay every mutation by `latency`
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as usize, Ordering::SeqCst);
    }

    /// Simulate the network round trip and apply an injected rejection
    async fn round_trip(&self) -> Result<(), TaskError> {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency as u64)).await;
        }
        let rejection = self.reject_next.lock().take();
        match rejection {
            Some(message) => Err(TaskError::Rejected(message)),
            None => Ok(()),
        }
    }

    fn update<F>(&self, id: Uuid, apply: F) -> Result<Task, TaskError>
    where
        F: FnOnce(&mut Task),
    {
        let mut tasks = self.tasks.lock();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(TaskError::NotFound(id))?;
        apply(task);
        Ok(task.clone())
    }
}

#[async_trait]
impl TaskSnapshotProvider for InMemoryTaskStore {
    async fn get_tasks(&self) -> Result<Vec<Task>, TaskError> {
        Ok(self.tasks())
    }
}

#[async_trait]
impl TaskMutator for InMemoryTaskStore {
    async fn create(&self, title: &str) -> Result<Task, TaskError> {
        self.counts.lock().create += 1;
        self.round_trip().await?;

        let task = Task::new(title);
        // Newest first, matching the backend listing order
        self.tasks.lock().insert(0, task.clone());
        tracing::debug!("In-memory store created task {}", task.id);
        Ok(task)
    }

    async fn set_completed(&self, id: Uuid, completed: bool) -> Result<Task, TaskError> {
        self.counts.lock().set_completed += 1;
        self.round_trip().await?;
        self.update(id, |t| t.completed = completed)
    }

    async fn set_priority(&self, id: Uuid, priority: Priority) -> Result<Task, TaskError> {
        self.counts.lock().set_priority += 1;
        self.round_trip().await?;
        self.update(id, |t| t.priority = priority)
    }

    async fn delete(&self, id: Uuid) -> Result<(), TaskError> {
        self.counts.lock().delete += 1;
        self.round_trip().await?;

        let mut tasks = self.tasks.lock();
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == before {
            return Err(TaskError::NotFound(id));
        }
        Ok(())
    }
}
