//! Mutation transaction ledger
//!
//! Every mutation the executor requests is recorded as a transaction keyed
//! by a temporary id. A transaction is `Pending` while the collaborator's
//! round trip is in flight and ends `Committed` or `RolledBack`. Voice and
//! UI-triggered mutations can share one ledger; a second mutation of a task
//! with a pending transaction is refused instead of racing the first.

use crate::tasks::Priority;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use uuid::Uuid;

/// Settled transactions kept for inspection
const DEFAULT_HISTORY: usize = 100;

/// Lifecycle of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionState {
    Pending,
    Committed,
    RolledBack,
}

/// The change a transaction requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransactionKind {
    Create,
    SetCompleted { completed: bool },
    SetPriority { priority: Priority },
    Delete,
}

/// One recorded mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    /// Target task; `None` for creations
    pub task_id: Option<Uuid>,
    pub kind: TransactionKind,
    pub state: TransactionState,
    pub started_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
    /// Why the transaction was rolled back
    pub failure: Option<String>,
}

/// Refusal to start a transaction on a task that is already being changed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Task {task_id} already has pending transaction {pending}")]
pub struct TransactionConflict {
    pub task_id: Uuid,
    pub pending: Uuid,
}

/// Shared transaction ledger
#[derive(Debug)]
pub struct TransactionLog {
    entries: Mutex<Vec<Transaction>>,
    history: usize,
}

impl Default for TransactionLog {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY)
    }
}

impl TransactionLog {
    /// Ledger keeping at most `history` settled transactions
    pub fn new(history: usize) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            history,
        }
    }

    /// Open a pending transaction
    pub fn begin(
        &self,
        task_id: Option<Uuid>,
        kind: TransactionKind,
    ) -> Result<TransactionGuard<'_>, TransactionConflict> {
        let mut entries = self.entries.lock();

        if let Some(task_id) = task_id {
            if let Some(pending) = entries
                .iter()
                .find(|t| t.task_id == Some(task_id) && t.state == TransactionState::Pending)
            {
                tracing::warn!(
                    "Refusing {:?} on task {}: transaction {} pending",
                    kind,
                    task_id,
                    pending.id
                );
                return Err(TransactionConflict {
                    task_id,
                    pending: pending.id,
                });
            }
        }

        let transaction = Transaction {
            id: Uuid::new_v4(),
            task_id,
            kind,
            state: TransactionState::Pending,
            started_at: Utc::now(),
            settled_at: None,
            failure: None,
        };
        let id = transaction.id;
        entries.push(transaction);
        tracing::debug!("Transaction {} begun: {:?} on {:?}", id, kind, task_id);

        Ok(TransactionGuard {
            log: self,
            id,
            settled: false,
        })
    }

    /// Mark a pending transaction committed
    pub fn commit(&self, id: Uuid, task_id: Option<Uuid>) -> bool {
        self.settle(id, TransactionState::Committed, task_id, None)
    }

    /// Mark a pending transaction rolled back
    pub fn rollback(&self, id: Uuid, reason: impl Into<String>) -> bool {
        self.settle(id, TransactionState::RolledBack, None, Some(reason.into()))
    }

    /// Look up a transaction
    pub fn get(&self, id: Uuid) -> Option<Transaction> {
        self.entries.lock().iter().find(|t| t.id == id).cloned()
    }

    /// The pending transaction for a task, if any
    pub fn pending_for(&self, task_id: Uuid) -> Option<Transaction> {
        self.entries
            .lock()
            .iter()
            .find(|t| t.task_id == Some(task_id) && t.state == TransactionState::Pending)
            .cloned()
    }

    /// Number of transactions still in flight
    pub fn pending_count(&self) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|t| t.state == TransactionState::Pending)
            .count()
    }

    /// All recorded transactions, oldest first
    pub fn history(&self) -> Vec<Transaction> {
        self.entries.lock().clone()
    }

    fn settle(
        &self,
        id: Uuid,
        state: TransactionState,
        task_id: Option<Uuid>,
        failure: Option<String>,
    ) -> bool {
        let mut entries = self.entries.lock();
        let Some(transaction) = entries
            .iter_mut()
            .find(|t| t.id == id && t.state == TransactionState::Pending)
        else {
            return false;
        };

        transaction.state = state;
        transaction.settled_at = Some(Utc::now());
        if transaction.task_id.is_none() {
            transaction.task_id = task_id;
        }
        transaction.failure = failure;
        tracing::debug!("Transaction {} settled: {:?}", id, state);

        // Drop the oldest settled entries beyond the history limit
        let settled = entries
            .iter()
            .filter(|t| t.state != TransactionState::Pending)
            .count();
        let mut excess = settled.saturating_sub(self.history);
        entries.retain(|t| {
            if excess > 0 && t.state != TransactionState::Pending {
                excess -= 1;
                false
            } else {
                true
            }
        });

        true
    }
}

/// A pending transaction that rolls back if dropped unsettled
pub struct TransactionGuard<'a> {
    log: &'a TransactionLog,
    id: Uuid,
    settled: bool,
}

impl TransactionGuard<'_> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Commit, recording the task the mutation produced
    pub fn commit(mut self, task_id: Option<Uuid>) {
        self.settled = self.log.commit(self.id, task_id);
    }

    pub fn rollback(mut self, reason: impl Into<String>) {
        self.settled = self.log.rollback(self.id, reason);
    }
}

impl Drop for TransactionGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.log.rollback(self.id, "abandoned before settling");
        }
    }
}
