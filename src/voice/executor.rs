//! Command execution
//!
//! Turns a classified intent into a [`CommandResult`], resolving spoken task
//! references against the snapshot and calling the mutation collaborator
//! when a change is needed. Every path ends in a result value; collaborator
//! rejections never escape as errors and are never retried here.

use super::transaction::{TransactionKind, TransactionLog};
use crate::intent::Intent;
use crate::locale::Locale;
use crate::messages::{Message, TaskFilter, MAX_LISTED_TITLES};
use crate::resolver::{self, Resolution, TaskResolver};
use crate::tasks::{self, Priority, Task, TaskError, TaskMutator};
use crate::text;
use serde::Serialize;
use std::sync::Arc;

/// Outcome of one command, already localised
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult {
    pub success: bool,
    pub message: String,
    pub affected_task: Option<Task>,
}

impl CommandResult {
    pub fn success(message: Message, language: Locale, affected_task: Option<Task>) -> Self {
        Self {
            success: true,
            message: message.render(language),
            affected_task,
        }
    }

    pub fn failure(message: Message, language: Locale) -> Self {
        Self {
            success: false,
            message: message.render(language),
            affected_task: None,
        }
    }
}

/// A state change on an existing task
#[derive(Debug, Clone, Copy)]
enum Change {
    Complete,
    Uncomplete,
    Priority(Priority),
    Delete,
}

impl Change {
    fn transaction_kind(self) -> TransactionKind {
        match self {
            Change::Complete => TransactionKind::SetCompleted { completed: true },
            Change::Uncomplete => TransactionKind::SetCompleted { completed: false },
            Change::Priority(priority) => TransactionKind::SetPriority { priority },
            Change::Delete => TransactionKind::Delete,
        }
    }

    /// Message when the task is already in the target state
    fn already_satisfied(self, task: &Task) -> Option<Message> {
        let title = task.title.clone();
        match self {
            Change::Complete if task.completed => Some(Message::AlreadyCompleted { title }),
            Change::Uncomplete if !task.completed => Some(Message::AlreadyPending { title }),
            Change::Priority(priority) if task.priority == priority => {
                Some(Message::AlreadyPriority { title, priority })
            }
            _ => None,
        }
    }

    fn done(self, title: String) -> Message {
        match self {
            Change::Complete => Message::Completed { title },
            Change::Uncomplete => Message::Reopened { title },
            Change::Priority(priority) => Message::PrioritySet { title, priority },
            Change::Delete => Message::Deleted { title },
        }
    }
}

/// Executes classified intents
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    resolver: TaskResolver,
    max_title_length: usize,
    transactions: Arc<TransactionLog>,
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new(TaskResolver::default(), 500)
    }
}

impl CommandExecutor {
    pub fn new(resolver: TaskResolver, max_title_length: usize) -> Self {
        Self {
            resolver,
            max_title_length,
            transactions: Arc::new(TransactionLog::default()),
        }
    }

    /// Share a transaction ledger with other mutation sources
    pub fn with_transactions(mut self, transactions: Arc<TransactionLog>) -> Self {
        self.transactions = transactions;
        self
    }

    pub fn transactions(&self) -> &Arc<TransactionLog> {
        &self.transactions
    }

    pub fn resolver(&self) -> &TaskResolver {
        &self.resolver
    }

    /// Execute `intent` against a task snapshot
    ///
    /// `language` is the language of the transcript; the result message is
    /// rendered in it.
    pub async fn execute(
        &self,
        intent: &Intent,
        language: Locale,
        tasks: &[Task],
        mutator: &dyn TaskMutator,
    ) -> CommandResult {
        match intent {
            Intent::Create { title_fragment } => {
                self.create(title_fragment, language, mutator).await
            }
            Intent::Complete { title_fragment } => {
                self.change(title_fragment, Change::Complete, language, tasks, mutator)
                    .await
            }
            Intent::Uncomplete { title_fragment } => {
                self.change(title_fragment, Change::Uncomplete, language, tasks, mutator)
                    .await
            }
            Intent::SetHighPriority { title_fragment } => {
                let change = Change::Priority(Priority::High);
                self.change(title_fragment, change, language, tasks, mutator)
                    .await
            }
            Intent::SetNormalPriority { title_fragment } => {
                let change = Change::Priority(Priority::Normal);
                self.change(title_fragment, change, language, tasks, mutator)
                    .await
            }
            Intent::Delete { title_fragment } => {
                self.change(title_fragment, Change::Delete, language, tasks, mutator)
                    .await
            }
            Intent::List => list(tasks, language),
            Intent::FilterCompleted { title_fragment } => {
                filter(tasks, TaskFilter::Completed, title_fragment, language)
            }
            Intent::FilterPending { title_fragment } => {
                filter(tasks, TaskFilter::Pending, title_fragment, language)
            }
            Intent::Search { title_fragment } => self.search(title_fragment, tasks, language),
            Intent::Unknown => {
                tracing::debug!("Unknown intent, replying with help");
                CommandResult::failure(Message::Help, language)
            }
        }
    }

    async fn create(
        &self,
        fragment: &str,
        language: Locale,
        mutator: &dyn TaskMutator,
    ) -> CommandResult {
        let title = text::normalise_whitespace(fragment);
        if title.is_empty() {
            return CommandResult::failure(Message::EmptyTitle, language);
        }
        if title.chars().count() > self.max_title_length {
            return CommandResult::failure(
                Message::TitleTooLong {
                    max: self.max_title_length,
                },
                language,
            );
        }

        // Creations have no target task and cannot conflict
        let transaction = match self.transactions.begin(None, TransactionKind::Create) {
            Ok(transaction) => transaction,
            Err(conflict) => {
                tracing::error!("Unexpected transaction conflict on create: {}", conflict);
                return CommandResult::failure(Message::MutationFailed, language);
            }
        };

        match mutator.create(&title).await {
            Ok(task) => {
                transaction.commit(Some(task.id));
                tracing::info!("Created task {} via voice", task.id);
                CommandResult::success(
                    Message::Created {
                        title: task.title.clone(),
                    },
                    language,
                    Some(task),
                )
            }
            Err(e) => {
                transaction.rollback(e.to_string());
                mutation_failure(e, language)
            }
        }
    }

    async fn change(
        &self,
        fragment: &str,
        change: Change,
        language: Locale,
        tasks: &[Task],
        mutator: &dyn TaskMutator,
    ) -> CommandResult {
        let task = match self.resolver.resolve(fragment, tasks) {
            Resolution::Unique(task) => task,
            Resolution::NotFound(fragment) => {
                let suggestions = self
                    .resolver
                    .suggest(&fragment, tasks)
                    .into_iter()
                    .map(|t| t.title)
                    .collect();
                return CommandResult::failure(
                    Message::NotFound {
                        fragment,
                        suggestions,
                    },
                    language,
                );
            }
            Resolution::Ambiguous(candidates) => {
                tracing::info!(
                    "{} candidates for {:?}, asking the user to choose",
                    candidates.len(),
                    fragment
                );
                return CommandResult::failure(
                    Message::Ambiguous {
                        fragment: fragment.to_string(),
                        candidates: candidates.into_iter().map(|t| t.title).collect(),
                    },
                    language,
                );
            }
        };

        if let Some(message) = change.already_satisfied(&task) {
            tracing::debug!("Task {} already in target state, nothing to do", task.id);
            return CommandResult::success(message, language, Some(task));
        }

        let transaction = match self
            .transactions
            .begin(Some(task.id), change.transaction_kind())
        {
            Ok(transaction) => transaction,
            Err(_) => {
                return CommandResult::failure(
                    Message::UpdateInProgress { title: task.title },
                    language,
                );
            }
        };

        let outcome = match change {
            Change::Complete => mutator.set_completed(task.id, true).await,
            Change::Uncomplete => mutator.set_completed(task.id, false).await,
            Change::Priority(priority) => mutator.set_priority(task.id, priority).await,
            Change::Delete => mutator.delete(task.id).await.map(|()| task.clone()),
        };

        match outcome {
            Ok(updated) => {
                transaction.commit(Some(updated.id));
                tracing::info!("Applied {:?} to task {}", change, updated.id);
                CommandResult::success(change.done(updated.title.clone()), language, Some(updated))
            }
            Err(e) => {
                transaction.rollback(e.to_string());
                mutation_failure(e, language)
            }
        }
    }

    fn search(&self, query: &str, tasks: &[Task], language: Locale) -> CommandResult {
        let titles = self
            .resolver
            .search(query, tasks)
            .into_iter()
            .map(|hit| hit.task.title)
            .collect();
        CommandResult::success(
            Message::SearchResults {
                query: query.to_string(),
                titles,
            },
            language,
            None,
        )
    }
}

fn list(tasks: &[Task], language: Locale) -> CommandResult {
    let mut ordered = tasks.to_vec();
    tasks::sort_for_display(&mut ordered);
    CommandResult::success(
        Message::TaskList {
            total: ordered.len(),
            titles: listed_titles(&ordered),
        },
        language,
        None,
    )
}

fn filter(tasks: &[Task], filter: TaskFilter, fragment: &str, language: Locale) -> CommandResult {
    let want_completed = filter == TaskFilter::Completed;
    let mut matching: Vec<Task> = tasks
        .iter()
        .filter(|t| t.completed == want_completed)
        .filter(|t| fragment.is_empty() || resolver::contains_words(&t.title, fragment))
        .cloned()
        .collect();
    tasks::sort_for_display(&mut matching);

    CommandResult::success(
        Message::Filtered {
            filter,
            fragment: fragment.to_string(),
            total: matching.len(),
            titles: listed_titles(&matching),
        },
        language,
        None,
    )
}

fn listed_titles(tasks: &[Task]) -> Vec<String> {
    tasks
        .iter()
        .take(MAX_LISTED_TITLES)
        .map(|t| t.title.clone())
        .collect()
}

fn mutation_failure(error: TaskError, language: Locale) -> CommandResult {
    match error {
        TaskError::Rejected(reason) => {
            tracing::warn!("Task mutation rejected: {}", reason);
            CommandResult::failure(Message::MutationRejected { reason }, language)
        }
        other => {
            tracing::error!("Task mutation failed: {}", other);
            CommandResult::failure(Message::MutationFailed, language)
        }
    }
}
