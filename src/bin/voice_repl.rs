//! Typed-input host for the voice pipeline
//!
//! Reads one command per line and runs it as a final transcript against an
//! in-memory task list. Lines starting with `:` control the session:
//!
//! - `:en` / `:ur` switch language
//! - `:tasks` prints the task list
//! - `:quit` exits
//!
//! An optional argument names a config file; otherwise
//! `~/.todo-voice/config.json` is used.

use anyhow::Context;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use todo_voice::config;
use todo_voice::recognition::{PlatformEvent, RecognitionError, SpeechPlatform};
use todo_voice::tasks::{sort_for_display, InMemoryTaskStore};
use todo_voice::{Locale, Priority, Task, VoiceController};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Terminals have no recogniser; every command is typed
struct Keyboard;

#[async_trait]
impl SpeechPlatform for Keyboard {
    fn is_supported(&self) -> bool {
        false
    }

    async fn request_microphone(&self) -> Result<(), RecognitionError> {
        Err(RecognitionError::PlatformUnsupported)
    }

    async fn start(
        &self,
        _language: Locale,
    ) -> Result<mpsc::UnboundedReceiver<PlatformEvent>, RecognitionError> {
        Err(RecognitionError::PlatformUnsupported)
    }

    async fn stop(&self) {}
}

fn seed_tasks() -> Vec<Task> {
    vec![
        Task::new("Buy milk"),
        Task::new("Call mom").with_priority(Priority::High),
        Task::new("Pay electricity bill"),
        Task::new("Submit report").completed(true),
        Task::new("دودھ خریدنا"),
    ]
}

fn print_tasks(store: &InMemoryTaskStore) {
    let mut tasks = store.tasks();
    sort_for_display(&mut tasks);
    if tasks.is_empty() {
        println!("  (no tasks)");
    }
    for task in tasks {
        let check = if task.completed { "x" } else { " " };
        let flag = if task.priority == Priority::High { " !" } else { "" };
        println!("  [{}] {}{}", check, task.title, flag);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    todo_voice::init_logging(false);

    let config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => config::load_from_path(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => config::get_config(),
    };

    let store = Arc::new(InMemoryTaskStore::with_tasks(seed_tasks()));
    let controller = VoiceController::new(
        Arc::new(Keyboard),
        store.clone(),
        store.clone(),
        &config,
    )
    .context("Invalid configuration")?;

    let mut language = controller.language();
    if !controller.is_voice_supported() {
        tracing::info!("No speech recogniser, typed input only");
    }
    println!("Todo Voice ({}). Type a command, :en, :ur, :tasks or :quit.", language);
    print_tasks(&store);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => continue,
            ":quit" | ":q" => break,
            ":tasks" => {
                print_tasks(&store);
                continue;
            }
            _ => {}
        }

        if let Some(code) = line.strip_prefix(':') {
            match Locale::from_code(code) {
                Some(next) => {
                    controller.switch_language(next).await?;
                    language = next;
                    println!("Language: {}", language);
                }
                None => println!("Unknown command {:?}", line),
            }
            continue;
        }

        let result = controller.submit_transcript(line, language).await;
        let marker = if result.success { "ok" } else { "!!" };
        println!("{} {}", marker, result.message);
    }

    tracing::info!("Todo Voice session ended");
    Ok(())
}
