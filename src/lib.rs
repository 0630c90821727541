//! Todo Voice - bilingual voice commands for task management
//!
//! Turns spoken or typed English and Urdu commands into task operations:
//! recognise, classify, resolve the target task, execute, and report back
//! in the language the command was spoken in.

pub mod config;
pub mod dictionary;
pub mod intent;
pub mod locale;
pub mod messages;
pub mod recognition;
pub mod resolver;
pub mod tasks;
pub mod text;
pub mod voice;

pub use intent::{classify, Intent, IntentClassifier, IntentKind};
pub use locale::Locale;
pub use resolver::{Resolution, TaskResolver};
pub use tasks::{Priority, Task, TaskError, TaskMutator, TaskSnapshotProvider};
pub use voice::{CommandResult, SessionState, VoiceController};

/// Format timestamps using the system's local time via chrono
struct LocalTimer;

impl tracing_subscriber::fmt::time::FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Set up logging to `~/.todo-voice/logs/todo-voice.log`
///
/// `RUST_LOG` overrides the default `info` filter. With `console` set, logs
/// also go to stdout. Falls back to stdout only if the log file can't be
/// opened.
pub fn init_logging(console: bool) {
    use tracing_subscriber::prelude::*;

    let log_dir = config::get_config_dir().join("logs");
    let _ = std::fs::create_dir_all(&log_dir);
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("todo-voice.log"))
        .ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if let Some(file) = log_file {
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::sync::Mutex::new(file))
            .with_timer(LocalTimer)
            .with_ansi(false);
        let stdout_layer = console.then(|| tracing_subscriber::fmt::layer().with_timer(LocalTimer));
        tracing_subscriber::registry()
            .with(filter)
            .with(stdout_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_timer(LocalTimer)
            .init();
    }

    tracing::info!("Todo Voice logging initialised");
}
