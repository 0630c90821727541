//! End-to-end tests for the voice command pipeline.
//!
//! Drive a `VoiceController` with typed transcripts and a scripted speech
//! platform against the in-memory task store.

mod common;

use common::{fast_config, transcript, wait_for_state, ScriptedPlatform};
use std::sync::Arc;
use std::time::Duration;
use todo_voice::messages::Message;
use todo_voice::recognition::{PlatformEvent, RecognitionError};
use todo_voice::tasks::InMemoryTaskStore;
use todo_voice::{Locale, Priority, SessionState, Task, VoiceController};

fn controller_with(
    platform: &Arc<ScriptedPlatform>,
    store: &Arc<InMemoryTaskStore>,
    config: &todo_voice::config::Config,
) -> VoiceController {
    VoiceController::new(platform.clone(), store.clone(), store.clone(), config).unwrap()
}

fn controller(store: &Arc<InMemoryTaskStore>) -> (Arc<ScriptedPlatform>, VoiceController) {
    let platform = Arc::new(ScriptedPlatform::new());
    let controller = controller_with(&platform, store, &fast_config());
    (platform, controller)
}

// =============================================================================
// Typed Commands
// =============================================================================

#[tokio::test]
async fn test_create_in_english() {
    let store = Arc::new(InMemoryTaskStore::new());
    let (_, controller) = controller(&store);

    let result = controller
        .submit_transcript("Add todo: Buy groceries", Locale::English)
        .await;

    assert!(result.success);
    assert_eq!(result.message, "Created: Buy groceries");
    let created = store.find("Buy groceries").unwrap();
    assert!(!created.completed);
    assert_eq!(created.priority, Priority::Normal);
    assert_eq!(result.affected_task, Some(created));
}

#[tokio::test]
async fn test_create_in_urdu() {
    let store = Arc::new(InMemoryTaskStore::new());
    let (_, controller) = controller(&store);

    let result = controller
        .submit_transcript("نیا کام: دودھ خریدیں", Locale::Urdu)
        .await;

    assert!(result.success);
    assert_eq!(result.message, "نیا کام بنا دیا گیا: دودھ خریدیں");
    assert!(store.find("دودھ خریدیں").is_some());
}

#[tokio::test]
async fn test_similar_titles_are_ambiguous() {
    let store = Arc::new(InMemoryTaskStore::with_titles(&["Buy milk", "Buy milk 2%"]));
    let platform = Arc::new(ScriptedPlatform::new());
    let mut config = fast_config();
    config.resolver.prefer_exact_match = false;
    let controller = controller_with(&platform, &store, &config);

    let result = controller
        .submit_transcript("Complete: Buy milk", Locale::English)
        .await;

    assert!(!result.success);
    assert!(result.message.starts_with("Several tasks match \"Buy milk\""));
    assert!(result.message.contains("Buy milk 2%"));
    assert_eq!(store.counts().total(), 0);
}

#[tokio::test]
async fn test_exact_title_wins_by_default() {
    let store = Arc::new(InMemoryTaskStore::with_titles(&["Buy milk", "Buy milk 2%"]));
    let (_, controller) = controller(&store);

    let result = controller
        .submit_transcript("complete buy milk", Locale::English)
        .await;

    assert!(result.success);
    assert!(store.find("Buy milk").unwrap().completed);
    assert!(!store.find("Buy milk 2%").unwrap().completed);
}

#[tokio::test]
async fn test_unknown_task_is_not_found() {
    let store = Arc::new(InMemoryTaskStore::with_titles(&["Buy milk"]));
    let (_, controller) = controller(&store);

    let result = controller
        .submit_transcript("mark call dentist as high priority", Locale::English)
        .await;

    assert!(!result.success);
    assert!(result.message.starts_with("No task matching \"call dentist\"."));
    assert_eq!(store.counts().total(), 0);
}

#[tokio::test]
async fn test_priority_change_on_empty_list_is_not_found() {
    let store = Arc::new(InMemoryTaskStore::new());
    let (_, controller) = controller(&store);

    let result = controller
        .submit_transcript("Mark as high priority: Nonexistent task", Locale::English)
        .await;

    assert!(!result.success);
    assert!(result.message.contains("Nonexistent task"));
    assert_eq!(store.counts().total(), 0);
}

#[tokio::test]
async fn test_completing_a_completed_task_changes_nothing() {
    let store = Arc::new(InMemoryTaskStore::with_tasks(vec![
        Task::new("Buy milk").completed(true)
    ]));
    let (_, controller) = controller(&store);

    let result = controller
        .submit_transcript("complete buy milk", Locale::English)
        .await;

    assert!(result.success);
    assert_eq!(result.message, "Already completed: Buy milk");
    assert_eq!(store.counts().total(), 0);
}

#[tokio::test]
async fn test_create_then_complete() {
    let store = Arc::new(InMemoryTaskStore::new());
    let (_, controller) = controller(&store);

    let created = controller
        .submit_transcript("add todo water plants", Locale::English)
        .await;
    assert!(created.success);

    // The second command sees the task created by the first
    let completed = controller
        .submit_transcript("complete water plants", Locale::English)
        .await;
    assert!(completed.success);
    assert_eq!(completed.message, "Completed: water plants");
    assert!(store.find("water plants").unwrap().completed);

    let counts = store.counts();
    assert_eq!(counts.create, 1);
    assert_eq!(counts.set_completed, 1);
}

#[tokio::test]
async fn test_rejection_is_shown_verbatim() {
    let store = Arc::new(InMemoryTaskStore::new());
    store.reject_next("Task limit reached");
    let (_, controller) = controller(&store);

    let result = controller
        .submit_transcript("add todo buy bread", Locale::English)
        .await;

    assert!(!result.success);
    assert!(result.message.contains("Task limit reached"));
    assert!(store.tasks().is_empty());
    assert_eq!(controller.transactions().pending_count(), 0);
}

#[tokio::test]
async fn test_unrecognised_command_offers_help() {
    let store = Arc::new(InMemoryTaskStore::with_titles(&["Buy milk"]));
    let (_, controller) = controller(&store);

    let result = controller
        .submit_transcript("the weather is nice", Locale::English)
        .await;

    assert!(!result.success);
    assert_eq!(result.message, Message::Help.render(Locale::English));
    assert_eq!(store.counts().total(), 0);
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test]
async fn test_rapid_commands_toggle_once() {
    let store = Arc::new(InMemoryTaskStore::with_titles(&["Buy milk"]));
    store.set_latency(Duration::from_millis(200));
    let (_, controller) = controller(&store);

    let first = {
        let controller = controller.clone();
        tokio::spawn(async move {
            controller
                .submit_transcript("complete buy milk", Locale::English)
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;

    let second = controller
        .submit_transcript("complete buy milk", Locale::English)
        .await;
    assert!(!second.success);
    assert_eq!(second.message, Message::Busy.render(Locale::English));

    assert!(first.await.unwrap().success);
    assert_eq!(store.counts().set_completed, 1);
    assert!(store.find("Buy milk").unwrap().completed);
}

#[tokio::test]
async fn test_result_after_stop_is_not_displayed() {
    let store = Arc::new(InMemoryTaskStore::with_titles(&["Buy milk"]));
    store.set_latency(Duration::from_millis(200));
    let (platform, controller) = controller(&store);

    controller.start_listening(Locale::English).await.unwrap();
    platform.push(transcript("delete buy milk", true, 0));
    wait_for_state(&controller, |s| *s == SessionState::Processing).await;

    controller.stop_listening().await;
    assert_eq!(controller.session_state(), SessionState::Idle);

    // The mutation completes, but the session stays idle
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(store.find("Buy milk").is_none());
    assert_eq!(controller.session_state(), SessionState::Idle);
    assert!(controller.last_result().is_none());
    assert!(!controller.is_busy());
}

#[tokio::test]
async fn test_spoken_command_while_busy_reports_processing() {
    let store = Arc::new(InMemoryTaskStore::with_titles(&["Buy milk", "Call mom"]));
    store.set_latency(Duration::from_millis(300));
    let (platform, controller) = controller(&store);

    let typed = {
        let controller = controller.clone();
        tokio::spawn(async move {
            controller
                .submit_transcript("complete buy milk", Locale::English)
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(controller.is_busy());

    controller.start_listening(Locale::English).await.unwrap();
    platform.push(transcript("complete call mom", true, 0));

    // The rejection is shown instead of leaving the session on Listening
    wait_for_state(&controller, |s| {
        *s == SessionState::Error(Message::Busy.render(Locale::English))
    })
    .await;
    wait_for_state(&controller, |s| *s == SessionState::Idle).await;
    assert!(!controller.is_listening());

    assert!(typed.await.unwrap().success);
    assert_eq!(store.counts().set_completed, 1);
    assert!(store.find("Buy milk").unwrap().completed);
    assert!(!store.find("Call mom").unwrap().completed);
}

// =============================================================================
// Listening Sessions
// =============================================================================

#[tokio::test]
async fn test_interim_then_final_runs_command() {
    let store = Arc::new(InMemoryTaskStore::new());
    let (platform, controller) = controller(&store);

    controller.start_listening(Locale::English).await.unwrap();
    assert_eq!(controller.session_state(), SessionState::Listening);
    assert!(controller.is_listening());

    platform.push(transcript("add todo buy", false, 0));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(controller.interim_transcript(), "add todo buy");

    platform.push(transcript("add todo buy bread", true, 0));
    let state = wait_for_state(&controller, |s| matches!(s, SessionState::Result(_))).await;

    let SessionState::Result(result) = state else {
        unreachable!()
    };
    assert_eq!(result.message, "Created: buy bread");
    assert!(store.find("buy bread").is_some());
    assert_eq!(controller.interim_transcript(), "");
    assert!(!controller.is_listening());
    assert_eq!(platform.stop_count(), 1);
}

#[tokio::test]
async fn test_urdu_session_answers_in_urdu() {
    let store = Arc::new(InMemoryTaskStore::with_titles(&["رپورٹ"]));
    let (platform, controller) = controller(&store);

    controller.start_listening(Locale::Urdu).await.unwrap();
    assert_eq!(platform.languages(), vec![Locale::Urdu]);

    platform.push(transcript("رپورٹ کو اہم بنائیں", true, 0));
    let state = wait_for_state(&controller, |s| matches!(s, SessionState::Result(_))).await;

    let SessionState::Result(result) = state else {
        unreachable!()
    };
    assert!(result.success);
    assert_eq!(result.message, "اعلی ترجیح دے دی گئی: رپورٹ");
    assert_eq!(store.find("رپورٹ").unwrap().priority, Priority::High);
}

#[tokio::test]
async fn test_result_returns_to_idle_after_display_window() {
    let store = Arc::new(InMemoryTaskStore::new());
    let (_, controller) = controller(&store);

    controller
        .submit_transcript("add todo buy bread", Locale::English)
        .await;
    assert!(controller.session_state().is_displaying());

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(controller.session_state().is_displaying());

    wait_for_state(&controller, |s| *s == SessionState::Idle).await;
}

#[tokio::test]
async fn test_new_result_restarts_display_window() {
    let store = Arc::new(InMemoryTaskStore::new());
    let platform = Arc::new(ScriptedPlatform::new());
    let mut config = fast_config();
    config.voice.result_display_ms = 300;
    let controller = controller_with(&platform, &store, &config);

    controller
        .submit_transcript("add todo first", Locale::English)
        .await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    let second = controller
        .submit_transcript("add todo second", Locale::English)
        .await;

    // The first window would have ended by now
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(controller.session_state(), SessionState::Result(second));

    wait_for_state(&controller, |s| *s == SessionState::Idle).await;
}

#[tokio::test]
async fn test_recognition_error_shows_message() {
    let store = Arc::new(InMemoryTaskStore::new());
    let (platform, controller) = controller(&store);

    controller.start_listening(Locale::English).await.unwrap();
    platform.push(PlatformEvent::Error(RecognitionError::Network(
        "offline".to_string(),
    )));

    let state = wait_for_state(&controller, |s| matches!(s, SessionState::Error(_))).await;
    assert_eq!(
        state,
        SessionState::Error(Message::NetworkError.render(Locale::English))
    );
    assert!(!controller.is_listening());

    wait_for_state(&controller, |s| *s == SessionState::Idle).await;
}

#[tokio::test]
async fn test_silence_times_out() {
    let store = Arc::new(InMemoryTaskStore::new());
    let (_, controller) = controller(&store);

    controller.start_listening(Locale::English).await.unwrap();

    let state = wait_for_state(&controller, |s| matches!(s, SessionState::Error(_))).await;
    assert_eq!(
        state,
        SessionState::Error(Message::NoSpeech.render(Locale::English))
    );
}

#[tokio::test]
async fn test_permission_denied_moves_to_error() {
    let store = Arc::new(InMemoryTaskStore::new());
    let (platform, controller) = controller(&store);
    platform.deny_permission();

    let err = controller.start_listening(Locale::English).await.unwrap_err();
    assert_eq!(err, RecognitionError::PermissionDenied);
    assert_eq!(
        controller.session_state(),
        SessionState::Error(Message::MicrophoneDenied.render(Locale::English))
    );
    assert_eq!(platform.start_count(), 0);

    // Typed input keeps working
    let result = controller
        .submit_transcript("add todo buy bread", Locale::English)
        .await;
    assert!(result.success);
}

#[tokio::test]
async fn test_language_switch_restarts_listening() {
    let store = Arc::new(InMemoryTaskStore::new());
    let (platform, controller) = controller(&store);

    controller.start_listening(Locale::English).await.unwrap();
    platform.push(transcript("add todo", false, 0));
    tokio::time::sleep(Duration::from_millis(30)).await;

    controller.switch_language(Locale::Urdu).await.unwrap();
    assert_eq!(controller.session_state(), SessionState::Listening);
    assert_eq!(controller.language(), Locale::Urdu);
    assert_eq!(controller.interim_transcript(), "");
    assert_eq!(platform.languages(), vec![Locale::English, Locale::Urdu]);

    // A late final from the English session goes nowhere
    platform.push_to(0, transcript("add todo english", true, 0));
    platform.push(transcript("نیا کام: دودھ خریدیں", true, 0));

    let state = wait_for_state(&controller, |s| matches!(s, SessionState::Result(_))).await;
    let SessionState::Result(result) = state else {
        unreachable!()
    };
    assert_eq!(result.message, "نیا کام بنا دیا گیا: دودھ خریدیں");
    assert_eq!(store.counts().create, 1);
}

#[tokio::test]
async fn test_switch_language_while_idle_only_records_it() {
    let store = Arc::new(InMemoryTaskStore::new());
    let (platform, controller) = controller(&store);

    controller.switch_language(Locale::Urdu).await.unwrap();
    assert_eq!(controller.language(), Locale::Urdu);
    assert_eq!(controller.session_state(), SessionState::Idle);
    assert_eq!(platform.start_count(), 0);
}
