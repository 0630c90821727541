//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use todo_voice::config::Config;
use todo_voice::recognition::{PlatformEvent, RecognitionError, SpeechPlatform};
use todo_voice::{Locale, SessionState, VoiceController};
use tokio::sync::mpsc;

/// Speech platform driven by the test
///
/// Each `start` opens a new raw event channel, pre-filled with the next
/// scripted batch if there is one. Further events are pushed with
/// [`push`](Self::push) into the latest channel.
pub struct ScriptedPlatform {
    supported: bool,
    permission: Mutex<Result<(), RecognitionError>>,
    permission_delay: Mutex<Option<Duration>>,
    scripts: Mutex<VecDeque<Vec<PlatformEvent>>>,
    senders: Mutex<Vec<mpsc::UnboundedSender<PlatformEvent>>>,
    languages: Mutex<Vec<Locale>>,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl ScriptedPlatform {
    pub fn new() -> Self {
        Self::with_support(true)
    }

    pub fn unsupported() -> Self {
        Self::with_support(false)
    }

    fn with_support(supported: bool) -> Self {
        Self {
            supported,
            permission: Mutex::new(Ok(())),
            permission_delay: Mutex::new(None),
            scripts: Mutex::new(VecDeque::new()),
            senders: Mutex::new(Vec::new()),
            languages: Mutex::new(Vec::new()),
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        }
    }

    pub fn deny_permission(&self) {
        *self.permission.lock() = Err(RecognitionError::PermissionDenied);
    }

    /// Keep the permission prompt open for `delay`
    pub fn delay_permission(&self, delay: Duration) {
        *self.permission_delay.lock() = Some(delay);
    }

    /// Events delivered as soon as the next session starts
    pub fn script(&self, events: Vec<PlatformEvent>) {
        self.scripts.lock().push_back(events);
    }

    /// Deliver an event to the most recent session
    pub fn push(&self, event: PlatformEvent) {
        if let Some(sender) = self.senders.lock().last() {
            let _ = sender.send(event);
        }
    }

    /// Deliver an event to the session started `index`-th (from zero)
    pub fn push_to(&self, index: usize, event: PlatformEvent) {
        if let Some(sender) = self.senders.lock().get(index) {
            let _ = sender.send(event);
        }
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn languages(&self) -> Vec<Locale> {
        self.languages.lock().clone()
    }
}

#[async_trait]
impl SpeechPlatform for ScriptedPlatform {
    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn request_microphone(&self) -> Result<(), RecognitionError> {
        let delay = *self.permission_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.permission.lock().clone()
    }

    async fn start(
        &self,
        language: Locale,
    ) -> Result<mpsc::UnboundedReceiver<PlatformEvent>, RecognitionError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.languages.lock().push(language);

        let (tx, rx) = mpsc::unbounded_channel();
        if let Some(events) = self.scripts.lock().pop_front() {
            for event in events {
                let _ = tx.send(event);
            }
        }
        self.senders.lock().push(tx);
        Ok(rx)
    }

    async fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn transcript(text: &str, is_final: bool, result_index: usize) -> PlatformEvent {
    PlatformEvent::Transcript {
        text: text.to_string(),
        is_final,
        result_index,
    }
}

/// Defaults with a short display window so tests return to idle quickly
pub fn fast_config() -> Config {
    let mut config = Config::default();
    config.voice.result_display_ms = 100;
    config.voice.listening_timeout_seconds = 1;
    config
}

/// Wait (up to two seconds) for a state matching `predicate`
pub async fn wait_for_state<F>(controller: &VoiceController, predicate: F) -> SessionState
where
    F: FnMut(&SessionState) -> bool,
{
    let mut states = controller.subscribe();
    let state = tokio::time::timeout(Duration::from_secs(2), states.wait_for(predicate))
        .await
        .expect("timed out waiting for session state")
        .expect("state channel closed");
    state.clone()
}
