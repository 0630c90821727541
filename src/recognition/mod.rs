//! Recognition session management
//!
//! Wraps the host's speech recognition capability behind [`SpeechPlatform`]
//! and turns its raw event stream into [`TranscriptEvent`]s for one session
//! at a time. Starting a session always stops the previous one first, so a
//! language switch never leaks a partial transcript across the boundary.
//!
//! Errors during a session go to a separate channel instead of ending the
//! event stream with a failure, letting the caller degrade session state
//! without tearing anything down.

use crate::locale::Locale;
use crate::messages::Message;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;

/// A transcript produced during a listening session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEvent {
    pub text: String,
    pub is_final: bool,
    pub language: Locale,
}

/// Raw event from the speech platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformEvent {
    /// Recognised text for the utterance at `result_index`
    Transcript {
        text: String,
        is_final: bool,
        result_index: usize,
    },
    /// Recognition problem; the session may or may not continue
    Error(RecognitionError),
    /// The platform stopped listening
    Ended,
}

/// Recognition failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecognitionError {
    #[error("Speech recognition is not supported on this platform")]
    PlatformUnsupported,

    #[error("Microphone permission denied")]
    PermissionDenied,

    #[error("No speech detected")]
    NoSpeech,

    #[error("Network error during recognition: {0}")]
    Network(String),

    #[error("Recognition aborted")]
    Aborted,

    #[error("Recognition failed: {0}")]
    Failed(String),
}

impl RecognitionError {
    /// Whether the user can simply try again
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, RecognitionError::PlatformUnsupported)
    }

    /// User-facing message
    pub fn message(&self) -> Message {
        match self {
            RecognitionError::PlatformUnsupported => Message::VoiceUnsupported,
            RecognitionError::PermissionDenied => Message::MicrophoneDenied,
            RecognitionError::NoSpeech => Message::NoSpeech,
            RecognitionError::Network(_) => Message::NetworkError,
            RecognitionError::Aborted | RecognitionError::Failed(_) => Message::RecognitionFailed,
        }
    }
}

/// The host's speech recognition capability
#[async_trait]
pub trait SpeechPlatform: Send + Sync {
    /// Feature detection; checked before every start
    fn is_supported(&self) -> bool;

    /// Ask for microphone access, resolving once the user has answered
    async fn request_microphone(&self) -> Result<(), RecognitionError>;

    /// Begin recognising speech in `language`
    async fn start(
        &self,
        language: Locale,
    ) -> Result<mpsc::UnboundedReceiver<PlatformEvent>, RecognitionError>;

    /// Stop recognising; must be safe to call when not started
    async fn stop(&self);
}

/// Output of one listening session
#[derive(Debug)]
pub struct TranscriptStream {
    pub session_id: u64,
    pub language: Locale,
    /// Interim and final transcripts, in order; closes when the session ends
    pub events: mpsc::UnboundedReceiver<TranscriptEvent>,
    /// Errors reported during the session
    pub errors: mpsc::UnboundedReceiver<RecognitionError>,
}

struct ActiveSession {
    id: u64,
    language: Locale,
    active: Arc<AtomicBool>,
    forwarder: JoinHandle<()>,
}

/// Owns the single active recognition session
pub struct RecognitionManager {
    platform: Arc<dyn SpeechPlatform>,
    session: Mutex<Option<ActiveSession>>,
    /// Wakes a start that is waiting on microphone permission
    cancel: Notify,
    next_session_id: AtomicU64,
}

impl RecognitionManager {
    pub fn new(platform: Arc<dyn SpeechPlatform>) -> Self {
        Self {
            platform,
            session: Mutex::new(None),
            cancel: Notify::new(),
            next_session_id: AtomicU64::new(1),
        }
    }

    /// Whether the host can recognise speech at all
    pub fn is_supported(&self) -> bool {
        self.platform.is_supported()
    }

    /// Start a session, stopping any active one first
    ///
    /// Fails straight away with `PlatformUnsupported` when the host has no
    /// recogniser. A pending permission prompt is abandoned with `Aborted`
    /// if [`stop`](Self::stop) is called meanwhile.
    pub async fn start(&self, language: Locale) -> Result<TranscriptStream, RecognitionError> {
        self.stop().await;

        if !self.is_supported() {
            tracing::warn!("Speech recognition not supported, cannot start session");
            return Err(RecognitionError::PlatformUnsupported);
        }

        let cancelled = self.cancel.notified();
        tokio::pin!(cancelled);
        cancelled.as_mut().enable();

        tokio::select! {
            permission = self.platform.request_microphone() => permission?,
            _ = &mut cancelled => {
                tracing::info!("Recognition start cancelled while awaiting permission");
                return Err(RecognitionError::Aborted);
            }
        }

        let raw = self.platform.start(language).await?;
        let session_id = self.next_session_id.fetch_add(1, Ordering::SeqCst);
        let active = Arc::new(AtomicBool::new(true));

        let (events_tx, events) = mpsc::unbounded_channel();
        let (errors_tx, errors) = mpsc::unbounded_channel();
        let forwarder = tokio::spawn(forward_events(
            session_id,
            language,
            raw,
            events_tx,
            errors_tx,
            active.clone(),
        ));

        let previous = self.session.lock().replace(ActiveSession {
            id: session_id,
            language,
            active,
            forwarder,
        });
        // A concurrent start raced us past stop(); only one session may live
        if let Some(previous) = previous {
            tracing::warn!("Replacing recognition session {} still registered", previous.id);
            previous.forwarder.abort();
        }

        tracing::info!(
            "Recognition session {} started ({})",
            session_id,
            language.speech_tag()
        );

        Ok(TranscriptStream {
            session_id,
            language,
            events,
            errors,
        })
    }

    /// Stop the active session, if any
    ///
    /// Also cancels a start that is still waiting for permission. Events the
    /// platform had not yet delivered are dropped.
    pub async fn stop(&self) {
        self.cancel.notify_waiters();

        let session = self.session.lock().take();
        if let Some(session) = session {
            session.active.store(false, Ordering::SeqCst);
            session.forwarder.abort();
            self.platform.stop().await;
            tracing::info!("Recognition session {} stopped", session.id);
        }
    }

    /// Stop the session with `session_id` if it is still the active one
    ///
    /// Unlike [`stop`](Self::stop) this leaves a newer session, or a start
    /// still waiting for permission, untouched.
    pub async fn stop_session(&self, session_id: u64) {
        let session = {
            let mut current = self.session.lock();
            if current.as_ref().is_some_and(|s| s.id == session_id) {
                current.take()
            } else {
                None
            }
        };

        if let Some(session) = session {
            session.active.store(false, Ordering::SeqCst);
            session.forwarder.abort();
            self.platform.stop().await;
            tracing::info!("Recognition session {} finished", session.id);
        }
    }

    /// Restart recognition in a different language
    pub async fn switch_language(
        &self,
        language: Locale,
    ) -> Result<TranscriptStream, RecognitionError> {
        tracing::info!("Switching recognition language to {}", language);
        self.start(language).await
    }

    /// Whether a session is running
    pub fn is_active(&self) -> bool {
        self.session
            .lock()
            .as_ref()
            .is_some_and(|s| s.active.load(Ordering::SeqCst))
    }

    /// Language of the running session
    pub fn language(&self) -> Option<Locale> {
        self.session
            .lock()
            .as_ref()
            .filter(|s| s.active.load(Ordering::SeqCst))
            .map(|s| s.language)
    }
}

/// Relay platform events for one session
///
/// Each utterance is delivered final at most once: a repeated final for a
/// result index, or a repeat of the previous final text with no interim in
/// between, is dropped.
async fn forward_events(
    session_id: u64,
    language: Locale,
    mut raw: mpsc::UnboundedReceiver<PlatformEvent>,
    events: mpsc::UnboundedSender<TranscriptEvent>,
    errors: mpsc::UnboundedSender<RecognitionError>,
    active: Arc<AtomicBool>,
) {
    let mut finalised = std::collections::HashSet::new();
    let mut last_final: Option<String> = None;

    while let Some(event) = raw.recv().await {
        match event {
            PlatformEvent::Transcript {
                text,
                is_final,
                result_index,
            } => {
                if finalised.contains(&result_index) {
                    tracing::debug!(
                        "Session {}: dropping repeat for finalised result {}",
                        session_id,
                        result_index
                    );
                    continue;
                }

                if is_final {
                    if last_final.as_deref() == Some(text.as_str()) {
                        tracing::debug!("Session {}: dropping duplicate final", session_id);
                        continue;
                    }
                    finalised.insert(result_index);
                    last_final = Some(text.clone());
                } else {
                    last_final = None;
                }

                if events
                    .send(TranscriptEvent {
                        text,
                        is_final,
                        language,
                    })
                    .is_err()
                {
                    break;
                }
            }
            PlatformEvent::Error(error) => {
                tracing::warn!("Session {}: recognition error: {}", session_id, error);
                if errors.send(error).is_err() {
                    break;
                }
            }
            PlatformEvent::Ended => break,
        }
    }

    active.store(false, Ordering::SeqCst);
    tracing::debug!("Session {}: event stream closed", session_id);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_unsupported_is_fatal() {
        assert!(!RecognitionError::PlatformUnsupported.is_recoverable());
        assert!(RecognitionError::PermissionDenied.is_recoverable());
        assert!(RecognitionError::NoSpeech.is_recoverable());
        assert!(RecognitionError::Network("offline".to_string()).is_recoverable());
    }

    #[test]
    fn test_error_messages_are_localised() {
        let message = RecognitionError::PermissionDenied.message();
        assert_eq!(message, Message::MicrophoneDenied);
        assert_ne!(message.render(Locale::English), message.render(Locale::Urdu));
    }

    #[tokio::test]
    async fn test_forwarder_suppresses_duplicate_finals() {
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let (events_tx, mut events) = mpsc::unbounded_channel();
        let (errors_tx, _errors) = mpsc::unbounded_channel();
        let active = Arc::new(AtomicBool::new(true));

        let transcript = |text: &str, is_final, result_index| PlatformEvent::Transcript {
            text: text.to_string(),
            is_final,
            result_index,
        };
        raw_tx.send(transcript("buy", false, 0)).unwrap();
        raw_tx.send(transcript("buy milk", true, 0)).unwrap();
        raw_tx.send(transcript("buy milk", true, 0)).unwrap();
        raw_tx.send(transcript("buy milk", true, 1)).unwrap();
        raw_tx.send(PlatformEvent::Ended).unwrap();

        forward_events(
            1,
            Locale::English,
            raw_rx,
            events_tx,
            errors_tx,
            active.clone(),
        )
        .await;

        let mut received = Vec::new();
        while let Some(event) = events.recv().await {
            received.push((event.text, event.is_final));
        }
        assert_eq!(
            received,
            vec![("buy".to_string(), false), ("buy milk".to_string(), true)]
        );
        assert!(!active.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_forwarder_routes_errors_separately() {
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let (events_tx, mut events) = mpsc::unbounded_channel();
        let (errors_tx, mut errors) = mpsc::unbounded_channel();

        raw_tx
            .send(PlatformEvent::Error(RecognitionError::NoSpeech))
            .unwrap();
        drop(raw_tx);

        forward_events(
            7,
            Locale::Urdu,
            raw_rx,
            events_tx,
            errors_tx,
            Arc::new(AtomicBool::new(true)),
        )
        .await;

        assert_eq!(errors.recv().await, Some(RecognitionError::NoSpeech));
        assert_eq!(events.recv().await, None);
    }
}
