//! Voice command controller
//!
//! The orchestrator the presentation layer talks to. It owns the session
//! state machine, publishes every state on a watch channel and runs the
//! pipeline for each final transcript:
//!
//! 1. apply dictionary corrections to the whole transcript, dictated titles
//!    included, since a misheard phrase is misheard wherever it falls
//! 2. classify in the session language
//! 3. fetch a fresh task snapshot (never cached between commands)
//! 4. execute and publish the result
//!
//! Only one command runs at a time. A typed command arriving while another
//! is processing is rejected with a localised "still processing" result and
//! does not touch session state. A spoken one has already moved the session
//! past listening, so its rejection is shown as an error. Stopping or restarting a session while a
//! command is processing lets the mutation finish but keeps its result off
//! screen.

use super::executor::{CommandExecutor, CommandResult};
use super::state::{SessionState, VoiceEvent, VoiceStateMachine};
use super::transaction::TransactionLog;
use crate::config::{Config, ConfigError, VoiceConfig};
use crate::dictionary::Dictionary;
use crate::intent::IntentClassifier;
use crate::locale::Locale;
use crate::messages::Message;
use crate::recognition::{RecognitionError, RecognitionManager, SpeechPlatform, TranscriptStream};
use crate::resolver::TaskResolver;
use crate::tasks::{TaskMutator, TaskSnapshotProvider};
use crate::text;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Transcript characters included in log lines
const LOG_PREVIEW_CHARS: usize = 100;

/// Clears the busy flag when a command finishes, however it finishes
struct CommandGuard<'a>(&'a AtomicBool);

impl Drop for CommandGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

struct Inner {
    recognition: RecognitionManager,
    snapshots: Arc<dyn TaskSnapshotProvider>,
    mutator: Arc<dyn TaskMutator>,
    classifier: IntentClassifier,
    dictionary: Dictionary,
    executor: CommandExecutor,
    voice: VoiceConfig,

    machine: Mutex<VoiceStateMachine>,
    state_tx: watch::Sender<SessionState>,
    last_result: Mutex<Option<CommandResult>>,
    interim: Mutex<String>,
    language: Mutex<Locale>,
    listener: Mutex<Option<JoinHandle<()>>>,

    /// Set while a command is processing
    busy: AtomicBool,
    /// Bumped whenever a session starts or stops; results from an older
    /// generation are not displayed
    generation: AtomicU64,
    /// Bumped whenever the screen changes; a display reset only fires if it
    /// still matches
    display_epoch: AtomicU64,
}

/// Voice pipeline orchestrator
///
/// Cheap to clone; clones share one session.
#[derive(Clone)]
pub struct VoiceController {
    inner: Arc<Inner>,
}

impl VoiceController {
    /// Controller wired to the host's speech platform and task collaborators
    pub fn new(
        platform: Arc<dyn SpeechPlatform>,
        snapshots: Arc<dyn TaskSnapshotProvider>,
        mutator: Arc<dyn TaskMutator>,
        config: &Config,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let dictionary = Dictionary::new(&config.dictionary)?;
        let executor = CommandExecutor::new(
            TaskResolver::new(config.resolver.clone()),
            config.voice.max_title_length,
        );

        let (state_tx, _) = watch::channel(SessionState::Idle);

        Ok(Self {
            inner: Arc::new(Inner {
                recognition: RecognitionManager::new(platform),
                snapshots,
                mutator,
                classifier: IntentClassifier::builtin(),
                dictionary,
                executor,
                voice: config.voice.clone(),
                machine: Mutex::new(VoiceStateMachine::new()),
                state_tx,
                last_result: Mutex::new(None),
                interim: Mutex::new(String::new()),
                language: Mutex::new(config.voice.default_language),
                listener: Mutex::new(None),
                busy: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                display_epoch: AtomicU64::new(0),
            }),
        })
    }

    /// Watch every session state change
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state_tx.subscribe()
    }

    /// Current session state
    pub fn session_state(&self) -> SessionState {
        self.inner.state_tx.borrow().clone()
    }

    /// Result of the last command that was displayed
    pub fn last_result(&self) -> Option<CommandResult> {
        self.inner.last_result.lock().clone()
    }

    /// Latest interim transcript of the current utterance, for display
    pub fn interim_transcript(&self) -> String {
        self.inner.interim.lock().clone()
    }

    /// Language of the current or next session
    pub fn language(&self) -> Locale {
        *self.inner.language.lock()
    }

    /// Whether the host can recognise speech; typed input works regardless
    pub fn is_voice_supported(&self) -> bool {
        self.inner.recognition.is_supported()
    }

    /// Whether the recogniser is running
    pub fn is_listening(&self) -> bool {
        self.inner.recognition.is_active()
    }

    /// Whether a command is processing
    pub fn is_busy(&self) -> bool {
        self.inner.busy.load(Ordering::SeqCst)
    }

    /// Ledger of mutations requested by this controller
    ///
    /// Hosts can begin their own transactions on it so UI edits and voice
    /// commands never change the same task concurrently.
    pub fn transactions(&self) -> &Arc<TransactionLog> {
        self.inner.executor.transactions()
    }

    /// Start listening in `language`, replacing any current session
    ///
    /// On failure the session moves to `Error` (and later back to `Idle`)
    /// as well as returning the error, so a host can fall back to typed
    /// input.
    pub async fn start_listening(&self, language: Locale) -> Result<(), RecognitionError> {
        let inner = &self.inner;
        let generation = inner.begin_session(language);
        inner.transition(VoiceEvent::Start);

        match inner.recognition.start(language).await {
            Ok(stream) => {
                if !inner.is_current(generation) {
                    // Stopped while the recogniser was starting
                    inner.recognition.stop_session(stream.session_id).await;
                    return Err(RecognitionError::Aborted);
                }
                let listener = tokio::spawn(Arc::clone(inner).listen(stream, generation));
                if let Some(previous) = inner.listener.lock().replace(listener) {
                    previous.abort();
                }
                Ok(())
            }
            Err(e) => {
                if inner.is_current(generation) {
                    tracing::warn!("Could not start listening: {}", e);
                    inner.fail(&e, language);
                }
                Err(e)
            }
        }
    }

    /// Stop listening and return to `Idle`
    ///
    /// A command already processing keeps running; its result is not shown.
    pub async fn stop_listening(&self) {
        let inner = &self.inner;
        inner.generation.fetch_add(1, Ordering::SeqCst);
        inner.display_epoch.fetch_add(1, Ordering::SeqCst);

        if let Some(listener) = inner.listener.lock().take() {
            listener.abort();
        }
        inner.recognition.stop().await;
        inner.interim.lock().clear();
        inner.transition(VoiceEvent::Stop);
    }

    /// Change the session language
    ///
    /// While listening, recognition restarts cleanly in the new language;
    /// nothing heard before the switch is carried over.
    pub async fn switch_language(&self, language: Locale) -> Result<(), RecognitionError> {
        let previous = std::mem::replace(&mut *self.inner.language.lock(), language);
        tracing::info!("Voice language: {} -> {}", previous, language);

        if matches!(self.session_state(), SessionState::Listening) {
            self.start_listening(language).await
        } else {
            Ok(())
        }
    }

    /// Run a typed (or externally recognised) final transcript
    ///
    /// Stops a listening session first so only one transcript drives the
    /// next command.
    pub async fn submit_transcript(&self, text: &str, language: Locale) -> CommandResult {
        if self.is_busy() {
            tracing::warn!("Typed command rejected, previous command still processing");
            return CommandResult::failure(Message::Busy, language);
        }

        if let Some(listener) = self.inner.listener.lock().take() {
            listener.abort();
        }
        if self.inner.recognition.is_active() {
            self.inner.recognition.stop().await;
        }
        self.inner.interim.lock().clear();

        self.inner.submit(text.to_string(), language).await
    }
}

impl Inner {
    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Apply an event and publish the new state
    fn transition(&self, event: VoiceEvent) -> bool {
        let mut machine = self.machine.lock();
        match machine.process_event(event) {
            Some(transition) => {
                tracing::info!(
                    "Voice session: {} ({:?})",
                    transition.new_state.description(),
                    transition.reason
                );
                self.state_tx.send_replace(transition.new_state);
                true
            }
            None => false,
        }
    }

    fn begin_session(&self, language: Locale) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.display_epoch.fetch_add(1, Ordering::SeqCst);

        if let Some(listener) = self.listener.lock().take() {
            listener.abort();
        }
        self.interim.lock().clear();
        *self.language.lock() = language;
        generation
    }

    /// Show an error, then return to idle after the display window
    fn fail(self: &Arc<Self>, error: &RecognitionError, language: Locale) {
        if self.transition(VoiceEvent::Fail(error.message().render(language))) {
            self.schedule_reset();
        }
    }

    fn schedule_reset(self: &Arc<Self>) {
        let epoch = self.display_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let window = self.voice.result_display();
        let inner = Arc::clone(self);

        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            if inner.display_epoch.load(Ordering::SeqCst) == epoch {
                inner.transition(VoiceEvent::DisplayElapsed);
            }
        });
    }

    /// Wait for the final transcript of one utterance
    async fn listen(self: Arc<Self>, mut stream: TranscriptStream, generation: u64) {
        let timeout = self.voice.listening_timeout();
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);
        let language = stream.language;

        loop {
            tokio::select! {
                biased;

                Some(error) = stream.errors.recv() => {
                    self.end_listening(stream.session_id).await;
                    if self.is_current(generation) {
                        self.fail(&error, language);
                    }
                    return;
                }

                event = stream.events.recv() => match event {
                    Some(event) if event.is_final => {
                        self.end_listening(stream.session_id).await;
                        if !self.is_current(generation) {
                            return;
                        }
                        // Detached so stopping the session cannot cancel a
                        // dispatched mutation
                        let inner = Arc::clone(&self);
                        tokio::spawn(async move {
                            inner.submit_spoken(event.text, event.language, generation).await;
                        });
                        return;
                    }
                    Some(event) => {
                        *self.interim.lock() = event.text;
                    }
                    None => {
                        self.end_listening(stream.session_id).await;
                        if self.is_current(generation) {
                            tracing::info!("Recognition ended without a final transcript");
                            self.fail(&RecognitionError::NoSpeech, language);
                        }
                        return;
                    }
                },

                _ = &mut deadline => {
                    tracing::info!("No final transcript within {:?}", timeout);
                    self.end_listening(stream.session_id).await;
                    if self.is_current(generation) {
                        self.fail(&RecognitionError::NoSpeech, language);
                    }
                    return;
                }
            }
        }
    }

    async fn end_listening(&self, session_id: u64) {
        self.interim.lock().clear();
        self.recognition.stop_session(session_id).await;
    }

    /// Process one final transcript
    async fn submit(self: &Arc<Self>, text: String, language: Locale) -> CommandResult {
        match self.try_submit(text, language).await {
            Some(result) => result,
            None => {
                tracing::warn!("Command rejected, previous command still processing");
                CommandResult::failure(Message::Busy, language)
            }
        }
    }

    /// Process a final transcript heard by the recogniser
    ///
    /// Nobody awaits the result, so a busy rejection goes on screen and the
    /// session returns to idle instead of staying on `Listening`.
    async fn submit_spoken(self: &Arc<Self>, text: String, language: Locale, generation: u64) {
        if self.try_submit(text, language).await.is_some() {
            return;
        }
        tracing::warn!("Spoken command rejected, previous command still processing");
        if !self.is_current(generation) {
            return;
        }
        if self.transition(VoiceEvent::Fail(Message::Busy.render(language))) {
            self.schedule_reset();
        }
    }

    /// Process one final transcript, or `None` if a command is already running
    async fn try_submit(self: &Arc<Self>, text: String, language: Locale) -> Option<CommandResult> {
        if self.busy.swap(true, Ordering::SeqCst) {
            return None;
        }
        let _guard = CommandGuard(&self.busy);

        let generation = self.generation.load(Ordering::SeqCst);
        self.display_epoch.fetch_add(1, Ordering::SeqCst);
        self.transition(VoiceEvent::FinalTranscript);

        let result = self.run_command(&text, language).await;

        if self.is_current(generation) {
            *self.last_result.lock() = Some(result.clone());
            self.transition(VoiceEvent::Settled(result.clone()));
            self.schedule_reset();
        } else {
            tracing::info!("Session changed while processing, result not displayed");
        }

        Some(result)
    }

    async fn run_command(&self, transcript: &str, language: Locale) -> CommandResult {
        let corrected = self.dictionary.apply(transcript);
        let intent = self.classifier.classify(&corrected, language);
        tracing::info!(
            "Classified {:?} ({}) as {:?}",
            text::preview(transcript, LOG_PREVIEW_CHARS),
            language,
            intent.kind()
        );

        let tasks = if intent.needs_snapshot() {
            match self.snapshots.get_tasks().await {
                Ok(tasks) => tasks,
                Err(e) => {
                    tracing::warn!("Task snapshot unavailable: {}", e);
                    return CommandResult::failure(Message::SnapshotUnavailable, language);
                }
            }
        } else {
            Vec::new()
        };

        self.executor
            .execute(&intent, language, &tasks, self.mutator.as_ref())
            .await
    }
}
