//! Voice session state machine
//!
//! Defines the states and transitions for one listening attempt:
//!
//! ```text
//! Idle -> Listening -> Processing -> Result -> Idle
//!                 \________________\________-> Error -> Idle
//! ```
//!
//! Invalid events are ignored rather than forcing a transition.

use super::executor::CommandResult;
use serde::Serialize;

/// Voice session state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum SessionState {
    /// Waiting for the user to start
    #[default]
    Idle,
    /// Recogniser running, waiting for a final transcript
    Listening,
    /// Classifying and executing a command
    Processing,
    /// Showing the outcome of a command
    Result(CommandResult),
    /// Showing a recognition or pipeline failure
    Error(String),
}

impl SessionState {
    /// Returns a short description of the state
    pub fn description(&self) -> &'static str {
        match self {
            SessionState::Idle => "Waiting for activation",
            SessionState::Listening => "Listening for a command",
            SessionState::Processing => "Processing command",
            SessionState::Result(_) => "Command finished",
            SessionState::Error(_) => "Voice input failed",
        }
    }

    /// Whether the state is shown for a bounded time before resetting
    pub fn is_displaying(&self) -> bool {
        matches!(self, SessionState::Result(_) | SessionState::Error(_))
    }
}

/// Events that can trigger state transitions
#[derive(Debug, Clone)]
pub enum VoiceEvent {
    /// User started listening
    Start,
    /// A final transcript (spoken or typed) arrived
    FinalTranscript,
    /// The command finished, successfully or not
    Settled(CommandResult),
    /// Recognition or the pipeline failed
    Fail(String),
    /// User stopped the session
    Stop,
    /// The result display window elapsed
    DisplayElapsed,
}

/// Reason for entering a state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionReason {
    UserStart,
    TranscriptReceived,
    CommandSettled,
    Failure,
    UserStop,
    DisplayElapsed,
}

/// Result of a state transition
#[derive(Debug, Clone)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub reason: TransitionReason,
}

/// Voice session state machine
///
/// Not synchronised; the controller owns it behind a lock.
#[derive(Debug)]
pub struct VoiceStateMachine {
    state: SessionState,
}

impl Default for VoiceStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl VoiceStateMachine {
    /// Creates a new state machine in the Idle state
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Process an event, returning the transition if one occurred
    pub fn process_event(&mut self, event: VoiceEvent) -> Option<TransitionResult> {
        use SessionState as S;

        let transition = match (&self.state, event) {
            // A new session may start from anywhere but an existing one. A
            // command still processing keeps running in the background.
            (S::Listening, VoiceEvent::Start) => None,
            (_, VoiceEvent::Start) => Some((S::Listening, TransitionReason::UserStart)),

            // Typed input can arrive without a listening session
            (S::Processing, VoiceEvent::FinalTranscript) => None,
            (_, VoiceEvent::FinalTranscript) => {
                Some((S::Processing, TransitionReason::TranscriptReceived))
            }

            (S::Processing, VoiceEvent::Settled(result)) => {
                Some((S::Result(result), TransitionReason::CommandSettled))
            }

            (_, VoiceEvent::Fail(message)) => Some((S::Error(message), TransitionReason::Failure)),

            (S::Idle, VoiceEvent::Stop) => None,
            (_, VoiceEvent::Stop) => Some((S::Idle, TransitionReason::UserStop)),

            (S::Result(_) | S::Error(_), VoiceEvent::DisplayElapsed) => {
                Some((S::Idle, TransitionReason::DisplayElapsed))
            }

            _ => None,
        };

        match transition {
            Some((new_state, reason)) => {
                tracing::debug!(
                    "Voice state: {} -> {} ({:?})",
                    self.state.description(),
                    new_state.description(),
                    reason
                );
                self.state = new_state.clone();
                Some(TransitionResult { new_state, reason })
            }
            None => {
                tracing::debug!("Voice event ignored in state: {}", self.state.description());
                None
            }
        }
    }
}
