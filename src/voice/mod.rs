//! Voice command orchestration
//!
//! Ties recognition, classification, resolution and execution together
//! behind [`VoiceController`], and owns the session state the presentation
//! layer observes.
//!
//! ## States
//!
//! 1. **IDLE** - Waiting for the user to start listening
//! 2. **LISTENING** - Recogniser running, interim transcripts arriving
//! 3. **PROCESSING** - Classifying and executing a final transcript
//! 4. **RESULT** - Showing the command outcome for a bounded window
//! 5. **ERROR** - Showing a recognition failure for the same window
//!
//! ## State Transitions
//!
//! ```text
//! ┌──────┐  start   ┌───────────┐  final   ┌────────────┐  settled  ┌────────┐
//! │ IDLE │─────────►│ LISTENING │─────────►│ PROCESSING │──────────►│ RESULT │
//! └──────┘          └───────────┘          └────────────┘           └────────┘
//!    ▲                    │                      │                      │
//!    │      stop          │ error/timeout        │ error                │
//!    │◄───────────────────┤──────────────►┌───────┐◄──────────┘         │
//!    │                                    │ ERROR │                     │
//!    │          display window            └───────┘                     │
//!    │◄───────────────────────────────────────┴─────────────────────────┘
//! ```
//!
//! Typed commands enter at PROCESSING without a listening session.

pub mod controller;
pub mod executor;
pub mod state;
pub mod transaction;

pub use controller::VoiceController;
pub use executor::{CommandExecutor, CommandResult};
pub use state::{SessionState, TransitionReason, VoiceEvent, VoiceStateMachine};
pub use transaction::{Transaction, TransactionKind, TransactionLog, TransactionState};
