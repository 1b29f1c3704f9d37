//! Processing state machine.
//!
//! ```text
//! Idle → Buffering → Detecting → Processing → SavingContent → Complete → Idle
//!                        │
//!                        └── any rejection ──▶ Idle (buffer cleared)
//! ```
//!
//! `Complete` is a single-tick state exposed for observability; the
//! processor moves back to `Idle` immediately after reporting it.

use std::fmt;

/// Where the pipeline currently is in an utterance's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessingState {
    /// No utterance in progress.
    #[default]
    Idle,
    /// Fragments are accumulating.
    Buffering,
    /// Assembly, cleaning, validation and dedup checks are running.
    Detecting,
    /// Classification is running.
    Processing,
    /// The result is being recorded and handed to sinks.
    SavingContent,
    /// A result was emitted this tick.
    Complete,
}

impl ProcessingState {
    /// Whether `next` is a legal transition from this state.
    pub fn can_transition_to(&self, next: ProcessingState) -> bool {
        use ProcessingState::*;
        matches!(
            (self, next),
            (Idle, Buffering)
                | (Buffering, Buffering)
                | (Buffering, Detecting)
                | (Detecting, Processing)
                | (Processing, SavingContent)
                | (SavingContent, Complete)
                | (Complete, Idle)
                // Rejection from the detect phase drops straight back.
                | (Detecting, Idle)
                // clear() cancels from anywhere.
                | (_, Idle)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingState::Idle => "idle",
            ProcessingState::Buffering => "buffering",
            ProcessingState::Detecting => "detecting",
            ProcessingState::Processing => "processing",
            ProcessingState::SavingContent => "saving-content",
            ProcessingState::Complete => "complete",
        }
    }
}

impl fmt::Display for ProcessingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
