//! marginalia - real-time transcript triage for a voice reading companion
//!
//! Turns a live stream of partial speech-to-text fragments into classified,
//! deduplicated reading notes, quotes, questions, insights and reflections.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod config;
pub mod defaults;
pub mod error;
pub mod transcript;

// Core pipeline
pub use transcript::processor::TranscriptProcessor;
pub use transcript::handle::{Collaborators, ProcessorHandle};

// Data model
pub use transcript::types::{
    BookRef, ContentMetadata, ContentType, DuplicateKind, Fragment, ProcessingResult, Rejection,
};

// Collaborator seams (persistence, AI answers, UI hints)
pub use transcript::sink::{AnswerService, CollectorSink, HintListener, ResultSink};

// Components (for explicit dependency injection)
pub use transcript::buffer::FragmentBuffer;
pub use transcript::classifier::ContentClassifier;
pub use transcript::dedup::{DedupService, RecentCache};
pub use transcript::state::ProcessingState;

// Error handling
pub use error::{MarginaliaError, Result};

// Config
pub use config::Config;
