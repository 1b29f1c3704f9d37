//! Real-time transcript content pipeline.
//!
//! Assembles partial speech-to-text fragments into utterances, suppresses
//! stutters and retranscriptions, classifies the result, and emits at most
//! one result per logical utterance:
//!
//! ```text
//! ┌───────────┐    ┌──────────┐    ┌───────────┐    ┌───────┐    ┌────────────┐
//! │ Fragments │───▶│  Buffer  │───▶│ Cleaner / │───▶│ Dedup │───▶│ Classifier │───▶ Sinks
//! │  (ASR)    │    │          │    │ Validator │    │       │    │            │
//! └───────────┘    └──────────┘    └───────────┘    └───────┘    └────────────┘
//!                       ▲
//!                       │ force flush
//!                  periodic timer
//! ```
//!
//! [`processor::TranscriptProcessor`] is the synchronous single owner of all
//! pipeline state; [`handle::ProcessorHandle`] wraps it in a tokio task that
//! serializes producers and runs the timer.

pub mod buffer;
pub mod classifier;
pub mod cleaner;
pub mod dedup;
pub mod handle;
pub mod processor;
pub mod sink;
pub mod state;
pub mod types;

pub use buffer::FragmentBuffer;
pub use classifier::{Classification, ContentClassifier};
pub use dedup::{DedupService, RecentCache};
pub use handle::{Collaborators, ProcessorHandle};
pub use processor::TranscriptProcessor;
pub use sink::{AnswerService, CollectorSink, HintListener, ResultSink};
pub use state::ProcessingState;
pub use types::{
    BookRef, ContentMetadata, ContentType, DuplicateKind, Fragment, ProcessingResult, Rejection,
};
