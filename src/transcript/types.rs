//! Data types for the transcript content pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Instant, SystemTime};
use uuid::Uuid;

/// One partial speech-to-text update, not yet a complete utterance.
#[derive(Debug, Clone)]
pub struct Fragment {
    /// Raw transcribed text of this update.
    pub text: String,
    /// Timestamp when this fragment arrived.
    pub timestamp: Instant,
    /// Recognizer confidence (0.0 to 1.0).
    pub confidence: f32,
    /// Whether the recognizer marked this update as final.
    pub is_final: bool,
}

impl Fragment {
    /// Creates a fragment stamped with the current time.
    pub fn new(text: impl Into<String>, confidence: f32, is_final: bool) -> Self {
        Self {
            text: text.into(),
            timestamp: Instant::now(),
            confidence,
            is_final,
        }
    }

    /// Whitespace-separated word count of the fragment text.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Kind of content an utterance was classified as.
///
/// Detectors run in a fixed priority sequence (quote, question, insight,
/// reflection, note-default); the enum order exists for stable sorting and
/// serialization, not for classification priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Question,
    Quote,
    Insight,
    Reflection,
    Note,
    /// Never produced by the classifier; exists for downstream consumers
    /// deserializing foreign data.
    Unknown,
}

impl ContentType {
    /// Whether results of this type are dispatched to the answer service.
    pub fn needs_ai_response(&self) -> bool {
        matches!(self, ContentType::Question)
    }

    /// Snake-case label used by persistence collaborators.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Question => "question",
            ContentType::Quote => "quote",
            ContentType::Insight => "insight",
            ContentType::Reflection => "reflection",
            ContentType::Note => "note",
            ContentType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier annotations attached to an emitted result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentMetadata {
    /// Whether the utterance reads as a complete thought.
    pub is_complete: bool,
    /// Whether the speaker appears to be mid-thought.
    pub needs_continuation: bool,
    /// Named entities picked out by the detectors.
    pub entities: Vec<String>,
    /// Which heuristic patterns matched during classification.
    pub detected_patterns: Vec<String>,
    /// Reaction phrase that introduced a quote, when one matched.
    pub reaction_type: Option<String>,
}

/// Reading context handed through to downstream collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRef {
    pub title: String,
    pub author: Option<String>,
}

impl BookRef {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: None,
        }
    }

    pub fn with_author(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: Some(author.into()),
        }
    }
}

/// One classified utterance, emitted at most once per logical utterance.
///
/// Immutable after creation. The pipeline keeps only a bounded trailing
/// history for duplicate cross-checks; ownership passes to the sinks.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingResult {
    pub id: Uuid,
    /// Cleaned utterance text (for quotes, the extracted quotation).
    pub content: String,
    pub content_type: ContentType,
    /// Detector confidence (0.0 to 1.0).
    pub confidence: f32,
    /// Human-readable account of why the detector matched.
    pub reasoning: String,
    pub metadata: ContentMetadata,
    /// Fragments that contributed to this utterance.
    #[serde(skip_serializing)]
    pub source_fragments: Vec<Fragment>,
    pub book_context: Option<BookRef>,
    pub page_number: Option<u32>,
    pub timestamp: SystemTime,
}

/// Why a duplicate was suppressed. Logged, never surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateKind {
    /// Exact normalized string seen in the recent cache.
    RecentCache,
    /// Normalized text already contained in the active buffer.
    InFlight,
    /// Exact hash match inside the dedup window.
    ExactHash,
    /// Token-set Jaccard similarity above the configured threshold.
    Similar,
    /// Matched one of the trailing emitted results.
    TrailingHistory,
}

impl fmt::Display for DuplicateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DuplicateKind::RecentCache => "recent-cache",
            DuplicateKind::InFlight => "in-flight",
            DuplicateKind::ExactHash => "exact-hash",
            DuplicateKind::Similar => "similar",
            DuplicateKind::TrailingHistory => "trailing-history",
        };
        f.write_str(s)
    }
}

/// Structured no-emission outcome.
///
/// The public `process` contract collapses all of these to `None`; the
/// variants exist for logging and tests.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// Empty or too-short input rejected before buffering.
    TooShort,
    /// Suppressed by one of the duplicate layers.
    Duplicate(DuplicateKind),
    /// Cleaned text failed the save gate.
    Filtered,
    /// Buffer produced no usable assembly.
    NothingBuffered,
    /// Buffer not yet ready to flush; keep collecting.
    NotReady,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::TooShort => f.write_str("too short"),
            Rejection::Duplicate(kind) => write!(f, "duplicate ({kind})"),
            Rejection::Filtered => f.write_str("filtered by validator"),
            Rejection::NothingBuffered => f.write_str("nothing buffered"),
            Rejection::NotReady => f.write_str("not ready"),
        }
    }
}
