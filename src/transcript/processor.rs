//! Processing orchestrator.
//!
//! Single entry point for recognizer fragments. Owns the buffer, the
//! duplicate layers, the classifier and the trailing result history, and
//! drives the processing state machine. All mutation funnels through one
//! owner (see [`super::handle`] for the serialized async wrapper), so no
//! locking happens here.

use crate::config::Config;
use crate::transcript::buffer::FragmentBuffer;
use crate::transcript::classifier::ContentClassifier;
use crate::transcript::cleaner;
use crate::transcript::dedup::{self, DedupService, RecentCache};
use crate::transcript::state::ProcessingState;
use crate::transcript::types::{
    BookRef, DuplicateKind, Fragment, ProcessingResult, Rejection,
};
use std::collections::VecDeque;
use std::time::SystemTime;
use tracing::{debug, info};
use uuid::Uuid;

/// Orchestrates fragment ingestion through to result emission.
pub struct TranscriptProcessor {
    config: Config,
    buffer: FragmentBuffer,
    dedup: DedupService,
    recent: RecentCache,
    classifier: ContentClassifier,
    /// Trailing emitted results, FIFO-capped, for duplicate cross-checks.
    history: VecDeque<ProcessingResult>,
    state: ProcessingState,
    /// Reading context from the most recent fragment, used by timer flushes.
    context: Option<BookRef>,
}

impl TranscriptProcessor {
    /// Creates a processor with components built from `config`.
    pub fn new(config: Config) -> Self {
        let buffer = FragmentBuffer::with_config(config.buffer.clone());
        let dedup = DedupService::with_config(config.dedup.clone());
        let classifier = ContentClassifier::with_config(config.classifier.clone());
        Self::with_parts(config, buffer, dedup, classifier)
    }

    /// Creates a processor from explicitly injected components.
    pub fn with_parts(
        config: Config,
        buffer: FragmentBuffer,
        dedup: DedupService,
        classifier: ContentClassifier,
    ) -> Self {
        let recent = RecentCache::new(config.dedup.recent_cache_size);
        Self {
            config,
            buffer,
            dedup,
            recent,
            classifier,
            history: VecDeque::new(),
            state: ProcessingState::Idle,
            context: None,
        }
    }

    /// Submits one recognizer update.
    ///
    /// Returns a result when this update completed an utterance that passed
    /// validation and every duplicate layer; `None` otherwise. All rejection
    /// reasons collapse to `None` here and are logged individually.
    pub fn process(
        &mut self,
        text: &str,
        confidence: f32,
        is_final: bool,
        context: Option<BookRef>,
    ) -> Option<ProcessingResult> {
        match self.ingest(text, confidence, is_final, context) {
            Ok(result) => Some(result),
            Err(Rejection::NotReady) => None,
            Err(rejection) => {
                debug!(%rejection, text, "no emission");
                None
            }
        }
    }

    fn ingest(
        &mut self,
        text: &str,
        confidence: f32,
        is_final: bool,
        context: Option<BookRef>,
    ) -> Result<ProcessingResult, Rejection> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(Rejection::TooShort);
        }
        if trimmed.chars().count() <= 5 && !is_final && !trimmed.contains('?') {
            return Err(Rejection::TooShort);
        }

        if context.is_some() {
            self.context = context;
        }

        let duplicate = if self.recent.contains(trimmed) {
            Some(DuplicateKind::RecentCache)
        } else if !self.buffer.is_empty()
            && dedup::normalize(&self.buffer.current_text()).contains(&dedup::normalize(trimmed))
        {
            // Already captured by the in-progress utterance.
            Some(DuplicateKind::InFlight)
        } else {
            None
        };

        match duplicate {
            Some(kind) if !is_final => return Err(Rejection::Duplicate(kind)),
            Some(kind) => {
                // Recognizers commonly close an utterance by re-sending it
                // with the final flag set. Discard the fragment but still
                // run the flush below so the buffered utterance is not
                // stranded.
                debug!(%kind, "final fragment discarded as duplicate");
            }
            None => {
                if self.buffer.add(Fragment::new(trimmed, confidence, is_final)) {
                    self.set_state(ProcessingState::Buffering);
                }
            }
        }

        let ready =
            is_final || self.buffer.should_process(self.config.buffer.pause_threshold());
        if !ready {
            return Err(Rejection::NotReady);
        }
        self.flush()
    }

    /// Flush attempt used by the periodic timer.
    ///
    /// Purely additive: only flushes when the buffer already holds enough
    /// words and the pause conditions are met.
    pub fn tick(&mut self) -> Option<ProcessingResult> {
        if self.buffer.word_count() < self.config.buffer.timer_flush_min_words {
            return None;
        }
        if !self.buffer.should_process(self.config.buffer.pause_threshold()) {
            return None;
        }
        match self.flush() {
            Ok(result) => {
                info!("timer-forced flush emitted a result");
                Some(result)
            }
            Err(Rejection::NothingBuffered) | Err(Rejection::NotReady) => None,
            Err(rejection) => {
                debug!(%rejection, "timer flush produced no emission");
                None
            }
        }
    }

    /// Final flush on session stop; validation and dedup still apply.
    pub fn finish(&mut self) -> Option<ProcessingResult> {
        if self.buffer.is_empty() {
            return None;
        }
        let result = self.flush().ok();
        self.buffer.clear();
        self.set_state(ProcessingState::Idle);
        result
    }

    /// Unconditionally discards the in-progress utterance.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.set_state(ProcessingState::Idle);
    }

    /// Current state machine position.
    pub fn state(&self) -> ProcessingState {
        self.state
    }

    /// Advisory UI hint for the current buffer contents.
    pub fn hint(&self) -> &'static str {
        self.buffer.hint()
    }

    /// Number of results retained for trailing duplicate cross-checks.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Entries currently inside the dedup window.
    pub fn dedup_len(&self) -> usize {
        self.dedup.len()
    }

    /// Entries in the recent exact-string cache.
    pub fn recent_cache_len(&self) -> usize {
        self.recent.len()
    }

    fn flush(&mut self) -> Result<ProcessingResult, Rejection> {
        // A final fragment can arrive with nothing buffered (noise dropped
        // on ingest, or a repeat already emitted); that is a quiet
        // no-emission, not a state transition.
        if self.buffer.is_empty() {
            return Err(Rejection::NothingBuffered);
        }
        self.set_state(ProcessingState::Detecting);

        let Some((raw, fragments)) = self.buffer.assemble() else {
            return Err(self.reject(Rejection::NothingBuffered));
        };
        let cleaned = cleaner::clean(&raw);

        if !cleaner::should_save(&cleaned) {
            return Err(self.reject(Rejection::Filtered));
        }
        if self.recent.contains(&cleaned) {
            return Err(self.reject(Rejection::Duplicate(DuplicateKind::RecentCache)));
        }
        if let Some(kind) = self.dedup.check(&cleaned) {
            return Err(self.reject(Rejection::Duplicate(kind)));
        }
        if self.matches_trailing_history(&cleaned) {
            return Err(self.reject(Rejection::Duplicate(DuplicateKind::TrailingHistory)));
        }

        self.set_state(ProcessingState::Processing);
        let classification = self.classifier.classify(&cleaned);
        let page_number = self.classifier.extract_page_number(&raw);

        self.set_state(ProcessingState::SavingContent);
        let result = ProcessingResult {
            id: Uuid::new_v4(),
            content: classification.content,
            content_type: classification.content_type,
            confidence: classification.confidence,
            reasoning: classification.reasoning,
            metadata: classification.metadata,
            source_fragments: fragments,
            book_context: self.context.clone(),
            page_number,
            timestamp: SystemTime::now(),
        };

        self.dedup.record(&cleaned, result.content_type);
        self.recent.insert(&cleaned);
        self.history.push_back(result.clone());
        while self.history.len() > self.config.dedup.history_limit {
            self.history.pop_front();
        }
        self.buffer.clear();

        info!(
            content_type = %result.content_type,
            confidence = result.confidence,
            "emitted result"
        );
        self.set_state(ProcessingState::Complete);
        self.set_state(ProcessingState::Idle);
        Ok(result)
    }

    /// Belt-and-suspenders check against the last few emitted results,
    /// guarding against racing flush triggers.
    fn matches_trailing_history(&self, cleaned: &str) -> bool {
        let candidate = dedup::normalize(cleaned);
        self.history
            .iter()
            .rev()
            .take(crate::defaults::HISTORY_CROSSCHECK_DEPTH)
            .any(|r| {
                let prior = dedup::normalize(&r.content);
                prior == candidate || prior.contains(&candidate) || candidate.contains(&prior)
            })
    }

    fn reject(&mut self, rejection: Rejection) -> Rejection {
        self.buffer.clear();
        self.set_state(ProcessingState::Idle);
        rejection
    }

    fn set_state(&mut self, next: ProcessingState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        self.state = next;
    }
}
