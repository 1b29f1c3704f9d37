//! Downstream collaborator seams.
//!
//! The pipeline hands every emitted [`ProcessingResult`] to registered
//! sinks (persistence lives behind [`ResultSink`]) and dispatches
//! question-typed results to an [`AnswerService`] without awaiting the
//! answer. Collaborator failures are logged by the caller and never roll
//! back pipeline state.

use crate::transcript::types::{BookRef, ProcessingResult};
use async_trait::async_trait;
use std::sync::Mutex;

/// Pluggable handler for emitted results.
/// Pairs with the fragment stream for input - this handles classified output.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Handle an emitted result. Called once per logical utterance.
    async fn handle(&self, result: &ProcessingResult) -> anyhow::Result<()>;

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "sink"
    }
}

/// Answer generation for question-typed results.
///
/// The pipeline dispatches to this fire-and-forget; the implementation is
/// expected to deliver the answer through its own channel.
#[async_trait]
pub trait AnswerService: Send + Sync {
    async fn answer(&self, content: &str, book: Option<&BookRef>) -> anyhow::Result<String>;
}

/// Advisory listener for buffer-state hints ("listening…", "capturing…").
/// Informational only; not part of the emission contract.
pub trait HintListener: Send + Sync {
    fn on_hint(&self, hint: &str);
}

/// Sink that collects results in memory. Useful for tests and batch mode.
#[derive(Default)]
pub struct CollectorSink {
    results: Mutex<Vec<ProcessingResult>>,
}

impl CollectorSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything collected so far.
    pub fn collected(&self) -> Vec<ProcessingResult> {
        self.results
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.results.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ResultSink for CollectorSink {
    async fn handle(&self, result: &ProcessingResult) -> anyhow::Result<()> {
        if let Ok(mut guard) = self.results.lock() {
            guard.push(result.clone());
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "collector"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::types::{ContentMetadata, ContentType};
    use std::time::SystemTime;
    use uuid::Uuid;

    fn result(content: &str) -> ProcessingResult {
        ProcessingResult {
            id: Uuid::new_v4(),
            content: content.to_string(),
            content_type: ContentType::Note,
            confidence: 0.6,
            reasoning: "test".to_string(),
            metadata: ContentMetadata::default(),
            source_fragments: vec![],
            book_context: None,
            page_number: None,
            timestamp: SystemTime::now(),
        }
    }

    #[tokio::test]
    async fn test_collector_sink_accumulates() {
        let sink = CollectorSink::new();
        sink.handle(&result("first")).await.unwrap();
        sink.handle(&result("second")).await.unwrap();
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.collected()[0].content, "first");
    }

    #[test]
    fn test_collector_sink_name() {
        assert_eq!(CollectorSink::new().name(), "collector");
    }
}
