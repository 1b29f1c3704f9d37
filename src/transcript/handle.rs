//! Async serialization point for the processor.
//!
//! Fragments may arrive from multiple producers (the live recognizer
//! stream, a forced flush on session stop), but all mutation funnels
//! through one tokio task that owns the [`TranscriptProcessor`]. The same
//! task runs the periodic force-flush timer, so no additional locking
//! exists anywhere in the pipeline.

use crate::config::Config;
use crate::error::{MarginaliaError, Result};
use crate::transcript::processor::TranscriptProcessor;
use crate::transcript::sink::{AnswerService, HintListener, ResultSink};
use crate::transcript::state::ProcessingState;
use crate::transcript::types::{BookRef, ProcessingResult};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

enum Command {
    Process {
        text: String,
        confidence: f32,
        is_final: bool,
        context: Option<BookRef>,
        reply: oneshot::Sender<Option<ProcessingResult>>,
    },
    Status {
        reply: oneshot::Sender<(ProcessingState, &'static str)>,
    },
    Clear,
    Shutdown {
        reply: oneshot::Sender<Option<ProcessingResult>>,
    },
}

/// Downstream collaborators attached to a running pipeline.
#[derive(Default)]
pub struct Collaborators {
    pub sinks: Vec<Arc<dyn ResultSink>>,
    pub answers: Option<Arc<dyn AnswerService>>,
    pub hints: Option<Arc<dyn HintListener>>,
}

/// Handle to the pipeline's owner task.
///
/// Cheap to clone; all clones feed the same serialized processor.
#[derive(Clone)]
pub struct ProcessorHandle {
    tx: mpsc::Sender<Command>,
}

impl ProcessorHandle {
    /// Spawns the owner task and returns a handle to it.
    pub fn spawn(config: Config, collaborators: Collaborators) -> Self {
        let (tx, rx) = mpsc::channel(64);
        let processor = TranscriptProcessor::new(config.clone());
        tokio::spawn(run(processor, config, collaborators, rx));
        Self { tx }
    }

    /// Submits one recognizer update and waits for the pipeline's verdict.
    pub async fn process(
        &self,
        text: &str,
        confidence: f32,
        is_final: bool,
        context: Option<BookRef>,
    ) -> Result<Option<ProcessingResult>> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Process {
                text: text.to_string(),
                confidence,
                is_final,
                context,
                reply,
            })
            .await
            .map_err(|_| MarginaliaError::ProcessorClosed)?;
        rx.await.map_err(|_| MarginaliaError::ProcessorClosed)
    }

    /// Current state and advisory hint.
    pub async fn status(&self) -> Result<(ProcessingState, &'static str)> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Status { reply })
            .await
            .map_err(|_| MarginaliaError::ProcessorClosed)?;
        rx.await.map_err(|_| MarginaliaError::ProcessorClosed)
    }

    /// Discards the in-progress utterance.
    pub async fn clear(&self) -> Result<()> {
        self.tx
            .send(Command::Clear)
            .await
            .map_err(|_| MarginaliaError::ProcessorClosed)
    }

    /// Force-flushes anything buffered, stops the owner task, and returns
    /// the final result if one was emitted.
    pub async fn shutdown(self) -> Result<Option<ProcessingResult>> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Shutdown { reply })
            .await
            .map_err(|_| MarginaliaError::ProcessorClosed)?;
        rx.await.map_err(|_| MarginaliaError::ProcessorClosed)
    }
}

async fn run(
    mut processor: TranscriptProcessor,
    config: Config,
    collaborators: Collaborators,
    mut rx: mpsc::Receiver<Command>,
) {
    let mut interval = tokio::time::interval(config.buffer.tick_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            cmd = rx.recv() => match cmd {
                Some(Command::Process { text, confidence, is_final, context, reply }) => {
                    let result = processor.process(&text, confidence, is_final, context);
                    if let Some(listener) = &collaborators.hints {
                        listener.on_hint(processor.hint());
                    }
                    if let Some(result) = &result {
                        dispatch(result, &collaborators).await;
                    }
                    let _ = reply.send(result);
                }
                Some(Command::Status { reply }) => {
                    let _ = reply.send((processor.state(), processor.hint()));
                }
                Some(Command::Clear) => {
                    processor.clear();
                    if let Some(listener) = &collaborators.hints {
                        listener.on_hint(processor.hint());
                    }
                }
                Some(Command::Shutdown { reply }) => {
                    let result = processor.finish();
                    if let Some(result) = &result {
                        dispatch(result, &collaborators).await;
                    }
                    let _ = reply.send(result);
                    break;
                }
                None => {
                    // All handles dropped; flush what remains and stop.
                    if let Some(result) = processor.finish() {
                        dispatch(&result, &collaborators).await;
                    }
                    break;
                }
            },
            _ = interval.tick() => {
                if let Some(result) = processor.tick() {
                    dispatch(&result, &collaborators).await;
                }
            }
        }
    }
    debug!("processor task stopped");
}

/// Hands a result to every sink and, for questions, to the answer service.
///
/// The answer call is spawned fire-and-forget so a slow model never blocks
/// the next fragment's ingestion.
async fn dispatch(result: &ProcessingResult, collaborators: &Collaborators) {
    for sink in &collaborators.sinks {
        if let Err(e) = sink.handle(result).await {
            warn!(sink = sink.name(), error = %e, "sink failed to handle result");
        }
    }

    if result.content_type.needs_ai_response() {
        if let Some(answers) = &collaborators.answers {
            let answers = Arc::clone(answers);
            let content = result.content.clone();
            let book = result.book_context.clone();
            tokio::spawn(async move {
                if let Err(e) = answers.answer(&content, book.as_ref()).await {
                    warn!(error = %e, "answer service failed");
                }
            });
        }
    }
}
