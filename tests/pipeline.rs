//! End-to-end tests driving the async pipeline through its public handle.

use async_trait::async_trait;
use marginalia::{
    AnswerService, BookRef, Collaborators, CollectorSink, Config, ContentType, ProcessorHandle,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Config tuned for fast tests: short pauses, fast timer.
fn fast_config() -> Config {
    let mut config = Config::default();
    config.buffer.pause_threshold_ms = 100;
    config.buffer.tick_interval_ms = 50;
    config
}

fn spawn_with_sink(config: Config) -> (ProcessorHandle, Arc<CollectorSink>) {
    let sink = Arc::new(CollectorSink::new());
    let handle = ProcessorHandle::spawn(
        config,
        Collaborators {
            sinks: vec![sink.clone()],
            ..Default::default()
        },
    );
    (handle, sink)
}

#[tokio::test]
async fn at_most_once_emission_for_retranscribed_utterance() {
    let (handle, sink) = spawn_with_sink(Config::default());
    let text = "I think the unreliable narrator reframes the whole first act.";

    let first = handle.process(text, 0.9, true, None).await.unwrap();
    assert!(first.is_some());

    // Identical retranscription and a near-identical rephrasing, both
    // inside the dedup window.
    let second = handle.process(text, 0.9, true, None).await.unwrap();
    assert!(second.is_none());
    let third = handle
        .process(
            "I think the unreliable narrator really reframes the whole first act.",
            0.9,
            true,
            None,
        )
        .await
        .unwrap();
    assert!(third.is_none());

    assert_eq!(sink.len(), 1);
    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn incremental_fragments_assemble_into_one_utterance() {
    let (handle, sink) = spawn_with_sink(Config::default());

    for fragment in ["I think", "I think this book", "I think this book is great and moving."] {
        handle.process(fragment, 0.9, false, None).await.unwrap();
    }
    let result = handle.shutdown().await.unwrap().expect("one emission");
    assert_eq!(result.content, "I think this book is great and moving.");
    assert_eq!(sink.len(), 1);
}

#[tokio::test]
async fn timer_flushes_stalled_buffer() {
    let (handle, sink) = spawn_with_sink(fast_config());

    handle
        .process(
            "the framing device quietly changes what the prologue meant",
            0.9,
            false,
            None,
        )
        .await
        .unwrap();
    assert!(sink.is_empty());

    // No further fragments: the periodic timer must flush on its own.
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(sink.len(), 1);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn quote_pipeline_extracts_reaction_quote() {
    let (handle, _sink) = spawn_with_sink(Config::default());
    let book = BookRef::with_author("The Lord of the Rings", "J.R.R. Tolkien");

    let result = handle
        .process(
            "I love this quote. All we have to do is decide what to do with the time that is given us.",
            0.95,
            true,
            Some(book.clone()),
        )
        .await
        .unwrap()
        .expect("quote should emit");

    assert_eq!(result.content_type, ContentType::Quote);
    assert_eq!(
        result.metadata.reaction_type.as_deref(),
        Some("i love this quote")
    );
    assert_eq!(
        result.content,
        "All we have to do is decide what to do with the time that is given us."
    );
    assert_eq!(result.book_context, Some(book));
    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn context_setting_utterance_is_filtered() {
    let (handle, sink) = spawn_with_sink(Config::default());

    let result = handle
        .process("I'm reading Lord of the Rings", 0.9, true, None)
        .await
        .unwrap();
    assert!(result.is_none());
    assert!(sink.is_empty());
    handle.shutdown().await.unwrap();
}

struct RecordingAnswers {
    questions: Mutex<Vec<String>>,
}

#[async_trait]
impl AnswerService for RecordingAnswers {
    async fn answer(&self, content: &str, _book: Option<&BookRef>) -> anyhow::Result<String> {
        if let Ok(mut guard) = self.questions.lock() {
            guard.push(content.to_string());
        }
        Ok("because the author says so".to_string())
    }
}

#[tokio::test]
async fn questions_dispatch_to_answer_service_without_blocking() {
    let answers = Arc::new(RecordingAnswers {
        questions: Mutex::new(Vec::new()),
    });
    let sink = Arc::new(CollectorSink::new());
    let handle = ProcessorHandle::spawn(
        Config::default(),
        Collaborators {
            sinks: vec![sink.clone()],
            answers: Some(answers.clone()),
            ..Default::default()
        },
    );

    let result = handle
        .process("Why does the narrator keep contradicting himself?", 0.9, true, None)
        .await
        .unwrap()
        .expect("question should emit");
    assert_eq!(result.content_type, ContentType::Question);

    // A note right after the question must go straight through; the answer
    // dispatch is fire-and-forget.
    let note = handle
        .process(
            "The chapter closes on the harbor at dawn with the fleet gone.",
            0.9,
            true,
            None,
        )
        .await
        .unwrap();
    assert!(note.is_some());

    tokio::time::sleep(Duration::from_millis(50)).await;
    let questions = answers.questions.lock().unwrap();
    assert_eq!(questions.len(), 1);
    assert_eq!(sink.len(), 2);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn sustained_streaming_stays_bounded() {
    let (handle, sink) = spawn_with_sink(Config::default());

    for i in 0..200u32 {
        let text =
            format!("Observation number {i} notes the plot thickens considerably here today.");
        handle.process(&text, 0.9, true, None).await.unwrap();
    }

    // Every distinct utterance emitted exactly once.
    assert_eq!(sink.len(), 200);
    handle.shutdown().await.unwrap();
}
