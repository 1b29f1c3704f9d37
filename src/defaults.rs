//! Default configuration constants for marginalia.
//!
//! This module provides shared constants used across different configuration types
//! to ensure consistency and eliminate duplication.

/// Default pause threshold in milliseconds before a buffered utterance is
/// considered ready to flush.
///
/// 1500ms (1.5 seconds) allows for natural pauses in speech without prematurely
/// splitting an utterance.
pub const PAUSE_THRESHOLD_MS: u64 = 1500;

/// Default interval in milliseconds for the background force-flush timer.
///
/// The timer only flushes buffers that already satisfy the size and pause
/// conditions, so a coarse tick is sufficient.
pub const TICK_INTERVAL_MS: u64 = 2000;

/// Rolling window in seconds for cross-utterance duplicate detection.
///
/// ASR restarts and network jitter retranscribe the same sentence within
/// seconds; two minutes comfortably covers observed retransmission gaps.
pub const DEDUP_WINDOW_SECS: u64 = 120;

/// Token-set Jaccard similarity above which two utterances are considered
/// the same utterance rephrased by the recognizer.
pub const SIMILARITY_THRESHOLD: f64 = 0.85;

/// Maximum entries in the exact-normalized-string recent cache.
pub const RECENT_CACHE_SIZE: usize = 10;

/// Maximum emitted results retained for trailing duplicate cross-checks.
pub const HISTORY_LIMIT: usize = 50;

/// Number of trailing results compared for containment before emission.
pub const HISTORY_CROSSCHECK_DEPTH: usize = 5;

/// Fragments with this many characters or fewer are noise, not speech.
pub const MIN_FRAGMENT_CHARS: usize = 2;

/// Minimum cleaned length for the longest-fragment assembly strategy.
///
/// Below this the longest fragment is too thin to trust and assembly falls
/// back to the most recent fragment.
pub const MIN_ASSEMBLED_CHARS: usize = 15;

/// Confidence a quote detection must reach to win.
pub const QUOTE_THRESHOLD: f32 = 0.5;

/// Confidence a question detection must reach to win.
pub const QUESTION_THRESHOLD: f32 = 0.6;

/// Confidence an insight detection must reach to win.
pub const INSIGHT_THRESHOLD: f32 = 0.6;

/// Confidence a reflection detection must reach to win.
pub const REFLECTION_THRESHOLD: f32 = 0.6;

/// Confidence assigned to the fallback Note classification.
pub const NOTE_CONFIDENCE: f32 = 0.6;

/// Minimum buffered word count before the periodic timer may force a flush.
pub const TIMER_FLUSH_MIN_WORDS: usize = 5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_are_valid_confidences() {
        for t in [
            QUOTE_THRESHOLD,
            QUESTION_THRESHOLD,
            INSIGHT_THRESHOLD,
            REFLECTION_THRESHOLD,
            NOTE_CONFIDENCE,
        ] {
            assert!((0.0..=1.0).contains(&t));
        }
    }

    #[test]
    fn test_crosscheck_depth_within_history() {
        assert!(HISTORY_CROSSCHECK_DEPTH <= HISTORY_LIMIT);
    }
}
