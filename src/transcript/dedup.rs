//! Duplicate suppression for emitted utterances.
//!
//! Two structures back the at-most-once emission guarantee:
//! - [`DedupService`]: a time-windowed history of emitted utterances checked
//!   by exact hash and by token-set Jaccard similarity.
//! - [`RecentCache`]: a small bounded FIFO of exact normalized strings for
//!   fast short-circuit rejection on the ingest path.

use crate::config::DedupConfig;
use crate::transcript::types::{ContentType, DuplicateKind};
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashSet, VecDeque};
use std::hash::{Hash, Hasher};
use std::time::Instant;

/// Lowercase, trim, collapse internal whitespace.
pub(crate) fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn hash_of(normalized: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    normalized.hash(&mut hasher);
    hasher.finish()
}

/// Token-set Jaccard similarity over whitespace-split tokens.
pub(crate) fn jaccard(a: &str, b: &str) -> f64 {
    let set_a: HashSet<&str> = a.split_whitespace().collect();
    let set_b: HashSet<&str> = b.split_whitespace().collect();
    if set_a.is_empty() && set_b.is_empty() {
        return 1.0;
    }
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    intersection as f64 / union as f64
}

struct HistoryEntry {
    hash: u64,
    normalized: String,
    timestamp: Instant,
    #[allow(dead_code)]
    content_type: ContentType,
}

/// Rolling time-windowed history of emitted utterances.
pub struct DedupService {
    config: DedupConfig,
    entries: VecDeque<HistoryEntry>,
}

impl DedupService {
    /// Creates a service with default configuration.
    pub fn new() -> Self {
        Self::with_config(DedupConfig::default())
    }

    /// Creates a service with custom configuration.
    pub fn with_config(config: DedupConfig) -> Self {
        Self {
            config,
            entries: VecDeque::new(),
        }
    }

    /// Checks a candidate utterance against the rolling window.
    ///
    /// Prunes expired entries, then reports the first matching layer:
    /// exact normalized-hash match, or token-set similarity above the
    /// configured threshold.
    pub fn check(&mut self, text: &str) -> Option<DuplicateKind> {
        self.prune(Instant::now());

        let normalized = normalize(text);
        let hash = hash_of(&normalized);

        for entry in &self.entries {
            if entry.hash == hash {
                return Some(DuplicateKind::ExactHash);
            }
        }
        for entry in &self.entries {
            if jaccard(&normalized, &entry.normalized) > self.config.similarity_threshold {
                return Some(DuplicateKind::Similar);
            }
        }
        None
    }

    /// Records an emitted utterance into the window.
    pub fn record(&mut self, text: &str, content_type: ContentType) {
        self.record_at(text, content_type, Instant::now());
    }

    fn record_at(&mut self, text: &str, content_type: ContentType, timestamp: Instant) {
        let normalized = normalize(text);
        self.entries.push_back(HistoryEntry {
            hash: hash_of(&normalized),
            normalized,
            timestamp,
            content_type,
        });
    }

    fn prune(&mut self, now: Instant) {
        let window = self.config.window();
        while let Some(front) = self.entries.front() {
            if now.duration_since(front.timestamp) > window {
                self.entries.pop_front();
            } else {
                break;
            }
        }
    }

    /// Number of entries currently inside the window.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Discards all history.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for DedupService {
    fn default() -> Self {
        Self::new()
    }
}

/// Bounded FIFO set of exact normalized strings processed recently.
///
/// Independent of the time window: purely count-bounded, so a burst of
/// identical retranscriptions is rejected without touching the history.
pub struct RecentCache {
    capacity: usize,
    entries: VecDeque<String>,
}

impl RecentCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Whether the exact normalized string was processed recently.
    pub fn contains(&self, text: &str) -> bool {
        let normalized = normalize(text);
        self.entries.iter().any(|e| *e == normalized)
    }

    /// Inserts a processed string, evicting the oldest at capacity.
    pub fn insert(&mut self, text: &str) {
        let normalized = normalize(text);
        if self.entries.iter().any(|e| *e == normalized) {
            return;
        }
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(normalized);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_normalize_collapses_whitespace_and_case() {
        assert_eq!(normalize("  Hello   THERE  world "), "hello there world");
    }

    #[test]
    fn test_jaccard_identical_sets() {
        assert_eq!(jaccard("a b c", "c b a"), 1.0);
    }

    #[test]
    fn test_jaccard_disjoint_sets() {
        assert_eq!(jaccard("a b", "c d"), 0.0);
    }

    #[test]
    fn test_jaccard_partial_overlap() {
        // {a,b,c} vs {b,c,d}: 2 shared of 4 total.
        assert!((jaccard("a b c", "b c d") - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_exact_duplicate_detected() {
        let mut dedup = DedupService::new();
        dedup.record("All we have to do is decide", ContentType::Quote);
        assert_eq!(
            dedup.check("all we have to DO is decide"),
            Some(DuplicateKind::ExactHash)
        );
    }

    #[test]
    fn test_similar_duplicate_detected() {
        let mut dedup = DedupService::new();
        dedup.record(
            "all we have to do is decide what to do with the time that is given us",
            ContentType::Quote,
        );
        // One token differs; similarity stays above 0.85.
        assert_eq!(
            dedup.check("all we have to do is decide what to do with the time that is given to us"),
            Some(DuplicateKind::Similar)
        );
    }

    #[test]
    fn test_dissimilar_text_passes() {
        let mut dedup = DedupService::new();
        dedup.record("a completely different sentence here", ContentType::Note);
        assert_eq!(dedup.check("what does the author mean by this"), None);
    }

    #[test]
    fn test_window_expiry() {
        let mut dedup = DedupService::new();
        let old = Instant::now()
            .checked_sub(Duration::from_secs(121))
            .unwrap_or_else(Instant::now);
        dedup.record_at("an old utterance from long ago", ContentType::Note, old);
        assert_eq!(dedup.check("an old utterance from long ago"), None);
        assert!(dedup.is_empty());
    }

    #[test]
    fn test_entries_inside_window_survive_prune() {
        let mut dedup = DedupService::new();
        dedup.record("fresh utterance", ContentType::Note);
        dedup.check("unrelated words entirely");
        assert_eq!(dedup.len(), 1);
    }

    #[test]
    fn test_recent_cache_exact_match() {
        let mut cache = RecentCache::new(10);
        cache.insert("Hello there World");
        assert!(cache.contains("hello  there world"));
        assert!(!cache.contains("hello there worlds"));
    }

    #[test]
    fn test_recent_cache_evicts_oldest() {
        let mut cache = RecentCache::new(3);
        cache.insert("one");
        cache.insert("two");
        cache.insert("three");
        cache.insert("four");
        assert_eq!(cache.len(), 3);
        assert!(!cache.contains("one"));
        assert!(cache.contains("four"));
    }

    #[test]
    fn test_recent_cache_bounded_under_load() {
        let mut cache = RecentCache::new(10);
        for i in 0..1000 {
            cache.insert(&format!("utterance number {i}"));
        }
        assert_eq!(cache.len(), 10);
    }

    #[test]
    fn test_recent_cache_ignores_exact_repeat_insert() {
        let mut cache = RecentCache::new(3);
        cache.insert("same thing");
        cache.insert("same thing");
        assert_eq!(cache.len(), 1);
    }
}
