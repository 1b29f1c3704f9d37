//! Fragment buffer for one in-progress utterance.
//!
//! Accumulates partial recognizer updates, collapses stutters and
//! incremental refinements, and decides when the utterance is ready
//! to flush based on pause timing and punctuation.

use crate::config::BufferConfig;
use crate::transcript::types::Fragment;
use std::time::Duration;

/// Terminal sentence punctuation.
pub(crate) fn ends_terminal(text: &str) -> bool {
    text.trim_end()
        .ends_with(|c| matches!(c, '.' | '!' | '?'))
}

/// Lowercased, trimmed comparison form used for overlap checks.
fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Collapses immediately repeated 1- and 2-word sequences.
///
/// `"I think I think this this book"` becomes `"I think this book"`.
/// Comparison is case-insensitive; the first occurrence's casing wins.
pub(crate) fn collapse_repeats(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut out: Vec<&str> = Vec::with_capacity(words.len());
    let mut i = 0;
    while i < words.len() {
        // Repeated bigram: "of the of the" -> "of the"
        if out.len() >= 2 && i + 1 < words.len() {
            let prev_a = out[out.len() - 2];
            let prev_b = out[out.len() - 1];
            if prev_a.eq_ignore_ascii_case(words[i]) && prev_b.eq_ignore_ascii_case(words[i + 1]) {
                i += 2;
                continue;
            }
        }
        // Repeated single word: "the the" -> "the"
        if let Some(last) = out.last() {
            if last.eq_ignore_ascii_case(words[i]) {
                i += 1;
                continue;
            }
        }
        out.push(words[i]);
        i += 1;
    }
    out.join(" ")
}

/// Buffer holding the fragments of one in-progress utterance.
pub struct FragmentBuffer {
    config: BufferConfig,
    fragments: Vec<Fragment>,
}

impl FragmentBuffer {
    /// Creates a buffer with default configuration.
    pub fn new() -> Self {
        Self::with_config(BufferConfig::default())
    }

    /// Creates a buffer with custom configuration.
    pub fn with_config(config: BufferConfig) -> Self {
        Self {
            config,
            fragments: Vec::new(),
        }
    }

    /// Adds a fragment, collapsing overlap with the last stored one.
    ///
    /// Returns `true` if the fragment was stored (appended or replaced the
    /// last entry), `false` if it was dropped as noise or a repeat.
    pub fn add(&mut self, fragment: Fragment) -> bool {
        if fragment.text.trim().chars().count() <= self.config.min_fragment_chars {
            return false;
        }

        enum Action {
            Drop,
            Replace,
            Append,
        }

        let new_norm = normalize(&fragment.text);
        let action = match self.fragments.last() {
            None => Action::Append,
            Some(last) => {
                let last_norm = normalize(&last.text);
                if new_norm == last_norm {
                    // Exact re-transcription of the last update.
                    Action::Drop
                } else if new_norm.contains(&last_norm) && new_norm.len() > last_norm.len() {
                    // Incremental refinement: recognizer extended its hypothesis.
                    Action::Replace
                } else if last_norm.starts_with(&new_norm) && last_norm.len() < new_norm.len() * 2 {
                    // Stutter: recognizer restarted with a shorter prefix.
                    Action::Replace
                } else if last_norm.contains(&new_norm) {
                    // Shrinking hypothesis already covered by the last fragment.
                    Action::Drop
                } else {
                    Action::Append
                }
            }
        };

        match action {
            Action::Drop => false,
            Action::Replace => {
                if let Some(slot) = self.fragments.last_mut() {
                    *slot = fragment;
                }
                true
            }
            Action::Append => {
                self.fragments.push(fragment);
                true
            }
        }
    }

    /// Assembles the buffered fragments into one candidate utterance.
    ///
    /// With multiple fragments the single longest one is assumed most
    /// complete; if it comes out too thin after stutter collapse, the most
    /// recent fragment is used instead. Returns the text together with the
    /// fragments that contributed to it.
    pub fn assemble(&self) -> Option<(String, Vec<Fragment>)> {
        let last = self.fragments.last()?;

        let text = if self.fragments.len() > 1 {
            let longest = self
                .fragments
                .iter()
                .max_by_key(|f| f.text.chars().count())
                .unwrap_or(last);
            let cleaned = collapse_repeats(&longest.text);
            if cleaned.chars().count() >= crate::defaults::MIN_ASSEMBLED_CHARS {
                cleaned
            } else {
                collapse_repeats(&last.text)
            }
        } else {
            collapse_repeats(&last.text)
        };

        if text.is_empty() {
            return None;
        }
        Some((text, self.fragments.clone()))
    }

    /// Whether the buffered utterance is ready to flush.
    ///
    /// An utterance flushes unconditionally once `pause_threshold` has
    /// elapsed since the last fragment (given a minimum word count), and
    /// earlier when punctuation already marks it complete.
    pub fn should_process(&self, pause_threshold: Duration) -> bool {
        let Some(last) = self.fragments.last() else {
            return false;
        };
        let elapsed = last.timestamp.elapsed();
        let words = self.word_count();
        let text = self.current_text();

        // Unconditional flush: never leave a buffer stuck.
        if elapsed >= pause_threshold && words >= 3 {
            return true;
        }
        // Terminal punctuation marks the thought complete; flush early.
        if elapsed >= pause_threshold / 2 && ends_terminal(&text) && words >= 3 {
            return true;
        }
        // Questions want a fast answer; flush a little early.
        if elapsed >= pause_threshold * 3 / 5 && text.contains('?') && words >= 4 {
            return true;
        }
        false
    }

    /// Concatenated text of all buffered fragments.
    pub fn current_text(&self) -> String {
        self.fragments
            .iter()
            .map(|f| f.text.trim())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Advisory UI hint reflecting buffer state.
    pub fn hint(&self) -> &'static str {
        if self.fragments.is_empty() {
            return "listening…";
        }
        let text = normalize(&self.current_text());
        if text.contains("quote") || text.contains('"') || text.contains('\u{201c}') {
            "capturing quote…"
        } else if text.contains('?') {
            "hearing a question…"
        } else {
            "capturing…"
        }
    }

    /// Discards the in-progress utterance.
    pub fn clear(&mut self) {
        self.fragments.clear();
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Mutable access to the newest fragment, for tests that backdate it.
    #[cfg(test)]
    pub(crate) fn newest_mut(&mut self) -> Option<&mut Fragment> {
        self.fragments.last_mut()
    }

    /// Word count across all buffered fragments.
    pub fn word_count(&self) -> usize {
        self.fragments
            .iter()
            .map(|f| f.word_count())
            .sum()
    }
}

impl Default for FragmentBuffer {
    fn default() -> Self {
        Self::new()
    }
}
