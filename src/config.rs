use crate::defaults;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Root configuration for the transcript pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub buffer: BufferConfig,
    pub dedup: DedupConfig,
    pub classifier: ClassifierConfig,
}

/// Fragment buffer and flush timing configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BufferConfig {
    /// Idle time (ms) after the last fragment before an utterance is ready.
    pub pause_threshold_ms: u64,
    /// Background force-flush timer interval (ms).
    pub tick_interval_ms: u64,
    /// Fragments with this many characters or fewer are dropped on ingest.
    pub min_fragment_chars: usize,
    /// Minimum buffered word count before the timer may force a flush.
    pub timer_flush_min_words: usize,
}

/// Duplicate suppression configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DedupConfig {
    /// Rolling window (seconds) for cross-utterance similarity checks.
    pub window_secs: u64,
    /// Token-set Jaccard similarity above which utterances are duplicates.
    pub similarity_threshold: f64,
    /// Capacity of the exact-normalized-string recent cache.
    pub recent_cache_size: usize,
    /// Emitted results retained for trailing duplicate cross-checks.
    pub history_limit: usize,
}

/// Heuristic detector thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassifierConfig {
    pub quote_threshold: f32,
    pub question_threshold: f32,
    pub insight_threshold: f32,
    pub reflection_threshold: f32,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            pause_threshold_ms: defaults::PAUSE_THRESHOLD_MS,
            tick_interval_ms: defaults::TICK_INTERVAL_MS,
            min_fragment_chars: defaults::MIN_FRAGMENT_CHARS,
            timer_flush_min_words: defaults::TIMER_FLUSH_MIN_WORDS,
        }
    }
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            window_secs: defaults::DEDUP_WINDOW_SECS,
            similarity_threshold: defaults::SIMILARITY_THRESHOLD,
            recent_cache_size: defaults::RECENT_CACHE_SIZE,
            history_limit: defaults::HISTORY_LIMIT,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            quote_threshold: defaults::QUOTE_THRESHOLD,
            question_threshold: defaults::QUESTION_THRESHOLD,
            insight_threshold: defaults::INSIGHT_THRESHOLD,
            reflection_threshold: defaults::REFLECTION_THRESHOLD,
        }
    }
}

impl BufferConfig {
    /// Pause threshold as a `Duration`.
    pub fn pause_threshold(&self) -> Duration {
        Duration::from_millis(self.pause_threshold_ms)
    }

    /// Timer tick interval as a `Duration`.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl DedupConfig {
    /// Dedup window as a `Duration`.
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file or fall back to defaults
    ///
    /// A missing file silently yields defaults; invalid TOML or failed
    /// validation logs a warning and also yields defaults. Use [`Config::load`]
    /// when a bad file should be an error.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Self::default()
                } else {
                    tracing::warn!("invalid config, using defaults: {e}");
                    Self::default()
                }
            }
        }
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.dedup.similarity_threshold) {
            anyhow::bail!("dedup.similarity_threshold must be between 0 and 1");
        }
        if self.buffer.pause_threshold_ms == 0 {
            anyhow::bail!("buffer.pause_threshold_ms must be positive");
        }
        if self.dedup.history_limit == 0 {
            anyhow::bail!("dedup.history_limit must be positive");
        }
        Ok(())
    }
}
