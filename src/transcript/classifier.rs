//! Heuristic content classification.
//!
//! Detectors run in a fixed priority sequence — quote, question, insight,
//! reflection — and the first one whose accumulated confidence clears its
//! own threshold wins. Anything else becomes a note. This is a fast triage
//! layer built on lexical cues, not a language model; classification is
//! synchronous and CPU-only.

use crate::config::ClassifierConfig;
use crate::transcript::buffer::ends_terminal;
use crate::transcript::types::{ContentMetadata, ContentType};
use regex::Regex;

/// Lexical cues that the speaker is about to recite a quotation.
///
/// Shared with the validator: a matched reaction phrase is always worth
/// keeping regardless of other gates.
pub(crate) const REACTION_PHRASES: &[&str] = &[
    "i love this quote",
    "listen to this",
    "this is beautiful",
    "i love this passage",
    "what a great line",
    "here's a good one",
    "this is so good",
    "oh i like this",
];

/// Reaction phrases strong enough to settle the classification outright.
const STRONG_REACTIONS: &[&str] = &["i love this quote", "listen to this"];

/// Verbs attributing words to an author.
const ATTRIBUTION_VERBS: &[&str] = &["says", "writes", "wrote", "according to"];

/// Archaic or literary words rarely produced in casual speech.
const ARCHAIC_MARKERS: &[&str] = &["thus", "hence", "thou", "thee", "shall", "whence"];

/// Leading words of an information-seeking question.
const INTERROGATIVES: &[&str] = &[
    "what", "why", "how", "when", "where", "who", "which", "can", "could", "would", "should",
    "is", "are", "does", "do", "did",
];

/// Rhetorical framings that weaken a question match.
const RHETORICAL_PATTERNS: &[&str] = &["i wonder", "what if", "isn't it"];

/// Markers of the reader connecting ideas.
const INSIGHT_MARKERS: &[&str] = &[
    "realize",
    "realized",
    "understand",
    "understood",
    "means that",
    "because",
    "connects to",
    "this shows",
    "the key is",
    "which explains",
];

/// First-person opinion markers.
const REFLECTION_MARKERS: &[&str] = &[
    "i think",
    "i feel",
    "i believe",
    "in my opinion",
    "perhaps",
    "maybe",
    "it seems",
    "to me",
];

/// Outcome of classifying one utterance.
#[derive(Debug, Clone)]
pub struct Classification {
    pub content_type: ContentType,
    pub confidence: f32,
    pub reasoning: String,
    /// The text to emit; differs from the input when a quote was extracted.
    pub content: String,
    pub metadata: ContentMetadata,
}

struct Detection {
    confidence: f32,
    reasoning: String,
    patterns: Vec<String>,
    reaction: Option<String>,
    extracted: Option<String>,
}

/// Priority-ordered heuristic classifier.
pub struct ContentClassifier {
    config: ClassifierConfig,
    page_re: Regex,
}

impl ContentClassifier {
    /// Creates a classifier with default thresholds.
    pub fn new() -> Self {
        Self::with_config(ClassifierConfig::default())
    }

    /// Creates a classifier with custom thresholds.
    pub fn with_config(config: ClassifierConfig) -> Self {
        // The pattern is a compile-time constant; construction cannot fail.
        #[allow(clippy::unwrap_used)]
        let page_re = Regex::new(r"(?i)\b(?:page|pg\.?|p\.)\s?(\d{1,5})\b").unwrap();
        Self { config, page_re }
    }

    /// Classifies a cleaned utterance.
    ///
    /// Always terminates with some content type; the fallback is a note
    /// with fixed confidence.
    pub fn classify(&self, text: &str) -> Classification {
        let mut base_metadata = ContentMetadata {
            is_complete: ends_terminal(text),
            needs_continuation: !ends_terminal(text),
            entities: extract_entities(text),
            detected_patterns: Vec::new(),
            reaction_type: None,
        };

        if let Some(d) = self.detect_quote(text) {
            if d.confidence >= self.config.quote_threshold {
                return self.finish(ContentType::Quote, d, text, base_metadata);
            }
        }
        if let Some(d) = self.detect_question(text) {
            if d.confidence >= self.config.question_threshold {
                return self.finish(ContentType::Question, d, text, base_metadata);
            }
        }
        if let Some(d) = self.detect_insight(text) {
            if d.confidence >= self.config.insight_threshold {
                return self.finish(ContentType::Insight, d, text, base_metadata);
            }
        }
        if let Some(d) = self.detect_reflection(text) {
            if d.confidence >= self.config.reflection_threshold {
                return self.finish(ContentType::Reflection, d, text, base_metadata);
            }
        }

        base_metadata.detected_patterns.push("default".to_string());
        Classification {
            content_type: ContentType::Note,
            confidence: crate::defaults::NOTE_CONFIDENCE,
            reasoning: "no detector cleared its threshold; kept as note".to_string(),
            content: text.to_string(),
            metadata: base_metadata,
        }
    }

    fn finish(
        &self,
        content_type: ContentType,
        detection: Detection,
        text: &str,
        mut metadata: ContentMetadata,
    ) -> Classification {
        metadata.detected_patterns = detection.patterns;
        metadata.reaction_type = detection.reaction;
        let content = detection.extracted.unwrap_or_else(|| text.to_string());
        Classification {
            content_type,
            confidence: detection.confidence.min(1.0),
            reasoning: detection.reasoning,
            content,
            metadata,
        }
    }

    fn detect_quote(&self, text: &str) -> Option<Detection> {
        let lower = text.to_lowercase();
        let mut confidence = 0.0f32;
        let mut patterns = Vec::new();
        let mut reasons = Vec::new();
        let mut reaction = None;
        let mut extracted = None;

        for phrase in REACTION_PHRASES {
            if let Some(pos) = lower.find(phrase) {
                if STRONG_REACTIONS.contains(phrase) {
                    confidence = 0.9;
                } else {
                    confidence += 0.5;
                }
                patterns.push(format!("reaction:{phrase}"));
                reasons.push(format!("reaction phrase \"{phrase}\""));
                reaction = Some((*phrase).to_string());
                extracted = extract_after_reaction(text, pos, phrase.len());
                break;
            }
        }

        if text.contains('"') || text.contains('\u{201c}') || text.contains('\u{201d}') {
            confidence += 0.25;
            patterns.push("quotation-marks".to_string());
            reasons.push("quotation marks".to_string());
        }
        for verb in ATTRIBUTION_VERBS {
            if lower.contains(verb) {
                confidence += 0.2;
                patterns.push(format!("attribution:{verb}"));
                reasons.push(format!("attribution \"{verb}\""));
            }
        }
        for marker in ARCHAIC_MARKERS {
            if contains_word(&lower, marker) {
                confidence += 0.2;
                patterns.push(format!("archaic:{marker}"));
                reasons.push(format!("literary marker \"{marker}\""));
            }
        }

        if confidence == 0.0 {
            return None;
        }
        Some(Detection {
            confidence,
            reasoning: format!("quote signals: {}", reasons.join(", ")),
            patterns,
            reaction,
            extracted,
        })
    }

    fn detect_question(&self, text: &str) -> Option<Detection> {
        let lower = text.to_lowercase();
        let mut confidence = 0.0f32;
        let mut patterns = Vec::new();
        let mut reasons = Vec::new();

        if text.trim_end().ends_with('?') {
            confidence += 0.4;
            patterns.push("trailing-question-mark".to_string());
            reasons.push("ends with question mark".to_string());
        }
        if let Some(first) = lower.split_whitespace().next() {
            let first = first.trim_matches(|c: char| !c.is_alphanumeric());
            if INTERROGATIVES.contains(&first) {
                confidence += 0.3;
                patterns.push(format!("interrogative:{first}"));
                reasons.push(format!("leads with \"{first}\""));
            }
        }
        for pattern in RHETORICAL_PATTERNS {
            if lower.contains(pattern) {
                confidence -= 0.1;
                patterns.push(format!("rhetorical:{pattern}"));
                reasons.push(format!("rhetorical framing \"{pattern}\""));
            }
        }

        if confidence <= 0.0 {
            return None;
        }
        Some(Detection {
            confidence,
            reasoning: format!("question signals: {}", reasons.join(", ")),
            patterns,
            reaction: None,
            extracted: None,
        })
    }

    fn detect_insight(&self, text: &str) -> Option<Detection> {
        let lower = text.to_lowercase();
        let mut confidence = 0.0f32;
        let mut patterns = Vec::new();
        let mut reasons = Vec::new();

        for marker in INSIGHT_MARKERS {
            if lower.contains(marker) {
                confidence += 0.3;
                patterns.push(format!("insight:{marker}"));
                reasons.push(format!("marker \"{marker}\""));
            }
        }
        if confidence > 0.0 && text.chars().count() > 50 {
            confidence += 0.1;
            patterns.push("substantial-length".to_string());
            reasons.push("substantial length".to_string());
        }

        if confidence == 0.0 {
            return None;
        }
        Some(Detection {
            confidence,
            reasoning: format!("insight signals: {}", reasons.join(", ")),
            patterns,
            reaction: None,
            extracted: None,
        })
    }

    fn detect_reflection(&self, text: &str) -> Option<Detection> {
        if text.chars().count() <= 30 {
            return None;
        }
        let lower = text.to_lowercase();
        let mut confidence = 0.0f32;
        let mut patterns = Vec::new();
        let mut reasons = Vec::new();

        for marker in REFLECTION_MARKERS {
            if lower.contains(marker) {
                confidence += 0.25;
                patterns.push(format!("reflection:{marker}"));
                reasons.push(format!("marker \"{marker}\""));
            }
        }

        if confidence == 0.0 {
            return None;
        }
        Some(Detection {
            confidence,
            reasoning: format!("reflection signals: {}", reasons.join(", ")),
            patterns,
            reaction: None,
            extracted: None,
        })
    }

    /// Extracts a page reference ("page 42", "p. 42", "pg 42") from raw text.
    pub fn extract_page_number(&self, text: &str) -> Option<u32> {
        self.page_re
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }
}

impl Default for ContentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Whole-word containment check ("thou" must not match "thought").
fn contains_word(lower: &str, word: &str) -> bool {
    lower
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .any(|w| w == word)
}

/// Naive proper-noun pickup: capitalized words past the sentence start.
fn extract_entities(text: &str) -> Vec<String> {
    let mut entities = Vec::new();
    for sentence in text.split(['.', '!', '?']) {
        for word in sentence.split_whitespace().skip(1) {
            let trimmed = word.trim_matches(|c: char| !c.is_alphanumeric());
            if trimmed.chars().next().is_some_and(|c| c.is_uppercase())
                && trimmed.chars().count() > 1
                && !entities.contains(&trimmed.to_string())
            {
                entities.push(trimmed.to_string());
            }
        }
    }
    entities
}

/// Pulls the quoted material that follows a reaction phrase.
///
/// Strips leading separators (`:`, `-`, em/en dashes, a stray period) and
/// surrounding quotation marks. Returns `None` when nothing substantial
/// follows the phrase.
fn extract_after_reaction(text: &str, phrase_pos: usize, phrase_len: usize) -> Option<String> {
    let after = text.get(phrase_pos + phrase_len..)?;
    let stripped = after
        .trim_start_matches([' ', ':', '-', '\u{2014}', '\u{2013}'])
        .trim_start_matches('.')
        .trim();
    let unquoted = stripped
        .trim_matches(['"', '\u{201c}', '\u{201d}', '\u{2018}', '\u{2019}'])
        .trim();
    if unquoted.is_empty() {
        return None;
    }
    Some(unquoted.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> ContentClassifier {
        ContentClassifier::new()
    }

    #[test]
    fn test_quote_with_reaction_phrase_extracts_content() {
        let c = classifier();
        let result = c.classify(
            "I love this quote. All we have to do is decide what to do with the time that is given us.",
        );
        assert_eq!(result.content_type, ContentType::Quote);
        assert!(result.confidence >= 0.9);
        assert_eq!(
            result.metadata.reaction_type.as_deref(),
            Some("i love this quote")
        );
        assert_eq!(
            result.content,
            "All we have to do is decide what to do with the time that is given us."
        );
    }

    #[test]
    fn test_quote_priority_over_question() {
        let c = classifier();
        let result = c.classify("What does this quote mean? I love this quote.");
        assert_eq!(result.content_type, ContentType::Quote);
    }

    #[test]
    fn test_quote_from_quotation_marks_and_attribution() {
        let c = classifier();
        let result =
            c.classify("The author writes \"thus the past is a foreign country\" early on.");
        assert_eq!(result.content_type, ContentType::Quote);
        assert!(result.metadata.reaction_type.is_none());
        // No reaction phrase, so the full text is kept.
        assert!(result.content.contains("foreign country"));
    }

    #[test]
    fn test_quote_extraction_strips_separator() {
        let c = classifier();
        let result = c.classify("Listen to this: \"not all those who wander are lost\"");
        assert_eq!(result.content_type, ContentType::Quote);
        assert_eq!(result.content, "not all those who wander are lost");
    }

    #[test]
    fn test_quote_with_nothing_after_reaction_keeps_full_text() {
        let c = classifier();
        let result = c.classify("Oh wow, I love this quote.");
        assert_eq!(result.content_type, ContentType::Quote);
        assert_eq!(result.content, "Oh wow, I love this quote.");
    }

    #[test]
    fn test_archaic_marker_is_word_bounded() {
        let c = classifier();
        // "thought" must not count as "thou".
        let result = c.classify("I thought about the ending for a while afterwards.");
        assert_ne!(result.content_type, ContentType::Quote);
    }

    #[test]
    fn test_question_detection() {
        let c = classifier();
        let result = c.classify("What does the author mean by duality here?");
        assert_eq!(result.content_type, ContentType::Question);
        assert!(result.confidence >= 0.6);
    }

    #[test]
    fn test_rhetorical_question_downweighted() {
        let c = classifier();
        // Trailing "?" alone is 0.4; "i wonder" subtracts further.
        let result = c.classify("I wonder, isn't it all just a bit much sometimes?");
        assert_ne!(result.content_type, ContentType::Question);
    }

    #[test]
    fn test_insight_detection() {
        let c = classifier();
        let result =
            c.classify("I realize this chapter means that the narrator was unreliable all along.");
        assert_eq!(result.content_type, ContentType::Insight);
    }

    #[test]
    fn test_reflection_detection() {
        let c = classifier();
        let result = c.classify(
            "I think the pacing works and perhaps the tension is deliberate, it seems intentional to me.",
        );
        // Four opinion markers at 0.25 each clear the 0.6 threshold.
        assert_eq!(result.content_type, ContentType::Reflection);
    }

    #[test]
    fn test_reflection_requires_minimum_length() {
        let c = classifier();
        let result = c.classify("I think it works fine");
        assert_ne!(result.content_type, ContentType::Reflection);
    }

    #[test]
    fn test_default_note() {
        let c = classifier();
        let result = c.classify("The chapter covers the siege of the northern city.");
        assert_eq!(result.content_type, ContentType::Note);
        assert!((result.confidence - 0.6).abs() < f32::EPSILON);
    }

    #[test]
    fn test_classification_always_terminates() {
        let c = classifier();
        for text in ["", "x", "??", "1234", "ok then"] {
            let result = c.classify(text);
            assert!(result.confidence > 0.0);
        }
    }

    #[test]
    fn test_page_number_extraction() {
        let c = classifier();
        assert_eq!(c.extract_page_number("this is on page 42 somewhere"), Some(42));
        assert_eq!(c.extract_page_number("see p. 17 for the map"), Some(17));
        assert_eq!(c.extract_page_number("pg 203 has the footnote"), Some(203));
        assert_eq!(c.extract_page_number("no reference here"), None);
    }

    #[test]
    fn test_page_number_first_match_wins() {
        let c = classifier();
        assert_eq!(
            c.extract_page_number("compare page 12 with page 98"),
            Some(12)
        );
    }

    #[test]
    fn test_metadata_completeness_flags() {
        let c = classifier();
        let complete = c.classify("A finished sentence.");
        assert!(complete.metadata.is_complete);
        assert!(!complete.metadata.needs_continuation);

        let unfinished = c.classify("An unfinished thought about");
        assert!(!unfinished.metadata.is_complete);
        assert!(unfinished.metadata.needs_continuation);
    }

    #[test]
    fn test_entity_extraction() {
        let c = classifier();
        let result = c.classify("The march toward Mordor felt endless to Frodo.");
        assert!(result.metadata.entities.contains(&"Mordor".to_string()));
        assert!(result.metadata.entities.contains(&"Frodo".to_string()));
        assert!(!result.metadata.entities.contains(&"The".to_string()));
    }
}
