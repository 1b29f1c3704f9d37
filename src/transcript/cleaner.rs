//! Text normalization and the emission gate.
//!
//! Cleaning always runs before deduplication and classification: it fixes
//! recognizer artifacts (stutters, punctuation spacing, casing) so the
//! duplicate checks compare like with like. The validator then decides
//! whether a cleaned utterance is substantial enough to emit at all.

use crate::transcript::buffer::{collapse_repeats, ends_terminal};
use crate::transcript::classifier::REACTION_PHRASES;

/// Fixed recognizer stutter phrases and their replacements.
const STUTTER_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("i'm am", "i am"),
    ("i am am", "i am"),
    ("it's is", "it is"),
    ("that's is", "that is"),
    ("lord lord", "lord"),
    ("the the", "the"),
    ("and and", "and"),
    ("to to", "to"),
    ("of of", "of"),
];

/// Stutter signatures that mark an utterance as recognizer garbage.
const STUTTER_SIGNATURES: &[&str] = &[
    "i'm am",
    "lord lord",
    "the the",
    "and and",
    "a a ",
    "to to",
];

/// Orphaned partial words a truncated utterance may end with.
const ORPHAN_ENDINGS: &[&str] = &["th", "sa", "don", "wha", "thi", "becau"];

/// Phrases indicating the reader is announcing what they are reading.
const CONTEXT_PHRASES: &[&str] = &[
    "i'm reading",
    "i am reading",
    "currently reading",
    "back to reading",
    "started reading",
];

/// Markers of a deliberate thought worth keeping even without punctuation.
const THOUGHTFUL_MARKERS: &[&str] = &[
    "i think",
    "i love",
    "i feel",
    "i wonder",
    "realize",
    "fascinating",
    "interesting",
    "beautiful",
    "profound",
    "reminds me",
];

/// Case-insensitive replacement of every occurrence of `needle`.
///
/// The needle must be ASCII (all substitution-table phrases are). Matching
/// runs byte-wise on the original string: an ASCII byte never occurs inside
/// a multi-byte UTF-8 sequence, so match offsets always land on character
/// boundaries regardless of what surrounds them.
fn replace_ignore_case(text: &str, needle: &str, replacement: &str) -> String {
    debug_assert!(needle.is_ascii());
    let hay = text.as_bytes();
    let ndl = needle.as_bytes();
    if ndl.is_empty() || ndl.len() > hay.len() {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i + ndl.len() <= hay.len() {
        if hay[i..i + ndl.len()].eq_ignore_ascii_case(ndl) {
            out.push_str(replacement);
            i += ndl.len();
        } else {
            let mut next = i + 1;
            while next < hay.len() && !text.is_char_boundary(next) {
                next += 1;
            }
            out.push_str(&text[i..next]);
            i = next;
        }
    }
    out.push_str(&text[i..]);
    out
}

/// Removes spaces before punctuation, inserts a space after sentence
/// punctuation that runs into a letter, and collapses space runs.
fn fix_punctuation_spacing(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    for (i, &c) in chars.iter().enumerate() {
        if c == ' ' {
            if let Some(&next) = chars.get(i + 1) {
                if matches!(next, '.' | ',' | '!' | '?' | ';' | ':') {
                    continue;
                }
            }
            if out.ends_with(' ') {
                continue;
            }
            out.push(' ');
        } else {
            out.push(c);
            // Letters only: "3.5" and "p.12" must keep their shape.
            if matches!(c, '.' | ',' | '!' | '?' | ';' | ':') {
                if let Some(&next) = chars.get(i + 1) {
                    if next.is_alphabetic() {
                        out.push(' ');
                    }
                }
            }
        }
    }
    out.trim().to_string()
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Normalizes a raw assembled utterance.
pub fn clean(text: &str) -> String {
    let mut cleaned = text.trim().to_string();
    for (from, to) in STUTTER_SUBSTITUTIONS {
        cleaned = replace_ignore_case(&cleaned, from, to);
    }
    cleaned = collapse_repeats(&cleaned);
    cleaned = fix_punctuation_spacing(&cleaned);
    cleaned = capitalize_first(&cleaned);
    if word_count(&cleaned) >= 3 && !ends_terminal(&cleaned) {
        cleaned.push('.');
    }
    cleaned
}

/// Emission gate: whether a cleaned utterance is substantial enough to keep.
pub fn should_save(text: &str) -> bool {
    let lower = text.to_lowercase();
    let words = word_count(text);

    if words < 5 {
        return false;
    }

    // The reader stating what they are reading is an intent signal,
    // not content.
    if words <= 8 && CONTEXT_PHRASES.iter().any(|p| lower.contains(p)) {
        return false;
    }

    if text.contains('?') && words >= 4 {
        return true;
    }
    if REACTION_PHRASES.iter().any(|p| lower.contains(p)) {
        return true;
    }
    if words >= 7 && THOUGHTFUL_MARKERS.iter().any(|m| lower.contains(m)) {
        return true;
    }

    if STUTTER_SIGNATURES.iter().any(|s| lower.contains(s)) {
        return false;
    }
    let trimmed = lower.trim_end_matches(|c: char| !c.is_alphanumeric());
    if let Some(last_word) = trimmed.split_whitespace().last() {
        if ORPHAN_ENDINGS.contains(&last_word) {
            return false;
        }
    }

    words >= 8 && ends_terminal(text)
}
