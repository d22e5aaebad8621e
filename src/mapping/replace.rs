//! Replacement engine: apply a [`TerminologyMapping`] to transcript text.
//!
//! # Matching policy
//!
//! * Matching is word-based and case-insensitive: `key` never fires inside
//!   `keyboard`, and `A KEY DOE` matches the key `a key doe`.
//! * Longer phrases (by word count) are tried first across the whole text,
//!   then shorter ones.  A word consumed by one replacement cannot be
//!   matched again, so `a key` can never pre-empt `a key doe`.
//! * Words inside a multi-word match may only be separated by whitespace or
//!   hyphens; any other punctuation ends the phrase.
//! * The stored correction is inserted verbatim.  Everything outside a match
//!   is copied through byte for byte.
//!
//! Applying never fails.  Text with no matches comes back unchanged.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::mapping::store::TerminologyMapping;
use crate::text::{fold, is_phrase_run, phrase_key, tokenize, Token};

// ---------------------------------------------------------------------------
// Segment
// ---------------------------------------------------------------------------

/// A timed caption line.  Times are seconds from the start of the media.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    #[serde(rename = "start")]
    pub start_time: f64,
    #[serde(rename = "end")]
    pub end_time: f64,
    pub text: String,
}

impl Segment {
    pub fn new(start_time: f64, end_time: f64, text: impl Into<String>) -> Self {
        Self {
            start_time,
            end_time,
            text: text.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Replacer
// ---------------------------------------------------------------------------

/// A mapping compiled for repeated application.
///
/// ```
/// use term_mapper::mapping::{Replacer, TerminologyMapping};
///
/// let mut mapping = TerminologyMapping::default();
/// mapping.insert("a key", "X").unwrap();
/// mapping.insert("a key doe", "Aikido").unwrap();
///
/// let replacer = Replacer::new(&mapping);
/// assert_eq!(replacer.apply("A Key Doe"), "Aikido");
/// assert_eq!(replacer.apply("a key, doe"), "X, doe");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Replacer {
    /// `(word count, folded key → correction)`, longest first.
    tables: Vec<(usize, HashMap<String, String>)>,
}

impl Replacer {
    pub fn new(mapping: &TerminologyMapping) -> Self {
        let mut by_len: HashMap<usize, HashMap<String, String>> = HashMap::new();
        for (key, value) in mapping.iter() {
            let key = phrase_key(key);
            if key.is_empty() {
                continue;
            }
            let words = key.split(' ').count();
            by_len
                .entry(words)
                .or_default()
                .insert(key, value.to_string());
        }

        let mut tables: Vec<_> = by_len.into_iter().collect();
        tables.sort_by(|a, b| b.0.cmp(&a.0));
        Self { tables }
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Rewrite `text`.
    pub fn apply(&self, text: &str) -> String {
        if self.is_empty() {
            return text.to_string();
        }

        let tokens: Vec<Token<'_>> = tokenize(text).collect();
        let folded: Vec<String> = tokens.iter().map(|t| fold(t.text)).collect();
        let mut consumed = vec![false; tokens.len()];
        // (first token, one past last token, correction)
        let mut hits: Vec<(usize, usize, &str)> = Vec::new();

        for (len, table) in &self.tables {
            let len = *len;
            let mut i = 0;
            while i + len <= tokens.len() {
                let end = i + len;
                let free = !consumed[i..end].iter().any(|&c| c);
                if free && is_phrase_run(text, &tokens[i..end]) {
                    if let Some(value) = table.get(&folded[i..end].join(" ")) {
                        consumed[i..end].iter_mut().for_each(|c| *c = true);
                        hits.push((i, end, value.as_str()));
                        i = end;
                        continue;
                    }
                }
                i += 1;
            }
        }

        if hits.is_empty() {
            return text.to_string();
        }
        hits.sort_unstable_by_key(|&(start, _, _)| start);

        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for (start, end, value) in hits {
            out.push_str(&text[cursor..tokens[start].start]);
            out.push_str(value);
            cursor = tokens[end - 1].end;
        }
        out.push_str(&text[cursor..]);
        out
    }

    /// Rewrite each segment's text independently.  Count, order and times
    /// are preserved.
    pub fn apply_to_segments(&self, segments: &[Segment]) -> Vec<Segment> {
        segments
            .iter()
            .map(|seg| Segment {
                start_time: seg.start_time,
                end_time: seg.end_time,
                text: self.apply(&seg.text),
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Apply `mapping` to `text`.  Builds a [`Replacer`] each call; reuse one
/// when correcting many strings.
pub fn apply(text: &str, mapping: &TerminologyMapping) -> String {
    Replacer::new(mapping).apply(text)
}

/// Apply `mapping` to every segment's text.
pub fn apply_to_segments(segments: &[Segment], mapping: &TerminologyMapping) -> Vec<Segment> {
    Replacer::new(mapping).apply_to_segments(segments)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{extract_candidates, ExtractOptions};
    use crate::mapping::merge;

    fn mapping(entries: &[(&str, &str)]) -> TerminologyMapping {
        let mut m = TerminologyMapping::default();
        for (k, v) in entries {
            m.insert(k, v).unwrap();
        }
        m
    }

    #[test]
    fn longest_phrase_wins() {
        let m = mapping(&[("a key", "X"), ("a key doe", "Aikido")]);
        assert_eq!(apply("A Key Doe", &m), "Aikido");
    }

    #[test]
    fn matching_is_case_insensitive() {
        let m = mapping(&[("a key doe", "Aikido")]);
        assert_eq!(apply("A KEY DOE", &m), "Aikido");
        assert_eq!(apply("a key doe", &m), "Aikido");
    }

    #[test]
    fn surrounding_text_is_untouched() {
        let m = mapping(&[("ear ream e", "irimi")]);
        assert_eq!(
            apply("  Today: ear ream e, then EAR REAM E!  ", &m),
            "  Today: irimi, then irimi!  "
        );
    }

    #[test]
    fn matches_whole_words_only() {
        let m = mapping(&[("key", "Ki")]);
        assert_eq!(apply("keyboard monkey key", &m), "keyboard monkey Ki");
    }

    #[test]
    fn punctuation_breaks_phrases_hyphens_do_not() {
        let m = mapping(&[("tai no henko", "tai-no-henko")]);
        assert_eq!(apply("tai, no henko", &m), "tai, no henko");
        assert_eq!(apply("Tai-No  henko.", &m), "tai-no-henko.");
    }

    #[test]
    fn consumed_words_are_not_rematched() {
        let m = mapping(&[("a key doe", "Aikido"), ("doe san", "Dosan")]);
        assert_eq!(apply("a key doe san", &m), "Aikido san");
        assert_eq!(apply("the doe san", &m), "the Dosan");
    }

    #[test]
    fn equal_length_matches_scan_left_to_right() {
        let m = mapping(&[("b c", "Y"), ("a b", "X")]);
        assert_eq!(apply("a b c", &m), "X c");
    }

    #[test]
    fn empty_mapping_and_unmatched_text_pass_through() {
        let empty = TerminologyMapping::default();
        assert_eq!(apply("anything at all", &empty), "anything at all");
        let m = mapping(&[("a key doe", "Aikido")]);
        assert_eq!(apply("nothing matches here", &m), "nothing matches here");
        assert_eq!(apply("", &m), "");
    }

    #[test]
    fn applying_twice_is_idempotent() {
        let m = mapping(&[
            ("a key doe", "Aikido"),
            ("a key", "Aiki"),
            ("ear ream e", "irimi"),
            ("she ho nag e", "shihonage"),
        ]);
        for text in [
            "A key doe and a key, then ear ream e. she ho nag e!",
            "a key a key doe ear ream e",
            "nothing",
        ] {
            let once = apply(text, &m);
            assert_eq!(apply(&once, &m), once, "{text:?}");
        }
    }

    #[test]
    fn segments_keep_times_and_count() {
        let m = mapping(&[("a key doe", "Aikido")]);
        let segments = vec![
            Segment::new(0.0, 1.5, "welcome to a key doe"),
            Segment::new(1.5, 3.25, "no terms here"),
            Segment::new(3.25, 3.25, ""),
        ];
        let out = apply_to_segments(&segments, &m);
        assert_eq!(out.len(), segments.len());
        for (before, after) in segments.iter().zip(&out) {
            assert_eq!(before.start_time, after.start_time);
            assert_eq!(before.end_time, after.end_time);
        }
        assert_eq!(out[0].text, "welcome to Aikido");
        assert_eq!(out[1].text, "no terms here");
    }

    #[test]
    fn phrase_split_across_segments_is_not_merged() {
        let m = mapping(&[("a key doe", "Aikido")]);
        let segments = vec![Segment::new(0.0, 1.0, "a key"), Segment::new(1.0, 2.0, "doe")];
        assert_eq!(apply_to_segments(&segments, &m), segments);
    }

    #[test]
    fn diff_then_apply_scenario() {
        let found = extract_candidates(
            "we practice ear ream e today",
            "we practice irimi today",
            &ExtractOptions::default(),
        )
        .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].original, "ear ream e");
        assert_eq!(found[0].corrected, "irimi");
        assert_eq!(found[0].occurrence_count, 1);

        let (m, _) = merge(TerminologyMapping::default(), &found).unwrap();
        assert_eq!(apply("more ear ream e practice", &m), "more irimi practice");
    }

    #[test]
    fn segment_serialises_with_short_keys() {
        let seg = Segment::new(1.0, 2.5, "irimi");
        let json = serde_json::to_string(&seg).unwrap();
        assert_eq!(json, r#"{"start":1.0,"end":2.5,"text":"irimi"}"#);
    }
}
