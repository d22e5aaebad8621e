//! Phrase extraction from alignment blocks.
//!
//! Every non-`Equal` block of an alignment becomes at most one
//! [`PhraseCandidate`]: the block's whole original span paired with its whole
//! corrected span.  Blocks are never decomposed.  When either side is longer
//! than [`ExtractOptions::max_phrase_words`] the block is skipped outright.
//!
//! A pure insertion or deletion has an empty side, so the block is widened
//! by the shared anchor words on both sides of it (only one side at either
//! end of the transcript) before it is turned into a phrase:
//!
//! | Original             | Corrected               | Candidate                     |
//! |----------------------|-------------------------|-------------------------------|
//! | `do tai henko now`   | `do tai no henko now`   | `tai henko` → `tai no henko`  |
//! | `the the dojo`       | `the dojo`              | `the the` → `the`             |
//!
//! A candidate whose correction still contains its own key (`tai` →
//! `tai no`) would fire again on already corrected text, so it is dropped.
//! So is one whose original words are split by punctuation, since the
//! replacer would never match it.
//!
//! Across a batch, [`CandidateTally`] sums counts per folded key and picks
//! the most frequent corrected spelling (first seen wins a tie).

use std::collections::HashMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::diff::align::{align_bounded, AlignmentError, AlignmentOp};
use crate::text::{contains_phrase, fold, is_phrase_run, tokenize, Token};

/// Context snippets kept per key for reviewers.
const MAX_CONTEXTS: usize = 5;
/// Bytes of surrounding text captured on each side of a context snippet.
const CONTEXT_RADIUS: usize = 30;

// ---------------------------------------------------------------------------
// ExtractOptions
// ---------------------------------------------------------------------------

/// Tunables for [`diff_pair`] and the batch helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Longest phrase, in words, allowed on either side of a block.
    pub max_phrase_words: usize,
    /// Per-transcript token cap handed to the aligner.
    pub max_alignment_tokens: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_phrase_words: 4,
            max_alignment_tokens: 50_000,
        }
    }
}

// ---------------------------------------------------------------------------
// PhraseCandidate
// ---------------------------------------------------------------------------

/// A proposed `original → corrected` mapping entry.
///
/// `original` is the folded key (lowercase words joined by single spaces);
/// `corrected` keeps the exact casing the human typed.  The two never match
/// case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseCandidate {
    pub original: String,
    pub corrected: String,
    pub occurrence_count: u32,
    /// Snippets of original text around the first few sightings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contexts: Vec<String>,
}

impl PhraseCandidate {
    pub fn new(original: impl Into<String>, corrected: impl Into<String>, count: u32) -> Self {
        Self {
            original: original.into(),
            corrected: corrected.into(),
            occurrence_count: count,
            contexts: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Per-pair extraction
// ---------------------------------------------------------------------------

/// Align one transcript pair and return one candidate (count 1) per usable
/// block, in transcript order.  Not aggregated; feed the result to a
/// [`CandidateTally`].
///
/// # Errors
///
/// [`AlignmentError::TooLong`] when either text exceeds
/// `options.max_alignment_tokens` tokens.
pub fn diff_pair(
    original: &str,
    corrected: &str,
    options: &ExtractOptions,
) -> Result<Vec<PhraseCandidate>, AlignmentError> {
    let a: Vec<Token<'_>> = tokenize(original).collect();
    let b: Vec<Token<'_>> = tokenize(corrected).collect();
    let ops = align_bounded(&a, &b, options.max_alignment_tokens)?;

    let mut found = Vec::new();
    for (idx, op) in ops.iter().enumerate() {
        if op.is_equal() {
            continue;
        }
        let Some((orig_span, corr_span)) = phrase_spans(&ops, idx) else {
            log::debug!("{} block with no anchor word, skipped", op.tag());
            continue;
        };
        if orig_span.len() > options.max_phrase_words || corr_span.len() > options.max_phrase_words
        {
            log::debug!(
                "{} block too long ({} -> {} words), skipped",
                op.tag(),
                orig_span.len(),
                corr_span.len()
            );
            continue;
        }

        if !is_phrase_run(original, &a[orig_span.clone()]) {
            log::debug!("{} block crosses punctuation, skipped", op.tag());
            continue;
        }

        let key = a[orig_span.clone()]
            .iter()
            .map(|t| fold(t.text))
            .collect::<Vec<_>>()
            .join(" ");
        let fixed = span_text(corrected, &b[corr_span]);
        if key.is_empty() || fixed.is_empty() || contains_phrase(&fixed, &key) {
            continue;
        }

        log::debug!("{} block: '{}' -> '{}'", op.tag(), key, fixed);
        let mut candidate = PhraseCandidate::new(key, fixed, 1);
        candidate
            .contexts
            .push(context_snippet(original, &a[orig_span]));
        found.push(candidate);
    }
    Ok(found)
}

/// Token spans for the block at `ops[idx]`, widened by the neighbouring
/// anchor words for inserts and deletes.
fn phrase_spans(ops: &[AlignmentOp], idx: usize) -> Option<(Range<usize>, Range<usize>)> {
    let op = &ops[idx];
    let (o, c) = (op.original(), op.corrected());
    match op {
        AlignmentOp::Replace { .. } => Some((o, c)),
        AlignmentOp::Insert { .. } | AlignmentOp::Delete { .. } => {
            // Non-equal ops are never adjacent, so a neighbour is an Equal run.
            let before = usize::from(idx > 0);
            let after = usize::from(idx + 1 < ops.len());
            if before + after == 0 {
                return None;
            }
            Some((
                o.start - before..o.end + after,
                c.start - before..c.end + after,
            ))
        }
        AlignmentOp::Equal { .. } => None,
    }
}

/// Source text from the first to the last token, whitespace runs collapsed.
fn span_text(source: &str, tokens: &[Token<'_>]) -> String {
    match (tokens.first(), tokens.last()) {
        (Some(first), Some(last)) => source[first.start..last.end]
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" "),
        _ => String::new(),
    }
}

fn context_snippet(source: &str, tokens: &[Token<'_>]) -> String {
    let (Some(first), Some(last)) = (tokens.first(), tokens.last()) else {
        return String::new();
    };
    let mut start = first.start.saturating_sub(CONTEXT_RADIUS);
    while !source.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = (last.end + CONTEXT_RADIUS).min(source.len());
    while !source.is_char_boundary(end) {
        end += 1;
    }
    format!("...{}...", &source[start..end])
}

// ---------------------------------------------------------------------------
// CandidateTally
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct TallyEntry {
    key: String,
    count: u32,
    /// Exact-case corrected spellings with their summed counts, first seen first.
    variants: Vec<(String, u32)>,
    contexts: Vec<String>,
}

/// Reduce-by-key accumulator for candidates from many transcript pairs.
///
/// Results depend only on the order candidates are added, never on how they
/// were produced, so concurrent producers must be drained in a fixed order.
///
/// ```
/// use term_mapper::diff::{CandidateTally, PhraseCandidate};
///
/// let mut tally = CandidateTally::new();
/// tally.add(PhraseCandidate::new("a key doe", "Aikido", 3));
/// tally.add(PhraseCandidate::new("a key doe", "AIKIDO", 1));
///
/// let merged = tally.into_candidates(1);
/// assert_eq!(merged[0].corrected, "Aikido");
/// assert_eq!(merged[0].occurrence_count, 4);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CandidateTally {
    entries: Vec<TallyEntry>,
    index: HashMap<String, usize>,
}

impl CandidateTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one candidate in.  The key is folded again, so hand-built
    /// candidates with mixed-case keys aggregate correctly.
    pub fn add(&mut self, candidate: PhraseCandidate) {
        let key = fold(&candidate.original);
        let slot = match self.index.get(&key) {
            Some(&slot) => slot,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push(TallyEntry {
                    key,
                    count: 0,
                    variants: Vec::new(),
                    contexts: Vec::new(),
                });
                self.entries.len() - 1
            }
        };

        let entry = &mut self.entries[slot];
        entry.count += candidate.occurrence_count;
        match entry
            .variants
            .iter_mut()
            .find(|(spelling, _)| *spelling == candidate.corrected)
        {
            Some((_, weight)) => *weight += candidate.occurrence_count,
            None => entry
                .variants
                .push((candidate.corrected, candidate.occurrence_count)),
        }
        for context in candidate.contexts {
            if entry.contexts.len() >= MAX_CONTEXTS {
                break;
            }
            entry.contexts.push(context);
        }
    }

    /// Number of distinct keys seen so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finish: one candidate per key with at least `min_count` sightings, in
    /// first-seen order.
    pub fn into_candidates(self, min_count: u32) -> Vec<PhraseCandidate> {
        self.entries
            .into_iter()
            .filter(|entry| entry.count >= min_count)
            .filter_map(|entry| {
                let mut variants = entry.variants.into_iter();
                let first = variants.next()?;
                let (canonical, _) = variants.fold(first, |best, next| {
                    if next.1 > best.1 {
                        next
                    } else {
                        best
                    }
                });
                Some(PhraseCandidate {
                    original: entry.key,
                    corrected: canonical,
                    occurrence_count: entry.count,
                    contexts: entry.contexts,
                })
            })
            .collect()
    }
}

impl Extend<PhraseCandidate> for CandidateTally {
    fn extend<I: IntoIterator<Item = PhraseCandidate>>(&mut self, iter: I) {
        for candidate in iter {
            self.add(candidate);
        }
    }
}

// ---------------------------------------------------------------------------
// Batch helpers
// ---------------------------------------------------------------------------

/// Aggregate candidates for a single transcript pair.
pub fn extract_candidates(
    original: &str,
    corrected: &str,
    options: &ExtractOptions,
) -> Result<Vec<PhraseCandidate>, AlignmentError> {
    let mut tally = CandidateTally::new();
    tally.extend(diff_pair(original, corrected, options)?);
    Ok(tally.into_candidates(1))
}

/// Diff every `(original, corrected)` pair in order and aggregate.
pub fn extract_batch<S: AsRef<str>>(
    pairs: &[(S, S)],
    options: &ExtractOptions,
    min_count: u32,
) -> Result<Vec<PhraseCandidate>, AlignmentError> {
    let mut tally = CandidateTally::new();
    for (original, corrected) in pairs {
        tally.extend(diff_pair(original.as_ref(), corrected.as_ref(), options)?);
    }
    log::info!("found {} unique differences", tally.len());
    Ok(tally.into_candidates(min_count))
}

/// Same result as [`extract_batch`], with each pair aligned on tokio's
/// blocking pool.  Results are awaited in input order and reduced here, so
/// completion order never affects the output.
pub async fn extract_batch_concurrent(
    pairs: Vec<(String, String)>,
    options: ExtractOptions,
    min_count: u32,
) -> Result<Vec<PhraseCandidate>, AlignmentError> {
    let handles: Vec<_> = pairs
        .into_iter()
        .map(|(original, corrected)| {
            tokio::task::spawn_blocking(move || diff_pair(&original, &corrected, &options))
        })
        .collect();

    let mut tally = CandidateTally::new();
    for handle in handles {
        let found = handle
            .await
            .map_err(|e| AlignmentError::Task(e.to_string()))??;
        tally.extend(found);
    }
    log::info!("found {} unique differences", tally.len());
    Ok(tally.into_candidates(min_count))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> ExtractOptions {
        ExtractOptions::default()
    }

    fn pairs_of(c: &[PhraseCandidate]) -> Vec<(&str, &str, u32)> {
        c.iter()
            .map(|c| (c.original.as_str(), c.corrected.as_str(), c.occurrence_count))
            .collect()
    }

    #[test]
    fn identical_texts_yield_nothing() {
        assert!(diff_pair("the dojo", "the dojo", &opts()).unwrap().is_empty());
    }

    #[test]
    fn case_only_changes_yield_nothing() {
        assert!(diff_pair("the DOJO", "The dojo", &opts()).unwrap().is_empty());
    }

    #[test]
    fn replace_block_becomes_candidate() {
        let found = diff_pair(
            "we practice ear ream e today",
            "we practice irimi today",
            &opts(),
        )
        .unwrap();
        assert_eq!(pairs_of(&found), [("ear ream e", "irimi", 1)]);
        assert!(found[0].contexts[0].contains("ear ream e"));
    }

    #[test]
    fn key_is_folded_and_value_keeps_case() {
        let found = diff_pair("then A Key Doe class", "then Aikido class", &opts()).unwrap();
        assert_eq!(pairs_of(&found), [("a key doe", "Aikido", 1)]);
    }

    #[test]
    fn corrected_keeps_inner_punctuation() {
        let found = diff_pair("do tie no hen co now", "do Tai-no-henko now", &opts()).unwrap();
        assert_eq!(pairs_of(&found), [("tie no hen co", "Tai-no-henko", 1)]);
    }

    #[test]
    fn insert_is_anchored_on_both_neighbours() {
        let found = diff_pair("practice tai henko", "practice tai no henko", &opts()).unwrap();
        assert_eq!(pairs_of(&found), [("tai henko", "tai no henko", 1)]);
    }

    #[test]
    fn insert_at_the_end_is_dropped() {
        // Only one anchor: "tai" -> "tai no" would fire on corrected text.
        assert!(diff_pair("practice tai", "practice tai no", &opts())
            .unwrap()
            .is_empty());
        assert!(diff_pair("tai henko", "no tai henko", &opts())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn delete_in_the_middle_is_anchored_on_both_neighbours() {
        let found = diff_pair("we bow bow rei", "we bow rei", &opts()).unwrap();
        assert_eq!(pairs_of(&found), [("bow bow rei", "bow rei", 1)]);
    }

    #[test]
    fn original_split_by_punctuation_is_skipped() {
        let found = diff_pair(
            "we train a key, doe style",
            "we train Aikido style",
            &opts(),
        )
        .unwrap();
        assert!(found.is_empty());

        let found =
            diff_pair("we train a-key doe style", "we train Aikido style", &opts()).unwrap();
        assert_eq!(pairs_of(&found), [("a key doe", "Aikido", 1)]);
    }

    #[test]
    fn learned_insert_mapping_is_idempotent() {
        use crate::mapping::{apply, merge, TerminologyMapping};

        let found = extract_candidates("practice tai henko", "practice tai no henko", &opts())
            .unwrap();
        let (mapping, _) = merge(TerminologyMapping::default(), &found).unwrap();

        let once = apply("we do tai henko then tai no henko", &mapping);
        assert_eq!(once, "we do tai no henko then tai no henko");
        assert_eq!(apply(&once, &mapping), once);
        assert_eq!(apply("tai no henko", &mapping), "tai no henko");
    }

    #[test]
    fn delete_at_start_is_anchored_on_next_word() {
        let found = diff_pair("um shomen uchi", "shomen uchi", &opts()).unwrap();
        assert_eq!(pairs_of(&found), [("um shomen", "shomen", 1)]);
    }

    #[test]
    fn insert_into_empty_original_is_skipped() {
        assert!(diff_pair("", "brand new", &opts()).unwrap().is_empty());
        assert!(diff_pair("all gone", "", &opts()).unwrap().is_empty());
    }

    #[test]
    fn blocks_longer_than_four_words_are_skipped() {
        // Five words replaced by one: skipped, not decomposed.
        let found = diff_pair("start one two three four five end", "start six end", &opts())
            .unwrap();
        assert!(found.is_empty());

        // Exactly four words is still accepted.
        let found = diff_pair("start one two three four end", "start six end", &opts()).unwrap();
        assert_eq!(pairs_of(&found), [("one two three four", "six", 1)]);
    }

    #[test]
    fn phrase_limit_is_configurable() {
        let narrow = ExtractOptions {
            max_phrase_words: 2,
            ..opts()
        };
        let found = diff_pair("we ear ream e go", "we irimi go", &narrow).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn multiple_blocks_in_one_pair() {
        let found = diff_pair(
            "ear ream e then a key doe then ear ream e",
            "irimi then Aikido then irimi",
            &opts(),
        )
        .unwrap();
        assert_eq!(
            pairs_of(&found),
            [
                ("ear ream e", "irimi", 1),
                ("a key doe", "Aikido", 1),
                ("ear ream e", "irimi", 1)
            ]
        );

        let merged = extract_candidates(
            "ear ream e then a key doe then ear ream e",
            "irimi then Aikido then irimi",
            &opts(),
        )
        .unwrap();
        assert_eq!(
            pairs_of(&merged),
            [("ear ream e", "irimi", 2), ("a key doe", "Aikido", 1)]
        );
    }

    #[test]
    fn tally_prefers_most_frequent_spelling() {
        let mut tally = CandidateTally::new();
        tally.add(PhraseCandidate::new("a key doe", "Aikido", 3));
        tally.add(PhraseCandidate::new("a key doe", "AIKIDO", 1));
        assert_eq!(pairs_of(&tally.into_candidates(1)), [("a key doe", "Aikido", 4)]);

        let mut tally = CandidateTally::new();
        tally.add(PhraseCandidate::new("a key doe", "AIKIDO", 1));
        tally.add(PhraseCandidate::new("a key doe", "Aikido", 1));
        tally.add(PhraseCandidate::new("a key doe", "Aikido", 1));
        assert_eq!(pairs_of(&tally.into_candidates(1)), [("a key doe", "Aikido", 3)]);
    }

    #[test]
    fn tally_tie_goes_to_first_seen() {
        let mut tally = CandidateTally::new();
        tally.add(PhraseCandidate::new("a key doe", "AIKIDO", 2));
        tally.add(PhraseCandidate::new("A Key Doe", "Aikido", 2));
        assert_eq!(pairs_of(&tally.into_candidates(1)), [("a key doe", "AIKIDO", 4)]);
    }

    #[test]
    fn tally_caps_contexts() {
        let mut tally = CandidateTally::new();
        for i in 0..8 {
            let mut c = PhraseCandidate::new("x", "y", 1);
            c.contexts.push(format!("ctx {i}"));
            tally.add(c);
        }
        let out = tally.into_candidates(1);
        assert_eq!(out[0].contexts.len(), MAX_CONTEXTS);
        assert_eq!(out[0].contexts[0], "ctx 0");
    }

    #[test]
    fn min_count_filters_rare_candidates() {
        let pairs = [
            ("we ear ream e", "we irimi"),
            ("then ear ream e", "then irimi"),
            ("a key doe rocks", "Aikido rocks"),
        ];
        let found = extract_batch(&pairs, &opts(), 2).unwrap();
        assert_eq!(pairs_of(&found), [("ear ream e", "irimi", 2)]);
    }

    #[test]
    fn batch_propagates_alignment_limit() {
        let tight = ExtractOptions {
            max_alignment_tokens: 2,
            ..opts()
        };
        let pairs = [("one two three", "one three")];
        assert!(matches!(
            extract_batch(&pairs, &tight, 1),
            Err(AlignmentError::TooLong { .. })
        ));
    }

    #[test]
    fn context_snippet_respects_char_boundaries() {
        let text = "ééééééééééééééééééééééééé ear ream e ééééééééééééééééééééé";
        let toks: Vec<_> = tokenize(text).collect();
        let snippet = context_snippet(text, &toks[1..4]);
        assert!(snippet.contains("ear ream e"));
    }

    #[tokio::test]
    async fn concurrent_batch_matches_sequential() {
        let pairs: Vec<(String, String)> = vec![
            ("we ear ream e".into(), "we irimi".into()),
            ("a key doe class".into(), "Aikido class".into()),
            ("A KEY DOE class".into(), "AIKIDO class".into()),
            ("then ear ream e".into(), "then irimi".into()),
            ("a key doe again".into(), "Aikido again".into()),
        ];
        let sequential = extract_batch(&pairs, &opts(), 1).unwrap();
        let concurrent = extract_batch_concurrent(pairs, opts(), 1).await.unwrap();
        assert_eq!(sequential, concurrent);
        assert_eq!(
            pairs_of(&concurrent),
            [("ear ream e", "irimi", 2), ("a key doe", "Aikido", 3)]
        );
    }
}
