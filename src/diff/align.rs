//! Token-sequence alignment.
//!
//! Computes the edit script turning an original token sequence into a
//! corrected one.  The algorithm is the classic longest-matching-block
//! sequence matcher (no junk heuristic):
//!
//! 1. Find the longest block of equal tokens in the current window.  Ties go
//!    to the block starting earliest in the original, then earliest in the
//!    corrected sequence.
//! 2. Recurse on the windows left and right of that block.
//! 3. Collapse adjacent blocks and emit `Equal` runs separated by
//!    `Replace` / `Delete` / `Insert` ops.
//!
//! Token equality is case-insensitive.  Every op carries both ranges, so an
//! `Equal` run can still hold tokens that differ in case.
//!
//! The tie-break is part of the contract: identical inputs always produce
//! identical ops, and therefore identical mappings.

use std::collections::HashMap;
use std::ops::Range;

use thiserror::Error;

use crate::text::{fold, Token};

// ---------------------------------------------------------------------------
// AlignmentError
// ---------------------------------------------------------------------------

/// Errors from the alignment stage.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AlignmentError {
    /// One of the sequences exceeds the configured token cap.
    #[error("transcript has {tokens} tokens, alignment limit is {limit}")]
    TooLong { tokens: usize, limit: usize },

    /// A concurrent alignment worker panicked or was cancelled.
    #[error("alignment task failed: {0}")]
    Task(String),
}

// ---------------------------------------------------------------------------
// AlignmentOp
// ---------------------------------------------------------------------------

/// One step of an edit script.  Ranges index into the original and corrected
/// token sequences; concatenated in order they cover both sequences exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlignmentOp {
    Equal {
        original: Range<usize>,
        corrected: Range<usize>,
    },
    Replace {
        original: Range<usize>,
        corrected: Range<usize>,
    },
    /// `original` is empty; it marks where the inserted tokens go.
    Insert {
        original: Range<usize>,
        corrected: Range<usize>,
    },
    /// `corrected` is empty.
    Delete {
        original: Range<usize>,
        corrected: Range<usize>,
    },
}

impl AlignmentOp {
    pub fn original(&self) -> Range<usize> {
        match self {
            Self::Equal { original, .. }
            | Self::Replace { original, .. }
            | Self::Insert { original, .. }
            | Self::Delete { original, .. } => original.clone(),
        }
    }

    pub fn corrected(&self) -> Range<usize> {
        match self {
            Self::Equal { corrected, .. }
            | Self::Replace { corrected, .. }
            | Self::Insert { corrected, .. }
            | Self::Delete { corrected, .. } => corrected.clone(),
        }
    }

    pub fn is_equal(&self) -> bool {
        matches!(self, Self::Equal { .. })
    }

    /// Short tag used in debug logging.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Equal { .. } => "equal",
            Self::Replace { .. } => "replace",
            Self::Insert { .. } => "insert",
            Self::Delete { .. } => "delete",
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Align `original` against `corrected`.  Total for any input.
///
/// ```
/// use term_mapper::diff::{align, AlignmentOp};
/// use term_mapper::text::tokenize;
///
/// let a: Vec<_> = tokenize("we practice ear ream e today").collect();
/// let b: Vec<_> = tokenize("we practice irimi today").collect();
/// let ops = align(&a, &b);
/// assert_eq!(
///     ops[1],
///     AlignmentOp::Replace { original: 2..5, corrected: 2..3 }
/// );
/// ```
pub fn align(original: &[Token<'_>], corrected: &[Token<'_>]) -> Vec<AlignmentOp> {
    let a: Vec<String> = original.iter().map(|t| fold(t.text)).collect();
    let b: Vec<String> = corrected.iter().map(|t| fold(t.text)).collect();
    Matcher::new(&a, &b).opcodes()
}

/// Like [`align`], but refuses sequences longer than `limit` tokens.
pub fn align_bounded(
    original: &[Token<'_>],
    corrected: &[Token<'_>],
    limit: usize,
) -> Result<Vec<AlignmentOp>, AlignmentError> {
    let tokens = original.len().max(corrected.len());
    if tokens > limit {
        return Err(AlignmentError::TooLong { tokens, limit });
    }
    Ok(align(original, corrected))
}

// ---------------------------------------------------------------------------
// Matcher
// ---------------------------------------------------------------------------

/// `(original start, corrected start, length)` of an equal run.
type Block = (usize, usize, usize);

struct Matcher<'s> {
    a: &'s [String],
    b: &'s [String],
    /// Positions of every folded token in `b`, ascending.
    b2j: HashMap<&'s str, Vec<usize>>,
}

impl<'s> Matcher<'s> {
    fn new(a: &'s [String], b: &'s [String]) -> Self {
        let mut b2j: HashMap<&str, Vec<usize>> = HashMap::new();
        for (j, word) in b.iter().enumerate() {
            b2j.entry(word.as_str()).or_default().push(j);
        }
        Self { a, b, b2j }
    }

    fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> Block {
        let (mut best_i, mut best_j, mut best_len) = (alo, blo, 0);
        // j2len[j] = length of the equal run ending at a[i - 1], b[j].
        let mut j2len: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            let mut next_j2len = HashMap::new();
            if let Some(positions) = self.b2j.get(self.a[i].as_str()) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let run = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next_j2len.insert(j, run);
                    // Strictly greater: the earliest block wins a tie.
                    if run > best_len {
                        best_i = i + 1 - run;
                        best_j = j + 1 - run;
                        best_len = run;
                    }
                }
            }
            j2len = next_j2len;
        }

        (best_i, best_j, best_len)
    }

    fn matching_blocks(&self) -> Vec<Block> {
        let (la, lb) = (self.a.len(), self.b.len());
        let mut queue = vec![(0, la, 0, lb)];
        let mut blocks = Vec::new();

        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let (i, j, k) = self.find_longest_match(alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            blocks.push((i, j, k));
            if alo < i && blo < j {
                queue.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                queue.push((i + k, ahi, j + k, bhi));
            }
        }
        blocks.sort_unstable();

        let mut collapsed = Vec::with_capacity(blocks.len() + 1);
        let (mut i1, mut j1, mut k1) = (0, 0, 0);
        for (i2, j2, k2) in blocks {
            if i1 + k1 == i2 && j1 + k1 == j2 {
                k1 += k2;
            } else {
                if k1 > 0 {
                    collapsed.push((i1, j1, k1));
                }
                (i1, j1, k1) = (i2, j2, k2);
            }
        }
        if k1 > 0 {
            collapsed.push((i1, j1, k1));
        }
        collapsed.push((la, lb, 0));
        collapsed
    }

    fn opcodes(&self) -> Vec<AlignmentOp> {
        let mut ops = Vec::new();
        let (mut i, mut j) = (0, 0);

        for (ai, bj, size) in self.matching_blocks() {
            let original = i..ai;
            let corrected = j..bj;
            match (i < ai, j < bj) {
                (true, true) => ops.push(AlignmentOp::Replace { original, corrected }),
                (true, false) => ops.push(AlignmentOp::Delete { original, corrected }),
                (false, true) => ops.push(AlignmentOp::Insert { original, corrected }),
                (false, false) => {}
            }
            i = ai + size;
            j = bj + size;
            if size > 0 {
                ops.push(AlignmentOp::Equal {
                    original: ai..i,
                    corrected: bj..j,
                });
            }
        }
        ops
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
