//! Per-candidate review hook.
//!
//! An external reviewer (an interactive terminal loop, a GUI, a rules file)
//! implements [`Reviewer`] and is called once per candidate, most frequent
//! first.  Closures work directly:
//!
//! ```
//! use term_mapper::diff::{review_candidates, PhraseCandidate, ReviewDecision};
//!
//! let candidates = vec![
//!     PhraseCandidate::new("ear ream e", "irimi", 4),
//!     PhraseCandidate::new("the", "a", 9),
//! ];
//! let mut reject_short = |c: &PhraseCandidate| {
//!     if c.original.len() < 4 { ReviewDecision::Reject } else { ReviewDecision::Accept }
//! };
//! let kept = review_candidates(candidates, Some(&mut reject_short));
//! assert_eq!(kept.len(), 1);
//! assert_eq!(kept[0].corrected, "irimi");
//! ```

use crate::diff::extract::PhraseCandidate;

/// What the reviewer wants done with one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewDecision {
    Accept,
    Reject,
    /// Accept with a different corrected value.
    Edit(String),
    /// Stop reviewing; everything not yet accepted is dropped.
    SkipRemaining,
}

pub trait Reviewer {
    fn review(&mut self, candidate: &PhraseCandidate) -> ReviewDecision;
}

impl<F> Reviewer for F
where
    F: FnMut(&PhraseCandidate) -> ReviewDecision,
{
    fn review(&mut self, candidate: &PhraseCandidate) -> ReviewDecision {
        self(candidate)
    }
}

/// Run candidates past `reviewer` in descending count order (ties keep input
/// order) and return the accepted ones in that order.  With no reviewer every
/// candidate is accepted.
pub fn review_candidates(
    mut candidates: Vec<PhraseCandidate>,
    reviewer: Option<&mut dyn Reviewer>,
) -> Vec<PhraseCandidate> {
    candidates.sort_by(|a, b| b.occurrence_count.cmp(&a.occurrence_count));

    let Some(reviewer) = reviewer else {
        return candidates;
    };

    let mut accepted = Vec::with_capacity(candidates.len());
    for mut candidate in candidates {
        match reviewer.review(&candidate) {
            ReviewDecision::Accept => accepted.push(candidate),
            ReviewDecision::Reject => {
                log::debug!("rejected '{}'", candidate.original);
            }
            ReviewDecision::Edit(corrected) => {
                let corrected = corrected.trim();
                if corrected.is_empty() {
                    log::debug!("empty edit for '{}', dropped", candidate.original);
                    continue;
                }
                candidate.corrected = corrected.to_string();
                accepted.push(candidate);
            }
            ReviewDecision::SkipRemaining => {
                log::info!("review stopped after {} accepted", accepted.len());
                break;
            }
        }
    }
    accepted
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<PhraseCandidate> {
        vec![
            PhraseCandidate::new("ear ream e", "irimi", 2),
            PhraseCandidate::new("a key doe", "Aikido", 5),
            PhraseCandidate::new("she ho nag e", "shihonage", 2),
        ]
    }

    /// Scripted reviewer that also records what it was shown.
    struct Scripted {
        answers: Vec<ReviewDecision>,
        seen: Vec<String>,
    }

    impl Reviewer for Scripted {
        fn review(&mut self, candidate: &PhraseCandidate) -> ReviewDecision {
            self.seen.push(candidate.original.clone());
            self.answers.remove(0)
        }
    }

    #[test]
    fn no_reviewer_accepts_everything_most_frequent_first() {
        let kept = review_candidates(sample(), None);
        let keys: Vec<_> = kept.iter().map(|c| c.original.as_str()).collect();
        assert_eq!(keys, ["a key doe", "ear ream e", "she ho nag e"]);
    }

    #[test]
    fn reviewer_sees_candidates_in_deterministic_order() {
        let mut reviewer = Scripted {
            answers: vec![
                ReviewDecision::Accept,
                ReviewDecision::Reject,
                ReviewDecision::Edit("Shiho-nage".into()),
            ],
            seen: Vec::new(),
        };
        let kept = review_candidates(sample(), Some(&mut reviewer));
        assert_eq!(reviewer.seen, ["a key doe", "ear ream e", "she ho nag e"]);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].corrected, "Aikido");
        assert_eq!(kept[1].corrected, "Shiho-nage");
    }

    #[test]
    fn skip_remaining_stops_review() {
        let mut reviewer = Scripted {
            answers: vec![ReviewDecision::Accept, ReviewDecision::SkipRemaining],
            seen: Vec::new(),
        };
        let kept = review_candidates(sample(), Some(&mut reviewer));
        assert_eq!(reviewer.seen.len(), 2);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].original, "a key doe");
    }

    #[test]
    fn empty_edit_drops_candidate() {
        let mut always_blank = |_: &PhraseCandidate| ReviewDecision::Edit("   ".into());
        assert!(review_candidates(sample(), Some(&mut always_blank)).is_empty());
    }
}
