//! Terminology mapping: the persistent correction table and the engine that
//! applies it.
//!
//! * [`TerminologyMapping`] / [`merge`]: load, grow and persist the table.
//! * [`Replacer`] / [`apply`] / [`apply_to_segments`]: rewrite text and
//!   timed caption segments.
//! * [`MappingError`]: corrupt files and invalid entries.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use term_mapper::diff::PhraseCandidate;
//! use term_mapper::mapping::{apply, merge, TerminologyMapping};
//!
//! let path = Path::new("terminology_mapping.json");
//! let existing = TerminologyMapping::load(path).unwrap();
//! let (mut mapping, report) =
//!     merge(existing, &[PhraseCandidate::new("a key doe", "Aikido", 2)]).unwrap();
//! mapping.persist(path).unwrap();
//!
//! println!("{} added, {} updated", report.added, report.updated);
//! println!("{}", apply("welcome to a key doe", &mapping));
//! ```

pub mod replace;
pub mod store;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use replace::{apply, apply_to_segments, Replacer, Segment};
pub use store::{merge, Insertion, MappingError, MergeReport, TerminologyMapping, MAPPING_VERSION};
