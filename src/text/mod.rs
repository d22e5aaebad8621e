//! Text primitives: tokenization and case folding.

pub mod tokenize;

pub use tokenize::{contains_phrase, fold, is_phrase_run, phrase_key, tokenize, Token, Tokens};
