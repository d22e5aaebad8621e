//! Word tokenizer shared by alignment and replacement.
//!
//! A token is a maximal run of alphanumeric characters.  An apostrophe
//! (`'` or `’`) belongs to a word only when it sits between two
//! alphanumerics, so `don't` is one token while `'quoted'` yields `quoted`.
//! Everything else is a separator and is never emitted; the byte offsets on
//! each [`Token`] let callers slice the untouched text between tokens back
//! out of the source.
//!
//! ```
//! use term_mapper::text::tokenize;
//!
//! let words: Vec<&str> = tokenize("Shihan's dojo, 2 mats").map(|t| t.text).collect();
//! assert_eq!(words, ["Shihan's", "dojo", "2", "mats"]);
//! ```

/// A word within its source text.  `start..end` is a byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

/// Lazy token iterator over a borrowed string.
///
/// A clone continues from the same position.  Call
/// [`tokenize`] again to start over.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    source: &'a str,
    pos: usize,
}

/// Split `text` into word tokens.  Case is preserved.
pub fn tokenize(text: &str) -> Tokens<'_> {
    Tokens {
        source: text,
        pos: 0,
    }
}

fn is_apostrophe(c: char) -> bool {
    c == '\'' || c == '\u{2019}'
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        let rest = &self.source[self.pos..];
        let mut chars = rest.char_indices().peekable();
        let mut start = None;
        let mut end = rest.len();

        while let Some((i, c)) = chars.next() {
            if start.is_none() {
                if c.is_alphanumeric() {
                    start = Some(i);
                }
                continue;
            }
            if c.is_alphanumeric() {
                continue;
            }
            if is_apostrophe(c) && chars.peek().is_some_and(|&(_, next)| next.is_alphanumeric()) {
                continue;
            }
            end = i;
            break;
        }

        let Some(start) = start else {
            self.pos = self.source.len();
            return None;
        };

        let token = Token {
            text: &rest[start..end],
            start: self.pos + start,
            end: self.pos + end,
        };
        self.pos = token.end;
        Some(token)
    }
}

/// Case-fold a string for comparison.  Every stage folds through here.
pub fn fold(text: &str) -> String {
    text.to_lowercase()
}

/// Canonical key form of a phrase: folded tokens joined by single spaces.
///
/// ```
/// use term_mapper::text::phrase_key;
///
/// assert_eq!(phrase_key("  A Key,  DOE "), "a key doe");
/// ```
pub fn phrase_key(text: &str) -> String {
    tokenize(text)
        .map(|t| fold(t.text))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether the words of `needle` appear as a contiguous run in `haystack`,
/// compared case-insensitively.  An empty needle is never contained.
///
/// ```
/// use term_mapper::text::contains_phrase;
///
/// assert!(contains_phrase("Tai no henko", "tai"));
/// assert!(!contains_phrase("tai no henko", "tai henko"));
/// ```
pub fn contains_phrase(haystack: &str, needle: &str) -> bool {
    let hay: Vec<String> = tokenize(haystack).map(|t| fold(t.text)).collect();
    let needle: Vec<String> = tokenize(needle).map(|t| fold(t.text)).collect();
    !needle.is_empty() && hay.windows(needle.len()).any(|w| w == needle.as_slice())
}

/// Whether consecutive `tokens` of `source` are separated only by whitespace
/// or hyphens, so they can be matched as one phrase.
pub fn is_phrase_run(source: &str, tokens: &[Token<'_>]) -> bool {
    tokens.windows(2).all(|pair| {
        source[pair[0].end..pair[1].start]
            .chars()
            .all(|c| c.is_whitespace() || c == '-')
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
