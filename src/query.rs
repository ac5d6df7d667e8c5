//! Cursor-aware query extraction.
//!
//! The parser isolates the token being typed from the surrounding buffer:
//! everything from the last delimiter before the caret up to the caret is
//! the active token; leading whitespace stays in `head`, trailing whitespace
//! moves to `tail`, and a recognized sigil prefix is stripped from `body`
//! but retained in `head` so it survives reinsertion.
//!
//! The parser is an injectable strategy (`QueryParse`) so hosts can swap in
//! their own tokenization without touching the engine.

use crate::corpus::normalize_key;
use crate::interface::{Applied, Sigil};

/// Characters that terminate a token for query extraction. Spaces are not
/// delimiters — multi-word queries are joined with `_` instead.
pub const DELIMITERS: &[char] = &[',', '\n', '\r', '(', ')', '{', '}', '[', ']', '|'];

/// The subset of delimiters that act as list separators. Used for duplicate
/// collapsing on commit and for weight-token extraction, where brackets must
/// stay inside the token.
pub const SEPARATORS: &[char] = &[',', '\n', '\r'];

/// Sigil prefixes, longest first so `$$$` never parses as `$` + `$$`.
const SIGILS: &[(&str, Sigil)] = &[
    ("$$$", Sigil::Checkpoint),
    ("$$", Sigil::Lora),
    ("$", Sigil::Embedding),
    ("@", Sigil::Artist),
    ("#", Sigil::Character),
];

/// The active query at a caret position. `head` is the buffer up to the
/// body (sigil included), `tail` the buffer from the caret on (with any
/// whitespace trimmed off the body's end). `head + tail` with the typed
/// token removed is exactly what splicing rebuilds around a chosen value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub head: String,
    pub body: String,
    pub tail: String,
    pub sigil: Sigil,
}

impl Query {
    /// Splice a chosen term value into the buffer at the query's span.
    /// A separator that ends `value` swallows an identical separator at the
    /// start of `tail`, so committing `"apple,"` before `", sky"` yields a
    /// single comma. The caret lands just past the inserted value.
    pub fn splice(&self, value: &str) -> Applied {
        let mut tail = self.tail.as_str();
        if let Some(last) = value.chars().last() {
            if SEPARATORS.contains(&last) && tail.starts_with(last) {
                tail = &tail[last.len_utf8()..];
            }
        }
        let new_caret = self.head.len() + value.len();
        let new_buffer = format!("{}{}{}", self.head, value, tail);
        Applied { new_buffer, new_caret }
    }
}

/// Parser strategy seam.
pub trait QueryParse {
    /// Extract the query at `caret` (a byte offset), or `None` when there is
    /// no active query (empty or over-length body, caret off a boundary).
    fn parse(&self, buffer: &str, caret: usize, max_body_len: usize) -> Option<Query>;
}

/// Default parser: delimiter splitting with sigil recognition.
#[derive(Debug, Clone)]
pub struct DelimiterParser {
    delimiters: Vec<char>,
}

impl Default for DelimiterParser {
    fn default() -> Self {
        Self { delimiters: DELIMITERS.to_vec() }
    }
}

impl DelimiterParser {
    pub fn new(delimiters: Vec<char>) -> Self {
        Self { delimiters }
    }
}

impl QueryParse for DelimiterParser {
    fn parse(&self, buffer: &str, caret: usize, max_body_len: usize) -> Option<Query> {
        if caret > buffer.len() || !buffer.is_char_boundary(caret) {
            return None;
        }

        let part_start = buffer[..caret]
            .char_indices()
            .rev()
            .find(|(_, c)| self.delimiters.contains(c))
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);

        let raw = &buffer[part_start..caret];
        let after_lead = raw.trim_start();
        let body_start = part_start + (raw.len() - after_lead.len());
        let core = after_lead.trim_end();
        let trailing_ws = &after_lead[core.len()..];

        let (sigil, stripped) = detect_sigil(core);
        let body = normalize_key(stripped);
        if body.is_empty() || body.chars().count() > max_body_len {
            return None;
        }

        let mut head = buffer[..body_start].to_string();
        head.push_str(sigil.prefix());
        let tail = format!("{}{}", trailing_ws, &buffer[caret..]);

        Some(Query { head, body, tail, sigil })
    }
}

fn detect_sigil(core: &str) -> (Sigil, &str) {
    for (prefix, sigil) in SIGILS {
        if let Some(rest) = core.strip_prefix(prefix) {
            return (*sigil, rest);
        }
    }
    (Sigil::None, core)
}
