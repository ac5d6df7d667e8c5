//! Emphasis weight editing.
//!
//! Prompt syntax lets a token carry a weight annotation, `(face:1.2)`.
//! `adjust_weight` rewrites the token under the caret by one step up or
//! down: a bare token is treated as weight 1.0, and a token that lands
//! back on exactly 1.0 loses its parentheses again.
//!
//! Token bounds here come from list separators only. Parentheses are part
//! of the token, unlike in query extraction, since the annotation being
//! edited is itself parenthesized.

use crate::interface::{Applied, WeightDirection};
use crate::query::SEPARATORS;
use once_cell::sync::Lazy;
use regex::Regex;

pub const WEIGHT_STEP: f64 = 0.1;

static WEIGHT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*):(-?\d+(?:\.\d+)?)$").expect("weight pattern is valid"));

/// Step the weight of the token under `caret` (a byte offset). Returns the
/// rewritten buffer with the caret at the end of the rewritten token, or
/// `None` when the caret is off a char boundary or the token is empty.
pub fn adjust_weight(buffer: &str, caret: usize, direction: WeightDirection) -> Option<Applied> {
    if caret > buffer.len() || !buffer.is_char_boundary(caret) {
        return None;
    }

    let token_start = buffer[..caret]
        .char_indices()
        .rev()
        .find(|(_, c)| SEPARATORS.contains(c))
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let token_end = buffer[caret..]
        .find(SEPARATORS)
        .map(|i| caret + i)
        .unwrap_or(buffer.len());

    let raw = &buffer[token_start..token_end];
    let core = raw.trim();
    if core.is_empty() {
        return None;
    }
    let core_start = token_start + (raw.len() - raw.trim_start().len());

    let (name, weight) = parse_annotation(core)?;

    let step = match direction {
        WeightDirection::Up => WEIGHT_STEP,
        WeightDirection::Down => -WEIGHT_STEP,
    };
    let new_weight = ((weight + step) * 100.0).round() / 100.0;

    let rewritten = if new_weight == 1.0 {
        name.to_string()
    } else {
        format!("({}:{})", name, format_weight(new_weight))
    };

    let new_caret = core_start + rewritten.len();
    let new_buffer = format!(
        "{}{}{}",
        &buffer[..core_start],
        rewritten,
        &buffer[core_start + core.len()..]
    );
    Some(Applied { new_buffer, new_caret })
}

/// Split a token into its name and current weight. `(name:w)` yields
/// `(name, w)`; anything else is a bare token at weight 1.0.
fn parse_annotation(core: &str) -> Option<(&str, f64)> {
    if let Some(inner) = core.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        if let Some(caps) = WEIGHT_RE.captures(inner) {
            let weight: f64 = caps.get(2)?.as_str().parse().ok()?;
            return Some((caps.get(1)?.as_str(), weight));
        }
        // Parenthesized but unannotated: keep the name, implicit 1.0.
        return Some((inner, 1.0));
    }
    Some((core, 1.0))
}

/// Shortest stable rendering of a rounded weight: two decimals with one
/// trailing zero trimmed, so `1.1`, `1.25`, `2.0`.
fn format_weight(w: f64) -> String {
    let s = format!("{:.2}", w);
    s.strip_suffix('0').map(str::to_string).unwrap_or(s)
}
