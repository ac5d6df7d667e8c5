//! Term corpus: raw-entry ingestion, normalization, and model-name synthesis.
//!
//! Raw entries arrive either as `[name, category, count]` JSON arrays (the
//! tag-dump format) or pre-shaped objects. Malformed entries are dropped,
//! never fatal; the counts land in `CorpusStats` so the host can log them.

use crate::interface::{CorpusStats, EngineConfig};
use serde::Deserialize;
use std::collections::HashMap;

/// Internal whitespace in keys and query bodies is normalized to this, so
/// multi-word typed queries match single-token corpus keys.
pub const JOIN_CHAR: char = '_';

/// A single completable unit.
///
/// `key` is the normalized match key (unique within a corpus); `value` is
/// the literal text spliced into the buffer on commit, typically
/// `name + suffix`. Constructed once at corpus load, immutable afterward.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Term {
    pub key: String,
    pub value: String,
    pub category: String,
    pub count: u64,
}

/// One corpus entry as supplied by the host, before normalization.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawEntry {
    /// `[name, category, count]`
    Tuple(String, String, u64),
    /// Pre-shaped term. `value` defaults to `name + suffix` when absent.
    Shaped {
        key: String,
        #[serde(default)]
        value: Option<String>,
        #[serde(alias = "type")]
        category: String,
        count: u64,
    },
}

/// Model lists served by the host; each path becomes a sigil-routed term.
#[derive(Debug, Clone, Default)]
pub struct ModelLists {
    pub checkpoints: Vec<String>,
    pub loras: Vec<String>,
    pub embeddings: Vec<String>,
}

impl ModelLists {
    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty() && self.loras.is_empty() && self.embeddings.is_empty()
    }
}

/// Lowercase, trim, and join internal whitespace runs with [`JOIN_CHAR`].
pub(crate) fn normalize_key(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_ws = false;
    for ch in s.trim().chars() {
        if ch.is_whitespace() {
            pending_ws = true;
            continue;
        }
        if pending_ws {
            out.push(JOIN_CHAR);
            pending_ws = false;
        }
        for lc in ch.to_lowercase() {
            out.push(lc);
        }
    }
    out
}

/// Build the final corpus from raw entries: normalize keys, drop entries
/// below the usage-count floor or over the key-length ceiling, merge
/// duplicate keys by summing counts, then sort by count descending.
pub fn build_corpus(entries: Vec<RawEntry>, config: &EngineConfig) -> (Vec<Term>, CorpusStats) {
    let mut stats = CorpusStats::default();
    let mut by_key: HashMap<String, usize> = HashMap::new();
    let mut terms: Vec<Term> = Vec::with_capacity(entries.len());

    for entry in entries {
        let (name, category, count) = match entry {
            RawEntry::Tuple(name, category, count) => (name, category, count),
            RawEntry::Shaped { key, value, category, count } => {
                // Pre-shaped values bypass suffixing below via the marker.
                if let Some(value) = value {
                    let key = normalize_key(&key);
                    if !accept_key(&key, count, config) {
                        stats.dropped += 1;
                        continue;
                    }
                    merge_term(&mut terms, &mut by_key, &mut stats, Term { key, value, category, count });
                    continue;
                }
                (key, category, count)
            }
        };

        let key = normalize_key(&name);
        if !accept_key(&key, count, config) {
            stats.dropped += 1;
            continue;
        }
        let value = format!("{}{}", name.trim(), config.suffix);
        merge_term(&mut terms, &mut by_key, &mut stats, Term { key, value, category, count });
    }

    terms.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    stats.loaded = terms.len();
    (terms, stats)
}

fn accept_key(key: &str, count: u64, config: &EngineConfig) -> bool {
    !key.is_empty() && count >= config.min_count && key.chars().count() <= config.max_token_len
}

fn merge_term(
    terms: &mut Vec<Term>,
    by_key: &mut HashMap<String, usize>,
    stats: &mut CorpusStats,
    term: Term,
) {
    match by_key.get(&term.key) {
        Some(&i) => {
            terms[i].count += term.count;
            stats.merged += 1;
        }
        None => {
            by_key.insert(term.key.clone(), terms.len());
            terms.push(term);
        }
    }
}

/// Parse a JSON array of raw entries, dropping elements that fail to
/// deserialize. Errors only on a malformed document, not malformed entries.
pub fn parse_entries(raw: &str) -> Result<(Vec<RawEntry>, usize), serde_json::Error> {
    let values: Vec<serde_json::Value> = serde_json::from_str(raw)?;
    let mut dropped = 0;
    let mut entries = Vec::with_capacity(values.len());
    for value in values {
        match serde_json::from_value::<RawEntry>(value) {
            Ok(entry) => entries.push(entry),
            Err(_) => dropped += 1,
        }
    }
    Ok((entries, dropped))
}

/// Synthesize terms from model path lists. The display key is the path's
/// basename (extension stripped); the insertion value is the bracketed
/// `<kind:basename:1.0>` form; usage count is fixed at 0.
pub fn model_terms(models: &ModelLists) -> Vec<Term> {
    let mut terms = Vec::new();
    for (kind, paths) in [
        ("checkpoint", &models.checkpoints),
        ("lora", &models.loras),
        ("embedding", &models.embeddings),
    ] {
        for path in paths {
            let stem = basename_stem(path);
            if stem.is_empty() {
                continue;
            }
            terms.push(Term {
                key: normalize_key(stem),
                value: format!("<{}:{}:1.0>", kind, stem),
                category: kind.to_string(),
                count: 0,
            });
        }
    }
    terms
}

/// Basename of a path with a trailing extension stripped.
fn basename_stem(path: &str) -> &str {
    let base = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match base.rfind('.') {
        Some(0) | None => base,
        Some(i) => &base[..i],
    }
}
