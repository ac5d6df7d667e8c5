//! Bucketed term index.
//!
//! Buckets turn the O(corpus) linear scan into a bounded-candidate lookup.
//! Membership is deliberately non-exclusive: a term sits in its first-char
//! bucket and, when its category warrants, in a category bucket too — the
//! index is a multi-map from selector to term set, not a partition.
//!
//! Built wholesale at corpus load and read-only afterward; corpus reload
//! rebuilds from scratch.

use crate::corpus::Term;
use crate::interface::{EngineConfig, Sigil};
use std::collections::HashMap;

/// Index over a term slice. Buckets hold indices into that slice, in slice
/// order (count-descending, since the corpus is pre-sorted).
#[derive(Debug, Default)]
pub struct TermIndex {
    prefix: HashMap<char, Vec<u32>>,
    artist: Vec<u32>,
    character: Vec<u32>,
    checkpoint: Vec<u32>,
    lora: Vec<u32>,
    embedding: Vec<u32>,
    /// Every general-corpus term, the fallback when no prefix bucket exists.
    all: Vec<u32>,
}

impl TermIndex {
    /// Build buckets over `terms`. Model terms (categories `checkpoint`,
    /// `lora`, `embedding`) route to their sigil bucket; whether they also
    /// join the prefix buckets is the `index_models_in_prefix` policy.
    pub fn build(terms: &[Term], config: &EngineConfig) -> Self {
        let mut index = TermIndex::default();

        for (i, term) in terms.iter().enumerate() {
            let i = i as u32;
            match term.category.as_str() {
                "checkpoint" | "lora" | "embedding" => {
                    match term.category.as_str() {
                        "checkpoint" => index.checkpoint.push(i),
                        "lora" => index.lora.push(i),
                        _ => index.embedding.push(i),
                    }
                    if config.index_models_in_prefix {
                        index.insert_prefix(term, i);
                        index.all.push(i);
                    }
                }
                category => {
                    index.insert_prefix(term, i);
                    index.all.push(i);
                    if category == "artist" {
                        index.artist.push(i);
                    } else if category == "character" {
                        index.character.push(i);
                    }
                }
            }
        }

        index
    }

    fn insert_prefix(&mut self, term: &Term, i: u32) {
        if let Some(first) = term.key.chars().next() {
            self.prefix.entry(first).or_default().push(i);
        }
    }

    /// Candidate set for a query: the sigil bucket when a sigil is present,
    /// else the first-char bucket, else the full corpus (a typed token with
    /// no prefix bucket must still be searchable, at higher cost).
    pub fn lookup(&self, sigil: Sigil, first: Option<char>) -> &[u32] {
        match sigil {
            Sigil::Artist => &self.artist,
            Sigil::Character => &self.character,
            Sigil::Checkpoint => &self.checkpoint,
            Sigil::Lora => &self.lora,
            Sigil::Embedding => &self.embedding,
            Sigil::None => match first.and_then(|c| self.prefix.get(&c)) {
                Some(bucket) => bucket,
                None => &self.all,
            },
        }
    }

    /// Number of distinct first-char buckets (diagnostic).
    pub fn prefix_bucket_count(&self) -> usize {
        self.prefix.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(key: &str, category: &str, count: u64) -> Term {
        Term {
            key: key.into(),
            value: format!("{},", key),
            category: category.into(),
            count,
        }
    }

    fn keys<'a>(terms: &'a [Term], ids: &[u32]) -> Vec<&'a str> {
        ids.iter().map(|&i| terms[i as usize].key.as_str()).collect()
    }

    // ── bucket construction ──────────────────────────────────────

    #[test]
    fn test_first_char_buckets_preserve_order() {
        let terms = vec![
            term("a_girl", "general", 100),
            term("a_ghost", "general", 50),
            term("apple", "general", 10),
            term("blue_sky", "general", 5),
        ];
        let index = TermIndex::build(&terms, &EngineConfig::default());
        assert_eq!(keys(&terms, index.lookup(Sigil::None, Some('a'))), vec!["a_girl", "a_ghost", "apple"]);
        assert_eq!(keys(&terms, index.lookup(Sigil::None, Some('b'))), vec!["blue_sky"]);
    }

    #[test]
    fn test_category_membership_is_non_exclusive() {
        // An artist term appears in both its first-char bucket and the
        // artist bucket.
        let terms = vec![term("banksy", "artist", 100)];
        let index = TermIndex::build(&terms, &EngineConfig::default());
        assert_eq!(keys(&terms, index.lookup(Sigil::None, Some('b'))), vec!["banksy"]);
        assert_eq!(keys(&terms, index.lookup(Sigil::Artist, None)), vec!["banksy"]);
    }

    #[test]
    fn test_bucket_coverage() {
        // Every term is reachable via its own first character.
        let terms = vec![
            term("a_girl", "general", 100),
            term("miku", "character", 90),
            term("banksy", "artist", 80),
            term("{brace}", "general", 70),
        ];
        let index = TermIndex::build(&terms, &EngineConfig::default());
        for t in &terms {
            let first = t.key.chars().next();
            let bucket = index.lookup(Sigil::None, first);
            assert!(
                bucket.iter().any(|&i| terms[i as usize].key == t.key),
                "{} not reachable from its first-char bucket",
                t.key
            );
        }
    }

    #[test]
    fn test_metacharacter_first_chars_are_plain_buckets() {
        // Regex metacharacters are ordinary hash keys here.
        let terms = vec![term("(paren)", "general", 100), term("$dollar", "general", 50)];
        let index = TermIndex::build(&terms, &EngineConfig::default());
        assert_eq!(keys(&terms, index.lookup(Sigil::None, Some('('))), vec!["(paren)"]);
        assert_eq!(keys(&terms, index.lookup(Sigil::None, Some('$'))), vec!["$dollar"]);
        assert_eq!(index.prefix_bucket_count(), 2);
    }

    // ── lookup policy ────────────────────────────────────────────

    #[test]
    fn test_lookup_falls_back_to_full_corpus() {
        let terms = vec![term("a_girl", "general", 100), term("blue_sky", "general", 50)];
        let index = TermIndex::build(&terms, &EngineConfig::default());
        // No 'z' bucket: fall back to everything.
        assert_eq!(index.lookup(Sigil::None, Some('z')).len(), 2);
        assert_eq!(index.lookup(Sigil::None, None).len(), 2);
    }

    #[test]
    fn test_sigil_bucket_overrides_first_char() {
        let terms = vec![
            term("banksy", "artist", 100),
            term("blue_sky", "general", 50),
        ];
        let index = TermIndex::build(&terms, &EngineConfig::default());
        // Sigil lookup ignores the first char entirely.
        assert_eq!(keys(&terms, index.lookup(Sigil::Artist, Some('b'))), vec!["banksy"]);
    }

    // ── model routing policy ─────────────────────────────────────

    #[test]
    fn test_model_terms_sigil_only_by_default() {
        let terms = vec![term("watercolor", "lora", 0), term("wide_shot", "general", 100)];
        let index = TermIndex::build(&terms, &EngineConfig::default());
        assert_eq!(keys(&terms, index.lookup(Sigil::Lora, None)), vec!["watercolor"]);
        // Not in the 'w' prefix bucket, not in the fallback.
        assert_eq!(keys(&terms, index.lookup(Sigil::None, Some('w'))), vec!["wide_shot"]);
        assert_eq!(index.lookup(Sigil::None, None).len(), 1);
    }

    #[test]
    fn test_model_terms_in_prefix_when_configured() {
        let terms = vec![term("watercolor", "lora", 0)];
        let config = EngineConfig { index_models_in_prefix: true, ..Default::default() };
        let index = TermIndex::build(&terms, &config);
        assert_eq!(keys(&terms, index.lookup(Sigil::None, Some('w'))), vec!["watercolor"]);
        assert_eq!(keys(&terms, index.lookup(Sigil::Lora, None)), vec!["watercolor"]);
    }
}
