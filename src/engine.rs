//! The completion engine: owned corpus + index, strategy seams, and the
//! generation counter that serializes sessions.
//!
//! Every keystroke bumps the generation before anything else happens, so a
//! session created for the previous keystroke goes stale even when the new
//! keystroke yields no query at all.

use crate::corpus::{self, ModelLists, RawEntry, Term};
use crate::index::TermIndex;
use crate::interface::{Applied, CorpusStats, EngineConfig, EngineError, WeightDirection};
use crate::query::{DelimiterParser, Query, QueryParse};
use crate::search::{FilterPredicate, SearchSession, SubsequenceFilter};
use crate::weight;

pub struct Engine {
    config: EngineConfig,
    terms: Vec<Term>,
    index: TermIndex,
    parser: Box<dyn QueryParse>,
    filter: Box<dyn FilterPredicate>,
    generation: u64,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_strategies(
            config,
            Box::new(DelimiterParser::default()),
            Box::new(SubsequenceFilter),
        )
    }

    /// Construct with custom tokenization and acceptance strategies.
    pub fn with_strategies(
        config: EngineConfig,
        parser: Box<dyn QueryParse>,
        filter: Box<dyn FilterPredicate>,
    ) -> Self {
        Self {
            config,
            terms: Vec::new(),
            index: TermIndex::default(),
            parser,
            filter,
            generation: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    pub(crate) fn term(&self, id: u32) -> &Term {
        &self.terms[id as usize]
    }

    pub(crate) fn index(&self) -> &TermIndex {
        &self.index
    }

    pub(crate) fn filter(&self) -> &dyn FilterPredicate {
        self.filter.as_ref()
    }

    /// Load a corpus from a JSON tag dump plus model lists. Replaces any
    /// previously loaded corpus and invalidates live sessions.
    pub fn load_corpus(&mut self, raw: &str, models: &ModelLists) -> Result<CorpusStats, EngineError> {
        let (entries, malformed) = corpus::parse_entries(raw)?;
        let mut stats = self.load_entries(entries, models);
        stats.dropped += malformed;
        Ok(stats)
    }

    /// Load pre-parsed entries plus model lists.
    pub fn load_entries(&mut self, entries: Vec<RawEntry>, models: &ModelLists) -> CorpusStats {
        let (mut terms, stats) = corpus::build_corpus(entries, &self.config);
        terms.extend(corpus::model_terms(models));
        self.index = TermIndex::build(&terms, &self.config);
        self.terms = terms;
        // A reload orphans any session scanning the old corpus.
        self.generation += 1;
        stats
    }

    /// React to a buffer edit. The previous session (if any) is invalidated
    /// unconditionally; a new one starts only when the caret sits on a
    /// non-empty token.
    pub fn on_keystroke(&mut self, buffer: &str, caret: usize) -> Option<SearchSession> {
        self.generation += 1;
        let query = self.parser.parse(buffer, caret, self.config.max_token_len)?;
        Some(SearchSession::new(self.generation, query))
    }

    /// Dismiss any live session without starting a new one.
    pub fn cancel(&mut self) {
        self.generation += 1;
    }

    /// Splice a chosen term into the buffer at the query's span.
    pub fn apply_selection(&self, query: &Query, term: &Term) -> Applied {
        query.splice(&term.value)
    }

    /// Step the emphasis weight of the token under the caret.
    pub fn adjust_weight(
        &self,
        buffer: &str,
        caret: usize,
        direction: WeightDirection,
    ) -> Option<Applied> {
        weight::adjust_weight(buffer, caret, direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::ResultBatch;

    fn engine_with(entries: &[(&str, &str, u64)]) -> Engine {
        let raw: Vec<RawEntry> = entries
            .iter()
            .map(|(k, c, n)| RawEntry::Tuple((*k).to_string(), (*c).to_string(), *n))
            .collect();
        let mut engine = Engine::new(EngineConfig { min_count: 1, ..EngineConfig::default() });
        engine.load_entries(raw, &ModelLists::default());
        engine
    }

    fn result_keys(batches: &[ResultBatch]) -> Vec<String> {
        batches
            .iter()
            .flat_map(|b| b.new_results.iter().map(|r| r.term.key.clone()))
            .collect()
    }

    // ── session flow ─────────────────────────────────────────────

    #[test]
    fn test_search_narrows_as_typed() {
        let engine_terms = [
            ("a_girl", "general", 100),
            ("a_ghost", "general", 50),
            ("apple", "general", 10),
        ];
        let mut engine = engine_with(&engine_terms);

        let mut session = engine.on_keystroke("a", 1).unwrap();
        let keys = result_keys(&session.collect_all(&engine));
        assert_eq!(keys, vec!["a_girl", "a_ghost", "apple"]);

        let mut session = engine.on_keystroke("a_g", 3).unwrap();
        let keys = result_keys(&session.collect_all(&engine));
        assert_eq!(keys, vec!["a_girl", "a_ghost"]);
    }

    #[test]
    fn test_results_arrive_in_count_order() {
        let mut engine = engine_with(&[
            ("ab_low", "general", 1),
            ("ab_high", "general", 1000),
            ("ab_mid", "general", 10),
        ]);
        let mut session = engine.on_keystroke("ab", 2).unwrap();
        let keys = result_keys(&session.collect_all(&engine));
        assert_eq!(keys, vec!["ab_high", "ab_mid", "ab_low"]);
    }

    #[test]
    fn test_no_query_yields_no_session() {
        let mut engine = engine_with(&[("a_girl", "general", 100)]);
        assert!(engine.on_keystroke("", 0).is_none());
        assert!(engine.on_keystroke("girl, ", 6).is_none());
    }

    // ── cancellation ─────────────────────────────────────────────

    #[test]
    fn test_new_keystroke_invalidates_old_session() {
        let mut engine = engine_with(&[("a_girl", "general", 100)]);
        let mut old = engine.on_keystroke("a", 1).unwrap();
        let _new = engine.on_keystroke("a_", 2).unwrap();
        assert!(old.next_batch(&engine).is_none());
    }

    #[test]
    fn test_failed_parse_still_invalidates() {
        let mut engine = engine_with(&[("a_girl", "general", 100)]);
        let mut old = engine.on_keystroke("a", 1).unwrap();
        // Deleting back to an empty buffer starts no session but must still
        // cancel the old one.
        assert!(engine.on_keystroke("", 0).is_none());
        assert!(old.next_batch(&engine).is_none());
    }

    #[test]
    fn test_explicit_cancel_invalidates() {
        let mut engine = engine_with(&[("a_girl", "general", 100)]);
        let mut session = engine.on_keystroke("a", 1).unwrap();
        engine.cancel();
        assert!(session.next_batch(&engine).is_none());
    }

    #[test]
    fn test_reload_invalidates_session() {
        let mut engine = engine_with(&[("a_girl", "general", 100)]);
        let mut session = engine.on_keystroke("a", 1).unwrap();
        engine.load_entries(
            vec![RawEntry::Tuple("apple".into(), "general".into(), 100)],
            &ModelLists::default(),
        );
        assert!(session.next_batch(&engine).is_none());
    }

    // ── result cap ───────────────────────────────────────────────

    #[test]
    fn test_cap_truncates_and_reports() {
        let entries: Vec<(String, &str, u64)> =
            (0..10).map(|i| (format!("ab_{}", i), "general", 100 - i as u64)).collect();
        let raw: Vec<RawEntry> = entries
            .iter()
            .map(|(k, c, n)| RawEntry::Tuple(k.clone(), (*c).to_string(), *n))
            .collect();
        let mut engine = Engine::new(EngineConfig {
            min_count: 1,
            max_results: 3,
            ..EngineConfig::default()
        });
        engine.load_entries(raw, &ModelLists::default());

        let mut session = engine.on_keystroke("ab", 2).unwrap();
        let batches = session.collect_all(&engine);
        let last = batches.last().unwrap();
        assert!(last.done);
        assert!(last.truncated);
        assert_eq!(last.total_so_far, 3);
        assert_eq!(result_keys(&batches).len(), 3);
    }

    #[test]
    fn test_exhaustive_scan_is_not_truncated() {
        let mut engine = engine_with(&[("a_girl", "general", 100)]);
        let mut session = engine.on_keystroke("a", 1).unwrap();
        let batches = session.collect_all(&engine);
        let last = batches.last().unwrap();
        assert!(last.done);
        assert!(!last.truncated);
    }

    // ── sigils and models ────────────────────────────────────────

    #[test]
    fn test_artist_sigil_restricts_candidates() {
        let mut engine = engine_with(&[
            ("banksy", "artist", 100),
            ("blue_sky", "general", 1000),
        ]);
        let mut session = engine.on_keystroke("@b", 2).unwrap();
        let keys = result_keys(&session.collect_all(&engine));
        assert_eq!(keys, vec!["banksy"]);
    }

    #[test]
    fn test_lora_sigil_finds_model_terms() {
        let mut engine = Engine::new(EngineConfig { min_count: 1, ..EngineConfig::default() });
        let models = ModelLists {
            loras: vec!["styles/Watercolor.safetensors".into()],
            ..Default::default()
        };
        engine.load_entries(
            vec![RawEntry::Tuple("watering_can".into(), "general".into(), 100)],
            &models,
        );

        let mut session = engine.on_keystroke("$$water", 7).unwrap();
        let results: Vec<_> = session
            .collect_all(&engine)
            .iter()
            .flat_map(|b| b.new_results.clone())
            .collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].term.value, "<lora:Watercolor:1.0>");

        // Without the sigil, model terms stay out of the way.
        let mut session = engine.on_keystroke("water", 5).unwrap();
        let keys = result_keys(&session.collect_all(&engine));
        assert_eq!(keys, vec!["watering_can"]);
    }

    // ── commit ───────────────────────────────────────────────────

    #[test]
    fn test_apply_selection_splices_value() {
        let mut engine = engine_with(&[("a_girl", "general", 100)]);
        let mut session = engine.on_keystroke("masterpiece, a_g", 16).unwrap();
        let batches = session.collect_all(&engine);
        let chosen = batches[0].new_results[0].term.clone();
        let applied = engine.apply_selection(session.query(), &chosen);
        assert_eq!(applied.new_buffer, "masterpiece, a_girl,");
        assert_eq!(applied.new_caret, applied.new_buffer.len());
    }

    // ── corpus loading ───────────────────────────────────────────

    #[test]
    fn test_load_corpus_from_json() {
        let mut engine = Engine::new(EngineConfig { min_count: 10, ..EngineConfig::default() });
        let raw = r#"[["a_girl", "general", 100], ["rare", "general", 2], [42]]"#;
        let stats = engine.load_corpus(raw, &ModelLists::default()).unwrap();
        assert_eq!(stats.loaded, 1);
        assert_eq!(stats.dropped, 2);
        assert_eq!(engine.term_count(), 1);
    }

    #[test]
    fn test_load_corpus_bad_document() {
        let mut engine = Engine::new(EngineConfig::default());
        assert!(engine.load_corpus("not json", &ModelLists::default()).is_err());
    }
}
