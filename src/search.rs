//! Incremental, cancellable candidate search.
//!
//! A `SearchSession` scans its candidate bucket in fixed-size chunks, one
//! chunk per `next_batch` call, so a search never blocks the host's input
//! loop. Acceptance stops permanently at the configured result cap.
//! Cancellation is the generation token: every keystroke bumps the engine
//! generation, and a session whose generation no longer matches yields
//! nothing — silently, with no error.

use crate::corpus::Term;
use crate::diff::{diff, score_from_ops, EditOp, MatchScore};
use crate::engine::Engine;
use crate::query::Query;
use serde::Serialize;

/// Candidates scanned per `next_batch` call.
pub(crate) const SCAN_CHUNK: usize = 512;

/// One accepted candidate with its edit script (for highlighting) and score.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredTerm {
    pub term: Term,
    pub ops: Vec<EditOp>,
    pub score: MatchScore,
}

/// One chunk's worth of results. The final batch of a session has
/// `done = true` and carries the terminal summary: `total_so_far` is the
/// session total and `truncated` reports whether the cap cut scanning short.
#[derive(Debug, Clone, Serialize)]
pub struct ResultBatch {
    pub generation: u64,
    pub new_results: Vec<ScoredTerm>,
    pub total_so_far: usize,
    pub done: bool,
    pub truncated: bool,
}

/// Candidate acceptance strategy seam.
pub trait FilterPredicate {
    /// Accept or reject a candidate for a query. On accept, returns the edit
    /// script and score that justified it.
    fn accept(&self, query: &Query, term: &Term) -> Option<(Vec<EditOp>, MatchScore)>;
}

/// Default filter: every character of the typed body must appear, in order,
/// within the candidate key — a subsequence test, not containment.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubsequenceFilter;

impl FilterPredicate for SubsequenceFilter {
    fn accept(&self, query: &Query, term: &Term) -> Option<(Vec<EditOp>, MatchScore)> {
        let body_len = query.body.chars().count();
        let key_len = term.key.chars().count();
        // Length guard: a key shorter than the body can never match every
        // body character, so skip the matcher entirely.
        if key_len < body_len {
            return None;
        }
        let ops = diff(&query.body, &term.key);
        let score = score_from_ops(&ops, body_len.max(key_len));
        if score.matched >= body_len {
            Some((ops, score))
        } else {
            None
        }
    }
}

/// A live search over one query. Owned by the host between `next_batch`
/// calls; superseded sessions are discarded, never mutated.
#[derive(Debug)]
pub struct SearchSession {
    generation: u64,
    query: Query,
    scan_pos: usize,
    found: usize,
    done: bool,
}

impl SearchSession {
    pub(crate) fn new(generation: u64, query: Query) -> Self {
        Self { generation, query, scan_pos: 0, found: 0, done: false }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Scan the next chunk of candidates. Returns `None` once the session is
    /// done — or immediately, without scanning, when the session has been
    /// superseded by a newer keystroke (stale generation).
    pub fn next_batch(&mut self, engine: &Engine) -> Option<ResultBatch> {
        if self.done || self.generation != engine.generation() {
            self.done = true;
            return None;
        }

        let candidates = engine.index().lookup(self.query.sigil, self.query.body.chars().next());
        let cap = engine.config().max_results;

        #[cfg(feature = "perf-log")]
        let t0 = std::time::Instant::now();

        let end = (self.scan_pos + SCAN_CHUNK).min(candidates.len());
        let mut new_results = Vec::new();

        for &id in &candidates[self.scan_pos..end] {
            if self.found >= cap {
                break;
            }
            let term = engine.term(id);
            if let Some((ops, score)) = engine.filter().accept(&self.query, term) {
                new_results.push(ScoredTerm { term: term.clone(), ops, score });
                self.found += 1;
            }
        }

        self.scan_pos = end;
        let truncated = self.found >= cap;
        self.done = truncated || self.scan_pos >= candidates.len();

        #[cfg(feature = "perf-log")]
        eprintln!(
            "[perf] gen={} scanned={}/{} accepted={} total={} {:.2}ms",
            self.generation,
            self.scan_pos,
            candidates.len(),
            new_results.len(),
            self.found,
            t0.elapsed().as_secs_f64() * 1000.0,
        );

        Some(ResultBatch {
            generation: self.generation,
            new_results,
            total_so_far: self.found,
            done: self.done,
            truncated,
        })
    }

    /// Drain every remaining batch (convenience for hosts that don't
    /// interleave keystrokes, and for tests).
    pub fn collect_all(&mut self, engine: &Engine) -> Vec<ResultBatch> {
        let mut batches = Vec::new();
        while let Some(batch) = self.next_batch(engine) {
            batches.push(batch);
        }
        batches
    }
}
