//! tagcomplete - incremental fuzzy autocomplete for prompt editing
//!
//! This library implements the completion engine behind a prompt editor's
//! suggestion panel: a bucketed term index over a tag corpus, subsequence
//! matching via character-level edit scripts, keystroke-granular session
//! cancellation, and keyboard-driven selection with emphasis-weight editing.
//!
//! The host owns rendering and raw input; the engine is driven through
//! [`Engine`] and [`SelectionController`] and answers with plain records.

pub mod controller;
pub mod corpus;
pub mod diff;
pub mod engine;
pub mod index;
pub mod interface;
pub mod query;
pub mod search;
pub mod weight;

pub use controller::{KeyEvent, KeyOutcome, SelectionController};
pub use corpus::{ModelLists, RawEntry, Term};
pub use engine::Engine;
pub use interface::*;
pub use query::{DelimiterParser, Query, QueryParse};
pub use search::{FilterPredicate, ResultBatch, ScoredTerm, SearchSession, SubsequenceFilter};
pub use weight::adjust_weight;
