//! Boundary types for the autocomplete engine.
//!
//! This file defines the records, enums, and error type shared between the
//! engine and its host. The host owns everything visual (panel layout,
//! highlight styling, shortcut suppression); the engine communicates with it
//! only through these types.

use serde::Serialize;
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// ENUMS
// ═══════════════════════════════════════════════════════════════════════════════

/// A leading symbol that narrows the search to one term category.
///
/// `@` artists, `#` characters, `$` embeddings, `$$` loras, `$$$` checkpoints.
/// Detection is longest-match-first so `$$$x` is a checkpoint query, not an
/// embedding query for `$$x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Sigil {
    None,
    Artist,
    Character,
    Embedding,
    Lora,
    Checkpoint,
}

impl Sigil {
    /// The literal prefix the user types. Preserved in the buffer on commit.
    pub fn prefix(self) -> &'static str {
        match self {
            Sigil::None => "",
            Sigil::Artist => "@",
            Sigil::Character => "#",
            Sigil::Embedding => "$",
            Sigil::Lora => "$$",
            Sigil::Checkpoint => "$$$",
        }
    }
}

/// Direction for a weight-adjust edit on the token under the caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightDirection {
    Up,
    Down,
}

// ═══════════════════════════════════════════════════════════════════════════════
// RECORDS
// ═══════════════════════════════════════════════════════════════════════════════

/// A buffer edit produced by committing a selection or adjusting a weight.
/// `new_caret` is a byte offset into `new_buffer`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Applied {
    pub new_buffer: String,
    pub new_caret: usize,
}

/// Corpus load summary. Skipped/merged counts exist so the host can log
/// them; the engine itself never surfaces malformed entries as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CorpusStats {
    /// Terms in the final corpus (after filtering and duplicate merging).
    pub loaded: usize,
    /// Entries dropped: malformed, below the usage-count floor, or over-length.
    pub dropped: usize,
    /// Entries folded into an existing term with the same normalized key.
    pub merged: usize,
}

/// Behavioral knobs. Passed in by the host; no config file of our own.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Hard cap on results per search session; scanning stops once reached.
    pub max_results: usize,
    /// Size of the controller's visible window into the result list.
    pub max_visible: usize,
    /// Corpus entries below this usage count are dropped at load.
    pub min_count: u64,
    /// Maximum length (chars) for both corpus keys and query bodies.
    /// Guards the quadratic worst case of the sequence matcher.
    pub max_token_len: usize,
    /// Appended to every corpus term's insertion value (typically `","`).
    pub suffix: String,
    /// Display toggles read by the host's renderer.
    pub show_count: bool,
    pub show_category: bool,
    pub show_number: bool,
    /// Whether sigil-routed model terms also join the first-char prefix
    /// buckets (and the full-corpus fallback scan).
    pub index_models_in_prefix: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_results: 3939,
            max_visible: 11,
            min_count: 39,
            max_token_len: 39,
            suffix: ",".to_string(),
            show_count: true,
            show_category: false,
            show_number: false,
            index_models_in_prefix: false,
        }
    }
}

/// Error type for engine operations.
///
/// Data-shape problems (malformed entries, rejected queries, stale sessions)
/// are absorbed into skip/`None` outcomes and never reach this type.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("corpus parse error: {0}")]
    CorpusParse(#[from] serde_json::Error),
}
