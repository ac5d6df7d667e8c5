//! Keyboard-driven selection over streamed search results.
//!
//! Two states: `Idle` (no visible list) and `Listing` (results shown,
//! arrows navigate, Enter commits). Everything that isn't navigation or
//! commit — horizontal arrows, Escape, blur, click, any unhandled
//! buffer-altering keystroke — cancels back to `Idle` and discards the
//! session's results. Weight adjustment is deliberately not here: it
//! operates on the buffer regardless of listing state (see `weight`).

use crate::interface::Applied;
use crate::query::Query;
use crate::search::{ResultBatch, ScoredTerm};
use std::ops::Range;

/// Keyboard/focus events the controller understands. `Other` stands for any
/// buffer-altering keystroke the host didn't map elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Enter,
    Escape,
    Blur,
    Click,
    Other,
}

/// What the host should do with the event it forwarded.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyOutcome {
    /// Controller was idle; the host handles the key normally.
    Ignored,
    /// Event consumed (navigation); suppress the host's default handling.
    Consumed,
    /// List dismissed; the event may still be handled by the host.
    Cancelled,
    /// A term was committed; apply the buffer edit.
    Committed(Applied),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Listing,
}

/// Selection state machine. The cursor is `None` for the "no selection"
/// sentinel; navigation cycles through `[None, 0, 1, ..., n-1]`.
#[derive(Debug)]
pub struct SelectionController {
    max_visible: usize,
    state: State,
    cursor: Option<usize>,
    items: Vec<ScoredTerm>,
    query: Option<Query>,
    generation: u64,
    /// Highest generation dismissed via `cancel`; its batches stay dropped.
    retired: u64,
}

impl SelectionController {
    pub fn new(max_visible: usize) -> Self {
        Self {
            max_visible,
            state: State::Idle,
            cursor: None,
            items: Vec::new(),
            query: None,
            generation: 0,
            retired: 0,
        }
    }

    pub fn is_listing(&self) -> bool {
        self.state == State::Listing
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn items(&self) -> &[ScoredTerm] {
        &self.items
    }

    /// Consume a result batch. A batch from a newer generation resets the
    /// list for the new session; a batch older than the current generation,
    /// or from a generation dismissed via `cancel`, is stale and must be
    /// dropped unconsumed.
    pub fn feed(&mut self, query: &Query, batch: &ResultBatch) {
        if batch.generation <= self.retired || batch.generation < self.generation {
            return;
        }
        if batch.generation > self.generation {
            self.generation = batch.generation;
            self.items.clear();
            self.cursor = None;
            self.query = Some(query.clone());
        }
        self.items.extend(batch.new_results.iter().cloned());
        // Listing requires at least one result; an empty list (a newer
        // session that has matched nothing yet) shows no panel.
        self.state = if self.items.is_empty() { State::Idle } else { State::Listing };
    }

    /// Feed one keyboard/focus event through the state machine.
    pub fn on_key(&mut self, key: KeyEvent) -> KeyOutcome {
        if self.state != State::Listing {
            return KeyOutcome::Ignored;
        }

        match key {
            KeyEvent::ArrowDown => {
                self.cursor = match self.cursor {
                    None => Some(0),
                    Some(i) if i + 1 < self.items.len() => Some(i + 1),
                    Some(_) => None,
                };
                KeyOutcome::Consumed
            }
            KeyEvent::ArrowUp => {
                self.cursor = match self.cursor {
                    None => Some(self.items.len() - 1),
                    Some(0) => None,
                    Some(i) => Some(i - 1),
                };
                KeyOutcome::Consumed
            }
            KeyEvent::Enter => {
                let outcome = match (self.cursor, &self.query) {
                    (Some(i), Some(query)) => {
                        KeyOutcome::Committed(query.splice(&self.items[i].term.value))
                    }
                    // Sentinel cursor: nothing to commit, just close.
                    _ => KeyOutcome::Cancelled,
                };
                self.cancel();
                outcome
            }
            KeyEvent::ArrowLeft
            | KeyEvent::ArrowRight
            | KeyEvent::Escape
            | KeyEvent::Blur
            | KeyEvent::Click
            | KeyEvent::Other => {
                self.cancel();
                KeyOutcome::Cancelled
            }
        }
    }

    /// Dismiss the list and discard the session's results. The session's
    /// generation is retired: later batches it still produces are dropped.
    pub fn cancel(&mut self) {
        self.retired = self.generation;
        self.state = State::Idle;
        self.cursor = None;
        self.items.clear();
        self.query = None;
    }

    /// The window of items the host should render, centered on the cursor.
    pub fn visible_range(&self) -> Range<usize> {
        let len = self.items.len();
        let idx = self.cursor.unwrap_or(0);
        let mut min = idx.saturating_sub(self.max_visible / 2);
        let max = (min + self.max_visible).min(len);
        if max - min < self.max_visible {
            min = max.saturating_sub(self.max_visible);
        }
        min..max
    }
}
