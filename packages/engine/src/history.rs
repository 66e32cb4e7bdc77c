//! # Undo/Redo History
//!
//! Records operation batches produced by the model and replays their inverses.
//!
//! ## Design
//!
//! - Operations flagged `undoable` (produced under a loading card) are dropped
//! - Adjacent cancelling pairs collapse, also across the previous entry's tail;
//!   an entry that collapses to nothing is removed
//! - Undo applies the reversed inverses; redo re-applies the entry
//! - New input clears the redo stack
//! - `begin_batch`/`end_batch` group several batches into one undo step
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut history = History::new();
//! let ops = model.flush(&mut surface, now);
//! history.record(&ops);
//!
//! history.undo(&mut model, &mut surface)?;
//! history.redo(&mut model, &mut surface)?;
//! ```

use crate::errors::ApplyError;
use crate::model::{ApplyReport, Model};
use crate::operation::{inverse_batch, Operation};
use crate::widgets::Source;
use scribe_surface::Surface;
use tracing::debug;

/// One undo step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryEntry {
    /// In application order
    pub operations: Vec<Operation>,
    pub description: Option<String>,
}

#[derive(Debug)]
pub struct History {
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,

    current_batch: Option<HistoryEntry>,
}

impl History {
    /// History with the default max levels (100)
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
            current_batch: None,
        }
    }

    /// Record a batch produced by the model.
    pub fn record(&mut self, operations: &[Operation]) {
        let operations: Vec<Operation> = operations
            .iter()
            .filter(|op| !op.is_undoable())
            .cloned()
            .collect();
        if operations.is_empty() {
            return;
        }

        if let Some(batch) = &mut self.current_batch {
            for op in operations {
                push_collapsing(&mut batch.operations, op);
            }
            return;
        }

        self.push_entry(HistoryEntry {
            operations,
            description: None,
        });
    }

    pub fn begin_batch(&mut self) {
        self.current_batch = Some(HistoryEntry::default());
    }

    pub fn end_batch(&mut self) {
        if let Some(batch) = self.current_batch.take() {
            if !batch.operations.is_empty() {
                self.push_entry(batch);
            }
        }
    }

    pub fn set_batch_description(&mut self, description: impl Into<String>) {
        if let Some(batch) = &mut self.current_batch {
            batch.description = Some(description.into());
        }
    }

    fn push_entry(&mut self, entry: HistoryEntry) {
        // New input invalidates the future
        self.redo_stack.clear();

        let mut operations = entry.operations.into_iter().peekable();
        while let Some(first) = operations.peek() {
            let Some(previous) = self.undo_stack.last_mut() else {
                break;
            };
            if !previous.operations.last().is_some_and(|tail| tail.is_reverse(first)) {
                break;
            }
            previous.operations.pop();
            operations.next();
            if previous.operations.is_empty() {
                self.undo_stack.pop();
            }
        }

        let mut collapsed = Vec::new();
        for op in operations {
            push_collapsing(&mut collapsed, op);
        }
        if collapsed.is_empty() {
            debug!(levels = self.undo_stack.len(), "Recorded batch cancelled out");
            return;
        }

        self.undo_stack.push(HistoryEntry {
            operations: collapsed,
            description: entry.description,
        });
        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }
    }

    /// Undo the most recent entry. `None` when there is nothing to undo.
    pub fn undo(
        &mut self,
        model: &mut Model,
        surface: &mut Surface,
    ) -> Result<Option<ApplyReport>, ApplyError> {
        let Some(entry) = self.undo_stack.pop() else {
            return Ok(None);
        };
        let report = model.apply(surface, &inverse_batch(&entry.operations), Source::Local)?;
        debug!(operations = entry.operations.len(), skipped = report.skipped.len(), "Undo");
        self.redo_stack.push(entry);
        Ok(Some(report))
    }

    /// Redo the most recently undone entry. `None` when there is nothing to redo.
    pub fn redo(
        &mut self,
        model: &mut Model,
        surface: &mut Surface,
    ) -> Result<Option<ApplyReport>, ApplyError> {
        let Some(entry) = self.redo_stack.pop() else {
            return Ok(None);
        };
        let report = model.apply(surface, &entry.operations, Source::Local)?;
        debug!(operations = entry.operations.len(), skipped = report.skipped.len(), "Redo");
        self.undo_stack.push(entry);
        Ok(Some(report))
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    /// Entry the next undo would revert.
    pub fn peek_undo(&self) -> Option<&HistoryEntry> {
        self.undo_stack.last()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack
            .last()
            .and_then(|entry| entry.description.as_deref())
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.current_batch = None;
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

fn push_collapsing(operations: &mut Vec<Operation>, op: Operation) {
    if operations.last().is_some_and(|tail| tail.is_reverse(&op)) {
        operations.pop();
    } else {
        operations.push(op);
    }
}
