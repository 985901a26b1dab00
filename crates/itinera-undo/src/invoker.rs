#![forbid(unsafe_code)]

//! The facade calling code drives the engine through.
//!
//! An [`Invoker`] owns exactly one [`CommandHistory`] behind a mutex;
//! `execute`, `undo`, `redo`, and every introspection call run inside
//! that single critical section, because each of them reads and then
//! writes the cursor and the entry sequence. The store has its own
//! lock — an invoker only orders its *own* history, it does not
//! isolate concurrent invokers mutating the same entities.
//!
//! A poisoned lock is recovered with [`PoisonError::into_inner`]; every
//! history operation leaves the sequence and cursor consistent.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::command::{CommandOutput, CommandReport, UndoableCmd};
use crate::error::EngineError;
use crate::history::{CommandHistory, HistoryConfig, HistoryStats};

/// Executes commands and maintains their bounded undo/redo history.
#[derive(Debug, Default)]
pub struct Invoker {
    history: Mutex<CommandHistory>,
}

impl Invoker {
    #[must_use]
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            history: Mutex::new(CommandHistory::new(config)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CommandHistory> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run a command and, on success, record it at the head of history.
    ///
    /// The stale redo branch is discarded before the command runs, so
    /// new work supersedes undone entries whether or not it succeeds.
    /// Failed commands are never recorded.
    pub fn execute(&self, mut cmd: Box<dyn UndoableCmd>) -> Result<CommandOutput, EngineError> {
        let mut history = self.lock();
        history.prune_redo();
        let kind = cmd.kind();
        match cmd.execute() {
            Ok(output) => {
                history.record(cmd);
                tracing::debug!(%kind, len = history.len(), "executed command");
                Ok(output)
            }
            Err(err) => {
                tracing::warn!(%kind, error = %err, "command failed; not recorded");
                Err(err)
            }
        }
    }

    /// Undo the last applied command. Returns whether anything changed.
    pub fn undo(&self) -> bool {
        let mut history = self.lock();
        match history.undo() {
            Ok(()) => {
                tracing::debug!(cursor = ?history.cursor(), "undid command");
                true
            }
            Err(err) => {
                tracing::debug!(error = %err, "undo unavailable");
                false
            }
        }
    }

    /// Redo the next undone command. Returns whether anything changed.
    pub fn redo(&self) -> bool {
        let mut history = self.lock();
        match history.redo() {
            Ok(()) => {
                tracing::debug!(cursor = ?history.cursor(), "redid command");
                true
            }
            Err(err) => {
                tracing::debug!(error = %err, "redo unavailable");
                false
            }
        }
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.lock().can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.lock().can_redo()
    }

    /// Descriptions of every history entry, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<CommandReport> {
        self.lock().reports(0, None)
    }

    /// Descriptions of entries in `[start, end)`; `None` means "to the
    /// end". Out-of-range bounds are clamped.
    #[must_use]
    pub fn history_range(&self, start: usize, end: Option<usize>) -> Vec<CommandReport> {
        self.lock().reports(start, end)
    }

    /// Aggregate counts, derived from the entries on every call.
    #[must_use]
    pub fn statistics(&self) -> HistoryStats {
        self.lock().stats()
    }

    /// Drop the entire history. Applied effects stay in the store.
    pub fn clear_history(&self) {
        self.lock().clear();
        tracing::debug!("cleared command history");
    }
}
