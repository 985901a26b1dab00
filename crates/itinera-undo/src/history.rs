#![forbid(unsafe_code)]

//! Bounded command history with linear undo/redo.
//!
//! A single ordered sequence of executed commands plus a cursor marking
//! the last applied entry. Entries at or before the cursor are active;
//! entries after it are redoable until new work prunes them.
//!
//! # Invariants
//!
//! 1. `entries.len() <= config.max_entries` after any operation.
//! 2. `cursor` is `None` or a valid index into `entries`.
//! 3. Entries are appended only in the `Executed` status; failed
//!    executes never enter the history.
//! 4. Exactly one redo branch: recording a new command discards every
//!    entry past the cursor first.
//!
//! ```text
//! record(D) with cursor at B
//! ┌──────────────────────────────┐     ┌──────────────────────────┐
//! │ [A] [B] [C₁] [C₂]            │ ──► │ [A] [B] [D]              │
//! │      ▲   (redoable)          │     │          ▲               │
//! │    cursor                    │     │        cursor            │
//! └──────────────────────────────┘     └──────────────────────────┘
//! ```
//!
//! Commands are stored in a `VecDeque` so eviction from the front is
//! O(1); the cursor is renormalized on every eviction.

use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::fmt;

use serde::Serialize;

use crate::command::{CommandKind, CommandReport, CommandStatus, UndoableCmd};
use crate::error::EngineError;

/// Configuration for the command history.
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Maximum number of entries to retain. Oldest entries are evicted
    /// when the limit is exceeded.
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_entries: 100 }
    }
}

impl HistoryConfig {
    /// Create a configuration with a custom entry limit.
    #[must_use]
    pub const fn new(max_entries: usize) -> Self {
        Self { max_entries }
    }

    /// Create an unlimited configuration (for testing).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_entries: usize::MAX,
        }
    }
}

/// Counts derived from the history on demand. No running counters are
/// stored, so the numbers cannot drift from the entries themselves.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct HistoryStats {
    pub total: usize,
    pub executed: usize,
    pub undone: usize,
    pub failed: usize,
    pub by_kind: BTreeMap<CommandKind, usize>,
}

/// Ordered, bounded sequence of executed commands plus the cursor.
///
/// Not synchronized on its own; the [`Invoker`](crate::invoker::Invoker)
/// wraps it in a mutex and serializes all access.
pub struct CommandHistory {
    entries: VecDeque<Box<dyn UndoableCmd>>,
    /// Index of the last applied entry; `None` when nothing is applied.
    cursor: Option<usize>,
    config: HistoryConfig,
}

impl fmt::Debug for CommandHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandHistory")
            .field("entries", &self.entries.len())
            .field("cursor", &self.cursor)
            .field("max_entries", &self.config.max_entries)
            .finish()
    }
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl CommandHistory {
    #[must_use]
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: None,
            config,
        }
    }

    // ========================================================================
    // Core operations
    // ========================================================================

    /// Discard every entry past the cursor (the stale redo branch).
    ///
    /// Runs before each execute, so the branch is pruned even when the
    /// new command then fails.
    pub fn prune_redo(&mut self) {
        let keep = self.cursor.map_or(0, |c| c + 1);
        if self.entries.len() > keep {
            let dropped = self.entries.len() - keep;
            self.entries.truncate(keep);
            tracing::debug!(dropped, "pruned redo branch");
        }
    }

    /// Append an executed command and advance the cursor to it,
    /// evicting the oldest entry when the bound is exceeded.
    ///
    /// The caller must have already run the command; only `Executed`
    /// commands belong in history.
    pub fn record(&mut self, cmd: Box<dyn UndoableCmd>) {
        debug_assert_eq!(cmd.state().status(), CommandStatus::Executed);
        self.entries.push_back(cmd);
        self.cursor = Some(self.entries.len() - 1);

        while self.entries.len() > self.config.max_entries {
            self.entries.pop_front();
            // Preserve the cursor's relative position. The cursor sits
            // at the freshly recorded tail here, so it never underflows
            // unless max_entries is zero.
            self.cursor = self.cursor.and_then(|c| c.checked_sub(1));
            tracing::debug!(len = self.entries.len(), "evicted oldest history entry");
        }
    }

    /// Undo the entry at the cursor. Moves the cursor left only on
    /// success.
    pub fn undo(&mut self) -> Result<(), EngineError> {
        let Some(index) = self.cursor else {
            return Err(EngineError::HistoryExhausted { action: "undo" });
        };
        let cmd = &mut self.entries[index];
        if cmd.state().status() != CommandStatus::Executed {
            return Err(EngineError::InvalidState(format!(
                "entry at cursor is {}, not executed",
                cmd.state().status()
            )));
        }
        cmd.undo()?;
        self.cursor = index.checked_sub(1);
        Ok(())
    }

    /// Redo the entry just past the cursor by re-invoking its execute
    /// semantics. Moves the cursor right only on success; a failed redo
    /// leaves the entry `Failed` at `cursor + 1`, blocking further redo.
    pub fn redo(&mut self) -> Result<(), EngineError> {
        let index = self.cursor.map_or(0, |c| c + 1);
        if index >= self.entries.len() {
            return Err(EngineError::HistoryExhausted { action: "redo" });
        }
        self.entries[index].execute()?;
        self.cursor = Some(index);
        Ok(())
    }

    /// Whether there is an applied entry to undo.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor.is_some()
    }

    /// Whether there is a redoable entry past the cursor.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor.map_or(0, |c| c + 1) < self.entries.len()
    }

    /// Drop all entries and reset the cursor.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Descriptions of entries in `[start, end)`, clamped to the
    /// current length. `end = None` means "to the end".
    #[must_use]
    pub fn reports(&self, start: usize, end: Option<usize>) -> Vec<CommandReport> {
        let end = end.unwrap_or(self.entries.len()).min(self.entries.len());
        if start >= end {
            return Vec::new();
        }
        self.entries
            .iter()
            .skip(start)
            .take(end - start)
            .map(|cmd| cmd.describe())
            .collect()
    }

    /// Aggregate counts over the current entries.
    #[must_use]
    pub fn stats(&self) -> HistoryStats {
        let mut stats = HistoryStats {
            total: self.entries.len(),
            ..HistoryStats::default()
        };
        for cmd in &self.entries {
            match cmd.state().status() {
                CommandStatus::Executed => stats.executed += 1,
                CommandStatus::Undone => stats.undone += 1,
                CommandStatus::Failed => stats.failed += 1,
                CommandStatus::Pending => {}
            }
            *stats.by_kind.entry(cmd.kind()).or_insert(0) += 1;
        }
        stats
    }
}
