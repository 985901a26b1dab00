#![forbid(unsafe_code)]

//! Undoable command execution engine for the Itinera backend.
//!
//! Turns mutations against a shared [`PlannerStore`] into reversible,
//! replayable units with a bounded history and linear undo/redo
//! semantics.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Invoker                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │ CommandHistory (Mutex)                                 │  │
//! │  │  entries: [cmd0] [cmd1] [cmd2] [cmd3]                  │  │
//! │  │                          ▲                             │  │
//! │  │                        cursor                          │  │
//! │  │  ◄── undo: cursor left    redo: cursor right ──►       │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//!          │ execute / revert (one atomic store call each)
//!          ▼
//!   Arc<dyn PlannerStore>  (trips, flights, hotels, activities)
//! ```
//!
//! Entries up to the cursor are applied; entries past it are redoable
//! until a new command prunes them (no undo tree, one linear branch).
//!
//! # Module Structure
//!
//! - [`command`]: the [`UndoableCmd`] trait, command lifecycle state,
//!   and introspection reports
//! - [`commands`]: one flat struct per mutation kind
//! - [`history`]: bounded entry sequence, cursor arithmetic, statistics
//! - [`invoker`]: the facade calling code talks to
//! - [`error`]: the engine's failure taxonomy
//!
//! # Design Notes
//!
//! ## Why commands own an `Arc` of the store
//!
//! Commands outlive the call that created them — they sit in history
//! waiting to be undone or redone — so they cannot borrow the store.
//! Each variant holds an `Arc<dyn PlannerStore>` bound at construction,
//! which keeps commands `Send + Sync` and storable as trait objects.
//!
//! ## Redo re-inserts the captured result
//!
//! Redo does not blindly re-run id-allocating inserts: `CreateTripCmd`
//! and `AddItemCmd` keep the entity produced by the first execute and
//! restore it verbatim (same id, same fields) through the store's
//! `restore_*` operations. A redo whose slot has since been taken fails
//! and marks the command `Failed`, which blocks further redo past it.

pub mod command;
pub mod commands;
pub mod error;
pub mod history;
pub mod invoker;

pub use command::{CommandKind, CommandOutput, CommandReport, CommandState, CommandStatus, UndoableCmd};
pub use commands::{
    AddCollaboratorCmd, AddItemCmd, CreateTripCmd, UpdateBudgetCmd, UpdateItemStatusCmd,
};
pub use error::EngineError;
pub use history::{CommandHistory, HistoryConfig, HistoryStats};
pub use invoker::Invoker;
