#![forbid(unsafe_code)]

//! The [`UndoableCmd`] trait and the lifecycle state every command
//! variant carries.
//!
//! A command is a single reversible unit of work bound at construction
//! to a receiver and a payload. Variants implement only the two
//! store-facing halves — [`apply`](UndoableCmd::apply) (forward
//! mutation, capturing the inverse first) and
//! [`revert`](UndoableCmd::revert) (inverse mutation) — while the
//! status bookkeeping lives once in the trait's provided
//! [`execute`](UndoableCmd::execute) and [`undo`](UndoableCmd::undo).
//!
//! # Lifecycle
//!
//! ```text
//!             execute ok                undo ok
//!  Pending ──────────────► Executed ◄──────────── ┐
//!     │                      │   ▲                │
//!     │ execute err          │   │ redo ok        │
//!     ▼                undo  │   │                │
//!  Failed ◄── redo err ── Undone ┘ ───────────────┘
//! ```
//!
//! - `execute` is valid from `Pending` (first run) and `Undone` (redo).
//! - A failed `undo` leaves the command `Executed` with the error
//!   recorded, so the history cursor does not move.
//! - A failed redo is terminal: the command becomes `Failed` and blocks
//!   further redo past its history position.
//! - The captured inverse is set iff the command has ever reached
//!   `Executed`, and is never cleared — undo stays possible after redo.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use itinera_store::{ItineraryItem, Trip};

use crate::error::EngineError;

/// Tag identifying a mutation kind. Closed set; statistics and history
/// reports group by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    CreateTrip,
    UpdateBudget,
    AddCollaborator,
    AddFlight,
    AddHotel,
    AddActivity,
    UpdateItemStatus,
}

impl CommandKind {
    /// Stable name used in reports and log fields.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CreateTrip => "create_trip",
            Self::UpdateBudget => "update_budget",
            Self::AddCollaborator => "add_collaborator",
            Self::AddFlight => "add_flight",
            Self::AddHotel => "add_hotel",
            Self::AddActivity => "add_activity",
            Self::UpdateItemStatus => "update_item_status",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle state of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    /// Constructed, never run.
    #[default]
    Pending,
    /// Forward effect applied; undoable.
    Executed,
    /// Inverse applied; redoable.
    Undone,
    /// Execute (or redo) failed. Terminal.
    Failed,
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Executed => "executed",
            Self::Undone => "undone",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Forward representation of the entity a successful execute produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandOutput {
    Trip(Trip),
    Item(ItineraryItem),
}

/// Bookkeeping shared by every command variant: status, timestamps,
/// last result, last error. Variants embed one of these and expose it
/// through [`UndoableCmd::state`].
#[derive(Debug, Clone, Default)]
pub struct CommandState {
    pub(crate) status: CommandStatus,
    pub(crate) executed_at: Option<DateTime<Utc>>,
    pub(crate) undone_at: Option<DateTime<Utc>>,
    pub(crate) result: Option<CommandOutput>,
    pub(crate) error: Option<EngineError>,
}

impl CommandState {
    #[must_use]
    pub fn status(&self) -> CommandStatus {
        self.status
    }

    /// Result of the most recent successful execute.
    #[must_use]
    pub fn result(&self) -> Option<&CommandOutput> {
        self.result.as_ref()
    }

    /// Last recorded error, if any. Also set by a failed undo that left
    /// the status at `Executed`.
    #[must_use]
    pub fn error(&self) -> Option<&EngineError> {
        self.error.as_ref()
    }

    #[must_use]
    pub fn executed_at(&self) -> Option<DateTime<Utc>> {
        self.executed_at
    }

    #[must_use]
    pub fn undone_at(&self) -> Option<DateTime<Utc>> {
        self.undone_at
    }
}

/// Read-only description of a command for history listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandReport {
    pub kind: CommandKind,
    pub status: CommandStatus,
    pub executed_at: Option<DateTime<Utc>>,
    pub undone_at: Option<DateTime<Utc>>,
    /// Input parameters supplied at construction time.
    pub payload: serde_json::Value,
    pub error: Option<String>,
}

/// A reversible unit of work against the planner store.
///
/// Implementations provide the store-facing halves (`apply`/`revert`);
/// the lifecycle transitions are implemented once here. `apply` must
/// capture the inverse *before* mutating and must leave the store
/// unmodified on failure — each attempt is a single atomic store call.
pub trait UndoableCmd: Send + Sync {
    /// Mutation kind tag.
    fn kind(&self) -> CommandKind;

    /// Summary of the construction-time payload for reports. Input
    /// parameters only, never captured or derived state.
    fn payload(&self) -> serde_json::Value;

    fn state(&self) -> &CommandState;

    fn state_mut(&mut self) -> &mut CommandState;

    /// Forward mutation. On the redo path (`Undone` status) variants
    /// with captured results re-insert them instead of re-allocating.
    fn apply(&mut self) -> Result<CommandOutput, EngineError>;

    /// Inverse mutation using the captured state.
    fn revert(&mut self) -> Result<(), EngineError>;

    /// Run the forward mutation and record the lifecycle transition.
    ///
    /// Valid from `Pending` and `Undone`. On failure from either state
    /// the command becomes `Failed` (terminal) and the store is left
    /// untouched by contract of [`apply`](Self::apply).
    fn execute(&mut self) -> Result<CommandOutput, EngineError> {
        match self.state().status {
            CommandStatus::Pending | CommandStatus::Undone => {}
            status => {
                return Err(EngineError::InvalidState(format!(
                    "cannot execute a {status} command"
                )));
            }
        }
        match self.apply() {
            Ok(output) => {
                let state = self.state_mut();
                state.status = CommandStatus::Executed;
                state.executed_at = Some(Utc::now());
                state.result = Some(output.clone());
                state.error = None;
                Ok(output)
            }
            Err(err) => {
                let state = self.state_mut();
                state.status = CommandStatus::Failed;
                state.error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Apply the inverse. Valid only while `Executed`.
    ///
    /// On failure the status stays `Executed` and the error is
    /// recorded; a failed undo is assumed to have had no side effects.
    fn undo(&mut self) -> Result<(), EngineError> {
        if self.state().status != CommandStatus::Executed {
            return Err(EngineError::InvalidState(format!(
                "cannot undo a {} command",
                self.state().status
            )));
        }
        match self.revert() {
            Ok(()) => {
                let state = self.state_mut();
                state.status = CommandStatus::Undone;
                state.undone_at = Some(Utc::now());
                Ok(())
            }
            Err(err) => {
                self.state_mut().error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Whether the command is currently undoable.
    fn can_undo(&self) -> bool {
        self.state().status == CommandStatus::Executed
    }

    /// Read-only introspection; no side effects.
    fn describe(&self) -> CommandReport {
        let state = self.state();
        CommandReport {
            kind: self.kind(),
            status: state.status,
            executed_at: state.executed_at,
            undone_at: state.undone_at,
            payload: self.payload(),
            error: state.error.as_ref().map(EngineError::to_string),
        }
    }
}

impl fmt::Debug for dyn UndoableCmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoableCmd")
            .field("kind", &self.kind().label())
            .field("status", &self.state().status)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scriptable command for exercising the lifecycle without a store.
    struct ProbeCmd {
        state: CommandState,
        apply_ok: bool,
        revert_ok: bool,
        applies: u32,
        reverts: u32,
    }

    impl ProbeCmd {
        fn new(apply_ok: bool, revert_ok: bool) -> Self {
            Self {
                state: CommandState::default(),
                apply_ok,
                revert_ok,
                applies: 0,
                reverts: 0,
            }
        }

        fn output() -> CommandOutput {
            CommandOutput::Trip(Trip {
                id: 1,
                owner: 1,
                name: "t".into(),
                destination: "d".into(),
                start_date: chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                end_date: chrono::NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(),
                share_code: "s".into(),
                budget: 0.0,
                collaborators: vec![],
            })
        }
    }

    impl UndoableCmd for ProbeCmd {
        fn kind(&self) -> CommandKind {
            CommandKind::CreateTrip
        }

        fn payload(&self) -> serde_json::Value {
            serde_json::json!({})
        }

        fn state(&self) -> &CommandState {
            &self.state
        }

        fn state_mut(&mut self) -> &mut CommandState {
            &mut self.state
        }

        fn apply(&mut self) -> Result<CommandOutput, EngineError> {
            self.applies += 1;
            if self.apply_ok {
                Ok(Self::output())
            } else {
                Err(EngineError::Validation("scripted failure".into()))
            }
        }

        fn revert(&mut self) -> Result<(), EngineError> {
            self.reverts += 1;
            if self.revert_ok {
                Ok(())
            } else {
                Err(EngineError::InverseUnavailable("scripted failure".into()))
            }
        }
    }

    #[test]
    fn execute_transitions_to_executed() {
        let mut cmd = ProbeCmd::new(true, true);
        assert_eq!(cmd.state().status(), CommandStatus::Pending);
        cmd.execute().unwrap();
        assert_eq!(cmd.state().status(), CommandStatus::Executed);
        assert!(cmd.state().executed_at().is_some());
        assert!(cmd.state().result().is_some());
        assert!(cmd.can_undo());
    }

    #[test]
    fn failed_execute_is_terminal() {
        let mut cmd = ProbeCmd::new(false, true);
        cmd.execute().unwrap_err();
        assert_eq!(cmd.state().status(), CommandStatus::Failed);
        assert!(cmd.state().error().is_some());
        assert!(cmd.state().executed_at().is_none());

        // A failed command cannot run again.
        let err = cmd.execute().unwrap_err();
        assert!(matches!(err, EngineError::InvalidState(_)));
        assert_eq!(cmd.applies, 1, "apply must not run from Failed");
    }

    #[test]
    fn undo_transitions_to_undone() {
        let mut cmd = ProbeCmd::new(true, true);
        cmd.execute().unwrap();
        cmd.undo().unwrap();
        assert_eq!(cmd.state().status(), CommandStatus::Undone);
        assert!(cmd.state().undone_at().is_some());
        assert!(!cmd.can_undo());
    }

    #[test]
    fn undo_requires_executed() {
        let mut cmd = ProbeCmd::new(true, true);
        let err = cmd.undo().unwrap_err();
        assert!(matches!(err, EngineError::InvalidState(_)));
        assert_eq!(cmd.reverts, 0);
    }

    #[test]
    fn failed_undo_keeps_executed_status() {
        let mut cmd = ProbeCmd::new(true, false);
        cmd.execute().unwrap();
        cmd.undo().unwrap_err();
        assert_eq!(cmd.state().status(), CommandStatus::Executed);
        assert!(cmd.state().error().is_some());
        assert!(cmd.state().undone_at().is_none());
        // Still undoable once the external cause is fixed.
        assert!(cmd.can_undo());
    }

    #[test]
    fn redo_runs_execute_again() {
        let mut cmd = ProbeCmd::new(true, true);
        cmd.execute().unwrap();
        let first_executed_at = cmd.state().executed_at();
        cmd.undo().unwrap();
        cmd.execute().unwrap();
        assert_eq!(cmd.state().status(), CommandStatus::Executed);
        assert_eq!(cmd.applies, 2);
        // Timestamp is overwritten on redo.
        assert!(cmd.state().executed_at() >= first_executed_at);
    }

    #[test]
    fn failed_redo_is_terminal() {
        let mut cmd = ProbeCmd::new(true, true);
        cmd.execute().unwrap();
        cmd.undo().unwrap();
        cmd.apply_ok = false;
        cmd.execute().unwrap_err();
        assert_eq!(cmd.state().status(), CommandStatus::Failed);
        // The result from the first execute is retained.
        assert!(cmd.state().result().is_some());
    }

    #[test]
    fn describe_reports_payload_and_error() {
        let mut cmd = ProbeCmd::new(false, true);
        cmd.execute().unwrap_err();
        let report = cmd.describe();
        assert_eq!(report.kind, CommandKind::CreateTrip);
        assert_eq!(report.status, CommandStatus::Failed);
        assert!(report.error.unwrap().contains("scripted failure"));
    }

    #[test]
    fn kind_labels_are_stable() {
        assert_eq!(CommandKind::CreateTrip.label(), "create_trip");
        assert_eq!(CommandKind::UpdateItemStatus.to_string(), "update_item_status");
    }
}
