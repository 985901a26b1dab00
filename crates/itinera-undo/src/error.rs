#![forbid(unsafe_code)]

//! Engine failure taxonomy.
//!
//! Nothing in the engine is fatal: every failure is a returned value,
//! because one bad undo must not corrupt the rest of the session's
//! history.

use thiserror::Error;

use itinera_store::{Collection, StoreError};

/// Errors surfaced by command execution, undo/redo, and the invoker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The payload fails a business rule before any mutation (negative
    /// budget, duplicate share code, already a collaborator, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced entity is absent from the store.
    #[error("{collection} entry {id} not found")]
    NotFound { collection: Collection, id: u64 },

    /// The captured inverse no longer matches store reality; the undo
    /// or redo was not applied.
    #[error("cannot invert command: {0}")]
    InverseUnavailable(String),

    /// Undo or redo was called with nothing to apply. Produced by the
    /// invoker only; never touches any command.
    #[error("history exhausted: nothing to {action}")]
    HistoryExhausted { action: &'static str },

    /// A lifecycle method was called in a state that does not permit it
    /// (e.g. executing an already-executed command).
    #[error("invalid command state: {0}")]
    InvalidState(String),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::TripNotFound(id) => Self::NotFound {
                collection: Collection::Trips,
                id,
            },
            StoreError::ItemNotFound { kind, id } => Self::NotFound {
                collection: kind.into(),
                id,
            },
            // Business-rule rejections; the store was left unmodified.
            StoreError::DuplicateShareCode(_)
            | StoreError::AlreadyCollaborator { .. }
            | StoreError::OwnerCollaborator { .. }
            | StoreError::IdInUse { .. } => Self::Validation(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itinera_store::ItemKind;

    #[test]
    fn store_not_found_maps_to_not_found() {
        let err: EngineError = StoreError::TripNotFound(7).into();
        assert_eq!(
            err,
            EngineError::NotFound {
                collection: Collection::Trips,
                id: 7
            }
        );

        let err: EngineError = StoreError::ItemNotFound {
            kind: ItemKind::Hotel,
            id: 3,
        }
        .into();
        assert_eq!(
            err,
            EngineError::NotFound {
                collection: Collection::Hotels,
                id: 3
            }
        );
    }

    #[test]
    fn business_rules_map_to_validation() {
        let err: EngineError = StoreError::AlreadyCollaborator { trip: 3, user: 9 }.into();
        let EngineError::Validation(msg) = err else {
            panic!("expected validation error");
        };
        assert!(msg.contains("already a collaborator"));
    }
}
