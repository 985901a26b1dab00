#![forbid(unsafe_code)]

//! Store-level failure modes.

use thiserror::Error;

use crate::model::{Collection, ItemId, ItemKind, TripId, UserId};

/// Errors a [`PlannerStore`](crate::store::PlannerStore) operation can
/// return. Every variant leaves the store unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Another trip already uses this share code.
    #[error("share code '{0}' is already in use")]
    DuplicateShareCode(String),

    /// The referenced trip does not exist.
    #[error("trip {0} not found")]
    TripNotFound(TripId),

    /// The referenced itinerary item does not exist.
    #[error("{kind} {id} not found")]
    ItemNotFound { kind: ItemKind, id: ItemId },

    /// The user is already on the trip's collaborator list.
    #[error("user {user} is already a collaborator on trip {trip}")]
    AlreadyCollaborator { trip: TripId, user: UserId },

    /// The trip owner cannot be added as a collaborator.
    #[error("user {user} owns trip {trip} and cannot be added as a collaborator")]
    OwnerCollaborator { trip: TripId, user: UserId },

    /// A restore targeted an id that is already occupied.
    #[error("id {id} is already present in {collection}")]
    IdInUse { collection: Collection, id: u64 },
}
