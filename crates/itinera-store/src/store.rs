#![forbid(unsafe_code)]

//! The receiver contract the command engine drives.
//!
//! Commands never touch entity collections directly; they hold an
//! `Arc<dyn PlannerStore>` and perform every mutation through one of
//! these methods. Each method is a single atomic read-modify-write:
//! implementations must not expose intermediate states to concurrent
//! callers, because a command relies on "one call, one reversible
//! effect" to keep its captured inverse honest.
//!
//! # Id discipline
//!
//! Ids are allocated per collection, monotonically increasing, and
//! never reused — not even after a delete. This is what makes the
//! `restore_*` operations safe: an entity undone out of the store can
//! be re-inserted under its original id without colliding with ids
//! handed out in the meantime.

use crate::error::StoreError;
use crate::model::{
    Collection, ItemDetails, ItemId, ItemKind, ItineraryItem, NewTrip, Trip, TripId, UserId,
};

/// Mutable entity store the command engine operates on.
///
/// Object-safe so commands can hold it as a trait object. All methods
/// take `&self`; implementations use interior mutability and their own
/// locking (see [`InMemoryStore`](crate::memory::InMemoryStore)).
pub trait PlannerStore: Send + Sync {
    /// Allocate the next id for `collection`. Monotonically increasing,
    /// never reused even after deletions.
    fn next_id(&self, collection: Collection) -> u64;

    // --- Trips ---

    /// Insert a new trip, assigning its id. Fails with
    /// [`StoreError::DuplicateShareCode`] when the share code is taken.
    fn insert_trip(&self, new: NewTrip) -> Result<Trip, StoreError>;

    /// Re-insert a trip under its previously assigned id. Fails when the
    /// id slot or the share code is occupied.
    fn restore_trip(&self, trip: Trip) -> Result<Trip, StoreError>;

    fn find_trip(&self, id: TripId) -> Option<Trip>;

    fn find_trip_by_share_code(&self, code: &str) -> Option<Trip>;

    /// Apply `mutate` to the trip and return the updated copy, or `None`
    /// when the trip is absent. The mutation runs under the store lock.
    fn update_trip(&self, id: TripId, mutate: &mut dyn FnMut(&mut Trip)) -> Option<Trip>;

    /// Remove the trip. Returns whether it was present.
    fn delete_trip(&self, id: TripId) -> bool;

    /// Set the trip's budget and return the updated copy.
    fn update_budget(&self, id: TripId, budget: f64) -> Option<Trip> {
        self.update_trip(id, &mut |trip| trip.budget = budget)
    }

    /// Add `user` to the trip's collaborator list. Fails (never a silent
    /// no-op) when the user is already a collaborator or owns the trip.
    fn add_collaborator(&self, trip: TripId, user: UserId) -> Result<Trip, StoreError>;

    /// Remove `user` from the trip's collaborator list. Returns whether
    /// the user was present.
    fn remove_collaborator(&self, trip: TripId, user: UserId) -> bool;

    // --- Itinerary items ---

    /// Insert a new item under `trip_id`, assigning its id within the
    /// kind's collection. Fails with [`StoreError::TripNotFound`] when
    /// the parent trip is absent.
    fn insert_item(&self, trip_id: TripId, details: ItemDetails)
    -> Result<ItineraryItem, StoreError>;

    /// Re-insert an item under its previously assigned id.
    fn restore_item(&self, item: ItineraryItem) -> Result<ItineraryItem, StoreError>;

    fn find_item(&self, kind: ItemKind, id: ItemId) -> Option<ItineraryItem>;

    /// Apply `mutate` to the item and return the updated copy, or `None`
    /// when the item is absent.
    fn update_item(
        &self,
        kind: ItemKind,
        id: ItemId,
        mutate: &mut dyn FnMut(&mut ItineraryItem),
    ) -> Option<ItineraryItem>;

    /// Remove the item. Returns whether it was present.
    fn delete_item(&self, kind: ItemKind, id: ItemId) -> bool;

    /// Set the item's completion flag and return the updated copy.
    fn set_item_done(&self, kind: ItemKind, id: ItemId, done: bool) -> Option<ItineraryItem> {
        self.update_item(kind, id, &mut |item| item.is_done = done)
    }
}
