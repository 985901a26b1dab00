#![forbid(unsafe_code)]

//! Thread-safe in-memory implementation of [`PlannerStore`].
//!
//! One mutex guards all tables, and every trait method acquires it
//! exactly once, so each store call is atomic with respect to every
//! other caller. That is the store-level half of the engine's
//! concurrency contract; the invoker-level half lives in
//! `itinera-undo`.
//!
//! A poisoned lock is recovered with [`PoisonError::into_inner`]: each
//! critical section either completes its whole mutation or leaves the
//! tables untouched, so the data behind a poisoned mutex is still
//! structurally consistent.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::StoreError;
use crate::model::{
    Collection, ItemDetails, ItemId, ItemKind, ItineraryItem, NewTrip, Trip, TripId, UserId,
};
use crate::store::PlannerStore;

/// Per-collection id counters. Values only ever grow.
#[derive(Debug, Default)]
struct IdCounters {
    trips: u64,
    flights: u64,
    hotels: u64,
    activities: u64,
}

impl IdCounters {
    fn slot(&mut self, collection: Collection) -> &mut u64 {
        match collection {
            Collection::Trips => &mut self.trips,
            Collection::Flights => &mut self.flights,
            Collection::Hotels => &mut self.hotels,
            Collection::Activities => &mut self.activities,
        }
    }

    /// Allocate the next id for `collection`.
    fn alloc(&mut self, collection: Collection) -> u64 {
        let slot = self.slot(collection);
        *slot += 1;
        *slot
    }

    /// Make sure future allocations stay above `id`. Used when an
    /// entity is restored under an id handed out earlier.
    fn reserve(&mut self, collection: Collection, id: u64) {
        let slot = self.slot(collection);
        *slot = (*slot).max(id);
    }
}

#[derive(Debug, Default)]
struct Tables {
    trips: BTreeMap<TripId, Trip>,
    flights: BTreeMap<ItemId, ItineraryItem>,
    hotels: BTreeMap<ItemId, ItineraryItem>,
    activities: BTreeMap<ItemId, ItineraryItem>,
    counters: IdCounters,
}

impl Tables {
    fn items(&self, kind: ItemKind) -> &BTreeMap<ItemId, ItineraryItem> {
        match kind {
            ItemKind::Flight => &self.flights,
            ItemKind::Hotel => &self.hotels,
            ItemKind::Activity => &self.activities,
        }
    }

    fn items_mut(&mut self, kind: ItemKind) -> &mut BTreeMap<ItemId, ItineraryItem> {
        match kind {
            ItemKind::Flight => &mut self.flights,
            ItemKind::Hotel => &mut self.hotels,
            ItemKind::Activity => &mut self.activities,
        }
    }

    fn share_code_taken(&self, code: &str) -> bool {
        self.trips.values().any(|trip| trip.share_code == code)
    }
}

/// In-memory [`PlannerStore`] backed by `BTreeMap` tables behind a
/// single mutex.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: Mutex<Tables>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of trips currently stored.
    #[must_use]
    pub fn trip_count(&self) -> usize {
        self.lock().trips.len()
    }

    /// Number of items of `kind` currently stored.
    #[must_use]
    pub fn item_count(&self, kind: ItemKind) -> usize {
        self.lock().items(kind).len()
    }
}

impl PlannerStore for InMemoryStore {
    fn next_id(&self, collection: Collection) -> u64 {
        self.lock().counters.alloc(collection)
    }

    fn insert_trip(&self, new: NewTrip) -> Result<Trip, StoreError> {
        let mut tables = self.lock();
        if tables.share_code_taken(&new.share_code) {
            return Err(StoreError::DuplicateShareCode(new.share_code));
        }
        let id = tables.counters.alloc(Collection::Trips);
        let trip = Trip {
            id,
            owner: new.owner,
            name: new.name,
            destination: new.destination,
            start_date: new.start_date,
            end_date: new.end_date,
            share_code: new.share_code,
            budget: 0.0,
            collaborators: Vec::new(),
        };
        tables.trips.insert(id, trip.clone());
        tracing::debug!(trip = id, "inserted trip");
        Ok(trip)
    }

    fn restore_trip(&self, trip: Trip) -> Result<Trip, StoreError> {
        let mut tables = self.lock();
        if tables.trips.contains_key(&trip.id) {
            return Err(StoreError::IdInUse {
                collection: Collection::Trips,
                id: trip.id,
            });
        }
        if tables.share_code_taken(&trip.share_code) {
            return Err(StoreError::DuplicateShareCode(trip.share_code));
        }
        tables.counters.reserve(Collection::Trips, trip.id);
        tables.trips.insert(trip.id, trip.clone());
        tracing::debug!(trip = trip.id, "restored trip");
        Ok(trip)
    }

    fn find_trip(&self, id: TripId) -> Option<Trip> {
        self.lock().trips.get(&id).cloned()
    }

    fn find_trip_by_share_code(&self, code: &str) -> Option<Trip> {
        self.lock()
            .trips
            .values()
            .find(|trip| trip.share_code == code)
            .cloned()
    }

    fn update_trip(&self, id: TripId, mutate: &mut dyn FnMut(&mut Trip)) -> Option<Trip> {
        let mut tables = self.lock();
        let trip = tables.trips.get_mut(&id)?;
        mutate(trip);
        Some(trip.clone())
    }

    fn delete_trip(&self, id: TripId) -> bool {
        let removed = self.lock().trips.remove(&id).is_some();
        if removed {
            tracing::debug!(trip = id, "deleted trip");
        }
        removed
    }

    fn add_collaborator(&self, trip: TripId, user: UserId) -> Result<Trip, StoreError> {
        let mut tables = self.lock();
        let entry = tables
            .trips
            .get_mut(&trip)
            .ok_or(StoreError::TripNotFound(trip))?;
        if entry.owner == user {
            return Err(StoreError::OwnerCollaborator { trip, user });
        }
        if entry.collaborators.contains(&user) {
            return Err(StoreError::AlreadyCollaborator { trip, user });
        }
        entry.collaborators.push(user);
        tracing::debug!(trip, user, "added collaborator");
        Ok(entry.clone())
    }

    fn remove_collaborator(&self, trip: TripId, user: UserId) -> bool {
        let mut tables = self.lock();
        let Some(entry) = tables.trips.get_mut(&trip) else {
            return false;
        };
        let before = entry.collaborators.len();
        entry.collaborators.retain(|&u| u != user);
        let removed = entry.collaborators.len() < before;
        if removed {
            tracing::debug!(trip, user, "removed collaborator");
        }
        removed
    }

    fn insert_item(
        &self,
        trip_id: TripId,
        details: ItemDetails,
    ) -> Result<ItineraryItem, StoreError> {
        let mut tables = self.lock();
        if !tables.trips.contains_key(&trip_id) {
            return Err(StoreError::TripNotFound(trip_id));
        }
        let kind = details.kind();
        let id = tables.counters.alloc(kind.into());
        let item = ItineraryItem {
            id,
            trip_id,
            is_done: false,
            details,
        };
        tables.items_mut(kind).insert(id, item.clone());
        tracing::debug!(%kind, item = id, trip = trip_id, "inserted item");
        Ok(item)
    }

    fn restore_item(&self, item: ItineraryItem) -> Result<ItineraryItem, StoreError> {
        let mut tables = self.lock();
        let kind = item.kind();
        if tables.items(kind).contains_key(&item.id) {
            return Err(StoreError::IdInUse {
                collection: kind.into(),
                id: item.id,
            });
        }
        if !tables.trips.contains_key(&item.trip_id) {
            return Err(StoreError::TripNotFound(item.trip_id));
        }
        tables.counters.reserve(kind.into(), item.id);
        tables.items_mut(kind).insert(item.id, item.clone());
        tracing::debug!(%kind, item = item.id, "restored item");
        Ok(item)
    }

    fn find_item(&self, kind: ItemKind, id: ItemId) -> Option<ItineraryItem> {
        self.lock().items(kind).get(&id).cloned()
    }

    fn update_item(
        &self,
        kind: ItemKind,
        id: ItemId,
        mutate: &mut dyn FnMut(&mut ItineraryItem),
    ) -> Option<ItineraryItem> {
        let mut tables = self.lock();
        let item = tables.items_mut(kind).get_mut(&id)?;
        mutate(item);
        Some(item.clone())
    }

    fn delete_item(&self, kind: ItemKind, id: ItemId) -> bool {
        let removed = self.lock().items_mut(kind).remove(&id).is_some();
        if removed {
            tracing::debug!(%kind, item = id, "deleted item");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn new_trip(share_code: &str) -> NewTrip {
        NewTrip {
            owner: 1,
            name: "Summer break".into(),
            destination: "Lisbon".into(),
            start_date: date(2026, 7, 1),
            end_date: date(2026, 7, 14),
            share_code: share_code.into(),
        }
    }

    fn flight() -> ItemDetails {
        ItemDetails::Flight {
            company: "AA".into(),
            code: "AA1".into(),
            departure: "GRU 08:00".into(),
            arrival: "JFK 16:30".into(),
        }
    }

    #[test]
    fn insert_assigns_sequential_ids() {
        let store = InMemoryStore::new();
        let a = store.insert_trip(new_trip("a")).unwrap();
        let b = store.insert_trip(new_trip("b")).unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(a.budget, 0.0);
        assert!(a.collaborators.is_empty());
    }

    #[test]
    fn duplicate_share_code_rejected() {
        let store = InMemoryStore::new();
        store.insert_trip(new_trip("code")).unwrap();
        let err = store.insert_trip(new_trip("code")).unwrap_err();
        assert_eq!(err, StoreError::DuplicateShareCode("code".into()));
        assert_eq!(store.trip_count(), 1);
    }

    #[test]
    fn ids_not_reused_after_delete() {
        let store = InMemoryStore::new();
        let a = store.insert_trip(new_trip("a")).unwrap();
        assert!(store.delete_trip(a.id));
        let b = store.insert_trip(new_trip("b")).unwrap();
        assert_eq!(b.id, 2);
    }

    #[test]
    fn restore_trip_keeps_id_and_counter_monotonic() {
        let store = InMemoryStore::new();
        let trip = store.insert_trip(new_trip("a")).unwrap();
        assert!(store.delete_trip(trip.id));
        let restored = store.restore_trip(trip.clone()).unwrap();
        assert_eq!(restored.id, trip.id);
        // Counter must not step back onto the restored id.
        let next = store.insert_trip(new_trip("b")).unwrap();
        assert!(next.id > restored.id);
    }

    #[test]
    fn restore_trip_rejects_occupied_id() {
        let store = InMemoryStore::new();
        let trip = store.insert_trip(new_trip("a")).unwrap();
        let err = store.restore_trip(trip).unwrap_err();
        assert!(matches!(err, StoreError::IdInUse { .. }));
    }

    #[test]
    fn update_trip_applies_mutator() {
        let store = InMemoryStore::new();
        let trip = store.insert_trip(new_trip("a")).unwrap();
        let updated = store.update_budget(trip.id, 1500.0).unwrap();
        assert_eq!(updated.budget, 1500.0);
        assert_eq!(store.find_trip(trip.id).unwrap().budget, 1500.0);
        assert!(store.update_budget(999, 1.0).is_none());
    }

    #[test]
    fn collaborator_rules() {
        let store = InMemoryStore::new();
        let trip = store.insert_trip(new_trip("a")).unwrap();

        let updated = store.add_collaborator(trip.id, 9).unwrap();
        assert_eq!(updated.collaborators, vec![9]);

        let err = store.add_collaborator(trip.id, 9).unwrap_err();
        assert_eq!(err, StoreError::AlreadyCollaborator { trip: trip.id, user: 9 });

        let err = store.add_collaborator(trip.id, trip.owner).unwrap_err();
        assert_eq!(
            err,
            StoreError::OwnerCollaborator { trip: trip.id, user: trip.owner }
        );

        assert!(store.remove_collaborator(trip.id, 9));
        assert!(!store.remove_collaborator(trip.id, 9));
    }

    #[test]
    fn insert_item_requires_trip() {
        let store = InMemoryStore::new();
        let err = store.insert_item(7, flight()).unwrap_err();
        assert_eq!(err, StoreError::TripNotFound(7));
    }

    #[test]
    fn item_lifecycle() {
        let store = InMemoryStore::new();
        let trip = store.insert_trip(new_trip("a")).unwrap();
        let item = store.insert_item(trip.id, flight()).unwrap();
        assert_eq!(item.id, 1);
        assert!(!item.is_done);

        let done = store.set_item_done(ItemKind::Flight, item.id, true).unwrap();
        assert!(done.is_done);

        assert!(store.delete_item(ItemKind::Flight, item.id));
        assert!(store.find_item(ItemKind::Flight, item.id).is_none());
        assert!(!store.delete_item(ItemKind::Flight, item.id));
    }

    #[test]
    fn item_id_spaces_are_per_kind() {
        let store = InMemoryStore::new();
        let trip = store.insert_trip(new_trip("a")).unwrap();
        let f = store.insert_item(trip.id, flight()).unwrap();
        let h = store
            .insert_item(
                trip.id,
                ItemDetails::Hotel {
                    name: "Grand".into(),
                    checkin: date(2026, 7, 1),
                    checkout: date(2026, 7, 3),
                },
            )
            .unwrap();
        // Separate collections, separate counters.
        assert_eq!(f.id, 1);
        assert_eq!(h.id, 1);
    }

    #[test]
    fn next_id_is_an_allocator() {
        let store = InMemoryStore::new();
        assert_eq!(store.next_id(Collection::Trips), 1);
        assert_eq!(store.next_id(Collection::Trips), 2);
        // Allocations burn ids for later inserts too.
        let trip = store.insert_trip(new_trip("a")).unwrap();
        assert_eq!(trip.id, 3);
    }

    #[test]
    fn find_by_share_code() {
        let store = InMemoryStore::new();
        let trip = store.insert_trip(new_trip("xyz")).unwrap();
        assert_eq!(store.find_trip_by_share_code("xyz").unwrap().id, trip.id);
        assert!(store.find_trip_by_share_code("nope").is_none());
    }
}
