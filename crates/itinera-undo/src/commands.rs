#![forbid(unsafe_code)]

//! Concrete command variants, one flat struct per mutation kind.
//!
//! Each variant holds its receiver (`Arc<dyn PlannerStore>`), the
//! immutable payload supplied at construction, the captured inverse,
//! and the shared [`CommandState`]. The three itinerary-item kinds
//! (flight, hotel, activity) share [`AddItemCmd`], whose
//! [`CommandKind`] tag is derived from the [`ItemDetails`] sum type;
//! their insert/delete plumbing is identical.
//!
//! # Inverse capture
//!
//! Inverses are captured during the first successful execute and never
//! cleared. Value-setting commands (`UpdateBudgetCmd`,
//! `UpdateItemStatusCmd`) keep the *original* prior value across
//! redo, so undo after redo still restores the pre-command state.
//! Id-generating commands keep the produced entity in their result and
//! redo by restoring it verbatim rather than allocating a fresh id.

use std::sync::Arc;

use itinera_store::{
    ItemDetails, ItemId, ItemKind, NewTrip, PlannerStore, TripId, UserId,
};

use crate::command::{CommandKind, CommandOutput, CommandState, UndoableCmd};
use crate::error::EngineError;

/// Create a new trip. Undo deletes it by the captured id.
pub struct CreateTripCmd {
    store: Arc<dyn PlannerStore>,
    new_trip: NewTrip,
    /// Captured inverse: the id the store assigned.
    trip_id: Option<TripId>,
    state: CommandState,
}

impl CreateTripCmd {
    #[must_use]
    pub fn new(store: Arc<dyn PlannerStore>, new_trip: NewTrip) -> Self {
        Self {
            store,
            new_trip,
            trip_id: None,
            state: CommandState::default(),
        }
    }
}

impl UndoableCmd for CreateTripCmd {
    fn kind(&self) -> CommandKind {
        CommandKind::CreateTrip
    }

    fn payload(&self) -> serde_json::Value {
        serde_json::json!({
            "owner": self.new_trip.owner,
            "name": self.new_trip.name,
            "destination": self.new_trip.destination,
            "start_date": self.new_trip.start_date,
            "end_date": self.new_trip.end_date,
            "share_code": self.new_trip.share_code,
        })
    }

    fn state(&self) -> &CommandState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CommandState {
        &mut self.state
    }

    fn apply(&mut self) -> Result<CommandOutput, EngineError> {
        // Redo path: restore the exact trip produced before the undo,
        // original id included.
        if let Some(CommandOutput::Trip(prev)) = self.state.result() {
            let trip = self.store.restore_trip(prev.clone())?;
            return Ok(CommandOutput::Trip(trip));
        }
        let trip = self.store.insert_trip(self.new_trip.clone())?;
        self.trip_id = Some(trip.id);
        Ok(CommandOutput::Trip(trip))
    }

    fn revert(&mut self) -> Result<(), EngineError> {
        let id = self.trip_id.ok_or_else(|| {
            EngineError::InverseUnavailable("trip id was never captured".into())
        })?;
        if self.store.delete_trip(id) {
            Ok(())
        } else {
            Err(EngineError::InverseUnavailable(format!(
                "trip {id} is no longer in the store"
            )))
        }
    }
}

/// Set a trip's budget. Undo restores the previous value.
pub struct UpdateBudgetCmd {
    store: Arc<dyn PlannerStore>,
    trip_id: TripId,
    new_budget: f64,
    /// Captured inverse: the budget before the first execute.
    old_budget: Option<f64>,
    state: CommandState,
}

impl UpdateBudgetCmd {
    #[must_use]
    pub fn new(store: Arc<dyn PlannerStore>, trip_id: TripId, new_budget: f64) -> Self {
        Self {
            store,
            trip_id,
            new_budget,
            old_budget: None,
            state: CommandState::default(),
        }
    }
}

impl UndoableCmd for UpdateBudgetCmd {
    fn kind(&self) -> CommandKind {
        CommandKind::UpdateBudget
    }

    fn payload(&self) -> serde_json::Value {
        serde_json::json!({
            "trip_id": self.trip_id,
            "new_budget": self.new_budget,
        })
    }

    fn state(&self) -> &CommandState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CommandState {
        &mut self.state
    }

    fn apply(&mut self) -> Result<CommandOutput, EngineError> {
        if !self.new_budget.is_finite() || self.new_budget < 0.0 {
            return Err(EngineError::Validation(
                "budget must be a non-negative amount".into(),
            ));
        }
        // Capture the prior value once; a redo keeps the original so a
        // later undo restores the pre-command budget.
        if self.old_budget.is_none() {
            let trip = self
                .store
                .find_trip(self.trip_id)
                .ok_or(EngineError::NotFound {
                    collection: itinera_store::Collection::Trips,
                    id: self.trip_id,
                })?;
            self.old_budget = Some(trip.budget);
        }
        let trip = self
            .store
            .update_budget(self.trip_id, self.new_budget)
            .ok_or(EngineError::NotFound {
                collection: itinera_store::Collection::Trips,
                id: self.trip_id,
            })?;
        Ok(CommandOutput::Trip(trip))
    }

    fn revert(&mut self) -> Result<(), EngineError> {
        let old = self.old_budget.ok_or_else(|| {
            EngineError::InverseUnavailable("previous budget was never captured".into())
        })?;
        self.store
            .update_budget(self.trip_id, old)
            .map(|_| ())
            .ok_or_else(|| {
                EngineError::InverseUnavailable(format!(
                    "trip {} is no longer in the store",
                    self.trip_id
                ))
            })
    }
}

/// Add a user to a trip's collaborator list. Fails — never a silent
/// no-op — when the user is already a collaborator or owns the trip,
/// so a spurious "success" with nothing to undo can't enter history.
pub struct AddCollaboratorCmd {
    store: Arc<dyn PlannerStore>,
    trip_id: TripId,
    user: UserId,
    /// Captured inverse: whether this command actually added the user.
    newly_added: bool,
    state: CommandState,
}

impl AddCollaboratorCmd {
    #[must_use]
    pub fn new(store: Arc<dyn PlannerStore>, trip_id: TripId, user: UserId) -> Self {
        Self {
            store,
            trip_id,
            user,
            newly_added: false,
            state: CommandState::default(),
        }
    }
}

impl UndoableCmd for AddCollaboratorCmd {
    fn kind(&self) -> CommandKind {
        CommandKind::AddCollaborator
    }

    fn payload(&self) -> serde_json::Value {
        serde_json::json!({
            "trip_id": self.trip_id,
            "user": self.user,
        })
    }

    fn state(&self) -> &CommandState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CommandState {
        &mut self.state
    }

    fn apply(&mut self) -> Result<CommandOutput, EngineError> {
        let trip = self.store.add_collaborator(self.trip_id, self.user)?;
        self.newly_added = true;
        Ok(CommandOutput::Trip(trip))
    }

    fn revert(&mut self) -> Result<(), EngineError> {
        if !self.newly_added {
            return Err(EngineError::InverseUnavailable(
                "collaborator was never added".into(),
            ));
        }
        if self.store.remove_collaborator(self.trip_id, self.user) {
            Ok(())
        } else {
            Err(EngineError::InverseUnavailable(format!(
                "user {} is no longer a collaborator on trip {}",
                self.user, self.trip_id
            )))
        }
    }
}

/// Add an itinerary item (flight, hotel, or activity) to a trip. The
/// command kind follows the [`ItemDetails`] variant. Undo deletes the
/// item by the captured id.
pub struct AddItemCmd {
    store: Arc<dyn PlannerStore>,
    trip_id: TripId,
    details: ItemDetails,
    /// Captured inverse: the id the store assigned.
    item_id: Option<ItemId>,
    state: CommandState,
}

impl AddItemCmd {
    #[must_use]
    pub fn new(store: Arc<dyn PlannerStore>, trip_id: TripId, details: ItemDetails) -> Self {
        Self {
            store,
            trip_id,
            details,
            item_id: None,
            state: CommandState::default(),
        }
    }
}

impl UndoableCmd for AddItemCmd {
    fn kind(&self) -> CommandKind {
        match self.details.kind() {
            ItemKind::Flight => CommandKind::AddFlight,
            ItemKind::Hotel => CommandKind::AddHotel,
            ItemKind::Activity => CommandKind::AddActivity,
        }
    }

    fn payload(&self) -> serde_json::Value {
        serde_json::json!({
            "trip_id": self.trip_id,
            "details": self.details,
        })
    }

    fn state(&self) -> &CommandState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CommandState {
        &mut self.state
    }

    fn apply(&mut self) -> Result<CommandOutput, EngineError> {
        // Redo path: bring back the undone item under its original id.
        if let Some(CommandOutput::Item(prev)) = self.state.result() {
            let item = self.store.restore_item(prev.clone())?;
            return Ok(CommandOutput::Item(item));
        }
        let item = self.store.insert_item(self.trip_id, self.details.clone())?;
        self.item_id = Some(item.id);
        Ok(CommandOutput::Item(item))
    }

    fn revert(&mut self) -> Result<(), EngineError> {
        let id = self.item_id.ok_or_else(|| {
            EngineError::InverseUnavailable("item id was never captured".into())
        })?;
        let kind = self.details.kind();
        if self.store.delete_item(kind, id) {
            Ok(())
        } else {
            Err(EngineError::InverseUnavailable(format!(
                "{kind} {id} is no longer in the store"
            )))
        }
    }
}

/// Toggle an itinerary item's completion flag. Undo restores the
/// previous flag.
pub struct UpdateItemStatusCmd {
    store: Arc<dyn PlannerStore>,
    kind: ItemKind,
    item_id: ItemId,
    is_done: bool,
    /// Captured inverse: the flag before the first execute.
    previous: Option<bool>,
    state: CommandState,
}

impl UpdateItemStatusCmd {
    #[must_use]
    pub fn new(
        store: Arc<dyn PlannerStore>,
        kind: ItemKind,
        item_id: ItemId,
        is_done: bool,
    ) -> Self {
        Self {
            store,
            kind,
            item_id,
            is_done,
            previous: None,
            state: CommandState::default(),
        }
    }
}

impl UndoableCmd for UpdateItemStatusCmd {
    fn kind(&self) -> CommandKind {
        CommandKind::UpdateItemStatus
    }

    fn payload(&self) -> serde_json::Value {
        serde_json::json!({
            "item_kind": self.kind,
            "item_id": self.item_id,
            "is_done": self.is_done,
        })
    }

    fn state(&self) -> &CommandState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CommandState {
        &mut self.state
    }

    fn apply(&mut self) -> Result<CommandOutput, EngineError> {
        if self.previous.is_none() {
            let item =
                self.store
                    .find_item(self.kind, self.item_id)
                    .ok_or(EngineError::NotFound {
                        collection: self.kind.into(),
                        id: self.item_id,
                    })?;
            self.previous = Some(item.is_done);
        }
        let item = self
            .store
            .set_item_done(self.kind, self.item_id, self.is_done)
            .ok_or(EngineError::NotFound {
                collection: self.kind.into(),
                id: self.item_id,
            })?;
        Ok(CommandOutput::Item(item))
    }

    fn revert(&mut self) -> Result<(), EngineError> {
        let previous = self.previous.ok_or_else(|| {
            EngineError::InverseUnavailable("previous status was never captured".into())
        })?;
        self.store
            .set_item_done(self.kind, self.item_id, previous)
            .map(|_| ())
            .ok_or_else(|| {
                EngineError::InverseUnavailable(format!(
                    "{} {} is no longer in the store",
                    self.kind, self.item_id
                ))
            })
    }
}
