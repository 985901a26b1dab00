#![forbid(unsafe_code)]

//! Entity model and store contract for the Itinera trip-planning engine.
//!
//! This crate defines the data the command engine operates on and the
//! seam it operates through:
//!
//! - [`model`]: trips and itinerary items (flights, hotels, activities)
//! - [`store`]: the [`PlannerStore`] trait — entity-level CRUD plus the
//!   trip-specific helpers the command engine needs
//! - [`memory`]: [`InMemoryStore`], a thread-safe reference implementation
//!
//! # Role in Itinera
//!
//! `itinera-store` is the receiver side of the command pattern: commands
//! in `itinera-undo` hold an `Arc<dyn PlannerStore>` and drive every
//! mutation through it. The store guarantees that each trait call is a
//! single atomic read-modify-write, which is what lets a command treat
//! one call as one reversible effect.

pub mod error;
pub mod memory;
pub mod model;
pub mod store;

pub use error::StoreError;
pub use memory::InMemoryStore;
pub use model::{
    Collection, ItemDetails, ItemId, ItemKind, ItineraryItem, NewTrip, Trip, TripId, UserId,
};
pub use store::PlannerStore;
