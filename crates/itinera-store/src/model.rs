#![forbid(unsafe_code)]

//! Entities managed by the planner store.
//!
//! Every entity lives in exactly one collection and is addressed by a
//! numeric id unique within that collection. Itinerary items share one
//! struct ([`ItineraryItem`]) with a kind-specific payload
//! ([`ItemDetails`]), but flights, hotels, and activities keep separate
//! id spaces.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Id of a user account. Accounts themselves live outside this crate.
pub type UserId = u64;
/// Id of a trip within the trips collection.
pub type TripId = u64;
/// Id of an itinerary item within its kind's collection.
pub type ItemId = u64;

/// A planned trip. The root entity every itinerary item hangs off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: TripId,
    pub owner: UserId,
    pub name: String,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Opaque code used to share the trip; unique across all trips.
    pub share_code: String,
    pub budget: f64,
    /// Users with edit access besides the owner. The owner is implicit
    /// and never appears here.
    pub collaborators: Vec<UserId>,
}

/// Constructor payload for a trip. Budget starts at zero and the
/// collaborator list empty; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTrip {
    pub owner: UserId,
    pub name: String,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub share_code: String,
}

/// Kind tag for itinerary items. Selects the collection an item id is
/// resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Flight,
    Hotel,
    Activity,
}

impl ItemKind {
    /// Singular noun, used in error messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Flight => "flight",
            Self::Hotel => "hotel",
            Self::Activity => "activity",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An entity collection inside the store. Each collection has its own
/// monotonically increasing id counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Trips,
    Flights,
    Hotels,
    Activities,
}

impl Collection {
    /// Collection name as exposed in errors and reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Trips => "trips",
            Self::Flights => "flights",
            Self::Hotels => "hotels",
            Self::Activities => "activities",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<ItemKind> for Collection {
    fn from(kind: ItemKind) -> Self {
        match kind {
            ItemKind::Flight => Self::Flights,
            ItemKind::Hotel => Self::Hotels,
            ItemKind::Activity => Self::Activities,
        }
    }
}

/// Kind-specific fields of an itinerary item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemDetails {
    Flight {
        company: String,
        code: String,
        departure: String,
        arrival: String,
    },
    Hotel {
        name: String,
        checkin: NaiveDate,
        checkout: NaiveDate,
    },
    Activity {
        description: String,
        date: NaiveDate,
    },
}

impl ItemDetails {
    /// The kind tag matching this payload.
    #[must_use]
    pub const fn kind(&self) -> ItemKind {
        match self {
            Self::Flight { .. } => ItemKind::Flight,
            Self::Hotel { .. } => ItemKind::Hotel,
            Self::Activity { .. } => ItemKind::Activity,
        }
    }
}

/// A single entry of a trip's itinerary: one flight, hotel stay, or
/// activity, plus its completion flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryItem {
    pub id: ItemId,
    pub trip_id: TripId,
    pub is_done: bool,
    #[serde(flatten)]
    pub details: ItemDetails,
}

impl ItineraryItem {
    /// Kind of this item, derived from its details.
    #[must_use]
    pub const fn kind(&self) -> ItemKind {
        self.details.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn item_kind_maps_to_collection() {
        assert_eq!(Collection::from(ItemKind::Flight), Collection::Flights);
        assert_eq!(Collection::from(ItemKind::Hotel), Collection::Hotels);
        assert_eq!(Collection::from(ItemKind::Activity), Collection::Activities);
    }

    #[test]
    fn details_report_their_kind() {
        let details = ItemDetails::Activity {
            description: "museum".into(),
            date: date(2026, 9, 1),
        };
        assert_eq!(details.kind(), ItemKind::Activity);
    }

    #[test]
    fn display_labels() {
        assert_eq!(ItemKind::Hotel.to_string(), "hotel");
        assert_eq!(Collection::Trips.to_string(), "trips");
    }

    #[test]
    fn item_serializes_with_flattened_details() {
        let item = ItineraryItem {
            id: 3,
            trip_id: 1,
            is_done: false,
            details: ItemDetails::Flight {
                company: "AA".into(),
                code: "AA1".into(),
                departure: "GRU 08:00".into(),
                arrival: "JFK 16:30".into(),
            },
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "flight");
        assert_eq!(json["code"], "AA1");
        assert_eq!(json["trip_id"], 1);
    }
}
