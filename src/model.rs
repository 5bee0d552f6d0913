use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    pub amount: Decimal,
    pub currency_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightEndpoint {
    pub time: String,
    pub date: String,
    pub airport_name: String,
    pub airport_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightView {
    pub id: String,
    pub unique_id: String,
    pub airline: String,
    pub airline_code: Option<String>,
    pub airline_logo_url: Option<String>,
    pub flight_number: String,
    pub departure: FlightEndpoint,
    pub arrival: FlightEndpoint,
    pub duration_text: String,
    pub stop_count: u32,
    pub price: Price,
    pub cabin_class: String,
    pub facilities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelView {
    pub id: String,
    pub name: String,
    pub address: String,
    pub rating: f64,
    pub review_count: u32,
    pub price: Price,
    pub images: Vec<String>,
    pub check_in: String,
    pub check_out: String,
    pub property_class: Option<u32>,
    pub facilities: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityView {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: Price,
    pub images: Vec<String>,
    pub rating: f64,
    pub review_count: u32,
    pub location_name: String,
    pub free_cancellation: bool,
}

/// Provider identifiers come back as strings for flights and attractions and
/// as numbers (or numeric strings) for hotel destinations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocationId {
    Number(i64),
    Text(String),
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    pub id: LocationId,
    pub name: String,
    pub country: String,
    pub region: Option<String>,
    /// Airport code for flight destinations, search type for hotel destinations.
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Flight,
    Hotel,
    Activity,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flight => "flight",
            Self::Hotel => "hotel",
            Self::Activity => "activity",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Flight => "Flight",
            Self::Hotel => "Hotel",
            Self::Activity => "Activity",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Payload {
    Flight(FlightView),
    Hotel(HotelView),
    Activity(ActivityView),
}

impl Payload {
    pub fn kind(&self) -> EntryKind {
        match self {
            Self::Flight(_) => EntryKind::Flight,
            Self::Hotel(_) => EntryKind::Hotel,
            Self::Activity(_) => EntryKind::Activity,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Flight(f) => format!("{} {}", f.airline, f.flight_number),
            Self::Hotel(h) => h.name.clone(),
            Self::Activity(a) => a.name.clone(),
        }
    }

    pub fn price(&self) -> &Price {
        match self {
            Self::Flight(f) => &f.price,
            Self::Hotel(h) => &h.price,
            Self::Activity(a) => &a.price,
        }
    }

    /// Whether two payloads describe the same booking. Hotels and activities
    /// also match structurally because provider ids are not stable across
    /// sessions.
    pub fn is_duplicate_of(&self, other: &Payload) -> bool {
        match (self, other) {
            (Self::Flight(a), Self::Flight(b)) => a.unique_id == b.unique_id,
            (Self::Hotel(a), Self::Hotel(b)) => {
                a.id == b.id
                    || (a.name == b.name && a.address == b.address && a.check_in == b.check_in)
            }
            (Self::Activity(a), Self::Activity(b)) => {
                a.id == b.id || (a.name == b.name && a.location_name == b.location_name)
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryEntry {
    pub id: String,
    #[serde(flatten)]
    pub payload: Payload,
    pub added_at: DateTime<Utc>,
}

impl ItineraryEntry {
    pub fn new(payload: Payload) -> Self {
        Self {
            id: format!("itinerary-{}", uuid::Uuid::now_v7()),
            payload,
            added_at: Utc::now(),
        }
    }

    pub fn kind(&self) -> EntryKind {
        self.payload.kind()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "results", rename_all = "lowercase")]
pub enum SearchResults {
    Flights(Vec<FlightView>),
    Hotels(Vec<HotelView>),
    Activities(Vec<ActivityView>),
}

impl SearchResults {
    pub fn len(&self) -> usize {
        match self {
            Self::Flights(v) => v.len(),
            Self::Hotels(v) => v.len(),
            Self::Activities(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Result at a 1-based position, the numbering the tables show.
    pub fn payload(&self, position: usize) -> Option<Payload> {
        let idx = position.checked_sub(1)?;
        match self {
            Self::Flights(v) => v.get(idx).cloned().map(Payload::Flight),
            Self::Hotels(v) => v.get(idx).cloned().map(Payload::Hotel),
            Self::Activities(v) => v.get(idx).cloned().map(Payload::Activity),
        }
    }

    /// Keeps the `n` cheapest results.
    pub fn apply_top(&mut self, n: usize) {
        match self {
            Self::Flights(v) => {
                v.sort_by(|a, b| a.price.amount.cmp(&b.price.amount));
                v.truncate(n);
            }
            Self::Hotels(v) => {
                v.sort_by(|a, b| a.price.amount.cmp(&b.price.amount));
                v.truncate(n);
            }
            Self::Activities(v) => {
                v.sort_by(|a, b| a.price.amount.cmp(&b.price.amount));
                v.truncate(n);
            }
        }
    }
}
