//! Field names used by appointment entries
//!
//! Each label has a primary field name and a fallback observed in older
//! responses. Only non-empty string values count.

use serde_json::{Map, Value};

use crate::models::SlotDescriptor;

/// Day label: primary, then fallback
pub const DAY_FIELDS: &[&str] = &["dayAbbr", "day"];

/// Time label: primary, then fallback
pub const TIME_FIELDS: &[&str] = &["startTime", "start"];

/// Location label: primary, then fallback
pub const LOCATION_FIELDS: &[&str] = &["roomName", "officePlaceName"];

/// An appointment entry with every label made explicitly optional
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct RawEntry {
    pub day: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
}

impl RawEntry {
    pub fn from_object(object: &Map<String, Value>) -> Self {
        Self {
            day: first_label(object, DAY_FIELDS),
            time: first_label(object, TIME_FIELDS),
            location: first_label(object, LOCATION_FIELDS),
        }
    }

    /// A slot is only produced when both day and time are present
    pub fn into_slot(self) -> Option<SlotDescriptor> {
        let slot = SlotDescriptor::new(self.day?, self.time?);
        Some(match self.location {
            Some(location) => slot.with_location(location),
            None => slot,
        })
    }
}

fn first_label(object: &Map<String, Value>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| object.get(*name).and_then(Value::as_str))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}
