//! Availability response normalization
//!
//! The scheduling API has answered with several body shapes over time. This
//! module maps every one of them onto a single [`AvailabilityResult`] and never
//! fails: a body it cannot interpret normalizes to an empty result.
//!
//! Shapes are tried in order, first match wins:
//!
//! 1. flat `{"appointments": [...]}` where non-object sentinels such as
//!    `"None"` are interleaved with real entries
//! 2. nested `{"availabilityLines": [{"appointments": [...]}, ...]}`
//! 3. legacy summary `{"availabilityCount": n, "availabilityLines": ["<day> <time>", ...]}`

mod fields;

pub use fields::{DAY_FIELDS, LOCATION_FIELDS, TIME_FIELDS};

use serde_json::Value;

use crate::error::SlotwatchErrorTrait;
use crate::models::{AvailabilityResult, SlotDescriptor};
use crate::utils::error::PollError;
use fields::RawEntry;

/// Which branch produced the slots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// Top-level `appointments` list
    Appointments,
    /// `availabilityLines[*].appointments`
    NestedLines,
    /// `availabilityLines` of preformatted strings
    SummaryLines,
    /// Valid JSON, nothing usable
    Empty,
    /// Not JSON at all
    Undecodable,
}

/// Normalized body with the shape that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub shape: ResponseShape,
    pub result: AvailabilityResult,
}

/// Decode a raw body as JSON
pub fn parse_body(body: &[u8]) -> Result<Value, PollError> {
    serde_json::from_slice(body).map_err(|e| PollError::ResponseFormat(e.to_string()))
}

/// Normalize a raw response body
pub fn normalize(body: &[u8]) -> AvailabilityResult {
    normalize_body(body).result
}

/// Normalize a raw response body, keeping the shape
///
/// Undecodable bodies are logged and yield an empty result tagged
/// [`ResponseShape::Undecodable`].
pub fn normalize_body(body: &[u8]) -> Normalized {
    match parse_body(body) {
        Ok(value) => normalize_value(&value),
        Err(e) => {
            tracing::warn!(
                category = %e.category(),
                error = %e,
                body_len = body.len(),
                "Could not decode availability response, treating as no availability"
            );
            Normalized {
                shape: ResponseShape::Undecodable,
                result: AvailabilityResult::empty(),
            }
        }
    }
}

/// Normalize an already decoded body
pub fn normalize_value(value: &Value) -> Normalized {
    let appointments = value.get("appointments").and_then(Value::as_array);
    let lines = value.get("availabilityLines").and_then(Value::as_array);

    if let Some(entries) = appointments {
        let slots = collect_slots(entries.iter());
        if !slots.is_empty() {
            return finish(value, ResponseShape::Appointments, slots);
        }
    }

    if let Some(lines) = lines {
        let nested = lines
            .iter()
            .filter_map(|line| line.get("appointments").and_then(Value::as_array))
            .flatten();
        let slots = collect_slots(nested);
        if !slots.is_empty() {
            return finish(value, ResponseShape::NestedLines, slots);
        }

        let slots: Vec<SlotDescriptor> = lines
            .iter()
            .filter_map(Value::as_str)
            .filter_map(split_summary_line)
            .collect();
        if !slots.is_empty() {
            return finish(value, ResponseShape::SummaryLines, slots);
        }
    }

    if appointments.is_none() && lines.is_none() {
        tracing::debug!("Availability response carries no known slot list");
    }

    Normalized {
        shape: ResponseShape::Empty,
        result: AvailabilityResult::empty(),
    }
}

fn collect_slots<'a>(entries: impl Iterator<Item = &'a Value>) -> Vec<SlotDescriptor> {
    entries
        .filter_map(Value::as_object)
        .filter_map(|object| RawEntry::from_object(object).into_slot())
        .collect()
}

/// Split `"28 novembre 11:15"` at its last whitespace
fn split_summary_line(line: &str) -> Option<SlotDescriptor> {
    let (day, time) = line.trim().rsplit_once(char::is_whitespace)?;
    let (day, time) = (day.trim(), time.trim());
    if day.is_empty() || time.is_empty() {
        return None;
    }
    Some(SlotDescriptor::new(day, time))
}

fn finish(value: &Value, shape: ResponseShape, slots: Vec<SlotDescriptor>) -> Normalized {
    let result = AvailabilityResult::from_slots(slots);

    if let Some(reported) = value.get("availabilityCount").and_then(Value::as_u64) {
        if reported != result.count() as u64 {
            tracing::debug!(
                reported,
                derived = result.count(),
                "availabilityCount disagrees with usable slots"
            );
        }
    }

    Normalized { shape, result }
}
