//! Delivery-slot validation against a branch's working days.
//!
//! The schedule arrives in one of two shapes: a list of `{day, time}`
//! entries, or a map of lowercase day name to `{open, close}`. Both are
//! normalized to the list shape before matching. Only the weekday gates a
//! slot; opening hours are reported back but never compared with the time.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WorkingDay {
    pub day: String,
    /// `open-close`, e.g. `08:00-18:00`.
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OpeningHours {
    #[serde(default)]
    pub open: String,
    #[serde(default)]
    pub close: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum WorkingDays {
    List(Vec<WorkingDay>),
    Map(BTreeMap<String, OpeningHours>),
}

impl Default for WorkingDays {
    fn default() -> Self {
        WorkingDays::List(Vec::new())
    }
}

impl WorkingDays {
    pub fn normalize(&self) -> Vec<WorkingDay> {
        match self {
            WorkingDays::List(days) => days.clone(),
            WorkingDays::Map(days) => days
                .iter()
                .map(|(day, hours)| WorkingDay {
                    day: capitalize(day),
                    time: format!("{}-{}", hours.open, hours.close),
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            WorkingDays::List(days) => days.is_empty(),
            WorkingDays::Map(days) => days.is_empty(),
        }
    }
}

fn capitalize(day: &str) -> String {
    let mut chars = day.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SlotValidation {
    pub valid: bool,
    pub message: String,
}

impl SlotValidation {
    fn valid(message: impl Into<String>) -> Self {
        Self {
            valid: true,
            message: message.into(),
        }
    }

    fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
        }
    }
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp (its calendar date is used).
pub fn parse_delivery_date(date: &str) -> Option<NaiveDate> {
    let date = date.trim();
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(date).ok().map(|dt| dt.date_naive()))
}

/// Ranges are written `open - close` (e.g. `8:00 AM - 6:00 PM`); a range
/// without the spaced separator has no close bound.
fn split_range(range: &str) -> (&str, &str) {
    match range.split_once(" - ") {
        Some((open, close)) => (open.trim(), close.trim()),
        None => (range.trim(), ""),
    }
}

pub fn validate_delivery_slot(date: &str, time: Option<&str>, working_days: &WorkingDays) -> SlotValidation {
    let days = working_days.normalize();
    if days.is_empty() {
        return SlotValidation::valid("No working days restrictions");
    }

    let Some(date) = parse_delivery_date(date) else {
        return SlotValidation::invalid(format!("Invalid delivery date: {date}"));
    };
    let weekday = date.format("%A").to_string();

    let Some(working_day) = days.iter().find(|d| d.day.eq_ignore_ascii_case(&weekday)) else {
        return SlotValidation::invalid(format!("Not a working day. {weekday} is not available."));
    };

    let (open, close) = split_range(&working_day.time);
    let has_time = time.is_some_and(|t| !t.trim().is_empty());
    if has_time && !open.is_empty() && !close.is_empty() {
        SlotValidation::valid(format!("Working hours: {}", working_day.time))
    } else {
        SlotValidation::valid(format!("Working day confirmed: {weekday}"))
    }
}
