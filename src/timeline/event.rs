//! Event records and the chronologically sorted catalog.
//!
//! The catalog is sorted exactly once, at construction: ascending by date,
//! ties broken by case-insensitive title. The sort is stable, so records that
//! tie on both keep their input order. Nothing re-sorts afterwards; every
//! index handed out (selection, `source_index`) refers to this order.

#![allow(missing_docs)]

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::core::errors::{AtlError, Result};
use crate::timeline::scale::{Coord, ZoomTier, date_to_virtual_x};

/// One immutable timeline event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub date: NaiveDateTime,
}

impl Event {
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, date: NaiveDateTime) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            date,
        }
    }

    /// Convenience constructor for a midnight date.
    #[must_use]
    pub fn on(id: impl Into<String>, title: impl Into<String>, date: NaiveDate) -> Self {
        Self::new(id, title, date.and_time(NaiveTime::MIN))
    }
}

/// Wire shape of a dataset record before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: String,
    pub title: String,
    pub date: String,
}

/// Accepted dataset file layouts: a bare array or `{ "events": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DatasetFile {
    List(Vec<EventRecord>),
    Wrapped { events: Vec<EventRecord> },
}

/// Parse an ISO-8601 calendar date or timestamp.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps (normalized to UTC), and naive
/// `YYYY-MM-DDTHH:MM:SS` timestamps.
#[must_use]
pub fn parse_event_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::MIN));
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(stamp.naive_utc());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").ok()
}

/// Sorted, read-only event collection.
#[derive(Debug, Clone, Default)]
pub struct EventCatalog {
    events: Vec<Event>,
}

impl EventCatalog {
    /// Sort already-parsed events into catalog order.
    #[must_use]
    pub fn from_events(mut events: Vec<Event>) -> Self {
        events.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
        });
        Self { events }
    }

    /// Validate raw records and build the catalog.
    ///
    /// Rejects empty ids, duplicate ids, and unparseable dates.
    pub fn from_records(records: Vec<EventRecord>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(records.len());
        let mut events = Vec::with_capacity(records.len());
        for record in records {
            if record.id.trim().is_empty() {
                return Err(AtlError::InvalidEvent {
                    id: record.id,
                    reason: "id must not be empty".to_string(),
                });
            }
            if !seen.insert(record.id.clone()) {
                return Err(AtlError::InvalidEvent {
                    id: record.id,
                    reason: "duplicate id".to_string(),
                });
            }
            let Some(date) = parse_event_date(&record.date) else {
                return Err(AtlError::InvalidEvent {
                    reason: format!("unparseable date {:?}", record.date),
                    id: record.id,
                });
            };
            events.push(Event::new(record.id, record.title, date));
        }
        Ok(Self::from_events(events))
    }

    /// Parse a JSON dataset held in memory.
    pub fn from_json_str(raw: &str, source_name: &str) -> Result<Self> {
        let file: DatasetFile =
            serde_json::from_str(raw).map_err(|error| AtlError::DatasetParse {
                source_name: source_name.to_string(),
                details: error.to_string(),
            })?;
        let records = match file {
            DatasetFile::List(records) | DatasetFile::Wrapped { events: records } => records,
        };
        Self::from_records(records)
    }

    /// Read and parse a JSON dataset file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| AtlError::io(path, source))?;
        Self::from_json_str(&raw, &path.display().to_string())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Event> {
        self.events.get(index)
    }

    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    /// Position of `id` in catalog order.
    #[must_use]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.events.iter().position(|event| event.id == id)
    }

    /// Earliest date; the reference point of every virtual X.
    #[must_use]
    pub fn min_date(&self) -> Option<NaiveDateTime> {
        self.events.first().map(|event| event.date)
    }

    /// Last valid index, `None` when empty.
    #[must_use]
    pub fn last_index(&self) -> Option<usize> {
        self.events.len().checked_sub(1)
    }

    /// Virtual X of the event at `index`.
    #[must_use]
    pub fn virtual_x(&self, index: usize, tier: ZoomTier) -> Option<Coord> {
        let reference = self.min_date()?;
        self.events
            .get(index)
            .map(|event| date_to_virtual_x(event.date, tier, reference))
    }

    /// Export back to wire records (dates as `YYYY-MM-DD` when at midnight).
    #[must_use]
    pub fn to_records(&self) -> Vec<EventRecord> {
        self.events
            .iter()
            .map(|event| EventRecord {
                id: event.id.clone(),
                title: event.title.clone(),
                date: if event.date.time() == NaiveTime::MIN {
                    event.date.date().format("%Y-%m-%d").to_string()
                } else {
                    event.date.format("%Y-%m-%dT%H:%M:%S").to_string()
                },
            })
            .collect()
    }
}
