//! Deterministic demo datasets.

use chrono::{Duration, NaiveDate, NaiveTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::timeline::event::{Event, EventCatalog};

const FIRST_YEAR: i32 = 1990;
const SPAN_DAYS: i64 = 40 * 365;

const SUBJECTS: &[&str] = &[
    "Release",
    "Launch",
    "Migration",
    "Outage",
    "Audit",
    "Merger",
    "Summit",
    "Rewrite",
    "Expansion",
    "Retrospective",
];

const QUALIFIERS: &[&str] = &[
    "of the storage tier",
    "in Lisbon",
    "v2",
    "for partners",
    "after the freeze",
    "phase one",
    "",
    "and postmortem",
];

/// Build `count` events between 1990 and 2030 from `seed`.
///
/// The same seed always yields the same catalog. Ids are `evt-0001`,
/// `evt-0002`, … in generation order, before sorting.
#[must_use]
pub fn sample_catalog(seed: u64, count: usize) -> EventCatalog {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = NaiveDate::from_ymd_opt(FIRST_YEAR, 1, 1).unwrap_or_default();
    let events = (1..=count)
        .map(|n| {
            let date = start + Duration::days(rng.random_range(0..SPAN_DAYS));
            let subject = SUBJECTS[rng.random_range(0..SUBJECTS.len())];
            let qualifier = QUALIFIERS[rng.random_range(0..QUALIFIERS.len())];
            let title = if qualifier.is_empty() {
                subject.to_string()
            } else {
                format!("{subject} {qualifier}")
            };
            Event::new(format!("evt-{n:04}"), title, date.and_time(NaiveTime::MIN))
        })
        .collect();
    EventCatalog::from_events(events)
}
