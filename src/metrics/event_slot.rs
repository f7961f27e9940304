use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::metrics::metric_aggregator::Event;
use crate::metrics::metric_types::EventApi;

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct EventSlot {
    pub key: String,
    pub value: String,
    pub unique_total: u64,
    pub total: u64,
    pub origins: HashSet<String>,
    pub stats_date_start: DateTime<Utc>,
    pub stats_date_end: DateTime<Utc>,
}

impl EventSlot {
    pub fn from_event(event: Event, slot_size: &Duration) -> Self {
        let (stats_date_start, stats_date_end) = get_slot(&event.date_time, slot_size);
        let mut origins = HashSet::<String>::new();
        origins.insert(event.metric_event.origin.clone());

        let (key, value) = Self::get_key_val(&event);

        EventSlot {
            key,
            value,
            unique_total: event.total,
            total: event.total,
            origins,
            stats_date_start,
            stats_date_end,
        }
    }

    pub fn key_from(event: &Event) -> String {
        let (key, value) = Self::get_key_val(event);
        format!("{}={}", key, value)
    }

    fn get_key_val(event: &Event) -> (String, String) {
        let (key, value) = match &event.metric_event.api {
            EventApi::View(detail) => ("view", detail.link.as_str()),
            EventApi::List(detail) => match &detail.category {
                None => ("list", ""),
                Some(category) => ("list", category.as_str()),
            },
            EventApi::Index => ("index", ""),
            EventApi::Feed => ("feed", ""),
        };

        (key.to_string(), value.to_string())
    }
}

/// Return start + end date/time
fn get_slot(date_time: &DateTime<Utc>, slot_size: &Duration) -> (DateTime<Utc>, DateTime<Utc>) {
    // Slot boundaries are aligned on multiples of the slot size
    let slot_size_secs = slot_size.num_seconds();
    let timestamp_seconds = date_time.timestamp();
    let start_timestamp = timestamp_seconds - (timestamp_seconds % slot_size_secs);
    let start = DateTime::<Utc>::from_timestamp(start_timestamp, 0).unwrap_or(*date_time);

    let end = start + *slot_size;

    (start, end)
}
