use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use spdlog::debug;

use crate::metrics::event_slot::EventSlot;
use crate::metrics::metric_types::MetricEvent;

pub struct Event {
    pub metric_event: MetricEvent,
    pub date_time: DateTime<Utc>,
    pub total: u64,
}

/// Folds access events into per-key time slots. Closed slots move to a
/// history list that the writer drains and publishes.
pub struct MetricAggregator {
    slot_size: Duration,
    slots: HashMap<String, EventSlot>,
    history: Vec<EventSlot>,
}

impl MetricAggregator {
    pub fn new(slot_size: Duration) -> Self {
        Self {
            slot_size,
            slots: Default::default(),
            history: vec![],
        }
    }

    /// Closes out the open slots once their window has passed. Slot windows
    /// are aligned, so one expired slot means they all are.
    pub fn flush(&mut self) {
        let date_time = Utc::now();
        let mut should_drain = false;
        for (_, slot) in self.slots.iter_mut() {
            if date_time >= slot.stats_date_end {
                should_drain = true;
                break;
            }
        }

        debug!("Flush called for {}. Should_drain={}", date_time, should_drain);
        if should_drain {
            let values: Vec<EventSlot> = self.slots.drain().map(|(_, v)| v).collect();
            self.history.extend(values);
        }
    }

    pub fn add_event(&mut self, event: Event) {
        let slot_key = EventSlot::key_from(&event);
        if let Some(slot) = self.slots.get_mut(&slot_key) {
            if event.date_time < slot.stats_date_end {
                let inserted = slot.origins.insert(event.metric_event.origin.clone());
                if inserted {
                    slot.unique_total += event.total;
                }
                slot.total += event.total;
                return;
            } else {
                // Window over - everything open moves to history
                let values: Vec<EventSlot> = self.slots.drain().map(|(_, v)| v).collect();
                self.history.extend(values);
            }
        }

        let slot = EventSlot::from_event(event, &self.slot_size);
        self.slots.insert(slot_key, slot);
    }

    pub fn take_events(&mut self) -> Option<Vec<EventSlot>> {
        if self.history.is_empty() {
            return None;
        }

        Some(std::mem::take(&mut self.history))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::TimeZone;

    use crate::metrics::metric_types::{EventApi, ViewDetail};

    use super::*;

    fn create(post_no: i32, origin_no: i32, secs: u32, total: u64) -> Event {
        Event {
            metric_event: MetricEvent {
                api: EventApi::View(ViewDetail {
                    link: format!("post-{}", post_no),
                }),
                origin: format!("10.0.0.{}", origin_no),
            },
            date_time: Utc.with_ymd_and_hms(2024, 11, 1, 1, 2, secs).unwrap(),
            total,
        }
    }

    #[test]
    fn test_slots() {
        let mut m = MetricAggregator::new(Duration::seconds(5));
        assert_eq!(m.take_events(), None);
        m.add_event(create(1, 1, 0, 1));
        m.add_event(create(1, 1, 0, 1));
        m.add_event(create(1, 2, 1, 1));
        m.add_event(create(1, 1, 5, 1));
        let events = m.take_events();
        let expected = vec![EventSlot {
            key: "view".to_string(),
            value: "post-1".to_string(),
            unique_total: 2,
            total: 3,
            origins: HashSet::from(["10.0.0.1".to_string(), "10.0.0.2".to_string()]),
            stats_date_start: DateTime::parse_from_rfc3339("2024-11-01T01:02:00Z").unwrap().into(),
            stats_date_end: DateTime::parse_from_rfc3339("2024-11-01T01:02:05Z").unwrap().into(),
        }];
        assert_eq!(events.unwrap(), expected);

        m.add_event(create(1, 1, 10, 1));
        let events = m.take_events();
        let expected = vec![EventSlot {
            key: "view".to_string(),
            value: "post-1".to_string(),
            unique_total: 1,
            total: 1,
            origins: HashSet::from(["10.0.0.1".to_string()]),
            stats_date_start: DateTime::parse_from_rfc3339("2024-11-01T01:02:05Z").unwrap().into(),
            stats_date_end: DateTime::parse_from_rfc3339("2024-11-01T01:02:10Z").unwrap().into(),
        }];
        assert_eq!(events.unwrap(), expected);
        assert_eq!(m.take_events(), None);
    }

    #[test]
    fn test_separate_slots_per_post() {
        let mut m = MetricAggregator::new(Duration::seconds(5));
        m.add_event(create(1, 1, 0, 1));
        m.add_event(create(2, 1, 1, 1));
        assert_eq!(m.take_events(), None);

        // next window drains both open slots
        m.add_event(create(1, 1, 6, 1));
        let mut events = m.take_events().unwrap();
        events.sort_by(|a, b| a.value.cmp(&b.value));
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].value, "post-1");
        assert_eq!(events[1].value, "post-2");
    }
}
