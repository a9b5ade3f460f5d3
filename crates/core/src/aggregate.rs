use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
    str::FromStr,
};

use chrono::{DateTime, Local, TimeZone, Timelike};
use serde::Serialize;

use crate::{
    session::Session,
    types::{EventType, TrackedEvent},
};

/// Bucket for timestamps chrono cannot represent.
pub const INVALID_MINUTE_LABEL: &str = "--:--";

/// How timeline buckets are ordered.
///
/// `Lexicographic` collates the `H:MM` labels as text with separators ranked
/// below digits, so `"10:02"` comes before `"9:05"` but `"1:05"` comes before
/// `"10:02"`. `Chronological` sorts by hour and minute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineOrder {
    #[default]
    Lexicographic,
    Chronological,
}

impl FromStr for TimelineOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lexicographic" | "label" => Ok(TimelineOrder::Lexicographic),
            "chronological" | "time" => Ok(TimelineOrder::Chronological),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeCount {
    pub event_type: EventType,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineBucket {
    pub label: String,
    pub count: usize,
    #[serde(skip)]
    hour_minute: Option<(u32, u32)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub total_events: usize,
    pub counts_by_type: BTreeMap<EventType, usize>,
    pub conversion_count: usize,
    /// Per-type counts in order of first occurrence in the input.
    pub distribution: Vec<TypeCount>,
    pub timeline: Vec<TimelineBucket>,
    pub conversion_rate: f64,
    pub active_session_secs: u64,
}

impl Stats {
    /// A type with the highest count; ties go to the earliest distribution entry.
    pub fn top_type(&self) -> Option<EventType> {
        let mut top: Option<&TypeCount> = None;
        for entry in &self.distribution {
            if top.is_none_or(|best| entry.count > best.count) {
                top = Some(entry);
            }
        }
        top.map(|entry| entry.event_type)
    }

    pub fn count_of(&self, event_type: EventType) -> usize {
        self.counts_by_type.get(&event_type).copied().unwrap_or(0)
    }
}

fn label_rank(c: char) -> u32 {
    match c {
        '-' => 0,
        ':' => 1,
        other => 2 + u32::from(other),
    }
}

/// Text collation for minute labels: `-` < `:` < digits.
pub fn compare_labels(a: &str, b: &str) -> Ordering {
    a.chars().map(label_rank).cmp(b.chars().map(label_rank))
}

/// `"{hour}:{minute:02}"` in the given zone, hour unpadded.
pub fn minute_label<Tz: TimeZone>(timestamp_ms: i64, tz: &Tz) -> (String, Option<(u32, u32)>) {
    match DateTime::from_timestamp_millis(timestamp_ms) {
        Some(utc) => {
            let local = utc.with_timezone(tz);
            let (hour, minute) = (local.hour(), local.minute());
            (format!("{}:{:02}", hour, minute), Some((hour, minute)))
        }
        None => (INVALID_MINUTE_LABEL.to_string(), None),
    }
}

/// Aggregate events using the machine's local time zone.
pub fn aggregate<'a, I>(events: I, order: TimelineOrder) -> Stats
where
    I: IntoIterator<Item = &'a TrackedEvent>,
{
    aggregate_in(events, &Local, order)
}

pub fn aggregate_in<'a, I, Tz>(events: I, tz: &Tz, order: TimelineOrder) -> Stats
where
    I: IntoIterator<Item = &'a TrackedEvent>,
    Tz: TimeZone,
{
    let mut counts_by_type: BTreeMap<EventType, usize> = BTreeMap::new();
    let mut distribution: Vec<TypeCount> = Vec::new();
    let mut timeline: Vec<TimelineBucket> = Vec::new();
    let mut bucket_index: HashMap<String, usize> = HashMap::new();
    let mut conversion_count = 0;
    let mut total_events = 0;
    let mut earliest: Option<i64> = None;
    let mut latest: Option<i64> = None;

    for event in events {
        total_events += 1;

        *counts_by_type.entry(event.event_type).or_insert(0) += 1;
        match distribution
            .iter_mut()
            .find(|entry| entry.event_type == event.event_type)
        {
            Some(entry) => entry.count += 1,
            None => distribution.push(TypeCount {
                event_type: event.event_type,
                count: 1,
            }),
        }

        if event.is_conversion() {
            conversion_count += 1;
        }

        let (label, hour_minute) = minute_label(event.timestamp, tz);
        match bucket_index.get(&label) {
            Some(&idx) => timeline[idx].count += 1,
            None => {
                bucket_index.insert(label.clone(), timeline.len());
                timeline.push(TimelineBucket {
                    label,
                    count: 1,
                    hour_minute,
                });
            }
        }

        earliest = Some(earliest.map_or(event.timestamp, |t| t.min(event.timestamp)));
        latest = Some(latest.map_or(event.timestamp, |t| t.max(event.timestamp)));
    }

    match order {
        TimelineOrder::Lexicographic => {
            timeline.sort_by(|a, b| compare_labels(&a.label, &b.label))
        }
        // Unrepresentable timestamps sort last.
        TimelineOrder::Chronological => timeline.sort_by_key(|bucket| match bucket.hour_minute {
            Some(hm) => (0, hm),
            None => (1, (0, 0)),
        }),
    }

    let conversion_rate = if total_events == 0 {
        0.0
    } else {
        conversion_count as f64 / total_events as f64
    };

    let active_session_secs = match (earliest, latest) {
        (Some(first), Some(last)) => (last.saturating_sub(first) / 1000).max(0) as u64,
        _ => 0,
    };

    Stats {
        total_events,
        counts_by_type,
        conversion_count,
        distribution,
        timeline,
        conversion_rate,
        active_session_secs,
    }
}

/// Caches [`Stats`] for a session and recomputes only when it changed.
#[derive(Debug, Default)]
pub struct StatsMemo {
    cached: Option<(u64, TimelineOrder, Stats)>,
    recomputations: u64,
}

impl StatsMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, session: &Session, order: TimelineOrder) -> &Stats {
        let revision = session.revision();
        let fresh = matches!(
            &self.cached,
            Some((cached_rev, cached_order, _)) if *cached_rev == revision && *cached_order == order
        );
        if !fresh {
            self.cached = None;
            self.recomputations += 1;
        }

        let (_, _, stats) = self
            .cached
            .get_or_insert_with(|| (revision, order, aggregate(session.events(), order)));
        stats
    }

    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, Utc};

    use super::*;

    fn event_at(event_type: EventType, timestamp: i64) -> TrackedEvent {
        TrackedEvent {
            id: format!("evt_{timestamp}"),
            event_type,
            name: "test".to_string(),
            path: "/".to_string(),
            timestamp,
            properties: None,
            session_id: "sess_test".to_string(),
        }
    }

    fn ts(hour: u32, minute: u32, second: u32) -> i64 {
        Utc.with_ymd_and_hms(2024, 6, 1, hour, minute, second)
            .unwrap()
            .timestamp_millis()
    }

    #[test]
    fn test_counts_sum_to_total() {
        let events = vec![
            event_at(EventType::PageView, ts(9, 0, 0)),
            event_at(EventType::Click, ts(9, 0, 5)),
            event_at(EventType::Click, ts(9, 1, 0)),
            event_at(EventType::Conversion, ts(9, 2, 0)),
            event_at(EventType::Error, ts(9, 3, 0)),
        ];
        let stats = aggregate_in(&events, &Utc, TimelineOrder::default());

        assert_eq!(stats.total_events, 5);
        assert_eq!(stats.counts_by_type.values().sum::<usize>(), events.len());
        assert_eq!(stats.conversion_count, stats.count_of(EventType::Conversion));
        assert_eq!(stats.conversion_count, 1);
        assert_eq!(stats.count_of(EventType::FormSubmit), 0);
    }

    #[test]
    fn test_empty_input() {
        let stats = aggregate_in(&Vec::<TrackedEvent>::new(), &Utc, TimelineOrder::default());
        assert_eq!(stats.total_events, 0);
        assert_eq!(stats.conversion_count, 0);
        assert!(stats.distribution.is_empty());
        assert!(stats.timeline.is_empty());
        assert_eq!(stats.top_type(), None);
        assert_eq!(stats.conversion_rate, 0.0);
        assert_eq!(stats.active_session_secs, 0);
    }

    #[test]
    fn test_same_minute_merges_different_minutes_do_not() {
        let events = vec![
            event_at(EventType::Click, ts(14, 30, 1)),
            event_at(EventType::Click, ts(14, 30, 59)),
            event_at(EventType::Click, ts(14, 31, 0)),
        ];
        let stats = aggregate_in(&events, &Utc, TimelineOrder::default());

        assert_eq!(stats.timeline.len(), 2);
        assert_eq!(stats.timeline[0].label, "14:30");
        assert_eq!(stats.timeline[0].count, 2);
        assert_eq!(stats.timeline[1].label, "14:31");
        assert_eq!(stats.timeline[1].count, 1);
    }

    #[test]
    fn test_lexicographic_timeline_order() {
        let events = vec![
            event_at(EventType::Click, ts(9, 5, 0)),
            event_at(EventType::Click, ts(10, 2, 0)),
            event_at(EventType::Click, ts(9, 47, 0)),
        ];
        let stats = aggregate_in(&events, &Utc, TimelineOrder::Lexicographic);

        let labels: Vec<&str> = stats.timeline.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["10:02", "9:05", "9:47"]);
    }

    #[test]
    fn test_lexicographic_order_puts_shorter_hour_first() {
        let events = vec![
            event_at(EventType::Click, ts(10, 2, 0)),
            event_at(EventType::Click, ts(1, 5, 0)),
            event_at(EventType::Click, ts(23, 10, 0)),
            event_at(EventType::Click, ts(2, 30, 0)),
        ];
        let stats = aggregate_in(&events, &Utc, TimelineOrder::Lexicographic);

        let labels: Vec<&str> = stats.timeline.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["1:05", "10:02", "2:30", "23:10"]);
    }

    #[test]
    fn test_compare_labels_ranks_separators_below_digits() {
        assert_eq!(compare_labels("1:05", "10:02"), Ordering::Less);
        assert_eq!(compare_labels("10:02", "9:05"), Ordering::Less);
        assert_eq!(compare_labels(INVALID_MINUTE_LABEL, "0:00"), Ordering::Less);
        assert_eq!(compare_labels("9:47", "9:47"), Ordering::Equal);
    }

    #[test]
    fn test_chronological_timeline_order() {
        let events = vec![
            event_at(EventType::Click, ts(9, 5, 0)),
            event_at(EventType::Click, ts(10, 2, 0)),
            event_at(EventType::Click, ts(9, 47, 0)),
        ];
        let stats = aggregate_in(&events, &Utc, TimelineOrder::Chronological);

        let labels: Vec<&str> = stats.timeline.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["9:05", "9:47", "10:02"]);
    }

    #[test]
    fn test_minute_label_uses_given_zone() {
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let (label, hm) = minute_label(ts(23, 7, 0), &plus_two);
        assert_eq!(label, "1:07");
        assert_eq!(hm, Some((1, 7)));
    }

    #[test]
    fn test_days_collapse_into_same_label() {
        let day_one = ts(8, 15, 0);
        let day_two = day_one + 24 * 3600 * 1000;
        let events = vec![
            event_at(EventType::Click, day_one),
            event_at(EventType::Click, day_two),
        ];
        let stats = aggregate_in(&events, &Utc, TimelineOrder::default());
        assert_eq!(stats.timeline.len(), 1);
        assert_eq!(stats.timeline[0].count, 2);
    }

    #[test]
    fn test_out_of_range_timestamp_is_accepted() {
        let events = vec![
            event_at(EventType::Error, i64::MAX),
            event_at(EventType::Click, ts(9, 0, 0)),
        ];
        let stats = aggregate_in(&events, &Utc, TimelineOrder::Chronological);
        assert_eq!(stats.total_events, 2);
        assert_eq!(stats.timeline.last().unwrap().label, INVALID_MINUTE_LABEL);
    }

    #[test]
    fn test_distribution_first_occurrence_order_and_top_type() {
        let events = vec![
            event_at(EventType::Custom, ts(9, 0, 0)),
            event_at(EventType::Click, ts(9, 0, 1)),
            event_at(EventType::Click, ts(9, 0, 2)),
            event_at(EventType::PageView, ts(9, 0, 3)),
        ];
        let stats = aggregate_in(&events, &Utc, TimelineOrder::default());

        let order: Vec<EventType> = stats.distribution.iter().map(|d| d.event_type).collect();
        assert_eq!(
            order,
            vec![EventType::Custom, EventType::Click, EventType::PageView]
        );
        assert_eq!(stats.top_type(), Some(EventType::Click));
    }

    #[test]
    fn test_top_type_tie_returns_a_max() {
        let events = vec![
            event_at(EventType::Custom, ts(9, 0, 0)),
            event_at(EventType::Click, ts(9, 0, 1)),
        ];
        let stats = aggregate_in(&events, &Utc, TimelineOrder::default());
        let top = stats.top_type().unwrap();
        assert_eq!(stats.count_of(top), 1);
    }

    #[test]
    fn test_summary_rate_and_session_time() {
        let events = vec![
            event_at(EventType::Conversion, ts(9, 2, 30)),
            event_at(EventType::PageView, ts(9, 0, 0)),
            event_at(EventType::Click, ts(9, 1, 0)),
            event_at(EventType::Click, ts(9, 1, 10)),
        ];
        let stats = aggregate_in(&events, &Utc, TimelineOrder::default());
        assert_eq!(stats.conversion_rate, 0.25);
        assert_eq!(stats.active_session_secs, 150);
    }

    #[test]
    fn test_memo_recomputes_only_on_change() {
        let mut session = Session::new();
        let mut memo = StatsMemo::new();
        session.record(EventType::PageView, "Home", None);

        assert_eq!(memo.get(&session, TimelineOrder::default()).total_events, 1);
        assert_eq!(memo.get(&session, TimelineOrder::default()).total_events, 1);
        assert_eq!(memo.recomputations(), 1);

        session.record(EventType::Click, "hero_cta_clicked", None);
        assert_eq!(memo.get(&session, TimelineOrder::default()).total_events, 2);
        assert_eq!(memo.recomputations(), 2);

        memo.get(&session, TimelineOrder::Chronological);
        assert_eq!(memo.recomputations(), 3);
    }
}
