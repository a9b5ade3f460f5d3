use chrono::TimeZone;

use crate::{
    aggregate::Stats,
    insight::format_event_time,
    types::{EventType, TrackedEvent},
};

const BAR_WIDTH: usize = 30;

pub fn event_icon(event_type: EventType) -> &'static str {
    match event_type {
        EventType::PageView => "👁",
        EventType::Click => "👆",
        EventType::Conversion => "$",
        EventType::Error => "!",
        EventType::Custom => ">_",
        EventType::FormSubmit => "✎",
    }
}

/// Render the event log newest first, one block per event.
pub fn format_event_log<'a, I, Tz>(events: I, tz: &Tz) -> String
where
    I: IntoIterator<Item = &'a TrackedEvent>,
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut output = String::new();
    let mut count = 0;

    for event in events {
        count += 1;
        output.push_str(&format!(
            "[{}] {:<2} {:<32} {}\n",
            format_event_time(event.timestamp, tz),
            event_icon(event.event_type),
            event.name,
            event.event_type
        ));
        output.push_str(&format!("      path {}\n", event.path));
        if let Some(props) = event.properties.as_ref().filter(|p| !p.is_empty()) {
            let json = serde_json::to_string(props).unwrap_or_default();
            output.push_str(&format!("      {}\n", json));
        }
    }

    if count == 0 {
        output.push_str("Waiting for events...\n");
    }

    output
}

fn bar(count: usize, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let width = (count * BAR_WIDTH).div_ceil(max);
    "█".repeat(width)
}

/// Stat cards plus the distribution and timeline charts as text.
pub fn format_dashboard(stats: &Stats) -> String {
    let mut output = String::new();

    let top = stats
        .top_type()
        .map(|t| t.to_string())
        .unwrap_or_else(|| "-".to_string());
    output.push_str(&format!(
        "Total events: {} | Conversions: {} | Top event type: {}\n",
        stats.total_events, stats.conversion_count, top
    ));
    output.push_str(&format!(
        "Conversion rate: {:.1}% | Active session: {}s\n\n",
        stats.conversion_rate * 100.0,
        stats.active_session_secs
    ));

    output.push_str("## Event Distribution\n\n");
    let max = stats.distribution.iter().map(|d| d.count).max().unwrap_or(0);
    for entry in &stats.distribution {
        output.push_str(&format!(
            "{:<12} {:>4} {}\n",
            entry.event_type,
            entry.count,
            bar(entry.count, max)
        ));
    }
    output.push('\n');

    output.push_str("## Activity Over Time\n\n");
    let max = stats.timeline.iter().map(|b| b.count).max().unwrap_or(0);
    for bucket in &stats.timeline {
        output.push_str(&format!(
            "{:>6} {:>4} {}\n",
            bucket.label,
            bucket.count,
            bar(bucket.count, max)
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::{
        aggregate::{TimelineOrder, aggregate_in},
        types::EventProperties,
    };

    fn event(event_type: EventType, name: &str, props: Option<EventProperties>) -> TrackedEvent {
        TrackedEvent {
            id: format!("evt_{name}"),
            event_type,
            name: name.to_string(),
            path: "/home".to_string(),
            timestamp: 1_717_232_645_000,
            properties: props,
            session_id: "sess_1".to_string(),
        }
    }

    #[test]
    fn test_empty_log_shows_waiting() {
        let log = format_event_log(&Vec::<TrackedEvent>::new(), &Utc);
        assert_eq!(log, "Waiting for events...\n");
    }

    #[test]
    fn test_log_prints_properties_only_when_present() {
        let events = vec![
            event(
                EventType::Custom,
                "add_to_cart",
                Some(EventProperties::new().with("product", "Cap")),
            ),
            event(EventType::Click, "hero_cta_clicked", Some(EventProperties::new())),
        ];
        let log = format_event_log(&events, &Utc);

        assert!(log.contains("add_to_cart"));
        assert!(log.contains(r#"{"product":"Cap"}"#));
        assert!(!log.contains("{}"));
        assert!(log.contains("9:04:05 AM"));
        assert!(log.find("add_to_cart") < log.find("hero_cta_clicked"));
    }

    #[test]
    fn test_dashboard_cards_and_charts() {
        let events = vec![
            event(EventType::Click, "a", None),
            event(EventType::Click, "b", None),
            event(EventType::Conversion, "purchase_complete", None),
        ];
        let stats = aggregate_in(&events, &Utc, TimelineOrder::default());
        let dashboard = format_dashboard(&stats);

        assert!(dashboard.contains("Total events: 3"));
        assert!(dashboard.contains("Conversions: 1"));
        assert!(dashboard.contains("Top event type: click"));
        assert!(dashboard.contains("9:04"));
        assert!(dashboard.contains(&"█".repeat(BAR_WIDTH)));
    }

    #[test]
    fn test_dashboard_empty_top_type() {
        let stats = aggregate_in(&Vec::<TrackedEvent>::new(), &Utc, TimelineOrder::default());
        assert!(format_dashboard(&stats).contains("Top event type: -"));
    }
}
