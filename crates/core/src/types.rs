use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    PageView,
    Click,
    FormSubmit,
    Custom,
    Error,
    Conversion,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::PageView => "page_view",
            EventType::Click => "click",
            EventType::FormSubmit => "form_submit",
            EventType::Custom => "custom",
            EventType::Error => "error",
            EventType::Conversion => "conversion",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A single property value. Integers and floats are kept apart so that
/// `items: 1` serializes as `1`, not `1.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Integer(value)
    }
}

impl From<u32> for PropertyValue {
    fn from(value: u32) -> Self {
        PropertyValue::Integer(i64::from(value))
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

/// Shallow key/value bag attached to an event. Nothing is validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventProperties(BTreeMap<String, PropertyValue>);

impl EventProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.0.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub name: String,
    pub path: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<EventProperties>,
    pub session_id: String,
}

impl TrackedEvent {
    pub fn is_conversion(&self) -> bool {
        self.event_type == EventType::Conversion
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_serializes_snake_case() {
        let json = serde_json::to_string(&EventType::PageView).unwrap();
        assert_eq!(json, "\"page_view\"");

        let parsed: EventType = serde_json::from_str("\"form_submit\"").unwrap();
        assert_eq!(parsed, EventType::FormSubmit);
    }

    #[test]
    fn test_properties_keep_integer_and_float_apart() {
        let props = EventProperties::new()
            .with("items", 1i64)
            .with("value", 49.99)
            .with("currency", "USD")
            .with("gift", false);

        let json = serde_json::to_string(&props).unwrap();
        assert_eq!(
            json,
            r#"{"currency":"USD","gift":false,"items":1,"value":49.99}"#
        );
    }

    #[test]
    fn test_tracked_event_omits_absent_properties() {
        let event = TrackedEvent {
            id: "evt_1".to_string(),
            event_type: EventType::Click,
            name: "hero_cta_clicked".to_string(),
            path: "/".to_string(),
            timestamp: 0,
            properties: None,
            session_id: "sess_1".to_string(),
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "click");
        assert_eq!(value["sessionId"], "sess_1");
        assert!(value.get("properties").is_none());
    }
}
