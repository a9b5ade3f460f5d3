use std::collections::VecDeque;

use chrono::Utc;
use uuid::Uuid;

use crate::types::{EventProperties, EventType, TrackedEvent};

/// Path used when the location has no fragment.
pub const ROOT_PATH: &str = "/";

/// All events recorded during one run of the tracker, newest first.
///
/// The session owns its event sequence outright; callers mutate it through
/// `&mut Session`, so recording and clearing never interleave.
#[derive(Debug)]
pub struct Session {
    session_id: String,
    events: VecDeque<TrackedEvent>,
    location_hash: String,
    revision: u64,
}

impl Session {
    pub fn new() -> Self {
        Self {
            session_id: format!("sess_{}", Uuid::new_v4().simple()),
            events: VecDeque::new(),
            location_hash: String::new(),
            revision: 0,
        }
    }

    pub fn with_location(hash: impl Into<String>) -> Self {
        let mut session = Self::new();
        session.location_hash = hash.into();
        session
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Recorded events, most recently recorded first.
    pub fn events(&self) -> &VecDeque<TrackedEvent> {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Bumped on every mutation of the event sequence.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn set_location(&mut self, hash: impl Into<String>) {
        self.location_hash = hash.into();
    }

    /// Current logical path: the location fragment without `#`, or `/`.
    pub fn path(&self) -> String {
        let path = self.location_hash.replace('#', "");
        if path.is_empty() {
            ROOT_PATH.to_string()
        } else {
            path
        }
    }

    pub fn record(
        &mut self,
        event_type: EventType,
        name: impl Into<String>,
        properties: Option<EventProperties>,
    ) -> &TrackedEvent {
        self.record_at(event_type, name, properties, Utc::now().timestamp_millis())
    }

    pub fn record_at(
        &mut self,
        event_type: EventType,
        name: impl Into<String>,
        properties: Option<EventProperties>,
        timestamp: i64,
    ) -> &TrackedEvent {
        let event = TrackedEvent {
            id: format!("evt_{}", Uuid::new_v4().simple()),
            event_type,
            name: name.into(),
            path: self.path(),
            timestamp,
            properties,
            session_id: self.session_id.clone(),
        };

        tracing::debug!(
            properties = ?event.properties,
            "[InsightTrack] {}: {}",
            event.event_type,
            event.name
        );

        self.events.push_front(event);
        self.revision += 1;
        &self.events[0]
    }

    pub fn clear(&mut self) {
        if !self.events.is_empty() {
            tracing::debug!(cleared = self.events.len(), "[InsightTrack] events cleared");
        }
        self.events.clear();
        self.revision += 1;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
