//! SSE Event Log.
//!
//! Generalized from an inline per-session event buffer into a
//! standalone, bounded, resumable per-session ring buffer: a "circular
//! buffer via shift()" implemented here as a `VecDeque` with head
//! eviction.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde_json::Value;

/// Default cap on retained events per session.
pub const DEFAULT_MAX_EVENTS_PER_SESSION: usize = 1000;

/// One SSE event on a stream within a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Monotone, unique-within-session id. Fixed-width decimal so string
    /// ordering agrees with numeric ordering.
    pub id: String,
    /// Owning session.
    pub session_id: String,
    /// Stream within the session (a session may have multiple concurrent
    /// SSE connections after reconnects).
    pub stream_id: String,
    /// SSE `event:` type.
    pub event_type: String,
    /// Opaque JSON payload.
    pub payload: Value,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
}

fn format_event_id(n: u64) -> String {
    format!("{n:020}")
}

struct SessionEvents {
    events: VecDeque<Event>,
    next_seq: u64,
}

impl SessionEvents {
    fn new() -> Self {
        Self {
            events: VecDeque::new(),
            next_seq: 1,
        }
    }
}

/// Per-session circular buffer of SSE events with resume-after-id queries.
#[derive(Debug)]
pub struct EventLog {
    max_events_per_session: usize,
    sessions: Mutex<HashMap<String, SessionEvents>>,
}

impl EventLog {
    /// New log capping each session at `max_events_per_session` retained
    /// events.
    pub fn new(max_events_per_session: usize) -> Arc<Self> {
        Arc::new(Self {
            max_events_per_session,
            sessions: Mutex::new(HashMap::new()),
        })
    }

    /// Append one event, evicting the oldest on overflow. Returns the
    /// appended event (with its assigned id) so callers can emit the SSE
    /// frame.
    pub fn append(
        &self,
        session_id: &str,
        stream_id: &str,
        event_type: &str,
        payload: Value,
        now: DateTime<Utc>,
    ) -> Event {
        let mut sessions = self.sessions.lock();
        let entry = sessions
            .entry(session_id.to_string())
            .or_insert_with(SessionEvents::new);

        let event = Event {
            id: format_event_id(entry.next_seq),
            session_id: session_id.to_string(),
            stream_id: stream_id.to_string(),
            event_type: event_type.to_string(),
            payload,
            timestamp: now,
        };
        entry.next_seq += 1;

        if entry.events.len() >= self.max_events_per_session {
            entry.events.pop_front();
        }
        entry.events.push_back(event.clone());
        event
    }

    /// Events on `stream_id` appended after `last_event_id`, in append
    /// order. If `last_event_id` is no longer in the buffer (evicted or
    /// never existed), returns an empty vec and logs a warning rather than
    /// guessing at intent.
    pub fn after(&self, session_id: &str, stream_id: &str, last_event_id: &str) -> Vec<Event> {
        let sessions = self.sessions.lock();
        let Some(entry) = sessions.get(session_id) else {
            return Vec::new();
        };

        let mut found = false;
        let mut result = Vec::new();
        for event in &entry.events {
            if found {
                if event.stream_id == stream_id {
                    result.push(event.clone());
                }
            } else if event.id == last_event_id {
                found = true;
            }
        }

        if !found {
            tracing::warn!(
                session_id,
                stream_id,
                last_event_id,
                "resume requested from an id no longer in the event log"
            );
        }
        result
    }

    /// Full copy of every retained event for a session, across all streams.
    pub fn by_session(&self, session_id: &str) -> Vec<Event> {
        self.sessions
            .lock()
            .get(session_id)
            .map(|entry| entry.events.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Drop events older than `max_age`; removes the session entry
    /// entirely once its buffer is empty. Returns the number of events
    /// removed.
    pub fn cleanup_older_than(&self, max_age: Duration, now: DateTime<Utc>) -> usize {
        let cutoff = now - max_age;
        let mut sessions = self.sessions.lock();
        let mut removed = 0usize;
        sessions.retain(|_, entry| {
            let before = entry.events.len();
            entry.events.retain(|e| e.timestamp > cutoff);
            removed += before - entry.events.len();
            !entry.events.is_empty()
        });
        removed
    }
}
