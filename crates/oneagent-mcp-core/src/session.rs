//! Session Store.
//!
//! Generalized from a security-hardening add-on into the transport
//! core's session-of-record: the single place that knows whether an
//! `Mcp-Session-Id` is live, and the single mutex serializing all
//! session mutation.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use oneagent_mcp_types::McpError;
use parking_lot::Mutex;
use rand::RngCore;

/// Lifecycle state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Live and usable.
    Active,
    /// Past its TTL; observationally identical to "not found" externally.
    Expired,
    /// Explicitly deleted.
    Terminated,
}

/// A client's logical MCP connection, surviving across HTTP requests.
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque id, ≥128 bits of entropy.
    pub id: String,
    /// Client-supplied identifier from `initialize`, if any.
    pub client_id: Option<String>,
    /// `Origin` header value recorded at creation.
    pub origin: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last time any request reused this id.
    pub last_activity: DateTime<Utc>,
    /// TTL deadline.
    pub expires_at: DateTime<Utc>,
    /// Current lifecycle state.
    pub state: SessionState,
}

impl Session {
    /// Construct a new `Active` session expiring after `ttl`.
    pub fn new(id: String, client_id: Option<String>, origin: Option<String>, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            id,
            client_id,
            origin,
            created_at: now,
            last_activity: now,
            expires_at: now + ttl,
            state: SessionState::Active,
        }
    }

    /// `expires_at <= now` is treated as expired, not just `expires_at < now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// A patch applied atomically by [`SessionStore::update`]. Only
/// `last_activity` is exercised on the hot path, but the full session is replaceable for the
/// `initialize`-response / terminate paths.
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    /// New last-activity timestamp.
    pub last_activity: Option<DateTime<Utc>>,
    /// New TTL deadline (e.g. sliding-window renewal).
    pub expires_at: Option<DateTime<Utc>>,
    /// New lifecycle state.
    pub state: Option<SessionState>,
}

/// Default session TTL: 30 minutes of inactivity.
pub const DEFAULT_SESSION_TTL: Duration = Duration::minutes(30);

/// Default reap interval.
pub const DEFAULT_REAP_INTERVAL_SECS: u64 = 300;

/// Generate an opaque session id with ≥128 bits of entropy.
pub fn generate_session_id() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut bytes);
    let mut hex = String::with_capacity(36);
    for b in bytes {
        hex.push_str(&format!("{b:02x}"));
    }
    format!("sess_{hex}")
}

/// Thread-safe session map, serialized over a single mutex.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    /// Empty store.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sessions: Mutex::new(HashMap::new()),
        })
    }

    /// Insert a brand-new session. Fails if the id is already present.
    pub fn create(&self, session: Session) -> Result<(), McpError> {
        let mut sessions = self.sessions.lock();
        if sessions.contains_key(&session.id) {
            return Err(McpError::new(
                oneagent_mcp_types::ErrorCode::InternalError,
                format!("session already exists: {}", session.id),
            ));
        }
        sessions.insert(session.id.clone(), session);
        Ok(())
    }

    /// Fetch a session, normalizing its expiry against `now`. Expired
    /// sessions are flipped to `Expired` in place and reported as
    /// "not found" to the caller — expired and erased sessions are
    /// externally indistinguishable.
    pub fn get(&self, id: &str, now: DateTime<Utc>) -> Result<Session, McpError> {
        let mut sessions = self.sessions.lock();
        let Some(session) = sessions.get_mut(id) else {
            return Err(McpError::session_not_found(id));
        };
        if session.state == SessionState::Expired || session.is_expired(now) {
            session.state = SessionState::Expired;
            return Err(McpError::session_not_found(id));
        }
        Ok(session.clone())
    }

    /// Apply a patch atomically. Fails `SessionNotFound` if the id is
    /// absent — note this does not re-check expiry; callers
    /// needing "touch iff still active" should `get` first.
    pub fn update(&self, id: &str, patch: SessionPatch) -> Result<Session, McpError> {
        let mut sessions = self.sessions.lock();
        let Some(session) = sessions.get_mut(id) else {
            return Err(McpError::session_not_found(id));
        };
        if let Some(last_activity) = patch.last_activity {
            session.last_activity = last_activity;
        }
        if let Some(expires_at) = patch.expires_at {
            session.expires_at = expires_at;
        }
        if let Some(state) = patch.state {
            session.state = state;
        }
        Ok(session.clone())
    }

    /// Idempotent removal: transitions to `Terminated` then erases.
    /// Calling twice is a no-op the second time.
    pub fn delete(&self, id: &str) {
        let mut sessions = self.sessions.lock();
        if let Some(session) = sessions.get_mut(id) {
            session.state = SessionState::Terminated;
        }
        sessions.remove(id);
    }

    /// All sessions currently `Active` and unexpired.
    pub fn list_active(&self, now: DateTime<Utc>) -> Vec<Session> {
        self.sessions
            .lock()
            .values()
            .filter(|s| s.state == SessionState::Active && !s.is_expired(now))
            .cloned()
            .collect()
    }

    /// Evict every expired session; returns how many were removed. Collects
    /// the ids under the lock, then drops the lock before logging — the
    /// reaper must never hold the mutex while logging.
    pub fn cleanup_expired(&self, now: DateTime<Utc>) -> usize {
        let expired_ids: Vec<String> = {
            let mut sessions = self.sessions.lock();
            let ids: Vec<String> = sessions
                .iter()
                .filter(|(_, s)| s.is_expired(now) || s.state == SessionState::Expired)
                .map(|(id, _)| id.clone())
                .collect();
            for id in &ids {
                sessions.remove(id);
            }
            ids
        };
        if !expired_ids.is_empty() {
            tracing::info!(count = expired_ids.len(), "reaped expired sessions");
        }
        expired_ids.len()
    }

    /// Current total session count (active + not-yet-reaped expired).
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    /// True if the store holds no sessions at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn create_then_get_then_delete_then_get_not_found() {
        let store = SessionStore::new();
        let id = generate_session_id();
        let session = Session::new(id.clone(), None, None, now(), Duration::minutes(5));
        store.create(session).unwrap();

        assert!(store.get(&id, now()).is_ok());
        store.delete(&id);
        assert!(store.get(&id, now()).is_err());
    }

    #[test]
    fn create_duplicate_id_fails() {
        let store = SessionStore::new();
        let id = generate_session_id();
        let session = Session::new(id.clone(), None, None, now(), Duration::minutes(5));
        store.create(session.clone()).unwrap();
        assert!(store.create(session).is_err());
    }

    #[test]
    fn update_missing_session_fails() {
        let store = SessionStore::new();
        let patch = SessionPatch {
            last_activity: Some(now()),
            ..Default::default()
        };
        assert!(store.update("nonexistent", patch).is_err());
    }

    #[test]
    fn expires_at_equal_to_now_is_expired() {
        let t = now();
        let session = Session::new("sess_x".into(), None, None, t - Duration::seconds(1), Duration::seconds(1));
        assert!(session.is_expired(t));
    }

    #[test]
    fn get_on_expired_session_marks_expired_and_reports_not_found() {
        let store = SessionStore::new();
        let t = now();
        let id = "sess_expired".to_string();
        let session = Session::new(id.clone(), None, None, t, Duration::milliseconds(1));
        store.create(session).unwrap();

        let later = t + Duration::milliseconds(5);
        assert!(store.get(&id, later).is_err());

        // Re-querying even at `t` again still reports not found: state flipped.
        assert!(store.get(&id, t).is_err());
    }

    #[test]
    fn cleanup_expired_is_idempotent() {
        let store = SessionStore::new();
        let t = now();
        let id = generate_session_id();
        store
            .create(Session::new(id, None, None, t, Duration::milliseconds(1)))
            .unwrap();

        let later = t + Duration::seconds(1);
        assert_eq!(store.cleanup_expired(later), 1);
        assert_eq!(store.cleanup_expired(later), 0);
    }

    #[test]
    fn list_active_excludes_expired() {
        let store = SessionStore::new();
        let t = now();
        let active_id = generate_session_id();
        let expired_id = generate_session_id();
        store
            .create(Session::new(active_id.clone(), None, None, t, Duration::minutes(5)))
            .unwrap();
        store
            .create(Session::new(expired_id, None, None, t, Duration::milliseconds(1)))
            .unwrap();

        let later = t + Duration::seconds(1);
        let active = store.list_active(later);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, active_id);
    }

    #[test]
    fn generated_ids_are_unique_and_well_formed() {
        let a = generate_session_id();
        let b = generate_session_id();
        assert_ne!(a, b);
        assert!(a.starts_with("sess_"));
        assert_eq!(a.len(), "sess_".len() + 32);
    }
}
