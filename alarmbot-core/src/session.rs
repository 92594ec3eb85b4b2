//! Per-user dialogue sessions.
//!
//! Provides the [`SessionState`] walked by the resolver and the
//! [`SessionStore`] port that front-ends inject into [`crate::Dialogue`].
//! Sessions are volatile: they live in process memory only.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

/// Position of a session in the device → category → alarm flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Waiting for the user to pick a device.
    AwaitingDevice,
    /// Device chosen; waiting for an alarm category.
    AwaitingCategory,
    /// Device and category chosen; waiting for an alarm name.
    AwaitingAlarm,
}

/// Dialogue progress for one user.
///
/// Selected values are stored as normalized keys. A category can only be
/// present together with a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for a device selection.
    AwaitingDevice,
    /// Waiting for a category selection.
    AwaitingCategory {
        /// Selected device key.
        device: String,
    },
    /// Waiting for an alarm name.
    AwaitingAlarm {
        /// Selected device key.
        device: String,
        /// Selected category key.
        category: String,
    },
}

impl SessionState {
    /// The current step.
    pub fn step(&self) -> Step {
        match self {
            Self::AwaitingDevice => Step::AwaitingDevice,
            Self::AwaitingCategory { .. } => Step::AwaitingCategory,
            Self::AwaitingAlarm { .. } => Step::AwaitingAlarm,
        }
    }

    /// The selected device key, if any.
    pub fn device(&self) -> Option<&str> {
        match self {
            Self::AwaitingDevice => None,
            Self::AwaitingCategory { device } | Self::AwaitingAlarm { device, .. } => Some(device),
        }
    }

    /// The selected category key, if any.
    pub fn category(&self) -> Option<&str> {
        match self {
            Self::AwaitingAlarm { category, .. } => Some(category),
            _ => None,
        }
    }
}

/// Port for session storage.
///
/// Each front-end owns its own store; the same human talking to two
/// front-ends has two independent conversations.
pub trait SessionStore: Send + Sync {
    /// Current state for `key`, or `None` if the session is unknown or cleared.
    fn get(&self, key: &str) -> Option<SessionState>;

    /// Store `state` for `key`, refreshing its last-touched time.
    fn put(&self, key: &str, state: SessionState);

    /// Remove the session for `key`. Returns `true` if one existed.
    fn clear(&self, key: &str) -> bool;

    /// Atomically replace the state for `key` with the result of `f`.
    ///
    /// `f` receives the current state (if any); returning `None` clears the
    /// session. No other call on the same store interleaves with `f`.
    fn update(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<&SessionState>) -> Option<SessionState>,
    );

    /// Remove every session last touched before `cutoff`. Returns the count.
    fn evict_idle(&self, cutoff: DateTime<Utc>) -> usize;

    /// Number of live sessions.
    fn len(&self) -> usize;

    /// Whether the store holds no sessions.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
struct StoredSession {
    state: SessionState,
    touched_at: DateTime<Utc>,
}

/// Mutex-guarded in-memory [`SessionStore`].
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, StoredSession>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, StoredSession>> {
        // A panic inside `update` leaves the map itself consistent.
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<SessionState> {
        self.lock().get(key).map(|s| s.state.clone())
    }

    fn put(&self, key: &str, state: SessionState) {
        self.lock().insert(
            key.to_string(),
            StoredSession {
                state,
                touched_at: Utc::now(),
            },
        );
    }

    fn clear(&self, key: &str) -> bool {
        self.lock().remove(key).is_some()
    }

    fn update(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<&SessionState>) -> Option<SessionState>,
    ) {
        let mut map = self.lock();
        match f(map.get(key).map(|s| &s.state)) {
            Some(state) => {
                map.insert(
                    key.to_string(),
                    StoredSession {
                        state,
                        touched_at: Utc::now(),
                    },
                );
            }
            None => {
                map.remove(key);
            }
        }
    }

    fn evict_idle(&self, cutoff: DateTime<Utc>) -> usize {
        let mut map = self.lock();
        let before = map.len();
        map.retain(|_, s| s.touched_at >= cutoff);
        before - map.len()
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn alarm_state() -> SessionState {
        SessionState::AwaitingAlarm {
            device: "ciena".to_string(),
            category: "hardware".to_string(),
        }
    }

    #[test]
    fn test_state_accessors() {
        assert_eq!(SessionState::AwaitingDevice.step(), Step::AwaitingDevice);
        assert_eq!(SessionState::AwaitingDevice.device(), None);

        let s = SessionState::AwaitingCategory {
            device: "huawei".to_string(),
        };
        assert_eq!(s.step(), Step::AwaitingCategory);
        assert_eq!(s.device(), Some("huawei"));
        assert_eq!(s.category(), None);

        let s = alarm_state();
        assert_eq!(s.step(), Step::AwaitingAlarm);
        assert_eq!(s.device(), Some("ciena"));
        assert_eq!(s.category(), Some("hardware"));
    }

    #[test]
    fn test_put_get_clear() {
        let store = MemorySessionStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get("tg:1"), None);

        store.put("tg:1", alarm_state());
        assert_eq!(store.get("tg:1"), Some(alarm_state()));
        assert_eq!(store.len(), 1);

        assert!(store.clear("tg:1"));
        assert!(!store.clear("tg:1"));
        assert_eq!(store.get("tg:1"), None);
    }

    #[test]
    fn test_keys_are_independent() {
        let store = MemorySessionStore::new();
        store.put("tg:1", SessionState::AwaitingDevice);
        store.put("tg:2", alarm_state());
        assert_eq!(store.get("tg:1"), Some(SessionState::AwaitingDevice));
        assert_eq!(store.get("tg:2"), Some(alarm_state()));
    }

    #[test]
    fn test_update_sees_current_and_replaces() {
        let store = MemorySessionStore::new();
        let mut seen = Vec::new();
        store.update("web:a", &mut |current| {
            seen.push(current.cloned());
            Some(SessionState::AwaitingDevice)
        });
        store.update("web:a", &mut |current| {
            seen.push(current.cloned());
            Some(alarm_state())
        });
        assert_eq!(seen, vec![None, Some(SessionState::AwaitingDevice)]);
        assert_eq!(store.get("web:a"), Some(alarm_state()));
    }

    #[test]
    fn test_update_returning_none_clears() {
        let store = MemorySessionStore::new();
        store.put("web:a", alarm_state());
        store.update("web:a", &mut |_| None);
        assert_eq!(store.get("web:a"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_evict_idle_removes_only_stale() {
        let store = MemorySessionStore::new();
        store.put("tg:1", SessionState::AwaitingDevice);
        store.put("tg:2", alarm_state());

        // Cutoff in the past: everything is fresh.
        assert_eq!(store.evict_idle(Utc::now() - Duration::hours(1)), 0);
        assert_eq!(store.len(), 2);

        // Cutoff in the future: everything is stale.
        assert_eq!(store.evict_idle(Utc::now() + Duration::seconds(1)), 2);
        assert!(store.is_empty());
    }
}
