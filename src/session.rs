//! TTL-bound session storage for in-progress user searches.
//!
//! The scraping engine keeps no state between calls. The chat layer stores
//! a user's current search here and reads it back while the user pages
//! through results; entries expire after their TTL and a cooperative sweep
//! task reclaims them.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tracing::debug;

/// A stored session with its expiration time.
struct SessionEntry<S> {
    session: S,
    expires_at: Instant,
}

impl<S> SessionEntry<S> {
    fn new(session: S, ttl: Duration) -> Self {
        Self {
            session,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Per-user session store with TTL expiry.
pub struct SessionStore<S> {
    entries: Arc<RwLock<HashMap<u64, SessionEntry<S>>>>,
}

impl<S> Clone for SessionStore<S> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<S> Default for SessionStore<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> SessionStore<S> {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Store a session for a user, replacing any existing one.
    pub fn put(&self, user_id: u64, session: S, ttl: Duration) {
        if let Ok(mut guard) = self.entries.write() {
            guard.insert(user_id, SessionEntry::new(session, ttl));
        }
    }

    /// Remove a user's session, returning it if present.
    pub fn remove(&self, user_id: u64) -> Option<S> {
        self.entries
            .write()
            .ok()
            .and_then(|mut guard| guard.remove(&user_id))
            .map(|entry| entry.session)
    }

    /// Remove expired sessions, returning how many were dropped.
    pub fn sweep(&self) -> usize {
        if let Ok(mut guard) = self.entries.write() {
            let before = guard.len();
            guard.retain(|_, entry| !entry.is_expired());
            before - guard.len()
        } else {
            0
        }
    }

    /// Number of stored sessions, expired ones included until swept.
    pub fn len(&self) -> usize {
        self.entries.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: Clone> SessionStore<S> {
    /// Get a user's session. Expired entries read as absent.
    pub fn get(&self, user_id: u64) -> Option<S> {
        self.entries.read().ok().and_then(|guard| {
            guard
                .get(&user_id)
                .filter(|entry| !entry.is_expired())
                .map(|entry| entry.session.clone())
        })
    }
}

impl<S: Send + Sync + 'static> SessionStore<S> {
    /// Spawn a periodic sweep task on the current runtime.
    pub fn spawn_sweeper(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = store.sweep();
                if removed > 0 {
                    debug!("Swept {} expired sessions", removed);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_remove_roundtrip() {
        let store = SessionStore::new();
        store.put(1, "search: dune".to_string(), Duration::from_secs(60));

        assert_eq!(store.get(1), Some("search: dune".to_string()));
        assert_eq!(store.get(2), None);
        assert_eq!(store.remove(1), Some("search: dune".to_string()));
        assert_eq!(store.get(1), None);
    }

    #[test]
    fn expired_sessions_read_as_absent() {
        let store = SessionStore::new();
        store.put(1, 42u32, Duration::from_millis(0));
        assert_eq!(store.get(1), None);
    }

    #[test]
    fn sweep_drops_only_expired_entries() {
        let store = SessionStore::new();
        store.put(1, 1u32, Duration::from_millis(0));
        store.put(2, 2u32, Duration::from_secs(60));

        assert_eq!(store.len(), 2);
        assert_eq!(store.sweep(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(2), Some(2));
    }

    #[tokio::test]
    async fn sweeper_task_reclaims_entries() {
        let store = SessionStore::new();
        store.put(1, 1u32, Duration::from_millis(5));
        let handle = store.spawn_sweeper(Duration::from_millis(10));

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(store.len(), 0);
        handle.abort();
    }
}
