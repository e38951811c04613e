//! In-memory chat sessions
//!
//! Each session sits behind its own mutex, so one conversation never has
//! two reconciliations in flight. Sessions are not persisted. Idle
//! sessions are evicted when a new one is created, and the store never
//! holds more than its capacity of idle sessions.

use crate::conversational::ChatSession;
use crate::reconciler::AnswerReconciler;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::info;
use uuid::Uuid;

pub const DEFAULT_SESSION_IDLE_SECS: u64 = 30 * 60;
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

pub type SharedSession = Arc<Mutex<ChatSession>>;

struct SessionSlot {
    session: SharedSession,
    last_active: Instant,
}

impl SessionSlot {
    /// A turn in flight holds the session lock
    fn is_busy(&self) -> bool {
        self.session.try_lock().is_err()
    }
}

pub struct SessionStore {
    reconciler: Arc<AnswerReconciler>,
    sessions: RwLock<HashMap<Uuid, SessionSlot>>,
    idle_timeout: Duration,
    capacity: usize,
}

impl SessionStore {
    pub fn new(reconciler: Arc<AnswerReconciler>) -> Self {
        Self {
            reconciler,
            sessions: RwLock::new(HashMap::new()),
            idle_timeout: Duration::from_secs(DEFAULT_SESSION_IDLE_SECS),
            capacity: DEFAULT_MAX_SESSIONS,
        }
    }

    pub fn with_limits(mut self, idle_timeout: Duration, capacity: usize) -> Self {
        self.idle_timeout = idle_timeout;
        self.capacity = capacity.max(1);
        self
    }

    pub fn reconciler(&self) -> &Arc<AnswerReconciler> {
        &self.reconciler
    }

    /// Look up a session and mark it active
    pub async fn get(&self, session_id: Uuid) -> Option<SharedSession> {
        let mut sessions = self.sessions.write().await;
        let slot = sessions.get_mut(&session_id)?;
        slot.last_active = Instant::now();
        Some(Arc::clone(&slot.session))
    }

    pub async fn get_or_create(&self, session_id: Uuid) -> SharedSession {
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();

        if let Some(slot) = sessions.get_mut(&session_id) {
            slot.last_active = now;
            return Arc::clone(&slot.session);
        }

        self.evict(&mut sessions, now);

        let session = Arc::new(Mutex::new(ChatSession::new(Arc::clone(&self.reconciler))));
        sessions.insert(
            session_id,
            SessionSlot {
                session: Arc::clone(&session),
                last_active: now,
            },
        );
        session
    }

    /// Drop idle sessions, then the least recently active ones until a
    /// new session fits. Sessions with a turn in flight are kept.
    fn evict(&self, sessions: &mut HashMap<Uuid, SessionSlot>, now: Instant) {
        let before = sessions.len();
        sessions.retain(|_, slot| {
            now.duration_since(slot.last_active) < self.idle_timeout || slot.is_busy()
        });

        while sessions.len() >= self.capacity {
            let oldest = sessions
                .iter()
                .filter(|(_, slot)| !slot.is_busy())
                .min_by_key(|(_, slot)| slot.last_active)
                .map(|(id, _)| *id);

            match oldest {
                Some(id) => {
                    sessions.remove(&id);
                }
                None => break,
            }
        }

        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, remaining = sessions.len(), "Evicted chat sessions");
        }
    }

    /// End a session; returns whether it existed
    pub async fn remove(&self, session_id: Uuid) -> bool {
        self.sessions.write().await.remove(&session_id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glossary::Glossary;

    fn store() -> SessionStore {
        SessionStore::new(Arc::new(AnswerReconciler::new(Glossary::builtin(), None)))
    }

    #[tokio::test]
    async fn test_get_or_create_reuses_session() {
        let store = store();
        let id = Uuid::new_v4();

        let first = store.get_or_create(id).await;
        first.lock().await.send("What is alpha?").await.unwrap();

        let second = store.get_or_create(id).await;
        assert_eq!(second.lock().await.log().len(), 3);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_remove() {
        let store = store();
        let id = Uuid::new_v4();

        assert!(store.get(id).await.is_none());
        store.get_or_create(id).await;
        assert!(store.remove(id).await);
        assert!(!store.remove(id).await);
        assert!(store.get(id).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_sessions_evicted_on_create() {
        let store = store().with_limits(Duration::from_secs(60), 100);
        let stale = Uuid::new_v4();
        let fresh = Uuid::new_v4();

        store.get_or_create(stale).await;
        tokio::time::advance(Duration::from_secs(45)).await;
        store.get_or_create(fresh).await;
        tokio::time::advance(Duration::from_secs(30)).await;

        store.get_or_create(Uuid::new_v4()).await;

        assert!(store.get(stale).await.is_none());
        assert!(store.get(fresh).await.is_some());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_drops_least_recently_active() {
        let store = store().with_limits(Duration::from_secs(3600), 2);
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        store.get_or_create(a).await;
        tokio::time::advance(Duration::from_secs(1)).await;
        store.get_or_create(b).await;
        tokio::time::advance(Duration::from_secs(1)).await;
        // touching `a` makes `b` the oldest
        store.get(a).await;
        store.get_or_create(c).await;

        assert_eq!(store.len().await, 2);
        assert!(store.get(b).await.is_none());
        assert!(store.get(a).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_session_survives_eviction() {
        let store = store().with_limits(Duration::from_secs(60), 1);
        let busy = Uuid::new_v4();

        let session = store.get_or_create(busy).await;
        let _turn = session.lock().await;
        tokio::time::advance(Duration::from_secs(120)).await;

        store.get_or_create(Uuid::new_v4()).await;
        assert_eq!(store.len().await, 2);
        assert!(store.get(busy).await.is_some());
    }

    #[tokio::test]
    async fn test_concurrent_sends_are_serialized() {
        let store = Arc::new(store());
        let id = Uuid::new_v4();

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let session = store.get_or_create(id).await;
                let mut session = session.lock().await;
                let sent = session.send(&format!("question {} about drawdown", i)).await.map(|_| ());
                sent
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let session = store.get(id).await.unwrap();
        let session = session.lock().await;
        assert_eq!(session.log().len(), 1 + 8 * 2);

        // every user message is directly followed by its reply
        for pair in session.log().all()[1..].chunks(2) {
            assert_eq!(pair[0].role, crate::memory::MessageRole::User);
            assert_eq!(pair[1].role, crate::memory::MessageRole::Bot);
        }
    }
}
