use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::info;
use uuid::Uuid;

use super::session::Session;
use crate::errors::AppError;

/// Floor for the sweep period, whatever the TTL.
const MIN_SWEEP_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct Shared {
    session: Mutex<Session>,
    last_access: Mutex<Instant>,
}

/// Shared handle on one session.
///
/// The lock is synchronous and must never be held across an `.await`:
/// callers lock, read or apply one action, and release.
#[derive(Debug, Clone)]
pub struct SessionHandle(Arc<Shared>);

impl SessionHandle {
    fn new(session: Session) -> Self {
        Self(Arc::new(Shared {
            session: Mutex::new(session),
            last_access: Mutex::new(Instant::now()),
        }))
    }

    /// Locks the session and marks it as used.
    ///
    /// A panic while holding the lock leaves the session usable; every action
    /// leaves it consistent before it can panic.
    pub fn lock(&self) -> MutexGuard<'_, Session> {
        *self
            .0
            .last_access
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Instant::now();
        self.lock_untouched()
    }

    fn lock_untouched(&self) -> MutexGuard<'_, Session> {
        self.0
            .session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn idle_for(&self) -> Duration {
        self.0
            .last_access
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .elapsed()
    }

    /// Idle past `ttl` with no collaborator call in flight.
    fn is_expired(&self, ttl: Duration) -> bool {
        self.idle_for() >= ttl && !self.lock_untouched().is_busy()
    }
}

/// In-memory registry of live sessions. Nothing outlives the process, and
/// sessions left idle are evicted by the sweeper.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SessionHandle>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self) -> (Uuid, SessionHandle) {
        let id = Uuid::new_v4();
        let handle = SessionHandle::new(Session::new(id));
        self.sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(id, handle.clone());
        info!(session = %id, "session created");
        (id, handle)
    }

    pub fn get(&self, id: Uuid) -> Result<SessionHandle, AppError> {
        self.sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
    }

    /// Forgets the session. In-flight calls holding its handle finish against
    /// the detached state.
    pub fn remove(&self, id: Uuid) -> Result<(), AppError> {
        self.sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&id)
            .map(|_| info!(session = %id, "session removed"))
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Drops every session untouched for at least `ttl`. Sessions waiting on a
    /// collaborator are kept. Returns how many were evicted.
    pub fn evict_idle(&self, ttl: Duration) -> usize {
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = sessions.len();
        sessions.retain(|id, handle| {
            let expired = handle.is_expired(ttl);
            if expired {
                info!(session = %id, idle_secs = handle.idle_for().as_secs(), "evicting idle session");
            }
            !expired
        });
        before - sessions.len()
    }

    /// Sweeps idle sessions every half TTL for the life of the process.
    pub fn spawn_sweeper(&self, ttl: Duration) -> JoinHandle<()> {
        let store = self.clone();
        let period = (ttl / 2).max(MIN_SWEEP_PERIOD);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let evicted = store.evict_idle(ttl);
                if evicted > 0 {
                    info!(evicted, remaining = store.len(), "idle session sweep");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::models::notification::Notification;
    use crate::models::upload::UploadedFile;
    use crate::shell::session::Selection;

    const TTL: Duration = Duration::from_secs(60);

    #[test]
    fn test_create_get_remove() {
        let store = SessionStore::new();
        let (id, handle) = store.create();

        assert_eq!(handle.lock().id(), id);
        assert_eq!(store.get(id).unwrap().lock().id(), id);
        assert_eq!(store.len(), 1);

        store.remove(id).unwrap();
        assert!(matches!(store.get(id), Err(AppError::NotFound(_))));
        assert!(matches!(store.remove(id), Err(AppError::NotFound(_))));
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_handles_share_state() {
        let store = SessionStore::new();
        let (id, first) = store.create();
        let second = store.get(id).unwrap();

        first.lock().push(Notification::warning("hi"));
        assert_eq!(second.lock().drain_notifications().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_evict_idle_keeps_recently_used_sessions() {
        let store = SessionStore::new();
        let (stale, _) = store.create();
        let (fresh, fresh_handle) = store.create();

        tokio::time::advance(Duration::from_secs(45)).await;
        drop(fresh_handle.lock());
        tokio::time::advance(Duration::from_secs(30)).await;

        assert_eq!(store.evict_idle(TTL), 1);
        assert!(store.get(stale).is_err());
        assert!(store.get(fresh).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_evict_idle_spares_sessions_mid_processing() {
        let store = SessionStore::new();
        let (id, handle) = store.create();
        {
            let mut session = handle.lock();
            session
                .select_files(
                    Selection::Resumes,
                    vec![UploadedFile::new("cv.pdf", None, Bytes::from_static(b"%PDF"))],
                )
                .unwrap();
            session.start_processing().unwrap();
        }

        tokio::time::advance(TTL * 3).await;

        assert_eq!(store.evict_idle(TTL), 0);
        assert!(store.get(id).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_evicts_abandoned_sessions() {
        let store = SessionStore::new();
        let (id, _) = store.create();
        let sweeper = store.spawn_sweeper(TTL);

        tokio::time::sleep(TTL * 2).await;

        assert!(store.get(id).is_err());
        assert_eq!(store.len(), 0);
        sweeper.abort();
    }
}
