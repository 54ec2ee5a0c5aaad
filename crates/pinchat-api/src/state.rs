use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use pinchat_chat::{ChatSession, Coordinator};
use pinchat_types::api::Claims;
use tracing::{debug, error};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub chat: Coordinator,
    pub jwt_secret: String,
    pub sessions: Sessions,
}

impl AppStateInner {
    pub fn new(chat: Coordinator, jwt_secret: String) -> AppState {
        Arc::new(Self {
            chat,
            jwt_secret,
            sessions: Sessions::default(),
        })
    }
}

/// Live chat sessions keyed by the token's session id. Each session has
/// its own lock so different clients never wait on each other.
///
/// Entries live as long as the token that names them. Expired ones are
/// dropped on lookup and swept on every login.
#[derive(Default)]
pub struct Sessions {
    inner: Mutex<HashMap<Uuid, SessionEntry>>,
}

struct SessionEntry {
    session: Arc<Mutex<ChatSession>>,
    expires_at: DateTime<Utc>,
}

impl Sessions {
    pub fn insert(
        &self,
        sid: Uuid,
        session: ChatSession,
        expires_at: DateTime<Utc>,
    ) -> ApiResult<()> {
        let now = Utc::now();
        let mut sessions = self.lock()?;

        let before = sessions.len();
        sessions.retain(|_, entry| entry.expires_at > now);
        let pruned = before - sessions.len();
        if pruned > 0 {
            debug!("Pruned {} expired sessions", pruned);
        }

        sessions.insert(
            sid,
            SessionEntry {
                session: Arc::new(Mutex::new(session)),
                expires_at,
            },
        );
        Ok(())
    }

    pub fn get(&self, sid: Uuid) -> ApiResult<Option<Arc<Mutex<ChatSession>>>> {
        let mut sessions = self.lock()?;
        let live = sessions
            .get(&sid)
            .map(|entry| (entry.expires_at > Utc::now(), entry.session.clone()));
        match live {
            Some((true, session)) => Ok(Some(session)),
            Some((false, _)) => {
                sessions.remove(&sid);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    pub fn remove(&self, sid: Uuid) -> ApiResult<bool> {
        Ok(self.lock()?.remove(&sid).is_some())
    }

    pub fn len(&self) -> ApiResult<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> ApiResult<bool> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> ApiResult<MutexGuard<'_, HashMap<Uuid, SessionEntry>>> {
        self.inner.lock().map_err(|e| {
            error!("Session registry lock poisoned: {}", e);
            ApiError::internal()
        })
    }
}

/// Runs a coordinator operation against the caller's session on the
/// blocking pool.
pub async fn with_session<F, T>(state: &AppState, claims: &Claims, f: F) -> ApiResult<T>
where
    F: FnOnce(&Coordinator, &mut ChatSession) -> pinchat_types::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let session = state
        .sessions
        .get(claims.sid)?
        .ok_or_else(ApiError::unauthorized)?;
    let state = state.clone();

    tokio::task::spawn_blocking(move || {
        let mut session = session.lock().map_err(|e| {
            error!("Session lock poisoned: {}", e);
            ApiError::internal()
        })?;
        f(&state.chat, &mut session).map_err(ApiError::from)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::internal()
    })?
}

/// Runs a session-less coordinator operation on the blocking pool.
pub async fn blocking<F, T>(state: &AppState, f: F) -> ApiResult<T>
where
    F: FnOnce(&Coordinator) -> pinchat_types::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.chat).map_err(ApiError::from))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::internal()
        })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(name: &str) -> ChatSession {
        ChatSession::new(name, 20)
    }

    #[test]
    fn expired_sessions_are_not_returned() {
        let sessions = Sessions::default();
        let sid = Uuid::new_v4();
        sessions
            .insert(sid, session("alice"), Utc::now() - Duration::seconds(1))
            .unwrap();

        assert!(sessions.get(sid).unwrap().is_none());
        assert!(sessions.is_empty().unwrap());
    }

    #[test]
    fn login_sweeps_expired_entries() {
        let sessions = Sessions::default();
        let stale = Uuid::new_v4();
        let live = Uuid::new_v4();
        sessions
            .insert(stale, session("alice"), Utc::now() - Duration::days(1))
            .unwrap();
        sessions
            .insert(live, session("bob"), Utc::now() + Duration::days(1))
            .unwrap();

        assert_eq!(sessions.len().unwrap(), 1);
        let bob = sessions.get(live).unwrap().unwrap();
        assert_eq!(bob.lock().unwrap().username(), "bob");
        assert!(sessions.remove(live).unwrap());
        assert!(!sessions.remove(live).unwrap());
    }
}
