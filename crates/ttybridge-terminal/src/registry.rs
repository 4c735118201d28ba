use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::error::SessionError;
use super::pty_handler::LaunchConfig;
use super::session::{Session, SessionSummary};

/// Owns every live session. The composition root holds one instance behind
/// an `Arc`; there is no ambient global state.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    /// Serializes the existence-check-and-insert step so two near-simultaneous
    /// first messages for one identifier never spawn two processes.
    create_lock: Mutex<()>,
    launch: LaunchConfig,
    log_dir: PathBuf,
}

impl SessionRegistry {
    pub fn new(launch: LaunchConfig, log_dir: PathBuf) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            create_lock: Mutex::new(()),
            launch,
            log_dir,
        }
    }

    /// Return the live session for an identifier, spawning or respawning as
    /// needed. A dead process is discarded and transparently replaced.
    pub async fn get_or_create(&self, session_id: &str) -> Result<Arc<Session>, SessionError> {
        let _create = self.create_lock.lock().await;

        let existing = self.sessions.read().await.get(session_id).cloned();
        if let Some(existing) = existing {
            if existing.probe_alive() {
                existing.touch();
                return Ok(existing);
            }
            // Stale entry; drop it and fall through to a fresh spawn.
            self.sessions.write().await.remove(session_id);
        }

        let launch = self.launch.clone();
        let log_dir = self.log_dir.clone();
        let id = session_id.to_string();
        let session = tokio::task::spawn_blocking(move || Session::spawn(&id, &launch, &log_dir))
            .await
            .map_err(|e| SessionError::Spawn(format!("spawn worker failed: {}", e)))??;

        let session = Arc::new(session);
        self.sessions
            .write()
            .await
            .insert(session_id.to_string(), Arc::clone(&session));
        Ok(session)
    }

    /// One synchronous exchange: write the message, read until the ready
    /// prompt, extract the reply.
    ///
    /// The session's access token guarantees at most one exchange in flight
    /// per session; exchanges for different sessions run fully in parallel.
    /// A timeout leaves the process running for the next attempt.
    pub async fn send(
        &self,
        session_id: &str,
        message: &str,
        timeout: Duration,
    ) -> Result<String, SessionError> {
        let session = self.get_or_create(session_id).await?;

        let _token = session.token().lock().await;
        session.touch();

        let io = session.io();
        let message = message.to_string();
        tokio::task::spawn_blocking(move || io.lock().unwrap().exchange(&message, timeout))
            .await
            .map_err(|e| SessionError::ProcessDead(format!("exchange worker failed: {}", e)))?
    }

    /// Close a session, terminating its process group. Idempotent.
    ///
    /// The entry is removed before any teardown so no new caller can observe
    /// a session mid-destruction; the access token then serializes the close
    /// against any exchange still in flight.
    pub async fn close(&self, session_id: &str) -> bool {
        let session = self.sessions.write().await.remove(session_id);
        let Some(session) = session else {
            return false;
        };

        let _token = session.token().lock().await;
        let io = session.io();
        let _ = tokio::task::spawn_blocking(move || io.lock().unwrap().shutdown()).await;
        true
    }

    pub async fn close_all(&self) {
        let ids: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        for id in ids {
            self.close(&id).await;
        }
    }

    /// Lazy snapshot; not atomic across the registry and does not take any
    /// session's access token.
    pub async fn list_sessions(&self) -> Vec<SessionSummary> {
        self.sessions
            .read()
            .await
            .values()
            .map(|session| session.summary())
            .collect()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Close every session idle past `max_idle`; returns the closed ids.
    ///
    /// A session touched between the scan and the close still gets closed;
    /// reaping is advisory cleanup and the next request simply respawns.
    pub async fn close_idle_sessions(&self, max_idle: Duration) -> Vec<String> {
        let candidates: Vec<String> = self
            .sessions
            .read()
            .await
            .iter()
            .filter(|(_, session)| session.idle() > max_idle)
            .map(|(id, _)| id.clone())
            .collect();

        let mut closed = Vec::new();
        for id in candidates {
            if self.close(&id).await {
                closed.push(id);
            }
        }
        closed
    }
}

/// Periodic background task closing sessions unused beyond `max_idle`.
/// Holds at most one session's access token at a time.
pub fn spawn_idle_reaper(
    registry: Arc<SessionRegistry>,
    period: Duration,
    max_idle: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            for id in registry.close_idle_sessions(max_idle).await {
                eprintln!("Reaped idle session '{}'", id);
            }
        }
    })
}
