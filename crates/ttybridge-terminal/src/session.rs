use std::path::Path;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use super::error::SessionError;
use super::extract::extract_response;
use super::filter::is_prompt_ready;
use super::logger::SessionLogger;
use super::pty_handler::{LaunchConfig, PtyHandler};

/// Read-only view of a live session for listings.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub pid: u32,
    pub age_secs: u64,
    pub idle_secs: u64,
}

/// Blocking half of a session: the PTY and its transcript log. Only ever
/// touched from worker threads, behind the session's access token.
pub(crate) struct SessionIo {
    pty: PtyHandler,
    logger: Option<SessionLogger>,
}

impl SessionIo {
    /// One full request/response turn. Blocking.
    ///
    /// A prompt-less result is classified here: dead process beats timeout,
    /// and on a timeout the process is deliberately left running - it is
    /// presumed to still be working on the reply.
    pub(crate) fn exchange(&mut self, message: &str, timeout: Duration) -> Result<String, SessionError> {
        let started = Instant::now();

        if let Some(logger) = self.logger.as_mut() {
            let _ = logger.log_input(message);
        }
        self.pty
            .write_line(message)
            .map_err(|e| SessionError::ProcessDead(format!("pty write failed: {}", e)))?;

        let raw = match self.pty.read_until_ready(timeout) {
            Ok(raw) => raw,
            Err(SessionError::Io(e)) => {
                return Err(SessionError::ProcessDead(format!("pty read failed: {}", e)))
            }
            Err(other) => return Err(other),
        };
        if let Some(logger) = self.logger.as_mut() {
            let _ = logger.log_output(&raw);
        }

        if !is_prompt_ready(&raw) {
            if !self.pty.is_alive() {
                return Err(SessionError::ProcessDead(
                    "process exited mid-exchange".to_string(),
                ));
            }
            return Err(SessionError::ExchangeTimeout {
                elapsed: started.elapsed(),
            });
        }

        Ok(extract_response(&raw, message))
    }

    pub(crate) fn is_alive(&mut self) -> bool {
        self.pty.is_alive()
    }

    /// Terminate the process group and record the closure. Blocking.
    pub(crate) fn shutdown(&mut self) {
        if let Some(logger) = self.logger.as_mut() {
            let _ = logger.log_event("close", "terminating process group");
        }
        self.pty.terminate();
    }
}

/// One conversation bound to one live CLI process.
///
/// The `token` mutex is the session's exclusive access token: holding it is
/// the only sanctioned way to run an exchange or tear the session down, so
/// at most one of either is in flight per session.
pub struct Session {
    id: String,
    pid: u32,
    created_at: DateTime<Utc>,
    last_used: StdMutex<Instant>,
    token: Mutex<()>,
    io: Arc<StdMutex<SessionIo>>,
}

impl Session {
    /// Spawn the CLI and block until its first ready prompt.
    ///
    /// Runs on a worker thread. The program takes several seconds to
    /// initialize; if it never becomes ready inside the startup window it
    /// is killed and no session is handed back.
    pub(crate) fn spawn(id: &str, launch: &LaunchConfig, log_dir: &Path) -> Result<Self, SessionError> {
        let mut pty = PtyHandler::spawn(launch)?;

        let banner = pty.read_until_ready(launch.startup_timeout)?;
        if !is_prompt_ready(&banner) {
            pty.terminate();
            return Err(SessionError::StartupTimeout {
                waited: launch.startup_timeout,
            });
        }

        let pid = pty.pid();
        let mut logger = SessionLogger::new(id, log_dir).ok();
        if let Some(logger) = logger.as_mut() {
            let _ = logger.log_event("spawn", &format!("pid {}", pid));
            let _ = logger.log_output(&banner);
        }

        Ok(Self {
            id: id.to_string(),
            pid,
            created_at: Utc::now(),
            last_used: StdMutex::new(Instant::now()),
            token: Mutex::new(()),
            io: Arc::new(StdMutex::new(SessionIo { pty, logger })),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn idle(&self) -> Duration {
        self.last_used.lock().unwrap().elapsed()
    }

    pub(crate) fn touch(&self) {
        *self.last_used.lock().unwrap() = Instant::now();
    }

    pub(crate) fn token(&self) -> &Mutex<()> {
        &self.token
    }

    pub(crate) fn io(&self) -> Arc<StdMutex<SessionIo>> {
        Arc::clone(&self.io)
    }

    /// Liveness probe used by the registry before reusing an entry.
    ///
    /// A session mid-exchange holds its io lock; busy is reported as alive
    /// rather than blocking the whole registry behind one slow exchange.
    pub(crate) fn probe_alive(&self) -> bool {
        match self.io.try_lock() {
            Ok(mut io) => io.is_alive(),
            Err(_) => true,
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id.clone(),
            pid: self.pid,
            age_secs: (Utc::now() - self.created_at).num_seconds().max(0) as u64,
            idle_secs: self.idle().as_secs(),
        }
    }
}
