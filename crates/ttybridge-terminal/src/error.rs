use std::time::Duration;
use thiserror::Error;

/// Errors produced by the session engine.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The CLI never drew a ready prompt inside the startup window. The
    /// process has been killed and no session was registered.
    #[error("program not ready within the {waited:?} startup window")]
    StartupTimeout { waited: Duration },

    /// No ready prompt within the caller's timeout. The session stays alive
    /// for the next attempt.
    #[error("no reply within {elapsed:?}")]
    ExchangeTimeout { elapsed: Duration },

    /// The attached process is gone; the next request respawns it.
    #[error("session process is gone: {0}")]
    ProcessDead(String),

    #[error("failed to launch program: {0}")]
    Spawn(String),

    #[error("pty io error: {0}")]
    Io(#[from] std::io::Error),
}
