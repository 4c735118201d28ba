// Interactive-CLI session engine
//
// This module binds conversation identifiers to persistent `claude` CLI
// processes driven through pseudoterminals, frames replies out of the raw
// terminal byte stream, and reclaims idle or dead sessions. The CLI has no
// non-interactive protocol, so reply boundaries are inferred heuristically
// from prompt patterns plus an idle-stability rule.

mod error;
mod extract;
mod filter;
mod logger;
mod pty_handler;
mod registry;
mod session;

// Re-export public API
pub use error::SessionError;
pub use extract::extract_response;
pub use filter::{is_prompt_ready, strip_ansi};
pub use pty_handler::{LaunchConfig, PtyHandler};
pub use registry::{spawn_idle_reaper, SessionRegistry};
pub use session::{Session, SessionSummary};

use std::time::Duration;

// Output framing
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const IDLE_STABILITY_WINDOW: Duration = Duration::from_millis(1500);
pub(crate) const SHUTDOWN_GRACE: Duration = Duration::from_millis(200);

// Defaults consumed by the application layer
pub const DEFAULT_COLS: u16 = 120;
pub const DEFAULT_ROWS: u16 = 40;
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(20);
pub const DEFAULT_IDLE_THRESHOLD: Duration = Duration::from_secs(3600);
pub const DEFAULT_REAP_PERIOD: Duration = Duration::from_secs(300);
