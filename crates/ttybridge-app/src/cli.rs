use clap::Parser;
use std::path::PathBuf;

use ttybridge_terminal::{
    DEFAULT_EXCHANGE_TIMEOUT, DEFAULT_IDLE_THRESHOLD, DEFAULT_REAP_PERIOD, DEFAULT_STARTUP_TIMEOUT,
};

/// CLI arguments for the ttybridge server
#[derive(Parser, Debug)]
#[command(name = "ttybridge-server")]
#[command(about = "HTTP bridge exposing the interactive claude CLI to chat relays")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// Address to listen on
    #[arg(long, env = "TTYBRIDGE_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "TTYBRIDGE_PORT", default_value_t = 8765)]
    pub port: u16,

    /// Path to the claude binary (defaults to ~/.local/bin/claude)
    #[arg(long, env = "CLAUDE_BIN", value_name = "PATH")]
    pub claude_bin: Option<PathBuf>,

    /// Default exchange timeout in seconds, used when a request omits one
    #[arg(
        long,
        env = "CLAUDE_TIMEOUT_DEFAULT",
        default_value_t = DEFAULT_EXCHANGE_TIMEOUT.as_secs_f64(),
        value_name = "SECS"
    )]
    pub timeout: f64,

    /// Seconds to wait for the CLI to draw its first prompt after spawn
    #[arg(long, default_value_t = DEFAULT_STARTUP_TIMEOUT.as_secs_f64(), value_name = "SECS")]
    pub startup_timeout: f64,

    /// Seconds a session may sit unused before the reaper closes it
    #[arg(
        long,
        env = "TTYBRIDGE_IDLE_TIMEOUT",
        default_value_t = DEFAULT_IDLE_THRESHOLD.as_secs_f64(),
        value_name = "SECS"
    )]
    pub idle_timeout: f64,

    /// Seconds between idle-reaper scans
    #[arg(long, default_value_t = DEFAULT_REAP_PERIOD.as_secs_f64(), value_name = "SECS")]
    pub reap_interval: f64,

    /// Directory for per-session transcript logs (defaults to ~/.ttybridge/logs)
    #[arg(long, env = "TTYBRIDGE_LOG_DIR", value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}
