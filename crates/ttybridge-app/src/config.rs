use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use ttybridge_terminal::{LaunchConfig, DEFAULT_COLS, DEFAULT_ROWS};

use crate::cli::Cli;

/// Resolved runtime configuration. Values come from the environment (via
/// clap's env fallbacks), with command-line flags taking precedence.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub claude_bin: PathBuf,
    pub default_timeout: Duration,
    pub startup_timeout: Duration,
    pub idle_threshold: Duration,
    pub reap_period: Duration,
    pub log_dir: PathBuf,
    /// Forwarded into the child environment as ANTHROPIC_API_KEY when set.
    pub api_key: Option<String>,
}

impl Config {
    pub fn resolve(cli: Cli) -> Result<Self> {
        let bind_addr: SocketAddr = format!("{}:{}", cli.host, cli.port)
            .parse()
            .context("Invalid listen address")?;

        let home = home_dir()?;
        let claude_bin = cli
            .claude_bin
            .unwrap_or_else(|| home.join(".local").join("bin").join("claude"));
        let log_dir = cli
            .log_dir
            .unwrap_or_else(|| home.join(".ttybridge").join("logs"));

        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .ok()
            .filter(|key| !key.is_empty());

        Ok(Self {
            bind_addr,
            claude_bin,
            default_timeout: secs(cli.timeout),
            startup_timeout: secs(cli.startup_timeout),
            idle_threshold: secs(cli.idle_timeout),
            reap_period: secs(cli.reap_interval),
            log_dir,
            api_key,
        })
    }

    /// Launch settings handed to the session engine. The CLI runs through
    /// its full interactive entry point; permission prompts are disabled so
    /// nothing ever blocks waiting for a human at the terminal.
    pub fn launch_config(&self) -> LaunchConfig {
        let mut env = Vec::new();
        if let Some(key) = &self.api_key {
            env.push(("ANTHROPIC_API_KEY".to_string(), key.clone()));
        }

        LaunchConfig {
            program: self.claude_bin.clone(),
            args: vec!["--dangerously-skip-permissions".to_string()],
            env,
            path_prepend: home_dir().ok().map(|home| home.join(".local").join("bin")),
            cols: DEFAULT_COLS,
            rows: DEFAULT_ROWS,
            startup_timeout: self.startup_timeout,
        }
    }
}

fn secs(value: f64) -> Duration {
    Duration::from_secs_f64(value.max(0.0))
}

fn home_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .context("Failed to get home directory")?;
    Ok(PathBuf::from(home))
}
