use std::io::{ErrorKind, Read, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};

use super::error::SessionError;
use super::filter::is_prompt_ready;
use super::{
    DEFAULT_COLS, DEFAULT_ROWS, DEFAULT_STARTUP_TIMEOUT, IDLE_STABILITY_WINDOW, POLL_INTERVAL,
    SHUTDOWN_GRACE,
};

/// How the external CLI is launched for every session.
#[derive(Debug, Clone)]
pub struct LaunchConfig {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Extra variables for the child environment (forwarded credentials).
    pub env: Vec<(String, String)>,
    /// Directory prepended to the child's PATH, if any.
    pub path_prepend: Option<PathBuf>,
    pub cols: u16,
    pub rows: u16,
    /// The CLI takes several seconds to draw its first prompt.
    pub startup_timeout: Duration,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("claude"),
            args: vec!["--dangerously-skip-permissions".to_string()],
            env: Vec::new(),
            path_prepend: None,
            cols: DEFAULT_COLS,
            rows: DEFAULT_ROWS,
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
        }
    }
}

/// Owns one PTY master and the process attached to its slave side.
///
/// All methods block; callers run them on worker threads, never on the
/// scheduler. The master descriptor is owned exclusively and closed exactly
/// once when the handler drops.
pub struct PtyHandler {
    master: Box<dyn MasterPty + Send>,
    child: Box<dyn Child + Send + Sync>,
    reader: Box<dyn Read + Send>,
    writer: Box<dyn Write + Send>,
    pid: u32,
}

impl PtyHandler {
    /// Allocate a PTY pair and launch the CLI attached to the slave side.
    ///
    /// The child gets its own session and controlling tty; the parent keeps
    /// only the master, set non-blocking so the read loop can interleave
    /// polling with idle-window checks.
    pub fn spawn(config: &LaunchConfig) -> Result<Self, SessionError> {
        let pty_system = native_pty_system();

        let pty_pair = pty_system
            .openpty(PtySize {
                rows: config.rows,
                cols: config.cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| SessionError::Spawn(format!("openpty failed: {}", e)))?;

        let mut cmd = CommandBuilder::new(&config.program);
        cmd.args(&config.args);
        cmd.env("TERM", "xterm-256color");
        if let Some(dir) = &config.path_prepend {
            let path = std::env::var("PATH").unwrap_or_default();
            cmd.env("PATH", format!("{}:{}", dir.display(), path));
        }
        for (key, value) in &config.env {
            cmd.env(key, value);
        }
        if let Ok(cwd) = std::env::current_dir() {
            cmd.cwd(cwd);
        }

        let child = pty_pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| SessionError::Spawn(format!("failed to spawn {:?}: {}", config.program, e)))?;

        // Only the child needs the slave side.
        drop(pty_pair.slave);

        let master = pty_pair.master;
        let pid = child
            .process_id()
            .ok_or_else(|| SessionError::Spawn("spawned child has no pid".to_string()))?;

        #[cfg(unix)]
        if let Some(fd) = master.as_raw_fd() {
            unsafe {
                let flags = libc::fcntl(fd, libc::F_GETFL);
                libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK);
            }
        }

        let reader = master
            .try_clone_reader()
            .map_err(|e| SessionError::Spawn(format!("failed to clone PTY reader: {}", e)))?;
        let writer = master
            .take_writer()
            .map_err(|e| SessionError::Spawn(format!("failed to take PTY writer: {}", e)))?;

        Ok(Self {
            master,
            child,
            reader,
            writer,
            pid,
        })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Send one message line to the program, as if typed.
    pub fn write_line(&mut self, message: &str) -> std::io::Result<()> {
        self.writer.write_all(message.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }

    /// Drain the master until a ready prompt is detected or the deadline
    /// elapses, returning whatever accumulated either way.
    ///
    /// Output interleaves redraws and partial frames, so a prompt is only
    /// tested for once the stream has been quiet for the full idle-stability
    /// window; stopping at the first quiet moment would truncate mid-render
    /// frames. Deadline expiry is not a failure at this layer - the caller
    /// decides how to classify a prompt-less result.
    pub fn read_until_ready(&mut self, timeout: Duration) -> Result<String, SessionError> {
        let deadline = Instant::now() + timeout;
        let mut accumulated: Vec<u8> = Vec::new();
        let mut buffer = vec![0u8; 4096];
        let mut last_data = Instant::now();

        loop {
            match self.reader.read(&mut buffer) {
                // EOF: the child is gone; hand back whatever arrived.
                Ok(0) => break,
                Ok(n) => {
                    accumulated.extend_from_slice(&buffer[..n]);
                    last_data = Instant::now();
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                    if !accumulated.is_empty() && last_data.elapsed() >= IDLE_STABILITY_WINDOW {
                        let text = String::from_utf8_lossy(&accumulated);
                        if is_prompt_ready(&text) {
                            break;
                        }
                        // Quiet but no prompt: the program may be thinking
                        // or mid-render, keep waiting.
                    }
                    if Instant::now() >= deadline {
                        break;
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
                #[cfg(unix)]
                // Linux reports EIO on the master once the slave side closes.
                Err(e) if e.raw_os_error() == Some(libc::EIO) => break,
                Err(e) => return Err(SessionError::Io(e)),
            }

            if Instant::now() >= deadline {
                break;
            }
        }

        Ok(String::from_utf8_lossy(&accumulated).into_owned())
    }

    /// Non-invasive liveness probe.
    pub fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Graceful process-group termination, escalating to a hard kill if the
    /// process survives the grace period. Tolerates an already-dead child.
    pub fn terminate(&mut self) {
        #[cfg(unix)]
        if let Some(pgid) = self.master.process_group_leader() {
            unsafe {
                libc::killpg(pgid, libc::SIGTERM);
            }
        }

        std::thread::sleep(SHUTDOWN_GRACE);
        if self.is_alive() {
            let _ = self.child.kill();
        }
        let _ = self.child.try_wait();
    }
}

impl Drop for PtyHandler {
    fn drop(&mut self) {
        if self.is_alive() {
            #[cfg(unix)]
            if let Some(pgid) = self.master.process_group_leader() {
                unsafe {
                    libc::killpg(pgid, libc::SIGKILL);
                }
            }
            let _ = self.child.kill();
        }
    }
}
