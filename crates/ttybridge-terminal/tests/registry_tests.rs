// Integration tests driving the registry through real PTYs, with a small
// shell script standing in for the interactive CLI.

use std::time::Duration;

use tempfile::TempDir;
use ttybridge_terminal::{LaunchConfig, SessionError, SessionRegistry};

// Prints a ready prompt, then answers each line. "stall" simulates a
// long-running turn that never reaches a prompt.
const ECHO_SERVER: &str = r#"
printf '> '
while IFS= read -r line; do
  case "$line" in
    hello) sleep 0.2; printf 'hi there\n> ' ;;
    stall*) sleep 30 ;;
    *) printf 'reply:%s\n> ' "$line" ;;
  esac
done
"#;

// Answers exactly one line, then exits.
const ONE_SHOT: &str = r#"
printf '> '
IFS= read -r line
printf 'reply:%s\n> ' "$line"
"#;

// Never produces any output at all.
const MUTE: &str = "sleep 30";

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

fn registry_with(script: &str, log_dir: &TempDir) -> SessionRegistry {
    let launch = LaunchConfig {
        program: "/bin/sh".into(),
        args: vec!["-c".to_string(), script.to_string()],
        startup_timeout: Duration::from_secs(10),
        ..LaunchConfig::default()
    };
    SessionRegistry::new(launch, log_dir.path().to_path_buf())
}

#[tokio::test]
async fn exchange_returns_reply_without_echo_or_prompt() {
    let dir = TempDir::new().unwrap();
    let registry = registry_with(ECHO_SERVER, &dir);

    let reply = registry
        .send("s1", "hello", SEND_TIMEOUT)
        .await
        .expect("exchange should succeed");
    assert_eq!(reply, "hi there");

    let sessions = registry.list_sessions().await;
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].session_id, "s1");
    assert!(sessions[0].pid > 0);
}

#[tokio::test]
async fn concurrent_sessions_complete_independently() {
    let dir = TempDir::new().unwrap();
    let registry = registry_with(ECHO_SERVER, &dir);

    let (stalled, normal) = tokio::join!(
        registry.send("a", "stall", Duration::from_secs(1)),
        registry.send("b", "ping", SEND_TIMEOUT),
    );

    assert!(matches!(stalled, Err(SessionError::ExchangeTimeout { .. })));
    assert_eq!(normal.unwrap(), "reply:ping");
    assert_eq!(registry.session_count().await, 2);
}

#[tokio::test]
async fn same_session_sends_are_serialized_and_paired() {
    let dir = TempDir::new().unwrap();
    let registry = registry_with(ECHO_SERVER, &dir);

    let (r0, r1, r2) = tokio::join!(
        registry.send("s1", "ping-0", SEND_TIMEOUT),
        registry.send("s1", "ping-1", SEND_TIMEOUT),
        registry.send("s1", "ping-2", SEND_TIMEOUT),
    );

    assert_eq!(r0.unwrap(), "reply:ping-0");
    assert_eq!(r1.unwrap(), "reply:ping-1");
    assert_eq!(r2.unwrap(), "reply:ping-2");
}

#[tokio::test]
async fn concurrent_first_messages_spawn_one_process() {
    let dir = TempDir::new().unwrap();
    let registry = registry_with(ECHO_SERVER, &dir);

    let (a, b) = tokio::join!(
        registry.send("dup", "ping-a", SEND_TIMEOUT),
        registry.send("dup", "ping-b", SEND_TIMEOUT),
    );

    assert_eq!(a.unwrap(), "reply:ping-a");
    assert_eq!(b.unwrap(), "reply:ping-b");
    assert_eq!(registry.list_sessions().await.len(), 1);
}

#[tokio::test]
async fn exchange_timeout_leaves_session_alive() {
    let dir = TempDir::new().unwrap();
    let registry = registry_with(ECHO_SERVER, &dir);

    // Warm the session up first so the short timeout hits the exchange,
    // not the spawn.
    registry.send("t1", "ping", SEND_TIMEOUT).await.unwrap();

    let result = registry.send("t1", "stall", Duration::from_millis(50)).await;
    assert!(matches!(result, Err(SessionError::ExchangeTimeout { .. })));

    let sessions = registry.list_sessions().await;
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].session_id, "t1");
}

#[tokio::test]
async fn dead_process_is_respawned_transparently() {
    let dir = TempDir::new().unwrap();
    let registry = registry_with(ONE_SHOT, &dir);

    let first = registry.send("r1", "one", SEND_TIMEOUT).await.unwrap();
    assert_eq!(first, "reply:one");
    let old_pid = registry.list_sessions().await[0].pid;

    // Give the one-shot script a moment to exit.
    tokio::time::sleep(Duration::from_millis(300)).await;

    let second = registry.send("r1", "two", SEND_TIMEOUT).await.unwrap();
    assert_eq!(second, "reply:two");
    let new_pid = registry.list_sessions().await[0].pid;
    assert_ne!(old_pid, new_pid);
}

#[tokio::test]
async fn startup_timeout_registers_nothing() {
    let dir = TempDir::new().unwrap();
    let launch = LaunchConfig {
        program: "/bin/sh".into(),
        args: vec!["-c".to_string(), MUTE.to_string()],
        startup_timeout: Duration::from_millis(500),
        ..LaunchConfig::default()
    };
    let registry = SessionRegistry::new(launch, dir.path().to_path_buf());

    let result = registry.send("s1", "ping", SEND_TIMEOUT).await;
    assert!(matches!(result, Err(SessionError::StartupTimeout { .. })));
    assert!(registry.list_sessions().await.is_empty());
}

#[tokio::test]
async fn idle_reaper_closes_only_stale_sessions() {
    let dir = TempDir::new().unwrap();
    let registry = registry_with(ECHO_SERVER, &dir);

    registry.send("fresh", "ping", SEND_TIMEOUT).await.unwrap();

    // Far below the threshold: nothing to reap.
    let closed = registry.close_idle_sessions(Duration::from_secs(3600)).await;
    assert!(closed.is_empty());
    assert_eq!(registry.session_count().await, 1);

    // Zero threshold: everything is stale.
    let closed = registry.close_idle_sessions(Duration::ZERO).await;
    assert_eq!(closed, vec!["fresh".to_string()]);
    assert!(registry.list_sessions().await.is_empty());
}

#[tokio::test]
async fn close_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let registry = registry_with(ECHO_SERVER, &dir);

    registry.send("c1", "ping", SEND_TIMEOUT).await.unwrap();
    assert!(registry.close("c1").await);
    assert!(!registry.close("c1").await);
    assert!(registry.list_sessions().await.is_empty());
}
