// Quick test utility for a running ttybridge server.
//
// Usage: ttybridge-client "hello" --session my-bot
// With no message it prints the server's health instead.

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use serde_json::json;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "ttybridge-client")]
#[command(about = "Send a message to a running ttybridge server")]
struct Cli {
    /// Message to send; prints server health when omitted
    message: Option<String>,

    /// Conversation identifier
    #[arg(short, long, default_value = "cli-test")]
    session: String,

    /// Server base URL
    #[arg(long, env = "TTYBRIDGE_URL", default_value = "http://127.0.0.1:8765")]
    url: String,

    /// Reply timeout in seconds
    #[arg(short, long, env = "CLAUDE_TIMEOUT_DEFAULT", default_value_t = 20.0)]
    timeout: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let Some(message) = cli.message else {
        let health: serde_json::Value = client
            .get(format!("{}/health", cli.url))
            .send()
            .await
            .context("Cannot connect to ttybridge server - is it running?")?
            .json()
            .await?;
        println!("{}", serde_json::to_string_pretty(&health)?);
        return Ok(());
    };

    println!(
        "{} [{}] {:?} (timeout={}s)",
        "→".cyan(),
        cli.session,
        message,
        cli.timeout
    );

    let resp = client
        .post(format!("{}/chat", cli.url))
        .json(&json!({
            "session_id": cli.session,
            "message": message,
            "timeout": cli.timeout,
        }))
        // Leave headroom over the server-side exchange timeout.
        .timeout(Duration::from_secs_f64(cli.timeout + 10.0))
        .send()
        .await
        .context("Cannot connect to ttybridge server - is it running?")?;

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.context("Invalid response body")?;

    if !status.is_success() {
        let detail = body
            .get("error")
            .and_then(|e| e.as_str())
            .unwrap_or("unknown error");
        bail!("server error ({}): {}", status, detail);
    }

    let reply = body
        .get("response")
        .and_then(|r| r.as_str())
        .unwrap_or("(no response)");
    println!("{}", "← Response:".green());
    println!("{}", reply);

    Ok(())
}
