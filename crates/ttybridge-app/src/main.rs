use anyhow::Result;
use clap::Parser;

use ttybridge::{Cli, Config, WebServer};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::resolve(cli)?;

    WebServer::new(config).start().await
}
