// ttybridge application crate: configuration and the HTTP surface over the
// PTY session engine.

pub mod cli;
pub mod config;
pub mod web;

pub use cli::Cli;
pub use config::Config;
pub use web::server::WebServer;
