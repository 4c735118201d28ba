// Web module - HTTP surface for the session engine

pub mod protocol;
pub mod routes;
pub mod server;

pub use server::WebServer;
