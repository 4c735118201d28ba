use anyhow::Result;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use ttybridge_terminal::{spawn_idle_reaper, SessionRegistry};

use crate::config::Config;
use crate::web::routes::{self, AppState};

/// Web server instance owning the session registry.
pub struct WebServer {
    config: Config,
    registry: Arc<SessionRegistry>,
}

impl WebServer {
    /// Create a new web server; the registry is the composition root's only
    /// piece of shared state.
    pub fn new(config: Config) -> Self {
        let registry = Arc::new(SessionRegistry::new(
            config.launch_config(),
            config.log_dir.clone(),
        ));
        Self { config, registry }
    }

    /// Bind, start the idle reaper, and serve until ctrl-c. All sessions are
    /// closed on the way out so no CLI processes outlive the server.
    pub async fn start(self) -> Result<()> {
        let state = AppState {
            registry: self.registry.clone(),
            default_timeout: self.config.default_timeout,
        };

        // CORS is wide open: the server binds to loopback by default and
        // relay bots are the only expected callers.
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        let app = routes::create_router(state).layer(cors);

        let reaper = spawn_idle_reaper(
            self.registry.clone(),
            self.config.reap_period,
            self.config.idle_threshold,
        );

        println!("🌐 ttybridge listening on http://{}", self.config.bind_addr);
        println!("   CLI binary: {}", self.config.claude_bin.display());
        println!("   Session logs: {}", self.config.log_dir.display());

        let listener = tokio::net::TcpListener::bind(&self.config.bind_addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await?;

        println!("Shutting down, closing {} session(s)", self.registry.session_count().await);
        reaper.abort();
        self.registry.close_all().await;

        Ok(())
    }

    /// Get the session registry (for embedding or tests)
    pub fn registry(&self) -> Arc<SessionRegistry> {
        self.registry.clone()
    }
}
