//! parley-server – entry point.
//!
//! Startup order:
//! 1. Parse configuration from environment variables.
//! 2. Initialise structured tracing (JSON in production, pretty in dev).
//! 3. Build the backend client and the shared state (conversation store,
//!    readiness cell).
//! 4. Spawn the readiness monitor and the session sweeper as background
//!    tasks.
//! 5. Build the Axum router and start the HTTP server with graceful
//!    shutdown.

mod config;
mod error;
mod middleware;
mod routes;
mod schemas;
mod session;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use parley_core::{monitor, BackendClient, ConversationStore, DaemonAdmin, StatusCell};

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Configuration ───────────────────────────────────────────────────────
    let cfg = Config::from_env();

    // ── 2. Tracing ─────────────────────────────────────────────────────────────
    // Build the log-level filter, warning loudly if the configured value is
    // not a valid tracing filter expression.
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match cfg.log_level.parse::<tracing_subscriber::EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: PARLEY_LOG='{}' is not a valid tracing filter ({}); \
                     falling back to 'info'",
                    cfg.log_level, e
                );
                tracing_subscriber::EnvFilter::new("info")
            }
        },
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true);

    if cfg.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!(version = env!("CARGO_PKG_VERSION"), "parley-server starting");

    // ── 3. Shared application state ────────────────────────────────────────────
    let client = Arc::new(
        BackendClient::new(
            cfg.backend_url.clone(),
            cfg.model.clone(),
            cfg.generation_options(),
            cfg.request_timeout,
        )
        .map_err(|e| anyhow::anyhow!("failed to build backend client: {e}"))?,
    );
    let store = Arc::new(ConversationStore::new(cfg.history_cap, cfg.session_ttl));
    let status = Arc::new(StatusCell::new());

    let state = Arc::new(AppState {
        config: Arc::new(cfg.clone()),
        client: Arc::clone(&client),
        store: Arc::clone(&store),
        status: Arc::clone(&status),
    });

    // ── 4. Background tasks ────────────────────────────────────────────────────
    // Readiness monitor: runs the startup sequence once, then exits.
    let admin = DaemonAdmin::new(Arc::clone(&client), cfg.launch_command.clone(), cfg.launch_args.clone());
    tokio::spawn(monitor::run(admin, cfg.monitor_config(), Arc::clone(&status)));

    // Session sweeper: drops conversations idle past the TTL.
    let sweep_store = Arc::clone(&store);
    let sweep_every = Duration::from_secs(60).min(cfg.session_ttl.max(Duration::from_secs(1)));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_every);
        ticker.tick().await; // first tick completes immediately
        loop {
            ticker.tick().await;
            let removed = sweep_store.sweep_expired();
            if removed > 0 {
                debug!(removed, "expired sessions swept");
            }
        }
    });

    // ── 5. HTTP server with graceful shutdown ──────────────────────────────────
    let app = routes::build(Arc::clone(&state));
    let addr: SocketAddr = cfg.bind_address.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, model = %cfg.model, backend = %cfg.backend_url, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("parley-server stopped");
    Ok(())
}

/// Returns a future that resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received; starting graceful shutdown");
}
