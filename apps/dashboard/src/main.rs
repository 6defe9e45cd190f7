//! # Tally Dashboard Server
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Dashboard Server                                 │
//! │                                                                         │
//! │  Browser ───► HTTP (3000) ───► Router ───► SaleRecorder ───► SQLite    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```bash
//! # Serve
//! cargo run -p tally-dashboard
//!
//! # Print a session token for a seeded user
//! cargo run -p tally-dashboard -- issue-token admin@tally.local
//! ```

use std::sync::Arc;

use anyhow::{bail, Context};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tally_dashboard::{router, AppState, DashboardConfig, JwtSessionProvider};
use tally_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config = DashboardConfig::load().context("loading configuration")?;
    info!(
        addr = %config.bind_address(),
        database = %config.database_path,
        page_size = config.listing_page_size,
        "Configuration loaded"
    );

    let db = Database::new(DbConfig::new(&config.database_path))
        .await
        .context("opening database")?;

    let sessions = JwtSessionProvider::new(config.jwt_secret.clone(), config.session_lifetime_secs);

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Some(command) = args.first() {
        return match (command.as_str(), args.get(1)) {
            ("issue-token", Some(email)) => issue_token(&db, &sessions, email).await,
            _ => bail!("usage: dashboard [issue-token <email>]"),
        };
    }

    let bind_addr = config.bind_address();
    let state = AppState::new(db.clone(), Arc::new(sessions), config);
    let app = router(state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    info!(addr = %bind_addr, "Dashboard server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Prints a session token for an existing user.
async fn issue_token(db: &Database, sessions: &JwtSessionProvider, email: &str) -> anyhow::Result<()> {
    let Some(user) = db.users().get_by_email(email).await? else {
        bail!("no user with email {email}");
    };

    let token = sessions.issue_token(user.id, &user.email)?;
    println!("{token}");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
