// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use axum::http::{HeaderName, HeaderValue};
use chrono::Utc;
use taskflow_server::config::Settings;
use taskflow_server::state::AppState;
use taskflow_server::{database, routes};
use tokio::time::{self, Duration};
use tower_http::cors::{Any, CorsLayer};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting up the server...");

    let settings = Settings::from_env()?;

    let db_pool = match database::establish_connection_pool(&settings.database_url).await {
        Ok(pool) => {
            tracing::info!("Database connection was made successfully.");
            pool
        }
        Err(e) => {
            tracing::error!("Failed to connect with the database: {:?}", e);
            std::process::exit(1);
        }
    };

    let prune_pool = db_pool.clone(); // Clone the pool for the session cleanup task

    tokio::spawn(async move {
        let mut interval = time::interval(Duration::from_secs(5 * 60)); // Check every 5 minutes

        // The first tick completes immediately. Skip it to wait for the first interval.
        interval.tick().await;

        loop {
            interval.tick().await;

            match database::prune_expired_sessions(&prune_pool, Utc::now()).await {
                Ok(0) => tracing::debug!("No expired sessions to prune."),
                Ok(count) => tracing::info!("Pruned {} expired sessions.", count),
                Err(e) => tracing::error!("Error while pruning expired sessions: {:?}", e),
            }
        }
    });

    let state = AppState::new(db_pool, settings.session_ttl);
    let app_routes = routes::create_router(state);

    let origin: HeaderValue = settings
        .cors_origin
        .parse()
        .with_context(|| format!("Invalid TASKFLOW_CORS_ORIGIN '{}'", settings.cors_origin))?;
    let cors = CorsLayer::new()
        .allow_methods(Any)
        // Explicit list of the headers the frontend sends.
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("accept"),
            HeaderName::from_static("authorization"),
        ])
        .allow_origin(origin);

    let app = app_routes.layer(cors); // Apply the CORS layer

    tracing::info!("The server listens on http://{}", settings.addr);

    let listener = tokio::net::TcpListener::bind(settings.addr)
        .await
        .with_context(|| format!("Failed to bind {}", settings.addr))?;
    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
