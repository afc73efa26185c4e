//! REST API for the alarm hub
//!
//! Thin HTTP translation of the [`crate::service::AlarmService`] surface
//! plus a read-only diagnostic view of the scheduler. The wire layer stays
//! deliberately small: request/response mapping, auth, nothing else.
//!
//! ## Endpoints
//!
//! - `GET /api/v1/health` - Health check
//! - `GET /api/v1/scheduler` - Scheduler/store diagnostic state
//! - `PUT /api/v1/tenants/{tenant}/regions/{region}/alarms` - Upsert one alarm
//! - `POST /api/v1/tenants/{tenant}/regions/{region}/alarms/delete` - Batch delete
//! - `GET /api/v1/tenants/{tenant}/regions/{region}/alarms` - Describe alarms

#[cfg(feature = "api")]
pub mod error;
#[cfg(feature = "api")]
pub mod middleware;
#[cfg(feature = "api")]
pub mod routes;
#[cfg(feature = "api")]
pub mod state;
#[cfg(feature = "api")]
pub mod types;

#[cfg(feature = "api")]
pub use error::{ApiError, ApiResult};
#[cfg(feature = "api")]
pub use state::ApiState;

#[cfg(feature = "api")]
use axum::{
    Router,
    routing::{get, post, put},
};
use std::net::SocketAddr;
use tracing::info;

use crate::config::ApiSettings;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address (e.g., "0.0.0.0:8080")
    pub bind_addr: SocketAddr,

    /// Optional authentication token
    pub auth_token: Option<String>,

    /// Enable CORS for external tooling
    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".parse().unwrap(),
            auth_token: None,
            enable_cors: true,
        }
    }
}

impl ApiConfig {
    pub fn from_settings(settings: &ApiSettings) -> anyhow::Result<Self> {
        Ok(Self {
            bind_addr: settings
                .bind_addr
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid api bind address: {e}"))?,
            auth_token: settings.auth_token.clone(),
            enable_cors: settings.enable_cors,
        })
    }
}

/// Spawn the API server
///
/// This starts an Axum HTTP server in a background task.
/// Returns the server's local address.
#[cfg(feature = "api")]
pub async fn spawn_api_server(config: ApiConfig, state: ApiState) -> anyhow::Result<SocketAddr> {
    use tower_http::cors::{Any, CorsLayer};
    use tower_http::trace::TraceLayer;

    info!("starting API server on {}", config.bind_addr);

    let mut app = Router::new()
        .route("/api/v1/health", get(routes::health::health_check))
        .route("/api/v1/scheduler", get(routes::scheduler::scheduler_state))
        .route(
            "/api/v1/tenants/:tenant/regions/:region/alarms",
            put(routes::alarms::put_alarm).get(routes::alarms::describe_alarms),
        )
        .route(
            "/api/v1/tenants/:tenant/regions/:region/alarms/delete",
            post(routes::alarms::delete_alarms),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    // Add CORS if enabled
    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    // Add auth middleware if token provided
    if let Some(token) = config.auth_token {
        app = app.layer(axum::middleware::from_fn_with_state(
            token,
            middleware::auth::auth_middleware,
        ));
    }

    // Bind and serve
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok(addr)
}
