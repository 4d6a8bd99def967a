mod caching;
mod health;

pub use caching::Cache;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use axum::response::IntoResponse;
use axum::{routing::get, Extension, Router};
use futures::{try_join, TryFutureExt};
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tracing::{error, info};

use crate::health::HealthCheckable;
use crate::refresh::Refresher;
use crate::serve::health::ServeHealth;
use crate::stamp_rate::StampRateApiHttp;
use crate::transactions::TransactionsApiHttp;
use crate::{env, log};

pub type StateExtension = Extension<Arc<State>>;

pub struct State {
    pub cache: Cache,
    pub health: ServeHealth,
}

pub async fn start_server() -> Result<()> {
    log::init();

    let started_on = chrono::Utc::now();

    let shared_state = Arc::new(State {
        cache: Cache::new(),
        health: ServeHealth::new(started_on),
    });

    let update_cache_thread = caching::update_cache_periodically(
        shared_state.clone(),
        StampRateApiHttp::new(),
        TransactionsApiHttp::new(),
        Refresher::new(),
    );

    let app = Router::new()
        .route("/api/v1/fees/burn-stats", get(caching::burn_stats_handler))
        .route(
            "/api/v1/fees/healthz",
            get(|state: StateExtension| async move {
                state.health.health_status().into_response()
            }),
        )
        .route(
            "/healthz",
            get(|state: StateExtension| async move {
                state.health.health_status().into_response()
            }),
        )
        .layer(
            ServiceBuilder::new()
                .layer(CompressionLayer::new())
                .layer(Extension(shared_state)),
        );

    let host = if env::ENV_CONFIG.bind_public_interface {
        "0.0.0.0"
    } else {
        "127.0.0.1"
    };
    let port = env::get_env_var("PORT").unwrap_or_else(|| "3002".to_string());

    info!(port, "server listening");
    let socket_addr = format!("{host}:{port}").parse()?;
    let server_thread = axum::Server::bind(&socket_addr).serve(app.into_make_service());

    try_join!(
        update_cache_thread.map_err(|err| {
            error!("update cache thread exited: {}", err);
            anyhow!(err)
        }),
        server_thread.map_err(|err| {
            error!("server thread exited: {}", err);
            anyhow!(err)
        })
    )?;

    Ok(())
}
