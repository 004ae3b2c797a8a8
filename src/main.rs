//! SkillSwap Backend
//!
//! REST backend for proposing and tracking skill exchanges, with a retrying
//! client for the static mock catalog API.

mod api;
mod auth;
mod catalog;
mod client;
mod config;
mod db;
mod errors;
mod exchanges;
mod models;
mod preferences;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use client::MockDataClient;
use config::{Config, StorageBackend};
use db::{KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore};
use exchanges::ExchangeStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub exchanges: Arc<Mutex<ExchangeStore>>,
    pub storage: Arc<dyn KeyValueStore>,
    pub client: MockDataClient,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting SkillSwap Backend");
    tracing::info!("Storage: {:?}", config.storage);
    tracing::info!("Mock data API: {} ({:?})", config.mock_api_url, config.data_source);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (SKILLSWAP_API_PSK). Authentication is disabled!");
    }

    // Initialize persistence
    let storage: Arc<dyn KeyValueStore> = match config.storage {
        StorageBackend::Sqlite => {
            tracing::info!("Database path: {:?}", config.db_path);
            let pool = db::init_database(&config.db_path).await?;
            Arc::new(SqliteKeyValueStore::new(pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; state is lost on restart");
            Arc::new(MemoryKeyValueStore::new())
        }
    };

    let exchanges = ExchangeStore::load(storage.clone(), config.transition_mode).await?;

    let client = MockDataClient::new(
        &config.mock_api_url,
        config.data_source,
        config.http_timeout,
    )?;

    let state = AppState {
        exchanges: Arc::new(Mutex::new(exchanges)),
        storage,
        client,
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let psk = state.config.api_psk.clone();

    let api_routes = Router::new()
        // Exchanges
        .route(
            "/exchanges",
            get(api::list_exchanges).post(api::propose_exchange),
        )
        .route("/exchanges/{id}", get(api::get_exchange))
        .route("/exchanges/{id}/accept", post(api::accept_exchange))
        .route("/exchanges/{id}/finish", post(api::finish_exchange))
        .route("/exchanges/{id}/resume", post(api::resume_exchange))
        .route("/exchanges/{id}/cancel", post(api::cancel_exchange))
        .route(
            "/users/{user_id}/exchanges/incoming",
            get(api::incoming_requests),
        )
        .route(
            "/users/{user_id}/exchanges/active",
            get(api::active_exchanges),
        )
        // Catalog
        .route("/catalog/{resource}", get(api::get_resource))
        .route("/skills", get(api::list_skills))
        .route("/users-data", get(api::get_users_data))
        // Preferences
        .route(
            "/preferences/theme",
            get(api::get_theme_preference)
                .put(api::put_theme_preference)
                .delete(api::delete_theme_preference),
        )
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check and static mock data (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .nest_service("/db", ServeDir::new(&state.config.data_dir));

    Router::new()
        .nest("/api", api_routes)
        .merge(public_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
