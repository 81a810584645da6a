//! Rubber Cert - Main Entry Point

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use rubber_cert_backend::{
    api::{self, AppState},
    config::{Config, StoreBackend},
    db,
    error::{AppError, Result},
    telemetry::{self, LogFormat},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    telemetry::init_tracing(LogFormat::from_env());

    let config = Config::from_env()?;
    tracing::info!(backend = ?config.store_backend, "Starting Rubber Cert backend");

    let app_state = match config.store_backend {
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .clone()
                .ok_or_else(|| AppError::Config("DATABASE_URL not set".into()))?;
            let db_pool = db::create_pool(&database_url, config.db_max_connections).await?;
            tracing::info!("Connected to database");

            db::run_migrations(&db_pool).await?;
            tracing::info!("Database migrations complete");

            AppState::with_postgres(config.clone(), db_pool)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            AppState::in_memory(config.clone())
        }
    };
    let state = Arc::new(app_state);

    let app = Router::new()
        .merge(api::routes::create_router(state))
        .layer(cors_layer(&config)?)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = config.bind_address.parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn cors_layer(config: &Config) -> Result<CorsLayer> {
    let Some(origins) = &config.cors_origins else {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    };

    let origins = origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|_| AppError::Config(format!("Invalid CORS origin '{}'", origin)))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]))
}
