mod authentication;
pub mod client;
pub mod config;
mod data_formats;
mod db_helpers;
mod errors;
mod handlers;
pub mod interaction;
mod models;
pub mod roles;

use anyhow::Context;
pub use anyhow::Result;
use axum::http::StatusCode;
use axum::{routing::*, Extension, Json, Router};
use config::Config;
pub use data_formats::*;
pub use errors::{RequestErrorJsonWrapper, DEACTIVATED_CODE};
use handlers::*;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use std::{
    net::{SocketAddr, TcpListener},
    sync::Arc,
    time::Duration,
};
use tracing::info;

pub type JsonResponse<T> = (StatusCode, Json<T>);

/// Shared by every handler through an `Extension` layer.
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Arc<Self>> {
        let pool = init_db(&config.database_url).await?;
        if let Some(seed) = &config.admin_seed {
            db_helpers::seed_admin(&pool, seed).await?;
        }
        Ok(Arc::new(Self { pool, config }))
    }
}

pub async fn run_app(app: Router, state: Arc<AppState>) -> Result<()> {
    let address = state.config.bind_address;
    let app = app.layer(Extension(state));
    info!("Server listening on {}", address);
    axum::Server::try_bind(&address)
        .with_context(|| format!("Failed to bind {address}"))?
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

pub async fn init_db(db_url: &str) -> Result<SqlitePool> {
    let in_memory = db_url.contains(":memory:");
    if !in_memory && !Sqlite::database_exists(db_url).await.unwrap_or(false) {
        info!("Creating database {}", db_url);
        Sqlite::create_database(db_url)
            .await
            .with_context(|| format!("Failed to create database {db_url}"))?;
    }

    // Every connection to `:memory:` is its own database, so keep exactly one alive.
    let options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
    } else {
        SqlitePoolOptions::new().max_connections(8)
    };
    let pool = options
        .connect(db_url)
        .await
        .with_context(|| format!("Failed to connect to {db_url}"))?;

    info!("Running Migrations");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    info!("Migrations completed");
    Ok(pool)
}

pub fn get_random_free_port() -> Result<(u16, SocketAddr)> {
    let listener = TcpListener::bind("127.0.0.1:0").context("Could not get a free port")?;
    let addr = listener.local_addr()?;
    Ok((addr.port(), addr))
}

pub fn make_router() -> Router {
    Router::new()
        .route("/check_health", get(alive))
        .route("/users/login", post(login_user))
        .route("/users", post(register_user))
        .route("/users/:id/role", put(set_user_role))
        .route("/users/:id/status", put(set_user_status))
        .route("/user", get(get_current_user).put(update_user))
        .route("/posts", get(list_articles).post(create_article))
        .route(
            "/posts/:id",
            get(get_article)
                .post(toggle_interaction)
                .delete(delete_article),
        )
        .route("/posts/:id/recount", post(recount_article))
        .route("/events", get(list_events).post(create_event))
        .route("/events/:id", delete(delete_event))
        .fallback(not_found)
}
