pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;

use std::sync::{Arc, Mutex};

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use srs_core::{StudySessionManager, StudySettings};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::SqliteRepository;
use crate::error::{ApiError, Result};

pub type Manager = StudySessionManager<SqliteRepository>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    manager: Arc<Mutex<Manager>>,
}

impl AppState {
    pub fn new(repo: SqliteRepository, settings: StudySettings) -> Self {
        Self {
            manager: Arc::new(Mutex::new(StudySessionManager::with_settings(
                repo, settings,
            ))),
        }
    }

    /// Run `f` with exclusive access to the manager on the blocking pool.
    ///
    /// A panic inside `f` comes back as an internal error and the poisoned
    /// lock is recovered on the next call.
    pub async fn with_manager<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Manager) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let manager = Arc::clone(&self.manager);
        tokio::task::spawn_blocking(move || {
            let guard = manager.lock().unwrap_or_else(|poisoned| {
                tracing::warn!("manager lock poisoned by an earlier panic, recovering");
                poisoned.into_inner()
            });
            f(&guard)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("manager task failed: {e}")))?
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let protected_routes = Router::new()
        // Deck routes
        .route("/api/decks", get(routes::decks::list).post(routes::decks::create))
        .route("/api/decks/:id", get(routes::decks::get))
        .route("/api/decks/:id/access", post(routes::decks::grant_access))
        .route("/api/decks/:id/due", get(routes::decks::due))
        // Session routes
        .route(
            "/api/sessions",
            get(routes::sessions::list_active).post(routes::sessions::start),
        )
        .route("/api/sessions/:id", get(routes::sessions::get))
        .route("/api/sessions/:id/answers", post(routes::sessions::answer))
        .route("/api/sessions/:id/break", post(routes::sessions::take_break))
        .route("/api/sessions/:id/resume", post(routes::sessions::resume))
        .route("/api/sessions/:id/complete", post(routes::sessions::complete))
        .route("/api/sessions/:id/abandon", post(routes::sessions::abandon))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            routes::auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/users/register", post(routes::users::register))
        .merge(protected_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    tracing::info!("Opening database at {}", config.database_path);
    let repo = SqliteRepository::open(&config.database_path)?;

    let app = router(AppState::new(repo, config.study.clone()));

    let addr = config.addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
