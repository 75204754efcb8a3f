pub mod clock;
pub mod config;
pub mod error;
pub mod messages;
pub mod participants;
pub mod reaper;
pub mod store;

use axum::{Router, extract::FromRef, http::HeaderMap, routing::post};
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;

pub use error::{AppError, AppResult};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
}

pub fn app(app_state: AppState) -> Router {
    Router::new()
        .nest("/participants", participants::router())
        .nest("/messages", messages::router())
        .route("/status", post(participants::status))
        .with_state(app_state)
        .layer(CorsLayer::permissive())
}

/// Sender identity arrives out-of-band in the `User` header.
pub(crate) fn user_header(headers: &HeaderMap) -> AppResult<String> {
    let name = headers
        .get("user")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .unwrap_or_default();

    if name.is_empty() {
        return Err(AppError::InvalidInput("missing User header".to_owned()));
    }
    Ok(name.to_owned())
}
