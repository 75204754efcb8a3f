pub mod directory;

use axum::{
    Json, Router, debug_handler,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{AppError, AppResult, clock, messages::log, user_header};

pub use self::directory::Participant;

pub fn router() -> Router<crate::AppState> {
    Router::new().route("/", get(list_participants).post(register))
}

#[derive(Deserialize)]
pub(crate) struct RegisterBody {
    name: String,
}

#[debug_handler]
pub(crate) async fn register(
    State(db_pool): State<SqlitePool>,
    Json(RegisterBody { name }): Json<RegisterBody>,
) -> AppResult<Response> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput("name must not be blank".to_owned()));
    }

    let participant = directory::register(&db_pool, name, clock::now_ms()).await?;
    log::append(&db_pool, &log::Message::joined(name)).await?;
    tracing::info!(name, "participant joined");

    Ok((StatusCode::CREATED, Json(participant)).into_response())
}

#[debug_handler]
pub(crate) async fn list_participants(
    State(db_pool): State<SqlitePool>,
) -> AppResult<Json<Vec<Participant>>> {
    Ok(Json(directory::list(&db_pool).await?))
}

/// POST /status heartbeat; the sender comes from the `User` header.
#[debug_handler]
pub(crate) async fn status(
    State(db_pool): State<SqlitePool>,
    headers: HeaderMap,
) -> AppResult<StatusCode> {
    let name = user_header(&headers)?;
    directory::heartbeat(&db_pool, &name, clock::now_ms()).await?;
    Ok(StatusCode::OK)
}
