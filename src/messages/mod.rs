pub mod log;

use axum::{
    Json, Router, debug_handler,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::get,
};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{AppError, AppResult, participants::directory, user_header};

use self::log::{Message, MessageKind};

pub fn router() -> Router<crate::AppState> {
    Router::new().route("/", get(list_messages).post(post_message))
}

#[derive(Deserialize)]
pub(crate) struct PostMessageBody {
    to: String,
    text: String,
    #[serde(rename = "type")]
    kind: MessageKind,
}

#[derive(Deserialize)]
pub(crate) struct ListQuery {
    limit: Option<u32>,
}

#[debug_handler]
pub(crate) async fn post_message(
    State(db_pool): State<SqlitePool>,
    headers: HeaderMap,
    Json(PostMessageBody { to, text, kind }): Json<PostMessageBody>,
) -> AppResult<StatusCode> {
    let from = user_header(&headers)?;

    if to.trim().is_empty() || text.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "to and text must not be blank".to_owned(),
        ));
    }
    if kind == MessageKind::Status {
        return Err(AppError::InvalidInput(
            "clients may not post status messages".to_owned(),
        ));
    }
    // the only directory check at write time: the sender must be in the room
    if !directory::exists(&db_pool, &from).await? {
        return Err(AppError::NotFound(from));
    }

    log::append(&db_pool, &Message::new(&from, &to, &text, kind)).await?;
    Ok(StatusCode::CREATED)
}

#[debug_handler]
pub(crate) async fn list_messages(
    State(db_pool): State<SqlitePool>,
    headers: HeaderMap,
    Query(ListQuery { limit }): Query<ListQuery>,
) -> AppResult<Json<Vec<Message>>> {
    let name = user_header(&headers)?;
    Ok(Json(log::list_for(&db_pool, &name, limit).await?))
}
