use serde::{Deserialize, Serialize};
use sqlx::{Sqlite, SqlitePool};
use uuid::Uuid;

use crate::{AppError, AppResult, clock};

/// Reserved `to` target meaning "all participants".
pub const BROADCAST: &str = "everyone";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// System-generated join/leave notice.
    Status,
    /// Public message.
    Message,
    /// Targeted message.
    PrivateMessage,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Status => "status",
            MessageKind::Message => "message",
            MessageKind::PrivateMessage => "private_message",
        }
    }
}

impl std::str::FromStr for MessageKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<MessageKind, AppError> {
        match s {
            "status" => Ok(MessageKind::Status),
            "message" => Ok(MessageKind::Message),
            "private_message" => Ok(MessageKind::PrivateMessage),
            other => Err(AppError::InvalidInput(format!(
                "unknown message type: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub from: String,
    pub to: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub time: String,
}

impl Message {
    pub fn new(from: &str, to: &str, text: &str, kind: MessageKind) -> Message {
        Message {
            from: from.to_owned(),
            to: to.to_owned(),
            text: text.to_owned(),
            kind,
            time: clock::wall_time(),
        }
    }

    pub fn joined(name: &str) -> Message {
        Message::new(name, BROADCAST, "joins the room", MessageKind::Status)
    }

    pub fn departed(name: &str) -> Message {
        Message::new(name, BROADCAST, "leaves the room", MessageKind::Status)
    }
}

/// Append one message to the log. Never retried; a storage error is the
/// caller's to report.
pub async fn append<'e, E>(executor: E, message: &Message) -> AppResult<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query("INSERT INTO messages (id, from_name, to_name, text, kind, time) VALUES (?, ?, ?, ?, ?, ?)")
        .bind(Uuid::now_v7().to_string())
        .bind(&message.from)
        .bind(&message.to)
        .bind(&message.text)
        .bind(message.kind.as_str())
        .bind(&message.time)
        .execute(executor)
        .await?;
    Ok(())
}

/// Everything visible to `name`: sent by them, addressed to them, or
/// broadcast. Append order. With a limit, the most recent N of that filtered
/// sequence, still oldest first.
pub async fn list_for(
    pool: &SqlitePool,
    name: &str,
    limit: Option<u32>,
) -> AppResult<Vec<Message>> {
    let rows: Vec<(String, String, String, String, String)> = sqlx::query_as(
        "SELECT from_name, to_name, text, kind, time FROM ( \
            SELECT rowid, * FROM messages \
            WHERE to_name = ? OR from_name = ? OR to_name = ? \
            ORDER BY rowid DESC LIMIT ? \
        ) ORDER BY rowid ASC",
    )
    .bind(name)
    .bind(name)
    .bind(BROADCAST)
    .bind(limit.map(i64::from).unwrap_or(-1))
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(from_row).collect()
}

/// The full log, in append order.
pub async fn list_all(pool: &SqlitePool) -> AppResult<Vec<Message>> {
    let rows: Vec<(String, String, String, String, String)> = sqlx::query_as(
        "SELECT from_name, to_name, text, kind, time FROM messages ORDER BY rowid ASC",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(from_row).collect()
}

fn from_row((from, to, text, kind, time): (String, String, String, String, String)) -> AppResult<Message> {
    Ok(Message {
        from,
        to,
        text,
        kind: kind.parse()?,
        time,
    })
}
