use axum::body::Body;
use axum::http::StatusCode;
use axum::response::Response;
use serde_json::json;

#[derive(Debug)]
pub enum Error {
    /// The persisted store is unavailable. Surfaced to the user as a generic
    /// failure with no automatic retry.
    Storage,
    /// Expected business condition, reported with the current counters.
    InsufficientBalance { free: i64, paid: i64 },
    /// Admin-supplied configuration value failed validation; nothing was
    /// written.
    InvalidConfig(String),
    /// A credit operation targeted an identity that has never interacted
    /// with the bot.
    UnknownUser(i64),
    /// The messaging platform rejected or failed an outbound call.
    Platform(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Storage => write!(f, "storage unavailable"),
            Error::InsufficientBalance { free, paid } => {
                write!(f, "insufficient balance (free: {}, paid: {})", free, paid)
            }
            Error::InvalidConfig(reason) => write!(f, "invalid config value: {}", reason),
            Error::UnknownUser(id) => write!(f, "unknown user {}", id),
            Error::Platform(reason) => write!(f, "platform error: {}", reason),
        }
    }
}

impl std::error::Error for Error {}

impl From<sqlx::Error> for Error {
    fn from(_: sqlx::Error) -> Self {
        Error::Storage
    }
}

impl axum::response::IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Error::Storage => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Storage unavailable, please try again" }),
            ),
            Error::InsufficientBalance { free, paid } => (
                StatusCode::CONFLICT,
                json!({ "error": "Not enough spins", "free": free, "paid": paid }),
            ),
            Error::InvalidConfig(reason) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": reason }),
            ),
            Error::UnknownUser(id) => (
                StatusCode::NOT_FOUND,
                json!({ "error": format!("User {} has not started the bot", id) }),
            ),
            Error::Platform(_) => (
                StatusCode::BAD_GATEWAY,
                json!({ "error": "Messaging platform error" }),
            ),
        };

        Response::builder()
            .status(status)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }
}
