use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors returned by editor handlers, mapped to HTTP statuses with a JSON
/// `{"error": ...}` body.
#[derive(thiserror::Error, Debug)]
pub enum EditorError {
    #[error("invalid file name '{0}'")]
    InvalidName(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    Conflict(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },
}

impl EditorError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            EditorError::InvalidName(_) | EditorError::BadRequest(_) => StatusCode::BAD_REQUEST,
            EditorError::NotFound(_) => StatusCode::NOT_FOUND,
            EditorError::Conflict(_) => StatusCode::CONFLICT,
            EditorError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for EditorError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{self}");
        } else {
            tracing::debug!(%status, "{self}");
        }
        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            EditorError::InvalidName("../x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            EditorError::NotFound("a.md".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            EditorError::Conflict("a.md".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            EditorError::io("write", std::io::Error::other("disk full")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
