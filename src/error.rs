use axum::{extract::rejection::QueryRejection, http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Upstream {status} from {url}")]
    UpstreamStatus { status: u16, url: String },

    #[error("Malformed upstream payload: {0}")]
    MalformedPayload(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Errors that mean "this source is unavailable": the caller moves on to the
    /// next source in its fallback chain, or degrades to an empty result.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            AppError::Http(_)
                | AppError::Json(_)
                | AppError::UpstreamStatus { .. }
                | AppError::MalformedPayload(_)
        )
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = serde_json::json!({ "ok": false, "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_classification() {
        assert!(AppError::UpstreamStatus { status: 503, url: "x".into() }.is_upstream());
        assert!(AppError::MalformedPayload("no table".into()).is_upstream());
        assert!(!AppError::InvalidRequest("bad type".into()).is_upstream());
        assert!(!AppError::Config("missing".into()).is_upstream());
    }

    #[test]
    fn invalid_request_maps_to_400() {
        let resp = AppError::InvalidRequest("type must be HITTER or PITCHER".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = AppError::Config("KBO_JSON_URL not set".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
