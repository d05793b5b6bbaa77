use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// No data for the requested player, team or season.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed or out-of-set request parameter.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Upstream data is present but malformed or non-numeric.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The provider kept timing out until the retry budget ran out.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a body that is not JSON.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Prefix the message of a domain error with where it happened
    /// (e.g. `"hit rates for player 2544"`). Transport errors are returned unchanged.
    pub fn context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            AppError::NotFound(m) => AppError::NotFound(format!("{ctx}: {m}")),
            AppError::InvalidArgument(m) => AppError::InvalidArgument(format!("{ctx}: {m}")),
            AppError::InvalidInput(m) => AppError::InvalidInput(format!("{ctx}: {m}")),
            AppError::UpstreamUnavailable(m) => {
                AppError::UpstreamUnavailable(format!("{ctx}: {m}"))
            }
            other => other,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Http(_) | AppError::Json(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_) | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let body = serde_json::json!({ "detail": self.to_string() });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_prefixes_domain_errors() {
        let err = AppError::NotFound("no game logs for season 2023-24".to_string())
            .context("hit rates for player 2544");
        assert_eq!(
            err.to_string(),
            "Not found: hit rates for player 2544: no game logs for season 2023-24"
        );
    }

    #[test]
    fn context_leaves_transport_errors_alone() {
        let err = AppError::Config("bad".to_string()).context("ignored");
        assert_eq!(err.to_string(), "Configuration error: bad");
    }

    #[test]
    fn each_domain_kind_has_its_own_status() {
        assert_eq!(AppError::NotFound(String::new()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::InvalidArgument(String::new()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::InvalidInput(String::new()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::UpstreamUnavailable(String::new()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn malformed_provider_body_is_bad_gateway() {
        let err: AppError = serde_json::from_str::<serde_json::Value>("<html>")
            .unwrap_err()
            .into();
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert!(err.to_string().starts_with("JSON parse error"));
    }
}
