use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Prediction backend unreachable: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Prediction backend returned {status}: {body}")]
    UpstreamStatus { status: u16, body: String },
    #[error("Invalid prediction response: {0}")]
    InvalidResponse(#[from] serde_json::Error),
    #[error("Invalid upload form: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Config(_) | AppError::Template(_) | AppError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Network(_) | AppError::UpstreamStatus { .. } | AppError::InvalidResponse(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Multipart(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::warn!("{}", self);
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
