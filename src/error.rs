use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error as ThisError;

use crate::forms::FormErrors;
use crate::response::redirect_setting;
use crate::session::{removal, JWT_TOKEN, LOGIN_PATH};

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("dotenv error: {0}")]
    DotEnvError(#[from] dotenv::Error),

    #[error("jwt error: {0}")]
    JWTError(#[from] jsonwebtoken::errors::Error),

    #[error("multipart error: {0}")]
    MultipartError(#[from] actix_multipart::MultipartError),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("csv error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("invalid form: {0:?}")]
    Form(FormErrors),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("not found")]
    NotFound,

    #[error("unauthorized")]
    Unauthorized,

    #[error("config error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Shorthand for a single-message form error.
    pub fn form(field: &str, message: &str) -> Self {
        let mut errors = FormErrors::default();
        errors.add(field, message);
        Error::Form(errors)
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Form(_) | Error::MultipartError(_) | Error::CsvError(_) => StatusCode::BAD_REQUEST,
            Error::NotFound | Error::DatabaseError(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            Error::Unauthorized => StatusCode::SEE_OTHER,
            Error::PermissionDenied(_) => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        match self {
            Error::Form(errors) => HttpResponse::build(status).json(json!({ "errors": errors })),
            // A stale or pending session is dropped and the user signs in again.
            Error::Unauthorized => redirect_setting(LOGIN_PATH, [removal(JWT_TOKEN)]),
            _ if status.is_server_error() => {
                log::error!("request failed: {}", self);
                HttpResponse::build(status).json(json!({ "error": "internal server error" }))
            }
            _ => HttpResponse::build(status).json(json!({ "error": self.to_string() })),
        }
    }
}
