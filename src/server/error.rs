//! Store errors as HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::Error;
use crate::wire::ErrorBody;

/// An error on its way out as a structured 4xx response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: Error,
}

impl ApiError {
    /// Malformed document payloads answer 422 rather than 400.
    pub fn bad_documents() -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            error: Error::Validation("Document missing string id key".to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn error(&self) -> &Error {
        &self.error
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let status = match &error {
            Error::UnknownDatabase | Error::UnknownTable => StatusCode::NOT_FOUND,
            Error::DatabaseExists
            | Error::TableExists
            | Error::DocumentExists
            | Error::DocumentNotFound => StatusCode::CONFLICT,
            Error::Validation(_) | Error::Rejected(_) => StatusCode::BAD_REQUEST,
        };
        Self { status, error }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status_code: self.status.as_u16(),
            error: self
                .status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
            message: self.error.to_string(),
            code: Some(self.error.code().to_string()),
        };
        (self.status, Json(body)).into_response()
    }
}
