use axum::extract::{rejection::JsonRejection, FromRequest};

use crate::error::AppError;

/// `axum::Json` whose rejections render through `AppError`, so a malformed
/// body gets the same `{"error": ..}` shape as every other failure.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => AppError::Validation(e.body_text()),
            other => AppError::BadRequest(other.body_text()),
        }
    }
}
