use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::{api::state::AppState, error::AppError};

/// Gate for the operator endpoints: `Authorization: Bearer <admin.api_token>`.
/// With no token configured the admin surface stays closed.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let expected = state
        .settings
        .admin
        .api_token
        .as_deref()
        .filter(|token| !token.is_empty())
        .ok_or(AppError::Unauthorized)?;

    let presented = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)?;

    if !bool::from(presented.as_bytes().ct_eq(expected.as_bytes())) {
        tracing::warn!("Rejected admin request with invalid token");
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(request).await)
}
