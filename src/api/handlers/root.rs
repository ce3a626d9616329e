use axum::{http::StatusCode, Json, response::IntoResponse};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "CleanPro API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Cleaning service bookings and card payments",
        "status": "operational",
        "endpoints": {
            "health": "/health",
            "pricing": "/api/pricing",
            "payment": "/api/payment",
            "docs": "/api/docs",
            "admin": "/admin"
        }
    }))
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service healthy", body = HealthResponse)),
    tag = "System"
)]
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}
