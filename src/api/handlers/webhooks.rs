use axum::{extract::State, http::HeaderMap, Json};

use crate::{
    api::state::AppState,
    error::{AppError, Result},
    service::WebhookAck,
};

pub const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

/// The body is taken raw: the signature covers the exact bytes Stripe sent.
#[utoipa::path(
    post,
    path = "/api/webhooks/stripe",
    request_body(content = String, content_type = "application/json"),
    responses(
        (status = 200, description = "Event accepted", body = WebhookAck),
        (status = 400, description = "Missing or invalid signature"),
        (status = 503, description = "Payment processing unavailable")
    ),
    tag = "Payments"
)]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<WebhookAck>> {
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(AppError::SignatureInvalid)?;

    let ack = state
        .service_context
        .booking_service
        .handle_processor_event(&body, signature)
        .await?;

    Ok(Json(ack))
}
