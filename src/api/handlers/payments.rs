use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    api::{extract::AppJson, state::AppState},
    domain::{Booking, CreateBookingRequest},
    error::Result,
    service::CreatedBooking,
};

/// Set by the session layer in front of this service for signed-in
/// customers. Guests omit it.
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentRequest {
    pub booking_id: String,
    pub payment_intent_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConfirmPaymentResponse {
    pub success: bool,
    pub booking: Booking,
}

#[utoipa::path(
    post,
    path = "/api/payment",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Pending booking and payment intent created", body = CreatedBooking),
        (status = 422, description = "Invalid booking fields"),
        (status = 503, description = "Payment processing unavailable")
    ),
    tag = "Payments"
)]
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    AppJson(request): AppJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<CreatedBooking>)> {
    let user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    let created = state
        .service_context
        .booking_service
        .create_booking(request, user_id)
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    post,
    path = "/api/payment/confirm",
    request_body = ConfirmPaymentRequest,
    responses(
        (status = 200, description = "Booking completed (or already was)", body = ConfirmPaymentResponse),
        (status = 404, description = "Unknown booking"),
        (status = 422, description = "Missing booking id or payment reference")
    ),
    tag = "Payments"
)]
pub async fn confirm(
    State(state): State<AppState>,
    AppJson(request): AppJson<ConfirmPaymentRequest>,
) -> Result<Json<ConfirmPaymentResponse>> {
    let booking = state
        .service_context
        .booking_service
        .confirm_client_side(&request.booking_id, &request.payment_intent_id)
        .await?;

    Ok(Json(ConfirmPaymentResponse {
        success: true,
        booking,
    }))
}
