use axum::{
    extract::{Path, State},
    Json,
};

use crate::{api::state::AppState, domain::Booking, error::Result};

#[utoipa::path(
    get,
    path = "/api/bookings/{id}",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Current booking state", body = Booking),
        (status = 404, description = "Unknown or abandoned booking")
    ),
    tag = "Bookings"
)]
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Booking>> {
    let booking = state.service_context.booking_service.get_booking(&id).await?;
    Ok(Json(booking))
}
