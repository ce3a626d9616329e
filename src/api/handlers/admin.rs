use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    api::{extract::AppJson, handlers::pricing::PricingQuery, state::AppState},
    domain::{Booking, PaymentStatus, PricingEntry, UpsertPriceRequest},
    error::{AppError, Result},
};

#[derive(Debug, Default, Deserialize)]
pub struct BookingListQuery {
    /// `completed` (default), `pending` or `all`.
    pub status: Option<String>,
}

fn parse_status_filter(raw: Option<&str>) -> Result<Option<PaymentStatus>> {
    match raw.map(str::to_lowercase).as_deref() {
        None | Some("") | Some("completed") => Ok(Some(PaymentStatus::Completed)),
        Some("pending") => Ok(Some(PaymentStatus::Pending)),
        Some("all") => Ok(None),
        Some(other) => Err(AppError::BadRequest(format!("Unknown status filter: {}", other))),
    }
}

pub async fn list_bookings(
    State(state): State<AppState>,
    Query(query): Query<BookingListQuery>,
) -> Result<Json<Vec<Booking>>> {
    let status = parse_status_filter(query.status.as_deref())?;
    let bookings = state
        .service_context
        .booking_service
        .list_bookings(status)
        .await?;

    Ok(Json(bookings))
}

pub async fn user_bookings(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Booking>>> {
    let bookings = state
        .service_context
        .booking_service
        .list_user_bookings(&user_id)
        .await?;

    Ok(Json(bookings))
}

pub async fn list_pricing(
    State(state): State<AppState>,
    Query(query): Query<PricingQuery>,
) -> Result<Json<Vec<PricingEntry>>> {
    let entries = state
        .service_context
        .pricing_service
        .list_prices(query.service_type()?)
        .await?;

    Ok(Json(entries))
}

pub async fn upsert_pricing(
    State(state): State<AppState>,
    AppJson(request): AppJson<UpsertPriceRequest>,
) -> Result<Json<PricingEntry>> {
    let entry = state
        .service_context
        .pricing_service
        .upsert_price(request.service_type, &request.key, request.price_cents)
        .await?;

    Ok(Json(entry))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_filter_defaults_to_completed() {
        assert_eq!(parse_status_filter(None).unwrap(), Some(PaymentStatus::Completed));
        assert_eq!(parse_status_filter(Some("Pending")).unwrap(), Some(PaymentStatus::Pending));
        assert_eq!(parse_status_filter(Some("all")).unwrap(), None);
        assert!(parse_status_filter(Some("refunded")).is_err());
    }
}
