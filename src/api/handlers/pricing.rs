use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    api::state::AppState,
    domain::{PricingEntry, ServiceType},
    error::{AppError, Result},
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PricingQuery {
    /// `HOME` or `AIRBNB`; all services when omitted.
    pub service_type: Option<String>,
}

impl PricingQuery {
    pub fn service_type(&self) -> Result<Option<ServiceType>> {
        match self.service_type.as_deref() {
            None | Some("") => Ok(None),
            Some(raw) => ServiceType::from_str(raw)
                .map(Some)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown service type: {}", raw))),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/pricing",
    params(PricingQuery),
    responses(
        (status = 200, description = "Unit prices", body = Vec<PricingEntry>),
        (status = 400, description = "Unknown service type")
    ),
    tag = "Pricing"
)]
pub async fn list(
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
