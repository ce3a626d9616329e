use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ServiceDetails, ServiceType};

/// Line-item keys in the pricing table.
pub mod keys {
    pub const BEDROOM: &str = "bedroom";
    pub const BATHROOM: &str = "bathroom";
    pub const LIVING_AREA: &str = "living_area";
    pub const AIRBNB_PREMIUM: &str = "airbnb_premium";

    pub const DEEP_CLEANING: &str = "deep_cleaning";
    pub const OVEN_CLEANING: &str = "oven_cleaning";
    pub const FRIDGE_CLEANING: &str = "fridge_cleaning";
    pub const WINDOW_CLEANING: &str = "window_cleaning";
    pub const CABINET_CLEANING: &str = "cabinet_cleaning";

    pub const LINEN_SERVICE: &str = "linen_service";
    pub const TOWEL_SERVICE: &str = "towel_service";
}

/// Launch price list in cents; also what the pricing migration inserts.
pub const DEFAULT_PRICES: &[(ServiceType, &str, i64)] = &[
    (ServiceType::Home, keys::BEDROOM, 2500),
    (ServiceType::Home, keys::BATHROOM, 2000),
    (ServiceType::Home, keys::LIVING_AREA, 1500),
    (ServiceType::Home, keys::DEEP_CLEANING, 2500),
    (ServiceType::Home, keys::OVEN_CLEANING, 3000),
    (ServiceType::Home, keys::FRIDGE_CLEANING, 2500),
    (ServiceType::Home, keys::WINDOW_CLEANING, 2000),
    (ServiceType::Home, keys::CABINET_CLEANING, 1500),
    (ServiceType::Airbnb, keys::BEDROOM, 2500),
    (ServiceType::Airbnb, keys::BATHROOM, 2000),
    (ServiceType::Airbnb, keys::LIVING_AREA, 1500),
    (ServiceType::Airbnb, keys::AIRBNB_PREMIUM, 3000),
    (ServiceType::Airbnb, keys::LINEN_SERVICE, 1500),
    (ServiceType::Airbnb, keys::TOWEL_SERVICE, 1000),
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct PricingEntry {
    pub service_type: ServiceType,
    pub key: String,
    pub price_cents: i64,
    pub price_dollars: f64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpsertPriceRequest {
    pub service_type: ServiceType,
    pub key: String,
    pub price_cents: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, ToSchema)]
pub struct QuoteLine {
    pub key: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub total_cents: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, ToSchema)]
pub struct Quote {
    pub service_type: ServiceType,
    pub lines: Vec<QuoteLine>,
    pub total_cents: i64,
}

/// Every priced item a booking is charged for, with its quantity. Items
/// with a zero quantity are left out so their price is never looked up.
pub fn billable_items(
    details: &ServiceDetails,
    bedrooms: u32,
    bathrooms: u32,
    living_areas: u32,
) -> Vec<(&'static str, u32)> {
    let mut items = vec![
        (keys::BEDROOM, bedrooms),
        (keys::BATHROOM, bathrooms),
        (keys::LIVING_AREA, living_areas),
    ];

    match details {
        ServiceDetails::Home { addons } => {
            let flags = [
                (keys::DEEP_CLEANING, addons.deep_cleaning),
                (keys::OVEN_CLEANING, addons.oven_cleaning),
                (keys::FRIDGE_CLEANING, addons.fridge_cleaning),
                (keys::WINDOW_CLEANING, addons.window_cleaning),
                (keys::CABINET_CLEANING, addons.cabinet_cleaning),
            ];
            items.extend(flags.into_iter().map(|(key, on)| (key, on as u32)));
        }
        ServiceDetails::Airbnb { addons, .. } => {
            items.push((keys::AIRBNB_PREMIUM, 1));
            items.push((keys::LINEN_SERVICE, addons.linen as u32));
            items.push((keys::TOWEL_SERVICE, addons.towel as u32));
        }
    }

    items.retain(|(_, quantity)| *quantity > 0);
    items
}

pub fn cents_to_dollars(cents: i64) -> f64 {
    cents as f64 / 100.0
}
