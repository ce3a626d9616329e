use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::{AppError, Result};
use super::PaymentStatus;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceType {
    Home,
    Airbnb,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Home => "HOME",
            ServiceType::Airbnb => "AIRBNB",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "HOME" => Some(ServiceType::Home),
            "AIRBNB" => Some(ServiceType::Airbnb),
            _ => None,
        }
    }
}

/// Optional extras for a regular home clean.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(default)]
pub struct HomeAddons {
    pub deep_cleaning: bool,
    pub oven_cleaning: bool,
    pub fridge_cleaning: bool,
    pub window_cleaning: bool,
    pub cabinet_cleaning: bool,
}

/// Turnover extras for short-stay rentals.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(default)]
pub struct AirbnbAddons {
    pub linen: bool,
    pub towel: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BedSize {
    Twin,
    Full,
    Queen,
    King,
}

/// Service-specific booking facts. The tag doubles as the booking's
/// `service_type` on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(tag = "service_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceDetails {
    Home {
        #[serde(default)]
        addons: HomeAddons,
    },
    Airbnb {
        #[serde(default)]
        addons: AirbnbAddons,
        /// Bed size per bedroom, in bedroom order.
        #[serde(default)]
        bed_sizes: Vec<BedSize>,
    },
}

impl ServiceDetails {
    pub fn service_type(&self) -> ServiceType {
        match self {
            ServiceDetails::Home { .. } => ServiceType::Home,
            ServiceDetails::Airbnb { .. } => ServiceType::Airbnb,
        }
    }

    pub fn validate_for(&self, bedrooms: u32) -> Result<()> {
        if let ServiceDetails::Airbnb { bed_sizes, .. } = self {
            if bed_sizes.len() > bedrooms as usize {
                return Err(AppError::Validation(format!(
                    "{} bed sizes given but the booking has {} bedroom(s)",
                    bed_sizes.len(),
                    bedrooms
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum TimeSlot {
    #[serde(rename = "09:00")]
    NineAm,
    #[serde(rename = "10:00")]
    TenAm,
    #[serde(rename = "11:00")]
    ElevenAm,
    #[serde(rename = "12:00")]
    Noon,
    #[serde(rename = "13:00")]
    OnePm,
    #[serde(rename = "14:00")]
    TwoPm,
    #[serde(rename = "15:00")]
    ThreePm,
    #[serde(rename = "16:00")]
    FourPm,
}

impl TimeSlot {
    pub const ALL: [TimeSlot; 8] = [
        TimeSlot::NineAm,
        TimeSlot::TenAm,
        TimeSlot::ElevenAm,
        TimeSlot::Noon,
        TimeSlot::OnePm,
        TimeSlot::TwoPm,
        TimeSlot::ThreePm,
        TimeSlot::FourPm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeSlot::NineAm => "09:00",
            TimeSlot::TenAm => "10:00",
            TimeSlot::ElevenAm => "11:00",
            TimeSlot::Noon => "12:00",
            TimeSlot::OnePm => "13:00",
            TimeSlot::TwoPm => "14:00",
            TimeSlot::ThreePm => "15:00",
            TimeSlot::FourPm => "16:00",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|slot| slot.as_str() == s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Booking {
    pub id: String,
    #[serde(flatten)]
    pub details: ServiceDetails,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub living_areas: u32,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub address: String,
    pub date: NaiveDate,
    pub time: TimeSlot,
    pub price_cents: i64,
    pub currency: String,
    pub payment_status: PaymentStatus,
    /// Processor reference recorded when the payment completed.
    pub stripe_session_id: Option<String>,
    pub payment_completed_at: Option<DateTime<Utc>>,
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn service_type(&self) -> ServiceType {
        self.details.service_type()
    }

    pub fn is_completed(&self) -> bool {
        self.payment_status == PaymentStatus::Completed
    }
}

/// Upper bound on each room count a single booking may request.
pub const MAX_ROOMS: u32 = 20;

/// Booking fields as submitted by the checkout form.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateBookingRequest {
    #[serde(flatten)]
    pub details: ServiceDetails,
    #[validate(range(max = MAX_ROOMS, message = "Too many bedrooms"))]
    pub bedrooms: u32,
    #[validate(range(max = MAX_ROOMS, message = "Too many bathrooms"))]
    pub bathrooms: u32,
    #[validate(range(max = MAX_ROOMS, message = "Too many living areas"))]
    pub living_areas: u32,
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub customer_name: String,
    #[validate(email(message = "Invalid email address"))]
    pub customer_email: String,
    #[validate(length(min = 10, message = "Phone number must be at least 10 digits"))]
    pub customer_phone: String,
    #[validate(length(min = 10, message = "Address must be at least 10 characters"))]
    pub address: String,
    pub date: NaiveDate,
    pub time: TimeSlot,
    /// Price the browser displayed, in dollars. Never charged; the server
    /// always re-quotes from the pricing table.
    #[serde(default, rename = "price", skip_serializing_if = "Option::is_none")]
    pub quoted_price: Option<f64>,
}

impl CreateBookingRequest {
    /// Field and domain checks that must pass before anything is written.
    pub fn check(&self, today: NaiveDate) -> Result<()> {
        self.validate()?;

        if self.bedrooms < 1 {
            return Err(AppError::Validation("At least 1 bedroom required".to_string()));
        }
        if self.bathrooms < 1 {
            return Err(AppError::Validation("At least 1 bathroom required".to_string()));
        }
        if self.date < today {
            return Err(AppError::Validation(format!(
                "Booking date {} is in the past",
                self.date
            )));
        }

        self.details.validate_for(self.bedrooms)
    }

    pub fn quoted_price_cents(&self) -> Option<i64> {
        self.quoted_price.map(|dollars| (dollars * 100.0).round() as i64)
    }
}
