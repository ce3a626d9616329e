use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Metadata key that ties a processor intent back to its booking.
pub const BOOKING_ID_METADATA_KEY: &str = "booking_id";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum PaymentStatus {
    Pending,
    Completed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Completed => "Completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(PaymentStatus::Pending),
            "completed" => Some(PaymentStatus::Completed),
            _ => None,
        }
    }
}

/// What the processor hands back when a charge attempt is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntentHandle {
    pub intent_id: String,
    pub client_secret: String,
}

/// Parameters for opening a charge attempt against a booking.
#[derive(Debug, Clone)]
pub struct IntentRequest {
    pub booking_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub description: String,
    pub metadata: HashMap<String, String>,
}

impl IntentRequest {
    /// Metadata as sent to the processor, always carrying the booking id.
    pub fn metadata_with_booking_id(&self) -> HashMap<String, String> {
        let mut metadata = self.metadata.clone();
        metadata.insert(BOOKING_ID_METADATA_KEY.to_string(), self.booking_id.clone());
        metadata
    }
}

/// A verified, out-of-band outcome reported by the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessorEvent {
    IntentSucceeded {
        intent_id: String,
        booking_id: Option<String>,
    },
    IntentFailed {
        intent_id: String,
        booking_id: Option<String>,
        reason: Option<String>,
    },
    Ignored {
        event_type: String,
    },
}
