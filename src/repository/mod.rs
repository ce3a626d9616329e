use async_trait::async_trait;
use crate::domain::*;
use crate::error::Result;

pub mod booking_repository;
pub mod pricing_repository;

pub use booking_repository::SqliteBookingRepository;
pub use pricing_repository::{PricingRepository, SqlitePricingRepository};

/// Outcome of a Pending → Completed transition. Exactly one caller per
/// booking ever sees `Applied`.
#[derive(Debug, Clone)]
pub enum Transition {
    Applied(Booking),
    AlreadyCompleted(Booking),
}

impl Transition {
    pub fn was_applied(&self) -> bool {
        matches!(self, Transition::Applied(_))
    }

    pub fn booking(&self) -> &Booking {
        match self {
            Transition::Applied(booking) | Transition::AlreadyCompleted(booking) => booking,
        }
    }

    pub fn into_booking(self) -> Booking {
        match self {
            Transition::Applied(booking) | Transition::AlreadyCompleted(booking) => booking,
        }
    }
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert_pending(&self, booking: Booking) -> Result<Booking>;
    async fn transition_to_completed(&self, id: &str, payment_reference: &str) -> Result<Transition>;
    async fn delete_pending(&self, id: &str) -> Result<bool>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>>;
    async fn list_by_status(&self, status: PaymentStatus) -> Result<Vec<Booking>>;
    async fn list_all(&self) -> Result<Vec<Booking>>;
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Booking>>;
}
