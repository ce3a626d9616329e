pub mod booking_service;
pub mod pricing_service;

use std::sync::Arc;
use sqlx::SqlitePool;

use crate::notifications::NotificationDispatcher;
use crate::payments::PaymentGateway;
use crate::repository::*;
use booking_service::BookingService;
use pricing_service::PricingService;

pub use booking_service::{CreatedBooking, WebhookAck, WebhookOutcome};

pub struct ServiceContext {
    pub booking_repo: Arc<dyn BookingRepository>,
    pub pricing_service: Arc<PricingService>,
    pub booking_service: Arc<BookingService>,
    pub notifications: Arc<NotificationDispatcher>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(
        db_pool: SqlitePool,
        gateway: Option<Arc<dyn PaymentGateway>>,
        notifications: Arc<NotificationDispatcher>,
        currency: String,
    ) -> Self {
        let booking_repo: Arc<dyn BookingRepository> =
            Arc::new(SqliteBookingRepository::new(db_pool.clone()));
        let pricing_repo = Arc::new(SqlitePricingRepository::new(db_pool.clone()));

        let pricing_service = Arc::new(PricingService::new(pricing_repo));
        let booking_service = Arc::new(BookingService::new(
            booking_repo.clone(),
            pricing_service.clone(),
            gateway,
            notifications.clone(),
            currency,
        ));

        Self {
            booking_repo,
            pricing_service,
            booking_service,
            notifications,
            db_pool,
        }
    }
}
