//! Booking lifecycle: `Pending` on create, then exactly one terminal state.
//!
//! Two independent producers report a successful payment: the paying
//! browser (`confirm_client_side`) and the processor webhook
//! (`handle_processor_event`). Both feed the same idempotent store
//! transition, so their order does not matter. Only a verified processor
//! failure may abandon a booking, and only while it is still pending.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::{
        cents_to_dollars, Booking, CreateBookingRequest, IntentRequest, PaymentStatus,
        ProcessorEvent,
    },
    error::{AppError, Result},
    notifications::{NotificationDispatcher, NotificationEvent},
    payments::PaymentGateway,
    repository::{BookingRepository, Transition},
    service::pricing_service::PricingService,
};

/// Returned to the checkout page so it can complete the card payment.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreatedBooking {
    pub booking_id: String,
    pub client_secret: String,
    pub payment_intent_id: String,
    pub price_cents: i64,
    pub price_dollars: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum WebhookOutcome {
    Completed { booking_id: String },
    AlreadyCompleted { booking_id: String },
    Abandoned { booking_id: String },
    /// Failure reported for a booking that is gone or already paid.
    AlreadyResolved { booking_id: String },
    /// Event without a booking we know about.
    Unmatched { intent_id: String },
    Ignored { event_type: String },
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WebhookAck {
    pub received: bool,
    #[serde(flatten)]
    pub outcome: WebhookOutcome,
}

#[derive(Debug, Clone, Copy)]
enum ConfirmationSource {
    Client,
    Webhook,
}

impl ConfirmationSource {
    fn as_str(&self) -> &'static str {
        match self {
            ConfirmationSource::Client => "client",
            ConfirmationSource::Webhook => "webhook",
        }
    }
}

pub struct BookingService {
    bookings: Arc<dyn BookingRepository>,
    pricing: Arc<PricingService>,
    gateway: Option<Arc<dyn PaymentGateway>>,
    notifications: Arc<NotificationDispatcher>,
    currency: String,
}

impl BookingService {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        pricing: Arc<PricingService>,
        gateway: Option<Arc<dyn PaymentGateway>>,
        notifications: Arc<NotificationDispatcher>,
        currency: String,
    ) -> Self {
        Self {
            bookings,
            pricing,
            gateway,
            notifications,
            currency,
        }
    }

    fn gateway(&self) -> Result<&Arc<dyn PaymentGateway>> {
        self.gateway.as_ref().ok_or_else(|| {
            AppError::GatewayUnavailable("Payment processing is not configured".to_string())
        })
    }

    fn generate_id() -> String {
        format!("booking_{}", Uuid::new_v4().simple())
    }

    /// NoBooking → Pending. The price is always recomputed here; whatever the
    /// browser displayed is only compared and logged.
    pub async fn create_booking(
        &self,
        request: CreateBookingRequest,
        user_id: Option<String>,
    ) -> Result<CreatedBooking> {
        let gateway = self.gateway()?;

        request.check(Utc::now().date_naive())?;

        let quote = self
            .pricing
            .quote(
                &request.details,
                request.bedrooms,
                request.bathrooms,
                request.living_areas,
            )
            .await?;

        if let Some(quoted) = request.quoted_price_cents() {
            if quoted != quote.total_cents {
                tracing::warn!(
                    quoted_cents = quoted,
                    price_cents = quote.total_cents,
                    "Client-quoted price differs from server price; charging server price"
                );
            }
        }

        let booking = Booking {
            id: Self::generate_id(),
            details: request.details,
            bedrooms: request.bedrooms,
            bathrooms: request.bathrooms,
            living_areas: request.living_areas,
            customer_name: request.customer_name,
            customer_email: request.customer_email,
            customer_phone: request.customer_phone,
            address: request.address,
            date: request.date,
            time: request.time,
            price_cents: quote.total_cents,
            currency: self.currency.clone(),
            payment_status: PaymentStatus::Pending,
            stripe_session_id: None,
            payment_completed_at: None,
            user_id,
            created_at: Utc::now(),
        };

        let booking = self.bookings.insert_pending(booking).await?;
        tracing::info!(
            booking_id = %booking.id,
            price_cents = booking.price_cents,
            "Pending booking created"
        );

        let mut metadata = HashMap::new();
        metadata.insert("customer_email".to_string(), booking.customer_email.clone());
        metadata.insert("service_type".to_string(), booking.service_type().as_str().to_string());

        let intent_request = IntentRequest {
            booking_id: booking.id.clone(),
            amount_cents: booking.price_cents,
            currency: booking.currency.clone(),
            description: format!(
                "Cleaning Service - {} - Booking ID: {}",
                booking.service_type().as_str(),
                booking.id
            ),
            metadata,
        };

        // The pending row stays if this fails; a later processor signal or
        // an operator resolves it.
        let intent = gateway.create_intent(intent_request).await.map_err(|e| {
            tracing::warn!(
                booking_id = %booking.id,
                "Payment intent creation failed, booking left pending: {}",
                e
            );
            e
        })?;

        tracing::info!(
            booking_id = %booking.id,
            intent_id = %intent.intent_id,
            gateway = gateway.name(),
            "Payment intent created"
        );

        Ok(CreatedBooking {
            booking_id: booking.id,
            client_secret: intent.client_secret,
            payment_intent_id: intent.intent_id,
            price_cents: booking.price_cents,
            price_dollars: cents_to_dollars(booking.price_cents),
        })
    }

    /// Pending → Completed, reported by the paying browser.
    pub async fn confirm_client_side(&self, booking_id: &str, payment_reference: &str) -> Result<Booking> {
        if booking_id.trim().is_empty() || payment_reference.trim().is_empty() {
            return Err(AppError::Validation(
                "Missing booking id or payment reference".to_string(),
            ));
        }

        self.complete(booking_id, payment_reference, ConfirmationSource::Client)
            .await
            .map(Transition::into_booking)
    }

    /// Authenticates and applies one processor webhook delivery.
    pub async fn handle_processor_event(&self, payload: &str, signature_header: &str) -> Result<WebhookAck> {
        let gateway = self.gateway()?;

        if signature_header.trim().is_empty() {
            return Err(AppError::SignatureInvalid);
        }

        let event = gateway.verify_event(payload, signature_header).map_err(|e| {
            tracing::warn!("Webhook rejected: {}", e);
            e
        })?;

        let outcome = match event {
            ProcessorEvent::IntentSucceeded {
                intent_id,
                booking_id: Some(booking_id),
            } => match self
                .complete(&booking_id, &intent_id, ConfirmationSource::Webhook)
                .await
            {
                Ok(Transition::Applied(_)) => WebhookOutcome::Completed { booking_id },
                Ok(Transition::AlreadyCompleted(_)) => {
                    WebhookOutcome::AlreadyCompleted { booking_id }
                }
                Err(AppError::NotFound(_)) => {
                    tracing::warn!(
                        booking_id = %booking_id,
                        intent_id = %intent_id,
                        "Payment succeeded for unknown booking"
                    );
                    WebhookOutcome::Unmatched { intent_id }
                }
                Err(e) => return Err(e),
            },
            ProcessorEvent::IntentFailed {
                intent_id,
                booking_id: Some(booking_id),
                reason,
            } => {
                if self.bookings.delete_pending(&booking_id).await? {
                    tracing::info!(
                        booking_id = %booking_id,
                        intent_id = %intent_id,
                        reason = reason.as_deref().unwrap_or("unknown"),
                        "Pending booking abandoned after payment failure"
                    );
                    WebhookOutcome::Abandoned { booking_id }
                } else {
                    tracing::info!(
                        booking_id = %booking_id,
                        intent_id = %intent_id,
                        "Payment failure ignored; booking already resolved"
                    );
                    WebhookOutcome::AlreadyResolved { booking_id }
                }
            }
            ProcessorEvent::IntentSucceeded { intent_id, booking_id: None }
            | ProcessorEvent::IntentFailed { intent_id, booking_id: None, .. } => {
                tracing::warn!(intent_id = %intent_id, "Payment event without booking id");
                WebhookOutcome::Unmatched { intent_id }
            }
            ProcessorEvent::Ignored { event_type } => {
                tracing::debug!("Unhandled webhook event type: {}", event_type);
                WebhookOutcome::Ignored { event_type }
            }
        };

        Ok(WebhookAck {
            received: true,
            outcome,
        })
    }

    /// Side-effect free; safe to poll.
    pub async fn get_booking(&self, booking_id: &str) -> Result<Booking> {
        self.bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))
    }

    pub async fn list_bookings(&self, status: Option<PaymentStatus>) -> Result<Vec<Booking>> {
        match status {
            Some(status) => self.bookings.list_by_status(status).await,
            None => self.bookings.list_all().await,
        }
    }

    pub async fn list_user_bookings(&self, user_id: &str) -> Result<Vec<Booking>> {
        self.bookings.list_by_user(user_id).await
    }

    async fn complete(
        &self,
        booking_id: &str,
        payment_reference: &str,
        source: ConfirmationSource,
    ) -> Result<Transition> {
        let transition = self
            .bookings
            .transition_to_completed(booking_id, payment_reference)
            .await?;

        match transition {
            Transition::Applied(booking) => {
                tracing::info!(
                    booking_id = %booking.id,
                    payment_reference = %payment_reference,
                    source = source.as_str(),
                    "Booking completed"
                );
                self.notifications
                    .dispatch_in_background(NotificationEvent::BookingConfirmed(booking.clone()));
                Ok(Transition::Applied(booking))
            }
            Transition::AlreadyCompleted(booking) => {
                tracing::debug!(
                    booking_id = %booking.id,
                    source = source.as_str(),
                    "Booking already completed; confirmation is a no-op"
                );
                Ok(Transition::AlreadyCompleted(booking))
            }
        }
    }
}
