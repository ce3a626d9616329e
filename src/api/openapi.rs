//! OpenAPI document for the public booking and payment endpoints,
//! served by Swagger UI at `/api/docs`.

use utoipa::OpenApi;

use crate::api::handlers::{payments, root};
use crate::domain::{
    AirbnbAddons, BedSize, Booking, CreateBookingRequest, HomeAddons, PaymentStatus,
    PricingEntry, ServiceDetails, ServiceType, TimeSlot,
};
use crate::service::{CreatedBooking, WebhookAck, WebhookOutcome};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "CleanPro API",
        description = "Cleaning service bookings paid by card."
    ),
    paths(
        crate::api::handlers::root::health_check,
        crate::api::handlers::pricing::list,
        crate::api::handlers::payments::create,
        crate::api::handlers::payments::confirm,
        crate::api::handlers::webhooks::stripe_webhook,
        crate::api::handlers::bookings::get,
    ),
    components(schemas(
        root::HealthResponse,
        payments::ConfirmPaymentRequest,
        payments::ConfirmPaymentResponse,
        CreateBookingRequest,
        CreatedBooking,
        Booking,
        ServiceDetails,
        ServiceType,
        HomeAddons,
        AirbnbAddons,
        BedSize,
        TimeSlot,
        PaymentStatus,
        PricingEntry,
        WebhookAck,
        WebhookOutcome,
    )),
    tags(
        (name = "System", description = "Liveness"),
        (name = "Pricing", description = "Unit prices per service"),
        (name = "Payments", description = "Booking checkout and payment confirmation"),
        (name = "Bookings", description = "Booking lookup")
    )
)]
pub struct ApiDoc;
