pub mod stripe_client;
#[cfg(feature = "test-utils")]
pub mod fake;

use async_trait::async_trait;

use crate::{
    domain::{IntentRequest, PaymentIntentHandle, ProcessorEvent},
    error::Result,
};

pub use stripe_client::StripeGateway;
#[cfg(feature = "test-utils")]
pub use fake::FakeStripeGateway;

/// The external card processor as seen by the booking core.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn name(&self) -> &str;

    /// Opens a charge attempt. The booking id always travels in the intent
    /// metadata so later events can be matched without a lookup table.
    async fn create_intent(&self, request: IntentRequest) -> Result<PaymentIntentHandle>;

    /// Authenticates a webhook delivery and decodes it. Any doubt about the
    /// signature is `AppError::SignatureInvalid`.
    fn verify_event(&self, payload: &str, signature_header: &str) -> Result<ProcessorEvent>;
}
