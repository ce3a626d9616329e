use async_trait::async_trait;
use stripe::{
    Client, CreatePaymentIntent, Currency, EventObject, EventType, PaymentIntent,
    Webhook, WebhookError,
};

use crate::{
    domain::{IntentRequest, PaymentIntentHandle, ProcessorEvent, BOOKING_ID_METADATA_KEY},
    error::{AppError, Result},
    payments::PaymentGateway,
};

pub struct StripeGateway {
    client: Client,
    webhook_secret: String,
}

impl StripeGateway {
    pub fn new(api_key: String, webhook_secret: String) -> Self {
        let client = Client::new(api_key);
        Self {
            client,
            webhook_secret,
        }
    }

    fn parse_currency(code: &str) -> Result<Currency> {
        match code.to_lowercase().as_str() {
            "usd" => Ok(Currency::USD),
            "aud" => Ok(Currency::AUD),
            "cad" => Ok(Currency::CAD),
            "eur" => Ok(Currency::EUR),
            "gbp" => Ok(Currency::GBP),
            "nzd" => Ok(Currency::NZD),
            other => Err(AppError::GatewayUnavailable(format!(
                "Unsupported currency configured: {}",
                other
            ))),
        }
    }

    fn intent_event(intent: PaymentIntent, succeeded: bool) -> ProcessorEvent {
        let intent_id = intent.id.to_string();
        let booking_id = intent.metadata.get(BOOKING_ID_METADATA_KEY).cloned();

        if succeeded {
            ProcessorEvent::IntentSucceeded { intent_id, booking_id }
        } else {
            let reason = intent
                .last_payment_error
                .as_ref()
                .and_then(|error| error.message.clone());
            ProcessorEvent::IntentFailed { intent_id, booking_id, reason }
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    fn name(&self) -> &str {
        "stripe"
    }

    async fn create_intent(&self, request: IntentRequest) -> Result<PaymentIntentHandle> {
        let currency = Self::parse_currency(&request.currency)?;

        let mut params = CreatePaymentIntent::new(request.amount_cents, currency);
        params.payment_method_types = Some(vec!["card".to_string()]);
        params.description = Some(&request.description);
        params.metadata = Some(request.metadata_with_booking_id());

        let intent = PaymentIntent::create(&self.client, params)
            .await
            .map_err(|e| AppError::GatewayUnavailable(format!("Stripe error: {}", e)))?;

        let client_secret = intent
            .client_secret
            .ok_or_else(|| AppError::External("No client secret returned".to_string()))?;

        Ok(PaymentIntentHandle {
            intent_id: intent.id.to_string(),
            client_secret,
        })
    }

    fn verify_event(&self, payload: &str, signature_header: &str) -> Result<ProcessorEvent> {
        // Verify webhook signature and construct event
        let event = Webhook::construct_event(payload, signature_header, &self.webhook_secret)
            .map_err(|e| match e {
                WebhookError::BadSignature => AppError::SignatureInvalid,
                other => {
                    tracing::warn!("Rejecting webhook that failed verification: {}", other);
                    AppError::SignatureInvalid
                }
            })?;

        let event = match (event.type_, event.data.object) {
            (EventType::PaymentIntentSucceeded, EventObject::PaymentIntent(intent)) => {
                Self::intent_event(intent, true)
            }
            (EventType::PaymentIntentPaymentFailed, EventObject::PaymentIntent(intent)) => {
                Self::intent_event(intent, false)
            }
            (event_type, _) => ProcessorEvent::Ignored {
                event_type: format!("{:?}", event_type),
            },
        };

        Ok(event)
    }
}
