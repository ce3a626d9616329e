//! In-process stand-in for Stripe used by tests and local fixtures.
//!
//! Webhook payloads use Stripe's JSON shape and the `Stripe-Signature`
//! header scheme (`t=<unix>,v1=<hex hmac-sha256 of "t.payload">`), so the
//! webhook path is exercised end to end without network access.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::{
    domain::{IntentRequest, PaymentIntentHandle, ProcessorEvent, BOOKING_ID_METADATA_KEY},
    error::{AppError, Result},
    payments::PaymentGateway,
};

/// Matches the Stripe SDKs' default replay window.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

pub struct FakeStripeGateway {
    webhook_secret: String,
    unavailable: AtomicBool,
    next_intent: AtomicU64,
    intents: Mutex<Vec<(String, IntentRequest)>>,
}

impl FakeStripeGateway {
    pub fn new(webhook_secret: impl Into<String>) -> Self {
        Self {
            webhook_secret: webhook_secret.into(),
            unavailable: AtomicBool::new(false),
            next_intent: AtomicU64::new(1),
            intents: Mutex::new(Vec::new()),
        }
    }

    /// Makes every subsequent `create_intent` fail as if the processor
    /// could not be reached.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Every intent created so far, with the id it was given.
    pub fn created_intents(&self) -> Vec<(String, IntentRequest)> {
        self.intents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn succeeded_payload(intent_id: &str, booking_id: &str) -> String {
        event_payload("payment_intent.succeeded", intent_id, booking_id, None)
    }

    pub fn failed_payload(intent_id: &str, booking_id: &str, reason: &str) -> String {
        event_payload("payment_intent.payment_failed", intent_id, booking_id, Some(reason))
    }

    /// A valid `Stripe-Signature` header for `payload`, timestamped now.
    pub fn sign(&self, payload: &str) -> String {
        sign_payload(&self.webhook_secret, payload, Utc::now().timestamp())
    }
}

#[async_trait]
impl PaymentGateway for FakeStripeGateway {
    fn name(&self) -> &str {
        "fake-stripe"
    }

    async fn create_intent(&self, request: IntentRequest) -> Result<PaymentIntentHandle> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::GatewayUnavailable(
                "fake processor is switched off".to_string(),
            ));
        }

        let n = self.next_intent.fetch_add(1, Ordering::SeqCst);
        let intent_id = format!("pi_fake_{:06}", n);
        let handle = PaymentIntentHandle {
            client_secret: format!("{}_secret_fake", intent_id),
            intent_id: intent_id.clone(),
        };

        self.intents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((intent_id, request));

        Ok(handle)
    }

    fn verify_event(&self, payload: &str, signature_header: &str) -> Result<ProcessorEvent> {
        verify_signature(
            &self.webhook_secret,
            payload,
            signature_header,
            Utc::now().timestamp(),
            DEFAULT_TOLERANCE_SECS,
        )?;

        let event: Value = serde_json::from_str(payload)
            .map_err(|e| AppError::BadRequest(format!("Malformed event: {}", e)))?;

        let event_type = event["type"].as_str().unwrap_or_default().to_string();
        let object = &event["data"]["object"];
        let intent_id = object["id"].as_str().unwrap_or_default().to_string();
        let booking_id = object["metadata"][BOOKING_ID_METADATA_KEY]
            .as_str()
            .map(str::to_string);

        let event = match event_type.as_str() {
            "payment_intent.succeeded" => ProcessorEvent::IntentSucceeded { intent_id, booking_id },
            "payment_intent.payment_failed" => ProcessorEvent::IntentFailed {
                intent_id,
                booking_id,
                reason: object["last_payment_error"]["message"]
                    .as_str()
                    .map(str::to_string),
            },
            _ => ProcessorEvent::Ignored { event_type },
        };

        Ok(event)
    }
}

fn event_payload(event_type: &str, intent_id: &str, booking_id: &str, reason: Option<&str>) -> String {
    let mut object = json!({
        "id": intent_id,
        "object": "payment_intent",
        "metadata": { BOOKING_ID_METADATA_KEY: booking_id },
    });
    if let Some(reason) = reason {
        object["last_payment_error"] = json!({ "message": reason });
    }

    json!({
        "id": format!("evt_{}", intent_id),
        "object": "event",
        "type": event_type,
        "data": { "object": object },
    })
    .to_string()
}

fn compute_signature(secret: &str, payload: &str, timestamp: i64) -> Result<String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(e.to_string()))?;
    mac.update(format!("{}.{}", timestamp, payload).as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

pub fn sign_payload(secret: &str, payload: &str, timestamp: i64) -> String {
    let signature = compute_signature(secret, payload, timestamp).unwrap_or_default();
    format!("t={},v1={}", timestamp, signature)
}

pub fn verify_signature(
    secret: &str,
    payload: &str,
    header: &str,
    now: i64,
    tolerance_secs: i64,
) -> Result<()> {
    let mut timestamp = None;
    let mut candidates = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(AppError::SignatureInvalid)?;
    if (now - timestamp).abs() > tolerance_secs {
        return Err(AppError::SignatureInvalid);
    }

    let expected = compute_signature(secret, payload, timestamp)?;
    let matched = candidates
        .iter()
        .any(|candidate| bool::from(candidate.as_bytes().ct_eq(expected.as_bytes())));

    if matched {
        Ok(())
    } else {
        Err(AppError::SignatureInvalid)
    }
}
