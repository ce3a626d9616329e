mod common;

use chrono::{Duration, Utc};
use cleanpro::{
    domain::{PaymentStatus, BOOKING_ID_METADATA_KEY},
    error::AppError,
    payments::FakeStripeGateway,
    service::WebhookOutcome,
};

use common::{
    airbnb_request, file_pool, harness, harness_with_pool, harness_without_gateway, home_request,
    remove_db_file,
};

#[tokio::test]
async fn test_home_booking_confirmed_by_client() -> anyhow::Result<()> {
    let h = harness().await?;
    let bookings = &h.context.booking_service;

    let created = bookings
        .create_booking(home_request(2, 1, 1), None)
        .await?;
    assert_eq!(created.price_cents, 8500);
    assert_eq!(created.price_dollars, 85.0);
    assert!(created.booking_id.starts_with("booking_"));
    assert!(!created.client_secret.is_empty());

    let pending = bookings.get_booking(&created.booking_id).await?;
    assert_eq!(pending.payment_status, PaymentStatus::Pending);

    let intents = h.gateway.created_intents();
    assert_eq!(intents.len(), 1);
    let (intent_id, request) = &intents[0];
    assert_eq!(intent_id, &created.payment_intent_id);
    assert_eq!(request.amount_cents, 8500);
    assert_eq!(request.currency, "usd");
    assert_eq!(
        request.metadata_with_booking_id().get(BOOKING_ID_METADATA_KEY),
        Some(&created.booking_id)
    );

    let confirmed = bookings
        .confirm_client_side(&created.booking_id, "pi_123")
        .await?;
    assert_eq!(confirmed.payment_status, PaymentStatus::Completed);
    assert_eq!(confirmed.stripe_session_id.as_deref(), Some("pi_123"));
    assert!(confirmed.payment_completed_at.is_some());
    assert_eq!(confirmed.price_cents, 8500);

    assert_eq!(h.notifier.settle(1).await, 1);

    // A repeat confirmation is a quiet success
    let again = bookings
        .confirm_client_side(&created.booking_id, "pi_123")
        .await?;
    assert_eq!(again.payment_completed_at, confirmed.payment_completed_at);
    assert_eq!(h.notifier.settle(1).await, 1);

    Ok(())
}

#[tokio::test]
async fn test_airbnb_booking_abandoned_by_failed_payment() -> anyhow::Result<()> {
    let h = harness().await?;
    let bookings = &h.context.booking_service;

    let created = bookings
        .create_booking(airbnb_request(1, 1, 0), Some("user_9".to_string()))
        .await?;
    assert_eq!(created.price_cents, 7500);

    let payload = FakeStripeGateway::failed_payload(
        &created.payment_intent_id,
        &created.booking_id,
        "Your card was declined.",
    );
    let ack = bookings
        .handle_processor_event(&payload, &h.gateway.sign(&payload))
        .await?;
    assert!(ack.received);
    assert_eq!(
        ack.outcome,
        WebhookOutcome::Abandoned { booking_id: created.booking_id.clone() }
    );

    let err = bookings.get_booking(&created.booking_id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(bookings.list_user_bookings("user_9").await?.is_empty());

    // A late success cannot bring it back
    let err = bookings
        .confirm_client_side(&created.booking_id, &created.payment_intent_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(h.notifier.settle(0).await, 0);

    Ok(())
}

#[tokio::test]
async fn test_webhook_confirms_pending_booking() -> anyhow::Result<()> {
    let h = harness().await?;
    let bookings = &h.context.booking_service;

    let created = bookings.create_booking(home_request(1, 1, 0), None).await?;
    let payload =
        FakeStripeGateway::succeeded_payload(&created.payment_intent_id, &created.booking_id);

    let ack = bookings
        .handle_processor_event(&payload, &h.gateway.sign(&payload))
        .await?;
    assert_eq!(
        ack.outcome,
        WebhookOutcome::Completed { booking_id: created.booking_id.clone() }
    );

    // Stripe redelivers; nothing changes
    let ack = bookings
        .handle_processor_event(&payload, &h.gateway.sign(&payload))
        .await?;
    assert_eq!(
        ack.outcome,
        WebhookOutcome::AlreadyCompleted { booking_id: created.booking_id.clone() }
    );

    let booking = bookings.get_booking(&created.booking_id).await?;
    assert_eq!(booking.stripe_session_id.as_deref(), Some(created.payment_intent_id.as_str()));
    assert_eq!(h.notifier.settle(1).await, 1);

    Ok(())
}

#[tokio::test]
async fn test_client_and_webhook_race_completes_once() -> anyhow::Result<()> {
    let h = harness().await?;
    let bookings = &h.context.booking_service;

    let created = bookings.create_booking(home_request(2, 2, 1), None).await?;
    let payload =
        FakeStripeGateway::succeeded_payload(&created.payment_intent_id, &created.booking_id);
    let signature = h.gateway.sign(&payload);

    let (client, webhook) = tokio::join!(
        bookings.confirm_client_side(&created.booking_id, &created.payment_intent_id),
        bookings.handle_processor_event(&payload, &signature),
    );

    let client = client?;
    let webhook = webhook?;
    assert_eq!(client.payment_status, PaymentStatus::Completed);
    assert!(matches!(
        webhook.outcome,
        WebhookOutcome::Completed { .. } | WebhookOutcome::AlreadyCompleted { .. }
    ));

    let completed = bookings.list_bookings(Some(PaymentStatus::Completed)).await?;
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].payment_completed_at, client.payment_completed_at);

    assert_eq!(h.notifier.settle(1).await, 1);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_confirmations_complete_each_booking_once() -> anyhow::Result<()> {
    const BOOKINGS: usize = 20;
    const CONFIRMERS_PER_SIGNAL: usize = 3;

    let (pool, path) = file_pool(8).await?;
    let h = harness_with_pool(pool.clone()).await?;

    let mut created = Vec::new();
    for _ in 0..BOOKINGS {
        created.push(
            h.context
                .booking_service
                .create_booking(home_request(2, 1, 1), None)
                .await?,
        );
    }

    let mut tasks = Vec::new();
    for booking in &created {
        let payload =
            FakeStripeGateway::succeeded_payload(&booking.payment_intent_id, &booking.booking_id);
        let signature = h.gateway.sign(&payload);

        for _ in 0..CONFIRMERS_PER_SIGNAL {
            let service = h.context.booking_service.clone();
            let (booking_id, intent_id) =
                (booking.booking_id.clone(), booking.payment_intent_id.clone());
            tasks.push(tokio::spawn(async move {
                service
                    .confirm_client_side(&booking_id, &intent_id)
                    .await
                    .map(|_| ())
            }));

            let service = h.context.booking_service.clone();
            let (payload, signature) = (payload.clone(), signature.clone());
            tasks.push(tokio::spawn(async move {
                service
                    .handle_processor_event(&payload, &signature)
                    .await
                    .map(|_| ())
            }));
        }
    }

    for result in futures_util::future::join_all(tasks).await {
        result??;
    }

    let completed = h
        .context
        .booking_service
        .list_bookings(Some(PaymentStatus::Completed))
        .await?;
    assert_eq!(completed.len(), BOOKINGS);
    assert!(completed
        .iter()
        .all(|b| b.payment_completed_at.is_some() && b.stripe_session_id.is_some()));

    assert_eq!(h.notifier.settle(BOOKINGS).await, BOOKINGS);
    let mut notified = h.notifier.confirmed.lock().unwrap().clone();
    notified.sort();
    notified.dedup();
    assert_eq!(notified.len(), BOOKINGS);

    drop(h);
    remove_db_file(pool, path).await;

    Ok(())
}

#[tokio::test]
async fn test_failure_after_completion_is_ignored() -> anyhow::Result<()> {
    let h = harness().await?;
    let bookings = &h.context.booking_service;

    let created = bookings.create_booking(home_request(1, 1, 0), None).await?;
    bookings
        .confirm_client_side(&created.booking_id, &created.payment_intent_id)
        .await?;

    let payload = FakeStripeGateway::failed_payload(
        &created.payment_intent_id,
        &created.booking_id,
        "late failure",
    );
    let ack = bookings
        .handle_processor_event(&payload, &h.gateway.sign(&payload))
        .await?;
    assert_eq!(
        ack.outcome,
        WebhookOutcome::AlreadyResolved { booking_id: created.booking_id.clone() }
    );

    let booking = bookings.get_booking(&created.booking_id).await?;
    assert!(booking.is_completed());

    Ok(())
}

#[tokio::test]
async fn test_invalid_signature_changes_nothing() -> anyhow::Result<()> {
    let h = harness().await?;
    let bookings = &h.context.booking_service;

    let created = bookings.create_booking(home_request(1, 1, 0), None).await?;
    let payload = FakeStripeGateway::failed_payload(
        &created.payment_intent_id,
        &created.booking_id,
        "forged",
    );

    let forged = cleanpro::payments::fake::sign_payload("whsec_wrong", &payload, Utc::now().timestamp());
    let err = bookings
        .handle_processor_event(&payload, &forged)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::SignatureInvalid));

    let err = bookings.handle_processor_event(&payload, "").await.unwrap_err();
    assert!(matches!(err, AppError::SignatureInvalid));

    let booking = bookings.get_booking(&created.booking_id).await?;
    assert_eq!(booking.payment_status, PaymentStatus::Pending);

    Ok(())
}

#[tokio::test]
async fn test_unknown_booking_events_are_acknowledged() -> anyhow::Result<()> {
    let h = harness().await?;
    let bookings = &h.context.booking_service;

    let payload = FakeStripeGateway::succeeded_payload("pi_orphan", "booking_unknown");
    let ack = bookings
        .handle_processor_event(&payload, &h.gateway.sign(&payload))
        .await?;
    assert_eq!(
        ack.outcome,
        WebhookOutcome::Unmatched { intent_id: "pi_orphan".to_string() }
    );
    assert!(bookings.list_bookings(None).await?.is_empty());

    let err = bookings
        .confirm_client_side("booking_unknown", "pi_orphan")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    Ok(())
}

#[tokio::test]
async fn test_missing_gateway_fails_before_any_write() -> anyhow::Result<()> {
    let h = harness_without_gateway().await?;
    let bookings = &h.context.booking_service;

    let err = bookings
        .create_booking(home_request(2, 1, 1), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::GatewayUnavailable(_)));
    assert!(h.context.booking_repo.list_all().await?.is_empty());

    let payload = FakeStripeGateway::succeeded_payload("pi_1", "booking_1");
    let err = bookings
        .handle_processor_event(&payload, &h.gateway.sign(&payload))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::GatewayUnavailable(_)));

    Ok(())
}

#[tokio::test]
async fn test_intent_failure_leaves_booking_pending() -> anyhow::Result<()> {
    let h = harness().await?;
    h.gateway.set_unavailable(true);

    let err = h
        .context
        .booking_service
        .create_booking(home_request(1, 1, 0), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::GatewayUnavailable(_)));

    let pending = h
        .context
        .booking_service
        .list_bookings(Some(PaymentStatus::Pending))
        .await?;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].price_cents, 4500);

    Ok(())
}

#[tokio::test]
async fn test_client_price_is_ignored() -> anyhow::Result<()> {
    let h = harness().await?;

    let mut request = home_request(2, 1, 1);
    request.quoted_price = Some(1.0);

    let created = h
        .context
        .booking_service
        .create_booking(request, None)
        .await?;
    assert_eq!(created.price_cents, 8500);
    assert_eq!(h.gateway.created_intents()[0].1.amount_cents, 8500);

    Ok(())
}

#[tokio::test]
async fn test_invalid_requests_write_nothing() -> anyhow::Result<()> {
    let h = harness().await?;
    let bookings = &h.context.booking_service;

    let mut past = home_request(1, 1, 0);
    past.date = Utc::now().date_naive() - Duration::days(1);

    let mut no_bathroom = home_request(1, 0, 0);
    no_bathroom.customer_name = "Jo".to_string();

    let mut bad_email = home_request(1, 1, 0);
    bad_email.customer_email = "not-an-email".to_string();

    for request in [past, no_bathroom, bad_email] {
        let err = bookings.create_booking(request, None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    let err = bookings.confirm_client_side("", "pi_1").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    let err = bookings.confirm_client_side("booking_1", " ").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    assert!(h.context.booking_repo.list_all().await?.is_empty());
    assert!(h.gateway.created_intents().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_price_change_does_not_touch_existing_bookings() -> anyhow::Result<()> {
    let h = harness().await?;

    let created = h
        .context
        .booking_service
        .create_booking(home_request(2, 1, 1), None)
        .await?;

    h.context
        .pricing_service
        .upsert_price(cleanpro::domain::ServiceType::Home, "bedroom", 9900)
        .await?;

    let booking = h
        .context
        .booking_service
        .confirm_client_side(&created.booking_id, "pi_123")
        .await?;
    assert_eq!(booking.price_cents, 8500);

    let next = h
        .context
        .booking_service
        .create_booking(home_request(2, 1, 1), None)
        .await?;
    assert_eq!(next.price_cents, 2 * 9900 + 2000 + 1500);

    Ok(())
}

#[tokio::test]
async fn test_out_of_range_total_writes_nothing() -> anyhow::Result<()> {
    let h = harness().await?;

    h.context
        .pricing_service
        .upsert_price(cleanpro::domain::ServiceType::Home, "bedroom", i64::MAX / 2)
        .await?;

    let err = h
        .context
        .booking_service
        .create_booking(home_request(3, 1, 0), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert!(h.context.booking_repo.list_all().await?.is_empty());
    assert!(h.gateway.created_intents().is_empty());

    Ok(())
}
