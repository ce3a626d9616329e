mod common;

use cleanpro::{
    domain::{AirbnbAddons, BedSize, PaymentStatus, ServiceDetails},
    error::AppError,
    repository::{BookingRepository, SqliteBookingRepository, Transition},
};

use common::{pending_booking, test_pool};

#[tokio::test]
async fn test_insert_and_find_round_trip() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let repo = SqliteBookingRepository::new(pool.clone());

    let mut booking = pending_booking("booking_airbnb", 7500);
    booking.details = ServiceDetails::Airbnb {
        addons: AirbnbAddons { linen: true, towel: false },
        bed_sizes: vec![BedSize::Queen],
    };
    booking.user_id = Some("user_42".to_string());

    let stored = repo.insert_pending(booking.clone()).await?;
    assert_eq!(stored.payment_status, PaymentStatus::Pending);
    assert_eq!(stored.details, booking.details);
    assert!(stored.stripe_session_id.is_none());
    assert!(stored.payment_completed_at.is_none());

    let found = repo.find_by_id("booking_airbnb").await?.expect("booking exists");
    assert_eq!(found.price_cents, 7500);
    assert_eq!(found.user_id.as_deref(), Some("user_42"));

    assert!(repo.find_by_id("booking_missing").await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_duplicate_id_is_rejected() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let repo = SqliteBookingRepository::new(pool.clone());

    repo.insert_pending(pending_booking("booking_dup", 4500)).await?;
    let err = repo
        .insert_pending(pending_booking("booking_dup", 9900))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DuplicateId(_)));

    let kept = repo.find_by_id("booking_dup").await?.unwrap();
    assert_eq!(kept.price_cents, 4500);

    Ok(())
}

#[tokio::test]
async fn test_completion_is_idempotent_and_first_reference_wins() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let repo = SqliteBookingRepository::new(pool.clone());
    repo.insert_pending(pending_booking("booking_c", 4500)).await?;

    let first = repo.transition_to_completed("booking_c", "a").await?;
    assert!(first.was_applied());
    let completed_at = first.booking().payment_completed_at;
    assert!(completed_at.is_some());

    let second = repo.transition_to_completed("booking_c", "b").await?;
    assert!(matches!(second, Transition::AlreadyCompleted(_)));

    let booking = second.into_booking();
    assert_eq!(booking.payment_status, PaymentStatus::Completed);
    assert_eq!(booking.stripe_session_id.as_deref(), Some("a"));
    assert_eq!(booking.payment_completed_at, completed_at);

    Ok(())
}

#[tokio::test]
async fn test_completion_of_unknown_booking_creates_nothing() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let repo = SqliteBookingRepository::new(pool.clone());

    let err = repo.transition_to_completed("nope", "pi_x").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(repo.find_by_id("nope").await?.is_none());
    assert!(repo.list_all().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_completed_booking_cannot_be_abandoned() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let repo = SqliteBookingRepository::new(pool.clone());

    repo.insert_pending(pending_booking("booking_paid", 4500)).await?;
    repo.transition_to_completed("booking_paid", "pi_paid").await?;

    assert!(!repo.delete_pending("booking_paid").await?);
    let booking = repo.find_by_id("booking_paid").await?.unwrap();
    assert!(booking.is_completed());

    Ok(())
}

#[tokio::test]
async fn test_abandoned_booking_is_never_resurrected() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let repo = SqliteBookingRepository::new(pool.clone());

    repo.insert_pending(pending_booking("booking_gone", 4500)).await?;
    assert!(repo.delete_pending("booking_gone").await?);
    assert!(!repo.delete_pending("booking_gone").await?);

    let err = repo
        .transition_to_completed("booking_gone", "pi_late")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(repo.find_by_id("booking_gone").await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_stored_price_is_immutable() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let repo = SqliteBookingRepository::new(pool.clone());
    repo.insert_pending(pending_booking("booking_fixed", 4500)).await?;

    let result = sqlx::query("UPDATE bookings SET price_cents = 1 WHERE id = ?")
        .bind("booking_fixed")
        .execute(&pool)
        .await;
    assert!(result.is_err());

    repo.transition_to_completed("booking_fixed", "pi_fixed").await?;
    let booking = repo.find_by_id("booking_fixed").await?.unwrap();
    assert_eq!(booking.price_cents, 4500);

    Ok(())
}

#[tokio::test]
async fn test_listing_filters_and_orders_newest_first() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let repo = SqliteBookingRepository::new(pool.clone());

    for id in ["booking_1", "booking_2", "booking_3"] {
        let mut booking = pending_booking(id, 4500);
        if id != "booking_2" {
            booking.user_id = Some("user_7".to_string());
        }
        repo.insert_pending(booking).await?;
    }
    repo.transition_to_completed("booking_1", "pi_1").await?;
    repo.transition_to_completed("booking_3", "pi_3").await?;

    let completed: Vec<String> = repo
        .list_by_status(PaymentStatus::Completed)
        .await?
        .into_iter()
        .map(|b| b.id)
        .collect();
    assert_eq!(completed, vec!["booking_3", "booking_1"]);

    let pending = repo.list_by_status(PaymentStatus::Pending).await?;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, "booking_2");

    assert_eq!(repo.list_all().await?.len(), 3);
    assert_eq!(repo.list_by_user("user_7").await?.len(), 2);
    assert!(repo.list_by_user("user_8").await?.is_empty());

    Ok(())
}
