#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use cleanpro::{
    domain::{
        AirbnbAddons, Booking, CreateBookingRequest, HomeAddons, PaymentStatus, ServiceDetails,
        TimeSlot,
    },
    error::Result,
    notifications::{NotificationDispatcher, NotificationEvent, Notifier},
    payments::{FakeStripeGateway, PaymentGateway},
    service::ServiceContext,
};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};
use uuid::Uuid;

pub const WEBHOOK_SECRET: &str = "whsec_test_secret";

/// One connection so every query sees the same in-memory database.
pub async fn test_pool() -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Remembers the id of every booking it was told about.
#[derive(Default)]
pub struct RecordingNotifier {
    pub confirmed: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn count(&self) -> usize {
        self.confirmed.lock().unwrap().len()
    }

    /// Waits for background dispatches to land, then a little longer so a
    /// stray duplicate would show up too.
    pub async fn settle(&self, expected: usize) -> usize {
        for _ in 0..50 {
            if self.count() >= expected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.count()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    fn is_enabled(&self) -> bool {
        true
    }

    async fn notify(&self, event: &NotificationEvent) -> Result<()> {
        self.confirmed.lock().unwrap().push(event.booking().id.clone());
        Ok(())
    }
}

pub struct Harness {
    pub pool: SqlitePool,
    pub context: Arc<ServiceContext>,
    pub gateway: Arc<FakeStripeGateway>,
    pub notifier: Arc<RecordingNotifier>,
}

/// A throwaway database file with several connections, so concurrent
/// writers really contend. Returns the path for `remove_db_file`.
pub async fn file_pool(max_connections: u32) -> anyhow::Result<(SqlitePool, PathBuf)> {
    let path = std::env::temp_dir().join(format!("cleanpro-test-{}.db", Uuid::new_v4().simple()));
    let options = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok((pool, path))
}

pub async fn remove_db_file(pool: SqlitePool, path: PathBuf) {
    pool.close().await;
    for suffix in ["", "-wal", "-shm"] {
        let mut file = path.clone().into_os_string();
        file.push(suffix);
        let _ = std::fs::remove_file(file);
    }
}

pub async fn harness() -> anyhow::Result<Harness> {
    harness_with_pool(test_pool().await?).await
}

pub async fn harness_with_pool(pool: SqlitePool) -> anyhow::Result<Harness> {
    let gateway = Arc::new(FakeStripeGateway::new(WEBHOOK_SECRET));
    let notifier = Arc::new(RecordingNotifier::default());

    let dispatcher = Arc::new(NotificationDispatcher::new());
    dispatcher.register(notifier.clone()).await;

    let context = Arc::new(ServiceContext::new(
        pool.clone(),
        Some(gateway.clone() as Arc<dyn PaymentGateway>),
        dispatcher,
        "usd".to_string(),
    ));

    Ok(Harness {
        pool,
        context,
        gateway,
        notifier,
    })
}

/// Same wiring with no payment processor configured.
pub async fn harness_without_gateway() -> anyhow::Result<Harness> {
    let pool = test_pool().await?;
    let notifier = Arc::new(RecordingNotifier::default());
    let dispatcher = Arc::new(NotificationDispatcher::new());
    dispatcher.register(notifier.clone()).await;

    let context = Arc::new(ServiceContext::new(
        pool.clone(),
        None,
        dispatcher,
        "usd".to_string(),
    ));

    Ok(Harness {
        pool,
        context,
        gateway: Arc::new(FakeStripeGateway::new(WEBHOOK_SECRET)),
        notifier,
    })
}

pub fn home_request(bedrooms: u32, bathrooms: u32, living_areas: u32) -> CreateBookingRequest {
    CreateBookingRequest {
        details: ServiceDetails::Home {
            addons: HomeAddons::default(),
        },
        bedrooms,
        bathrooms,
        living_areas,
        customer_name: "Jane Doe".to_string(),
        customer_email: "jane@example.com".to_string(),
        customer_phone: "5551234567".to_string(),
        address: "12 Harbour Street, Sydney".to_string(),
        date: Utc::now().date_naive() + chrono::Duration::days(7),
        time: TimeSlot::TenAm,
        quoted_price: None,
    }
}

pub fn airbnb_request(bedrooms: u32, bathrooms: u32, living_areas: u32) -> CreateBookingRequest {
    CreateBookingRequest {
        details: ServiceDetails::Airbnb {
            addons: AirbnbAddons::default(),
            bed_sizes: Vec::new(),
        },
        ..home_request(bedrooms, bathrooms, living_areas)
    }
}

/// A pending booking ready to hand straight to the repository.
pub fn pending_booking(id: &str, price_cents: i64) -> Booking {
    let request = home_request(1, 1, 0);
    Booking {
        id: id.to_string(),
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
        price_cents,
        currency: "usd".to_string(),
        payment_status: PaymentStatus::Pending,
        stripe_session_id: None,
        payment_completed_at: None,
        user_id: None,
        created_at: Utc::now(),
    }
}
