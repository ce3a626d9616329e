use std::sync::Arc;

use chrono::{Duration, Utc};
use clap::Parser;
use cleanpro::{
    domain::{
        AirbnbAddons, BedSize, Booking, HomeAddons, PaymentStatus, ServiceDetails, TimeSlot,
        DEFAULT_PRICES,
    },
    repository::{
        BookingRepository, PricingRepository, SqliteBookingRepository, SqlitePricingRepository,
    },
    service::pricing_service::PricingService,
};
use fake::{
    faker::{
        address::en::{CityName, StreetName, StreetSuffix},
        internet::en::SafeEmail,
        name::en::Name,
    },
    Fake, Faker,
};
use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

/// Prepare a CleanPro database: migrations, price list, demo bookings.
#[derive(Parser, Debug)]
#[command(name = "seed", version)]
struct Args {
    /// Database to seed.
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://cleanpro.db?mode=rwc")]
    database_url: String,

    /// Overwrite every price with the launch price list.
    #[arg(long)]
    reset_pricing: bool,

    /// Number of demo bookings to generate; roughly two thirds are paid.
    #[arg(long, default_value_t = 0)]
    demo_bookings: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    println!("🌱 Starting database seeding...");

    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&args.database_url)
        .await?;

    // Run migrations first; they also insert any missing default prices
    println!("📋 Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await?;

    let pricing_repo = Arc::new(SqlitePricingRepository::new(db_pool.clone()));
    let booking_repo = SqliteBookingRepository::new(db_pool.clone());

    if args.reset_pricing {
        println!("💲 Resetting price list...");
        for (service_type, key, price_cents) in DEFAULT_PRICES {
            pricing_repo.upsert(*service_type, key, *price_cents).await?;
        }
        println!("  ✅ {} prices written", DEFAULT_PRICES.len());
    }

    if args.demo_bookings > 0 {
        println!("🧹 Creating demo bookings...");
        let pricing = PricingService::new(pricing_repo.clone());
        let mut paid = 0;

        for n in 0..args.demo_bookings {
            let bedrooms: u32 = (1..5).fake();
            let bathrooms: u32 = (1..3).fake();
            let living_areas: u32 = (0..3).fake();

            let details = if n % 3 == 2 {
                ServiceDetails::Airbnb {
                    addons: AirbnbAddons {
                        linen: Faker.fake(),
                        towel: Faker.fake(),
                    },
                    bed_sizes: (0..bedrooms)
                        .map(|i| match i % 4 {
                            0 => BedSize::Queen,
                            1 => BedSize::Twin,
                            2 => BedSize::Full,
                            _ => BedSize::King,
                        })
                        .collect(),
                }
            } else {
                ServiceDetails::Home {
                    addons: HomeAddons {
                        deep_cleaning: Faker.fake(),
                        oven_cleaning: Faker.fake(),
                        fridge_cleaning: Faker.fake(),
                        window_cleaning: Faker.fake(),
                        cabinet_cleaning: Faker.fake(),
                    },
                }
            };

            let quote = pricing
                .quote(&details, bedrooms, bathrooms, living_areas)
                .await?;

            let street_number: u32 = (1..400).fake();
            let street: String = StreetName().fake();
            let suffix: String = StreetSuffix().fake();
            let city: String = CityName().fake();
            let days_ahead: i64 = (1..30).fake();

            let booking = Booking {
                id: format!("booking_{}", Uuid::new_v4().simple()),
                details,
                bedrooms,
                bathrooms,
                living_areas,
                customer_name: Name().fake(),
                customer_email: SafeEmail().fake(),
                customer_phone: format!("555{:07}", (0..10_000_000u32).fake::<u32>()),
                address: format!("{} {} {}, {}", street_number, street, suffix, city),
                date: Utc::now().date_naive() + Duration::days(days_ahead),
                time: TimeSlot::ALL[n % TimeSlot::ALL.len()],
                price_cents: quote.total_cents,
                currency: "usd".to_string(),
                payment_status: PaymentStatus::Pending,
                stripe_session_id: None,
                payment_completed_at: None,
                user_id: None,
                created_at: Utc::now(),
            };

            let booking = booking_repo.insert_pending(booking).await?;

            if n % 3 != 1 {
                booking_repo
                    .transition_to_completed(&booking.id, &format!("pi_demo_{:04}", n))
                    .await?;
                paid += 1;
            }
        }

        println!(
            "  ✅ Created {} demo bookings ({} paid, {} pending)",
            args.demo_bookings,
            paid,
            args.demo_bookings - paid
        );
    }

    println!("🎉 Seeding complete!");

    Ok(())
}
