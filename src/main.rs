use std::sync::Arc;
use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cleanpro::{
    api,
    config::Settings,
    notifications::{LogNotifier, NotificationDispatcher, SmtpNotifier},
    payments::{PaymentGateway, StripeGateway},
    service::ServiceContext,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cleanpro=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let settings = Settings::new().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
        Settings::default()
    });

    tracing::info!("Starting CleanPro server on {}:{}", settings.server.host, settings.server.port);

    // Initialize database
    let db_pool = SqlitePoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect(&settings.database.url)
        .await?;

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await?;

    // Notifications
    let notifications = Arc::new(NotificationDispatcher::new());
    notifications
        .register(Arc::new(LogNotifier::new(settings.notifications.log_enabled)))
        .await;

    match SmtpNotifier::new(settings.notifications.smtp.clone()) {
        Ok(Some(smtp)) => notifications.register(Arc::new(smtp)).await,
        Ok(None) => tracing::info!("SMTP confirmations disabled"),
        Err(e) => tracing::warn!("SMTP notifier not started: {}", e),
    }

    // Payment gateway; without it checkout and webhooks answer 503
    let gateway: Option<Arc<dyn PaymentGateway>> = match settings.stripe_credentials() {
        Some((api_key, webhook_secret)) => {
            tracing::info!("Stripe payment processing enabled");
            Some(Arc::new(StripeGateway::new(api_key, webhook_secret)) as Arc<dyn PaymentGateway>)
        }
        None if settings.stripe.enabled => {
            tracing::warn!("Stripe enabled but missing configuration");
            None
        }
        None => {
            tracing::info!("Stripe payment processing disabled");
            None
        }
    };

    let service_context = Arc::new(ServiceContext::new(
        db_pool,
        gateway,
        notifications,
        settings.stripe.currency.clone(),
    ));

    if settings.admin.api_token.as_deref().map_or(true, str::is_empty) {
        tracing::warn!("No admin API token configured; admin endpoints are closed");
    }

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let app = api::create_app(service_context, Arc::new(settings));

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;

    tracing::info!("Server listening on http://{}:{}", host, port);

    axum::serve(listener, app).await?;

    Ok(())
}
