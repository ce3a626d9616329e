use async_trait::async_trait;
use futures_util::future::join_all;
use std::sync::Arc;
use tokio::{sync::RwLock, task::JoinHandle};

use crate::domain::Booking;
use crate::error::Result;

pub mod email;

pub use email::SmtpNotifier;

#[derive(Debug, Clone)]
pub enum NotificationEvent {
    BookingConfirmed(Booking),
}

impl NotificationEvent {
    pub fn booking(&self) -> &Booking {
        match self {
            NotificationEvent::BookingConfirmed(booking) => booking,
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;
    fn is_enabled(&self) -> bool;
    async fn notify(&self, event: &NotificationEvent) -> Result<()>;
}

/// Best-effort fan-out of booking notifications. Nothing here can fail the
/// caller: notifier errors are logged and dropped.
pub struct NotificationDispatcher {
    notifiers: RwLock<Vec<Arc<dyn Notifier>>>,
}

impl NotificationDispatcher {
    pub fn new() -> Self {
        Self {
            notifiers: RwLock::new(Vec::new()),
        }
    }

    pub async fn register(&self, notifier: Arc<dyn Notifier>) {
        if notifier.is_enabled() {
            tracing::info!("Registered notifier: {}", notifier.name());
            self.notifiers.write().await.push(notifier);
        }
    }

    pub async fn dispatch(&self, event: NotificationEvent) {
        let notifiers = self.notifiers.read().await;
        let booking_id = event.booking().id.clone();

        let sends = notifiers
            .iter()
            .filter(|notifier| notifier.is_enabled())
            .map(|notifier| {
                let event = &event;
                async move { (notifier.name().to_string(), notifier.notify(event).await) }
            });

        for (name, result) in join_all(sends).await {
            match result {
                Ok(_) => {
                    tracing::debug!(booking_id = %booking_id, "Notifier {} delivered", name);
                }
                Err(e) => {
                    tracing::error!(
                        booking_id = %booking_id,
                        "Notifier {} failed: {:?}",
                        name,
                        e
                    );
                }
            }
        }
    }

    /// Runs `dispatch` on its own task so the caller never waits on it.
    pub fn dispatch_in_background(self: &Arc<Self>, event: NotificationEvent) -> JoinHandle<()> {
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move { dispatcher.dispatch(event).await })
    }
}

impl Default for NotificationDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes confirmations to the log; the fallback when no mail relay is set up.
pub struct LogNotifier {
    enabled: bool,
}

impl LogNotifier {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn notify(&self, event: &NotificationEvent) -> Result<()> {
        match event {
            NotificationEvent::BookingConfirmed(booking) => {
                tracing::info!(
                    booking_id = %booking.id,
                    customer_email = %booking.customer_email,
                    date = %booking.date,
                    time = booking.time.as_str(),
                    "Booking confirmation sent"
                );
            }
        }
        Ok(())
    }
}
