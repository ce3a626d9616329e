use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::{
    config::SmtpConfig,
    domain::{cents_to_dollars, Booking},
    error::{AppError, Result},
    notifications::{NotificationEvent, Notifier},
};

/// Plain-text booking confirmations over SMTP.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpNotifier {
    pub fn new(config: Option<SmtpConfig>) -> Result<Option<Self>> {
        let Some(cfg) = config.filter(|cfg| cfg.enabled) else {
            return Ok(None);
        };

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.host)
            .map_err(|e| AppError::Internal(format!("SMTP relay setup failed: {}", e)))?
            .port(cfg.port)
            .credentials(Credentials::new(cfg.username.clone(), cfg.password.clone()))
            .build();

        Ok(Some(Self {
            transport,
            from_address: cfg.from_address,
        }))
    }

    fn confirmation_body(booking: &Booking) -> String {
        format!(
            "Hi {},\n\nYour {} cleaning is confirmed for {} at {}.\nAddress: {}\nBooking reference: {}\nAmount paid: ${:.2} {}\n",
            booking.customer_name,
            booking.service_type().as_str().to_lowercase(),
            booking.date,
            booking.time.as_str(),
            booking.address,
            booking.id,
            cents_to_dollars(booking.price_cents),
            booking.currency.to_uppercase(),
        )
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    fn name(&self) -> &str {
        "smtp"
    }

    fn is_enabled(&self) -> bool {
        true
    }

    async fn notify(&self, event: &NotificationEvent) -> Result<()> {
        let NotificationEvent::BookingConfirmed(booking) = event;

        let from = self
            .from_address
            .parse::<Mailbox>()
            .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?;
        let to = booking
            .customer_email
            .parse::<Mailbox>()
            .map_err(|e| AppError::External(format!("Invalid recipient address: {}", e)))?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(format!("Booking confirmed: {}", booking.id))
            .header(ContentType::TEXT_PLAIN)
            .body(Self::confirmation_body(booking))
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::External(format!("SMTP send failed: {}", e)))?;

        Ok(())
    }
}
