use std::sync::Arc;

use crate::{
    domain::{billable_items, PricingEntry, Quote, QuoteLine, ServiceDetails, ServiceType},
    error::{AppError, Result},
    repository::PricingRepository,
};

pub struct PricingService {
    repo: Arc<dyn PricingRepository>,
}

impl PricingService {
    pub fn new(repo: Arc<dyn PricingRepository>) -> Self {
        Self { repo }
    }

    fn overflow(key: &str) -> AppError {
        AppError::Validation(format!("Booking total is out of range at {}", key))
    }

    /// Unit price in cents for one line item of a service.
    pub async fn resolve_price(&self, service_type: ServiceType, key: &str) -> Result<i64> {
        self.repo
            .find(service_type, key)
            .await?
            .map(|entry| entry.price_cents)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "No price for {} / {}",
                    service_type.as_str(),
                    key
                ))
            })
    }

    /// Create or overwrite the single entry for the pair. No history is kept.
    pub async fn upsert_price(
        &self,
        service_type: ServiceType,
        key: &str,
        price_cents: i64,
    ) -> Result<PricingEntry> {
        let key = key.trim();
        if key.is_empty() {
            return Err(AppError::Validation("Pricing key cannot be empty".to_string()));
        }
        if price_cents < 0 {
            return Err(AppError::Validation("Price cannot be negative".to_string()));
        }

        let entry = self.repo.upsert(service_type, key, price_cents).await?;
        tracing::info!(
            service_type = service_type.as_str(),
            key = %entry.key,
            price_cents = entry.price_cents,
            "Price updated"
        );
        Ok(entry)
    }

    /// Entries ordered by service type, then key.
    pub async fn list_prices(&self, service_type: Option<ServiceType>) -> Result<Vec<PricingEntry>> {
        self.repo.list(service_type).await
    }

    /// Server-side price for a booking. Every billable line must have an
    /// entry in the pricing table.
    pub async fn quote(
        &self,
        details: &ServiceDetails,
        bedrooms: u32,
        bathrooms: u32,
        living_areas: u32,
    ) -> Result<Quote> {
        let service_type = details.service_type();
        let mut lines = Vec::new();
        let mut total_cents: i64 = 0;

        for (key, quantity) in billable_items(details, bedrooms, bathrooms, living_areas) {
            let unit_price_cents = self.resolve_price(service_type, key).await?;
            let line_total = unit_price_cents
                .checked_mul(i64::from(quantity))
                .ok_or_else(|| Self::overflow(key))?;
            total_cents = total_cents
                .checked_add(line_total)
                .ok_or_else(|| Self::overflow(key))?;

            lines.push(QuoteLine {
                key: key.to_string(),
                quantity,
                unit_price_cents,
                total_cents: line_total,
            });
        }

        Ok(Quote {
            service_type,
            lines,
            total_cents,
        })
    }
}
