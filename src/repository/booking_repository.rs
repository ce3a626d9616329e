use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::{
    domain::{Booking, PaymentStatus, ServiceDetails, ServiceType, TimeSlot},
    error::{AppError, Result},
    repository::{BookingRepository, Transition},
};

const BOOKING_COLUMNS: &str = r#"
    id, service_type, bedrooms, bathrooms, living_areas, addons, bed_sizes,
    customer_name, customer_email, customer_phone, address, date, time,
    price_cents, currency, payment_status, stripe_session_id,
    payment_completed_at, user_id, created_at
"#;

#[derive(FromRow)]
struct BookingRow {
    id: String,
    service_type: String,
    bedrooms: i64,
    bathrooms: i64,
    living_areas: i64,
    addons: String,
    bed_sizes: Option<String>,
    customer_name: String,
    customer_email: String,
    customer_phone: String,
    address: String,
    date: NaiveDate,
    time: String,
    price_cents: i64,
    currency: String,
    payment_status: String,
    stripe_session_id: Option<String>,
    payment_completed_at: Option<NaiveDateTime>,
    user_id: Option<String>,
    created_at: NaiveDateTime,
}

pub struct SqliteBookingRepository {
    pool: SqlitePool,
}

impl SqliteBookingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_booking(row: BookingRow) -> Result<Booking> {
        let service_type = ServiceType::from_str(&row.service_type)
            .ok_or_else(|| AppError::Database(format!("Invalid service type: {}", row.service_type)))?;

        let details = match service_type {
            ServiceType::Home => ServiceDetails::Home {
                addons: Self::parse_json(&row.addons)?,
            },
            ServiceType::Airbnb => ServiceDetails::Airbnb {
                addons: Self::parse_json(&row.addons)?,
                bed_sizes: match row.bed_sizes {
                    Some(ref raw) => Self::parse_json(raw)?,
                    None => Vec::new(),
                },
            },
        };

        Ok(Booking {
            id: row.id,
            details,
            bedrooms: row.bedrooms as u32,
            bathrooms: row.bathrooms as u32,
            living_areas: row.living_areas as u32,
            customer_name: row.customer_name,
            customer_email: row.customer_email,
            customer_phone: row.customer_phone,
            address: row.address,
            date: row.date,
            time: TimeSlot::from_str(&row.time)
                .ok_or_else(|| AppError::Database(format!("Invalid time slot: {}", row.time)))?,
            price_cents: row.price_cents,
            currency: row.currency,
            payment_status: PaymentStatus::from_str(&row.payment_status)
                .ok_or_else(|| AppError::Database(format!("Invalid payment status: {}", row.payment_status)))?,
            stripe_session_id: row.stripe_session_id,
            payment_completed_at: row
                .payment_completed_at
                .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
            user_id: row.user_id,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
        })
    }

    fn parse_json<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T> {
        serde_json::from_str(raw).map_err(|e| AppError::Database(e.to_string()))
    }

    /// Splits the service details into the `addons` and `bed_sizes` columns.
    fn details_to_columns(details: &ServiceDetails) -> Result<(String, Option<String>)> {
        let to_json = |value: serde_json::Result<String>| {
            value.map_err(|e| AppError::Internal(e.to_string()))
        };

        match details {
            ServiceDetails::Home { addons } => Ok((to_json(serde_json::to_string(addons))?, None)),
            ServiceDetails::Airbnb { addons, bed_sizes } => Ok((
                to_json(serde_json::to_string(addons))?,
                Some(to_json(serde_json::to_string(bed_sizes))?),
            )),
        }
    }

    async fn fetch_list(&self, filter: &str, bind: Option<&str>) -> Result<Vec<Booking>> {
        let sql = format!(
            "SELECT {} FROM bookings {} ORDER BY created_at DESC, rowid DESC",
            BOOKING_COLUMNS, filter
        );

        let mut query = sqlx::query_as::<_, BookingRow>(&sql);
        if let Some(value) = bind {
            query = query.bind(value);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(Self::row_to_booking)
            .collect()
    }
}

#[async_trait]
impl BookingRepository for SqliteBookingRepository {
    async fn insert_pending(&self, booking: Booking) -> Result<Booking> {
        let (addons, bed_sizes) = Self::details_to_columns(&booking.details)?;
        let created_at = booking.created_at.naive_utc();

        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, service_type, bedrooms, bathrooms, living_areas, addons, bed_sizes,
                customer_name, customer_email, customer_phone, address, date, time,
                price_cents, currency, payment_status, stripe_session_id,
                payment_completed_at, user_id, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, NULL, ?, ?)
            "#
        )
        .bind(&booking.id)
        .bind(booking.service_type().as_str())
        .bind(booking.bedrooms as i64)
        .bind(booking.bathrooms as i64)
        .bind(booking.living_areas as i64)
        .bind(&addons)
        .bind(&bed_sizes)
        .bind(&booking.customer_name)
        .bind(&booking.customer_email)
        .bind(&booking.customer_phone)
        .bind(&booking.address)
        .bind(booking.date)
        .bind(booking.time.as_str())
        .bind(booking.price_cents)
        .bind(&booking.currency)
        .bind(PaymentStatus::Pending.as_str())
        .bind(&booking.user_id)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::DuplicateId(booking.id.clone())
            }
            other => AppError::Database(other.to_string()),
        })?;

        self.find_by_id(&booking.id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created booking".to_string())
        })
    }

    async fn transition_to_completed(&self, id: &str, payment_reference: &str) -> Result<Transition> {
        let now = Utc::now().naive_utc();

        // Compare-and-set on the status column; only one writer can match.
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET payment_status = ?,
                stripe_session_id = ?,
                payment_completed_at = ?
            WHERE id = ? AND payment_status = ?
            "#
        )
        .bind(PaymentStatus::Completed.as_str())
        .bind(payment_reference)
        .bind(now)
        .bind(id)
        .bind(PaymentStatus::Pending.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        let booking = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking not found: {}", id)))?;

        if result.rows_affected() == 1 {
            return Ok(Transition::Applied(booking));
        }

        match booking.payment_status {
            PaymentStatus::Completed => Ok(Transition::AlreadyCompleted(booking)),
            PaymentStatus::Pending => Err(AppError::Database(format!(
                "Completion of booking {} did not apply",
                id
            ))),
        }
    }

    async fn delete_pending(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = ? AND payment_status = ?")
            .bind(id)
            .bind(PaymentStatus::Pending.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>> {
        let sql = format!("SELECT {} FROM bookings WHERE id = ?", BOOKING_COLUMNS);
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_booking(r)?)),
            None => Ok(None)
        }
    }

    async fn list_by_status(&self, status: PaymentStatus) -> Result<Vec<Booking>> {
        self.fetch_list("WHERE payment_status = ?", Some(status.as_str())).await
    }

    async fn list_all(&self) -> Result<Vec<Booking>> {
        self.fetch_list("", None).await
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Booking>> {
        self.fetch_list("WHERE user_id = ?", Some(user_id)).await
    }
}
