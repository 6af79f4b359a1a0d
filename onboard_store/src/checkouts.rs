//! Checkout records for payment sessions.
//!
//! There is no webhook path: payment state is synced by polling the
//! payment provider and updating the stored row. The provider session id
//! carries a unique constraint, so re-recording the same session is an
//! update, not a duplicate.

use crate::metrics::{MetricKind, StoreMetrics};
use crate::Result;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// A stored checkout row.
#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct CheckoutRecord {
    /// Row id
    pub id: i64,
    /// Buyer email
    pub email: String,
    /// Inquiry the purchase is tied to
    pub inquiry_id: Option<String>,
    /// Product catalog key
    pub product_key: String,
    /// Price in cents
    pub amount_cents: i64,
    /// ISO currency code
    pub currency: String,
    /// Payment provider session id (unique)
    pub session_id: String,
    /// Provider payment status ("paid", "unpaid", ...)
    pub payment_status: Option<String>,
    /// Provider session status ("open", "complete", ...)
    pub session_status: Option<String>,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    /// Last update timestamp (RFC 3339)
    pub updated_at: String,
}

impl CheckoutRecord {
    /// Whether the provider reported this checkout as paid.
    pub fn is_paid(&self) -> bool {
        self.payment_status.as_deref() == Some("paid")
    }
}

/// Input for recording a new checkout.
#[derive(Clone, Debug)]
pub struct NewCheckout {
    /// Buyer email
    pub email: String,
    /// Inquiry the purchase is tied to
    pub inquiry_id: Option<String>,
    /// Product catalog key
    pub product_key: String,
    /// Price in cents
    pub amount_cents: i64,
    /// ISO currency code
    pub currency: String,
    /// Payment provider session id
    pub session_id: String,
    /// Initial payment status as returned at creation
    pub payment_status: Option<String>,
    /// Initial session status as returned at creation
    pub session_status: Option<String>,
}

/// Checkout operations.
pub struct Checkouts<'a> {
    pool: &'a SqlitePool,
    metrics: &'a StoreMetrics,
}

impl<'a> Checkouts<'a> {
    pub(crate) fn new(pool: &'a SqlitePool, metrics: &'a StoreMetrics) -> Self {
        Self { pool, metrics }
    }

    /// Records a checkout, idempotent on the provider session id.
    pub async fn record(&self, checkout: NewCheckout) -> Result<()> {
        let now = crate::now();
        sqlx::query(
            r#"
            INSERT INTO checkouts (
              email, inquiry_id, product_key, amount_cents, currency,
              session_id, payment_status, session_status, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            ON CONFLICT(session_id) DO UPDATE SET
              payment_status = excluded.payment_status,
              session_status = excluded.session_status,
              updated_at = ?9
            "#,
        )
        .bind(&checkout.email)
        .bind(&checkout.inquiry_id)
        .bind(&checkout.product_key)
        .bind(checkout.amount_cents)
        .bind(&checkout.currency)
        .bind(&checkout.session_id)
        .bind(&checkout.payment_status)
        .bind(&checkout.session_status)
        .bind(&now)
        .execute(self.pool)
        .await?;

        self.metrics.record(MetricKind::CheckoutInsert);
        Ok(())
    }

    /// Updates payment/session status after polling the provider.
    pub async fn sync_status(
        &self,
        session_id: &str,
        payment_status: Option<&str>,
        session_status: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE checkouts
            SET payment_status = ?1, session_status = ?2, updated_at = ?3
            WHERE session_id = ?4
            "#,
        )
        .bind(payment_status)
        .bind(session_status)
        .bind(crate::now())
        .bind(session_id)
        .execute(self.pool)
        .await?;

        self.metrics.record(MetricKind::CheckoutSync);
        Ok(())
    }

    /// Fetches a checkout by provider session id.
    pub async fn get_by_session(&self, session_id: &str) -> Result<Option<CheckoutRecord>> {
        let row = sqlx::query_as::<_, CheckoutRecord>(
            "SELECT * FROM checkouts WHERE session_id = ?1 LIMIT 1",
        )
        .bind(session_id)
        .fetch_optional(self.pool)
        .await?;

        self.metrics.record(MetricKind::CheckoutLookup);
        Ok(row)
    }

    /// Fetches the most recent checkout for an email, if any.
    pub async fn latest_for_email(&self, email: &str) -> Result<Option<CheckoutRecord>> {
        let row = sqlx::query_as::<_, CheckoutRecord>(
            r#"
            SELECT * FROM checkouts
            WHERE email = ?1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        self.metrics.record(MetricKind::CheckoutLookup);
        Ok(row)
    }
}
