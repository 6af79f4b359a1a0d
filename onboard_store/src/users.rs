//! User records: email, inquiry id, KYC status.

use crate::metrics::{MetricKind, StoreMetrics};
use crate::{Result, StoreError};
use onboard_core::KycStatus;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// A stored user row.
#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRecord {
    /// Row id
    pub id: i64,
    /// Unique email address
    pub email: String,
    /// Provider inquiry id, once verification has started
    pub inquiry_id: Option<String>,
    /// KYC status as stored ("PENDING", "VERIFIED", "FAILED")
    pub kyc_status: String,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    /// Last update timestamp (RFC 3339)
    pub updated_at: String,
}

impl UserRecord {
    /// Parses the stored KYC status.
    pub fn status(&self) -> Result<KycStatus> {
        self.kyc_status
            .parse()
            .map_err(|_| StoreError::InvalidRecord(format!("kyc_status = {}", self.kyc_status)))
    }
}

/// User operations.
pub struct Users<'a> {
    pool: &'a SqlitePool,
    metrics: &'a StoreMetrics,
}

impl<'a> Users<'a> {
    pub(crate) fn new(pool: &'a SqlitePool, metrics: &'a StoreMetrics) -> Self {
        Self { pool, metrics }
    }

    /// Inserts or updates a user by email.
    ///
    /// Absent values preserve what is already stored; a fresh insert with
    /// no status starts at PENDING.
    pub async fn upsert(
        &self,
        email: &str,
        inquiry_id: Option<&str>,
        status: Option<KycStatus>,
    ) -> Result<()> {
        let now = crate::now();
        sqlx::query(
            r#"
            INSERT INTO users (email, inquiry_id, kyc_status, created_at, updated_at)
            VALUES (?1, ?2, COALESCE(?3, 'PENDING'), ?4, ?4)
            ON CONFLICT(email) DO UPDATE SET
              inquiry_id = COALESCE(?2, users.inquiry_id),
              kyc_status = COALESCE(?3, users.kyc_status),
              updated_at = ?4
            "#,
        )
        .bind(email)
        .bind(inquiry_id)
        .bind(status.map(|s| s.to_string()))
        .bind(&now)
        .execute(self.pool)
        .await?;

        self.metrics.record(MetricKind::UserUpsert);
        Ok(())
    }

    /// Fetches a user by email.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE email = ?1 LIMIT 1")
            .bind(email)
            .fetch_optional(self.pool)
            .await?;

        self.metrics.record(MetricKind::UserLookup);
        Ok(row)
    }

    /// Fetches a user by provider inquiry id.
    pub async fn get_by_inquiry(&self, inquiry_id: &str) -> Result<Option<UserRecord>> {
        let row =
            sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE inquiry_id = ?1 LIMIT 1")
                .bind(inquiry_id)
                .fetch_optional(self.pool)
                .await?;

        self.metrics.record(MetricKind::UserLookup);
        Ok(row)
    }

    /// Updates the KYC status of the user owning an inquiry.
    pub async fn set_status_by_inquiry(
        &self,
        inquiry_id: &str,
        status: KycStatus,
    ) -> Result<()> {
        sqlx::query("UPDATE users SET kyc_status = ?1, updated_at = ?2 WHERE inquiry_id = ?3")
            .bind(status.to_string())
            .bind(crate::now())
            .bind(inquiry_id)
            .execute(self.pool)
            .await?;

        self.metrics.record(MetricKind::StatusUpdate);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::Store;
    use onboard_core::KycStatus;

    #[tokio::test]
    async fn test_upsert_and_lookup() {
        let store = Store::open_in_memory().await.unwrap();
        store
            .users()
            .upsert("a@example.com", Some("inq_1"), Some(KycStatus::Pending))
            .await
            .unwrap();

        let user = store
            .users()
            .get_by_email("a@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.inquiry_id.as_deref(), Some("inq_1"));
        assert_eq!(user.status().unwrap(), KycStatus::Pending);
    }

    #[tokio::test]
    async fn test_upsert_preserves_absent_fields() {
        let store = Store::open_in_memory().await.unwrap();
        store
            .users()
            .upsert("a@example.com", Some("inq_1"), Some(KycStatus::Verified))
            .await
            .unwrap();

        // Re-upsert with no inquiry or status keeps both
        store.users().upsert("a@example.com", None, None).await.unwrap();

        let user = store
            .users()
            .get_by_email("a@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.inquiry_id.as_deref(), Some("inq_1"));
        assert_eq!(user.status().unwrap(), KycStatus::Verified);
    }

    #[tokio::test]
    async fn test_set_status_by_inquiry() {
        let store = Store::open_in_memory().await.unwrap();
        store
            .users()
            .upsert("a@example.com", Some("inq_1"), Some(KycStatus::Pending))
            .await
            .unwrap();

        store
            .users()
            .set_status_by_inquiry("inq_1", KycStatus::Failed)
            .await
            .unwrap();

        let user = store
            .users()
            .get_by_inquiry("inq_1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.status().unwrap(), KycStatus::Failed);
    }

    #[tokio::test]
    async fn test_fresh_insert_defaults_to_pending() {
        let store = Store::open_in_memory().await.unwrap();
        store.users().upsert("a@example.com", None, None).await.unwrap();

        let user = store
            .users()
            .get_by_email("a@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.status().unwrap(), KycStatus::Pending);
    }
}
