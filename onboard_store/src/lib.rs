//! onboardkit persistence layer.
//!
//! This crate owns the relational state of the onboarding flow:
//!
//! - **Users Module**: email, inquiry id, KYC status
//! - **Checkouts Module**: payment checkout records, synced by polling
//! - **Metrics Module**: operation counters
//!
//! Backed by SQLite through sqlx. Schema is bootstrapped on open, so a
//! fresh database file is immediately usable.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use onboard_store::Store;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Store::open("sqlite:onboard.db?mode=rwc").await?;
//!     store.users().upsert("a@example.com", None, None).await?;
//!     Ok(())
//! }
//! ```

pub mod checkouts;
pub mod metrics;
pub mod users;

pub use checkouts::{Checkouts, CheckoutRecord, NewCheckout};
pub use metrics::{MetricKind, StoreMetrics};
pub use users::{UserRecord, Users};

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

/// Main error type for store operations.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored value could not be interpreted.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

/// Type alias for Result with StoreError.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Entry point for the persistence layer.
///
/// Cloning is cheap; the pool and metrics are shared.
#[derive(Clone, Debug)]
pub struct Store {
    pool: SqlitePool,
    metrics: StoreMetrics,
}

impl Store {
    /// Opens a store on the given SQLite URL and bootstraps the schema.
    ///
    /// # Arguments
    ///
    /// * `database_url` - e.g. `sqlite:onboard.db?mode=rwc`
    pub async fn open(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        let store = Self {
            pool,
            metrics: StoreMetrics::new(),
        };
        store.init_schema().await?;
        Ok(store)
    }

    /// Opens an in-memory store, for tests and tools.
    ///
    /// Pinned to a single connection so every query sees the same
    /// in-memory database.
    pub async fn open_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let store = Self {
            pool,
            metrics: StoreMetrics::new(),
        };
        store.init_schema().await?;
        Ok(store)
    }

    /// Creates all tables and indexes if they do not exist.
    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              email TEXT NOT NULL UNIQUE,
              inquiry_id TEXT,
              kyc_status TEXT NOT NULL DEFAULT 'PENDING',
              created_at TEXT NOT NULL,
              updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS checkouts (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              email TEXT NOT NULL,
              inquiry_id TEXT,
              product_key TEXT NOT NULL,
              amount_cents INTEGER NOT NULL,
              currency TEXT NOT NULL DEFAULT 'usd',
              session_id TEXT NOT NULL UNIQUE,
              payment_status TEXT,
              session_status TEXT,
              created_at TEXT NOT NULL,
              updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_checkouts_email ON checkouts(email)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_checkouts_inquiry ON checkouts(inquiry_id)")
            .execute(&self.pool)
            .await?;

        tracing::debug!("Store schema ready");
        Ok(())
    }

    /// Accesses user operations.
    pub fn users(&self) -> Users<'_> {
        Users::new(&self.pool, &self.metrics)
    }

    /// Accesses checkout operations.
    pub fn checkouts(&self) -> Checkouts<'_> {
        Checkouts::new(&self.pool, &self.metrics)
    }

    /// Returns the shared metrics collector.
    pub fn metrics(&self) -> &StoreMetrics {
        &self.metrics
    }
}

/// Current UTC timestamp in the stored text format.
pub(crate) fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}
