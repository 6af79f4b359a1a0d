//! Audit trail with serde-serializable events and JSON persistence.
//!
//! Every applied transition and external side effect (inquiry creation,
//! verdict persistence, checkout creation, payment sync) is recorded with
//! a timestamp, giving a replayable record of one session's journey.
//!
//! Events are persisted to `.onboard/audit/{session_id}.json` after each
//! record for durability.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Error types for audit operations.
#[derive(Error, Debug)]
pub enum AuditError {
    /// Failed to serialize audit event
    #[error("Serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    /// Failed to write audit file
    #[error("Write failed: {0}")]
    WriteFailed(#[from] std::io::Error),

    /// Failed to create audit directory
    #[error("Directory creation failed: {0}")]
    DirectoryFailed(String),
}

/// Audit event for workflow activity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum AuditEvent {
    /// A transition was applied to the state machine
    Transition {
        timestamp: DateTime<Utc>,
        from: String,
        to: String,
        event: String,
    },
    /// A transition was rejected as invalid
    TransitionRejected {
        timestamp: DateTime<Utc>,
        state: String,
        event: String,
    },
    /// A provider inquiry was created
    InquiryCreated {
        timestamp: DateTime<Utc>,
        inquiry_id: String,
        email: String,
    },
    /// A verdict was resolved and persisted
    StatusChecked {
        timestamp: DateTime<Utc>,
        inquiry_id: String,
        provider_status: Option<String>,
        provider_decision: Option<String>,
        verdict: String,
        blocked_by_watchlist: bool,
    },
    /// A payment checkout session was created
    CheckoutCreated {
        timestamp: DateTime<Utc>,
        session_id: String,
        product_key: String,
        amount_cents: i64,
    },
    /// A payment session was synced after the return redirect
    PaymentSynced {
        timestamp: DateTime<Utc>,
        session_id: String,
        payment_status: Option<String>,
    },
    /// The session was reset
    SessionReset {
        timestamp: DateTime<Utc>,
        kept_email: bool,
    },
}

/// Audit log recording and persisting one session's events.
pub struct AuditLog {
    /// Session this log belongs to
    session_id: Uuid,
    /// Accumulated events
    events: Vec<AuditEvent>,
    /// Directory for audit file storage
    audit_dir: PathBuf,
}

impl AuditLog {
    /// Creates a new audit log for a session.
    pub fn new(session_id: Uuid) -> Self {
        Self::with_dir(session_id, PathBuf::from(".onboard/audit"))
    }

    /// Creates a new audit log with a custom audit directory.
    ///
    /// # Arguments
    ///
    /// * `session_id` - Session the log belongs to
    /// * `audit_dir` - Directory path for audit file storage
    pub fn with_dir(session_id: Uuid, audit_dir: PathBuf) -> Self {
        Self {
            session_id,
            events: Vec::new(),
            audit_dir,
        }
    }

    /// Records an audit event and persists to disk.
    pub async fn record(&mut self, event: AuditEvent) -> Result<(), AuditError> {
        self.events.push(event);
        self.persist().await?;
        Ok(())
    }

    /// Persists all events to the audit file.
    async fn persist(&self) -> Result<(), AuditError> {
        tokio::fs::create_dir_all(&self.audit_dir)
            .await
            .map_err(|e| AuditError::DirectoryFailed(e.to_string()))?;

        let json = serde_json::to_string_pretty(&self.events)?;
        let audit_path = self.audit_dir.join(format!("{}.json", self.session_id));
        tokio::fs::write(audit_path, json).await?;

        Ok(())
    }

    /// Returns a replay of all recorded events.
    pub fn replay(&self) -> Vec<AuditEvent> {
        self.events.clone()
    }

    /// Returns the session id this log belongs to.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }
}

/// Current UTC timestamp for audit events.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now()
}
