//! onboardkit flow layer - KYC and billing workflow orchestration.
//!
//! This crate drives the onboarding journey as an explicit state machine:
//!
//! - Routing: returning users resume where their stored status left them
//! - Verification: hosted provider flow, polled for a verdict
//! - Billing: checkout creation and post-redirect payment sync
//! - Audit: every transition and side effect recorded
//!
//! The journey is: start -> verify -> check-status -> billing/dashboard,
//! with a failed branch when verification is declined or a watchlist
//! report blocks it.

pub mod audit;
pub mod billing;
pub mod engine;
pub mod session;
pub mod state;

pub use audit::{AuditError, AuditEvent, AuditLog};
pub use billing::{BillingConfig, CheckoutClient, CheckoutSession, PaymentGateway, Product};
pub use engine::FlowEngine;
pub use session::Session;
pub use state::{transition, FlowEvent, FlowState, InvalidTransition};

/// Error types for flow operations.
#[derive(thiserror::Error, Debug)]
pub enum FlowError {
    /// Submitted email failed validation
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// The state machine rejected an event
    #[error(transparent)]
    Transition(#[from] InvalidTransition),

    /// An operation needs session context that is not present
    #[error("Missing session context: {0}")]
    MissingContext(String),

    /// Unknown product catalog key
    #[error("Unknown product: {0}")]
    UnknownProduct(String),

    /// Payment provider rejected a request
    #[error("Payment provider error: {0}")]
    Payment(String),

    /// Payment provider is not configured
    #[error("Payment provider is not configured. Missing STRIPE_SECRET_KEY.")]
    PaymentNotConfigured,

    /// Audit trail failure
    #[error("Audit error: {0}")]
    Audit(#[from] AuditError),

    /// Error from the core SDK (provider communication, config)
    #[error("Core error: {0}")]
    Core(#[from] onboard_core::CoreError),

    /// Error from the persistence layer
    #[error("Store error: {0}")]
    Store(#[from] onboard_store::StoreError),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type for flow operations.
pub type Result<T> = std::result::Result<T, FlowError>;
