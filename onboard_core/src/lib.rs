//! onboardkit - KYC onboarding SDK
//!
//! This crate provides the core building blocks for identity-verification
//! onboarding:
//!
//! - **Resolver Module**: Maps provider responses onto tri-state verdicts
//! - **Provider Module**: REST client for the identity provider
//! - **Config Module**: Environment-based configuration
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use onboard_core::{resolver, IdentityClient, InquiryId, ProviderConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = IdentityClient::new(ProviderConfig::from_env()?)?;
//!
//!     let inquiry = client
//!         .get_inquiry_with_reports(&InquiryId::from("inq_123"))
//!         .await?;
//!     let verdict = resolver::resolve(&inquiry);
//!     println!("Verdict: {:?}", verdict.status);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`types`]: Wire types and the verdict record
//! - [`error`]: Error types for all operations
//! - [`resolver`]: Verification outcome resolution
//! - [`provider`]: Identity provider REST client
//! - [`config`]: Environment-based configuration

pub mod config;
pub mod error;
pub mod provider;
pub mod resolver;
pub mod types;

// Re-export commonly used types
pub use config::ProviderConfig;
pub use error::{CoreError, Result};
pub use provider::{IdentityClient, VerificationProvider};
pub use types::{
    InquiryId, InquiryResponse, KycStatus, VerificationVerdict, WatchlistReport,
};
