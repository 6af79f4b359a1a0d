//! Core types for onboardkit.
//!
//! Wire types mirror the identity provider's JSON:API response shape
//! (`data.attributes` plus an `included` array). Every field is optional:
//! a partially absent payload is "no information", not a parse error.

use serde::{Deserialize, Serialize};

/// Opaque identifier of a provider-side verification attempt.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InquiryId(pub String);

impl std::fmt::Display for InquiryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for InquiryId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Internal tri-state verification classification.
///
/// This is a classification derived fresh from each provider response,
/// not a persistent state machine: repeated polls re-derive it from
/// scratch with no memory of prior values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KycStatus {
    /// Verification has not reached a terminal outcome yet
    Pending,
    /// Identity verified and watchlist screening passed
    Verified,
    /// Verification declined or blocked by watchlist screening
    Failed,
}

impl std::fmt::Display for KycStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            KycStatus::Pending => "PENDING",
            KycStatus::Verified => "VERIFIED",
            KycStatus::Failed => "FAILED",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for KycStatus {
    type Err = crate::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(KycStatus::Pending),
            "VERIFIED" => Ok(KycStatus::Verified),
            "FAILED" => Ok(KycStatus::Failed),
            other => Err(crate::CoreError::Config(format!(
                "Unknown KYC status: {}",
                other
            ))),
        }
    }
}

/// Parsed "get inquiry" response from the identity provider.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InquiryResponse {
    /// Primary inquiry record
    #[serde(default)]
    pub data: InquiryData,
    /// Side-loaded records (reports, account objects)
    #[serde(default)]
    pub included: Vec<IncludedObject>,
}

/// The `data` member of an inquiry response.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InquiryData {
    /// Provider-assigned inquiry id
    #[serde(default)]
    pub id: Option<String>,
    /// JSON:API type tag (normally "inquiry")
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Inquiry attributes
    #[serde(default)]
    pub attributes: InquiryAttributes,
}

/// Attributes of the inquiry record.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InquiryAttributes {
    /// Free-text provider status ("pending", "completed", "review", ...)
    #[serde(default)]
    pub status: Option<String>,
    /// Free-text provider decision ("approved", "declined", ...), often absent
    #[serde(default)]
    pub decision: Option<String>,
    /// Direct URL into the provider's hosted verification flow, when returned
    #[serde(rename = "inquiry-url", alias = "inquiry_url", default)]
    pub inquiry_url: Option<String>,
}

/// One side-loaded object from the `included` array.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct IncludedObject {
    /// Provider-assigned record id
    #[serde(default)]
    pub id: Option<String>,
    /// JSON:API type tag ("report", "account", ...)
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Record attributes
    #[serde(default)]
    pub attributes: ReportAttributes,
}

/// Attributes of a side-loaded report record.
///
/// Providers are inconsistent about where the report category lives, so
/// all three observed field names are kept.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ReportAttributes {
    /// Report category ("watchlist", "identity-document", ...)
    #[serde(rename = "report-type", default)]
    pub report_type: Option<String>,
    /// Alternative category field used by template-based reports
    #[serde(rename = "report-template-name", default)]
    pub report_template_name: Option<String>,
    /// Alternative category field used by older payloads
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Report status
    #[serde(default)]
    pub status: Option<String>,
    /// Report decision
    #[serde(default)]
    pub decision: Option<String>,
    /// Explicit match flag
    #[serde(rename = "match", default)]
    pub match_flag: Option<bool>,
    /// Explicit has-match flag
    #[serde(rename = "has-match", default)]
    pub has_match: Option<bool>,
}

impl ReportAttributes {
    /// Returns the report category, if any field carries one.
    ///
    /// A report with no determinable category is never classified
    /// as a watchlist report.
    pub fn category(&self) -> Option<&str> {
        self.report_type
            .as_deref()
            .or(self.report_template_name.as_deref())
            .or(self.kind.as_deref())
    }
}

/// A watchlist/sanctions report extracted from an inquiry response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistReport {
    /// Report category as reported by the provider
    #[serde(rename = "type")]
    pub category: String,
    /// Report status
    pub status: Option<String>,
    /// Report decision
    pub decision: Option<String>,
}

/// Immutable verdict derived from a single provider response.
///
/// Invariant: `status == Verified` if and only if `allowed`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationVerdict {
    /// Tri-state internal classification
    pub status: KycStatus,
    /// Provider-level approval with no watchlist block
    pub allowed: bool,
    /// Any classified watchlist report carried a blocking signal
    pub blocked_by_watchlist: bool,
    /// Classified watchlist reports, input order preserved
    pub watchlist_reports: Vec<WatchlistReport>,
    /// Raw provider status, for display
    pub provider_status: Option<String>,
    /// Raw provider decision, for display
    pub provider_decision: Option<String>,
}
