//! Identity provider REST client.
//!
//! Thin client over the provider's JSON:API inquiry endpoints. Transport
//! and non-2xx failures surface as [`CoreError::Provider`] / [`CoreError::Http`]
//! so callers can distinguish "could not determine status" from a FAILED
//! verification verdict.

use crate::config::ProviderConfig;
use crate::types::{InquiryId, InquiryResponse};
use crate::{CoreError, Result};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

/// Seam over the identity provider, for callers and test doubles.
#[async_trait]
pub trait VerificationProvider: Send + Sync {
    /// Creates a new inquiry, optionally tagged with a caller reference id.
    async fn create_inquiry(&self, reference_id: Option<&str>) -> Result<InquiryResponse>;

    /// Fetches an inquiry with its reports side-loaded when possible.
    async fn get_inquiry_with_reports(&self, inquiry_id: &InquiryId) -> Result<InquiryResponse>;

    /// Builds the hosted verification flow URL for an inquiry.
    fn hosted_flow_url(&self, inquiry_id: &InquiryId) -> String;
}

/// Client for the identity provider's inquiry API.
#[derive(Clone, Debug)]
pub struct IdentityClient {
    http: reqwest::Client,
    config: ProviderConfig,
}

impl IdentityClient {
    /// Creates a new client from provider configuration.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()?;

        Ok(Self { http, config })
    }

    /// Creates a new inquiry, optionally tagged with a caller reference id.
    ///
    /// Uses the configured inquiry template when one is set.
    pub async fn create_inquiry(&self, reference_id: Option<&str>) -> Result<InquiryResponse> {
        let url = format!("{}/inquiries", self.config.api_base);

        let mut attributes = serde_json::Map::new();
        if let Some(template) = &self.config.template_id {
            attributes.insert("inquiry-template-id".to_string(), json!(template));
        }
        if let Some(reference) = reference_id {
            attributes.insert("reference-id".to_string(), json!(reference));
        }

        let payload = json!({
            "data": {
                "type": "inquiry",
                "attributes": attributes,
            }
        });

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .header("Accept", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(CoreError::Provider(format!(
                "Failed to create inquiry: {} {}",
                status, body
            )));
        }

        let inquiry: InquiryResponse = resp.json().await?;
        tracing::info!(
            "Created inquiry {}",
            inquiry.data.id.as_deref().unwrap_or("<no id>")
        );
        Ok(inquiry)
    }

    /// Fetches an inquiry, optionally side-loading related records.
    pub async fn get_inquiry(
        &self,
        inquiry_id: &InquiryId,
        include: Option<&str>,
    ) -> Result<InquiryResponse> {
        let url = format!("{}/inquiries/{}", self.config.api_base, inquiry_id);

        let mut request = self
            .http
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .header("Accept", "application/json");
        if let Some(include) = include {
            request = request.query(&[("include", include)]);
        }

        let resp = request.send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(CoreError::Provider(format!(
                "Failed to fetch inquiry: {} {}",
                status, body
            )));
        }

        Ok(resp.json().await?)
    }

    /// Fetches an inquiry with its account reports for watchlist screening.
    ///
    /// The provider is strict about `include`: some accounts/templates
    /// support `account`, others reject any include. Tries the safe
    /// include first and falls back to a plain fetch.
    pub async fn get_inquiry_with_reports(&self, inquiry_id: &InquiryId) -> Result<InquiryResponse> {
        match self.get_inquiry(inquiry_id, Some("account")).await {
            Ok(inquiry) => Ok(inquiry),
            Err(CoreError::Provider(msg))
                if msg.contains("not a valid include") || msg.contains("Bad request") =>
            {
                tracing::debug!("Include rejected for inquiry {}, retrying bare", inquiry_id);
                self.get_inquiry(inquiry_id, None).await
            }
            Err(e) => Err(e),
        }
    }

    /// Builds the hosted verification flow URL for an inquiry.
    ///
    /// Hosted flow URLs are constructed from the inquiry id; the API does
    /// not always return a direct inquiry-url.
    pub fn hosted_flow_url(&self, inquiry_id: &InquiryId) -> String {
        format!(
            "{}?inquiry-id={}",
            self.config.hosted_flow_base, inquiry_id
        )
    }
}

#[async_trait]
impl VerificationProvider for IdentityClient {
    async fn create_inquiry(&self, reference_id: Option<&str>) -> Result<InquiryResponse> {
        IdentityClient::create_inquiry(self, reference_id).await
    }

    async fn get_inquiry_with_reports(&self, inquiry_id: &InquiryId) -> Result<InquiryResponse> {
        IdentityClient::get_inquiry_with_reports(self, inquiry_id).await
    }

    fn hosted_flow_url(&self, inquiry_id: &InquiryId) -> String {
        IdentityClient::hosted_flow_url(self, inquiry_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;

    #[test]
    fn test_hosted_flow_url() {
        let client = IdentityClient::new(
            ProviderConfig::new("https://example.test/api/v1", "key")
                .with_hosted_flow_base("https://example.test/inquiry"),
        )
        .unwrap();

        assert_eq!(
            client.hosted_flow_url(&InquiryId::from("inq_123")),
            "https://example.test/inquiry?inquiry-id=inq_123"
        );
    }
}
