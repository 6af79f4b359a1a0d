//! Product catalog and payment checkout client.
//!
//! Checkout sessions are created against a Stripe-style REST API and
//! synced by polling after the redirect back; there is no webhook path.

use crate::{FlowError, Result};
use async_trait::async_trait;
use onboard_core::config::{env_var, env_var_or};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A purchasable product.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Product {
    /// Catalog key
    pub key: &'static str,
    /// Display name
    pub name: &'static str,
    /// Price in cents
    pub amount_cents: i64,
    /// ISO currency code
    pub currency: &'static str,
    /// One-line description shown at checkout
    pub description: &'static str,
}

/// The fixed product catalog.
pub const PRODUCTS: [Product; 2] = [
    Product {
        key: "agency_pro",
        name: "Agency Pro Bundle",
        amount_cents: 197_700,
        currency: "usd",
        description: "Basic + full stack WordPress + agentic workflow setup",
    },
    Product {
        key: "weown_lite",
        name: "WeOwn Lite Setup",
        amount_cents: 9_700,
        currency: "usd",
        description: "Basic WordPress personal website + AnythingLLM open-source model setup",
    },
];

/// Looks up a product by catalog key.
pub fn product(key: &str) -> Option<&'static Product> {
    PRODUCTS.iter().find(|p| p.key == key)
}

/// Payment provider configuration.
#[derive(Clone, Debug)]
pub struct BillingConfig {
    /// Payment provider REST API base
    pub api_base: String,
    /// Secret API key
    pub secret_key: String,
    /// Public base URL of this app, for redirect URLs
    pub app_base_url: String,
}

impl BillingConfig {
    /// Loads billing configuration from the environment.
    ///
    /// Returns `None` when `STRIPE_SECRET_KEY` is unset: billing is an
    /// optional integration and the flow degrades to an error message at
    /// checkout, not at startup.
    pub fn from_env() -> Option<Self> {
        let secret_key = env_var("STRIPE_SECRET_KEY")?;
        Some(Self {
            api_base: env_var_or("STRIPE_API_BASE", "https://api.stripe.com/v1")
                .trim_end_matches('/')
                .to_string(),
            secret_key,
            app_base_url: env_var_or("APP_BASE_URL", "http://localhost:8501")
                .trim_end_matches('/')
                .to_string(),
        })
    }

    /// Creates a configuration with explicit values, for tests and tools.
    pub fn new(
        api_base: impl Into<String>,
        secret_key: impl Into<String>,
        app_base_url: impl Into<String>,
    ) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
            app_base_url: app_base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

/// A checkout session as returned by the payment provider.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Provider session id
    pub id: String,
    /// Redirect URL for the buyer
    #[serde(default)]
    pub url: Option<String>,
    /// Payment status ("paid", "unpaid", "no_payment_required")
    #[serde(default)]
    pub payment_status: Option<String>,
    /// Session status ("open", "complete", "expired")
    #[serde(default)]
    pub status: Option<String>,
}

/// Seam over the payment provider, for the engine and test doubles.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a checkout session for a product purchase.
    async fn create_session(
        &self,
        product: &Product,
        email: &str,
        inquiry_id: &str,
    ) -> Result<CheckoutSession>;

    /// Retrieves a checkout session by id.
    async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession>;
}

/// Checkout client against the payment provider's REST API.
#[derive(Clone, Debug)]
pub struct CheckoutClient {
    http: reqwest::Client,
    config: BillingConfig,
}

impl CheckoutClient {
    /// Creates a new checkout client.
    pub fn new(config: BillingConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()?;

        Ok(Self { http, config })
    }

    /// Builds the success redirect URL.
    ///
    /// The `{CHECKOUT_SESSION_ID}` placeholder is substituted by the
    /// payment provider on redirect.
    fn success_url(&self) -> String {
        format!(
            "{}/?payment=success&session_id={{CHECKOUT_SESSION_ID}}",
            self.config.app_base_url
        )
    }

    /// Builds the cancel redirect URL.
    fn cancel_url(&self) -> String {
        format!("{}/?payment=cancel", self.config.app_base_url)
    }
}

#[async_trait]
impl PaymentGateway for CheckoutClient {
    async fn create_session(
        &self,
        product: &Product,
        email: &str,
        inquiry_id: &str,
    ) -> Result<CheckoutSession> {
        let url = format!("{}/checkout/sessions", self.config.api_base);

        let params: Vec<(&str, String)> = vec![
            ("mode", "payment".to_string()),
            ("customer_email", email.to_string()),
            ("line_items[0][quantity]", "1".to_string()),
            (
                "line_items[0][price_data][currency]",
                product.currency.to_string(),
            ),
            (
                "line_items[0][price_data][unit_amount]",
                product.amount_cents.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]",
                product.name.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][description]",
                product.description.to_string(),
            ),
            ("success_url", self.success_url()),
            ("cancel_url", self.cancel_url()),
            ("metadata[product_key]", product.key.to_string()),
            ("metadata[email]", email.to_string()),
            ("metadata[inquiry_id]", inquiry_id.to_string()),
        ];

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.config.secret_key)
            .form(&params)
            .send()
            .await
            .map_err(FlowError::Http)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(FlowError::Payment(format!(
                "Failed to create checkout session: {} {}",
                status, body
            )));
        }

        Ok(resp.json().await.map_err(FlowError::Http)?)
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession> {
        let url = format!("{}/checkout/sessions/{}", self.config.api_base, session_id);

        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.config.secret_key)
            .send()
            .await
            .map_err(FlowError::Http)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(FlowError::Payment(format!(
                "Failed to retrieve checkout session: {} {}",
                status, body
            )));
        }

        Ok(resp.json().await.map_err(FlowError::Http)?)
    }
}
