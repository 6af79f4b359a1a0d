//! Workflow orchestrator.
//!
//! The engine owns one session and sequences the onboarding journey:
//! every user action becomes a [`FlowEvent`], the transition table decides
//! the next state, and the engine performs the side effects that belong to
//! the applied transition (provider calls, verdict resolution, persistence,
//! checkout creation). Rejected transitions leave the session untouched.

use crate::audit::{self, AuditEvent, AuditLog};
use crate::billing::{self, CheckoutSession, PaymentGateway};
use crate::session::Session;
use crate::state::{transition, FlowEvent, FlowState};
use crate::{FlowError, Result};
use onboard_core::{resolver, InquiryId, KycStatus, VerificationProvider, VerificationVerdict};
use onboard_store::{CheckoutRecord, NewCheckout, Store};
use std::path::PathBuf;
use std::sync::Arc;

/// Orchestrator for one onboarding session.
pub struct FlowEngine {
    /// Identity provider client
    provider: Arc<dyn VerificationProvider>,
    /// Persistence layer
    store: Store,
    /// Payment gateway, when billing is configured
    gateway: Option<Arc<dyn PaymentGateway>>,
    /// The session being driven
    session: Session,
    /// Audit log for this session
    audit: AuditLog,
}

impl FlowEngine {
    /// Creates an engine with a fresh session.
    pub fn new(provider: Arc<dyn VerificationProvider>, store: Store) -> Self {
        let session = Session::new();
        let audit = AuditLog::new(session.id);
        Self {
            provider,
            store,
            gateway: None,
            session,
            audit,
        }
    }

    /// Attaches a payment gateway.
    pub fn with_gateway(mut self, gateway: Arc<dyn PaymentGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Redirects audit persistence to a custom directory.
    pub fn with_audit_dir(mut self, audit_dir: PathBuf) -> Self {
        self.audit = AuditLog::with_dir(self.session.id, audit_dir);
        self
    }

    /// Returns the current session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Returns a replay of the audit trail.
    pub fn audit_events(&self) -> Vec<AuditEvent> {
        self.audit.replay()
    }

    /// Applies an event to the state machine, recording the outcome.
    async fn apply(&mut self, event: FlowEvent) -> Result<FlowState> {
        match transition(self.session.state, &event) {
            Ok(next) => {
                self.audit
                    .record(AuditEvent::Transition {
                        timestamp: audit::now(),
                        from: self.session.state.to_string(),
                        to: next.to_string(),
                        event: format!("{:?}", event),
                    })
                    .await?;
                tracing::debug!("Transition {} -> {}", self.session.state, next);
                self.session.state = next;
                Ok(next)
            }
            Err(rejected) => {
                self.audit
                    .record(AuditEvent::TransitionRejected {
                        timestamp: audit::now(),
                        state: self.session.state.to_string(),
                        event: format!("{:?}", event),
                    })
                    .await?;
                Err(rejected.into())
            }
        }
    }

    /// Handles email submission on the start page.
    ///
    /// Routes a returning user by stored status: VERIFIED users go
    /// straight to billing, users with a live inquiry resume verification,
    /// everyone else gets a fresh inquiry.
    pub async fn submit_email(&mut self, email: &str) -> Result<()> {
        if !email.contains('@') {
            return Err(FlowError::InvalidEmail(email.to_string()));
        }

        let user = self.store.users().get_by_email(email).await?;
        let known_status = match &user {
            Some(user) => Some(user.status()?),
            None => None,
        };
        let stored_inquiry = user.as_ref().and_then(|u| u.inquiry_id.clone());

        let next = self
            .apply(FlowEvent::EmailSubmitted { known_status })
            .await?;
        self.session.email = Some(email.to_string());
        self.session.kyc_status = known_status;

        match next {
            FlowState::Billing => {
                // Returning verified user
                self.session.inquiry_id = stored_inquiry.map(InquiryId);
            }
            FlowState::Verify => {
                if let Some(inquiry_id) = stored_inquiry {
                    // Resume the stored inquiry
                    let inquiry_id = InquiryId(inquiry_id);
                    self.session.inquiry_url =
                        Some(self.provider.hosted_flow_url(&inquiry_id));
                    self.session.inquiry_id = Some(inquiry_id);
                } else {
                    self.restart_verification(email.to_string()).await?;
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Creates a fresh inquiry and points the session at it.
    async fn restart_verification(&mut self, email: String) -> Result<()> {
        let response = self.provider.create_inquiry(Some(&email)).await?;
        let inquiry_id = response.data.id.ok_or_else(|| {
            onboard_core::CoreError::Provider(
                "Provider did not return an inquiry id".to_string(),
            )
        })?;
        let inquiry_id = InquiryId(inquiry_id);

        self.store
            .users()
            .upsert(&email, Some(&inquiry_id.0), Some(KycStatus::Pending))
            .await?;

        self.audit
            .record(AuditEvent::InquiryCreated {
                timestamp: audit::now(),
                inquiry_id: inquiry_id.0.clone(),
                email: email.clone(),
            })
            .await?;

        self.session.email = Some(email);
        self.session.inquiry_url = Some(self.provider.hosted_flow_url(&inquiry_id));
        self.session.inquiry_id = Some(inquiry_id);
        self.session.kyc_status = Some(KycStatus::Pending);
        self.session.checkout_url = None;
        self.session.selected_product = None;

        Ok(())
    }

    /// Moves from the verification page to status checking.
    pub async fn request_check(&mut self) -> Result<()> {
        self.apply(FlowEvent::CheckRequested).await?;
        Ok(())
    }

    /// Polls the provider, resolves a verdict, and advances the flow.
    ///
    /// VERIFIED lands on billing, FAILED on the rejection page, PENDING
    /// stays here for another poll. A provider-communication failure
    /// propagates as an error and changes neither state nor stored status.
    pub async fn check_status(&mut self) -> Result<VerificationVerdict> {
        let inquiry_id = self
            .session
            .inquiry_id
            .clone()
            .ok_or_else(|| {
                FlowError::MissingContext("no inquiry has been created yet".to_string())
            })?;

        let inquiry = self.provider.get_inquiry_with_reports(&inquiry_id).await?;
        let verdict = resolver::resolve(&inquiry);

        self.store
            .users()
            .set_status_by_inquiry(&inquiry_id.0, verdict.status)
            .await?;
        self.session.kyc_status = Some(verdict.status);

        self.audit
            .record(AuditEvent::StatusChecked {
                timestamp: audit::now(),
                inquiry_id: inquiry_id.0.clone(),
                provider_status: verdict.provider_status.clone(),
                provider_decision: verdict.provider_decision.clone(),
                verdict: verdict.status.to_string(),
                blocked_by_watchlist: verdict.blocked_by_watchlist,
            })
            .await?;

        self.apply(FlowEvent::StatusResolved(verdict.status)).await?;
        Ok(verdict)
    }

    /// Creates a checkout session for a product and returns the redirect URL.
    pub async fn start_checkout(&mut self, product_key: &str) -> Result<String> {
        let gateway = self
            .gateway
            .clone()
            .ok_or(FlowError::PaymentNotConfigured)?;
        let email = self
            .session
            .email
            .clone()
            .ok_or_else(|| FlowError::MissingContext("no email captured".to_string()))?;
        let inquiry_id = self
            .session
            .inquiry_id
            .clone()
            .ok_or_else(|| FlowError::MissingContext("no inquiry on session".to_string()))?;
        let product = billing::product(product_key)
            .ok_or_else(|| FlowError::UnknownProduct(product_key.to_string()))?;

        self.apply(FlowEvent::CheckoutStarted).await?;

        let checkout = gateway.create_session(product, &email, &inquiry_id.0).await?;

        self.store
            .checkouts()
            .record(NewCheckout {
                email,
                inquiry_id: Some(inquiry_id.0),
                product_key: product.key.to_string(),
                amount_cents: product.amount_cents,
                currency: product.currency.to_string(),
                session_id: checkout.id.clone(),
                payment_status: checkout.payment_status.clone(),
                session_status: checkout.status.clone(),
            })
            .await?;

        self.audit
            .record(AuditEvent::CheckoutCreated {
                timestamp: audit::now(),
                session_id: checkout.id.clone(),
                product_key: product.key.to_string(),
                amount_cents: product.amount_cents,
            })
            .await?;

        self.session.selected_product = Some(product.key.to_string());
        self.session.checkout_url = checkout.url.clone();

        checkout
            .url
            .ok_or_else(|| FlowError::Payment("No redirect URL on checkout session".to_string()))
    }

    /// Handles the redirect back from the payment provider.
    ///
    /// On success with a session id, polls the provider and syncs the
    /// stored checkout row.
    pub async fn payment_return(
        &mut self,
        success: bool,
        session_id: Option<&str>,
    ) -> Result<Option<CheckoutSession>> {
        self.apply(FlowEvent::PaymentReturned { success }).await?;
        self.session.return_session_id = session_id.map(|s| s.to_string());

        if !success {
            return Ok(None);
        }

        let (Some(session_id), Some(gateway)) = (session_id, &self.gateway) else {
            return Ok(None);
        };

        let checkout = gateway.retrieve_session(session_id).await?;
        self.store
            .checkouts()
            .sync_status(
                &checkout.id,
                checkout.payment_status.as_deref(),
                checkout.status.as_deref(),
            )
            .await?;

        self.audit
            .record(AuditEvent::PaymentSynced {
                timestamp: audit::now(),
                session_id: checkout.id.clone(),
                payment_status: checkout.payment_status.clone(),
            })
            .await?;

        Ok(Some(checkout))
    }

    /// Continues from the payment result page to the dashboard.
    pub async fn continue_to_dashboard(&mut self) -> Result<()> {
        self.apply(FlowEvent::ContinueToDashboard).await?;
        Ok(())
    }

    /// Returns to plan selection.
    pub async fn back_to_billing(&mut self) -> Result<()> {
        self.apply(FlowEvent::BackToBilling).await?;
        Ok(())
    }

    /// Returns from status checking to the verification page.
    pub async fn back_to_verify(&mut self) -> Result<()> {
        self.apply(FlowEvent::BackToVerify).await?;
        Ok(())
    }

    /// Restarts the flow.
    ///
    /// When an email is still known (on the session, or via the stored
    /// inquiry), verification restarts with a fresh inquiry; otherwise the
    /// session resets to the start page.
    pub async fn start_over(&mut self) -> Result<()> {
        let email = match self.session.email.clone() {
            Some(email) => Some(email),
            None => match &self.session.inquiry_id {
                Some(inquiry_id) => self
                    .store
                    .users()
                    .get_by_inquiry(&inquiry_id.0)
                    .await?
                    .map(|u| u.email),
                None => None,
            },
        };

        self.apply(FlowEvent::StartOver {
            email_known: email.is_some(),
        })
        .await?;

        match email {
            Some(email) => {
                self.restart_verification(email).await?;
            }
            None => {
                self.session.reset(false);
                self.audit
                    .record(AuditEvent::SessionReset {
                        timestamp: audit::now(),
                        kept_email: false,
                    })
                    .await?;
            }
        }

        Ok(())
    }

    /// Fetches the most recent checkout for the session's email.
    pub async fn latest_checkout(&self) -> Result<Option<CheckoutRecord>> {
        let Some(email) = &self.session.email else {
            return Ok(None);
        };
        Ok(self.store.checkouts().latest_for_email(email).await?)
    }
}
