//! Workflow states and the transition table.
//!
//! The onboarding journey is a small finite-state machine with named
//! states and an explicit `(state, event) -> state` function, replacing
//! per-session dictionary mutation with an auditable transition table.
//! Invalid pairs are rejected, never applied and never a panic.

use onboard_core::KycStatus;
use serde::{Deserialize, Serialize};

/// A page/state of the onboarding journey.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowState {
    /// Email capture
    Start,
    /// Hosted verification pending on the provider side
    Verify,
    /// Polling the provider for a verdict
    CheckStatus,
    /// Plan selection and checkout
    Billing,
    /// Returned from the payment provider with success
    PaymentSuccess,
    /// Returned from the payment provider with cancel
    PaymentCancel,
    /// Verified and paid-or-browsing
    Dashboard,
    /// Verification definitively failed
    KycFailed,
}

impl std::fmt::Display for FlowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// An event driving the onboarding state machine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowEvent {
    /// User submitted an email; carries what the store already knows
    EmailSubmitted {
        /// Stored KYC status for this email, if the user exists
        known_status: Option<KycStatus>,
    },
    /// User asked to check the verification status
    CheckRequested,
    /// A fresh verdict was resolved from the provider
    StatusResolved(KycStatus),
    /// A checkout session was created
    CheckoutStarted,
    /// The payment provider redirected back
    PaymentReturned {
        /// Success vs cancel redirect
        success: bool,
    },
    /// User continued past the payment result page
    ContinueToDashboard,
    /// User navigated back to plan selection
    BackToBilling,
    /// User navigated back to the verification page
    BackToVerify,
    /// User restarted the flow
    StartOver {
        /// Whether an email is still known (restarts verification)
        email_known: bool,
    },
}

/// A `(state, event)` pair with no defined transition.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("No transition from {state} on {event:?}")]
pub struct InvalidTransition {
    /// State the machine was in
    pub state: FlowState,
    /// Event that was rejected
    pub event: FlowEvent,
}

/// Computes the next state for an event.
///
/// Pure and total: every defined pair returns the successor state,
/// everything else returns [`InvalidTransition`].
pub fn transition(state: FlowState, event: &FlowEvent) -> Result<FlowState, InvalidTransition> {
    use FlowEvent::*;
    use FlowState::*;

    let next = match (state, event) {
        // Routing on email submission
        (
            Start,
            EmailSubmitted {
                known_status: Some(KycStatus::Verified),
            },
        ) => Billing,
        (Start, EmailSubmitted { .. }) => Verify,

        // Verification polling loop
        (Verify, CheckRequested) => CheckStatus,
        (CheckStatus, StatusResolved(KycStatus::Verified)) => Billing,
        (CheckStatus, StatusResolved(KycStatus::Failed)) => KycFailed,
        (CheckStatus, StatusResolved(KycStatus::Pending)) => CheckStatus,
        (CheckStatus, BackToVerify) => Verify,

        // Billing
        (Billing, CheckoutStarted) => Billing,
        (Dashboard, BackToBilling) => Billing,
        (PaymentCancel, BackToBilling) => Billing,
        (PaymentSuccess, ContinueToDashboard) => Dashboard,

        // The payment provider redirect lands regardless of current state
        (_, PaymentReturned { success: true }) => PaymentSuccess,
        (_, PaymentReturned { success: false }) => PaymentCancel,

        // Restart from anywhere
        (_, StartOver { email_known: true }) => Verify,
        (_, StartOver { email_known: false }) => Start,

        (state, event) => {
            return Err(InvalidTransition {
                state,
                event: event.clone(),
            })
        }
    };

    Ok(next)
}
