//! Per-session workflow context.
//!
//! Replaces the server-rendered UI's mutable session dictionary with a
//! typed record. The engine mutates it only through applied transitions.

use crate::state::FlowState;
use onboard_core::{InquiryId, KycStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// State carried across one user's onboarding session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    /// Session identifier
    pub id: Uuid,
    /// Current workflow state
    pub state: FlowState,
    /// User email, once captured
    pub email: Option<String>,
    /// Provider inquiry id, once verification has started
    pub inquiry_id: Option<InquiryId>,
    /// Hosted verification flow URL
    pub inquiry_url: Option<String>,
    /// Last resolved KYC status
    pub kyc_status: Option<KycStatus>,
    /// Pending checkout redirect URL
    pub checkout_url: Option<String>,
    /// Product selected at checkout
    pub selected_product: Option<String>,
    /// Payment session id from the return redirect
    pub return_session_id: Option<String>,
}

impl Session {
    /// Creates a fresh session at the start page.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: FlowState::Start,
            email: None,
            inquiry_id: None,
            inquiry_url: None,
            kyc_status: None,
            checkout_url: None,
            selected_product: None,
            return_session_id: None,
        }
    }

    /// Clears the session back to the start page.
    ///
    /// # Arguments
    ///
    /// * `keep_email` - Preserve the captured email across the reset
    pub fn reset(&mut self, keep_email: bool) {
        let email = if keep_email { self.email.take() } else { None };
        *self = Self::new();
        self.email = email;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_starts_at_start() {
        let session = Session::new();
        assert_eq!(session.state, FlowState::Start);
        assert!(session.email.is_none());
    }

    #[test]
    fn test_reset_keeping_email() {
        let mut session = Session::new();
        session.email = Some("a@example.com".to_string());
        session.inquiry_id = Some(InquiryId::from("inq_1"));
        session.state = FlowState::KycFailed;

        session.reset(true);
        assert_eq!(session.state, FlowState::Start);
        assert_eq!(session.email.as_deref(), Some("a@example.com"));
        assert!(session.inquiry_id.is_none());
    }

    #[test]
    fn test_reset_dropping_email() {
        let mut session = Session::new();
        session.email = Some("a@example.com".to_string());
        session.reset(false);
        assert!(session.email.is_none());
    }
}
