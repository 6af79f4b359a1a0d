//! Verification outcome resolution.
//!
//! Maps a provider's heterogeneous inquiry response (status, decision, and
//! side-loaded sanctions/watchlist reports) onto the internal tri-state
//! verdict. A watchlist hit overrides an otherwise-approved decision.
//!
//! Resolution is a pure data mapping: no I/O, no state, never an error.
//! Missing fields mean "no information" and unrecognized tokens resolve
//! to PENDING, so a user is never hard-failed on sparse data.

use crate::types::{
    InquiryResponse, KycStatus, ReportAttributes, VerificationVerdict, WatchlistReport,
};

/// Category substrings that mark a report as watchlist/sanctions screening.
///
/// Substring match, not exact match: providers name these reports
/// inconsistently ("watchlist", "OFAC-Watchlist-v2", "aml-screening").
const WATCHLIST_MARKERS: [&str; 4] = ["watchlist", "sanction", "ofac", "aml"];

/// Report decisions that block the verdict.
const BLOCKING_DECISIONS: [&str; 3] = ["declined", "rejected", "failed"];

/// Report statuses that block the verdict.
const BLOCKING_STATUSES: [&str; 2] = ["failed", "declined"];

/// Top-level decisions that fail the verdict outright.
const FAILING_DECISIONS: [&str; 2] = ["declined", "rejected"];

/// Top-level statuses that fail the verdict outright.
const FAILING_STATUSES: [&str; 3] = ["declined", "failed", "rejected"];

/// Resolves a provider response into a verification verdict.
///
/// Deterministic and total: any well-formed response yields a verdict,
/// and identical inputs yield identical verdicts.
///
/// # Arguments
///
/// * `response` - Parsed "get inquiry" response, including reports
pub fn resolve(response: &InquiryResponse) -> VerificationVerdict {
    let attrs = &response.data.attributes;
    let status = normalize(attrs.status.as_deref());
    let decision = normalize(attrs.decision.as_deref());

    let mut watchlist_reports = Vec::new();
    let mut blocked_by_watchlist = false;

    for item in &response.included {
        if !is_report(item.kind.as_deref()) {
            continue;
        }
        let Some(category) = item.attributes.category() else {
            continue;
        };
        if !is_watchlist_category(category) {
            continue;
        }

        if is_blocking(&item.attributes) {
            blocked_by_watchlist = true;
        }

        watchlist_reports.push(WatchlistReport {
            category: category.to_string(),
            status: item.attributes.status.clone(),
            decision: item.attributes.decision.clone(),
        });
    }

    let allowed = (decision == "approved" || status == "approved") && !blocked_by_watchlist;

    let internal = if allowed {
        KycStatus::Verified
    } else if blocked_by_watchlist
        || FAILING_DECISIONS.contains(&decision.as_str())
        || FAILING_STATUSES.contains(&status.as_str())
    {
        KycStatus::Failed
    } else {
        KycStatus::Pending
    };

    VerificationVerdict {
        status: internal,
        allowed,
        blocked_by_watchlist,
        watchlist_reports,
        provider_status: attrs.status.clone(),
        provider_decision: attrs.decision.clone(),
    }
}

/// Lowercases a token, treating absence as the empty string.
fn normalize(token: Option<&str>) -> String {
    token.unwrap_or_default().to_lowercase()
}

fn is_report(kind: Option<&str>) -> bool {
    matches!(kind, Some("report") | Some("reports"))
}

/// Case-insensitive substring classification of a report category.
fn is_watchlist_category(category: &str) -> bool {
    let category = category.to_lowercase();
    WATCHLIST_MARKERS.iter().any(|m| category.contains(m))
}

/// Whether a classified watchlist report carries a blocking signal.
fn is_blocking(attrs: &ReportAttributes) -> bool {
    let decision = normalize(attrs.decision.as_deref());
    let status = normalize(attrs.status.as_deref());

    BLOCKING_DECISIONS.contains(&decision.as_str())
        || BLOCKING_STATUSES.contains(&status.as_str())
        || attrs.match_flag == Some(true)
        || attrs.has_match == Some(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: serde_json::Value) -> InquiryResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_approved_with_no_reports_is_verified() {
        let verdict = resolve(&response(serde_json::json!({
            "data": {"attributes": {"status": "completed", "decision": "approved"}},
            "included": []
        })));
        assert_eq!(verdict.status, KycStatus::Verified);
        assert!(verdict.allowed);
        assert!(!verdict.blocked_by_watchlist);
        assert!(verdict.watchlist_reports.is_empty());
    }

    #[test]
    fn test_watchlist_decline_overrides_approval() {
        let verdict = resolve(&response(serde_json::json!({
            "data": {"attributes": {"status": "completed", "decision": "approved"}},
            "included": [
                {"type": "report", "attributes": {"report-type": "watchlist", "decision": "declined"}}
            ]
        })));
        assert_eq!(verdict.status, KycStatus::Failed);
        assert!(!verdict.allowed);
        assert!(verdict.blocked_by_watchlist);
        assert_eq!(
            verdict.watchlist_reports,
            vec![WatchlistReport {
                category: "watchlist".to_string(),
                status: None,
                decision: Some("declined".to_string()),
            }]
        );
    }

    #[test]
    fn test_review_with_no_decision_is_pending() {
        let verdict = resolve(&response(serde_json::json!({
            "data": {"attributes": {"status": "review"}},
            "included": []
        })));
        assert_eq!(verdict.status, KycStatus::Pending);
        assert!(!verdict.allowed);
    }

    #[test]
    fn test_pending_with_no_decision_is_pending() {
        let verdict = resolve(&response(serde_json::json!({
            "data": {"attributes": {"status": "pending", "decision": null}},
            "included": []
        })));
        assert_eq!(verdict.status, KycStatus::Pending);
        assert!(!verdict.allowed);
        assert!(!verdict.blocked_by_watchlist);
        assert!(verdict.watchlist_reports.is_empty());
    }

    #[test]
    fn test_unrecognized_tokens_default_to_pending() {
        let verdict = resolve(&response(serde_json::json!({
            "data": {"attributes": {"status": "some-new-status", "decision": "maybe"}}
        })));
        assert_eq!(verdict.status, KycStatus::Pending);
    }

    #[test]
    fn test_declined_status_fails_without_reports() {
        for status in ["declined", "failed", "rejected", "DECLINED"] {
            let verdict = resolve(&response(serde_json::json!({
                "data": {"attributes": {"status": status}}
            })));
            assert_eq!(verdict.status, KycStatus::Failed, "status {}", status);
            assert!(!verdict.blocked_by_watchlist);
        }
    }

    #[test]
    fn test_declined_decision_fails_without_reports() {
        for decision in ["declined", "rejected"] {
            let verdict = resolve(&response(serde_json::json!({
                "data": {"attributes": {"status": "completed", "decision": decision}}
            })));
            assert_eq!(verdict.status, KycStatus::Failed, "decision {}", decision);
        }
    }

    #[test]
    fn test_classification_is_case_insensitive_substring() {
        let verdict = resolve(&response(serde_json::json!({
            "data": {"attributes": {"status": "completed", "decision": "approved"}},
            "included": [
                {"type": "report", "attributes": {"report-type": "OFAC-Watchlist-v2", "status": "ready"}},
                {"type": "report", "attributes": {"report-type": "identity-document", "decision": "declined"}}
            ]
        })));
        // OFAC report classified but not blocking; identity-document ignored
        assert_eq!(verdict.watchlist_reports.len(), 1);
        assert_eq!(verdict.watchlist_reports[0].category, "OFAC-Watchlist-v2");
        assert_eq!(verdict.status, KycStatus::Verified);
    }

    #[test]
    fn test_match_flag_blocks() {
        for flag in ["match", "has-match"] {
            let verdict = resolve(&response(serde_json::json!({
                "data": {"attributes": {"status": "completed", "decision": "approved"}},
                "included": [
                    {"type": "report", "attributes": {"report-type": "aml-screening", flag: true}}
                ]
            })));
            assert_eq!(verdict.status, KycStatus::Failed, "flag {}", flag);
            assert!(verdict.blocked_by_watchlist);
        }
    }

    #[test]
    fn test_report_with_missing_category_is_ignored() {
        let verdict = resolve(&response(serde_json::json!({
            "data": {"attributes": {"status": "completed", "decision": "approved"}},
            "included": [
                {"type": "report", "attributes": {"decision": "declined"}}
            ]
        })));
        assert!(verdict.watchlist_reports.is_empty());
        assert_eq!(verdict.status, KycStatus::Verified);
    }

    #[test]
    fn test_non_report_included_objects_are_ignored() {
        let verdict = resolve(&response(serde_json::json!({
            "data": {"attributes": {"status": "completed", "decision": "approved"}},
            "included": [
                {"type": "account", "attributes": {"report-type": "watchlist", "decision": "declined"}}
            ]
        })));
        assert!(verdict.watchlist_reports.is_empty());
        assert_eq!(verdict.status, KycStatus::Verified);
    }

    #[test]
    fn test_report_order_preserved() {
        let verdict = resolve(&response(serde_json::json!({
            "data": {"attributes": {"status": "completed"}},
            "included": [
                {"type": "report", "attributes": {"report-type": "sanctions-eu", "status": "ready"}},
                {"type": "report", "attributes": {"report-type": "watchlist-us", "status": "failed"}},
                {"type": "report", "attributes": {"report-type": "aml", "status": "ready"}}
            ]
        })));
        let categories: Vec<&str> = verdict
            .watchlist_reports
            .iter()
            .map(|r| r.category.as_str())
            .collect();
        assert_eq!(categories, vec!["sanctions-eu", "watchlist-us", "aml"]);
        assert!(verdict.blocked_by_watchlist);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let input = response(serde_json::json!({
            "data": {"attributes": {"status": "completed", "decision": "approved"}},
            "included": [
                {"type": "report", "attributes": {"report-type": "watchlist", "status": "ready"}}
            ]
        }));
        assert_eq!(resolve(&input), resolve(&input));
    }

    #[test]
    fn test_empty_response_is_pending() {
        let verdict = resolve(&InquiryResponse::default());
        assert_eq!(verdict.status, KycStatus::Pending);
        assert!(!verdict.allowed);
        assert!(!verdict.blocked_by_watchlist);
    }

    #[test]
    fn test_verified_iff_allowed() {
        // Approval via raw status alone is sufficient
        let verdict = resolve(&response(serde_json::json!({
            "data": {"attributes": {"status": "approved"}}
        })));
        assert_eq!(verdict.status, KycStatus::Verified);
        assert!(verdict.allowed);

        // Watchlist block flips both
        let verdict = resolve(&response(serde_json::json!({
            "data": {"attributes": {"status": "approved"}},
            "included": [
                {"type": "report", "attributes": {"report-type": "watchlist", "status": "failed"}}
            ]
        })));
        assert_eq!(verdict.status, KycStatus::Failed);
        assert!(!verdict.allowed);
    }
}
