//! Candidate consent
//!
//! Consent is collected out-of-band: the candidate receives an email with a
//! time-limited token and acknowledges it. Only the resulting status is
//! visible here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Candidate-side consent signal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsentStatus {
    NotRequested,
    PendingConsent,
    ConsentGiven,
    ConsentDenied,
    TokenExpired,
}

impl ConsentStatus {
    pub fn is_given(&self) -> bool {
        matches!(self, Self::ConsentGiven)
    }

    /// Whether a (re)send of the consent email is permitted
    pub fn allows_send(&self) -> bool {
        matches!(
            self,
            Self::NotRequested | Self::PendingConsent | Self::TokenExpired | Self::ConsentDenied
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotRequested => "NOT_REQUESTED",
            Self::PendingConsent => "PENDING_CONSENT",
            Self::ConsentGiven => "CONSENT_GIVEN",
            Self::ConsentDenied => "CONSENT_DENIED",
            Self::TokenExpired => "TOKEN_EXPIRED",
        }
    }
}

impl std::fmt::Display for ConsentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of sending a consent email
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentDispatch {
    /// Token embedded in the email; fresh on every send
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_allowed_for_everything_but_given() {
        assert!(ConsentStatus::NotRequested.allows_send());
        assert!(ConsentStatus::PendingConsent.allows_send());
        assert!(ConsentStatus::TokenExpired.allows_send());
        assert!(ConsentStatus::ConsentDenied.allows_send());
        assert!(!ConsentStatus::ConsentGiven.allows_send());
    }

    #[test]
    fn test_consent_wire_name() {
        let s: ConsentStatus = serde_json::from_str("\"TOKEN_EXPIRED\"").unwrap();
        assert_eq!(s, ConsentStatus::TokenExpired);
    }

    #[test]
    fn test_dispatch_wire_format() {
        let dispatch: ConsentDispatch =
            serde_json::from_str(r#"{"token":"t-1","expiresAt":"2026-03-01T00:00:00Z"}"#).unwrap();
        assert_eq!(dispatch.token, "t-1");
        assert_eq!(dispatch.expires_at.to_rfc3339(), "2026-03-01T00:00:00+00:00");
    }
}
