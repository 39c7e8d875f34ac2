//! Consent gate: candidate consent before the Primary stage
//!
//! Only PRIMARY finalization consults consent; SECONDARY and FINAL
//! proceed without it. Missing consent is a soft block the operator may
//! explicitly override.

use crate::service::VerificationService;
use crate::session::VerificationSession;
use bgv_types::*;
use std::sync::Arc;

/// Whether the operator has chosen to proceed without consent
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConsentPolicy {
    /// Block with [`BgvError::ConsentRequired`] unless consent was given
    #[default]
    Enforce,
    /// The operator confirmed proceeding without consent
    Override,
}

/// Gates PRIMARY finalization and consent email dispatch
pub struct ConsentGate<S: ?Sized> {
    service: Arc<S>,
}

impl<S: ?Sized> Clone for ConsentGate<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

impl<S: VerificationService + ?Sized> ConsentGate<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self { service }
    }

    /// Fail with a consent warning if `stage` needs consent that is missing.
    ///
    /// Uses the session's cached status, fetching it only when nothing is
    /// cached yet. Never calls anything that mutates the record.
    pub async fn ensure(
        &self,
        session: &mut VerificationSession,
        stage: Stage,
        policy: ConsentPolicy,
    ) -> BgvResult<()> {
        if stage != Stage::Primary {
            return Ok(());
        }

        let status = match session.consent() {
            Some(status) => status,
            None => self.refresh(session).await?,
        };
        if status.is_given() {
            return Ok(());
        }

        match policy {
            ConsentPolicy::Override => {
                tracing::warn!(
                    candidate = ?session.candidate(),
                    consent = %status,
                    "Proceeding with PRIMARY without candidate consent (operator override)"
                );
                Ok(())
            }
            ConsentPolicy::Enforce => {
                tracing::warn!(
                    candidate = ?session.candidate(),
                    consent = %status,
                    "PRIMARY blocked pending candidate consent"
                );
                Err(BgvError::ConsentRequired { status })
            }
        }
    }

    /// Fetch and cache the candidate's consent status
    pub async fn refresh(&self, session: &mut VerificationSession) -> BgvResult<ConsentStatus> {
        let candidate = session.require_candidate()?.clone();
        let status = self.service.get_consent_status(&candidate).await?;
        session.set_consent(status);
        Ok(status)
    }

    /// Send or resend the consent email.
    ///
    /// Permitted unless consent is already given. The service must issue a
    /// token different from the previous dispatch.
    pub async fn send(&self, session: &mut VerificationSession) -> BgvResult<ConsentDispatch> {
        let candidate = session.require_candidate()?.clone();
        let status = match session.consent() {
            Some(status) => status,
            None => self.refresh(session).await?,
        };
        if !status.allows_send() {
            return Err(BgvError::ConsentNotSendable { status });
        }

        let dispatch = self.service.send_consent(&candidate).await?;
        if session
            .last_dispatch()
            .is_some_and(|previous| previous.token == dispatch.token)
        {
            return Err(BgvError::server(
                None,
                "consent service reissued the previous token",
            ));
        }

        tracing::info!(
            candidate = %candidate,
            expires_at = %dispatch.expires_at,
            "Consent email sent"
        );
        session.record_dispatch(dispatch.clone());
        Ok(dispatch)
    }
}
