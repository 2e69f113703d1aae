//! Two-factor enrollment flow
//!
//! `begin` mints a secret and provisioning URI for the authenticator app,
//! `verify` checks the first code with the external verifier and persists the
//! enrollment record, `disable` turns two-factor off again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::totp::{generate_secret, is_valid_code, provisioning_uri};
use crate::error::ServiceError;
use crate::services::{user_message, Notice, Notifier, OtpVerifier, TwoFactorStore};
use crate::state::Viewer;

/// Two-factor state persisted on the user record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwoFactorRecord {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_at: Option<DateTime<Utc>>,
}

impl TwoFactorRecord {
    pub fn enabled(secret: &str, at: DateTime<Utc>) -> Self {
        Self {
            enabled: true,
            secret: Some(secret.to_string()),
            enabled_at: Some(at),
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            secret: None,
            enabled_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnrollmentError {
    #[error("two-factor setup has not been started")]
    NotStarted,

    #[error("the account has no email address")]
    MissingEmail,

    #[error("verification code must be 6 digits")]
    InvalidCodeFormat,

    #[error("verification code was rejected")]
    CodeRejected,

    #[error("could not build provisioning URI: {0}")]
    Uri(#[from] url::ParseError),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl EnrollmentError {
    pub fn user_message(&self) -> &'static str {
        match self {
            EnrollmentError::NotStarted => user_message("otp/not-enrolled"),
            EnrollmentError::MissingEmail => {
                "Add an email address before enabling two-factor authentication."
            }
            EnrollmentError::InvalidCodeFormat => "Please enter the 6-digit code from your app.",
            EnrollmentError::CodeRejected => user_message("otp/invalid-code"),
            EnrollmentError::Uri(_) => user_message(""),
            EnrollmentError::Service(err) => err.user_message(),
        }
    }
}

/// Secret waiting for its first code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEnrollment {
    pub secret: String,
    pub uri: String,
}

pub struct TwoFactorEnrollment<V, S, N> {
    verifier: V,
    store: S,
    notifier: N,
    issuer: String,
    pending: Option<PendingEnrollment>,
}

impl<V, S, N> TwoFactorEnrollment<V, S, N>
where
    V: OtpVerifier,
    S: TwoFactorStore,
    N: Notifier,
{
    pub fn new(verifier: V, store: S, notifier: N, issuer: impl Into<String>) -> Self {
        Self {
            verifier,
            store,
            notifier,
            issuer: issuer.into(),
            pending: None,
        }
    }

    pub fn pending(&self) -> Option<&PendingEnrollment> {
        self.pending.as_ref()
    }

    /// Start (or restart) setup with a fresh secret
    pub fn begin(&mut self, viewer: &Viewer) -> Result<&PendingEnrollment, EnrollmentError> {
        let email = viewer
            .email
            .as_deref()
            .filter(|e| !e.is_empty())
            .ok_or(EnrollmentError::MissingEmail)?;
        let secret = generate_secret();
        let uri = provisioning_uri(&self.issuer, email, &secret)?.to_string();

        tracing::info!(uid = %viewer.uid, "two-factor setup started");
        Ok(&*self.pending.insert(PendingEnrollment { secret, uri }))
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Check the first code and persist the enabled record
    ///
    /// A rejected code keeps the pending secret so the user can retry.
    pub async fn verify(
        &mut self,
        viewer: &Viewer,
        code: &str,
    ) -> Result<TwoFactorRecord, EnrollmentError> {
        match self.try_verify(viewer, code.trim()).await {
            Ok(record) => {
                self.pending = None;
                tracing::info!(uid = %viewer.uid, "two-factor enabled");
                self.notifier
                    .notify(Notice::success("Two-factor authentication enabled"));
                Ok(record)
            }
            Err(err) => {
                tracing::warn!(uid = %viewer.uid, %err, "two-factor verification failed");
                self.notifier.notify(Notice::error(err.user_message()));
                Err(err)
            }
        }
    }

    async fn try_verify(
        &self,
        viewer: &Viewer,
        code: &str,
    ) -> Result<TwoFactorRecord, EnrollmentError> {
        let pending = self.pending.as_ref().ok_or(EnrollmentError::NotStarted)?;
        if !is_valid_code(code) {
            return Err(EnrollmentError::InvalidCodeFormat);
        }
        if !self.verifier.verify(&pending.secret, code).await? {
            return Err(EnrollmentError::CodeRejected);
        }

        let record = TwoFactorRecord::enabled(&pending.secret, Utc::now());
        self.store.save_two_factor(&viewer.uid, &record).await?;
        Ok(record)
    }

    /// Persist `enabled = false` for the viewer
    pub async fn disable(&mut self, viewer: &Viewer) -> Result<TwoFactorRecord, EnrollmentError> {
        let record = TwoFactorRecord::disabled();
        if let Err(err) = self.store.save_two_factor(&viewer.uid, &record).await {
            tracing::warn!(uid = %viewer.uid, %err, "could not disable two-factor");
            self.notifier.notify(Notice::error(err.user_message()));
            return Err(err.into());
        }
        self.pending = None;
        tracing::info!(uid = %viewer.uid, "two-factor disabled");
        self.notifier
            .notify(Notice::success("Two-factor authentication disabled"));
        Ok(record)
    }
}
