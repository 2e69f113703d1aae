//! Trait abstractions for external collaborators, mockable in tests

use async_trait::async_trait;

use crate::auth::TwoFactorRecord;
use crate::billing::{Customer, Invoice, PaymentMethod, Subscription};
use crate::error::ServiceError;
use crate::state::{InitialData, Values};

/// Persistence of section values
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SectionStore: Send + Sync {
    /// Stored data a section is seeded from; empty when nothing was saved yet
    async fn load(&self, section_id: &str) -> Result<InitialData, ServiceError>;

    /// Persist a values snapshot
    async fn save(&self, section_id: &str, values: &Values) -> Result<(), ServiceError>;
}

/// Input of a text rewrite call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRequest {
    pub question_id: String,
    pub text: String,
    pub group_index: Option<usize>,
    pub field_id: Option<String>,
}

/// AI-assisted text improvement
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextRewriter: Send + Sync {
    async fn rewrite(&self, request: &RewriteRequest) -> Result<String, ServiceError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A transient, user-facing notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Toast collaborator
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Checks a one-time code against a shared secret
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OtpVerifier: Send + Sync {
    async fn verify(&self, secret: &str, code: &str) -> Result<bool, ServiceError>;
}

/// User records holding the two-factor state
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TwoFactorStore: Send + Sync {
    async fn save_two_factor(&self, uid: &str, record: &TwoFactorRecord) -> Result<(), ServiceError>;
}

/// Billing provider operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// Customer previously created for this user, if any
    async fn find_customer(&self, uid: &str) -> Result<Option<Customer>, ServiceError>;

    async fn create_customer(&self, uid: &str, email: &str) -> Result<Customer, ServiceError>;

    async fn list_payment_methods(&self, customer_id: &str)
        -> Result<Vec<PaymentMethod>, ServiceError>;

    async fn attach_payment_method(
        &self,
        customer_id: &str,
        payment_method_id: &str,
    ) -> Result<PaymentMethod, ServiceError>;

    async fn detach_payment_method(&self, payment_method_id: &str) -> Result<(), ServiceError>;

    async fn set_default_payment_method(
        &self,
        customer_id: &str,
        payment_method_id: &str,
    ) -> Result<(), ServiceError>;

    async fn create_subscription(
        &self,
        customer_id: &str,
        price_id: &str,
    ) -> Result<Subscription, ServiceError>;

    async fn list_invoices(&self, customer_id: &str) -> Result<Vec<Invoice>, ServiceError>;
}
