use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Billing-provider customer linked to a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub default_payment_method: Option<String>,
}

/// A saved card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    pub id: String,
    pub brand: String,
    pub last4: String,
    pub exp_month: u8,
    pub exp_year: u16,
    /// Set by the billing service when listing
    #[serde(default)]
    pub is_default: bool,
}

impl PaymentMethod {
    /// `Visa •••• 4242 (12/27)`
    pub fn summary(&self) -> String {
        format!(
            "{} •••• {} ({:02}/{:02})",
            self.brand,
            self.last4,
            self.exp_month,
            self.exp_year % 100
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    Incomplete,
    PastDue,
    Canceled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: String,
    pub price_id: String,
    pub status: SubscriptionStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Open,
    Paid,
    Uncollectible,
    Void,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    /// Minor currency units
    pub amount_paid: i64,
    pub currency: String,
    pub status: InvoiceStatus,
    pub created: DateTime<Utc>,
}
