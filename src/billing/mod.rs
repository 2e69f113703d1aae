//! Billing: customers, saved cards, subscriptions and invoices

mod service;
mod types;

pub use service::BillingService;
pub use types::{
    Customer, Invoice, InvoiceStatus, PaymentMethod, Subscription, SubscriptionStatus,
};
