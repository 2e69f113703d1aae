//! Payment-method lifecycle over a [`BillingProvider`]

use super::types::{Customer, Invoice, InvoiceStatus, PaymentMethod, Subscription};
use crate::error::ServiceError;
use crate::services::{BillingProvider, Notice, Notifier};
use crate::state::Viewer;

pub struct BillingService<P, N> {
    provider: P,
    notifier: N,
}

impl<P, N> BillingService<P, N>
where
    P: BillingProvider,
    N: Notifier,
{
    pub fn new(provider: P, notifier: N) -> Self {
        Self { provider, notifier }
    }

    /// Log and toast a failed operation, passing the result through
    fn report<T>(&self, operation: &str, result: Result<T, ServiceError>) -> Result<T, ServiceError> {
        if let Err(err) = &result {
            tracing::warn!(operation, %err, "billing operation failed");
            self.notifier.notify(Notice::error(err.user_message()));
        }
        result
    }

    async fn fetch_or_create_customer(&self, viewer: &Viewer) -> Result<Customer, ServiceError> {
        if let Some(customer) = self.provider.find_customer(&viewer.uid).await? {
            return Ok(customer);
        }
        let email = viewer.email.as_deref().ok_or_else(|| {
            ServiceError::new("billing/no-email", "an email is required to create a customer")
        })?;
        let customer = self.provider.create_customer(&viewer.uid, email).await?;
        tracing::info!(uid = %viewer.uid, customer = %customer.id, "created billing customer");
        Ok(customer)
    }

    /// The viewer's customer, created on first use
    pub async fn ensure_customer(&self, viewer: &Viewer) -> Result<Customer, ServiceError> {
        let result = self.fetch_or_create_customer(viewer).await;
        self.report("ensure_customer", result)
    }

    async fn list_marked(&self, customer: &Customer) -> Result<Vec<PaymentMethod>, ServiceError> {
        let mut methods = self.provider.list_payment_methods(&customer.id).await?;
        for method in &mut methods {
            method.is_default = customer.default_payment_method.as_deref() == Some(method.id.as_str());
        }
        Ok(methods)
    }

    /// Saved cards with the default one marked; empty without a customer
    pub async fn payment_methods(&self, viewer: &Viewer) -> Result<Vec<PaymentMethod>, ServiceError> {
        let result = async {
            match self.provider.find_customer(&viewer.uid).await? {
                Some(customer) => self.list_marked(&customer).await,
                None => Ok(Vec::new()),
            }
        }
        .await;
        self.report("payment_methods", result)
    }

    async fn attach(&self, viewer: &Viewer, payment_method_id: &str) -> Result<PaymentMethod, ServiceError> {
        let customer = self.fetch_or_create_customer(viewer).await?;
        let first = self
            .provider
            .list_payment_methods(&customer.id)
            .await?
            .is_empty();
        let mut method = self
            .provider
            .attach_payment_method(&customer.id, payment_method_id)
            .await?;
        if first {
            self.provider
                .set_default_payment_method(&customer.id, &method.id)
                .await?;
            method.is_default = true;
        }
        Ok(method)
    }

    /// Attach a card; the first card becomes the default
    pub async fn add_payment_method(
        &self,
        viewer: &Viewer,
        payment_method_id: &str,
    ) -> Result<PaymentMethod, ServiceError> {
        let result = self.attach(viewer, payment_method_id).await;
        let method = self.report("add_payment_method", result)?;
        tracing::info!(uid = %viewer.uid, method = %method.id, default = method.is_default, "payment method added");
        self.notifier.notify(Notice::success("Payment method added"));
        Ok(method)
    }

    pub async fn delete_payment_method(&self, payment_method_id: &str) -> Result<(), ServiceError> {
        let result = self.provider.detach_payment_method(payment_method_id).await;
        self.report("delete_payment_method", result)?;
        tracing::info!(method = payment_method_id, "payment method removed");
        self.notifier.notify(Notice::success("Payment method removed"));
        Ok(())
    }

    pub async fn set_default_payment_method(
        &self,
        viewer: &Viewer,
        payment_method_id: &str,
    ) -> Result<(), ServiceError> {
        let result = async {
            let customer = self.fetch_or_create_customer(viewer).await?;
            self.provider
                .set_default_payment_method(&customer.id, payment_method_id)
                .await
        }
        .await;
        self.report("set_default_payment_method", result)?;
        self.notifier
            .notify(Notice::success("Default payment method updated"));
        Ok(())
    }

    pub async fn subscribe(&self, viewer: &Viewer, price_id: &str) -> Result<Subscription, ServiceError> {
        let result = async {
            let customer = self.fetch_or_create_customer(viewer).await?;
            self.provider.create_subscription(&customer.id, price_id).await
        }
        .await;
        let subscription = self.report("subscribe", result)?;
        tracing::info!(uid = %viewer.uid, subscription = %subscription.id, status = ?subscription.status, "subscription created");
        Ok(subscription)
    }

    async fn list_paid(&self, viewer: &Viewer) -> Result<Vec<Invoice>, ServiceError> {
        let Some(customer) = self.provider.find_customer(&viewer.uid).await? else {
            return Ok(Vec::new());
        };
        let mut invoices: Vec<Invoice> = self
            .provider
            .list_invoices(&customer.id)
            .await?
            .into_iter()
            .filter(|invoice| invoice.status == InvoiceStatus::Paid)
            .collect();
        invoices.sort_by(|a, b| b.created.cmp(&a.created));
        Ok(invoices)
    }

    /// Paid invoices, newest first
    pub async fn paid_invoices(&self, viewer: &Viewer) -> Result<Vec<Invoice>, ServiceError> {
        let result = self.list_paid(viewer).await;
        self.report("paid_invoices", result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::SubscriptionStatus;
    use crate::services::{MockBillingProvider, MockNotifier, NoticeLevel};
    use crate::state::IdentityProvider;
    use crate::test_support::password_viewer;
    use chrono::{TimeZone, Utc};
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;

    fn customer(default: Option<&str>) -> Customer {
        Customer {
            id: "cus_1".to_string(),
            email: Some("ada@example.com".to_string()),
            default_payment_method: default.map(str::to_string),
        }
    }

    fn card(id: &str, last4: &str) -> PaymentMethod {
        PaymentMethod {
            id: id.to_string(),
            brand: "Visa".to_string(),
            last4: last4.to_string(),
            exp_month: 12,
            exp_year: 2030,
            is_default: false,
        }
    }

    fn invoice(id: &str, status: InvoiceStatus, day: u32) -> Invoice {
        Invoice {
            id: id.to_string(),
            amount_paid: 1500,
            currency: "eur".to_string(),
            status,
            created: Utc.with_ymd_and_hms(2025, 1, day, 0, 0, 0).unwrap(),
        }
    }

    fn quiet() -> MockNotifier {
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().return_const(());
        notifier
    }

    mod customers {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_existing_customer_is_reused() {
            let mut provider = MockBillingProvider::new();
            provider
                .expect_find_customer()
                .with(eq("user-1"))
                .returning(|_| Ok(Some(customer(None))));
            provider.expect_create_customer().never();

            let service = BillingService::new(provider, quiet());
            let found = service.ensure_customer(&password_viewer()).await.unwrap();
            assert_eq!(found.id, "cus_1");
        }

        #[tokio::test]
        async fn test_missing_customer_is_created() {
            let mut provider = MockBillingProvider::new();
            provider.expect_find_customer().returning(|_| Ok(None));
            provider
                .expect_create_customer()
                .with(eq("user-1"), eq("ada@example.com"))
                .times(1)
                .returning(|_, _| Ok(customer(None)));

            let service = BillingService::new(provider, quiet());
            assert!(service.ensure_customer(&password_viewer()).await.is_ok());
        }

        #[tokio::test]
        async fn test_no_email_cannot_create() {
            let mut provider = MockBillingProvider::new();
            provider.expect_find_customer().returning(|_| Ok(None));
            provider.expect_create_customer().never();
            let mut notifier = MockNotifier::new();
            notifier
                .expect_notify()
                .withf(|n| n.level == NoticeLevel::Error)
                .times(1)
                .return_const(());

            let service = BillingService::new(provider, notifier);
            let viewer = Viewer::new("user-9", None, IdentityProvider::Password);
            let err = service.ensure_customer(&viewer).await.unwrap_err();
            assert_eq!(err.code, "billing/no-email");
        }
    }

    mod payment_methods {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_listing_marks_default() {
            let mut provider = MockBillingProvider::new();
            provider
                .expect_find_customer()
                .returning(|_| Ok(Some(customer(Some("pm_2")))));
            provider
                .expect_list_payment_methods()
                .with(eq("cus_1"))
                .returning(|_| Ok(vec![card("pm_1", "4242"), card("pm_2", "0005")]));

            let service = BillingService::new(provider, quiet());
            let methods = service.payment_methods(&password_viewer()).await.unwrap();

            let defaults: Vec<bool> = methods.iter().map(|m| m.is_default).collect();
            assert_eq!(defaults, vec![false, true]);
        }

        #[tokio::test]
        async fn test_listing_without_customer_is_empty() {
            let mut provider = MockBillingProvider::new();
            provider.expect_find_customer().returning(|_| Ok(None));
            provider.expect_list_payment_methods().never();

            let service = BillingService::new(provider, quiet());
            assert!(service
                .payment_methods(&password_viewer())
                .await
                .unwrap()
                .is_empty());
        }

        #[tokio::test]
        async fn test_first_card_becomes_default() {
            let mut provider = MockBillingProvider::new();
            provider
                .expect_find_customer()
                .returning(|_| Ok(Some(customer(None))));
            provider
                .expect_list_payment_methods()
                .returning(|_| Ok(Vec::new()));
            provider
                .expect_attach_payment_method()
                .with(eq("cus_1"), eq("pm_new"))
                .returning(|_, id| Ok(card(id, "4242")));
            provider
                .expect_set_default_payment_method()
                .with(eq("cus_1"), eq("pm_new"))
                .times(1)
                .returning(|_, _| Ok(()));

            let mut notifier = MockNotifier::new();
            notifier
                .expect_notify()
                .withf(|n| n.level == NoticeLevel::Success)
                .times(1)
                .return_const(());

            let service = BillingService::new(provider, notifier);
            let method = service
                .add_payment_method(&password_viewer(), "pm_new")
                .await
                .unwrap();
            assert!(method.is_default);
        }

        #[tokio::test]
        async fn test_second_card_keeps_existing_default() {
            let mut provider = MockBillingProvider::new();
            provider
                .expect_find_customer()
                .returning(|_| Ok(Some(customer(Some("pm_1")))));
            provider
                .expect_list_payment_methods()
                .returning(|_| Ok(vec![card("pm_1", "4242")]));
            provider
                .expect_attach_payment_method()
                .returning(|_, id| Ok(card(id, "0005")));
            provider.expect_set_default_payment_method().never();

            let service = BillingService::new(provider, quiet());
            let method = service
                .add_payment_method(&password_viewer(), "pm_2")
                .await
                .unwrap();
            assert!(!method.is_default);
        }

        #[tokio::test]
        async fn test_declined_card_is_reported() {
            let mut provider = MockBillingProvider::new();
            provider
                .expect_find_customer()
                .returning(|_| Ok(Some(customer(None))));
            provider
                .expect_list_payment_methods()
                .returning(|_| Ok(Vec::new()));
            provider
                .expect_attach_payment_method()
                .returning(|_, _| Err(ServiceError::new("card_declined", "declined")));
            provider.expect_set_default_payment_method().never();

            let mut notifier = MockNotifier::new();
            notifier
                .expect_notify()
                .withf(|n| n.level == NoticeLevel::Error && n.message == "Your card was declined.")
                .times(1)
                .return_const(());

            let service = BillingService::new(provider, notifier);
            let err = service
                .add_payment_method(&password_viewer(), "pm_bad")
                .await
                .unwrap_err();
            assert_eq!(err.code, "card_declined");
        }

        #[tokio::test]
        async fn test_delete_and_set_default() {
            let mut provider = MockBillingProvider::new();
            provider
                .expect_detach_payment_method()
                .with(eq("pm_1"))
                .times(1)
                .returning(|_| Ok(()));
            provider
                .expect_find_customer()
                .returning(|_| Ok(Some(customer(Some("pm_1")))));
            provider
                .expect_set_default_payment_method()
                .with(eq("cus_1"), eq("pm_2"))
                .times(1)
                .returning(|_, _| Ok(()));

            let service = BillingService::new(provider, quiet());
            service.delete_payment_method("pm_1").await.unwrap();
            service
                .set_default_payment_method(&password_viewer(), "pm_2")
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_subscribe_uses_customer() {
        let mut provider = MockBillingProvider::new();
        provider
            .expect_find_customer()
            .returning(|_| Ok(Some(customer(Some("pm_1")))));
        provider
            .expect_create_subscription()
            .with(eq("cus_1"), eq("price_pro"))
            .returning(|_, price| {
                Ok(Subscription {
                    id: "sub_1".to_string(),
                    price_id: price.to_string(),
                    status: SubscriptionStatus::Active,
                })
            });

        let service = BillingService::new(provider, quiet());
        let subscription = service
            .subscribe(&password_viewer(), "price_pro")
            .await
            .unwrap();
        assert_eq!(subscription.status, SubscriptionStatus::Active);
    }

    #[tokio::test]
    async fn test_only_paid_invoices_newest_first() {
        let mut provider = MockBillingProvider::new();
        provider
            .expect_find_customer()
            .returning(|_| Ok(Some(customer(None))));
        provider.expect_list_invoices().returning(|_| {
            Ok(vec![
                invoice("in_1", InvoiceStatus::Paid, 1),
                invoice("in_2", InvoiceStatus::Open, 2),
                invoice("in_3", InvoiceStatus::Paid, 3),
                invoice("in_4", InvoiceStatus::Void, 4),
            ])
        });

        let service = BillingService::new(provider, quiet());
        let ids: Vec<String> = service
            .paid_invoices(&password_viewer())
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec!["in_3".to_string(), "in_1".to_string()]);
    }
}
