//! Turning Stripe payment outcomes into orders.
//!
//! The first event for a Checkout Session creates the order from the parked
//! hand-off and drops the hand-off. Later events for the same session move
//! the existing order along `OrderStatus::can_transition_to`; repeats of an
//! outcome already recorded change nothing. Credentials are issued only when
//! an order with IPTV lines reaches `completed`.

use std::future::Future;

use sqlx::PgPool;
use tracing::{info, instrument, warn};

use streamstick_core::checkout::CheckoutHandoff;
use streamstick_core::order::{NewOrder, Order, OrderLine, ServiceCredentials};
use streamstick_core::{Email, OrderId, OrderStatus, Price};

use crate::db::{HandoffRepository, OrderRepository, RepositoryError};
use crate::services::credentials;
use crate::services::stripe::CheckoutSession;

/// Where orders and parked hand-offs are read from and written to.
pub trait OrderStore: Send + Sync {
    fn find_by_stripe_session(
        &self,
        session_id: &str,
    ) -> impl Future<Output = Result<Option<Order>, RepositoryError>> + Send;

    fn handoff(
        &self,
        session_id: &str,
    ) -> impl Future<Output = Result<Option<CheckoutHandoff>, RepositoryError>> + Send;

    /// Fails with `RepositoryError::Conflict` if the session already has an order.
    fn create(&self, order: &NewOrder)
    -> impl Future<Output = Result<Order, RepositoryError>> + Send;

    /// `None` when the order is no longer in `from`.
    fn transition(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
        credentials: Option<&ServiceCredentials>,
    ) -> impl Future<Output = Result<Option<Order>, RepositoryError>> + Send;

    fn delete_handoff(
        &self,
        session_id: &str,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// `storefront.orders` and `storefront.checkout_handoffs` in Postgres.
#[derive(Debug, Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl OrderStore for PgOrderStore {
    async fn find_by_stripe_session(
        &self,
        session_id: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        OrderRepository::new(&self.pool)
            .find_by_stripe_session(session_id)
            .await
    }

    async fn handoff(&self, session_id: &str) -> Result<Option<CheckoutHandoff>, RepositoryError> {
        HandoffRepository::new(&self.pool).get(session_id).await
    }

    async fn create(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        OrderRepository::new(&self.pool).create(order).await
    }

    async fn transition(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
        credentials: Option<&ServiceCredentials>,
    ) -> Result<Option<Order>, RepositoryError> {
        OrderRepository::new(&self.pool)
            .transition(id, from, to, credentials)
            .await
    }

    async fn delete_handoff(&self, session_id: &str) -> Result<(), RepositoryError> {
        HandoffRepository::new(&self.pool).delete(session_id).await
    }
}

/// The status a Checkout Session event settles its order at, or `None` for
/// events that do not touch orders.
///
/// A completed session whose payment has not cleared yet (delayed payment
/// methods) stays `pending` until the async outcome arrives.
#[must_use]
pub fn settled_status(event_type: &str, session: &CheckoutSession) -> Option<OrderStatus> {
    match event_type {
        "checkout.session.completed" if session.is_paid() => Some(OrderStatus::Completed),
        "checkout.session.completed" => Some(OrderStatus::Pending),
        "checkout.session.async_payment_succeeded" => Some(OrderStatus::Completed),
        "checkout.session.async_payment_failed" | "checkout.session.expired" => {
            Some(OrderStatus::Failed)
        }
        _ => None,
    }
}

/// What a settle call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Created(Order),
    Moved(Order),
    /// The order was already at the target status.
    Unchanged,
    /// The order's current status cannot move to the target.
    Refused { from: OrderStatus, to: OrderStatus },
    /// No order and no hand-off for the session.
    NoHandoff,
}

pub struct Fulfillment<S> {
    store: S,
}

impl<S: OrderStore> Fulfillment<S> {
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Record `target` for the session's order, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store fails.
    #[instrument(skip(self, session), fields(stripe_session_id = %session.id))]
    pub async fn settle(
        &self,
        session: &CheckoutSession,
        target: OrderStatus,
    ) -> Result<Settlement, RepositoryError> {
        if let Some(existing) = self.store.find_by_stripe_session(&session.id).await? {
            return self.advance(existing, target).await;
        }

        let Some(handoff) = self.store.handoff(&session.id).await? else {
            warn!("No order or checkout hand-off for session");
            return Ok(Settlement::NoHandoff);
        };

        let settlement = match self.store.create(&new_order(session, &handoff, target)).await {
            Ok(created) => {
                info!(order_id = %created.id, status = %created.status, "Order recorded");
                Settlement::Created(created)
            }
            Err(RepositoryError::Conflict(_)) => {
                info!("Concurrent delivery recorded the order first");
                match self.store.find_by_stripe_session(&session.id).await? {
                    Some(existing) => self.advance(existing, target).await?,
                    None => Settlement::Unchanged,
                }
            }
            Err(e) => return Err(e),
        };

        self.store.delete_handoff(&session.id).await?;
        Ok(settlement)
    }

    async fn advance(
        &self,
        order: Order,
        target: OrderStatus,
    ) -> Result<Settlement, RepositoryError> {
        if order.status == target {
            info!(order_id = %order.id, "Order already at status");
            return Ok(Settlement::Unchanged);
        }
        if !order.status.can_transition_to(target) {
            warn!(order_id = %order.id, from = %order.status, "Ignoring payment outcome for settled order");
            return Ok(Settlement::Refused {
                from: order.status,
                to: target,
            });
        }

        let credentials = (target == OrderStatus::Completed
            && order.service_credentials.is_none()
            && order.needs_service_credentials())
        .then(credentials::generate);

        match self
            .store
            .transition(order.id, order.status, target, credentials.as_ref())
            .await?
        {
            Some(moved) => {
                info!(order_id = %moved.id, from = %order.status, to = %moved.status, "Order status updated");
                Ok(Settlement::Moved(moved))
            }
            None => {
                info!(order_id = %order.id, "Order status changed concurrently");
                Ok(Settlement::Unchanged)
            }
        }
    }
}

fn new_order(session: &CheckoutSession, handoff: &CheckoutHandoff, status: OrderStatus) -> NewOrder {
    // Stripe's copy of the email wins if the shopper changed it on the payment page.
    let customer_email = session
        .customer_email
        .as_deref()
        .and_then(|e| Email::parse(e).ok())
        .unwrap_or_else(|| handoff.customer_info.email.clone());

    let amount = session
        .amount_total
        .and_then(|cents| Price::try_from(cents).ok())
        .unwrap_or(handoff.total);

    let service_credentials = (status == OrderStatus::Completed
        && handoff.needs_service_credentials())
    .then(credentials::generate);

    NewOrder {
        customer_email,
        customer_name: handoff.customer_info.name.clone(),
        customer_phone: handoff.customer_info.phone.clone(),
        line_items: handoff.items.iter().map(OrderLine::from).collect(),
        amount,
        status,
        service_credentials,
        shipping: handoff.customer_info.shipping.clone(),
        stripe_session_id: Some(session.id.clone()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use chrono::Utc;

    use streamstick_core::ProductId;
    use streamstick_core::cart::CartItem;
    use streamstick_core::catalog::ProductCategory;
    use streamstick_core::checkout::{CustomerInfo, ShippingAddress};

    use super::*;

    /// In-memory store. When `race` is set, the next `create` behaves as if
    /// another delivery inserted an order with that status first.
    #[derive(Default)]
    struct MemoryStore {
        orders: Mutex<Vec<Order>>,
        handoffs: Mutex<HashMap<String, CheckoutHandoff>>,
        race: Mutex<Option<OrderStatus>>,
    }

    impl MemoryStore {
        fn with_handoff(self, session_id: &str, handoff: CheckoutHandoff) -> Self {
            self.handoffs
                .lock()
                .unwrap()
                .insert(session_id.to_owned(), handoff);
            self
        }

        fn insert(&self, order: &NewOrder, status: OrderStatus) -> Order {
            let now = Utc::now();
            let stored = Order {
                id: OrderId::generate(),
                customer_email: order.customer_email.clone(),
                customer_name: order.customer_name.clone(),
                customer_phone: order.customer_phone.clone(),
                line_items: order.line_items.clone(),
                amount: order.amount,
                status,
                service_credentials: order.service_credentials.clone(),
                shipping: order.shipping.clone(),
                stripe_session_id: order.stripe_session_id.clone(),
                created_at: now,
                updated_at: now,
            };
            self.orders.lock().unwrap().push(stored.clone());
            stored
        }

        fn orders(&self) -> Vec<Order> {
            self.orders.lock().unwrap().clone()
        }

        fn has_handoff(&self, session_id: &str) -> bool {
            self.handoffs.lock().unwrap().contains_key(session_id)
        }
    }

    impl OrderStore for MemoryStore {
        async fn find_by_stripe_session(
            &self,
            session_id: &str,
        ) -> Result<Option<Order>, RepositoryError> {
            Ok(self
                .orders
                .lock()
                .unwrap()
                .iter()
                .find(|o| o.stripe_session_id.as_deref() == Some(session_id))
                .cloned())
        }

        async fn handoff(
            &self,
            session_id: &str,
        ) -> Result<Option<CheckoutHandoff>, RepositoryError> {
            Ok(self.handoffs.lock().unwrap().get(session_id).cloned())
        }

        async fn create(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
            if let Some(status) = self.race.lock().unwrap().take() {
                self.insert(order, status);
                return Err(RepositoryError::Conflict("duplicate session".into()));
            }
            let taken = self
                .orders
                .lock()
                .unwrap()
                .iter()
                .any(|o| o.stripe_session_id == order.stripe_session_id);
            if taken {
                return Err(RepositoryError::Conflict("duplicate session".into()));
            }
            Ok(self.insert(order, order.status))
        }

        async fn transition(
            &self,
            id: OrderId,
            from: OrderStatus,
            to: OrderStatus,
            credentials: Option<&ServiceCredentials>,
        ) -> Result<Option<Order>, RepositoryError> {
            let mut orders = self.orders.lock().unwrap();
            let Some(order) = orders.iter_mut().find(|o| o.id == id && o.status == from) else {
                return Ok(None);
            };
            order.status = to;
            if order.service_credentials.is_none() {
                order.service_credentials = credentials.cloned();
            }
            Ok(Some(order.clone()))
        }

        async fn delete_handoff(&self, session_id: &str) -> Result<(), RepositoryError> {
            self.handoffs.lock().unwrap().remove(session_id);
            Ok(())
        }
    }

    fn line(id: &str, category: ProductCategory, cents: i64) -> CartItem {
        CartItem {
            id: ProductId::new(id),
            name: id.to_owned(),
            price: Price::from_cents(cents),
            image: None,
            quantity: 1,
            category,
        }
    }

    fn handoff(items: Vec<CartItem>) -> CheckoutHandoff {
        let shipping = items
            .iter()
            .any(|i| i.category.is_physical())
            .then(|| ShippingAddress {
                line1: "1 Main St".to_owned(),
                line2: None,
                city: "Austin".to_owned(),
                state: Some("TX".to_owned()),
                postal_code: "78701".to_owned(),
                country: "US".to_owned(),
            });
        let total = Price::from_cents(
            items
                .iter()
                .map(|i| i.price.cents() * i64::from(i.quantity))
                .sum(),
        );
        CheckoutHandoff {
            items,
            total,
            customer_info: CustomerInfo {
                email: Email::parse("buyer@example.com").unwrap(),
                name: "Jo Buyer".to_owned(),
                phone: None,
                shipping,
            },
            created_at: Utc::now(),
        }
    }

    fn iptv_handoff() -> CheckoutHandoff {
        handoff(vec![line("iptv-1-month", ProductCategory::Iptv, 1500)])
    }

    fn session(payment_status: &str) -> CheckoutSession {
        CheckoutSession {
            id: "cs_test_1".to_owned(),
            url: None,
            amount_total: None,
            payment_status: Some(payment_status.to_owned()),
            customer_email: None,
        }
    }

    fn service(handoff: CheckoutHandoff) -> Fulfillment<MemoryStore> {
        Fulfillment::new(MemoryStore::default().with_handoff("cs_test_1", handoff))
    }

    #[test]
    fn test_settled_status_follows_payment_state() {
        let paid = session("paid");
        let unpaid = session("unpaid");
        assert_eq!(
            settled_status("checkout.session.completed", &paid),
            Some(OrderStatus::Completed)
        );
        assert_eq!(
            settled_status("checkout.session.completed", &unpaid),
            Some(OrderStatus::Pending)
        );
        assert_eq!(
            settled_status("checkout.session.async_payment_succeeded", &unpaid),
            Some(OrderStatus::Completed)
        );
        assert_eq!(
            settled_status("checkout.session.async_payment_failed", &unpaid),
            Some(OrderStatus::Failed)
        );
        assert_eq!(
            settled_status("checkout.session.expired", &unpaid),
            Some(OrderStatus::Failed)
        );
        assert_eq!(settled_status("customer.created", &paid), None);
    }

    #[tokio::test]
    async fn test_paid_session_creates_completed_order_with_credentials() {
        let service = service(iptv_handoff());

        let settlement = service
            .settle(&session("paid"), OrderStatus::Completed)
            .await
            .unwrap();

        let Settlement::Created(order) = settlement else {
            panic!("expected a created order, got {settlement:?}");
        };
        assert_eq!(order.status, OrderStatus::Completed);
        assert!(order.service_credentials.is_some());
        assert_eq!(order.amount.cents(), 1500);
        assert_eq!(order.customer_email.as_str(), "buyer@example.com");
        assert!(!service.store.has_handoff("cs_test_1"));
    }

    #[tokio::test]
    async fn test_physical_order_gets_no_credentials() {
        let service = service(handoff(vec![line(
            "fire-stick-4k",
            ProductCategory::Firestick,
            4999,
        )]));

        service
            .settle(&session("paid"), OrderStatus::Completed)
            .await
            .unwrap();

        let orders = service.store.orders();
        assert_eq!(orders.len(), 1);
        assert!(orders[0].service_credentials.is_none());
        assert!(orders[0].shipping.is_some());
    }

    #[tokio::test]
    async fn test_stripe_email_and_amount_take_precedence() {
        let service = service(iptv_handoff());
        let mut paid = session("paid");
        paid.customer_email = Some("paid.as@example.org".to_owned());
        paid.amount_total = Some(1350);

        service.settle(&paid, OrderStatus::Completed).await.unwrap();

        let order = &service.store.orders()[0];
        assert_eq!(order.customer_email.as_str(), "paid.as@example.org");
        assert_eq!(order.amount.cents(), 1350);
    }

    #[tokio::test]
    async fn test_unusable_stripe_values_fall_back_to_handoff() {
        let service = service(iptv_handoff());
        let mut paid = session("paid");
        paid.customer_email = Some("not an email".to_owned());
        paid.amount_total = Some(-5);

        service.settle(&paid, OrderStatus::Completed).await.unwrap();

        let order = &service.store.orders()[0];
        assert_eq!(order.customer_email.as_str(), "buyer@example.com");
        assert_eq!(order.amount.cents(), 1500);
    }

    #[tokio::test]
    async fn test_repeated_delivery_is_idempotent() {
        let service = service(iptv_handoff());
        let paid = session("paid");

        service.settle(&paid, OrderStatus::Completed).await.unwrap();
        let first = service.store.orders();
        let again = service.settle(&paid, OrderStatus::Completed).await.unwrap();

        assert_eq!(again, Settlement::Unchanged);
        assert_eq!(service.store.orders(), first);
    }

    #[tokio::test]
    async fn test_unpaid_session_waits_for_async_success() {
        let service = service(iptv_handoff());
        let unpaid = session("unpaid");

        let settlement = service.settle(&unpaid, OrderStatus::Pending).await.unwrap();
        let Settlement::Created(pending) = settlement else {
            panic!("expected a created order, got {settlement:?}");
        };
        assert_eq!(pending.status, OrderStatus::Pending);
        assert!(pending.service_credentials.is_none());

        let settlement = service
            .settle(&session("paid"), OrderStatus::Completed)
            .await
            .unwrap();
        let Settlement::Moved(completed) = settlement else {
            panic!("expected a moved order, got {settlement:?}");
        };
        assert_eq!(completed.id, pending.id);
        assert_eq!(completed.status, OrderStatus::Completed);
        assert!(completed.service_credentials.is_some());
    }

    #[tokio::test]
    async fn test_unpaid_session_can_fail_later() {
        let service = service(iptv_handoff());
        service
            .settle(&session("unpaid"), OrderStatus::Pending)
            .await
            .unwrap();

        service
            .settle(&session("unpaid"), OrderStatus::Failed)
            .await
            .unwrap();

        let orders = service.store.orders();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].status, OrderStatus::Failed);
        assert!(orders[0].service_credentials.is_none());
    }

    #[tokio::test]
    async fn test_completed_order_is_not_failed() {
        let service = service(iptv_handoff());
        service
            .settle(&session("paid"), OrderStatus::Completed)
            .await
            .unwrap();

        let settlement = service
            .settle(&session("paid"), OrderStatus::Failed)
            .await
            .unwrap();

        assert_eq!(
            settlement,
            Settlement::Refused {
                from: OrderStatus::Completed,
                to: OrderStatus::Failed
            }
        );
        assert_eq!(service.store.orders()[0].status, OrderStatus::Completed);
    }

    #[tokio::test]
    async fn test_missing_handoff_writes_nothing() {
        let service = Fulfillment::new(MemoryStore::default());

        let settlement = service
            .settle(&session("paid"), OrderStatus::Completed)
            .await
            .unwrap();

        assert_eq!(settlement, Settlement::NoHandoff);
        assert!(service.store.orders().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_insert_is_advanced_not_duplicated() {
        let store = MemoryStore::default().with_handoff("cs_test_1", iptv_handoff());
        *store.race.lock().unwrap() = Some(OrderStatus::Pending);
        let service = Fulfillment::new(store);

        let settlement = service
            .settle(&session("paid"), OrderStatus::Completed)
            .await
            .unwrap();

        assert!(matches!(settlement, Settlement::Moved(_)));
        let orders = service.store.orders();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].status, OrderStatus::Completed);
        assert!(!service.store.has_handoff("cs_test_1"));
    }
}
