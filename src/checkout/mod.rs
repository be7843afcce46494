//! Checkout
//!
//! A linear checkout over the cart: contact details, payment method, a simulated
//! processing delay, then success or a recoverable decline.
//!
//! ```text
//! collecting-info -> selecting-payment-method -> processing -> success
//!                                  ^                 |
//!                                  +---- failed <----+
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    cart::Cart,
    orders::{Order, OrderBook},
    pricing::total_price,
    storefront::View,
};

pub mod contact;
pub mod payment;

use contact::{ContactDetails, ContactError};
use payment::{
    DECLINE_MESSAGE, DEFAULT_APPROVAL_RATE, PaymentDecider, PaymentDecision, PaymentMethod,
    PaymentReceipt, RandomDecider,
};

/// Delay before a simulated payment resolves.
pub const DEFAULT_PROCESSING_DELAY: Duration = Duration::from_millis(1_500);

/// Checkout tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckoutConfig {
    /// Artificial latency of the simulated gateway
    pub processing_delay: Duration,

    /// Share of payments approved by the default decider
    pub approval_rate: f64,
}

impl CheckoutConfig {
    /// Random decider using the configured approval rate
    pub fn decider(&self) -> RandomDecider {
        RandomDecider::new(self.approval_rate)
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            processing_delay: DEFAULT_PROCESSING_DELAY,
            approval_rate: DEFAULT_APPROVAL_RATE,
        }
    }
}

/// Checkout errors
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Checkout needs at least one line item
    #[error("cart is empty")]
    EmptyCart,

    /// The contact form failed validation
    #[error(transparent)]
    Contact(#[from] ContactError),

    /// The action is not available in the current state
    #[error("cannot {action} while checkout is {state}")]
    InvalidTransition {
        /// Attempted action
        action: &'static str,
        /// State name at the time
        state: &'static str,
    },
}

impl CheckoutError {
    /// View the user should be sent to instead of staying on the checkout page
    pub fn redirect(&self) -> Option<View> {
        match self {
            Self::EmptyCart => Some(View::Cart),
            Self::Contact(_) | Self::InvalidTransition { .. } => None,
        }
    }
}

/// Checkout state
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutState {
    /// Waiting for contact and billing details
    CollectingInfo,

    /// Waiting for a payment method and submission
    SelectingPaymentMethod,

    /// Payment submitted; waiting for the simulated gateway
    Processing,

    /// Payment approved and order placed
    Success {
        /// Order placed
        order: Order,
    },

    /// Payment declined; may be resubmitted
    Failed {
        /// Message shown inline on the payment step
        message: String,
    },
}

impl CheckoutState {
    /// State name
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CollectingInfo => "collecting-info",
            Self::SelectingPaymentMethod => "selecting-payment-method",
            Self::Processing => "processing",
            Self::Success { .. } => "success",
            Self::Failed { .. } => "failed",
        }
    }

    /// Whether the payment step (method tabs and pay button) is showing
    pub const fn is_payment_step(&self) -> bool {
        matches!(
            self,
            Self::SelectingPaymentMethod | Self::Processing | Self::Failed { .. }
        )
    }
}

/// How a payment submission resolved
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentResolution {
    /// The order was placed
    Approved(Order),

    /// The payment was declined; nothing changed
    Declined {
        /// Message shown to the user
        message: String,
    },

    /// The checkout was detached before the delay elapsed; the outcome was dropped
    Discarded,
}

/// Lets the owning view mark a checkout as gone, so a pending payment does not
/// touch the cart or orders when it resolves.
#[derive(Debug, Clone)]
pub struct DetachHandle {
    attached: Arc<AtomicBool>,
}

impl DetachHandle {
    /// Mark the checkout as detached
    pub fn detach(&self) {
        self.attached.store(false, Ordering::Release);
    }

    /// Whether the checkout is still attached
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }
}

/// Checkout simulator
pub struct Checkout {
    state: CheckoutState,
    contact: Option<ContactDetails>,
    payment_method: PaymentMethod,
    config: CheckoutConfig,
    decider: Box<dyn PaymentDecider>,
    attached: Arc<AtomicBool>,
}

impl Checkout {
    /// Start checking out the given cart.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] if the cart has no items; no checkout state
    /// is entered and the caller should follow [`CheckoutError::redirect`].
    pub fn begin(
        cart: &Cart,
        config: CheckoutConfig,
        decider: Box<dyn PaymentDecider>,
    ) -> Result<Self, CheckoutError> {
        if cart.is_empty() {
            debug!("refusing to start checkout with an empty cart");

            return Err(CheckoutError::EmptyCart);
        }

        debug!(items = cart.len(), total = %cart.total(), "checkout started");

        Ok(Self {
            state: CheckoutState::CollectingInfo,
            contact: None,
            payment_method: PaymentMethod::default(),
            config,
            decider,
            attached: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Current state
    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    /// Contact details accepted so far
    pub fn contact(&self) -> Option<&ContactDetails> {
        self.contact.as_ref()
    }

    /// Selected payment method
    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    /// Placed order, once the checkout succeeded
    pub fn order(&self) -> Option<&Order> {
        match &self.state {
            CheckoutState::Success { order } => Some(order),
            _ => None,
        }
    }

    /// View the checkout should be showing: the confirmation once the order is
    /// placed, the checkout page otherwise.
    pub fn view(&self) -> View {
        match self.state {
            CheckoutState::Success { .. } => View::Confirmation,
            _ => View::Checkout,
        }
    }

    /// Inline error shown on the payment step after a decline
    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            CheckoutState::Failed { message } => Some(message),
            _ => None,
        }
    }

    /// Handle for tearing down the checkout from elsewhere
    pub fn detach_handle(&self) -> DetachHandle {
        DetachHandle {
            attached: Arc::clone(&self.attached),
        }
    }

    /// Whether the owning view is still attached
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    /// Submit the contact form and move on to the payment step.
    ///
    /// # Errors
    ///
    /// Returns an error if the details fail validation, leaving the state unchanged,
    /// or if contact details were already accepted.
    pub fn submit_contact(&mut self, details: ContactDetails) -> Result<(), CheckoutError> {
        self.expect_state("submit contact details", |state| {
            matches!(state, CheckoutState::CollectingInfo)
        })?;

        details.validate()?;

        self.contact = Some(details);
        self.transition(CheckoutState::SelectingPaymentMethod);

        Ok(())
    }

    /// Choose a payment method tab.
    ///
    /// # Errors
    ///
    /// Returns an error unless the payment step is showing and idle.
    pub fn select_payment_method(&mut self, method: PaymentMethod) -> Result<(), CheckoutError> {
        self.expect_state("select a payment method", |state| {
            matches!(
                state,
                CheckoutState::SelectingPaymentMethod | CheckoutState::Failed { .. }
            )
        })?;

        debug!(method = %method, "payment method selected");

        self.payment_method = method;

        Ok(())
    }

    /// Submit the payment and wait for the simulated gateway.
    ///
    /// On approval the order is appended to `orders` and the cart is cleared; if the
    /// order cannot be persisted the cart is kept. On a decline nothing but the
    /// checkout state changes and the payment may be resubmitted. If the checkout is detached while waiting, the outcome is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the payment step is not showing, or if the cart has been
    /// emptied since checkout began.
    pub async fn submit_payment(
        &mut self,
        cart: &mut Cart,
        orders: &OrderBook,
    ) -> Result<PaymentResolution, CheckoutError> {
        // `Processing` is only observable here if an earlier submission future was
        // dropped mid-delay; `&mut self` rules out one still running.
        self.expect_state("submit payment", CheckoutState::is_payment_step)?;

        let Some(contact) = self.contact.clone() else {
            return Err(CheckoutError::InvalidTransition {
                action: "submit payment",
                state: self.state.name(),
            });
        };

        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let items = cart.snapshot();
        let total = total_price(&items);

        self.transition(CheckoutState::Processing);

        tokio::time::sleep(self.config.processing_delay).await;

        if !self.is_attached() {
            debug!("checkout detached while processing; discarding payment outcome");

            return Ok(PaymentResolution::Discarded);
        }

        match self.decider.decide(self.payment_method, total) {
            PaymentDecision::Approve => {
                let payment =
                    PaymentReceipt::approved(total, cart.currency(), self.payment_method, contact);
                let order = Order::new(items, payment);

                if orders.append(&order) {
                    cart.clear();
                } else {
                    warn!(
                        order_id = %order.id,
                        "order was not persisted; keeping the cart so it is not lost"
                    );
                }

                info!(
                    event = "purchase",
                    transaction_id = %order.id,
                    value = %order.total,
                    currency = cart.currency().iso_alpha_code,
                    items = order.items.len(),
                );

                self.transition(CheckoutState::Success {
                    order: order.clone(),
                });

                Ok(PaymentResolution::Approved(order))
            }
            PaymentDecision::Decline => {
                warn!(method = %self.payment_method, %total, "simulated payment declined");

                let message = DECLINE_MESSAGE.to_string();

                self.transition(CheckoutState::Failed {
                    message: message.clone(),
                });

                Ok(PaymentResolution::Declined { message })
            }
        }
    }

    fn expect_state(
        &self,
        action: &'static str,
        allowed: impl FnOnce(&CheckoutState) -> bool,
    ) -> Result<(), CheckoutError> {
        if allowed(&self.state) {
            Ok(())
        } else {
            Err(CheckoutError::InvalidTransition {
                action,
                state: self.state.name(),
            })
        }
    }

    fn transition(&mut self, next: CheckoutState) {
        debug!(from = self.state.name(), to = next.name(), "checkout transition");

        self.state = next;
    }
}

impl Debug for Checkout {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Checkout")
            .field("state", &self.state)
            .field("contact", &self.contact)
            .field("payment_method", &self.payment_method)
            .field("config", &self.config)
            .field("attached", &self.is_attached())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use rusty_money::iso::USD;
    use testresult::TestResult;

    use crate::{
        cart::CartLineItem,
        checkout::payment::{FixedDecider, MockPaymentDecider},
        store::{
            CART_STORAGE_KEY, MemoryStorage, MockStorage, ORDERS_STORAGE_KEY, PersistentStore,
            StorageError,
        },
    };

    use super::*;

    fn fixtures() -> (Cart, OrderBook) {
        let store = PersistentStore::new(Arc::new(MemoryStorage::new()));
        let mut cart = Cart::load(store.clone(), USD);

        cart.add_item(CartLineItem::new("p1-red", "Filter", Decimal::from(10), 2));

        (cart, OrderBook::new(store))
    }

    fn instant() -> CheckoutConfig {
        CheckoutConfig {
            processing_delay: Duration::ZERO,
            ..CheckoutConfig::default()
        }
    }

    fn at_payment_step(cart: &Cart, decision: PaymentDecision) -> Result<Checkout, CheckoutError> {
        let mut checkout = Checkout::begin(cart, instant(), Box::new(FixedDecider(decision)))?;

        checkout.submit_contact(ContactDetails::with_email("jane@example.com"))?;

        Ok(checkout)
    }

    #[test]
    fn begin_with_empty_cart_redirects_to_cart() {
        let store = PersistentStore::new(Arc::new(MemoryStorage::new()));
        let cart = Cart::load(store, USD);

        let result = Checkout::begin(&cart, instant(), Box::new(RandomDecider::default()));

        match result {
            Err(error) => {
                assert!(matches!(error, CheckoutError::EmptyCart));
                assert_eq!(error.redirect(), Some(View::Cart));
            }
            Ok(checkout) => panic!("expected EmptyCart, got {checkout:?}"),
        }
    }

    #[test]
    fn invalid_contact_keeps_collecting_info() -> TestResult {
        let (cart, _orders) = fixtures();
        let mut checkout = Checkout::begin(&cart, instant(), Box::new(RandomDecider::default()))?;

        let result = checkout.submit_contact(ContactDetails::default());

        assert!(matches!(
            result,
            Err(CheckoutError::Contact(ContactError::MissingEmail))
        ));
        assert_eq!(checkout.state(), &CheckoutState::CollectingInfo);
        assert!(checkout.contact().is_none());

        Ok(())
    }

    #[test]
    fn valid_contact_moves_to_payment_step() -> TestResult {
        let (cart, _orders) = fixtures();
        let checkout = at_payment_step(&cart, PaymentDecision::Approve)?;

        assert_eq!(checkout.state(), &CheckoutState::SelectingPaymentMethod);
        assert_eq!(checkout.payment_method(), PaymentMethod::Card);

        Ok(())
    }

    #[test]
    fn payment_method_needs_payment_step() -> TestResult {
        let (cart, _orders) = fixtures();
        let mut checkout = Checkout::begin(&cart, instant(), Box::new(RandomDecider::default()))?;

        let result = checkout.select_payment_method(PaymentMethod::Upi);

        assert!(matches!(
            result,
            Err(CheckoutError::InvalidTransition {
                state: "collecting-info",
                ..
            })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn approval_places_order_and_clears_cart() -> TestResult {
        let (mut cart, orders) = fixtures();
        let snapshot = cart.snapshot();
        let mut checkout = at_payment_step(&cart, PaymentDecision::Approve)?;

        checkout.select_payment_method(PaymentMethod::NetBanking)?;

        let resolution = checkout.submit_payment(&mut cart, &orders).await?;

        let PaymentResolution::Approved(order) = resolution else {
            panic!("expected approval, got {resolution:?}");
        };

        assert!(cart.is_empty());
        assert_eq!(order.items, snapshot);
        assert_eq!(order.total, Decimal::from(20));
        assert_eq!(order.payment.payment_method, PaymentMethod::NetBanking);
        assert_eq!(orders.orders(), vec![order.clone()]);
        assert_eq!(checkout.order(), Some(&order));
        assert_eq!(checkout.view(), View::Confirmation);

        Ok(())
    }

    #[tokio::test]
    async fn decline_leaves_cart_and_orders_untouched() -> TestResult {
        let (mut cart, orders) = fixtures();
        let snapshot = cart.snapshot();
        let mut checkout = at_payment_step(&cart, PaymentDecision::Decline)?;

        let resolution = checkout.submit_payment(&mut cart, &orders).await?;

        assert_eq!(
            resolution,
            PaymentResolution::Declined {
                message: DECLINE_MESSAGE.to_string()
            }
        );
        assert_eq!(cart.items(), snapshot.as_slice());
        assert!(orders.orders().is_empty());
        assert!(checkout.state().is_payment_step());
        assert_eq!(checkout.error_message(), Some(DECLINE_MESSAGE));
        assert_eq!(checkout.view(), View::Checkout);

        Ok(())
    }

    #[tokio::test]
    async fn declined_payment_can_be_resubmitted() -> TestResult {
        let (mut cart, orders) = fixtures();

        let mut decider = MockPaymentDecider::new();
        let mut sequence = mockall::Sequence::new();

        decider
            .expect_decide()
            .times(2)
            .in_sequence(&mut sequence)
            .returning(|_, _| PaymentDecision::Decline);
        decider
            .expect_decide()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_, _| PaymentDecision::Approve);

        let mut checkout = Checkout::begin(&cart, instant(), Box::new(decider))?;

        checkout.submit_contact(ContactDetails::with_email("jane@example.com"))?;

        for _ in 0..2 {
            let resolution = checkout.submit_payment(&mut cart, &orders).await?;

            assert!(matches!(resolution, PaymentResolution::Declined { .. }));
        }

        checkout.select_payment_method(PaymentMethod::Emi)?;

        let resolution = checkout.submit_payment(&mut cart, &orders).await?;

        assert!(matches!(resolution, PaymentResolution::Approved(_)));
        assert_eq!(orders.orders().len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn success_is_terminal() -> TestResult {
        let (mut cart, orders) = fixtures();
        let mut checkout = at_payment_step(&cart, PaymentDecision::Approve)?;

        checkout.submit_payment(&mut cart, &orders).await?;

        cart.add_item(CartLineItem::new("p2", "Valve", Decimal::ONE, 1));

        let result = checkout.submit_payment(&mut cart, &orders).await;

        assert!(matches!(
            result,
            Err(CheckoutError::InvalidTransition {
                state: "success",
                ..
            })
        ));
        assert_eq!(orders.orders().len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn unpersisted_order_keeps_cart() -> TestResult {
        let mut storage = MockStorage::new();

        storage.expect_get_item().returning(|_| Ok(None));
        storage
            .expect_set_item()
            .withf(|key, _| key == CART_STORAGE_KEY)
            .returning(|_, _| Ok(()));
        storage
            .expect_set_item()
            .withf(|key, _| key == ORDERS_STORAGE_KEY)
            .returning(|key, _| {
                Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    required: 10_000,
                    quota: 16,
                })
            });

        let store = PersistentStore::new(Arc::new(storage));
        let mut cart = Cart::load(store.clone(), USD);
        let orders = OrderBook::new(store);

        cart.add_item(CartLineItem::new("p1-red", "Filter", Decimal::from(10), 2));

        let snapshot = cart.snapshot();
        let mut checkout = at_payment_step(&cart, PaymentDecision::Approve)?;

        let resolution = checkout.submit_payment(&mut cart, &orders).await?;

        assert!(matches!(resolution, PaymentResolution::Approved(_)));
        assert_eq!(cart.items(), snapshot.as_slice());

        Ok(())
    }

    #[tokio::test]
    async fn emptied_cart_blocks_payment() -> TestResult {
        let (mut cart, orders) = fixtures();
        let mut checkout = at_payment_step(&cart, PaymentDecision::Approve)?;

        cart.clear();

        let result = checkout.submit_payment(&mut cart, &orders).await;

        assert!(matches!(result, Err(CheckoutError::EmptyCart)));
        assert_eq!(checkout.state(), &CheckoutState::SelectingPaymentMethod);

        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn detached_checkout_discards_outcome() -> TestResult {
        let (mut cart, orders) = fixtures();
        let mut checkout = Checkout::begin(
            &cart,
            CheckoutConfig::default(),
            Box::new(FixedDecider(PaymentDecision::Approve)),
        )?;

        checkout.submit_contact(ContactDetails::with_email("jane@example.com"))?;

        let handle = checkout.detach_handle();

        let (resolution, ()) = tokio::join!(checkout.submit_payment(&mut cart, &orders), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            handle.detach();
        });

        assert_eq!(resolution?, PaymentResolution::Discarded);
        assert_eq!(cart.len(), 1);
        assert!(orders.orders().is_empty());
        assert!(!checkout.is_attached());

        Ok(())
    }
}
