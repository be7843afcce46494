//! Storefront
//!
//! Wires the catalog, the persisted cart and the order book over one storage backend.

use std::sync::Arc;

use tracing::debug;

use crate::{
    cart::Cart,
    catalog::{Catalog, CatalogError},
    checkout::{Checkout, CheckoutConfig, CheckoutError, PaymentResolution, payment::PaymentDecider},
    orders::OrderBook,
    store::{PersistentStore, Storage},
};

/// Top-level views a checkout can send the user to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Cart panel
    Cart,

    /// Checkout page
    Checkout,

    /// Order confirmation
    Confirmation,
}

/// Storefront session
#[derive(Debug)]
pub struct Storefront {
    catalog: Arc<Catalog>,
    cart: Cart,
    orders: OrderBook,
    checkout_config: CheckoutConfig,
}

impl Storefront {
    /// Open a session, restoring the cart persisted in `storage`.
    pub fn open(
        storage: Arc<dyn Storage>,
        catalog: Arc<Catalog>,
        checkout_config: CheckoutConfig,
    ) -> Self {
        let store = PersistentStore::new(storage);
        let cart = Cart::load(store.clone(), catalog.currency());

        debug!(products = catalog.len(), cart_items = cart.len(), "storefront opened");

        Self {
            catalog,
            cart,
            orders: OrderBook::new(store),
            checkout_config,
        }
    }

    /// Product catalog
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Current cart
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Current cart, for mutation
    pub fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }

    /// Placed orders
    pub fn orders(&self) -> &OrderBook {
        &self.orders
    }

    /// Checkout settings used by [`Storefront::begin_checkout`]
    pub fn checkout_config(&self) -> CheckoutConfig {
        self.checkout_config
    }

    /// Add a catalog product to the cart, the way the product page's "Add to Cart"
    /// button does.
    ///
    /// # Errors
    ///
    /// Returns an error if the product or variant is unknown, or a variant is needed.
    pub fn add_product(
        &mut self,
        product_id: &str,
        variant_id: Option<&str>,
        quantity: u32,
    ) -> Result<(), CatalogError> {
        let item = self
            .catalog
            .product(product_id)?
            .line_item(variant_id, quantity)?;

        self.cart.add_item(item);

        Ok(())
    }

    /// Start a checkout that approves payments at the configured rate.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] if the cart is empty.
    pub fn begin_checkout(&self) -> Result<Checkout, CheckoutError> {
        let decider = self.checkout_config.decider();

        self.begin_checkout_with(Box::new(decider))
    }

    /// Start a checkout with a specific payment decider.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] if the cart is empty.
    pub fn begin_checkout_with(
        &self,
        decider: Box<dyn PaymentDecider>,
    ) -> Result<Checkout, CheckoutError> {
        Checkout::begin(&self.cart, self.checkout_config, decider)
    }

    /// Submit the checkout's payment against this session's cart and orders.
    ///
    /// # Errors
    ///
    /// See [`Checkout::submit_payment`].
    pub async fn submit_payment(
        &mut self,
        checkout: &mut Checkout,
    ) -> Result<PaymentResolution, CheckoutError> {
        checkout.submit_payment(&mut self.cart, &self.orders).await
    }
}
