use std::sync::Arc;

use clap::Subcommand;
use smarthvac::{
    catalog::Catalog, checkout::CheckoutConfig, store::FileStorage, storefront::Storefront,
};
use tracing::debug;

use crate::config::storage::StorageConfig;

mod cart;
mod checkout;
mod orders;
mod products;

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Browse the product catalog
    Products(products::ProductsCommand),

    /// Inspect and change the cart
    Cart(cart::CartCommand),

    /// Pay for the cart with the simulated gateway
    Checkout(checkout::CheckoutCommandArgs),

    /// Inspect placed orders
    Orders(orders::OrdersCommand),
}

impl Commands {
    pub(crate) async fn run(self, storage: &StorageConfig) -> Result<(), String> {
        match self {
            Self::Products(command) => products::run(command, storage),
            Self::Cart(command) => cart::run(command, storage),
            Self::Checkout(args) => checkout::run(args, storage).await,
            Self::Orders(command) => orders::run(command, storage),
        }
    }
}

fn load_catalog(storage: &StorageConfig) -> Result<Catalog, String> {
    let catalog = match &storage.catalog {
        Some(path) => Catalog::from_path(path)
            .map_err(|error| format!("failed to load catalog {}: {error}", path.display()))?,
        None => Catalog::bundled().map_err(|error| format!("bundled catalog is invalid: {error}"))?,
    };

    Ok(catalog)
}

fn open_storefront(
    storage: &StorageConfig,
    checkout: CheckoutConfig,
) -> Result<Storefront, String> {
    let catalog = load_catalog(storage)?;

    debug!(data_dir = %storage.data_dir.display(), "opening storefront");

    Ok(Storefront::open(
        Arc::new(FileStorage::new(&storage.data_dir)),
        Arc::new(catalog),
        checkout,
    ))
}

fn write_error(error: impl std::fmt::Display) -> String {
    format!("failed to write output: {error}")
}
