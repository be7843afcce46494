use std::io::{self, Write};

use clap::{Args, Subcommand};
use smarthvac::{checkout::CheckoutConfig, receipt, storefront::Storefront};

use crate::{
    commands::{open_storefront, write_error},
    config::storage::StorageConfig,
};

#[derive(Debug, Args)]
pub(crate) struct CartCommand {
    #[command(subcommand)]
    command: CartSubcommand,
}

#[derive(Debug, Subcommand)]
enum CartSubcommand {
    /// Show the cart
    Show,

    /// Add a catalog product
    Add(AddArgs),

    /// Set the quantity of a line item; values below 1 are ignored
    Update(UpdateArgs),

    /// Remove a line item
    Remove(RemoveArgs),

    /// Remove every line item
    Clear,

    /// Open the cart panel
    Open,

    /// Close the cart panel
    Close,
}

#[derive(Debug, Args)]
struct AddArgs {
    /// Product id
    product_id: String,

    /// Variant id, required for products with variants
    #[arg(long)]
    variant: Option<String>,

    /// Quantity to add
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    quantity: u32,
}

#[derive(Debug, Args)]
struct UpdateArgs {
    /// Line item id, such as `smart-thermostat-pro-2`
    item_id: String,

    /// New quantity
    #[arg(allow_negative_numbers = true)]
    quantity: i64,
}

#[derive(Debug, Args)]
struct RemoveArgs {
    /// Line item id
    item_id: String,
}

pub(crate) fn run(command: CartCommand, storage: &StorageConfig) -> Result<(), String> {
    let mut storefront = open_storefront(storage, CheckoutConfig::default())?;

    match command.command {
        CartSubcommand::Show => {}
        CartSubcommand::Add(args) => {
            storefront
                .add_product(&args.product_id, args.variant.as_deref(), args.quantity)
                .map_err(|error| format!("cannot add to cart: {error}"))?;
        }
        CartSubcommand::Update(args) => {
            if storefront.cart().get(&args.item_id).is_none() {
                return Err(format!("no line item {} in the cart", args.item_id));
            }

            storefront
                .cart_mut()
                .update_quantity(&args.item_id, args.quantity);
        }
        CartSubcommand::Remove(args) => storefront.cart_mut().remove_item(&args.item_id),
        CartSubcommand::Clear => storefront.cart_mut().clear(),
        CartSubcommand::Open => storefront.cart_mut().set_open(true),
        CartSubcommand::Close => {
            storefront.cart_mut().set_open(false);

            return Ok(());
        }
    }

    show(&storefront)
}

fn show(storefront: &Storefront) -> Result<(), String> {
    let mut out = io::stdout().lock();

    receipt::write_cart(&mut out, storefront.cart()).map_err(|error| format!("{error}"))?;

    out.flush().map_err(write_error)
}
