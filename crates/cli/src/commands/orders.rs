use std::io::{self, Write};

use clap::{Args, Subcommand};
use smarthvac::{checkout::CheckoutConfig, orders::Order, pricing::item_count, receipt};

use crate::{
    commands::{open_storefront, write_error},
    config::storage::StorageConfig,
};

#[derive(Debug, Args)]
pub(crate) struct OrdersCommand {
    #[command(subcommand)]
    command: OrdersSubcommand,
}

#[derive(Debug, Subcommand)]
enum OrdersSubcommand {
    /// List placed orders, oldest first
    List,

    /// Show one order in full
    Show(ShowArgs),
}

#[derive(Debug, Args)]
struct ShowArgs {
    /// Order id (`order_…`)
    order_id: String,
}

pub(crate) fn run(command: OrdersCommand, storage: &StorageConfig) -> Result<(), String> {
    let storefront = open_storefront(storage, CheckoutConfig::default())?;
    let currency = storefront.catalog().currency();
    let orders = storefront.orders().orders();
    let mut out = io::stdout().lock();

    match command.command {
        OrdersSubcommand::List => list(&mut out, &orders, |order| {
            storefront.catalog().money(order.total).to_string()
        })
        .map_err(write_error),
        OrdersSubcommand::Show(args) => {
            let order = orders
                .iter()
                .find(|order| order.id.as_str() == args.order_id)
                .ok_or_else(|| format!("no order {}", args.order_id))?;

            receipt::write_order(&mut out, order, currency).map_err(|error| format!("{error}"))
        }
    }
}

fn list(
    out: &mut impl Write,
    orders: &[Order],
    format_total: impl Fn(&Order) -> String,
) -> io::Result<()> {
    if orders.is_empty() {
        return writeln!(out, "No orders yet.");
    }

    for order in orders {
        writeln!(
            out,
            "{}  {}  {:>3} items  {:>12}  {}",
            order.id,
            order.created_at.strftime("%Y-%m-%d %H:%M"),
            item_count(&order.items),
            format_total(order),
            order.payment.payment_method.label(),
        )?;
    }

    Ok(())
}
