//! Receipt
//!
//! Terminal tables for the cart panel and placed orders.

use std::io;

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{cart::Cart, cart::CartLineItem, orders::Order};

/// Errors that can occur when writing a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// IO error
    #[error("failed to write receipt: {0}")]
    Io(#[from] io::Error),
}

/// Write the cart panel: one row per line item, then the item count and total.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn write_cart(mut out: impl io::Write, cart: &Cart) -> Result<(), ReceiptError> {
    if cart.is_empty() {
        writeln!(out, "\nYour cart is empty.")?;

        return Ok(());
    }

    let table = line_item_table(cart.items(), cart.currency());

    writeln!(out, "\n{table}")?;
    write_summary_line(&mut out, "Items:", &cart.item_count().to_string())?;
    write_summary_line(&mut out, "Total:", &cart.total_money().to_string())?;

    Ok(())
}

/// Write an order confirmation.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn write_order(
    mut out: impl io::Write,
    order: &Order,
    currency: &'static Currency,
) -> Result<(), ReceiptError> {
    let table = line_item_table(&order.items, currency);
    let total = Money::from_decimal(order.total, currency);

    writeln!(out, "\nOrder {}", order.id)?;
    writeln!(
        out,
        "Placed {} by {} ({})",
        order.created_at.strftime("%Y-%m-%d %H:%M:%S UTC"),
        order.payment.billing_details.email,
        order.payment.payment_method.label(),
    )?;
    writeln!(out, "\n{table}")?;
    write_summary_line(&mut out, "Payment:", order.payment.id.as_str())?;
    write_summary_line(&mut out, "Total:", &total.to_string())?;

    Ok(())
}

fn line_item_table(items: &[CartLineItem], currency: &'static Currency) -> String {
    let mut builder = Builder::default();

    builder.push_record(["", "Item", "Variant", "Price", "Qty", "Line Total"]);

    for (idx, item) in items.iter().enumerate() {
        builder.push_record([
            format!("#{:<3}", idx + 1),
            item.name.clone(),
            item.variant.clone().unwrap_or_default(),
            format_money(item.price, currency),
            item.quantity.to_string(),
            format_money(item.line_total(), currency),
        ]);
    }

    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(
        1,
        HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤')),
    );

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(3..6), Alignment::right());
    table.modify(Columns::one(2), color_dark_grey());

    table.to_string()
}

/// ANSI dark grey (secondary details).
fn color_dark_grey() -> Color {
    Color::new("\x1b[90m", "\x1b[0m")
}

fn format_money(amount: Decimal, currency: &'static Currency) -> String {
    Money::from_decimal(amount, currency).to_string()
}

fn write_summary_line(
    out: &mut impl io::Write,
    label: &str,
    value: &str,
) -> Result<(), ReceiptError> {
    writeln!(out, " {label:<9} {value}")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rusty_money::iso::USD;
    use testresult::TestResult;

    use crate::{
        checkout::{
            contact::ContactDetails,
            payment::{PaymentMethod, PaymentReceipt},
        },
        store::{MemoryStorage, PersistentStore},
    };

    use super::*;

    fn cart() -> Cart {
        let mut cart = Cart::load(PersistentStore::new(Arc::new(MemoryStorage::new())), USD);

        cart.add_item(
            CartLineItem::new("thermostat-2", "Smart Thermostat", Decimal::new(24999, 2), 2)
                .with_variant("Black"),
        );
        cart.add_item(CartLineItem::new("valve", "Butterfly Valve", Decimal::from(45), 1));

        cart
    }

    #[test]
    fn empty_cart_prints_placeholder() -> TestResult {
        let cart = Cart::load(PersistentStore::new(Arc::new(MemoryStorage::new())), USD);
        let mut out = Vec::new();

        write_cart(&mut out, &cart)?;

        assert!(String::from_utf8(out)?.contains("Your cart is empty."));

        Ok(())
    }

    #[test]
    fn cart_lists_items_and_total() -> TestResult {
        let mut out = Vec::new();

        write_cart(&mut out, &cart())?;

        let rendered = String::from_utf8(out)?;

        assert!(rendered.contains("Smart Thermostat"));
        assert!(rendered.contains("Black"));
        assert!(rendered.contains("$499.98"));
        assert!(rendered.contains("$544.98"));
        assert!(rendered.contains("Items:    3"));

        Ok(())
    }

    #[test]
    fn order_shows_id_and_payment() -> TestResult {
        let cart = cart();
        let payment = PaymentReceipt::approved(
            cart.total(),
            USD,
            PaymentMethod::Upi,
            ContactDetails::with_email("jane@example.com"),
        );
        let order = Order::new(cart.snapshot(), payment);
        let mut out = Vec::new();

        write_order(&mut out, &order, USD)?;

        let rendered = String::from_utf8(out)?;

        assert!(rendered.contains(order.id.as_str()));
        assert!(rendered.contains(order.payment.id.as_str()));
        assert!(rendered.contains("jane@example.com (UPI)"));
        assert!(rendered.contains("$544.98"));

        Ok(())
    }
}
