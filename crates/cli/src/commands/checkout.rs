use std::io::{self, Write};

use clap::{Args, ValueEnum};
use smarthvac::{
    checkout::{
        CheckoutError, PaymentResolution,
        contact::{Address, ContactDetails},
        payment::{FixedDecider, PaymentDecider, PaymentDecision, PaymentMethod},
    },
    receipt,
    storefront::View,
};
use tracing::{info, warn};

use crate::{
    commands::{open_storefront, write_error},
    config::{checkout::CheckoutArgs, storage::StorageConfig},
    shutdown,
};

/// Force the simulated gateway's decision
#[derive(Clone, Copy, Debug, ValueEnum)]
enum Outcome {
    Approve,
    Decline,
}

impl From<Outcome> for PaymentDecision {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Approve => Self::Approve,
            Outcome::Decline => Self::Decline,
        }
    }
}

#[derive(Debug, Args)]
pub(crate) struct CheckoutCommandArgs {
    /// Contact email address
    #[arg(long)]
    email: String,

    /// Cardholder name
    #[arg(long, default_value = "")]
    name: String,

    /// Billing street line
    #[arg(long, default_value = "")]
    line1: String,

    /// Billing city
    #[arg(long, default_value = "")]
    city: String,

    /// Billing state or region
    #[arg(long, default_value = "")]
    state: String,

    /// Billing postal code
    #[arg(long, default_value = "")]
    postal_code: String,

    /// Billing country code
    #[arg(long, default_value = "US")]
    country: String,

    /// Payment method tab (card, upi, wallet, net-banking, emi)
    #[arg(long, default_value_t = PaymentMethod::Card)]
    method: PaymentMethod,

    /// Skip the random draw and force an outcome
    #[arg(long, value_enum)]
    outcome: Option<Outcome>,

    /// How many times to submit the payment before giving up
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    attempts: u32,

    #[command(flatten)]
    gateway: CheckoutArgs,
}

impl CheckoutCommandArgs {
    fn contact(&self) -> ContactDetails {
        ContactDetails {
            name: self.name.clone(),
            email: self.email.clone(),
            address: Address {
                line1: self.line1.clone(),
                city: self.city.clone(),
                state: self.state.clone(),
                postal_code: self.postal_code.clone(),
                country: self.country.clone(),
            },
        }
    }
}

pub(crate) async fn run(args: CheckoutCommandArgs, storage: &StorageConfig) -> Result<(), String> {
    let config = args.gateway.config();
    let mut storefront = open_storefront(storage, config)?;
    let mut out = io::stdout().lock();

    let decider: Box<dyn PaymentDecider> = match args.outcome {
        Some(outcome) => Box::new(FixedDecider(outcome.into())),
        None => Box::new(config.decider()),
    };

    let mut checkout = match storefront.begin_checkout_with(decider) {
        Ok(checkout) => checkout,
        Err(error) if error.redirect() == Some(View::Cart) => {
            writeln!(out, "Your cart is empty, nothing to check out.").map_err(write_error)?;

            return receipt::write_cart(&mut out, storefront.cart())
                .map_err(|error| format!("{error}"));
        }
        Err(error) => return Err(error.to_string()),
    };

    checkout
        .submit_contact(args.contact())
        .map_err(|error| format!("invalid contact details: {error}"))?;
    checkout
        .select_payment_method(args.method)
        .map_err(|error| format!("{error}"))?;

    let listener = tokio::spawn(shutdown::detach_on_signal(checkout.detach_handle()));

    let mut result = Err(format!(
        "payment declined after {} attempt(s)",
        args.attempts
    ));

    for attempt in 1..=args.attempts {
        writeln!(
            out,
            "Processing {} payment of {} (attempt {attempt})...",
            args.method.label(),
            storefront.cart().total_money(),
        )
        .map_err(write_error)?;
        out.flush().map_err(write_error)?;

        match storefront.submit_payment(&mut checkout).await {
            Ok(PaymentResolution::Approved(order)) => {
                info!(order_id = %order.id, "order placed");

                writeln!(out, "Payment successful.").map_err(write_error)?;

                if !storefront.cart().is_empty() {
                    writeln!(out, "The order could not be saved; your cart was kept.")
                        .map_err(write_error)?;
                }

                result = match checkout.view() {
                    View::Confirmation => {
                        receipt::write_order(&mut out, &order, storefront.catalog().currency())
                            .map_err(|error| format!("{error}"))
                    }
                    View::Cart | View::Checkout => Ok(()),
                };

                break;
            }
            Ok(PaymentResolution::Declined { message }) => {
                writeln!(out, "{message}").map_err(write_error)?;
            }
            Ok(PaymentResolution::Discarded) => {
                warn!("checkout interrupted while processing");

                writeln!(out, "Checkout abandoned; your cart is unchanged.")
                    .map_err(write_error)?;

                result = Ok(());

                break;
            }
            Err(CheckoutError::EmptyCart) => {
                result = Err("cart was emptied during checkout".to_string());

                break;
            }
            Err(error) => {
                result = Err(error.to_string());

                break;
            }
        }
    }

    listener.abort();

    result
}
