//! Simulated payments
//!
//! No gateway is ever contacted: a [`PaymentDecider`] picks the outcome and an
//! approved payment produces a synthetic [`PaymentReceipt`].

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use jiff::Timestamp;
use mockall::automock;
use rand::Rng;
use rust_decimal::Decimal;
use rusty_money::iso::Currency;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{checkout::contact::ContactDetails, pricing::to_minor_units};

/// Message shown when the simulated gateway declines a payment.
pub const DECLINE_MESSAGE: &str = "Your card was declined. Please try another payment method.";

/// Default share of payments that are approved.
pub const DEFAULT_APPROVAL_RATE: f64 = 0.8;

/// Unrecognised payment method name
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown payment method: {0}")]
pub struct UnknownPaymentMethod(pub String);

/// Payment method tab chosen at checkout.
///
/// The choice is recorded on the receipt but never affects the outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    /// Credit or debit card
    #[default]
    Card,

    /// UPI transfer
    Upi,

    /// Digital wallet
    Wallet,

    /// Net banking redirect
    NetBanking,

    /// Card EMI instalments
    Emi,
}

impl PaymentMethod {
    /// Every method, in tab order
    pub const ALL: [Self; 5] = [
        Self::Card,
        Self::Upi,
        Self::Wallet,
        Self::NetBanking,
        Self::Emi,
    ];

    /// Machine-readable name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Upi => "upi",
            Self::Wallet => "wallet",
            Self::NetBanking => "net-banking",
            Self::Emi => "emi",
        }
    }

    /// Tab label
    pub const fn label(self) -> &'static str {
        match self {
            Self::Card => "Card",
            Self::Upi => "UPI",
            Self::Wallet => "Wallets",
            Self::NetBanking => "Net Banking",
            Self::Emi => "EMI",
        }
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = UnknownPaymentMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| UnknownPaymentMethod(s.to_string()))
    }
}

/// Outcome of a simulated payment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentDecision {
    /// The payment goes through
    Approve,

    /// The payment is declined
    Decline,
}

/// Decides whether a simulated payment succeeds.
#[automock]
pub trait PaymentDecider: Send + Sync {
    /// Decide the outcome of paying `amount` with `method`.
    fn decide(&self, method: PaymentMethod, amount: Decimal) -> PaymentDecision;
}

/// Approves a fixed share of payments at random, regardless of the details.
#[derive(Debug, Clone, Copy)]
pub struct RandomDecider {
    approval_rate: f64,
}

impl RandomDecider {
    /// Create a decider approving `approval_rate` of payments, clamped to `[0, 1]`.
    pub fn new(approval_rate: f64) -> Self {
        let approval_rate = if approval_rate.is_nan() {
            DEFAULT_APPROVAL_RATE
        } else {
            approval_rate.clamp(0.0, 1.0)
        };

        Self { approval_rate }
    }

    /// Share of payments approved
    pub fn approval_rate(&self) -> f64 {
        self.approval_rate
    }
}

impl Default for RandomDecider {
    fn default() -> Self {
        Self::new(DEFAULT_APPROVAL_RATE)
    }
}

impl PaymentDecider for RandomDecider {
    fn decide(&self, _method: PaymentMethod, _amount: Decimal) -> PaymentDecision {
        if rand::thread_rng().gen_bool(self.approval_rate) {
            PaymentDecision::Approve
        } else {
            PaymentDecision::Decline
        }
    }
}

/// Always returns the same decision.
#[derive(Debug, Clone, Copy)]
pub struct FixedDecider(pub PaymentDecision);

impl PaymentDecider for FixedDecider {
    fn decide(&self, _method: PaymentMethod, _amount: Decimal) -> PaymentDecision {
        self.0
    }
}

/// Synthetic payment id (`pi_…`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(String);

impl PaymentId {
    /// Generate a fresh payment id
    pub fn generate() -> Self {
        Self(format!("pi_{}", Uuid::now_v7().simple()))
    }

    /// The id as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PaymentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// Status of a synthetic payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Funds captured
    Succeeded,
}

/// Record of an approved simulated payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    /// Payment id
    pub id: PaymentId,

    /// Amount charged in minor units
    pub amount: i64,

    /// ISO currency code
    pub currency: String,

    /// Payment status
    pub status: PaymentStatus,

    /// When the payment was approved
    pub created: Timestamp,

    /// Method chosen at checkout
    pub payment_method: PaymentMethod,

    /// Contact details entered at checkout
    pub billing_details: ContactDetails,
}

impl PaymentReceipt {
    /// Receipt for an approved payment of `amount`
    pub fn approved(
        amount: Decimal,
        currency: &'static Currency,
        payment_method: PaymentMethod,
        billing_details: ContactDetails,
    ) -> Self {
        Self {
            id: PaymentId::generate(),
            amount: to_minor_units(amount).unwrap_or(i64::MAX),
            currency: currency.iso_alpha_code.to_string(),
            status: PaymentStatus::Succeeded,
            created: Timestamp::now(),
            payment_method,
            billing_details,
        }
    }
}
