//! Checkout Config

use std::time::Duration;

use clap::Args;
use smarthvac::checkout::{CheckoutConfig, payment::DEFAULT_APPROVAL_RATE};

/// Simulated gateway settings.
#[derive(Debug, Args)]
pub struct CheckoutArgs {
    /// Artificial payment processing delay in milliseconds
    #[arg(long, env = "SMARTHVAC_PROCESSING_DELAY_MS", default_value_t = 1_500_u64)]
    pub processing_delay_ms: u64,

    /// Share of payments approved, in range [0.0, 1.0]
    #[arg(long, env = "SMARTHVAC_APPROVAL_RATE", default_value_t = DEFAULT_APPROVAL_RATE)]
    pub approval_rate: f64,
}

impl CheckoutArgs {
    /// Library checkout settings
    pub fn config(&self) -> CheckoutConfig {
        CheckoutConfig {
            processing_delay: Duration::from_millis(self.processing_delay_ms),
            approval_rate: self.approval_rate,
        }
    }
}
