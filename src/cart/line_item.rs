//! Cart line items

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A product and variant combination held in the cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    /// Product id joined with the selected variant id; unique within a cart
    pub id: String,

    /// Product name
    pub name: String,

    /// Selected variant name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,

    /// Unit price
    pub price: Decimal,

    /// Number of units, at least one
    pub quantity: u32,

    /// Product image URL
    #[serde(default)]
    pub image: String,
}

impl CartLineItem {
    /// Creates a line item without a variant or image
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Decimal, quantity: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            variant: None,
            price,
            quantity,
            image: String::new(),
        }
    }

    /// Sets the variant name
    #[must_use]
    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }

    /// Sets the image URL
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Unit price multiplied by quantity
    pub fn line_total(&self) -> Decimal {
        self.price.saturating_mul(Decimal::from(self.quantity))
    }
}
