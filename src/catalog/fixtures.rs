//! Catalog Fixtures

use rust_decimal::Decimal;
use rusty_money::iso::{Currency, EUR, GBP, USD};
use serde::Deserialize;
use smallvec::SmallVec;

use crate::catalog::{CatalogError, Product, Variant};

/// Wrapper for products in YAML
#[derive(Debug, Deserialize)]
pub struct CatalogFixture {
    /// Products in display order
    pub products: Vec<ProductFixture>,
}

/// Product Fixture
#[derive(Debug, Deserialize)]
pub struct ProductFixture {
    /// Product id, used in URLs and line item ids
    pub id: String,

    /// Product name
    pub name: String,

    /// Product price (e.g., "249.99 USD")
    pub price: String,

    /// Catalog category
    pub category: String,

    /// Long description
    #[serde(default)]
    pub description: String,

    /// Feature bullet points
    #[serde(default)]
    pub features: Vec<String>,

    /// Gallery image URLs; the first is the primary image
    #[serde(default)]
    pub images: Vec<String>,

    /// Selectable variants
    #[serde(default)]
    pub variants: Vec<VariantFixture>,

    /// Average review rating
    #[serde(default)]
    pub rating: f32,

    /// Number of reviews
    #[serde(default)]
    pub review_count: u32,

    /// Whether the product can be bought
    #[serde(default = "in_stock_default")]
    pub in_stock: bool,
}

/// Variant Fixture
#[derive(Debug, Deserialize)]
pub struct VariantFixture {
    /// Variant id
    pub id: String,

    /// Display name
    pub name: String,

    /// Swatch style
    #[serde(default)]
    pub color: String,

    /// Swatch style when selected
    #[serde(default)]
    pub selected_color: String,
}

fn in_stock_default() -> bool {
    true
}

impl ProductFixture {
    /// Convert into a product, returning the currency its price is quoted in
    ///
    /// # Errors
    ///
    /// Returns an error if the price string cannot be parsed.
    pub fn try_into_product(self) -> Result<(Product, &'static Currency), CatalogError> {
        let (price, currency) = parse_price(&self.price)?;

        let variants: SmallVec<[Variant; 4]> = self
            .variants
            .into_iter()
            .map(|variant| Variant {
                id: variant.id,
                name: variant.name,
                color: variant.color,
                selected_color: variant.selected_color,
            })
            .collect();

        let product = Product {
            id: self.id,
            name: self.name,
            price,
            category: self.category,
            description: self.description,
            features: self.features,
            images: self.images,
            variants,
            rating: self.rating,
            review_count: self.review_count,
            in_stock: self.in_stock,
        };

        Ok((product, currency))
    }
}

/// Parse price string (e.g., "249.99 USD") into a decimal amount and currency
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY",
/// if the amount is not a non-negative decimal, or if the currency code
/// is not recognized.
pub fn parse_price(s: &str) -> Result<(Decimal, &'static Currency), CatalogError> {
    let mut parts = s.split_whitespace();

    let (Some(amount), Some(currency_code), None) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(CatalogError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| CatalogError::InvalidPrice(s.to_string()))?;

    if amount.is_sign_negative() {
        return Err(CatalogError::InvalidPrice(s.to_string()));
    }

    let currency = match currency_code {
        "GBP" => GBP,
        "USD" => USD,
        "EUR" => EUR,
        other => return Err(CatalogError::UnknownCurrency(other.to_string())),
    };

    Ok((amount, currency))
}
