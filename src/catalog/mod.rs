//! Product Catalog
//!
//! Static, read-only product records loaded from a YAML fixture.

use std::{fs, path::Path};

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use rusty_money::{
    Money,
    iso::{Currency, USD},
};
use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;
use thiserror::Error;

use crate::cart::CartLineItem;

pub mod fixtures;

/// Catalog fixture bundled with the crate.
const BUNDLED_CATALOG_YAML: &str = include_str!("../../fixtures/catalog/hvac.yml");

new_key_type! {
    /// Product Key
    pub struct ProductKey;
}

/// Catalog Errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// IO error reading the fixture file
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Currency mismatch between products
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// Two products share an id
    #[error("Duplicate product id: {0}")]
    DuplicateProduct(String),

    /// Product not found
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Variant not offered by the product
    #[error("Product {product} has no variant {variant}")]
    UnknownVariant {
        /// Product id
        product: String,
        /// Requested variant id
        variant: String,
    },

    /// The product has variants but none was chosen
    #[error("Product {0} requires a variant to be selected")]
    VariantRequired(String),

    /// Line items need a quantity of at least one
    #[error("Quantity for product {0} must be at least 1")]
    InvalidQuantity(String),
}

/// Product variant, such as a colour or size
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    /// Variant id, appended to the product id in line item ids
    pub id: String,

    /// Display name
    pub name: String,

    /// Swatch style
    pub color: String,

    /// Swatch style when selected
    pub selected_color: String,
}

/// Product
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    /// Product id
    pub id: String,

    /// Product name
    pub name: String,

    /// Unit price
    pub price: Decimal,

    /// Catalog category
    pub category: String,

    /// Long description
    pub description: String,

    /// Feature bullet points
    pub features: Vec<String>,

    /// Gallery image URLs
    pub images: Vec<String>,

    /// Selectable variants
    pub variants: SmallVec<[Variant; 4]>,

    /// Average review rating
    pub rating: f32,

    /// Number of reviews
    pub review_count: u32,

    /// Whether the product can be bought
    pub in_stock: bool,
}

impl Product {
    /// Primary image URL, empty if the product has none
    pub fn image(&self) -> &str {
        self.images.first().map_or("", String::as_str)
    }

    /// Look up a variant by id
    pub fn variant(&self, variant_id: &str) -> Option<&Variant> {
        self.variants.iter().find(|variant| variant.id == variant_id)
    }

    /// Build the cart line item for this product and the chosen variant
    ///
    /// The line item id is `"{product}-{variant}"`, or the bare product id for
    /// products without variants.
    ///
    /// # Errors
    ///
    /// Returns an error if the quantity is zero, the variant is unknown, or the
    /// product has variants and none was chosen.
    pub fn line_item(
        &self,
        variant_id: Option<&str>,
        quantity: u32,
    ) -> Result<CartLineItem, CatalogError> {
        if quantity == 0 {
            return Err(CatalogError::InvalidQuantity(self.id.clone()));
        }

        let item = CartLineItem::new(self.id.clone(), self.name.clone(), self.price, quantity)
            .with_image(self.image());

        match (variant_id, self.variants.is_empty()) {
            (None, true) => Ok(item),
            (None, false) => Err(CatalogError::VariantRequired(self.id.clone())),
            (Some(variant_id), _) => {
                let variant =
                    self.variant(variant_id)
                        .ok_or_else(|| CatalogError::UnknownVariant {
                            product: self.id.clone(),
                            variant: variant_id.to_string(),
                        })?;

                Ok(CartLineItem {
                    id: format!("{}-{}", self.id, variant.id),
                    ..item
                }
                .with_variant(variant.name.clone()))
            }
        }
    }
}

/// Product catalog
#[derive(Debug)]
pub struct Catalog {
    products: SlotMap<ProductKey, Product>,
    keys: FxHashMap<String, ProductKey>,
    currency: &'static Currency,
}

impl Catalog {
    /// Load the catalog bundled with the crate
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled fixture is invalid.
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_yaml(BUNDLED_CATALOG_YAML)
    }

    /// Load a catalog from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml(&contents)
    }

    /// Parse a catalog from YAML
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML cannot be parsed, a price is invalid, product ids
    /// repeat, or products are priced in different currencies.
    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        let fixture: fixtures::CatalogFixture = serde_norway::from_str(yaml)?;

        let mut products = SlotMap::with_key();
        let mut keys = FxHashMap::default();
        let mut currency: Option<&'static Currency> = None;

        for product_fixture in fixture.products {
            let (product, product_currency) = product_fixture.try_into_product()?;

            match currency {
                Some(existing) if existing != product_currency => {
                    return Err(CatalogError::CurrencyMismatch(
                        existing.iso_alpha_code.to_string(),
                        product_currency.iso_alpha_code.to_string(),
                    ));
                }
                Some(_) => {}
                None => currency = Some(product_currency),
            }

            if keys.contains_key(&product.id) {
                return Err(CatalogError::DuplicateProduct(product.id));
            }

            let id = product.id.clone();
            let key = products.insert(product);

            keys.insert(id, key);
        }

        Ok(Self {
            products,
            keys,
            currency: currency.unwrap_or(USD),
        })
    }

    /// Get a product by id
    pub fn get(&self, id: &str) -> Option<&Product> {
        self.keys
            .get(id)
            .and_then(|key| self.products.get(*key))
    }

    /// Get a product by id
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ProductNotFound`] if no product has this id.
    pub fn product(&self, id: &str) -> Result<&Product, CatalogError> {
        self.get(id)
            .ok_or_else(|| CatalogError::ProductNotFound(id.to_string()))
    }

    /// Products in fixture order
    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    /// Products in the given category, in fixture order
    pub fn in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Product> {
        self.iter().filter(move |product| product.category == category)
    }

    /// Distinct categories in order of first appearance
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = Vec::new();

        for product in self.iter() {
            if !categories.contains(&product.category.as_str()) {
                categories.push(&product.category);
            }
        }

        categories
    }

    /// Number of products
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Check if the catalog has no products
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Currency all prices are quoted in
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Format an amount in the catalog currency
    pub fn money(&self, amount: Decimal) -> Money<'static, Currency> {
        Money::from_decimal(amount, self.currency)
    }
}
